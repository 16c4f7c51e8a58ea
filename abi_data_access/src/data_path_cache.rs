use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use abi_layout::AbiLayout;

use crate::{DataPathError, SigningPath};

/// A cache for signing path compilation, keyed by function name and path source.
#[derive(Debug, Default)]
pub struct DataPathCache {
    paths: Mutex<HashMap<String, HashMap<String, Arc<SigningPath>>>>,
}

impl DataPathCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a path for a function in `layout`, or return the cached result.
    ///
    /// Compile errors are not cached.
    pub fn path(
        &self,
        layout: &AbiLayout,
        function: &str,
        source: &str,
    ) -> Result<Arc<SigningPath>, DataPathError> {
        let root = layout.function(function)?;

        let mut cache = self.paths.lock().unwrap_or_else(PoisonError::into_inner);
        let function_paths = cache.entry(function.to_string()).or_default();
        match function_paths.get(source) {
            Some(path) => Ok(Arc::clone(path)),
            None => {
                let path = Arc::new(SigningPath::compile(root, source)?);
                function_paths.insert(source.to_string(), path.clone());
                Ok(path)
            }
        }
    }

    /// Forget all compiled paths, e.g. after the layout changes.
    pub fn clear(&self) {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
