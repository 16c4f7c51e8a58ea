//! Recording and looking up the argument layouts of contract functions.

use std::{fmt, fs, path::Path};

use abi_data_type::{build_type_model, AbiTypeRef, FunctionDescriptor};
use indexmap::IndexMap;

use crate::{LayoutError, LayoutErrorKind, LayoutLookupError};

/// The argument type trees of the functions in an interface description.
#[derive(Debug, Clone, Default)]
pub struct AbiLayout {
    /// The argument type tree of each function, in declaration order.
    ///
    /// For overloaded names only the first declaration is recorded.
    pub functions: IndexMap<String, AbiTypeRef>,
}

impl AbiLayout {
    /// Create an empty layout.
    pub fn new() -> Self {
        Self {
            functions: IndexMap::new(),
        }
    }

    /// Build a layout from a JSON interface description.
    ///
    /// The description is an array of entries. Entries that are not functions (events,
    /// errors, constructors) are skipped.
    pub fn from_json(json: &str) -> Result<Self, LayoutError> {
        let descriptors: Vec<FunctionDescriptor> = serde_json::from_str(json)?;
        Self::from_descriptors(&descriptors)
    }

    /// Read a JSON interface description from a file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LayoutError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let layout = Self::from_json(&json)?;
        tracing::debug!(
            "loaded {} functions from {}",
            layout.functions.len(),
            path.display()
        );
        Ok(layout)
    }

    /// Build a layout from already parsed function descriptors.
    pub fn from_descriptors(descriptors: &[FunctionDescriptor]) -> Result<Self, LayoutError> {
        let mut layout = Self::new();
        for descriptor in descriptors.iter().filter(|d| d.is_function()) {
            if layout.functions.contains_key(&descriptor.name) {
                tracing::debug!("skipping overload of {}", descriptor.name);
                continue;
            }
            let root = build_type_model(descriptor).map_err(|error| LayoutError {
                kind: LayoutErrorKind::DataTypeError(error),
                function: Some(descriptor.name.clone()),
            })?;
            layout.functions.insert(descriptor.name.clone(), root);
        }
        Ok(layout)
    }

    /// Look up the argument type tree of a function.
    pub fn function(&self, name: &str) -> Result<&AbiTypeRef, LayoutLookupError> {
        self.functions
            .get(name)
            .ok_or_else(|| LayoutLookupError::UndefinedFunction(name.to_string()))
    }
}

impl fmt::Display for AbiLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, root) in &self.functions {
            writeln!(f, "{}{}", name, root.type_name())?;
        }
        Ok(())
    }
}
