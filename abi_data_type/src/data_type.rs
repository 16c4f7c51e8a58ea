//! Types and functions for representing the argument layout of a contract function.

use std::{fmt, num::NonZeroUsize, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::error::DataTypeError;

/// The size in bytes of one encoding slot.
pub const SLOT_SIZE: usize = 32;

/// A node in the argument type tree of a function.
///
/// The root of a tree is a synthetic tuple holding the function's inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbiType {
    /// The field or argument name.
    ///
    /// This is empty for array elements and for unnamed tuple components.
    pub name: String,
    /// The shape of the type.
    pub kind: AbiTypeKind,
}

/// The shape of an [AbiType].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum AbiTypeKind {
    /// A primitive value or an opaque blob such as `bytes` or `string`.
    Leaf(LeafType),
    /// An ordered set of named fields.
    Tuple {
        /// The fields in declaration order.
        fields: Vec<AbiTypeRef>,
    },
    /// A homogeneous repetition of one element type.
    Array {
        /// The element type.
        element: AbiTypeRef,
        /// The number of elements, or None for a dynamic-length array.
        length: Option<NonZeroUsize>,
    },
}

/// A reference to an `AbiType`.
pub type AbiTypeRef = Arc<AbiType>;

/// The elementary type name of a leaf, e.g. `uint256`, `address` or `bytes`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeafType(pub String);

impl LeafType {
    /// Construct a leaf type from its name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The elementary type name.
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Return true if values of this type have a variable encoded length.
    pub fn is_dynamic(&self) -> bool {
        matches!(self.0.as_str(), "bytes" | "string")
    }
}

/// Resolve a possibly negative index against a length.
///
/// Negative indices count from the end. Returns None if the resolved index is not in
/// `0..length`.
pub fn resolve_index(index: i64, length: usize) -> Option<usize> {
    if index >= 0 {
        usize::try_from(index).ok().filter(|&i| i < length)
    } else {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        length.checked_sub(back)
    }
}

impl AbiType {
    /// Construct a leaf node.
    pub fn leaf(name: impl Into<String>, leaf_type: impl Into<String>) -> AbiTypeRef {
        Arc::new(Self {
            name: name.into(),
            kind: AbiTypeKind::Leaf(LeafType::new(leaf_type)),
        })
    }

    /// Construct a tuple node.
    pub fn tuple(name: impl Into<String>, fields: Vec<AbiTypeRef>) -> AbiTypeRef {
        Arc::new(Self {
            name: name.into(),
            kind: AbiTypeKind::Tuple { fields },
        })
    }

    /// Construct an array node. A length of None means dynamic length.
    ///
    /// Fixed-length arrays must have at least one element.
    pub fn array(
        name: impl Into<String>,
        element: AbiTypeRef,
        length: Option<usize>,
    ) -> Result<AbiTypeRef, DataTypeError> {
        let name = name.into();
        let length = match length {
            Some(length) => Some(
                NonZeroUsize::new(length)
                    .ok_or_else(|| DataTypeError::ZeroLengthArray { name: name.clone() })?,
            ),
            None => None,
        };
        Ok(Arc::new(Self {
            name,
            kind: AbiTypeKind::Array { element, length },
        }))
    }

    /// Return true if the type is a leaf.
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, AbiTypeKind::Leaf(_))
    }

    /// Return true if the type is a tuple.
    pub fn is_tuple(&self) -> bool {
        matches!(self.kind, AbiTypeKind::Tuple { .. })
    }

    /// Convert the type to a tuple type, returning its fields.
    pub fn try_as_tuple(&self) -> Result<&[AbiTypeRef], DataTypeError> {
        if let AbiTypeKind::Tuple { fields } = &self.kind {
            Ok(fields)
        } else {
            Err(self.expected("tuple type"))
        }
    }

    /// Return true if the type is an array.
    pub fn is_array(&self) -> bool {
        matches!(self.kind, AbiTypeKind::Array { .. })
    }

    /// Convert the type to an array type, returning its element type and length.
    pub fn try_as_array(&self) -> Result<(&AbiTypeRef, Option<usize>), DataTypeError> {
        if let AbiTypeKind::Array { element, length } = &self.kind {
            Ok((element, length.map(NonZeroUsize::get)))
        } else {
            Err(self.expected("array type"))
        }
    }

    /// Return true if the encoded size of the type depends on its value.
    pub fn is_dynamic(&self) -> bool {
        match &self.kind {
            AbiTypeKind::Leaf(leaf_type) => leaf_type.is_dynamic(),
            AbiTypeKind::Tuple { fields } => fields.iter().any(|field| field.is_dynamic()),
            AbiTypeKind::Array { element, length } => length.is_none() || element.is_dynamic(),
        }
    }

    /// Return true if the type always occupies the same number of slots.
    pub fn is_static(&self) -> bool {
        !self.is_dynamic()
    }

    /// The number of slots the type occupies in the head of its containing structure.
    ///
    /// Dynamic types occupy a single pointer slot.
    pub fn encoding_weight(&self) -> usize {
        if self.is_dynamic() {
            return 1;
        }
        match &self.kind {
            AbiTypeKind::Leaf(_) => 1,
            AbiTypeKind::Tuple { fields } => fields
                .iter()
                .fold(0usize, |acc, field| acc.saturating_add(field.encoding_weight())),
            AbiTypeKind::Array { element, length } => length
                .map_or(0, NonZeroUsize::get)
                .saturating_mul(element.encoding_weight()),
        }
    }

    /// Look up a field by name in a tuple type.
    ///
    /// If several fields share the name, the first one is returned.
    pub fn field(&self, name: &str) -> Result<&AbiTypeRef, DataTypeError> {
        self.try_as_tuple()?
            .iter()
            .find(|field| field.name == name)
            .ok_or_else(|| DataTypeError::NoSuchField {
                name: name.to_string(),
            })
    }

    /// Return the number of slots that precede the named field in a tuple type.
    pub fn field_slot_offset(&self, name: &str) -> Result<usize, DataTypeError> {
        let mut offset = 0usize;
        for field in self.try_as_tuple()? {
            if field.name == name {
                return Ok(offset);
            }
            offset = offset.saturating_add(field.encoding_weight());
        }
        Err(DataTypeError::NoSuchField {
            name: name.to_string(),
        })
    }

    /// Return the single element type of an array type.
    pub fn element_type(&self) -> Result<&AbiTypeRef, DataTypeError> {
        self.try_as_array().map(|(element, _)| element)
    }

    /// Resolve an index into a fixed-length array type.
    ///
    /// Negative indices count from the end. Dynamic-length arrays have no fixed layout,
    /// so this fails for them.
    pub fn resolve_index(&self, index: i64) -> Result<usize, DataTypeError> {
        match self.try_as_array()? {
            (_, Some(length)) => resolve_index(index, length)
                .ok_or(DataTypeError::IndexOutOfBounds { index, length }),
            (_, None) => Err(DataTypeError::DynamicArrayOffset {
                name: self.name.clone(),
            }),
        }
    }

    /// Return the number of slots that precede the element at `index` in a fixed-length
    /// array type.
    pub fn array_slot_offset(&self, index: i64) -> Result<usize, DataTypeError> {
        let index = self.resolve_index(index)?;
        let element = self.element_type()?;
        Ok(index.saturating_mul(element.encoding_weight()))
    }

    /// The canonical type string, e.g. `uint256[2][]` or `(address,bytes)`.
    pub fn type_name(&self) -> String {
        match &self.kind {
            AbiTypeKind::Leaf(leaf_type) => leaf_type.name().to_string(),
            AbiTypeKind::Tuple { fields } => {
                let fields: Vec<String> = fields.iter().map(|field| field.type_name()).collect();
                format!("({})", fields.join(","))
            }
            AbiTypeKind::Array { element, length } => match length {
                Some(length) => format!("{}[{}]", element.type_name(), length),
                None => format!("{}[]", element.type_name()),
            },
        }
    }

    fn expected(&self, expected: &'static str) -> DataTypeError {
        DataTypeError::ExpectedType {
            expected: expected.into(),
            actual: Arc::new(self.clone()),
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        display_node(f, self, 0)
    }
}

fn display_node(f: &mut fmt::Formatter<'_>, node: &AbiType, level: usize) -> fmt::Result {
    let indent = "  ".repeat(level);
    let layout = if node.is_dynamic() { "dynamic" } else { "static" };
    match &node.kind {
        AbiTypeKind::Leaf(leaf_type) => {
            writeln!(f, "{}{}({}) - {}", indent, node.name, leaf_type.name(), layout)
        }
        AbiTypeKind::Tuple { fields } => {
            writeln!(f, "{}{}(tuple) - {}", indent, node.name, layout)?;
            for field in fields {
                display_node(f, field, level + 1)?;
            }
            Ok(())
        }
        AbiTypeKind::Array { element, length } => {
            match length {
                Some(length) => writeln!(
                    f,
                    "{}{}(array)[{}] - {}",
                    indent, node.name, length, layout
                )?,
                None => writeln!(f, "{}{}(array)[] - {}", indent, node.name, layout)?,
            }
            display_node(f, element, level + 1)
        }
    }
}
