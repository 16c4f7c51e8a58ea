//! Building type trees from interface descriptions.

use serde::{Deserialize, Serialize};

use crate::{AbiType, AbiTypeRef, DataTypeError};

/// A field in an interface description, e.g. a function input or a tuple component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// The field name, if any.
    #[serde(default)]
    pub name: Option<String>,
    /// The type string, e.g. `uint256`, `tuple[]` or `bytes32[4]`.
    #[serde(rename = "type")]
    pub type_name: String,
    /// The components of a tuple type.
    #[serde(default)]
    pub components: Vec<FieldDescriptor>,
}

/// An entry in an interface description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// The function name.
    #[serde(default)]
    pub name: String,
    /// The entry kind (`function`, `event`, `constructor`, ...).
    ///
    /// Entries without a kind are functions.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// The input fields in declaration order.
    #[serde(default)]
    pub inputs: Vec<FieldDescriptor>,
}

impl FunctionDescriptor {
    /// Return true if the entry describes a function.
    pub fn is_function(&self) -> bool {
        self.kind.as_deref().map_or(true, |kind| kind == "function")
    }
}

/// Build the type tree for a function's argument list.
///
/// The root is a tuple named after the function, with one field per input.
pub fn build_type_model(function: &FunctionDescriptor) -> Result<AbiTypeRef, DataTypeError> {
    let fields = function
        .inputs
        .iter()
        .map(build_field_type)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AbiType::tuple(function.name.clone(), fields))
}

/// Build the type tree for a single field.
pub fn build_field_type(field: &FieldDescriptor) -> Result<AbiTypeRef, DataTypeError> {
    let name = field.name.clone().unwrap_or_default();
    build_type(name, &field.type_name, &field.components)
}

fn build_type(
    name: String,
    type_name: &str,
    components: &[FieldDescriptor],
) -> Result<AbiTypeRef, DataTypeError> {
    match split_array_suffix(type_name)? {
        // The last suffix is the outermost array: `uint8[2][]` is a list of pairs
        Some((base, length)) => {
            let element = build_type(String::new(), base, components)?;
            AbiType::array(name, element, length)
        }
        None if type_name == "tuple" => {
            let fields = components
                .iter()
                .map(build_field_type)
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AbiType::tuple(name, fields))
        }
        None => Ok(AbiType::leaf(name, type_name)),
    }
}

fn split_array_suffix(type_name: &str) -> Result<Option<(&str, Option<usize>)>, DataTypeError> {
    let invalid = || DataTypeError::InvalidArraySuffix {
        type_name: type_name.to_string(),
    };

    let inner = match type_name.strip_suffix(']') {
        Some(inner) => inner,
        None if type_name.contains(['[', ']']) => return Err(invalid()),
        None => return Ok(None),
    };
    let open = inner.rfind('[').ok_or_else(invalid)?;
    let (base, digits) = (&inner[..open], &inner[open + 1..]);
    if base.is_empty() {
        return Err(invalid());
    }

    let length = if digits.is_empty() {
        None
    } else if digits.bytes().all(|b| b.is_ascii_digit()) {
        match digits.parse::<usize>() {
            Ok(length) if length > 0 => Some(length),
            _ => return Err(invalid()),
        }
    } else {
        return Err(invalid());
    };
    Ok(Some((base, length)))
}
