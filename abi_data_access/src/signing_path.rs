use std::fmt;

use abi_data_type::AbiTypeRef;
use abi_layout::AbiLayout;

use crate::{
    compile,
    DataPathError::{self, InvalidPath},
};

/// TLV tag of [PathElement::TupleOffset].
pub const TAG_TUPLE_OFFSET: u8 = 0x10;
/// TLV tag of [PathElement::ArrayOffset].
pub const TAG_ARRAY_OFFSET: u8 = 0x11;
/// TLV tag of [PathElement::Ref].
pub const TAG_REF: u8 = 0x12;
/// TLV tag of [PathElement::Leaf].
pub const TAG_LEAF: u8 = 0x13;
/// TLV tag of [PathElement::Slice].
pub const TAG_SLICE: u8 = 0x14;

/// An instruction in a signing path.
///
/// The interpreter keeps a `cursor` (the byte offset being looked at) and a `base` (the
/// offset that the next [PathElement::Ref] is relative to).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathElement {
    /// base -> cursor, cursor -> cursor + 32 * slots
    TupleOffset(u16),
    /// The cursor points at the length word of a dynamic-length array.
    ///
    /// base -> cursor, cursor -> cursor + 32 + 32 * index * item_weight, where a negative
    /// index counts from the end of the array.
    ArrayOffset {
        /// The element index.
        index: i16,
        /// The number of slots occupied by each element.
        item_weight: u16,
    },
    /// cursor -> base + *cursor
    Ref,
    /// The end of the path, describing what the cursor points at.
    Leaf(LeafKind),
    /// Narrow the bytes of a dynamic value. Negative bounds count from the end.
    Slice {
        /// The first byte of the range.
        start: i16,
        /// One past the last byte of the range.
        end: i16,
    },
}

/// What the end of a signing path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    /// The head of an array encoding.
    ArrayHead,
    /// The head of a tuple encoding.
    TupleHead,
    /// A single 32 byte value.
    StaticValue,
    /// A length word followed by that many bytes.
    DynamicValue,
}

impl LeafKind {
    /// The code used in the binary encoding.
    pub fn code(self) -> u8 {
        match self {
            LeafKind::ArrayHead => 1,
            LeafKind::TupleHead => 2,
            LeafKind::StaticValue => 3,
            LeafKind::DynamicValue => 4,
        }
    }

    /// The letter used in the text encoding.
    pub fn letter(self) -> char {
        match self {
            LeafKind::ArrayHead => 'a',
            LeafKind::TupleHead => 't',
            LeafKind::StaticValue => 's',
            LeafKind::DynamicValue => 'd',
        }
    }
}

impl PathElement {
    /// The TLV tag for the element.
    pub fn tag(&self) -> u8 {
        match self {
            PathElement::TupleOffset(_) => TAG_TUPLE_OFFSET,
            PathElement::ArrayOffset { .. } => TAG_ARRAY_OFFSET,
            PathElement::Ref => TAG_REF,
            PathElement::Leaf(_) => TAG_LEAF,
            PathElement::Slice { .. } => TAG_SLICE,
        }
    }

    fn value_bytes(&self) -> Vec<u8> {
        match *self {
            PathElement::TupleOffset(slots) => slots.to_be_bytes().to_vec(),
            PathElement::ArrayOffset { index, item_weight } => {
                let mut value = index.to_be_bytes().to_vec();
                value.extend_from_slice(&item_weight.to_be_bytes());
                value
            }
            PathElement::Ref => Vec::new(),
            PathElement::Leaf(kind) => vec![kind.code()],
            PathElement::Slice { start, end } => {
                let mut value = start.to_be_bytes().to_vec();
                value.extend_from_slice(&end.to_be_bytes());
                value
            }
        }
    }

    /// Append the tag-length-value encoding of the element to `out`.
    pub fn write_tlv(&self, out: &mut Vec<u8>) {
        let value = self.value_bytes();
        out.push(self.tag());
        // Values are at most 4 bytes
        out.push(value.len() as u8);
        out.extend_from_slice(&value);
    }

    /// The tag-length-value encoding of the element.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_tlv(&mut out);
        out
    }
}

impl fmt::Display for PathElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathElement::TupleOffset(slots) => write!(f, "({})", slots),
            PathElement::ArrayOffset { index, .. } => write!(f, "[{}]", index),
            PathElement::Ref => write!(f, "."),
            PathElement::Leaf(kind) => write!(f, "{}", kind.letter()),
            PathElement::Slice { start, end } => write!(f, "{{{}:{}}}", start, end),
        }
    }
}

/// A compiled sequence of [PathElement]s that locates one value in ABI-encoded data.
///
/// A signing path always starts with a [PathElement::TupleOffset] and ends with a
/// [PathElement::Leaf], optionally followed by a [PathElement::Slice]. Only offsets and
/// [PathElement::Ref] appear in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningPath {
    source: String,
    elements: Vec<PathElement>,
    leaf: LeafKind,
    slice: Option<(i16, i16)>,
}

impl SigningPath {
    /// Build a signing path from a sequence of elements, checking the path grammar.
    pub fn new(elements: Vec<PathElement>) -> Result<Self, DataPathError> {
        Self::with_source(String::new(), elements)
    }

    pub(crate) fn with_source(
        source: String,
        elements: Vec<PathElement>,
    ) -> Result<Self, DataPathError> {
        let (leaf, slice) = check_grammar(&elements)?;
        Ok(Self {
            source,
            elements,
            leaf,
            slice,
        })
    }

    /// Compile a path expression against the argument type tree of a function.
    ///
    /// See crate documentation for syntax.
    pub fn compile(root: &AbiTypeRef, source: &str) -> Result<Self, DataPathError> {
        compile::signing_path(root, source)
    }

    /// Compile a path expression against a function in `layout`.
    pub fn compile_in(
        layout: &AbiLayout,
        function: &str,
        source: &str,
    ) -> Result<Self, DataPathError> {
        let root = layout.function(function)?;
        Self::compile(root, source)
    }

    /// The expression the path was compiled from, or "" if it was built directly.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The path elements.
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// The kind of value the path points at.
    pub fn leaf_kind(&self) -> LeafKind {
        self.leaf
    }

    /// The trailing slice bounds, if any.
    pub fn slice(&self) -> Option<(i16, i16)> {
        self.slice
    }

    /// The elements before the leaf.
    pub(crate) fn steps(&self) -> &[PathElement] {
        let terminal = if self.slice.is_some() { 2 } else { 1 };
        &self.elements[..self.elements.len() - terminal]
    }

    /// The tag-length-value encoding of the path.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for element in &self.elements {
            element.write_tlv(&mut out);
        }
        out
    }

    /// The tag-length-value encoding of the path as lowercase hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

fn check_grammar(
    elements: &[PathElement],
) -> Result<(LeafKind, Option<(i16, i16)>), DataPathError> {
    if !matches!(elements.first(), Some(PathElement::TupleOffset(_))) {
        return Err(InvalidPath {
            reason: "first element must be a tuple offset",
        });
    }

    let (leaf, slice, middle) = match elements {
        [_, middle @ .., PathElement::Leaf(leaf), PathElement::Slice { start, end }] => {
            (*leaf, Some((*start, *end)), middle)
        }
        [_, middle @ .., PathElement::Leaf(leaf)] => (*leaf, None, middle),
        [.., PathElement::Slice { .. }] => {
            return Err(InvalidPath {
                reason: "slice must directly follow the leaf",
            })
        }
        _ => {
            return Err(InvalidPath {
                reason: "path must end with a leaf",
            })
        }
    };

    let valid_middle = middle.iter().all(|element| {
        matches!(
            element,
            PathElement::TupleOffset(_) | PathElement::ArrayOffset { .. } | PathElement::Ref
        )
    });
    if !valid_middle {
        return Err(InvalidPath {
            reason: "only offsets and refs may appear before the leaf",
        });
    }

    Ok((leaf, slice))
}

impl fmt::Display for SigningPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            write!(f, "{}", element)?;
        }
        Ok(())
    }
}
