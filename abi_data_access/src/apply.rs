use std::fmt;

use abi_data_type::{resolve_index, SLOT_SIZE};

use crate::{
    DataError::{self, *},
    LeafKind, PathElement, SigningPath,
};

/// The result of applying a [SigningPath] to a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyValue<'a> {
    /// The 32 byte slot holding a static value.
    Static(&'a [u8; SLOT_SIZE]),
    /// The bytes of a dynamic value, after slicing.
    Dynamic(&'a [u8]),
    /// The path points at an array. No bytes are extracted.
    ArrayHead {
        /// The byte offset of the array head.
        offset: usize,
    },
    /// The path points at a tuple. No bytes are extracted.
    TupleHead {
        /// The byte offset of the tuple head.
        offset: usize,
    },
}

impl<'a> ApplyValue<'a> {
    /// The extracted bytes, or None if the path points at an array or tuple.
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        match *self {
            ApplyValue::Static(word) => Some(&word[..]),
            ApplyValue::Dynamic(bytes) => Some(bytes),
            ApplyValue::ArrayHead { .. } | ApplyValue::TupleHead { .. } => None,
        }
    }

    /// Return true if the path points at an array or tuple.
    pub fn is_head(&self) -> bool {
        self.as_bytes().is_none()
    }
}

impl fmt::Display for ApplyValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApplyValue::Static(word) => write!(f, "{}", hex::encode(word)),
            ApplyValue::Dynamic(bytes) => write!(f, "{}", hex::encode(bytes)),
            ApplyValue::ArrayHead { offset } => write!(f, "array at {:#x}", offset),
            ApplyValue::TupleHead { offset } => write!(f, "tuple at {:#x}", offset),
        }
    }
}

impl SigningPath {
    /// Locate the value that the path points at in ABI-encoded `buffer`.
    ///
    /// Every offset and length read from the buffer is bounds checked, so a malformed
    /// buffer results in an error rather than a wrong value.
    pub fn apply<'a>(&self, buffer: &'a [u8]) -> Result<ApplyValue<'a>, DataError> {
        self.apply_impl(buffer).map_err(|error| DataError::Context {
            context: format!("while applying {}", self.label()),
            error: Box::new(error),
        })
    }

    fn apply_impl<'a>(&self, buffer: &'a [u8]) -> Result<ApplyValue<'a>, DataError> {
        let mut cursor: usize = 0;
        let mut base: usize = 0;

        for element in self.steps() {
            match *element {
                PathElement::TupleOffset(slots) => {
                    base = cursor;
                    cursor = advance(cursor, usize::from(slots))?;
                }
                PathElement::ArrayOffset { index, item_weight } => {
                    let length = read_usize(buffer, cursor)?;
                    let resolved = resolve_index(index.into(), length).ok_or(IndexOutOfBounds {
                        index: index.into(),
                        length,
                    })?;
                    base = cursor;
                    let slots = resolved
                        .checked_mul(usize::from(item_weight))
                        .and_then(|slots| slots.checked_add(1))
                        .ok_or(OffsetOverflow { offset: cursor })?;
                    cursor = advance(cursor, slots)?;
                }
                PathElement::Ref => {
                    let offset = read_usize(buffer, cursor)?;
                    cursor = base
                        .checked_add(offset)
                        .ok_or(OffsetOverflow { offset: cursor })?;
                }
                PathElement::Leaf(_) | PathElement::Slice { .. } => {}
            }
            tracing::trace!("{}: cursor = {:#x}, base = {:#x}", element, cursor, base);
        }

        match self.leaf_kind() {
            LeafKind::StaticValue => read_word(buffer, cursor).map(ApplyValue::Static),
            LeafKind::DynamicValue => {
                let length = read_usize(buffer, cursor)?;
                let data = advance(cursor, 1)?;
                let (start, end) = match self.slice() {
                    Some((start, end)) => slice_bounds(start, end, length)?,
                    None => (0, length),
                };
                read_bytes(buffer, data, start, end).map(ApplyValue::Dynamic)
            }
            LeafKind::ArrayHead => Ok(ApplyValue::ArrayHead { offset: cursor }),
            LeafKind::TupleHead => Ok(ApplyValue::TupleHead { offset: cursor }),
        }
    }

    fn label(&self) -> String {
        if self.source().is_empty() {
            self.to_string()
        } else {
            format!("{} ({})", self.source(), self)
        }
    }
}

fn advance(cursor: usize, slots: usize) -> Result<usize, DataError> {
    slots
        .checked_mul(SLOT_SIZE)
        .and_then(|bytes| cursor.checked_add(bytes))
        .ok_or(OffsetOverflow { offset: cursor })
}

fn read_word(buffer: &[u8], offset: usize) -> Result<&[u8; SLOT_SIZE], DataError> {
    offset
        .checked_add(SLOT_SIZE)
        .and_then(|end| buffer.get(offset..end))
        .and_then(|word| word.try_into().ok())
        .ok_or(BufferTooShort {
            offset,
            len: SLOT_SIZE,
            buffer_len: buffer.len(),
        })
}

/// Read a big-endian word that holds an offset or a length.
fn read_usize(buffer: &[u8], offset: usize) -> Result<usize, DataError> {
    let word = read_word(buffer, offset)?;
    let (high, low) = word.split_at(SLOT_SIZE - 8);
    if high.iter().any(|&b| b != 0) {
        return Err(OffsetOverflow { offset });
    }
    let mut low_bytes = [0u8; 8];
    low_bytes.copy_from_slice(low);
    usize::try_from(u64::from_be_bytes(low_bytes)).map_err(|_| OffsetOverflow { offset })
}

fn read_bytes(buffer: &[u8], data: usize, start: usize, end: usize) -> Result<&[u8], DataError> {
    let too_short = BufferTooShort {
        offset: data,
        len: end,
        buffer_len: buffer.len(),
    };
    let first = data.checked_add(start).ok_or_else(|| too_short.clone())?;
    let last = data.checked_add(end).ok_or_else(|| too_short.clone())?;
    buffer.get(first..last).ok_or(too_short)
}

/// Resolve slice bounds against the length of a dynamic value.
///
/// Both bounds must lie in `0..length` after resolving negative values.
fn slice_bounds(start: i16, end: i16, length: usize) -> Result<(usize, usize), DataError> {
    let out_of_bounds = SliceOutOfBounds {
        start: start.into(),
        end: end.into(),
        length,
    };
    match (
        resolve_index(start.into(), length),
        resolve_index(end.into(), length),
    ) {
        (Some(start), Some(end)) if start <= end => Ok((start, end)),
        _ => Err(out_of_bounds),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use PathElement::*;

    fn word(value: u64) -> [u8; 32] {
        let mut word = [0u8; 32];
        word[24..].copy_from_slice(&value.to_be_bytes());
        word
    }

    fn buffer(words: &[[u8; 32]]) -> Vec<u8> {
        words.concat()
    }

    fn path(elements: Vec<PathElement>) -> SigningPath {
        SigningPath::new(elements).unwrap()
    }

    fn inner_error(error: DataError) -> DataError {
        match error {
            DataError::Context { error, .. } => *error,
            error => error,
        }
    }

    #[test]
    fn test_static_value() {
        let data = buffer(&[word(7), word(8), word(9)]);
        let value = path(vec![TupleOffset(1), Leaf(LeafKind::StaticValue)])
            .apply(&data)
            .unwrap();
        assert_eq!(value, ApplyValue::Static(&word(8)));
        assert_eq!(value.as_bytes(), Some(&word(8)[..]));
    }

    #[test]
    fn test_dynamic_array_element() {
        // f(uint256[] p1) with p1 = [10, 11, 12]
        let data = buffer(&[word(0x20), word(3), word(10), word(11), word(12)]);
        let element = |index| {
            path(vec![
                TupleOffset(0),
                Ref,
                ArrayOffset {
                    index,
                    item_weight: 1,
                },
                Leaf(LeafKind::StaticValue),
            ])
        };
        assert_eq!(element(0).apply(&data).unwrap(), ApplyValue::Static(&word(10)));
        assert_eq!(element(2).apply(&data).unwrap(), ApplyValue::Static(&word(12)));
        assert_eq!(element(-1).apply(&data).unwrap(), ApplyValue::Static(&word(12)));
        assert_eq!(element(-3).apply(&data).unwrap(), ApplyValue::Static(&word(10)));

        for index in [3, -4] {
            let error = inner_error(element(index).apply(&data).unwrap_err());
            assert!(matches!(error, IndexOutOfBounds { length: 3, .. }));
        }
    }

    #[test]
    fn test_same_path_different_lengths() {
        let second = path(vec![
            TupleOffset(0),
            Ref,
            ArrayOffset {
                index: 1,
                item_weight: 1,
            },
            Leaf(LeafKind::StaticValue),
        ]);
        let long = buffer(&[word(0x20), word(2), word(5), word(6)]);
        let short = buffer(&[word(0x20), word(1), word(5)]);
        assert_eq!(second.apply(&long).unwrap(), ApplyValue::Static(&word(6)));
        assert!(matches!(
            inner_error(second.apply(&short).unwrap_err()),
            IndexOutOfBounds { index: 1, length: 1 }
        ));
    }

    fn bytes_buffer(payload: &[u8]) -> Vec<u8> {
        // f(bytes p1)
        let mut data = buffer(&[word(0x20), word(payload.len() as u64)]);
        data.extend_from_slice(payload);
        data.resize(64 + (payload.len() + 31) / 32 * 32, 0);
        data
    }

    #[test]
    fn test_dynamic_value() {
        let data = bytes_buffer(b"hello world");
        let whole = path(vec![TupleOffset(0), Ref, Leaf(LeafKind::DynamicValue)]);
        assert_eq!(
            whole.apply(&data).unwrap(),
            ApplyValue::Dynamic(b"hello world")
        );

        let sliced = |start, end| {
            path(vec![
                TupleOffset(0),
                Ref,
                Leaf(LeafKind::DynamicValue),
                Slice { start, end },
            ])
        };
        assert_eq!(sliced(2, 5).apply(&data).unwrap(), ApplyValue::Dynamic(b"llo"));
        assert_eq!(sliced(-5, -1).apply(&data).unwrap(), ApplyValue::Dynamic(b"worl"));
        assert_eq!(sliced(3, 3).apply(&data).unwrap(), ApplyValue::Dynamic(b""));

        for (start, end) in [(0, 11), (11, 0), (-12, 2), (5, 2)] {
            let error = inner_error(sliced(start, end).apply(&data).unwrap_err());
            assert!(
                matches!(error, SliceOutOfBounds { length: 11, .. }),
                "{}:{}",
                start,
                end
            );
        }
    }

    #[test]
    fn test_empty_dynamic_value() {
        let data = bytes_buffer(b"");
        let whole = path(vec![TupleOffset(0), Ref, Leaf(LeafKind::DynamicValue)]);
        assert_eq!(whole.apply(&data).unwrap(), ApplyValue::Dynamic(b""));
    }

    #[test]
    fn test_nested_ref_uses_last_offset_base() {
        // f((uint256 a, bytes b) p1) with p1 = (5, "ab")
        let mut data = buffer(&[word(0x20), word(5), word(0x40), word(2)]);
        data.extend_from_slice(&[b'a', b'b']);
        data.resize(5 * 32, 0);

        let b = path(vec![
            TupleOffset(0),
            Ref,
            TupleOffset(1),
            Ref,
            Leaf(LeafKind::DynamicValue),
        ]);
        assert_eq!(b.apply(&data).unwrap(), ApplyValue::Dynamic(b"ab"));

        let p1 = path(vec![TupleOffset(0), Ref, Leaf(LeafKind::TupleHead)]);
        let value = p1.apply(&data).unwrap();
        assert_eq!(value, ApplyValue::TupleHead { offset: 0x20 });
        assert!(value.is_head());
    }

    #[test]
    fn test_array_head() {
        let data = buffer(&[word(0x20), word(0)]);
        let p1 = path(vec![TupleOffset(0), Ref, Leaf(LeafKind::ArrayHead)]);
        assert_eq!(
            p1.apply(&data).unwrap(),
            ApplyValue::ArrayHead { offset: 0x20 }
        );
    }

    #[test]
    fn test_buffer_too_short() {
        let data = buffer(&[word(0x20)]);
        let element = path(vec![
            TupleOffset(0),
            Ref,
            ArrayOffset {
                index: 0,
                item_weight: 1,
            },
            Leaf(LeafKind::StaticValue),
        ]);
        assert!(matches!(
            inner_error(element.apply(&data).unwrap_err()),
            BufferTooShort {
                offset: 0x20,
                len: 32,
                buffer_len: 32
            }
        ));

        // Length word claims more bytes than the buffer holds
        let data = buffer(&[word(0x20), word(100), word(0)]);
        let whole = path(vec![TupleOffset(0), Ref, Leaf(LeafKind::DynamicValue)]);
        assert!(matches!(
            inner_error(whole.apply(&data).unwrap_err()),
            BufferTooShort { .. }
        ));

        assert!(matches!(
            inner_error(
                path(vec![TupleOffset(0), Leaf(LeafKind::StaticValue)])
                    .apply(&[])
                    .unwrap_err()
            ),
            BufferTooShort { .. }
        ));
    }

    #[test]
    fn test_offset_overflow() {
        let mut huge = [0xffu8; 32];
        huge[0] = 0x01;
        let data = buffer(&[huge]);
        let whole = path(vec![TupleOffset(0), Ref, Leaf(LeafKind::DynamicValue)]);
        assert!(matches!(
            inner_error(whole.apply(&data).unwrap_err()),
            OffsetOverflow { offset: 0 }
        ));
    }

    #[test]
    fn test_error_context() {
        let error = path(vec![TupleOffset(2), Leaf(LeafKind::StaticValue)])
            .apply(&[])
            .unwrap_err();
        assert_eq!(
            error.to_string(),
            "while applying (2)s:\n  buffer too short: reading 32 bytes at offset 64 in buffer of length 0"
        );
    }
}
