use abi_data_type::{AbiTypeKind, AbiTypeRef, DataTypeError};

use crate::{
    parse::{parse_signing_path, EdgeAst, SliceAst},
    DataPathCompileError::{self, *},
    DataPathError, LeafKind, PathElement, SigningPath,
};

pub fn signing_path(root: &AbiTypeRef, source: &str) -> Result<SigningPath, DataPathError> {
    let elements = signing_path_impl(root, source).map_err(|error| {
        DataPathError::CompileError {
            source: source.to_string(),
            error,
        }
    })?;
    let path = SigningPath::with_source(source.to_string(), elements)?;
    tracing::debug!("compiled {} -> {}", source, path);
    Ok(path)
}

/// The state threaded through each edge of the path.
struct PathState {
    /// The type at the current position.
    cursor: AbiTypeRef,
    elements: Vec<PathElement>,
    /// The accumulated slot offset while the whole path is statically laid out.
    ///
    /// Emitted as a single tuple offset after the last edge.
    static_offset: Option<usize>,
}

fn signing_path_impl(
    root: &AbiTypeRef,
    source: &str,
) -> Result<Vec<PathElement>, DataPathCompileError> {
    let ast = parse_signing_path(source)?;

    let state = PathState {
        cursor: root.clone(),
        elements: Vec::new(),
        static_offset: root.is_static().then_some(0),
    };
    let state = ast.edges.iter().try_fold(state, follow_edge)?;

    let PathState {
        cursor,
        mut elements,
        static_offset,
    } = state;

    if let Some(offset) = static_offset {
        elements.push(PathElement::TupleOffset(slot_count(offset)?));
    }

    elements.push(PathElement::Leaf(leaf_kind(&cursor)));

    if let Some(slice) = ast.slice {
        // Tuples never take a slice, even dynamic ones
        if !(cursor.is_array() || (cursor.is_dynamic() && cursor.is_leaf())) {
            return Err(InvalidSlice);
        }
        if let SliceAst::Range(start, end) = slice {
            elements.push(PathElement::Slice {
                start: signed(start)?,
                end: signed(end)?,
            });
        }
    }

    Ok(elements)
}

fn follow_edge(mut state: PathState, edge: &EdgeAst) -> Result<PathState, DataPathCompileError> {
    if state.static_offset.is_some() && state.cursor.is_dynamic() {
        return Err(UnexpectedDynamic);
    }

    let next = match edge {
        EdgeAst::Field(name) => follow_field(&mut state, name)?,
        EdgeAst::Index(index) => follow_index(&mut state, *index)?,
    };

    // A dynamic value's slot holds an offset to its data
    if next.is_dynamic() {
        state.elements.push(PathElement::Ref);
    }

    tracing::trace!(
        "{} -> {} ({} elements)",
        edge_label(edge),
        next.type_name(),
        state.elements.len()
    );

    state.cursor = next;
    Ok(state)
}

fn follow_field(state: &mut PathState, name: &str) -> Result<AbiTypeRef, DataPathCompileError> {
    if !state.cursor.is_tuple() {
        return Err(NotATuple {
            field_name: name.to_string(),
        });
    }
    let field = match state.cursor.field(name) {
        Ok(field) => field.clone(),
        Err(DataTypeError::NoSuchField { .. }) => {
            return Err(UndefinedField {
                name: name.to_string(),
            })
        }
        Err(error) => return Err(error.into()),
    };
    let slots = state.cursor.field_slot_offset(name)?;
    step(state, slots)?;
    Ok(field)
}

fn follow_index(state: &mut PathState, index: i64) -> Result<AbiTypeRef, DataPathCompileError> {
    let (element, length) = match &state.cursor.kind {
        AbiTypeKind::Array { element, length } => (element.clone(), *length),
        _ => return Err(NotAnArray),
    };

    match length {
        Some(_) => {
            // Fixed-length arrays are laid out contiguously
            let slots = match state.cursor.array_slot_offset(index) {
                Ok(slots) => slots,
                Err(DataTypeError::IndexOutOfBounds { index, length }) => {
                    return Err(IndexOutOfBounds { index, length })
                }
                Err(error) => return Err(error.into()),
            };
            step(state, slots)?;
        }
        None => {
            if state.static_offset.is_some() {
                return Err(UnexpectedDynamic);
            }
            state.elements.push(PathElement::ArrayOffset {
                index: signed(index)?,
                item_weight: slot_count(element.encoding_weight())?,
            });
        }
    }

    Ok(element)
}

fn step(state: &mut PathState, slots: usize) -> Result<(), DataPathCompileError> {
    match &mut state.static_offset {
        Some(offset) => *offset = offset.saturating_add(slots),
        None => state
            .elements
            .push(PathElement::TupleOffset(slot_count(slots)?)),
    }
    Ok(())
}

fn leaf_kind(cursor: &AbiTypeRef) -> LeafKind {
    match &cursor.kind {
        AbiTypeKind::Array { .. } => LeafKind::ArrayHead,
        AbiTypeKind::Tuple { .. } => LeafKind::TupleHead,
        AbiTypeKind::Leaf(leaf_type) if leaf_type.is_dynamic() => LeafKind::DynamicValue,
        AbiTypeKind::Leaf(_) => LeafKind::StaticValue,
    }
}

fn slot_count(value: usize) -> Result<u16, DataPathCompileError> {
    u16::try_from(value).map_err(|_| ValueOutOfRange {
        value: i64::try_from(value).unwrap_or(i64::MAX),
    })
}

fn signed(value: i64) -> Result<i16, DataPathCompileError> {
    i16::try_from(value).map_err(|_| ValueOutOfRange { value })
}

fn edge_label(edge: &EdgeAst) -> String {
    match edge {
        EdgeAst::Field(name) => name.clone(),
        EdgeAst::Index(index) => format!("[{}]", index),
    }
}

#[cfg(test)]
mod test {
    use abi_data_type::AbiType;

    use super::*;
    use PathElement::*;

    fn compile(root: &AbiTypeRef, source: &str) -> Vec<PathElement> {
        SigningPath::compile(root, source)
            .unwrap_or_else(|error| panic!("{}", error))
            .elements()
            .to_vec()
    }

    fn compile_error(root: &AbiTypeRef, source: &str) -> DataPathCompileError {
        match SigningPath::compile(root, source) {
            Err(DataPathError::CompileError { error, .. }) => error,
            other => panic!("expected compile error for {}, got {:?}", source, other),
        }
    }

    fn uint() -> AbiTypeRef {
        AbiType::leaf("", "uint256")
    }

    fn array(name: &str, element: AbiTypeRef, length: Option<usize>) -> AbiTypeRef {
        AbiType::array(name, element, length).unwrap()
    }

    // test_static(uint256 p1, address p2, uint256[3] p3, (uint256 a, uint256[2] b) p4)
    fn test_static() -> AbiTypeRef {
        AbiType::tuple(
            "test_static",
            vec![
                AbiType::leaf("p1", "uint256"),
                AbiType::leaf("p2", "address"),
                array("p3", uint(), Some(3)),
                AbiType::tuple(
                    "p4",
                    vec![
                        AbiType::leaf("a", "uint256"),
                        array("b", uint(), Some(2)),
                    ],
                ),
            ],
        )
    }

    // test_dynamic(bytes p1, uint256[] p2, (uint256 a, uint256 b, string c) p3)
    fn test_dynamic() -> AbiTypeRef {
        AbiType::tuple(
            "test_dynamic",
            vec![
                AbiType::leaf("p1", "bytes"),
                array("p2", uint(), None),
                AbiType::tuple(
                    "p3",
                    vec![
                        AbiType::leaf("a", "uint256"),
                        AbiType::leaf("b", "uint256"),
                        AbiType::leaf("c", "string"),
                    ],
                ),
            ],
        )
    }

    #[test]
    fn test_static_paths_are_folded() {
        let root = test_static();
        assert_eq!(
            compile(&root, "p1"),
            vec![TupleOffset(0), Leaf(LeafKind::StaticValue)]
        );
        assert_eq!(
            compile(&root, "p3"),
            vec![TupleOffset(2), Leaf(LeafKind::ArrayHead)]
        );
        assert_eq!(
            compile(&root, "p3.[-1]"),
            vec![TupleOffset(4), Leaf(LeafKind::StaticValue)]
        );
        assert_eq!(
            compile(&root, "p4.b.[1]"),
            vec![TupleOffset(7), Leaf(LeafKind::StaticValue)]
        );
        assert_eq!(
            compile(&root, "p4"),
            vec![TupleOffset(5), Leaf(LeafKind::TupleHead)]
        );
        assert_eq!(
            compile(&root, "p4.b.[0:1]"),
            vec![
                TupleOffset(6),
                Leaf(LeafKind::ArrayHead),
                Slice { start: 0, end: 1 }
            ]
        );
        assert_eq!(
            compile(&root, "p4.b.[]"),
            vec![TupleOffset(6), Leaf(LeafKind::ArrayHead)]
        );
    }

    #[test]
    fn test_negative_fixed_index_matches_positive() {
        let root = test_static();
        for index in 0..3 {
            assert_eq!(
                compile(&root, &format!("p3.[{}]", index)),
                compile(&root, &format!("p3.[{}]", index - 3))
            );
        }
    }

    #[test]
    fn test_dynamic_paths() {
        let root = test_dynamic();
        assert_eq!(
            compile(&root, "p1"),
            vec![TupleOffset(0), Ref, Leaf(LeafKind::DynamicValue)]
        );
        assert_eq!(
            compile(&root, "p1.[0:5]"),
            vec![
                TupleOffset(0),
                Ref,
                Leaf(LeafKind::DynamicValue),
                Slice { start: 0, end: 5 }
            ]
        );
        assert_eq!(
            compile(&root, "p2.[-1]"),
            vec![
                TupleOffset(1),
                Ref,
                ArrayOffset {
                    index: -1,
                    item_weight: 1
                },
                Leaf(LeafKind::StaticValue)
            ]
        );
        assert_eq!(
            compile(&root, "p3.b"),
            vec![
                TupleOffset(2),
                Ref,
                TupleOffset(1),
                Leaf(LeafKind::StaticValue)
            ]
        );
        assert_eq!(
            compile(&root, "p3.c.[-3:-1]"),
            vec![
                TupleOffset(2),
                Ref,
                TupleOffset(2),
                Ref,
                Leaf(LeafKind::DynamicValue),
                Slice { start: -3, end: -1 }
            ]
        );
    }

    #[test]
    fn test_nested_arrays() {
        // test_array2(uint256[2][3][] p1)
        let root = AbiType::tuple(
            "test_array2",
            vec![array(
                "p1",
                array("", array("", uint(), Some(2)), Some(3)),
                None,
            )],
        );
        assert_eq!(
            compile(&root, "p1.[1].[2].[1]"),
            vec![
                TupleOffset(0),
                Ref,
                ArrayOffset {
                    index: 1,
                    item_weight: 6
                },
                TupleOffset(4),
                TupleOffset(1),
                Leaf(LeafKind::StaticValue)
            ]
        );
        assert_eq!(
            compile(&root, "p1.[0].[-1].[0]"),
            compile(&root, "p1.[0].[2].[0]")
        );
    }

    #[test]
    fn test_dynamic_elements() {
        // f(string[] names, bytes[2] blobs)
        let root = AbiType::tuple(
            "f",
            vec![
                array("names", AbiType::leaf("", "string"), None),
                array("blobs", AbiType::leaf("", "bytes"), Some(2)),
            ],
        );
        assert_eq!(
            compile(&root, "names.[2]"),
            vec![
                TupleOffset(0),
                Ref,
                ArrayOffset {
                    index: 2,
                    item_weight: 1
                },
                Ref,
                Leaf(LeafKind::DynamicValue)
            ]
        );
        assert_eq!(
            compile(&root, "blobs.[-1]"),
            vec![
                TupleOffset(1),
                Ref,
                TupleOffset(1),
                Ref,
                Leaf(LeafKind::DynamicValue)
            ]
        );
    }

    #[test]
    fn test_compile_errors() {
        let root = test_dynamic();
        assert!(matches!(compile_error(&root, ""), EmptyPath));
        assert!(matches!(compile_error(&root, "[]"), EmptyPath));
        assert!(matches!(
            compile_error(&root, "p9"),
            UndefinedField { name } if name == "p9"
        ));
        assert!(matches!(compile_error(&root, "p3.[0]"), NotAnArray));
        assert!(matches!(compile_error(&root, "[0]"), NotAnArray));
        assert!(matches!(
            compile_error(&root, "p2.x"),
            NotATuple { field_name } if field_name == "x"
        ));
        assert!(matches!(compile_error(&root, "p1.x"), NotATuple { .. }));
        assert!(matches!(compile_error(&root, "p3.[0:1]"), InvalidSlice));
        assert!(matches!(compile_error(&root, "p2.[0].[]"), InvalidSlice));
        assert!(matches!(compile_error(&root, "p3.a.[0:1]"), InvalidSlice));
        assert!(matches!(compile_error(&root, "p1.[0:"), ParseError(_)));
        assert!(matches!(
            compile_error(&root, "p2.[40000]"),
            ValueOutOfRange { value: 40000 }
        ));
        assert!(matches!(
            compile_error(&root, "p1.[0:-40000]"),
            ValueOutOfRange { .. }
        ));

        let root = test_static();
        assert!(matches!(
            compile_error(&root, "p3.[3]"),
            IndexOutOfBounds {
                index: 3,
                length: 3
            }
        ));
        assert!(matches!(
            compile_error(&root, "p3.[-4]"),
            IndexOutOfBounds { .. }
        ));
        assert!(matches!(compile_error(&root, "p4.[]"), InvalidSlice));
        assert!(matches!(compile_error(&root, "p1.[]"), InvalidSlice));
    }

    #[test]
    fn test_empty_tuples() {
        // f()
        let root = AbiType::tuple("f", vec![]);
        assert!(matches!(
            compile_error(&root, "p1"),
            UndefinedField { name } if name == "p1"
        ));

        // g(uint256 a, () e, uint256 b)
        let root = AbiType::tuple(
            "g",
            vec![
                AbiType::leaf("a", "uint256"),
                AbiType::tuple("e", vec![]),
                AbiType::leaf("b", "uint256"),
            ],
        );
        assert_eq!(
            compile(&root, "b"),
            vec![TupleOffset(1), Leaf(LeafKind::StaticValue)]
        );
        assert_eq!(
            compile(&root, "e"),
            vec![TupleOffset(1), Leaf(LeafKind::TupleHead)]
        );
    }

    #[test]
    fn test_compile_error_names_source() {
        let root = test_static();
        let error = SigningPath::compile(&root, "p4.z").unwrap_err();
        assert_eq!(
            error.to_string(),
            "while compiling 'p4.z':\n  undefined field z"
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        let root = test_dynamic();
        let first = SigningPath::compile(&root, "p3.c.[1:2]").unwrap();
        let second = SigningPath::compile(&root, "p3.c.[1:2]").unwrap();
        assert_eq!(first.to_bytes(), second.to_bytes());
        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(first.source(), "p3.c.[1:2]");
    }
}
