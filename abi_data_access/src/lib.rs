//! Locating values in ABI-encoded call data using signing paths.
//!
//! A signing path is a short binary program that tells a verifier where one argument (or
//! a part of one) lives inside call data, so that it can be found in a single pass without
//! decoding the whole buffer.
//!
//! # Path syntax
//!
//! A path expression is a list of segments separated by `.`:
//! - `name` selects a field of a tuple (the function's argument list is a tuple)
//! - `[i]` selects an array element; negative indices count from the end
//! - a final `[a:b]` narrows a dynamic value to the bytes `a..b`
//! - a final `[]` selects the whole value
//!
//! For example `order.items.[-1].data.[0:4]` selects the first four bytes of the `data`
//! field of the last element of `order.items`.
//!
//! # Example
//!
//! ```
//! use abi_data_access::{ApplyValue, SigningPath};
//! use abi_layout::AbiLayout;
//!
//! let layout = AbiLayout::from_json(
//!     r#"[{"type": "function", "name": "f", "inputs": [{"name": "p1", "type": "uint256[]"}]}]"#,
//! )
//! .unwrap();
//! let path = SigningPath::compile_in(&layout, "f", "p1.[0]").unwrap();
//! assert_eq!(path.to_string(), "(0).[0]s");
//!
//! let mut call_data = vec![0u8; 96];
//! call_data[31] = 0x20; // offset of p1
//! call_data[63] = 1; // length of p1
//! call_data[95] = 42; // p1[0]
//! match path.apply(&call_data).unwrap() {
//!     ApplyValue::Static(word) => assert_eq!(word[31], 42),
//!     value => panic!("unexpected value {}", value),
//! }
//! ```

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub use apply::*;
pub use data_path_cache::*;
pub use error::*;
pub use signing_path::*;

mod apply;
mod compile;
mod data_path_cache;
mod error;
mod parse;
mod signing_path;
