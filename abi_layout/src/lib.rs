//! Loading function argument layouts from a JSON interface description.

#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

pub use error::*;
pub use layout::*;

mod error;
mod layout;
