//! Representation of contract argument types, as laid out in ABI-encoded call data.

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub use data_type::*;
pub use descriptor::*;
pub use error::*;

mod data_type;
mod descriptor;
mod error;
