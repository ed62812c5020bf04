//! Command-line arguments live in the `lotedit-cli` crate so build.rs can
//! generate the manpage from them.
pub use lotedit_cli::{Args, Column};
