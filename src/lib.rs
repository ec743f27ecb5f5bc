//! charcard imports roleplay character cards.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`character`] owns the pure import core: the PNG `tEXt` extractor, the
//!   schema normalizer that resolves key aliases across card formats, and the
//!   world-book store that embedded lorebooks are merged into.
//! - [`core`] holds configuration loading and saving.
//! - [`cli`] parses arguments and drives imports from the binary.
//! - [`utils`] carries the diagnostic logging bootstrap.
//!
//! Library callers normally need only [`character::decode_source`] or
//! [`character::normalize`]; nothing in [`character`] touches global state.

pub mod character;
pub mod cli;
pub mod core;
pub mod utils;
