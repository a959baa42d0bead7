//! Frame-by-frame pose evaluation for 2D skeletal character rigs.
//!
//! This crate is renderer-agnostic: it consumes an already-parsed, validated
//! skeleton definition and exposes the evaluated per-frame pose (bone world
//! transforms, slot color/attachment state, deformed vertex buffers, draw order)
//! for an external renderer to consume.

#![forbid(unsafe_code)]

mod error;
mod interp;
mod model;
mod render;
mod runtime;

pub use error::*;
pub use interp::*;
pub use model::*;
pub use render::*;
pub use runtime::*;
