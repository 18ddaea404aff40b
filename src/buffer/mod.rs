//! Cursor buffers over fixed-stride element runs
//!
//! [`CustomBuffer`] carries the `(mark, position, limit, capacity)` cursor of a
//! standard I/O buffer but addresses raw memory: element `i` lives at
//! `base + i * sizeof()`. [`StructBuffer`] and [`PointerBuffer`] are the
//! struct and pointer-sized specializations.

pub mod custom;
pub mod pointers;
pub mod structs;

pub use custom::CustomBuffer;
pub use pointers::{PointerBuffer, PointerElement};
pub use structs::{Elements, StructBuffer};

/// Element kind of a cursor buffer
///
/// The stride is a property of the kind, never stored per buffer.
pub trait Element {
    /// Kind name used in diagnostics
    const KIND: &'static str;

    /// Byte stride of one element
    fn sizeof() -> usize;
}
