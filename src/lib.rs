//! # structmem - Structured Access to Raw Memory
//!
//! structmem describes fixed-layout binary structures (C-style structs and
//! unions with alignment and packing rules) and reads and writes them
//! directly at raw memory addresses, either one at a time or as fixed-stride
//! runs behind a position/limit/mark cursor.
//!
//! ## Features
//!
//! - **Layout engine**: struct/union offsets, sizes and alignments with pack
//!   alignment, forced member alignment and `align_as` floors
//! - **Struct views**: zero-copy typed views materialized at any address
//! - **Cursor buffers**: standard buffer cursor semantics over raw addresses,
//!   with slicing, duplication, compaction and bulk transfer
//! - **Split traversal**: element iteration partitionable into disjoint halves
//! - **Check modes**: precondition validation that can be switched off
//! - **Ownership options**: manual `free`, container-backed blocks, or an
//!   arena of generation-tagged handles
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────────────────────────┐
//! │ Layout       │──▶│ Struct views (view)                  │
//! │ engine       │   │   RawStruct + per-kind Layout        │
//! └──────────────┘   └──────────────────────────────────────┘
//!                                   │
//!                                   ▼
//! ┌──────────────┐   ┌──────────────────────────────────────┐
//! │ Checks       │──▶│ Cursor buffers (buffer)              │
//! │ (CheckMode)  │   │   CustomBuffer / StructBuffer        │
//! └──────────────┘   └──────────────────────────────────────┘
//!                                   │
//!                                   ▼
//!                    ┌──────────────────────────────────────┐
//!                    │ MemoryManager / Arena / allocators   │
//!                    └──────────────────────────────────────┘
//! ```
//!
//! Views and buffers do not synchronize; sharing one instance across threads
//! requires external synchronization.

pub mod allocators;
pub mod arena;
pub mod buffer;
pub mod checks;
pub mod error;
pub mod layout;
pub mod memory;
pub mod pointer;
pub mod view;

#[doc(hidden)]
pub use lazy_static;

// Main API re-exports
pub use allocators::{Allocator, AllocatorExt, HeapAllocator, StackAllocator};
pub use arena::{Arena, Handle};
pub use buffer::{CustomBuffer, Element, Elements, PointerBuffer, StructBuffer};
pub use checks::CheckMode;
pub use error::{Result, StructMemError};
pub use layout::{Layout, LayoutBuilder, LayoutKind, Member, MemberSpec};
pub use memory::{Block, MappedRegion, MemoryConfig, MemoryManager};
pub use pointer::{Container, Pointer, RawPointer};
pub use view::{RawStruct, Struct};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration constants
pub mod config {
    /// Default minimum alignment of allocated blocks
    pub const DEFAULT_ALIGNMENT: usize = 16;
}
