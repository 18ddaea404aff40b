//! Host allocators backing views and cursor buffers

pub mod heap;
pub mod stack;
pub mod traits;

pub use heap::HeapAllocator;
pub use stack::{StackAllocator, StackFrame};
pub use traits::{Allocator, AllocatorExt};
