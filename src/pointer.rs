//! Raw address views
//!
//! A [`Pointer`] is anything that can report a native address. Views never own
//! the memory they point at; the optional [`Container`] only keeps a backing
//! allocation alive for as long as some view references it.

use std::{any::Any, fmt, sync::Arc};

use crate::{
    checks::{check_address, CheckMode},
    error::Result,
};

/// Backing allocation kept alive by views and buffers over its storage
///
/// The container is stored, never read or written through.
pub type Container = Arc<dyn Any + Send + Sync>;

/// Something with a native memory address
pub trait Pointer {
    /// Current address; cursor buffers report the address of their position
    fn address(&self) -> usize;

    /// Short kind name used in diagnostics
    fn kind(&self) -> &'static str;

    /// Start of the underlying block, what `free` releases
    fn base_address(&self) -> usize {
        self.address()
    }
}

/// Format `<kind> pointer [0x<HEX>]`
pub fn fmt_pointer(f: &mut fmt::Formatter<'_>, kind: &str, address: usize) -> fmt::Result {
    write!(f, "{} pointer [0x{:X}]", kind, address)
}

/// Untyped view of a single address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawPointer {
    address: usize,
}

impl RawPointer {
    /// Wrap `address`; the null address is rejected unless checks are disabled
    pub fn new(address: usize, mode: CheckMode) -> Result<Self> {
        Ok(Self {
            address: check_address(mode, address)?,
        })
    }

    pub fn from_ptr<T>(ptr: *const T, mode: CheckMode) -> Result<Self> {
        Self::new(ptr as usize, mode)
    }

    pub fn is_null(&self) -> bool {
        self.address == 0
    }

    pub fn as_ptr<T>(&self) -> *mut T {
        self.address as *mut T
    }

    /// Same view moved by `bytes`
    pub fn offset(&self, bytes: usize) -> Self {
        Self {
            address: self.address + bytes,
        }
    }
}

impl Pointer for RawPointer {
    #[inline]
    fn address(&self) -> usize {
        self.address
    }

    fn kind(&self) -> &'static str {
        "Raw"
    }
}

impl fmt::Display for RawPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_pointer(f, self.kind(), self.address)
    }
}
