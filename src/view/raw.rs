//! Untyped storage shared by every struct view

use std::{fmt, ptr};

use crate::{
    checks::{check_address, CheckMode},
    error::Result,
    pointer::Container,
};

/// Address, backing container and check mode of one struct instance
///
/// Concrete kinds generated by [`struct_view!`](crate::struct_view) are thin
/// newtypes over this value, so materializing a view is a plain move with no
/// layout work.
#[derive(Clone)]
pub struct RawStruct {
    address: usize,
    container: Option<Container>,
    mode: CheckMode,
}

impl RawStruct {
    /// Wrap `address`
    ///
    /// # Safety
    /// `address` must be valid for reads and writes of the kind's `sizeof()`
    /// bytes for as long as the view (or any view derived from it) is used.
    pub unsafe fn new(address: usize, container: Option<Container>, mode: CheckMode) -> Result<Self> {
        Ok(Self::materialize(check_address(mode, address)?, container, mode))
    }

    #[inline]
    pub(crate) fn materialize(address: usize, container: Option<Container>, mode: CheckMode) -> Self {
        Self {
            address,
            container,
            mode,
        }
    }

    #[inline]
    pub fn address(&self) -> usize {
        self.address
    }

    pub fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    #[inline]
    pub fn check_mode(&self) -> CheckMode {
        self.mode
    }

    /// Read a `T` at `offset` bytes
    ///
    /// # Safety
    /// `offset + size_of::<T>()` must lie within the struct.
    #[inline]
    pub unsafe fn get<T: Copy>(&self, offset: usize) -> T {
        ptr::read_unaligned((self.address + offset) as *const T)
    }

    /// Write a `T` at `offset` bytes
    ///
    /// # Safety
    /// `offset + size_of::<T>()` must lie within the struct.
    #[inline]
    pub unsafe fn set<T: Copy>(&self, offset: usize, value: T) {
        ptr::write_unaligned((self.address + offset) as *mut T, value)
    }

    /// Copy `len` bytes from `src` into this struct
    ///
    /// # Safety
    /// Both ranges must be valid for `len` bytes.
    #[inline]
    pub unsafe fn copy_bytes_from(&self, src: usize, len: usize) {
        ptr::copy(src as *const u8, self.address as *mut u8, len)
    }
}

impl fmt::Debug for RawStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawStruct")
            .field("address", &format_args!("{:#x}", self.address))
            .field("container", &self.container.is_some())
            .field("mode", &self.mode)
            .finish()
    }
}
