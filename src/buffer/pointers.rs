//! Cursor buffers of native pointers

use std::ptr;

use super::{custom::CustomBuffer, Element};
use crate::{error::Result, layout::POINTER_SIZE, pointer::Pointer};

/// Pointer-sized element kind
#[derive(Debug)]
pub enum PointerElement {}

impl Element for PointerElement {
    const KIND: &'static str = "Pointer";

    #[inline]
    fn sizeof() -> usize {
        POINTER_SIZE
    }
}

/// Cursor buffer of native addresses
pub type PointerBuffer = CustomBuffer<PointerElement>;

impl CustomBuffer<PointerElement> {
    #[inline]
    fn read(&self, index: usize) -> usize {
        unsafe { ptr::read_unaligned(self.element_address(index) as *const usize) }
    }

    #[inline]
    fn write(&self, index: usize, value: usize) {
        unsafe { ptr::write_unaligned(self.element_address(index) as *mut usize, value) }
    }

    /// Address at the position, then advance
    pub fn get(&mut self) -> Result<usize> {
        let index = self.next_get_index()?;
        Ok(self.read(index))
    }

    pub fn get_at(&self, index: usize) -> Result<usize> {
        let index = self.check_index(index)?;
        Ok(self.read(index))
    }

    /// Store `value` at the position, then advance
    pub fn put(&mut self, value: usize) -> Result<&mut Self> {
        let index = self.next_put_index()?;
        self.write(index, value);
        Ok(self)
    }

    pub fn put_at(&mut self, index: usize, value: usize) -> Result<&mut Self> {
        let index = self.check_index(index)?;
        self.write(index, value);
        Ok(self)
    }

    /// Store the address of `pointer` at the position, then advance
    pub fn put_pointer<P: Pointer + ?Sized>(&mut self, pointer: &P) -> Result<&mut Self> {
        self.put(pointer.address())
    }

    /// Remaining addresses, without moving the cursor
    pub fn to_vec(&self) -> Vec<usize> {
        (self.position()..self.limit()).map(|i| self.read(i)).collect()
    }
}
