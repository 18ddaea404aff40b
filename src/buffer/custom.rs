//! Cursor state machine over a raw address range

use std::{fmt, marker::PhantomData, ptr};

use super::Element;
use crate::{
    allocators::{Allocator, AllocatorExt},
    checks::{check_address, check_argument, check_index, CheckMode},
    error::{Result, StructMemError},
    pointer::{Container, Pointer},
};

/// Buffer of `capacity` elements of kind `E` starting at a raw address
///
/// Invariant: `mark <= position <= limit <= capacity`, with the mark optional.
/// Slices and duplicates share the backing memory but carry an independent
/// cursor. The buffer is not synchronized; concurrent use of one instance is
/// undefined, disjoint slices may be used from different threads.
///
/// With [`CheckMode::Unchecked`] preconditions are not validated and an
/// out-of-range call accesses memory outside the buffer.
pub struct CustomBuffer<E: Element> {
    address: usize,
    container: Option<Container>,
    mark: Option<usize>,
    position: usize,
    limit: usize,
    capacity: usize,
    mode: CheckMode,
    _element: PhantomData<fn() -> E>,
}

impl<E: Element> CustomBuffer<E> {
    /// Wrap `capacity` elements at `address`
    ///
    /// # Safety
    /// `address` must be valid for reads and writes of `capacity * sizeof()`
    /// bytes for as long as this buffer or anything derived from it is used.
    pub unsafe fn create(
        address: usize,
        capacity: usize,
        container: Option<Container>,
        mode: CheckMode,
    ) -> Result<Self> {
        check_address(mode, address)?;
        Ok(Self::with_state(address, container, None, 0, capacity, capacity, mode))
    }

    pub(crate) fn with_state(
        address: usize,
        container: Option<Container>,
        mark: Option<usize>,
        position: usize,
        limit: usize,
        capacity: usize,
        mode: CheckMode,
    ) -> Self {
        Self {
            address,
            container,
            mark,
            position,
            limit,
            capacity,
            mode,
            _element: PhantomData,
        }
    }

    /// Byte stride of one element
    #[inline]
    pub fn sizeof(&self) -> usize {
        E::sizeof()
    }

    /// Address of element 0
    #[inline]
    pub fn base_address(&self) -> usize {
        self.address
    }

    pub fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    pub fn check_mode(&self) -> CheckMode {
        self.mode
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.position
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Marked position, if any
    pub fn mark_position(&self) -> Option<usize> {
        self.mark
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.limit - self.position
    }

    #[inline]
    pub fn has_remaining(&self) -> bool {
        self.position < self.limit
    }

    /// Move the position; a mark past the new position is discarded
    pub fn set_position(&mut self, position: usize) -> Result<&mut Self> {
        check_argument(self.mode, position <= self.limit, "position", "exceeds limit")?;
        self.position = position;
        if self.mark.map_or(false, |mark| mark > position) {
            self.mark = None;
        }
        Ok(self)
    }

    /// Move the limit, pulling position and mark inside it
    pub fn set_limit(&mut self, limit: usize) -> Result<&mut Self> {
        check_argument(self.mode, limit <= self.capacity, "limit", "exceeds capacity")?;
        self.limit = limit;
        if self.position > limit {
            self.position = limit;
        }
        if self.mark.map_or(false, |mark| mark > limit) {
            self.mark = None;
        }
        Ok(self)
    }

    /// Remember the current position
    pub fn mark(&mut self) -> &mut Self {
        self.mark = Some(self.position);
        self
    }

    /// Return to the marked position
    pub fn reset(&mut self) -> Result<&mut Self> {
        match self.mark {
            Some(mark) => {
                self.position = mark;
                Ok(self)
            }
            None => Err(StructMemError::InvalidMarkState),
        }
    }

    /// Reset the cursor to the full capacity; memory is left untouched
    pub fn clear(&mut self) -> &mut Self {
        self.position = 0;
        self.limit = self.capacity;
        self.mark = None;
        self
    }

    /// Switch from writing to reading the written prefix
    pub fn flip(&mut self) -> &mut Self {
        self.limit = self.position;
        self.position = 0;
        self.mark = None;
        self
    }

    pub fn rewind(&mut self) -> &mut Self {
        self.position = 0;
        self.mark = None;
        self
    }

    /// Address of element `index`, unchecked
    #[inline]
    pub fn element_address(&self, index: usize) -> usize {
        self.address + index * E::sizeof()
    }

    /// Claim the current position for a relative read
    #[inline]
    pub(crate) fn next_get_index(&mut self) -> Result<usize> {
        if self.mode.enabled() && self.position >= self.limit {
            return Err(StructMemError::underflow(self.position, self.limit));
        }
        let index = self.position;
        self.position += 1;
        Ok(index)
    }

    /// Claim the current position for a relative write
    #[inline]
    pub(crate) fn next_put_index(&mut self) -> Result<usize> {
        if self.mode.enabled() && self.position >= self.limit {
            return Err(StructMemError::overflow(1, 0));
        }
        let index = self.position;
        self.position += 1;
        Ok(index)
    }

    /// Validate an absolute index against the limit
    #[inline]
    pub(crate) fn check_index(&self, index: usize) -> Result<usize> {
        check_index(self.mode, index, self.limit)
    }

    /// Buffer over the remaining elements, sharing memory
    pub fn slice(&self) -> Self {
        let remaining = self.remaining();
        Self::with_state(
            self.element_address(self.position),
            self.container.clone(),
            None,
            0,
            remaining,
            remaining,
            self.mode,
        )
    }

    /// Buffer of `capacity` elements starting `offset` past the position
    pub fn slice_range(&self, offset: usize, capacity: usize) -> Result<Self> {
        check_argument(self.mode, offset <= self.limit, "offset", "exceeds limit")?;
        let start = self.position + offset;
        check_argument(
            self.mode,
            capacity <= self.capacity.saturating_sub(start),
            "capacity",
            "slice ends past the capacity",
        )?;
        Ok(Self::with_state(
            self.element_address(start),
            self.container.clone(),
            None,
            0,
            capacity,
            capacity,
            self.mode,
        ))
    }

    /// Independent cursor over the same window
    pub fn duplicate(&self) -> Self {
        Self::with_state(
            self.address,
            self.container.clone(),
            self.mark,
            self.position,
            self.limit,
            self.capacity,
            self.mode,
        )
    }

    /// Copy the remaining elements of `src` to this buffer's position
    ///
    /// Only this buffer's position advances; `src` is left as it was. Passing
    /// the buffer to itself is ruled out by the borrow rules.
    pub fn put_buffer(&mut self, src: &Self) -> Result<&mut Self> {
        let n = src.remaining();
        if self.mode.enabled() && self.remaining() < n {
            return Err(StructMemError::overflow(n, self.remaining()));
        }
        unsafe {
            ptr::copy(
                src.address() as *const u8,
                self.address() as *mut u8,
                n * E::sizeof(),
            );
        }
        self.position += n;
        Ok(self)
    }

    /// Move `[position, limit)` to the start and prepare for more writes
    pub fn compact(&mut self) -> &mut Self {
        let remaining = self.remaining();
        unsafe {
            ptr::copy(
                self.address() as *const u8,
                self.address as *mut u8,
                remaining * E::sizeof(),
            );
        }
        self.position = remaining;
        self.limit = self.capacity;
        self.mark = None;
        self
    }

    /// Release the base address to `allocator`
    ///
    /// # Safety
    /// The base address must be a live block of `allocator`. No slice,
    /// duplicate or element view sharing the block may be used afterwards.
    pub unsafe fn free(self, allocator: &dyn Allocator) -> Result<()> {
        log::trace!("freeing {}Buffer at {:#x}", E::KIND, self.address);
        allocator.deallocate_address(self.address)
    }
}

impl<E: Element> Pointer for CustomBuffer<E> {
    /// Address of the element at the current position
    #[inline]
    fn address(&self) -> usize {
        self.element_address(self.position)
    }

    fn kind(&self) -> &'static str {
        E::KIND
    }

    fn base_address(&self) -> usize {
        self.address
    }
}

impl<E: Element> PartialEq for CustomBuffer<E> {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl<E: Element> fmt::Debug for CustomBuffer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomBuffer")
            .field("kind", &E::KIND)
            .field("address", &format_args!("{:#x}", self.address))
            .field("mark", &self.mark)
            .field("position", &self.position)
            .field("limit", &self.limit)
            .field("capacity", &self.capacity)
            .field("mode", &self.mode)
            .finish()
    }
}

impl<E: Element> fmt::Display for CustomBuffer<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Buffer[address=0x{:X}, pos={}, lim={}, cap={}]",
            E::KIND,
            self.address(),
            self.position,
            self.limit,
            self.capacity
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    enum Word {}

    impl Element for Word {
        const KIND: &'static str = "Word";

        fn sizeof() -> usize {
            8
        }
    }

    fn buffer(memory: &mut [u64]) -> CustomBuffer<Word> {
        unsafe { CustomBuffer::create(memory.as_mut_ptr() as usize, memory.len(), None, CheckMode::Checked) }
            .unwrap()
    }

    fn word(buf: &CustomBuffer<Word>, index: usize) -> u64 {
        unsafe { *(buf.element_address(index) as *const u64) }
    }

    fn set_word(buf: &CustomBuffer<Word>, index: usize, value: u64) {
        unsafe { *(buf.element_address(index) as *mut u64) = value }
    }

    #[test]
    fn test_initial_state() {
        let mut memory = [0u64; 4];
        let buf = buffer(&mut memory);
        assert_eq!(buf.position(), 0);
        assert_eq!(buf.limit(), 4);
        assert_eq!(buf.capacity(), 4);
        assert_eq!(buf.mark_position(), None);
        assert_eq!(buf.remaining(), 4);
        assert_eq!(buf.address(), buf.base_address());
    }

    #[test]
    fn test_set_position_and_limit() {
        let mut memory = [0u64; 6];
        let mut buf = buffer(&mut memory);

        buf.set_position(4).unwrap().mark();
        buf.set_position(2).unwrap();
        assert_eq!(buf.mark_position(), None);

        buf.set_position(3).unwrap().mark();
        buf.set_limit(2).unwrap();
        assert_eq!(buf.position(), 2);
        assert_eq!(buf.mark_position(), None);

        assert!(matches!(buf.set_position(3), Err(StructMemError::InvalidArgument { .. })));
        assert!(matches!(buf.set_limit(7), Err(StructMemError::InvalidArgument { .. })));
    }

    #[test]
    fn test_mark_reset() {
        let mut memory = [0u64; 4];
        let mut buf = buffer(&mut memory);
        assert_eq!(buf.reset().unwrap_err(), StructMemError::InvalidMarkState);

        buf.set_position(1).unwrap().mark();
        buf.set_position(3).unwrap();
        buf.reset().unwrap();
        assert_eq!(buf.position(), 1);
    }

    #[test]
    fn test_clear_flip_rewind() {
        let mut memory = [0u64; 4];
        let mut buf = buffer(&mut memory);

        buf.set_position(3).unwrap().mark();
        buf.flip();
        assert_eq!((buf.position(), buf.limit(), buf.mark_position()), (0, 3, None));

        buf.set_position(2).unwrap().mark();
        buf.rewind();
        assert_eq!((buf.position(), buf.limit(), buf.mark_position()), (0, 3, None));

        buf.clear();
        assert_eq!((buf.position(), buf.limit()), (0, 4));
    }

    #[test]
    fn test_relative_index_claims() {
        let mut memory = [0u64; 2];
        let mut buf = buffer(&mut memory);
        assert_eq!(buf.next_put_index().unwrap(), 0);
        assert_eq!(buf.next_put_index().unwrap(), 1);
        assert!(matches!(buf.next_put_index(), Err(StructMemError::Overflow { .. })));

        buf.flip();
        buf.next_get_index().unwrap();
        buf.next_get_index().unwrap();
        assert!(matches!(buf.next_get_index(), Err(StructMemError::Underflow { .. })));
        assert!(matches!(buf.check_index(2), Err(StructMemError::IndexOutOfRange { .. })));
    }

    #[test]
    fn test_slice_shares_memory() {
        let mut memory = [0u64; 6];
        let mut buf = buffer(&mut memory);
        buf.set_position(2).unwrap().set_limit(5).unwrap();

        let slice = buf.slice();
        assert_eq!((slice.position(), slice.limit(), slice.capacity()), (0, 3, 3));
        assert_eq!(slice.base_address(), buf.element_address(2));

        set_word(&slice, 1, 77);
        assert_eq!(word(&buf, 3), 77);
        set_word(&buf, 4, 99);
        assert_eq!(word(&slice, 2), 99);
    }

    #[test]
    fn test_slice_range_bounds() {
        let mut memory = [0u64; 8];
        let mut buf = buffer(&mut memory);
        buf.set_position(2).unwrap().set_limit(6).unwrap();

        let slice = buf.slice_range(1, 5).unwrap();
        assert_eq!(slice.base_address(), buf.element_address(3));
        assert_eq!(slice.capacity(), 5);

        assert!(buf.slice_range(7, 0).is_err());
        assert!(buf.slice_range(5, 1).is_ok());
        assert!(buf.slice_range(4, 2).is_ok());
        assert!(buf.slice_range(4, 3).is_err());
        assert!(buf.slice_range(1, 6).is_err());
    }

    #[test]
    fn test_duplicate_is_independent() {
        let mut memory = [0u64; 4];
        let mut buf = buffer(&mut memory);
        buf.set_position(1).unwrap().mark();
        buf.set_position(2).unwrap();

        let mut dup = buf.duplicate();
        assert_eq!(dup.mark_position(), Some(1));
        assert_eq!(dup, buf);

        dup.set_position(3).unwrap();
        assert_eq!(buf.position(), 2);
        assert_ne!(dup, buf);
    }

    #[test]
    fn test_put_buffer() {
        let mut src_memory = [1u64, 2, 3, 4];
        let mut dst_memory = [0u64; 4];
        let mut src = buffer(&mut src_memory);
        let mut dst = buffer(&mut dst_memory);

        src.set_position(1).unwrap().set_limit(3).unwrap();
        dst.set_position(1).unwrap();
        dst.put_buffer(&src).unwrap();

        assert_eq!(dst.position(), 3);
        assert_eq!(src.position(), 1);
        assert_eq!(word(&dst, 1), 2);
        assert_eq!(word(&dst, 2), 3);

        src.clear();
        assert!(matches!(dst.put_buffer(&src), Err(StructMemError::Overflow { .. })));
    }

    #[test]
    fn test_compact() {
        let mut memory = [0u64, 0, 10, 20, 30, 0];
        let mut buf = buffer(&mut memory);
        buf.set_position(2).unwrap().set_limit(5).unwrap().mark();

        buf.compact();
        assert_eq!((buf.position(), buf.limit(), buf.mark_position()), (3, 6, None));
        assert_eq!([word(&buf, 0), word(&buf, 1), word(&buf, 2)], [10, 20, 30]);
    }

    #[test]
    fn test_unchecked_skips_validation() {
        let mut memory = [0u64; 2];
        let mut buf =
            unsafe { CustomBuffer::<Word>::create(memory.as_mut_ptr() as usize, 2, None, CheckMode::Unchecked) }
                .unwrap();
        assert!(buf.check_index(5).is_ok());
        buf.set_position(2).unwrap();
        assert!(buf.next_get_index().is_ok());
    }

    #[test]
    fn test_display() {
        let mut memory = [0u64; 4];
        let mut buf = buffer(&mut memory);
        buf.set_position(1).unwrap();
        let expected = format!(
            "WordBuffer[address=0x{:X}, pos=1, lim=4, cap=4]",
            buf.base_address() + 8
        );
        assert_eq!(buf.to_string(), expected);
    }
}
