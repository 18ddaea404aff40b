//! Typed views over fixed-layout structs
//!
//! A struct kind is declared with [`struct_view!`](crate::struct_view): the
//! macro computes its [`Layout`] once, on first use, and generates a newtype
//! over [`RawStruct`] implementing [`Struct`]. Accessors are then written
//! against member offsets:
//!
//! ```
//! use structmem::{layout::LayoutBuilder, struct_view, view::Struct};
//!
//! struct_view! {
//!     /// Two 32-bit floats
//!     pub struct Vec2 => LayoutBuilder::structure().field::<f32>().field::<f32>().build();
//! }
//!
//! impl Vec2 {
//!     pub fn x(&self) -> f32 { self.read(Self::offsetof(0)) }
//!     pub fn set_x(&self, x: f32) { self.write(Self::offsetof(0), x) }
//! }
//!
//! let mut storage = [0u64; 1];
//! let v = unsafe { Vec2::create(storage.as_mut_ptr() as usize, None, Default::default()) }.unwrap();
//! v.set_x(1.5);
//! assert_eq!(v.x(), 1.5);
//! ```

pub mod raw;

pub use raw::RawStruct;

use std::mem::size_of;

use crate::{
    allocators::{Allocator, AllocatorExt},
    buffer::Element,
    checks::{assert_member, check_member, CheckMode},
    error::Result,
    layout::{Layout, POINTER_SIZE},
    pointer::{Container, Pointer},
};

/// A struct or union kind with a fixed [`Layout`]
///
/// Views do not own their memory. Creating one is `unsafe` because the caller
/// vouches for the address; every later access trusts that promise, while
/// member offsets are still kept within `sizeof()` bytes.
pub trait Struct: Element + Pointer + Sized {
    /// Layout shared by every instance of the kind
    fn layout() -> &'static Layout;

    fn raw(&self) -> &RawStruct;

    #[doc(hidden)]
    fn from_raw(raw: RawStruct) -> Self;

    fn alignof() -> usize {
        Self::layout().alignment()
    }

    /// Offset of the flattened member at `index`
    fn offsetof(index: usize) -> usize {
        Self::layout().offsetof(index)
    }

    /// Wrap `address`
    ///
    /// # Safety
    /// `address` must be valid for `sizeof()` bytes while the view is used.
    unsafe fn create(address: usize, container: Option<Container>, mode: CheckMode) -> Result<Self> {
        Ok(Self::from_raw(RawStruct::new(address, container, mode)?))
    }

    /// New instance of this kind at `base + index * sizeof()`
    ///
    /// The receiver only serves as a template; its check mode is inherited.
    ///
    /// # Safety
    /// The target element must be valid for `sizeof()` bytes while used.
    unsafe fn wrap(&self, base: usize, index: usize, container: Option<Container>) -> Self {
        Self::from_raw(RawStruct::materialize(
            base + index * Self::sizeof(),
            container,
            self.raw().check_mode(),
        ))
    }

    fn container(&self) -> Option<&Container> {
        self.raw().container()
    }

    fn check_mode(&self) -> CheckMode {
        self.raw().check_mode()
    }

    /// Zero-fill the struct
    fn clear(&self) {
        unsafe { std::ptr::write_bytes(self.address() as *mut u8, 0, Self::sizeof()) }
    }

    /// Whether the pointer member at `member_offset` is null
    ///
    /// Out-of-bounds members are an `InvalidArgument` error in
    /// [`CheckMode::Strict`] and a panic otherwise.
    fn is_null(&self, member_offset: usize) -> Result<bool> {
        check_member(self.check_mode(), member_offset, POINTER_SIZE, Self::sizeof())?;
        assert_member(member_offset, POINTER_SIZE, Self::sizeof());
        Ok(unsafe { self.raw().get::<usize>(member_offset) } == 0)
    }

    /// Read a `T` member
    ///
    /// # Panics
    /// If the member does not lie within the struct.
    fn read<T: Copy>(&self, offset: usize) -> T {
        assert_member(offset, size_of::<T>(), Self::sizeof());
        unsafe { self.raw().get(offset) }
    }

    /// Write a `T` member
    ///
    /// # Panics
    /// If the member does not lie within the struct.
    fn write<T: Copy>(&self, offset: usize, value: T) {
        assert_member(offset, size_of::<T>(), Self::sizeof());
        unsafe { self.raw().set(offset, value) }
    }

    /// Read a `T` member, `InvalidArgument` if it does not lie within the struct
    fn try_read<T: Copy>(&self, offset: usize) -> Result<T> {
        check_member(CheckMode::Strict, offset, size_of::<T>(), Self::sizeof())?;
        Ok(unsafe { self.raw().get(offset) })
    }

    /// Write a `T` member, `InvalidArgument` if it does not lie within the struct
    fn try_write<T: Copy>(&self, offset: usize, value: T) -> Result<()> {
        check_member(CheckMode::Strict, offset, size_of::<T>(), Self::sizeof())?;
        unsafe { self.raw().set(offset, value) };
        Ok(())
    }

    /// Read a pointer member, validated like [`Struct::is_null`]
    fn read_address(&self, member_offset: usize) -> Result<usize> {
        check_member(self.check_mode(), member_offset, POINTER_SIZE, Self::sizeof())?;
        assert_member(member_offset, POINTER_SIZE, Self::sizeof());
        Ok(unsafe { self.raw().get::<usize>(member_offset) })
    }

    /// Write a pointer member, validated like [`Struct::is_null`]
    fn write_address(&self, member_offset: usize, address: usize) -> Result<()> {
        check_member(self.check_mode(), member_offset, POINTER_SIZE, Self::sizeof())?;
        assert_member(member_offset, POINTER_SIZE, Self::sizeof());
        unsafe { self.raw().set::<usize>(member_offset, address) };
        Ok(())
    }

    /// Byte-copy `other` into this struct
    fn copy_from(&self, other: &Self) {
        unsafe { self.raw().copy_bytes_from(other.address(), Self::sizeof()) }
    }

    /// The struct's bytes
    fn bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.address() as *const u8, Self::sizeof()) }
    }

    /// Release the struct's address to `allocator`
    ///
    /// # Safety
    /// The address must be a live block of `allocator`. No clone of this view,
    /// nor any other view or buffer over the block, may be used afterwards.
    unsafe fn free(self, allocator: &dyn Allocator) -> Result<()> {
        log::trace!("freeing {} at {:#x}", Self::KIND, self.address());
        allocator.deallocate_address(self.address())
    }
}

/// Declare a struct kind with a lazily computed, shared layout
///
/// Generates a newtype over [`RawStruct`] with [`Struct`], [`Element`],
/// [`Pointer`], `Clone`, `PartialEq`, `Debug` and `Display` implementations.
/// Equality compares addresses.
#[macro_export]
macro_rules! struct_view {
    ($(#[$meta:meta])* $vis:vis struct $name:ident => $layout:expr;) => {
        $(#[$meta])*
        #[derive(Clone)]
        $vis struct $name($crate::view::RawStruct);

        impl $crate::buffer::Element for $name {
            const KIND: &'static str = stringify!($name);

            #[inline]
            fn sizeof() -> usize {
                <$name as $crate::view::Struct>::layout().size()
            }
        }

        impl $crate::view::Struct for $name {
            fn layout() -> &'static $crate::layout::Layout {
                $crate::lazy_static::lazy_static! {
                    static ref LAYOUT: $crate::layout::Layout = $layout;
                }
                &LAYOUT
            }

            #[inline]
            fn raw(&self) -> &$crate::view::RawStruct {
                &self.0
            }

            #[inline]
            fn from_raw(raw: $crate::view::RawStruct) -> Self {
                Self(raw)
            }
        }

        impl $crate::pointer::Pointer for $name {
            #[inline]
            fn address(&self) -> usize {
                self.0.address()
            }

            fn kind(&self) -> &'static str {
                stringify!($name)
            }
        }

        impl ::std::cmp::PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.0.address() == other.0.address()
            }
        }

        impl ::std::cmp::Eq for $name {}

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("address", &format_args!("{:#x}", self.0.address()))
                    .finish()
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                $crate::pointer::fmt_pointer(f, stringify!($name), self.0.address())
            }
        }
    };
}
