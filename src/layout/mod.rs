//! Layout engine for fixed-layout binary structures
//!
//! A [`Layout`] is computed once per structure kind from an ordered list of
//! [`MemberSpec`]s and shared by every view of that kind. Nested layouts are
//! flattened into the parent's member list so member offsets can be looked up
//! by flat index.

pub mod builder;
pub mod member;

pub use builder::{struct_layout, union_layout, LayoutBuilder};
pub use member::{Layout, LayoutKind, Member, MemberSpec};

/// Default maximum alignment honored for ordinary members
#[cfg(windows)]
pub const DEFAULT_PACK_ALIGNMENT: usize = 8;

/// Default maximum alignment honored for ordinary members
#[cfg(not(windows))]
pub const DEFAULT_PACK_ALIGNMENT: usize = 1 << 30;

/// No minimum alignment floor
pub const DEFAULT_ALIGN_AS: usize = 0;

/// Size of a native pointer in bytes
pub const POINTER_SIZE: usize = std::mem::size_of::<usize>();

/// Round `value` up to a multiple of the power-of-two `alignment`
///
/// `align_up(0, a)` is 0.
#[inline]
pub const fn align_up(value: usize, alignment: usize) -> usize {
    (value.wrapping_sub(1) | (alignment - 1)).wrapping_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 4), 12);
        assert_eq!(align_up(13, 1), 13);
    }
}
