//! Member and layout descriptions

use std::fmt;

/// A positioned member of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Member {
    /// Size in bytes
    pub size: usize,
    /// Declared alignment in bytes, a power of two
    pub alignment: usize,
    /// Honor `alignment` regardless of the pack alignment
    pub forced_alignment: bool,
    /// Byte offset within the outermost layout
    pub offset: usize,
}

impl Member {
    /// Alignment applied under the given pack alignment
    #[inline]
    pub fn effective_alignment(&self, pack_alignment: usize) -> usize {
        if self.forced_alignment {
            self.alignment
        } else {
            self.alignment.min(pack_alignment)
        }
    }

    /// One past the last byte of this member
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.size
    }
}

/// Declarative member descriptor consumed by the layout builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberSpec {
    /// Scalar value such as an integer, float or pointer
    Scalar {
        size: usize,
        alignment: usize,
        force_alignment: bool,
    },
    /// Explicit padding bytes
    Padding { size: usize },
    /// Fixed-length inline array
    Array {
        element_size: usize,
        element_alignment: usize,
        length: usize,
    },
    /// Nested struct or union
    Nested(Layout),
}

impl MemberSpec {
    pub(crate) fn to_member(&self) -> Member {
        match self {
            MemberSpec::Scalar {
                size,
                alignment,
                force_alignment,
            } => Member {
                size: *size,
                alignment: *alignment,
                forced_alignment: *force_alignment,
                offset: 0,
            },
            MemberSpec::Padding { size } => Member {
                size: *size,
                alignment: 1,
                forced_alignment: false,
                offset: 0,
            },
            MemberSpec::Array {
                element_size,
                element_alignment,
                length,
            } => Member {
                size: element_size * length,
                alignment: *element_alignment,
                forced_alignment: false,
                offset: 0,
            },
            MemberSpec::Nested(layout) => layout.as_member(),
        }
    }

    pub(crate) fn nested(&self) -> Option<&Layout> {
        match self {
            MemberSpec::Nested(layout) => Some(layout),
            _ => None,
        }
    }
}

/// Struct or union composition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    Struct,
    Union,
}

/// Computed layout of a struct or union
///
/// `members` is the flattened list: every nested layout member is followed by
/// its own (already flattened) members, shifted to absolute offsets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub(crate) kind: LayoutKind,
    pub(crate) size: usize,
    pub(crate) alignment: usize,
    pub(crate) forced_alignment: bool,
    pub(crate) members: Vec<Member>,
}

impl Layout {
    pub fn kind(&self) -> LayoutKind {
        self.kind
    }

    /// Total size including tail padding
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn alignment(&self) -> usize {
        self.alignment
    }

    /// Whether an `align_as` override was applied
    pub fn is_forced(&self) -> bool {
        self.forced_alignment
    }

    /// Number of flattened members
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn member(&self, index: usize) -> Option<&Member> {
        self.members.get(index)
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    /// Offset of the flattened member at `index`
    ///
    /// # Panics
    /// If `index >= member_count()`.
    #[inline]
    pub fn offsetof(&self, index: usize) -> usize {
        self.members[index].offset
    }

    /// This layout viewed as a member of an enclosing layout
    pub fn as_member(&self) -> Member {
        Member {
            size: self.size,
            alignment: self.alignment,
            forced_alignment: self.forced_alignment,
            offset: 0,
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            LayoutKind::Struct => "struct",
            LayoutKind::Union => "union",
        };
        write!(f, "{} {{ size: {}, align: {}, members: [", kind, self.size, self.alignment)?;
        for (i, m) in self.members.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}@{}", m.size, m.offset)?;
        }
        write!(f, "] }}")
    }
}
