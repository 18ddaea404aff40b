//! Struct and union layout computation

use std::mem::{align_of, size_of};

use super::{
    align_up,
    member::{Layout, LayoutKind, Member, MemberSpec},
    DEFAULT_ALIGN_AS, DEFAULT_PACK_ALIGNMENT, POINTER_SIZE,
};

/// Compute a struct layout
///
/// Each member lands at the first offset past the previous member that
/// satisfies its effective alignment; the total size is padded to the layout
/// alignment. A non-zero `align_as` is a floor for the layout alignment.
pub fn struct_layout(pack_alignment: usize, align_as: usize, specs: &[MemberSpec]) -> Layout {
    let mut members = Vec::with_capacity(specs.len());
    let mut size = 0;
    let mut alignment = align_as;

    for spec in specs {
        let mut member = spec.to_member();
        let member_alignment = member.effective_alignment(pack_alignment);

        member.offset = align_up(size, member_alignment);
        size = member.end();
        alignment = alignment.max(member_alignment);

        members.push(member);
        if let Some(nested) = spec.nested() {
            splice_nested(&mut members, nested, member.offset);
        }
    }

    Layout {
        kind: LayoutKind::Struct,
        size: align_up(size, alignment.max(1)),
        alignment: alignment.max(1),
        forced_alignment: align_as != 0,
        members,
    }
}

/// Compute a union layout
///
/// All members sit at offset 0; size and alignment are the member maxima.
pub fn union_layout(pack_alignment: usize, align_as: usize, specs: &[MemberSpec]) -> Layout {
    let mut members = Vec::with_capacity(specs.len());
    let mut size = 0;
    let mut alignment = align_as;

    for spec in specs {
        let member = spec.to_member();
        size = size.max(member.size);
        alignment = alignment.max(member.effective_alignment(pack_alignment));

        members.push(member);
        if let Some(nested) = spec.nested() {
            splice_nested(&mut members, nested, 0);
        }
    }

    Layout {
        kind: LayoutKind::Union,
        size,
        alignment: alignment.max(1),
        forced_alignment: align_as != 0,
        members,
    }
}

fn splice_nested(members: &mut Vec<Member>, nested: &Layout, base: usize) {
    members.extend(nested.members.iter().map(|m| Member {
        offset: base + m.offset,
        ..*m
    }));
}

/// Builder for struct and union layouts
///
/// ```
/// use structmem::layout::LayoutBuilder;
///
/// let layout = LayoutBuilder::structure()
///     .field::<i32>()
///     .field::<i32>()
///     .field::<i32>()
///     .field::<i64>()
///     .build();
/// assert_eq!(layout.size(), 24);
/// assert_eq!(layout.offsetof(3), 16);
/// ```
#[derive(Debug, Clone)]
pub struct LayoutBuilder {
    kind: LayoutKind,
    pack_alignment: usize,
    align_as: usize,
    specs: Vec<MemberSpec>,
}

impl LayoutBuilder {
    pub fn new(kind: LayoutKind) -> Self {
        Self {
            kind,
            pack_alignment: DEFAULT_PACK_ALIGNMENT,
            align_as: DEFAULT_ALIGN_AS,
            specs: Vec::new(),
        }
    }

    /// Start a struct layout
    pub fn structure() -> Self {
        Self::new(LayoutKind::Struct)
    }

    /// Start a union layout
    pub fn union() -> Self {
        Self::new(LayoutKind::Union)
    }

    /// Maximum alignment honored for non-forced members
    pub fn pack_alignment(mut self, pack_alignment: usize) -> Self {
        self.pack_alignment = pack_alignment;
        self
    }

    /// Minimum alignment of the whole layout, 0 for none
    pub fn align_as(mut self, align_as: usize) -> Self {
        self.align_as = align_as;
        self
    }

    pub fn member(mut self, spec: MemberSpec) -> Self {
        self.specs.push(spec);
        self
    }

    /// Scalar aligned to its own size
    pub fn scalar(self, size: usize) -> Self {
        self.scalar_aligned(size, size)
    }

    pub fn scalar_aligned(self, size: usize, alignment: usize) -> Self {
        self.member(MemberSpec::Scalar {
            size,
            alignment,
            force_alignment: false,
        })
    }

    /// Scalar whose alignment ignores the pack alignment
    pub fn scalar_forced(self, size: usize, alignment: usize) -> Self {
        self.member(MemberSpec::Scalar {
            size,
            alignment,
            force_alignment: true,
        })
    }

    /// Scalar with the native size and alignment of `T`
    pub fn field<T>(self) -> Self {
        self.scalar_aligned(size_of::<T>(), align_of::<T>())
    }

    /// Native pointer
    pub fn pointer(self) -> Self {
        self.scalar(POINTER_SIZE)
    }

    pub fn padding(self, size: usize) -> Self {
        self.member(MemberSpec::Padding { size })
    }

    /// Padding that collapses to zero bytes when `condition` is false
    pub fn padding_if(self, size: usize, condition: bool) -> Self {
        self.padding(if condition { size } else { 0 })
    }

    pub fn array(self, element_size: usize, element_alignment: usize, length: usize) -> Self {
        self.member(MemberSpec::Array {
            element_size,
            element_alignment,
            length,
        })
    }

    /// Inline array of `length` values of `T`
    pub fn array_of<T>(self, length: usize) -> Self {
        self.array(size_of::<T>(), align_of::<T>(), length)
    }

    pub fn nested(self, layout: Layout) -> Self {
        self.member(MemberSpec::Nested(layout))
    }

    pub fn build(self) -> Layout {
        match self.kind {
            LayoutKind::Struct => struct_layout(self.pack_alignment, self.align_as, &self.specs),
            LayoutKind::Union => union_layout(self.pack_alignment, self.align_as, &self.specs),
        }
    }
}
