//! Cursor buffers of struct views

use std::{iter::FusedIterator, marker::PhantomData};

use super::custom::CustomBuffer;
use crate::{
    checks::CheckMode,
    error::Result,
    pointer::Container,
    view::{RawStruct, Struct},
};

/// Cursor buffer whose elements are struct views
///
/// Element views are materialized on demand and alias the buffer memory.
pub type StructBuffer<S> = CustomBuffer<S>;

impl<S: Struct> CustomBuffer<S> {
    #[inline]
    fn element(&self, index: usize) -> S {
        S::from_raw(RawStruct::materialize(
            self.element_address(index),
            self.container().cloned(),
            self.check_mode(),
        ))
    }

    /// View of the element at the position, then advance
    pub fn get(&mut self) -> Result<S> {
        let index = self.next_get_index()?;
        Ok(self.element(index))
    }

    /// View of the element at `index`
    pub fn get_at(&self, index: usize) -> Result<S> {
        let index = self.check_index(index)?;
        Ok(self.element(index))
    }

    /// Copy the element at the position into `dest`, then advance
    pub fn get_into(&mut self, dest: &S) -> Result<&mut Self> {
        let index = self.next_get_index()?;
        dest.copy_from(&self.element(index));
        Ok(self)
    }

    /// Copy the element at `index` into `dest`
    pub fn get_at_into(&self, index: usize, dest: &S) -> Result<()> {
        let index = self.check_index(index)?;
        dest.copy_from(&self.element(index));
        Ok(())
    }

    /// Copy `value` to the position, then advance
    pub fn put(&mut self, value: &S) -> Result<&mut Self> {
        let index = self.next_put_index()?;
        self.element(index).copy_from(value);
        Ok(self)
    }

    /// Copy `value` to `index`
    pub fn put_at(&mut self, index: usize, value: &S) -> Result<&mut Self> {
        let index = self.check_index(index)?;
        self.element(index).copy_from(value);
        Ok(self)
    }

    /// Run `f` on the element at the position, then advance
    pub fn apply<F: FnOnce(S)>(&mut self, f: F) -> Result<&mut Self> {
        let index = self.next_get_index()?;
        f(self.element(index));
        Ok(self)
    }

    /// Run `f` on the element at `index`
    pub fn apply_at<F: FnOnce(S)>(&mut self, index: usize, f: F) -> Result<&mut Self> {
        let index = self.check_index(index)?;
        f(self.element(index));
        Ok(self)
    }

    /// Traverse `[position, limit)` without moving the cursor
    pub fn iter(&self) -> Elements<'_, S> {
        Elements {
            address: self.base_address(),
            container: self.container().cloned(),
            mode: self.check_mode(),
            index: self.position(),
            fence: self.limit(),
            _buffer: PhantomData,
        }
    }
}

impl<'a, S: Struct> IntoIterator for &'a CustomBuffer<S> {
    type Item = S;
    type IntoIter = Elements<'a, S>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Lazy traversal over an index range of a struct buffer
///
/// Can be split at the midpoint into two halves over disjoint index ranges,
/// each reporting its exact length, for static partitioning across threads.
pub struct Elements<'a, S: Struct> {
    address: usize,
    container: Option<Container>,
    mode: CheckMode,
    index: usize,
    fence: usize,
    _buffer: PhantomData<&'a CustomBuffer<S>>,
}

impl<'a, S: Struct> Elements<'a, S> {
    /// Remaining index range
    pub fn range(&self) -> std::ops::Range<usize> {
        self.index..self.fence
    }

    /// Split off the lower half
    ///
    /// Returns `[lo, mid)` and keeps `[mid, hi)`, or `None` when fewer than two
    /// elements remain.
    pub fn try_split(&mut self) -> Option<Self> {
        let lo = self.index;
        let mid = lo + (self.fence - lo) / 2;
        if mid <= lo {
            return None;
        }
        self.index = mid;
        Some(Self {
            address: self.address,
            container: self.container.clone(),
            mode: self.mode,
            index: lo,
            fence: mid,
            _buffer: PhantomData,
        })
    }

    /// Split into `[lo, mid)` and `[mid, hi)`
    pub fn split_at_midpoint(mut self) -> (Self, Self) {
        match self.try_split() {
            Some(prefix) => (prefix, self),
            None => {
                let empty = Self {
                    index: self.index,
                    fence: self.index,
                    container: self.container.clone(),
                    ..self
                };
                (empty, self)
            }
        }
    }

    #[inline]
    fn element(&self, index: usize) -> S {
        S::from_raw(RawStruct::materialize(
            self.address + index * S::sizeof(),
            self.container.clone(),
            self.mode,
        ))
    }
}

impl<S: Struct> Iterator for Elements<'_, S> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        if self.index >= self.fence {
            return None;
        }
        let element = self.element(self.index);
        self.index += 1;
        Some(element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.fence - self.index;
        (len, Some(len))
    }
}

impl<S: Struct> DoubleEndedIterator for Elements<'_, S> {
    fn next_back(&mut self) -> Option<S> {
        if self.index >= self.fence {
            return None;
        }
        self.fence -= 1;
        Some(self.element(self.fence))
    }
}

impl<S: Struct> ExactSizeIterator for Elements<'_, S> {}

impl<S: Struct> FusedIterator for Elements<'_, S> {}
