use core::{
    cmp::Ordering,
    fmt,
    iter::FusedIterator,
    mem::ManuallyDrop,
    ops::{Add, AddAssign, Sub, SubAssign},
    ptr,
};

use super::PackVecInner;
use crate::{storage::Storage, TypeSet};

/// An iterator over the elements of a [`PackVecInner`], yielding the read view of each.
///
/// This struct is created by [`PackVecInner::iter`].
pub struct Iter<'a, S: TypeSet, B: Storage<S>> {
    vec: &'a PackVecInner<S, B>,
    front: usize,
    back: usize,
}

impl<'a, S: TypeSet, B: Storage<S>> Iter<'a, S, B> {
    pub(super) fn new(vec: &'a PackVecInner<S, B>) -> Self {
        Self {
            vec,
            front: 0,
            back: vec.len(),
        }
    }
}

impl<S: TypeSet, B: Storage<S>> Clone for Iter<'_, S, B> {
    fn clone(&self) -> Self {
        Self {
            vec: self.vec,
            front: self.front,
            back: self.back,
        }
    }
}

impl<'a, S: TypeSet, B: Storage<S>> Iterator for Iter<'a, S, B> {
    type Item = S::Ref<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            // SAFETY: `front < back <= len`
            let value = unsafe { self.vec.read_unchecked(self.front) };
            self.front += 1;
            Some(value)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl<S: TypeSet, B: Storage<S>> DoubleEndedIterator for Iter<'_, S, B> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front < self.back {
            self.back -= 1;
            // SAFETY: `front <= back < len`
            Some(unsafe { self.vec.read_unchecked(self.back) })
        } else {
            None
        }
    }
}

impl<S: TypeSet, B: Storage<S>> ExactSizeIterator for Iter<'_, S, B> {}

impl<S: TypeSet, B: Storage<S>> FusedIterator for Iter<'_, S, B> {}

impl<S: TypeSet, B: Storage<S>> fmt::Debug for Iter<'_, S, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("front", &self.front)
            .field("back", &self.back)
            .finish_non_exhaustive()
    }
}

/// A random-access position in a [`PackVecInner`].
///
/// Cursors are created by [`PackVecInner::begin`] and [`PackVecInner::end`], or unbound by
/// [`Default`]. They move by plain index arithmetic and may point past the end; only
/// dereferencing checks the position.
///
/// Two cursors are equal when they point at the same index of the same vector, and are only
/// ordered relative to cursors of the same vector.
///
/// ```
/// # packvec::type_set! {
/// #     #[derive(Debug, Clone, PartialEq)]
/// #     enum Num { Int(i32), Real(f64) }
/// #     #[derive(Debug, PartialEq)]
/// #     enum NumRef<'a>;
/// #     enum NumMut<'a>;
/// # }
/// let vec: packvec::PackVec<Num> = [1.0, 2.0, 3.0].into_iter().collect();
///
/// let begin = vec.begin();
/// let end = vec.end();
/// assert_eq!(end - begin, 3);
/// assert_eq!(begin + vec.len(), end);
///
/// let mut cursor = end;
/// cursor -= 1;
/// assert_eq!(cursor.read(), NumRef::Real(3.0));
/// assert_eq!((1_usize + begin).read(), NumRef::Real(2.0));
/// assert_eq!(end.get(), None);
/// ```
pub struct Cursor<'a, S: TypeSet, B: Storage<S>> {
    index: usize,
    vec: Option<&'a PackVecInner<S, B>>,
}

impl<'a, S: TypeSet, B: Storage<S>> Cursor<'a, S, B> {
    pub(super) fn new(vec: &'a PackVecInner<S, B>, index: usize) -> Self {
        Self {
            index,
            vec: Some(vec),
        }
    }

    /// The position of the cursor.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Returns the element under the cursor, or `None` if the cursor is unbound or out of range.
    #[inline]
    pub fn get(&self) -> Option<S::Ref<'a>> {
        self.vec?.get(self.index)
    }

    /// Returns the element under the cursor.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is unbound or out of range.
    #[track_caller]
    pub fn read(&self) -> S::Ref<'a> {
        match self.vec {
            Some(vec) => vec.read(self.index),
            None => panic!("read through an unbound cursor"),
        }
    }

    fn same_vec(&self, other: &Self) -> bool {
        match (self.vec, other.vec) {
            (Some(a), Some(b)) => ptr::eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

impl<S: TypeSet, B: Storage<S>> Default for Cursor<'_, S, B> {
    fn default() -> Self {
        Self {
            index: 0,
            vec: None,
        }
    }
}

impl<S: TypeSet, B: Storage<S>> Clone for Cursor<'_, S, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: TypeSet, B: Storage<S>> Copy for Cursor<'_, S, B> {}

impl<S: TypeSet, B: Storage<S>> PartialEq for Cursor<'_, S, B> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index && self.same_vec(other)
    }
}

impl<S: TypeSet, B: Storage<S>> Eq for Cursor<'_, S, B> {}

impl<S: TypeSet, B: Storage<S>> PartialOrd for Cursor<'_, S, B> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.same_vec(other).then(|| self.index.cmp(&other.index))
    }
}

impl<S: TypeSet, B: Storage<S>> Add<usize> for Cursor<'_, S, B> {
    type Output = Self;

    fn add(mut self, rhs: usize) -> Self {
        self += rhs;
        self
    }
}

impl<'a, S: TypeSet, B: Storage<S>> Add<Cursor<'a, S, B>> for usize {
    type Output = Cursor<'a, S, B>;

    fn add(self, rhs: Cursor<'a, S, B>) -> Cursor<'a, S, B> {
        rhs + self
    }
}

impl<S: TypeSet, B: Storage<S>> AddAssign<usize> for Cursor<'_, S, B> {
    #[track_caller]
    fn add_assign(&mut self, rhs: usize) {
        self.index = match self.index.checked_add(rhs) {
            Some(index) => index,
            None => panic!("cursor moved past `usize::MAX`"),
        };
    }
}

impl<S: TypeSet, B: Storage<S>> Sub<usize> for Cursor<'_, S, B> {
    type Output = Self;

    fn sub(mut self, rhs: usize) -> Self {
        self -= rhs;
        self
    }
}

impl<S: TypeSet, B: Storage<S>> SubAssign<usize> for Cursor<'_, S, B> {
    #[track_caller]
    fn sub_assign(&mut self, rhs: usize) {
        self.index = match self.index.checked_sub(rhs) {
            Some(index) => index,
            None => panic!("cursor moved before the first element"),
        };
    }
}

impl<S: TypeSet, B: Storage<S>> Sub for Cursor<'_, S, B> {
    type Output = isize;

    /// Signed distance between two cursors of the same vector.
    fn sub(self, rhs: Self) -> isize {
        debug_assert!(self.same_vec(&rhs), "cursors of different vectors");
        if self.index >= rhs.index {
            (self.index - rhs.index) as isize
        } else {
            -((rhs.index - self.index) as isize)
        }
    }
}

impl<S: TypeSet, B: Storage<S>> fmt::Debug for Cursor<'_, S, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index)
            .field("bound", &self.vec.is_some())
            .finish()
    }
}

/// An iterator that moves the elements out of a [`PackVecInner`].
///
/// This struct is created by calling the `into_iter` method on [`PackVecInner`]. Elements not
/// yielded are dropped with the iterator.
pub struct IntoIter<S: TypeSet, B: Storage<S>> {
    vec: ManuallyDrop<PackVecInner<S, B>>,
    next: usize,
    back: usize,
}

impl<S: TypeSet, B: Storage<S>> IntoIter<S, B> {
    pub(super) fn new(vec: PackVecInner<S, B>) -> Self {
        let back = vec.len();
        Self {
            vec: ManuallyDrop::new(vec),
            next: 0,
            back,
        }
    }

    /// # Safety
    ///
    /// `index` must be in `next..back` and must not be taken twice.
    unsafe fn take_unchecked(&self, index: usize) -> S {
        let record = self.vec.buf.record(index);
        // SAFETY: in the untaken range, guaranteed by the caller
        unsafe { S::take(record.tag, self.vec.buf.buffer_ptr().add(record.offset)) }
    }
}

impl<S: TypeSet, B: Storage<S>> Iterator for IntoIter<S, B> {
    type Item = S;

    fn next(&mut self) -> Option<S> {
        if self.next < self.back {
            // SAFETY: in the untaken range, which shrinks right after
            let value = unsafe { self.take_unchecked(self.next) };
            self.next += 1;
            Some(value)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.next;
        (len, Some(len))
    }
}

impl<S: TypeSet, B: Storage<S>> DoubleEndedIterator for IntoIter<S, B> {
    fn next_back(&mut self) -> Option<S> {
        if self.next < self.back {
            self.back -= 1;
            // SAFETY: in the untaken range, shrunk right before
            Some(unsafe { self.take_unchecked(self.back) })
        } else {
            None
        }
    }
}

impl<S: TypeSet, B: Storage<S>> ExactSizeIterator for IntoIter<S, B> {}

impl<S: TypeSet, B: Storage<S>> FusedIterator for IntoIter<S, B> {}

impl<S: TypeSet, B: Storage<S>> fmt::Debug for IntoIter<S, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntoIter")
            .field("remaining", &(self.back - self.next))
            .finish_non_exhaustive()
    }
}

impl<S: TypeSet, B: Storage<S>> Drop for IntoIter<S, B> {
    fn drop(&mut self) {
        // Forget the suffix taken from the back, drop the untaken elements, then forget the
        // prefix taken from the front. A panicking destructor leaks the storage instead of
        // dropping an element twice.
        self.vec.buf.truncate(self.back);
        self.vec.truncate(self.next);
        self.vec.buf.truncate(0);
        // SAFETY: the vector is empty and never used again
        unsafe { ManuallyDrop::drop(&mut self.vec) }
    }
}

#[cfg(test)]
mod tests {
    use crate::{InlinePackVec, PackVec};

    crate::type_set! {
        #[derive(Debug, Clone, PartialEq)]
        enum Item {
            Num(u16),
            Name(String) from [&'static str],
        }

        #[derive(Debug, PartialEq)]
        enum ItemRef<'a>;

        enum ItemMut<'a>;
    }

    fn sample() -> PackVec<Item> {
        let mut vec = PackVec::new();
        vec.push(1_u16).unwrap();
        vec.push("two").unwrap();
        vec.push(3_u16).unwrap();
        vec
    }

    #[test]
    fn iter() {
        let vec = sample();
        let mut items = vec.iter();
        assert_eq!(items.len(), 3);
        assert_eq!(items.next(), Some(ItemRef::Num(1)));
        assert_eq!(items.next_back(), Some(ItemRef::Num(3)));
        assert_eq!(items.len(), 1);
        assert_eq!(items.clone().count(), 1);
        assert_eq!(items.next(), Some(ItemRef::Name("two".into())));
        assert_eq!(items.next(), None);
        assert_eq!(items.next_back(), None);
    }

    #[test]
    fn iter_nth() {
        let vec = sample();
        let mut items = vec.iter();
        assert_eq!(items.nth(2), Some(ItemRef::Num(3)));
        assert_eq!(items.nth(5), None);
    }

    #[test]
    fn for_loop() {
        let vec = sample();
        let mut nums = 0;
        for item in &vec {
            if let ItemRef::Num(num) = item {
                nums += num;
            }
        }
        assert_eq!(nums, 4);
    }

    #[test]
    fn iter_rev() {
        let vec = sample();
        let names: Vec<_> = vec.iter().rev().collect();
        assert_eq!(
            names,
            [ItemRef::Num(3), ItemRef::Name("two".into()), ItemRef::Num(1)]
        );
    }

    #[test]
    fn cursor_arithmetic() {
        let vec = sample();
        let begin = vec.begin();
        let end = vec.end();

        assert_eq!(begin + vec.len(), end);
        assert_eq!(vec.len() + begin, end);
        assert_eq!(end - vec.len(), begin);
        assert_eq!(end - begin, 3);
        assert_eq!(begin - end, -3);
        assert!(begin < end);

        let mut cursor = begin;
        cursor += 2;
        assert_eq!(cursor.index(), 2);
        assert_eq!(cursor.read(), ItemRef::Num(3));
        cursor -= 1;
        assert_eq!(cursor.get(), Some(ItemRef::Name("two".into())));
        assert_eq!(end.get(), None);
    }

    #[test]
    fn cursors_of_different_vectors() {
        let a = sample();
        let b = sample();
        assert_ne!(a.begin(), b.begin());
        assert_eq!(a.begin().partial_cmp(&b.begin()), None);
        assert_eq!(a.begin(), a.begin());
    }

    #[test]
    fn unbound_cursor() {
        let cursor = crate::Cursor::<Item, crate::storage::HeapStorage<Item>>::default();
        assert_eq!(cursor.get(), None);
        assert_eq!(cursor, Default::default());
        assert_ne!(cursor, sample().begin());
    }

    #[test]
    #[should_panic(expected = "read through an unbound cursor")]
    fn unbound_cursor_read() {
        crate::Cursor::<Item, crate::storage::HeapStorage<Item>>::default().read();
    }

    #[test]
    #[should_panic(expected = "read index (is 3) should be < len (is 3)")]
    fn end_cursor_read() {
        sample().end().read();
    }

    #[test]
    #[should_panic(expected = "cursor moved before the first element")]
    fn cursor_underflow() {
        let vec = sample();
        let _ = vec.begin() - 1;
    }

    #[test]
    fn into_iter() {
        let mut items = sample().into_iter();
        assert_eq!(items.len(), 3);
        assert_eq!(items.next(), Some(Item::Num(1)));
        assert_eq!(items.next_back(), Some(Item::Num(3)));
        assert_eq!(items.next(), Some(Item::Name("two".into())));
        assert_eq!(items.next(), None);
    }

    #[test]
    fn iter_yields_borrowed_members_in_place() {
        crate::type_set! {
            enum Held {
                Flag(bool),
                Boxed(Box<u32>) as borrowed,
            }

            enum HeldRef<'a>;
            enum HeldMut<'a>;
        }

        let mut vec = PackVec::<Held>::new();
        vec.push(true).unwrap();
        vec.push(Box::new(7_u32)).unwrap();
        vec.push(Box::new(8_u32)).unwrap();

        let mut seen = 0;
        for (index, item) in vec.iter().enumerate() {
            if let HeldRef::Boxed(boxed) = item {
                let HeldRef::Boxed(read) = vec.read(index) else {
                    panic!("expected a box at {index}");
                };
                assert!(core::ptr::eq(boxed, read));
                let HeldRef::Boxed(cursor) = (vec.begin() + index).read() else {
                    panic!("expected a box at {index}");
                };
                assert!(core::ptr::eq(boxed, cursor));
                seen += 1;
            }
        }
        assert_eq!(seen, 2);
    }

    #[test]
    fn iter_move_drop() {
        droppable!();

        crate::type_set! {
            enum Counted {
                Small(u8),
                Tracked(Droppable) as borrowed,
            }

            enum CountedRef<'a>;
            enum CountedMut<'a>;
        }

        fn filled() -> InlinePackVec<Counted, 64, 8> {
            let mut vec = InlinePackVec::new();
            for _ in 0..4 {
                vec.push(Droppable::new()).unwrap();
                vec.push(0_u8).unwrap();
            }
            vec
        }

        {
            // move all
            let items = filled().into_iter();
            assert_eq!(items.count(), 8);
        }
        assert_eq!(Droppable::count(), 0);

        {
            // move none
            let _items = filled().into_iter();
            assert_eq!(Droppable::count(), 4);
        }
        assert_eq!(Droppable::count(), 0);

        {
            // move partly, from both ends
            let mut items = filled().into_iter();
            let _ = items.next();
            let _ = items.next_back();
            let _ = items.next_back();
            assert_eq!(Droppable::count(), 2);
        }
        assert_eq!(Droppable::count(), 0);
    }
}
