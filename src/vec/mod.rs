//! Append-only vectors over a closed [`TypeSet`].

use core::{fmt, marker::PhantomData, mem, mem::ManuallyDrop, ptr};

use crate::{
    len_type::LenType,
    raw,
    set::{Resolve, ResolveMut},
    storage::{InlineStorage, Record, Storage},
    Error, PushError, TypeSet,
};

#[cfg(feature = "alloc")]
use crate::storage::HeapStorage;

mod iter;

pub use iter::{Cursor, IntoIter, Iter};

/// Base struct for [`InlinePackVec`] and [`PackVec`], generic over the [`Storage`].
///
/// In most cases you should use [`InlinePackVec`] or [`PackVec`] directly. Only use this
/// struct if you want to write code that's generic over both.
pub struct PackVecInner<S: TypeSet, B: Storage<S>> {
    buf: B,
    _set: PhantomData<S>,
}

/// A packed vector with a fixed capacity of `BYTES` payload bytes and `ELEMS` elements, stored
/// inline without heap allocation.
///
/// `LenT` is the width of the element count and of every stored offset. It defaults to `u16`;
/// `u8` shrinks the bookkeeping of small vectors, `u32` or `usize` allow larger capacities.
///
/// # Examples
///
/// ```
/// use packvec::{type_set, InlinePackVec};
///
/// type_set! {
///     #[derive(Debug, Clone, PartialEq)]
///     enum Sample {
///         Byte(u8),
///         Word(u32),
///     }
///
///     #[derive(Debug, PartialEq)]
///     enum SampleRef<'a>;
///
///     enum SampleMut<'a>;
/// }
///
/// // a vector in a static variable
/// static EMPTY: InlinePackVec<Sample, 8, 4, u8> = InlinePackVec::new();
/// assert!(EMPTY.is_empty());
///
/// let mut vec = InlinePackVec::<Sample, 8, 4, u8>::new();
/// vec.push(1_u8).unwrap();
/// vec.push(2_u32).unwrap();
/// vec.push(3_u8).unwrap();
///
/// // 1 + 4 + 1 payload bytes, no padding
/// assert_eq!(vec.payload_bytes(), 6);
///
/// // out of bytes: the value is handed back
/// let error = vec.push(4_u32).unwrap_err();
/// assert_eq!(error.into_inner(), Sample::Word(4));
/// assert_eq!(vec.len(), 3);
/// ```
pub type InlinePackVec<S, const BYTES: usize, const ELEMS: usize, LenT = u16> =
    PackVecInner<S, InlineStorage<S, BYTES, ELEMS, LenT>>;

/// A packed vector backed by a heap buffer that doubles whenever an element does not fit.
///
/// # Examples
///
/// ```
/// use packvec::{type_set, PackVec};
///
/// type_set! {
///     #[derive(Debug, Clone, PartialEq)]
///     enum Token {
///         Number(f64),
///         Word(String) from [&'static str],
///     }
///
///     #[derive(Debug, PartialEq)]
///     enum TokenRef<'a>;
///
///     enum TokenMut<'a>;
/// }
///
/// let mut vec = PackVec::<Token>::new();
/// for i in 0..100 {
///     vec.push(f64::from(i)).unwrap();
///     vec.push("word").unwrap();
/// }
///
/// assert_eq!(vec.len(), 200);
/// assert!(vec.capacity_bytes() >= vec.payload_bytes());
/// assert_eq!(vec.iter().filter(|token| matches!(token, TokenRef::Word(_))).count(), 100);
/// ```
#[cfg(feature = "alloc")]
pub type PackVec<S> = PackVecInner<S, HeapStorage<S>>;

impl<S: TypeSet, const BYTES: usize, const ELEMS: usize, LenT: LenType>
    InlinePackVec<S, BYTES, ELEMS, LenT>
{
    /// Constructs a new, empty vector with a fixed capacity of `BYTES` bytes and `ELEMS`
    /// elements.
    ///
    /// Both capacities must fit in `LenT`, which is checked at compile time.
    pub const fn new() -> Self {
        Self {
            buf: InlineStorage::new(),
            _set: PhantomData,
        }
    }
}

#[cfg(feature = "alloc")]
impl<S: TypeSet> PackVec<S> {
    /// Constructs a new, empty vector with room for eight elements of the largest member.
    ///
    /// Aborts on allocation failure, like `alloc::vec::Vec`.
    pub fn new() -> Self {
        Self {
            buf: HeapStorage::new(),
            _set: PhantomData,
        }
    }

    /// Constructs a new, empty vector with a buffer of exactly `bytes` bytes.
    ///
    /// # Errors
    ///
    /// [`Error::CapacityExceeded`] if `bytes` cannot be allocated in one piece,
    /// [`Error::AllocationFailure`] if the allocator fails.
    pub fn with_capacity(bytes: usize) -> Result<Self, Error> {
        Ok(Self {
            buf: HeapStorage::with_capacity(bytes)?,
            _set: PhantomData,
        })
    }
}

impl<S: TypeSet, B: Storage<S>> PackVecInner<S, B> {
    /// Appends a value to the back of the vector.
    ///
    /// Accepts any value convertible into the set: a member, a source type declared with
    /// `from [..]`, or the set enum itself. Packed members are written right behind the previous
    /// element; the others first pad the offset up to their alignment.
    ///
    /// # Errors
    ///
    /// Returns the converted value back if the storage cannot make room for it.
    pub fn push<V: Into<S>>(&mut self, value: V) -> Result<(), PushError<S>> {
        let value = value.into();
        match self.reserve_for(&value) {
            Ok((record, end)) => {
                // SAFETY: `reserve_for` made room for the value up to `end` and for its record
                unsafe { self.write_reserved(value, record, end) };
                Ok(())
            }
            Err(error) => Err(PushError::new(error, value)),
        }
    }

    fn reserve_for(&mut self, value: &S) -> Result<(Record, usize), Error> {
        let tag = value.tag();
        let layout = S::layout(tag);
        let used = self.buf.used_bytes();
        let offset = if S::is_packed(tag) {
            used
        } else {
            raw::align_up(used, layout.align())
        };
        let end = offset
            .checked_add(layout.size())
            .ok_or(Error::CapacityExceeded)?;

        if !self.buf.has_space(end) {
            self.buf.grow(end)?;
        }
        self.buf.reserve_record()?;
        Ok((Record { tag, offset }, end))
    }

    /// # Safety
    ///
    /// `record` and `end` must come from `reserve_for(&value)`, with no modification in between.
    unsafe fn write_reserved(&mut self, value: S, record: Record, end: usize) {
        // SAFETY: the bytes `record.offset..end` are free and inside the buffer, aligned unless
        // the member is packed
        unsafe {
            value.write(self.buf.buffer_mut_ptr().add(record.offset));
            self.buf.commit(record, end);
        }
    }

    /// Returns the element at `index`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, index: usize) -> Option<S::Ref<'_>> {
        if index < self.len() {
            // SAFETY: in bounds
            Some(unsafe { self.read_unchecked(index) })
        } else {
            None
        }
    }

    /// Returns the element at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[inline]
    #[track_caller]
    pub fn read(&self, index: usize) -> S::Ref<'_> {
        let len = self.len();
        assert!(
            index < len,
            "read index (is {index}) should be < len (is {len})"
        );
        // SAFETY: in bounds
        unsafe { self.read_unchecked(index) }
    }

    /// Returns the element at `index`, without bounds checking.
    ///
    /// # Safety
    ///
    /// `index` must be less than [`len`](Self::len).
    #[inline]
    pub unsafe fn read_unchecked(&self, index: usize) -> S::Ref<'_> {
        let record = self.buf.record(index);
        // SAFETY: the record describes an initialized element, shared for the borrow of `self`
        unsafe { S::read(record.tag, self.buf.buffer_ptr().add(record.offset)) }
    }

    /// Returns the first element, or `None` if empty.
    #[inline]
    pub fn front(&self) -> Option<S::Ref<'_>> {
        self.get(0)
    }

    /// Returns the last element, or `None` if empty.
    #[inline]
    pub fn back(&self) -> Option<S::Ref<'_>> {
        self.get(self.len().checked_sub(1)?)
    }

    /// Hands the element at `index` to `f` as a mutable view and returns what `f` returns, or
    /// `None` if out of bounds.
    ///
    /// Matching on the view must cover every member, so adding a member to the set makes every
    /// incomplete handler fail to compile. A misaligned packed element is visited through an
    /// aligned copy, written back when `f` returns or unwinds.
    ///
    /// ```
    /// # packvec::type_set! {
    /// #     #[derive(Clone)]
    /// #     enum Num { Int(i64), Real(f32) }
    /// #     enum NumRef<'a>;
    /// #     enum NumMut<'a>;
    /// # }
    /// let mut vec = packvec::PackVec::<Num>::new();
    /// vec.push(2.5_f32).unwrap();
    ///
    /// let doubled = vec.visit(0, |num| match num {
    ///     NumMut::Int(int) => *int *= 2,
    ///     NumMut::Real(real) => *real *= 2.0,
    /// });
    /// assert_eq!(doubled, Some(()));
    /// assert_eq!(vec.visit(1, |_| ()), None);
    /// ```
    pub fn visit<F, R>(&mut self, index: usize, f: F) -> Option<R>
    where
        F: for<'b> FnOnce(S::Mut<'b>) -> R,
    {
        if index >= self.len() {
            return None;
        }
        let record = self.buf.record(index);
        // SAFETY: the record describes an initialized element, exclusively borrowed through
        // `self`
        Some(unsafe { S::visit(record.tag, self.buf.buffer_mut_ptr().add(record.offset), f) })
    }

    /// Like [`visit`](Self::visit), with a callback generic over the member type.
    pub fn visit_with<R: ResolveMut>(&mut self, index: usize, callback: R) -> Option<R::Output> {
        if index >= self.len() {
            return None;
        }
        let record = self.buf.record(index);
        // SAFETY: the record describes an initialized element, exclusively borrowed through
        // `self`
        Some(unsafe {
            S::resolve_aligned(record.tag, self.buf.buffer_mut_ptr().add(record.offset), callback)
        })
    }

    /// Returns the tag and offset of the element at `index`, or `None` if out of bounds.
    #[inline]
    pub fn record(&self, index: usize) -> Option<Record> {
        (index < self.len()).then(|| self.buf.record(index))
    }

    /// Returns the number of elements in the vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.element_count()
    }

    /// Returns true if the vector contains no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the bytes in use: the payload, padding included, plus the bookkeeping of the
    /// element count, the payload offset and one record per element.
    ///
    /// Never zero, even for an empty vector.
    #[inline]
    pub fn used_bytes(&self) -> usize {
        self.buf.overhead_bytes() + self.buf.used_bytes()
    }

    /// Returns the payload bytes in use, padding included.
    #[inline]
    pub fn payload_bytes(&self) -> usize {
        self.buf.used_bytes()
    }

    /// Returns the size of the payload buffer.
    #[inline]
    pub fn capacity_bytes(&self) -> usize {
        self.buf.capacity_bytes()
    }

    /// Removes the last element and returns it, or `None` if empty.
    pub fn pop(&mut self) -> Option<S> {
        let index = self.len().checked_sub(1)?;
        let record = self.buf.record(index);
        self.buf.truncate(index);
        // SAFETY: the element was initialized and is forgotten by the storage
        Some(unsafe { S::take(record.tag, self.buf.buffer_ptr().add(record.offset)) })
    }

    /// Shortens the vector to `len` elements, dropping the rest back to front.
    ///
    /// Does nothing if `len` is greater than or equal to the current length.
    pub fn truncate(&mut self, len: usize) {
        if !mem::needs_drop::<S>() {
            self.buf.truncate(len);
            return;
        }

        while self.len() > len {
            let index = self.len() - 1;
            let record = self.buf.record(index);
            // forget first, so that a panicking destructor cannot cause a double drop
            self.buf.truncate(index);
            // SAFETY: the element was initialized and is forgotten by the storage
            unsafe { S::resolve(record.tag, self.buf.buffer_mut_ptr().add(record.offset), DropInPlace) }
        }
    }

    /// Drops every element. The capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Returns an iterator over the elements.
    #[inline]
    pub fn iter(&self) -> Iter<'_, S, B> {
        Iter::new(self)
    }

    /// Returns a cursor at the first element.
    #[inline]
    pub fn begin(&self) -> Cursor<'_, S, B> {
        Cursor::new(self, 0)
    }

    /// Returns a cursor one past the last element.
    #[inline]
    pub fn end(&self) -> Cursor<'_, S, B> {
        Cursor::new(self, self.len())
    }

    /// Runs `f` on a bitwise duplicate of the element at `index`, which must be in bounds.
    ///
    /// The duplicate is never dropped, so the element stays owned by the vector.
    pub(crate) fn with_owned<R>(&self, index: usize, f: impl FnOnce(&S) -> R) -> R {
        let record = self.buf.record(index);
        // SAFETY: the record describes an initialized element; the duplicate is wrapped in
        // `ManuallyDrop` and only lent out by shared reference
        let duplicate =
            ManuallyDrop::new(unsafe { S::take(record.tag, self.buf.buffer_ptr().add(record.offset)) });
        f(&duplicate)
    }
}

struct DropInPlace;

impl Resolve for DropInPlace {
    type Output = ();

    unsafe fn call<T>(self, ptr: *mut T) {
        // packed members have no drop glue and may be misaligned
        if mem::needs_drop::<T>() {
            // SAFETY: members with drop glue are stored aligned; initialization guaranteed by the
            // caller
            unsafe { ptr::drop_in_place(ptr) }
        }
    }
}

impl<S: TypeSet, B: Storage<S>> Drop for PackVecInner<S, B> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<S: TypeSet, B: Storage<S> + Default> Default for PackVecInner<S, B> {
    fn default() -> Self {
        Self {
            buf: B::default(),
            _set: PhantomData,
        }
    }
}

impl<S: TypeSet + Clone, B: Storage<S>> Clone for PackVecInner<S, B> {
    fn clone(&self) -> Self {
        let mut new = Self {
            buf: self.buf.new_like(),
            _set: PhantomData,
        };
        for index in 0..self.len() {
            let value = self.with_owned(index, S::clone);
            if new.push(value).is_err() {
                unreachable!("a clone holds the same elements in the same capacity");
            }
        }
        new
    }
}

impl<S, B1, B2> PartialEq<PackVecInner<S, B2>> for PackVecInner<S, B1>
where
    S: TypeSet,
    B1: Storage<S>,
    B2: Storage<S>,
    for<'a> S::Ref<'a>: PartialEq,
{
    fn eq(&self, other: &PackVecInner<S, B2>) -> bool {
        self.len() == other.len()
            // SAFETY: both indices are in bounds
            && (0..self.len()).all(|i| unsafe { self.read_unchecked(i) == other.read_unchecked(i) })
    }
}

impl<S, B> Eq for PackVecInner<S, B>
where
    S: TypeSet,
    B: Storage<S>,
    for<'a> S::Ref<'a>: Eq,
{
}

impl<S, B> fmt::Debug for PackVecInner<S, B>
where
    S: TypeSet,
    B: Storage<S>,
    for<'a> S::Ref<'a>: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<S: TypeSet, B: Storage<S>, V: Into<S>> Extend<V> for PackVecInner<S, B> {
    /// # Panics
    ///
    /// Panics if the storage cannot make room for every element.
    fn extend<I: IntoIterator<Item = V>>(&mut self, iter: I) {
        for value in iter {
            if let Err(error) = self.push(value) {
                panic!("PackVecInner::extend() overflowed the storage: {error}");
            }
        }
    }
}

impl<S: TypeSet, B: Storage<S> + Default, V: Into<S>> FromIterator<V> for PackVecInner<S, B> {
    /// # Panics
    ///
    /// Panics if the storage cannot make room for every element.
    fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
        let mut vec = Self::default();
        vec.extend(iter);
        vec
    }
}

impl<'a, S: TypeSet, B: Storage<S>> IntoIterator for &'a PackVecInner<S, B> {
    type Item = S::Ref<'a>;
    type IntoIter = Iter<'a, S, B>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<S: TypeSet, B: Storage<S>> IntoIterator for PackVecInner<S, B> {
    type Item = S;
    type IntoIter = IntoIter<S, B>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self)
    }
}
