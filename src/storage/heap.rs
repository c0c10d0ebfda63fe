use alloc::{
    alloc::{alloc, dealloc, handle_alloc_error, Layout},
    vec::Vec,
};
use core::{fmt, marker::PhantomData, mem, ptr, ptr::NonNull};

use super::{Record, SealedStorage, Storage};
use crate::{Error, TypeSet};

/// Implementation of [`Storage`] that keeps the payload in a heap buffer, doubled whenever an
/// element does not fit.
///
/// The buffer starts with room for eight elements of the largest member. Growing relocates the
/// used prefix with a plain byte copy: every member is moved by its bytes, like any Rust value.
pub struct HeapStorage<S: TypeSet> {
    ptr: NonNull<u8>,
    bytes: usize,
    offset: usize,
    records: Vec<Record>,
    _set: PhantomData<S>,
}

// SAFETY: the storage owns the elements in its buffer, which are all members of `S`
unsafe impl<S: TypeSet + Send> Send for HeapStorage<S> {}
// SAFETY: shared access only reads elements, which are all members of `S`
unsafe impl<S: TypeSet + Sync> Sync for HeapStorage<S> {}

impl<S: TypeSet> HeapStorage<S> {
    /// Initial capacity in bytes.
    pub const START_BYTES: usize = 8 * S::MAX_SIZE;

    /// An empty storage of [`START_BYTES`](Self::START_BYTES).
    ///
    /// Aborts on allocation failure, like `alloc::vec::Vec`.
    pub fn new() -> Self {
        Self::with_capacity(Self::START_BYTES).unwrap_or_else(|error| abort_on::<S>(error))
    }

    /// An empty storage of exactly `bytes` bytes.
    pub fn with_capacity(bytes: usize) -> Result<Self, Error> {
        buffer_layout::<S>(bytes)?;
        let mut records = Vec::new();
        reserve_records::<S>(&mut records, bytes)?;
        Ok(Self {
            ptr: allocate::<S>(bytes)?,
            bytes,
            offset: 0,
            records,
            _set: PhantomData,
        })
    }
}

impl<S: TypeSet> Default for HeapStorage<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TypeSet> fmt::Debug for HeapStorage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeapStorage")
            .field("count", &self.records.len())
            .field("offset", &self.offset)
            .field("bytes", &self.bytes)
            .finish()
    }
}

impl<S: TypeSet> Drop for HeapStorage<S> {
    fn drop(&mut self) {
        // SAFETY: `ptr` was allocated with this layout
        unsafe { deallocate::<S>(self.ptr, self.bytes) }
    }
}

impl<S: TypeSet> Storage<S> for HeapStorage<S> {}

impl<S: TypeSet> SealedStorage<S> for HeapStorage<S> {
    #[inline]
    fn capacity_bytes(&self) -> usize {
        self.bytes
    }

    #[inline]
    fn used_bytes(&self) -> usize {
        self.offset
    }

    #[inline]
    fn element_count(&self) -> usize {
        self.records.len()
    }

    #[inline]
    fn overhead_bytes(&self) -> usize {
        2 * mem::size_of::<usize>() + self.records.len() * mem::size_of::<Record>()
    }

    #[inline]
    fn has_space(&self, end: usize) -> bool {
        end <= self.bytes
    }

    #[inline]
    fn buffer_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    fn buffer_mut_ptr(&mut self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    #[inline]
    fn record(&self, index: usize) -> Record {
        self.records[index]
    }

    fn grow(&mut self, required: usize) -> Result<(), Error> {
        if required <= self.bytes {
            return Ok(());
        }

        let mut bytes = self.bytes.max(1);
        while bytes < required {
            bytes = bytes.checked_mul(2).ok_or(Error::CapacityExceeded)?;
        }

        reserve_records::<S>(&mut self.records, bytes)?;
        let ptr = allocate::<S>(bytes)?;

        // SAFETY: both buffers hold at least `offset` bytes and are distinct allocations
        unsafe {
            ptr::copy_nonoverlapping(self.ptr.as_ptr(), ptr.as_ptr(), self.offset);
            deallocate::<S>(self.ptr, self.bytes);
        }
        self.ptr = ptr;
        self.bytes = bytes;
        Ok(())
    }

    fn reserve_record(&mut self) -> Result<(), Error> {
        self.records
            .try_reserve(1)
            .map_err(|_| Error::AllocationFailure {
                bytes: mem::size_of::<Record>(),
            })
    }

    unsafe fn commit(&mut self, record: Record, end: usize) {
        debug_assert!(end <= self.bytes);
        self.records.push(record);
        self.offset = end;
    }

    fn truncate(&mut self, len: usize) {
        if let Some(first) = self.records.get(len) {
            self.offset = first.offset;
            self.records.truncate(len);
        }
    }

    fn new_like(&self) -> Self {
        Self::with_capacity(self.bytes).unwrap_or_else(|error| abort_on::<S>(error))
    }
}

fn buffer_layout<S: TypeSet>(bytes: usize) -> Result<Layout, Error> {
    Layout::from_size_align(bytes, S::MAX_ALIGN).map_err(|_| Error::CapacityExceeded)
}

/// Reserves the record table for a buffer of `bytes` bytes filled with the smallest member.
fn reserve_records<S: TypeSet>(records: &mut Vec<Record>, bytes: usize) -> Result<(), Error> {
    let wanted = bytes.div_ceil(S::MIN_SIZE.max(1));
    records
        .try_reserve_exact(wanted.saturating_sub(records.len()))
        .map_err(|_| Error::AllocationFailure {
            bytes: wanted.saturating_mul(mem::size_of::<Record>()),
        })
}

fn allocate<S: TypeSet>(bytes: usize) -> Result<NonNull<u8>, Error> {
    let layout = buffer_layout::<S>(bytes)?;
    if bytes == 0 {
        // aligned for every member
        return Ok(NonNull::<S>::dangling().cast());
    }
    // SAFETY: the layout has a non-zero size
    NonNull::new(unsafe { alloc(layout) }).ok_or(Error::AllocationFailure { bytes })
}

/// # Safety
///
/// `ptr` must come from `allocate::<S>(bytes)`.
unsafe fn deallocate<S: TypeSet>(ptr: NonNull<u8>, bytes: usize) {
    if bytes != 0 {
        // SAFETY: `allocate` succeeded with this layout
        unsafe {
            dealloc(
                ptr.as_ptr(),
                Layout::from_size_align_unchecked(bytes, S::MAX_ALIGN),
            )
        }
    }
}

#[cold]
fn abort_on<S: TypeSet>(error: Error) -> ! {
    match error {
        Error::AllocationFailure { bytes } => match Layout::from_size_align(bytes, S::MAX_ALIGN) {
            Ok(layout) => handle_alloc_error(layout),
            Err(_) => panic!("capacity overflow"),
        },
        Error::CapacityExceeded => panic!("capacity overflow"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::type_set! {
        #[derive(Clone)]
        enum Wide {
            Int(i32),
            Text(String),
        }

        enum WideRef<'a>;
        enum WideMut<'a>;
    }

    #[test]
    fn starts_with_eight_of_the_largest_member() {
        let storage = HeapStorage::<Wide>::new();
        assert_eq!(
            SealedStorage::<Wide>::capacity_bytes(&storage),
            8 * mem::size_of::<String>()
        );
        assert!(storage.records.capacity() >= 8 * mem::size_of::<String>() / 4);
        assert_eq!(SealedStorage::<Wide>::overhead_bytes(&storage), 2 * mem::size_of::<usize>());
    }

    #[test]
    fn grow_doubles_and_keeps_the_prefix() {
        let mut storage = HeapStorage::<Wide>::new();
        let start = storage.bytes;
        unsafe {
            storage.buffer_mut_ptr().cast::<i32>().write(7);
            SealedStorage::<Wide>::commit(&mut storage, Record { tag: 0, offset: 0 }, 4);
        }

        assert_eq!(SealedStorage::<Wide>::grow(&mut storage, start + 1), Ok(()));
        assert_eq!(storage.bytes, 2 * start);
        assert_eq!(SealedStorage::<Wide>::grow(&mut storage, 5 * start), Ok(()));
        assert_eq!(storage.bytes, 8 * start);

        assert_eq!(SealedStorage::<Wide>::used_bytes(&storage), 4);
        assert_eq!(unsafe { storage.buffer_ptr().cast::<i32>().read() }, 7);
        assert_eq!(storage.ptr.as_ptr() as usize % Wide::MAX_ALIGN, 0);
    }

    #[test]
    fn grow_within_capacity_is_a_no_op() {
        let mut storage = HeapStorage::<Wide>::new();
        let (ptr, bytes) = (storage.ptr, storage.bytes);
        assert_eq!(SealedStorage::<Wide>::grow(&mut storage, bytes), Ok(()));
        assert_eq!(storage.ptr, ptr);
    }

    #[test]
    fn zero_capacity() {
        let mut storage = HeapStorage::<Wide>::with_capacity(0).unwrap();
        assert_eq!(storage.ptr.as_ptr() as usize % Wide::MAX_ALIGN, 0);
        assert!(!SealedStorage::<Wide>::has_space(&storage, 1));
        assert_eq!(SealedStorage::<Wide>::grow(&mut storage, 3), Ok(()));
        assert_eq!(storage.bytes, 4);
    }

    #[test]
    fn oversized_requests_fail() {
        assert_eq!(
            HeapStorage::<Wide>::with_capacity(usize::MAX).map(|_| ()),
            Err(Error::CapacityExceeded)
        );

        let mut storage = HeapStorage::<Wide>::new();
        let bytes = storage.bytes;
        assert!(SealedStorage::<Wide>::grow(&mut storage, usize::MAX).is_err());
        assert_eq!(storage.bytes, bytes);
    }

    #[test]
    fn new_like_keeps_the_capacity() {
        let mut storage = HeapStorage::<Wide>::with_capacity(100).unwrap();
        unsafe { SealedStorage::<Wide>::commit(&mut storage, Record { tag: 0, offset: 0 }, 4) };
        let fresh = SealedStorage::<Wide>::new_like(&storage);
        assert_eq!(fresh.bytes, 100);
        assert_eq!(SealedStorage::<Wide>::element_count(&fresh), 0);
    }
}
