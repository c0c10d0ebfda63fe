use core::{fmt, mem, mem::MaybeUninit};

use super::{Record, SealedStorage, Storage};
use crate::{
    len_type::{check_capacity_fits, LenType},
    set::Tag,
    Error, TypeSet,
};

/// Record with a narrow offset, laid out without padding.
#[repr(C, packed)]
struct RawRecord<LenT: LenType> {
    tag: Tag,
    offset: LenT,
}

impl<LenT: LenType> Clone for RawRecord<LenT> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<LenT: LenType> Copy for RawRecord<LenT> {}

/// Byte array aligned like the set, and therefore like every member.
#[repr(C)]
struct AlignedBytes<S, const BYTES: usize> {
    _align: [S; 0],
    bytes: [MaybeUninit<u8>; BYTES],
}

/// Implementation of [`Storage`] that keeps up to `BYTES` payload bytes and `ELEMS` records inside
/// the container, without heap allocation.
///
/// `LenT` is the width of the element count, of the payload offset, and of every record offset.
/// Both `BYTES` and `ELEMS` must fit in it, which is checked at compile time:
///
/// ```compile_fail
/// packvec::type_set! {
///     #[derive(Clone)]
///     enum Set { Int(u32) }
///     enum SetRef<'a>;
///     enum SetMut<'a>;
/// }
///
/// // 300 bytes do not fit in `u8`
/// let vec = packvec::InlinePackVec::<Set, 300, 4, u8>::new();
/// ```
pub struct InlineStorage<S, const BYTES: usize, const ELEMS: usize, LenT: LenType = u16> {
    count: LenT,
    offset: LenT,
    records: [MaybeUninit<RawRecord<LenT>>; ELEMS],
    buffer: AlignedBytes<S, BYTES>,
}

impl<S: TypeSet, const BYTES: usize, const ELEMS: usize, LenT: LenType>
    InlineStorage<S, BYTES, ELEMS, LenT>
{
    const RECORD: MaybeUninit<RawRecord<LenT>> = MaybeUninit::uninit();
    const BYTE: MaybeUninit<u8> = MaybeUninit::uninit();

    /// An empty storage.
    pub const fn new() -> Self {
        const {
            check_capacity_fits::<LenT, BYTES>();
            check_capacity_fits::<LenT, ELEMS>();
        }

        Self {
            count: LenT::ZERO,
            offset: LenT::ZERO,
            records: [Self::RECORD; ELEMS],
            buffer: AlignedBytes {
                _align: [],
                bytes: [Self::BYTE; BYTES],
            },
        }
    }
}

impl<S: TypeSet, const BYTES: usize, const ELEMS: usize, LenT: LenType> Default
    for InlineStorage<S, BYTES, ELEMS, LenT>
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S: TypeSet, const BYTES: usize, const ELEMS: usize, LenT: LenType> fmt::Debug
    for InlineStorage<S, BYTES, ELEMS, LenT>
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InlineStorage")
            .field("count", &self.count)
            .field("offset", &self.offset)
            .field("bytes", &BYTES)
            .field("elems", &ELEMS)
            .finish()
    }
}

impl<S: TypeSet, const BYTES: usize, const ELEMS: usize, LenT: LenType> Storage<S>
    for InlineStorage<S, BYTES, ELEMS, LenT>
{
}

impl<S: TypeSet, const BYTES: usize, const ELEMS: usize, LenT: LenType> SealedStorage<S>
    for InlineStorage<S, BYTES, ELEMS, LenT>
{
    #[inline]
    fn capacity_bytes(&self) -> usize {
        BYTES
    }

    #[inline]
    fn used_bytes(&self) -> usize {
        self.offset.into_usize()
    }

    #[inline]
    fn element_count(&self) -> usize {
        self.count.into_usize()
    }

    #[inline]
    fn overhead_bytes(&self) -> usize {
        2 * mem::size_of::<LenT>() + self.element_count() * mem::size_of::<RawRecord<LenT>>()
    }

    #[inline]
    fn has_space(&self, end: usize) -> bool {
        end <= BYTES && self.element_count() < ELEMS
    }

    #[inline]
    fn buffer_ptr(&self) -> *const u8 {
        self.buffer.bytes.as_ptr().cast()
    }

    #[inline]
    fn buffer_mut_ptr(&mut self) -> *mut u8 {
        self.buffer.bytes.as_mut_ptr().cast()
    }

    #[inline]
    fn record(&self, index: usize) -> Record {
        debug_assert!(index < self.element_count());
        // SAFETY: records below `count` are initialized
        let raw = unsafe { self.records[index].assume_init() };
        Record {
            tag: raw.tag,
            offset: raw.offset.into_usize(),
        }
    }

    fn grow(&mut self, _required: usize) -> Result<(), Error> {
        Err(Error::CapacityExceeded)
    }

    fn reserve_record(&mut self) -> Result<(), Error> {
        if self.element_count() < ELEMS {
            Ok(())
        } else {
            Err(Error::CapacityExceeded)
        }
    }

    unsafe fn commit(&mut self, record: Record, end: usize) {
        debug_assert!(end <= BYTES);
        self.records[self.element_count()] = MaybeUninit::new(RawRecord {
            tag: record.tag,
            offset: LenT::from_usize(record.offset),
        });
        self.count = LenT::from_usize(self.element_count() + 1);
        self.offset = LenT::from_usize(end);
    }

    fn truncate(&mut self, len: usize) {
        if len < self.element_count() {
            let first = SealedStorage::<S>::record(self, len);
            self.offset = LenT::from_usize(first.offset);
            self.count = LenT::from_usize(len);
        }
    }

    fn new_like(&self) -> Self {
        Self::new()
    }
}
