//! `Storage` trait defining where the bytes and records of a container live.

use crate::{set::Tag, Error, TypeSet};

#[cfg(feature = "alloc")]
mod heap;
mod inline;

#[cfg(feature = "alloc")]
pub use heap::HeapStorage;
pub use inline::InlineStorage;

/// Location of one element: the member it holds and its byte offset in the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Record {
    /// Tag of the member stored.
    pub tag: Tag,
    /// Byte offset of the element from the start of the buffer.
    pub offset: usize,
}

/// Trait defining how the bytes and records of a container are stored.
///
/// There's two implementations available:
///
/// - [`InlineStorage`]: a byte array and a record array of fixed sizes, stored inside the
///   container itself. No heap allocation.
/// - [`HeapStorage`]: a heap buffer that doubles when full.
///
/// This allows [`PackVecInner`](crate::vec::PackVecInner) to be generic over both, with two type
/// aliases for convenience:
///
/// - [`InlinePackVec<S, BYTES, ELEMS>`](crate::InlinePackVec) =
///   `PackVecInner<S, InlineStorage<S, BYTES, ELEMS>>`
/// - [`PackVec<S>`](crate::PackVec) = `PackVecInner<S, HeapStorage<S>>`
///
/// This trait is sealed, so you cannot implement it for your own types. You can only use
/// the implementations provided by this crate.
#[allow(private_bounds)]
pub trait Storage<S: TypeSet>: SealedStorage<S> {}

pub(crate) trait SealedStorage<S: TypeSet> {
    /// Size of the byte buffer.
    fn capacity_bytes(&self) -> usize;
    /// Payload bytes consumed, padding included; the next free offset.
    fn used_bytes(&self) -> usize;
    fn element_count(&self) -> usize;
    /// Bytes of bookkeeping: the count and offset fields plus one record per element.
    fn overhead_bytes(&self) -> usize;
    /// Whether an element ending at byte `end` fits without growing.
    fn has_space(&self, end: usize) -> bool;

    fn buffer_ptr(&self) -> *const u8;
    fn buffer_mut_ptr(&mut self) -> *mut u8;

    /// Record of the element at `index`, which must be below `element_count()`.
    fn record(&self, index: usize) -> Record;

    /// Makes room for at least `required` bytes, keeping the used prefix and every record.
    ///
    /// On failure nothing is changed.
    fn grow(&mut self, required: usize) -> Result<(), Error>;
    /// Makes sure the next [`commit`](SealedStorage::commit) has room for its record.
    fn reserve_record(&mut self) -> Result<(), Error>;

    /// Appends `record` and moves the free offset to `end`.
    ///
    /// # Safety
    ///
    /// A record must have been reserved, and the bytes up to `end` must hold the element
    /// described by `record`, with `end` within the capacity.
    unsafe fn commit(&mut self, record: Record, end: usize);

    /// Forgets every record from `len` on and rewinds the free offset to the first forgotten
    /// element. Nothing is dropped.
    fn truncate(&mut self, len: usize);

    /// An empty storage with the same capacity.
    fn new_like(&self) -> Self;
}
