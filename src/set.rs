//! The closed set of types a container can hold, and the tag-driven dispatch over it.

use core::{alloc::Layout, mem};

use crate::raw;

/// Index of a member in its [`TypeSet`], in declaration order.
pub type Tag = u8;

/// A closed set of element types.
///
/// The implementing type is the owned sum of all members, one single-field variant per member.
/// Implement it with [`type_set!`](crate::type_set), which also generates the two borrowed views:
///
/// - [`Ref`](TypeSet::Ref): what a read hands out. Members in copied mode appear by value,
///   members declared `as borrowed` appear as `&'a T` pointing at the element in place.
/// - [`Mut`](TypeSet::Mut): one `&'a mut T` variant per member, handed to
///   [`visit`](crate::vec::PackVecInner::visit).
///
/// # Safety
///
/// The tag of a member is its declaration index. `LAYOUTS`, `PACKED`, [`tag`](TypeSet::tag) and
/// every dispatch method must agree on it: a tag must select the same member everywhere. A member
/// may only be flagged in `PACKED` if it has no drop glue and is never exposed by reference.
pub unsafe trait TypeSet: Sized + 'static {
    /// Public view of one element, produced by a read.
    type Ref<'a>;
    /// Mutable view of one element, produced by a visit.
    type Mut<'a>;

    /// Size and alignment of every member, indexed by tag.
    const LAYOUTS: &'static [Layout];
    /// Whether a member may be stored at a misaligned offset, indexed by tag.
    const PACKED: &'static [bool];

    /// Number of members.
    const LEN: usize = Self::LAYOUTS.len();
    /// Largest member alignment; every buffer is aligned to it.
    const MAX_ALIGN: usize = max_align(Self::LAYOUTS);
    /// Largest member size.
    const MAX_SIZE: usize = max_size(Self::LAYOUTS);
    /// Smallest member size.
    const MIN_SIZE: usize = min_size(Self::LAYOUTS);

    /// Tag of the member this value holds.
    fn tag(&self) -> Tag;

    /// Moves the held member into `dst`.
    ///
    /// # Safety
    ///
    /// `dst` must be valid for writes of the member's size and aligned for it unless the member
    /// is packed.
    unsafe fn write(self, dst: *mut u8);

    /// Moves the member selected by `tag` out of `src`.
    ///
    /// # Safety
    ///
    /// `src` must point to an initialized member of that type, stored as [`write`] stores it. The
    /// bytes at `src` are logically moved-from afterwards.
    ///
    /// [`write`]: TypeSet::write
    unsafe fn take(tag: Tag, src: *const u8) -> Self;

    /// Casts `ptr` to the member selected by `tag` and invokes `callback` on it.
    ///
    /// The pointer is handed over as is and may be misaligned for a packed member.
    ///
    /// # Panics
    ///
    /// Panics if `tag` is not a member of the set.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an initialized member of that type.
    unsafe fn resolve<R: Resolve>(tag: Tag, ptr: *mut u8, callback: R) -> R::Output;

    /// Builds the public view of the member selected by `tag`.
    ///
    /// # Safety
    ///
    /// `src` must point to an initialized member of that type that is not mutated for `'a`.
    unsafe fn read<'a>(tag: Tag, src: *const u8) -> Self::Ref<'a>;

    /// Hands an aligned mutable view of the member selected by `tag` to `f`.
    ///
    /// A misaligned packed member is visited through an aligned copy that is written back
    /// afterwards.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an initialized, unaliased member of that type.
    unsafe fn visit<F, R>(tag: Tag, ptr: *mut u8, f: F) -> R
    where
        F: for<'b> FnOnce(Self::Mut<'b>) -> R;

    /// Like [`resolve`](TypeSet::resolve), but `callback` receives an aligned `&mut T`.
    ///
    /// A misaligned packed member is visited through an aligned copy that is written back
    /// afterwards.
    ///
    /// # Safety
    ///
    /// `ptr` must point to an initialized, unaliased member of that type.
    unsafe fn resolve_aligned<R: ResolveMut>(tag: Tag, ptr: *mut u8, callback: R) -> R::Output {
        // SAFETY: forwarded from the caller
        unsafe { Self::resolve(tag, ptr, Aligned(callback)) }
    }

    /// Layout of the member selected by `tag`.
    #[inline]
    fn layout(tag: Tag) -> Layout {
        Self::LAYOUTS[usize::from(tag)]
    }

    /// Whether the member selected by `tag` may be stored misaligned.
    #[inline]
    fn is_packed(tag: Tag) -> bool {
        Self::PACKED[usize::from(tag)]
    }
}

/// Callback invoked by [`TypeSet::resolve`] with a pointer to the resolved member.
pub trait Resolve {
    /// Value returned by every arm.
    type Output;

    /// Called with the resolved member type.
    ///
    /// # Safety
    ///
    /// `ptr` points to an initialized `T`; it may be misaligned.
    unsafe fn call<T>(self, ptr: *mut T) -> Self::Output;
}

/// Callback invoked by [`TypeSet::resolve_aligned`] with an aligned reference to the resolved
/// member.
pub trait ResolveMut {
    /// Value returned by every arm.
    type Output;

    /// Called with the resolved member type.
    fn call<T>(self, value: &mut T) -> Self::Output;
}

struct Aligned<R>(R);

impl<R: ResolveMut> Resolve for Aligned<R> {
    type Output = R::Output;

    unsafe fn call<T>(self, ptr: *mut T) -> R::Output {
        // SAFETY: `resolve` hands over a pointer to an initialized `T`, unaliased per the
        // contract of `resolve_aligned`; only packed members are misaligned
        unsafe { raw::with_aligned_mut(ptr, |value| self.0.call(value)) }
    }
}

/// How a member appears in the public [`Ref`](TypeSet::Ref) view.
pub trait Mode {
    /// Whether members in this mode may be stored misaligned, provided they have no drop glue.
    const PACKABLE: bool;
}

/// Produces the public view of a member of type `T`.
pub trait Project<'a, T: 'a>: Mode {
    /// The public view.
    type Out;

    /// Builds the public view of the value at `src`.
    ///
    /// # Safety
    ///
    /// `src` must point to an initialized `T` that lives and stays unmodified for `'a`. It may
    /// only be misaligned if `T` has no drop glue and the mode is packable.
    unsafe fn project(src: *const T) -> Self::Out;
}

/// Default mode: reads return a clone of the element. Requires `T: Clone`.
pub enum Copied {}

impl Mode for Copied {
    const PACKABLE: bool = true;
}

impl<'a, T: Clone + 'a> Project<'a, T> for Copied {
    type Out = T;

    #[inline]
    unsafe fn project(src: *const T) -> T {
        // SAFETY: forwarded from the caller
        unsafe { raw::with_aligned(src, T::clone) }
    }
}

/// Reads return a shared reference to the element in place. Selected with `as borrowed`.
///
/// Members in this mode are always stored aligned.
pub enum Borrowed {}

impl Mode for Borrowed {
    const PACKABLE: bool = false;
}

impl<'a, T: 'a> Project<'a, T> for Borrowed {
    type Out = &'a T;

    #[inline]
    unsafe fn project(src: *const T) -> &'a T {
        debug_assert!(src.is_aligned());
        // SAFETY: aligned because borrowed members are never packed; lifetime guaranteed by the
        // caller
        unsafe { &*src }
    }
}

#[doc(hidden)]
pub const fn packed<T, M: Mode>() -> bool {
    M::PACKABLE && !mem::needs_drop::<T>()
}

#[doc(hidden)]
#[cold]
#[track_caller]
pub fn invalid_tag(tag: Tag, len: usize) -> ! {
    panic!("invalid tag {tag} for a set of {len} types")
}

const fn max_align(layouts: &[Layout]) -> usize {
    let mut max = 1;
    let mut i = 0;
    while i < layouts.len() {
        if layouts[i].align() > max {
            max = layouts[i].align();
        }
        i += 1;
    }
    max
}

const fn max_size(layouts: &[Layout]) -> usize {
    let mut max = 0;
    let mut i = 0;
    while i < layouts.len() {
        if layouts[i].size() > max {
            max = layouts[i].size();
        }
        i += 1;
    }
    max
}

const fn min_size(layouts: &[Layout]) -> usize {
    let mut min = usize::MAX;
    let mut i = 0;
    while i < layouts.len() {
        if layouts[i].size() < min {
            min = layouts[i].size();
        }
        i += 1;
    }
    min
}
