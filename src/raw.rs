//! Typed reads and writes at byte offsets of a packed buffer.
//!
//! Every pointer cast and every unaligned access of the crate goes through these functions.
//! Pointers handed to them point into a buffer whose base is aligned to the largest member
//! alignment of the type set; a pointer is only ever misaligned for a packed member, which has no
//! drop glue.

use core::{
    mem::{self, ManuallyDrop, MaybeUninit},
    ptr,
};

/// Rounds `offset` up to the next multiple of `align`, which must be a power of two.
#[inline]
pub const fn align_up(offset: usize, align: usize) -> usize {
    debug_assert!(align.is_power_of_two());
    (offset + align - 1) & !(align - 1)
}

/// Moves `value` into `dst`, which may be misaligned.
///
/// # Safety
///
/// `dst` must be valid for writes of `size_of::<T>()` bytes. The previous contents are not
/// dropped.
#[inline]
pub unsafe fn write_at<T>(dst: *mut T, value: T) {
    // SAFETY: guaranteed by the caller; `write_unaligned` has no alignment requirement
    unsafe { ptr::write_unaligned(dst, value) }
}

/// Moves the value out of `src`, which may be misaligned.
///
/// # Safety
///
/// `src` must point to an initialized `T`. The caller takes over ownership: the bytes at `src`
/// must be treated as moved-from afterwards, or the returned value must not be dropped.
#[inline]
pub unsafe fn take_at<T>(src: *const T) -> T {
    // SAFETY: guaranteed by the caller; `read_unaligned` has no alignment requirement
    unsafe { ptr::read_unaligned(src) }
}

/// Runs `f` on an aligned shared reference to the value at `src`.
///
/// A misaligned value is copied into an aligned local first; the copy is never dropped.
///
/// # Safety
///
/// `src` must point to an initialized `T` that outlives the call. If `src` is misaligned, `T` must
/// have no drop glue.
#[inline]
pub unsafe fn with_aligned<T, R>(src: *const T, f: impl FnOnce(&T) -> R) -> R {
    if src.is_aligned() {
        // SAFETY: aligned and initialized, guaranteed by the caller
        f(unsafe { &*src })
    } else {
        debug_assert!(!mem::needs_drop::<T>());
        // SAFETY: initialized, guaranteed by the caller
        let local = ManuallyDrop::new(unsafe { ptr::read_unaligned(src) });
        f(&local)
    }
}

/// Runs `f` on an aligned mutable reference to the value at `dst`.
///
/// A misaligned value is copied into an aligned local, `f` runs on the local, and the local is
/// written back to `dst` afterwards, also when `f` unwinds.
///
/// # Safety
///
/// `dst` must point to an initialized `T` that is not aliased for the duration of the call. If
/// `dst` is misaligned, `T` must have no drop glue.
#[inline]
pub unsafe fn with_aligned_mut<T, R>(dst: *mut T, f: impl FnOnce(&mut T) -> R) -> R {
    if dst.is_aligned() {
        // SAFETY: aligned, initialized and unaliased, guaranteed by the caller
        return f(unsafe { &mut *dst });
    }

    debug_assert!(!mem::needs_drop::<T>());

    struct WriteBack<T> {
        dst: *mut T,
        local: MaybeUninit<T>,
    }

    impl<T> Drop for WriteBack<T> {
        fn drop(&mut self) {
            // SAFETY: `local` was initialized on construction and is moved out exactly once
            unsafe { ptr::write_unaligned(self.dst, self.local.assume_init_read()) }
        }
    }

    let mut guard = WriteBack {
        dst,
        // SAFETY: initialized, guaranteed by the caller
        local: MaybeUninit::new(unsafe { ptr::read_unaligned(dst) }),
    };
    // SAFETY: initialized just above
    f(unsafe { guard.local.assume_init_mut() })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[repr(C, align(8))]
    struct Buffer([MaybeUninit<u8>; 32]);

    impl Buffer {
        fn new() -> Self {
            Buffer([MaybeUninit::uninit(); 32])
        }

        fn at<T>(&mut self, offset: usize) -> *mut T {
            self.0.as_mut_ptr().cast::<u8>().wrapping_add(offset).cast()
        }
    }

    #[test]
    fn align_up_rounds_to_power_of_two() {
        assert_eq!(align_up(0, 8), 0);
        assert_eq!(align_up(1, 8), 8);
        assert_eq!(align_up(8, 8), 8);
        assert_eq!(align_up(9, 4), 12);
        assert_eq!(align_up(5, 1), 5);
    }

    #[test]
    fn misaligned_round_trip() {
        let mut buffer = Buffer::new();
        let dst = buffer.at::<u64>(3);
        assert!(!dst.is_aligned());

        unsafe {
            write_at(dst, 0xdead_beef_u64);
            assert_eq!(with_aligned(dst, |v| *v), 0xdead_beef);
            assert_eq!(take_at(dst), 0xdead_beef);
        }
    }

    #[test]
    fn misaligned_mutation_is_written_back() {
        let mut buffer = Buffer::new();
        let dst = buffer.at::<u32>(1);

        unsafe {
            write_at(dst, 41_u32);
            let seen = with_aligned_mut(dst, |v| {
                assert!(ptr::addr_of_mut!(*v).is_aligned());
                *v += 1;
                *v
            });
            assert_eq!(seen, 42);
            assert_eq!(take_at(dst), 42);
        }
    }

    #[test]
    fn misaligned_mutation_survives_unwinding() {
        let mut buffer = Buffer::new();
        let dst = buffer.at::<u16>(5);

        unsafe { write_at(dst, 7_u16) };

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| unsafe {
            with_aligned_mut(dst, |v| {
                *v = 9;
                panic!("handler failed");
            })
        }));

        assert!(result.is_err());
        assert_eq!(unsafe { take_at(dst) }, 9);
    }

    #[test]
    fn aligned_access_is_in_place() {
        let mut buffer = Buffer::new();
        let dst = buffer.at::<u64>(8);

        unsafe {
            write_at(dst, 1_u64);
            with_aligned_mut(dst, |v| {
                assert_eq!(ptr::addr_of_mut!(*v), dst);
                *v = 2;
            });
            assert_eq!(with_aligned(dst, |v| *v), 2);
        }
    }
}
