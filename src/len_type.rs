use core::fmt::{Debug, Display};

pub trait Sealed: Send + Sync + Copy + Display + Debug + PartialEq + PartialOrd {
    /// The zero value of the integer type.
    const ZERO: Self;
    /// The maximum value of this type, as a `usize`.
    const MAX_USIZE: usize;

    /// Narrowing conversion from `usize`.
    ///
    /// Callers only pass values already bounded by a capacity that was checked with
    /// [`check_capacity_fits`].
    fn from_usize(val: usize) -> Self;

    /// Widening conversion to `usize`.
    fn into_usize(self) -> usize;
}

macro_rules! impl_lentype {
    ($($(#[$meta:meta])* $LenT:ident),*) => {$(
        $(#[$meta])*
        impl Sealed for $LenT {
            const ZERO: Self = 0;
            const MAX_USIZE: usize = Self::MAX as _;

            #[inline]
            fn from_usize(val: usize) -> Self {
                debug_assert!(val <= Self::MAX_USIZE);
                val as Self
            }

            #[inline]
            fn into_usize(self) -> usize {
                self as usize
            }
        }

        $(#[$meta])*
        impl LenType for $LenT {}
    )*}
}

/// A sealed trait for the integer width of the element count, the byte offset and every record
/// offset of an [`InlinePackVec`](crate::InlinePackVec).
///
/// This cannot be implemented in user code, and is restricted to `u8`, `u16`, `u32`, and `usize`.
/// Smaller widths make the record table smaller; the byte and element capacities must fit.
pub trait LenType: Sealed {}

impl_lentype!(
    u8,
    u16,
    #[cfg(any(target_pointer_width = "32", target_pointer_width = "64"))]
    u32,
    usize
);

pub const fn check_capacity_fits<LenT: LenType, const N: usize>() {
    assert!(
        LenT::MAX_USIZE >= N,
        "The capacity is larger than `LenT` can hold, increase the size of `LenT` or reduce the capacity"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_within_range() {
        fn check<T: LenType>() {
            const COUNT: usize = 100;
            for i in 0..COUNT {
                let n = i * (T::MAX_USIZE / COUNT);
                assert_eq!(T::from_usize(n).into_usize(), n);
            }
            assert_eq!(T::from_usize(T::MAX_USIZE).into_usize(), T::MAX_USIZE);
        }
        check::<u8>();
        check::<u16>();
        check::<u32>();
        check::<usize>();
    }

    #[test]
    fn capacity_checks_are_const() {
        const {
            check_capacity_fits::<u8, 255>();
            check_capacity_fits::<u16, 65_535>();
            check_capacity_fits::<usize, { usize::MAX }>();
        }
    }
}
