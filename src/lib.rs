//! Append-only vectors that pack values of a closed set of types back to back in one byte buffer.
//!
//! A [`PackVec`] or an [`InlinePackVec`] stores elements of several different types declared up
//! front with [`type_set!`]. Instead of one enum-sized slot per element, every element takes the
//! bytes of its own type, plus a small record holding its type tag and offset. Values of types
//! without drop glue are stored without padding, even when that leaves them misaligned; they are
//! realigned transparently when read or mutated.
//!
//! # Examples
//!
//! ```
//! use packvec::{type_set, InlinePackVec, PackVec};
//!
//! type_set! {
//!     #[derive(Debug, Clone, PartialEq)]
//!     pub enum Scalar {
//!         Bool(bool),
//!         Int(i32),
//!         Float(f64),
//!         Text(String) from [&'static str],
//!     }
//!
//!     #[derive(Debug, PartialEq)]
//!     pub enum ScalarRef<'a>;
//!
//!     pub enum ScalarMut<'a>;
//! }
//!
//! // growable, backed by the heap
//! let mut vec = PackVec::<Scalar>::new();
//! vec.push(true).unwrap();
//! vec.push(42).unwrap();
//! vec.push(2.5).unwrap();
//! vec.push("text").unwrap();
//!
//! assert_eq!(vec.len(), 4);
//! assert_eq!(vec.read(1), ScalarRef::Int(42));
//! assert_eq!(vec.back(), Some(ScalarRef::Text("text".into())));
//!
//! // `bool` takes one byte, the `i32` right behind it is not padded
//! assert_eq!(vec.record(1).unwrap().offset, 1);
//!
//! vec.visit(1, |value| match value {
//!     ScalarMut::Int(int) => *int += 1,
//!     ScalarMut::Bool(_) | ScalarMut::Float(_) | ScalarMut::Text(_) => {}
//! });
//! assert_eq!(vec.read(1), ScalarRef::Int(43));
//!
//! // fixed capacity of 16 bytes and 4 elements, no heap
//! let mut inline = InlinePackVec::<Scalar, 16, 4>::new();
//! inline.push(1).unwrap();
//! inline.push(2.0).unwrap();
//! assert!(inline.push("does not fit").is_err());
//! ```
//!
//! # `Send`-ness
//!
//! Containers of `Send`-able things are `Send`, see `tests/cpass.rs`.
//!
//! # Cargo features
//!
//! - `alloc` (default): the growable [`PackVec`].
//! - `serde`: `Serialize` and `Deserialize` for the containers.
//! - `defmt`: `defmt::Format` for the containers and the error types.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(clippy::missing_safety_doc, unsafe_op_in_unsafe_fn)]

#[cfg(feature = "alloc")]
extern crate alloc;

use core::fmt;

pub use len_type::LenType;
pub use set::{Borrowed, Copied, Mode, Project, Resolve, ResolveMut, Tag, TypeSet};
pub use storage::Record;
#[cfg(feature = "alloc")]
pub use vec::PackVec;
pub use vec::{Cursor, InlinePackVec, IntoIter, Iter, PackVecInner};

#[macro_use]
#[cfg(test)]
mod test_helpers;

mod len_type;
mod macros;
mod raw;
mod set;
pub mod storage;
pub mod vec;

#[cfg(feature = "defmt")]
#[path = "defmt.rs"]
mod defmt_impls;
#[cfg(feature = "serde")]
mod de;
#[cfg(feature = "serde")]
mod ser;

#[cfg(doctest)]
mod cfail;

/// The error type for fallible operations on the containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(::defmt::Format))]
pub enum Error {
    /// The fixed capacity of an inline container is exhausted, or a requested capacity cannot be
    /// represented.
    CapacityExceeded,
    /// The allocator could not provide a heap buffer.
    AllocationFailure {
        /// Size of the failed request.
        bytes: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CapacityExceeded => "insufficient capacity".fmt(f),
            Self::AllocationFailure { bytes } => write!(f, "failed to allocate {bytes} bytes"),
        }
    }
}

impl core::error::Error for Error {}

/// The error type of [`push`](PackVecInner::push), handing back the value that could not be
/// stored.
pub struct PushError<S> {
    error: Error,
    value: S,
}

impl<S> PushError<S> {
    pub(crate) fn new(error: Error, value: S) -> Self {
        Self { error, value }
    }

    /// The reason the push failed.
    pub fn error(&self) -> Error {
        self.error
    }

    /// The value that was not stored.
    pub fn value(&self) -> &S {
        &self.value
    }

    /// Takes back the value that was not stored.
    pub fn into_inner(self) -> S {
        self.value
    }
}

impl<S> fmt::Debug for PushError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PushError")
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl<S> fmt::Display for PushError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "push failed: {}", self.error)
    }
}

impl<S> core::error::Error for PushError<S> {}

#[doc(hidden)]
pub mod __private {
    pub use crate::raw::{take_at, with_aligned_mut, write_at};
    pub use crate::set::{invalid_tag, packed};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(Error::CapacityExceeded.to_string(), "insufficient capacity");
        assert_eq!(
            Error::AllocationFailure { bytes: 64 }.to_string(),
            "failed to allocate 64 bytes"
        );
        assert_eq!(
            PushError::new(Error::CapacityExceeded, 1_u8).to_string(),
            "push failed: insufficient capacity"
        );
    }

    #[test]
    fn push_error_hands_the_value_back() {
        let error = PushError::new(Error::CapacityExceeded, String::from("kept"));
        assert_eq!(error.error(), Error::CapacityExceeded);
        assert_eq!(error.value(), "kept");
        assert_eq!(error.into_inner(), "kept");
        assert_eq!(
            format!("{:?}", PushError::new(Error::CapacityExceeded, ())),
            "PushError { error: CapacityExceeded, .. }"
        );
    }
}
