//! Compile fail tests
//!
//! # Type sets
//!
//! Two members cannot share a type: the conversion into the set would be ambiguous.
//!
//! ``` compile_fail
//! packvec::type_set! {
//!     #[derive(Clone)]
//!     enum Twice {
//!         First(u32),
//!         Second(u32),
//!     }
//!
//!     enum TwiceRef<'a>;
//!     enum TwiceMut<'a>;
//! }
//! ```
//!
//! Neither can a member claim a source type that converts into another member.
//!
//! ``` compile_fail
//! packvec::type_set! {
//!     #[derive(Clone)]
//!     enum Text {
//!         Owned(String),
//!         Boxed(Box<str>) from [String],
//!     }
//!
//!     enum TextRef<'a>;
//!     enum TextMut<'a>;
//! }
//! ```
//!
//! A member that is not `Clone` must be read by reference.
//!
//! ``` compile_fail
//! struct Unique(u32);
//!
//! packvec::type_set! {
//!     enum Set {
//!         Plain(u8),
//!         Unique(Unique),
//!     }
//!
//!     enum SetRef<'a>;
//!     enum SetMut<'a>;
//! }
//! ```
//!
//! ```
//! struct Unique(u32);
//!
//! packvec::type_set! {
//!     enum Set {
//!         Plain(u8),
//!         Unique(Unique) as borrowed,
//!     }
//!
//!     enum SetRef<'a>;
//!     enum SetMut<'a>;
//! }
//! ```
//!
//! Unknown modes are rejected.
//!
//! ``` compile_fail
//! packvec::type_set! {
//!     #[derive(Clone)]
//!     enum Set {
//!         Plain(u8) as pinned,
//!     }
//!
//!     enum SetRef<'a>;
//!     enum SetMut<'a>;
//! }
//! ```
//!
//! # Containers
//!
//! Only vectors over a `Clone` set are `Clone`.
//!
//! ``` compile_fail
//! packvec::type_set! {
//!     enum Set {
//!         Boxed(Box<u8>) as borrowed,
//!     }
//!
//!     enum SetRef<'a>;
//!     enum SetMut<'a>;
//! }
//!
//! let vec = packvec::PackVec::<Set>::new();
//! let _: packvec::PackVec<Set> = vec.clone();
//! ```
//!
//! A visit must handle every member.
//!
//! ``` compile_fail
//! packvec::type_set! {
//!     #[derive(Clone)]
//!     enum Set {
//!         Int(i32),
//!         Real(f32),
//!     }
//!
//!     enum SetRef<'a>;
//!     enum SetMut<'a>;
//! }
//!
//! let mut vec = packvec::PackVec::<Set>::new();
//! vec.push(1).unwrap();
//! vec.visit(0, |value| match value {
//!     SetMut::Int(int) => *int += 1,
//! });
//! ```
//!
//! References handed out by a read cannot outlive a push.
//!
//! ``` compile_fail
//! packvec::type_set! {
//!     enum Set {
//!         Text(String) as borrowed,
//!     }
//!
//!     enum SetRef<'a>;
//!     enum SetMut<'a>;
//! }
//!
//! let mut vec = packvec::PackVec::<Set>::new();
//! vec.push(String::from("a")).unwrap();
//! let first = vec.read(0);
//! vec.push(String::from("b")).unwrap();
//! drop(first);
//! ```
//!
//! # `Send`-ness
//!
//! Vectors of non-`Send`-able things are *not* `Send`
//!
//! ``` compile_fail
//! use std::rc::Rc;
//!
//! packvec::type_set! {
//!     #[derive(Clone)]
//!     enum Shared {
//!         Counted(Rc<u8>),
//!     }
//!
//!     enum SharedRef<'a>;
//!     enum SharedMut<'a>;
//! }
//!
//! fn is_send<T>() where T: Send {}
//!
//! is_send::<packvec::InlinePackVec<Shared, 64, 8>>();
//! ```
