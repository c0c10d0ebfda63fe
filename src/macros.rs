/// Declares a closed [`TypeSet`](crate::TypeSet) and its borrowed views.
///
/// The macro takes three enum declarations: the owned set with one single-field variant per
/// member, then the names of the read view and the visit view, each with one lifetime parameter.
/// Attributes and visibility are passed through to the generated enums.
///
/// Each member may carry two annotations:
///
/// - `as borrowed`: reads return `&'a T` pointing at the element in place instead of a clone.
///   Required for members that are not `Clone`. Members in this mode are always stored aligned.
/// - `from [A, B]`: additional source types convertible into the member with `From`.
///
/// Members in the default mode without drop glue are stored packed, directly at the end of the
/// previous element regardless of their alignment.
///
/// At most 256 members are allowed, and two members cannot share a type or a `from` source: the
/// generated `From` impls would conflict.
///
/// ```
/// packvec::type_set! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub enum Value {
///         Flag(bool),
///         Int(i64),
///         Text(String) from [&'static str],
///         Blob(Vec<u8>) as borrowed,
///     }
///
///     #[derive(Debug, PartialEq)]
///     pub enum ValueRef<'a>;
///
///     pub enum ValueMut<'a>;
/// }
///
/// let mut vec = packvec::PackVec::<Value>::new();
/// vec.push(true).unwrap();
/// vec.push("hello").unwrap();
/// vec.push(vec![1_u8, 2]).unwrap();
///
/// assert_eq!(vec.read(0), ValueRef::Flag(true));
/// assert_eq!(vec.read(1), ValueRef::Text("hello".into()));
/// assert_eq!(vec.read(2), ValueRef::Blob(&vec![1, 2]));
///
/// vec.visit(1, |value| {
///     if let ValueMut::Text(text) = value {
///         text.push_str(", world");
///     }
/// });
/// assert_eq!(vec.read(1), ValueRef::Text("hello, world".into()));
/// ```
#[macro_export]
macro_rules! type_set {
    (
        $(#[$meta:meta])*
        $vis:vis enum $Name:ident {
            $(
                $(#[$vmeta:meta])*
                $Variant:ident($T:ty) $(as $mode:ident)? $(from [$($Src:ty),* $(,)?])?
            ),+ $(,)?
        }

        $(#[$rmeta:meta])*
        $rvis:vis enum $Ref:ident<$rl:lifetime>;

        $(#[$mmeta:meta])*
        $mvis:vis enum $Mut:ident<$ml:lifetime>;
    ) => {
        $(#[$meta])*
        $vis enum $Name {
            $(
                $(#[$vmeta])*
                $Variant($T),
            )+
        }

        $(#[$rmeta])*
        $rvis enum $Ref<$rl> {
            $(
                $Variant($crate::__type_set_mode!(@out [$($mode)?] $rl, $T)),
            )+
        }

        $(#[$mmeta])*
        $mvis enum $Mut<$ml> {
            $(
                $Variant(&$ml mut $T),
            )+
        }

        $(
            impl ::core::convert::From<$T> for $Name {
                #[inline]
                fn from(value: $T) -> Self {
                    $Name::$Variant(value)
                }
            }

            $($(
                impl ::core::convert::From<$Src> for $Name {
                    #[inline]
                    fn from(value: $Src) -> Self {
                        $Name::$Variant(<$T as ::core::convert::From<$Src>>::from(value))
                    }
                }
            )*)?
        )+

        const _: () = {
            #[allow(non_camel_case_types, clippy::upper_case_acronyms)]
            enum __Tag {
                $($Variant,)+
            }

            assert!(
                <$Name as $crate::TypeSet>::LAYOUTS.len() <= 256,
                "a type set holds at most 256 types"
            );

            unsafe impl $crate::TypeSet for $Name {
                type Ref<'r> = $Ref<'r>;
                type Mut<'r> = $Mut<'r>;

                const LAYOUTS: &'static [::core::alloc::Layout] =
                    &[$(::core::alloc::Layout::new::<$T>(),)+];
                const PACKED: &'static [bool] =
                    &[$($crate::__type_set_mode!(@packed [$($mode)?] $T),)+];

                #[inline]
                fn tag(&self) -> $crate::Tag {
                    match self {
                        $($Name::$Variant(_) => __Tag::$Variant as $crate::Tag,)+
                    }
                }

                #[inline]
                unsafe fn write(self, dst: *mut u8) {
                    match self {
                        $(
                            // SAFETY: forwarded from the caller
                            $Name::$Variant(value) => unsafe {
                                $crate::__private::write_at(dst.cast::<$T>(), value)
                            },
                        )+
                    }
                }

                unsafe fn take(tag: $crate::Tag, src: *const u8) -> Self {
                    $(
                        if tag == __Tag::$Variant as $crate::Tag {
                            // SAFETY: forwarded from the caller
                            return $Name::$Variant(unsafe {
                                $crate::__private::take_at(src.cast::<$T>())
                            });
                        }
                    )+
                    $crate::__private::invalid_tag(tag, <Self as $crate::TypeSet>::LEN)
                }

                unsafe fn resolve<__R: $crate::Resolve>(
                    tag: $crate::Tag,
                    ptr: *mut u8,
                    callback: __R,
                ) -> __R::Output {
                    $(
                        if tag == __Tag::$Variant as $crate::Tag {
                            // SAFETY: forwarded from the caller
                            return unsafe { callback.call::<$T>(ptr.cast::<$T>()) };
                        }
                    )+
                    $crate::__private::invalid_tag(tag, <Self as $crate::TypeSet>::LEN)
                }

                unsafe fn read<'r>(tag: $crate::Tag, src: *const u8) -> $Ref<'r> {
                    $(
                        if tag == __Tag::$Variant as $crate::Tag {
                            // SAFETY: forwarded from the caller; only packed members are
                            // misaligned
                            return $Ref::$Variant(unsafe {
                                $crate::__type_set_mode!(@project [$($mode)?] 'r, $T, src.cast::<$T>())
                            });
                        }
                    )+
                    $crate::__private::invalid_tag(tag, <Self as $crate::TypeSet>::LEN)
                }

                unsafe fn visit<__F, __R>(tag: $crate::Tag, ptr: *mut u8, f: __F) -> __R
                where
                    __F: for<'b> ::core::ops::FnOnce($Mut<'b>) -> __R,
                {
                    $(
                        if tag == __Tag::$Variant as $crate::Tag {
                            // SAFETY: forwarded from the caller; only packed members are
                            // misaligned
                            return unsafe {
                                $crate::__private::with_aligned_mut(ptr.cast::<$T>(), move |value| {
                                    f($Mut::$Variant(value))
                                })
                            };
                        }
                    )+
                    $crate::__private::invalid_tag(tag, <Self as $crate::TypeSet>::LEN)
                }
            }
        };
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __type_set_mode {
    (@$op:ident [] $($rest:tt)*) => {
        $crate::__type_set_mode!(@$op [copied] $($rest)*)
    };
    (@out [copied] $lt:lifetime, $T:ty) => {
        <$crate::Copied as $crate::Project<$lt, $T>>::Out
    };
    (@out [borrowed] $lt:lifetime, $T:ty) => {
        <$crate::Borrowed as $crate::Project<$lt, $T>>::Out
    };
    (@project [copied] $lt:lifetime, $T:ty, $src:expr) => {
        <$crate::Copied as $crate::Project<$lt, $T>>::project($src)
    };
    (@project [borrowed] $lt:lifetime, $T:ty, $src:expr) => {
        <$crate::Borrowed as $crate::Project<$lt, $T>>::project($src)
    };
    (@packed [copied] $T:ty) => {
        $crate::__private::packed::<$T, $crate::Copied>()
    };
    (@packed [borrowed] $T:ty) => {
        $crate::__private::packed::<$T, $crate::Borrowed>()
    };
    (@$op:ident [$mode:ident] $($rest:tt)*) => {
        ::core::compile_error!(::core::concat!(
            "unknown member mode `",
            ::core::stringify!($mode),
            "`, expected `borrowed` or `copied`"
        ))
    };
}
