use packvec::{type_set, InlinePackVec, PackVec};

type_set! {
    #[derive(Debug, Clone, PartialEq)]
    enum Scalar {
        Bool(bool),
        Int(i32),
        Float(f64),
        Text(String) from [&'static str],
    }

    #[derive(Debug, PartialEq)]
    enum ScalarRef<'a>;

    enum ScalarMut<'a>;
}

type_set! {
    enum Owned {
        Bool(bool),
        Int(i32),
        Text(String) from [&'static str],
        Boxed(Box<f64>) as borrowed,
    }

    #[derive(Debug, PartialEq)]
    enum OwnedRef<'a>;

    enum OwnedMut<'a>;
}

macro_rules! scenarios {
    ($name:ident, $new:expr, $new_owned:expr) => {
        mod $name {
            use super::*;

            #[test]
            fn scalars() {
                let mut vec = $new;
                assert!(vec.is_empty());
                assert!(vec.used_bytes() > 0);

                vec.push(true).unwrap();
                assert!(!vec.is_empty());
                vec.push(5).unwrap();
                vec.push(3.5).unwrap();
                vec.push("hello world").unwrap();

                assert_eq!(vec.len(), 4);
                assert_eq!(vec.read(0), ScalarRef::Bool(true));
                assert_eq!(vec.read(1), ScalarRef::Int(5));
                assert_eq!(vec.read(2), ScalarRef::Float(3.5));
                assert_eq!(vec.read(3), ScalarRef::Text("hello world".into()));

                let expected = [
                    ScalarRef::Bool(true),
                    ScalarRef::Int(5),
                    ScalarRef::Float(3.5),
                    ScalarRef::Text("hello world".into()),
                ];
                assert!(vec.iter().eq(expected));

                let mut copy = vec.clone();
                assert_eq!(copy, vec);

                copy.visit(1, |value| {
                    if let ScalarMut::Int(int) = value {
                        *int = 6;
                    }
                });
                assert_eq!(copy.read(1), ScalarRef::Int(6));
                assert_eq!(vec.read(1), ScalarRef::Int(5));
                assert_ne!(copy, vec);
            }

            #[test]
            fn cursors() {
                let mut vec = $new;
                assert!(vec.begin() == vec.end());

                vec.extend([Scalar::Bool(false), Scalar::Int(-1), Scalar::Float(0.25)]);
                let n = vec.len();
                assert!(vec.begin() + n == vec.end());
                assert!(n + vec.begin() == vec.end());
                assert!(vec.end() - n == vec.begin());
                assert!(vec.begin() < vec.end());
                assert_eq!(vec.end() - vec.begin(), 3);

                let mut cursor = vec.begin();
                cursor += 2;
                assert_eq!(cursor.read(), ScalarRef::Float(0.25));
                cursor -= 1;
                assert_eq!(cursor.read(), ScalarRef::Int(-1));
            }

            #[test]
            fn independent_builds_compare_equal() {
                let mut a = $new;
                let mut b = $new;
                for vec in [&mut a, &mut b] {
                    vec.push(1).unwrap();
                    vec.push("x").unwrap();
                }
                assert_eq!(a, a);
                assert_eq!(a, b);

                b.push(false).unwrap();
                assert_ne!(a, b);
                a.push(true).unwrap();
                assert_ne!(a, b);
            }

            #[test]
            fn move_only_members() {
                let mut vec = $new_owned;
                vec.push(true).unwrap();
                vec.push(1337).unwrap();
                vec.push("hello world").unwrap();
                vec.push(Box::new(3.14159)).unwrap();

                let moved = vec;
                assert_eq!(moved.len(), 4);
                assert_eq!(moved.read(1), OwnedRef::Int(1337));
                assert_eq!(moved.read(2), OwnedRef::Text("hello world".into()));

                let OwnedRef::Boxed(boxed) = moved.read(3) else {
                    panic!("expected a box at index 3");
                };
                assert_eq!(**boxed, 3.14159);

                let mut moved = moved;
                let seen = moved.visit(3, |value| match value {
                    OwnedMut::Boxed(boxed) => **boxed,
                    OwnedMut::Bool(_) | OwnedMut::Int(_) | OwnedMut::Text(_) => 0.0,
                });
                assert_eq!(seen, Some(3.14159));
            }

            #[test]
            fn take_leaves_an_empty_vector() {
                let mut vec = $new_owned;
                vec.push(Box::new(1.0)).unwrap();
                vec.push(2).unwrap();

                let taken = core::mem::take(&mut vec);
                assert!(vec.is_empty());
                assert_eq!(taken.len(), 2);
                assert_eq!(taken.read(1), OwnedRef::Int(2));
            }
        }
    };
}

scenarios!(
    heap,
    PackVec::<Scalar>::new(),
    PackVec::<Owned>::new()
);
scenarios!(
    inline,
    InlinePackVec::<Scalar, 128, 8>::new(),
    InlinePackVec::<Owned, 128, 8>::new()
);

#[test]
fn heap_grows_past_the_first_buffer() {
    let mut vec = PackVec::<Scalar>::new();
    let start = vec.capacity_bytes();
    for i in 0..1000_i32 {
        vec.push(i).unwrap();
        vec.push(i % 2 == 0).unwrap();
    }
    assert!(vec.capacity_bytes() > start);
    assert_eq!(vec.len(), 2000);
    for (i, pair) in (0..1000_i32).zip((0..2000).step_by(2)) {
        assert_eq!(vec.read(pair), ScalarRef::Int(i));
        assert_eq!(vec.read(pair + 1), ScalarRef::Bool(i % 2 == 0));
    }
}

#[test]
fn inline_rejects_and_keeps_its_state() {
    let mut vec = InlinePackVec::<Scalar, 8, 2>::new();
    vec.push(1).unwrap();
    vec.push(true).unwrap();
    let error = vec.push(false).unwrap_err();
    assert_eq!(error.error(), packvec::Error::CapacityExceeded);
    assert_eq!(error.into_inner(), Scalar::Bool(false));
    assert_eq!(vec.len(), 2);
    assert_eq!(vec.back(), Some(ScalarRef::Bool(true)));
}
