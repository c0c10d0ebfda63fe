use core::{fmt, marker::PhantomData};

use serde::de::{self, Deserialize, Deserializer, Error, SeqAccess};

use crate::{storage::Storage, PackVecInner, TypeSet};

// Sequential containers

impl<'de, S, B> Deserialize<'de> for PackVecInner<S, B>
where
    S: TypeSet + Deserialize<'de>,
    B: Storage<S> + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor<'de, S, B>(PhantomData<(&'de (), S, B)>);

        impl<'de, S, B> de::Visitor<'de> for ValueVisitor<'de, S, B>
        where
            S: TypeSet + Deserialize<'de>,
            B: Storage<S> + Default,
        {
            type Value = PackVecInner<S, B>;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a sequence")
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut values = PackVecInner::default();

                while let Some(value) = seq.next_element::<S>()? {
                    if values.push(value).is_err() {
                        return Err(A::Error::invalid_length(values.len() + 1, &self));
                    }
                }

                Ok(values)
            }
        }
        deserializer.deserialize_seq(ValueVisitor(PhantomData))
    }
}
