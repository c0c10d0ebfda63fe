use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::{storage::Storage, PackVecInner, TypeSet};

// Sequential containers

impl<S, B> Serialize for PackVecInner<S, B>
where
    S: TypeSet + Serialize,
    B: Storage<S>,
{
    fn serialize<SER>(&self, serializer: SER) -> Result<SER::Ok, SER::Error>
    where
        SER: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for index in 0..self.len() {
            self.with_owned(index, |element| seq.serialize_element(element))?;
        }
        seq.end()
    }
}
