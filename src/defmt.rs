//! Defmt implementations for packvec types

use defmt::Formatter;

use crate::{storage::Storage, PackVecInner, PushError, TypeSet};

impl<S, B> defmt::Format for PackVecInner<S, B>
where
    S: TypeSet,
    B: Storage<S>,
    for<'a> S::Ref<'a>: defmt::Format,
{
    fn format(&self, fmt: Formatter<'_>) {
        defmt::write!(fmt, "[");
        for (index, value) in self.iter().enumerate() {
            if index != 0 {
                defmt::write!(fmt, ", ");
            }
            defmt::write!(fmt, "{}", value);
        }
        defmt::write!(fmt, "]");
    }
}

impl<S> defmt::Format for PushError<S> {
    fn format(&self, fmt: Formatter<'_>) {
        defmt::write!(fmt, "push failed: {}", self.error());
    }
}
