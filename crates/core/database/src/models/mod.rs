mod price_records;

pub use price_records::*;

use crate::{Database, ReferenceDb};

pub trait AbstractDatabase: Sync + Send + price_records::AbstractPriceRecords {}

impl AbstractDatabase for ReferenceDb {}

impl std::ops::Deref for Database {
    type Target = dyn AbstractDatabase;

    fn deref(&self) -> &Self::Target {
        match &self {
            Database::Reference(dummy) => dummy,
        }
    }
}
