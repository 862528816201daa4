use std::{collections::HashMap, sync::Arc};

use futures::lock::Mutex;

use crate::PriceRecord;

database_derived!(
    /// Reference implementation
    #[derive(Default)]
    pub struct ReferenceDb {
        pub price_records: Arc<Mutex<HashMap<String, PriceRecord>>>,
    }
);
