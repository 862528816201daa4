mod reference;

pub use self::reference::*;

/// Database information to use to create a client
pub enum DatabaseInfo {
    /// Use the in-memory reference database
    Reference,
}

/// Database
#[derive(Clone)]
pub enum Database {
    /// In-memory reference database
    Reference(ReferenceDb),
}

impl DatabaseInfo {
    /// Create a database client from the given database information
    pub async fn connect(self) -> Result<Database, String> {
        match self {
            DatabaseInfo::Reference => Ok(Database::Reference(Default::default())),
        }
    }
}
