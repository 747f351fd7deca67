//! Typed access to MongoDB handles registered in a hub.

use dbhub_core::{ConnectionHub, HandleKind};
use mongodb::{Collection, Database};

/// MongoDB accessors for [`ConnectionHub`].
pub trait MongoHubExt {
    /// The database registered under `alias`, if it is a MongoDB handle.
    fn database(&self, alias: &str) -> Option<Database>;

    /// A typed collection of the database registered under `alias`.
    fn collection<T: Send + Sync>(&self, alias: &str, name: &str) -> Option<Collection<T>> {
        self.database(alias).map(|db| db.collection(name))
    }
}

impl MongoHubExt for ConnectionHub {
    fn database(&self, alias: &str) -> Option<Database> {
        let named = self.get(alias)?;
        match named.kind {
            HandleKind::Document | HandleKind::DocumentSecondary | HandleKind::Mapper => {
                named.handle.cloned::<Database>()
            }
            _ => None,
        }
    }
}
