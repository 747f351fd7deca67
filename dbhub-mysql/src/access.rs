//! Typed access to MySQL pools registered in a hub.

use dbhub_core::{ConnectionHub, HandleKind};
use mysql_async::Pool;

/// MySQL accessors for [`ConnectionHub`].
pub trait MysqlHubExt {
    /// The pool registered under `alias`, if it is a MySQL handle.
    fn pool(&self, alias: &str) -> Option<Pool>;
}

impl MysqlHubExt for ConnectionHub {
    fn pool(&self, alias: &str) -> Option<Pool> {
        self.get(alias)
            .filter(|named| named.kind == HandleKind::Relational)
            .and_then(|named| named.handle.cloned::<Pool>())
    }
}
