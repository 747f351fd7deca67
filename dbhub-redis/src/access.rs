//! Typed access to Redis clients registered in a hub.

use dbhub_core::{ConnectionHub, HandleKind};

use crate::client::RedisClient;

/// Redis accessors for [`ConnectionHub`].
pub trait RedisHubExt {
    /// The client registered under `alias`, if it is a Redis handle.
    fn redis(&self, alias: &str) -> Option<RedisClient>;
}

impl RedisHubExt for ConnectionHub {
    fn redis(&self, alias: &str) -> Option<RedisClient> {
        self.get(alias)
            .filter(|named| named.kind == HandleKind::KeyValue)
            .and_then(|named| named.handle.cloned::<RedisClient>())
    }
}
