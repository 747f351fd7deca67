//! # dbhub-redis
//!
//! Redis support for dbhub.
//!
//! An entry is registered as soon as its client exists. The connection is
//! opened by a background probe; failures after that point are logged and
//! never reject `init`. Closing sends `QUIT` when a connection was opened.
//!
//! ```rust,ignore
//! use dbhub_core::{ConnectionHub, ConnectionSpec};
//! use dbhub_redis::{RedisConnector, RedisHubExt};
//! use redis::AsyncCommands;
//!
//! let hub = ConnectionHub::builder().connector(RedisConnector::new()).build();
//! hub.init([ConnectionSpec::new("redis://localhost:6379").name("cache")]).await?;
//!
//! let mut conn = hub.redis("cache").unwrap().connection().await?;
//! conn.set::<_, _, ()>("greeting", "hello").await?;
//! ```

pub mod access;
pub mod client;
pub mod connector;

pub use access::RedisHubExt;
pub use client::RedisClient;
pub use connector::{RedisConnector, redis_url};
