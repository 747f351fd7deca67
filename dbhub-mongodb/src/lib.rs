//! # dbhub-mongodb
//!
//! MongoDB support for dbhub.
//!
//! This crate provides:
//! - [`MongoConnector`]: one client per entry, every named database exposed
//!   as a [`mongodb::Database`] sharing that client
//! - [`MongoMapper`]: a [`dbhub_core::Mapper`] for primary-driver entries
//! - [`MongoHubExt`]: typed `database`/`collection` lookups on a hub
//!
//! ## Example
//!
//! ```rust,ignore
//! use dbhub_core::{ConnectionHub, ConnectionSpec};
//! use dbhub_mongodb::{MongoConnector, MongoHubExt};
//!
//! let hub = ConnectionHub::builder().connector(MongoConnector::new()).build();
//! hub.init([ConnectionSpec::new("mongodb://localhost:27017/wtb").names(["wtb", "affiliate"])])
//!     .await?;
//!
//! let users = hub.collection::<bson::Document>("wtb", "users").unwrap();
//! ```

pub mod access;
pub mod config;
pub mod connector;
pub mod mapper;

pub use access::MongoHubExt;
pub use config::{MongoDriverOptions, ReadPreference};
pub use connector::MongoConnector;
pub use mapper::MongoMapper;

pub use bson::{Bson, Document, doc};
pub use mongodb::{Client, Collection, Database};
