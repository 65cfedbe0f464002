//! # Rightsdesk
//!
//! Royalty and rights back office for a music label: a catalog of people,
//! artists, albums and tracks kept behind a draft/approval workflow, royalty
//! shares per track and rights holder, and bulk ingestion of platform usage
//! reports. Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! rightsdesk = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use rightsdesk::config::ServerConfig;
//! use rightsdesk::server::{AppState, create_router};
//! use rightsdesk::store::SqliteStore;
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `rightsdesk` binary. Disable with `default-features = false`.

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod identity;
pub mod ingest;
pub mod server;
pub mod store;
pub mod types;
pub mod validation;
