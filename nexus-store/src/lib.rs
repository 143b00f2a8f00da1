//! Nexus Store
//!
//! Persistence for finished deployments.
//!
//! - `db`: connection pool creation and schema migrations
//! - `repository`: data access for deployment records

pub mod db;
pub mod repository;

pub use repository::deployment as deployment_repository;
