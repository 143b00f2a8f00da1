//! Repository Module
//!
//! Data access layer for the store.

pub mod deployment;
