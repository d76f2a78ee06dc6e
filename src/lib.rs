//! Reelmatch - catalog-to-provider metadata reconciliation
//!
//! This library crate exposes the resolution engine for the CLI and for
//! integration testing.

pub mod config;
pub mod metadata;
