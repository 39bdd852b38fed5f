//! core
//!
//! Domain types, kind metadata, payload trees and configuration.

pub mod config;
pub mod kinds;
pub mod payload;
pub mod types;
