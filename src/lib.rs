//! Morpheus CLI - a command-line client for the Morpheus cloud-management appliance
//!
//! Most resource verbs (`list`, `get`, `add`, `update`, `remove`, the batch
//! state verbs and nested sub-resource verbs) are not hand-written per
//! resource. They run through one engine driven by resource *kinds* and
//! the schemas the appliance publishes for each resource type.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, renders outcomes)
//! - [`engine`] - Resolve → Schema → Prompt → Assemble → Confirm → Dry-run gate → Transport
//! - [`core`] - Resource kinds, payload trees, type descriptors, configuration
//! - [`api`] - The transport seam, endpoint builders, HTTP and mock transports
//! - [`secrets`] - Access token storage
//! - [`ui`] - Prompts and output formatting
//!
//! # Invariants
//!
//! 1. No mutation is sent until every identifier resolved to exactly one record
//! 2. Dry-run mode never lets a mutating request reach the transport
//! 3. Declining a confirmation exits with code 9 and sends nothing

pub mod api;
pub mod cli;
pub mod core;
pub mod engine;
pub mod secrets;
pub mod ui;
