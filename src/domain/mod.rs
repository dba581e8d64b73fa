//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Rich domain types (validated, render-ready)
//! - `wire.rs`: Raw serde structs matching upstream responses
//! - `convert.rs`: Conversions from wire payloads with validation
//! - `state.rs`: State containers with update methods (for stream-driven data)
//! - `client.rs`: Sub-client with HTTP methods and caching

pub mod chart;
pub mod market;
pub mod price;
