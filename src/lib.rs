//! barnsworthburning MCP server library.
//!
//! Exposes the search API client, response schema, result formatter, and the
//! stdio MCP transport.

pub mod error;
pub mod mcp;
pub mod search;

pub use error::Error;
