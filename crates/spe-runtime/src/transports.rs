//! Transport layer implementations for serving the toolbox.
//!
//! Each transport adapts a shared [`Toolbox`](crate::Toolbox) to a wire
//! protocol. The toolbox is built once and cloned into every session.

/// Model Context Protocol (MCP) transport implementation.
///
/// Provides `McpService`, usable over stdio or mounted as a streamable HTTP
/// service.
pub mod mcp;
