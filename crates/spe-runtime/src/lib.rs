//! Tool dispatch and transports for the SharePoint Embedded MCP bridge.
//!
//! [`Toolbox`] maps tool names to the operations in [`spe_core`] and carries
//! their input schemas. The [`transports`] module exposes it over the Model
//! Context Protocol.

mod toolbox;
pub mod transports;

#[cfg(test)]
mod testing;

/// Tool catalogue and dispatch.
pub use toolbox::{
    ADD_COLUMN, CREATE_CONTAINER, GET_CONTAINER, LIST_CONTAINER_ITEMS, LIST_CONTAINERS,
    ToolDescriptor, Toolbox, ToolboxError, UPLOAD_FILE, UPLOAD_FOLDER, tool_descriptors,
};

/// MCP server handler.
pub use transports::mcp::McpService;
