//! SharePoint Embedded operations over Microsoft Graph.
//!
//! This crate holds everything the MCP bridge does besides speaking MCP:
//! configuration, Azure AD credentials, the Graph client and the tool
//! operations built on it, including the recursive folder uploader.
//!
//! # Key Components
//!
//! - **Configuration**: [`Config`] loaded from `spe-mcp.toml` with an
//!   environment overlay
//! - **Credentials**: [`TokenCredential`] implementations for a static token or
//!   the client-credentials flow
//! - **Remote store**: the [`RemoteStore`] trait and its Graph implementation
//!   [`GraphClient`]
//! - **Tools**: [`ContainerTools`], one async method per tool, each returning
//!   the text shown to the agent
//!
//! # Example
//!
//! ```no_run
//! use std::{path::Path, sync::Arc};
//!
//! use spe_core::{Config, GraphClient, FolderUploader, credential_from_config};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::resolve()?;
//! let http = GraphClient::http_client(&config.graph)?;
//! let credential = credential_from_config(&config, http.clone())?;
//! let client = GraphClient::new(&config.graph, http, credential)?;
//!
//! let uploader = FolderUploader::new(Arc::new(client));
//! let report = uploader
//!     .upload_folder("b!container", Path::new("/tmp/docs"), Some("archive"))
//!     .await;
//! println!("{report}");
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credential;
pub mod graph;
pub mod model;
pub mod tools;
pub mod upload;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigError};
pub use credential::{
    AccessToken, ClientSecretCredential, StaticTokenCredential, TokenCredential,
    credential_from_config,
};
pub use graph::{GraphClient, GraphError, RemoteStore};
pub use model::{ColumnDefinition, ColumnKind, Container, DriveItem, NewColumn};
pub use tools::ContainerTools;
pub use upload::{FolderUploader, UploadError, UploadOutcome, UploadStatus, UploadTask};
