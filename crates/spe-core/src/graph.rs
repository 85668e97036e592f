//! Microsoft Graph access for SharePoint Embedded.
//!
//! [`RemoteStore`] is the capability set the tools and the folder uploader
//! depend on. [`GraphClient`] implements it over HTTPS with one shared
//! `reqwest` client and one shared [`TokenCredential`].
//!
//! Container operations go to the beta endpoint; drive item operations go to
//! v1.0. In SharePoint Embedded the container id is also the drive id.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode, header};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::debug;

use crate::{
    config::GraphConfig,
    credential::TokenCredential,
    model::{
        ColumnDefinition, Container, CreateContainerRequest, DriveItem, GraphCollection, NewColumn,
    },
};

/// Errors raised by Graph calls.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum GraphError {
    /// Transport failure (connect, timeout, TLS, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Graph answered with a non-success status.
    #[error(
        "Graph API request failed with status {status}{}: {message}",
        .code.as_deref().map(|code| format!(" ({code})")).unwrap_or_default()
    )]
    Status {
        status: StatusCode,
        code: Option<String>,
        message: String,
    },

    /// A bearer token could not be obtained.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The response body was not the expected JSON.
    #[error("failed to decode Graph response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A configured endpoint is not an absolute http(s) URL.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

impl GraphError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::NOT_FOUND)
    }
}

/// Remote object store operations used by the tools.
///
/// Every call is a single request/response round trip (listing a folder by
/// path is two). `Ok(None)` means the remote answered without a record.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Lists containers of the given container type.
    async fn list_containers(&self, container_type_id: &str)
    -> Result<Vec<Container>, GraphError>;

    /// Fetches one container; `None` when it does not exist.
    async fn get_container(&self, container_id: &str) -> Result<Option<Container>, GraphError>;

    /// Lists the children of the container root or of `folder_path`;
    /// `None` when the folder does not exist.
    async fn list_children(
        &self,
        container_id: &str,
        folder_path: Option<&str>,
    ) -> Result<Option<Vec<DriveItem>>, GraphError>;

    /// Creates or overwrites the file at `remote_path` with `content`.
    async fn write_content(
        &self,
        container_id: &str,
        remote_path: &str,
        content: Vec<u8>,
    ) -> Result<Option<DriveItem>, GraphError>;

    /// Creates a container of the given type.
    async fn create_container(
        &self,
        container_type_id: &str,
        display_name: &str,
        description: Option<&str>,
    ) -> Result<Option<Container>, GraphError>;

    /// Adds a metadata column to a container.
    async fn add_column(
        &self,
        container_id: &str,
        column: &NewColumn,
    ) -> Result<Option<ColumnDefinition>, GraphError>;
}

/// Graph API client for SharePoint Embedded.
#[derive(Clone)]
pub struct GraphClient {
    http: reqwest::Client,
    endpoint: String,
    beta_endpoint: String,
    credential: Arc<dyn TokenCredential>,
}

impl GraphClient {
    /// Builds the HTTP client shared by Graph calls and token acquisition.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend cannot be initialized.
    pub fn http_client(config: &GraphConfig) -> Result<reqwest::Client, GraphError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("spe-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(client)
    }

    /// Creates a client for the configured endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidEndpoint`] if either endpoint is not an
    /// absolute http(s) URL.
    pub fn new(
        config: &GraphConfig,
        http: reqwest::Client,
        credential: Arc<dyn TokenCredential>,
    ) -> Result<Self, GraphError> {
        Ok(Self {
            http,
            endpoint: normalize_base_url(&config.endpoint)?,
            beta_endpoint: normalize_base_url(&config.beta_endpoint)?,
            credential,
        })
    }

    fn containers_url(&self) -> String {
        format!("{}/storage/fileStorage/containers", self.beta_endpoint)
    }

    fn container_url(&self, container_id: &str) -> String {
        format!(
            "{}/{}",
            self.containers_url(),
            urlencoding::encode(container_id)
        )
    }

    fn drive_url(&self, container_id: &str) -> String {
        format!(
            "{}/drives/{}",
            self.endpoint,
            urlencoding::encode(container_id)
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<reqwest::Response, GraphError> {
        let token = self.credential.token().await?;
        let response = request
            .bearer_auth(token.secret())
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Graph response");
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(status_error(status, &body))
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, GraphError> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Like [`Self::get_json`] but maps 404 to `None`.
    async fn get_json_optional<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, GraphError> {
        match self.get_json(request).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    /// Sends a write and decodes the returned record; an empty body is `None`.
    async fn write_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Option<T>, GraphError> {
        let response = self.send(request).await?;
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&body)?))
    }
}

#[async_trait]
impl RemoteStore for GraphClient {
    async fn list_containers(
        &self,
        container_type_id: &str,
    ) -> Result<Vec<Container>, GraphError> {
        debug!(container_type_id, "Listing containers");
        let filter = format!("containerTypeId eq {container_type_id}");
        let request = self
            .http
            .get(self.containers_url())
            .query(&[("$filter", filter)]);
        let collection: GraphCollection<Container> = self.get_json(request).await?;
        Ok(collection.value)
    }

    async fn get_container(&self, container_id: &str) -> Result<Option<Container>, GraphError> {
        debug!(container_id, "Getting container");
        let request = self.http.get(self.container_url(container_id));
        self.get_json_optional(request).await
    }

    async fn list_children(
        &self,
        container_id: &str,
        folder_path: Option<&str>,
    ) -> Result<Option<Vec<DriveItem>>, GraphError> {
        let drive_url = self.drive_url(container_id);
        let encoded_path = folder_path.map(encode_drive_path).unwrap_or_default();

        let children_url = if encoded_path.is_empty() {
            debug!(container_id, "Listing root children");
            format!("{drive_url}/items/root/children")
        } else {
            debug!(container_id, folder_path = ?folder_path, "Resolving folder by path");
            let folder: Option<DriveItem> = self
                .get_json_optional(self.http.get(format!("{drive_url}/root:/{encoded_path}")))
                .await?;
            let Some(folder) = folder else {
                return Ok(None);
            };
            format!(
                "{drive_url}/items/{}/children",
                urlencoding::encode(&folder.id)
            )
        };

        let collection: GraphCollection<DriveItem> =
            self.get_json(self.http.get(children_url)).await?;
        Ok(Some(collection.value))
    }

    async fn write_content(
        &self,
        container_id: &str,
        remote_path: &str,
        content: Vec<u8>,
    ) -> Result<Option<DriveItem>, GraphError> {
        debug!(container_id, remote_path, bytes = content.len(), "Writing content");
        let url = format!(
            "{}/root:/{}:/content",
            self.drive_url(container_id),
            encode_drive_path(remote_path)
        );
        let request = self
            .http
            .put(url)
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(content);
        self.write_json(request).await
    }

    async fn create_container(
        &self,
        container_type_id: &str,
        display_name: &str,
        description: Option<&str>,
    ) -> Result<Option<Container>, GraphError> {
        debug!(container_type_id, display_name, "Creating container");
        let body = CreateContainerRequest {
            display_name,
            description,
            container_type_id,
        };
        let request = self.http.post(self.containers_url()).json(&body);
        self.write_json(request).await
    }

    async fn add_column(
        &self,
        container_id: &str,
        column: &NewColumn,
    ) -> Result<Option<ColumnDefinition>, GraphError> {
        debug!(container_id, column = %column.name, "Adding column");
        let url = format!("{}/columns", self.container_url(container_id));
        let request = self.http.post(url).json(&column.to_request_body());
        self.write_json(request).await
    }
}

#[derive(Debug, Deserialize)]
struct GraphErrorEnvelope {
    error: GraphErrorBody,
}

#[derive(Debug, Deserialize)]
struct GraphErrorBody {
    code: Option<String>,
    message: Option<String>,
}

/// Builds a [`GraphError::Status`], preferring the Graph error envelope over
/// the raw body.
fn status_error(status: StatusCode, body: &str) -> GraphError {
    let (code, message) = match serde_json::from_str::<GraphErrorEnvelope>(body) {
        Ok(envelope) => (
            envelope.error.code,
            envelope.error.message.unwrap_or_else(|| body.to_string()),
        ),
        Err(_) if body.trim().is_empty() => (
            None,
            status.canonical_reason().unwrap_or("unknown error").to_string(),
        ),
        Err(_) => (None, body.to_string()),
    };
    GraphError::Status {
        status,
        code,
        message,
    }
}

/// Percent-encodes each segment of a drive path and joins them with `/`.
///
/// Backslashes count as separators and empty segments are dropped, so the
/// result never starts or ends with `/`. The root path encodes to `""`.
pub fn encode_drive_path(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

fn normalize_base_url(endpoint: &str) -> Result<String, GraphError> {
    let trimmed = endpoint.trim().trim_end_matches('/');
    let url = reqwest::Url::parse(trimmed)
        .map_err(|e| GraphError::InvalidEndpoint(format!("{endpoint}: {e}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(GraphError::InvalidEndpoint(format!(
            "{endpoint}: scheme must be http or https"
        )));
    }
    Ok(trimmed.to_string())
}
