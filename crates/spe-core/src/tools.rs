//! The SharePoint Embedded tool operations.
//!
//! Each operation takes a typed input and returns the text shown to the
//! agent. Remote failures are rendered into that text rather than returned
//! as errors.

use std::{path::Path, sync::Arc};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    graph::RemoteStore,
    model::{ColumnKind, NewColumn},
    upload::FolderUploader,
};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListContainersInput {
    /// Container type ID registered for the application.
    pub container_type_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetContainerInput {
    /// ID of the container.
    pub container_id: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListContainerItemsInput {
    /// ID of the container.
    pub container_id: String,
    /// Folder path inside the container. Lists the root when omitted.
    #[serde(default)]
    pub folder_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct CreateContainerInput {
    /// Container type ID the new container belongs to.
    pub container_type_id: String,
    /// Display name of the new container.
    pub display_name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AddColumnInput {
    /// ID of the container.
    pub container_id: String,
    /// Internal column name.
    pub name: String,
    /// Column data type.
    pub column_type: ColumnKind,
    /// Display name. Defaults to `name`.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UploadFileInput {
    /// ID of the target container.
    pub container_id: String,
    /// Path of the local file to upload.
    pub local_file_path: String,
    /// Destination path inside the container. Defaults to the file name at
    /// the container root.
    #[serde(default)]
    pub dest_file_path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct UploadFolderInput {
    /// ID of the target container.
    pub container_id: String,
    /// Path of the local folder to upload recursively.
    pub local_folder_path: String,
    /// Destination folder inside the container. Defaults to the container
    /// root.
    #[serde(default)]
    pub dest_folder_path: Option<String>,
}

/// Tool operations over one shared [`RemoteStore`].
#[derive(Clone)]
pub struct ContainerTools {
    store: Arc<dyn RemoteStore>,
    uploader: FolderUploader,
}

impl ContainerTools {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            uploader: FolderUploader::new(Arc::clone(&store)),
            store,
        }
    }

    pub async fn list_containers(&self, input: &ListContainersInput) -> String {
        if let Some(message) = require(&[("container_type_id", &input.container_type_id)]) {
            return message;
        }

        match self.store.list_containers(&input.container_type_id).await {
            Ok(containers) if containers.is_empty() => "No containers found.".to_string(),
            Ok(containers) => render_json(&containers, "Error listing containers: "),
            Err(err) => {
                warn!(error = %err, "Listing containers failed");
                format!("Error listing containers: {err}")
            }
        }
    }

    pub async fn get_container(&self, input: &GetContainerInput) -> String {
        if let Some(message) = require(&[("container_id", &input.container_id)]) {
            return message;
        }

        match self.store.get_container(&input.container_id).await {
            Ok(Some(container)) => render_json(&container, "Error getting container details: "),
            Ok(None) => format!("Container with ID {} not found.", input.container_id),
            Err(err) => {
                warn!(container_id = %input.container_id, error = %err, "Getting container failed");
                format!("Error getting container details: {err}")
            }
        }
    }

    pub async fn list_container_items(&self, input: &ListContainerItemsInput) -> String {
        if let Some(message) = require(&[("container_id", &input.container_id)]) {
            return message;
        }

        let folder_path = input
            .folder_path
            .as_deref()
            .map(str::trim)
            .filter(|path| !path.is_empty());
        let error_prefix = match folder_path {
            Some(path) => format!("Error accessing folder path '{path}': "),
            None => "Error listing container items: ".to_string(),
        };

        let result = self
            .store
            .list_children(&input.container_id, folder_path)
            .await;
        match (result, folder_path) {
            (Ok(Some(items)), _) if !items.is_empty() => render_json(&items, &error_prefix),
            (Ok(None), Some(path)) => format!("Folder path '{path}' not found in the container."),
            (Ok(_), _) => "No items found in the specified location.".to_string(),
            (Err(err), _) => {
                warn!(container_id = %input.container_id, error = %err, "Listing items failed");
                format!("{error_prefix}{err}")
            }
        }
    }

    pub async fn create_container(&self, input: &CreateContainerInput) -> String {
        if let Some(message) = require(&[
            ("container_type_id", &input.container_type_id),
            ("display_name", &input.display_name),
        ]) {
            return message;
        }

        let result = self
            .store
            .create_container(
                &input.container_type_id,
                &input.display_name,
                input.description.as_deref(),
            )
            .await;
        match result {
            Ok(Some(container)) => {
                info!(container_id = %container.id, "Created container");
                render_json(&container, "Error creating container: ")
            }
            Ok(None) => "Failed to create container.".to_string(),
            Err(err) => {
                warn!(error = %err, "Creating container failed");
                format!("Error creating container: {err}")
            }
        }
    }

    pub async fn add_column(&self, input: &AddColumnInput) -> String {
        if let Some(message) = require(&[
            ("container_id", &input.container_id),
            ("name", &input.name),
        ]) {
            return message;
        }

        let column = NewColumn {
            name: input.name.clone(),
            display_name: input.display_name.clone(),
            description: input.description.clone(),
            kind: input.column_type,
        };
        match self.store.add_column(&input.container_id, &column).await {
            Ok(Some(definition)) => {
                info!(container_id = %input.container_id, column = %column.name, "Added column");
                render_json(&definition, "Error adding column: ")
            }
            Ok(None) => "Failed to add column.".to_string(),
            Err(err) => {
                warn!(container_id = %input.container_id, error = %err, "Adding column failed");
                format!("Error adding column: {err}")
            }
        }
    }

    pub async fn upload_file(&self, input: &UploadFileInput) -> String {
        if let Some(message) = require(&[
            ("container_id", &input.container_id),
            ("local_file_path", &input.local_file_path),
        ]) {
            return message;
        }

        self.uploader
            .upload_file(
                &input.container_id,
                Path::new(&input.local_file_path),
                input.dest_file_path.as_deref(),
            )
            .await
    }

    pub async fn upload_folder(&self, input: &UploadFolderInput) -> String {
        if let Some(message) = require(&[
            ("container_id", &input.container_id),
            ("local_folder_path", &input.local_folder_path),
        ]) {
            return message;
        }

        self.uploader
            .upload_folder(
                &input.container_id,
                Path::new(&input.local_folder_path),
                input.dest_folder_path.as_deref(),
            )
            .await
    }
}

/// Returns the message for the first blank field, if any.
fn require(fields: &[(&str, &String)]) -> Option<String> {
    fields
        .iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| format!("{field} must not be empty."))
}

fn render_json<T: Serialize + ?Sized>(value: &T, error_prefix: &str) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{error_prefix}{e}"))
}
