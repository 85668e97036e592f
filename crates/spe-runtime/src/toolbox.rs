//! Tool catalogue and name-based dispatch.
//!
//! [`Toolbox`] owns the process-wide Graph client. It is built once with
//! [`Toolbox::initialize`], shared by every transport session. [`Toolbox::shutdown`] only logs; the
//! client is dropped with the last clone.

use std::sync::Arc;

use schemars::{JsonSchema, schema_for};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use spe_core::{
    Config, ConfigError, ContainerTools, GraphClient, GraphError, RemoteStore,
    credential_from_config,
    tools::{
        AddColumnInput, CreateContainerInput, GetContainerInput, ListContainerItemsInput,
        ListContainersInput, UploadFileInput, UploadFolderInput,
    },
};
use tracing::{info, instrument};

pub const LIST_CONTAINERS: &str = "list_containers";
pub const GET_CONTAINER: &str = "get_container";
pub const LIST_CONTAINER_ITEMS: &str = "list_container_items";
pub const CREATE_CONTAINER: &str = "create_container";
pub const ADD_COLUMN: &str = "add_column";
pub const UPLOAD_FILE: &str = "upload_file";
pub const UPLOAD_FOLDER: &str = "upload_folder";

/// Name, description and input schema of one tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    /// JSON Schema object for the tool arguments.
    pub input_schema: Map<String, Value>,
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ToolboxError {
    #[error("tool not found: {0}")]
    NotFound(String),

    #[error("invalid arguments for {tool}: {message}")]
    InvalidArguments { tool: String, message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// The seven SharePoint Embedded tools over one shared remote store.
#[derive(Clone)]
pub struct Toolbox {
    tools: ContainerTools,
    descriptors: Arc<[ToolDescriptor]>,
}

impl Toolbox {
    /// Builds the credential and the single Graph client from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::Config`] when credentials are missing and
    /// [`ToolboxError::Graph`] when the HTTP client or endpoints are invalid.
    pub fn initialize(config: &Config) -> Result<Self, ToolboxError> {
        let http = GraphClient::http_client(&config.graph)?;
        let credential = credential_from_config(config, http.clone())?;
        let client = GraphClient::new(&config.graph, http, credential)?;

        info!(
            endpoint = %config.graph.endpoint,
            beta_endpoint = %config.graph.beta_endpoint,
            "Initialized Graph client"
        );
        Ok(Self::new(Arc::new(client)))
    }

    /// Creates a toolbox over an existing store.
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            tools: ContainerTools::new(store),
            descriptors: tool_descriptors().into(),
        }
    }

    /// Tool descriptors in a stable order.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    /// Invokes the tool called `name` with a JSON object of arguments.
    ///
    /// Remote failures are part of the returned text, not errors.
    ///
    /// # Errors
    ///
    /// Returns [`ToolboxError::NotFound`] for an unknown tool and
    /// [`ToolboxError::InvalidArguments`] when `arguments` do not match the
    /// tool's input.
    #[instrument(skip(self, arguments))]
    pub async fn call(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> Result<String, ToolboxError> {
        let output = match name {
            LIST_CONTAINERS => self.tools.list_containers(&parse(name, arguments)?).await,
            GET_CONTAINER => self.tools.get_container(&parse(name, arguments)?).await,
            LIST_CONTAINER_ITEMS => self.tools.list_container_items(&parse(name, arguments)?).await,
            CREATE_CONTAINER => self.tools.create_container(&parse(name, arguments)?).await,
            ADD_COLUMN => self.tools.add_column(&parse(name, arguments)?).await,
            UPLOAD_FILE => self.tools.upload_file(&parse(name, arguments)?).await,
            UPLOAD_FOLDER => self.tools.upload_folder(&parse(name, arguments)?).await,
            _ => return Err(ToolboxError::NotFound(name.to_string())),
        };
        Ok(output)
    }

    /// Consumes this handle and logs the shutdown.
    ///
    /// The Graph client is shared through an `Arc`; it is dropped once the
    /// last clone (for example one held by an MCP service) goes away.
    pub fn shutdown(self) {
        info!(tools = self.descriptors.len(), "Shutting down toolbox");
    }
}

fn parse<T: DeserializeOwned>(
    tool: &str,
    arguments: Map<String, Value>,
) -> Result<T, ToolboxError> {
    serde_json::from_value(Value::Object(arguments)).map_err(|e| ToolboxError::InvalidArguments {
        tool: tool.to_string(),
        message: e.to_string(),
    })
}

fn descriptor<T: JsonSchema>(
    name: &'static str,
    title: &'static str,
    description: &'static str,
) -> ToolDescriptor {
    let input_schema = match schema_for!(T).to_value() {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    ToolDescriptor {
        name,
        title,
        description,
        input_schema,
    }
}

/// Descriptors of every tool, in the order they are listed to clients.
pub fn tool_descriptors() -> Vec<ToolDescriptor> {
    vec![
        descriptor::<ListContainersInput>(
            LIST_CONTAINERS,
            "List containers",
            "Lists SharePoint Embedded containers of a specific container type.",
        ),
        descriptor::<GetContainerInput>(
            GET_CONTAINER,
            "Get container",
            "Get details of a specific SharePoint Embedded container.",
        ),
        descriptor::<ListContainerItemsInput>(
            LIST_CONTAINER_ITEMS,
            "List container items",
            "List files and folders in a SharePoint Embedded container.",
        ),
        descriptor::<CreateContainerInput>(
            CREATE_CONTAINER,
            "Create container",
            "Create a SharePoint Embedded container of a container type.",
        ),
        descriptor::<AddColumnInput>(
            ADD_COLUMN,
            "Add column",
            "Add a custom metadata column to a SharePoint Embedded container.",
        ),
        descriptor::<UploadFileInput>(
            UPLOAD_FILE,
            "Upload file",
            "Upload a local file into a SharePoint Embedded container.",
        ),
        descriptor::<UploadFolderInput>(
            UPLOAD_FOLDER,
            "Upload folder",
            "Recursively upload a local folder into a SharePoint Embedded container, one line per file in the report.",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::StubStore;

    fn toolbox() -> (Toolbox, Arc<StubStore>) {
        let store = Arc::new(StubStore::default());
        (Toolbox::new(Arc::clone(&store) as Arc<dyn RemoteStore>), store)
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_descriptors_are_stable_and_complete() {
        let (toolbox, _) = toolbox();
        let names: Vec<_> = toolbox.descriptors().iter().map(|d| d.name).collect();
        assert_eq!(
            names,
            [
                LIST_CONTAINERS,
                GET_CONTAINER,
                LIST_CONTAINER_ITEMS,
                CREATE_CONTAINER,
                ADD_COLUMN,
                UPLOAD_FILE,
                UPLOAD_FOLDER
            ]
        );
    }

    #[test]
    fn test_descriptor_schemas_list_required_fields() {
        let (toolbox, _) = toolbox();
        let upload = toolbox
            .descriptors()
            .iter()
            .find(|d| d.name == UPLOAD_FOLDER)
            .unwrap();

        assert_eq!(upload.input_schema["type"], "object");
        let properties = upload.input_schema["properties"].as_object().unwrap();
        assert!(properties.contains_key("container_id"));
        assert!(properties.contains_key("local_folder_path"));
        assert!(properties.contains_key("dest_folder_path"));

        let required = upload.input_schema["required"].as_array().unwrap();
        assert!(required.contains(&json!("container_id")));
        assert!(required.contains(&json!("local_folder_path")));
        assert!(!required.contains(&json!("dest_folder_path")));
    }

    #[tokio::test]
    async fn test_call_dispatches_by_name() {
        let (toolbox, store) = toolbox();

        let output = toolbox
            .call(GET_CONTAINER, object(json!({ "container_id": "c-1" })))
            .await
            .unwrap();

        assert_eq!(output, "Container with ID c-1 not found.");
        assert_eq!(store.calls(), ["get_container c-1"]);
    }

    #[tokio::test]
    async fn test_shutdown_leaves_clones_usable() {
        let (toolbox, store) = toolbox();
        let session = toolbox.clone();
        let shared = Arc::strong_count(&store);

        toolbox.shutdown();
        assert!(Arc::strong_count(&store) < shared);
        let output = session
            .call(GET_CONTAINER, object(json!({ "container_id": "c-2" })))
            .await
            .unwrap();

        assert_eq!(output, "Container with ID c-2 not found.");
        assert_eq!(store.calls(), ["get_container c-2"]);
    }

    #[tokio::test]
    async fn test_call_unknown_tool_is_not_found() {
        let (toolbox, _) = toolbox();
        let err = toolbox.call("delete_everything", Map::new()).await.unwrap_err();
        assert!(matches!(err, ToolboxError::NotFound(name) if name == "delete_everything"));
    }

    #[tokio::test]
    async fn test_call_with_bad_arguments_is_invalid() {
        let (toolbox, store) = toolbox();

        let err = toolbox
            .call(ADD_COLUMN, object(json!({ "container_id": "c-1", "name": "x" })))
            .await
            .unwrap_err();

        assert!(matches!(err, ToolboxError::InvalidArguments { ref tool, .. } if tool == ADD_COLUMN));
        assert!(err.to_string().contains("column_type"));
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_call_upload_folder_returns_report() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("a.txt"), b"a").unwrap();
        std::fs::write(temp.path().join("sub/b.txt"), b"b").unwrap();
        let (toolbox, store) = toolbox();

        let report = toolbox
            .call(
                UPLOAD_FOLDER,
                object(json!({
                    "container_id": "c-1",
                    "local_folder_path": temp.path(),
                    "dest_folder_path": "archive"
                })),
            )
            .await
            .unwrap();

        assert_eq!(report, "Uploaded: archive/a.txt\nUploaded: archive/sub/b.txt");
        assert_eq!(
            store.calls(),
            [
                "write_content c-1 /archive/a.txt",
                "write_content c-1 /archive/sub/b.txt"
            ]
        );
    }

    #[test]
    fn test_initialize_without_credentials_fails() {
        let err = Toolbox::initialize(&Config::default()).err().unwrap();
        assert!(matches!(err, ToolboxError::Config(ConfigError::MissingCredentials)));
    }
}
