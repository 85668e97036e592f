//! Minimal [`RemoteStore`] for dispatch tests.

use std::sync::Mutex;

use async_trait::async_trait;
use spe_core::{ColumnDefinition, Container, DriveItem, GraphError, NewColumn, RemoteStore};

/// Records every call. Lookups find nothing, writes and creations succeed,
/// and `list_containers` returns `containers`.
#[derive(Default)]
pub(crate) struct StubStore {
    pub containers: Vec<Container>,
    pub call_log: Mutex<Vec<String>>,
}

impl StubStore {
    pub fn calls(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.call_log.lock().unwrap().push(call);
    }
}

#[async_trait]
impl RemoteStore for StubStore {
    async fn list_containers(
        &self,
        container_type_id: &str,
    ) -> Result<Vec<Container>, GraphError> {
        self.record(format!("list_containers {container_type_id}"));
        Ok(self.containers.clone())
    }

    async fn get_container(&self, container_id: &str) -> Result<Option<Container>, GraphError> {
        self.record(format!("get_container {container_id}"));
        Ok(None)
    }

    async fn list_children(
        &self,
        container_id: &str,
        folder_path: Option<&str>,
    ) -> Result<Option<Vec<DriveItem>>, GraphError> {
        self.record(format!(
            "list_children {container_id} {}",
            folder_path.unwrap_or("<root>")
        ));
        Ok(None)
    }

    async fn write_content(
        &self,
        container_id: &str,
        remote_path: &str,
        _content: Vec<u8>,
    ) -> Result<Option<DriveItem>, GraphError> {
        self.record(format!("write_content {container_id} {remote_path}"));
        Ok(Some(DriveItem {
            id: format!("item{remote_path}"),
            ..DriveItem::default()
        }))
    }

    async fn create_container(
        &self,
        container_type_id: &str,
        display_name: &str,
        _description: Option<&str>,
    ) -> Result<Option<Container>, GraphError> {
        self.record(format!("create_container {container_type_id} {display_name}"));
        Ok(Some(Container {
            id: "new-container".to_string(),
            display_name: Some(display_name.to_string()),
            ..Container::default()
        }))
    }

    async fn add_column(
        &self,
        container_id: &str,
        column: &NewColumn,
    ) -> Result<Option<ColumnDefinition>, GraphError> {
        self.record(format!("add_column {container_id} {}", column.name));
        Ok(None)
    }
}
