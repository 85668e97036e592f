//! In-memory [`RemoteStore`] that records calls, for unit tests.

use std::{collections::HashMap, sync::Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::{
    graph::{GraphError, RemoteStore},
    model::{ColumnDefinition, Container, DriveItem, NewColumn},
};

/// How a scripted write should answer.
#[derive(Debug, Clone)]
pub(crate) enum WriteBehavior {
    Fail,
    Raise(String),
}

/// A recorded `write_content` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RecordedWrite {
    pub container_id: String,
    pub remote_path: String,
    pub content: Vec<u8>,
}

#[derive(Default)]
pub(crate) struct RecordingStore {
    pub containers: Vec<Container>,
    pub container: Option<Container>,
    pub children: Option<Vec<DriveItem>>,
    pub created_container: Option<Container>,
    pub created_column: Option<ColumnDefinition>,
    /// When set, every non-write call raises this message.
    pub raise: Option<String>,
    /// Scripted write answers keyed by remote path; unlisted paths succeed.
    pub writes: HashMap<String, WriteBehavior>,
    pub write_log: Mutex<Vec<RecordedWrite>>,
    pub call_log: Mutex<Vec<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raising(message: &str) -> Self {
        Self {
            raise: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn with_write(mut self, remote_path: &str, behavior: WriteBehavior) -> Self {
        self.writes.insert(remote_path.to_string(), behavior);
        self
    }

    pub fn recorded_writes(&self) -> Vec<RecordedWrite> {
        self.write_log.lock().unwrap().clone()
    }

    pub fn written_paths(&self) -> Vec<String> {
        self.recorded_writes()
            .into_iter()
            .map(|write| write.remote_path)
            .collect()
    }

    /// Every call made, as `"<operation> <args>"`.
    pub fn calls(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), GraphError> {
        self.call_log.lock().unwrap().push(call);
        match &self.raise {
            Some(message) => Err(raised(message)),
            None => Ok(()),
        }
    }
}

fn raised(message: &str) -> GraphError {
    GraphError::Status {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: None,
        message: message.to_string(),
    }
}

#[async_trait]
impl RemoteStore for RecordingStore {
    async fn list_containers(
        &self,
        container_type_id: &str,
    ) -> Result<Vec<Container>, GraphError> {
        self.record(format!("list_containers {container_type_id}"))?;
        Ok(self.containers.clone())
    }

    async fn get_container(&self, container_id: &str) -> Result<Option<Container>, GraphError> {
        self.record(format!("get_container {container_id}"))?;
        Ok(self.container.clone())
    }

    async fn list_children(
        &self,
        container_id: &str,
        folder_path: Option<&str>,
    ) -> Result<Option<Vec<DriveItem>>, GraphError> {
        self.record(format!(
            "list_children {container_id} {}",
            folder_path.unwrap_or("<root>")
        ))?;
        Ok(self.children.clone())
    }

    async fn write_content(
        &self,
        container_id: &str,
        remote_path: &str,
        content: Vec<u8>,
    ) -> Result<Option<DriveItem>, GraphError> {
        self.call_log
            .lock()
            .unwrap()
            .push(format!("write_content {container_id} {remote_path}"));
        self.write_log.lock().unwrap().push(RecordedWrite {
            container_id: container_id.to_string(),
            remote_path: remote_path.to_string(),
            content,
        });

        match self.writes.get(remote_path) {
            Some(WriteBehavior::Fail) => Ok(None),
            Some(WriteBehavior::Raise(message)) => Err(raised(message)),
            None => Ok(Some(DriveItem {
                id: format!("item{remote_path}"),
                ..DriveItem::default()
            })),
        }
    }

    async fn create_container(
        &self,
        container_type_id: &str,
        display_name: &str,
        _description: Option<&str>,
    ) -> Result<Option<Container>, GraphError> {
        self.record(format!("create_container {container_type_id} {display_name}"))?;
        Ok(self.created_container.clone())
    }

    async fn add_column(
        &self,
        container_id: &str,
        column: &NewColumn,
    ) -> Result<Option<ColumnDefinition>, GraphError> {
        self.record(format!("add_column {container_id} {}", column.name))?;
        Ok(self.created_column.clone())
    }
}
