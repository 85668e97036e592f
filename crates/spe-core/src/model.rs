//! Microsoft Graph resource types used by the SharePoint Embedded tools.
//!
//! Every record keeps the properties it does not model explicitly in
//! `additional_properties`, so serializing a record back out reproduces what
//! Graph returned.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A SharePoint Embedded file storage container.
///
/// The container id doubles as the drive id for item operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_type_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<String>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

/// A file or folder inside a container drive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveItem {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified_date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<FolderFacet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileFacet>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderFacet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_count: Option<i64>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileFacet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

/// A custom metadata column defined on a container.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDefinition {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

/// Data type of a container column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Free-form text.
    Text,
    /// Yes/no value.
    Boolean,
    /// Numeric value.
    Number,
    /// Date and time.
    DateTime,
    /// Monetary amount.
    Currency,
    /// URL or picture link.
    HyperlinkOrPicture,
}

impl ColumnKind {
    /// Name of the Graph facet property that selects this column type.
    pub fn graph_facet(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::DateTime => "dateTime",
            Self::Currency => "currency",
            Self::HyperlinkOrPicture => "hyperlinkOrPicture",
        }
    }
}

/// Definition of a column to add to a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewColumn {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub kind: ColumnKind,
}

impl NewColumn {
    /// Builds the Graph `columnDefinition` request body.
    ///
    /// The display name falls back to the column name.
    pub fn to_request_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("name".to_string(), Value::String(self.name.clone()));
        body.insert(
            "displayName".to_string(),
            Value::String(
                self.display_name
                    .clone()
                    .unwrap_or_else(|| self.name.clone()),
            ),
        );
        if let Some(description) = &self.description {
            body.insert(
                "description".to_string(),
                Value::String(description.clone()),
            );
        }
        body.insert(
            self.kind.graph_facet().to_string(),
            Value::Object(Map::new()),
        );
        Value::Object(body)
    }
}

/// Graph request body for creating a container.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateContainerRequest<'a> {
    pub display_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    pub container_type_id: &'a str,
}

/// Graph collection envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct GraphCollection<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}
