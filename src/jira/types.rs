use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Fields requested whenever an issue is fetched for a handler.
pub const DEFAULT_ISSUE_FIELDS: &str = "summary,description,issuetype,status,labels,components,parent";

// ---------------------------------------------------------------------------
// Domain types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueType {
    pub name: String,
    #[serde(default)]
    pub subtask: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueStatus {
    pub name: String,
    /// Status category key: `new`, `indeterminate` or `done`.
    pub category: String,
}

/// A tracker issue as seen by the handlers. Fetched fresh, never cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    /// Rich-text document, passed through untouched.
    #[serde(default)]
    pub description: Option<JsonValue>,
    pub issue_type: IssueType,
    pub status: IssueStatus,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default)]
    pub parent: Option<String>,
}

impl Issue {
    pub fn is_subtask(&self) -> bool {
        self.issue_type.subtask
    }

    /// Parent key, if this is a subtask that actually carries one.
    pub fn subtask_parent(&self) -> Option<&str> {
        if !self.is_subtask() {
            return None;
        }
        self.parent.as_deref().filter(|key| !key.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Raw API response types (REST v3)
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
pub(crate) struct RawIssue {
    key: String,
    #[serde(default)]
    fields: RawFields,
}

#[derive(Deserialize, Default)]
struct RawFields {
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    description: Option<JsonValue>,
    #[serde(default)]
    issuetype: Option<RawIssueType>,
    #[serde(default)]
    status: Option<RawStatus>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    components: Vec<RawNamed>,
    #[serde(default)]
    parent: Option<RawParent>,
}

#[derive(Deserialize)]
struct RawIssueType {
    name: String,
    #[serde(default)]
    subtask: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawStatus {
    name: String,
    #[serde(default)]
    status_category: Option<RawStatusCategory>,
}

#[derive(Deserialize)]
struct RawStatusCategory {
    key: String,
}

#[derive(Deserialize)]
struct RawNamed {
    name: String,
}

#[derive(Deserialize)]
struct RawParent {
    #[serde(default)]
    key: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct RawTransitions {
    #[serde(default)]
    pub(crate) transitions: Vec<Transition>,
}

impl From<RawIssue> for Issue {
    fn from(raw: RawIssue) -> Self {
        let fields = raw.fields;
        let (type_name, subtask) = fields
            .issuetype
            .map_or_else(|| (String::new(), false), |t| (t.name, t.subtask));
        let status = fields.status.map_or_else(
            || IssueStatus {
                name: String::new(),
                category: String::new(),
            },
            |s| IssueStatus {
                name: s.name,
                category: s.status_category.map(|c| c.key).unwrap_or_default(),
            },
        );
        Issue {
            key: raw.key,
            summary: fields.summary.unwrap_or_default(),
            description: fields.description,
            issue_type: IssueType {
                name: type_name,
                subtask,
            },
            status,
            labels: fields.labels,
            components: fields.components.into_iter().map(|c| c.name).collect(),
            parent: fields.parent.and_then(|p| p.key),
        }
    }
}
