//! Batch tag actions
//!
//! The wire shape is `{ action, value }`; `value` is a tag name for the
//! add actions and a tag id for the delete actions. Parsing the whole
//! batch happens before any mutation runs, so an unknown action name
//! rejects the batch without side effects.

use serde::{Deserialize, Serialize};

use crate::api::{ServiceError, ServiceResult};
use crate::graph::TagId;

/// One requested action as received from the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub value: String,
}

impl ActionRequest {
    pub fn new(action: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            value: value.into(),
        }
    }
}

/// A validated tag action.
#[derive(Debug, Clone, PartialEq)]
pub enum TagAction {
    /// Upsert a tag by name and link it to the target article.
    Add { name: String },
    /// Upsert a tag by name and link it to every matching article.
    AddAll { name: String },
    /// Remove the link from the target article; the tag itself is
    /// swept at end of batch if no links remain.
    Delete { tag_id: TagId },
    /// Delete the tag and all its links unconditionally.
    DeleteAll { tag_id: TagId },
}

impl TagAction {
    pub fn parse(request: &ActionRequest) -> ServiceResult<Self> {
        match request.action.as_str() {
            "add" => Ok(TagAction::Add {
                name: request.value.clone(),
            }),
            "addAll" => Ok(TagAction::AddAll {
                name: request.value.clone(),
            }),
            "delete" => Ok(TagAction::Delete {
                tag_id: TagId::from(request.value.as_str()),
            }),
            "deleteAll" => Ok(TagAction::DeleteAll {
                tag_id: TagId::from(request.value.as_str()),
            }),
            other => Err(ServiceError::InvalidAction(other.to_string())),
        }
    }

    /// Validate a whole batch, all-or-nothing.
    pub fn parse_batch(requests: &[ActionRequest]) -> ServiceResult<Vec<Self>> {
        requests.iter().map(Self::parse).collect()
    }
}
