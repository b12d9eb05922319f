//! Uniform result shape returned by every top-level operation.

use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// `{"success": true, "content": …}` or `{"success": false, "error": "…"}`.
///
/// Only the error's `Display` text crosses this boundary. Callers that need
/// the structured [`ClientError`](crate::ClientError) should use the
/// [`Harvester`](crate::Harvester) methods that return `Result` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ToolResponse<T> {
    pub fn ok(content: T) -> Self {
        Self {
            success: true,
            content: Some(content),
            error: None,
        }
    }

    pub fn err(error: impl Display) -> Self {
        Self {
            success: false,
            content: None,
            error: Some(error.to_string()),
        }
    }

    pub fn from_result<E: Display>(result: Result<T, E>) -> Self {
        match result {
            Ok(content) => Self::ok(content),
            Err(e) => Self::err(e),
        }
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl<T, E: Display> From<Result<T, E>> for ToolResponse<T> {
    fn from(result: Result<T, E>) -> Self {
        Self::from_result(result)
    }
}
