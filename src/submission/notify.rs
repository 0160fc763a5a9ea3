use crate::submission::{SubmissionError, SubmissionReceipt};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Default,
    Destructive,
}

/// A toast-style message for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub variant: Severity,
}

impl Notification {
    pub fn success() -> Self {
        Self {
            title: "Success".into(),
            description: "Product created successfully!".into(),
            variant: Severity::Default,
        }
    }

    pub fn for_result(result: &Result<SubmissionReceipt, SubmissionError>) -> Self {
        match result {
            Ok(_) => Self::success(),
            Err(err) => Self::from(err),
        }
    }
}

impl From<&SubmissionError> for Notification {
    fn from(err: &SubmissionError) -> Self {
        let title = match err {
            SubmissionError::Validation { .. } => "Validation Error",
            _ => "Error",
        };
        Self {
            title: title.into(),
            description: err.to_string(),
            variant: Severity::Destructive,
        }
    }
}
