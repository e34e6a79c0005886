use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle of a generated post. Written directly by the request handlers;
/// there is no background state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Pending,
    Generating,
    Completed,
    Failed,
}

impl PostStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PostStatus::Pending => "pending",
            PostStatus::Generating => "generating",
            PostStatus::Completed => "completed",
            PostStatus::Failed => "failed",
        }
    }

    pub fn parse(value: &str) -> Option<PostStatus> {
        match value {
            "pending" => Some(PostStatus::Pending),
            "generating" => Some(PostStatus::Generating),
            "completed" => Some(PostStatus::Completed),
            "failed" => Some(PostStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostRow {
    pub id: i64,
    pub prompt: String,
    pub caption: Option<String>,
    pub image_url: Option<String>,
    pub storage_key: Option<String>,
    pub reference_image_url: Option<String>,
    pub reference_storage_key: Option<String>,
    pub model_used: Option<String>,
    pub status: String,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            PostStatus::Pending,
            PostStatus::Generating,
            PostStatus::Completed,
            PostStatus::Failed,
        ] {
            assert_eq!(PostStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PostStatus::parse("archived"), None);
    }
}
