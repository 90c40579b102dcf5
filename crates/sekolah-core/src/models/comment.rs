use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An anonymous visitor comment on an agenda or informasi item.
///
/// `id` and `created_at` are assigned by the store; `updated_at` is set
/// on the first edit and carried along afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub user_name: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}
