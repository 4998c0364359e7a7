//! Comment record and reply tree view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A comment on a post. Replies point at their parent by ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub user_id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_avatar: Option<String>,
    pub content: String,
    #[serde(default)]
    pub likes: u32,
    pub created_at: DateTime<Utc>,
    pub is_hidden: bool,
    #[serde(default, alias = "parentCommentId", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

/// A comment with its visible replies, rebuilt on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentNode {
    #[serde(flatten)]
    pub comment: Comment,
    pub replies: Vec<CommentNode>,
}
