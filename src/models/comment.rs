use serde::{Deserialize, Serialize};

// ============================================================================
// Comments
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub body: String,
    pub task_id: String,
    pub user_id: String,
    pub author_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateCommentInput {
    pub body: String,
    #[serde(rename = "taskId")]
    pub task_id: String,
}
