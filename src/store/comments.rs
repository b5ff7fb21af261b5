use std::sync::Arc;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::error::AppError;
use crate::mentions;
use crate::models::{Comment, CreateCommentInput, User};
use crate::store::{CreateBackend, Entity, ResourceBackend, ResourceStore};
use crate::validation::require_min_len;

// ============================================================================
// Backend
// ============================================================================

impl Entity for Comment {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Comments support listing and creating only; there is no edit or delete
/// endpoint, so those verbs do not exist on this store.
pub struct CommentsBackend {
    api: Arc<ApiClient>,
}

#[async_trait]
impl ResourceBackend for CommentsBackend {
    type Item = Comment;
    /// Owning task id.
    type Scope = String;

    async fn list(&self, task_id: &String) -> Result<Vec<Comment>, AppError> {
        self.api.comments_by_task(task_id).await
    }
}

#[async_trait]
impl CreateBackend for CommentsBackend {
    type CreateInput = CreateCommentInput;

    async fn create(&self, input: &CreateCommentInput) -> Result<Comment, AppError> {
        require_min_len("comment", &input.body, 2)?;
        self.api.create_comment(input).await
    }
}

// ============================================================================
// Store
// ============================================================================

pub type CommentStore = ResourceStore<CommentsBackend>;

impl ResourceStore<CommentsBackend> {
    pub fn with_api(api: Arc<ApiClient>) -> Self {
        ResourceStore::new(CommentsBackend { api })
    }

    /// Create a comment, then fan out mention notifications to every roster
    /// member the body @-mentions. The comment is the operation's result;
    /// notification failures are logged inside the fan-out and never undo
    /// the created comment.
    pub async fn create_with_mentions(
        &self,
        input: &CreateCommentInput,
        author: &User,
        roster: &[User],
    ) -> Result<Comment, AppError> {
        let comment = self.create(input).await?;
        mentions::notify_mentions(&self.backend.api, author, roster, &comment).await;
        Ok(comment)
    }
}
