//! Post and comment repositories.

use rolapet_common::{AppError, AppResult};

use crate::collections;
use crate::entities::{Comment, Post};
use crate::store::{Store, Table};

/// Author ID and name given to content of a deleted account.
pub const DELETED_AUTHOR_ID: &str = "deleted";
const DELETED_AUTHOR_NAME: &str = "Usuario eliminado";

/// Post repository.
#[derive(Clone)]
pub struct PostRepository {
    table: Table<Post>,
}

impl PostRepository {
    /// Create a new post repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::POSTS),
        }
    }

    /// Find a post by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Post>> {
        self.table.find(id).await
    }

    /// Get a post by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<Post> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {id}")))
    }

    /// All posts, oldest first.
    pub async fn all(&self) -> AppResult<Vec<Post>> {
        self.table.all().await
    }

    /// Insert a post.
    pub async fn create(&self, post: Post) -> AppResult<Post> {
        self.table.insert(post).await
    }

    /// Apply `f` to a post, failing with `NotFound` if absent.
    pub async fn update<R, F>(&self, id: &str, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Post) -> AppResult<R>,
    {
        self.table
            .update(id, f)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Post {id}")))
    }

    /// Detach every post from a deleted author. Returns how many changed.
    pub async fn anonymize_author(&self, user_id: &str) -> AppResult<usize> {
        self.table
            .mutate(|rows| {
                let mut changed = 0;
                for post in rows.iter_mut().filter(|p| p.user_id == user_id) {
                    post.user_id = DELETED_AUTHOR_ID.to_string();
                    post.username = DELETED_AUTHOR_NAME.to_string();
                    post.user_avatar = None;
                    changed += 1;
                }
                Ok(changed)
            })
            .await
    }
}

/// Comment repository. Replies are stored flat with a parent ID.
#[derive(Clone)]
pub struct CommentRepository {
    table: Table<Comment>,
}

impl CommentRepository {
    /// Create a new comment repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::COMMENTS),
        }
    }

    /// Find a comment by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Comment>> {
        self.table.find(id).await
    }

    /// Comments on one post, oldest first.
    pub async fn find_by_post(&self, post_id: &str) -> AppResult<Vec<Comment>> {
        self.table.filter(|c| c.post_id == post_id).await
    }

    /// Insert a comment. A parent, if given, must be on the same post.
    pub async fn create(&self, comment: Comment) -> AppResult<Comment> {
        self.table
            .mutate(move |rows| {
                if let Some(parent_id) = &comment.parent_id {
                    let parent_ok = rows
                        .get(parent_id)
                        .is_some_and(|parent| parent.post_id == comment.post_id);
                    if !parent_ok {
                        return Err(AppError::NotFound(format!("Comment {parent_id}")));
                    }
                }
                rows.push(comment.clone())?;
                Ok(comment)
            })
            .await
    }

    /// Apply `f` to a comment, failing with `NotFound` if absent.
    pub async fn update<R, F>(&self, id: &str, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut Comment) -> AppResult<R>,
    {
        self.table
            .update(id, f)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Comment {id}")))
    }

    /// Detach every comment from a deleted author. Returns how many changed.
    pub async fn anonymize_author(&self, user_id: &str) -> AppResult<usize> {
        self.table
            .mutate(|rows| {
                let mut changed = 0;
                for comment in rows.iter_mut().filter(|c| c.user_id == user_id) {
                    comment.user_id = DELETED_AUTHOR_ID.to_string();
                    comment.username = DELETED_AUTHOR_NAME.to_string();
                    comment.user_avatar = None;
                    changed += 1;
                }
                Ok(changed)
            })
            .await
    }
}
