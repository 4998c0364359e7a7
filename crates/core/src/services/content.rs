//! Feed posts and comments, gated by moderation.

use std::collections::{BTreeSet, HashMap};

use rolapet_common::{AppError, AppResult, IdGenerator, SharedClock};
use rolapet_db::entities::{Comment, CommentNode, MediaType, Post, PostKind, User};
use rolapet_db::repositories::{CommentRepository, PostRepository, UserRepository};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use super::moderation::{ModerationAction, ModerationService};

/// Input for creating a post.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostInput {
    #[serde(rename = "type")]
    pub kind: PostKind,
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000, message = "Content is required"))]
    pub content: String,
    #[serde(default)]
    pub media_url: Vec<String>,
    pub media_type: Option<MediaType>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Changes to a post. `None` leaves the field as is.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostUpdate {
    #[validate(length(max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 5000, message = "Content is required"))]
    pub content: Option<String>,
    pub media_url: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Feed query. Empty fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostFilter {
    #[serde(default)]
    pub kinds: Vec<PostKind>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl PostFilter {
    fn matches(&self, post: &Post) -> bool {
        if !self.kinds.is_empty() && !self.kinds.contains(&post.kind) {
            return false;
        }
        if self.user_id.as_ref().is_some_and(|id| *id != post.user_id) {
            return false;
        }
        if self.keywords.is_empty() {
            return true;
        }
        let text = post.search_text();
        self.keywords
            .iter()
            .any(|keyword| text.contains(&keyword.to_lowercase()))
    }
}

/// A stored post and whether moderation warned its author.
#[derive(Debug, Clone, Serialize)]
pub struct PostCreated {
    pub post: Post,
    pub warned: bool,
}

impl PostCreated {
    /// Caller-facing message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match (self.warned, self.post.is_approved) {
            (true, _) => "Post created with a moderation warning",
            (false, true) => "Post published",
            (false, false) => "Post submitted for review",
        }
    }
}

/// Content service.
#[derive(Clone)]
pub struct ContentService {
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    user_repo: UserRepository,
    moderation: ModerationService,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl ContentService {
    /// Create a new content service.
    #[must_use]
    pub const fn new(
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        user_repo: UserRepository,
        moderation: ModerationService,
        clock: SharedClock,
    ) -> Self {
        Self {
            post_repo,
            comment_repo,
            user_repo,
            moderation,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a post. Social posts are published at once; other kinds wait for review.
    pub async fn create_post(
        &self,
        author_id: &str,
        input: CreatePostInput,
    ) -> AppResult<PostCreated> {
        input.validate()?;
        let author = self.active_author(author_id).await?;

        let verdict = self.moderation.screen(&input.content, author_id).await?;

        let now = self.clock.now();
        let post = Post {
            id: self.id_gen.generate(),
            user_id: author.id,
            username: author.username,
            user_avatar: author.profile_image,
            kind: input.kind,
            title: input.title,
            content: input.content,
            media_url: input.media_url,
            media_type: input.media_type,
            likes: 0,
            liked_by: BTreeSet::new(),
            created_at: now,
            updated_at: now,
            is_approved: input.kind == PostKind::Social,
            is_hidden: false,
            tags: input.tags,
        };
        let post = self.post_repo.create(post).await?;

        info!(post_id = %post.id, author_id = %author_id, kind = ?post.kind, "Post created");

        Ok(PostCreated {
            post,
            warned: verdict.action == ModerationAction::Warn,
        })
    }

    /// Edit an own post. New content is moderated again.
    pub async fn update_post(
        &self,
        post_id: &str,
        user_id: &str,
        update: PostUpdate,
    ) -> AppResult<Post> {
        update.validate()?;
        let existing = self.post_repo.get_by_id(post_id).await?;
        if existing.user_id != user_id {
            return Err(AppError::Forbidden(
                "Only the author can edit this post".to_string(),
            ));
        }

        if let Some(content) = &update.content {
            if *content != existing.content {
                self.moderation.screen(content, user_id).await?;
            }
        }

        let now = self.clock.now();
        let post = self
            .post_repo
            .update(post_id, |post| {
                if let Some(title) = update.title {
                    post.title = Some(title);
                }
                if let Some(content) = update.content {
                    post.content = content;
                }
                if let Some(media_url) = update.media_url {
                    post.media_url = media_url;
                }
                if let Some(tags) = update.tags {
                    post.tags = tags;
                }
                post.updated_at = now;
                Ok(post.clone())
            })
            .await?;

        info!(post_id = %post_id, user_id = %user_id, "Post updated");
        Ok(post)
    }

    /// Approve or reject a post awaiting review.
    pub async fn review_post(&self, post_id: &str, approved: bool) -> AppResult<Post> {
        let now = self.clock.now();
        let post = self
            .post_repo
            .update(post_id, |post| {
                post.is_approved = approved;
                post.updated_at = now;
                Ok(post.clone())
            })
            .await?;

        info!(post_id = %post_id, approved, "Post reviewed");
        Ok(post)
    }

    /// Hide a post from the feed.
    pub async fn hide_post(&self, post_id: &str) -> AppResult<Post> {
        let post = self
            .post_repo
            .update(post_id, |post| {
                post.is_hidden = true;
                Ok(post.clone())
            })
            .await?;

        info!(post_id = %post_id, "Post hidden");
        Ok(post)
    }

    /// A post by ID.
    pub async fn get_post(&self, post_id: &str) -> AppResult<Post> {
        self.post_repo.get_by_id(post_id).await
    }

    /// Approved, visible posts matching `filter`, newest first.
    pub async fn get_posts(&self, filter: &PostFilter) -> AppResult<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .post_repo
            .all()
            .await?
            .into_iter()
            .filter(|p| p.is_approved && !p.is_hidden && filter.matches(p))
            .collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(posts)
    }

    /// Posts waiting for review, oldest first.
    pub async fn pending_posts(&self) -> AppResult<Vec<Post>> {
        let posts = self.post_repo.all().await?;
        Ok(posts
            .into_iter()
            .filter(|p| !p.is_approved && !p.is_hidden)
            .collect())
    }

    /// Like a post.
    pub async fn like_post(&self, post_id: &str, user_id: &str) -> AppResult<Post> {
        self.post_repo
            .update(post_id, |post| {
                if !post.liked_by.insert(user_id.to_string()) {
                    return Err(AppError::AlreadyLiked(format!("Post {post_id}")));
                }
                post.likes += 1;
                Ok(post.clone())
            })
            .await
    }

    /// Remove a like from a post.
    pub async fn unlike_post(&self, post_id: &str, user_id: &str) -> AppResult<Post> {
        self.post_repo
            .update(post_id, |post| {
                if !post.liked_by.remove(user_id) {
                    return Err(AppError::NotLiked(format!("Post {post_id}")));
                }
                post.likes = post.likes.saturating_sub(1);
                Ok(post.clone())
            })
            .await
    }

    /// Comment on a post, optionally as a reply to another comment on it.
    pub async fn create_comment(
        &self,
        post_id: &str,
        user_id: &str,
        content: &str,
        parent_id: Option<&str>,
    ) -> AppResult<Comment> {
        if content.trim().is_empty() {
            return Err(AppError::Validation("Comment cannot be empty".to_string()));
        }
        let author = self.active_author(user_id).await?;

        self.moderation.screen(content, user_id).await?;

        self.post_repo.get_by_id(post_id).await?;

        let comment = self
            .comment_repo
            .create(Comment {
                id: self.id_gen.generate(),
                post_id: post_id.to_string(),
                user_id: author.id,
                username: author.username,
                user_avatar: author.profile_image,
                content: content.to_string(),
                likes: 0,
                created_at: self.clock.now(),
                is_hidden: false,
                parent_id: parent_id.map(str::to_string),
            })
            .await?;

        info!(comment_id = %comment.id, post_id = %post_id, user_id = %user_id, "Comment created");
        Ok(comment)
    }

    /// Hide a comment and, with it, its replies.
    pub async fn hide_comment(&self, comment_id: &str) -> AppResult<Comment> {
        let comment = self
            .comment_repo
            .update(comment_id, |comment| {
                comment.is_hidden = true;
                Ok(comment.clone())
            })
            .await?;

        info!(comment_id = %comment_id, "Comment hidden");
        Ok(comment)
    }

    /// Visible comments of a post as a reply tree, oldest first at each level.
    pub async fn comment_tree(&self, post_id: &str) -> AppResult<Vec<CommentNode>> {
        let comments = self.comment_repo.find_by_post(post_id).await?;

        let mut children: HashMap<Option<&str>, Vec<&Comment>> = HashMap::new();
        for comment in comments.iter().filter(|c| !c.is_hidden) {
            children
                .entry(comment.parent_id.as_deref())
                .or_default()
                .push(comment);
        }

        Ok(build_level(&children, None))
    }

    async fn active_author(&self, user_id: &str) -> AppResult<User> {
        let user = self.user_repo.get_by_id(user_id).await?;
        if !user.is_active {
            return Err(AppError::Forbidden("Account is deactivated".to_string()));
        }
        Ok(user)
    }
}

fn build_level<'a>(
    children: &HashMap<Option<&'a str>, Vec<&'a Comment>>,
    parent: Option<&'a str>,
) -> Vec<CommentNode> {
    children
        .get(&parent)
        .map(|level| {
            level
                .iter()
                .map(|comment| CommentNode {
                    comment: (*comment).clone(),
                    replies: build_level(children, Some(comment.id.as_str())),
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::warning::WarningService;
    use chrono::{TimeZone, Utc};
    use rolapet_common::FixedClock;
    use rolapet_common::config::ModerationConfig;
    use rolapet_db::Store;
    use rolapet_db::entities::Role;
    use rolapet_db::repositories::{BannedWordRepository, WarningLogRepository};
    use std::sync::Arc;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@rolapet.com"),
            username: id.to_string(),
            name: id.to_string(),
            role: Role::User,
            is_active: true,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            vehicles: vec![],
            warnings: vec![],
            is_of_age: true,
            document_id: None,
            legal_consent: None,
            phone: None,
            address: None,
            profile_image: None,
        }
    }

    async fn setup() -> (ContentService, UserRepository) {
        let store = Store::in_memory();
        let users = UserRepository::new(&store);
        users.create(user("u1")).await.unwrap();
        users.create(user("u2")).await.unwrap();
        let banned = BannedWordRepository::new(&store);
        banned
            .init_if_absent(&["odio".to_string(), "violencia".to_string()])
            .await
            .unwrap();

        let clock: SharedClock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        let warnings = WarningService::new(
            users.clone(),
            WarningLogRepository::new(&store),
            clock.clone(),
            &ModerationConfig::default(),
        );
        let service = ContentService::new(
            PostRepository::new(&store),
            CommentRepository::new(&store),
            users.clone(),
            ModerationService::new(banned, warnings),
            clock,
        );
        (service, users)
    }

    fn social(content: &str) -> CreatePostInput {
        CreatePostInput {
            kind: PostKind::Social,
            title: None,
            content: content.to_string(),
            media_url: vec![],
            media_type: None,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_clean_social_post_is_published() {
        let (service, _) = setup().await;

        let created = service.create_post("u1", social("Nueva ruta por la 7")).await.unwrap();

        assert!(!created.warned);
        assert!(created.post.is_approved);
        assert_eq!(created.message(), "Post published");
        assert_eq!(service.get_posts(&PostFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_news_post_waits_for_review() {
        let (service, _) = setup().await;
        let input = CreatePostInput {
            kind: PostKind::News,
            ..social("Nueva ciclovía")
        };

        let created = service.create_post("u1", input).await.unwrap();
        assert!(service.get_posts(&PostFilter::default()).await.unwrap().is_empty());
        assert_eq!(service.pending_posts().await.unwrap().len(), 1);

        service.review_post(&created.post.id, true).await.unwrap();
        assert_eq!(service.get_posts(&PostFilter::default()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_single_flagged_word_warns_but_publishes() {
        let (service, users) = setup().await;

        let created = service.create_post("u1", social("Cuánto odio los huecos")).await.unwrap();

        assert!(created.warned);
        assert_eq!(created.message(), "Post created with a moderation warning");
        assert_eq!(users.get_by_id("u1").await.unwrap().warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_blocked_post_is_not_stored() {
        let (service, _) = setup().await;

        let result = service.create_post("u1", social("odio y violencia")).await;

        assert!(matches!(
            result,
            Err(AppError::AutoModerated { banned: false, .. })
        ));
        assert!(service.get_posts(&PostFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivated_author_cannot_post() {
        let (service, users) = setup().await;
        users
            .update("u1", |u| {
                u.is_active = false;
                Ok(())
            })
            .await
            .unwrap();

        let result = service.create_post("u1", social("hola")).await;
        assert!(matches!(result, Err(AppError::Forbidden(_))));

        let missing = service.create_post("ghost", social("hola")).await;
        assert!(matches!(missing, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_edit_is_moderated_and_owner_only() {
        let (service, _) = setup().await;
        let post = service.create_post("u1", social("hola")).await.unwrap().post;

        let not_owner = service
            .update_post(&post.id, "u2", PostUpdate {
                content: Some("otro".to_string()),
                ..PostUpdate::default()
            })
            .await;
        assert!(matches!(not_owner, Err(AppError::Forbidden(_))));

        let blocked = service
            .update_post(&post.id, "u1", PostUpdate {
                content: Some("odio y violencia".to_string()),
                ..PostUpdate::default()
            })
            .await;
        assert!(matches!(blocked, Err(AppError::AutoModerated { .. })));
        assert_eq!(service.get_post(&post.id).await.unwrap().content, "hola");

        let edited = service
            .update_post(&post.id, "u1", PostUpdate {
                content: Some("hola a todos".to_string()),
                ..PostUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(edited.content, "hola a todos");
    }

    #[tokio::test]
    async fn test_keyword_filter() {
        let (service, _) = setup().await;
        service.create_post("u1", social("Batería nueva")).await.unwrap();
        service.create_post("u2", social("Ruta al norte")).await.unwrap();

        let filter = PostFilter {
            keywords: vec!["BATERÍA".to_string()],
            ..PostFilter::default()
        };
        let found = service.get_posts(&filter).await.unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].user_id, "u1");
    }

    #[tokio::test]
    async fn test_post_like_guards() {
        let (service, _) = setup().await;
        let post = service.create_post("u1", social("hola")).await.unwrap().post;

        assert_eq!(service.like_post(&post.id, "u2").await.unwrap().likes, 1);
        assert!(matches!(
            service.like_post(&post.id, "u2").await,
            Err(AppError::AlreadyLiked(_))
        ));
        assert_eq!(service.unlike_post(&post.id, "u2").await.unwrap().likes, 0);
        assert!(matches!(
            service.unlike_post(&post.id, "u2").await,
            Err(AppError::NotLiked(_))
        ));
    }

    #[tokio::test]
    async fn test_comment_tree_skips_hidden_subtrees() {
        let (service, _) = setup().await;
        let post = service.create_post("u1", social("hola")).await.unwrap().post;

        let root = service.create_comment(&post.id, "u2", "primero", None).await.unwrap();
        let reply = service
            .create_comment(&post.id, "u1", "respuesta", Some(&root.id))
            .await
            .unwrap();
        service
            .create_comment(&post.id, "u2", "sub respuesta", Some(&reply.id))
            .await
            .unwrap();
        let other = service.create_comment(&post.id, "u2", "segundo", None).await.unwrap();
        service
            .create_comment(&post.id, "u1", "oculta", Some(&other.id))
            .await
            .unwrap();

        service.hide_comment(&other.id).await.unwrap();
        let tree = service.comment_tree(&post.id).await.unwrap();

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].comment.id, root.id);
        assert_eq!(tree[0].replies.len(), 1);
        assert_eq!(tree[0].replies[0].replies.len(), 1);
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let (service, _) = setup().await;

        let result = service.create_comment("ghost", "u1", "hola", None).await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
