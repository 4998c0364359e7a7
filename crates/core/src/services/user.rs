//! User accounts: registration, profile, roles and data deletion.

use chrono::Duration;
use rolapet_common::{AppError, AppResult, IdGenerator, SharedClock};
use rolapet_db::entities::{DeletionRequest, DeletionStatus, Role, User};
use rolapet_db::repositories::{
    CommentRepository, DeletionRequestRepository, PostRepository, UserRepository,
    VehicleRepository,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

/// Days between a deletion request and the scheduled erasure.
const DELETION_GRACE_DAYS: i64 = 30;

/// Input for registering a user.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserInput {
    #[validate(email(message = "A valid email is required"))]
    pub email: String,
    #[validate(length(min = 3, max = 30, message = "Username must be 3 to 30 characters"))]
    pub username: String,
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    pub is_of_age: bool,
    pub document_id: Option<String>,
    /// Reference to the guardian consent a minor must provide.
    pub legal_consent: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Profile changes. `None` leaves the field as is.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 30))]
    pub username: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profile_image: Option<String>,
    pub document_id: Option<String>,
}

/// User listing query. Empty fields do not filter.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    pub role: Option<Role>,
    pub is_active: Option<bool>,
    pub search: Option<String>,
}

impl UserFilter {
    fn matches(&self, user: &User) -> bool {
        if self.role.is_some_and(|role| user.role != role) {
            return false;
        }
        if self.is_active.is_some_and(|active| user.is_active != active) {
            return false;
        }
        self.search.as_ref().is_none_or(|term| {
            let term = term.to_lowercase();
            user.username.to_lowercase().contains(&term)
                || user.name.to_lowercase().contains(&term)
                || user.email.contains(&term)
        })
    }
}

/// Account counts for the admin dashboard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total: usize,
    pub active: usize,
    pub inactive: usize,
    pub admins: usize,
    pub providers: usize,
    pub with_warnings: usize,
}

/// User service.
#[derive(Clone)]
pub struct UserService {
    user_repo: UserRepository,
    deletion_repo: DeletionRequestRepository,
    vehicle_repo: VehicleRepository,
    post_repo: PostRepository,
    comment_repo: CommentRepository,
    clock: SharedClock,
    id_gen: IdGenerator,
}

impl UserService {
    /// Create a new user service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        deletion_repo: DeletionRequestRepository,
        vehicle_repo: VehicleRepository,
        post_repo: PostRepository,
        comment_repo: CommentRepository,
        clock: SharedClock,
    ) -> Self {
        Self {
            user_repo,
            deletion_repo,
            vehicle_repo,
            post_repo,
            comment_repo,
            clock,
            id_gen: IdGenerator::new(),
        }
    }

    /// Register a new user with the `user` role.
    pub async fn register(&self, input: RegisterUserInput) -> AppResult<User> {
        input.validate()?;
        let legal_consent = input.legal_consent.filter(|c| !c.trim().is_empty());
        if !input.is_of_age && legal_consent.is_none() {
            return Err(AppError::Validation(
                "Minors must provide a legal consent reference".to_string(),
            ));
        }

        let user = self
            .user_repo
            .create(User {
                id: self.id_gen.generate(),
                email: input.email.trim().to_lowercase(),
                username: input.username.trim().to_string(),
                name: input.name.trim().to_string(),
                role: Role::User,
                is_active: true,
                created_at: self.clock.now(),
                vehicles: vec![],
                warnings: vec![],
                is_of_age: input.is_of_age,
                document_id: input.document_id,
                legal_consent,
                phone: input.phone,
                address: input.address,
                profile_image: None,
            })
            .await?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Look up a user by ID.
    pub async fn get_user(&self, user_id: &str) -> AppResult<User> {
        self.user_repo.get_by_id(user_id).await
    }

    /// User with this email, if any.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.user_repo.find_by_email(&email.trim().to_lowercase()).await
    }

    /// User with this username, if any.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        self.user_repo.find_by_username(username.trim()).await
    }

    /// Patch a profile. Email and username must stay unique.
    pub async fn update_user(&self, user_id: &str, update: UserUpdate) -> AppResult<User> {
        update.validate()?;

        let user = self
            .user_repo
            .update_unique(user_id, |user| {
                if let Some(email) = update.email {
                    user.email = email.trim().to_lowercase();
                }
                if let Some(username) = update.username {
                    user.username = username.trim().to_string();
                }
                if let Some(name) = update.name {
                    user.name = name.trim().to_string();
                }
                if let Some(phone) = update.phone {
                    user.phone = Some(phone);
                }
                if let Some(address) = update.address {
                    user.address = Some(address);
                }
                if let Some(image) = update.profile_image {
                    user.profile_image = Some(image);
                }
                if let Some(document_id) = update.document_id {
                    user.document_id = Some(document_id);
                }
            })
            .await?;

        info!(user_id = %user_id, "User updated");
        Ok(user)
    }

    /// Give a user a role.
    pub async fn assign_role(&self, user_id: &str, role: Role) -> AppResult<User> {
        let user = self
            .user_repo
            .update(user_id, |user| {
                user.role = role;
                Ok(user.clone())
            })
            .await?;

        info!(user_id = %user_id, role = role.as_str(), "Role assigned");
        Ok(user)
    }

    /// Return a user to the plain `user` role.
    pub async fn remove_role(&self, user_id: &str) -> AppResult<User> {
        self.assign_role(user_id, Role::User).await
    }

    /// Users matching the filter.
    pub async fn list_users(&self, filter: &UserFilter) -> AppResult<Vec<User>> {
        let users = self.user_repo.all().await?;
        Ok(users.into_iter().filter(|u| filter.matches(u)).collect())
    }

    /// Counts by role and status.
    pub async fn user_stats(&self) -> AppResult<UserStats> {
        let users = self.user_repo.all().await?;
        Ok(users.iter().fold(UserStats::default(), |mut stats, user| {
            stats.total += 1;
            if user.is_active {
                stats.active += 1;
            } else {
                stats.inactive += 1;
            }
            match user.role {
                Role::Admin => stats.admins += 1,
                Role::Provider => stats.providers += 1,
                Role::User => {}
            }
            if !user.warnings.is_empty() {
                stats.with_warnings += 1;
            }
            stats
        }))
    }

    /// Ask for the account to be erased after the grace period.
    pub async fn request_data_deletion(&self, user_id: &str) -> AppResult<DeletionRequest> {
        self.user_repo.get_by_id(user_id).await?;
        let now = self.clock.now();

        let request = self
            .deletion_repo
            .create(DeletionRequest {
                id: self.id_gen.generate(),
                user_id: user_id.to_string(),
                requested_at: now,
                status: DeletionStatus::Pending,
                scheduled_deletion_date: now + Duration::days(DELETION_GRACE_DAYS),
                completed_at: None,
            })
            .await?;

        info!(
            request_id = %request.id,
            user_id = %user_id,
            scheduled = %request.scheduled_deletion_date,
            "Data deletion requested"
        );
        Ok(request)
    }

    /// Erase the account: remove the user and vehicles, anonymise posts and comments.
    pub async fn process_data_deletion(&self, request_id: &str) -> AppResult<DeletionRequest> {
        let request = self.deletion_repo.get_by_id(request_id).await?;
        if request.status == DeletionStatus::Completed {
            return Err(AppError::Validation(
                "Deletion request is already completed".to_string(),
            ));
        }
        let user_id = request.user_id.as_str();

        let vehicles = self.vehicle_repo.delete_by_user(user_id).await?;
        let posts = self.post_repo.anonymize_author(user_id).await?;
        let comments = self.comment_repo.anonymize_author(user_id).await?;
        if !self.user_repo.delete(user_id).await? {
            warn!(user_id = %user_id, "User already removed before deletion was processed");
        }

        let now = self.clock.now();
        let request = self
            .deletion_repo
            .update(request_id, |r| {
                r.status = DeletionStatus::Completed;
                r.completed_at = Some(now);
                Ok(r.clone())
            })
            .await?;

        info!(
            request_id = %request_id,
            user_id = %request.user_id,
            vehicles,
            posts,
            comments,
            "Data deletion completed"
        );
        Ok(request)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rolapet_common::FixedClock;
    use rolapet_db::Store;
    use std::sync::Arc;

    fn service() -> UserService {
        let store = Store::in_memory();
        UserService::new(
            UserRepository::new(&store),
            DeletionRequestRepository::new(&store),
            VehicleRepository::new(&store),
            PostRepository::new(&store),
            CommentRepository::new(&store),
            Arc::new(FixedClock::new(
                Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
            )),
        )
    }

    fn input(email: &str, username: &str) -> RegisterUserInput {
        RegisterUserInput {
            email: email.to_string(),
            username: username.to_string(),
            name: "Ana Gómez".to_string(),
            is_of_age: true,
            document_id: None,
            legal_consent: None,
            phone: None,
            address: None,
        }
    }

    #[tokio::test]
    async fn test_register_validates_and_rejects_duplicates() {
        let service = service();

        let bad_email = service.register(input("not-an-email", "ana")).await;
        assert!(matches!(bad_email, Err(AppError::Validation(_))));

        let user = service.register(input("Ana@RolaPet.com", "ana")).await.unwrap();
        assert_eq!(user.email, "ana@rolapet.com");
        assert_eq!(user.role, Role::User);
        assert!(user.is_active);

        let same_email = service.register(input("ana@rolapet.com", "ana2")).await;
        assert!(matches!(same_email, Err(AppError::Duplicate(_))));
        let same_username = service.register(input("otra@rolapet.com", "ana")).await;
        assert!(matches!(same_username, Err(AppError::Duplicate(_))));
    }

    #[tokio::test]
    async fn test_minor_needs_consent() {
        let service = service();
        let mut minor = input("teen@rolapet.com", "teen");
        minor.is_of_age = false;

        assert!(matches!(
            service.register(minor.clone()).await,
            Err(AppError::Validation(_))
        ));

        minor.legal_consent = Some("consent-123".to_string());
        assert!(service.register(minor).await.is_ok());
    }

    #[tokio::test]
    async fn test_update_keeps_uniqueness() {
        let service = service();
        let ana = service.register(input("ana@rolapet.com", "ana")).await.unwrap();
        service.register(input("luis@rolapet.com", "luis")).await.unwrap();

        let clash = service
            .update_user(&ana.id, UserUpdate {
                username: Some("luis".to_string()),
                ..UserUpdate::default()
            })
            .await;
        assert!(matches!(clash, Err(AppError::Duplicate(_))));

        let updated = service
            .update_user(&ana.id, UserUpdate {
                name: Some("Ana María".to_string()),
                ..UserUpdate::default()
            })
            .await
            .unwrap();
        assert_eq!(updated.name, "Ana María");
        assert_eq!(updated.username, "ana");
    }

    #[tokio::test]
    async fn test_roles_and_stats() {
        let service = service();
        let ana = service.register(input("ana@rolapet.com", "ana")).await.unwrap();
        service.register(input("luis@rolapet.com", "luis")).await.unwrap();

        service.assign_role(&ana.id, Role::Provider).await.unwrap();
        let providers = service
            .list_users(&UserFilter {
                role: Some(Role::Provider),
                ..UserFilter::default()
            })
            .await
            .unwrap();
        assert_eq!(providers.len(), 1);

        let stats = service.user_stats().await.unwrap();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.providers, 1);

        let back = service.remove_role(&ana.id).await.unwrap();
        assert_eq!(back.role, Role::User);
    }

    #[tokio::test]
    async fn test_data_deletion_flow() {
        let service = service();
        let ana = service.register(input("ana@rolapet.com", "ana")).await.unwrap();

        let request = service.request_data_deletion(&ana.id).await.unwrap();
        assert_eq!(
            request.scheduled_deletion_date,
            request.requested_at + Duration::days(30)
        );
        assert!(matches!(
            service.request_data_deletion(&ana.id).await,
            Err(AppError::Duplicate(_))
        ));

        let done = service.process_data_deletion(&request.id).await.unwrap();
        assert_eq!(done.status, DeletionStatus::Completed);
        assert!(matches!(
            service.get_user(&ana.id).await,
            Err(AppError::UserNotFound(_))
        ));
        assert!(matches!(
            service.process_data_deletion(&request.id).await,
            Err(AppError::Validation(_))
        ));
    }
}
