//! Warning ledger: per-user warnings, the ban threshold and account deactivation.

use rolapet_common::{AppError, AppResult, IdGenerator, SharedClock, config::ModerationConfig};
use rolapet_db::entities::warning::SYSTEM_ISSUER;
use rolapet_db::entities::{User, Warning, WarningLogEntry};
use rolapet_db::repositories::{UserRepository, WarningLogRepository};
use serde::Serialize;
use tracing::{info, warn};

/// Reason recorded on warnings raised by automated moderation.
pub const REASON_AUTOMATED: &str = "Moderación automática";
/// Reason recorded on the final warning of an automatic ban.
pub const REASON_AUTO_BAN: &str = "Baneo automático";
/// Reason recorded when an admin deactivates an account.
pub const REASON_DEACTIVATED: &str = "Cuenta desactivada";

/// Result of recording a warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum WarningOutcome {
    /// The warning was stored and the account is still in good standing.
    Recorded { warning: Warning },
    /// The warning pushed the account to the threshold and it was deactivated.
    Banned {
        warning: Warning,
        warning_count: usize,
    },
}

impl WarningOutcome {
    /// The stored warning.
    #[must_use]
    pub const fn warning(&self) -> &Warning {
        match self {
            Self::Recorded { warning } | Self::Banned { warning, .. } => warning,
        }
    }

    /// Whether the account was deactivated.
    #[must_use]
    pub const fn is_ban(&self) -> bool {
        matches!(self, Self::Banned { .. })
    }

    /// Caller-facing message.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Recorded { .. } => "Warning recorded".to_string(),
            Self::Banned { warning_count, .. } => {
                format!("User banned automatically after accumulating {warning_count} warnings")
            }
        }
    }
}

/// Service for issuing warnings and changing account standing.
#[derive(Clone)]
pub struct WarningService {
    user_repo: UserRepository,
    log_repo: WarningLogRepository,
    clock: SharedClock,
    id_gen: IdGenerator,
    max_warnings: usize,
    automated_count_toward_ban: bool,
}

impl WarningService {
    /// Create a new warning service.
    #[must_use]
    pub const fn new(
        user_repo: UserRepository,
        log_repo: WarningLogRepository,
        clock: SharedClock,
        config: &ModerationConfig,
    ) -> Self {
        Self {
            user_repo,
            log_repo,
            clock,
            id_gen: IdGenerator::new(),
            max_warnings: config.max_warnings_before_ban,
            automated_count_toward_ban: config.automated_warnings_count_toward_ban,
        }
    }

    /// Issue a warning. Deactivates a non-admin account that reaches the threshold.
    pub async fn add_warning(
        &self,
        user_id: &str,
        reason: &str,
        description: &str,
        issued_by: &str,
    ) -> AppResult<WarningOutcome> {
        self.record(user_id, reason, description, issued_by, true)
            .await
    }

    /// Issue a warning on behalf of automated moderation.
    pub async fn add_automated_warning(
        &self,
        user_id: &str,
        description: &str,
    ) -> AppResult<WarningOutcome> {
        self.record(
            user_id,
            REASON_AUTOMATED,
            description,
            SYSTEM_ISSUER,
            self.automated_count_toward_ban,
        )
        .await
    }

    /// Deactivate an account immediately, regardless of its warning count.
    pub async fn auto_ban(&self, user_id: &str, reason: &str) -> AppResult<Warning> {
        let warning = self.new_warning(REASON_AUTO_BAN, reason, SYSTEM_ISSUER);

        let username = self
            .user_repo
            .update(user_id, |user| {
                user.is_active = false;
                user.warnings.push(warning.clone());
                Ok(user.username.clone())
            })
            .await?;

        self.append_log(&warning, user_id, username).await?;
        warn!(user_id = %user_id, reason = %reason, "User banned automatically");

        Ok(warning)
    }

    /// Warnings of a user in issue order. Empty when the user does not exist.
    pub async fn get_warnings(&self, user_id: &str) -> AppResult<Vec<Warning>> {
        Ok(self
            .user_repo
            .find_by_id(user_id)
            .await?
            .map(|user| user.warnings)
            .unwrap_or_default())
    }

    /// The global warning log, oldest first.
    pub async fn all_warnings(&self) -> AppResult<Vec<WarningLogEntry>> {
        self.log_repo.all().await
    }

    /// Deactivate a non-admin account and record why.
    pub async fn deactivate_user(
        &self,
        user_id: &str,
        admin_id: &str,
        reason: &str,
    ) -> AppResult<Warning> {
        let warning = self.new_warning(REASON_DEACTIVATED, reason, admin_id);

        let username = self
            .user_repo
            .update(user_id, |user| {
                if user.is_admin() {
                    return Err(AppError::Forbidden(
                        "Admin accounts cannot be deactivated".to_string(),
                    ));
                }
                user.is_active = false;
                user.warnings.push(warning.clone());
                Ok(user.username.clone())
            })
            .await?;

        self.append_log(&warning, user_id, username).await?;
        info!(user_id = %user_id, admin_id = %admin_id, "User deactivated");

        Ok(warning)
    }

    /// Reactivate an account. Its warnings are kept.
    pub async fn reactivate_user(&self, user_id: &str, admin_id: &str) -> AppResult<User> {
        let user = self
            .user_repo
            .update(user_id, |user| {
                user.is_active = true;
                Ok(user.clone())
            })
            .await?;

        info!(user_id = %user_id, admin_id = %admin_id, "User reactivated");
        Ok(user)
    }

    async fn record(
        &self,
        user_id: &str,
        reason: &str,
        description: &str,
        issued_by: &str,
        apply_threshold: bool,
    ) -> AppResult<WarningOutcome> {
        let warning = self.new_warning(reason, description, issued_by);
        let max_warnings = self.max_warnings;

        let (username, outcome) = self
            .user_repo
            .update(user_id, |user| {
                user.warnings.push(warning.clone());
                let count = user.warnings.len();

                let outcome = if apply_threshold && count >= max_warnings {
                    user.is_active = false;
                    WarningOutcome::Banned {
                        warning: warning.clone(),
                        warning_count: count,
                    }
                } else {
                    WarningOutcome::Recorded {
                        warning: warning.clone(),
                    }
                };
                Ok((user.username.clone(), outcome))
            })
            .await?;

        self.append_log(&warning, user_id, username).await?;

        if outcome.is_ban() {
            warn!(
                user_id = %user_id,
                reason = %reason,
                "User banned after reaching warning threshold"
            );
        } else {
            info!(user_id = %user_id, reason = %reason, issued_by = %issued_by, "Warning recorded");
        }

        Ok(outcome)
    }

    fn new_warning(&self, reason: &str, description: &str, issued_by: &str) -> Warning {
        Warning {
            id: self.id_gen.generate(),
            reason: reason.to_string(),
            description: description.to_string(),
            date: self.clock.now(),
            issued_by: issued_by.to_string(),
        }
    }

    async fn append_log(
        &self,
        warning: &Warning,
        user_id: &str,
        username: String,
    ) -> AppResult<()> {
        self.log_repo
            .append(WarningLogEntry {
                warning: warning.clone(),
                user_id: user_id.to_string(),
                username,
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rolapet_common::FixedClock;
    use rolapet_db::Store;
    use rolapet_db::entities::Role;
    use std::sync::Arc;

    fn user(id: &str, role: Role) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@rolapet.com"),
            username: id.to_string(),
            name: id.to_string(),
            role,
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

    async fn setup(config: &ModerationConfig) -> (WarningService, UserRepository) {
        let store = Store::in_memory();
        let users = UserRepository::new(&store);
        users.create(user("u1", Role::User)).await.unwrap();
        users.create(user("admin", Role::Admin)).await.unwrap();
        let clock = Arc::new(FixedClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        ));
        let service = WarningService::new(
            users.clone(),
            WarningLogRepository::new(&store),
            clock,
            config,
        );
        (service, users)
    }

    #[tokio::test]
    async fn test_two_warnings_keep_account_active() {
        let (service, users) = setup(&ModerationConfig::default()).await;

        for _ in 0..2 {
            let outcome = service.add_warning("u1", "Spam", "desc", "admin").await.unwrap();
            assert!(!outcome.is_ban());
        }

        assert!(users.get_by_id("u1").await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_third_warning_bans() {
        let (service, users) = setup(&ModerationConfig::default()).await;

        service.add_warning("u1", "Spam", "1", "admin").await.unwrap();
        service.add_warning("u1", "Spam", "2", "admin").await.unwrap();
        let outcome = service.add_warning("u1", "Spam", "3", "admin").await.unwrap();

        assert!(outcome.is_ban());
        assert_eq!(
            outcome.message(),
            "User banned automatically after accumulating 3 warnings"
        );
        let stored = users.get_by_id("u1").await.unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.warnings.len(), 3);
        assert_eq!(service.all_warnings().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_threshold_applies_to_admins() {
        let (service, users) = setup(&ModerationConfig::default()).await;

        service.add_warning("admin", "Spam", "d", "u1").await.unwrap();
        service.add_warning("admin", "Spam", "d", "u1").await.unwrap();
        let outcome = service.add_warning("admin", "Spam", "d", "u1").await.unwrap();

        assert!(outcome.is_ban());
        let admin = users.get_by_id("admin").await.unwrap();
        assert!(!admin.is_active);
        assert_eq!(admin.warnings.len(), 3);
        assert!(matches!(
            service.deactivate_user("admin", "u1", "d").await,
            Err(AppError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn test_add_warning_unknown_user() {
        let (service, _) = setup(&ModerationConfig::default()).await;

        let result = service.add_warning("ghost", "Spam", "d", "admin").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
        assert!(service.all_warnings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_automated_warnings_can_be_excluded_from_threshold() {
        let config = ModerationConfig {
            automated_warnings_count_toward_ban: false,
            ..ModerationConfig::default()
        };
        let (service, users) = setup(&config).await;

        for _ in 0..4 {
            service.add_automated_warning("u1", "odio").await.unwrap();
        }

        let stored = users.get_by_id("u1").await.unwrap();
        assert!(stored.is_active);
        assert_eq!(stored.warnings[0].reason, REASON_AUTOMATED);
        assert_eq!(stored.warnings[0].issued_by, SYSTEM_ISSUER);
    }

    #[tokio::test]
    async fn test_auto_ban_bypasses_threshold() {
        let (service, users) = setup(&ModerationConfig::default()).await;

        let warning = service.auto_ban("u1", "too many words").await.unwrap();

        assert_eq!(warning.reason, REASON_AUTO_BAN);
        let stored = users.get_by_id("u1").await.unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_get_warnings_missing_user_is_empty() {
        let (service, _) = setup(&ModerationConfig::default()).await;

        assert!(service.get_warnings("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deactivate_and_reactivate() {
        let (service, users) = setup(&ModerationConfig::default()).await;

        let forbidden = service.deactivate_user("admin", "u1", "no").await;
        assert!(matches!(forbidden, Err(AppError::Forbidden(_))));

        let warning = service.deactivate_user("u1", "admin", "abuse").await.unwrap();
        assert_eq!(warning.reason, REASON_DEACTIVATED);
        assert_eq!(warning.issued_by, "admin");
        assert!(!users.get_by_id("u1").await.unwrap().is_active);

        let user = service.reactivate_user("u1", "admin").await.unwrap();
        assert!(user.is_active);
        assert_eq!(user.warnings.len(), 1);
    }
}
