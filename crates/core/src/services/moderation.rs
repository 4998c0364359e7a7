//! Content moderation against the banned word list.

use regex::Regex;
use rolapet_common::{AppError, AppResult};
use rolapet_db::repositories::BannedWordRepository;
use serde::Serialize;
use tracing::{debug, warn};

use super::warning::WarningService;

/// How serious a moderation finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// What moderation does with the content and its author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModerationAction {
    Allow,
    Warn,
    Block,
    AutoBan,
}

/// Outcome of moderating one piece of content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationResult {
    pub is_allowed: bool,
    pub flagged_words: Vec<String>,
    pub severity: Severity,
    pub action: ModerationAction,
}

impl ModerationResult {
    /// Classify by the number of distinct flagged words.
    #[must_use]
    pub fn classify(flagged_words: Vec<String>) -> Self {
        let (severity, action) = match flagged_words.len() {
            0 => (Severity::Low, ModerationAction::Allow),
            1 => (Severity::Low, ModerationAction::Warn),
            2..=3 => (Severity::Medium, ModerationAction::Block),
            _ => (Severity::High, ModerationAction::AutoBan),
        };

        Self {
            is_allowed: !matches!(action, ModerationAction::Block | ModerationAction::AutoBan),
            flagged_words,
            severity,
            action,
        }
    }

    /// The error content creation should fail with, if the content was rejected.
    #[must_use]
    pub fn rejection(&self) -> Option<AppError> {
        if self.is_allowed {
            return None;
        }
        Some(AppError::AutoModerated {
            banned: self.action == ModerationAction::AutoBan,
            flagged: self.flagged_words.clone(),
        })
    }
}

/// Whole-word, case-insensitive matcher over a banned word list.
#[derive(Debug, Clone)]
pub struct BannedWordMatcher {
    patterns: Vec<(String, Regex)>,
}

impl BannedWordMatcher {
    /// Compile a matcher for `words`.
    pub fn new(words: &[String]) -> AppResult<Self> {
        let patterns = words
            .iter()
            .map(|word| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(word));
                Regex::new(&pattern)
                    .map(|regex| (word.clone(), regex))
                    .map_err(|e| {
                        AppError::Internal(format!("Failed to build banned word pattern: {e}"))
                    })
            })
            .collect::<AppResult<Vec<_>>>()?;

        Ok(Self { patterns })
    }

    /// Banned words found in `content`, each listed once, in list order.
    #[must_use]
    pub fn flagged(&self, content: &str) -> Vec<String> {
        let mut flagged: Vec<String> = Vec::new();
        for (word, regex) in &self.patterns {
            if regex.is_match(content) && !flagged.contains(word) {
                flagged.push(word.clone());
            }
        }
        flagged
    }
}

/// Service that screens content and applies warnings or bans to its author.
#[derive(Clone)]
pub struct ModerationService {
    banned_word_repo: BannedWordRepository,
    warning_service: WarningService,
}

impl ModerationService {
    /// Create a new moderation service.
    #[must_use]
    pub const fn new(
        banned_word_repo: BannedWordRepository,
        warning_service: WarningService,
    ) -> Self {
        Self {
            banned_word_repo,
            warning_service,
        }
    }

    /// Moderate `content` written by `user_id`.
    ///
    /// Warnings and bans are applied before returning. An unknown author
    /// does not fail moderation; the side effect is skipped.
    pub async fn moderate(&self, content: &str, user_id: &str) -> AppResult<ModerationResult> {
        let words = self.banned_word_repo.all().await?;
        let matcher = BannedWordMatcher::new(&words)?;
        let result = ModerationResult::classify(matcher.flagged(content));

        let listed = result.flagged_words.join(", ");
        let applied = match result.action {
            ModerationAction::Allow => Ok(()),
            ModerationAction::Warn | ModerationAction::Block => self
                .warning_service
                .add_automated_warning(
                    user_id,
                    &format!("Contenido inapropiado detectado. Palabras: {listed}"),
                )
                .await
                .map(|_| ()),
            ModerationAction::AutoBan => self
                .warning_service
                .auto_ban(
                    user_id,
                    &format!("Uso de múltiples palabras prohibidas: {listed}"),
                )
                .await
                .map(|_| ()),
        };

        match applied {
            Ok(()) => {}
            Err(AppError::UserNotFound(_)) => {
                warn!(
                    user_id = %user_id,
                    action = ?result.action,
                    "Moderation author not found; sanction skipped"
                );
            }
            Err(e) => return Err(e),
        }

        if result.action == ModerationAction::Allow {
            debug!(user_id = %user_id, "Content allowed");
        } else {
            warn!(
                user_id = %user_id,
                action = ?result.action,
                flagged = %listed,
                "Content flagged by moderation"
            );
        }

        Ok(result)
    }

    /// Moderate and fail with `AutoModerated` when the content is rejected.
    pub async fn screen(&self, content: &str, user_id: &str) -> AppResult<ModerationResult> {
        let result = self.moderate(content, user_id).await?;
        match result.rejection() {
            Some(err) => Err(err),
            None => Ok(result),
        }
    }

    /// Add a banned word.
    pub async fn add_banned_word(&self, word: &str) -> AppResult<String> {
        let word = word.trim();
        if word.is_empty() {
            return Err(AppError::Validation("Banned word cannot be empty".to_string()));
        }
        self.banned_word_repo.add(word).await
    }

    /// Remove a banned word.
    pub async fn remove_banned_word(&self, word: &str) -> AppResult<()> {
        self.banned_word_repo.remove(word.trim()).await
    }

    /// The banned word list.
    pub async fn banned_words(&self) -> AppResult<Vec<String>> {
        self.banned_word_repo.all().await
    }
}
