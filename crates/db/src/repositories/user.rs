//! User repository.

use rolapet_common::{AppError, AppResult};

use crate::collections;
use crate::entities::User;
use crate::store::{Store, Table};

/// User repository.
#[derive(Clone)]
pub struct UserRepository {
    table: Table<User>,
}

impl UserRepository {
    /// Create a new user repository.
    #[must_use]
    pub fn new(store: &Store) -> Self {
        Self {
            table: store.table(collections::USERS),
        }
    }

    /// Find a user by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<User>> {
        self.table.find(id).await
    }

    /// Find a user by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<User> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Find a user by exact email.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .table
            .all()
            .await?
            .into_iter()
            .find(|u| u.email == email))
    }

    /// Find a user by exact username.
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .table
            .all()
            .await?
            .into_iter()
            .find(|u| u.username == username))
    }

    /// All users in registration order.
    pub async fn all(&self) -> AppResult<Vec<User>> {
        self.table.all().await
    }

    /// Insert a user. Email and username must both be unused.
    pub async fn create(&self, user: User) -> AppResult<User> {
        self.table
            .mutate(move |rows| {
                if rows.find(|u| u.email == user.email).is_some() {
                    return Err(AppError::Duplicate(format!("email {}", user.email)));
                }
                if rows.find(|u| u.username == user.username).is_some() {
                    return Err(AppError::Duplicate(format!("username {}", user.username)));
                }
                rows.push(user.clone())?;
                Ok(user)
            })
            .await
    }

    /// Apply `f` to a user, failing with `UserNotFound` if absent.
    pub async fn update<R, F>(&self, id: &str, f: F) -> AppResult<R>
    where
        F: FnOnce(&mut User) -> AppResult<R>,
    {
        self.table
            .update(id, f)
            .await?
            .ok_or_else(|| AppError::UserNotFound(id.to_string()))
    }

    /// Apply a patch after checking that the patched email and username stay unique.
    pub async fn update_unique<F>(&self, id: &str, f: F) -> AppResult<User>
    where
        F: FnOnce(&mut User),
    {
        self.table
            .mutate(|rows| {
                let mut patched = rows
                    .get(id)
                    .cloned()
                    .ok_or_else(|| AppError::UserNotFound(id.to_string()))?;
                f(&mut patched);

                let clash = |other: &User| {
                    other.id != id
                        && (other.email == patched.email || other.username == patched.username)
                };
                if let Some(other) = rows.find(clash) {
                    let field = if other.email == patched.email {
                        "email"
                    } else {
                        "username"
                    };
                    return Err(AppError::Duplicate(format!("{field} already in use")));
                }

                if let Some(user) = rows.get_mut(id) {
                    *user = patched.clone();
                }
                Ok(patched)
            })
            .await
    }

    /// Delete a user. Returns whether a record was removed.
    pub async fn delete(&self, id: &str) -> AppResult<bool> {
        self.table
            .mutate(|rows| Ok(rows.retain(|u| u.id != id) > 0))
            .await
    }

    /// Seed users if the collection has never been written.
    pub async fn init_if_absent(&self, users: Vec<User>) -> AppResult<bool> {
        self.table.init_if_absent(users).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::Role;
    use chrono::{TimeZone, Utc};

    fn user(id: &str, email: &str, username: &str) -> User {
        User {
            id: id.to_string(),
            email: email.to_string(),
            username: username.to_string(),
            name: "Test".to_string(),
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

    #[tokio::test]
    async fn test_create_rejects_taken_email_and_username() {
        let repo = UserRepository::new(&Store::in_memory());
        repo.create(user("u1", "a@rolapet.com", "ana")).await.unwrap();

        let same_email = repo.create(user("u2", "a@rolapet.com", "bea")).await;
        let same_username = repo.create(user("u3", "b@rolapet.com", "ana")).await;

        assert!(matches!(same_email, Err(AppError::Duplicate(_))));
        assert!(matches!(same_username, Err(AppError::Duplicate(_))));
        assert_eq!(repo.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_get_by_id_missing() {
        let repo = UserRepository::new(&Store::in_memory());

        let result = repo.get_by_id("ghost").await;

        assert!(matches!(result, Err(AppError::UserNotFound(_))));
    }

    #[tokio::test]
    async fn test_update_unique_rejects_clash() {
        let repo = UserRepository::new(&Store::in_memory());
        repo.create(user("u1", "a@rolapet.com", "ana")).await.unwrap();
        repo.create(user("u2", "b@rolapet.com", "bea")).await.unwrap();

        let result = repo
            .update_unique("u2", |u| u.username = "ana".to_string())
            .await;

        assert!(matches!(result, Err(AppError::Duplicate(_))));
        assert_eq!(repo.get_by_id("u2").await.unwrap().username, "bea");
    }

    #[tokio::test]
    async fn test_find_by_email_and_username() {
        let repo = UserRepository::new(&Store::in_memory());
        repo.create(user("u1", "a@rolapet.com", "ana")).await.unwrap();

        assert!(repo.find_by_email("a@rolapet.com").await.unwrap().is_some());
        assert!(repo.find_by_username("ana").await.unwrap().is_some());
        assert!(repo.find_by_username("ANA").await.unwrap().is_none());
    }
}
