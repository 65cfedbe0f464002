//! Back-office accounts: the bootstrap admin, managers, and login.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::auth::{TokenIssuer, hash_password, verify_password};
use crate::error::{Error, Result};
use crate::store::SqliteStore;
use crate::types::{Caller, Role, Token, User};
use crate::validation::{validate_email, validate_password};

const TOKEN_ISSUE_ATTEMPTS: usize = 3;
const INVALID_CREDENTIALS: &str = "Invalid email or password";

/// A freshly issued bearer token.
#[derive(Debug, Serialize)]
pub struct Session {
    pub token: String,
    pub token_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub user: User,
}

fn create_account(
    store: &SqliteStore,
    email: &str,
    password: &str,
    nickname: Option<&str>,
    role: Role,
) -> Result<User> {
    validate_email(email)?;
    validate_password(password)?;
    let hash = hash_password(password)?;
    store.create_user(email, &hash, nickname, role)
}

/// Creates the first admin. Returns `None` when an admin already exists.
pub fn bootstrap_admin(
    store: &SqliteStore,
    email: &str,
    password: &str,
    nickname: Option<&str>,
) -> Result<Option<User>> {
    if store.has_admin()? {
        return Ok(None);
    }

    let admin = create_account(store, email, password, nickname, Role::Admin)?;
    tracing::info!("Bootstrapped admin account {}", admin.email);
    Ok(Some(admin))
}

pub fn create_manager(
    store: &SqliteStore,
    caller: &Caller,
    email: &str,
    password: &str,
    nickname: Option<&str>,
) -> Result<User> {
    if !caller.is_admin() {
        return Err(Error::Forbidden("Only admins can create managers".to_string()));
    }

    let manager = create_account(store, email, password, nickname, Role::Manager)?;
    tracing::info!("Created manager {} by user {}", manager.id, caller.id);
    Ok(manager)
}

/// Active managers only.
pub fn list_managers(store: &SqliteStore) -> Result<Vec<User>> {
    store.list_active_users(Role::Manager)
}

/// Marks a manager inactive and revokes their tokens. Accounts are never deleted.
pub fn deactivate_manager(store: &SqliteStore, caller: &Caller, id: i64) -> Result<User> {
    if !caller.is_admin() {
        return Err(Error::Forbidden(
            "Only admins can deactivate managers".to_string(),
        ));
    }

    let user = store
        .get_user(id)?
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
    if user.role != Role::Manager {
        return Err(Error::Validation(format!("User {id} is not a manager")));
    }

    store.set_user_active(id, false)?;
    let revoked = store.delete_user_tokens(id)?;
    tracing::info!(
        "Deactivated manager {} by user {} ({} token(s) revoked)",
        id,
        caller.id,
        revoked
    );

    Ok(User {
        is_active: false,
        ..user
    })
}

/// Stores a new token for `user_id`, retrying on the rare lookup collision.
pub fn issue_token(
    store: &SqliteStore,
    user_id: i64,
    ttl: Option<Duration>,
) -> Result<(Token, String)> {
    let issuer = TokenIssuer::new()?;
    for _ in 0..TOKEN_ISSUE_ATTEMPTS {
        let (token, raw_token) = issuer.issue(user_id, ttl)?;
        match store.create_token(&token) {
            Ok(()) => return Ok((token, raw_token)),
            Err(Error::TokenLookupCollision) => {
                tracing::warn!("Token lookup collision, regenerating");
            }
            Err(e) => return Err(e),
        }
    }
    Err(Error::TokenLookupCollision)
}

pub fn login(store: &SqliteStore, email: &str, password: &str, ttl: Duration) -> Result<Session> {
    let user = store
        .get_user_by_email(email)?
        .ok_or_else(|| Error::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !verify_password(password, &user.password_hash)? {
        return Err(Error::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }
    if !user.is_active {
        return Err(Error::Unauthorized("Account is deactivated".to_string()));
    }

    let (token, raw_token) = issue_token(store, user.id, Some(ttl))?;
    tracing::info!("User {} logged in", user.id);

    Ok(Session {
        token: raw_token,
        token_type: "bearer",
        expires_at: token.expires_at,
        user,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store() -> (TempDir, SqliteStore) {
        let temp = TempDir::new().unwrap();
        let store = SqliteStore::new(temp.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        (temp, store)
    }

    fn admin(store: &SqliteStore) -> User {
        bootstrap_admin(store, "root@label.test", "root-password", Some("root"))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_bootstrap_runs_once() {
        let (_temp, store) = test_store();
        let first = admin(&store);
        assert_eq!(first.role, Role::Admin);

        let second = bootstrap_admin(&store, "other@label.test", "other-password", None).unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn test_manager_lifecycle() {
        let (_temp, store) = test_store();
        let root = admin(&store).caller();

        let manager =
            create_manager(&store, &root, "ops@label.test", "ops-password", None).unwrap();
        assert_eq!(list_managers(&store).unwrap().len(), 1);

        let err = create_manager(&store, &root, "ops@label.test", "ops-password", None)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));

        let err = create_manager(&store, &manager.caller(), "x@label.test", "x-password", None)
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        let deactivated = deactivate_manager(&store, &root, manager.id).unwrap();
        assert!(!deactivated.is_active);
        assert!(list_managers(&store).unwrap().is_empty());
    }

    #[test]
    fn test_deactivate_rejects_non_managers() {
        let (_temp, store) = test_store();
        let root = admin(&store);

        let err = deactivate_manager(&store, &root.caller(), root.id).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let err = deactivate_manager(&store, &root.caller(), 999).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_login() {
        let (_temp, store) = test_store();
        let root = admin(&store).caller();
        let manager =
            create_manager(&store, &root, "ops@label.test", "ops-password", None).unwrap();

        let session = login(&store, "ops@label.test", "ops-password", Duration::minutes(30)).unwrap();
        assert!(session.token.starts_with("rdesk_"));
        assert_eq!(session.user.id, manager.id);
        assert!(session.expires_at.is_some());

        let err = login(&store, "ops@label.test", "wrong-password", Duration::minutes(30)).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));

        let err = login(&store, "ghost@label.test", "ops-password", Duration::minutes(30)).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(_)));

        deactivate_manager(&store, &root, manager.id).unwrap();
        let err = login(&store, "ops@label.test", "ops-password", Duration::minutes(30)).unwrap_err();
        assert!(matches!(err, Error::Unauthorized(msg) if msg.contains("deactivated")));
    }
}
