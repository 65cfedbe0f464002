use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{OptionalExtension, Row, params};

use super::SqliteStore;
use super::sqlite::{format_datetime, parse_datetime};
use crate::error::{Error, Result};
use crate::types::{Role, Token, User};

const USER_COLUMNS: &str = "id, email, password_hash, nickname, role, is_active, created_at";

const TOKEN_COLUMNS: &str =
    "id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at";

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    let role = role
        .parse::<Role>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        nickname: row.get(3)?,
        role,
        is_active: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
    })
}

fn token_from_row(row: &Row<'_>) -> rusqlite::Result<Token> {
    Ok(Token {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        user_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: row
            .get::<_, Option<String>>(5)?
            .map(|s| parse_datetime(&s)),
        last_used_at: row
            .get::<_, Option<String>>(6)?
            .map(|s| parse_datetime(&s)),
    })
}

impl SqliteStore {
    // User operations

    pub fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        nickname: Option<&str>,
        role: Role,
    ) -> Result<User> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO users (email, password_hash, nickname, role, is_active, created_at)
             VALUES (?1, ?2, ?3, ?4, 1, ?5)",
            params![
                email,
                password_hash,
                nickname,
                role.as_str(),
                format_datetime(&Utc::now()),
            ],
        )
        .map_err(|e| match Error::from(e) {
            Error::Conflict(_) => Error::Conflict(format!("User with email {email} already exists")),
            other => other,
        })?;

        let id = conn.last_insert_rowid();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            user_from_row,
        )
        .map_err(Error::from)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email],
                user_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    pub fn list_active_users(&self, role: Role) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = ?1 AND is_active = 1 ORDER BY id"
        ))?;

        let rows = stmt.query_map(params![role.as_str()], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    pub fn set_user_active(&self, id: i64, is_active: bool) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE users SET is_active = ?1 WHERE id = ?2",
            params![is_active, id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    pub fn has_admin(&self) -> Result<bool> {
        let count: i64 = self.conn().query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Token operations

    pub fn create_token(&self, token: &Token) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO tokens (id, token_hash, token_lookup, user_id, created_at, expires_at, last_used_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                token.id,
                token.token_hash,
                token.token_lookup,
                token.user_id,
                format_datetime(&token.created_at),
                token.expires_at.as_ref().map(format_datetime),
                token.last_used_at.as_ref().map(format_datetime),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation
                    && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Err(Error::TokenLookupCollision)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn get_token_by_lookup(&self, lookup: &str) -> Result<Option<Token>> {
        self.conn()
            .query_row(
                &format!("SELECT {TOKEN_COLUMNS} FROM tokens WHERE token_lookup = ?1"),
                params![lookup],
                token_from_row,
            )
            .optional()
            .map_err(Error::from)
    }

    pub fn update_token_last_used(&self, id: &str) -> Result<()> {
        self.conn().execute(
            "UPDATE tokens SET last_used_at = ?1 WHERE id = ?2",
            params![format_datetime(&Utc::now()), id],
        )?;
        Ok(())
    }

    pub fn delete_token(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    pub fn delete_user_tokens(&self, user_id: i64) -> Result<usize> {
        let rows = self
            .conn()
            .execute("DELETE FROM tokens WHERE user_id = ?1", params![user_id])?;
        Ok(rows)
    }
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

    fn token(id: &str, lookup: &str, user_id: i64) -> Token {
        Token {
            id: id.to_string(),
            token_hash: format!("hash-{id}"),
            token_lookup: lookup.to_string(),
            user_id,
            created_at: Utc::now(),
            expires_at: None,
            last_used_at: None,
        }
    }

    #[test]
    fn test_user_crud() {
        let (_temp, store) = test_store();

        let user = store
            .create_user("ops@label.test", "hash", Some("ops"), Role::Manager)
            .unwrap();
        assert_eq!(user.role, Role::Manager);
        assert!(user.is_active);

        let fetched = store.get_user_by_email("ops@label.test").unwrap().unwrap();
        assert_eq!(fetched.id, user.id);
        assert_eq!(fetched.nickname.as_deref(), Some("ops"));

        store.set_user_active(user.id, false).unwrap();
        assert!(!store.get_user(user.id).unwrap().unwrap().is_active);
        assert!(store.list_active_users(Role::Manager).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_user_email_conflicts() {
        let (_temp, store) = test_store();
        store
            .create_user("ops@label.test", "hash", None, Role::Manager)
            .unwrap();

        let result = store.create_user("ops@label.test", "hash", None, Role::Admin);
        assert!(matches!(result, Err(Error::Conflict(_))));
    }

    #[test]
    fn test_has_admin() {
        let (_temp, store) = test_store();
        assert!(!store.has_admin().unwrap());

        store
            .create_user("root@label.test", "hash", None, Role::Admin)
            .unwrap();
        assert!(store.has_admin().unwrap());
    }

    #[test]
    fn test_token_lookup_collision() {
        let (_temp, store) = test_store();
        let user = store
            .create_user("root@label.test", "hash", None, Role::Admin)
            .unwrap();

        store.create_token(&token("token-1", "lookup12", user.id)).unwrap();

        let result = store.create_token(&token("token-2", "lookup12", user.id));
        assert!(matches!(result, Err(Error::TokenLookupCollision)));
    }

    #[test]
    fn test_delete_user_tokens() {
        let (_temp, store) = test_store();
        let user = store
            .create_user("ops@label.test", "hash", None, Role::Manager)
            .unwrap();
        store.create_token(&token("token-1", "aaaaaaaa", user.id)).unwrap();
        store.create_token(&token("token-2", "bbbbbbbb", user.id)).unwrap();

        assert_eq!(store.delete_user_tokens(user.id).unwrap(), 2);
        assert!(store.get_token_by_lookup("aaaaaaaa").unwrap().is_none());
    }
}
