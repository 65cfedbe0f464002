use rusqlite::{Connection, params};

use crate::error::{Error, Result};

/// A business identifier that must be unique among approved rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NaturalKey<'a> {
    pub column: &'static str,
    pub value: &'a str,
}

impl<'a> NaturalKey<'a> {
    #[must_use]
    pub fn new(column: &'static str, value: &'a str) -> Self {
        Self { column, value }
    }

    /// Key for an optional value; absent and blank values never collide.
    #[must_use]
    pub fn optional(column: &'static str, value: Option<&'a str>) -> Option<Self> {
        value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| Self::new(column, value))
    }
}

/// Trims an optional key column; blank values are stored as NULL.
#[must_use]
pub fn normalize_key(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// True when an approved row of `table` already holds `key`.
pub fn is_taken(conn: &Connection, table: &str, key: &NaturalKey<'_>) -> Result<bool> {
    let sql = format!(
        "SELECT EXISTS(SELECT 1 FROM {table} WHERE {} = ?1 AND is_approved = 1)",
        key.column
    );
    conn.query_row(&sql, params![key.value], |row| row.get(0))
        .map_err(Error::from)
}

/// Fails with `Conflict` on the first key already held by an approved row.
/// Drafts never block each other.
pub fn ensure_available(
    conn: &Connection,
    table: &str,
    entity: &str,
    keys: &[NaturalKey<'_>],
) -> Result<()> {
    for key in keys {
        if is_taken(conn, table, key)? {
            return Err(Error::Conflict(format!(
                "{entity} with {} '{}' already exists",
                key.column, key.value
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::TestCatalog;

    fn insert_person(conn: &Connection, email: &str, approved: bool) {
        conn.execute(
            "INSERT INTO people (last_name, first_name, email, is_approved) VALUES ('Doe', 'Jane', ?1, ?2)",
            params![email, approved],
        )
        .unwrap();
    }

    #[test]
    fn test_drafts_do_not_hold_keys() {
        let catalog = TestCatalog::new();
        let conn = catalog.store.connection();
        insert_person(&conn, "jane@label.test", false);
        insert_person(&conn, "jane@label.test", false);

        let key = NaturalKey::new("email", "jane@label.test");
        assert!(!is_taken(&conn, "people", &key).unwrap());
        assert!(ensure_available(&conn, "people", "Person", &[key]).is_ok());
    }

    #[test]
    fn test_approved_row_holds_key() {
        let catalog = TestCatalog::new();
        let conn = catalog.store.connection();
        insert_person(&conn, "jane@label.test", true);

        let key = NaturalKey::new("email", "jane@label.test");
        let err = ensure_available(&conn, "people", "Person", &[key]).unwrap_err();
        assert!(matches!(err, Error::Conflict(msg) if msg.contains("jane@label.test")));
    }

    #[test]
    fn test_optional_key_absent() {
        assert_eq!(NaturalKey::optional("isni", None), None);
        assert_eq!(
            NaturalKey::optional("isni", Some("0000000121032683")),
            Some(NaturalKey::new("isni", "0000000121032683"))
        );
    }

    #[test]
    fn test_blank_values_are_not_keys() {
        assert_eq!(NaturalKey::optional("upc", Some("")), None);
        assert_eq!(NaturalKey::optional("upc", Some("   ")), None);
        assert_eq!(
            NaturalKey::optional("upc", Some(" 4607173150325 ")),
            Some(NaturalKey::new("upc", "4607173150325"))
        );

        assert_eq!(normalize_key(Some(" \t".to_string())), None);
        assert_eq!(normalize_key(None), None);
        assert_eq!(
            normalize_key(Some(" RUA1D2512345 ".to_string())).as_deref(),
            Some("RUA1D2512345")
        );
    }
}
