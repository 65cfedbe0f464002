//! Many-to-many relationships between catalog entities.

use rusqlite::{Connection, params};

use crate::error::{Error, Result};

/// A join table linking an owning entity to a set of target entities.
#[derive(Debug, Clone, Copy)]
pub struct LinkTable {
    pub table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    pub target_table: &'static str,
    pub target_name: &'static str,
}

/// Artist (group) membership of people.
pub const ARTIST_MEMBERS: LinkTable = LinkTable {
    table: "artist_members",
    owner_column: "artist_id",
    target_column: "person_id",
    target_table: "people",
    target_name: "person",
};

pub const ALBUM_ARTISTS: LinkTable = LinkTable {
    table: "album_artists",
    owner_column: "album_id",
    target_column: "artist_id",
    target_table: "artists",
    target_name: "artist",
};

pub const TRACK_ARTISTS: LinkTable = LinkTable {
    table: "track_artists",
    owner_column: "track_id",
    target_column: "artist_id",
    target_table: "artists",
    target_name: "artist",
};

/// Drops repeated ids, keeping first-seen order.
#[must_use]
pub fn dedup(ids: &[i64]) -> Vec<i64> {
    let mut unique = Vec::with_capacity(ids.len());
    for &id in ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

/// Fails with a validation error naming every id that does not exist.
pub fn ensure_targets_exist(conn: &Connection, link: &LinkTable, ids: &[i64]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let mut stmt = conn.prepare(&format!(
        "SELECT 1 FROM {} WHERE id = ?1",
        link.target_table
    ))?;

    let mut missing = Vec::new();
    for &id in ids {
        if !stmt.exists(params![id])? {
            missing.push(id.to_string());
        }
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} ids do not exist: {}",
            link.target_name,
            missing.join(", ")
        )))
    }
}

/// Links `owner_id` to every id in `ids`, validating them first.
pub fn attach(conn: &Connection, link: &LinkTable, owner_id: i64, ids: &[i64]) -> Result<()> {
    let ids = dedup(ids);
    ensure_targets_exist(conn, link, &ids)?;

    let mut stmt = conn.prepare(&format!(
        "INSERT OR IGNORE INTO {} ({}, {}) VALUES (?1, ?2)",
        link.table, link.owner_column, link.target_column
    ))?;
    for id in ids {
        stmt.execute(params![owner_id, id])?;
    }
    Ok(())
}

/// Replaces the whole link set of `owner_id`. An empty list clears it.
pub fn replace(conn: &Connection, link: &LinkTable, owner_id: i64, ids: &[i64]) -> Result<()> {
    let ids = dedup(ids);
    ensure_targets_exist(conn, link, &ids)?;
    detach_all(conn, link, owner_id)?;
    attach(conn, link, owner_id, &ids)
}

pub fn detach_all(conn: &Connection, link: &LinkTable, owner_id: i64) -> Result<usize> {
    let rows = conn.execute(
        &format!("DELETE FROM {} WHERE {} = ?1", link.table, link.owner_column),
        params![owner_id],
    )?;
    Ok(rows)
}

pub fn targets(conn: &Connection, link: &LinkTable, owner_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {target} FROM {table} WHERE {owner} = ?1 ORDER BY {target}",
        target = link.target_column,
        table = link.table,
        owner = link.owner_column,
    ))?;

    let rows = stmt.query_map(params![owner_id], |row| row.get(0))?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::TestCatalog;

    fn seed(conn: &Connection) -> (i64, Vec<i64>) {
        conn.execute("INSERT INTO artists (name) VALUES ('The Band')", [])
            .unwrap();
        let artist_id = conn.last_insert_rowid();

        let mut people = Vec::new();
        for email in ["a@label.test", "b@label.test", "c@label.test"] {
            conn.execute(
                "INSERT INTO people (last_name, first_name, email) VALUES ('Doe', 'Jane', ?1)",
                params![email],
            )
            .unwrap();
            people.push(conn.last_insert_rowid());
        }
        (artist_id, people)
    }

    #[test]
    fn test_dedup_keeps_order() {
        assert_eq!(dedup(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }

    #[test]
    fn test_attach_and_replace() {
        let catalog = TestCatalog::new();
        let conn = catalog.store.connection();
        let (artist, people) = seed(&conn);

        attach(&conn, &ARTIST_MEMBERS, artist, &[people[0], people[1], people[0]]).unwrap();
        assert_eq!(
            targets(&conn, &ARTIST_MEMBERS, artist).unwrap(),
            vec![people[0], people[1]]
        );

        replace(&conn, &ARTIST_MEMBERS, artist, &[people[2]]).unwrap();
        assert_eq!(targets(&conn, &ARTIST_MEMBERS, artist).unwrap(), vec![people[2]]);

        replace(&conn, &ARTIST_MEMBERS, artist, &[]).unwrap();
        assert!(targets(&conn, &ARTIST_MEMBERS, artist).unwrap().is_empty());
    }

    #[test]
    fn test_missing_targets_reported_together() {
        let catalog = TestCatalog::new();
        let conn = catalog.store.connection();
        let (artist, people) = seed(&conn);

        let err = attach(&conn, &ARTIST_MEMBERS, artist, &[people[0], 900, 901]).unwrap_err();
        match err {
            Error::Validation(msg) => {
                assert!(msg.contains("900"));
                assert!(msg.contains("901"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(targets(&conn, &ARTIST_MEMBERS, artist).unwrap().is_empty());
    }
}
