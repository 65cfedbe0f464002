//! Royalty shares held by people on tracks.
//!
//! A track has at most one share row per person. The bulk adders used while
//! creating a track keep the first row written for a person; [`upsert`] is
//! the explicit overwrite.

use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{Error, Result};
use crate::types::{RightsCategory, ShareEntry, ShareTotals, ShareValues, TrackPersonShare};
use crate::validation::validate_percentage;

const SHARE_COLUMNS: &str = "track_id, person_id, share_of_monetization_of_copyrights, copyrights,
    share_of_monetization_of_related_rights, related_rights";

fn share_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<TrackPersonShare> {
    Ok(TrackPersonShare {
        track_id: row.get(0)?,
        person_id: row.get(1)?,
        values: ShareValues {
            share_of_monetization_of_copyrights: row.get(2)?,
            copyrights: row.get(3)?,
            share_of_monetization_of_related_rights: row.get(4)?,
            related_rights: row.get(5)?,
        },
    })
}

pub fn validate_values(values: &ShareValues) -> Result<()> {
    validate_percentage(
        values.share_of_monetization_of_copyrights,
        "share_of_monetization_of_copyrights",
    )?;
    validate_percentage(values.copyrights, "copyrights")?;
    validate_percentage(
        values.share_of_monetization_of_related_rights,
        "share_of_monetization_of_related_rights",
    )?;
    validate_percentage(values.related_rights, "related_rights")
}

fn ensure_person_exists(conn: &Connection, person_id: i64) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM people WHERE id = ?1)",
        params![person_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(Error::NotFound(format!("Person {person_id} not found")))
    }
}

/// Adds a single-category share. Returns `false` when the person already
/// holds a share on the track, in which case nothing is written.
pub fn add_share(
    conn: &Connection,
    track_id: i64,
    category: RightsCategory,
    entry: &ShareEntry,
) -> Result<bool> {
    ensure_person_exists(conn, entry.person_id)?;
    let values = ShareValues::from_entry(category, entry);
    validate_values(&values)?;

    let inserted = conn.execute(
        &format!(
            "INSERT INTO track_shares ({SHARE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (track_id, person_id) DO NOTHING"
        ),
        params![
            track_id,
            entry.person_id,
            values.share_of_monetization_of_copyrights,
            values.copyrights,
            values.share_of_monetization_of_related_rights,
            values.related_rights,
        ],
    )?;

    if inserted == 0 {
        tracing::debug!(
            "Person {} already holds a share on track {}; {:?} entry skipped",
            entry.person_id,
            track_id,
            category
        );
    }
    Ok(inserted > 0)
}

pub fn add_author_share(conn: &Connection, track_id: i64, entry: &ShareEntry) -> Result<bool> {
    add_share(conn, track_id, RightsCategory::Author, entry)
}

pub fn add_neighboring_share(conn: &Connection, track_id: i64, entry: &ShareEntry) -> Result<bool> {
    add_share(conn, track_id, RightsCategory::Neighboring, entry)
}

/// Creates or overwrites all four percentages of a (track, person) row.
pub fn upsert(
    conn: &Connection,
    track_id: i64,
    person_id: i64,
    values: &ShareValues,
) -> Result<TrackPersonShare> {
    ensure_person_exists(conn, person_id)?;
    validate_values(values)?;

    conn.execute(
        &format!(
            "INSERT INTO track_shares ({SHARE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT (track_id, person_id) DO UPDATE SET
                share_of_monetization_of_copyrights = excluded.share_of_monetization_of_copyrights,
                copyrights = excluded.copyrights,
                share_of_monetization_of_related_rights = excluded.share_of_monetization_of_related_rights,
                related_rights = excluded.related_rights"
        ),
        params![
            track_id,
            person_id,
            values.share_of_monetization_of_copyrights,
            values.copyrights,
            values.share_of_monetization_of_related_rights,
            values.related_rights,
        ],
    )?;

    get(conn, track_id, person_id)?
        .ok_or_else(|| Error::NotFound("Share not found".to_string()))
}

pub fn get(conn: &Connection, track_id: i64, person_id: i64) -> Result<Option<TrackPersonShare>> {
    conn.query_row(
        &format!("SELECT {SHARE_COLUMNS} FROM track_shares WHERE track_id = ?1 AND person_id = ?2"),
        params![track_id, person_id],
        share_from_row,
    )
    .optional()
    .map_err(Error::from)
}

pub fn remove(conn: &Connection, track_id: i64, person_id: i64) -> Result<bool> {
    let rows = conn.execute(
        "DELETE FROM track_shares WHERE track_id = ?1 AND person_id = ?2",
        params![track_id, person_id],
    )?;
    Ok(rows > 0)
}

pub fn for_track(conn: &Connection, track_id: i64) -> Result<Vec<TrackPersonShare>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SHARE_COLUMNS} FROM track_shares WHERE track_id = ?1 ORDER BY person_id"
    ))?;

    let rows = stmt.query_map(params![track_id], share_from_row)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

/// Sums monetization shares per category. Totals above 100 are reported, not rejected.
#[must_use]
pub fn totals(shares: &[TrackPersonShare]) -> ShareTotals {
    shares.iter().fold(ShareTotals::default(), |acc, share| ShareTotals {
        copyrights: acc.copyrights + share.values.share_of_monetization_of_copyrights,
        related_rights: acc.related_rights + share.values.share_of_monetization_of_related_rights,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::testing::{TestCatalog, new_album, new_person, new_track};
    use crate::catalog::lifecycle;
    use crate::types::{Album, Person, Track};

    struct Fixture {
        catalog: TestCatalog,
        track_id: i64,
        person_id: i64,
    }

    fn fixture() -> Fixture {
        let catalog = TestCatalog::new();
        let admin = catalog.admin;
        let person: Person =
            lifecycle::create(&catalog.store, new_person("writer@label.test"), &admin).unwrap();
        let album: Album = lifecycle::create(&catalog.store, new_album("Debut"), &admin).unwrap();
        let track: Track =
            lifecycle::create(&catalog.store, new_track(album.id, "Opener"), &admin).unwrap();
        Fixture {
            catalog,
            track_id: track.id,
            person_id: person.id,
        }
    }

    fn entry(person_id: i64, share: f64, licensor_share: f64) -> ShareEntry {
        ShareEntry {
            person_id,
            share,
            licensor_share,
        }
    }

    #[test]
    fn test_author_share_zeroes_related_rights() {
        let f = fixture();
        let conn = f.catalog.store.connection();

        assert!(add_author_share(&conn, f.track_id, &entry(f.person_id, 40.0, 50.0)).unwrap());

        let share = get(&conn, f.track_id, f.person_id).unwrap().unwrap();
        assert_eq!(share.values.share_of_monetization_of_copyrights, 40.0);
        assert_eq!(share.values.copyrights, 50.0);
        assert_eq!(share.values.share_of_monetization_of_related_rights, 0.0);
        assert_eq!(share.values.related_rights, 0.0);
    }

    #[test]
    fn test_first_share_wins() {
        let f = fixture();
        let conn = f.catalog.store.connection();

        assert!(add_author_share(&conn, f.track_id, &entry(f.person_id, 40.0, 50.0)).unwrap());
        assert!(!add_neighboring_share(&conn, f.track_id, &entry(f.person_id, 30.0, 60.0)).unwrap());

        let shares = for_track(&conn, f.track_id).unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].values.share_of_monetization_of_copyrights, 40.0);
        assert_eq!(shares[0].values.share_of_monetization_of_related_rights, 0.0);
    }

    #[test]
    fn test_upsert_overwrites() {
        let f = fixture();
        let conn = f.catalog.store.connection();
        add_author_share(&conn, f.track_id, &entry(f.person_id, 40.0, 50.0)).unwrap();

        let values = ShareValues {
            share_of_monetization_of_copyrights: 10.0,
            copyrights: 20.0,
            share_of_monetization_of_related_rights: 30.0,
            related_rights: 40.0,
        };
        let share = upsert(&conn, f.track_id, f.person_id, &values).unwrap();
        assert_eq!(share.values, values);
        assert_eq!(for_track(&conn, f.track_id).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_person_is_not_found() {
        let f = fixture();
        let conn = f.catalog.store.connection();

        let err = add_author_share(&conn, f.track_id, &entry(4242, 10.0, 10.0)).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_out_of_range_share_rejected() {
        let f = fixture();
        let conn = f.catalog.store.connection();

        let err = add_author_share(&conn, f.track_id, &entry(f.person_id, 120.0, 10.0)).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(for_track(&conn, f.track_id).unwrap().is_empty());
    }

    #[test]
    fn test_totals_sum_per_category() {
        let shares = vec![
            TrackPersonShare {
                track_id: 1,
                person_id: 1,
                values: ShareValues {
                    share_of_monetization_of_copyrights: 60.0,
                    ..ShareValues::default()
                },
            },
            TrackPersonShare {
                track_id: 1,
                person_id: 2,
                values: ShareValues {
                    share_of_monetization_of_copyrights: 50.0,
                    share_of_monetization_of_related_rights: 25.0,
                    ..ShareValues::default()
                },
            },
        ];

        let totals = totals(&shares);
        assert_eq!(totals.copyrights, 110.0);
        assert_eq!(totals.related_rights, 25.0);
    }
}
