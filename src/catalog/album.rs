use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::links::{self, ALBUM_ARTISTS};
use super::uniqueness::normalize_key;
use super::{Dependent, Draftable, NaturalKey, approval_from_row};
use crate::error::{Error, Result};
use crate::store::{format_date, format_datetime, parse_date, parse_datetime};
use crate::types::patch::merge;
use crate::types::{Album, AlbumPatch, Approval, DistributionSites, NewAlbum};
use crate::validation::{validate_amount, validate_required};

const COLUMNS: &str = "id, title, album_type, release_date, upc, isrc, marketing_budget, advance,
    aggregator, version, subgenre, yoga, zaycev, additional_sites, zaycev_star, synclab_star,
    is_approved, created_by_user_id, created_at, updated_at";

fn album_from_row(row: &Row<'_>) -> rusqlite::Result<Album> {
    Ok(Album {
        id: row.get(0)?,
        title: row.get(1)?,
        album_type: row.get(2)?,
        release_date: parse_date(row.get(3)?),
        upc: row.get(4)?,
        isrc: row.get(5)?,
        marketing_budget: row.get(6)?,
        advance: row.get(7)?,
        aggregator: row.get(8)?,
        version: row.get(9)?,
        subgenre: row.get(10)?,
        sites: DistributionSites {
            yoga: row.get(11)?,
            zaycev: row.get(12)?,
            additional_sites: row.get(13)?,
            zaycev_star: row.get(14)?,
            synclab_star: row.get(15)?,
        },
        artist_ids: Vec::new(),
        track_ids: Vec::new(),
        approval: approval_from_row(row, 16)?,
        created_at: parse_datetime(&row.get::<_, String>(18)?),
        updated_at: parse_datetime(&row.get::<_, String>(19)?),
    })
}

fn track_ids(conn: &Connection, album_id: i64) -> Result<Vec<i64>> {
    let mut stmt = conn.prepare("SELECT id FROM tracks WHERE album_id = ?1 ORDER BY id")?;

    let rows = stmt.query_map(params![album_id], |row| row.get(0))?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn with_links(conn: &Connection, mut album: Album) -> Result<Album> {
    album.artist_ids = links::targets(conn, &ALBUM_ARTISTS, album.id)?;
    album.track_ids = track_ids(conn, album.id)?;
    Ok(album)
}

fn check_fields(
    title: &str,
    album_type: &str,
    marketing_budget: Option<f64>,
    advance: Option<f64>,
) -> Result<()> {
    validate_required(title, "title")?;
    validate_required(album_type, "type")?;
    validate_amount(marketing_budget, "marketing_budget")?;
    validate_amount(advance, "advance")
}

fn natural_keys<'a>(upc: Option<&'a str>, isrc: Option<&'a str>) -> Vec<NaturalKey<'a>> {
    [
        NaturalKey::optional("upc", upc),
        NaturalKey::optional("isrc", isrc),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// The new value of a nullable key field, when the patch changes it.
fn changed<'a>(patched: Option<&'a Option<String>>, current: Option<&str>) -> Option<&'a str> {
    patched
        .and_then(|value| value.as_deref())
        .map(str::trim)
        .filter(|value| Some(*value) != current)
}

impl Draftable for Album {
    const NAME: &'static str = "Album";
    const TABLE: &'static str = "albums";
    const PATH: &'static str = "albums";
    const DEPENDENTS: &'static [Dependent] = &[Dependent {
        table: "album_artists",
        column: "album_id",
    }];

    type New = NewAlbum;
    type Patch = AlbumPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn approval(&self) -> &Approval {
        &self.approval
    }

    fn load(conn: &Connection, id: i64) -> Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM albums WHERE id = ?1"),
            params![id],
            album_from_row,
        )
        .optional()?
        .map(|album| with_links(conn, album))
        .transpose()
    }

    fn list(conn: &Connection, approved: bool) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM albums WHERE is_approved = ?1 ORDER BY title, id"
        ))?;

        let albums = stmt
            .query_map(params![approved], album_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        albums
            .into_iter()
            .map(|album| with_links(conn, album))
            .collect()
    }

    fn validate_new(new: &NewAlbum) -> Result<()> {
        check_fields(
            &new.title,
            &new.album_type,
            new.marketing_budget,
            new.advance,
        )
    }

    fn new_keys(new: &NewAlbum) -> Vec<NaturalKey<'_>> {
        natural_keys(new.upc.as_deref(), new.isrc.as_deref())
    }

    fn keys(&self) -> Vec<NaturalKey<'_>> {
        natural_keys(self.upc.as_deref(), self.isrc.as_deref())
    }

    fn changed_keys<'a>(&self, patch: &'a AlbumPatch) -> Vec<NaturalKey<'a>> {
        natural_keys(
            changed(patch.upc.as_ref(), self.upc.as_deref()),
            changed(patch.isrc.as_ref(), self.isrc.as_deref()),
        )
    }

    fn insert(conn: &Connection, mut new: NewAlbum, approval: &Approval) -> Result<i64> {
        new.upc = normalize_key(new.upc.take());
        new.isrc = normalize_key(new.isrc.take());
        let now = format_datetime(&Utc::now());
        conn.execute(
            "INSERT INTO albums (title, album_type, release_date, upc, isrc, marketing_budget,
                advance, aggregator, version, subgenre, yoga, zaycev, additional_sites,
                zaycev_star, synclab_star, is_approved, created_by_user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?18)",
            params![
                new.title.trim(),
                new.album_type.trim(),
                format_date(new.release_date.as_ref()),
                new.upc,
                new.isrc,
                new.marketing_budget,
                new.advance,
                new.aggregator,
                new.version,
                new.subgenre,
                new.sites.yoga,
                new.sites.zaycev,
                new.sites.additional_sites,
                new.sites.zaycev_star,
                new.sites.synclab_star,
                approval.is_approved,
                approval.created_by_user_id,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();

        links::attach(conn, &ALBUM_ARTISTS, id, &new.artist_ids)?;
        Ok(id)
    }

    fn apply(conn: &Connection, mut album: Album, patch: AlbumPatch) -> Result<()> {
        merge(&mut album.title, patch.title);
        merge(&mut album.album_type, patch.album_type);
        merge(&mut album.release_date, patch.release_date);
        merge(&mut album.upc, patch.upc);
        merge(&mut album.isrc, patch.isrc);
        album.upc = normalize_key(album.upc.take());
        album.isrc = normalize_key(album.isrc.take());
        merge(&mut album.marketing_budget, patch.marketing_budget);
        merge(&mut album.advance, patch.advance);
        merge(&mut album.aggregator, patch.aggregator);
        merge(&mut album.version, patch.version);
        merge(&mut album.subgenre, patch.subgenre);
        merge(&mut album.sites.yoga, patch.yoga);
        merge(&mut album.sites.zaycev, patch.zaycev);
        merge(&mut album.sites.additional_sites, patch.additional_sites);
        merge(&mut album.sites.zaycev_star, patch.zaycev_star);
        merge(&mut album.sites.synclab_star, patch.synclab_star);

        check_fields(
            &album.title,
            &album.album_type,
            album.marketing_budget,
            album.advance,
        )?;

        conn.execute(
            "UPDATE albums SET title = ?1, album_type = ?2, release_date = ?3, upc = ?4,
                isrc = ?5, marketing_budget = ?6, advance = ?7, aggregator = ?8, version = ?9,
                subgenre = ?10, yoga = ?11, zaycev = ?12, additional_sites = ?13,
                zaycev_star = ?14, synclab_star = ?15, updated_at = ?16
             WHERE id = ?17",
            params![
                album.title.trim(),
                album.album_type.trim(),
                format_date(album.release_date.as_ref()),
                album.upc,
                album.isrc,
                album.marketing_budget,
                album.advance,
                album.aggregator,
                album.version,
                album.subgenre,
                album.sites.yoga,
                album.sites.zaycev,
                album.sites.additional_sites,
                album.sites.zaycev_star,
                album.sites.synclab_star,
                format_datetime(&Utc::now()),
                album.id,
            ],
        )?;

        if let Some(artist_ids) = patch.artist_ids {
            links::replace(conn, &ALBUM_ARTISTS, album.id, &artist_ids)?;
        }
        Ok(())
    }

    fn before_remove(conn: &Connection, album: &Album) -> Result<()> {
        let tracks = track_ids(conn, album.id)?;
        if tracks.is_empty() {
            Ok(())
        } else {
            Err(Error::Conflict(format!(
                "Album {} still has {} track(s); delete them first",
                album.id,
                tracks.len()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::lifecycle::{approve, create, update};
    use crate::catalog::testing::{TestCatalog, new_album};

    fn album_with_codes(upc: Option<&str>, isrc: Option<&str>) -> NewAlbum {
        NewAlbum {
            upc: upc.map(str::to_string),
            isrc: isrc.map(str::to_string),
            ..new_album("Codes")
        }
    }

    #[test]
    fn test_blank_codes_never_collide() {
        let c = TestCatalog::new();
        let first: Album =
            create(&c.store, album_with_codes(Some(""), Some(" ")), &c.admin).unwrap();
        let second: Album =
            create(&c.store, album_with_codes(Some(""), Some("")), &c.admin).unwrap();
        assert_eq!((first.upc, first.isrc), (None, None));
        assert_eq!((second.upc, second.isrc), (None, None));

        let held: Album =
            create(&c.store, album_with_codes(Some("0123"), None), &c.admin).unwrap();
        let same = AlbumPatch {
            upc: Some(Some(" 0123 ".to_string())),
            ..AlbumPatch::default()
        };
        let kept: Album = update(&c.store, held.id, same, &c.admin).unwrap();
        assert_eq!(kept.upc.as_deref(), Some("0123"));
    }

    #[test]
    fn test_upc_and_isrc_checked_independently() {
        let c = TestCatalog::new();
        let _held: Album =
            create(&c.store, album_with_codes(Some("0123"), Some("RUA1")), &c.admin).unwrap();

        let err = create::<Album>(&c.store, album_with_codes(Some("0123"), None), &c.admin)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(ref msg) if msg.contains("upc")));

        let err = create::<Album>(&c.store, album_with_codes(None, Some("RUA1")), &c.admin)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(ref msg) if msg.contains("isrc")));

        let draft: Album =
            create(&c.store, album_with_codes(Some("0123"), None), &c.manager).unwrap();
        let err = approve::<Album>(&c.store, draft.id, &c.admin).unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn test_release_date_roundtrip_and_clear() {
        let c = TestCatalog::new();
        let mut new = new_album("Dated");
        new.release_date = chrono::NaiveDate::from_ymd_opt(2024, 5, 17);
        let album: Album = create(&c.store, new, &c.admin).unwrap();
        assert_eq!(album.release_date, chrono::NaiveDate::from_ymd_opt(2024, 5, 17));

        let patch: AlbumPatch = serde_json::from_str(r#"{"release_date": null}"#).unwrap();
        let cleared: Album = update(&c.store, album.id, patch, &c.admin).unwrap();
        assert_eq!(cleared.release_date, None);
        assert_eq!(cleared.title, "Dated");
    }
}
