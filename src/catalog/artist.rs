use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::links::{self, ARTIST_MEMBERS};
use super::uniqueness::normalize_key;
use super::{Dependent, Draftable, NaturalKey, approval_from_row};
use crate::error::{Error, Result};
use crate::store::{format_datetime, parse_datetime};
use crate::types::patch::merge;
use crate::types::{Approval, Artist, ArtistPatch, NewArtist};
use crate::validation::{validate_amount, validate_required};

const COLUMNS: &str = "id, name, isni, marketing_expenses, advance_expenses, is_approved,
    created_by_user_id, created_at, updated_at";

fn artist_from_row(row: &Row<'_>) -> rusqlite::Result<Artist> {
    Ok(Artist {
        id: row.get(0)?,
        name: row.get(1)?,
        isni: row.get(2)?,
        marketing_expenses: row.get(3)?,
        advance_expenses: row.get(4)?,
        member_ids: Vec::new(),
        approval: approval_from_row(row, 5)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
    })
}

fn with_members(conn: &Connection, mut artist: Artist) -> Result<Artist> {
    artist.member_ids = links::targets(conn, &ARTIST_MEMBERS, artist.id)?;
    Ok(artist)
}

fn check_fields(name: &str, marketing: Option<f64>, advance: Option<f64>) -> Result<()> {
    validate_required(name, "name")?;
    validate_amount(marketing, "marketing_expenses")?;
    validate_amount(advance, "advance_expenses")
}

impl Draftable for Artist {
    const NAME: &'static str = "Artist";
    const TABLE: &'static str = "artists";
    const PATH: &'static str = "artists";
    const DEPENDENTS: &'static [Dependent] = &[
        Dependent {
            table: "artist_members",
            column: "artist_id",
        },
        Dependent {
            table: "album_artists",
            column: "artist_id",
        },
        Dependent {
            table: "track_artists",
            column: "artist_id",
        },
    ];

    type New = NewArtist;
    type Patch = ArtistPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn approval(&self) -> &Approval {
        &self.approval
    }

    fn load(conn: &Connection, id: i64) -> Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM artists WHERE id = ?1"),
            params![id],
            artist_from_row,
        )
        .optional()?
        .map(|artist| with_members(conn, artist))
        .transpose()
    }

    fn list(conn: &Connection, approved: bool) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM artists WHERE is_approved = ?1 ORDER BY name, id"
        ))?;

        let artists = stmt
            .query_map(params![approved], artist_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        artists
            .into_iter()
            .map(|artist| with_members(conn, artist))
            .collect()
    }

    fn validate_new(new: &NewArtist) -> Result<()> {
        check_fields(&new.name, new.marketing_expenses, new.advance_expenses)
    }

    fn new_keys(new: &NewArtist) -> Vec<NaturalKey<'_>> {
        NaturalKey::optional("isni", new.isni.as_deref())
            .into_iter()
            .collect()
    }

    fn keys(&self) -> Vec<NaturalKey<'_>> {
        NaturalKey::optional("isni", self.isni.as_deref())
            .into_iter()
            .collect()
    }

    fn changed_keys<'a>(&self, patch: &'a ArtistPatch) -> Vec<NaturalKey<'a>> {
        patch
            .isni
            .as_ref()
            .and_then(|isni| NaturalKey::optional("isni", isni.as_deref()))
            .filter(|key| Some(key.value) != self.isni.as_deref())
            .into_iter()
            .collect()
    }

    fn insert(conn: &Connection, mut new: NewArtist, approval: &Approval) -> Result<i64> {
        new.isni = normalize_key(new.isni.take());
        let now = format_datetime(&Utc::now());
        conn.execute(
            "INSERT INTO artists (name, isni, marketing_expenses, advance_expenses, is_approved,
                created_by_user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)",
            params![
                new.name.trim(),
                new.isni,
                new.marketing_expenses,
                new.advance_expenses,
                approval.is_approved,
                approval.created_by_user_id,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();

        links::attach(conn, &ARTIST_MEMBERS, id, &new.member_ids)?;
        Ok(id)
    }

    fn apply(conn: &Connection, mut artist: Artist, patch: ArtistPatch) -> Result<()> {
        merge(&mut artist.name, patch.name);
        merge(&mut artist.isni, patch.isni);
        merge(&mut artist.marketing_expenses, patch.marketing_expenses);
        merge(&mut artist.advance_expenses, patch.advance_expenses);
        artist.isni = normalize_key(artist.isni.take());

        check_fields(&artist.name, artist.marketing_expenses, artist.advance_expenses)?;

        conn.execute(
            "UPDATE artists SET name = ?1, isni = ?2, marketing_expenses = ?3,
                advance_expenses = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                artist.name.trim(),
                artist.isni,
                artist.marketing_expenses,
                artist.advance_expenses,
                format_datetime(&Utc::now()),
                artist.id,
            ],
        )?;

        if let Some(member_ids) = patch.member_ids {
            links::replace(conn, &ARTIST_MEMBERS, artist.id, &member_ids)?;
        }
        Ok(())
    }
}
