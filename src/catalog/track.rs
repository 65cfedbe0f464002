use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::lifecycle::{ensure_editable, load_visible};
use super::links::{self, TRACK_ARTISTS};
use super::uniqueness::normalize_key;
use super::{Dependent, Draftable, NaturalKey, approval_from_row, shares};
use crate::error::{Error, Result};
use crate::store::{SqliteStore, format_datetime, parse_datetime};
use crate::types::patch::merge;
use crate::types::{
    Approval, Caller, NewTrack, ProductionFlags, ShareTotals, ShareValues, Track, TrackPatch,
    TrackPersonShare, TrackRights,
};
use crate::validation::{validate_amount, validate_optional_percentage, validate_percentage, validate_required};

const COLUMNS: &str = "id, album_id, title, isrc, genre, music_authors, lyrics_authors, copyright,
    related_rights, label_share_percentage, scope_of_copyright, scope_of_related_rights,
    neighboring_rights_share, label_rights_share, label_monetization_share, marketing_expenses,
    advance_expenses, is_ringtone_added, has_video_clip, is_lyrics_added, is_karaoke_sync_added,
    is_approved, created_by_user_id, created_at, updated_at";

fn track_from_row(row: &Row<'_>) -> rusqlite::Result<Track> {
    Ok(Track {
        id: row.get(0)?,
        album_id: row.get(1)?,
        title: row.get(2)?,
        isrc: row.get(3)?,
        genre: row.get(4)?,
        music_authors: row.get(5)?,
        lyrics_authors: row.get(6)?,
        copyright: row.get(7)?,
        related_rights: row.get(8)?,
        label_share_percentage: row.get(9)?,
        rights: TrackRights {
            scope_of_copyright: row.get(10)?,
            scope_of_related_rights: row.get(11)?,
            neighboring_rights_share: row.get(12)?,
            label_rights_share: row.get(13)?,
            label_monetization_share: row.get(14)?,
        },
        marketing_expenses: row.get(15)?,
        advance_expenses: row.get(16)?,
        flags: ProductionFlags {
            is_ringtone_added: row.get(17)?,
            has_video_clip: row.get(18)?,
            is_lyrics_added: row.get(19)?,
            is_karaoke_sync_added: row.get(20)?,
        },
        artist_ids: Vec::new(),
        shares: Vec::new(),
        share_totals: ShareTotals::default(),
        approval: approval_from_row(row, 21)?,
        created_at: parse_datetime(&row.get::<_, String>(23)?),
        updated_at: parse_datetime(&row.get::<_, String>(24)?),
    })
}

fn with_links(conn: &Connection, mut track: Track) -> Result<Track> {
    track.artist_ids = links::targets(conn, &TRACK_ARTISTS, track.id)?;
    track.shares = shares::for_track(conn, track.id)?;
    track.share_totals = shares::totals(&track.shares);
    Ok(track)
}

fn ensure_album_exists(conn: &Connection, album_id: i64) -> Result<()> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM albums WHERE id = ?1)",
        params![album_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(Error::Validation(format!("album {album_id} does not exist")))
    }
}

fn check_fields(
    title: &str,
    label_share_percentage: f64,
    rights: &TrackRights,
    marketing: Option<f64>,
    advance: Option<f64>,
) -> Result<()> {
    validate_required(title, "title")?;
    validate_percentage(label_share_percentage, "label_share_percentage")?;
    validate_optional_percentage(rights.scope_of_copyright, "scope_of_copyright")?;
    validate_optional_percentage(rights.scope_of_related_rights, "scope_of_related_rights")?;
    validate_optional_percentage(rights.neighboring_rights_share, "neighboring_rights_share")?;
    validate_optional_percentage(rights.label_rights_share, "label_rights_share")?;
    validate_optional_percentage(rights.label_monetization_share, "label_monetization_share")?;
    validate_amount(marketing, "marketing_expenses")?;
    validate_amount(advance, "advance_expenses")
}

impl Draftable for Track {
    const NAME: &'static str = "Track";
    const TABLE: &'static str = "tracks";
    const PATH: &'static str = "tracks";
    const DEPENDENTS: &'static [Dependent] = &[
        Dependent {
            table: "track_artists",
            column: "track_id",
        },
        Dependent {
            table: "track_shares",
            column: "track_id",
        },
    ];

    type New = NewTrack;
    type Patch = TrackPatch;

    fn id(&self) -> i64 {
        self.id
    }

    fn approval(&self) -> &Approval {
        &self.approval
    }

    fn load(conn: &Connection, id: i64) -> Result<Option<Self>> {
        conn.query_row(
            &format!("SELECT {COLUMNS} FROM tracks WHERE id = ?1"),
            params![id],
            track_from_row,
        )
        .optional()?
        .map(|track| with_links(conn, track))
        .transpose()
    }

    fn list(conn: &Connection, approved: bool) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {COLUMNS} FROM tracks WHERE is_approved = ?1 ORDER BY album_id, id"
        ))?;

        let tracks = stmt
            .query_map(params![approved], track_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        tracks
            .into_iter()
            .map(|track| with_links(conn, track))
            .collect()
    }

    fn validate_new(new: &NewTrack) -> Result<()> {
        check_fields(
            &new.title,
            new.label_share_percentage,
            &new.rights,
            new.marketing_expenses,
            new.advance_expenses,
        )
    }

    fn new_keys(new: &NewTrack) -> Vec<NaturalKey<'_>> {
        NaturalKey::optional("isrc", new.isrc.as_deref())
            .into_iter()
            .collect()
    }

    fn keys(&self) -> Vec<NaturalKey<'_>> {
        NaturalKey::optional("isrc", self.isrc.as_deref())
            .into_iter()
            .collect()
    }

    fn changed_keys<'a>(&self, patch: &'a TrackPatch) -> Vec<NaturalKey<'a>> {
        patch
            .isrc
            .as_ref()
            .and_then(|isrc| NaturalKey::optional("isrc", isrc.as_deref()))
            .filter(|key| Some(key.value) != self.isrc.as_deref())
            .into_iter()
            .collect()
    }

    /// Inserts the track, then its artist links, then author and
    /// neighboring share entries in that order.
    fn insert(conn: &Connection, mut new: NewTrack, approval: &Approval) -> Result<i64> {
        ensure_album_exists(conn, new.album_id)?;
        new.isrc = normalize_key(new.isrc.take());

        let now = format_datetime(&Utc::now());
        conn.execute(
            "INSERT INTO tracks (album_id, title, isrc, genre, music_authors, lyrics_authors,
                copyright, related_rights, label_share_percentage, scope_of_copyright,
                scope_of_related_rights, neighboring_rights_share, label_rights_share,
                label_monetization_share, marketing_expenses, advance_expenses,
                is_ringtone_added, has_video_clip, is_lyrics_added, is_karaoke_sync_added,
                is_approved, created_by_user_id, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?23)",
            params![
                new.album_id,
                new.title.trim(),
                new.isrc,
                new.genre,
                new.music_authors,
                new.lyrics_authors,
                new.copyright,
                new.related_rights,
                new.label_share_percentage,
                new.rights.scope_of_copyright,
                new.rights.scope_of_related_rights,
                new.rights.neighboring_rights_share,
                new.rights.label_rights_share,
                new.rights.label_monetization_share,
                new.marketing_expenses,
                new.advance_expenses,
                new.flags.is_ringtone_added,
                new.flags.has_video_clip,
                new.flags.is_lyrics_added,
                new.flags.is_karaoke_sync_added,
                approval.is_approved,
                approval.created_by_user_id,
                now,
            ],
        )?;
        let id = conn.last_insert_rowid();

        links::attach(conn, &TRACK_ARTISTS, id, &new.artist_ids)?;
        for entry in &new.author_rights {
            shares::add_author_share(conn, id, entry)?;
        }
        for entry in &new.neighboring_rights {
            shares::add_neighboring_share(conn, id, entry)?;
        }
        Ok(id)
    }

    fn apply(conn: &Connection, mut track: Track, patch: TrackPatch) -> Result<()> {
        if let Some(album_id) = patch.album_id {
            ensure_album_exists(conn, album_id)?;
            track.album_id = album_id;
        }
        merge(&mut track.title, patch.title);
        merge(&mut track.isrc, patch.isrc);
        track.isrc = normalize_key(track.isrc.take());
        merge(&mut track.genre, patch.genre);
        merge(&mut track.music_authors, patch.music_authors);
        merge(&mut track.lyrics_authors, patch.lyrics_authors);
        merge(&mut track.copyright, patch.copyright);
        merge(&mut track.related_rights, patch.related_rights);
        merge(&mut track.label_share_percentage, patch.label_share_percentage);
        merge(&mut track.rights.scope_of_copyright, patch.scope_of_copyright);
        merge(&mut track.rights.scope_of_related_rights, patch.scope_of_related_rights);
        merge(&mut track.rights.neighboring_rights_share, patch.neighboring_rights_share);
        merge(&mut track.rights.label_rights_share, patch.label_rights_share);
        merge(&mut track.rights.label_monetization_share, patch.label_monetization_share);
        merge(&mut track.marketing_expenses, patch.marketing_expenses);
        merge(&mut track.advance_expenses, patch.advance_expenses);
        merge(&mut track.flags.is_ringtone_added, patch.is_ringtone_added);
        merge(&mut track.flags.has_video_clip, patch.has_video_clip);
        merge(&mut track.flags.is_lyrics_added, patch.is_lyrics_added);
        merge(&mut track.flags.is_karaoke_sync_added, patch.is_karaoke_sync_added);

        check_fields(
            &track.title,
            track.label_share_percentage,
            &track.rights,
            track.marketing_expenses,
            track.advance_expenses,
        )?;

        conn.execute(
            "UPDATE tracks SET album_id = ?1, title = ?2, isrc = ?3, genre = ?4,
                music_authors = ?5, lyrics_authors = ?6, copyright = ?7, related_rights = ?8,
                label_share_percentage = ?9, scope_of_copyright = ?10,
                scope_of_related_rights = ?11, neighboring_rights_share = ?12,
                label_rights_share = ?13, label_monetization_share = ?14,
                marketing_expenses = ?15, advance_expenses = ?16, is_ringtone_added = ?17,
                has_video_clip = ?18, is_lyrics_added = ?19, is_karaoke_sync_added = ?20,
                updated_at = ?21
             WHERE id = ?22",
            params![
                track.album_id,
                track.title.trim(),
                track.isrc,
                track.genre,
                track.music_authors,
                track.lyrics_authors,
                track.copyright,
                track.related_rights,
                track.label_share_percentage,
                track.rights.scope_of_copyright,
                track.rights.scope_of_related_rights,
                track.rights.neighboring_rights_share,
                track.rights.label_rights_share,
                track.rights.label_monetization_share,
                track.marketing_expenses,
                track.advance_expenses,
                track.flags.is_ringtone_added,
                track.flags.has_video_clip,
                track.flags.is_lyrics_added,
                track.flags.is_karaoke_sync_added,
                format_datetime(&Utc::now()),
                track.id,
            ],
        )?;

        if let Some(artist_ids) = patch.artist_ids {
            links::replace(conn, &TRACK_ARTISTS, track.id, &artist_ids)?;
        }
        Ok(())
    }
}

/// Lists the share rows of a track the caller can see.
pub fn list_shares(
    store: &SqliteStore,
    track_id: i64,
    caller: &Caller,
) -> Result<Vec<TrackPersonShare>> {
    let conn = store.conn();
    let track = load_visible::<Track>(&conn, track_id, caller)?;
    Ok(track.shares)
}

/// Sets all four percentages of a person's share on a track, overwriting
/// any existing row. Follows the track's edit rules.
pub fn upsert_share(
    store: &SqliteStore,
    track_id: i64,
    person_id: i64,
    values: ShareValues,
    caller: &Caller,
) -> Result<TrackPersonShare> {
    let share = store.transaction(|tx| {
        let track = load_visible::<Track>(tx, track_id, caller)?;
        ensure_editable(&track, caller)?;
        shares::upsert(tx, track_id, person_id, &values)
    })?;

    tracing::info!(
        "Set share of person {} on track {} by user {}",
        person_id,
        track_id,
        caller.id
    );
    Ok(share)
}

pub fn remove_share(
    store: &SqliteStore,
    track_id: i64,
    person_id: i64,
    caller: &Caller,
) -> Result<()> {
    store.transaction(|tx| {
        let track = load_visible::<Track>(tx, track_id, caller)?;
        ensure_editable(&track, caller)?;
        if shares::remove(tx, track_id, person_id)? {
            Ok(())
        } else {
            Err(Error::NotFound(format!(
                "Person {person_id} holds no share on track {track_id}"
            )))
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::lifecycle::{create, get, update};
    use crate::catalog::testing::{TestCatalog, new_album, new_person, new_track};
    use crate::types::{Album, Person, ShareEntry};

    fn seeded() -> (TestCatalog, Album, Person, Person) {
        let c = TestCatalog::new();
        let album: Album = create(&c.store, new_album("Debut"), &c.admin).unwrap();
        let writer: Person = create(&c.store, new_person("writer@label.test"), &c.admin).unwrap();
        let singer: Person = create(&c.store, new_person("singer@label.test"), &c.admin).unwrap();
        (c, album, writer, singer)
    }

    fn entry(person_id: i64, share: f64, licensor_share: f64) -> ShareEntry {
        ShareEntry {
            person_id,
            share,
            licensor_share,
        }
    }

    #[test]
    fn test_create_with_rights_lists() {
        let (c, album, writer, singer) = seeded();
        let mut new = new_track(album.id, "Opener");
        new.author_rights = vec![entry(writer.id, 50.0, 100.0)];
        new.neighboring_rights = vec![entry(singer.id, 30.0, 80.0), entry(writer.id, 10.0, 10.0)];

        let track: Track = create(&c.store, new, &c.admin).unwrap();
        assert_eq!(track.label_share_percentage, 20.0);
        assert_eq!(track.shares.len(), 2);

        let writer_share = track.shares.iter().find(|s| s.person_id == writer.id).unwrap();
        assert_eq!(writer_share.values.share_of_monetization_of_copyrights, 50.0);
        assert_eq!(writer_share.values.share_of_monetization_of_related_rights, 0.0);

        assert_eq!(track.share_totals.copyrights, 50.0);
        assert_eq!(track.share_totals.related_rights, 30.0);
    }

    #[test]
    fn test_create_with_unknown_album() {
        let (c, _album, _writer, _singer) = seeded();
        let err = create::<Track>(&c.store, new_track(4040, "Lost"), &c.admin).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_create_with_unknown_share_person_rolls_back() {
        let (c, album, _writer, _singer) = seeded();
        let mut new = new_track(album.id, "Opener");
        new.author_rights = vec![entry(5050, 50.0, 100.0)];

        let err = create::<Track>(&c.store, new, &c.admin).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        let album: Album = get(&c.store, album.id, &c.admin).unwrap();
        assert!(album.track_ids.is_empty());
    }

    #[test]
    fn test_upsert_share_follows_edit_rules() {
        let (c, album, writer, _singer) = seeded();
        let track: Track = create(&c.store, new_track(album.id, "Opener"), &c.admin).unwrap();
        let values = ShareValues {
            share_of_monetization_of_copyrights: 25.0,
            ..ShareValues::default()
        };

        let err = upsert_share(&c.store, track.id, writer.id, values, &c.manager).unwrap_err();
        assert!(matches!(err, Error::Forbidden(_)));

        upsert_share(&c.store, track.id, writer.id, values, &c.admin).unwrap();
        let shares = list_shares(&c.store, track.id, &c.manager).unwrap();
        assert_eq!(shares.len(), 1);
        assert_eq!(shares[0].values, values);

        remove_share(&c.store, track.id, writer.id, &c.admin).unwrap();
        let err = remove_share(&c.store, track.id, writer.id, &c.admin).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_patch_moves_album_and_validates_percentages() {
        let (c, album, _writer, _singer) = seeded();
        let other: Album = create(&c.store, new_album("Second"), &c.admin).unwrap();
        let track: Track = create(&c.store, new_track(album.id, "Opener"), &c.admin).unwrap();

        let moved = TrackPatch {
            album_id: Some(other.id),
            has_video_clip: Some(true),
            ..TrackPatch::default()
        };
        let track: Track = update(&c.store, track.id, moved, &c.admin).unwrap();
        assert_eq!(track.album_id, other.id);
        assert!(track.flags.has_video_clip);

        let bad = TrackPatch {
            label_share_percentage: Some(140.0),
            ..TrackPatch::default()
        };
        let err = update::<Track>(&c.store, track.id, bad, &c.admin).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }
}
