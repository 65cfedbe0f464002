//! Catalog records and their create/patch payloads.
//!
//! Expenses, budgets and share percentages are hand-entered `f64` values,
//! range-checked on write.
//! Platform report amounts are exact decimals (see [`super::UsageRow`]).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::Caller;
use super::patch::nullable;

/// Draft/approval state shared by every catalog entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Approval {
    pub is_approved: bool,
    pub created_by_user_id: Option<i64>,
}

impl Approval {
    /// Admin submissions are approved immediately, everything else starts as a draft.
    #[must_use]
    pub fn for_creator(caller: &Caller) -> Self {
        Self {
            is_approved: caller.is_admin(),
            created_by_user_id: Some(caller.id),
        }
    }

    #[must_use]
    pub fn is_owned_by(&self, caller: &Caller) -> bool {
        self.created_by_user_id == Some(caller.id)
    }

    #[must_use]
    pub fn is_visible_to(&self, caller: &Caller) -> bool {
        self.is_approved || caller.is_admin() || self.is_owned_by(caller)
    }
}

// People

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub marketing_expenses: Option<f64>,
    pub advance_expenses: Option<f64>,
    #[serde(flatten)]
    pub approval: Approval,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
    pub last_name: String,
    pub first_name: String,
    pub middle_name: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub marketing_expenses: Option<f64>,
    pub advance_expenses: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PersonPatch {
    pub last_name: Option<String>,
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub middle_name: Option<Option<String>>,
    pub email: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub marketing_expenses: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub advance_expenses: Option<Option<f64>>,
}

// Artists

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub isni: Option<String>,
    pub marketing_expenses: Option<f64>,
    pub advance_expenses: Option<f64>,
    pub member_ids: Vec<i64>,
    #[serde(flatten)]
    pub approval: Approval,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewArtist {
    pub name: String,
    pub isni: Option<String>,
    pub marketing_expenses: Option<f64>,
    pub advance_expenses: Option<f64>,
    #[serde(default)]
    pub member_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtistPatch {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub isni: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub marketing_expenses: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub advance_expenses: Option<Option<f64>>,
    pub member_ids: Option<Vec<i64>>,
}

// Albums

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub album_type: String,
    pub release_date: Option<NaiveDate>,
    pub upc: Option<String>,
    pub isrc: Option<String>,
    pub marketing_budget: Option<f64>,
    pub advance: Option<f64>,
    pub aggregator: Option<String>,
    pub version: Option<String>,
    pub subgenre: Option<String>,
    #[serde(flatten)]
    pub sites: DistributionSites,
    pub artist_ids: Vec<i64>,
    pub track_ids: Vec<i64>,
    #[serde(flatten)]
    pub approval: Approval,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Free-form notes about placement on individual distribution platforms.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSites {
    pub yoga: Option<String>,
    pub zaycev: Option<String>,
    pub additional_sites: Option<String>,
    pub zaycev_star: Option<String>,
    pub synclab_star: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewAlbum {
    pub title: String,
    #[serde(rename = "type")]
    pub album_type: String,
    pub release_date: Option<NaiveDate>,
    pub upc: Option<String>,
    pub isrc: Option<String>,
    pub marketing_budget: Option<f64>,
    pub advance: Option<f64>,
    pub aggregator: Option<String>,
    pub version: Option<String>,
    pub subgenre: Option<String>,
    #[serde(flatten)]
    pub sites: DistributionSites,
    #[serde(default)]
    pub artist_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AlbumPatch {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub album_type: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub release_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "nullable")]
    pub upc: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub isrc: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub marketing_budget: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub advance: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub aggregator: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub version: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub subgenre: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub yoga: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub zaycev: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub additional_sites: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub zaycev_star: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub synclab_star: Option<Option<String>>,
    pub artist_ids: Option<Vec<i64>>,
}

// Tracks

pub const DEFAULT_LABEL_SHARE_PERCENTAGE: f64 = 20.0;

fn default_label_share() -> f64 {
    DEFAULT_LABEL_SHARE_PERCENTAGE
}

/// Label-side royalty percentages carried on a track.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackRights {
    pub scope_of_copyright: Option<f64>,
    pub scope_of_related_rights: Option<f64>,
    pub neighboring_rights_share: Option<f64>,
    pub label_rights_share: Option<f64>,
    pub label_monetization_share: Option<f64>,
}

/// Production add-ons delivered with a track.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionFlags {
    #[serde(default)]
    pub is_ringtone_added: bool,
    #[serde(default)]
    pub has_video_clip: bool,
    #[serde(default)]
    pub is_lyrics_added: bool,
    #[serde(default)]
    pub is_karaoke_sync_added: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    pub id: i64,
    pub album_id: i64,
    pub title: String,
    pub isrc: Option<String>,
    pub genre: Option<String>,
    pub music_authors: Option<String>,
    pub lyrics_authors: Option<String>,
    pub copyright: Option<String>,
    pub related_rights: Option<String>,
    pub label_share_percentage: f64,
    #[serde(flatten)]
    pub rights: TrackRights,
    pub marketing_expenses: Option<f64>,
    pub advance_expenses: Option<f64>,
    #[serde(flatten)]
    pub flags: ProductionFlags,
    pub artist_ids: Vec<i64>,
    pub shares: Vec<TrackPersonShare>,
    pub share_totals: ShareTotals,
    #[serde(flatten)]
    pub approval: Approval,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTrack {
    pub album_id: i64,
    pub title: String,
    pub isrc: Option<String>,
    pub genre: Option<String>,
    pub music_authors: Option<String>,
    pub lyrics_authors: Option<String>,
    pub copyright: Option<String>,
    pub related_rights: Option<String>,
    #[serde(default = "default_label_share")]
    pub label_share_percentage: f64,
    #[serde(flatten)]
    pub rights: TrackRights,
    pub marketing_expenses: Option<f64>,
    pub advance_expenses: Option<f64>,
    #[serde(flatten)]
    pub flags: ProductionFlags,
    #[serde(default)]
    pub artist_ids: Vec<i64>,
    #[serde(default)]
    pub author_rights: Vec<ShareEntry>,
    #[serde(default)]
    pub neighboring_rights: Vec<ShareEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackPatch {
    pub album_id: Option<i64>,
    pub title: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub isrc: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub genre: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub music_authors: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub lyrics_authors: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub copyright: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub related_rights: Option<Option<String>>,
    pub label_share_percentage: Option<f64>,
    #[serde(default, deserialize_with = "nullable")]
    pub scope_of_copyright: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub scope_of_related_rights: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub neighboring_rights_share: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub label_rights_share: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub label_monetization_share: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub marketing_expenses: Option<Option<f64>>,
    #[serde(default, deserialize_with = "nullable")]
    pub advance_expenses: Option<Option<f64>>,
    pub is_ringtone_added: Option<bool>,
    pub has_video_clip: Option<bool>,
    pub is_lyrics_added: Option<bool>,
    pub is_karaoke_sync_added: Option<bool>,
    pub artist_ids: Option<Vec<i64>>,
}

// Royalty shares

/// Which side of a track's rights a share entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RightsCategory {
    /// Copyright in the composition and lyrics.
    Author,
    /// Related rights in the recording and performance.
    Neighboring,
}

/// One rights-holder entry submitted with a track.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ShareEntry {
    pub person_id: i64,
    pub share: f64,
    pub licensor_share: f64,
}

/// The four percentages held by a (track, person) share row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareValues {
    #[serde(default)]
    pub share_of_monetization_of_copyrights: f64,
    #[serde(default)]
    pub copyrights: f64,
    #[serde(default)]
    pub share_of_monetization_of_related_rights: f64,
    #[serde(default)]
    pub related_rights: f64,
}

impl ShareValues {
    /// Builds the row for a single-category entry; the other category is zeroed.
    #[must_use]
    pub fn from_entry(category: RightsCategory, entry: &ShareEntry) -> Self {
        match category {
            RightsCategory::Author => Self {
                share_of_monetization_of_copyrights: entry.share,
                copyrights: entry.licensor_share,
                ..Self::default()
            },
            RightsCategory::Neighboring => Self {
                share_of_monetization_of_related_rights: entry.share,
                related_rights: entry.licensor_share,
                ..Self::default()
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackPersonShare {
    pub track_id: i64,
    pub person_id: i64,
    #[serde(flatten)]
    pub values: ShareValues,
}

/// Per-track sums of the monetization shares across all persons.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ShareTotals {
    pub copyrights: f64,
    pub related_rights: f64,
}
