//! The draft/approval catalog.
//!
//! Every catalog entity (person, artist, album, track) implements
//! [`Draftable`], and the generic operations in [`lifecycle`] supply the
//! shared create/approve/reject/update/delete workflow on top of it.

mod album;
mod artist;
pub mod lifecycle;
pub mod links;
mod person;
pub mod shares;
mod track;
pub mod uniqueness;

#[cfg(test)]
pub(crate) mod testing;

use rusqlite::{Connection, Row};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use lifecycle::{approve, create, delete, get, list_approved, list_drafts, reject, update};
pub use track::{list_shares, remove_share, upsert_share};
pub use uniqueness::NaturalKey;

use crate::error::Result;
use crate::types::Approval;

/// A row in another table that belongs to an entity and goes away with it.
#[derive(Debug, Clone, Copy)]
pub struct Dependent {
    pub table: &'static str,
    pub column: &'static str,
}

/// A catalog entity that goes through the draft/approval workflow.
pub trait Draftable: Serialize + Sized + Send + 'static {
    /// Display name used in messages, e.g. "Person".
    const NAME: &'static str;
    const TABLE: &'static str;
    /// URL segment the entity is served under.
    const PATH: &'static str;
    const DEPENDENTS: &'static [Dependent];

    type New: DeserializeOwned + Send + 'static;
    type Patch: DeserializeOwned + Send + 'static;

    fn id(&self) -> i64;
    fn approval(&self) -> &Approval;

    fn load(conn: &Connection, id: i64) -> Result<Option<Self>>;
    fn list(conn: &Connection, approved: bool) -> Result<Vec<Self>>;

    /// Field-level checks on a create payload.
    fn validate_new(new: &Self::New) -> Result<()>;

    /// Natural keys a create payload would claim.
    fn new_keys(new: &Self::New) -> Vec<NaturalKey<'_>>;
    /// Natural keys the stored entity holds.
    fn keys(&self) -> Vec<NaturalKey<'_>>;
    /// Natural keys a patch would change to a new value.
    fn changed_keys<'a>(&self, patch: &'a Self::Patch) -> Vec<NaturalKey<'a>>;

    /// Inserts the entity with its links and returns the new id.
    fn insert(conn: &Connection, new: Self::New, approval: &Approval) -> Result<i64>;
    /// Writes patched fields and replaces any link set the patch carries.
    fn apply(conn: &Connection, current: Self, patch: Self::Patch) -> Result<()>;

    /// Refuses removal when other entities still depend on this one.
    fn before_remove(_conn: &Connection, _entity: &Self) -> Result<()> {
        Ok(())
    }
}

pub(crate) fn approval_from_row(row: &Row<'_>, index: usize) -> rusqlite::Result<Approval> {
    Ok(Approval {
        is_approved: row.get(index)?,
        created_by_user_id: row.get(index + 1)?,
    })
}
