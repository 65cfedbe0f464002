//! The draft/approval workflow shared by every catalog entity.
//!
//! Admins create approved records directly; managers create drafts that only
//! they and admins can see until an admin approves or rejects them.

use chrono::Utc;
use rusqlite::{Connection, params};

use super::{Draftable, uniqueness};
use crate::error::{Error, Result};
use crate::store::{SqliteStore, format_datetime};
use crate::types::{Approval, Caller};

fn not_found<T: Draftable>() -> Error {
    Error::NotFound(format!("{} not found", T::NAME))
}

fn require_admin(caller: &Caller, action: &str) -> Result<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(Error::Forbidden(format!("Only admins can {action}")))
    }
}

/// Loads an entity the caller is allowed to see. Hidden drafts look absent.
pub(crate) fn load_visible<T: Draftable>(conn: &Connection, id: i64, caller: &Caller) -> Result<T> {
    let entity = T::load(conn, id)?.ok_or_else(not_found::<T>)?;
    if entity.approval().is_visible_to(caller) {
        Ok(entity)
    } else {
        Err(not_found::<T>())
    }
}

/// Approved records are admin-only; drafts are editable by their creator only.
pub(crate) fn ensure_editable<T: Draftable>(entity: &T, caller: &Caller) -> Result<()> {
    let approval = entity.approval();
    if approval.is_approved {
        if !caller.is_admin() {
            return Err(Error::Forbidden(format!(
                "Only admins can edit an approved {}",
                T::NAME.to_lowercase()
            )));
        }
    } else if !approval.is_owned_by(caller) {
        return Err(Error::Forbidden(
            "You can only edit your own drafts".to_string(),
        ));
    }
    Ok(())
}

fn mark_approved(conn: &Connection, table: &str, id: i64) -> Result<()> {
    conn.execute(
        &format!("UPDATE {table} SET is_approved = 1, updated_at = ?1 WHERE id = ?2"),
        params![format_datetime(&Utc::now()), id],
    )?;
    Ok(())
}

fn remove<T: Draftable>(conn: &Connection, entity: &T) -> Result<()> {
    T::before_remove(conn, entity)?;
    for dependent in T::DEPENDENTS {
        conn.execute(
            &format!(
                "DELETE FROM {} WHERE {} = ?1",
                dependent.table, dependent.column
            ),
            params![entity.id()],
        )?;
    }
    conn.execute(
        &format!("DELETE FROM {} WHERE id = ?1", T::TABLE),
        params![entity.id()],
    )?;
    Ok(())
}

/// Creates an entity with its links. Admin submissions are approved at once
/// and must not reuse an approved natural key; drafts are checked on approval.
pub fn create<T: Draftable>(store: &SqliteStore, new: T::New, caller: &Caller) -> Result<T> {
    T::validate_new(&new)?;

    let entity = store.transaction(move |tx| {
        let approval = Approval::for_creator(caller);
        if approval.is_approved {
            uniqueness::ensure_available(tx, T::TABLE, T::NAME, &T::new_keys(&new))?;
        }
        let id = T::insert(tx, new, &approval)?;
        T::load(tx, id)?.ok_or_else(not_found::<T>)
    })?;

    tracing::info!(
        "Created {} {} (approved: {}) by user {}",
        T::NAME,
        entity.id(),
        entity.approval().is_approved,
        caller.id
    );
    Ok(entity)
}

pub fn list_approved<T: Draftable>(store: &SqliteStore) -> Result<Vec<T>> {
    T::list(&store.conn(), true)
}

pub fn list_drafts<T: Draftable>(store: &SqliteStore, caller: &Caller) -> Result<Vec<T>> {
    require_admin(caller, "list drafts")?;
    T::list(&store.conn(), false)
}

pub fn get<T: Draftable>(store: &SqliteStore, id: i64, caller: &Caller) -> Result<T> {
    load_visible(&store.conn(), id, caller)
}

/// Applies a partial update. Link sets present in the patch are replaced
/// wholesale; natural keys of approved records are re-checked only when
/// their value changes.
pub fn update<T: Draftable>(
    store: &SqliteStore,
    id: i64,
    patch: T::Patch,
    caller: &Caller,
) -> Result<T> {
    store.transaction(move |tx| {
        let current = load_visible::<T>(tx, id, caller)?;
        ensure_editable(&current, caller)?;
        if current.approval().is_approved {
            uniqueness::ensure_available(tx, T::TABLE, T::NAME, &current.changed_keys(&patch))?;
        }
        T::apply(tx, current, patch)?;
        T::load(tx, id)?.ok_or_else(not_found::<T>)
    })
}

pub fn delete<T: Draftable>(store: &SqliteStore, id: i64, caller: &Caller) -> Result<()> {
    require_admin(caller, "delete catalog records")?;

    store.transaction(|tx| {
        let entity = T::load(tx, id)?.ok_or_else(not_found::<T>)?;
        remove(tx, &entity)
    })?;

    tracing::info!("Deleted {} {} by user {}", T::NAME, id, caller.id);
    Ok(())
}

/// Promotes a draft. Fails with `Conflict` if an approved record already
/// holds one of the draft's natural keys.
pub fn approve<T: Draftable>(store: &SqliteStore, id: i64, caller: &Caller) -> Result<T> {
    require_admin(caller, "approve drafts")?;

    let entity = store.transaction(|tx| {
        let draft = T::load(tx, id)?.ok_or_else(not_found::<T>)?;
        if draft.approval().is_approved {
            return Err(Error::InvalidState(format!(
                "{} {id} is already approved",
                T::NAME
            )));
        }
        uniqueness::ensure_available(tx, T::TABLE, T::NAME, &draft.keys())?;
        mark_approved(tx, T::TABLE, id)?;
        T::load(tx, id)?.ok_or_else(not_found::<T>)
    })?;

    tracing::info!("Approved {} {} by user {}", T::NAME, id, caller.id);
    Ok(entity)
}

/// Discards a draft together with its links.
pub fn reject<T: Draftable>(store: &SqliteStore, id: i64, caller: &Caller) -> Result<()> {
    require_admin(caller, "reject drafts")?;

    store.transaction(|tx| {
        let draft = T::load(tx, id)?.ok_or_else(not_found::<T>)?;
        if draft.approval().is_approved {
            return Err(Error::InvalidState(format!(
                "{} {id} is approved and cannot be rejected",
                T::NAME
            )));
        }
        remove(tx, &draft)
    })?;

    tracing::info!("Rejected {} draft {} by user {}", T::NAME, id, caller.id);
    Ok(())
}
