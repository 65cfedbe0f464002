//! Helpers for partial updates.
//!
//! A patch field of type `Option<Option<T>>` distinguishes a missing key
//! (`None`) from an explicit `null` (`Some(None)`).

use serde::{Deserialize, Deserializer};

/// Deserializes a present key, `null` included, as `Some(..)`.
/// Pair with `#[serde(default)]` so a missing key stays `None`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Overwrites `target` when the patch carries a value.
pub fn merge<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
