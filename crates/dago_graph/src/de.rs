//! Deserialization helpers for documents written by other producers.

use serde::{Deserialize, Deserializer};

/// Reads an explicit `null` as the type's default.
///
/// `#[serde(default)]` only covers a missing key; producers that write
/// empty collections as `null` need this as well.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
