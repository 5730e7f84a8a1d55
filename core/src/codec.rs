//! JSON serialization of recipe collections.
//!
//! Everything is written as an array of [`RecipeRecord`]s. Reading also
//! accepts a single record object, which is the shape used to share one
//! recipe.

use tracing::warn;

use crate::error::{Error, Result};
use crate::models::{Recipe, RecipeRecord};

pub fn serialize(recipes: &[Recipe]) -> Result<String> {
    let records: Vec<RecipeRecord> = recipes.iter().map(RecipeRecord::from).collect();
    serialize_records(&records)
}

pub fn serialize_records(records: &[RecipeRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Blank input yields an empty collection; malformed input is `Error::Parse`.
pub fn deserialize(text: &str) -> Result<Vec<Recipe>> {
    deserialize_slice(text.as_bytes())
}

pub fn deserialize_slice(bytes: &[u8]) -> Result<Vec<Recipe>> {
    Ok(deserialize_records(bytes)?
        .into_iter()
        .map(Recipe::from)
        .collect())
}

pub fn deserialize_records(bytes: &[u8]) -> Result<Vec<RecipeRecord>> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes).trim_ascii();
    match bytes.first() {
        None => Ok(Vec::new()),
        Some(b'{') => Ok(vec![serde_json::from_slice::<RecipeRecord>(bytes)?]),
        Some(_) => Ok(serde_json::from_slice::<Vec<RecipeRecord>>(bytes)?),
    }
}

/// Like [`deserialize_slice`], but a parse failure becomes an empty
/// collection plus the error, for callers that must keep going. Bytes that
/// are not valid UTF-8 count as a parse failure.
#[must_use]
pub fn deserialize_slice_or_empty(bytes: &[u8]) -> (Vec<Recipe>, Option<Error>) {
    match deserialize_slice(bytes) {
        Ok(recipes) => (recipes, None),
        Err(e) => {
            warn!("discarding unreadable recipe data: {e}");
            (Vec::new(), Some(e))
        }
    }
}

/// Standalone document for sharing one recipe. The image is left out since a
/// local path means nothing on another device.
pub fn serialize_single(recipe: &Recipe) -> Result<String> {
    let mut record = RecipeRecord::from(recipe);
    record.image = None;
    Ok(serde_json::to_string_pretty(&record)?)
}
