use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Prefix marking an image reference that points into an export archive.
pub const ARCHIVE_PREFIX: &str = "archive:";

/// Where a recipe's image bytes live.
///
/// On the wire both variants are plain strings; archive entries carry the
/// [`ARCHIVE_PREFIX`] marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    /// A file on the local filesystem, either in private image storage or
    /// somewhere outside it.
    Local(PathBuf),
    /// An entry inside an export archive, e.g. `images/<id>.jpg`.
    Archive(String),
}

impl ImageRef {
    /// Parse the wire form. Null, blank, and a bare marker all mean "no image".
    #[must_use]
    pub fn from_wire(value: Option<&str>) -> Option<Self> {
        let raw = value?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        // Local paths are kept verbatim; only the marker check ignores padding.
        match trimmed.strip_prefix(ARCHIVE_PREFIX) {
            Some("") => None,
            Some(entry) => Some(Self::Archive(entry.to_string())),
            None => Some(Self::Local(PathBuf::from(raw))),
        }
    }

    #[must_use]
    pub fn to_wire(&self) -> String {
        match self {
            Self::Local(path) => path.to_string_lossy().into_owned(),
            Self::Archive(entry) => format!("{ARCHIVE_PREFIX}{entry}"),
        }
    }

    #[must_use]
    pub fn local_path(&self) -> Option<&Path> {
        match self {
            Self::Local(path) => Some(path),
            Self::Archive(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub category: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub image: Option<ImageRef>,
    pub created_at: DateTime<Utc>,
    pub is_favorite: bool,
}

impl Recipe {
    #[must_use]
    pub fn same_id(&self, other: &Recipe) -> bool {
        self.id == other.id
    }
}

/// Input for `CollectionStore::add`. `id` and `created_at` are assigned when
/// left unset; `image` is an external file that gets copied into private
/// storage.
#[derive(Debug, Clone, Default)]
pub struct NewRecipe {
    pub id: Option<String>,
    pub title: String,
    pub category: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub image: Option<PathBuf>,
    pub created_at: Option<DateTime<Utc>>,
    pub is_favorite: bool,
}

// --- Transfer objects ---

/// On-disk / on-the-wire shape of a recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeRecord {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub category: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_favorite: bool,
}

impl From<&Recipe> for RecipeRecord {
    fn from(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.clone(),
            title: recipe.title.clone(),
            category: recipe.category.clone(),
            ingredients: recipe.ingredients.clone(),
            steps: recipe.steps.clone(),
            image: recipe.image.as_ref().map(ImageRef::to_wire),
            created_at: recipe.created_at,
            is_favorite: recipe.is_favorite,
        }
    }
}

impl From<RecipeRecord> for Recipe {
    fn from(record: RecipeRecord) -> Self {
        let id = if record.id.trim().is_empty() {
            new_id()
        } else {
            record.id
        };
        Self {
            id,
            title: record.title,
            category: record.category,
            ingredients: record.ingredients,
            steps: record.steps,
            image: ImageRef::from_wire(record.image.as_deref()),
            created_at: record.created_at,
            is_favorite: record.is_favorite,
        }
    }
}

#[must_use]
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Title and category are required and must not be blank.
pub fn validate_recipe_fields(title: &str, category: &str) -> Result<()> {
    if title.trim().is_empty() {
        return Err(Error::Invalid("title must not be empty".to_string()));
    }
    if category.trim().is_empty() {
        return Err(Error::Invalid("category must not be empty".to_string()));
    }
    Ok(())
}

/// Trim each line and drop the blank ones, keeping order.
#[must_use]
pub fn normalize_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}
