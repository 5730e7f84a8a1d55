use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::archive;
use crate::codec;
use crate::error::{Error, Result};
use crate::images::{FsImageSource, ImageStore};
use crate::models::{NewRecipe, Recipe};
use crate::store::CollectionStore;
use crate::views::{self, CategoryCount};

pub const STORE_FILE_NAME: &str = "recipes.json";
pub const IMAGE_DIR_NAME: &str = "images";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportMode {
    Replace,
    Merge,
}

/// An import is read first and only applied after an explicit confirm.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ImportState {
    #[default]
    None,
    Pending {
        records: Vec<Recipe>,
        source: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct StagedImport {
    pub source: String,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub mode: ImportMode,
    pub received: usize,
    pub added: usize,
    pub skipped: usize,
}

/// Entry point for embedders: one per process, holding the collection, its
/// image storage, and any import waiting for confirmation.
pub struct RecipeService {
    store: CollectionStore,
    pending: ImportState,
}

impl RecipeService {
    /// Open (creating if needed) `<data_dir>/recipes.json` and
    /// `<data_dir>/images/`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .map_err(|e| Error::io_at("create data directory", data_dir, e))?;
        let images = ImageStore::open(data_dir.join(IMAGE_DIR_NAME))?;
        let store = CollectionStore::open(store_path(data_dir), images)?;
        Ok(Self {
            store,
            pending: ImportState::None,
        })
    }

    #[must_use]
    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    #[must_use]
    pub fn load_warning(&self) -> Option<&str> {
        self.store.load_warning()
    }

    // --- Mutations ---

    pub fn add(&mut self, draft: NewRecipe) -> Result<Recipe> {
        self.store.add(draft)
    }

    pub fn update(&mut self, recipe: Recipe) -> Result<Option<Recipe>> {
        self.store.update(recipe)
    }

    pub fn toggle_favorite(&mut self, id: &str) -> Result<Option<Recipe>> {
        self.store.toggle_favorite(id)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool> {
        self.store.delete(id)
    }

    pub fn get(&self, id: &str) -> Result<&Recipe> {
        self.store.require(id)
    }

    // --- Views ---

    #[must_use]
    pub fn all_sorted(&self) -> Vec<&Recipe> {
        views::sorted_by_title(self.store.list())
    }

    #[must_use]
    pub fn favorites(&self) -> Vec<&Recipe> {
        views::favorites(self.store.list())
    }

    #[must_use]
    pub fn by_category(&self, category: &str) -> Vec<&Recipe> {
        views::in_category(self.store.list(), category)
    }

    #[must_use]
    pub fn categories(&self) -> Vec<CategoryCount> {
        views::categories(self.store.list())
    }

    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<&Recipe> {
        views::most_recent(self.store.list(), limit)
    }

    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Recipe> {
        views::search(self.store.list(), query)
    }

    // --- Export ---

    pub fn export_archive_bytes(&self) -> Result<Vec<u8>> {
        archive::pack(self.store.list(), &FsImageSource)
    }

    /// Write the whole collection as a zip to `path`. Returns the number of
    /// recipes written.
    pub fn export_archive(&self, path: &Path) -> Result<usize> {
        let bytes = self.export_archive_bytes()?;
        fs::write(path, bytes).map_err(|e| Error::io_at("write export", path, e))?;
        info!(
            "exported {} recipes to {}",
            self.store.len(),
            path.display()
        );
        Ok(self.store.len())
    }

    /// Standalone JSON for one recipe.
    pub fn share_recipe(&self, id: &str) -> Result<String> {
        codec::serialize_single(self.store.require(id)?)
    }

    // --- Import ---

    #[must_use]
    pub fn pending_import(&self) -> &ImportState {
        &self.pending
    }

    /// Read an archive or JSON document and hold it for confirmation,
    /// replacing anything already staged. Unparseable input stages an empty
    /// set and reports why in `warning`.
    pub fn stage_import_bytes(&mut self, bytes: &[u8], source: &str) -> Result<StagedImport> {
        let (records, warning) = match archive::unpack(bytes, self.store.images()) {
            Ok(records) => (records, None),
            Err(e) if e.is_parse_error() => {
                warn!("import from {source} could not be read: {e}");
                (Vec::new(), Some(e.to_string()))
            }
            Err(e) => return Err(e),
        };
        let staged = StagedImport {
            source: source.to_string(),
            count: records.len(),
            warning,
        };
        info!("staged {} recipes from {source}", staged.count);
        self.pending = ImportState::Pending {
            records,
            source: source.to_string(),
        };
        Ok(staged)
    }

    pub fn stage_import_file(&mut self, path: &Path) -> Result<StagedImport> {
        let bytes = fs::read(path).map_err(|e| Error::io_at("read import", path, e))?;
        self.stage_import_bytes(&bytes, &path.display().to_string())
    }

    /// Apply the staged import. On failure the import stays staged and the
    /// collection is unchanged.
    pub fn confirm_import(&mut self, mode: ImportMode) -> Result<ImportSummary> {
        let ImportState::Pending { records, source } = std::mem::take(&mut self.pending) else {
            return Err(Error::NoPendingImport);
        };
        let received = records.len();
        let result = match mode {
            ImportMode::Replace => self.store.import_replace(records.clone()),
            ImportMode::Merge => self.store.import_merge(records.clone()),
        };
        match result {
            Ok(added) => {
                info!("confirmed {mode:?} import from {source}");
                Ok(ImportSummary {
                    mode,
                    received,
                    added,
                    skipped: received.saturating_sub(added),
                })
            }
            Err(e) => {
                self.pending = ImportState::Pending { records, source };
                Err(e)
            }
        }
    }

    /// Drop the staged import. Returns whether anything was staged.
    pub fn cancel_import(&mut self) -> bool {
        matches!(
            std::mem::take(&mut self.pending),
            ImportState::Pending { .. }
        )
    }
}

/// `<data_dir>/recipes.json`
#[must_use]
fn store_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STORE_FILE_NAME)
}
