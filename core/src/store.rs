use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::codec;
use crate::error::{Error, Result};
use crate::images::{FsImageSource, ImageStore};
use crate::models::{
    ImageRef, NewRecipe, Recipe, new_id, normalize_lines, validate_recipe_fields,
};

/// The authoritative recipe list, written through to a JSON file after every
/// mutation.
///
/// Mutations are applied to a copy and only adopted once the write succeeds,
/// so a failed write leaves the in-memory list as it was.
pub struct CollectionStore {
    path: PathBuf,
    images: ImageStore,
    recipes: Vec<Recipe>,
    load_warning: Option<String>,
}

impl CollectionStore {
    /// Load `path`. A missing or blank file is an empty collection; an
    /// unreadable one is moved aside to `<path>.corrupt` and also starts
    /// empty, with the reason kept in [`load_warning`](Self::load_warning).
    pub fn open(path: impl Into<PathBuf>, images: ImageStore) -> Result<Self> {
        let path = path.into();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(Error::io_at("read", &path, e)),
        };

        let (recipes, parse_error) = codec::deserialize_slice_or_empty(&bytes);
        let load_warning = match parse_error {
            Some(e) => {
                let backup = corrupt_backup_path(&path);
                fs::copy(&path, &backup).map_err(|io_err| Error::io_at("back up", &path, io_err))?;
                let msg = format!(
                    "{} could not be read and was set aside as {} ({e}); \
                     starting with an empty collection",
                    path.display(),
                    backup.display()
                );
                warn!("{msg}");
                Some(msg)
            }
            None => None,
        };

        let before = recipes.len();
        let recipes = dedup_by_id(recipes);
        if recipes.len() != before {
            warn!(
                "dropped {} recipes with duplicate ids while loading",
                before - recipes.len()
            );
        }
        debug!("loaded {} recipes from {}", recipes.len(), path.display());

        Ok(Self {
            path,
            images,
            recipes,
            load_warning,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    #[must_use]
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    #[must_use]
    pub fn list(&self) -> &[Recipe] {
        &self.recipes
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&Recipe> {
        self.get(id).ok_or_else(|| Error::not_found(id))
    }

    pub fn add(&mut self, draft: NewRecipe) -> Result<Recipe> {
        validate_recipe_fields(&draft.title, &draft.category)?;
        let id = match draft.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => new_id(),
        };
        if self.get(&id).is_some() {
            return Err(Error::DuplicateId(id));
        }

        let image = match &draft.image {
            Some(external) => Some(self.images.adopt(&id, external, &FsImageSource)?),
            None => None,
        };

        let recipe = Recipe {
            id,
            title: draft.title.trim().to_string(),
            category: draft.category.trim().to_string(),
            ingredients: normalize_lines(draft.ingredients),
            steps: normalize_lines(draft.steps),
            image: image.clone().map(ImageRef::Local),
            created_at: draft.created_at.unwrap_or_else(Utc::now),
            is_favorite: draft.is_favorite,
        };

        let mut next = self.recipes.clone();
        next.push(recipe.clone());
        if let Err(e) = self.commit(next) {
            if let Some(path) = &image {
                self.discard_adopted(path);
            }
            return Err(e);
        }
        info!("added recipe '{}' ({})", recipe.title, recipe.id);
        Ok(recipe)
    }

    /// Replace the record with the same id. `id` and `created_at` keep their
    /// stored values. Returns `None` when no such record exists.
    pub fn update(&mut self, recipe: Recipe) -> Result<Option<Recipe>> {
        validate_recipe_fields(&recipe.title, &recipe.category)?;
        let Some(idx) = self.recipes.iter().position(|r| r.same_id(&recipe)) else {
            debug!("update: no recipe with id {}", recipe.id);
            return Ok(None);
        };
        let current = &self.recipes[idx];
        let old_image = current.image.clone();

        // Any image other than the one already held gets copied in.
        let mut adopted: Option<PathBuf> = None;
        let image = match recipe.image {
            None => None,
            Some(ref same) if Some(same) == old_image.as_ref() => Some(same.clone()),
            Some(ImageRef::Local(external)) => {
                let owned = self.images.adopt(&current.id, &external, &FsImageSource)?;
                adopted = Some(owned.clone());
                Some(ImageRef::Local(owned))
            }
            Some(ImageRef::Archive(entry)) => {
                warn!("ignoring archive image reference {entry} outside an import");
                None
            }
        };

        let updated = Recipe {
            id: current.id.clone(),
            title: recipe.title.trim().to_string(),
            category: recipe.category.trim().to_string(),
            ingredients: normalize_lines(recipe.ingredients),
            steps: normalize_lines(recipe.steps),
            image,
            created_at: current.created_at,
            is_favorite: recipe.is_favorite,
        };

        let mut next = self.recipes.clone();
        next[idx] = updated.clone();
        if let Err(e) = self.commit(next) {
            if let Some(path) = &adopted {
                self.discard_adopted(path);
            }
            return Err(e);
        }

        if old_image != updated.image {
            self.release_image(old_image.as_ref());
        }
        debug!("updated recipe {}", updated.id);
        Ok(Some(updated))
    }

    pub fn toggle_favorite(&mut self, id: &str) -> Result<Option<Recipe>> {
        let Some(mut recipe) = self.get(id).cloned() else {
            return Ok(None);
        };
        recipe.is_favorite = !recipe.is_favorite;
        self.update(recipe)
    }

    /// Remove the record and its owned image. Returns `false` when the id is
    /// unknown, leaving everything untouched.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(idx) = self.recipes.iter().position(|r| r.id == id) else {
            debug!("delete: no recipe with id {id}");
            return Ok(false);
        };
        let mut next = self.recipes.clone();
        let removed = next.remove(idx);
        self.commit(next)?;
        self.release_image(removed.image.as_ref());
        info!("deleted recipe '{}' ({id})", removed.title);
        Ok(true)
    }

    /// Adopt `recipes` wholesale. Images of the discarded records are left
    /// on disk.
    pub fn import_replace(&mut self, recipes: Vec<Recipe>) -> Result<usize> {
        let next = dedup_by_id(recipes);
        let count = next.len();
        self.commit(next)?;
        info!("replaced collection with {count} imported recipes");
        Ok(count)
    }

    /// Append every incoming record whose id is new; colliding ids are
    /// skipped without comparing content. Returns how many were added.
    pub fn import_merge(&mut self, incoming: Vec<Recipe>) -> Result<usize> {
        let mut seen: HashSet<String> = self.recipes.iter().map(|r| r.id.clone()).collect();
        let mut next = self.recipes.clone();
        let mut added = 0;
        for recipe in incoming {
            if seen.insert(recipe.id.clone()) {
                next.push(recipe);
                added += 1;
            } else {
                debug!("merge: skipping existing id {}", recipe.id);
            }
        }
        self.commit(next)?;
        info!("merged {added} imported recipes");
        Ok(added)
    }

    fn commit(&mut self, next: Vec<Recipe>) -> Result<()> {
        let text = codec::serialize(&next)?;
        write_atomic(&self.path, &text)?;
        debug!("wrote {} recipes to {}", next.len(), self.path.display());
        self.recipes = next;
        Ok(())
    }

    fn discard_adopted(&self, path: &Path) {
        if let Err(e) = self.images.release(path) {
            warn!("could not remove copied image after failed write: {e}");
        }
    }

    fn release_image(&self, image: Option<&ImageRef>) {
        let Some(path) = image.and_then(ImageRef::local_path) else {
            return;
        };
        let still_used = self
            .recipes
            .iter()
            .any(|r| r.image.as_ref().and_then(ImageRef::local_path) == Some(path));
        if still_used {
            return;
        }
        if let Err(e) = self.images.release(path) {
            warn!("{e}");
        }
    }
}

fn dedup_by_id(recipes: Vec<Recipe>) -> Vec<Recipe> {
    let mut seen = HashSet::new();
    recipes
        .into_iter()
        .filter(|r| seen.insert(r.id.clone()))
        .collect()
}

fn corrupt_backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".corrupt");
    path.with_file_name(name)
}

fn write_atomic(path: &Path, text: &str) -> Result<()> {
    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    fs::write(&tmp, text).map_err(|e| Error::io_at("write", &tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io_at("replace", path, e))
}
