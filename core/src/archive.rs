//! Zip export format: one `recipes.json` manifest plus the images it
//! references under `images/`.
//!
//! Image references inside the manifest use the `archive:<entry>` form. A
//! container that is not a zip, or a zip without a manifest, is read as plain
//! JSON instead so older exports and single-recipe shares still import.

use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::path::Path;

use tracing::{debug, info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::codec;
use crate::error::{Error, Result};
use crate::images::{ImageSink, ImageSource, image_extension, sanitize_stem};
use crate::models::{ImageRef, Recipe, RecipeRecord};

pub const MANIFEST_NAME: &str = "recipes.json";
pub const IMAGE_DIR: &str = "images";

/// Bundle `recipes` and every image that can be read through `source`.
///
/// An image that fails to read is dropped from that record; the export
/// itself carries on.
pub fn pack(recipes: &[Recipe], source: &dyn ImageSource) -> Result<Vec<u8>> {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut used_names: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(recipes.len());
    let mut packed_images = 0usize;

    for recipe in recipes {
        let mut record = RecipeRecord::from(recipe);
        record.image = None;

        match &recipe.image {
            Some(ImageRef::Local(path)) => match source.read_image(path) {
                Ok(bytes) => {
                    let entry = unique_entry_name(&recipe.id, path, &mut used_names);
                    zip.start_file(entry.as_str(), options)?;
                    zip.write_all(&bytes)
                        .map_err(|e| Error::io(format!("failed to write {entry}"), e))?;
                    record.image = Some(ImageRef::Archive(entry).to_wire());
                    packed_images += 1;
                }
                Err(e) => {
                    warn!(
                        "skipping image for '{}' ({}): {e}",
                        recipe.title,
                        path.display()
                    );
                }
            },
            Some(ImageRef::Archive(entry)) => {
                warn!(
                    "skipping image for '{}': {entry} is not available locally",
                    recipe.title
                );
            }
            None => {}
        }

        records.push(record);
    }

    let manifest = codec::serialize_records(&records)?;
    zip.start_file(MANIFEST_NAME, options)?;
    zip.write_all(manifest.as_bytes())
        .map_err(|e| Error::io(format!("failed to write {MANIFEST_NAME}"), e))?;

    let bytes = zip.finish()?.into_inner();
    info!(
        "packed {} recipes and {packed_images} images ({} bytes)",
        records.len(),
        bytes.len()
    );
    Ok(bytes)
}

/// Read an export produced by [`pack`], writing its images through `sink`.
///
/// Falls back to [`codec::deserialize_slice`] when `bytes` is not a zip or
/// holds no manifest.
pub fn unpack(bytes: &[u8], sink: &dyn ImageSink) -> Result<Vec<Recipe>> {
    if let Some(recipes) = unpack_archive(bytes, sink)? {
        return Ok(recipes);
    }
    debug!("input is not a recipe archive; reading it as plain JSON");
    codec::deserialize_slice(bytes)
}

fn unpack_archive(bytes: &[u8], sink: &dyn ImageSink) -> Result<Option<Vec<Recipe>>> {
    let Ok(mut archive) = ZipArchive::new(Cursor::new(bytes)) else {
        return Ok(None);
    };

    let mut manifest: Option<Vec<u8>> = None;
    let mut images: HashMap<String, std::path::PathBuf> = HashMap::new();

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().to_string();

        if is_image_entry(&name) {
            let mut buf = Vec::new();
            if let Err(e) = entry.read_to_end(&mut buf) {
                warn!("skipping unreadable archive entry {name}: {e}");
                continue;
            }
            let entry_path = Path::new(&name);
            let stem = entry_path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("image");
            match sink.write_image(stem, &image_extension(entry_path), &buf) {
                Ok(path) => {
                    images.insert(name, path);
                }
                Err(e) => warn!("failed to store image {name}: {e}"),
            }
        } else if is_manifest_entry(&name, manifest.is_some()) {
            let mut buf = Vec::new();
            entry
                .read_to_end(&mut buf)
                .map_err(|e| Error::io(format!("failed to read {name}"), e))?;
            manifest = Some(buf);
        }
    }

    let Some(manifest) = manifest else {
        return Ok(None);
    };

    let recipes = codec::deserialize_records(&manifest)?
        .into_iter()
        .map(|record| resolve_image(record, &images))
        .collect::<Vec<_>>();
    info!(
        "unpacked {} recipes and {} images",
        recipes.len(),
        images.len()
    );
    Ok(Some(recipes))
}

fn resolve_image(
    record: RecipeRecord,
    images: &HashMap<String, std::path::PathBuf>,
) -> Recipe {
    let mut recipe = Recipe::from(record);
    if let Some(ImageRef::Archive(entry)) = &recipe.image {
        recipe.image = match images.get(entry) {
            Some(path) => Some(ImageRef::Local(path.clone())),
            None => {
                warn!(
                    "archive has no entry {entry} for '{}'; importing without image",
                    recipe.title
                );
                None
            }
        };
    }
    recipe
}

fn is_image_entry(name: &str) -> bool {
    name.strip_prefix(IMAGE_DIR)
        .and_then(|rest| rest.strip_prefix('/'))
        .is_some_and(|file| !file.is_empty())
}

/// `recipes.json` wins; any other top-level JSON file is accepted when no
/// manifest has been seen yet.
fn is_manifest_entry(name: &str, have_manifest: bool) -> bool {
    if name == MANIFEST_NAME {
        return true;
    }
    !have_manifest && !name.contains('/') && name.to_ascii_lowercase().ends_with(".json")
}

fn unique_entry_name(id: &str, path: &Path, used: &mut HashSet<String>) -> String {
    let stem = sanitize_stem(id);
    let ext = image_extension(path);
    let mut name = format!("{IMAGE_DIR}/{stem}.{ext}");
    let mut n = 1;
    while !used.insert(name.clone()) {
        name = format!("{IMAGE_DIR}/{stem}-{n}.{ext}");
        n += 1;
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::cell::RefCell;
    use std::io;
    use std::path::PathBuf;

    /// Serves images from memory, keyed by path.
    struct MemorySource {
        files: HashMap<PathBuf, Vec<u8>>,
    }

    impl ImageSource for MemorySource {
        fn read_image(&self, path: &Path) -> io::Result<Vec<u8>> {
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such image"))
        }
    }

    /// Records what it was asked to write and hands back fake paths.
    #[derive(Default)]
    struct MemorySink {
        written: RefCell<Vec<(String, String, Vec<u8>)>>,
    }

    impl ImageSink for MemorySink {
        fn write_image(&self, stem: &str, ext: &str, bytes: &[u8]) -> io::Result<PathBuf> {
            self.written
                .borrow_mut()
                .push((stem.to_string(), ext.to_string(), bytes.to_vec()));
            Ok(PathBuf::from(format!("/private/images/{stem}.{ext}")))
        }
    }

    fn recipe(id: &str, image: Option<&str>) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: format!("Recipe {id}"),
            category: "Test".to_string(),
            ingredients: vec!["a".to_string(), "b".to_string()],
            steps: vec!["one".to_string()],
            image: image.map(|p| ImageRef::Local(PathBuf::from(p))),
            created_at: Utc::now(),
            is_favorite: id == "r2",
        }
    }

    fn source() -> MemorySource {
        let mut files = HashMap::new();
        files.insert(PathBuf::from("/ext/one.png"), b"png-one".to_vec());
        files.insert(PathBuf::from("/ext/two.jpg"), b"jpg-two".to_vec());
        MemorySource { files }
    }

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let archive = ZipArchive::new(Cursor::new(bytes)).unwrap();
        archive.file_names().map(String::from).collect()
    }

    #[test]
    fn test_pack_then_unpack_keeps_resolvable_images() {
        // 4 records, 2 with images that resolve, 1 pointing at a missing file.
        let recipes = vec![
            recipe("r1", Some("/ext/one.png")),
            recipe("r2", None),
            recipe("r3", Some("/ext/two.jpg")),
            recipe("r4", Some("/ext/missing.jpg")),
        ];
        let bytes = pack(&recipes, &source()).unwrap();

        let mut names = entry_names(&bytes);
        names.sort();
        assert_eq!(names, vec!["images/r1.png", "images/r3.jpg", "recipes.json"]);

        let sink = MemorySink::default();
        let back = unpack(&bytes, &sink).unwrap();
        assert_eq!(back.len(), 4);
        assert_eq!(back.iter().filter(|r| r.image.is_some()).count(), 2);
        assert_eq!(
            back[0].image,
            Some(ImageRef::Local(PathBuf::from("/private/images/r1.png")))
        );
        assert!(back[1].image.is_none());
        assert!(back[3].image.is_none());
        assert!(back[1].is_favorite);
        assert_eq!(back[2].ingredients, recipes[2].ingredients);

        let written = sink.written.borrow();
        assert_eq!(written.len(), 2);
        assert!(
            written
                .iter()
                .any(|(stem, ext, data)| stem == "r3" && ext == "jpg" && data == b"jpg-two")
        );
    }

    #[test]
    fn test_manifest_uses_archive_markers() {
        let bytes = pack(&[recipe("r1", Some("/ext/one.png"))], &source()).unwrap();
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut text = String::new();
        archive
            .by_name(MANIFEST_NAME)
            .unwrap()
            .read_to_string(&mut text)
            .unwrap();
        let records: Vec<RecipeRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(records[0].image.as_deref(), Some("archive:images/r1.png"));
    }

    #[test]
    fn test_unpack_missing_entry_is_absent_not_fatal() {
        let options = SimpleFileOptions::default();
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file(MANIFEST_NAME, options).unwrap();
        zip.write_all(
            br#"[
                {"id": "a", "title": "A", "category": "C", "image": "archive:images/gone.png"},
                {"id": "b", "title": "B", "category": "C", "image": "/sdcard/b.jpg"},
                {"id": "c", "title": "C", "category": "C", "image": ""}
            ]"#,
        )
        .unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        let back = unpack(&bytes, &MemorySink::default()).unwrap();
        assert_eq!(back.len(), 3);
        assert!(back[0].image.is_none());
        assert_eq!(
            back[1].image,
            Some(ImageRef::Local(PathBuf::from("/sdcard/b.jpg")))
        );
        assert!(back[2].image.is_none());
    }

    #[test]
    fn test_unpack_plain_json_fallback() {
        let json = codec::serialize(&[recipe("r1", None), recipe("r2", None)]).unwrap();
        let back = unpack(json.as_bytes(), &MemorySink::default()).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(back[1].id, "r2");
    }

    #[test]
    fn test_unpack_single_record_share() {
        let json = codec::serialize_single(&recipe("r9", Some("/ext/one.png"))).unwrap();
        let back = unpack(json.as_bytes(), &MemorySink::default()).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[0].id, "r9");
    }

    #[test]
    fn test_unpack_zip_without_manifest_falls_back() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("images/x.png", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"x").unwrap();
        let bytes = zip.finish().unwrap().into_inner();

        // Not JSON either, so the fallback reports a parse error.
        let err = unpack(&bytes, &MemorySink::default()).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_unpack_garbage_is_parse_error() {
        let err = unpack(b"\x00\x01garbage", &MemorySink::default()).unwrap_err();
        assert!(err.is_parse_error());
    }

    #[test]
    fn test_unpack_empty_input_is_empty() {
        assert!(unpack(b"", &MemorySink::default()).unwrap().is_empty());
    }

    #[test]
    fn test_pack_empty_collection() {
        let bytes = pack(&[], &source()).unwrap();
        assert_eq!(entry_names(&bytes), vec![MANIFEST_NAME]);
        assert!(unpack(&bytes, &MemorySink::default()).unwrap().is_empty());
    }

    #[test]
    fn test_alternate_manifest_name_is_accepted() {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("backup.json", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(br#"[{"id": "a", "title": "A", "category": "C"}]"#)
            .unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        assert_eq!(unpack(&bytes, &MemorySink::default()).unwrap().len(), 1);
    }

    #[test]
    fn test_is_image_entry() {
        assert!(is_image_entry("images/a.png"));
        assert!(!is_image_entry("images/"));
        assert!(!is_image_entry("imagesa.png"));
        assert!(!is_image_entry("recipes.json"));
    }
}
