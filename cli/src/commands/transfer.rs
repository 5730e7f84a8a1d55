use std::path::Path;

use anyhow::{Context, Result};

use recipebox_core::{ImportMode, RecipeService};

use super::helpers::{find_recipe, json_error, prompt_confirm};

pub(crate) fn cmd_export(svc: &RecipeService, path: &Path, json: bool) -> Result<()> {
    let count = svc
        .export_archive(path)
        .with_context(|| format!("Failed to export to {}", path.display()))?;
    if json {
        println!(
            "{}",
            serde_json::json!({ "exported": count, "path": path.display().to_string() })
        );
    } else {
        println!("Exported {count} recipes to {}", path.display());
    }
    Ok(())
}

/// Write one recipe as a standalone JSON document, or print it when no
/// output path is given.
pub(crate) fn cmd_share(
    svc: &RecipeService,
    key: &str,
    output: Option<&Path>,
    json: bool,
) -> Result<()> {
    let Some(recipe) = find_recipe(svc, key)? else {
        if json {
            println!("{}", json_error(&format!("Recipe '{key}' not found")));
        } else {
            eprintln!("Recipe '{key}' not found");
        }
        std::process::exit(2);
    };
    let document = svc.share_recipe(&recipe.id)?;

    match output {
        Some(path) => {
            std::fs::write(path, &document)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "shared": recipe.id, "path": path.display().to_string() })
                );
            } else {
                let title = &recipe.title;
                println!("Wrote {title} to {}", path.display());
            }
        }
        None => println!("{document}"),
    }
    Ok(())
}

pub(crate) fn cmd_import(
    svc: &mut RecipeService,
    path: &Path,
    merge: bool,
    yes: bool,
    json: bool,
) -> Result<()> {
    let staged = svc
        .stage_import_file(path)
        .with_context(|| format!("Failed to read import file: {}", path.display()))?;

    if let Some(warning) = &staged.warning {
        eprintln!("Warning: {warning}");
    }

    let mode = if merge {
        ImportMode::Merge
    } else {
        ImportMode::Replace
    };

    if !yes {
        let count = staged.count;
        let current = svc.store().len();
        let question = match mode {
            ImportMode::Replace => format!(
                "Replace all {current} recipes with {count} from {}?",
                staged.source
            ),
            ImportMode::Merge => format!(
                "Merge {count} recipes from {} into your {current}?",
                staged.source
            ),
        };
        if !prompt_confirm(&question)? {
            svc.cancel_import();
            if json {
                println!("{}", serde_json::json!({ "cancelled": true }));
            } else {
                println!("Import cancelled.");
            }
            return Ok(());
        }
    }

    let summary = svc.confirm_import(mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Import complete.\n");
        println!("  Received: {}", summary.received);
        println!("  Added:    {}", summary.added);
        if mode == ImportMode::Merge {
            println!("  Skipped (already present): {}", summary.skipped);
        }
    }
    Ok(())
}
