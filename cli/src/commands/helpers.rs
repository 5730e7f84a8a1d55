use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, object::Columns},
};

use recipebox_core::RecipeService;
use recipebox_core::models::{Recipe, RecipeRecord};

/// Look a recipe up by id, unique id prefix, or exact title (ignoring case).
pub(crate) fn find_recipe<'a>(svc: &'a RecipeService, key: &str) -> Result<Option<&'a Recipe>> {
    let key = key.trim();
    let all = svc.store().list();

    if let Some(r) = all.iter().find(|r| r.id == key) {
        return Ok(Some(r));
    }

    let by_prefix: Vec<&Recipe> = all.iter().filter(|r| r.id.starts_with(key)).collect();
    if key.len() >= 4 && by_prefix.len() == 1 {
        return Ok(Some(by_prefix[0]));
    }

    let lower = key.to_lowercase();
    let by_title: Vec<&Recipe> = all
        .iter()
        .filter(|r| r.title.to_lowercase() == lower)
        .collect();
    match by_title.len() {
        0 => Ok(None),
        1 => Ok(Some(by_title[0])),
        n => bail!("'{key}' matches {n} recipes by title. Use the id instead"),
    }
}

pub(crate) fn prompt_confirm(question: &str) -> Result<bool> {
    eprint!("{question} [y/N]: ");
    io::stderr().flush()?;
    let stdin = io::stdin();
    let line = stdin.lock().lines().next().context("No input")??;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

pub(crate) fn print_recipe_json(recipe: &Recipe) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&RecipeRecord::from(recipe))?);
    Ok(())
}

pub(crate) fn print_recipes_json(recipes: &[&Recipe]) -> Result<()> {
    let records: Vec<RecipeRecord> = recipes.iter().map(|r| RecipeRecord::from(*r)).collect();
    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}

pub(crate) fn print_recipe_table(recipes: &[&Recipe]) {
    #[derive(Tabled)]
    struct RecipeRow {
        #[tabled(rename = "ID")]
        id: String,
        #[tabled(rename = "Title")]
        title: String,
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Fav")]
        favorite: String,
        #[tabled(rename = "Ingredients")]
        ingredients: usize,
        #[tabled(rename = "Added")]
        added: String,
    }

    let rows: Vec<RecipeRow> = recipes
        .iter()
        .map(|r| RecipeRow {
            id: short_id(&r.id),
            title: truncate(&r.title, 35),
            category: truncate(&r.category, 20),
            favorite: if r.is_favorite { "*".into() } else { String::new() },
            ingredients: r.ingredients.len(),
            added: r.created_at.format("%Y-%m-%d").to_string(),
        })
        .collect();

    let table = Table::new(&rows)
        .with(Style::rounded())
        .with(Modify::new(Columns::new(4..5)).with(Alignment::right()))
        .to_string();
    println!("{table}");
}

pub(crate) fn short_id(id: &str) -> String {
    id.chars().take(8).collect()
}

pub(crate) fn json_error(message: &str) -> String {
    #[derive(Serialize)]
    struct CliError<'a> {
        error: &'a str,
    }
    serde_json::to_string(&CliError { error: message })
        .unwrap_or_else(|_| format!("{{\"error\":\"{message}\"}}"))
}

pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let end = s.char_indices().nth(max - 3).map_or(s.len(), |(i, _)| i);
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipebox_core::models::NewRecipe;

    fn service_with(titles: &[&str]) -> (tempfile::TempDir, RecipeService) {
        let tmp = tempfile::tempdir().unwrap();
        let mut svc = RecipeService::open(tmp.path()).unwrap();
        for (i, title) in titles.iter().enumerate() {
            svc.add(NewRecipe {
                id: Some(format!("id-{i}-{title}")),
                title: (*title).to_string(),
                category: "Test".to_string(),
                ..NewRecipe::default()
            })
            .unwrap();
        }
        (tmp, svc)
    }

    #[test]
    fn test_find_recipe_by_id_prefix_and_title() {
        let (_tmp, svc) = service_with(&["Soup", "Stew"]);
        assert_eq!(find_recipe(&svc, "id-0-Soup").unwrap().unwrap().title, "Soup");
        assert_eq!(find_recipe(&svc, "id-1").unwrap().unwrap().title, "Stew");
        assert_eq!(find_recipe(&svc, "soup").unwrap().unwrap().title, "Soup");
        assert!(find_recipe(&svc, "Curry").unwrap().is_none());
    }

    #[test]
    fn test_find_recipe_ambiguous_title() {
        let (_tmp, svc) = service_with(&["Soup", "soup"]);
        assert!(find_recipe(&svc, "SOUP").is_err());
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_json_error() {
        assert_eq!(json_error("boom"), r#"{"error":"boom"}"#);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world this is long", 10), "hello w...");
    }

    #[test]
    fn test_truncate_utf8() {
        assert_eq!(truncate("Crème brûlée maison", 10), "Crème b...");
        assert_eq!(truncate("日本のカレーライス", 8), "日本のカレ...");
    }
}
