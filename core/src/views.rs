//! Read-only projections of the collection used by the list screens.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::Recipe;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

fn title_key(recipe: &Recipe) -> String {
    recipe.title.to_lowercase()
}

/// Every recipe, ordered by title ignoring case.
#[must_use]
pub fn sorted_by_title(recipes: &[Recipe]) -> Vec<&Recipe> {
    let mut all: Vec<&Recipe> = recipes.iter().collect();
    all.sort_by_cached_key(|r| title_key(r));
    all
}

#[must_use]
pub fn favorites(recipes: &[Recipe]) -> Vec<&Recipe> {
    let mut favs: Vec<&Recipe> = recipes.iter().filter(|r| r.is_favorite).collect();
    favs.sort_by_cached_key(|r| title_key(r));
    favs
}

#[must_use]
pub fn in_category<'a>(recipes: &'a [Recipe], category: &str) -> Vec<&'a Recipe> {
    let wanted = category.trim().to_lowercase();
    let mut matches: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| r.category.to_lowercase() == wanted)
        .collect();
    matches.sort_by_cached_key(|r| title_key(r));
    matches
}

/// Categories with how many recipes each holds. Categories differing only in
/// case are counted together under the first spelling seen.
#[must_use]
pub fn categories(recipes: &[Recipe]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<String, CategoryCount> = BTreeMap::new();
    for recipe in recipes {
        counts
            .entry(recipe.category.to_lowercase())
            .or_insert_with(|| CategoryCount {
                category: recipe.category.clone(),
                count: 0,
            })
            .count += 1;
    }
    counts.into_values().collect()
}

/// Newest first.
#[must_use]
pub fn most_recent(recipes: &[Recipe], limit: usize) -> Vec<&Recipe> {
    let mut all: Vec<&Recipe> = recipes.iter().collect();
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    all.truncate(limit);
    all
}

/// Case-insensitive substring match on title and ingredients.
#[must_use]
pub fn search<'a>(recipes: &'a [Recipe], query: &str) -> Vec<&'a Recipe> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return sorted_by_title(recipes);
    }
    let mut hits: Vec<&Recipe> = recipes
        .iter()
        .filter(|r| {
            r.title.to_lowercase().contains(&needle)
                || r.ingredients
                    .iter()
                    .any(|i| i.to_lowercase().contains(&needle))
        })
        .collect();
    hits.sort_by_cached_key(|r| title_key(r));
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn recipe(id: &str, title: &str, category: &str, day: u32, fav: bool) -> Recipe {
        Recipe {
            id: id.to_string(),
            title: title.to_string(),
            category: category.to_string(),
            ingredients: vec![format!("{title} base")],
            steps: vec![],
            image: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, day, 9, 0, 0).unwrap(),
            is_favorite: fav,
        }
    }

    fn sample() -> Vec<Recipe> {
        vec![
            recipe("1", "pancakes", "Breakfast", 3, true),
            recipe("2", "Beef Stew", "Dinner", 1, false),
            recipe("3", "Omelette", "breakfast", 5, false),
            recipe("4", "Apple Pie", "Dessert", 2, true),
        ]
    }

    fn ids(recipes: &[&Recipe]) -> Vec<String> {
        recipes.iter().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn test_sorted_by_title_ignores_case() {
        let all = sample();
        assert_eq!(ids(&sorted_by_title(&all)), vec!["4", "2", "3", "1"]);
    }

    #[test]
    fn test_favorites() {
        let all = sample();
        assert_eq!(ids(&favorites(&all)), vec!["4", "1"]);
    }

    #[test]
    fn test_in_category() {
        let all = sample();
        assert_eq!(ids(&in_category(&all, "BREAKFAST")), vec!["3", "1"]);
        assert!(in_category(&all, "Lunch").is_empty());
    }

    #[test]
    fn test_categories_merge_case() {
        let all = sample();
        let cats = categories(&all);
        assert_eq!(cats.len(), 3);
        assert_eq!(
            cats[0],
            CategoryCount {
                category: "Breakfast".to_string(),
                count: 2
            }
        );
    }

    #[test]
    fn test_most_recent() {
        let all = sample();
        assert_eq!(ids(&most_recent(&all, 2)), vec!["3", "1"]);
        assert_eq!(most_recent(&all, 10).len(), 4);
    }

    #[test]
    fn test_search_title_and_ingredients() {
        let all = sample();
        assert_eq!(ids(&search(&all, "stew")), vec!["2"]);
        assert_eq!(ids(&search(&all, "PIE BASE")), vec!["4"]);
        assert_eq!(search(&all, "  ").len(), 4);
        assert!(search(&all, "sushi").is_empty());
    }
}
