use anyhow::{Result, bail};
use std::path::PathBuf;
use std::process;
use tabled::{Table, Tabled, settings::Style};

use recipebox_core::RecipeService;
use recipebox_core::models::{ImageRef, NewRecipe};

use super::helpers::{
    find_recipe, json_error, print_recipe_json, print_recipe_table, print_recipes_json, short_id,
};

pub(crate) struct RecipeInput {
    pub title: Option<String>,
    pub category: Option<String>,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub image: Option<PathBuf>,
}

pub(crate) fn cmd_add(
    svc: &mut RecipeService,
    input: RecipeInput,
    favorite: bool,
    json: bool,
) -> Result<()> {
    let Some(title) = input.title else {
        bail!("A title is required");
    };
    let Some(category) = input.category else {
        bail!("A category is required (--category)");
    };
    let recipe = svc.add(NewRecipe {
        title,
        category,
        ingredients: input.ingredients,
        steps: input.steps,
        image: input.image,
        is_favorite: favorite,
        ..NewRecipe::default()
    })?;

    if json {
        print_recipe_json(&recipe)?;
    } else {
        let title = &recipe.title;
        let id = &recipe.id;
        println!("Added recipe: {title} (id: {id})");
    }
    Ok(())
}

/// Only the fields given are changed. Passing any `--ingredient` or `--step`
/// replaces that whole list.
pub(crate) fn cmd_edit(
    svc: &mut RecipeService,
    key: &str,
    input: RecipeInput,
    remove_image: bool,
    json: bool,
) -> Result<()> {
    if input.title.is_none()
        && input.category.is_none()
        && input.ingredients.is_empty()
        && input.steps.is_empty()
        && input.image.is_none()
        && !remove_image
    {
        bail!(
            "Nothing to update. Provide at least one of --title, --category, \
             --ingredient, --step, --image or --no-image"
        );
    }
    if remove_image && input.image.is_some() {
        bail!("--image and --no-image cannot be used together");
    }

    let Some(existing) = find_recipe(svc, key)? else {
        not_found(key, json);
    };
    let mut recipe = existing.clone();
    if let Some(title) = input.title {
        recipe.title = title;
    }
    if let Some(category) = input.category {
        recipe.category = category;
    }
    if !input.ingredients.is_empty() {
        recipe.ingredients = input.ingredients;
    }
    if !input.steps.is_empty() {
        recipe.steps = input.steps;
    }
    if let Some(path) = input.image {
        recipe.image = Some(ImageRef::Local(path));
    } else if remove_image {
        recipe.image = None;
    }

    match svc.update(recipe)? {
        Some(updated) if json => print_recipe_json(&updated),
        Some(updated) => {
            let title = &updated.title;
            println!("Updated recipe: {title}");
            Ok(())
        }
        None => not_found(key, json),
    }
}

pub(crate) fn cmd_show(svc: &RecipeService, key: &str, json: bool) -> Result<()> {
    let Some(recipe) = find_recipe(svc, key)? else {
        not_found(key, json);
    };
    if json {
        return print_recipe_json(recipe);
    }

    let title = &recipe.title;
    let star = if recipe.is_favorite { " *" } else { "" };
    println!("=== {title}{star} ===");
    let category = &recipe.category;
    let added = recipe.created_at.format("%Y-%m-%d");
    let id = &recipe.id;
    println!("  Category: {category}  |  Added: {added}  |  ID: {id}");
    if let Some(image) = &recipe.image {
        let image = image.to_wire();
        println!("  Image: {image}");
    }

    println!("\n  INGREDIENTS:");
    for ing in &recipe.ingredients {
        println!("    - {ing}");
    }
    println!("\n  STEPS:");
    for (i, step) in recipe.steps.iter().enumerate() {
        let n = i + 1;
        println!("    {n}. {step}");
    }
    Ok(())
}

pub(crate) struct ListFilter {
    pub favorites: bool,
    pub category: Option<String>,
    pub recent: Option<usize>,
    pub search: Option<String>,
}

pub(crate) fn cmd_list(svc: &RecipeService, filter: &ListFilter, json: bool) -> Result<()> {
    let mut recipes = match (&filter.search, filter.recent) {
        (Some(q), _) => svc.search(q),
        (None, Some(n)) => svc.recent(n),
        (None, None) if filter.favorites => svc.favorites(),
        (None, None) => match &filter.category {
            Some(c) => svc.by_category(c),
            None => svc.all_sorted(),
        },
    };
    if filter.favorites {
        recipes.retain(|r| r.is_favorite);
    }
    if let Some(c) = &filter.category {
        let wanted = c.to_lowercase();
        recipes.retain(|r| r.category.to_lowercase() == wanted);
    }

    if recipes.is_empty() {
        if json {
            println!("[]");
        } else {
            eprintln!("No recipes found");
        }
        process::exit(2);
    }

    if json {
        return print_recipes_json(&recipes);
    }
    print_recipe_table(&recipes);
    Ok(())
}

pub(crate) fn cmd_categories(svc: &RecipeService, json: bool) -> Result<()> {
    #[derive(Tabled)]
    struct CategoryRow {
        #[tabled(rename = "Category")]
        category: String,
        #[tabled(rename = "Recipes")]
        count: usize,
    }

    let cats = svc.categories();
    if json {
        println!("{}", serde_json::to_string_pretty(&cats)?);
        return Ok(());
    }
    if cats.is_empty() {
        eprintln!("No recipes yet");
        return Ok(());
    }
    let rows: Vec<CategoryRow> = cats
        .into_iter()
        .map(|c| CategoryRow {
            category: c.category,
            count: c.count,
        })
        .collect();
    println!("{}", Table::new(&rows).with(Style::rounded()));
    Ok(())
}

pub(crate) fn cmd_favorite(svc: &mut RecipeService, key: &str, json: bool) -> Result<()> {
    let Some(id) = find_recipe(svc, key)?.map(|r| r.id.clone()) else {
        not_found(key, json);
    };
    match svc.toggle_favorite(&id)? {
        Some(recipe) if json => print_recipe_json(&recipe),
        Some(recipe) => {
            let title = &recipe.title;
            if recipe.is_favorite {
                println!("Marked {title} as favorite");
            } else {
                println!("Removed {title} from favorites");
            }
            Ok(())
        }
        None => not_found(key, json),
    }
}

pub(crate) fn cmd_delete(svc: &mut RecipeService, key: &str, json: bool) -> Result<()> {
    let found = find_recipe(svc, key)?.map(|r| (r.id.clone(), r.title.clone()));
    let Some((id, title)) = found else {
        not_found(key, json);
    };
    if svc.delete(&id)? {
        if json {
            println!("{}", serde_json::json!({ "deleted": id }));
        } else {
            let short = short_id(&id);
            println!("Deleted {title} ({short})");
        }
        Ok(())
    } else {
        not_found(key, json)
    }
}

fn not_found(key: &str, json: bool) -> ! {
    if json {
        println!("{}", json_error(&format!("Recipe '{key}' not found")));
    } else {
        eprintln!("Recipe '{key}' not found");
    }
    process::exit(2);
}
