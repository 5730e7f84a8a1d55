use anyhow::{Context, Result, bail};
use std::path::Path;

use recipebox_core::RecipeService;
use recipebox_core::models::NewRecipe;

use super::helpers::print_recipe_json;

/// Import a Cooklang (.cook) file as a new recipe.
pub(crate) fn cmd_cook_import(
    svc: &mut RecipeService,
    file: &Path,
    title_override: Option<String>,
    category: &str,
    json: bool,
) -> Result<()> {
    let input = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read file: {}", file.display()))?;

    let (recipe_data, _report) = cooklang::parse(&input)
        .into_result()
        .map_err(|e| anyhow::anyhow!("Failed to parse Cooklang file: {e}"))?;

    let title = title_override
        .or_else(|| recipe_data.metadata.title().map(String::from))
        .or_else(|| file.file_stem().and_then(|s| s.to_str()).map(String::from))
        .context("Could not determine recipe title. Use --title to specify one")?;

    let converter = cooklang::Converter::default();
    let ingredients: Vec<String> = recipe_data
        .group_ingredients(&converter)
        .iter()
        .map(|gi| {
            let amount = gi.quantity.iter().next().map(quantity_text);
            ingredient_line(&gi.ingredient.display_name(), amount.as_deref())
        })
        .collect();

    let mut steps = Vec::new();
    for section in &recipe_data.sections {
        for content in &section.content {
            if let cooklang::Content::Step(step) = content {
                let mut text = String::new();
                for item in &step.items {
                    match item {
                        cooklang::Item::Text { value } => text.push_str(value),
                        cooklang::Item::Ingredient { index } => {
                            text.push_str(&recipe_data.ingredients[*index].display_name());
                        }
                        cooklang::Item::Cookware { index } => {
                            text.push_str(&recipe_data.cookware[*index].name);
                        }
                        cooklang::Item::Timer { index } => {
                            if let Some(q) = &recipe_data.timers[*index].quantity {
                                text.push_str(&quantity_text(q));
                            }
                        }
                        _ => {}
                    }
                }
                steps.push(collapse_whitespace(&text));
            }
        }
    }

    if ingredients.is_empty() && steps.is_empty() {
        bail!("No ingredients or steps found in {}", file.display());
    }

    let recipe = svc.add(NewRecipe {
        title,
        category: category.to_string(),
        ingredients,
        steps,
        ..NewRecipe::default()
    })?;

    if json {
        print_recipe_json(&recipe)?;
    } else {
        let title = &recipe.title;
        let ing_count = recipe.ingredients.len();
        let step_count = recipe.steps.len();
        println!("Imported recipe: {title} ({ing_count} ingredients, {step_count} steps)");
    }
    Ok(())
}

fn quantity_text(qty: &cooklang::Quantity) -> String {
    let value = match qty.value() {
        cooklang::Value::Number(n) => format_number(n.value()),
        cooklang::Value::Range { start, end } => {
            format!("{}-{}", format_number(start.value()), format_number(end.value()))
        }
        cooklang::Value::Text(t) => t.clone(),
    };
    match qty.unit() {
        Some(unit) => format!("{value} {unit}"),
        None => value,
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{n:.0}")
    } else {
        let s = format!("{n:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

/// "200 g flour", or just "salt" when there is no amount.
fn ingredient_line(name: &str, amount: Option<&str>) -> String {
    match amount {
        Some(a) if !a.trim().is_empty() => format!("{} {name}", a.trim()),
        _ => name.to_string(),
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(2.0), "2");
        assert_eq!(format_number(0.5), "0.5");
        assert_eq!(format_number(1.25), "1.25");
        assert_eq!(format_number(1.004), "1");
        assert_eq!(format_number(0.001), "0");
    }

    #[test]
    fn test_ingredient_line() {
        assert_eq!(ingredient_line("flour", Some("200 g")), "200 g flour");
        assert_eq!(ingredient_line("salt", None), "salt");
        assert_eq!(ingredient_line("salt", Some(" ")), "salt");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  Boil \n the   water "), "Boil the water");
    }
}
