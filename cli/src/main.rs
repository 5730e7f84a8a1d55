mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    ListFilter, RecipeInput, cmd_add, cmd_categories, cmd_cook_import, cmd_delete, cmd_edit,
    cmd_export, cmd_favorite, cmd_import, cmd_list, cmd_share, cmd_show,
};
use crate::config::Config;
use recipebox_core::RecipeService;

#[derive(Parser)]
#[command(
    name = "recipebox",
    version,
    about = "A small local-first recipe box",
    long_about = "Keep your recipes in a local JSON file, with photos, and move them \
                  between devices as a single zip archive."
)]
struct Cli {
    /// Data directory (default: the per-user data directory)
    #[arg(long, global = true, value_name = "PATH")]
    data_dir: Option<PathBuf>,
    /// Increase log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new recipe
    Add {
        /// Recipe title
        title: String,
        /// Category, e.g. "Dinner"
        #[arg(short, long)]
        category: String,
        /// Ingredient line (repeat for each, in order)
        #[arg(short, long = "ingredient", value_name = "TEXT")]
        ingredients: Vec<String>,
        /// Step (repeat for each, in order)
        #[arg(short, long = "step", value_name = "TEXT")]
        steps: Vec<String>,
        /// Image file to attach (a private copy is kept)
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Mark as favorite
        #[arg(long)]
        favorite: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change fields of an existing recipe
    Edit {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// Replace the ingredient list (repeat for each)
        #[arg(short, long = "ingredient", value_name = "TEXT")]
        ingredients: Vec<String>,
        /// Replace the steps (repeat for each)
        #[arg(short, long = "step", value_name = "TEXT")]
        steps: Vec<String>,
        /// Replace the image
        #[arg(long, value_name = "PATH")]
        image: Option<PathBuf>,
        /// Remove the image
        #[arg(long)]
        no_image: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List recipes
    List {
        /// Only favorites
        #[arg(short, long)]
        favorites: bool,
        /// Only this category
        #[arg(short, long)]
        category: Option<String>,
        /// The N most recently added
        #[arg(short, long, value_name = "N")]
        recent: Option<usize>,
        /// Filter by title or ingredient
        #[arg(short, long)]
        search: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one recipe
    Show {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle the favorite flag
    Favorite {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe and its image
    Delete {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List categories with recipe counts
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Export every recipe and image to a zip archive
    Export {
        /// Destination .zip file
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write one recipe as a standalone JSON document
    Share {
        /// Recipe id, id prefix, or title
        recipe: String,
        /// Destination .json file (default: print to stdout)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a zip export or JSON file (replaces the collection unless --merge)
    Import {
        /// Path to a .zip export or .json file
        file: PathBuf,
        /// Keep existing recipes and only add ones with new ids
        #[arg(long)]
        merge: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a recipe from a Cooklang (.cook) file
    Cook {
        /// Path to the .cook file
        file: PathBuf,
        /// Title override (defaults to metadata title or filename)
        #[arg(long)]
        title: Option<String>,
        /// Category for the imported recipe
        #[arg(short, long, default_value = "Uncategorized")]
        category: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir)?;
    let mut svc = RecipeService::open(&config.data_dir)?;
    if let Some(warning) = svc.load_warning() {
        eprintln!("Warning: {warning}");
    }

    match cli.command {
        Commands::Add {
            title,
            category,
            ingredients,
            steps,
            image,
            favorite,
            json,
        } => cmd_add(
            &mut svc,
            RecipeInput {
                title: Some(title),
                category: Some(category),
                ingredients,
                steps,
                image,
            },
            favorite,
            json,
        ),
        Commands::Edit {
            recipe,
            title,
            category,
            ingredients,
            steps,
            image,
            no_image,
            json,
        } => cmd_edit(
            &mut svc,
            &recipe,
            RecipeInput {
                title,
                category,
                ingredients,
                steps,
                image,
            },
            no_image,
            json,
        ),
        Commands::List {
            favorites,
            category,
            recent,
            search,
            json,
        } => cmd_list(
            &svc,
            &ListFilter {
                favorites,
                category,
                recent,
                search,
            },
            json,
        ),
        Commands::Show { recipe, json } => cmd_show(&svc, &recipe, json),
        Commands::Favorite { recipe, json } => cmd_favorite(&mut svc, &recipe, json),
        Commands::Delete { recipe, json } => cmd_delete(&mut svc, &recipe, json),
        Commands::Categories { json } => cmd_categories(&svc, json),
        Commands::Export { file, json } => cmd_export(&svc, &file, json),
        Commands::Share {
            recipe,
            output,
            json,
        } => cmd_share(&svc, &recipe, output.as_deref(), json),
        Commands::Import {
            file,
            merge,
            yes,
            json,
        } => cmd_import(&mut svc, &file, merge, yes, json),
        Commands::Cook {
            file,
            title,
            category,
            json,
        } => cmd_cook_import(&mut svc, &file, title, &category, json),
    }
}
