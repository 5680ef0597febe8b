mod commands;
mod config;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use crate::commands::{
    cmd_import_legacy, cmd_ingredient_add, cmd_ingredient_delete, cmd_meal_add, cmd_meal_delete,
    cmd_meal_list, cmd_meal_recipe, cmd_meal_show, cmd_plan,
};
use crate::config::{Config, StoreKind};

#[derive(Parser)]
#[command(
    name = "mealplan",
    version,
    about = "Keep a catalog of meals and draw a weekly menu from it"
)]
struct Cli {
    /// Directory holding the catalog (default: platform data directory)
    #[arg(long, global = true, env = "MEALPLAN_DATA_DIR", value_name = "PATH")]
    data_dir: Option<PathBuf>,
    /// Catalog backend
    #[arg(long, global = true, env = "MEALPLAN_STORE", value_enum, default_value_t = StoreKind::Sqlite)]
    store: StoreKind,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage meals in the catalog
    Meal {
        #[command(subcommand)]
        command: MealCommands,
    },
    /// Manage ingredients of a meal
    Ingredient {
        #[command(subcommand)]
        command: IngredientCommands,
    },
    /// Draw a meal for every day of this week
    Plan {
        /// Seed for a reproducible draw
        #[arg(long)]
        seed: Option<u64>,
        /// Label language: de or en
        #[arg(long, default_value = "de")]
        lang: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import data from external sources
    Import {
        #[command(subcommand)]
        command: ImportCommands,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[derive(Subcommand)]
enum MealCommands {
    /// List all meals
    List {
        /// Label language: de or en
        #[arg(long, default_value = "de")]
        lang: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a meal with its recipe and ingredients
    Show {
        /// Meal ID
        id: i64,
        /// Label language: de or en
        #[arg(long, default_value = "de")]
        lang: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add a meal
    Add {
        /// Meal name
        name: String,
        /// Category: vegan, vegetarian, meat (German labels work too)
        #[arg(short, long)]
        category: String,
        /// Preparation text
        #[arg(short, long, default_value = "")]
        recipe: String,
        /// Ingredients separated by commas or newlines
        #[arg(short, long)]
        ingredients: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a meal and its ingredients
    Delete {
        /// Meal ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace a meal's recipe text
    Recipe {
        /// Meal ID
        id: i64,
        /// New recipe text (may be empty)
        text: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum IngredientCommands {
    /// Add an ingredient to a meal
    Add {
        /// Meal ID
        meal_id: i64,
        /// Ingredient name
        name: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an ingredient by ID
    Delete {
        /// Ingredient ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ImportCommands {
    /// Import meals from a JSON file written by the old planner
    Legacy {
        /// Path to the legacy JSON file
        file: PathBuf,
        /// Category given to every imported meal
        #[arg(short, long, default_value = "vegetarian")]
        category: String,
        /// Preview import without making changes
        #[arg(long)]
        dry_run: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.data_dir, cli.store)?;
    let mut planner = config.open_planner()?;

    match cli.command {
        Commands::Meal { command } => match command {
            MealCommands::List { lang, json } => cmd_meal_list(&planner, &lang, json),
            MealCommands::Show { id, lang, json } => cmd_meal_show(&planner, id, &lang, json),
            MealCommands::Add {
                name,
                category,
                recipe,
                ingredients,
                json,
            } => cmd_meal_add(
                &mut planner,
                &name,
                &category,
                &recipe,
                ingredients.as_deref(),
                json,
            ),
            MealCommands::Delete { id, json } => cmd_meal_delete(&mut planner, id, json),
            MealCommands::Recipe { id, text, json } => {
                cmd_meal_recipe(&mut planner, id, &text, json)
            }
        },
        Commands::Ingredient { command } => match command {
            IngredientCommands::Add {
                meal_id,
                name,
                json,
            } => cmd_ingredient_add(&mut planner, meal_id, &name, json),
            IngredientCommands::Delete { id, json } => {
                cmd_ingredient_delete(&mut planner, id, json)
            }
        },
        Commands::Plan { seed, lang, json } => cmd_plan(planner, seed, &lang, json),
        Commands::Import { command } => match command {
            ImportCommands::Legacy {
                file,
                category,
                dry_run,
                json,
            } => cmd_import_legacy(&mut planner, &file, &category, dry_run, json),
        },
        Commands::Serve { port, bind } => server::start_server(planner, port, &bind).await,
    }
}
