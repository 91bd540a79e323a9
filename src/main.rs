//! Pantry Chef - AI-powered recipe generation from the ingredients you own
//!
//! Generates recipes with an LLM, keeps the pantry and the recipe box in a
//! hosted or local store, and works offline with the fallback recipe.

use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pantry_chef::{
    recipe::catalog::{format_cooking_time, import_recipes, matches_query, missing_ingredients},
    AppConfig, Difficulty, GeneratedRecipe, GenerationRequest, NewIngredient, PantryChefError,
    RecipeGenerator, RecipeStore, StoreBackend, StoredRecipe,
};
use rand::seq::SliceRandom;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Dishes suggested when `search` is run without a name
const SUGGESTED_DISHES: [&str; 8] = [
    "Kimchi Jjigae",
    "Bibimbap",
    "Japchae",
    "Spaghetti Carbonara",
    "Chicken Curry",
    "Pad Thai",
    "Shakshuka",
    "Mushroom Risotto",
];

#[derive(Parser)]
#[command(name = "pantry-chef", version)]
#[command(about = "AI-powered recipes from the ingredients you already own", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new recipe from ingredients
    Generate {
        /// Ingredients to cook with
        ingredients: Vec<String>,
        /// Also use every ingredient in the pantry
        #[arg(long)]
        pantry: bool,
        #[arg(short, long, default_value = "medium")]
        difficulty: Difficulty,
        #[arg(short, long, default_value_t = 2)]
        servings: u32,
        /// Cuisine hint, e.g. "Korean"
        #[arg(long)]
        cuisine: Option<String>,
        /// Dietary constraint (repeatable)
        #[arg(long = "diet")]
        diet: Vec<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Get the standard recipe for a named dish
    Search {
        /// Dish name (a random suggestion when omitted)
        dish: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Build the offline fallback recipe (no AI call)
    Fallback {
        #[arg(required = true)]
        ingredients: Vec<String>,
        #[arg(short, long, default_value = "medium")]
        difficulty: Difficulty,
        #[arg(short, long, default_value_t = 2)]
        servings: u32,
        /// Print the recipe as JSON
        #[arg(long)]
        json: bool,
        /// Write the recipe as JSON to a file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage the ingredients you own
    #[command(subcommand)]
    Pantry(PantryCommand),
    /// Browse saved recipes
    #[command(subcommand)]
    Recipes(RecipesCommand),
    /// Ingredients in season right now
    Seasonal,
    /// Cooking tips for one ingredient
    Tips { ingredient: String },
}

#[derive(Args)]
struct OutputArgs {
    /// Save the recipe without asking
    #[arg(long)]
    save: bool,
    /// Print the recipe as JSON
    #[arg(long)]
    json: bool,
    /// Write the recipe as JSON to a file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum PantryCommand {
    /// List pantry ingredients
    List,
    /// Add an ingredient
    Add {
        name: String,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Expiry date, YYYY-MM-DD
        #[arg(long)]
        expires: Option<String>,
    },
    /// Change an ingredient; fields left out keep their value
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        quantity: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Expiry date, YYYY-MM-DD
        #[arg(long)]
        expires: Option<String>,
    },
    /// Remove an ingredient by id
    Remove { id: String },
}

#[derive(Subcommand)]
enum RecipesCommand {
    /// List saved recipes, newest first
    List {
        /// Filter by name, tag or ingredient
        #[arg(short, long)]
        query: Option<String>,
        /// Show which ingredients the pantry is missing
        #[arg(long)]
        missing: bool,
    },
    /// Show one saved recipe
    Show {
        id: String,
        /// Print the recipe as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change a saved recipe; fields left out keep their value
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(short, long)]
        difficulty: Option<Difficulty>,
        #[arg(short, long)]
        servings: Option<u32>,
        /// Cooking time in minutes
        #[arg(long)]
        cooking_time: Option<u32>,
        /// Replace the tags (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
    /// Import recipes from a JSON file (one object or an array)
    Import { file: PathBuf },
    /// Delete a saved recipe by id
    Delete { id: String },
}

#[tokio::main]
async fn main() {
    if let Err(e) = pantry_chef::init() {
        eprintln!("❌ Failed to initialize: {}", e);
        process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = run(cli.command).await {
        match err.downcast_ref::<PantryChefError>() {
            Some(e) => eprintln!("{}", e.user_message()),
            None => eprintln!("❌ Error: {:#}", err),
        }
        process::exit(1);
    }
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Fallback {
            ingredients,
            difficulty,
            servings,
            json,
            output,
        } => {
            let request = GenerationRequest::new(ingredients)
                .with_difficulty(difficulty)
                .with_servings(servings);
            request.validate()?;
            let recipe = pantry_chef::fallback_recipe(&request);
            emit(&recipe, json, output.as_deref())
        }
        Commands::Generate {
            mut ingredients,
            pantry,
            difficulty,
            servings,
            cuisine,
            diet,
            output,
        } => {
            let config = AppConfig::from_env()?;
            let backend = config.open_store()?;

            if pantry {
                let owned = backend.pantry().list_ingredients(&config.user_id).await?;
                ingredients.extend(owned.into_iter().map(|i| i.name));
            }

            let mut request = GenerationRequest::new(ingredients)
                .with_difficulty(difficulty)
                .with_servings(servings)
                .with_dietary_constraints(diet);
            if let Some(cuisine) = cuisine {
                request = request.with_cuisine(cuisine);
            }
            request.validate()?;

            let generator = config.build_generator(Some(backend.recipes()))?;
            let spinner = spinner("🤖 Cooking up a recipe...");
            let result = generator.generate(&request).await;
            spinner.finish_and_clear();

            let recipe = result?;
            emit(&recipe, output.json, output.output.as_deref())?;
            maybe_save(&backend, &config, &recipe, &output).await
        }
        Commands::Search { dish, output } => {
            let config = AppConfig::from_env()?;
            let backend = config.open_store()?;
            let generator = config.build_generator(Some(backend.recipes()))?;

            let dish = match dish {
                Some(dish) => dish,
                None => {
                    let picked = SUGGESTED_DISHES
                        .choose(&mut rand::thread_rng())
                        .copied()
                        .unwrap_or("Bibimbap");
                    if !output.json {
                        println!("🎲 Random dish: {}", picked);
                    }
                    picked.to_string()
                }
            };

            let spinner = spinner(&format!("🔎 Looking up {}...", dish));
            let result = generator.generate_for_named_dish(&dish).await;
            spinner.finish_and_clear();

            let recipe = result?;
            emit(&recipe, output.json, output.output.as_deref())?;
            maybe_save(&backend, &config, &recipe, &output).await
        }
        Commands::Pantry(command) => {
            let config = AppConfig::from_env()?;
            let backend = config.open_store()?;
            run_pantry(command, &backend, &config).await
        }
        Commands::Recipes(command) => {
            let config = AppConfig::from_env()?;
            let backend = config.open_store()?;
            run_recipes(command, &backend, &config).await
        }
        Commands::Seasonal => {
            let generator = lookup_generator()?;
            let spinner = spinner("🌱 Checking what's in season...");
            let items = generator.seasonal_ingredients().await;
            spinner.finish_and_clear();
            print_list("🌱 In season now", &items);
            Ok(())
        }
        Commands::Tips { ingredient } => {
            let generator = lookup_generator()?;
            let spinner = spinner(&format!("💡 Collecting tips for {}...", ingredient));
            let tips = generator.cooking_tips(&ingredient).await;
            spinner.finish_and_clear();
            print_list(&format!("💡 Tips for {}", ingredient), &tips);
            Ok(())
        }
    }
}

/// Generator for the list lookups, which never touch the store
fn lookup_generator() -> Result<RecipeGenerator> {
    let config = AppConfig::from_env()?;
    Ok(config.build_generator(None)?)
}

async fn run_pantry(command: PantryCommand, backend: &StoreBackend, config: &AppConfig) -> Result<()> {
    let pantry = backend.pantry();
    match command {
        PantryCommand::List => {
            let items = pantry.list_ingredients(&config.user_id).await?;
            if items.is_empty() {
                println!("🧺 The pantry is empty. Add something with `pantry-chef pantry add <name>`.");
                return Ok(());
            }
            println!("🧺 Pantry ({}):", items.len());
            for item in items {
                let mut line = format!("  [{}] {}", item.id, item.name);
                if let Some(quantity) = &item.quantity {
                    line.push_str(&format!(" - {}", quantity));
                }
                if let Some(category) = &item.category {
                    line.push_str(&format!(" ({})", category));
                }
                if let Some(expiry) = item.expiry_date {
                    line.push_str(&format!(" expires {}", expiry.format("%Y-%m-%d")));
                }
                println!("{}", line);
            }
        }
        PantryCommand::Add {
            name,
            quantity,
            category,
            expires,
        } => {
            let ingredient = NewIngredient {
                quantity,
                category,
                expiry_date: expires.as_deref().map(parse_date).transpose()?,
                ..NewIngredient::named(name)
            };
            let added = pantry.add_ingredient(&config.user_id, &ingredient).await?;
            println!("✅ Added {} [{}]", added.name, added.id);
        }
        PantryCommand::Update {
            id,
            name,
            quantity,
            category,
            expires,
        } => {
            let current = pantry
                .list_ingredients(&config.user_id)
                .await?
                .into_iter()
                .find(|item| item.id == id)
                .ok_or_else(|| PantryChefError::store(format!("Ingredient '{}' not found", id), Some(404)))?;

            let expiry_date = match expires {
                Some(raw) => Some(parse_date(&raw)?),
                None => current.expiry_date,
            };
            let changed = NewIngredient {
                name: name.unwrap_or(current.name),
                quantity: quantity.or(current.quantity),
                category: category.or(current.category),
                expiry_date,
            };
            let updated = pantry.update_ingredient(&id, &changed).await?;
            println!("✏️  Updated {} [{}]", updated.name, updated.id);
        }
        PantryCommand::Remove { id } => {
            pantry.delete_ingredient(&id).await?;
            println!("🗑️  Removed ingredient {}", id);
        }
    }
    Ok(())
}

async fn run_recipes(command: RecipesCommand, backend: &StoreBackend, config: &AppConfig) -> Result<()> {
    let recipes = backend.recipes();
    match command {
        RecipesCommand::List { query, missing } => {
            let query = query.unwrap_or_default();
            let stored: Vec<_> = recipes
                .select_all()
                .await?
                .into_iter()
                .filter(|r| matches_query(&r.recipe, &query))
                .collect();

            let pantry_names: Vec<String> = if missing {
                backend
                    .pantry()
                    .list_ingredients(&config.user_id)
                    .await?
                    .into_iter()
                    .map(|i| i.name)
                    .collect()
            } else {
                Vec::new()
            };

            if stored.is_empty() {
                println!("📖 No saved recipes found.");
                return Ok(());
            }
            println!("📖 Saved recipes ({}):", stored.len());
            for entry in &stored {
                let recipe = &entry.recipe;
                println!(
                    "  [{}] {} - {}, {}, serves {}",
                    entry.id,
                    recipe.name,
                    format_cooking_time(recipe.cooking_time),
                    recipe.difficulty,
                    recipe.servings
                );
                if missing {
                    let lacking = missing_ingredients(recipe, &pantry_names);
                    if lacking.is_empty() {
                        println!("      ✅ You have everything");
                    } else {
                        println!("      🛒 Missing: {}", lacking.join(", "));
                    }
                }
            }
        }
        RecipesCommand::Show { id, json } => {
            let entry = find_recipe(recipes.as_ref(), &id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            } else {
                display_recipe(&entry.recipe);
                println!(
                    "🗂️  [{}] saved by {} on {}",
                    entry.id,
                    entry.created_by,
                    entry.created_at.format("%Y-%m-%d")
                );
            }
        }
        RecipesCommand::Edit {
            id,
            name,
            difficulty,
            servings,
            cooking_time,
            tags,
        } => {
            let mut recipe = find_recipe(recipes.as_ref(), &id).await?.recipe;
            if let Some(name) = name.filter(|n| !n.trim().is_empty()) {
                recipe.name = name.trim().to_string();
            }
            if let Some(difficulty) = difficulty {
                recipe.difficulty = difficulty;
            }
            if let Some(servings) = servings {
                recipe.servings = positive("servings", servings)?;
            }
            if let Some(minutes) = cooking_time {
                recipe.cooking_time = positive("cooking time", minutes)?;
            }
            if !tags.is_empty() {
                recipe.tags = tags;
            }
            let updated = recipes.update(&id, &recipe).await?;
            println!("✏️  Updated {} [{}]", updated.recipe.name, updated.id);
        }
        RecipesCommand::Import { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let document: serde_json::Value = serde_json::from_str(&content)?;
            let imported = import_recipes(&document);
            if imported.is_empty() {
                println!("📭 No recipes with a name found in {}", file.display());
                return Ok(());
            }

            let total = imported.len();
            let mut failed = 0;
            for (i, recipe) in imported.iter().enumerate() {
                match recipes.insert(recipe, &config.user_id).await {
                    Ok(stored) => println!("✅ [{}/{}] {} [{}]", i + 1, total, recipe.name, stored.id),
                    Err(e) => {
                        failed += 1;
                        tracing::warn!(recipe = %recipe.name, error = %e, "Recipe import failed");
                        println!("❌ [{}/{}] {}: {}", i + 1, total, recipe.name, e);
                    }
                }
            }
            println!("📊 Imported {}, failed {}", total - failed, failed);
            if failed == total {
                return Err(PantryChefError::store("No recipe could be imported", None).into());
            }
        }
        RecipesCommand::Delete { id } => {
            recipes.delete(&id).await?;
            println!("🗑️  Deleted recipe {}", id);
        }
    }
    Ok(())
}

async fn find_recipe(recipes: &dyn RecipeStore, id: &str) -> Result<StoredRecipe> {
    recipes
        .select_all()
        .await?
        .into_iter()
        .find(|entry| entry.id == id)
        .ok_or_else(|| PantryChefError::store(format!("Recipe '{}' not found", id), Some(404)).into())
}

fn positive(field: &str, value: u32) -> Result<u32> {
    if value == 0 {
        return Err(PantryChefError::validation(format!("{} must be positive", field)).into());
    }
    Ok(value)
}

fn parse_date(raw: &str) -> Result<chrono::DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| PantryChefError::validation(format!("Invalid date '{}', expected YYYY-MM-DD", raw)))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| PantryChefError::validation(format!("Invalid date '{}'", raw)))?;
    Ok(Utc.from_utc_datetime(&midnight))
}

fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Print, write or dump the recipe as requested
fn emit(recipe: &GeneratedRecipe, json: bool, output: Option<&Path>) -> Result<()> {
    if let Some(path) = output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(recipe)?;
        std::fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        if !json {
            println!("💾 Recipe written to {}", path.display());
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(recipe)?);
    } else {
        display_recipe(recipe);
    }
    Ok(())
}

async fn maybe_save(
    backend: &StoreBackend,
    config: &AppConfig,
    recipe: &GeneratedRecipe,
    output: &OutputArgs,
) -> Result<()> {
    let save = output.save || (!output.json && std::io::stdin().is_terminal() && confirm_save());
    if save {
        let stored = backend.recipes().insert(recipe, &config.user_id).await?;
        if !output.json {
            println!("💾 Saved as [{}] in {}", stored.id, backend.describe());
        }
    }
    Ok(())
}

fn confirm_save() -> bool {
    inquire::Confirm::new("Save this recipe?")
        .with_default(false)
        .prompt()
        .unwrap_or(false)
}

fn display_recipe(recipe: &GeneratedRecipe) {
    println!();
    println!("🍳 {}", recipe.name);
    println!("═══════════════════════════════════");
    println!(
        "⏱️  {}   📊 {}   🍽️  serves {}",
        format_cooking_time(recipe.cooking_time),
        recipe.difficulty,
        recipe.servings
    );
    if !recipe.tags.is_empty() {
        println!("🏷️  {}", recipe.tags.join(", "));
    }

    println!();
    println!("🥕 Ingredients:");
    for ingredient in &recipe.ingredients {
        let marker = if ingredient.is_available { "✅" } else { "🛒" };
        println!("  {} {} - {}", marker, ingredient.name, ingredient.quantity);
    }

    println!();
    println!("📝 Instructions:");
    for (i, step) in recipe.instructions.iter().enumerate() {
        println!("  {}. {}", i + 1, step);
    }

    if !recipe.tips.is_empty() {
        println!();
        println!("💡 Tips:");
        for tip in &recipe.tips {
            println!("  • {}", tip);
        }
    }

    if let Some(nutrition) = &recipe.nutrition {
        let parts: Vec<String> = [
            ("kcal", nutrition.calories),
            ("protein", nutrition.protein),
            ("carbs", nutrition.carbs),
            ("fat", nutrition.fat),
        ]
        .iter()
        .filter_map(|(label, value)| value.map(|v| format!("{} {}", v, label)))
        .collect();
        if !parts.is_empty() {
            println!();
            println!("🔬 {}", parts.join(" · "));
        }
    }

    if let Some(image) = &recipe.image {
        println!();
        println!("🖼️  {}", image);
    }
    println!();
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        println!("😔 Nothing came back. Check your API configuration and try again.");
        return;
    }
    println!("{}:", title);
    for item in items {
        println!("  • {}", item);
    }
}
