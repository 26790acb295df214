use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use pipeline::PolicyKind;
use server::{AnalysisState, DetailState, PipelineConfig, RecommendationOrchestrator, SessionSnapshot};
use sources::StaticIdentityProvider;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

use domain::ImageRef;

/// Fridge Chef - recipe suggestions from a photo of your ingredients
#[derive(Parser)]
#[command(name = "fridge-chef")]
#[command(about = "Identify an ingredient in a photo and suggest recipes for it", long_about = None)]
struct Cli {
    /// Labeling service base URL (overrides VISION_SERVICE_URL)
    #[arg(long, global = true)]
    vision_url: Option<String>,

    /// Recipe catalog base URL (overrides RECIPE_CATALOG_URL)
    #[arg(long, global = true)]
    catalog_url: Option<String>,

    /// Timeout in seconds for every HTTP call (overrides HTTP_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// Ingredient selection policy: positional or highest-confidence
    #[arg(long, global = true)]
    policy: Option<PolicyKind>,

    /// Label position used by the positional policy
    #[arg(long, global = true)]
    ordinal: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze an image and list matching recipes
    Analyze {
        /// Publicly reachable URL of the image
        #[arg(long)]
        image_url: String,

        /// Signed-in user id, used for the greeting and the feed
        #[arg(long)]
        uid: Option<String>,

        /// Load the detail of this recipe after the search
        #[arg(long)]
        select: Option<String>,
    },

    /// Show the detail of one recipe
    Recipe {
        /// Catalog recipe id
        #[arg(long)]
        id: String,
    },

    /// Resolve the nickname of a user
    Whoami {
        /// User id to resolve; signed out when omitted
        #[arg(long)]
        uid: Option<String>,
    },

    /// List the ingredient photos posted by a user
    Feed {
        /// User id whose nickname owns the photos
        #[arg(long)]
        uid: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Analyze {
            image_url,
            uid,
            select,
        } => handle_analyze(&config, image_url, uid, select).await?,
        Commands::Recipe { id } => handle_recipe(&config, id).await?,
        Commands::Whoami { uid } => handle_whoami(&config, uid).await?,
        Commands::Feed { uid } => handle_feed(&config, uid).await?,
    }

    Ok(())
}

/// Environment first, then command-line flags on top
fn load_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut config = PipelineConfig::from_env().context("Failed to load configuration")?;

    if let Some(url) = &cli.vision_url {
        config.vision.base_url = url.clone();
    }
    if let Some(url) = &cli.catalog_url {
        config.catalog.base_url = url.clone();
    }
    if let Some(secs) = cli.timeout_secs {
        config.set_timeout(Duration::from_secs(secs));
    }
    if let Some(policy) = cli.policy {
        config.set_policy(policy);
    }
    if let Some(ordinal) = cli.ordinal {
        config.set_ordinal(ordinal);
    }

    debug!("Configuration: {:?}", config);
    Ok(config)
}

fn build_orchestrator(config: &PipelineConfig, uid: Option<String>) -> RecommendationOrchestrator {
    let identity = match uid {
        Some(uid) => StaticIdentityProvider::signed_in(uid),
        None => StaticIdentityProvider::signed_out(),
    };
    RecommendationOrchestrator::from_config(config, Arc::new(identity))
}

/// Handle the 'analyze' command
async fn handle_analyze(
    config: &PipelineConfig,
    image_url: String,
    uid: Option<String>,
    select: Option<String>,
) -> Result<()> {
    let orchestrator = build_orchestrator(config, uid);

    println!("Analyzing {}...", image_url);
    let start = Instant::now();
    let (_, _) = tokio::join!(
        orchestrator.activate(),
        orchestrator.submit_image(Some(ImageRef::new(image_url)))
    );
    let elapsed = start.elapsed();

    let snapshot = orchestrator.snapshot().await;
    print_analysis(&snapshot);
    println!("{}", format!("Finished in {:.2?}", elapsed).dimmed());

    if let Some(recipe_id) = select {
        orchestrator.select_recipe(&recipe_id).await;
        print_detail(&orchestrator.snapshot().await.detail);
    }

    if snapshot.error_message().is_some() {
        bail!("analysis failed");
    }
    Ok(())
}

/// Handle the 'recipe' command
async fn handle_recipe(config: &PipelineConfig, id: String) -> Result<()> {
    let orchestrator = build_orchestrator(config, None);
    orchestrator.select_recipe(&id).await;

    let detail = orchestrator.snapshot().await.detail;
    print_detail(&detail);
    if detail.error_message().is_some() {
        bail!("recipe {} could not be loaded", id);
    }
    Ok(())
}

/// Handle the 'whoami' command
async fn handle_whoami(config: &PipelineConfig, uid: Option<String>) -> Result<()> {
    let signed_in = uid.is_some();
    let orchestrator = build_orchestrator(config, uid);
    orchestrator.resolve_identity().await;

    let snapshot = orchestrator.snapshot().await;
    match &snapshot.nickname {
        Some(nickname) => println!("{} {}", "Nickname:".bold(), nickname.green()),
        None if signed_in => println!(
            "{} {}",
            "Nickname:".bold(),
            format!("{} (profile store unavailable)", snapshot.display_nickname()).yellow()
        ),
        None => println!(
            "{} {}",
            "Nickname:".bold(),
            format!("{} (signed out)", snapshot.display_nickname()).yellow()
        ),
    }
    Ok(())
}

/// Handle the 'feed' command
async fn handle_feed(config: &PipelineConfig, uid: Option<String>) -> Result<()> {
    let orchestrator = build_orchestrator(config, uid);
    // A resolved nickname re-runs the feed query
    orchestrator.resolve_identity().await;

    let snapshot = orchestrator.snapshot().await;
    println!(
        "{}",
        format!("Ingredient photos by {}:", snapshot.display_nickname())
            .bold()
            .blue()
    );
    if snapshot.feed.is_empty() {
        println!("  (none)");
    }
    for record in &snapshot.feed {
        println!("{}{} {}", "• ".green(), record.id, record.image_url.dimmed());
    }
    Ok(())
}

/// Print the outcome of an analysis run
fn print_analysis(snapshot: &SessionSnapshot) {
    let labels = snapshot.analysis.labels();
    if !labels.is_empty() {
        println!("{}", "Labels:".bold().blue());
        for (i, label) in labels.iter().enumerate() {
            println!(
                "  {}. {} ({:.0}%)",
                (i + 1).to_string().green(),
                label.name,
                label.confidence * 100.0
            );
        }
    }

    if let Some(message) = snapshot.ingredient_message() {
        println!("{}", message.bold());
    }

    match &snapshot.analysis {
        AnalysisState::Analyzed { recipes, .. } if recipes.is_empty() => {
            println!("{}", "No recipes found.".yellow());
        }
        AnalysisState::Analyzed { recipes, .. } => {
            println!("{}", "Recipes:".bold().blue());
            for (i, recipe) in recipes.iter().enumerate() {
                println!(
                    "{}. {} [{}]",
                    (i + 1).to_string().green(),
                    recipe.title,
                    recipe.id
                );
            }
        }
        AnalysisState::Failed { error, .. } => {
            if let Some(message) = snapshot.error_message() {
                println!("{} {}", "✗".red(), message.red());
            }
            println!("  {}", error.to_string().dimmed());
        }
        AnalysisState::Idle | AnalysisState::Analyzing { .. } => {}
    }
}

/// Print the detail sub-state
fn print_detail(detail: &DetailState) {
    match detail {
        DetailState::Loaded { recipe_id, detail } => {
            println!("{} {}", detail.title.bold().blue(), format!("[{}]", recipe_id).dimmed());
            println!("{}", detail.thumbnail_url.dimmed());
            if let Some(video) = &detail.video_url {
                println!("Video: {}", video);
            }
            println!();
            println!("{}", detail.instructions);
        }
        DetailState::Failed { recipe_id, error } => {
            let message = detail.error_message().unwrap_or_default();
            println!("{} {} ({})", "✗".red(), message.red(), recipe_id);
            println!("  {}", error.to_string().dimmed());
        }
        DetailState::Idle | DetailState::Loading { .. } => {}
    }
}
