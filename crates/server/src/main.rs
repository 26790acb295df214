//! Simple test harness for the recommendation orchestrator.
//!
//! Runs one screen session end to end: activates the view (identity and feed)
//! while analyzing the image given on the command line.
//!
//! ```text
//! PRINCIPAL_UID=uid-1 cargo run -p server -- https://example.com/fridge.jpg
//! ```

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use domain::ImageRef;
use server::{PipelineConfig, RecommendationOrchestrator};
use sources::StaticIdentityProvider;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info,server=debug,sources=debug,pipeline=debug")
        .init();

    info!("Starting recipe recommender test harness");

    let config = PipelineConfig::from_env().context("Failed to load configuration")?;

    let identity = match env::var("PRINCIPAL_UID") {
        Ok(uid) => StaticIdentityProvider::signed_in(uid),
        Err(_) => {
            warn!("PRINCIPAL_UID not set, running signed out");
            StaticIdentityProvider::signed_out()
        }
    };
    let orchestrator = RecommendationOrchestrator::from_config(&config, Arc::new(identity));

    let image = env::args().nth(1).map(ImageRef::new);
    if image.is_none() {
        warn!("No image URL given, only identity and feed will run");
    }

    // Identity never gates analysis; run both branches side by side
    let ((), outcome) = tokio::join!(orchestrator.activate(), orchestrator.submit_image(image));
    info!("Analysis outcome: {:?}", outcome);

    let snapshot = orchestrator.snapshot().await;
    if let Some(message) = snapshot.ingredient_message() {
        info!("{}", message);
    }
    if let Some(message) = snapshot.error_message() {
        warn!("{}", message);
    }

    info!("Labels: {}", snapshot.analysis.labels().len());
    for (i, recipe) in snapshot.analysis.recipes().iter().enumerate() {
        info!("{}. {} [{}]", i + 1, recipe.title, recipe.id);
    }
    info!(
        "Feed for {}: {} photos",
        snapshot.display_nickname(),
        snapshot.feed.len()
    );

    Ok(())
}
