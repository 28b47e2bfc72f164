mod backend;
mod basket;
mod config;
mod errors;
mod ledger;
mod models;
mod resolver;
mod scanner;
mod scoring;
mod sources;
mod view;

#[cfg(test)]
#[allow(dead_code)]
mod testutil;

use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::backend::{BackendApi, BackendClient};
use crate::basket::{BasketAnalyzer, BasketBuilder};
use crate::config::Config;
use crate::errors::AppError;
use crate::ledger::Ledger;
use crate::models::impact::NewGoal;
use crate::resolver::ProductResolver;
use crate::scanner::{BarcodeScanner, SimulatedScanner};
use crate::scoring::{grade, impact_band, score_analysis, ScoreProvenance};
use crate::sources::backend::BackendSource;
use crate::sources::openfoodfacts::OpenFoodFactsSource;
use crate::sources::ProductSource;
use crate::view::{Panel, ProductView, RecommendationsPanel, ViewAssembler};

#[derive(Parser)]
#[command(name = "greenlabel", version, about = "Eco-score lookups for scanned grocery products")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a barcode and show its full product view
    Lookup { barcode: String },
    /// Scan a barcode (simulated capture) and look it up
    Scan,
    /// Analyze a basket of barcodes
    Basket { barcodes: Vec<String> },
    /// Show the scan history, newest first
    History,
    /// Erase the scan history
    ClearHistory {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// List previously analyzed baskets
    Baskets,
    /// Show aggregated impact statistics and badges
    Impact,
    /// Create a sustainability goal
    SetGoal {
        #[arg(long, default_value = "carbon_reduction")]
        goal_type: String,
        #[arg(long, default_value = "Reduce carbon footprint by 10%")]
        description: String,
        #[arg(long, default_value_t = 10.0)]
        target: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli.command, &config).await {
        eprintln!("Error: {e}");
        if e.is_retryable() {
            eprintln!("This looks temporary; please try again.");
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(command: Command, config: &Config) -> Result<(), AppError> {
    let timeout = Duration::from_secs(config.http_timeout_secs);
    let backend: Arc<dyn BackendApi> =
        Arc::new(BackendClient::new(config.backend_base_url.clone(), timeout));

    match command {
        Command::Lookup { barcode } => run_lookup(&barcode, backend, config).await,
        Command::Scan => {
            let scanner = SimulatedScanner::new();
            let mut session = scanner.start_session().await?;
            match session.next_decode().await {
                Some(barcode) => {
                    info!("scanned {barcode}");
                    run_lookup(&barcode, backend, config).await
                }
                None => Err(AppError::Validation("scan produced no barcode".to_string())),
            }
        }
        Command::Basket { barcodes } => run_basket(&barcodes, backend).await,
        Command::History => {
            let ledger = Ledger::new(backend);
            for entry in ledger.list().await? {
                let name = entry.product_name.as_deref().unwrap_or("(unknown product)");
                println!("{}  {}  {}", entry.searched_at.format("%Y-%m-%d %H:%M"), entry.barcode, name);
            }
            Ok(())
        }
        Command::ClearHistory { yes } => {
            if !yes && !confirm("Erase the entire scan history?")? {
                println!("Cancelled.");
                return Ok(());
            }
            Ledger::new(backend).clear().await?;
            println!("History cleared.");
            Ok(())
        }
        Command::Baskets => {
            let ledger = Ledger::new(backend);
            for basket in ledger.recent_baskets().await? {
                let when = basket
                    .created_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {} items, {:.2} kg CO2e, avg health {:.0}",
                    when,
                    basket.result.total_items,
                    basket.result.total_carbon,
                    basket.result.avg_health_score
                );
            }
            Ok(())
        }
        Command::Impact => run_impact(backend).await,
        Command::SetGoal {
            goal_type,
            description,
            target,
        } => {
            backend
                .create_goal(&NewGoal {
                    goal_type,
                    description,
                    target_value: target,
                    progress: 0.0,
                })
                .await?;
            println!("Goal created.");
            Ok(())
        }
    }
}

async fn run_lookup(
    barcode: &str,
    backend: Arc<dyn BackendApi>,
    config: &Config,
) -> Result<(), AppError> {
    let timeout = Duration::from_secs(config.http_timeout_secs);
    let sources: Vec<Arc<dyn ProductSource>> = vec![
        Arc::new(OpenFoodFactsSource::new(config.off_base_url.clone(), timeout)),
        Arc::new(BackendSource::new(Arc::clone(&backend))),
    ];
    let resolver = ProductResolver::new(sources, Arc::clone(&backend));
    let product = resolver.resolve(barcode).await?;

    let assembler = ViewAssembler::new(backend);
    let panels = assembler.present(product);
    for panel in panels {
        let _ = panel.await;
    }

    let view = assembler
        .current()
        .ok_or_else(|| AppError::Validation("no view after presentation".to_string()))?;
    print_view(&view);
    Ok(())
}

fn print_view(view: &ProductView) {
    let product = &view.product;
    let breakdown = &view.breakdown;

    println!("{}", product.display_name());
    if let Some(brand) = &product.brand {
        println!("  by {brand}");
    }
    println!(
        "Green score: {} (grade {}, {})",
        breakdown.overall_score,
        grade(breakdown.overall_score),
        impact_band(breakdown.overall_score)
    );
    println!("  {}", score_analysis(breakdown.overall_score));
    println!("  Source: {}", product.source.label());

    println!("Breakdown:");
    for (label, score) in [
        ("Packaging", breakdown.packaging_score),
        ("Nutrition", breakdown.nutrition_score),
        ("Environment", breakdown.environmental_score),
        ("Sustainability", breakdown.sustainability_score),
    ] {
        println!("  {label:<14} {score:>3}  (grade {})", grade(score));
    }
    if breakdown.provenance == ScoreProvenance::Synthesized {
        println!("  (facet scores estimated from the overall score)");
    }

    match &view.macros {
        Panel::Ready(macros) => {
            let split = macros.split();
            println!(
                "Macros (per {}): {:.0} kcal — protein {:.0}%, carbs {:.0}%, fat {:.0}%",
                macros.unit_basis(),
                macros.calories_kcal,
                split.protein_pct,
                split.carbs_pct,
                split.fat_pct
            );
        }
        Panel::Absent => {}
        Panel::Loading => println!("Macros: loading..."),
    }

    match &view.recipes {
        Panel::Ready(recipes) => {
            println!("Recipe ideas:");
            for recipe in recipes {
                match recipe.time_minutes {
                    Some(minutes) => println!("  - {} ({minutes} min)", recipe.title),
                    None => println!("  - {}", recipe.title),
                }
            }
        }
        Panel::Absent => {}
        Panel::Loading => println!("Recipes: loading..."),
    }

    match &view.recommendations {
        Panel::Ready(RecommendationsPanel::Alternatives(data)) => {
            if !data.database_products.is_empty() {
                println!("Better alternatives:");
                for alt in &data.database_products {
                    let name = alt.name.as_deref().unwrap_or(&alt.barcode);
                    match alt.green_score {
                        Some(score) => println!("  - {name} (score {score:.0})"),
                        None => println!("  - {name}"),
                    }
                }
            }
            if !data.ai_suggestions.is_empty() {
                println!("Suggested swaps:");
                for suggestion in &data.ai_suggestions {
                    println!("  - {} (est. score {:.0})", suggestion.name, suggestion.estimated_green_score);
                    if !suggestion.why_better.is_empty() {
                        println!("    {}", suggestion.why_better);
                    }
                }
            }
        }
        Panel::Ready(RecommendationsPanel::Excellent { score, tips }) => {
            println!("Excellent choice! This product already scores {score:.0}.");
            for tip in tips {
                println!("  tip: {tip}");
            }
        }
        Panel::Absent => {}
        Panel::Loading => println!("Recommendations: loading..."),
    }
}

async fn run_basket(barcodes: &[String], backend: Arc<dyn BackendApi>) -> Result<(), AppError> {
    let mut builder = BasketBuilder::new();
    for code in barcodes {
        builder.add(code);
    }

    let analyzer = BasketAnalyzer::new(backend);
    match analyzer.analyze(builder.barcodes()).await? {
        None => {
            println!("Basket is empty; nothing to analyze.");
            Ok(())
        }
        Some(result) => {
            println!(
                "{} items, {:.2} kg CO2e total, average health score {:.0}",
                result.total_items, result.total_carbon, result.avg_health_score
            );
            for item in &result.items {
                let name = item
                    .product_name
                    .as_deref()
                    .filter(|n| !n.is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(|| format!("Product {}", item.barcode));
                println!("  {:<30} {:.2} kg CO2e, health {}", name, item.carbon, item.health_score);
            }
            Ok(())
        }
    }
}

async fn run_impact(backend: Arc<dyn BackendApi>) -> Result<(), AppError> {
    match backend.impact_stats().await? {
        Some(stats) => {
            println!("Total carbon saved: {:.2} kg CO2e", stats.total_carbon_saved);
            if let Some(total) = stats.total_baskets {
                println!("Baskets analyzed: {total}");
            }
            if let Some(average) = stats.average_score {
                println!("Average basket score: {average:.0}");
            }
            if !stats.weekly_report.is_empty() {
                println!("\n{}", stats.weekly_report);
            }
            if !stats.active_goals.is_empty() {
                println!("Active goals:");
                for goal in &stats.active_goals {
                    println!(
                        "  - {} ({:.0}/{:.0})",
                        goal.description, goal.progress, goal.target_value
                    );
                }
            }
        }
        None => println!("No impact statistics yet."),
    }

    let badges = backend.badges().await?;
    if !badges.is_empty() {
        println!("Badges:");
        for badge in &badges {
            let name = badge.name.as_deref().unwrap_or("(unnamed)");
            match badge.description.as_deref() {
                Some(description) => println!("  - {name}: {description}"),
                None => println!("  - {name}"),
            }
        }
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool, AppError> {
    print!("{prompt} [y/N] ");
    std::io::stdout()
        .flush()
        .map_err(|e| AppError::Internal(e.into()))?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}
