mod api;
mod server;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use opportunity_scout::config::DiscoveryConfig;
use opportunity_scout::error::DiscoveryError;
use opportunity_scout::opportunity::DiscoveryPipeline;
use opportunity_scout::sources::load_records;
use opportunity_scout::{format_float, format_number, format_percent, OpportunityReport};

#[derive(Parser)]
#[command(name = "opportunity-scout", about = "Product opportunity discovery over social content")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Discover(DiscoverArgs),
    Serve(ServeArgs),
    Catalog,
    InitConfig(InitConfigArgs),
}

#[derive(Args, Debug, Clone)]
struct DiscoverArgs {
    /// JSON array of source records; reads stdin when omitted.
    #[arg(long)]
    input: Option<PathBuf>,
    #[arg(long)]
    clusters: Option<usize>,
    #[arg(long)]
    seed: Option<u64>,
    #[arg(long, default_value_t = 10)]
    top: usize,
    #[arg(long)]
    json: bool,
    #[arg(long)]
    details: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: String,
    #[arg(long, default_value_t = 8787)]
    port: u16,
}

#[derive(Args, Debug, Clone)]
struct InitConfigArgs {
    #[arg(default_value = "config/discovery.toml")]
    path: PathBuf,
}

#[tokio::main]
async fn main() {
    load_dotenv();
    if let Err(err) = run().await {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), DiscoveryError> {
    let cli = Cli::parse();
    let (config, _) = DiscoveryConfig::load(cli.config)?;
    init_tracing(&config.logging.level);

    match cli.command {
        Command::Discover(args) => run_discover(args, &config),
        Command::Serve(args) => {
            let pipeline = DiscoveryPipeline::from_config(&config)?;
            server::serve(args, pipeline).await
        }
        Command::Catalog => run_catalog(&config),
        Command::InitConfig(args) => {
            DiscoveryConfig::default().write(&args.path)?;
            println!("Wrote default config to {}", args.path.display());
            Ok(())
        }
    }
}

fn run_discover(args: DiscoverArgs, config: &DiscoveryConfig) -> Result<(), DiscoveryError> {
    let pipeline = DiscoveryPipeline::from_config(config)?;
    let payload = read_input(args.input.as_deref())?;
    let items = load_records(&payload)?;

    let k = args.clusters.unwrap_or_else(|| pipeline.k());
    if k == 0 {
        return Err(DiscoveryError::InvalidInput("clusters must be at least 1".to_string()));
    }
    let mut rng = pipeline.rng(args.seed);
    let report = pipeline.run_with_rng(&items, k, &mut rng, Utc::now());

    if args.json {
        let payload = serde_json::to_string_pretty(&report)?;
        println!("{}", payload);
        return Ok(());
    }

    print_report(&report, args.top, args.details);
    Ok(())
}

fn print_report(report: &OpportunityReport, top: usize, details: bool) {
    println!(
        "Items: {} total | {} clustered | {} skipped",
        format_number(report.items_total as f64),
        format_number(report.items_clustered as f64),
        format_number(report.items_skipped as f64)
    );
    println!(
        "Clusters: {} | Opportunities: {}",
        report.clusters,
        report.opportunities.len()
    );

    for opportunity in report.opportunities.iter().take(top) {
        let stats = &opportunity.stats;
        println!(
            "\n#{} {} ({}) via {} match",
            opportunity.rank,
            opportunity.product.name,
            opportunity.product.category,
            opportunity.match_source.label()
        );
        println!(
            "  viability {} | trend {} | avg engagement {} | cluster {} ({} items)",
            format_float(stats.viability_score, 1),
            format_float(stats.trend_score, 1),
            format_number(stats.avg_engagement),
            opportunity.cluster_id,
            stats.size
        );
        println!(
            "  price {} | sourcing {} | margin {} ({})",
            format_number(opportunity.product.expected_price),
            format_number(opportunity.product.china_price),
            format_number(opportunity.margin),
            format_percent(opportunity.margin_rate)
        );
        if !stats.problems.is_empty() {
            println!("  problems: {}", stats.problems.join(", "));
        }
        if !stats.top_products.is_empty() {
            let products: Vec<String> = stats
                .top_products
                .iter()
                .map(|product| format!("{} x{}", product.product, product.count))
                .collect();
            println!("  mentioned: {}", products.join(", "));
        }

        if details {
            println!("  target: {}", opportunity.product.target_customer);
            println!("  product keywords: {}", stats.product_keywords.join(", "));
            println!(
                "  problem score {} | product score {}",
                format_float(stats.problem_score, 3),
                format_float(stats.product_score, 3)
            );
            println!("  sample: {}", stats.sample_text);
        }
    }
}

fn run_catalog(config: &DiscoveryConfig) -> Result<(), DiscoveryError> {
    let pipeline = DiscoveryPipeline::from_config(config)?;
    for entry in pipeline.catalog().entries() {
        println!(
            "{} [{}] {} -> {} | {}",
            entry.name,
            entry.category,
            format_number(entry.china_price),
            format_number(entry.expected_price),
            entry.keywords.join(", ")
        );
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String, DiscoveryError> {
    if let Some(path) = path {
        return std::fs::read_to_string(path).map_err(|source| DiscoveryError::ReadFile {
            path: path.to_path_buf(),
            source,
        });
    }

    let mut buffer = String::new();
    io::stdin()
        .read_to_string(&mut buffer)
        .map_err(|source| DiscoveryError::ReadFile {
            path: PathBuf::from("<stdin>"),
            source,
        })?;
    if buffer.trim().is_empty() {
        return Err(DiscoveryError::InvalidInput(
            "missing input: pass --input or pipe JSON on stdin".to_string(),
        ));
    }
    Ok(buffer)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_env("DISCOVERY_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn load_dotenv() {
    let _ = dotenvy::dotenv();
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let manifest_path = Path::new(manifest_dir).join(".env");
    let _ = dotenvy::from_path(manifest_path);
}
