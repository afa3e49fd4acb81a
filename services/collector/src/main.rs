//! Collector - Fetches and summarizes vaccination search insights data
//!
//! Responsibilities:
//! - Fetch region metadata, regional/global trends and top queries
//! - Pivot trend tables into per-place time-series
//! - Print summaries, per-date aggregates or JSON for the charting layer
//!
//! Usage:
//!   # Regions of one country:
//!   cargo run --bin collector -- regions --country US
//!
//!   # Regional trends, aggregated per state for one date:
//!   cargo run --bin collector -- regional --country US --date 2021-03-01
//!
//!   # Global trends as JSON:
//!   cargo run --bin collector -- global --json
//!
//!   # Merged L0/L1 top queries:
//!   cargo run --bin collector -- queries --country US --date 2021-03-01
//!
//!   # From a local checkout of the data directory:
//!   cargo run --bin collector -- --data-url ./data regions

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use insights::selection::{
    aggregate_region_data_for_date, build_date_range_list, select_region_one_trends,
    select_region_two_trends, sub_region_one_code, trend_value,
};
use insights::{
    Config, CountryMetadata, CountyTable, HttpSource, InsightsStore, QueryKey, RegionType,
    TrendValue, TrendValueType,
};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "collector", about = "Fetches and summarizes vaccination search insights data")]
struct Args {
    /// Base URL or directory holding regions.csv and the trend files
    #[arg(long, global = true)]
    data_url: Option<String>,

    /// CSV (name,code) with fallback county codes for uncoded sub-region-2 rows
    #[arg(long, global = true)]
    counties: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classified regions, counted per hierarchy level
    Regions {
        /// Only regions of this country code
        #[arg(long)]
        country: Option<String>,
    },

    /// Regional trends of one country
    Regional {
        #[arg(long)]
        country: String,

        /// Data file name (default: {country}_vaccination_search_insights.csv)
        #[arg(long)]
        data_file: Option<String>,

        /// Print the per-state aggregate for this date
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Dump the pivoted time-series as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Country-level trends from the global file
    Global {
        /// Print the series of one place only
        #[arg(long)]
        place: Option<String>,

        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Merged L0/L1 top queries of one country
    Queries {
        #[arg(long)]
        country: String,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Fetch a geography boundary document
    Geo {
        #[arg(long)]
        id: String,
    },
}

type Store = InsightsStore<HttpSource>;

/// Table cell for a metric; NaN is missing data.
fn format_value(value: f64) -> String {
    if value.is_nan() {
        "-".to_string()
    } else {
        format!("{:.2}", value)
    }
}

fn series_summary(series: &[TrendValue]) -> String {
    let present = series.iter().filter(|v| !v.value.is_nan()).count();
    match (series.first(), series.last()) {
        (Some(first), Some(last)) => format!(
            "{} points ({} with data), {} .. {}",
            series.len(),
            present,
            first.date,
            last.date
        ),
        _ => "no points".to_string(),
    }
}

async fn load_county_table(path: Option<&PathBuf>) -> Result<CountyTable> {
    let Some(path) = path else {
        return Ok(CountyTable::default());
    };
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read county table {}", path.display()))?;
    let table = CountyTable::from_csv(&content, &path.to_string_lossy())?;
    println!("County fallback table: {} entries", table.len());
    Ok(table)
}

async fn run_regions(store: &Store, country: Option<&str>) -> Result<()> {
    let catalog = store.fetch_region_data().await?;

    let mut per_type: BTreeMap<&str, usize> = BTreeMap::new();
    let mut matched = 0;
    for region in catalog.values() {
        if let Some(code) = country {
            if region.country_region_code != code {
                continue;
            }
        }
        matched += 1;
        let level = region.region_type.map(RegionType::as_str).unwrap_or("unclassified");
        *per_type.entry(level).or_default() += 1;
    }

    println!("\n=== Regions ===");
    println!("Total: {} (matching: {})", catalog.len(), matched);
    println!("{:-<40}", "");
    for (level, count) in &per_type {
        println!("  {:<16} {}", level, count);
    }
    println!("{:-<40}", "");
    Ok(())
}

async fn run_regional(
    store: &Store,
    counties: &CountyTable,
    country: CountryMetadata,
    date: Option<NaiveDate>,
    json: bool,
) -> Result<()> {
    let trends = store.fetch_regional_trends_data(&country).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&*trends)?);
        return Ok(());
    }

    let lines = store.fetch_regional_trend_lines(&country).await?;
    let dates = build_date_range_list(lines.iter());
    let region_one = select_region_one_trends(&lines, counties);
    let region_two = select_region_two_trends(&lines, counties);

    println!("\n=== Regional Trends: {} ===", country.country_code);
    println!("File: {}", country.data_file);
    println!("Rows: {}", lines.len());
    println!("Places: {}", trends.len());
    println!("Sub-region-1 rows: {}", region_one.len());
    println!("Sub-region-2 rows: {}", region_two.len());
    match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => {
            println!("Dates: {} .. {} ({} weeks)", first, last, dates.len())
        }
        _ => println!("Dates: none"),
    }

    if let Some(date) = date {
        let date = date.format("%Y-%m-%d").to_string();
        let aggregate = aggregate_region_data_for_date(region_one.iter().copied(), &date, |line| {
            sub_region_one_code(line).to_string()
        });
        if aggregate.is_empty() {
            anyhow::bail!("No sub-region-1 rows for {}", date);
        }

        let by_code: BTreeMap<_, _> = aggregate.into_iter().collect();
        let lines_on_date: BTreeMap<&str, _> = region_one
            .iter()
            .filter(|line| line.date == date)
            .map(|line| (sub_region_one_code(line), *line))
            .collect();

        println!("\nAggregate for {}:", date);
        println!(
            "  {:<12} {:>12} {:>12} {:>12}",
            "code",
            TrendValueType::Vaccination,
            TrendValueType::Intent,
            TrendValueType::Safety
        );
        for (code, agg) in &by_code {
            println!(
                "  {:<12} {:>12} {:>12} {:>12}",
                if code.is_empty() { "(country)" } else { code.as_str() },
                format_value(agg.sni_covid19_vaccination),
                format_value(agg.sni_vaccination_intent),
                format_value(agg.sni_safety_side_effects),
            );
        }

        let scale: Vec<String> = TrendValueType::ALL
            .iter()
            .map(|kind| {
                let max = lines_on_date
                    .values()
                    .map(|line| trend_value(*kind, Some(*line)))
                    .fold(0.0_f64, f64::max);
                format!("{}={}", kind, max)
            })
            .collect();
        println!("  Map scale maximum: {}", scale.join(", "));
    }

    Ok(())
}

async fn run_global(store: &Store, place: Option<&str>, json: bool) -> Result<()> {
    let trends = store.fetch_global_trends_data().await?;

    if let Some(place) = place {
        let bundle = trends
            .get(place)
            .with_context(|| format!("No global trends for place {}", place))?;
        if json {
            println!("{}", serde_json::to_string_pretty(bundle)?);
        } else {
            println!("\n=== Global Trends: {} ===", place);
            for value in &bundle.trends.covid19_vaccination {
                println!("  {}  {}", value.date, format_value(value.value));
            }
        }
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&*trends)?);
        return Ok(());
    }

    let lines = store.fetch_global_trend_lines().await?;
    println!("\n=== Global Trends ===");
    println!("Rows: {} (excluded: {:?})", lines.len(), store.config().excluded_countries);
    println!("{:-<60}", "");
    for (place_id, bundle) in trends.iter() {
        let name = lines
            .iter()
            .find(|line| &line.place_id == place_id)
            .map(|line| line.country_region.as_str())
            .unwrap_or(place_id.as_str());
        println!("  {:<24} {}", name, series_summary(&bundle.trends.covid19_vaccination));
    }
    println!("{:-<60}", "");
    Ok(())
}

async fn run_queries(store: &Store, country: &str, date: Option<NaiveDate>) -> Result<()> {
    let merged = store.fetch_top_level_queries(country).await?;
    let date = date.map(|d| d.format("%Y-%m-%d").to_string());

    let mut keys: Vec<&QueryKey> = merged
        .keys()
        .filter(|key| date.as_deref().map_or(true, |d| key.date == d))
        .collect();
    keys.sort();

    println!("\n=== Top Queries: {} ===", country);
    println!("Buckets: {} (showing {})", merged.len(), keys.len());
    println!("Known dates: {}", store.top_queries_dates().await.join(", "));

    for key in keys {
        println!("\n[{}] {} / {} / {}", key.date, key.place_id, key.query_type, key.category);
        for query in &merged[key] {
            let rank = query.rank.map_or_else(|| "-".to_string(), |r| r.to_string());
            println!("  {:>3}. {}", rank, query.query);
        }
    }
    Ok(())
}

async fn run_geo(store: &Store, id: &str) -> Result<()> {
    let doc = store.fetch_zip_data(id).await?;
    println!("\n=== Geo: {} ===", id);
    match doc.as_object() {
        Some(object) => {
            for key in object.keys() {
                println!("  {}", key);
            }
            if let Some(features) = doc.get("features").and_then(|f| f.as_array()) {
                println!("Features: {}", features.len());
            }
        }
        None => println!("  (not a JSON object)"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = Config::from_env().context("Invalid VSI_* configuration")?;
    if let Some(url) = args.data_url {
        config = config.with_data_url(url);
    }

    let source = HttpSource::new(&config).context("Failed to build HTTP client")?;
    let store = InsightsStore::new(config, source);
    info!(data_url = %store.config().data_url, "collector starting");

    match args.command {
        Command::Regions { country } => run_regions(&store, country.as_deref()).await,
        Command::Regional {
            country,
            data_file,
            date,
            json,
        } => {
            let counties = load_county_table(args.counties.as_ref()).await?;
            let metadata = match data_file {
                Some(file) => CountryMetadata::new(&country, file),
                None => CountryMetadata::for_country(&country),
            };
            run_regional(&store, &counties, metadata, date, json).await
        }
        Command::Global { place, json } => run_global(&store, place.as_deref(), json).await,
        Command::Queries { country, date } => run_queries(&store, &country, date).await,
        Command::Geo { id } => run_geo(&store, &id).await,
    }
}
