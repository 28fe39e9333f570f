use std::fs;
use std::path::PathBuf;

use catalog::{CatalogDocument, CatalogProvider, Scene, SearchQuery, StaticCatalog};
use clap::{Parser, Subcommand};
use foundation::math::{Hemisphere, UtmZone, utm_box_to_extent};
use layers::css::css_filter;
use layers::symbology::{FilterParams, RENDER_PRESETS, render_preset};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Offline helpers for the scene comparison viewer")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Filter a catalog by date range and cloud ceiling, newest first.
    Search {
        /// Catalog document (`{"images": [...]}`); the built-in demo set when omitted.
        #[arg(long)]
        catalog: Option<PathBuf>,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        #[arg(long)]
        max_cloud: Option<u8>,
        /// Print the matching scenes as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the clamped grading parameters and their CSS filter string.
    Filter {
        /// Start from a named render preset.
        #[arg(long)]
        preset: Option<String>,
        #[arg(long, allow_negative_numbers = true)]
        brightness: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        contrast: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        saturation: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        hue: Option<f64>,
        #[arg(long)]
        sepia: Option<f64>,
    },
    /// List the render presets.
    Presets,
    /// Convert a UTM bounding box to a WGS84 extent.
    #[command(name = "utm-to-wgs84")]
    Utm2Wgs84 {
        #[arg(long)]
        zone: u8,
        #[arg(long, default_value_t = false)]
        south: bool,
        min_easting: f64,
        min_northing: f64,
        max_easting: f64,
        max_northing: f64,
    },
}

fn main() {
    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match args.command {
        Command::Search {
            catalog,
            from,
            to,
            max_cloud,
            json,
        } => cmd_search(catalog, &from, &to, max_cloud, json),
        Command::Filter {
            preset,
            brightness,
            contrast,
            saturation,
            hue,
            sepia,
        } => {
            let base = match preset {
                Some(id) => {
                    render_preset(&id)
                        .ok_or_else(|| format!("unknown preset '{id}'"))?
                        .params
                }
                None => FilterParams::NEUTRAL,
            };
            let params = override_params(base, brightness, contrast, saturation, hue, sepia);
            print_json(&FilterReport::new(params))
        }
        Command::Presets => {
            for p in RENDER_PRESETS.iter() {
                println!("{:<16} {:<22} {}", p.id, p.name, css_filter(&p.params));
            }
            Ok(())
        }
        Command::Utm2Wgs84 {
            zone,
            south,
            min_easting,
            min_northing,
            max_easting,
            max_northing,
        } => {
            let hemisphere = if south {
                Hemisphere::South
            } else {
                Hemisphere::North
            };
            let zone = UtmZone::new(zone, hemisphere)
                .ok_or_else(|| format!("utm zone {zone} out of range 1..=60"))?;
            let extent = utm_box_to_extent(
                zone,
                [min_easting, min_northing],
                [max_easting, max_northing],
            );
            print_json(&[extent.min_lon, extent.min_lat, extent.max_lon, extent.max_lat])
        }
    }
}

fn cmd_search(
    catalog: Option<PathBuf>,
    from: &str,
    to: &str,
    max_cloud: Option<u8>,
    json: bool,
) -> Result<(), String> {
    let provider = match catalog {
        Some(path) => load_catalog(&path)?,
        None => StaticCatalog::fixture(),
    };
    let query = SearchQuery::parse(from, to, max_cloud).map_err(|e| e.to_string())?;
    let found = provider.search(&query);
    info!(count = found.len(), "search finished");

    if json {
        return print_json(&CatalogDocument { images: found });
    }
    if found.is_empty() {
        println!("no scenes match");
        return Ok(());
    }
    for scene in &found {
        println!("{}", scene_row(scene));
    }
    Ok(())
}

fn load_catalog(path: &PathBuf) -> Result<StaticCatalog, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("read {}: {e}", path.display()))?;
    let doc = CatalogDocument::from_json(&raw).map_err(|e| format!("{}: {e}", path.display()))?;
    Ok(StaticCatalog::from_document(doc))
}

fn scene_row(scene: &Scene) -> String {
    format!(
        "{:<16} {}  cloud {:>3}%  {:<10} {}",
        scene.id, scene.date, scene.cloud_coverage_percent, scene.sensor, scene.url
    )
}

fn override_params(
    base: FilterParams,
    brightness: Option<f64>,
    contrast: Option<f64>,
    saturation: Option<f64>,
    hue: Option<f64>,
    sepia: Option<f64>,
) -> FilterParams {
    FilterParams {
        brightness: brightness.unwrap_or(base.brightness),
        contrast: contrast.unwrap_or(base.contrast),
        saturation: saturation.unwrap_or(base.saturation),
        hue: hue.or(base.hue),
        sepia: sepia.or(base.sepia),
    }
    .clamped()
}

#[derive(Serialize)]
struct FilterReport {
    params: FilterParams,
    css: String,
}

impl FilterReport {
    fn new(params: FilterParams) -> Self {
        Self {
            css: css_filter(&params),
            params,
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{text}");
    Ok(())
}
