use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use storereach::analysis::{
    ChainLocationsRecord, DistanceRecord, average_distance, load_json, rank_chains, save_json,
    save_records,
};
use storereach::api::{Enumerator, HttpDirectory, slugify};
use storereach::boundary::load_single_polygon;
use storereach::config::{DirectoryConfig, FileConfig};
use storereach::domain::{Coordinate, PointCloud, Polygon};
use storereach::export::{MapLayer, write_map};
use storereach::geometry::distance::FEET_PER_MILE;
use storereach::geometry::{SamplerOptions, sample, sample_with_rng};

/// Estimate the average distance from anywhere in a neighborhood to the
/// nearest store of a retail chain
///
/// Examples:
///   # Sample 2000 points inside boundaries/manhattan.geojson and save them
///   storereach sample -b Manhattan -n 2000 --seed 7 -o manhattan_cloud.json --map cloud.geojson
///
///   # Enumerate a chain's locations from the business directory
///   storereach fetch -c Starbucks -a "New York" -o starbucks.json
///
///   # Average distance to the nearest Starbucks, reusing saved data
///   storereach distance -c Starbucks --locations starbucks.json --cloud manhattan_cloud.json
///
///   # Compare several chains and write a distance table
///   storereach rank -b Manhattan -a "New York" --chains "Starbucks,Duane Reade,Chase" -o distances.json
#[derive(Parser, Debug)]
#[command(name = "storereach")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to config file (optional, auto-searches storereach.toml if not provided)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample a point cloud inside a boundary
    Sample {
        #[command(flatten)]
        sampling: SamplingArgs,

        /// Where to save the point cloud (JSON)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,

        /// Also write boundary and points as GeoJSON for a web map
        #[arg(long)]
        map: Option<PathBuf>,
    },
    /// Enumerate a chain's locations in an area
    Fetch {
        /// Chain name as listed in the directory
        #[arg(short = 'c', long)]
        chain: String,

        /// Area the directory ids are built from (e.g. "New York")
        #[arg(short = 'a', long)]
        area: Option<String>,

        /// Where to save the locations (defaults to {chain}-{area}.json)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
    /// Average distance from a boundary to a chain's nearest location
    Distance {
        /// Chain name as listed in the directory
        #[arg(short = 'c', long)]
        chain: String,

        /// Area the directory ids are built from
        #[arg(short = 'a', long)]
        area: Option<String>,

        /// Use locations saved by `fetch` instead of querying the directory
        #[arg(long)]
        locations: Option<PathBuf>,

        /// Reuse a point cloud saved by `sample`
        #[arg(long)]
        cloud: Option<PathBuf>,

        #[command(flatten)]
        sampling: SamplingArgs,

        /// Write boundary, cloud and locations as GeoJSON
        #[arg(long)]
        map: Option<PathBuf>,
    },
    /// Compare several chains against the same point cloud
    Rank {
        /// Comma-separated chain names (defaults to `chains` from the config file)
        #[arg(long, value_delimiter = ',')]
        chains: Vec<String>,

        /// Area the directory ids are built from
        #[arg(short = 'a', long)]
        area: Option<String>,

        /// Directory of cached location files; fetched chains are saved here
        #[arg(long)]
        cache_dir: Option<PathBuf>,

        /// Reuse a point cloud saved by `sample`
        #[arg(long)]
        cloud: Option<PathBuf>,

        #[command(flatten)]
        sampling: SamplingArgs,

        /// Where to save the distance table (JSON)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug, Clone, Default)]
struct SamplingArgs {
    /// Boundary name ({boundary_dir}/{name}.geojson) or a GeoJSON file path
    #[arg(short = 'b', long)]
    boundary: Option<String>,

    /// Directory holding named boundary files
    #[arg(long)]
    boundary_dir: Option<PathBuf>,

    /// Sample more than this many points
    #[arg(short = 'n', long)]
    samples: Option<usize>,

    /// Seed for reproducible sampling
    #[arg(long)]
    seed: Option<u64>,

    /// Give up sampling after this many candidate draws
    #[arg(long)]
    max_attempts: Option<u64>,
}

/// CLI flags layered over the config file
#[derive(Debug)]
struct Settings {
    boundary: Option<String>,
    boundary_dir: PathBuf,
    samples: usize,
    seed: Option<u64>,
    max_attempts: Option<u64>,
    area: Option<String>,
    chains: Vec<String>,
    output: Option<PathBuf>,
    verbose: bool,
    directory: DirectoryConfig,
}

impl Settings {
    fn resolve(cli_verbose: bool, file: FileConfig, sampling: Option<&SamplingArgs>) -> Self {
        let sampling = sampling.cloned().unwrap_or_default();

        Self {
            boundary: sampling.boundary.or(file.boundary),
            boundary_dir: sampling.boundary_dir.unwrap_or(file.boundary_dir),
            samples: sampling.samples.unwrap_or(file.samples),
            seed: sampling.seed.or(file.seed),
            max_attempts: sampling.max_attempts.or(file.max_attempts),
            area: file.area,
            chains: file.chains,
            output: file.output,
            verbose: cli_verbose || file.verbose,
            directory: file.directory.unwrap_or_default(),
        }
    }

    fn area(&self, arg: Option<String>) -> Result<String> {
        match arg.or_else(|| self.area.clone()) {
            Some(area) => Ok(area),
            None => bail!("No area given: pass --area/-a or set `area` in the config file"),
        }
    }

    fn print(&self) {
        println!("Configuration:");
        if let Some(ref b) = self.boundary {
            println!("  Boundary: {}", b);
        }
        println!("  Boundary dir: {}", self.boundary_dir.display());
        println!("  Samples: > {}", self.samples);
        match self.seed {
            Some(seed) => println!("  Seed: {}", seed),
            None => println!("  Seed: random"),
        }
        match self.max_attempts {
            Some(n) => println!("  Max sampling attempts: {}", n),
            None => println!("  Max sampling attempts: unlimited"),
        }
        if let Some(ref a) = self.area {
            println!("  Area: {}", a);
        }
        println!("  Directory API: {}", self.directory.api_url);
        println!();
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let total_start = Instant::now();

    let mut rejected = Vec::new();
    let file_config: FileConfig = if let Some(ref config_path) = cli.config {
        if config_path.exists() {
            let contents = std::fs::read_to_string(config_path)
                .context(format!("Failed to read config file: {:?}", config_path))?;
            toml::from_str(&contents).context("Failed to parse config file")?
        } else {
            bail!("Config file not found: {:?}", config_path);
        }
    } else {
        let discovery = FileConfig::discover();
        rejected = discovery.rejected;
        discovery.found.map(|(_, config)| config).unwrap_or_default()
    };

    init_tracing(cli.verbose || file_config.verbose);
    for (path, reason) in &rejected {
        warn!(path = %path.display(), error = %reason, "failed to parse config file");
    }

    println!("storereach - Nearest Store Distance Estimator");
    println!("=============================================");
    println!();

    match cli.command {
        Command::Sample {
            sampling,
            output,
            map,
        } => {
            let settings = Settings::resolve(cli.verbose, file_config, Some(&sampling));
            if settings.verbose {
                settings.print();
            }
            run_sample(&settings, output, map)?;
        }
        Command::Fetch {
            chain,
            area,
            output,
        } => {
            let settings = Settings::resolve(cli.verbose, file_config, None);
            if settings.verbose {
                settings.print();
            }
            let area = settings.area(area)?;
            run_fetch(&settings, &chain, &area, output)?;
        }
        Command::Distance {
            chain,
            area,
            locations,
            cloud,
            sampling,
            map,
        } => {
            let settings = Settings::resolve(cli.verbose, file_config, Some(&sampling));
            if settings.verbose {
                settings.print();
            }
            run_distance(&settings, &chain, area, locations, cloud, map)?;
        }
        Command::Rank {
            chains,
            area,
            cache_dir,
            cloud,
            sampling,
            output,
        } => {
            let settings = Settings::resolve(cli.verbose, file_config, Some(&sampling));
            if settings.verbose {
                settings.print();
            }
            let chains = if chains.is_empty() {
                settings.chains.clone()
            } else {
                chains
            };
            if chains.is_empty() {
                bail!("No chains given: pass --chains or set `chains` in the config file");
            }
            let area = settings.area(area)?;
            run_rank(&settings, &chains, &area, cache_dir, cloud, output)?;
        }
    }

    println!();
    println!(
        "Done! Total time: {:.1}s",
        total_start.elapsed().as_secs_f32()
    );

    Ok(())
}

fn run_sample(settings: &Settings, output: Option<PathBuf>, map: Option<PathBuf>) -> Result<()> {
    let polygon = load_polygon(settings)?;
    let cloud = build_cloud(&polygon, settings)?;

    let output_path = cloud_output_path(output, settings.boundary.as_deref());
    save_json(&output_path, &cloud).context("Failed to save point cloud")?;
    println!("Point cloud: {}", output_path.display());

    if let Some(map_path) = map {
        write_map(
            &map_path,
            &[
                MapLayer::Boundary {
                    name: "boundary",
                    polygon: &polygon,
                },
                MapLayer::Points {
                    name: "samples",
                    points: cloud.points(),
                },
            ],
        )
        .context("Failed to write map")?;
        println!("Map: {}", map_path.display());
    }

    Ok(())
}

fn run_fetch(settings: &Settings, chain: &str, area: &str, output: Option<PathBuf>) -> Result<()> {
    let locations = fetch_chain(&settings.directory, chain, area)?;
    if locations.is_empty() {
        warn!(chain, area, "directory returned no locations");
    }

    let output_path = output.unwrap_or_else(|| cache_file(Path::new("."), chain, area));
    let record = ChainLocationsRecord {
        chain: chain.to_string(),
        area: area.to_string(),
        locations,
    };
    save_json(&output_path, &record).context("Failed to save locations")?;
    println!("Locations: {}", output_path.display());

    Ok(())
}

fn run_distance(
    settings: &Settings,
    chain: &str,
    area: Option<String>,
    locations_path: Option<PathBuf>,
    cloud_path: Option<PathBuf>,
    map: Option<PathBuf>,
) -> Result<()> {
    let locations = match locations_path {
        Some(path) => {
            let record: ChainLocationsRecord =
                load_json(&path).context(format!("Failed to load locations: {:?}", path))?;
            println!(
                "Loaded {} locations for {} in {}",
                record.locations.len(),
                record.chain,
                record.area
            );
            record.locations
        }
        None => {
            let area = settings.area(area)?;
            fetch_chain(&settings.directory, chain, &area)?
        }
    };

    let polygon = match (&cloud_path, &map) {
        (Some(_), None) => None,
        _ => Some(load_polygon(settings)?),
    };
    let cloud = match (cloud_path, &polygon) {
        (Some(path), _) => load_cloud(&path)?,
        (None, Some(polygon)) => build_cloud(polygon, settings)?,
        (None, None) => bail!("Need a boundary or a saved point cloud"),
    };

    let spinner = create_spinner("Computing nearest-store distances...");
    let start = Instant::now();
    let feet = average_distance(&cloud, &locations)
        .context(format!("Failed to compute distance for {}", chain))?;
    spinner.finish_with_message(format!(
        "{}: {} ft on average ({:.2} mi) over {} points [{:.1}s]",
        chain,
        feet,
        feet as f64 / FEET_PER_MILE,
        cloud.len(),
        start.elapsed().as_secs_f32()
    ));

    if let (Some(map_path), Some(polygon)) = (map, &polygon) {
        write_map(
            &map_path,
            &[
                MapLayer::Boundary {
                    name: "boundary",
                    polygon,
                },
                MapLayer::Points {
                    name: "samples",
                    points: cloud.points(),
                },
                MapLayer::Points {
                    name: chain,
                    points: &locations,
                },
            ],
        )
        .context("Failed to write map")?;
        println!("Map: {}", map_path.display());
    }

    Ok(())
}

fn run_rank(
    settings: &Settings,
    chains: &[String],
    area: &str,
    cache_dir: Option<PathBuf>,
    cloud_path: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let cloud = match cloud_path {
        Some(path) => load_cloud(&path)?,
        None => build_cloud(&load_polygon(settings)?, settings)?,
    };

    let mut fetched: Vec<(String, Vec<Coordinate>)> = Vec::new();
    for chain in chains {
        match chain_locations(settings, chain, area, cache_dir.as_deref()) {
            Ok(locations) => fetched.push((chain.clone(), locations)),
            Err(e) => {
                warn!(chain = %chain, error = %e, "could not get locations");
                println!("  {}: skipped ({:#})", chain, e);
            }
        }
    }

    let spinner = create_spinner("Computing nearest-store distances...");
    let start = Instant::now();
    let ranked = rank_chains(&cloud, &fetched);
    spinner.finish_with_message(format!(
        "Compared {} chains over {} points [{:.1}s]",
        ranked.len(),
        cloud.len(),
        start.elapsed().as_secs_f32()
    ));

    println!();
    let mut records = Vec::new();
    for result in ranked {
        match result.feet {
            Ok(feet) => {
                println!("  {:>8} ft  {}", feet, result.chain);
                records.push(DistanceRecord {
                    chain: result.chain,
                    feet,
                });
            }
            Err(e) => println!("  {:>8}     {} ({})", "-", result.chain, e),
        }
    }

    let output_path = output
        .or_else(|| settings.output.clone())
        .unwrap_or_else(|| PathBuf::from("distances.json"));
    save_records(&output_path, &records).context("Failed to save distance table")?;
    println!();
    println!("Distances: {}", output_path.display());

    Ok(())
}

/// Cached locations when present, otherwise fetched and written to the cache
fn chain_locations(
    settings: &Settings,
    chain: &str,
    area: &str,
    cache_dir: Option<&Path>,
) -> Result<Vec<Coordinate>> {
    let cached = cache_dir.map(|dir| cache_file(dir, chain, area));

    if let Some(ref path) = cached
        && path.is_file()
    {
        let record: ChainLocationsRecord = load_json(path)?;
        return Ok(record.locations);
    }

    let locations = fetch_chain(&settings.directory, chain, area)?;

    if let Some(path) = cached {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .context(format!("Failed to create cache dir: {:?}", parent))?;
        }
        let record = ChainLocationsRecord {
            chain: chain.to_string(),
            area: area.to_string(),
            locations: locations.clone(),
        };
        save_json(&path, &record)?;
    }

    Ok(locations)
}

fn fetch_chain(directory: &DirectoryConfig, chain: &str, area: &str) -> Result<Vec<Coordinate>> {
    let api = HttpDirectory::new(directory).context("Failed to set up directory client")?;

    let spinner = create_spinner(&format!("Enumerating {} locations in {}...", chain, area));
    let start = Instant::now();
    let locations = Enumerator::new(&api)
        .with_max_consecutive_unavailable(directory.max_consecutive_unavailable)
        .fetch_locations(chain, area)
        .context(format!("Failed to enumerate {} in {}", chain, area))?;
    spinner.finish_with_message(format!(
        "Found {} {} locations [{:.1}s]",
        locations.len(),
        chain,
        start.elapsed().as_secs_f32()
    ));

    Ok(locations)
}

fn load_polygon(settings: &Settings) -> Result<Polygon> {
    let Some(ref name) = settings.boundary else {
        bail!("No boundary given: pass --boundary/-b or set `boundary` in the config file");
    };

    let polygon = load_single_polygon(&settings.boundary_dir, name)
        .context(format!("Failed to load boundary {}", name))?;
    if settings.verbose {
        let bbox = polygon.bounding_box();
        println!(
            "  Boundary {}: {} vertices, lat {:.4}..{:.4}, lon {:.4}..{:.4}",
            name,
            polygon.vertices().len(),
            bbox.min_lat,
            bbox.max_lat,
            bbox.min_lon,
            bbox.max_lon
        );
    }
    Ok(polygon)
}

fn build_cloud(polygon: &Polygon, settings: &Settings) -> Result<PointCloud> {
    let spinner = create_spinner("Sampling points inside boundary...");
    let start = Instant::now();

    let mut options = SamplerOptions::new(settings.samples);
    if let Some(limit) = settings.max_attempts {
        options = options.with_max_attempts(limit);
    }

    let cloud = match (settings.seed, settings.max_attempts) {
        (None, None) => sample(polygon, settings.samples),
        (Some(seed), _) => sample_with_rng(polygon, &options, &mut StdRng::seed_from_u64(seed))?,
        (None, Some(_)) => sample_with_rng(polygon, &options, &mut rand::rng())?,
    };

    spinner.finish_with_message(format!(
        "Sampled {} points [{:.1}s]",
        cloud.len(),
        start.elapsed().as_secs_f32()
    ));
    Ok(cloud)
}

fn load_cloud(path: &Path) -> Result<PointCloud> {
    let cloud: PointCloud =
        load_json(path).context(format!("Failed to load point cloud: {:?}", path))?;
    println!("Loaded point cloud of {} points", cloud.len());
    Ok(cloud)
}

/// The `output` config key names the distance table, so clouds only go
/// where `-o` says or to a per-boundary default
fn cloud_output_path(output: Option<PathBuf>, boundary: Option<&str>) -> PathBuf {
    output.unwrap_or_else(|| default_cloud_path(boundary))
}

fn default_cloud_path(boundary: Option<&str>) -> PathBuf {
    match boundary {
        Some(name) => PathBuf::from(format!("{}_cloud.json", slugify(name).replace('-', "_"))),
        None => PathBuf::from("cloud.json"),
    }
}

fn cache_file(dir: &Path, chain: &str, area: &str) -> PathBuf {
    dir.join(format!("{}-{}.json", slugify(chain), slugify(area)))
}

fn default_log_level(verbose: bool) -> &'static str {
    if verbose {
        "storereach=debug"
    } else {
        "storereach=warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_log_level(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}
