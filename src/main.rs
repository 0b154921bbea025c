//! odimh5 - inspect and edit ODIM_H5 radar products from the command line.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use odimh5::geo::Georeference;
use odimh5::util::{format_tree, GridStats};
use odimh5::{AccessMode, AttrValue, FileSession};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "odimh5")]
#[command(about = "Inspect and edit ODIM_H5 radar products", long_about = None)]
struct Args {
    /// Path to the ODIM_H5 file
    file: PathBuf,

    /// Enable logging to specified file
    #[arg(long)]
    log: Option<PathBuf>,

    /// Log diagnostics to stderr (filter with RUST_LOG)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the node hierarchy with attributes
    Tree,
    /// Print the georeference
    Where,
    /// Locate a quantity and summarise its physical values
    Quantity {
        /// Quantity name, e.g. DBZH
        name: String,
        /// Restrict to the sweep with this elevation angle
        #[arg(long)]
        elangle: Option<f64>,
    },
    /// Decode a field group with nodata/undetect masking
    Decode {
        /// Field group path, e.g. /dataset1/data1
        path: String,
    },
    /// Set an attribute (numbers are stored as numbers, anything else as text)
    SetAttr {
        /// Node path, created if missing
        path: String,
        /// Attribute name
        name: String,
        /// Attribute value
        value: String,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging if --log option is provided
    if let Some(log_path) = &args.log {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(std::sync::Mutex::new(log_file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        tracing::info!("Starting odimh5");
    } else if args.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    if !args.file.exists() {
        bail!("Path not found: {}", args.file.display());
    }

    let mode = match args.command {
        Command::SetAttr { .. } => AccessMode::ReadWrite,
        _ => AccessMode::ReadOnly,
    };
    let mut session = FileSession::open(&args.file, mode)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;

    match args.command {
        Command::Tree => print!("{}", format_tree(session.root())),
        Command::Where => print_where(&session),
        Command::Quantity { name, elangle } => {
            let record = match elangle {
                Some(elangle) => session.quantity_at_elevation(&name, elangle),
                None => session.quantity(&name, None),
            };
            let Some(record) = record else {
                bail!("Quantity \"{}\" not found", name);
            };
            println!("Path: {}", record.path);
            for (label, value) in [
                ("Gain", record.gain),
                ("Offset", record.offset),
                ("Nodata", record.nodata),
                ("Undetect", record.undetect),
            ] {
                match value {
                    Some(v) => println!("{}: {}", label, v),
                    None => println!("{}: -", label),
                }
            }
            if let Some(geometry) = session.polar().and_then(|p| p.geometry()) {
                println!(
                    "Scan: {} rays x {} bins, rscale {} m, rstart {} km",
                    geometry.ray_count, geometry.bin_count, geometry.range_scale, geometry.range_start
                );
            }
            match record.physical_values() {
                Some(values) => print!("{}", GridStats::compute(&values).summary(values.shape())),
                None => println!("No physical values (missing data, gain or offset)"),
            }
        },
        Command::Decode { path } => {
            let values = session.decode_data_field(&path)?;
            print!("{}", GridStats::compute(&values).summary(values.shape()));
        },
        Command::SetAttr { path, name, value } => {
            session.set_attribute(&path, &name, AttrValue::parse_loose(&value))?;
            session.close()?;
            println!("Set {}@{}", path, name);
        },
    }

    if args.log.is_some() {
        tracing::info!("odimh5 exited");
    }

    Ok(())
}

fn print_where(session: &FileSession) {
    match session.georeference() {
        Georeference::Cartesian(geo) => {
            println!("{}", geo.describe());
            let bbox = geo.bounding_box();
            println!(
                "Bounding box: lon {}..{}, lat {}..{}",
                bbox.min_lon, bbox.max_lon, bbox.min_lat, bbox.max_lat
            );
        },
        Georeference::Polar(polar) => {
            let site = polar.site();
            println!("Site: lat {}, lon {}, height {} m", site.lat, site.lon, site.height);
        },
    }
}
