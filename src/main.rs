//! Cursor Mapper - proportional pointer crossing between monitors
//!
//! Watches raw pointer movement and, when the pointer leaves one monitor
//! through an edge shared with another, relocates it to the proportionally
//! equivalent position on the neighbour.

mod config;
mod crossing;
mod input;
mod screen;

use std::path::{Path, PathBuf};
use std::rc::Rc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use config::{Config, DesktopLayout};
use crossing::Session;
use input::{MouseMoveEvent, MoveVerdict, VirtualDesktop};
use screen::{MonitorTopology, Point};

/// Cursor Mapper - proportional monitor crossing
#[derive(Parser)]
#[command(name = "cursor-mapper")]
#[command(author = "Cursor Mapper Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Map the pointer proportionally across monitor edges", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the pointer hook and remap crossings until Ctrl+C
    Run,

    /// List the monitors as the engine sees them
    Monitors {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replay pointer positions against a scripted monitor layout
    Simulate {
        /// TOML file with [[display]] entries
        #[arg(short, long)]
        layout: PathBuf,

        /// Pointer positions as x,y
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true, value_parser = parse_point)]
        points: Vec<Point>,
    },

    /// Show current configuration
    Config {
        /// Generate sample configuration
        #[arg(long)]
        generate: bool,

        /// Output path for generated config
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show system information
    Info,
}

fn parse_point(s: &str) -> Result<Point, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected x,y but got '{}'", s))?;
    let x = x
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("bad x in '{}': {}", s, e))?;
    let y = y
        .trim()
        .parse::<i32>()
        .map_err(|e| format!("bad y in '{}': {}", s, e))?;
    Ok(Point::new(x, y))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = if let Some(config_path) = &cli.config {
        Config::load(config_path)?
    } else {
        Config::load_default().unwrap_or_default()
    };

    // Initialize logging; RUST_LOG wins over the flags
    let level = if cli.verbose || config.general.verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Run => {
            run(&config)?;
        }
        Commands::Monitors { json } => {
            list_monitors(json)?;
        }
        Commands::Simulate { layout, points } => {
            simulate(&layout, &points)?;
        }
        Commands::Config { generate, output } => {
            if generate {
                let sample = config::generate_sample_config()?;
                if let Some(path) = output {
                    std::fs::write(&path, &sample)?;
                    println!("Configuration written to: {}", path.display());
                } else {
                    println!("{}", sample);
                }
            } else {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
        Commands::Info => {
            print_system_info(&config);
        }
    }

    Ok(())
}

/// Run the remapping engine on the calling thread until shutdown
#[cfg(target_os = "windows")]
fn run(config: &Config) -> anyhow::Result<()> {
    use input::{EventSource, WindowsCursor, WindowsDisplays, WindowsEventSource};

    input::init_platform();

    let session = Rc::new(Session::new(WindowsDisplays::new(), WindowsCursor::new())?);
    tracing::info!(
        "Starting cursor mapper with {} monitor(s)",
        session.topology().len()
    );

    println!("Cursor mapper running. Press Ctrl+C to stop.");

    let mut source = WindowsEventSource::new(
        config.topology.refresh_interval_ms,
        config.topology.refresh_on_display_change,
    );
    source.run(session)?;

    tracing::info!("Cursor mapper stopped");
    Ok(())
}

#[cfg(not(target_os = "windows"))]
fn run(_config: &Config) -> anyhow::Result<()> {
    Err(input::InputError::NotSupported.into())
}

/// Print the current monitor set
fn list_monitors(json: bool) -> anyhow::Result<()> {
    input::init_platform();

    let provider = input::native_display_provider()?;
    let mut topology = MonitorTopology::new();
    topology.refresh(&*provider)?;

    if json {
        println!("{}", serde_json::to_string_pretty(topology.snapshot())?);
        return Ok(());
    }

    println!("Monitors ({}):", topology.len());
    for monitor in topology.snapshot().monitors() {
        println!(
            "  {:<32} {} {}x{}{}",
            monitor.device_name,
            monitor.rect,
            monitor.rect.width(),
            monitor.rect.height(),
            if monitor.primary { " (primary)" } else { "" }
        );
    }
    println!("Signature: {}", topology.signature());
    Ok(())
}

/// Feed a sequence of positions through a session over a virtual desktop
fn simulate(layout_path: &Path, points: &[Point]) -> anyhow::Result<()> {
    let layout = DesktopLayout::load(layout_path)?;
    let desktop = Rc::new(VirtualDesktop::from_layout(&layout));
    let session = Session::new(desktop.clone(), desktop.clone())?;

    for &point in points {
        desktop.move_cursor(point);
        match session.on_move(&MouseMoveEvent::physical(point)) {
            MoveVerdict::PassThrough => println!("{} -> pass", point),
            MoveVerdict::Relocated(to) => println!("{} -> relocated to {}", point, to),
        }
    }

    let cursor = desktop.cursor();
    let topology = session.topology();
    match topology.monitor_at(cursor) {
        Some(monitor) => println!("Final cursor {} on {}", cursor, monitor.device_name),
        None => println!("Final cursor {} outside every monitor", cursor),
    }
    Ok(())
}

/// Print system information
fn print_system_info(config: &Config) {
    println!("Cursor Mapper System Information");
    println!("================================\n");

    println!("Platform: {}", input::platform_name());
    println!(
        "Topology check interval: {} ms",
        config.topology.refresh_interval_ms
    );
    println!(
        "Refresh on display change: {}",
        config.topology.refresh_on_display_change
    );

    #[cfg(target_os = "windows")]
    {
        println!("\nWindows Notes:");
        println!("  - The hook cannot see pointer movement over elevated windows");
        println!("    unless cursor-mapper itself runs as Administrator");
    }

    #[cfg(not(target_os = "windows"))]
    {
        println!("\nOnly `simulate` and `config` are available on this platform.");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from(["cursor-mapper", "info"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn test_simulate_parses_points() {
        let cli = Cli::try_parse_from([
            "cursor-mapper",
            "simulate",
            "--layout",
            "desk.toml",
            "1915,540",
            "-5,10",
        ])
        .unwrap();

        match cli.command {
            Commands::Simulate { points, .. } => {
                assert_eq!(points, vec![Point::new(1915, 540), Point::new(-5, 10)]);
            }
            _ => panic!("expected simulate"),
        }
    }

    #[test]
    fn test_parse_point_rejects_garbage() {
        assert!(parse_point("12").is_err());
        assert!(parse_point("a,1").is_err());
        assert_eq!(parse_point(" 3 , 4 ").unwrap(), Point::new(3, 4));
    }
}
