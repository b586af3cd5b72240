use anyhow::Result;
use clap::Parser;
use shuttercam::storage::prepare_photo_dir;
use shuttercam::{ShuttercamApp, ShuttercamConfig};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;

#[derive(Parser, Debug)]
#[command(name = "shuttercam")]
#[command(about = "Photocell-metered photo capture appliance")]
#[command(version)]
#[command(long_about = "Runs the control loop of a stand-alone photo capture appliance: \
a shutter button triggers captures, a photocell on a GPIO line meters the light, and \
a rate-limited overlay shows exposure and free space on the preview display.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "shuttercam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit without touching hardware")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    let config = ShuttercamConfig::load_from_file(&args.config)?;

    // The log file lives in the photo directory, so it has to exist first
    let photo_dir = Path::new(&config.storage.photo_dir);
    let dir_result = prepare_photo_dir(photo_dir);
    let log_guard = init_logging(&args, photo_dir, &config.storage.log_file)?;

    info!("Starting Shuttercam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    match dir_result {
        Ok(true) => info!("Photo directory {} created", photo_dir.display()),
        Ok(false) => {}
        Err(e) => warn!(
            "Failed to prepare photo directory {}: {}",
            photo_dir.display(),
            e
        ),
    }

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        eprintln!("✗ Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    if args.validate_config {
        info!("Configuration validation successful");
        println!("✓ Configuration is valid");
        return Ok(());
    }

    let mut app = ShuttercamApp::from_config(config).map_err(|e| {
        error!("Failed to initialize hardware: {}", e);
        e
    })?;

    let exit_code = app.run().await.map_err(|e| {
        error!("Control loop failed: {}", e);
        e
    })?;

    info!("Shuttercam exited with code: {}", exit_code);
    drop(log_guard);
    std::process::exit(exit_code);
}

fn init_logging(args: &Args, photo_dir: &Path, log_file: &str) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "info"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("shuttercam={}", log_level)));

    let console_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    // Each run starts a fresh log file next to the photos
    let (file_layer, guard) = if photo_dir.is_dir() {
        let _ = std::fs::remove_file(photo_dir.join(log_file));
        let appender = tracing_appender::rolling::never(photo_dir, log_file);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let layer = fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(env_filter)
        .init();

    Ok(guard)
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Shuttercam Configuration File");
    println!("# This is the default configuration with all available options");
    println!("# Any value can be overridden with SHUTTERCAM_<SECTION>__<KEY> environment variables");
    println!();
    println!("{}", toml::to_string_pretty(&ShuttercamConfig::default())?);
    Ok(())
}
