use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use joykeys::config::AppConfig;
use joykeys::injector::LogInjector;
use joykeys::input::Thresholds;
use joykeys::session::{Session, SessionHandle};
use joykeys::transport::{ByteSource, ReadSource, SerialSource};
use std::path::PathBuf;
use tracing::{debug, error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Turns the frame stream of a serial joystick controller into key presses
#[derive(Parser, Debug)]
#[command(name = "joykeys", version, about)]
struct Cli {
    /// Config file (default: ~/.config/joykeys/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serial port of the controller, overrides the config file
    #[arg(short, long, conflicts_with = "replay")]
    port: Option<String>,

    /// Baud rate, overrides the config file
    #[arg(short, long)]
    baud: Option<u32>,

    /// Read a captured byte stream from a file instead of a serial port
    #[arg(short, long)]
    replay: Option<PathBuf>,

    /// Upper dead-zone boundary, overrides the config file
    #[arg(long, allow_hyphen_values = true)]
    high: Option<i16>,

    /// Lower dead-zone boundary, overrides the config file
    #[arg(long, allow_hyphen_values = true)]
    low: Option<i16>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup()?;

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::default_path);
    let mut config = AppConfig::load_or_create(&config_path).await?;
    let configured_level = config.log_level();
    setup_logging_env(match cli.verbose {
        0 => configured_level.unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    });
    if configured_level.is_none() {
        warn!("Unknown log level {:?} in config, using info", config.logging.level);
    }
    info!("Loaded configuration from {}", config_path.display());

    if let Some(baud) = cli.baud {
        config.serial.baud_rate = baud;
    }
    let thresholds = Thresholds::new(
        cli.low.unwrap_or(config.thresholds.low),
        cli.high.unwrap_or(config.thresholds.high),
    );
    debug!("Effective configuration: {:?}, thresholds {}", config, thresholds);

    let (name, source) = open_source(&cli, &config)?;
    let session = Session::create(name, source, Box::new(LogInjector::new()), thresholds)?;

    let mut handle = SessionHandle::spawn(session);
    info!("Session {} running, press Ctrl-C to stop", handle.name());
    let stopper = handle.stopper();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, stopping session");
            stopper.stop();
        }
    });

    match handle.wait().await {
        Ok(report) => {
            info!("{}", report);
            Ok(())
        }
        Err(e) => {
            error!("Session ended with error: {}", e);
            Err(e.into())
        }
    }
}

fn open_source(cli: &Cli, config: &AppConfig) -> Result<(String, Box<dyn ByteSource + Send>)> {
    if let Some(path) = &cli.replay {
        info!("Replaying capture {}", path.display());
        let file = std::fs::File::open(path)
            .map_err(|e| eyre!("Failed to open capture {}: {}", path.display(), e))?;
        let source = ReadSource::new(std::io::BufReader::new(file));
        return Ok((path.display().to_string(), Box::new(source)));
    }

    let settings = config
        .serial_settings(cli.port.as_deref())
        .ok_or_else(|| eyre!("No serial port given; use --port or set serial.port in the config"))?;
    let source = SerialSource::open(settings)?;
    Ok((source.settings().port.clone(), Box::new(source)))
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
