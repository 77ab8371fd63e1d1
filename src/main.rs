use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use wifictl::{
    config::{self, Config},
    connection, scan, AdapterState, IfaceStatus, WifiManager,
};

/// How long `disconnect` waits for the interface to go idle.
const DISCONNECT_SETTLE: Duration = Duration::from_secs(1);

#[derive(Parser)]
#[command(name = "wifictl")]
#[command(about = "wifictl - Control WiFi adapters through wpa_supplicant")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. "debug" or "wifictl=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Path to a custom config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all available WiFi interfaces
    ListInterfaces,

    /// Scan for available WiFi networks
    Scan {
        /// WiFi interface index
        #[arg(short, long)]
        interface: Option<usize>,

        /// Seconds to wait for scan results
        #[arg(short, long)]
        wait: Option<u64>,

        /// Print the results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Connect to a WiFi network
    Connect {
        /// SSID of the network to connect to
        ssid: String,

        /// Network password (open network if omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// WiFi interface index
        #[arg(short, long)]
        interface: Option<usize>,

        /// Connection timeout in seconds
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Disconnect from the current WiFi network
    Disconnect {
        /// WiFi interface index
        #[arg(short, long)]
        interface: Option<usize>,
    },

    /// Show the status of the WiFi interface
    Status {
        /// WiFi interface index
        #[arg(short, long)]
        interface: Option<usize>,
    },

    /// List the networks saved in wpa_supplicant
    Profiles {
        /// WiFi interface index
        #[arg(short, long)]
        interface: Option<usize>,

        /// Print the profiles as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    ShowConfig,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    init_logging(cli.log_level.as_deref(), &cfg.log_level);

    match cli.command {
        Commands::ListInterfaces => cmd_list_interfaces(&cfg),
        Commands::Scan {
            interface,
            wait,
            json,
        } => cmd_scan(&cfg, interface, wait, json),
        Commands::Connect {
            ssid,
            password,
            interface,
            timeout,
        } => cmd_connect(&cfg, &ssid, password.as_deref(), interface, timeout),
        Commands::Disconnect { interface } => cmd_disconnect(&cfg, interface),
        Commands::Status { interface } => cmd_status(&cfg, interface),
        Commands::Profiles { interface, json } => cmd_profiles(&cfg, interface, json),
        Commands::ShowConfig => cmd_show_config(&cfg, cli.config),
    }
}

/// Logs go to stderr so stdout stays clean for tables and JSON.
fn init_logging(cli_filter: Option<&str>, config_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = match cli_filter {
        Some(filter) => EnvFilter::new(filter),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_filter)),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_list_interfaces(cfg: &Config) -> Result<()> {
    let mut manager = WifiManager::new(cfg)?;
    let interfaces = manager.interfaces()?;

    if interfaces.is_empty() {
        println!("No WiFi interfaces found.");
        return Ok(());
    }

    println!("Found {} interface(s):", interfaces.len());
    println!();

    for (idx, iface) in interfaces.iter().enumerate() {
        let state = match iface.state() {
            AdapterState::Ready => match iface.status() {
                Ok(status) => status.to_string(),
                Err(e) => format!("ERROR ({})", e),
            },
            AdapterState::Unavailable(reason) => format!("UNAVAILABLE ({})", reason),
        };
        println!("  [{}] {} - {}", idx, iface.name(), state);
    }

    Ok(())
}

fn cmd_scan(cfg: &Config, interface: Option<usize>, wait: Option<u64>, json: bool) -> Result<()> {
    let mut manager = WifiManager::new(cfg)?;
    let iface = manager.interface(interface.unwrap_or(cfg.default_interface))?;
    let wait = wait.map(Duration::from_secs).unwrap_or_else(|| cfg.scan_wait());

    if !json {
        println!("Scanning on interface: {}", iface.name());
        println!("Waiting {} seconds for scan results...", wait.as_secs());
        println!();
    }

    let networks = scan::scan_networks(&iface, wait)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&networks)?);
    } else {
        scan::display_networks(&networks);
    }

    Ok(())
}

fn cmd_connect(
    cfg: &Config,
    ssid: &str,
    password: Option<&str>,
    interface: Option<usize>,
    timeout: Option<u64>,
) -> Result<()> {
    let mut manager = WifiManager::new(cfg)?;
    let iface = manager.interface(interface.unwrap_or(cfg.default_interface))?;
    let timeout = timeout.map(Duration::from_secs).unwrap_or_else(|| cfg.connect_timeout());

    println!("Connecting to '{}' on interface: {}", ssid, iface.name());
    println!("Waiting for connection (timeout: {}s)...", timeout.as_secs());

    connection::connect_to(&iface, ssid, password, timeout)?;
    println!("Successfully connected to '{}'", ssid);

    Ok(())
}

fn cmd_disconnect(cfg: &Config, interface: Option<usize>) -> Result<()> {
    let mut manager = WifiManager::new(cfg)?;
    let iface = manager.interface(interface.unwrap_or(cfg.default_interface))?;
    println!("Disconnecting interface: {}", iface.name());

    match connection::disconnect_from(&iface, DISCONNECT_SETTLE)? {
        IfaceStatus::Disconnected | IfaceStatus::Inactive => println!("Successfully disconnected"),
        status => eprintln!("Disconnect may have failed. Status: {}", status),
    }

    Ok(())
}

fn cmd_status(cfg: &Config, interface: Option<usize>) -> Result<()> {
    let mut manager = WifiManager::new(cfg)?;
    let iface = manager.interface(interface.unwrap_or(cfg.default_interface))?;
    connection::display_status(iface.name(), iface.status()?);

    Ok(())
}

fn cmd_profiles(cfg: &Config, interface: Option<usize>, json: bool) -> Result<()> {
    let mut manager = WifiManager::new(cfg)?;
    let iface = manager.interface(interface.unwrap_or(cfg.default_interface))?;
    let profiles = iface.network_profiles()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profiles)?);
        return Ok(());
    }

    if profiles.is_empty() {
        println!("No saved networks.");
        return Ok(());
    }

    println!("{:<6} {:<32} {:<12} {}", "ID", "SSID", "SECURITY", "CIPHER");
    println!("{}", "-".repeat(60));
    for profile in &profiles {
        let id = profile.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<32} {:<12} {}",
            id,
            profile.ssid.as_deref().unwrap_or("(Hidden)"),
            profile.security_label(),
            profile.cipher
        );
    }

    Ok(())
}

fn cmd_show_config(cfg: &Config, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => config::config_path()?,
    };
    println!("Config file: {}", path.display());
    println!();
    print!("{}", cfg.to_toml()?);

    Ok(())
}
