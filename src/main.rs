//! VaultAlert CLI
//!
//! Light and motion intrusion alarm node.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use vault_alert::{
    activity::create_shared_log,
    config::Config,
    core::ConsoleBuzzer,
    link::ProbeLink,
    node::{Node, NodeSettings},
    sensor::{RestingSampler, ScriptedSampler, SensorSampler},
    transport::{BlockingHttpTransport, TlsMode},
    TLS_NOTICE, VERSION,
};

#[derive(Parser)]
#[command(name = "vault-alert")]
#[command(version = VERSION)]
#[command(about = "Light and motion intrusion alarm node", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the alarm node
    Run {
        /// Endpoint URL status reports are POSTed to
        #[arg(long)]
        endpoint: Option<String>,

        /// Light level above which the vault counts as open
        #[arg(long)]
        light_threshold: Option<u16>,

        /// Deviation from 1 g above which the vault counts as moved
        #[arg(long)]
        motion_threshold: Option<f64>,

        /// Report interval in milliseconds
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Pin the endpoint's root certificate (PEM)
        #[arg(long)]
        ca_cert: Option<PathBuf>,

        /// Replay sensor samples from a JSON-lines file
        #[arg(long)]
        script: Option<PathBuf>,

        /// Stop after this many ticks
        #[arg(long)]
        max_ticks: Option<u64>,

        /// Ring the terminal bell when the alarm sounds
        #[arg(long)]
        bell: bool,
    },

    /// Run the supervisory endpoint (requires server feature)
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "7071")]
        port: u16,

        /// Number of reports kept in history
        #[arg(long, default_value = "100")]
        history: usize,
    },

    /// Show configuration
    Config,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the transport security notice
    Notice,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            endpoint,
            light_threshold,
            motion_threshold,
            interval_ms,
            ca_cert,
            script,
            max_ticks,
            bell,
        } => {
            let mut config = load_config();
            if let Some(url) = endpoint {
                config.endpoint_url = url;
            }
            if let Some(threshold) = light_threshold {
                config.light_threshold = threshold;
            }
            if let Some(threshold) = motion_threshold {
                config.motion_threshold = threshold;
            }
            if let Some(ms) = interval_ms {
                config.report_interval = Duration::from_millis(ms);
            }
            if let Some(ca_cert_path) = ca_cert {
                config.tls = TlsMode::Pinned { ca_cert_path };
            }
            cmd_run(config, script, max_ticks, bell);
        }
        Commands::Serve { port, history } => {
            cmd_serve(port, history);
        }
        Commands::Config => {
            cmd_config();
        }
        Commands::Init { force } => {
            cmd_init(force);
        }
        Commands::Notice => {
            println!("{TLS_NOTICE}");
        }
    }
}

fn load_config() -> Config {
    match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config ({e}), using defaults");
            Config::default()
        }
    }
}

fn cmd_run(config: Config, script: Option<PathBuf>, max_ticks: Option<u64>, bell: bool) {
    println!("VaultAlert v{VERSION}");
    println!();

    if let Err(e) = config.validate() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }

    println!("Starting node...");
    println!("  Endpoint: {}", config.endpoint_url);
    println!("  Light threshold: {}", config.light_threshold);
    println!("  Motion threshold: {}g", config.motion_threshold);
    println!(
        "  Report interval: {}ms",
        config.report_interval.as_millis()
    );
    match config.tls {
        TlsMode::Insecure => {
            println!("  TLS: certificate NOT verified (run `vault-alert notice`)")
        }
        TlsMode::Pinned { ref ca_cert_path } => println!("  TLS: pinned to {ca_cert_path:?}"),
    }

    let sampler: Box<dyn SensorSampler> = match script {
        Some(path) => match ScriptedSampler::from_file(&path) {
            Ok(sampler) => {
                println!("  Sensors: script {:?} ({} samples)", path, sampler.len());
                Box::new(sampler)
            }
            Err(e) => {
                eprintln!("Error loading script: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("  Sensors: resting (no hardware attached)");
            Box::new(RestingSampler)
        }
    };

    let transport = match BlockingHttpTransport::new(config.transport()) {
        Ok(transport) => transport,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let mut link = match ProbeLink::for_endpoint(&config.endpoint_url, config.request_timeout) {
        Ok(link) => link,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };
    if config.link.is_configured() {
        link = link.with_network_name(config.link.ssid.clone());
    }
    if link.connect() {
        println!("  Link: connected to {}", link.target());
    } else {
        eprintln!(
            "Warning: {} is unreachable, reports will be deferred until it is",
            link.target()
        );
    }

    println!();
    println!("Press Ctrl+C to stop");
    println!();

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone());

    let activity = create_shared_log();
    let mut node = Node::new(
        NodeSettings::from(&config),
        sampler,
        ConsoleBuzzer::new(bell),
        link,
        transport,
        Instant::now(),
    )
    .with_activity_log(activity.clone());

    node.run(&running, config.tick_interval, max_ticks);

    println!();
    println!("Stopping node...");
    println!("  Alarm active at shutdown: {}", node.state().alarm_active());
    println!();
    println!("{}", activity.summary());
}

#[cfg(feature = "server")]
fn cmd_serve(port: u16, history: usize) {
    use vault_alert::server::{run, ServerConfig};

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error creating runtime: {e}");
            std::process::exit(1);
        }
    };

    runtime.block_on(async {
        let (addr, shutdown_tx) = match run(ServerConfig::new(port, history)).await {
            Ok(started) => started,
            Err(e) => {
                eprintln!("Error starting server: {e}");
                std::process::exit(1);
            }
        };

        println!("VaultAlert supervisor v{VERSION}");
        println!("  Reports: POST http://{addr}/collect");
        println!("  Mute:    POST http://{addr}/mute");
        println!("  History: GET  http://{addr}/history");
        println!();
        println!("Press Ctrl+C to stop");

        if let Err(e) = tokio::signal::ctrl_c().await {
            eprintln!("Error waiting for Ctrl+C: {e}");
        }
        let _ = shutdown_tx.send(());
    });
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_port: u16, _history: usize) {
    eprintln!("Error: serve requires the server feature");
    std::process::exit(1);
}

fn cmd_config() {
    let config = load_config();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    match config.redacted_json() {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Error: {e}"),
    }
    if let Err(e) = config.validate() {
        println!();
        println!("Warning: {e}");
    }
}

fn cmd_init(force: bool) {
    let path = Config::config_path();
    if path.exists() && !force {
        eprintln!("Config already exists at {path:?} (use --force to overwrite)");
        std::process::exit(1);
    }
    if let Err(e) = Config::default().save() {
        eprintln!("Error saving config: {e}");
        std::process::exit(1);
    }
    println!("Wrote default configuration to {path:?}");
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) {
    if let Err(e) = ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    }) {
        eprintln!("Warning: Could not set Ctrl+C handler: {e}");
    }
}
