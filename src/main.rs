//! sockchat - a two-party, full-duplex TCP text messenger

use std::path::PathBuf;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use sockchat::app::Runtime;
use sockchat::config::Config;
use sockchat::error::Result;
use sockchat::link::Role;

fn main() -> Result<()> {
    let args = Args::parse();

    if args.version {
        print_version();
        return Ok(());
    }

    // The role flag is the one required piece of the CLI surface.
    let Some(flag) = args.server else {
        eprintln!("Missing required flag: -s/--server <True|...>");
        print_help();
        std::process::exit(2);
    };
    let role = Role::from_flag(&flag);

    // Load configuration
    let mut config = if let Some(path) = args.config {
        Config::load(&path)?
    } else if role.is_server() {
        Config::default_server()
    } else {
        Config::default_client()
    };

    // Command line overrides the config file.
    config.server = role.is_server();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    // Initialize logging
    let log_level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| config.log.level.parse().unwrap_or(Level::INFO));

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    info!("sockchat v{} starting...", env!("CARGO_PKG_VERSION"));

    // Run the session
    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(async { Runtime::new(config).run().await });

    // The console reader may still be parked in a blocking read; it must
    // not keep the process alive, so drop the runtime without joining it.
    rt.shutdown_background();
    result?;

    info!("Goodbye!");
    Ok(())
}

/// Command line arguments
struct Args {
    server: Option<String>,
    config: Option<PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    version: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        let mut server = None;
        let mut config = None;
        let mut host = None;
        let mut port = None;
        let mut version = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "-s" | "--server" => {
                    if i + 1 < args.len() {
                        server = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "-c" | "--config" => {
                    if i + 1 < args.len() {
                        config = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "-H" | "--host" => {
                    if i + 1 < args.len() {
                        host = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "-p" | "--port" => {
                    if i + 1 < args.len() {
                        match args[i + 1].parse() {
                            Ok(p) => port = Some(p),
                            Err(_) => {
                                eprintln!("Invalid port: {}", args[i + 1]);
                                std::process::exit(2);
                            }
                        }
                        i += 1;
                    }
                }
                "-v" | "--version" => version = true,
                "-h" | "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            server,
            config,
            host,
            port,
            version,
        }
    }
}

fn print_help() {
    println!(
        r#"sockchat - a two-party TCP text messenger

USAGE:
    sockchat -s <VALUE> [OPTIONS]

OPTIONS:
    -s, --server <VALUE>    Required. "True", "true" or "TRUE" listens as
                            the server; any other value dials as the client
    -H, --host <HOST>       Host to bind or dial (default: 127.0.0.1)
    -p, --port <PORT>       TCP port (default: 12345)
    -c, --config <FILE>     Path to a JSON configuration file
    -v, --version           Print version information
    -h, --help              Print help information

EXAMPLES:
    sockchat -s True
    sockchat -s false -H 192.168.1.10 -p 12345
    sockchat -s no -c client.json
"#
    );
}

fn print_version() {
    println!("sockchat v{}", env!("CARGO_PKG_VERSION"));
    println!("A two-party, full-duplex TCP text messenger");
}
