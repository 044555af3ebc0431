use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "linebot")]
#[command(about = "LINE webhook bot: weather, menus, and completions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config file.
    Init {
        /// Config file path (default: LINEBOT_CONFIG_PATH or ~/.linebot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Run the gateway (LINE webhook at POST /webhook).
    Gateway {
        /// Config file path (default: LINEBOT_CONFIG_PATH or ~/.linebot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from config or 8080)
        #[arg(long, short)]
        port: Option<u16>,
    },

    /// Look up the weather and push the report to a LINE user.
    PushWeather {
        /// Config file path (default: LINEBOT_CONFIG_PATH or ~/.linebot/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Recipient user id (default: push.to from config)
        #[arg(long, value_name = "USER_ID")]
        to: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("linebot {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Gateway { config, port }) => {
            if let Err(e) = run_gateway(config, port).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::PushWeather {
            config,
            to,
            lat,
            lon,
        }) => {
            if let Err(e) = run_push_weather(config, to, lat, lon).await {
                log::error!("push-weather failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

async fn run_gateway(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

async fn run_push_weather(
    config_path: Option<std::path::PathBuf>,
    to: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
) -> anyhow::Result<()> {
    let (config, _) = lib::config::load_config(config_path)?;
    let to = to
        .or_else(|| config.push.to.clone())
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("no recipient: pass --to or set push.to in config"))?;
    let latitude = lat.unwrap_or(config.push.latitude);
    let longitude = lon.unwrap_or(config.push.longitude);

    let dispatcher = lib::bot::Dispatcher::from_config(&config);
    let text = dispatcher.push_weather(&to, latitude, longitude).await?;
    println!(
        "{}",
        serde_json::json!({ "ok": true, "to": to, "text": text })
    );
    Ok(())
}
