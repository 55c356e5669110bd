use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use mikrotik_wifi::{
    client::Transport,
    config::{ConnectionParams, FileConfig},
    manager::{ApiDialer, SessionManager},
    wifi,
};

#[derive(Parser)]
#[command(name = "mikrotik-wifi")]
#[command(about = "Manage Wi-Fi networks on a MikroTik RouterOS device")]
#[command(version)]
struct Cli {
    /// Address of the RouterOS device
    #[arg(short = 'a', long, global = true, env = "MIKROTIK_ADDRESS")]
    address: Option<String>,

    /// Username for RouterOS authentication
    #[arg(short = 'u', long, global = true, env = "MIKROTIK_USERNAME")]
    username: Option<String>,

    /// Password for RouterOS authentication
    #[arg(short = 'p', long, global = true, env = "MIKROTIK_PASSWORD")]
    password: Option<String>,

    /// Port of the RouterOS device API
    #[arg(short = 'P', long, global = true, env = "MIKROTIK_PORT")]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all Wi-Fi networks
    List,

    /// Create a new Wi-Fi network
    Create {
        /// SSID of the network to create
        ssid: String,

        /// WPA2 pre-shared key for the network
        password: String,
    },

    /// Update an existing Wi-Fi network's ssid or password
    Update {
        /// SSID of the network to update
        ssid: String,

        /// Property to change: "ssid" or "password"
        property: String,

        /// New value for the property
        new_value: String,
    },

    /// Remove an existing Wi-Fi network
    Remove {
        /// SSID of the network to remove
        ssid: String,
    },
}

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Err(e) = run().await {
        eprintln!("{}", format!("{e:#}").red());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let file = FileConfig::load().context("Failed to load config file")?;
    let params = ConnectionParams::resolve(cli.address, cli.username, cli.password, cli.port, &file);

    println!(
        "Attempting to connect to RouterOS at address: {}:{}",
        params.address, params.port
    );
    let manager = SessionManager::connect(ApiDialer::new(params)).await?;
    let keep_alive = manager.spawn_keep_alive();

    let result = dispatch(&cli.command, &manager).await;

    keep_alive.abort();
    result
}

async fn dispatch(command: &Commands, manager: &SessionManager<ApiDialer>) -> Result<()> {
    let session = manager.session().await;

    match command {
        Commands::List => cmd_list(&*session).await,
        Commands::Create { ssid, password } => cmd_create(&*session, ssid, password).await,
        Commands::Update {
            ssid,
            property,
            new_value,
        } => cmd_update(&*session, ssid, property, new_value).await,
        Commands::Remove { ssid } => cmd_remove(&*session, ssid).await,
    }
}

async fn cmd_list<T: Transport>(client: &T) -> Result<()> {
    let ssids = wifi::list_networks(client)
        .await
        .context("Failed to list networks")?;

    for ssid in ssids {
        println!("{ssid}");
    }

    Ok(())
}

async fn cmd_create<T: Transport>(client: &T, ssid: &str, password: &str) -> Result<()> {
    wifi::create_network(client, ssid, password)
        .await
        .context("Failed to create network")?;

    println!("{}", format!("Network created successfully: {ssid}").green());
    Ok(())
}

async fn cmd_update<T: Transport>(
    client: &T,
    ssid: &str,
    property: &str,
    new_value: &str,
) -> Result<()> {
    wifi::update_network(client, ssid, property, new_value)
        .await
        .context("Failed to update network")?;

    println!("{}", format!("Network updated successfully: {ssid}").green());
    Ok(())
}

async fn cmd_remove<T: Transport>(client: &T, ssid: &str) -> Result<()> {
    wifi::remove_network(client, ssid)
        .await
        .context("Failed to remove network")?;

    println!("{}", format!("Network removed successfully: {ssid}").green());
    Ok(())
}
