use clap::{Parser, Subcommand};
use layer_models::{BuildRequest, BuildResponse, DownloadResponse, ListResponse};
use reqwest::Client;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "layer-cli")]
#[command(about = "CLI client for Layer Forge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(long, default_value = "http://localhost:8080")]
    endpoint: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a new layer
    Create {
        /// Package name used for the archive
        name: String,
        /// Dependencies to install (repeatable)
        #[arg(short, long = "dependency")]
        dependencies: Vec<String>,
        /// Target runtime
        #[arg(long, default_value = "python3.12")]
        runtime: String,
        /// Target platform tag
        #[arg(long, default_value = "manylinux2014_x86_64")]
        platform: String,
        /// Target interpreter version
        #[arg(long, default_value = "3.12")]
        python_version: String,
        /// Package the dependency list without installing it
        #[arg(long)]
        skip_install: bool,
        /// Force-upgrade packages during install
        #[arg(long)]
        upgrade: bool,
    },
    /// List stored layers
    List {
        /// Case-insensitive filter over package name and dependencies
        #[arg(long)]
        search: Option<String>,
    },
    /// Mint a fresh download URL for a stored layer
    Download {
        /// Storage key, e.g. layers/demo-20250101-120000.zip
        key: String,
    },
    /// Health check
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let client = Client::new();

    match cli.command {
        Commands::Create {
            name,
            dependencies,
            runtime,
            platform,
            python_version,
            skip_install,
            upgrade,
        } => {
            let request = BuildRequest {
                package_name: name,
                dependencies,
                runtime,
                platform,
                python_version,
                install_dependencies: !skip_install,
                upgrade_packages: upgrade,
            };
            create_layer(&client, &cli.endpoint, request).await?;
        }
        Commands::List { search } => {
            list_layers(&client, &cli.endpoint, search).await?;
        }
        Commands::Download { key } => {
            download_layer(&client, &cli.endpoint, key).await?;
        }
        Commands::Health => {
            health(&client, &cli.endpoint).await?;
        }
    }

    Ok(())
}

async fn create_layer(
    client: &Client,
    endpoint: &str,
    request: BuildRequest,
) -> Result<(), Box<dyn std::error::Error>> {
    info!("Building layer: {}", request.package_name);

    let response = client
        .post(format!("{endpoint}/packages"))
        .json(&request)
        .send()
        .await?;

    if response.status().is_success() {
        let build: BuildResponse = response.json().await?;
        println!("✅ Layer created successfully:");
        println!("   Name: {}", build.package_name);
        println!("   Key: {}", build.s3_key);
        println!("   Size: {} bytes", build.package_size);
        println!("   Dependencies: {}", build.dependencies.join(", "));
        println!("   Download: {}", build.download_url);
    } else {
        let error_text = response.text().await?;
        error!("Failed to build layer: {}", error_text);
        return Err(error_text.into());
    }

    Ok(())
}

async fn list_layers(
    client: &Client,
    endpoint: &str,
    search: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut request = client.get(format!("{endpoint}/packages"));
    if let Some(search) = search {
        request = request.query(&[("search", search)]);
    }
    let response = request.send().await?;

    if response.status().is_success() {
        let list: ListResponse = response.json().await?;
        println!("📋 Layers ({}):", list.count);
        for layer in list.packages {
            println!(
                "   • {} ({}) - {} bytes, {} dependencies, {}",
                layer.file_name,
                layer.key,
                layer.size,
                layer.dependency_count,
                layer.last_modified
            );
        }
    } else {
        let error_text = response.text().await?;
        error!("Failed to list layers: {}", error_text);
        return Err(error_text.into());
    }

    Ok(())
}

async fn download_layer(
    client: &Client,
    endpoint: &str,
    key: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let response = client
        .get(format!("{endpoint}/packages/download/{key}"))
        .send()
        .await?;

    if response.status().is_success() {
        let download: DownloadResponse = response.json().await?;
        println!("🔗 {}", download.download_url);
    } else {
        let error_text = response.text().await?;
        error!("Failed to mint download URL: {}", error_text);
        return Err(error_text.into());
    }

    Ok(())
}

async fn health(client: &Client, endpoint: &str) -> Result<(), Box<dyn std::error::Error>> {
    let response = client.get(format!("{endpoint}/healthz")).send().await?;
    println!("Server status: {}", response.status());
    Ok(())
}
