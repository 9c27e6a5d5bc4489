use clap::Parser;
use dotenvy::dotenv;
use handler_registrar::infrastructure::aws;
use handler_registrar::{Registrar, RegistrarConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Upload a resource handler package and register it as a CloudFormation type.
///
/// Every flag is optional; without any the values come from the environment
/// (or `.env`) and then from built-in defaults.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path of the packaged handler artifact
    #[arg(short, long)]
    artifact: Option<PathBuf>,

    /// Destination bucket
    #[arg(short, long)]
    bucket: Option<String>,

    /// Prefix inside the bucket
    #[arg(long)]
    subdir: Option<String>,

    /// Fully-qualified resource type name
    #[arg(short, long)]
    type_name: Option<String>,

    /// Named AWS credential profile
    #[arg(long)]
    profile: Option<String>,

    /// AWS region
    #[arg(long)]
    region: Option<String>,

    /// Seconds between status checks
    #[arg(long)]
    poll_interval: Option<u64>,

    /// Give up after waiting this many seconds (0 waits forever)
    #[arg(long)]
    max_wait: Option<u64>,
}

impl Args {
    fn apply(self, mut config: RegistrarConfig) -> RegistrarConfig {
        if let Some(artifact) = self.artifact {
            config.artifact_path = artifact;
        }
        if let Some(bucket) = self.bucket {
            config.bucket = bucket;
        }
        if let Some(subdir) = self.subdir {
            config.bucket_subdir = subdir;
        }
        if let Some(type_name) = self.type_name {
            config.type_name = type_name;
        }
        if let Some(profile) = self.profile {
            config.profile = profile;
        }
        if let Some(region) = self.region {
            config.region = region;
        }
        if let Some(secs) = self.poll_interval.filter(|s| *s > 0) {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = self.max_wait {
            config.max_wait = Duration::from_secs(secs);
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    // stdout carries the progress report, diagnostics go to stderr
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "handler_registrar=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = args.apply(RegistrarConfig::from_env());
    info!(
        "📦 Registering {} from {}",
        config.type_name,
        config.artifact_path.display()
    );

    let sdk_config = aws::setup_sdk_config(&config).await;
    let store = aws::setup_store(&sdk_config, &config);
    let registry = aws::setup_registry(&sdk_config);

    let registrar = Registrar::new(store, registry, config);
    let outcome = registrar.run().await?;

    for line in outcome.report_lines() {
        println!("{}", line);
    }

    Ok(())
}
