use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use seedr_core::SeedrClient;
use seedr_sync::config::{Credentials, SyncConfig};
use seedr_sync::logging;
use seedr_sync::progress::TransferProgress;
use seedr_sync::sync::download::Downloader;
use seedr_sync::sync::driver::SyncDriver;
use seedr_sync::sync::transfer::TransferClient;

/// Download everything in a Seedr account, then remove what was transferred.
///
/// Credentials are read from SEEDRCC_EMAIL and SEEDRCC_PASSWORD, either set
/// in the environment or listed in a .env file in the working directory.
#[derive(Debug, Parser)]
#[command(name = "seedr-sync", version)]
struct Cli {
    /// Path to download to (defaults to the working directory)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Maximum number of transfers in flight
    #[arg(short, long, value_name = "N")]
    concurrency: Option<usize>,

    /// Remove files whose transfer broke off part way
    #[arg(long)]
    discard_partial: bool,
}

impl Cli {
    fn apply(self, mut config: SyncConfig) -> SyncConfig {
        if let Some(output) = self.output {
            config.output_root = output;
        }
        if let Some(concurrency) = self.concurrency.filter(|n| *n > 0) {
            config.concurrency = concurrency;
        }
        config.discard_partial |= self.discard_partial;
        config.verbose = self.verbose;
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();
    let config = cli.apply(SyncConfig::from_env()?);
    let progress = TransferProgress::stderr();
    logging::init(config.verbose, &progress);

    let credentials = Credentials::from_env()?;
    let client = SeedrClient::connect(&credentials.email, &credentials.password)
        .await
        .context("failed to log in to Seedr")?;

    let transfer = TransferClient::with_config(config.transfer())?;
    let downloader = Downloader::new(transfer, &config.output_root, config.concurrency)
        .with_progress(progress);
    let mut driver = SyncDriver::new(client, downloader, config.concurrency);

    let report = match driver.run().await {
        Ok(report) => report,
        Err(err) if err.is_auth() => {
            return Err(anyhow::Error::new(err).context("authentication failed"));
        }
        Err(err) => return Err(err.into()),
    };
    eprintln!(
        "[seedr-sync] done: {} listed, {} downloaded, {} failed, {} removed remotely, {} folders pruned",
        report.files_listed,
        report.downloaded,
        report.failed,
        report.deletion.deleted,
        report.prune.pruned
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_config() -> SyncConfig {
        SyncConfig {
            output_root: PathBuf::from("/cwd"),
            concurrency: 4,
            download_timeout: Duration::from_secs(60),
            discard_partial: false,
            verbose: false,
        }
    }

    #[test]
    fn defaults_keep_env_config() {
        let cli = Cli::try_parse_from(["seedr-sync"]).unwrap();
        let config = cli.apply(base_config());
        assert_eq!(config.output_root, PathBuf::from("/cwd"));
        assert_eq!(config.concurrency, 4);
        assert!(!config.verbose);
    }

    #[test]
    fn flags_override_env_config() {
        let cli = Cli::try_parse_from([
            "seedr-sync",
            "--output",
            "/data",
            "-v",
            "-c",
            "8",
            "--discard-partial",
        ])
        .unwrap();
        let config = cli.apply(base_config());
        assert_eq!(config.output_root, PathBuf::from("/data"));
        assert_eq!(config.concurrency, 8);
        assert!(config.verbose);
        assert!(config.discard_partial);
    }

    #[test]
    fn help_is_a_display_request() {
        let err = Cli::try_parse_from(["seedr-sync", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(Cli::try_parse_from(["seedr-sync", "--bogus"]).is_err());
    }
}
