//! `gym load`: fill a store from a triple file.

use std::path::PathBuf;

use clap::Args;
use gym_core::storage::{Loader, StorageConfig, VpStore};

use crate::error::CliError;

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Tab-separated triple file
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Store directory
    #[arg(short = 'd', long = "db")]
    pub store: PathBuf,

    /// Write the statistics file here
    #[arg(short = 's', long)]
    pub stats: Option<PathBuf>,

    /// Page cache capacity in MB
    #[arg(long, default_value_t = 256)]
    pub cache_mb: u64,
}

impl LoadArgs {
    pub fn to_config(&self) -> StorageConfig {
        StorageConfig::new(&self.store).with_cache_capacity(self.cache_mb * 1024 * 1024)
    }
}

pub fn run(args: &LoadArgs) -> Result<(), CliError> {
    let store = VpStore::open(args.to_config())?;
    let report = Loader::new(&store).load_file(&args.input)?;

    if let Some(stats) = &args.stats {
        report.write_statistics(stats)?;
        tracing::info!(path = %stats.display(), "statistics written");
    }

    println!(
        "loaded {} triple(s) into {} table(s), {} line(s) skipped",
        report.triples,
        report.graph.tables.len(),
        report.skipped
    );
    Ok(())
}
