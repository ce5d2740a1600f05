//! `gym translate`: plan BGP queries and write the encoded join trees.

use std::path::{Path, PathBuf};

use clap::Args;
use gym_core::query::{BgpQuery, HypergraphPlanner, PlannerConfig, WidthBound};
use gym_core::StatisticsCatalog;
use gym_proto::codec;

use super::{collect_inputs, output_path, Batch};
use crate::error::CliError;

/// Suffix of plan files written next to their query.
pub const PLAN_SUFFIX: &str = ".out";

#[derive(Args, Debug)]
pub struct TranslateArgs {
    /// Query file, or a directory of query files
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Output file, or output directory for a directory input
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Statistics file
    #[arg(short = 's', long)]
    pub stats: Option<PathBuf>,

    /// Maximum children per node: -1 for heuristic, 2147483647 for unbounded
    #[arg(short = 'w', long, default_value_t = -1, allow_hyphen_values = true)]
    pub width: i64,

    /// Group triples sharing a subject into property-table nodes
    #[arg(short = 'p', long)]
    pub property_table: bool,
}

impl TranslateArgs {
    pub fn to_config(&self) -> PlannerConfig {
        PlannerConfig::new()
            .with_width(WidthBound::from_raw(self.width))
            .with_property_table(self.property_table)
    }
}

pub fn run(args: &TranslateArgs) -> Result<(), CliError> {
    let catalog = match &args.stats {
        Some(path) => StatisticsCatalog::load_or_empty(path),
        None => StatisticsCatalog::empty(),
    };
    let planner = HypergraphPlanner::new(&catalog, args.to_config());

    let inputs = collect_inputs(&args.input, &["out"])?;
    let batch_mode = args.input.is_dir();
    if batch_mode {
        if let Some(dir) = &args.output {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut batch = Batch::default();
    for input in &inputs {
        let output = output_path(input, args.output.as_deref(), batch_mode, PLAN_SUFFIX);
        if let Some(nodes) = batch.record(input, translate_one(&planner, input, &output)) {
            println!("{} -> {} ({} node(s))", input.display(), output.display(), nodes);
        }
    }
    batch.finish()
}

/// Plan one query file and write the plan. Returns the node count.
fn translate_one(
    planner: &HypergraphPlanner<'_>,
    input: &Path,
    output: &Path,
) -> Result<usize, CliError> {
    let query = BgpQuery::load(input)?;
    let plan = planner.plan_query(&query)?;
    std::fs::write(output, codec::encode_plan(&plan)?)?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        nodes = plan.len(),
        "query translated"
    );
    Ok(plan.len())
}
