//! `gym show`: print a plan file.

use std::path::PathBuf;

use clap::Args;
use gym_core::query::JoinTree;
use gym_proto::codec;

use crate::error::CliError;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Plan file
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Print the plan as JSON instead of an indented tree
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &ShowArgs) -> Result<(), CliError> {
    println!("{}", render(args)?);
    Ok(())
}

fn render(args: &ShowArgs) -> Result<String, CliError> {
    let plan = codec::decode_plan(&std::fs::read(&args.input)?)?;
    if args.json {
        return Ok(plan.to_json_pretty()?);
    }
    let tree = JoinTree::from_plan(&plan)?;
    Ok(format!(
        "{}{} node(s), {} edge(s)",
        tree,
        tree.len(),
        tree.edge_count()
    ))
}
