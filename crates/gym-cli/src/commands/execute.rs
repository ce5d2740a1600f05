//! `gym execute`: run plan files against a store.

use std::path::{Path, PathBuf};

use clap::Args;
use gym_core::query::{
    ExecutionResult, ExecutorConfig, JoinExecutionEngine, JoinTree, RelationProvider,
};
use gym_core::storage::{StorageConfig, VpStore};
use gym_core::LocalProvider;
use gym_proto::codec;

use super::{collect_inputs, output_path, Batch};
use crate::error::CliError;
use crate::formatter::{format_result, OutputFormat};

#[derive(Args, Debug)]
pub struct ExecuteArgs {
    /// Plan file, or a directory of plan files
    #[arg(short = 'i', long)]
    pub input: PathBuf,

    /// Store directory
    #[arg(short = 'd', long = "db")]
    pub store: PathBuf,

    /// Write the result as TSV here (a directory for a directory input)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Skip the semi-join reduction phases
    #[arg(long)]
    pub skip_semi_joins: bool,

    /// Output format
    #[arg(long, default_value = "table", value_enum)]
    pub format: OutputFormat,
}

impl ExecuteArgs {
    pub fn to_config(&self) -> ExecutorConfig {
        ExecutorConfig::new().with_skip_semi_joins(self.skip_semi_joins)
    }
}

pub fn run(args: &ExecuteArgs) -> Result<(), CliError> {
    let store = VpStore::open(StorageConfig::new(&args.store))?;
    let provider = LocalProvider::new(&store).with_table_prefix(store.table_prefix());
    let engine = JoinExecutionEngine::new(&provider, args.to_config());

    let inputs = collect_inputs(&args.input, &["tsv"])?;
    let batch_mode = args.input.is_dir();
    if batch_mode {
        if let Some(dir) = &args.output {
            std::fs::create_dir_all(dir)?;
        }
    }

    let mut batch = Batch::default();
    for input in &inputs {
        let outcome = execute_one(&engine, input).and_then(|result| {
            if args.output.is_some() {
                let output = output_path(input, args.output.as_deref(), batch_mode, ".tsv");
                std::fs::write(&output, result.relation.to_tsv())?;
            }
            format_result(&result, args.format)
        });
        if let Some(rendered) = batch.record(input, outcome) {
            println!("{}", rendered);
        }
    }
    batch.finish()
}

fn execute_one<P: RelationProvider + ?Sized>(
    engine: &JoinExecutionEngine<'_, P>,
    input: &Path,
) -> Result<ExecutionResult, CliError> {
    let plan = codec::decode_plan(&std::fs::read(input)?)?;
    let mut tree = JoinTree::from_plan(&plan)?;
    let name = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string());
    Ok(engine.execute(&mut tree, &name)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::translate::{self, TranslateArgs};
    use gym_core::storage::Loader;

    #[test]
    fn test_translate_then_execute() {
        let dir = tempfile::tempdir().unwrap();
        let store_dir = dir.path().join("store");
        {
            let store = VpStore::open(StorageConfig::new(&store_dir)).unwrap();
            Loader::new(&store)
                .load_reader("s1\t:p1\ta\ns2\t:p1\tb\na\t:p2\tx\n".as_bytes())
                .unwrap();
        }

        let query = dir.path().join("q.json");
        std::fs::write(
            &query,
            r#"{"variables": ["s", "o2"],
                "triples": [["?s", ":p1", "?o1"], ["?o1", ":p2", "?o2"]]}"#,
        )
        .unwrap();
        translate::run(&TranslateArgs {
            input: query.clone(),
            output: None,
            stats: None,
            width: -1,
            property_table: false,
        })
        .unwrap();

        let result_file = dir.path().join("result.tsv");
        run(&ExecuteArgs {
            input: dir.path().join("q.json.out"),
            store: store_dir,
            output: Some(result_file.clone()),
            skip_semi_joins: false,
            format: OutputFormat::Tsv,
        })
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(result_file).unwrap(),
            "s\to2\ns1\tx\n"
        );
    }

    #[test]
    fn test_corrupt_plan_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let plan = dir.path().join("bad.out");
        std::fs::write(&plan, b"not a plan").unwrap();

        let result = run(&ExecuteArgs {
            input: plan,
            store: dir.path().join("store"),
            output: None,
            skip_semi_joins: false,
            format: OutputFormat::Table,
        });
        assert!(matches!(result, Err(CliError::Batch { failed: 1, total: 1 })));
    }
}
