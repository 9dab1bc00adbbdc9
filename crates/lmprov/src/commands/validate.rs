//! `validate`: load and check the configuration, summarize what it declares.

use serde::Serialize;
use tabled::Tabled;

use lmprov_core::{Mode, RepetitionType};

use crate::cli::{GlobalOpts, ReportArgs};
use crate::commands::util;
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct Summary {
    config: String,
    mode: Mode,
    repetition: RepetitionType,
    variables: usize,
    trees: Vec<TreeSummary>,
    role_configurations: usize,
}

#[derive(Debug, Serialize, Tabled)]
struct TreeSummary {
    #[tabled(rename = "Tree")]
    tree: &'static str,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Root")]
    root: String,
    #[tabled(rename = "Groups")]
    groups: usize,
    #[tabled(rename = "Items")]
    items: usize,
}

pub fn handle(args: &ReportArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let (config, path) = util::load_validated(global)?;
    let blueprint = &config.blueprint;

    let summary = Summary {
        config: path.display().to_string(),
        mode: config.mode,
        repetition: blueprint.repetition.kind,
        variables: blueprint.variables.len(),
        trees: blueprint
            .trees()
            .map(|(kind, key, tree)| TreeSummary {
                tree: key,
                kind: kind.to_string(),
                root: tree.name.clone(),
                groups: tree.node_count(),
                items: tree.item_count(),
            })
            .collect(),
        role_configurations: blueprint.role_configurations().len(),
    };

    let rendered = output::render(args.output, &summary, |s| {
        let header = format!(
            "{} is valid: mode {}, repetition {}, {} variables, {} role configurations",
            s.config, s.mode, s.repetition, s.variables, s.role_configurations
        );
        if s.trees.is_empty() {
            format!("{header}\nNo structure trees declared.")
        } else {
            format!("{header}\n{}", output::render_table(&s.trees))
        }
    })?;
    output::print_output(&rendered, global.quiet);
    Ok(())
}
