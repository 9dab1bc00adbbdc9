// ── Provisioning run loop ──
//
// One run evaluates the base variables, expands the repetition source
// into rows, and for every enabled row reconciles each declared tree in
// order before assembling roles. A failing row is logged and reported;
// the remaining rows still run. Cancellation stops the loop.

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::CoreError;
use crate::expr::evaluate;
use crate::model::{Blueprint, Mode};
use crate::policy::TypePolicyRegistry;
use crate::reconcile::Reconciler;
use crate::repetition::{self, is_enabled};
use crate::roles::RoleAssembler;
use crate::scope::VariableScope;
use crate::service::ResourceService;
use crate::table::TableReader;

/// Row keys tried, in order, to label a row in reports.
const LABEL_KEYS: &[&str] = &["Name", "CustomerName", "Id"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum RowOutcome {
    Completed,
    /// `IsEnabled` was present and not `true`.
    Skipped,
    Failed(String),
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowReport {
    /// 1-based row number.
    pub row: usize,
    pub label: String,
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub mode: Mode,
    pub rows: Vec<RowReport>,
}

impl RunReport {
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, RowOutcome::Failed(_)))
    }

    pub fn completed(&self) -> usize {
        self.count(|o| *o == RowOutcome::Completed)
    }

    pub fn was_cancelled(&self) -> bool {
        self.rows.iter().any(|r| r.outcome == RowOutcome::Cancelled)
    }

    fn push(&mut self, row: usize, label: String, outcome: RowOutcome) {
        self.rows.push(RowReport {
            row,
            label,
            outcome,
        });
    }

    fn count(&self, pred: impl Fn(&RowOutcome) -> bool) -> usize {
        self.rows.iter().filter(|r| pred(&r.outcome)).count()
    }
}

/// Drives whole provisioning runs for one blueprint.
pub struct Provisioner<'a> {
    service: &'a dyn ResourceService,
    tables: &'a dyn TableReader,
    blueprint: &'a Blueprint,
    registry: TypePolicyRegistry,
}

impl<'a> Provisioner<'a> {
    pub fn new(
        service: &'a dyn ResourceService,
        tables: &'a dyn TableReader,
        blueprint: &'a Blueprint,
    ) -> Self {
        Self {
            service,
            tables,
            blueprint,
            registry: TypePolicyRegistry::standard(),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: TypePolicyRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Evaluate the base variables, each against those already resolved.
    ///
    /// Variables whose references are not resolved yet are retried after
    /// the others, so a variable may refer to one declared after it.
    pub fn base_scope(&self) -> Result<VariableScope, CoreError> {
        let mut scope = VariableScope::new();
        let mut pending: Vec<(&String, &String)> = self.blueprint.variables.iter().collect();

        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            let mut last_error = None;
            for (name, expression) in pending {
                match evaluate(expression, &scope) {
                    Ok(value) => {
                        debug!(variable = %name, value = %value, "evaluated variable");
                        scope.set(name.clone(), value);
                    }
                    Err(e) => {
                        deferred.push((name, expression));
                        last_error = Some(e);
                    }
                }
            }
            if deferred.len() == before {
                if let Some(e) = last_error {
                    return Err(e);
                }
            }
            pending = deferred;
        }
        Ok(scope)
    }

    /// Run every row in `mode`.
    ///
    /// Errors in the base variables or the repetition source fail the
    /// whole run; anything else is confined to its row.
    pub async fn run(
        &self,
        mode: Mode,
        cancel: &CancellationToken,
    ) -> Result<RunReport, CoreError> {
        if mode == Mode::Menu {
            return Err(CoreError::configuration(
                "a run needs mode create or delete",
            ));
        }
        info!(mode = %mode, "Mode start: {mode}");

        let base = self.base_scope()?;
        let rows = repetition::rows(&self.blueprint.repetition, &base, self.tables)?;

        let mut report = RunReport {
            mode,
            rows: Vec::with_capacity(rows.len()),
        };
        for (index, row) in rows.into_iter().enumerate() {
            let number = index + 1;
            let label = row_label(&row, number);

            if cancel.is_cancelled() {
                info!(row = number, "User cancelled.");
                report.push(number, label, RowOutcome::Cancelled);
                break;
            }
            if !is_enabled(&row) {
                debug!(row = number, label = %label, "row disabled; skipping");
                report.push(number, label, RowOutcome::Skipped);
                continue;
            }

            info!(row = number, label = %label, "processing row");
            match self.process_row(mode, row, cancel).await {
                Ok(()) => {
                    info!(row = number, "Complete.");
                    report.push(number, label, RowOutcome::Completed);
                }
                Err(CoreError::Cancelled) => {
                    info!(row = number, "User cancelled.");
                    report.push(number, label, RowOutcome::Cancelled);
                    break;
                }
                Err(e) => {
                    error!(row = number, "Failed due to '{e}'");
                    report.push(number, label, RowOutcome::Failed(e.to_string()));
                }
            }
        }
        Ok(report)
    }

    async fn process_row(
        &self,
        mode: Mode,
        mut scope: VariableScope,
        cancel: &CancellationToken,
    ) -> Result<(), CoreError> {
        let reconciler = Reconciler::new(self.service, &self.registry, self.tables, cancel);
        for (kind, key, tree) in self.blueprint.trees() {
            debug!(tree = key, kind = %kind, nodes = tree.node_count(), "reconciling tree");
            reconciler.reconcile_tree(mode, kind, tree, &mut scope).await?;
        }
        RoleAssembler::new(self.service)
            .assemble(mode, self.blueprint.role_configurations(), &scope)
            .await?;
        Ok(())
    }
}

fn row_label(row: &VariableScope, number: usize) -> String {
    LABEL_KEYS
        .iter()
        .find_map(|key| row.get_non_null(key))
        .map_or_else(|| format!("#{number}"), ToString::to_string)
}
