// Repetition rows: one full reconciliation pass per row.

use tracing::debug;

use crate::error::CoreError;
use crate::expr::{Evaluated, Value, evaluate_outcome};
use crate::model::{Repetition, RepetitionType};
use crate::scope::VariableScope;
use crate::table::{SheetLocator, TableReader, pascal_case};

/// Row key that disables a row unless it is boolean `true`.
pub const IS_ENABLED_KEY: &str = "IsEnabled";

/// Expand `repetition` into row scopes, each the base scope overlaid
/// with one row's PascalCased cells.
pub fn rows(
    repetition: &Repetition,
    base: &VariableScope,
    tables: &dyn TableReader,
) -> Result<Vec<VariableScope>, CoreError> {
    match repetition.kind {
        RepetitionType::None => {
            if !repetition.config.trim().is_empty() {
                return Err(CoreError::configuration(format!(
                    "Unexpected repetition configuration for repetition type: '{}'",
                    repetition.kind
                )));
            }
            Ok(vec![base.clone()])
        }
        RepetitionType::Csv => {
            let config = match evaluate_outcome::<String>(&repetition.config, base)? {
                Evaluated::Value(config) => config,
                Evaluated::Fallback { actual } => {
                    return Err(CoreError::configuration(format!(
                        "repetition config should evaluate to a string, got a {}",
                        actual.type_name()
                    )));
                }
            };
            let locator = SheetLocator::parse(&config)?;
            let rows = tables.read(&locator)?;
            debug!(rows = rows.len(), sheet = %locator.sheet, "loaded repetition rows");
            Ok(rows
                .into_iter()
                .map(|row| base.overlaid(row.into_iter().map(|(k, v)| (pascal_case(&k), v))))
                .collect())
        }
        RepetitionType::Xlsx | RepetitionType::GoogleDriveXlsx => Err(CoreError::unsupported(
            format!("{} repetition (no spreadsheet reader is available)", repetition.kind),
        )),
    }
}

/// A row without `IsEnabled` is enabled; otherwise only boolean `true` is.
pub fn is_enabled(row: &VariableScope) -> bool {
    row.get(IS_ENABLED_KEY)
        .is_none_or(|value| matches!(value, Value::Bool(true)))
}
