//! Generic plan executor: dependency resolution and fan-out enrichment
//!
//! Steps run strictly in plan order and fan-out sub-calls strictly in row
//! order. Provider failures are absorbed as `NotFound` results; a derived
//! input that cannot be resolved skips the dependent step with a warning.

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::filter::{FilterDescriptor, MethodSelection};
use crate::plan::{Enrichment, ExecutionPlan, InputSource, MissingRowPolicy, PlannedStep};
use crate::step::WorkflowStep;
use crate::table::{value_text, Table, TableResult};

/// One `(step, method, result)` triple
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutput {
    pub step: String,
    pub method: String,
    pub result: TableResult,
}

/// A planned step that did not run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedStep {
    pub step: String,
    pub reason: String,
}

/// Everything one plan run produced
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExecutionOutcome {
    pub triples: Vec<StepOutput>,
    pub skipped: Vec<SkippedStep>,
}

impl ExecutionOutcome {
    pub fn result(&self, step: &str, method: &str) -> Option<&TableResult> {
        self.triples
            .iter()
            .find(|t| t.step == step && t.method == method)
            .map(|t| &t.result)
    }

    pub fn ran(&self, step: &str) -> bool {
        self.triples.iter().any(|t| t.step == step)
    }

    fn skip(&mut self, step: &str, reason: String) {
        warn!(step = %step, reason = %reason, "Skipping step");
        self.skipped.push(SkippedStep {
            step: step.to_string(),
            reason,
        });
    }
}

/// Run `plan` over `steps`, seeding direct inputs with `search_param`
pub async fn execute(
    plan: &ExecutionPlan,
    steps: &mut IndexMap<String, WorkflowStep>,
    search_param: &str,
) -> ExecutionOutcome {
    clear_search_inputs(steps);

    let mut outcome = ExecutionOutcome::default();

    for planned in &plan.steps {
        let input = match resolve_input(planned, &outcome, search_param) {
            Ok(input) => input,
            Err(reason) => {
                outcome.skip(&planned.step, reason);
                continue;
            }
        };

        let Some(step) = steps.get_mut(&planned.step) else {
            outcome.skip(&planned.step, "step is not part of the workflow".to_string());
            continue;
        };

        match step.current_filter_mut() {
            Some(filter) => filter.set_search_param(input.clone()),
            None => {
                outcome.skip(&planned.step, "no filter attached".to_string());
                continue;
            }
        }

        debug!(step = %planned.step, input = %input, "Processing step");
        let results = match step.process().await {
            Ok(results) => results,
            Err(e) => {
                outcome.skip(&planned.step, e.to_string());
                continue;
            }
        };

        for (method, result) in results {
            let mut result = result;
            for enrichment in planned.enrichments.iter().filter(|e| e.method == method) {
                result = enrich(result, enrichment, steps).await;
            }
            outcome.triples.push(StepOutput {
                step: planned.step.clone(),
                method,
                result,
            });
        }
    }

    info!(
        triples = outcome.triples.len(),
        skipped = outcome.skipped.len(),
        "Plan executed"
    );
    outcome
}

/// Drop any search input left over from a previous run
pub fn clear_search_inputs(steps: &mut IndexMap<String, WorkflowStep>) {
    for step in steps.values_mut() {
        if let Some(filter) = step.current_filter_mut() {
            filter.clear_search_params();
        }
    }
}

fn resolve_input(
    planned: &PlannedStep,
    outcome: &ExecutionOutcome,
    search_param: &str,
) -> std::result::Result<String, String> {
    match &planned.input {
        InputSource::Direct => Ok(search_param.to_string()),
        InputSource::Derived {
            step,
            method,
            column,
            row,
        } => {
            let result = outcome
                .result(step, method)
                .ok_or_else(|| format!("upstream {step}.{method} produced no result"))?;
            let table = match result {
                TableResult::Found(table) => table,
                TableResult::NotFound(reason) => {
                    return Err(format!("upstream {step}.{method} has no data ({reason})"))
                }
            };
            table
                .cell_text(*row, column)
                .ok_or_else(|| format!("upstream {step}.{method} has no value in {column}[{row}]"))
        }
    }
}

/// Fan out over the rows of `result`, one target-step call per row.
///
/// The target runs with its attached options for `target_method` but only
/// that method. Rows keep their order; a row whose call yields no data is
/// dropped or kept unaugmented per the enrichment's policy.
async fn enrich(
    result: TableResult,
    enrichment: &Enrichment,
    steps: &mut IndexMap<String, WorkflowStep>,
) -> TableResult {
    let table = match result {
        TableResult::Found(table) => table,
        missing => return missing,
    };

    let Some(key_index) = table.column_index(&enrichment.key_column) else {
        warn!(
            method = %enrichment.method,
            column = %enrichment.key_column,
            "Enrichment key column missing, leaving table as is"
        );
        return TableResult::Found(table);
    };

    let Some(target) = steps.get_mut(&enrichment.target_step) else {
        warn!(step = %enrichment.target_step, "Enrichment target step missing");
        return TableResult::Found(table);
    };

    let template = target
        .current_filter()
        .map(|f| f.restricted_to(&enrichment.target_method))
        .unwrap_or_else(|| {
            FilterDescriptor::create(
                [MethodSelection::new(enrichment.target_method.clone())],
                enrichment.target_step.clone(),
            )
        });

    let added = added_column_names(table.columns(), &enrichment.target_step, &enrichment.columns);

    let mut enriched = Table::new(table.columns().to_vec());
    enriched.append_columns(added);

    let mut calls = 0usize;
    let mut missing = 0usize;

    for row in table.rows() {
        let sub = match value_text(&row[key_index]) {
            Some(key) => {
                calls += 1;
                let mut descriptor = template.clone();
                descriptor.set_search_param(key);
                match target.process_with(&descriptor).await {
                    Ok(mut results) => results
                        .shift_remove(&enrichment.target_method)
                        .unwrap_or_else(|| TableResult::not_found("method not run")),
                    Err(e) => TableResult::not_found(e.to_string()),
                }
            }
            None => TableResult::not_found("empty key"),
        };

        match sub.table() {
            Some(found) => {
                let mut values = row.clone();
                values.extend(
                    enrichment
                        .columns
                        .iter()
                        .map(|c| found.cell(0, c).cloned().unwrap_or(Value::Null)),
                );
                enriched.push_row(values);
            }
            None => {
                missing += 1;
                if enrichment.on_missing == MissingRowPolicy::KeepRow {
                    enriched.push_row(row.clone());
                }
            }
        }
    }

    info!(
        method = %enrichment.method,
        target = %enrichment.target_step,
        calls,
        missing,
        rows = enriched.len(),
        "Enrichment finished"
    );

    TableResult::from_table(enriched)
}

/// Names for the enrichment columns, unique against `existing` and each other.
///
/// A clashing name is prefixed with the target step, then numbered.
fn added_column_names(
    existing: &[String],
    target_step: &str,
    columns: &[String],
) -> Vec<String> {
    let mut taken: Vec<String> = existing.to_vec();
    let mut added = Vec::with_capacity(columns.len());

    for column in columns {
        let mut name = column.clone();
        if taken.contains(&name) {
            name = format!("{target_step}_{column}");
        }
        let mut suffix = 2;
        while taken.contains(&name) {
            name = format!("{target_step}_{column}_{suffix}");
            suffix += 1;
        }
        taken.push(name.clone());
        added.push(name);
    }

    added
}
