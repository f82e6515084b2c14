//! Built-in workflows

use anyhow::Result;
use serde_json::json;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::filter::MethodSelection;
use crate::orchestrator::Orchestrator;
use crate::plan::{Enrichment, ExecutionPlan, MissingRowPolicy, PlannedStep};
use crate::provider::{ChemblProvider, ChemblResource, HttpJson, StringProvider, UniProtProvider};
use crate::report::{CategoryConfig, CategoryDef, ReportLayout};
use crate::step::WorkflowStep;
use crate::workflow::Workflow;

pub const GENE_REPORT: &str = "gene_report";
pub const INTERACTION_NETWORK: &str = "interaction_network";

/// Orchestrator with every built-in workflow registered
pub fn default_orchestrator(config: &EngineConfig) -> Result<Orchestrator> {
    let http = HttpJson::new(config)?;
    Ok(Orchestrator::new(vec![
        gene_report(&http, config)?,
        interaction_network(&http, config)?,
    ])?)
}

fn partners_by_score() -> serde_json::Value {
    json!({
        "sort": [{"column": "score", "descending": true}],
        "limit": 20
    })
}

fn pairs(entries: &[(&str, &str)]) -> indexmap::IndexMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// Annotation, interaction partners and pharmacology for one gene
pub fn gene_report(http: &HttpJson, config: &EngineConfig) -> Result<Workflow> {
    let uniprot = WorkflowStep::new(
        "uniprot",
        "UniProtKB entry for the gene",
        Arc::new(UniProtProvider::new(http.clone(), config)),
    );
    let string = WorkflowStep::new(
        "string",
        "STRING interaction partners",
        Arc::new(StringProvider::new(http.clone(), config)),
    );
    let chembl_target = WorkflowStep::new(
        "chembl_target",
        "ChEMBL targets matching the gene",
        Arc::new(ChemblProvider::new(http.clone(), config, ChemblResource::TargetSearch)),
    );
    let chembl_mechanism = WorkflowStep::new(
        "chembl_mechanism",
        "Mechanisms of action against the first matching target",
        Arc::new(ChemblProvider::new(http.clone(), config, ChemblResource::Mechanism)),
    );
    let chembl_molecule = WorkflowStep::new(
        "chembl_molecule",
        "ChEMBL molecule records",
        Arc::new(ChemblProvider::new(http.clone(), config, ChemblResource::Molecule)),
    );

    let plan = ExecutionPlan::new(vec![
        PlannedStep::direct("uniprot"),
        PlannedStep::direct("string").enrich(Enrichment {
            method: "interaction_partners".to_string(),
            key_column: "partner".to_string(),
            target_step: "uniprot".to_string(),
            target_method: "summary".to_string(),
            columns: vec!["protein_name".to_string()],
            on_missing: MissingRowPolicy::KeepRow,
        }),
        PlannedStep::direct("chembl_target"),
        PlannedStep::derived("chembl_mechanism", "chembl_target", "targets", "target_chembl_id")
            .enrich(Enrichment {
                method: "mechanisms".to_string(),
                key_column: "molecule_chembl_id".to_string(),
                target_step: "chembl_molecule".to_string(),
                target_method: "molecule".to_string(),
                columns: vec!["pref_name".to_string(), "max_phase".to_string()],
                on_missing: MissingRowPolicy::DropRow,
            }),
    ]);

    let layout = ReportLayout {
        category_config: CategoryConfig {
            categories: vec![
                CategoryDef::new("1", "Protein annotation"),
                CategoryDef::new("2", "Interactions"),
                CategoryDef::new("3", "Pharmacology"),
            ],
            titles: pairs(&[
                ("summary", "Summary"),
                ("function", "Function"),
                ("subcellular_location", "Subcellular location"),
                ("keywords", "Keywords"),
                ("diseases", "Disease associations"),
                ("interaction_partners", "Interaction partners"),
                ("network_summary", "Network summary"),
                ("targets", "ChEMBL targets"),
                ("mechanisms", "Mechanisms of action"),
            ]),
        },
        method_category_mapping: pairs(&[
            ("summary", "1"),
            ("function", "1"),
            ("subcellular_location", "1"),
            ("keywords", "1"),
            ("diseases", "1"),
            ("interaction_partners", "2"),
            ("network_summary", "2"),
            ("targets", "3"),
            ("mechanisms", "3"),
        ]),
        grouping_config: pairs(&[("mechanisms", "action_type")]),
    };

    let description = "Protein annotation, interactions and drug mechanisms for a gene";
    Ok(Workflow::builder(GENE_REPORT, description)
        .step(
            uniprot,
            [
                MethodSelection::new("summary"),
                MethodSelection::new("function"),
                MethodSelection::new("subcellular_location"),
            ],
        )
        .step(
            string,
            [MethodSelection::new("interaction_partners").with_options(partners_by_score())],
        )
        .step(chembl_target, [MethodSelection::new("targets")])
        .step(
            chembl_mechanism,
            [MethodSelection::new("mechanisms")
                .with_options(json!({"sort": ["action_type", "molecule_chembl_id"]}))],
        )
        .step(chembl_molecule, [MethodSelection::new("molecule")])
        .optional_methods(
            "uniprot",
            [MethodSelection::new("keywords"), MethodSelection::new("diseases")],
        )
        .optional_methods("string", [MethodSelection::new("network_summary")])
        .plan(plan)
        .layout(layout)
        .build()?)
}

/// STRING neighbourhood of a gene with UniProt names for each partner
pub fn interaction_network(http: &HttpJson, config: &EngineConfig) -> Result<Workflow> {
    let uniprot = WorkflowStep::new(
        "uniprot",
        "UniProtKB entries for the query and its partners",
        Arc::new(UniProtProvider::new(http.clone(), config)),
    );
    let string = WorkflowStep::new(
        "string",
        "STRING interaction partners and network statistics",
        Arc::new(StringProvider::new(http.clone(), config)),
    );

    let plan = ExecutionPlan::new(vec![
        PlannedStep::direct("uniprot"),
        PlannedStep::direct("string").enrich(Enrichment {
            method: "interaction_partners".to_string(),
            key_column: "partner".to_string(),
            target_step: "uniprot".to_string(),
            target_method: "summary".to_string(),
            columns: vec![
                "accession".to_string(),
                "protein_name".to_string(),
                "length".to_string(),
            ],
            on_missing: MissingRowPolicy::KeepRow,
        }),
    ]);

    let layout = ReportLayout {
        category_config: CategoryConfig {
            categories: vec![
                CategoryDef::new("1", "Query protein"),
                CategoryDef::new("2", "Network"),
            ],
            titles: pairs(&[
                ("summary", "Summary"),
                ("network_summary", "Network summary"),
                ("interaction_partners", "Interaction partners"),
            ]),
        },
        method_category_mapping: pairs(&[
            ("summary", "1"),
            ("network_summary", "2"),
            ("interaction_partners", "2"),
        ]),
        grouping_config: Default::default(),
    };

    Ok(Workflow::builder(INTERACTION_NETWORK, "Interaction partners of a gene, annotated")
        .step(uniprot, [MethodSelection::new("summary")])
        .step(
            string,
            [
                MethodSelection::new("network_summary"),
                MethodSelection::new("interaction_partners").with_options(partners_by_score()),
            ],
        )
        .plan(plan)
        .layout(layout)
        .build()?)
}
