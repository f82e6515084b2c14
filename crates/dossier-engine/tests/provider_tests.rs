//! Built-in providers and the gene_report workflow against mocked HTTP APIs

#![allow(clippy::unwrap_used, clippy::expect_used)]

use dossier_engine::provider::{
    ChemblProvider, ChemblResource, HttpJson, Provider, ProviderStatus, StringProvider,
    UniProtProvider,
};
use dossier_engine::{catalog, EngineConfig, NO_DATA_SENTINEL};
use serde_json::{json, Value};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gene_query(gene: &str) -> String {
    format!("(gene_exact:{gene}) AND (organism_id:9606) AND (reviewed:true)")
}

fn uniprot_entry(accession: &str, gene: &str, name: &str) -> Value {
    json!({
        "primaryAccession": accession,
        "uniProtkbId": format!("{gene}_HUMAN"),
        "organism": {"scientificName": "Homo sapiens"},
        "proteinDescription": {"recommendedName": {"fullName": {"value": name}}},
        "genes": [{"geneName": {"value": gene}}],
        "sequence": {"length": 1210},
        "comments": [
            {"commentType": "FUNCTION", "texts": [{"value": format!("{name} function.")}]},
            {"commentType": "SUBCELLULAR LOCATION", "subcellularLocations": [
                {"location": {"value": "Cell membrane"}}
            ]}
        ]
    })
}

async fn mount_uniprot(server: &MockServer, gene: &str, results: Value) {
    Mock::given(method("GET"))
        .and(path("/uniprotkb/search"))
        .and(query_param("query", gene_query(gene).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "results": results })))
        .mount(server)
        .await;
}

async fn mount_egfr_world(server: &MockServer) {
    mount_uniprot(
        server,
        "EGFR",
        json!([uniprot_entry("P00533", "EGFR", "Epidermal growth factor receptor")]),
    )
    .await;
    mount_uniprot(
        server,
        "GRB2",
        json!([uniprot_entry("P62993", "GRB2", "Growth factor receptor-bound protein 2")]),
    )
    .await;
    mount_uniprot(server, "SHC1", json!([])).await;

    Mock::given(method("GET"))
        .and(path("/json/interaction_partners"))
        .and(query_param("identifiers", "EGFR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"preferredName_A": "EGFR", "preferredName_B": "SHC1",
             "stringId_B": "9606.ENSP00000401303",
             "score": 0.8, "escore": 0.5, "dscore": 0.9, "tscore": 0.7},
            {"preferredName_A": "EGFR", "preferredName_B": "GRB2",
             "stringId_B": "9606.ENSP00000317272",
             "score": 0.999, "escore": 0.99, "dscore": 0.9, "tscore": 0.95}
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/target/search.json"))
        .and(query_param("q", "EGFR"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"targets": [
            {"target_chembl_id": "CHEMBL203", "pref_name": "Epidermal growth factor receptor erbB1",
             "organism": "Homo sapiens", "target_type": "SINGLE PROTEIN"}
        ]})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/mechanism.json"))
        .and(query_param("target_chembl_id", "CHEMBL203"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"mechanisms": [
            {"molecule_chembl_id": "CHEMBL939", "mechanism_of_action": "EGFR inhibitor",
             "action_type": "INHIBITOR", "direct_interaction": true},
            {"molecule_chembl_id": "CHEMBL0000", "mechanism_of_action": "EGFR antagonist",
             "action_type": "ANTAGONIST", "direct_interaction": true},
            {"molecule_chembl_id": "CHEMBL1201827", "mechanism_of_action": "EGFR antagonist",
             "action_type": "ANTAGONIST", "direct_interaction": true}
        ]})))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/molecule/CHEMBL939.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "molecule_chembl_id": "CHEMBL939", "pref_name": "GEFITINIB", "max_phase": "4.0",
            "molecule_type": "Small molecule", "first_approval": 2003
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/molecule/CHEMBL1201827.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "molecule_chembl_id": "CHEMBL1201827", "pref_name": "PANITUMUMAB", "max_phase": "4.0",
            "molecule_type": "Antibody", "first_approval": 2006
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/molecule/CHEMBL0000.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_gene_report_end_to_end() {
    let server = MockServer::start().await;
    mount_egfr_world(&server).await;

    let config = EngineConfig::with_base_url(&server.uri());
    let orchestrator = catalog::default_orchestrator(&config).unwrap();

    orchestrator.set_stage_2(catalog::GENE_REPORT).await.unwrap();
    orchestrator.set_search_param(catalog::GENE_REPORT, "EGFR").await.unwrap();
    orchestrator.set_stage_3(catalog::GENE_REPORT).await.unwrap();
    let report = orchestrator.start_workflow(catalog::GENE_REPORT).await.unwrap();
    let report = serde_json::to_value(&report).unwrap();

    assert_eq!(report["search_term"], "EGFR");
    assert_eq!(report["warnings"], json!([]));

    let categories = report["categories"].as_array().unwrap();
    let titles: Vec<_> = categories.iter().map(|c| c["title"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Protein annotation", "Interactions", "Pharmacology"]);

    // annotation: summary, function, subcellular location
    let annotation = categories[0]["content"].as_array().unwrap();
    assert_eq!(annotation.len(), 3);
    assert_eq!(annotation[0]["title"], "Summary");
    assert_eq!(annotation[0]["data"][0]["accession"], "P00533");

    // partners sorted by score, enriched per partner, SHC1 kept without a name
    let partners = &categories[1]["content"][0]["data"];
    assert_eq!(partners[0]["partner"], "GRB2");
    assert_eq!(partners[0]["protein_name"], "Growth factor receptor-bound protein 2");
    assert_eq!(partners[1]["partner"], "SHC1");
    assert_eq!(partners[1]["protein_name"], Value::Null);

    // pharmacology: targets, then mechanisms grouped by action type
    let pharmacology = categories[2]["content"].as_array().unwrap();
    assert_eq!(pharmacology[0]["id"], "3.1");
    assert_eq!(pharmacology[0]["data"][0]["target_chembl_id"], "CHEMBL203");

    let groups = pharmacology[1]["content"].as_array().unwrap();
    let group_titles: Vec<_> = groups.iter().map(|g| g["title"].as_str().unwrap()).collect();
    assert_eq!(group_titles, vec!["ANTAGONIST", "INHIBITOR"]);
    // the molecule that 404s is dropped
    assert_eq!(groups[0]["data"].as_array().unwrap().len(), 1);
    assert_eq!(groups[0]["data"][0]["pref_name"], "PANITUMUMAB");
    assert_eq!(groups[1]["data"][0]["pref_name"], "GEFITINIB");
}

#[tokio::test]
async fn test_gene_report_with_unknown_gene() {
    let server = MockServer::start().await;
    mount_uniprot(&server, "NOPE1", json!([])).await;
    Mock::given(method("GET"))
        .and(path("/json/interaction_partners"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/target/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"targets": []})))
        .mount(&server)
        .await;

    let config = EngineConfig::with_base_url(&server.uri());
    let orchestrator = catalog::default_orchestrator(&config).unwrap();
    orchestrator.set_stage_2(catalog::GENE_REPORT).await.unwrap();
    orchestrator.set_search_param(catalog::GENE_REPORT, "NOPE1").await.unwrap();
    orchestrator.set_stage_3(catalog::GENE_REPORT).await.unwrap();
    let report = orchestrator.start_workflow(catalog::GENE_REPORT).await.unwrap();

    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].starts_with("chembl_mechanism skipped"));

    let value = serde_json::to_value(&report).unwrap();
    assert_eq!(value["categories"][0]["content"][0]["data"], NO_DATA_SENTINEL);
    assert_eq!(value["categories"][1]["content"][0]["data"], NO_DATA_SENTINEL);
    assert_eq!(value["categories"][2]["content"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_uniprot_accession_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/uniprotkb/P00533.json"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(uniprot_entry("P00533", "EGFR", "Epidermal growth factor receptor")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let config = EngineConfig::with_base_url(&server.uri());
    let provider = UniProtProvider::new(HttpJson::new(&config).unwrap(), &config);
    let raw = provider.fetch("P00533").await.unwrap();

    let parser = provider.parser("summary").unwrap();
    let table = (parser.parse)(&raw, &Default::default()).unwrap();
    assert_eq!(table.cell_text(0, "gene").as_deref(), Some("EGFR"));
}

#[tokio::test]
async fn test_ping_reports_status_or_unreachable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"string_version": "12.0"}])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = EngineConfig::with_base_url(&server.uri());
    let http = HttpJson::new(&config).unwrap();

    let string = StringProvider::new(http.clone(), &config);
    assert_eq!(string.ping().await, ProviderStatus::OK);

    let chembl = ChemblProvider::new(http.clone(), &config, ChemblResource::Molecule);
    assert_eq!(chembl.ping().await, ProviderStatus(503));
    assert!(!chembl.ping().await.is_reachable());

    let offline = EngineConfig::with_base_url("http://127.0.0.1:9");
    let uniprot = UniProtProvider::new(HttpJson::new(&offline).unwrap(), &offline);
    assert_eq!(uniprot.ping().await, ProviderStatus::UNREACHABLE);
}

#[tokio::test]
async fn test_provider_error_status_is_a_fetch_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/molecule/CHEMBL1.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let config = EngineConfig::with_base_url(&server.uri());
    let http = HttpJson::new(&config).unwrap();
    let chembl = ChemblProvider::new(http, &config, ChemblResource::Molecule);
    assert!(chembl.fetch("CHEMBL1").await.is_err());
    assert_eq!(chembl.name(), "chembl_molecule");
}
