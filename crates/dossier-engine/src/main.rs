//! Dossier - run gene dossier workflows from the command line

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dossier_common::logging::{init_logging, LogConfig, LogLevel};
use dossier_engine::{catalog, EngineConfig, Orchestrator};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "dossier")]
#[command(author, version, about = "Gene dossier workflow runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered workflows
    Workflows,

    /// List a workflow's steps with their minimum and optional methods
    Steps {
        /// Workflow name
        workflow: String,

        /// Ping each provider first
        #[arg(long)]
        ping: bool,
    },

    /// Run a workflow and print its report
    Run {
        /// Workflow name
        workflow: String,

        /// Search term, e.g. a gene symbol
        #[arg(short, long)]
        search: String,

        /// Enable an optional method, as step:method
        #[arg(long = "enable", value_name = "STEP:METHOD")]
        enable: Vec<String>,

        /// Override method options, as step:method=<json object>
        #[arg(long = "filter", value_name = "STEP:METHOD=JSON")]
        filter: Vec<String>,

        /// Write the report to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn split_step_method(arg: &str) -> Result<(&str, &str)> {
    match arg.split_once(':') {
        Some((step, method)) if !step.is_empty() && !method.is_empty() => Ok((step, method)),
        _ => bail!("expected STEP:METHOD, got '{}'", arg),
    }
}

fn parse_filter(arg: &str) -> Result<(&str, &str, serde_json::Map<String, serde_json::Value>)> {
    let (target, json) = arg
        .split_once('=')
        .with_context(|| format!("expected STEP:METHOD=JSON, got '{arg}'"))?;
    let (step, method) = split_step_method(target)?;
    let options: serde_json::Value =
        serde_json::from_str(json).with_context(|| format!("invalid options for {target}"))?;
    match options {
        serde_json::Value::Object(map) => Ok((step, method, map)),
        _ => bail!("options for {} must be a JSON object", target),
    }
}

async fn print_steps(orchestrator: &Orchestrator, workflow: &str) -> Result<()> {
    let steps = orchestrator.get_steps(workflow).await?;
    if steps.is_empty() {
        bail!("unknown workflow '{}'", workflow);
    }
    let minimum = orchestrator.get_minimum_methods(workflow).await?;
    let optional = orchestrator.get_optional_methods(workflow).await?;

    for step in steps {
        let status = step
            .last_status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{} [{}] ({}) - {}", step.name, step.provider, status, step.description);

        let ids = |methods: Option<&dossier_engine::workflow::StepMethods>| {
            methods
                .map(|m| {
                    let ids: Vec<_> = m.methods.iter().map(|s| s.method_id.as_str()).collect();
                    ids.join(", ")
                })
                .unwrap_or_default()
        };
        println!("    minimum:  {}", ids(minimum.get(&step.name)));
        println!("    optional: {}", ids(optional.get(&step.name)));
    }
    Ok(())
}

async fn configure(
    orchestrator: &Orchestrator,
    workflow: &str,
    search: &str,
    enable: &[String],
    filter: &[String],
) -> Result<()> {
    orchestrator.set_search_param(workflow, search).await?;
    for arg in enable {
        let (step, method) = split_step_method(arg)?;
        orchestrator
            .set_optional_method(workflow, step, method, None)
            .await?;
    }
    for arg in filter {
        let (step, method, options) = parse_filter(arg)?;
        orchestrator
            .set_filter_to_method(workflow, step, method, options)
            .await?;
    }
    orchestrator.set_stage_3(workflow).await?;
    Ok(())
}

async fn run(
    orchestrator: &Orchestrator,
    workflow: &str,
    search: &str,
    enable: &[String],
    filter: &[String],
) -> Result<dossier_engine::Report> {
    orchestrator.set_stage_2(workflow).await?;

    if let Err(e) = configure(orchestrator, workflow, search, enable, filter).await {
        orchestrator.reset(workflow).await?;
        return Err(e);
    }

    Ok(orchestrator.start_workflow(workflow).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("dossier")
        .console_stderr(true)
        .build();

    // Environment variables take precedence
    let log_config = log_config.merge_env()?;
    let _guard = init_logging(&log_config)?;

    let config = EngineConfig::load().context("Failed to load engine configuration")?;
    let orchestrator = catalog::default_orchestrator(&config)?;

    match cli.command {
        Command::Workflows => {
            for workflow in orchestrator.get_workflows().await {
                println!("{:<24} {}  {}", workflow.name, workflow.stage, workflow.description);
            }
        },
        Command::Steps { workflow, ping } => {
            if ping {
                orchestrator.check_providers(&workflow).await;
            }
            print_steps(&orchestrator, &workflow).await?;
        },
        Command::Run {
            workflow,
            search,
            enable,
            filter,
            output,
        } => {
            info!(workflow = %workflow, search = %search, "Running workflow");
            let report = run(&orchestrator, &workflow, &search, &enable, &filter).await?;
            let json = report.to_json_pretty()?;

            for warning in &report.warnings {
                eprintln!("warning: {warning}");
            }

            match output {
                Some(path) => {
                    std::fs::write(&path, json)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(path = %path.display(), "Report written");
                },
                None => println!("{json}"),
            }
        },
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_step_method() {
        assert_eq!(split_step_method("uniprot:keywords").unwrap(), ("uniprot", "keywords"));
        assert!(split_step_method("uniprot").is_err());
        assert!(split_step_method(":keywords").is_err());
    }

    #[test]
    fn test_parse_filter() {
        let (step, method, options) =
            parse_filter(r#"string:interaction_partners={"limit":5}"#).unwrap();
        assert_eq!((step, method), ("string", "interaction_partners"));
        assert_eq!(options["limit"], 5);
        assert!(parse_filter("string:interaction_partners=[1]").is_err());
        assert!(parse_filter("string:interaction_partners").is_err());
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "dossier",
            "run",
            "gene_report",
            "--search",
            "EGFR",
            "--enable",
            "uniprot:keywords",
            "--filter",
            "string:interaction_partners={\"limit\":3}",
        ])
        .unwrap();
        match cli.command {
            Command::Run { workflow, enable, filter, .. } => {
                assert_eq!(workflow, "gene_report");
                assert_eq!(enable, vec!["uniprot:keywords"]);
                assert_eq!(filter.len(), 1);
            },
            other => panic!("unexpected command {other:?}"),
        }
    }
}
