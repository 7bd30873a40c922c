//! CLI transport for direct terminal interaction

use crate::config::Config;
use crate::llm::ProviderContext;
use crate::orchestration::{Deployment, Reply};
use anyhow::{Context, Result};
use colored::Colorize;
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

/// Run one prompt through a deployment and print the reply
///
/// Returns `false` when the deployment answered with an error status.
pub async fn run_ask(config: &Config, deployment: &str, prompt: &str, json: bool) -> Result<bool> {
    let deployment_config = config
        .deployments()
        .into_iter()
        .find(|d| d.name == deployment)
        .with_context(|| {
            format!(
                "Unknown deployment '{}'. Run `definitive deployments` to list them.",
                deployment
            )
        })?;

    let ctx = ProviderContext::new(config.providers.clone());
    let deployment = Deployment::from_config(
        &deployment_config,
        &ctx,
        Duration::from_secs(config.timeout_secs),
    )?;

    let outcome = deployment.run(prompt).await;
    let ok = outcome.status < 400;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        match &outcome.reply {
            Reply::Text(text) => println!("{}", text),
            Reply::Json(value) => {
                let rendered = serde_json::to_string_pretty(value)?;
                if ok {
                    println!("{}", rendered);
                } else {
                    eprintln!("{} {}", "Error:".red().bold(), rendered);
                }
            }
        }
    }

    Ok(ok)
}

#[derive(Tabled)]
struct DeploymentRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Policy")]
    policy: String,
    #[tabled(rename = "Adapters")]
    adapters: String,
    #[tabled(rename = "Live Adapters")]
    live: String,
    #[tabled(rename = "Envelope")]
    envelope: String,
    #[tabled(rename = "Timeout")]
    timeout: String,
}

/// Print the configured deployments as a table
pub fn run_deployments(config: &Config) -> Result<()> {
    let rows: Vec<DeploymentRow> = config
        .deployments()
        .iter()
        .map(|d| DeploymentRow {
            name: d.name.clone(),
            policy: d.policy.kind().to_string(),
            adapters: d.adapters.len().to_string(),
            live: d
                .router
                .as_ref()
                .map(|r| r.live_adapters.len().to_string())
                .unwrap_or_else(|| "-".to_string()),
            envelope: format!("{:?}", d.envelope).to_lowercase(),
            timeout: format!("{}s", d.timeout_secs.unwrap_or(config.timeout_secs)),
        })
        .collect();

    println!("\n{}", "=== DEPLOYMENTS ===".bold().cyan());
    println!();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{}", table);
    println!();

    for kind in crate::config::ProviderKind::all() {
        let count = config.providers.keys(kind).api_keys.len();
        let status = if count == 0 {
            "not set".yellow()
        } else {
            format!("{} key(s)", count).green()
        };
        println!("{:<20} {}", kind.env_var(), status);
    }

    Ok(())
}
