//! Run summary display and JSON output

use super::rollback::{DeleteStatus, RollbackReport};
use super::types::FleetSummary;
use crate::error::ProvisionError;
use anyhow::{Context, Result};
use comfy_table::{Cell, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED};
use std::path::Path;
use tracing::info;

/// Log the console links and health check URL of a finished run.
pub fn log_summary(summary: &FleetSummary) {
    info!(link = %summary.links.image, "Image");
    info!(link = %summary.links.launch_template, "Launch template");
    info!(link = %summary.links.target_group, "Target group");
    info!(link = %summary.links.load_balancer, "Load balancer");
    info!(link = %summary.links.auto_scaling_group, "Auto scaling group");
    info!(url = %summary.health_check_url, "Check out the health status");
}

/// Table of every created artifact and its console link
pub fn summary_table(summary: &FleetSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Resource"), Cell::new("ID"), Cell::new("Link")]);

    let rows = [
        ("Image", &summary.image_id, &summary.links.image),
        (
            "Launch template",
            &summary.launch_template_id,
            &summary.links.launch_template,
        ),
        (
            "Target group",
            &summary.target_group_arn,
            &summary.links.target_group,
        ),
        (
            "Load balancer",
            &summary.load_balancer_arn,
            &summary.links.load_balancer,
        ),
        (
            "Auto scaling group",
            &summary.auto_scaling_group_name,
            &summary.links.auto_scaling_group,
        ),
    ];
    for (kind, id, link) in rows {
        table.add_row(vec![Cell::new(kind), Cell::new(id), Cell::new(link)]);
    }
    table
}

/// Print the summary table and the health check URL to stdout
pub fn print_summary(summary: &FleetSummary) {
    println!("\n=== Fleet {} ===\n", summary.group_name);
    println!("{}", summary_table(summary));
    println!("\nHealth check: {}", summary.health_check_url);
}

/// Table of rollback outcomes
pub fn rollback_table(report: &RollbackReport) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![Cell::new("Resource"), Cell::new("ID"), Cell::new("Result")]);

    for outcome in &report.outcomes {
        let result = match &outcome.status {
            DeleteStatus::Deleted => "deleted".to_string(),
            DeleteStatus::Failed { message } => format!("FAILED: {message}"),
        };
        table.add_row(vec![
            Cell::new(outcome.kind.as_str()),
            Cell::new(&outcome.id),
            Cell::new(result),
        ]);
    }
    table
}

/// Print what rollback did to stderr
pub fn print_rollback(report: &RollbackReport) {
    if report.outcomes.is_empty() {
        eprintln!("\nNothing to roll back.");
        return;
    }
    eprintln!("\n=== Rollback ===\n");
    eprintln!("{}", rollback_table(report));
}

/// Render a failed run for the terminal: the error, the stage it stopped
/// in when known, then every cause.
pub fn failure_report(err: &anyhow::Error) -> String {
    let mut lines = vec![format!("Error: {err}")];

    let stage = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ProvisionError>())
        .and_then(ProvisionError::stage);
    if let Some(stage) = stage {
        lines.push(format!("  Failed stage: {stage}"));
    }

    lines.extend(err.chain().skip(1).map(|cause| format!("  Caused by: {cause}")));
    lines.join("\n")
}

/// Print a failed run to stderr
pub fn print_failure(err: &anyhow::Error) {
    eprintln!("\n{}", failure_report(err));
}

/// Write the summary as pretty-printed JSON
pub fn write_summary(path: &Path, summary: &FleetSummary) -> Result<()> {
    let written_at = chrono::Utc::now();
    let output = serde_json::json!({
        "written_at": written_at.to_rfc3339(),
        "fleet": summary,
    });

    std::fs::write(path, serde_json::to_string_pretty(&output)?)
        .with_context(|| format!("Failed to write summary to {}", path.display()))?;
    info!(path = %path.display(), "Summary written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::rollback::RollbackOutcome;
    use crate::error::Stage;
    use crate::orchestrator::types::{ConsoleLinks, ProvisionFailure};
    use asg_fleet_common::ResourceKind;

    fn summary() -> FleetSummary {
        FleetSummary {
            group_name: "fleet_a".to_string(),
            region: "us-east-2".to_string(),
            image_id: "ami-1".to_string(),
            launch_template_id: "lt-1".to_string(),
            target_group_arn: "arn:tg".to_string(),
            load_balancer_arn: "arn:lb".to_string(),
            load_balancer_dns_name: "fleet-a.elb.amazonaws.com".to_string(),
            auto_scaling_group_name: "fleet_a".to_string(),
            health_check_url: "http://fleet-a.elb.amazonaws.com:80/health".to_string(),
            links: ConsoleLinks {
                image: "https://image".to_string(),
                launch_template: "https://lt".to_string(),
                target_group: "https://tg".to_string(),
                load_balancer: "https://lb".to_string(),
                auto_scaling_group: "https://asg".to_string(),
            },
        }
    }

    #[test]
    fn test_write_summary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fleet.json");

        write_summary(&path, &summary()).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["fleet"]["image_id"], "ami-1");
        assert_eq!(json["fleet"]["links"]["auto_scaling_group"], "https://asg");
        assert_eq!(
            json["fleet"]["health_check_url"],
            "http://fleet-a.elb.amazonaws.com:80/health"
        );
        assert!(json["written_at"].is_string());
    }

    #[test]
    fn test_write_summary_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("fleet.json");
        let err = write_summary(&path, &summary()).unwrap_err();
        assert!(err.to_string().contains("Failed to write summary"));
    }

    #[test]
    fn test_summary_table_lists_every_artifact() {
        let rendered = summary_table(&summary()).to_string();
        for id in ["ami-1", "lt-1", "arn:tg", "arn:lb", "fleet_a"] {
            assert!(rendered.contains(id), "missing {id}");
        }
    }

    #[test]
    fn test_rollback_table_shows_failures() {
        let report = RollbackReport {
            outcomes: vec![
                RollbackOutcome {
                    kind: ResourceKind::LaunchTemplate,
                    id: "lt-1".to_string(),
                    status: DeleteStatus::Failed {
                        message: "denied".to_string(),
                    },
                },
                RollbackOutcome {
                    kind: ResourceKind::Image,
                    id: "ami-1".to_string(),
                    status: DeleteStatus::Deleted,
                },
            ],
        };
        let rendered = rollback_table(&report).to_string();
        assert!(rendered.contains("FAILED: denied"));
        assert!(rendered.contains("deleted"));
    }

    #[test]
    fn test_failure_report_names_stage_and_causes() {
        let failure = ProvisionFailure {
            error: ProvisionError::TerminalState {
                stage: Stage::LoadBalancer,
                resource: "fleet-a".to_string(),
                state: "failed".to_string(),
            },
            rollback: None,
        };
        let rendered = failure_report(&anyhow::Error::from(failure));

        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "Error: cannot provision the fleet");
        assert_eq!(lines[1], "  Failed stage: load-balancer");
        assert!(lines[2].starts_with("  Caused by: load-balancer stage: fleet-a"));
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_failure_report_finds_stage_behind_context() {
        let err = anyhow::Error::from(ProvisionError::Unavailable {
            stage: Stage::DefaultNetwork,
            resource: "vpc-1".to_string(),
            reason: "no default subnets".to_string(),
        })
        .context("Dry run failed");

        let rendered = failure_report(&err);
        assert!(rendered.starts_with("Error: Dry run failed"));
        assert!(rendered.contains("Failed stage: default-network"));
        assert!(rendered.contains("Caused by: default-network stage: vpc-1 is unusable"));
    }

    #[test]
    fn test_failure_report_without_stage() {
        let rendered = failure_report(&anyhow::anyhow!("No AWS region configured"));
        assert_eq!(rendered, "Error: No AWS region configured");
    }
}
