//! asg-fleet: provision a load-balanced Auto Scaling fleet from one EC2 instance
//!
//! Creates, in order, an AMI of the instance, a spot launch template, a
//! target group, an application load balancer with a listener, and an Auto
//! Scaling group, then waits until the requested number of members are
//! healthy behind the balancer.

use anyhow::{Context, Result};
use asg_fleet::aws::{AwsContext, AwsControlPlane};
use asg_fleet::config;
use asg_fleet::orchestrator::{plan_fleet, provision_fleet, report};
use asg_fleet_common::defaults::{
    DEFAULT_HEALTH_CHECK_GRACE_PERIOD, DEFAULT_HEALTH_PATH, DEFAULT_INSTANCES, DEFAULT_PORT,
    DEFAULT_UPDATE_TICK, DEFAULT_UPDATE_TIMEOUT,
};
use asg_fleet_common::parse_duration;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Crates whose logs are only interesting when something goes wrong
const QUIET_TARGETS: &[&str] = &[
    "aws_config",
    "aws_smithy_runtime",
    "aws_smithy_runtime_api",
    "aws_sdk_ec2",
    "aws_sdk_elasticloadbalancingv2",
    "aws_sdk_autoscaling",
];

#[derive(Parser, Debug)]
#[command(name = "asg-fleet")]
#[command(about = "Provision a load-balanced EC2 Auto Scaling fleet from a reference instance")]
#[command(version)]
struct Args {
    /// Logical group name; every resource name is derived from it
    #[arg(long)]
    group: String,

    /// ID of the instance to build the fleet from
    #[arg(long)]
    instance: String,

    /// Health check path served by fleet members
    #[arg(long, default_value = DEFAULT_HEALTH_PATH)]
    health_path: String,

    /// Port fleet members serve traffic and health checks on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Number of healthy instances to wait for
    #[arg(long, default_value_t = DEFAULT_INSTANCES)]
    instances: u32,

    /// Time before a new instance's health check counts (e.g. "90s")
    #[arg(long, default_value = DEFAULT_HEALTH_CHECK_GRACE_PERIOD, value_parser = parse_duration)]
    health_check_grace_period: Duration,

    /// Maximum time to wait for each resource to become ready
    #[arg(long, default_value = DEFAULT_UPDATE_TIMEOUT, value_parser = parse_duration)]
    update_timeout: Duration,

    /// Delay between two status checks
    #[arg(long, default_value = DEFAULT_UPDATE_TICK, value_parser = parse_duration)]
    update_tick: Duration,

    /// AWS region (default: from the environment or AWS config)
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// AWS profile to use
    #[arg(long, env = "AWS_PROFILE")]
    aws_profile: Option<String>,

    /// Look up the source instance and network, log the plan, create nothing
    #[arg(long)]
    dry_run: bool,

    /// Write the fleet summary to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl From<Args> for config::RunConfig {
    fn from(args: Args) -> Self {
        Self {
            fleet: config::FleetConfig {
                group_name: args.group,
                instance_id: args.instance,
                size: args.instances,
            },
            health_check: config::HealthCheckConfig {
                path: args.health_path,
                port: args.port,
                grace_period: args.health_check_grace_period,
            },
            poll: config::PollConfig {
                timeout: args.update_timeout,
                tick: args.update_tick,
            },
            aws: config::AwsConfig {
                region: args.region,
                aws_profile: args.aws_profile,
            },
            flags: config::RuntimeFlags {
                dry_run: args.dry_run,
                output: args.output,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        report::print_failure(&e);
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<()> {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    for target in QUIET_TARGETS {
        filter = filter.add_directive(format!("{target}=warn").parse()?);
    }

    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

async fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let mut config: config::RunConfig = args.into();

    if let Some(profile) = &config.aws.aws_profile {
        info!(profile = %profile, "Using AWS profile");
    }

    let aws = AwsContext::load(config.aws.region.as_deref(), config.aws.aws_profile.as_deref()).await;
    if aws.region().is_empty() {
        anyhow::bail!("No AWS region configured; pass --region or set AWS_REGION");
    }
    config.aws.region = Some(aws.region().to_string());

    info!(
        group = %config.fleet.group_name,
        instance_id = %config.fleet.instance_id,
        instances = config.fleet.size,
        region = %aws.region(),
        "Starting fleet provisioning"
    );

    let plane = AwsControlPlane::from_context(&aws, config.group_name());

    if config.dry_run() {
        plan_fleet(&plane, &config)
            .await
            .context("Dry run failed")?;
        info!("Dry run complete, nothing was created");
        return Ok(());
    }

    match provision_fleet(&plane, &config).await {
        Ok(summary) => {
            report::log_summary(&summary);
            report::print_summary(&summary);
            if let Some(path) = &config.flags.output {
                report::write_summary(path, &summary)?;
            }
            Ok(())
        }
        Err(failure) => {
            if let Some(rollback) = &failure.rollback {
                report::print_rollback(rollback);
            }
            Err(failure.into())
        }
    }
}
