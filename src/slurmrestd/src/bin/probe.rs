//! slurmrestd probe
//!
//! Negotiates the API version with the configured slurmrestd and optionally
//! prints one resource, through the same layers the agent uses.

use anyhow::{bail, Context, Result};
use clap::Parser;
use slurmgate_cache::CachingService;
use slurmgate_client::{build_client, SlurmrestdApi};
use slurmgate_shared::{GatewayConfig, LoggingConfig, Resource, ResourceRequest};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "slurmgate-probe", version, about = "Probe a slurmrestd endpoint")]
struct Args {
    /// Configuration file, environment variables apply when omitted
    #[arg(short, long, env = "SLURMGATE_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// slurmrestd URI, overrides the configuration
    #[arg(short, long)]
    uri: Option<String>,

    /// Resource to print (jobs, job, nodes, node, acct-job, qos, ...)
    #[arg(short, long)]
    resource: Option<String>,

    /// Job id or node name for single item resources
    #[arg(short, long)]
    param: Option<String>,
}

fn init_tracing(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = match config.format.as_str() {
        "json" => fmt::layer().json().boxed(),
        _ => fmt::layer().pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn parse_request(name: &str, param: Option<String>) -> Result<ResourceRequest> {
    let Some(resource) = Resource::ALL.into_iter().find(|r| r.name() == name) else {
        bail!("Unknown resource {}", name);
    };

    match (resource.is_parameterized(), param) {
        (true, Some(param)) => Ok(ResourceRequest::with_param(resource, param)),
        (true, None) => bail!("Resource {} requires --param", name),
        (false, None) => Ok(ResourceRequest::new(resource)),
        (false, Some(_)) => bail!("Resource {} takes no parameter", name),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => GatewayConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => GatewayConfig::from_env().context("Failed to load configuration")?,
    };
    if let Some(uri) = args.uri {
        config.slurmrestd.uri = uri;
        config.validate().context("Invalid slurmrestd URI")?;
    }

    init_tracing(&config.logging);

    let cache = CachingService::from_config(&config.cache)
        .await
        .context("Failed to connect the cache")?;
    let client =
        build_client(&config, cache.clone()).context("Failed to build slurmrestd client")?;

    let endpoint = client.discover().await.context("Version discovery failed")?;
    let cluster = config.cluster.as_deref().unwrap_or(&endpoint.cluster);
    info!(
        cluster,
        release = %endpoint.release,
        api_version = %endpoint.api_version,
        "slurmrestd reachable"
    );

    if let Some(name) = args.resource.as_deref() {
        let request = parse_request(name, args.param)?;
        let value = match request.resource {
            Resource::Job => {
                let job_id = request
                    .param
                    .as_deref()
                    .unwrap_or_default()
                    .parse::<u64>()
                    .context("Job id must be a number")?;
                client.job(job_id).await?
            }
            _ => client.fetch(&request).await?,
        };
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&endpoint)?);
    }

    if cache.is_enabled() {
        let metrics = cache.metrics().await.context("Failed to read cache metrics")?;
        info!(
            hits = metrics.total_hits,
            misses = metrics.total_misses,
            hit_ratio = metrics.hit_ratio(),
            "Cache usage"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        let request = parse_request("acct-job", Some("42".to_string())).unwrap();
        assert_eq!(request.resource, Resource::AcctJob);
        assert_eq!(request.param.as_deref(), Some("42"));

        assert!(parse_request("jobs", None).is_ok());
        assert!(parse_request("jobs", Some("1".to_string())).is_err());
        assert!(parse_request("node", None).is_err());
        assert!(parse_request("licenses", None).is_err());
    }
}
