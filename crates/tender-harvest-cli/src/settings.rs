//! Effective configuration: file, then environment, then flags.

use anyhow::Context;
use tender_harvest::HarvestConfig;

use crate::RunArgs;

pub fn resolve(args: &RunArgs) -> anyhow::Result<HarvestConfig> {
    let base = match &args.config {
        Some(path) => HarvestConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => HarvestConfig::default(),
    };
    let mut config = base.with_env();

    if let Some(dir) = &args.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(dir) = &args.debug_dir {
        config.debug_dir = dir.clone();
    }
    if let Some(start) = args.start {
        config.start_index = start;
    }
    if let Some(end) = args.end {
        config.end_index = Some(end);
    }
    if let Some(retries) = args.retries {
        config.retries = retries;
    }
    if let Some(url) = &args.base_url {
        config.base_url = url.clone();
    }
    if let Some(max) = args.max_other_tenderers {
        config.max_other_tenderers = Some(max);
    }
    config.headless |= args.headless;
    config.debug |= args.debug;
    config.verify_award_date |= args.verify_award_date;
    config.pending_only |= args.pending_only;

    config.validate().context("invalid configuration")?;
    if config.retries == 0 {
        tracing::warn!("retries is 0; each location is still attempted once");
    }
    Ok(config)
}
