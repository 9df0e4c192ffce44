//! `msbuildcc instances` command

use anyhow::Result;

use crate::cli::InstancesArgs;
use msbuildcc::ops::{format_instances, list_instances};

pub fn execute(args: InstancesArgs) -> Result<()> {
    let config = super::current_config()?;
    let cache = super::instance_cache(args.instances.as_deref(), &config);

    let summaries = list_instances(&cache)?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
    } else {
        print!("{}", format_instances(&summaries));
    }

    Ok(())
}
