//! subshape qdisc command.

use clap::Args;
use subshape::collector::{Collector, SystemRunner};
use subshape::config::Config;
use subshape::output::{OutputFormat, OutputOptions, print_all};

use super::DeviceArgs;

#[derive(Args)]
pub struct QdiscCmd {
    #[command(flatten)]
    devices: DeviceArgs,
}

impl QdiscCmd {
    pub async fn run(
        self,
        config: Config,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> anyhow::Result<()> {
        let config = self.devices.apply(config);
        let collector = Collector::new(SystemRunner::new(config.timeout));
        let qdiscs = collector.qdiscs(&config.devices()).await;
        print_all(&qdiscs, format, opts)?;
        Ok(())
    }
}
