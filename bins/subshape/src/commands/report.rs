//! subshape report command.

use clap::Args;
use subshape::collector::{Collector, SystemRunner};
use subshape::config::Config;
use subshape::correlate::correlate;
use subshape::output::{OutputFormat, OutputOptions, print_all};

use super::DeviceArgs;

#[derive(Args)]
pub struct ReportCmd {
    #[command(flatten)]
    devices: DeviceArgs,

    /// Only report members of the subscriber set.
    #[arg(long)]
    active_only: bool,
}

impl ReportCmd {
    pub async fn run(
        self,
        config: Config,
        format: OutputFormat,
        opts: &OutputOptions,
    ) -> anyhow::Result<()> {
        let config = self.devices.apply(config);
        tracing::debug!(
            lan = %config.lan_dev,
            ifb = %config.ifb_dev,
            "collecting report"
        );

        let collector = Collector::new(SystemRunner::new(config.timeout));
        let snapshot = collector.snapshot(&config).await;
        let rows = correlate(&snapshot, &config.ifb_dev, self.active_only);

        print_all(&rows, format, opts)?;
        Ok(())
    }
}
