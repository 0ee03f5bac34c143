//! subshape sample command.

use clap::Args;
use subshape::network::Network;
use subshape::output::{ClassifierRow, OutputFormat, OutputOptions, print_all};

#[derive(Args)]
pub struct SampleCmd {
    /// Network to sample, e.g. 10.20.0.0/22.
    #[arg(value_name = "CIDR")]
    network: Network,

    /// Number of host addresses.
    #[arg(short = 'n', long, default_value_t = 10)]
    count: usize,
}

impl SampleCmd {
    pub fn run(self, format: OutputFormat, opts: &OutputOptions) -> anyhow::Result<()> {
        let hosts = self.network.hosts(self.count)?;
        tracing::debug!(network = %self.network, count = hosts.len(), "sampled hosts");

        let rows: Vec<_> = hosts
            .iter()
            .map(|addr| ClassifierRow::from_addr(*addr))
            .collect();
        print_all(&rows, format, opts)?;
        Ok(())
    }
}
