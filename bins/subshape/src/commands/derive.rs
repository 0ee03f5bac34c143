//! subshape derive command.

use clap::Args;
use subshape::output::{ClassifierRow, OutputFormat, OutputOptions, print_all};

#[derive(Args)]
pub struct DeriveCmd {
    /// IPv4 addresses.
    #[arg(value_name = "IP", required = true)]
    addrs: Vec<String>,
}

impl DeriveCmd {
    pub fn run(self, format: OutputFormat, opts: &OutputOptions) -> anyhow::Result<()> {
        let rows: Vec<_> = self.addrs.iter().map(|a| ClassifierRow::derive(a)).collect();
        for row in rows.iter().filter(|r| r.id.is_none()) {
            tracing::warn!(input = %row.input, "not an IPv4 address");
        }
        print_all(&rows, format, opts)?;
        Ok(())
    }
}
