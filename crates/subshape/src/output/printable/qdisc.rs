//! Printable implementation for TcQdisc.

use std::io::Write;

use crate::output::{OutputOptions, Printable};
use crate::tc::TcQdisc;

impl Printable for TcQdisc {
    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        write!(
            w,
            "qdisc {} {} dev {}",
            self.kind().unwrap_or("unknown"),
            self.handle().unwrap_or("0:"),
            self.dev
        )?;

        if self.is_root() {
            write!(w, " root")?;
        } else if let Some(parent) = self.parent() {
            write!(w, " parent {}", parent)?;
        }

        if opts.extensive
            && let Some(options) = self.fields.get("options")
        {
            write!(w, " {}", options)?;
        }

        writeln!(w)
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
