//! Printable implementation for ResolvedRow.

use std::io::Write;

use super::{NA, classifier_cells, classifier_json};
use crate::correlate::{Hits, RateLimit, Rates, ResolvedRow};
use crate::output::{Column, OutputOptions, Printable, write_cells, write_header};

const COMPACT: [Column; 8] = [
    Column::new("IP", 15, "---"),
    Column::new("STATE", 10, "-----"),
    Column::new("MAC", 18, "---"),
    Column::new("FLAG", 6, "----"),
    Column::new("CLASSID", 10, "-------"),
    Column::new("HANDLE", 10, "------"),
    Column::new("RATES", 24, "----------------------"),
    Column::new("HITS", 10, "----"),
];

const EXTENSIVE: [Column; 14] = [
    Column::new("IP", 15, "---"),
    Column::new("STATE", 10, "-----"),
    Column::new("MAC", 18, "---"),
    Column::new("FLAG", 6, "----"),
    Column::new("CLASSID", 10, "-------"),
    Column::new("HEX", 12, "---"),
    Column::new("O3", 8, "---"),
    Column::new("O4", 8, "---"),
    Column::new("TABLE_ID", 8, "--------"),
    Column::new("BUCKET", 8, "------"),
    Column::new("FILTER_ID", 12, "----------"),
    Column::new("HANDLE", 10, "------"),
    Column::new("RATES", 24, "----------------------"),
    Column::new("HITS", 10, "----"),
];

fn limit_json(limit: RateLimit) -> serde_json::Value {
    match limit {
        RateLimit::Unlimited => serde_json::Value::Null,
        RateLimit::Limited(rate) => serde_json::json!(rate),
    }
}

impl Printable for ResolvedRow {
    fn print_header<W: Write>(w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        if opts.extensive {
            write_header(w, &EXTENSIVE)
        } else {
            write_header(w, &COMPACT)
        }
    }

    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        let sub = &self.subscriber;
        let lead = [
            sub.addr.to_string(),
            sub.state.map_or_else(|| "-".to_string(), |s| s.to_string()),
            sub.mac.clone().unwrap_or_else(|| "-".to_string()),
            sub.flag.map_or_else(|| "-".to_string(), |f| f.to_string()),
        ];
        let handle = self
            .classifier
            .map_or_else(|| NA.to_string(), |id| id.full_handle());
        let [classid, hex, o3, o4, table, bucket, filter] =
            classifier_cells(self.classifier.as_ref());
        let tail = [handle, self.rates.to_string(), self.hits.to_string()];

        let mut cells: Vec<String> = lead.into_iter().collect();
        if opts.extensive {
            cells.extend([classid, hex, o3, o4, table, bucket, filter]);
            cells.extend(tail);
            write_cells(w, &EXTENSIVE, &cells)
        } else {
            cells.push(classid);
            cells.extend(tail);
            write_cells(w, &COMPACT, &cells)
        }
    }

    fn to_json(&self) -> serde_json::Value {
        let sub = &self.subscriber;
        let (download, upload) = match self.rates {
            Rates::Unavailable => (serde_json::Value::Null, serde_json::Value::Null),
            Rates::Resolved { download, upload } => (limit_json(download), limit_json(upload)),
        };
        let hits = match self.hits {
            Hits::NotApplicable => serde_json::Value::Null,
            Hits::Count(n) => serde_json::json!(n),
        };

        serde_json::json!({
            "ip": sub.addr.to_string(),
            "state": sub.state,
            "mac": sub.mac,
            "flag": sub.flag,
            "active": sub.active,
            "classifier": classifier_json(self.classifier.as_ref()),
            "download": download,
            "upload": upload,
            "rates": self.rates.to_string(),
            "hits": hits,
        })
    }
}
