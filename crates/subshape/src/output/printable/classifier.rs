//! Printable implementation for derived classifier IDs.

use std::io::Write;
use std::net::Ipv4Addr;

use super::{NA, classifier_cells, classifier_json};
use crate::classifier::ClassifierId;
use crate::output::{Column, OutputOptions, Printable, write_cells, write_header};

const COMPACT: [Column; 3] = [
    Column::new("IP", 15, "---"),
    Column::new("CLASSID", 10, "-------"),
    Column::new("HANDLE", 10, "------"),
];

const EXTENSIVE: [Column; 9] = [
    Column::new("IP", 15, "---"),
    Column::new("CLASSID", 10, "-------"),
    Column::new("HEX", 12, "---"),
    Column::new("O3", 8, "---"),
    Column::new("O4", 8, "---"),
    Column::new("TABLE_ID", 8, "--------"),
    Column::new("BUCKET", 8, "------"),
    Column::new("FILTER_ID", 12, "----------"),
    Column::new("HANDLE", 10, "------"),
];

/// An address as given and the identifiers derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierRow {
    pub input: String,
    pub id: Option<ClassifierId>,
}

impl ClassifierRow {
    /// Derive from user input; malformed addresses keep a `None` ID.
    pub fn derive(input: &str) -> Self {
        Self {
            input: input.to_string(),
            id: ClassifierId::derive(input),
        }
    }

    /// Row for an already parsed address.
    pub fn from_addr(addr: Ipv4Addr) -> Self {
        Self {
            input: addr.to_string(),
            id: Some(ClassifierId::from_addr(addr)),
        }
    }
}

impl Printable for ClassifierRow {
    fn print_header<W: Write>(w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        if opts.extensive {
            write_header(w, &EXTENSIVE)
        } else {
            write_header(w, &COMPACT)
        }
    }

    fn print_text<W: Write>(&self, w: &mut W, opts: &OutputOptions) -> std::io::Result<()> {
        let handle = self.id.map_or_else(|| NA.to_string(), |id| id.full_handle());
        let [classid, hex, o3, o4, table, bucket, filter] = classifier_cells(self.id.as_ref());
        if opts.extensive {
            let cells = [
                self.input.clone(),
                classid,
                hex,
                o3,
                o4,
                table,
                bucket,
                filter,
                handle,
            ];
            write_cells(w, &EXTENSIVE, &cells)
        } else {
            write_cells(w, &COMPACT, &[self.input.clone(), classid, handle])
        }
    }

    fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ip": self.input,
            "classifier": classifier_json(self.id.as_ref()),
        })
    }
}
