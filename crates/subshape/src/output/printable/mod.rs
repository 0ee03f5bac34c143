//! Printable implementations for report records.

mod classifier;
mod qdisc;
mod report;

pub use classifier::ClassifierRow;

use crate::classifier::ClassifierId;

const NA: &str = "N/A";

/// Extensive classifier cells: classid, hex, o3, o4, table, bucket, filter.
fn classifier_cells(id: Option<&ClassifierId>) -> [String; 7] {
    match id {
        Some(id) => [
            id.classid(),
            id.classid_hex(),
            id.octet3().to_string(),
            id.octet4().to_string(),
            id.table_id_hex(),
            id.bucket_hex(),
            id.filter_id_hex(),
        ],
        None => std::array::from_fn(|_| NA.to_string()),
    }
}

fn classifier_json(id: Option<&ClassifierId>) -> serde_json::Value {
    match id {
        Some(id) => serde_json::json!({
            "hash": id.hash(),
            "classid": id.classid(),
            "classid_hex": id.classid_hex(),
            "octet3": id.octet3(),
            "octet4": id.octet4(),
            "table_id": id.table_id_hex(),
            "bucket": id.bucket_hex(),
            "filter_id": id.filter_id_hex(),
            "handle": id.full_handle(),
        }),
        None => serde_json::Value::Null,
    }
}
