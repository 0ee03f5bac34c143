//! Traffic-control records: classes, qdiscs and filters.
//!
//! Classes and qdiscs come from `tc -j`, filters from the statistics
//! text of `tc -s -p filter show`, which has no JSON form worth using.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use winnow::prelude::*;

use crate::error::Result;
use crate::parse::{PResult, capture_after, decimal, handle_token};

/// A traffic-control class on one device.
///
/// Rate and size fields are bytes (per second for rates); `None` means
/// the kernel did not report a usable value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TcClass {
    pub dev: String,
    /// Class ID used for matching; `1:0x<leaf>` for hex leaves.
    pub classid: String,
    /// Handle as the kernel reported it.
    pub original_handle: String,
    pub parent: String,
    pub rate: Option<i64>,
    pub ceil: Option<i64>,
    pub quantum: Option<i64>,
    pub burst: Option<i64>,
    pub cburst: Option<i64>,
}

impl TcClass {
    /// The 16-bit minor of the class ID.
    ///
    /// `1:0x<hex>` minors are hex; any other minor is read as the decimal
    /// hash the shaper provisions classes with.
    pub fn minor(&self) -> Option<u16> {
        let (_, minor) = self.classid.split_once(':')?;
        match minor
            .strip_prefix("0x")
            .or_else(|| minor.strip_prefix("0X"))
        {
            Some(hex) => u16::from_str_radix(hex, 16).ok(),
            None => minor.parse().ok(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawRates {
    rate: Option<Value>,
    ceil: Option<Value>,
    quantum: Option<Value>,
    burst: Option<Value>,
    cburst: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawClass {
    handle: Option<String>,
    classid: Option<String>,
    parent: Option<String>,
    leaf: Option<String>,
    htb: Option<RawRates>,
    #[serde(flatten)]
    flat: RawRates,
}

impl RawClass {
    fn into_class(self, dev: &str) -> TcClass {
        let original_handle = self.handle.or(self.classid).unwrap_or_default();
        let classid = self
            .leaf
            .as_deref()
            .and_then(hex_leaf)
            .map(|hex| format!("1:0x{hex}"))
            .unwrap_or_else(|| original_handle.clone());

        let mut class = TcClass {
            dev: dev.to_string(),
            classid,
            original_handle,
            parent: self.parent.unwrap_or_default(),
            ..Default::default()
        };

        let field = |v: &Option<Value>| v.as_ref().and_then(numeric);
        if let Some(htb) = &self.htb {
            class.rate = field(&htb.rate);
            class.ceil = field(&htb.ceil);
            class.quantum = field(&htb.quantum);
            class.burst = field(&htb.burst);
            class.cburst = field(&htb.cburst);
        } else if self.flat.rate.is_some() {
            class.rate = field(&self.flat.rate);
            class.ceil = field(&self.flat.ceil);
            class.burst = field(&self.flat.burst);
            class.cburst = field(&self.flat.cburst);
        }
        class
    }
}

/// `0x<hex>` leaf qdisc references, case-insensitive.
fn hex_leaf(leaf: &str) -> Option<&str> {
    let hex = leaf.strip_prefix("0x").or_else(|| leaf.strip_prefix("0X"))?;
    (!hex.is_empty() && hex.bytes().all(|b| b.is_ascii_hexdigit())).then_some(hex)
}

/// Interpret a JSON number or numeric string.
fn numeric(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f as i64))
        }
        _ => None,
    }
}

/// Top-level JSON array elements; empty output is an empty list.
fn json_elements(text: &str) -> Result<Vec<Value>> {
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(text)? {
        Value::Array(items) => Ok(items),
        _ => Ok(Vec::new()),
    }
}

/// Parse `tc -j class show dev <dev>` output.
pub fn parse_classes(dev: &str, text: &str) -> Result<Vec<TcClass>> {
    let classes = json_elements(text)?
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<RawClass>(item) {
            Ok(raw) => Some(raw.into_class(dev)),
            Err(e) => {
                tracing::debug!(dev = %dev, error = %e, "skipping malformed class record");
                None
            }
        })
        .collect();
    Ok(classes)
}

/// A queueing discipline, passed through as the kernel reported it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TcQdisc {
    pub dev: String,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TcQdisc {
    fn str_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    /// Qdisc kind (`htb`, `fq_codel`, ...).
    pub fn kind(&self) -> Option<&str> {
        self.str_field("kind")
    }

    /// Qdisc handle.
    pub fn handle(&self) -> Option<&str> {
        self.str_field("handle")
    }

    /// Parent handle; `None` for root qdiscs.
    pub fn parent(&self) -> Option<&str> {
        self.str_field("parent")
    }

    /// Whether the qdisc is attached at the device root.
    pub fn is_root(&self) -> bool {
        self.fields.get("root").and_then(Value::as_bool).unwrap_or(false)
    }
}

/// Parse `tc -j qdisc show dev <dev>` output.
pub fn parse_qdiscs(dev: &str, text: &str) -> Result<Vec<TcQdisc>> {
    let qdiscs = json_elements(text)?
        .into_iter()
        .filter_map(|item| match item {
            Value::Object(mut fields) => {
                fields.remove("dev");
                Some(TcQdisc {
                    dev: dev.to_string(),
                    fields,
                })
            }
            _ => None,
        })
        .collect();
    Ok(qdiscs)
}

/// A traffic-control filter reconstructed from statistics text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TcFilter {
    pub dev: String,
    pub pref: Option<u32>,
    pub handle: Option<String>,
    /// Header and continuation lines joined on one line.
    pub details: String,
    /// The lines exactly as printed.
    pub full_details: String,
}

impl TcFilter {
    /// The `success <N>` hit counter, if the filter reports one.
    pub fn success_count(&self) -> Option<u64> {
        capture_after(&self.details, "success ", decimal).and_then(|n| n.parse().ok())
    }

    fn from_header(dev: &str, line: &str, header: &FilterHeader<'_>) -> Self {
        Self {
            dev: dev.to_string(),
            pref: header.pref,
            handle: header.handle.map(str::to_string),
            details: header.details.to_string(),
            full_details: line.to_string(),
        }
    }

    fn append(&mut self, line: &str) {
        self.full_details.push('\n');
        self.full_details.push_str(line);
        self.details.push(' ');
        self.details.push_str(line.trim());
    }
}

/// Fields captured from a `filter ...` header line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterHeader<'a> {
    /// Everything after `filter `.
    pub details: &'a str,
    pub pref: Option<u32>,
    pub handle: Option<&'a str>,
}

/// One line of filter statistics output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterLine<'a> {
    /// Starts a new filter record.
    Header(FilterHeader<'a>),
    /// Belongs to the current record.
    Continuation(&'a str),
}

fn filter_keyword<'a>(input: &mut &'a str) -> PResult<&'a str> {
    "filter ".parse_next(input)
}

impl<'a> FilterLine<'a> {
    /// Classify a line.
    pub fn classify(line: &'a str) -> Self {
        let mut input = line;
        if filter_keyword(&mut input).is_err() {
            return Self::Continuation(line);
        }
        Self::Header(FilterHeader {
            details: input,
            pref: capture_after(line, "pref ", decimal).and_then(|p| p.parse().ok()),
            handle: capture_after(line, "handle ", handle_token),
        })
    }
}

/// Parse `tc -s -p filter show dev <dev>` output.
///
/// Lines before the first header are dropped.
pub fn parse_filters(dev: &str, text: &str) -> Vec<TcFilter> {
    let mut filters = Vec::new();
    let mut current: Option<TcFilter> = None;

    for line in text.trim().lines() {
        match FilterLine::classify(line) {
            FilterLine::Header(header) => {
                filters.extend(current.take());
                current = Some(TcFilter::from_header(dev, line, &header));
            }
            FilterLine::Continuation(line) => {
                if let Some(filter) = current.as_mut() {
                    filter.append(line);
                }
            }
        }
    }
    filters.extend(current);
    filters
}
