//! crates/design_studio_core/src/analytics.rs
//!
//! Aggregations behind the trend and competitor tables: peak, mean, top-K,
//! frequency counts and the fixed-width text bars shown next to each value.

use std::collections::HashMap;

/// Number of glyphs in a full-scale bar.
pub const BAR_WIDTH: usize = 20;
pub const BAR_GLYPH: char = '█';
/// Cap used by tables whose values are already on a 0..100 scale.
pub const FIXED_BAR_CAP: f64 = 100.0;

/// A value with the label it is reported under.
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    pub label: String,
    pub value: f64,
}

impl Ranked {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// How a table decides what a full bar means.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BarCap {
    /// The largest value in the rendered set.
    Observed,
    Fixed(f64),
}

/// Which side of the value the bar is printed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarLayout {
    /// `"████ 95"`
    BarFirst,
    /// `"95 ████"`
    ValueFirst,
}

/// A rendered table row.
#[derive(Debug, Clone, PartialEq)]
pub struct BarRow {
    pub label: String,
    pub value: f64,
    pub bar_length: usize,
    pub display: String,
}

/// `round(min(value, cap) / cap * 20)`, rounding halves to even.
///
/// Non-positive caps and negative values render as an empty bar.
pub fn bar_length(value: f64, cap: f64) -> usize {
    if !(cap > 0.0) || !value.is_finite() {
        return 0;
    }
    let clamped = value.min(cap).max(0.0);
    (clamped / cap * BAR_WIDTH as f64).round_ties_even() as usize
}

pub fn render_bar(length: usize) -> String {
    std::iter::repeat(BAR_GLYPH).take(length).collect()
}

/// Formats a value the way the tables print it: integral values without a fraction.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// The first row holding the maximum value.
pub fn peak(rows: &[Ranked]) -> Option<&Ranked> {
    rows.iter().fold(None, |best: Option<&Ranked>, row| match best {
        Some(b) if b.value >= row.value => Some(b),
        _ => Some(row),
    })
}

pub fn mean(rows: &[Ranked]) -> Option<f64> {
    if rows.is_empty() {
        return None;
    }
    Some(rows.iter().map(|r| r.value).sum::<f64>() / rows.len() as f64)
}

/// Rows sorted by value, largest first. Equal values keep their input order.
pub fn sort_descending(rows: &[Ranked]) -> Vec<Ranked> {
    let mut sorted = rows.to_vec();
    sorted.sort_by(|a, b| b.value.total_cmp(&a.value));
    sorted
}

/// The `k` largest rows, ties broken by input order.
pub fn top_k(rows: &[Ranked], k: usize) -> Vec<Ranked> {
    let mut sorted = sort_descending(rows);
    sorted.truncate(k);
    sorted
}

/// Renders each row with its bar. `Observed` uses the maximum of `rows` as the cap.
pub fn bar_table(rows: &[Ranked], cap: BarCap, layout: BarLayout) -> Vec<BarRow> {
    let cap = match cap {
        BarCap::Fixed(cap) => cap,
        BarCap::Observed => rows
            .iter()
            .map(|r| r.value)
            .fold(f64::NEG_INFINITY, f64::max),
    };

    rows.iter()
        .map(|row| {
            let length = bar_length(row.value, cap);
            let bar = render_bar(length);
            let value = format_value(row.value);
            let display = match layout {
                BarLayout::BarFirst => format!("{} {}", bar, value),
                BarLayout::ValueFirst => format!("{} {}", value, bar),
            };
            BarRow {
                label: row.label.clone(),
                value: row.value,
                bar_length: length,
                display,
            }
        })
        .collect()
}

/// Counts occurrences of each non-empty label, most frequent first.
/// Labels with equal counts keep the order of their first appearance.
pub fn value_counts<'a>(labels: impl IntoIterator<Item = &'a str>) -> Vec<Ranked> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for label in labels.into_iter().filter(|l| !l.is_empty()) {
        let count = counts.entry(label).or_insert(0);
        if *count == 0 {
            order.push(label);
        }
        *count += 1;
    }

    let rows: Vec<Ranked> = order
        .into_iter()
        .map(|label| Ranked::new(label, counts[label] as f64))
        .collect();
    sort_descending(&rows)
}

/// The most frequent non-empty label. Ties resolve to the smallest label.
pub fn mode<'a>(labels: impl IntoIterator<Item = &'a str>) -> Option<String> {
    let counts = value_counts(labels);
    let best = counts.first()?.value;
    counts
        .iter()
        .filter(|r| r.value == best)
        .map(|r| r.label.as_str())
        .min()
        .map(str::to_string)
}

/// Reads a JSON cell as a number: numbers as-is, numeric strings parsed,
/// everything else zero.
pub fn coerce_number(value: Option<&serde_json::Value>) -> f64 {
    match value {
        Some(serde_json::Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(serde_json::Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0),
        Some(serde_json::Value::Bool(b)) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}
