//! crates/design_studio_core/src/records.rs
//!
//! Mapping of untyped store rows onto the domain records each view needs.
//! A view declares the columns it depends on; if the table does not carry one
//! of them the whole view fails with `PortError::MissingColumn`.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

use crate::analytics::coerce_number;
use crate::domain::{CompetitorProduct, RegionInterest, RelatedTerm, SavedDesign, TrendPoint};
use crate::ports::{PortError, PortResult, Row};

pub const TIMELINE_COLUMNS: &[&str] = &["keyword", "time", "interest"];
pub const REGION_COLUMNS: &[&str] = &["region/state", "interest"];
pub const RELATED_QUERY_COLUMNS: &[&str] = &["relatedquery", "category", "interest", "searchfreqinc"];
pub const RELATED_TOPIC_COLUMNS: &[&str] = &["relatedtopic", "category", "interest", "searchfreqinc"];
pub const PRODUCT_COLUMNS: &[&str] = &[
    "name",
    "link",
    "modified",
    "date",
    "product_description",
    "category",
    "subcategory",
    "quantity",
    "length",
    "image_url",
];

/// Fails when a non-empty row set lacks any of `columns`.
pub fn require_columns(rows: &[Row], columns: &[&str]) -> PortResult<()> {
    let Some(first) = rows.first() else {
        return Ok(());
    };
    match columns.iter().find(|c| !first.contains_key(**c)) {
        Some(missing) => Err(PortError::MissingColumn(missing.to_string())),
        None => Ok(()),
    }
}

/// Reads a cell as display text. Nulls and missing cells read as empty.
pub fn text(row: &Row, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

pub fn number(row: &Row, column: &str) -> f64 {
    coerce_number(row.get(column))
}

fn country_prefix() -> &'static Regex {
    static PREFIX: OnceLock<Regex> = OnceLock::new();
    PREFIX.get_or_init(|| Regex::new(r"^.*?,\s*").expect("static pattern is valid"))
}

/// Strips everything up to the first comma (and the spaces after it),
/// e.g. `"US, Texas"` becomes `"Texas"`. Values without a comma are kept.
pub fn strip_country_prefix(value: &str) -> String {
    if value.contains(',') {
        country_prefix().replace(value, "").into_owned()
    } else {
        value.to_string()
    }
}

/// Applies [`strip_country_prefix`] to the `country` column of every row that has one.
pub fn normalize_country(rows: &mut [Row]) {
    for row in rows.iter_mut() {
        if let Some(value) = row.get("country") {
            let cleaned = strip_country_prefix(&text_of(value));
            row.insert("country".to_string(), Value::String(cleaned));
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

pub fn trend_points(rows: &[Row]) -> PortResult<Vec<TrendPoint>> {
    require_columns(rows, TIMELINE_COLUMNS)?;
    Ok(rows
        .iter()
        .map(|row| TrendPoint {
            keyword: text(row, "keyword"),
            time: text(row, "time"),
            date: text(row, "date"),
            interest: number(row, "interest"),
        })
        .collect())
}

pub fn region_interest(rows: &[Row]) -> PortResult<Vec<RegionInterest>> {
    require_columns(rows, REGION_COLUMNS)?;
    Ok(rows
        .iter()
        .map(|row| RegionInterest {
            region: text(row, "region/state"),
            interest: number(row, "interest"),
        })
        .collect())
}

/// Related queries (`term_column = "relatedquery"`) or topics (`"relatedtopic"`).
pub fn related_terms(rows: &[Row], term_column: &str) -> PortResult<Vec<RelatedTerm>> {
    require_columns(rows, &[term_column, "category", "interest", "searchfreqinc"])?;
    Ok(rows
        .iter()
        .map(|row| RelatedTerm {
            term: text(row, term_column),
            category: text(row, "category"),
            interest: number(row, "interest"),
            growth: number(row, "searchfreqinc"),
        })
        .collect())
}

pub fn competitor_products(rows: &[Row]) -> PortResult<Vec<CompetitorProduct>> {
    require_columns(rows, &["name"])?;
    Ok(rows
        .iter()
        .map(|row| CompetitorProduct {
            name: text(row, "name"),
            link: text(row, "link"),
            category: text(row, "category"),
            subcategory: text(row, "subcategory"),
            quantity: number(row, "quantity"),
            length: text(row, "length"),
            modified: text(row, "modified"),
            description: text(row, "product_description"),
            image_url: text(row, "image_url"),
        })
        .collect())
}

/// Builds the row written to the saved-design table.
pub fn saved_design_row(design: &SavedDesign) -> Row {
    let mut row = Row::new();
    row.insert("design_name".into(), Value::String(design.design_name.clone()));
    row.insert(
        "image_url".into(),
        design
            .image_url
            .clone()
            .map(Value::String)
            .unwrap_or(Value::Null),
    );
    row.insert("description".into(), Value::String(design.description.clone()));
    row.insert(
        "selected_insights".into(),
        Value::Array(
            design
                .selected_insights
                .iter()
                .cloned()
                .map(Value::String)
                .collect(),
        ),
    );
    row.insert("image_prompt".into(), Value::String(design.image_prompt.clone()));
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn missing_column_is_reported_by_name() {
        let rows = vec![row(json!({"keyword": "braids", "interest": 4}))];
        match trend_points(&rows) {
            Err(PortError::MissingColumn(col)) => assert_eq!(col, "time"),
            other => panic!("expected missing column, got {:?}", other),
        }
    }

    #[test]
    fn empty_tables_have_no_missing_columns() {
        assert!(trend_points(&[]).unwrap().is_empty());
    }

    #[test]
    fn products_coerce_quantity() {
        let rows = vec![
            row(json!({"name": "Pre-Stretched 3X", "quantity": "3", "length": "26\""})),
            row(json!({"name": "Bulk", "quantity": "n/a", "subcategory": null})),
        ];
        let products = competitor_products(&rows).unwrap();
        assert_eq!(products[0].quantity, 3.0);
        assert_eq!(products[1].quantity, 0.0);
        assert_eq!(products[1].subcategory, "");
    }

    #[test]
    fn country_prefix_is_stripped() {
        assert_eq!(strip_country_prefix("United States, Texas"), "Texas");
        assert_eq!(strip_country_prefix("a, b, c"), "b, c");
        assert_eq!(strip_country_prefix("Nigeria"), "Nigeria");

        let mut rows = vec![row(json!({"country": "US,  Georgia"})), row(json!({"other": 1}))];
        normalize_country(&mut rows);
        assert_eq!(rows[0]["country"], json!("Georgia"));
        assert!(!rows[1].contains_key("country"));
    }

    #[test]
    fn saved_design_row_keeps_list_and_null_url() {
        let design = SavedDesign {
            design_name: "Halo".into(),
            image_url: None,
            description: "desc".into(),
            selected_insights: vec!["a".into(), "b".into()],
            image_prompt: "prompt".into(),
        };
        let row = saved_design_row(&design);
        assert_eq!(row["image_url"], Value::Null);
        assert_eq!(row["selected_insights"], json!(["a", "b"]));
    }
}
