//! Shape-agnostic normalization of engine data payloads.
//!
//! Engines answer with `{columns, rows}`, with an array of records, or with
//! something else entirely. Everything funnels through [`normalize`] into a
//! [`NormalizedData`], so comparisons never probe shapes at runtime.

use crate::errors::NormalizationError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

/// Cell written for a key that a record does not carry.
pub const MISSING_CELL: Value = Value::Null;

/// Columns plus fixed-width rows. Every row has exactly `columns.len()` cells.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct CanonicalTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<RawTable> for CanonicalTable {
    type Error = NormalizationError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        CanonicalTable::new(raw.columns, raw.rows)
    }
}

impl CanonicalTable {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self, NormalizationError> {
        let mut seen = HashSet::with_capacity(columns.len());
        for c in &columns {
            if !seen.insert(c.as_str()) {
                return Err(NormalizationError::DuplicateColumn(c.clone()));
            }
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(NormalizationError::RowWidth {
                    row: i,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Same columns in the same order, same rows in the same order, cells
    /// equal under [`cells_equal`].
    pub fn matches(&self, other: &CanonicalTable) -> bool {
        self.columns == other.columns
            && self.rows.len() == other.rows.len()
            && self
                .rows
                .iter()
                .zip(&other.rows)
                .all(|(a, b)| a.iter().zip(b).all(|(x, y)| cells_equal(x, y)))
    }
}

/// A payload kept for display only. Never equal to anything.
#[derive(Debug, Clone, PartialEq)]
pub struct OpaquePayload {
    raw: Value,
}

impl OpaquePayload {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }

    pub fn serialized(&self) -> String {
        self.raw.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireData", into = "WireData")]
pub enum NormalizedData {
    Table(CanonicalTable),
    Opaque(OpaquePayload),
}

impl NormalizedData {
    pub fn as_table(&self) -> Option<&CanonicalTable> {
        match self {
            NormalizedData::Table(t) => Some(t),
            NormalizedData::Opaque(_) => None,
        }
    }

    pub fn is_opaque(&self) -> bool {
        matches!(self, NormalizedData::Opaque(_))
    }

    /// Structural equality. Anything opaque on either side fails.
    pub fn matches(&self, other: &NormalizedData) -> bool {
        match (self, other) {
            (NormalizedData::Table(a), NormalizedData::Table(b)) => a.matches(b),
            _ => false,
        }
    }
}

// Opaque payloads travel as a one-cell table flagged `opaque`, so consumers
// that only understand {columns, rows} can still show them.
#[derive(Serialize, Deserialize)]
struct WireData {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    opaque: bool,
}

const OPAQUE_COLUMN: &str = "value";

impl From<NormalizedData> for WireData {
    fn from(data: NormalizedData) -> Self {
        match data {
            NormalizedData::Table(t) => WireData {
                columns: t.columns,
                rows: t.rows,
                opaque: false,
            },
            NormalizedData::Opaque(p) => WireData {
                columns: vec![OPAQUE_COLUMN.to_string()],
                rows: vec![vec![Value::String(p.serialized())]],
                opaque: true,
            },
        }
    }
}

impl TryFrom<WireData> for NormalizedData {
    type Error = NormalizationError;

    fn try_from(wire: WireData) -> Result<Self, Self::Error> {
        if !wire.opaque {
            return CanonicalTable::new(wire.columns, wire.rows).map(NormalizedData::Table);
        }
        let raw = match wire.rows.into_iter().next().and_then(|r| r.into_iter().next()) {
            Some(Value::String(text)) => serde_json::from_str(&text).unwrap_or(Value::String(text)),
            Some(other) => other,
            None => Value::Null,
        };
        Ok(NormalizedData::Opaque(OpaquePayload::new(raw)))
    }
}

/// Canonicalize an engine data payload.
///
/// 1. `{columns: [string], rows: [[..]]}` is taken as-is; a row of the wrong
///    width is an error, never truncated.
/// 2. An array of records becomes a table keyed by the first record's keys in
///    insertion order. Keys a later record lacks are filled with
///    [`MISSING_CELL`]; keys only later records carry are dropped. `[]` is the
///    empty table.
/// 3. Anything else is wrapped as an [`OpaquePayload`].
pub fn normalize(value: &Value) -> Result<NormalizedData, NormalizationError> {
    if let Some((columns, rows)) = rows_and_columns(value) {
        return CanonicalTable::new(columns, rows).map(NormalizedData::Table);
    }

    if let Value::Array(items) = value {
        if items.is_empty() {
            return Ok(NormalizedData::Table(CanonicalTable::empty()));
        }
        let records: Option<Vec<&Map<String, Value>>> = items.iter().map(Value::as_object).collect();
        if let Some(records) = records {
            return from_records(&records).map(NormalizedData::Table);
        }
    }

    Ok(NormalizedData::Opaque(OpaquePayload::new(value.clone())))
}

fn rows_and_columns(value: &Value) -> Option<(Vec<String>, Vec<Vec<Value>>)> {
    let obj = value.as_object()?;
    let columns = obj
        .get("columns")?
        .as_array()?
        .iter()
        .map(|c| c.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()?;
    let rows = obj
        .get("rows")?
        .as_array()?
        .iter()
        .map(|r| r.as_array().cloned())
        .collect::<Option<Vec<_>>>()?;
    Some((columns, rows))
}

fn from_records(records: &[&Map<String, Value>]) -> Result<CanonicalTable, NormalizationError> {
    let columns: Vec<String> = records
        .first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default();

    let mut dropped_keys = 0usize;
    let rows = records
        .iter()
        .map(|record| {
            dropped_keys += record.keys().filter(|k| !columns.contains(k)).count();
            columns
                .iter()
                .map(|c| record.get(c).cloned().unwrap_or(MISSING_CELL))
                .collect()
        })
        .collect();

    if dropped_keys > 0 {
        tracing::debug!(
            event = "normalize_dropped_keys",
            dropped = dropped_keys,
            "record keys absent from the first record were not turned into columns"
        );
    }

    CanonicalTable::new(columns, rows)
}

/// Cell equality: strict on JSON type, numeric on value. `1 == 1.0`, but
/// `42 != "42"` and `null` only equals `null`.
pub fn cells_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| cells_equal(p, q))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x.iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| cells_equal(v, w)))
        }
        _ => a == b,
    }
}

fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    match (x.as_f64(), y.as_f64()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn table(v: Value) -> CanonicalTable {
        match normalize(&v).unwrap() {
            NormalizedData::Table(t) => t,
            other => panic!("expected table, got {:?}", other),
        }
    }

    #[test]
    fn canonical_input_is_unchanged() {
        let t = table(json!({"columns": ["avg_close"], "rows": [[11034.5]]}));
        assert_eq!(t.columns(), ["avg_close"]);
        assert_eq!(t.rows(), [vec![json!(11034.5)]]);

        let again = table(serde_json::to_value(&NormalizedData::Table(t.clone())).unwrap());
        assert_eq!(again, t);
    }

    #[test]
    fn short_row_is_an_error_not_a_truncation() {
        let err = normalize(&json!({"columns": ["a", "b"], "rows": [[1, 2], [3]]})).unwrap_err();
        assert_eq!(
            err,
            NormalizationError::RowWidth {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn duplicate_columns_are_rejected() {
        let err = normalize(&json!({"columns": ["a", "a"], "rows": []})).unwrap_err();
        assert_eq!(err, NormalizationError::DuplicateColumn("a".into()));
    }

    #[test]
    fn records_keep_first_record_key_order() {
        let t = table(json!([{"z": 1, "a": 2}, {"a": 4, "z": 3}]));
        assert_eq!(t.columns(), ["z", "a"]);
        assert_eq!(t.rows(), [vec![json!(1), json!(2)], vec![json!(3), json!(4)]]);
    }

    #[test]
    fn records_missing_keys_fill_with_sentinel() {
        let t = table(json!([{"a": 1, "b": 2}, {"a": 3, "c": 9}]));
        assert_eq!(t.columns(), ["a", "b"]);
        assert_eq!(t.rows()[1], vec![json!(3), MISSING_CELL]);
    }

    #[test]
    fn empty_array_is_an_empty_table_not_opaque() {
        let data = normalize(&json!([])).unwrap();
        assert_eq!(data, NormalizedData::Table(CanonicalTable::empty()));
        assert!(!data.is_opaque());
    }

    #[test]
    fn other_shapes_become_opaque() {
        for v in [json!(null), json!(42), json!("text"), json!({"count": 3}), json!([1, 2])] {
            let data = normalize(&v).unwrap();
            assert!(data.is_opaque(), "{} should be opaque", v);
        }
    }

    #[test]
    fn opaque_never_matches_even_itself() {
        let data = normalize(&json!({"count": 3})).unwrap();
        assert!(!data.matches(&data.clone()));
    }

    #[test]
    fn records_and_rows_columns_normalize_alike() {
        let a = normalize(&json!([{"a": 1, "b": 2}])).unwrap();
        let b = normalize(&json!({"columns": ["a", "b"], "rows": [[1, 2]]})).unwrap();
        assert!(a.matches(&b));
    }

    #[test]
    fn cell_equality_is_type_strict_and_numeric() {
        assert!(cells_equal(&json!(1), &json!(1.0)));
        assert!(cells_equal(&json!(-3), &json!(-3)));
        assert!(!cells_equal(&json!(42), &json!("42")));
        assert!(!cells_equal(&json!(null), &json!(0)));
        assert!(cells_equal(&json!([1, {"x": 2.0}]), &json!([1.0, {"x": 2}])));
    }

    #[test]
    fn column_order_matters() {
        let a = table(json!({"columns": ["a", "b"], "rows": [[1, 2]]}));
        let b = table(json!({"columns": ["b", "a"], "rows": [[2, 1]]}));
        assert!(!a.matches(&b));
    }

    #[test]
    fn opaque_wire_form_is_a_flagged_single_cell() {
        let data = normalize(&json!({"count": 3})).unwrap();
        let wire = serde_json::to_value(&data).unwrap();
        assert_eq!(wire["opaque"], json!(true));
        assert_eq!(wire["columns"], json!(["value"]));
        assert_eq!(wire["rows"][0][0], json!(r#"{"count":3}"#));

        let back: NormalizedData = serde_json::from_value(wire).unwrap();
        assert_eq!(back, data);
    }

    #[test]
    fn table_deserialize_enforces_width() {
        let bad = serde_json::from_value::<CanonicalTable>(json!({"columns": ["a"], "rows": [[1, 2]]}));
        assert!(bad.is_err());
    }
}
