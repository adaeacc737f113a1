//! Tabular screening results.
//!
//! A [`ResultFrame`] is the ordered set of rows returned by a screener plus
//! the names of the columns the screener actually supplied. Rows are typed;
//! columns a source left out fall back to zero/empty values, and the frame
//! remembers they were absent so the report layer can reject it.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Column order used for rendering and export.
pub const EXPORT_COLUMNS: [&str; 8] = [
    "code",
    "name",
    "score",
    "tech_score",
    "fundamental_score",
    "capital_score",
    "current_price",
    "reason",
];

/// Columns a frame must carry to be rendered.
pub const REQUIRED_COLUMNS: [&str; 4] = ["code", "name", "score", "current_price"];

// ============================================================================
// Screened Stock
// ============================================================================

/// A stock that passed screening.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenedStock {
    /// Stock code (e.g., "600519.SH")
    #[serde(default, deserialize_with = "deserialize_code")]
    pub code: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Composite score (0-100)
    #[serde(default)]
    pub score: f64,
    /// Technical sub-score (0-100)
    #[serde(default)]
    pub tech_score: f64,
    /// Fundamental sub-score (0-100)
    #[serde(default)]
    pub fundamental_score: f64,
    /// Capital-flow sub-score (0-100)
    #[serde(default)]
    pub capital_score: f64,
    /// Latest price
    #[serde(default)]
    pub current_price: f64,
    /// Why the stock was selected
    #[serde(default)]
    pub reason: String,
}

impl ScreenedStock {
    /// Field values as strings, in [`EXPORT_COLUMNS`] order.
    pub fn to_record(&self) -> [String; 8] {
        [
            self.code.clone(),
            self.name.clone(),
            self.score.to_string(),
            self.tech_score.to_string(),
            self.fundamental_score.to_string(),
            self.capital_score.to_string(),
            self.current_price.to_string(),
            self.reason.clone(),
        ]
    }
}

/// Accept codes as strings or numbers; numbers are zero-padded to six digits
/// so `1` and `"000001"` mean the same stock.
pub(crate) fn deserialize_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => match n.as_u64() {
            Some(v) => Ok(format!("{v:06}")),
            None => Ok(n.to_string()),
        },
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "stock code must be a string or number, got {other}"
        ))),
    }
}

// ============================================================================
// Result Frame
// ============================================================================

/// Ordered screening results with their column set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultFrame {
    columns: Vec<String>,
    rows: Vec<ScreenedStock>,
}

impl ResultFrame {
    /// Frame with every export column present.
    pub fn from_rows(rows: Vec<ScreenedStock>) -> Self {
        Self {
            columns: EXPORT_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows,
        }
    }

    /// Empty frame (no rows, no columns).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Frame from loosely-typed records.
    ///
    /// The column set is the union of keys across records, in first-seen order.
    pub fn from_records(records: Vec<Map<String, Value>>) -> Result<Self, serde_json::Error> {
        let mut columns: Vec<String> = Vec::new();
        let mut rows = Vec::with_capacity(records.len());

        for record in records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
            rows.push(serde_json::from_value(Value::Object(record))?);
        }

        Ok(Self { columns, rows })
    }

    /// Columns supplied by the source.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Whether the source supplied `column`.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Required columns that are absent, in [`REQUIRED_COLUMNS`] order.
    pub fn missing_required_columns(&self) -> Vec<String> {
        REQUIRED_COLUMNS
            .iter()
            .filter(|c| !self.has_column(c))
            .map(|c| c.to_string())
            .collect()
    }

    /// Rows in screener order.
    pub fn rows(&self) -> &[ScreenedStock] {
        &self.rows
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the frame has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
