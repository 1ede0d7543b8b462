//! Row/column table extracted from a gviz response

use super::RawCell;
use serde::{Deserialize, Deserializer, Serialize};

/// Column descriptor (`cols[]` in the gviz payload)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type", default)]
    pub column_type: String,
    #[serde(default)]
    pub pattern: Option<String>,
}

/// One table row; `c` holds one entry per column, `null` for blank cells
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Row {
    #[serde(rename = "c", default, deserialize_with = "null_as_default")]
    pub cells: Vec<Option<RawCell>>,
}

impl Row {
    pub fn new(cells: Vec<Option<RawCell>>) -> Self {
        Self { cells }
    }

    /// Cell at `index`, `None` when blank or past the end of the row
    pub fn cell(&self, index: usize) -> Option<&RawCell> {
        self.cells.get(index).and_then(|c| c.as_ref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(rename = "cols", default)]
    pub columns: Vec<Column>,
    #[serde(deserialize_with = "null_rows_as_empty")]
    pub rows: Vec<Row>,
}

/// `null` where a value is expected reads as the empty default
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Sheets emit `null` for rows they could not render; keep them as blank rows
fn null_rows_as_empty<'de, D>(deserializer: D) -> Result<Vec<Row>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows = Vec::<Option<Row>>::deserialize(deserializer)?;
    Ok(rows.into_iter().map(Option::unwrap_or_default).collect())
}

impl Table {
    /// Number of columns; falls back to the widest row when `cols` is absent
    pub fn width(&self) -> usize {
        let widest_row = self.rows.iter().map(|r| r.cells.len()).max().unwrap_or(0);
        self.columns.len().max(widest_row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_rows_and_cells_become_blank_rows() {
        let json = r#"{
            "cols": [{"id": "A", "label": "Fecha", "type": "date"}],
            "rows": [{"c": null}, null, {"c": [null, {"v": "BTC"}]}]
        }"#;
        let table: Table = serde_json::from_str(json).unwrap();

        assert_eq!(table.rows.len(), 3);
        assert!(table.rows[0].cells.is_empty());
        assert!(table.rows[1].cells.is_empty());
        assert!(table.rows[2].cell(0).is_none());
        assert!(table.rows[2].cell(1).is_some());
        assert_eq!(table.width(), 2);
    }
}
