//! Spreadsheet cell as delivered by the gviz query endpoint

use serde::{Deserialize, Serialize};

/// Raw machine value of a cell.
///
/// Dates arrive as constructor strings such as `Date(2024,9,23)`, so they
/// are plain `Text` here and decoded later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Bool(bool),
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// A cell carrying a raw value (`v`) and an optional display string (`f`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawCell {
    #[serde(default)]
    pub v: Option<CellValue>,
    #[serde(default)]
    pub f: Option<String>,
}

impl RawCell {
    pub fn number(value: f64) -> Self {
        Self {
            v: Some(CellValue::Number(value)),
            f: None,
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            v: Some(CellValue::Text(value.into())),
            f: None,
        }
    }

    pub fn formatted(value: impl Into<String>) -> Self {
        Self {
            v: None,
            f: Some(value.into()),
        }
    }

    /// A cell with neither a raw value nor a formatted string
    pub fn is_empty(&self) -> bool {
        self.v.is_none() && self.f.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_gviz_cells() {
        let cells: Vec<Option<RawCell>> = serde_json::from_str(
            r#"[{"v":"Date(2024,9,23,19,7,57)","f":"23/10/2024 19:07:57"},{"v":1234.5,"f":"1.234,50"},null,{"v":null},{"v":true}]"#,
        )
        .unwrap();

        assert_eq!(cells.len(), 5);
        assert_eq!(
            cells[0].as_ref().unwrap().v,
            Some(CellValue::Text("Date(2024,9,23,19,7,57)".to_string()))
        );
        assert_eq!(cells[1].as_ref().unwrap().v, Some(CellValue::Number(1234.5)));
        assert!(cells[2].is_none());
        assert!(cells[3].as_ref().unwrap().is_empty());
        assert_eq!(cells[4].as_ref().unwrap().v, Some(CellValue::Bool(true)));
    }
}
