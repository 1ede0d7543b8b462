//! Sheet response parsing
//!
//! The query endpoint does not return plain JSON. The body looks like
//!
//! ```text
//! /*O_o*/
//! google.visualization.Query.setResponse({"version":"0.6",...,"table":{...}});
//! ```
//!
//! The wrapper is located by pattern first; bodies that do not match are cut
//! at the fixed 47-byte preamble and 2-byte suffix the endpoint has always used.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use sheetfolio_core::{Column, Error, Result, Row, Table};
use tracing::{debug, warn};

static SET_RESPONSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)google\.visualization\.Query\.setResponse\((.*)\)\s*;?\s*$")
        .expect("setResponse pattern is valid")
});

/// Length of `/*O_o*/\ngoogle.visualization.Query.setResponse(`
const FIXED_PREAMBLE_LEN: usize = 47;
/// Length of the trailing `);`
const FIXED_SUFFIX_LEN: usize = 2;

#[derive(Debug, Deserialize)]
struct GvizEnvelope {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    errors: Vec<GvizError>,
    #[serde(default)]
    table: Option<GvizTable>,
}

#[derive(Debug, Deserialize)]
struct GvizError {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    detailed_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GvizTable {
    #[serde(default)]
    cols: Vec<Column>,
    #[serde(default)]
    rows: Option<Vec<Option<Row>>>,
}

/// Unwrap a gviz response body into a [`Table`].
///
/// # Errors
/// * [`Error::MalformedResponse`] when no wrapper is found, the payload is not
///   JSON, or it lacks `table.rows`
/// * [`Error::EmptySheet`] when `table.rows` is an empty array
pub fn parse_sheet_response(raw_text: &str) -> Result<Table> {
    let payload = unwrap_payload(raw_text)?;

    let envelope: GvizEnvelope = serde_json::from_str(payload)
        .map_err(|e| Error::MalformedResponse(format!("invalid JSON payload: {}", e)))?;

    if envelope.status.as_deref() == Some("error") {
        let reasons: Vec<String> = envelope
            .errors
            .iter()
            .map(|e| match (&e.reason, &e.detailed_message) {
                (Some(r), Some(m)) => format!("{} ({})", r, m),
                (Some(r), None) => r.clone(),
                (None, Some(m)) => m.clone(),
                (None, None) => "unknown".to_string(),
            })
            .collect();
        warn!("Query endpoint reported an error: {:?}", reasons);
        if envelope.table.is_none() {
            return Err(Error::MalformedResponse(format!(
                "query failed: {}",
                reasons.join("; ")
            )));
        }
    }

    let table = envelope
        .table
        .ok_or_else(|| Error::MalformedResponse("payload has no table".to_string()))?;
    let rows = table
        .rows
        .ok_or_else(|| Error::MalformedResponse("table has no rows array".to_string()))?;

    if rows.is_empty() {
        return Err(Error::EmptySheet("table.rows is empty".to_string()));
    }
    // Unrendered rows arrive as `null` (or with `"c": null`); keep them blank
    let rows: Vec<Row> = rows.into_iter().map(Option::unwrap_or_default).collect();

    debug!("Parsed table: {} columns, {} rows", table.cols.len(), rows.len());

    Ok(Table {
        columns: table.cols,
        rows,
    })
}

/// Inner JSON of the response body
fn unwrap_payload(raw_text: &str) -> Result<&str> {
    if raw_text.trim().is_empty() {
        return Err(Error::MalformedResponse("empty response body".to_string()));
    }

    if let Some(inner) = SET_RESPONSE.captures(raw_text).and_then(|c| c.get(1)) {
        return Ok(inner.as_str());
    }

    let len = raw_text.len();
    if len > FIXED_PREAMBLE_LEN + FIXED_SUFFIX_LEN
        && raw_text.is_char_boundary(FIXED_PREAMBLE_LEN)
        && raw_text.is_char_boundary(len - FIXED_SUFFIX_LEN)
    {
        debug!("setResponse wrapper not found, using fixed offsets");
        return Ok(&raw_text[FIXED_PREAMBLE_LEN..len - FIXED_SUFFIX_LEN]);
    }

    Err(Error::MalformedResponse(
        "response wrapper not found".to_string(),
    ))
}
