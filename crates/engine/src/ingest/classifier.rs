//! Row classification and normalization
//!
//! Two sheet layouts are understood. The layout is picked once per table
//! from its column shape, then every row goes through the matching reader.
//!
//! * [`SheetLayout::Transaction`]: one row per trade. Per-asset total rows
//!   sit in extra columns to the right, labelled `Total BTC/Usdt` and so on.
//! * [`SheetLayout::PeriodicSummary`]: dated blocks, one row per asset plus
//!   a trailing `TOTAL` row. Only the newest block is read.

use super::decoder::{decode_date, decode_number, decode_text};
use chrono::NaiveDateTime;
use sheetfolio_core::{
    AssetSummarySeed, ColumnMappings, DashboardConfig, Row, SheetLayout, SummaryColumns, Table,
    Transaction, TransactionColumns,
};
use tracing::debug;

const TOTAL_MARKER: &str = "TOTAL";

/// Output of the classifier for one table
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRows {
    pub layout: SheetLayout,
    pub transactions: Vec<Transaction>,
    pub summary_rows: Vec<AssetSummarySeed>,
}

/// What a single row turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum RowKind {
    Transaction(Transaction),
    Summary(AssetSummarySeed),
    Skipped(SkipReason),
}

/// Why a row was left out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No symbol at all (separators, spacer rows)
    Empty,
    /// Label text in the totals column that is not a total
    Header,
    /// Symbol not in the whitelist
    UnknownSymbol,
    /// Ledger row whose investment decoded to 0
    NoInvestment,
    /// Recognized symbol but every number is 0
    Blank,
}

#[derive(Debug, Default)]
struct SkipTally {
    empty: usize,
    header: usize,
    unknown_symbol: usize,
    no_investment: usize,
    blank: usize,
}

impl SkipTally {
    fn record(&mut self, reason: SkipReason) {
        match reason {
            SkipReason::Empty => self.empty += 1,
            SkipReason::Header => self.header += 1,
            SkipReason::UnknownSymbol => self.unknown_symbol += 1,
            SkipReason::NoInvestment => self.no_investment += 1,
            SkipReason::Blank => self.blank += 1,
        }
    }
}

/// Pick the layout from the table width
pub fn detect_layout(table: &Table, columns: &ColumnMappings) -> SheetLayout {
    if table.width() >= columns.transaction.required_width() {
        SheetLayout::Transaction
    } else {
        SheetLayout::PeriodicSummary
    }
}

/// Walk the table and extract typed transactions and summary seeds
pub fn classify_and_normalize(table: &Table, config: &DashboardConfig) -> NormalizedRows {
    let layout = detect_layout(table, &config.columns);
    debug!(
        "Classifying {} rows as {:?} layout (width {})",
        table.rows.len(),
        layout,
        table.width()
    );

    match layout {
        SheetLayout::Transaction => normalize_ledger(table, config),
        SheetLayout::PeriodicSummary => normalize_latest_block(table, config),
    }
}

/// Normalize a raw symbol cell: trim, upper-case, drop a `/USDT`-style quote
pub fn normalize_symbol(raw: &str) -> String {
    let upper = raw.trim().to_uppercase();
    upper
        .split(['/', '-'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

/// Whitelisted symbol for a cell text, via the total-label map first
pub fn resolve_symbol(raw: &str, config: &DashboardConfig) -> Option<String> {
    if let Some(symbol) = config.symbol_for_label(raw) {
        return Some(symbol.to_string());
    }
    let normalized = normalize_symbol(raw);
    if normalized.is_empty() {
        return None;
    }
    config.asset(&normalized).map(|def| def.symbol.clone())
}

fn to_percent(value: f64, as_fraction: bool) -> f64 {
    if as_fraction {
        value * 100.0
    } else {
        value
    }
}

fn is_total_marker(text: &str) -> bool {
    text.trim().to_uppercase().starts_with(TOTAL_MARKER)
}

/// A grand-total row; per-asset labels like `Total BTC/Usdt` are asset rows
fn is_block_total(text: &str, config: &DashboardConfig) -> bool {
    is_total_marker(text) && config.symbol_for_label(text).is_none()
}

// ---------------------------------------------------------------------------
// Transaction layout
// ---------------------------------------------------------------------------

fn normalize_ledger(table: &Table, config: &DashboardConfig) -> NormalizedRows {
    let mut transactions = Vec::new();
    let mut summary_rows = Vec::new();
    let mut skipped = SkipTally::default();

    for row in &table.rows {
        match classify_ledger_row(row, config) {
            RowKind::Transaction(tx) => transactions.push(tx),
            RowKind::Summary(seed) => summary_rows.push(seed),
            RowKind::Skipped(reason) => skipped.record(reason),
        }
    }

    debug!(
        "Ledger: {} transactions, {} total rows, skipped {:?}",
        transactions.len(),
        summary_rows.len(),
        skipped
    );

    NormalizedRows {
        layout: SheetLayout::Transaction,
        transactions,
        summary_rows,
    }
}

/// Classify one row of a transaction sheet
pub fn classify_ledger_row(row: &Row, config: &DashboardConfig) -> RowKind {
    let cols = &config.columns.transaction;
    let symbol_text = decode_text(row.cell(cols.symbol));

    if let Some(label) = decode_text(row.cell(cols.summary_label)) {
        if !label.to_uppercase().contains(TOTAL_MARKER) {
            return RowKind::Skipped(SkipReason::Header);
        }
        let symbol = config
            .symbol_for_label(&label)
            .map(str::to_string)
            .or_else(|| symbol_text.as_deref().and_then(|s| resolve_symbol(s, config)));
        return match symbol {
            Some(symbol) => read_inline_total(row, symbol, cols, config.columns.percent_as_fraction),
            None => RowKind::Skipped(SkipReason::UnknownSymbol),
        };
    }

    let Some(symbol_text) = symbol_text else {
        return RowKind::Skipped(SkipReason::Empty);
    };
    let Some(symbol) = resolve_symbol(&symbol_text, config) else {
        return RowKind::Skipped(SkipReason::UnknownSymbol);
    };

    let tx = read_transaction(row, symbol, cols);
    if tx.is_blank() {
        RowKind::Skipped(SkipReason::Blank)
    } else if tx.invested == 0.0 {
        RowKind::Skipped(SkipReason::NoInvestment)
    } else {
        RowKind::Transaction(tx)
    }
}

fn read_transaction(row: &Row, symbol: String, cols: &TransactionColumns) -> Transaction {
    let num = |i: usize| decode_number(row.cell(i));
    Transaction {
        date: decode_date(row.cell(cols.date)),
        symbol,
        invested: num(cols.invested),
        transaction_type: decode_text(row.cell(cols.transaction_type)),
        order: decode_text(row.cell(cols.order)),
        exchange: decode_text(row.cell(cols.exchange)),
        quantity: num(cols.quantity),
        purchase_price: num(cols.purchase_price),
        sale_price: num(cols.sale_price),
        current_price: num(cols.current_price),
        initial_value: num(cols.initial_value),
        current_value: num(cols.current_value),
        profit_loss: num(cols.profit_loss),
        variation: num(cols.variation),
    }
}

fn read_inline_total(
    row: &Row,
    symbol: String,
    cols: &TransactionColumns,
    percent_as_fraction: bool,
) -> RowKind {
    let num = |i: usize| decode_number(row.cell(i));
    let seed = AssetSummarySeed {
        symbol,
        date: decode_date(row.cell(cols.date)),
        quantity: 0.0,
        invested: num(cols.summary_invested),
        current_value: num(cols.summary_current_value),
        profit_loss: num(cols.summary_profit_loss),
        reported_share: Some(to_percent(num(cols.summary_share), percent_as_fraction)),
        reported_roi: Some(to_percent(num(cols.summary_roi), percent_as_fraction)),
    };

    if seed.is_blank() {
        RowKind::Skipped(SkipReason::Blank)
    } else {
        RowKind::Summary(seed)
    }
}

// ---------------------------------------------------------------------------
// Periodic-summary layout
// ---------------------------------------------------------------------------

fn normalize_latest_block(table: &Table, config: &DashboardConfig) -> NormalizedRows {
    let cols = &config.columns.summary;
    let mut block_date: Option<NaiveDateTime> = None;
    let mut block_started = false;
    let mut seeds = Vec::new();
    let mut skipped = SkipTally::default();

    for row in table.rows.iter().rev() {
        let symbol_text = decode_text(row.cell(cols.symbol));
        let date_text = decode_text(row.cell(cols.date));

        let is_total = symbol_text
            .as_deref()
            .is_some_and(|t| is_block_total(t, config))
            || date_text
                .as_deref()
                .is_some_and(|t| is_block_total(t, config));
        if is_total {
            if block_started {
                break;
            }
            continue;
        }

        if let Some(date) = decode_date(row.cell(cols.date)) {
            match block_date {
                None => block_date = Some(date),
                Some(current) if current.date() != date.date() => break,
                Some(_) => {}
            }
            block_started = true;
        }

        let Some(symbol_text) = symbol_text else {
            skipped.record(SkipReason::Empty);
            continue;
        };
        block_started = true;

        let Some(symbol) = resolve_symbol(&symbol_text, config) else {
            skipped.record(SkipReason::UnknownSymbol);
            continue;
        };

        let seed = read_block_row(row, symbol, cols, config.columns.percent_as_fraction);
        if seed.is_blank() {
            skipped.record(SkipReason::Blank);
        } else {
            seeds.push(seed);
        }
    }

    seeds.reverse();
    for seed in &mut seeds {
        seed.date = block_date;
    }

    debug!(
        "Latest block {:?}: {} assets, skipped {:?}",
        block_date.map(|d| d.date()),
        seeds.len(),
        skipped
    );

    NormalizedRows {
        layout: SheetLayout::PeriodicSummary,
        transactions: Vec::new(),
        summary_rows: seeds,
    }
}

fn read_block_row(
    row: &Row,
    symbol: String,
    cols: &SummaryColumns,
    percent_as_fraction: bool,
) -> AssetSummarySeed {
    let num = |i: usize| decode_number(row.cell(i));
    AssetSummarySeed {
        symbol,
        date: None,
        quantity: num(cols.quantity),
        invested: num(cols.invested),
        current_value: num(cols.current_value),
        profit_loss: num(cols.profit_loss),
        reported_share: cols.share.map(|i| to_percent(num(i), percent_as_fraction)),
        reported_roi: cols.roi.map(|i| to_percent(num(i), percent_as_fraction)),
    }
}
