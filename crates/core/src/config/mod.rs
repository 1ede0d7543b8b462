//! Dashboard configuration
//!
//! Loaded from a TOML file; every field has a default so an empty file (or
//! no file at all) yields the stock five-asset crypto portfolio.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_SHEET_ID: &str = "1Bx0NizfyQjrLVkuHRLcWBK1_ZOFSRtF9vOql4IV5Ap4";
const DEFAULT_BASE_URL: &str = "https://docs.google.com";
const FALLBACK_COLOR: &str = "#888";
const FALLBACK_ICON: &str = "●";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Id of the public Google Sheet
    pub sheet_id: String,
    /// Scheme and host of the query endpoint
    pub base_url: String,
    pub sheets: SheetNames,
    /// Tracked assets; doubles as the symbol whitelist
    pub assets: Vec<AssetDefinition>,
    /// Seconds between automatic refreshes
    pub refresh_interval_secs: u64,
    pub request_timeout_secs: u64,
    pub columns: ColumnMappings,
    pub logging: LoggingConfig,
}

/// Tab names inside the spreadsheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetNames {
    pub portfolio: String,
    pub summary: String,
    pub history: String,
}

impl Default for SheetNames {
    fn default() -> Self {
        Self {
            portfolio: "Portafolio".to_string(),
            summary: "Resumen_Activo".to_string(),
            history: "_Hist_Precios".to_string(),
        }
    }
}

/// A tracked asset and its cosmetic metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDefinition {
    pub symbol: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default = "default_icon")]
    pub icon: String,
    /// Label used by inline total rows, e.g. `Total BTC/Usdt`
    #[serde(default)]
    pub summary_label: Option<String>,
}

fn default_color() -> String {
    FALLBACK_COLOR.to_string()
}

fn default_icon() -> String {
    FALLBACK_ICON.to_string()
}

impl AssetDefinition {
    fn new(symbol: &str, name: &str, color: &str, icon: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: name.to_string(),
            color: color.to_string(),
            icon: icon.to_string(),
            summary_label: Some(format!("Total {}/Usdt", symbol)),
        }
    }
}

/// Display metadata resolved for a symbol
#[derive(Debug, Clone, PartialEq)]
pub struct AssetDisplay {
    pub name: String,
    pub color: String,
    pub icon: String,
}

/// Column positions (zero-based) of the transaction sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransactionColumns {
    pub date: usize,
    pub symbol: usize,
    pub invested: usize,
    pub transaction_type: usize,
    pub order: usize,
    pub exchange: usize,
    pub quantity: usize,
    pub purchase_price: usize,
    pub sale_price: usize,
    pub current_price: usize,
    pub initial_value: usize,
    pub current_value: usize,
    pub profit_loss: usize,
    pub variation: usize,
    /// Inline per-asset total rows, to the right of the ledger
    pub summary_label: usize,
    pub summary_invested: usize,
    pub summary_profit_loss: usize,
    pub summary_current_value: usize,
    pub summary_share: usize,
    pub summary_roi: usize,
}

impl Default for TransactionColumns {
    fn default() -> Self {
        Self {
            date: 0,
            symbol: 1,
            invested: 2,
            transaction_type: 3,
            order: 4,
            exchange: 5,
            quantity: 6,
            purchase_price: 7,
            sale_price: 8,
            current_price: 10,
            initial_value: 11,
            current_value: 12,
            profit_loss: 13,
            variation: 14,
            summary_label: 18,
            summary_invested: 19,
            summary_profit_loss: 20,
            summary_current_value: 21,
            summary_share: 22,
            summary_roi: 23,
        }
    }
}

impl TransactionColumns {
    /// Minimum table width for a sheet to be read as a ledger.
    ///
    /// Inline total columns are optional and not counted.
    pub fn required_width(&self) -> usize {
        [
            self.date,
            self.symbol,
            self.invested,
            self.transaction_type,
            self.order,
            self.exchange,
            self.quantity,
            self.purchase_price,
            self.sale_price,
            self.current_price,
            self.initial_value,
            self.current_value,
            self.profit_loss,
            self.variation,
        ]
        .iter()
        .max()
        .map_or(0, |m| m + 1)
    }
}

/// Column positions (zero-based) of the periodic-summary sheet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryColumns {
    pub date: usize,
    pub symbol: usize,
    pub quantity: usize,
    pub invested: usize,
    pub current_value: usize,
    pub profit_loss: usize,
    pub share: Option<usize>,
    pub roi: Option<usize>,
}

impl Default for SummaryColumns {
    fn default() -> Self {
        Self {
            date: 0,
            symbol: 1,
            quantity: 2,
            invested: 3,
            current_value: 4,
            profit_loss: 5,
            share: Some(6),
            roi: Some(7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMappings {
    pub transaction: TransactionColumns,
    pub summary: SummaryColumns,
    /// Share and ROI columns hold fractions (0.25) rather than percents (25)
    pub percent_as_fraction: bool,
}

impl Default for ColumnMappings {
    fn default() -> Self {
        Self {
            transaction: TransactionColumns::default(),
            summary: SummaryColumns::default(),
            percent_as_fraction: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive, e.g. "info" or "sheetfolio_engine=debug"
    pub level: String,
    /// Output format (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn,sheetfolio_cli=info,sheetfolio_engine=info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            sheet_id: DEFAULT_SHEET_ID.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            sheets: SheetNames::default(),
            assets: vec![
                AssetDefinition::new("BTC", "Bitcoin", "#f7931a", "₿"),
                AssetDefinition::new("ETH", "Ethereum", "#627eea", "Ξ"),
                AssetDefinition::new("SOL", "Solana", "#14f195", "◎"),
                AssetDefinition::new("LINK", "Chainlink", "#2a5ada", "⬡"),
                AssetDefinition::new("AVAX", "Avalanche", "#e84142", "▲"),
            ],
            refresh_interval_secs: 300,
            request_timeout_secs: 15,
            columns: ColumnMappings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Load and validate a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: DashboardConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.sheet_id.trim().is_empty() {
            return Err(Error::Config("sheet_id must not be empty".to_string()));
        }
        if self.assets.is_empty() {
            return Err(Error::Config("at least one asset must be configured".to_string()));
        }
        if self.refresh_interval_secs == 0 {
            return Err(Error::Config("refresh_interval_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Whitelisted definition for an already-normalized symbol
    pub fn asset(&self, symbol: &str) -> Option<&AssetDefinition> {
        self.assets
            .iter()
            .find(|a| a.symbol.eq_ignore_ascii_case(symbol))
    }

    pub fn is_whitelisted(&self, symbol: &str) -> bool {
        self.asset(symbol).is_some()
    }

    /// Symbol for an inline total label such as `Total ETH/Usdt`
    pub fn symbol_for_label(&self, label: &str) -> Option<&str> {
        let label = label.trim();
        self.assets
            .iter()
            .find(|a| {
                a.summary_label
                    .as_deref()
                    .is_some_and(|l| l.trim().eq_ignore_ascii_case(label))
            })
            .map(|a| a.symbol.as_str())
    }

    /// Name, color and icon for a symbol, with neutral fallbacks
    pub fn display(&self, symbol: &str) -> AssetDisplay {
        match self.asset(symbol) {
            Some(def) => AssetDisplay {
                name: def.name.clone(),
                color: def.color.clone(),
                icon: def.icon.clone(),
            },
            None => AssetDisplay {
                name: symbol.to_string(),
                color: FALLBACK_COLOR.to_string(),
                icon: FALLBACK_ICON.to_string(),
            },
        }
    }
}
