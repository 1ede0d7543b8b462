//! Ledger entries read from the transaction sheet

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One ledger entry, rebuilt from scratch on every load
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub date: Option<NaiveDateTime>,
    pub symbol: String,
    /// Amount of quote currency put into this entry
    pub invested: f64,
    /// Transaction type as written in the sheet (e.g. "Spot")
    pub transaction_type: Option<String>,
    /// Order side as written in the sheet (e.g. "Compra")
    pub order: Option<String>,
    pub exchange: Option<String>,
    pub quantity: f64,
    pub purchase_price: f64,
    pub sale_price: f64,
    pub current_price: f64,
    pub initial_value: f64,
    /// Exchange-reported mark; 0 when the sheet leaves it blank
    pub current_value: f64,
    pub profit_loss: f64,
    pub variation: f64,
}

impl Transaction {
    /// Current value of the entry, preferring the sheet-reported mark over
    /// one rebuilt from quantity and price
    pub fn effective_value(&self) -> f64 {
        if self.current_value != 0.0 {
            self.current_value
        } else {
            self.quantity * self.current_price
        }
    }

    /// True when every numeric field decoded to zero
    pub fn is_blank(&self) -> bool {
        [
            self.invested,
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
        .all(|v| *v == 0.0)
    }

    /// Exchange name if the cell was not blank
    pub fn exchange_name(&self) -> Option<&str> {
        self.exchange.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(current_value: f64, quantity: f64, current_price: f64) -> Transaction {
        Transaction {
            date: None,
            symbol: "BTC".to_string(),
            invested: 100.0,
            transaction_type: None,
            order: None,
            exchange: Some("  ".to_string()),
            quantity,
            purchase_price: 0.0,
            sale_price: 0.0,
            current_price,
            initial_value: 0.0,
            current_value,
            profit_loss: 0.0,
            variation: 0.0,
        }
    }

    #[test]
    fn test_effective_value_prefers_reported_mark() {
        assert_eq!(tx(120.0, 2.0, 70.0).effective_value(), 120.0);
        assert_eq!(tx(0.0, 2.0, 70.0).effective_value(), 140.0);
    }

    #[test]
    fn test_blank_exchange_is_ignored() {
        assert_eq!(tx(0.0, 0.0, 0.0).exchange_name(), None);
    }
}
