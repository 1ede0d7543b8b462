//! Shared type definitions and newtypes

use serde::{Deserialize, Serialize};

/// Lowest ROI a position can report (everything invested is gone)
pub const ROI_FLOOR: f64 = -100.0;

/// Highest ROI reported; anything above comes from a near-zero cost base
pub const ROI_CEILING: f64 = 10_000.0;

/// USD amount (for clarity in function signatures)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Usd(pub f64);

impl Usd {
    pub fn as_f64(&self) -> f64 {
        self.0
    }
}

impl std::ops::Add for Usd {
    type Output = Usd;

    fn add(self, rhs: Usd) -> Usd {
        Usd(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Usd {
    type Output = Usd;

    fn sub(self, rhs: Usd) -> Usd {
        Usd(self.0 - rhs.0)
    }
}

impl std::iter::Sum for Usd {
    fn sum<I: Iterator<Item = Usd>>(iter: I) -> Usd {
        Usd(iter.map(|u| u.0).sum())
    }
}

/// Percentage value (e.g., for ROI, portfolio share)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Percent(pub f64);

impl Percent {
    pub fn as_f64(&self) -> f64 {
        self.0
    }

    /// ROI of a position, clamped to [`ROI_FLOOR`, `ROI_CEILING`].
    ///
    /// Returns 0 when nothing was invested.
    pub fn roi(profit_loss: Usd, invested: Usd) -> Self {
        if invested.0 <= 0.0 {
            return Percent(0.0);
        }
        let raw = profit_loss.0 / invested.0 * 100.0;
        if raw.is_nan() {
            return Percent(0.0);
        }
        Percent(raw.clamp(ROI_FLOOR, ROI_CEILING))
    }

    /// Unclamped ROI, used for portfolio-wide totals
    pub fn ratio(profit_loss: Usd, invested: Usd) -> Self {
        if invested.0 > 0.0 {
            Percent(profit_loss.0 / invested.0 * 100.0)
        } else {
            Percent(0.0)
        }
    }

    /// Share of `part` in `total`; 0 when the total is not positive
    pub fn share(part: Usd, total: Usd) -> Self {
        if total.0 > 0.0 {
            Percent(part.0 / total.0 * 100.0)
        } else {
            Percent(0.0)
        }
    }
}
