//! Purchase trend series.

use serde::{Deserialize, Serialize};

use crate::purchase::Purchase;

/// Display format for chart and history dates (`dd/MM/yyyy`).
pub const CHART_DATE_FORMAT: &str = "%d/%m/%Y";

/// One point of the purchase trend line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Purchase date formatted as `dd/MM/yyyy`.
    pub date: String,
    /// Quantity bought.
    pub quantity: u32,
}

/// Build the trend series, one point per purchase in history order.
#[must_use]
pub fn chart_series(purchases: &[Purchase]) -> Vec<ChartPoint> {
    purchases
        .iter()
        .map(|p| ChartPoint {
            date: p.date.format(CHART_DATE_FORMAT).to_string(),
            quantity: p.quantity,
        })
        .collect()
}
