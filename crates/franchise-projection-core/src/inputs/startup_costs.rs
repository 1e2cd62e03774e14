use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::ProjectionError;
use crate::inputs::field_value::FieldSource;
use crate::types::Cents;
use crate::ProjectionResult;

/// How a startup cost (or reinvestment) is treated by the projection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapexClassification {
    /// Capitalized and depreciated straight-line
    #[default]
    Capex,
    /// Expensed when incurred
    NonCapex,
    /// Held as a cash reserve
    WorkingCapital,
}

/// One line of the startup-cost schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartupCostLineItem {
    pub id: String,
    pub name: String,
    pub amount: Cents,
    pub capex_classification: CapexClassification,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub source: FieldSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_default_amount: Option<Cents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item7_range_low: Option<Cents>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item7_range_high: Option<Cents>,
    pub sort_order: u32,
}

impl StartupCostLineItem {
    pub fn new(
        id: &str,
        name: &str,
        amount: Cents,
        capex_classification: CapexClassification,
        sort_order: u32,
    ) -> Self {
        StartupCostLineItem {
            id: id.into(),
            name: name.into(),
            amount,
            capex_classification,
            is_custom: false,
            source: FieldSource::UserEntry,
            brand_default_amount: None,
            item7_range_low: None,
            item7_range_high: None,
            sort_order,
        }
    }
}

/// Startup cost subtotals by classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartupCostTotals {
    pub capex: Cents,
    pub non_capex: Cents,
    pub working_capital: Cents,
    pub total: Cents,
}

impl StartupCostTotals {
    /// Cash spent before opening; working-capital items stay in the bank.
    pub fn outlay(&self) -> Cents {
        self.capex + self.non_capex
    }
}

pub fn startup_cost_totals(items: &[StartupCostLineItem]) -> StartupCostTotals {
    let mut totals = StartupCostTotals::default();
    for item in items {
        match item.capex_classification {
            CapexClassification::Capex => totals.capex += item.amount,
            CapexClassification::NonCapex => totals.non_capex += item.amount,
            CapexClassification::WorkingCapital => totals.working_capital += item.amount,
        }
        totals.total += item.amount;
    }
    totals
}

/// Check caller contract violations and collect advisories.
///
/// Errors: an item 7 range with `low > high`, or a repeated `sort_order`.
/// Warnings: non-dense ordering and amounts outside their item 7 range.
pub fn validate_startup_costs(items: &[StartupCostLineItem]) -> ProjectionResult<Vec<String>> {
    let mut warnings = Vec::new();
    let mut seen = BTreeSet::new();

    for item in items {
        if let (Some(low), Some(high)) = (item.item7_range_low, item.item7_range_high) {
            if low > high {
                return Err(ProjectionError::RangeViolation {
                    item: item.name.clone(),
                    low,
                    high,
                });
            }
        }
        if !seen.insert(item.sort_order) {
            return Err(ProjectionError::DuplicateSortOrder {
                sort_order: item.sort_order,
            });
        }

        let below = item.item7_range_low.is_some_and(|low| item.amount < low);
        let above = item.item7_range_high.is_some_and(|high| item.amount > high);
        if below || above {
            warnings.push(format!(
                "Startup cost '{}': {} is outside the Item 7 range {}..{}",
                item.name,
                item.amount,
                item.item7_range_low.map(|v| v.to_string()).unwrap_or_default(),
                item.item7_range_high.map(|v| v.to_string()).unwrap_or_default(),
            ));
        }
    }

    if !is_dense(&seen) {
        warnings.push("Startup cost sort_order values are not contiguous".into());
    }

    Ok(warnings)
}

fn is_dense(orders: &BTreeSet<u32>) -> bool {
    let Some(&first) = orders.iter().next() else {
        return true;
    };
    first <= 1
        && orders
            .iter()
            .zip(first..)
            .all(|(order, expected)| *order == expected)
}

/// Sort by `sort_order` and renumber densely from 0.
pub fn normalize_sort_order(items: &mut [StartupCostLineItem]) {
    items.sort_by_key(|item| item.sort_order);
    for (idx, item) in items.iter_mut().enumerate() {
        item.sort_order = idx as u32;
    }
}
