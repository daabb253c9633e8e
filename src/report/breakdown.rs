use crate::core::Snapshot;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// One slice of a breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Share {
    pub label: String,
    pub value: Decimal,
    /// `value / total * 100`, unrounded
    pub percent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub total: Decimal,
    /// Largest first, ties by label
    pub shares: Vec<Share>,
}

impl Breakdown {
    fn from_totals(totals: HashMap<String, Decimal>) -> Self {
        let total: Decimal = totals.values().copied().sum();
        let mut shares: Vec<Share> = totals
            .into_iter()
            .map(|(label, value)| Share {
                percent: if total.is_zero() {
                    Decimal::ZERO
                } else {
                    value / total * Decimal::ONE_HUNDRED
                },
                label,
                value,
            })
            .collect();
        shares.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));
        Breakdown { total, shares }
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }
}

/// Invoiced revenue excluding tax, per client.
///
/// Clients are grouped by their exact name; an unnamed client is its own group.
pub fn by_client(snapshot: &Snapshot) -> Breakdown {
    let mut totals: HashMap<String, Decimal> = HashMap::new();
    for invoice in snapshot.invoices() {
        *totals.entry(invoice.counterparty.clone()).or_default() += invoice.amount_excl_tax;
    }
    Breakdown::from_totals(totals)
}

/// Expenses including VAT, per category
pub fn by_category(snapshot: &Snapshot) -> Breakdown {
    let mut totals: HashMap<String, Decimal> = HashMap::new();
    for expense in snapshot.expenses() {
        let label = expense.category().unwrap_or_default().label().to_string();
        *totals.entry(label).or_default() += expense.amount_incl_tax();
    }
    Breakdown::from_totals(totals)
}
