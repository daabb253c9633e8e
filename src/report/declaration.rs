use crate::core::{Month, Snapshot};
use crate::tax::{RateTier, TaxRate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// VAT collected on invoices against VAT deductible on expenses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VatBalance {
    pub collected: Decimal,
    pub deductible: Decimal,
    /// Positive: owed to the tax authority. Zero or negative: credit.
    pub net: Decimal,
}

impl VatBalance {
    fn collect(&mut self, amount: Decimal) {
        self.collected += amount;
        self.net = self.collected - self.deductible;
    }

    fn deduct(&mut self, amount: Decimal) {
        self.deductible += amount;
        self.net = self.collected - self.deductible;
    }

    pub fn is_owed(&self) -> bool {
        self.net > Decimal::ZERO
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyVat {
    pub month: Month,
    #[serde(flatten)]
    pub balance: VatBalance,
    /// Net balance of this month and every month before it
    pub cumulative_net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateVat {
    pub rate: TaxRate,
    /// `None` when the rate is not a statutory tier
    pub tier: Option<RateTier>,
    #[serde(flatten)]
    pub balance: VatBalance,
}

/// Monthly VAT declaration over the full date range of the snapshot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VatDeclaration {
    /// First to last month with activity, gaps included
    pub months: Vec<MonthlyVat>,
    /// The four statutory tiers, then any unrecognized rates
    pub by_rate: Vec<RateVat>,
    pub totals: VatBalance,
    pub skipped_entries: usize,
}

pub fn declaration(snapshot: &Snapshot) -> VatDeclaration {
    let mut per_month: BTreeMap<Month, VatBalance> = BTreeMap::new();
    let mut per_rate: BTreeMap<TaxRate, VatBalance> = RateTier::ALL
        .into_iter()
        .map(|tier| (TaxRate::from(tier), VatBalance::default()))
        .collect();
    let mut totals = VatBalance::default();

    for invoice in snapshot.invoices() {
        let tax = invoice.tax_amount();
        per_month.entry(invoice.month()).or_default().collect(tax);
        per_rate.entry(invoice.rate).or_default().collect(tax);
        totals.collect(tax);
    }
    for expense in snapshot.expenses() {
        let tax = expense.tax_amount();
        per_month.entry(expense.month()).or_default().deduct(tax);
        per_rate.entry(expense.rate).or_default().deduct(tax);
        totals.deduct(tax);
    }

    let range = per_month
        .keys()
        .next()
        .copied()
        .zip(per_month.keys().next_back().copied());
    let mut cumulative_net = Decimal::ZERO;
    let months = range
        .map(|(first, last)| Month::range(first, last).collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter()
        .map(|month| {
            let balance = per_month.get(&month).copied().unwrap_or_default();
            cumulative_net += balance.net;
            MonthlyVat {
                month,
                balance,
                cumulative_net,
            }
        })
        .collect();

    let (recognized, unrecognized): (Vec<_>, Vec<_>) = per_rate
        .into_iter()
        .map(|(rate, balance)| RateVat {
            rate,
            tier: rate.tier(),
            balance,
        })
        .partition(|r| r.tier.is_some());
    if !unrecognized.is_empty() {
        log::warn!(
            "{} unrecognized VAT rate(s) in declaration",
            unrecognized.len()
        );
    }

    VatDeclaration {
        months,
        by_rate: recognized.into_iter().chain(unrecognized).collect(),
        totals,
        skipped_entries: snapshot.skipped(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{expense, invoice};
    use rust_decimal_macros::dec;

    #[test]
    fn months_span_full_range_with_gaps() {
        let snapshot = Snapshot::new(vec![
            invoice(1, "2024-11-10", dec!(1000), dec!(20), true),
            expense(1, "2025-02-01", dec!(100), dec!(20), "Logiciel"),
        ]);
        let d = declaration(&snapshot);
        let months: Vec<String> = d.months.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(months, vec!["2024-11", "2024-12", "2025-01", "2025-02"]);

        assert_eq!(d.months[0].balance.collected, dec!(200));
        assert_eq!(d.months[1].balance, VatBalance::default());
        assert_eq!(d.months[3].balance.deductible, dec!(20));
        assert_eq!(d.months[3].balance.net, dec!(-20));
        assert_eq!(d.months[3].cumulative_net, dec!(180));
    }

    #[test]
    fn totals_and_sign_convention() {
        let snapshot = Snapshot::new(vec![
            invoice(1, "2025-01-10", dec!(1000), dec!(20), true),
            expense(1, "2025-01-11", dec!(400), dec!(20), "Matériel"),
        ]);
        let d = declaration(&snapshot);
        assert_eq!(d.totals.collected, dec!(200));
        assert_eq!(d.totals.deductible, dec!(80));
        assert_eq!(d.totals.net, dec!(120));
        assert!(d.totals.is_owed());
    }

    #[test]
    fn every_tier_present_even_without_activity() {
        let snapshot = Snapshot::new(vec![invoice(1, "2025-01-10", dec!(100), dec!(5.5), true)]);
        let d = declaration(&snapshot);
        let tiers: Vec<_> = d.by_rate.iter().map(|r| r.tier).collect();
        assert_eq!(
            tiers,
            vec![
                Some(RateTier::Zero),
                Some(RateTier::Reduced),
                Some(RateTier::Intermediate),
                Some(RateTier::Standard)
            ]
        );
        assert_eq!(d.by_rate[1].balance.collected, dec!(5.50));
        assert_eq!(d.by_rate[3].balance, VatBalance::default());
    }

    #[test]
    fn unrecognized_rates_bucketed_separately() {
        let snapshot = Snapshot::new(vec![
            invoice(1, "2025-01-10", dec!(200), dec!(8.5), true),
            expense(1, "2025-01-11", dec!(100), dec!(8.5), "Autre"),
            invoice(2, "2025-01-12", dec!(100), dec!(20), true),
        ]);
        let d = declaration(&snapshot);
        assert_eq!(d.by_rate.len(), 5);
        let odd = &d.by_rate[4];
        assert_eq!(odd.tier, None);
        assert_eq!(odd.rate.percent(), dec!(8.5));
        assert_eq!(odd.balance.collected, dec!(17.00));
        assert_eq!(odd.balance.deductible, dec!(8.50));
        assert_eq!(odd.balance.net, dec!(8.50));
    }

    #[test]
    fn rate_breakdown_adds_up_to_totals() {
        let snapshot = Snapshot::new(vec![
            invoice(1, "2025-01-10", dec!(123.45), dec!(5.5), true),
            invoice(2, "2025-02-10", dec!(678.90), dec!(10), false),
            invoice(3, "2025-03-10", dec!(42), dec!(0), false),
            expense(1, "2025-03-11", dec!(99.99), dec!(20), "Transport"),
        ]);
        let d = declaration(&snapshot);
        let collected: Decimal = d.by_rate.iter().map(|r| r.balance.collected).sum();
        let deductible: Decimal = d.by_rate.iter().map(|r| r.balance.deductible).sum();
        assert_eq!(collected, d.totals.collected);
        assert_eq!(deductible, d.totals.deductible);

        let monthly: Decimal = d.months.iter().map(|m| m.balance.net).sum();
        assert_eq!(monthly, d.totals.net);
        assert_eq!(d.months.last().unwrap().cumulative_net, d.totals.net);
    }

    #[test]
    fn empty_snapshot_has_no_months() {
        let d = declaration(&Snapshot::default());
        assert!(d.months.is_empty());
        assert_eq!(d.by_rate.len(), 4);
        assert_eq!(d.totals, VatBalance::default());
        assert!(!d.totals.is_owed());
    }
}
