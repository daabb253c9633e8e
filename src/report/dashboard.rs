use crate::core::{Month, Snapshot};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Number of months in the dashboard chart
pub const CHART_MONTHS: usize = 6;

/// Headline figures across all entries
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    /// Paid invoices, including VAT
    pub collected_revenue: Decimal,
    /// Unpaid invoices, including VAT
    pub pending_revenue: Decimal,
    pub total_collected_vat: Decimal,
    pub total_deductible_vat: Decimal,
    /// Collected minus deductible; positive means VAT is owed
    pub net_vat: Decimal,
    pub total_expenses_incl_tax: Decimal,
    pub invoices_paid: usize,
    pub invoices_unpaid: usize,
    /// Trailing months ending with the month of `as_of`, oldest first
    pub chart: Vec<MonthlyActivity>,
    pub skipped_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyActivity {
    pub month: Month,
    /// Invoiced revenue excluding tax
    pub ca: Decimal,
    /// VAT collected
    pub tva: Decimal,
}

pub fn dashboard(snapshot: &Snapshot, as_of: NaiveDate) -> DashboardSummary {
    let mut summary = DashboardSummary {
        collected_revenue: Decimal::ZERO,
        pending_revenue: Decimal::ZERO,
        total_collected_vat: Decimal::ZERO,
        total_deductible_vat: Decimal::ZERO,
        net_vat: Decimal::ZERO,
        total_expenses_incl_tax: Decimal::ZERO,
        invoices_paid: 0,
        invoices_unpaid: 0,
        chart: Vec::new(),
        skipped_entries: snapshot.skipped(),
    };
    let mut monthly: HashMap<Month, (Decimal, Decimal)> = HashMap::new();

    for invoice in snapshot.invoices() {
        let tax = invoice.tax();
        summary.total_collected_vat += tax.tax_amount;
        if invoice.is_paid() == Some(true) {
            summary.collected_revenue += tax.amount_incl_tax;
            summary.invoices_paid += 1;
        } else {
            summary.pending_revenue += tax.amount_incl_tax;
            summary.invoices_unpaid += 1;
        }
        let (ca, tva) = monthly.entry(invoice.month()).or_default();
        *ca += invoice.amount_excl_tax;
        *tva += tax.tax_amount;
    }

    for expense in snapshot.expenses() {
        let tax = expense.tax();
        summary.total_deductible_vat += tax.tax_amount;
        summary.total_expenses_incl_tax += tax.amount_incl_tax;
    }

    summary.net_vat = summary.total_collected_vat - summary.total_deductible_vat;
    summary.chart = Month::of(as_of)
        .trailing(CHART_MONTHS)
        .into_iter()
        .map(|month| {
            let (ca, tva) = monthly.get(&month).copied().unwrap_or_default();
            MonthlyActivity { month, ca, tva }
        })
        .collect();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::tests::{expense, invoice};
    use rust_decimal_macros::dec;

    fn as_of() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 20).unwrap()
    }

    #[test]
    fn single_paid_invoice() {
        let snapshot = Snapshot::new(vec![invoice(1, "2025-03-01", dec!(1000), dec!(20), true)]);
        let d = dashboard(&snapshot, as_of());
        assert_eq!(d.collected_revenue, dec!(1200.00));
        assert_eq!(d.pending_revenue, Decimal::ZERO);
        assert_eq!(d.total_collected_vat, dec!(200.00));
        assert_eq!(d.invoices_paid, 1);
        assert_eq!(d.invoices_unpaid, 0);
    }

    #[test]
    fn net_vat_owed() {
        let snapshot = Snapshot::new(vec![
            invoice(1, "2025-03-01", dec!(1000), dec!(20), true),
            expense(1, "2025-03-02", dec!(400), dec!(20), "Matériel"),
        ]);
        let d = dashboard(&snapshot, as_of());
        assert_eq!(d.total_collected_vat, dec!(200.00));
        assert_eq!(d.total_deductible_vat, dec!(80.00));
        assert_eq!(d.net_vat, dec!(120.00));
        assert_eq!(d.total_expenses_incl_tax, dec!(480.00));
    }

    #[test]
    fn net_vat_credit_when_deductible_exceeds_collected() {
        let snapshot = Snapshot::new(vec![
            invoice(1, "2025-03-01", dec!(100), dec!(20), false),
            expense(1, "2025-03-02", dec!(400), dec!(20), "Loyer"),
        ]);
        let d = dashboard(&snapshot, as_of());
        assert_eq!(d.net_vat, dec!(-60.00));
        assert_eq!(d.pending_revenue, dec!(120.00));
    }

    #[test]
    fn paid_and_pending_add_up_to_all_invoices() {
        let snapshot = Snapshot::new(vec![
            invoice(1, "2025-01-05", dec!(333.33), dec!(5.5), true),
            invoice(2, "2025-02-05", dec!(19.99), dec!(10), false),
            invoice(3, "2024-11-05", dec!(0.05), dec!(10), false),
        ]);
        let d = dashboard(&snapshot, as_of());
        let total: Decimal = snapshot.invoices().map(|i| i.amount_incl_tax()).sum();
        assert_eq!(d.collected_revenue + d.pending_revenue, total);
    }

    #[test]
    fn chart_covers_six_months_with_gaps() {
        let snapshot = Snapshot::new(vec![
            invoice(1, "2025-03-01", dec!(1000), dec!(20), true),
            invoice(2, "2025-03-15", dec!(500), dec!(10), false),
            invoice(3, "2024-12-24", dec!(100), dec!(20), true),
            // outside the window
            invoice(4, "2024-09-30", dec!(999), dec!(20), true),
        ]);
        let d = dashboard(&snapshot, as_of());
        let months: Vec<String> = d.chart.iter().map(|m| m.month.to_string()).collect();
        assert_eq!(
            months,
            vec!["2024-10", "2024-11", "2024-12", "2025-01", "2025-02", "2025-03"]
        );
        assert_eq!(d.chart[0].ca, Decimal::ZERO);
        assert_eq!(d.chart[2].ca, dec!(100));
        assert_eq!(d.chart[2].tva, dec!(20));
        assert_eq!(d.chart[5].ca, dec!(1500));
        assert_eq!(d.chart[5].tva, dec!(250));
    }

    #[test]
    fn empty_snapshot() {
        let d = dashboard(&Snapshot::default(), as_of());
        assert_eq!(d.net_vat, Decimal::ZERO);
        assert_eq!(d.chart.len(), CHART_MONTHS);
        assert!(d.chart.iter().all(|m| m.ca.is_zero() && m.tva.is_zero()));
    }
}
