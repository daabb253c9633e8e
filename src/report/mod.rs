pub mod breakdown;
pub mod dashboard;
pub mod declaration;
pub mod revenue;

pub use breakdown::{by_category, by_client, Breakdown, Share};
pub use dashboard::{dashboard, DashboardSummary, MonthlyActivity, CHART_MONTHS};
pub use declaration::{declaration, MonthlyVat, RateVat, VatBalance, VatDeclaration};
pub use revenue::{revenue, MonthlyRevenue, RevenueReport, RevenueTotals};

use rust_decimal::{Decimal, RoundingStrategy};

/// `part / whole` to four decimal places, zero when `whole` is zero
pub(crate) fn ratio(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole).round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::{Category, Entry, EntryData, EntryDetails, EntryId, Kind, Snapshot};
    use rust_decimal_macros::dec;
    use crate::tax::TaxRate;
    use chrono::NaiveDate;

    fn data(date: &str, amount: Decimal, rate: Decimal, details: EntryDetails) -> EntryData {
        EntryData {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            counterparty: String::new(),
            document_number: String::new(),
            description: None,
            amount_excl_tax: amount,
            rate: TaxRate::new(rate).unwrap(),
            details,
        }
    }

    pub fn invoice(id: u64, date: &str, amount: Decimal, rate: Decimal, is_paid: bool) -> Entry {
        Entry {
            id: EntryId::new(Kind::Invoice, id),
            data: data(date, amount, rate, EntryDetails::Invoice { is_paid }),
        }
    }

    pub fn client_invoice(id: u64, client: &str, amount: Decimal) -> Entry {
        let mut entry = invoice(id, "2025-01-10", amount, Decimal::from(20), false);
        entry.data.counterparty = client.to_string();
        entry
    }

    pub fn expense(id: u64, date: &str, amount: Decimal, rate: Decimal, category: &str) -> Entry {
        Entry {
            id: EntryId::new(Kind::Expense, id),
            data: data(
                date,
                amount,
                rate,
                EntryDetails::Expense {
                    category: Category::parse(category),
                },
            ),
        }
    }

    #[test]
    fn ratio_of_nothing_is_zero() {
        assert_eq!(super::ratio(Decimal::ONE, Decimal::ZERO), Decimal::ZERO);
        assert_eq!(
            super::ratio(Decimal::ONE, Decimal::from(3)),
            Decimal::new(3333, 4)
        );
    }

    #[test]
    fn views_agree_on_the_same_snapshot() {
        let snapshot = Snapshot::new(vec![
            invoice(1, "2025-01-10", dec!(1000), dec!(20), true),
            invoice(2, "2025-01-25", dec!(0.05), dec!(10), false),
            invoice(3, "2025-03-14", dec!(10.10), dec!(5.5), true),
            invoice(4, "2025-04-02", dec!(333.33), dec!(0), false),
            invoice(5, "2025-04-30", dec!(99.99), dec!(8.5), true),
            expense(1, "2025-01-12", dec!(19.99), dec!(20), "Logiciel"),
            expense(2, "2025-03-03", dec!(0.15), dec!(5.5), "Transport"),
            expense(3, "2025-05-20", dec!(47.37), dec!(10), "Autre"),
        ]);

        let summary = dashboard(&snapshot, NaiveDate::from_ymd_opt(2025, 5, 31).unwrap());
        let vat = declaration(&snapshot);
        let yearly = revenue(&snapshot, Some(2025), 2025);

        assert_eq!(summary.total_collected_vat, vat.totals.collected);
        assert_eq!(summary.total_deductible_vat, vat.totals.deductible);
        assert_eq!(summary.net_vat, vat.totals.net);
        assert_eq!(yearly.totals.vat, vat.totals.collected);

        let per_month: Decimal = vat.months.iter().map(|m| m.balance.collected).sum();
        let per_rate: Decimal = vat.by_rate.iter().map(|r| r.balance.collected).sum();
        assert_eq!(per_month, vat.totals.collected);
        assert_eq!(per_rate, vat.totals.collected);

        let incl_tax: Decimal = snapshot.invoices().map(|i| i.amount_incl_tax()).sum();
        assert_eq!(summary.collected_revenue + summary.pending_revenue, incl_tax);

        let ca: Decimal = snapshot.invoices().map(|i| i.amount_excl_tax).sum();
        assert_eq!(yearly.totals.ca, ca);
        assert_eq!(by_client(&snapshot).total, ca);

        let expenses_incl: Decimal = snapshot.expenses().map(|e| e.amount_incl_tax()).sum();
        assert_eq!(summary.total_expenses_incl_tax, expenses_incl);
        assert_eq!(by_category(&snapshot).total, expenses_incl);
    }
}
