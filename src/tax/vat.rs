use super::rate::TaxRate;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::Serialize;

/// Largest pre-tax amount an entry may carry.
///
/// With rates capped at 100% every tax product, total and report sum stays
/// far inside the range of `Decimal`.
pub const MAX_AMOUNT: Decimal = dec!(1000000000000);

/// Tax and total derived from a pre-tax amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TaxBreakdown {
    pub tax_amount: Decimal,
    pub amount_incl_tax: Decimal,
}

/// Round to cents, halves away from zero
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Price a pre-tax amount.
///
/// The tax is rounded to the cent first and the total is derived from the
/// rounded tax, so `amount_incl_tax - amount_excl_tax == tax_amount` holds
/// exactly for cent amounts. Callers must reject negative amounts and
/// amounts above [`MAX_AMOUNT`].
pub fn compute_tax(amount_excl_tax: Decimal, rate: TaxRate) -> TaxBreakdown {
    let tax_amount = round2(amount_excl_tax * rate.percent() / dec!(100));
    let amount_incl_tax = round2(amount_excl_tax + tax_amount);
    TaxBreakdown {
        tax_amount,
        amount_incl_tax,
    }
}
