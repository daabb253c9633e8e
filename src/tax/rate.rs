use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Statutory French VAT tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum RateTier {
    /// 0% (exempt or outside scope)
    Zero,
    /// 5.5% (food, books, energy)
    Reduced,
    /// 10% (restaurants, transport, renovation)
    Intermediate,
    /// 20% (everything else)
    Standard,
}

impl RateTier {
    pub const ALL: [RateTier; 4] = [
        RateTier::Zero,
        RateTier::Reduced,
        RateTier::Intermediate,
        RateTier::Standard,
    ];

    pub fn percent(self) -> Decimal {
        match self {
            RateTier::Zero => dec!(0),
            RateTier::Reduced => dec!(5.5),
            RateTier::Intermediate => dec!(10),
            RateTier::Standard => dec!(20),
        }
    }

    pub fn from_percent(percent: Decimal) -> Option<RateTier> {
        RateTier::ALL.into_iter().find(|tier| tier.percent() == percent)
    }
}

/// A VAT rate expressed in percent.
///
/// Any value from 0 to 100 is representable so that unusual rates found on
/// documents still price arithmetically; [`TaxRate::tier`] tells whether the
/// rate is one of the statutory tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Returns `None` for negative percentages and anything above 100.
    pub fn new(percent: Decimal) -> Option<TaxRate> {
        if (percent.is_sign_negative() && !percent.is_zero()) || percent > Decimal::ONE_HUNDRED {
            None
        } else {
            Some(TaxRate(percent.normalize()))
        }
    }

    pub fn percent(&self) -> Decimal {
        self.0
    }

    pub fn tier(&self) -> Option<RateTier> {
        RateTier::from_percent(self.0)
    }

    pub fn is_recognized(&self) -> bool {
        self.tier().is_some()
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        RateTier::Standard.into()
    }
}

impl From<RateTier> for TaxRate {
    fn from(tier: RateTier) -> Self {
        TaxRate(tier.percent().normalize())
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl FromStr for TaxRate {
    type Err = String;

    /// Accepts `20`, `5.5`, `5,5` and `5,5 %`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cleaned: String = s
            .trim()
            .trim_end_matches('%')
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        let percent = Decimal::from_str(&cleaned).map_err(|_| s.to_string())?;
        TaxRate::new(percent).ok_or_else(|| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_round_trip_through_percent() {
        for tier in RateTier::ALL {
            assert_eq!(RateTier::from_percent(tier.percent()), Some(tier));
        }
    }

    #[test]
    fn trailing_zeros_do_not_change_tier() {
        assert_eq!(RateTier::from_percent(dec!(5.50)), Some(RateTier::Reduced));
        assert_eq!(RateTier::from_percent(dec!(20.0)), Some(RateTier::Standard));
    }

    #[test]
    fn unrecognized_rate_has_no_tier() {
        let rate = TaxRate::new(dec!(8.5)).unwrap();
        assert_eq!(rate.tier(), None);
        assert!(!rate.is_recognized());
        assert_eq!(rate.percent(), dec!(8.5));
    }

    #[test]
    fn out_of_range_rate_rejected() {
        assert_eq!(TaxRate::new(dec!(-1)), None);
        assert_eq!(TaxRate::new(dec!(100.01)), None);
        assert_eq!(TaxRate::new(dec!(100000000000000000000)), None);
        assert!(TaxRate::new(dec!(100)).is_some());
        assert!("250".parse::<TaxRate>().is_err());
    }

    #[test]
    fn default_is_standard_rate() {
        assert_eq!(TaxRate::default().tier(), Some(RateTier::Standard));
    }

    #[test]
    fn parse_french_notation() {
        assert_eq!("5,5".parse::<TaxRate>(), Ok(RateTier::Reduced.into()));
        assert_eq!("5,5 %".parse::<TaxRate>(), Ok(RateTier::Reduced.into()));
        assert_eq!("20".parse::<TaxRate>(), Ok(RateTier::Standard.into()));
        assert!("abc".parse::<TaxRate>().is_err());
        assert!("-5".parse::<TaxRate>().is_err());
    }

    #[test]
    fn display_is_normalized() {
        assert_eq!(TaxRate::from(RateTier::Reduced).to_string(), "5.5%");
        assert_eq!(TaxRate::new(dec!(20.00)).unwrap().to_string(), "20%");
    }
}
