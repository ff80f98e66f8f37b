//! Currency conversion
//!
//! The rate table holds units of each currency per one unit of the base
//! currency (USD unless configured otherwise). Conversion pivots through the
//! base: `amount / rate[from] * rate[to]`.

use std::collections::BTreeMap;

use rp_core::config::CurrencyConfig;
use rp_core::types::CurrencyCode;
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CurrencyError {
    #[error("Unknown currency: {0}")]
    UnknownCurrency(CurrencyCode),

    #[error("Invalid rate for {currency}: {rate}")]
    InvalidRate { currency: CurrencyCode, rate: Decimal },

    #[error("Converting {amount} from {from} to {to} overflowed")]
    Overflow {
        amount: Decimal,
        from: CurrencyCode,
        to: CurrencyCode,
    },
}

/// Conversion rate table
#[derive(Debug, Clone, PartialEq)]
pub struct CurrencyRates {
    base: CurrencyCode,
    rates: BTreeMap<CurrencyCode, Decimal>,
}

impl CurrencyRates {
    /// Build a table. The base currency is added with rate 1 when absent;
    /// zero and negative rates are rejected.
    pub fn new(
        base: impl Into<CurrencyCode>,
        rates: impl IntoIterator<Item = (CurrencyCode, Decimal)>,
    ) -> Result<Self, CurrencyError> {
        let base = base.into();
        let mut table = BTreeMap::new();
        for (currency, rate) in rates {
            if rate <= Decimal::ZERO {
                return Err(CurrencyError::InvalidRate { currency, rate });
            }
            table.insert(currency, rate);
        }
        table.entry(base.clone()).or_insert(Decimal::ONE);
        Ok(Self { base, rates: table })
    }

    /// Table containing only the base currency
    pub fn base_only(base: impl Into<CurrencyCode>) -> Self {
        let base = base.into();
        let mut rates = BTreeMap::new();
        rates.insert(base.clone(), Decimal::ONE);
        Self { base, rates }
    }

    pub fn from_config(config: &CurrencyConfig) -> Result<Self, CurrencyError> {
        Self::new(
            config.base_currency.clone(),
            config.rates.iter().map(|(c, r)| (c.clone(), *r)),
        )
    }

    pub fn base(&self) -> &CurrencyCode {
        &self.base
    }

    pub fn rate(&self, currency: &CurrencyCode) -> Option<Decimal> {
        self.rates.get(currency).copied()
    }

    pub fn contains(&self, currency: &CurrencyCode) -> bool {
        self.rates.contains_key(currency)
    }

    pub fn currencies(&self) -> impl Iterator<Item = &CurrencyCode> {
        self.rates.keys()
    }

    /// Convert `amount` from one currency to another.
    ///
    /// Same-currency conversion returns the amount unchanged without
    /// consulting the table. The result is not rounded. Amounts too large
    /// for the target currency fail with [`CurrencyError::Overflow`].
    pub fn convert(
        &self,
        amount: Decimal,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<Decimal, CurrencyError> {
        if from == to {
            return Ok(amount);
        }
        let from_rate = self
            .rate(from)
            .ok_or_else(|| CurrencyError::UnknownCurrency(from.clone()))?;
        let to_rate = self
            .rate(to)
            .ok_or_else(|| CurrencyError::UnknownCurrency(to.clone()))?;
        amount
            .checked_div(from_rate)
            .and_then(|base| base.checked_mul(to_rate))
            .ok_or_else(|| CurrencyError::Overflow {
                amount,
                from: from.clone(),
                to: to.clone(),
            })
    }
}

impl Default for CurrencyRates {
    fn default() -> Self {
        Self::base_only(CurrencyCode::usd())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn table() -> CurrencyRates {
        CurrencyRates::new(
            "USD",
            [
                (CurrencyCode::new("EUR"), dec!(0.92)),
                (CurrencyCode::new("GBP"), dec!(0.8)),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_base_is_added() {
        let rates = table();
        assert_eq!(rates.rate(&CurrencyCode::usd()), Some(Decimal::ONE));
        assert_eq!(rates.currencies().count(), 3);
    }

    #[test]
    fn test_convert_through_base() {
        let rates = table();
        let usd = CurrencyCode::usd();
        let eur = CurrencyCode::new("eur");
        let gbp = CurrencyCode::new("GBP");

        assert_eq!(rates.convert(dec!(50), &usd, &eur).unwrap(), dec!(46));
        assert_eq!(rates.convert(dec!(92), &eur, &usd).unwrap(), dec!(100));
        assert_eq!(rates.convert(dec!(80), &gbp, &usd).unwrap(), dec!(100));
    }

    #[test]
    fn test_same_currency_is_identity() {
        let rates = CurrencyRates::default();
        let chf = CurrencyCode::new("chf");
        assert_eq!(
            rates.convert(dec!(12.345), &chf, &CurrencyCode::new("CHF")).unwrap(),
            dec!(12.345)
        );
    }

    #[test]
    fn test_unknown_currency() {
        let rates = table();
        let err = rates
            .convert(dec!(1), &CurrencyCode::new("JPY"), &CurrencyCode::usd())
            .unwrap_err();
        assert_eq!(err, CurrencyError::UnknownCurrency(CurrencyCode::new("JPY")));
    }

    #[test]
    fn test_overflowing_conversion_is_an_error() {
        let rates = table();
        let err = rates
            .convert(Decimal::MAX, &CurrencyCode::new("GBP"), &CurrencyCode::usd())
            .unwrap_err();
        assert!(matches!(err, CurrencyError::Overflow { .. }));
    }

    #[test]
    fn test_rejects_zero_rate() {
        let result = CurrencyRates::new("USD", [(CurrencyCode::new("EUR"), Decimal::ZERO)]);
        assert!(matches!(result, Err(CurrencyError::InvalidRate { .. })));
    }
}
