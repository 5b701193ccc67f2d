//! Pricing

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::lines::CartLine;

/// Errors that can occur while calculating cart totals.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PricingError {
    /// Decimal arithmetic or minor unit conversion overflowed.
    #[error("cart total overflowed")]
    Overflow,
}

/// Calculates the price of a single line (unit price times quantity).
///
/// # Errors
///
/// - [`PricingError::Overflow`]: the multiplication does not fit a `Decimal`.
pub fn line_total(line: &CartLine) -> Result<Decimal, PricingError> {
    line.product
        .price
        .checked_mul(Decimal::from(line.quantity))
        .ok_or(PricingError::Overflow)
}

/// Calculates the total price of a list of lines.
///
/// # Errors
///
/// - [`PricingError::Overflow`]: a line total or the running sum overflowed.
pub fn total_price(lines: &[CartLine]) -> Result<Decimal, PricingError> {
    lines.iter().try_fold(Decimal::ZERO, |acc, line| {
        acc.checked_add(line_total(line)?)
            .ok_or(PricingError::Overflow)
    })
}

/// Sum of the quantities of a list of lines.
pub fn total_items(lines: &[CartLine]) -> u64 {
    lines.iter().map(|line| u64::from(line.quantity)).sum()
}

/// Rounds a decimal amount to the currency's minor units and wraps it as money.
///
/// # Errors
///
/// - [`PricingError::Overflow`]: the amount does not fit in `i64` minor units.
pub fn to_money(
    amount: Decimal,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, PricingError> {
    let scale = 10_i64
        .checked_pow(currency.exponent)
        .ok_or(PricingError::Overflow)?;

    let minor_units = amount
        .checked_mul(Decimal::from(scale))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or(PricingError::Overflow)?;

    Ok(Money::from_minor(minor_units, currency))
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rusty_money::iso::{JPY, USD};
    use testresult::TestResult;

    use super::*;
    use crate::products::{Product, ProductId};

    fn line(id: u64, price: Decimal, quantity: u32) -> CartLine {
        CartLine {
            product: Product::new(ProductId(id), "Item", price),
            quantity,
            added_at: Timestamp::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_total_price() -> TestResult {
        let lines = [
            line(1, Decimal::new(4999, 2), 2),
            line(2, Decimal::new(150, 2), 3),
        ];

        assert_eq!(total_price(&lines)?, Decimal::new(10448, 2));
        assert_eq!(total_items(&lines), 5);

        Ok(())
    }

    #[test]
    fn test_total_price_empty() -> TestResult {
        assert_eq!(total_price(&[])?, Decimal::ZERO);
        assert_eq!(total_items(&[]), 0);

        Ok(())
    }

    #[test]
    fn line_total_overflow_is_reported() {
        let result = line_total(&line(1, Decimal::MAX, 2));

        assert_eq!(result, Err(PricingError::Overflow));
    }

    #[test]
    fn to_money_rounds_to_minor_units() -> TestResult {
        assert_eq!(
            to_money(Decimal::new(14997, 2), USD)?,
            Money::from_minor(14997, USD)
        );
        assert_eq!(
            to_money(Decimal::new(1005, 1), JPY)?,
            Money::from_minor(100, JPY)
        );

        Ok(())
    }
}
