//! Cart snapshots

use std::io;

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    settings::{
        Alignment, Style,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    lines::{CartLine, position_of},
    pricing::{PricingError, line_total, to_money, total_items, total_price},
    products::ProductId,
};

/// Errors that can occur when rendering a snapshot.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Writing to the output failed.
    #[error("failed to write cart: {0}")]
    Io(#[from] io::Error),

    /// A line price could not be calculated.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Read-only view of a cart: its lines in display order plus derived totals.
///
/// The total price is kept as the exact decimal sum. Rounding to the
/// currency's minor units only happens in [`CartSnapshot::total_money`] and
/// when rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct CartSnapshot {
    lines: Vec<CartLine>,
    total_items: u64,
    total_price: Decimal,
    currency: &'static Currency,
}

impl CartSnapshot {
    /// Build a snapshot, recomputing both totals from `lines`.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the total price does not fit a `Decimal`.
    pub fn from_lines(
        lines: Vec<CartLine>,
        currency: &'static Currency,
    ) -> Result<Self, PricingError> {
        let total_price = total_price(&lines)?;
        let total_items = total_items(&lines);

        Ok(Self {
            lines,
            total_items,
            total_price,
            currency,
        })
    }

    /// Snapshot of an empty cart.
    pub fn empty(currency: &'static Currency) -> Self {
        Self {
            lines: Vec::new(),
            total_items: 0,
            total_price: Decimal::ZERO,
            currency,
        }
    }

    /// Lines in display order.
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Sum of all line quantities.
    pub fn total_items(&self) -> u64 {
        self.total_items
    }

    /// Sum of unit price times quantity over all lines, unrounded.
    pub fn total_price(&self) -> Decimal {
        self.total_price
    }

    /// Currency of the prices.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Total price rounded to the currency's minor units.
    ///
    /// # Errors
    ///
    /// Returns [`PricingError::Overflow`] if the total does not fit in `i64`
    /// minor units.
    pub fn total_money(&self) -> Result<Money<'static, Currency>, PricingError> {
        to_money(self.total_price, self.currency)
    }

    /// Number of distinct products.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The line for `product`, if present.
    pub fn line(&self, product: ProductId) -> Option<&CartLine> {
        position_of(&self.lines, product).and_then(|idx| self.lines.get(idx))
    }

    /// Returns `true` if `product` is in the cart.
    pub fn contains(&self, product: ProductId) -> bool {
        self.line(product).is_some()
    }

    /// Quantity of `product` in the cart, zero if absent.
    pub fn quantity_of(&self, product: ProductId) -> u32 {
        self.line(product).map_or(0, |line| line.quantity)
    }

    /// Writes the cart as a table followed by its totals.
    ///
    /// # Errors
    ///
    /// Returns an error if the output cannot be written or an amount is too
    /// large to show in minor units.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), RenderError> {
        if self.is_empty() {
            writeln!(out, "Cart is empty.")?;
            return Ok(());
        }

        let currency = self.currency;
        let mut builder = Builder::default();

        builder.push_record(["Item", "Category", "Unit Price", "Qty", "Line Total"]);

        for line in &self.lines {
            builder.push_record([
                line.product.title.clone(),
                line.product.category.clone(),
                to_money(line.product.price, currency)?.to_string(),
                line.quantity.to_string(),
                to_money(line_total(line)?, currency)?.to_string(),
            ]);
        }

        let mut table = builder.build();
        table.with(Style::modern_rounded());
        table.modify(Rows::first(), Alignment::center());
        table.modify(Columns::new(2..5), Alignment::right());

        writeln!(out, "{table}")?;
        writeln!(out, "Items: {}", self.total_items)?;
        writeln!(out, "Total: {}", self.total_money()?)?;

        Ok(())
    }
}
