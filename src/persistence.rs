//! Persisted cart format
//!
//! A partition holds the JSON array of the cart's lines in display order.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::{
    lines::CartLine,
    pricing::{PricingError, total_price},
    products::ProductId,
};

/// Reasons a stored partition cannot be used as a cart.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The bytes are not a JSON line list.
    #[error("stored cart is not a valid line list: {0}")]
    Json(#[from] serde_json::Error),

    /// A line has a quantity of zero.
    #[error("stored cart has a zero quantity for product {0}")]
    ZeroQuantity(ProductId),

    /// Two lines share a product.
    #[error("stored cart has more than one line for product {0}")]
    DuplicateProduct(ProductId),

    /// The stored lines cannot be totalled.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Serialize lines for storage.
///
/// # Errors
///
/// Returns [`PersistenceError::Json`] if serialization fails.
pub fn encode_lines(lines: &[CartLine]) -> Result<Vec<u8>, PersistenceError> {
    Ok(serde_json::to_vec(lines)?)
}

/// Parse stored bytes back into lines, checking the cart invariants.
///
/// # Errors
///
/// - [`PersistenceError::Json`]: the bytes do not parse.
/// - [`PersistenceError::ZeroQuantity`]: a line has no units.
/// - [`PersistenceError::DuplicateProduct`]: a product appears on two lines.
/// - [`PersistenceError::Pricing`]: the totals overflow.
pub fn decode_lines(bytes: &[u8]) -> Result<Vec<CartLine>, PersistenceError> {
    let lines: Vec<CartLine> = serde_json::from_slice(bytes)?;

    let mut seen = FxHashSet::default();

    for line in &lines {
        if line.quantity == 0 {
            return Err(PersistenceError::ZeroQuantity(line.product_id()));
        }

        if !seen.insert(line.product_id()) {
            return Err(PersistenceError::DuplicateProduct(line.product_id()));
        }
    }

    total_price(&lines)?;

    Ok(lines)
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;
    use crate::products::Product;

    #[test]
    fn decodes_browser_style_payload() -> TestResult {
        let payload = br#"[
            {
                "product": {"id": 1, "title": "Sneakers", "price": 49.99, "category": "shoes",
                            "images": ["https://cdn.example/sneakers.png"]},
                "quantity": 2,
                "addedAt": "2025-03-01T10:15:00.000Z"
            }
        ]"#;

        let lines = decode_lines(payload)?;

        assert_eq!(lines.len(), 1);
        let line = lines.first().ok_or("missing line")?;
        assert_eq!(line.product.price, Decimal::new(4999, 2));
        assert_eq!(line.quantity, 2);
        assert_eq!(line.added_at, "2025-03-01T10:15:00Z".parse::<Timestamp>()?);

        Ok(())
    }

    #[test]
    fn encoded_lines_decode_unchanged() -> TestResult {
        let lines = vec![CartLine::new(
            Product::new(ProductId(4), "Scarf", Decimal::new(1250, 2)).with_category("fashion"),
            3,
            Timestamp::UNIX_EPOCH,
        )];

        assert_eq!(decode_lines(&encode_lines(&lines)?)?, lines);

        Ok(())
    }

    #[test]
    fn prices_are_written_as_decimal_strings() -> TestResult {
        let lines = vec![CartLine::new(
            Product::new(ProductId(8), "Thirds", Decimal::new(333, 3)),
            3,
            Timestamp::UNIX_EPOCH,
        )];

        let json: serde_json::Value = serde_json::from_slice(&encode_lines(&lines)?)?;

        assert_eq!(
            json.pointer("/0/product/price")
                .and_then(serde_json::Value::as_str),
            Some("0.333")
        );
        assert_eq!(
            json.pointer("/0/quantity")
                .and_then(serde_json::Value::as_u64),
            Some(3)
        );

        Ok(())
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            decode_lines(b"{not json"),
            Err(PersistenceError::Json(_))
        ));
        assert!(matches!(
            decode_lines(br#"{"lines": []}"#),
            Err(PersistenceError::Json(_))
        ));
    }

    #[test]
    fn rejects_broken_invariants() {
        let zero = br#"[{"product": {"id": 1, "title": "A", "price": "1.00"},
                          "quantity": 0, "addedAt": "2025-01-01T00:00:00Z"}]"#;
        let duplicate = br#"[
            {"product": {"id": 1, "title": "A", "price": "1.00"}, "quantity": 1, "addedAt": "2025-01-01T00:00:00Z"},
            {"product": {"id": 1, "title": "A", "price": "1.00"}, "quantity": 2, "addedAt": "2025-01-01T00:00:00Z"}
        ]"#;

        assert!(matches!(
            decode_lines(zero),
            Err(PersistenceError::ZeroQuantity(ProductId(1)))
        ));
        assert!(matches!(
            decode_lines(duplicate),
            Err(PersistenceError::DuplicateProduct(ProductId(1)))
        ));
    }
}
