//! Cart totals and tax.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::cart::CartItems;
use crate::types::{Cents, ProductId};

/// Flat sales-tax percentage applied when none is configured.
pub const DEFAULT_TAX_PERCENT: u32 = 8;

/// Sum of `price × quantity` over every line.
///
/// Lines whose price cannot be found contribute nothing; a missing price is
/// not an error.
pub fn subtotal<F>(items: &CartItems, mut price_of: F) -> Cents
where
    F: FnMut(ProductId) -> Option<Cents>,
{
    items
        .iter()
        .filter_map(|(product, qty)| price_of(product).map(|price| price.times(qty)))
        .fold(Cents::ZERO, |acc, line| acc + line)
}

/// Cart total: subtotal plus the shipping cost, if one was quoted.
///
/// Returns `None` when the cart has no items at all, which callers must keep
/// distinct from a zero total.
pub fn total<F>(items: &CartItems, price_of: F, shipping: Option<Cents>) -> Option<Cents>
where
    F: FnMut(ProductId) -> Option<Cents>,
{
    if items.is_empty() {
        return None;
    }
    Some(subtotal(items, price_of) + shipping.unwrap_or(Cents::ZERO))
}

/// Tax on a subtotal.
///
/// The percentage is applied and the result is then divided by 100 again
/// before rounding to two places, so a 2500 cent subtotal at 8% yields `2.00`.
/// Negative subtotals are taxed at zero.
#[must_use]
pub fn tax(subtotal: Cents, percent: u32) -> Decimal {
    if subtotal.get() < 0 {
        return Decimal::ZERO;
    }
    let raw = Decimal::from(subtotal.get()) * Decimal::from(percent) / Decimal::ONE_HUNDRED;
    (raw / Decimal::ONE_HUNDRED).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn catalog() -> HashMap<ProductId, Cents> {
        HashMap::from([
            (ProductId::new(5), Cents::new(1000)),
            (ProductId::new(7), Cents::new(500)),
        ])
    }

    fn cart(lines: &[(i32, u32)]) -> CartItems {
        let mut items = CartItems::new();
        for (id, qty) in lines {
            items.add(ProductId::new(*id), *qty);
        }
        items
    }

    #[test]
    fn test_total_without_shipping() {
        let prices = catalog();
        let total = total(&cart(&[(5, 1), (7, 3)]), |id| prices.get(&id).copied(), None);
        assert_eq!(total, Some(Cents::new(2500)));
    }

    #[test]
    fn test_total_adds_shipping() {
        let prices = catalog();
        let total = total(
            &cart(&[(5, 1)]),
            |id| prices.get(&id).copied(),
            Some(Cents::new(745)),
        );
        assert_eq!(total, Some(Cents::new(1745)));
    }

    #[test]
    fn test_unpriced_line_contributes_zero() {
        let prices = catalog();
        let total = total(&cart(&[(5, 2), (99, 4)]), |id| prices.get(&id).copied(), None);
        assert_eq!(total, Some(Cents::new(2000)));
    }

    #[test]
    fn test_empty_cart_has_no_total() {
        let prices = catalog();
        let total = total(&CartItems::new(), |id| prices.get(&id).copied(), Some(Cents::new(500)));
        assert_eq!(total, None);
    }

    #[test]
    fn test_all_unpriced_is_zero_not_none() {
        let total = total(&cart(&[(1, 1)]), |_| None, None);
        assert_eq!(total, Some(Cents::ZERO));
    }

    #[test]
    fn test_tax_scaled_down_twice() {
        assert_eq!(tax(Cents::new(2500), 8), Decimal::new(200, 2));
        assert_eq!(tax(Cents::new(1999), 8), Decimal::new(160, 2));
        assert_eq!(tax(Cents::new(-1), 8), Decimal::ZERO);
        assert_eq!(tax(Cents::ZERO, DEFAULT_TAX_PERCENT), Decimal::ZERO);
    }
}
