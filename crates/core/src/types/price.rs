//! Unit price representation using decimal arithmetic.
//!
//! Cart prices carry no currency: the storefront displays whatever unit the
//! catalog uses. Amounts are held as [`Decimal`] so subtotals do not drift,
//! but they are stored as plain JSON numbers to stay readable by any client
//! that shares the persisted cart.
//!
//! A JSON number is read back as an `f64`, so every constructor snaps its
//! amount to the value that survives that trip. The price held in memory is
//! always the price a restart will decode.

use core::fmt;
use core::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Deserializer, Serialize};

/// Round trips after which a wire value is assumed to be stable.
const MAX_WIRE_PASSES: usize = 4;

/// A unit price without currency information.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct UnitPrice(
    #[serde(
        serialize_with = "rust_decimal::serde::float::serialize",
        deserialize_with = "deserialize_wire_amount"
    )]
    Decimal,
);

/// Snap an amount to the value it decodes as after being written as a JSON
/// number.
///
/// The decimal-to-float conversion is not always correctly rounded, so the
/// trip is repeated until it stops changing the value. Amounts at the very
/// edge of the decimal range, whose float form no longer parses, are kept.
fn wire_amount(amount: Decimal) -> Decimal {
    let mut current = amount;
    for _ in 0..MAX_WIRE_PASSES {
        let Some(next) = current
            .to_f64()
            .and_then(|float| Decimal::from_str(&float.to_string()).ok())
        else {
            return current;
        };
        if next == current {
            return current;
        }
        current = next;
    }
    current
}

fn deserialize_wire_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    rust_decimal::serde::float::deserialize(deserializer).map(wire_amount)
}

impl UnitPrice {
    /// A price of zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new unit price.
    ///
    /// Precision beyond what an `f64` carries is dropped, e.g.
    /// `19.999999999999999999` becomes `20`.
    #[must_use]
    pub fn new(amount: Decimal) -> Self {
        Self(wire_amount(amount))
    }

    /// Create a price from an amount in hundredths (e.g., cents).
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self::new(Decimal::new(cents, 2))
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units of this item.
    ///
    /// Negative quantities yield a negative line total; the cart never clamps
    /// on its own. Saturates at [`Decimal::MAX`] / [`Decimal::MIN`].
    #[must_use]
    pub fn times(self, quantity: i64) -> Decimal {
        self.0.saturating_mul(Decimal::from(quantity))
    }
}

impl From<Decimal> for UnitPrice {
    fn from(amount: Decimal) -> Self {
        Self::new(amount)
    }
}

impl FromStr for UnitPrice {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Self::new)
    }
}

impl fmt::Display for UnitPrice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
