//! Fixed-point amount utilities.
//!
//! ## Overview
//!
//! Bid amounts, refunds and payouts are plain `u64` values in indivisible
//! base units. For display and configuration, a base unit is interpreted as
//! 10^-8 of a whole coin, so `100_000_000` reads as `"1"`.
//!
//! ## Examples
//!
//! ```
//! use auction_kernel::types::amount::{to_fixed, from_fixed};
//!
//! let bid = to_fixed("0.2").unwrap();
//! assert_eq!(bid, 20_000_000);
//! assert_eq!(from_fixed(bid), "0.20000000");
//! ```

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Amount in indivisible base units.
pub type Amount = u64;

/// Base units per whole coin: 10^8
pub const SCALE: u64 = 100_000_000;

// ============================================================================
// Conversion Functions
// ============================================================================

/// Convert a decimal string to base units
///
/// Returns `None` if the string is not a number, is negative, or does not
/// fit in a `u64` after scaling. Digits beyond 8 decimal places are rounded.
///
/// # Example
///
/// ```
/// use auction_kernel::types::amount::to_fixed;
///
/// assert_eq!(to_fixed("1.0"), Some(100_000_000));
/// assert_eq!(to_fixed("0.00000001"), Some(1));
/// assert_eq!(to_fixed("-1"), None);
/// ```
pub fn to_fixed(s: &str) -> Option<Amount> {
    let decimal = Decimal::from_str(s.trim()).ok()?;
    decimal_to_fixed(decimal)
}

/// Convert a Decimal to base units
pub fn decimal_to_fixed(d: Decimal) -> Option<Amount> {
    if d.is_sign_negative() {
        return None;
    }

    let scaled = d.checked_mul(Decimal::from(SCALE))?;
    scaled.round_dp(0).to_u64()
}

/// Convert base units to a Decimal
pub fn fixed_to_decimal(value: Amount) -> Decimal {
    Decimal::from(value) / Decimal::from(SCALE)
}

/// Format base units with all 8 decimal places
pub fn from_fixed(value: Amount) -> String {
    format!("{:.8}", fixed_to_decimal(value))
}

/// Format base units without trailing zeros
///
/// ```
/// use auction_kernel::types::amount::from_fixed_trimmed;
///
/// assert_eq!(from_fixed_trimmed(100_000_000), "1");
/// assert_eq!(from_fixed_trimmed(80_000_000), "0.8");
/// ```
pub fn from_fixed_trimmed(value: Amount) -> String {
    format!("{}", fixed_to_decimal(value).normalize())
}
