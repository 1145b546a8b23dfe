//! Value objects for catalog display and price input

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category name shown for goods without a category.
pub const DEFAULT_CATEGORY: &str = "etc";

const STORE_NAME_DISPLAY_CHARS: usize = 7;

/// Comma-grouped rendering of an integer price, e.g. `1500000` -> `"1,500,000"`.
pub fn format_price(price: i64) -> String {
    let digits = price.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if price < 0 { grouped.push('-'); }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 { grouped.push(','); }
        grouped.push(ch);
    }
    grouped
}

/// Rounded-up mean of star ratings. A zero star total yields 0, which also
/// covers goods with no reviews.
pub fn star_average(star_total: f64, review_count: i64) -> i64 {
    if star_total == 0.0 || review_count <= 0 { return 0; }
    (star_total / review_count as f64).ceil() as i64
}

/// Store name as shown on listing cards.
pub fn truncate_store_name(name: &str) -> String {
    if name.chars().count() > STORE_NAME_DISPLAY_CHARS {
        let head: String = name.chars().take(STORE_NAME_DISPLAY_CHARS).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}

/// First two words of a store address.
pub fn short_address(address: &str) -> String {
    address.split(' ').take(2).collect::<Vec<_>>().join(" ")
}

/// Price as submitted by store admin forms: either a plain number or the
/// display string (`"120000Kip"`, `"1,500,000"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Amount(i64),
    Text(String),
}

impl PriceInput {
    pub fn normalize(&self) -> Result<i64, PriceError> {
        let amount = match self {
            Self::Amount(v) => *v,
            Self::Text(raw) => {
                let trimmed = raw.trim();
                let trimmed = trimmed.strip_suffix("Kip").unwrap_or(trimmed).trim_end();
                let digits: String = trimmed.chars().filter(|c| *c != ',').collect();
                digits.parse::<i64>().map_err(|_| PriceError::Unparseable(raw.clone()))?
            }
        };
        if amount < 0 { return Err(PriceError::Negative(amount)); }
        Ok(amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum PriceError { Unparseable(String), Negative(i64) }
impl std::error::Error for PriceError {}
impl fmt::Display for PriceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable(raw) => write!(f, "A valid integer is required, got {raw:?}"),
            Self::Negative(v) => write!(f, "Price must not be negative, got {v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(1_500_000), "1,500,000");
        assert_eq!(format_price(0), "0");
        assert_eq!(format_price(999), "999");
        assert_eq!(format_price(1000), "1,000");
        assert_eq!(format_price(120_000), "120,000");
    }

    #[test]
    fn test_star_average() {
        assert_eq!(star_average(0.0, 0), 0);
        assert_eq!(star_average(9.0, 2), 5);
        assert_eq!(star_average(7.0, 2), 4);
        assert_eq!(star_average(3.0, 1), 3);
    }

    #[test]
    fn test_store_name_truncation() {
        assert_eq!(truncate_store_name("Lao Mart"), "Lao Mar...");
        assert_eq!(truncate_store_name("Bakery"), "Bakery");
        assert_eq!(truncate_store_name("Seven77"), "Seven77");
    }

    #[test]
    fn test_short_address() {
        assert_eq!(short_address("Vientiane Chanthabouly Ban Haysok"), "Vientiane Chanthabouly");
        assert_eq!(short_address("Pakse"), "Pakse");
    }

    #[test]
    fn test_price_input_with_currency_suffix() {
        assert_eq!(PriceInput::Text("120000Kip".into()).normalize(), Ok(120_000));
        assert_eq!(PriceInput::Text("1,500,000Kip".into()).normalize(), Ok(1_500_000));
        assert_eq!(PriceInput::Text("35000".into()).normalize(), Ok(35_000));
        assert_eq!(PriceInput::Amount(42).normalize(), Ok(42));
        assert!(PriceInput::Text("cheap".into()).normalize().is_err());
        assert_eq!(PriceInput::Amount(-1).normalize(), Err(PriceError::Negative(-1)));
    }

    #[test]
    fn test_price_input_deserializes_number_or_string() {
        let n: PriceInput = serde_json::from_str("5000").unwrap();
        let s: PriceInput = serde_json::from_str("\"5000Kip\"").unwrap();
        assert_eq!(n, PriceInput::Amount(5000));
        assert_eq!(s.normalize(), Ok(5000));
    }
}
