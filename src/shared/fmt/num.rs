//! Number formatting utilities for human-readable display.
//!
//! Every function produces the exact text a dashboard label shows.

/// Inserts thousands separators into an already formatted decimal string.
pub fn group_thousands(formatted: &str) -> String {
    let (sign, unsigned) = match formatted.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", formatted),
    };
    let mut parts = unsigned.splitn(2, '.');
    let integer = parts.next().unwrap_or_default();
    let fraction = parts.next();

    let grouped = integer
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|c| std::str::from_utf8(c).unwrap_or_default())
        .collect::<Vec<_>>()
        .join(",");

    match fraction {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Fixed decimals with thousands separators (`12,345.60`).
pub fn with_thousands(amount: f64, decimals: usize) -> String {
    group_thousands(&format!("{:.1$}", amount, decimals))
}

/// Price label: two decimals, no separators (`67012.44`).
pub fn price(amount: f64) -> String {
    format!("{:.2}", amount)
}

/// Floating price delta, `+` only for strictly positive values (`+12.34`, `-0.50`).
pub fn signed_delta(delta: f64) -> String {
    if delta > 0.0 {
        format!("+{:.2}", delta)
    } else {
        format!("{:.2}", delta)
    }
}

/// Percentage change, `+` for zero and above (`+1.23%`).
pub fn percent_change(percent: f64) -> String {
    if percent >= 0.0 {
        format!("+{:.2}%", percent)
    } else {
        format!("{:.2}%", percent)
    }
}

/// USD amount in billions (`$1.2B`).
pub fn billions_usd(amount: f64) -> String {
    format!("${:.1}B", amount / 1e9)
}

/// One-decimal percentage (`60.5%`).
pub fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

/// Coin supply in millions (`19.8M BTC`).
pub fn millions_btc(supply: f64) -> String {
    format!("{:.1}M BTC", supply / 1e6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands_integers() {
        assert_eq!(group_thousands("0"), "0");
        assert_eq!(group_thousands("123"), "123");
        assert_eq!(group_thousands("1000"), "1,000");
        assert_eq!(group_thousands("1234567"), "1,234,567");
    }

    #[test]
    fn test_group_thousands_keeps_fraction_and_sign() {
        assert_eq!(group_thousands("1234.50"), "1,234.50");
        assert_eq!(group_thousands("-1234567.89"), "-1,234,567.89");
        assert_eq!(group_thousands("-12.00"), "-12.00");
    }

    #[test]
    fn test_with_thousands_keeps_trailing_zeros() {
        assert_eq!(with_thousands(58677.2, 2), "58,677.20");
        assert_eq!(with_thousands(1234567.0, 0), "1,234,567");
    }

    #[test]
    fn test_price_two_decimals() {
        assert_eq!(price(67012.444), "67012.44");
        assert_eq!(price(5.0), "5.00");
    }

    #[test]
    fn test_signed_delta() {
        assert_eq!(signed_delta(12.345), "+12.35");
        assert_eq!(signed_delta(-0.5), "-0.50");
        assert_eq!(signed_delta(0.0), "0.00");
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(1.234), "+1.23%");
        assert_eq!(percent_change(0.0), "+0.00%");
        assert_eq!(percent_change(-2.5), "-2.50%");
    }

    #[test]
    fn test_stat_labels() {
        assert_eq!(billions_usd(1_234_000_000_000.0), "$1234.0B");
        assert_eq!(billions_usd(25_600_000_000.0), "$25.6B");
        assert_eq!(percent(60.5), "60.5%");
        assert_eq!(millions_btc(19_840_000.0), "19.8M BTC");
    }
}
