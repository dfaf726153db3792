//! Display formatting for amounts, percentages, areas and dates.

use chrono::NaiveDate;

/// Placeholder printed wherever a value is absent.
pub const NOT_AVAILABLE: &str = "N/A";

/// Two decimals with thousands separators: `1234567.5` → `1,234,567.50`.
pub fn format_money(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((&fixed, "00"));
    let grouped = group_thousands(int_part);
    // -0.004 rounds to 0.00; don't print "-0.00".
    if value < 0.0 && fixed != "0.00" {
        format!("-{grouped}.{frac_part}")
    } else {
        format!("{grouped}.{frac_part}")
    }
}

/// At most two decimals, trailing zeros trimmed: `4.0` → `4%`, `2.50` → `2.5%`.
pub fn format_percent(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if value < 0.0 && trimmed != "0" {
        format!("-{trimmed}%")
    } else {
        format!("{trimmed}%")
    }
}

pub fn format_area(sq_ft: f64) -> String {
    format!("{} sq ft", format_money(sq_ft))
}

/// `dd/mm/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// `31 January 2025`.
pub fn format_long_date(date: NaiveDate) -> String {
    date.format("%-d %B %Y").to_string()
}

/// Parse the `YYYY-MM-DD` form dates are serialized with.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

// ---------------------------------------------------------------------------
// Amount in words
// ---------------------------------------------------------------------------

const ONES: [&str; 20] = [
    "Zero",
    "One",
    "Two",
    "Three",
    "Four",
    "Five",
    "Six",
    "Seven",
    "Eight",
    "Nine",
    "Ten",
    "Eleven",
    "Twelve",
    "Thirteen",
    "Fourteen",
    "Fifteen",
    "Sixteen",
    "Seventeen",
    "Eighteen",
    "Nineteen",
];

const TENS: [&str; 10] = [
    "", "", "Twenty", "Thirty", "Forty", "Fifty", "Sixty", "Seventy", "Eighty", "Ninety",
];

const SCALES: [(u64, &str); 4] = [
    (1_000_000_000_000, "Trillion"),
    (1_000_000_000, "Billion"),
    (1_000_000, "Million"),
    (1_000, "Thousand"),
];

/// English cardinal words for an amount, with the fractional part as
/// hundredths: `1250000.5` → `One Million Two Hundred Fifty Thousand and 50/100`.
pub fn amount_in_words(value: f64) -> String {
    let cents_total = (value.abs() * 100.0).round() as u64;
    let whole = cents_total / 100;
    let cents = cents_total % 100;

    let mut words = integer_words(whole);
    if value < 0.0 && cents_total > 0 {
        words = format!("Minus {words}");
    }
    if cents > 0 {
        words.push_str(&format!(" and {cents:02}/100"));
    }
    words
}

fn integer_words(mut n: u64) -> String {
    if n == 0 {
        return ONES[0].to_string();
    }
    let mut parts: Vec<String> = Vec::new();
    for (scale, name) in SCALES {
        if n >= scale {
            // Only the largest scale can carry a group of a thousand or more.
            let group = n / scale;
            let lead = if group >= 1000 {
                integer_words(group)
            } else {
                below_thousand(group)
            };
            parts.push(format!("{lead} {name}"));
            n %= scale;
        }
    }
    if n > 0 {
        parts.push(below_thousand(n));
    }
    parts.join(" ")
}

fn below_thousand(n: u64) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let hundreds = n / 100;
    let rest = n % 100;
    if hundreds > 0 {
        parts.push(ONES[hundreds as usize]);
        parts.push("Hundred");
    }
    if rest >= 20 {
        parts.push(TENS[(rest / 10) as usize]);
        if rest % 10 > 0 {
            parts.push(ONES[(rest % 10) as usize]);
        }
    } else if rest > 0 {
        parts.push(ONES[rest as usize]);
    }
    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_groups_and_rounds() {
        assert_eq!(format_money(1234567.5), "1,234,567.50");
        assert_eq!(format_money(999.999), "1,000.00");
        assert_eq!(format_money(0.0), "0.00");
        assert_eq!(format_money(-45000.0), "-45,000.00");
        assert_eq!(format_money(-0.001), "0.00");
    }

    #[test]
    fn percent_trims_zeros() {
        assert_eq!(format_percent(4.0), "4%");
        assert_eq!(format_percent(2.5), "2.5%");
        assert_eq!(format_percent(33.333), "33.33%");
        assert_eq!(format_percent(-0.001), "0%");
        assert_eq!(format_percent(-1.5), "-1.5%");
    }

    #[test]
    fn dates() {
        let d = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        assert_eq!(format_date(d), "31/01/2025");
        assert_eq!(format_long_date(d), "31 January 2025");
        assert_eq!(parse_date("2025-01-31"), Some(d));
        assert_eq!(parse_date("31/01/2025"), None);
    }

    #[test]
    fn words() {
        assert_eq!(
            amount_in_words(1_250_000.0),
            "One Million Two Hundred Fifty Thousand"
        );
        assert_eq!(
            amount_in_words(1_250_000.5),
            "One Million Two Hundred Fifty Thousand and 50/100"
        );
        assert_eq!(amount_in_words(0.0), "Zero");
        assert_eq!(amount_in_words(115.0), "One Hundred Fifteen");
        assert_eq!(
            amount_in_words(2_000_019.0),
            "Two Million Nineteen"
        );
    }

    #[test]
    fn words_beyond_trillions_nest_the_leading_group() {
        assert_eq!(amount_in_words(5e15), "Five Thousand Trillion");
        assert_eq!(
            amount_in_words(1_002_000_000_000_003.0),
            "One Thousand Two Trillion Three"
        );
        assert_eq!(amount_in_words(1e17), "One Hundred Thousand Trillion");
        // Saturates instead of overflowing.
        assert!(amount_in_words(f64::MAX).contains("Trillion"));
    }
}
