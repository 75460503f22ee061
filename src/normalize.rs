// Normalization utilities for values coming from the external order system
// Currency strings are locale formatted (pt-BR) and dates arrive as
// "DD/MM/YYYY HH:MM" text; everything is normalized once at the boundary.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

/// Parse a locale-formatted currency string into a canonical `Decimal`.
///
/// This function is total: it never fails and invalid input yields zero.
///
/// # Rules
/// - `R$` prefix and whitespace are stripped
/// - If both `,` and `.` appear, `.` is a thousands separator (removed)
///   and `,` is the decimal separator
/// - If only `,` appears, it is the decimal separator
/// - Any remaining non-digit/non-dot/non-minus characters are stripped
/// - Anything that still does not parse yields zero
pub fn parse_currency(input: &str) -> Decimal {
    let mut s = input.trim().replace("R$", "");
    s.retain(|c| !c.is_whitespace());

    let has_comma = s.contains(',');
    let has_dot = s.contains('.');
    if has_comma && has_dot {
        s = s.replace('.', "").replace(',', ".");
    } else if has_comma {
        s = s.replace(',', ".");
    }

    s.retain(|c| c.is_ascii_digit() || c == '.' || c == '-');

    Decimal::from_str(&s).unwrap_or(Decimal::ZERO)
}

/// Format a decimal value as a pt-BR currency string (`R$ 1.234,56`).
///
/// Round-trip law: `parse_currency(&format_brl(x)) == x` for values with
/// at most two decimal digits.
pub fn format_brl(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let digits = format!("{:.2}", rounded.abs());
    let (int_part, frac_part) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(c);
    }
    let int_grouped: String = grouped.chars().rev().collect();

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{}R$ {},{}", sign, int_grouped, frac_part)
}

/// Money field as it arrives from the external order payload: sometimes a
/// JSON number, sometimes a formatted string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawMoney {
    Number(f64),
    Text(String),
}

impl RawMoney {
    /// Normalize to a canonical `Decimal`, defaulting anything unusable to zero.
    pub fn to_decimal(&self) -> Decimal {
        match self {
            RawMoney::Number(n) if n.is_finite() => {
                Decimal::try_from(*n).unwrap_or(Decimal::ZERO)
            }
            RawMoney::Number(_) => Decimal::ZERO,
            RawMoney::Text(t) => parse_currency(t),
        }
    }
}

/// Parse an external payment-history timestamp (`DD/MM/YYYY HH:MM`).
/// A bare date without the time portion is accepted and sorts at midnight.
pub fn parse_payment_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%d/%m/%Y %H:%M") {
        return Some(dt);
    }
    let date_part = trimmed.split(' ').next().unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, "%d/%m/%Y")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// The date portion of the most recent payment-history timestamp.
/// Entries that do not parse are ignored.
pub fn latest_activity_date<'a, I>(dates: I) -> Option<NaiveDate>
where
    I: IntoIterator<Item = &'a str>,
{
    dates
        .into_iter()
        .filter_map(parse_payment_timestamp)
        .max()
        .map(|dt| dt.date())
}

/// An ISO timestamp at noon UTC for the given date.
/// Noon avoids the date shifting when rendered in nearby timezones.
pub fn noon_utc(date: NaiveDate) -> DateTime<Utc> {
    let noon = date.and_hms_opt(12, 0, 0).expect("12:00:00 is a valid time");
    Utc.from_utc_datetime(&noon)
}
