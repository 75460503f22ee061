// Parsing of the semi-structured status text coming from the external
// order-management system. The free text embeds a small state machine
// ("Agendado Dia DD/MM/YYYY HH:MM", "Concluído"); all pattern matching is
// isolated here so the engine switches on a closed tag set.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::imports::CertificateKind;

/// Completion literal used by the external system.
const COMPLETED_LITERAL: &str = "Concluído";
/// Substring that marks a scheduling directive.
const SCHEDULED_MARKER: &str = "Agendado";

/// Recognized order-status tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatusTag {
    /// Status equals the completion literal exactly.
    Completed,
    /// Status carries a parseable scheduling directive.
    Scheduled(NaiveDateTime),
    /// Status mentions scheduling but the date fragment is absent or
    /// malformed. Tolerated: no schedule is created, no error raised.
    ScheduledUnparsed,
    /// Anything else (pending, cancelled, unknown).
    Other,
}

fn schedule_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Agendado Dia (\d{2}/\d{2}/\d{4}) (\d{2}:\d{2})")
            .expect("schedule regex is valid")
    })
}

fn certificate_kind_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)A([13])").expect("certificate kind regex is valid"))
}

/// Classify the raw status text into a status tag.
pub fn parse_status(raw: &str) -> OrderStatusTag {
    let trimmed = raw.trim();
    if trimmed == COMPLETED_LITERAL {
        return OrderStatusTag::Completed;
    }
    if trimmed.contains(SCHEDULED_MARKER) {
        if let Some(caps) = schedule_regex().captures(trimmed) {
            let composed = format!("{} {}", &caps[1], &caps[2]);
            // The regex only checks digit shape; 32/13/2025 still fails here.
            if let Ok(dt) = NaiveDateTime::parse_from_str(&composed, "%d/%m/%Y %H:%M") {
                return OrderStatusTag::Scheduled(dt);
            }
        }
        return OrderStatusTag::ScheduledUnparsed;
    }
    OrderStatusTag::Other
}

/// Extract the certificate type from the selected product name
/// (case-insensitive `A1`/`A3`), defaulting to A1.
pub fn certificate_kind_from_product(product_name: &str) -> CertificateKind {
    match certificate_kind_regex()
        .captures(product_name)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
    {
        Some("3") => CertificateKind::A3,
        _ => CertificateKind::A1,
    }
}

/// Parse the validity duration in years from free text such as `"2 anos"`.
/// Unparseable input defaults to one year; so does zero, which would break
/// the `valid_until > base_date` invariant, and anything past a century,
/// which is upstream noise.
pub fn validity_years(validity: &str) -> u32 {
    let digits: String = validity
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits
        .parse::<u32>()
        .ok()
        .filter(|years| (1..=100).contains(years))
        .unwrap_or(1)
}

/// Certificate expiry: `base_date` plus the given number of years.
/// Feb 29 bases land on Feb 28 in non-leap target years.
pub fn valid_until(base_date: NaiveDate, years: u32) -> NaiveDate {
    base_date
        .checked_add_months(chrono::Months::new(years * 12))
        .unwrap_or(base_date)
}
