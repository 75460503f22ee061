use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::commissions::{CommissionError, CommissionStatus};

/// Derive the commission amount for a sale and a beneficiary percentage.
///
/// `amount = round2(base * percentage / 100)`. The percentage must lie in
/// `[0, 100]`. Pure — the derivation runs once when the commission is
/// created and is not re-triggered by later sale edits.
pub fn commission_amount(base: Decimal, percentage: Decimal) -> Result<Decimal, CommissionError> {
    if percentage < Decimal::ZERO || percentage > Decimal::from(100) {
        return Err(CommissionError::InvalidPercentage(percentage));
    }
    Ok((base * percentage / Decimal::from(100)).round_dp(2))
}

/// Transition rule for paying a commission: the payment date is mandatory.
pub fn mark_paid(
    paid_at: Option<NaiveDate>,
) -> Result<(CommissionStatus, NaiveDate), CommissionError> {
    match paid_at {
        Some(date) => Ok((CommissionStatus::Paid, date)),
        None => Err(CommissionError::MissingPaymentDate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_commission_amount_basic() {
        assert_eq!(commission_amount(dec!(1000), dec!(10)).unwrap(), dec!(100.00));
    }

    #[test]
    fn test_commission_amount_rounds_to_cents() {
        assert_eq!(commission_amount(dec!(333.33), dec!(10)).unwrap(), dec!(33.33));
        assert_eq!(commission_amount(dec!(199.99), dec!(7.5)).unwrap(), dec!(15.00));
    }

    #[test]
    fn test_commission_amount_bounds() {
        assert_eq!(commission_amount(dec!(1000), dec!(0)).unwrap(), dec!(0.00));
        assert_eq!(commission_amount(dec!(1000), dec!(100)).unwrap(), dec!(1000.00));
    }

    #[test]
    fn test_commission_amount_rejects_out_of_range() {
        assert!(matches!(
            commission_amount(dec!(1000), dec!(150)),
            Err(CommissionError::InvalidPercentage(_))
        ));
        assert!(matches!(
            commission_amount(dec!(1000), dec!(-1)),
            Err(CommissionError::InvalidPercentage(_))
        ));
    }

    #[test]
    fn test_mark_paid_requires_date() {
        assert!(matches!(
            mark_paid(None),
            Err(CommissionError::MissingPaymentDate)
        ));
    }

    #[test]
    fn test_mark_paid_with_date() {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(mark_paid(Some(date)).unwrap(), (CommissionStatus::Paid, date));
    }
}
