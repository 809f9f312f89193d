//! Fee arithmetic used around Lightning payments.

use crate::error::{Error, Result};

pub const DEFAULT_FEE_RESERVE_MIN_MSAT: u64 = 2000;
pub const DEFAULT_FEE_RESERVE_PERCENT: f64 = 1.0;

/// Lightning fee reserve in msat: `max(fee_min, floor(amount * percent / 100))`.
pub fn fee_reserve(amount_msat: u64, fee_min_msat: u64, fee_percent: f64) -> u64 {
    let proportional = (amount_msat as f64 * fee_percent / 100.0) as u64;
    fee_min_msat.max(proportional)
}

/// [`fee_reserve`] with the default minimum and percentage.
pub fn default_fee_reserve(amount_msat: u64) -> u64 {
    fee_reserve(
        amount_msat,
        DEFAULT_FEE_RESERVE_MIN_MSAT,
        DEFAULT_FEE_RESERVE_PERCENT,
    )
}

/// Blank outputs a wallet attaches to a melt so overpaid fees can be
/// returned: `max(ceil(log2(fee_reserve_sat)), 1)`, or 0 without a reserve.
pub fn calculate_number_of_blank_outputs(fee_reserve_sat: i64) -> Result<u32> {
    if fee_reserve_sat < 0 {
        return Err(Error::NegativeFeeReserve(fee_reserve_sat));
    }
    if fee_reserve_sat == 0 {
        return Ok(0);
    }
    // ceil(log2(x)) == bit length of x - 1
    let ceil_log2 = u64::BITS - (fee_reserve_sat as u64 - 1).leading_zeros();
    Ok(ceil_log2.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0 => 0; "no reserve")]
    #[test_case(1 => 1; "one")]
    #[test_case(2 => 1; "two")]
    #[test_case(3 => 2; "three")]
    #[test_case(1000 => 10; "thousand")]
    #[test_case(1024 => 10; "power of two")]
    #[test_case(1025 => 11; "just above power of two")]
    #[test_case(i64::MAX => 63; "max")]
    fn blank_outputs(fee_reserve_sat: i64) -> u32 {
        calculate_number_of_blank_outputs(fee_reserve_sat).unwrap()
    }

    #[test]
    fn negative_reserve_is_rejected() {
        assert!(matches!(
            calculate_number_of_blank_outputs(-1),
            Err(Error::NegativeFeeReserve(-1))
        ));
    }

    #[test_case(0 => 2000; "minimum applies")]
    #[test_case(100_000 => 2000; "one percent below minimum")]
    #[test_case(1_000_000 => 10_000; "one percent")]
    #[test_case(1_234_567 => 12_345; "rounds down")]
    fn default_reserve(amount_msat: u64) -> u64 {
        default_fee_reserve(amount_msat)
    }

    #[test]
    fn explicit_parameters() {
        assert_eq!(fee_reserve(1_000_000, 0, 0.5), 5000);
        assert_eq!(fee_reserve(1_000_000, 6000, 0.5), 6000);
        assert_eq!(fee_reserve(10, 0, 0.0), 0);
    }
}
