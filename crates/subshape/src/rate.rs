//! Rate conversion and display.
//!
//! tc reports HTB rates in bytes per second; the report shows them as
//! decimal bit rates the way they were provisioned.
//!
//! # Example
//!
//! ```
//! use subshape::rate;
//!
//! assert_eq!(rate::bytes_to_bits(125_000), 1_000_000);
//! assert_eq!(rate::format_rate(125_000), "1Mbit");
//! assert_eq!(rate::format_rate(0), "unlimited");
//! ```

/// Display text for a direction without a usable limit.
pub const UNLIMITED: &str = "unlimited";

const KBIT: i128 = 1_000;
const MBIT: i128 = 1_000_000;
const GBIT: i128 = 1_000_000_000;

/// Convert bytes per second to bits per second.
///
/// # Example
///
/// ```
/// use subshape::rate::bytes_to_bits;
///
/// assert_eq!(bytes_to_bits(125_000), 1_000_000); // 1 Mbit
/// assert_eq!(bytes_to_bits(1), 8);
/// ```
#[inline]
pub const fn bytes_to_bits(bps: i64) -> i64 {
    bps.saturating_mul(8)
}

/// Format a byte-per-second rate as a bit rate.
///
/// `Gbit` and `Mbit` keep up to two decimals, `Kbit` none; trailing
/// zeros are dropped. Non-positive rates are [`UNLIMITED`].
///
/// # Example
///
/// ```
/// use subshape::rate::format_rate;
///
/// assert_eq!(format_rate(62_500), "500Kbit");
/// assert_eq!(format_rate(156_250), "1.25Mbit");
/// assert_eq!(format_rate(125_000_000), "1Gbit");
/// assert_eq!(format_rate(100), "800bit");
/// assert_eq!(format_rate(-5), "unlimited");
/// ```
pub fn format_rate(bytes_per_sec: i64) -> String {
    if bytes_per_sec <= 0 {
        return UNLIMITED.to_string();
    }

    let bits = bytes_to_bits(bytes_per_sec);
    let wide = i128::from(bits);

    if wide >= GBIT {
        format!("{}Gbit", scaled(wide, GBIT, 2))
    } else if wide >= MBIT {
        format!("{}Mbit", scaled(wide, MBIT, 2))
    } else if wide >= KBIT {
        format!("{}Kbit", scaled(wide, KBIT, 0))
    } else {
        format!("{}bit", bits)
    }
}

/// `value / unit` rounded half up to `places` decimals, trailing zeros
/// dropped.
fn scaled(value: i128, unit: i128, places: u32) -> String {
    let step = 10i128.pow(places);
    let fixed = (value * step + unit / 2) / unit;
    let (whole, frac) = (fixed / step, fixed % step);
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = places as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bytes_to_bits() {
        assert_eq!(bytes_to_bits(0), 0);
        assert_eq!(bytes_to_bits(125), 1000);
        assert_eq!(bytes_to_bits(i64::MAX), i64::MAX);
    }

    #[test]
    fn test_format_half_rounds_up() {
        assert_eq!(format_rate(156_875), "1.26Mbit");
        assert_eq!(format_rate(125_625), "1.01Mbit");
        assert_eq!(format_rate(125_625_000), "1.01Gbit");
        assert_eq!(format_rate(1_312), "10Kbit");
        assert_eq!(format_rate(1_313), "11Kbit");
        assert_eq!(format_rate(2_500_000), "20Mbit");
    }

    #[test]
    fn test_format_boundaries() {
        assert_eq!(format_rate(125_000), "1Mbit");
        assert_eq!(format_rate(124_999), "1000Kbit");
        assert_eq!(format_rate(125), "1Kbit");
        assert_eq!(format_rate(124), "992bit");
        assert_eq!(format_rate(125_000_000), "1Gbit");
    }

    #[test]
    fn test_format_decimals() {
        assert_eq!(format_rate(187_500), "1.5Mbit");
        assert_eq!(format_rate(1_312_500), "10.5Mbit");
        assert_eq!(format_rate(157_000), "1.26Mbit");
        assert_eq!(format_rate(312_500_000), "2.5Gbit");
        assert_eq!(format_rate(1_563), "13Kbit");
    }

    #[test]
    fn test_format_unlimited() {
        assert_eq!(format_rate(0), "unlimited");
        assert_eq!(format_rate(-5), "unlimited");
    }
}
