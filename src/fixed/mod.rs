//! Module `fixed` implement a fixed-point decimal number over `u128`.
//!
//! [Fixed64] carry exactly [DECIMAL_PLACES] fractional decimal digits in
//! its raw scalar, the rendered value of a raw scalar `v` is `v / 10^10`.
//! The whole-number range of the type equals an unsigned 64-bit integer,
//! operations producing a raw scalar above [MAX_VALUE] fail with
//! [Error::ExceedMax] instead of silently wrapping.
//!
//! Conversions to plain integers come in three flavours, no-precision-loss,
//! truncating and rounding-up. Multiplication and division come in
//! truncating and rounding-up flavours, all of them checked against the
//! domain ceiling.

use crate::{Error, Result};

/// Number of fractional decimal digits carried by [Fixed64].
pub const DECIMAL_PLACES: u32 = 10;

/// Domain ceiling for the raw scalar of any operation result.
pub const MAX_VALUE: u128 = u64::MAX as u128;

/// Powers of ten from `10^0` to `10^20`, exponents beyond the table
/// fail with [Error::ExceedMaxExp].
const POW10: [u128; 21] = [
    1,
    10,
    100,
    1_000,
    10_000,
    100_000,
    1_000_000,
    10_000_000,
    100_000_000,
    1_000_000_000,
    10_000_000_000,
    100_000_000_000,
    1_000_000_000_000,
    10_000_000_000_000,
    100_000_000_000_000,
    1_000_000_000_000_000,
    10_000_000_000_000_000,
    100_000_000_000_000_000,
    1_000_000_000_000_000_000,
    10_000_000_000_000_000_000,
    100_000_000_000_000_000_000,
];

// Raw scalar for the rendered value 1.
const BASE: u128 = POW10[DECIMAL_PLACES as usize];

/// Return `10^exp`, for exponents within the precomputed table.
pub fn exp10(exp: u32) -> Result<u128> {
    match POW10.get(exp as usize) {
        Some(pow) => Ok(*pow),
        None => err_at!(ExceedMaxExp, msg: "exp10({})", exp),
    }
}

// Conversion policy when fractional digits fall off the requested width.
#[derive(Copy, Clone)]
enum Round {
    Truncate,
    RoundUp,
    NoPrecisionLoss,
}

/// Fixed-point decimal, 10 fractional digits over an `u64` whole range.
///
/// Ordering and equality compare the raw scalars, which is the same as
/// comparing the rendered values.
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Ord, PartialOrd)]
pub struct Fixed64 {
    raw: u128,
}

impl Fixed64 {
    /// Rendered value 0.
    pub const ZERO: Fixed64 = Fixed64 { raw: 0 };
    /// Rendered value 1.
    pub const ONE: Fixed64 = Fixed64 { raw: BASE };
    /// Rendered value 0.5.
    pub const HALF: Fixed64 = Fixed64 { raw: BASE / 2 };
    /// Smallest value in the domain, same as [Fixed64::ZERO].
    pub const MIN: Fixed64 = Fixed64 { raw: 0 };
    /// Sentinel holding the largest raw scalar. Lies beyond the domain
    /// ceiling, any arithmetic on it shall fail with [Error::ExceedMax].
    pub const MAX: Fixed64 = Fixed64 { raw: u128::MAX };

    /// Wrap a raw scalar without conversion, `new_u64(12345)` is the
    /// rendered value `0.0000012345`.
    pub fn new_u64(raw: u64) -> Fixed64 {
        Fixed64 { raw: raw as u128 }
    }

    /// Wrap a raw scalar without conversion.
    pub fn new_u128(raw: u128) -> Fixed64 {
        Fixed64 { raw }
    }

    /// Return the underlying raw scalar.
    #[inline]
    pub fn raw(&self) -> u128 {
        self.raw
    }

    /// Build the rendered value `value * 10^-decimals`, for up to
    /// [DECIMAL_PLACES] decimals.
    pub fn from_u64(value: u64, decimals: u32) -> Result<Fixed64> {
        Fixed64::from_u128(value as u128, decimals)
    }

    /// Build the rendered value `value * 10^-decimals`, for up to
    /// [DECIMAL_PLACES] decimals. Fail with [Error::ExceedMax] when the
    /// value does not fit the domain.
    pub fn from_u128(value: u128, decimals: u32) -> Result<Fixed64> {
        if decimals > DECIMAL_PLACES {
            return err_at!(ExceedMaxDecimals, msg: "{} decimals", decimals);
        }
        let scale = exp10(decimals)?;
        let step = exp10(DECIMAL_PLACES - decimals)?;
        let (int, frac) = (value / scale, value % scale);
        // frac * step < 10^10, only the whole part can overflow.
        let raw = match int.checked_mul(BASE) {
            Some(whole) => match whole.checked_add(frac * step) {
                Some(raw) => raw,
                None => return err_at!(ExceedMax, msg: "from_u128 {}/{}", value, decimals),
            },
            None => return err_at!(ExceedMax, msg: "from_u128 {}/{}", value, decimals),
        };
        if raw > MAX_VALUE {
            return err_at!(ExceedMax, msg: "from_u128 {}/{}", value, decimals);
        }
        Ok(Fixed64 { raw })
    }

    fn to_scalar(&self, decimals: u32, round: Round) -> Result<u128> {
        if decimals > DECIMAL_PLACES {
            return err_at!(ExceedMaxDecimals, msg: "{} decimals", decimals);
        }
        let step = exp10(DECIMAL_PLACES - decimals)?;
        let (int, rem) = (self.raw / BASE, self.raw % BASE);
        let frac = rem / step;
        let loss = (frac * step) < rem;
        let out = match int.checked_mul(exp10(decimals)?) {
            Some(whole) => match whole.checked_add(frac) {
                Some(out) => out,
                None => return err_at!(ExceedMax, msg: "to_scalar {}/{}", self.raw, decimals),
            },
            None => return err_at!(ExceedMax, msg: "to_scalar {}/{}", self.raw, decimals),
        };
        match round {
            Round::Truncate => Ok(out),
            Round::RoundUp if loss => match out.checked_add(1) {
                Some(out) => Ok(out),
                None => err_at!(ExceedMax, msg: "to_scalar {}/{}", self.raw, decimals),
            },
            Round::RoundUp => Ok(out),
            Round::NoPrecisionLoss if loss => {
                err_at!(PrecisionLoss, msg: "{} at {} decimals", self.raw, decimals)
            }
            Round::NoPrecisionLoss => Ok(out),
        }
    }

    /// Convert out to an integer scaled by `10^decimals`, failing with
    /// [Error::PrecisionLoss] when digits would fall off.
    pub fn to_u128(&self, decimals: u32) -> Result<u128> {
        self.to_scalar(decimals, Round::NoPrecisionLoss)
    }

    /// Convert out to an integer scaled by `10^decimals`, dropping the
    /// digits that fall off.
    pub fn to_u128_trunc(&self, decimals: u32) -> Result<u128> {
        self.to_scalar(decimals, Round::Truncate)
    }

    /// Convert out to an integer scaled by `10^decimals`, rounding up
    /// when digits fall off.
    pub fn to_u128_round_up(&self, decimals: u32) -> Result<u128> {
        self.to_scalar(decimals, Round::RoundUp)
    }

    /// Narrowing variant of [Fixed64::to_u128].
    pub fn to_u64(&self, decimals: u32) -> Result<u64> {
        use std::convert::TryFrom;

        let out = self.to_scalar(decimals, Round::NoPrecisionLoss)?;
        err_at!(ExceedMax, u64::try_from(out), "to_u64 {}", out)
    }

    /// Narrowing variant of [Fixed64::to_u128_trunc].
    pub fn to_u64_trunc(&self, decimals: u32) -> Result<u64> {
        use std::convert::TryFrom;

        let out = self.to_scalar(decimals, Round::Truncate)?;
        err_at!(ExceedMax, u64::try_from(out), "to_u64_trunc {}", out)
    }

    /// Narrowing variant of [Fixed64::to_u128_round_up].
    pub fn to_u64_round_up(&self, decimals: u32) -> Result<u64> {
        use std::convert::TryFrom;

        let out = self.to_scalar(decimals, Round::RoundUp)?;
        err_at!(ExceedMax, u64::try_from(out), "to_u64_round_up {}", out)
    }

    /// Checked addition.
    pub fn add(&self, other: Fixed64) -> Result<Fixed64> {
        match self.raw.checked_add(other.raw) {
            Some(raw) if raw <= MAX_VALUE => Ok(Fixed64 { raw }),
            Some(raw) => err_at!(ExceedMax, msg: "add {}", raw),
            None => err_at!(ExceedMax, msg: "add {} {}", self.raw, other.raw),
        }
    }

    /// Checked subtraction.
    pub fn sub(&self, other: Fixed64) -> Result<Fixed64> {
        match self.raw.checked_sub(other.raw) {
            Some(raw) if raw <= MAX_VALUE => Ok(Fixed64 { raw }),
            Some(raw) => err_at!(ExceedMax, msg: "sub {}", raw),
            None => err_at!(ExceedMax, msg: "sub {} {}", self.raw, other.raw),
        }
    }

    /// Multiply, truncating the digits below `10^-10`.
    pub fn mul_trunc(&self, other: Fixed64) -> Result<Fixed64> {
        self.do_mul(other, false)
    }

    /// Multiply, rounding up when digits fall below `10^-10`.
    pub fn mul_round_up(&self, other: Fixed64) -> Result<Fixed64> {
        self.do_mul(other, true)
    }

    fn do_mul(&self, other: Fixed64, round_up: bool) -> Result<Fixed64> {
        // a 128-bit overflow in the product implies the result lies far
        // beyond the domain ceiling.
        let prod = match self.raw.checked_mul(other.raw) {
            Some(prod) => prod,
            None => return err_at!(ExceedMax, msg: "mul {} {}", self.raw, other.raw),
        };
        let mut raw = prod / BASE;
        if round_up && (raw * BASE) < prod {
            raw += 1;
        }
        if raw > MAX_VALUE {
            return err_at!(ExceedMax, msg: "mul {} {}", self.raw, other.raw);
        }
        Ok(Fixed64 { raw })
    }

    /// Divide, truncating the digits below `10^-10`.
    pub fn div_trunc(&self, other: Fixed64) -> Result<Fixed64> {
        self.do_div(other, false)
    }

    /// Divide, rounding up when digits fall below `10^-10`.
    pub fn div_round_up(&self, other: Fixed64) -> Result<Fixed64> {
        self.do_div(other, true)
    }

    fn do_div(&self, other: Fixed64, round_up: bool) -> Result<Fixed64> {
        if other.raw == 0 {
            return err_at!(Fatal, msg: "divide by zero");
        }
        let num = match self.raw.checked_mul(BASE) {
            Some(num) => num,
            None => return err_at!(ExceedMax, msg: "div {} {}", self.raw, other.raw),
        };
        let mut raw = num / other.raw;
        if round_up && (raw * other.raw) < num {
            raw = match raw.checked_add(1) {
                Some(raw) => raw,
                None => return err_at!(ExceedMax, msg: "div {} {}", self.raw, other.raw),
            };
        }
        if raw > MAX_VALUE {
            return err_at!(ExceedMax, msg: "div {} {}", self.raw, other.raw);
        }
        Ok(Fixed64 { raw })
    }

    /// Truncate the value to `decimals` fractional digits.
    pub fn trunc_to_decimals(&self, decimals: u32) -> Result<Fixed64> {
        Fixed64::from_u128(self.to_scalar(decimals, Round::Truncate)?, decimals)
    }

    /// Round the value up to `decimals` fractional digits.
    pub fn round_up_to_decimals(&self, decimals: u32) -> Result<Fixed64> {
        Fixed64::from_u128(self.to_scalar(decimals, Round::RoundUp)?, decimals)
    }
}
