//! Q18 operations with explicit directed rounding.

use crate::errors::{FixedPointError, FixedPointResult};
use crate::{Q18, SCALE};

/// Directed rounding mode. Every inexact operation names one explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Round {
    /// Round toward positive infinity (ceil).
    Up,
    /// Round toward negative infinity (floor).
    Down,
}

/// Checked Q18 addition.
pub fn q_add(a: Q18, b: Q18) -> FixedPointResult<Q18> {
    a.checked_add(b)
        .ok_or(FixedPointError::Overflow { op: "q_add", a, b })
}

/// Checked Q18 subtraction.
pub fn q_sub(a: Q18, b: Q18) -> FixedPointResult<Q18> {
    a.checked_sub(b)
        .ok_or(FixedPointError::Overflow { op: "q_sub", a, b })
}

/// Q18 multiplication: `(a * b) / 2^18` with directed rounding.
pub fn q_mul(a: Q18, b: Q18, round: Round) -> FixedPointResult<Q18> {
    let wide = (a as i128) * (b as i128);
    let shifted = match round {
        Round::Up => ceil_div(wide, SCALE as i128),
        Round::Down => floor_div(wide, SCALE as i128),
    };
    narrow(shifted, "q_mul", a, b)
}

/// Q18 division: `(a * 2^18) / b` with directed rounding.
pub fn q_div(a: Q18, b: Q18, round: Round) -> FixedPointResult<Q18> {
    if b == 0 {
        return Err(FixedPointError::DivisionByZero { a });
    }
    let wide = (a as i128) << 18;
    let q = match round {
        Round::Up => ceil_div(wide, b as i128),
        Round::Down => floor_div(wide, b as i128),
    };
    narrow(q, "q_div", a, b)
}

/// Q18 square root, floor-rounded.
///
/// Returns `floor(sqrt(a / 2^18) * 2^18)`, i.e. the floor integer square
/// root of `a * 2^18`. Floor is the documented rounding policy for the
/// exploration bonus: the bonus is always a lower bound, so exploration
/// never outbids task loss on a rounding artifact.
pub fn q_sqrt(a: Q18) -> FixedPointResult<Q18> {
    if a < 0 {
        return Err(FixedPointError::NegativeSqrt { a });
    }
    let wide = (a as u128) << 18;
    let root = isqrt_u128(wide);
    // sqrt of any non-negative Q18 value fits i64: isqrt(i64::MAX << 18) < 2^41.
    Ok(root as Q18)
}

/// Budget debit: `kappa * cost` with UP rounding. The engine never
/// undercharges work.
pub fn debit(kappa: Q18, cost: Q18) -> FixedPointResult<Q18> {
    q_mul(kappa, cost, Round::Up)
}

/// Budget refund: `rate * amount` with DOWN rounding. The engine never
/// overcredits a refund.
pub fn refund(rate: Q18, amount: Q18) -> FixedPointResult<Q18> {
    q_mul(rate, amount, Round::Down)
}

/// Convert a plain integer to Q18.
pub fn from_int(n: i64) -> FixedPointResult<Q18> {
    n.checked_mul(SCALE)
        .ok_or(FixedPointError::Overflow { op: "from_int", a: n, b: SCALE })
}

/// Convert Q18 to a plain integer, flooring the fractional part.
pub fn to_int_floor(q: Q18) -> i64 {
    q.div_euclid(SCALE)
}

/// Clamp a Q18 value into `[lo, hi]`.
pub fn clamp(q: Q18, lo: Q18, hi: Q18) -> Q18 {
    q.max(lo).min(hi)
}

fn narrow(wide: i128, op: &'static str, a: i64, b: i64) -> FixedPointResult<Q18> {
    if wide < i64::MIN as i128 || wide > i64::MAX as i128 {
        Err(FixedPointError::Overflow { op, a, b })
    } else {
        Ok(wide as i64)
    }
}

fn floor_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if r != 0 && ((r < 0) != (d < 0)) {
        q - 1
    } else {
        q
    }
}

fn ceil_div(n: i128, d: i128) -> i128 {
    let q = n / d;
    let r = n % d;
    if r != 0 && ((r < 0) == (d < 0)) {
        q + 1
    } else {
        q
    }
}

fn isqrt_u128(n: u128) -> u128 {
    if n < 2 {
        return n;
    }
    // Newton iteration from an over-estimate; converges in O(log log n).
    let shift = (128 - n.leading_zeros()).div_ceil(2);
    let mut x = 1u128 << shift;
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}
