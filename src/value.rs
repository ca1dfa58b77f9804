use num_bigint::BigInt;
use num_complex::Complex;
use num_integer::{Integer, Roots};
use num_rational::BigRational;
use num_traits::{FromPrimitive, Num, One, Pow, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::f64::consts;
use std::fmt;
use std::str;

use crate::errors::*;

/// Result of a numeric operation: either value or error
pub type CalcResult = Result<Value, CalcError>;

// integral floats above this magnitude are kept as floats: f64 has no
// exact integer representation past 2^53
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;
// refuse to build integers with more bits than this
const MAX_RESULT_BITS: u64 = 64 * 1024 * 1024;
/// Integer literals with a larger decimal exponent are read as floats
const MAX_LITERAL_EXPONENT: u32 = 100_000;

/// Numbers the calculator works with
#[derive(Clone)]
pub enum Value {
    /// Big integer number
    Int(BigInt),
    /// Float number
    Float(f64),
    /// Rational number (numerator and denominator are big integers)
    Ratio(BigRational),
    /// Complex number
    Complex(Complex<f64>),
}

const F64_BUF_LEN: usize = 48;
pub(crate) fn format_f64(g: f64) -> String {
    if !g.is_finite() {
        return if g.is_nan() {
            "nan".to_string()
        } else if g > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }
    let mut buf = [b'\0'; F64_BUF_LEN];
    match dtoa::write(&mut buf[..], g) {
        Ok(len) => match str::from_utf8(&buf[..len]) {
            Ok(s) => s.to_string(),
            Err(..) => format!("{}", g),
        },
        Err(..) => format!("{}", g),
    }
}

/// Compares two floats with a tolerance relative to their magnitude
pub(crate) fn f64_equal(f1: f64, f2: f64) -> bool {
    let scale = f1.abs().max(f2.abs()).max(1.0);
    (f1 - f2).abs() <= scale * 1e-12
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Value::Int(ref i) => write!(f, "{}", i),
            Value::Float(ref g) => write!(f, "{}", format_f64(*g)),
            Value::Ratio(ref r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Value::Complex(ref c) => {
                if c.im >= 0.0 {
                    write!(f, "{}+{}j", format_f64(c.re), format_f64(c.im))
                } else {
                    write!(f, "{}{}j", format_f64(c.re), format_f64(c.im))
                }
            }
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            Value::Int(ref i) => write!(f, "Int({})", i),
            Value::Float(ref g) => write!(f, "Float({:?})", g),
            Value::Ratio(ref r) => write!(f, "Ratio({})", r),
            Value::Complex(ref c) => write!(f, "Complex({:?})", c),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(ref i1), Value::Int(ref i2)) => i1 == i2,
            (Value::Float(ref f1), Value::Float(ref f2)) => f1 == f2,
            (Value::Ratio(ref r1), Value::Ratio(ref r2)) => r1 == r2,
            (Value::Complex(ref c1), Value::Complex(ref c2)) => c1 == c2,
            (_, _) => false,
        }
    }
}

impl Default for Value {
    fn default() -> Value {
        Value::Int(BigInt::zero())
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(BigInt::from(i))
    }
}

impl From<u64> for Value {
    fn from(i: u64) -> Self {
        Value::Int(BigInt::from(i))
    }
}

impl From<usize> for Value {
    fn from(i: usize) -> Self {
        Value::Int(BigInt::from(i))
    }
}

impl From<BigInt> for Value {
    fn from(i: BigInt) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(g: f64) -> Self {
        Value::Float(g)
    }
}

impl From<BigRational> for Value {
    fn from(r: BigRational) -> Self {
        Value::Ratio(r).normalize()
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        if b {
            Value::Int(BigInt::one())
        } else {
            Value::Int(BigInt::zero())
        }
    }
}

pub(crate) fn int_to_f64(i: &BigInt) -> Result<f64, CalcError> {
    match i.to_f64() {
        Some(f) if f.is_finite() => Ok(f),
        _ => Err(CalcError::IntToFloat(i.clone())),
    }
}

pub(crate) fn f64_to_int(f: f64) -> Result<BigInt, CalcError> {
    if let Some(i) = BigInt::from_f64(f) {
        Ok(i)
    } else {
        Err(CalcError::FloatToInt(f))
    }
}

fn f64_to_ratio(f: f64) -> Result<BigRational, CalcError> {
    if let Some(r) = BigRational::from_float(f) {
        Ok(r)
    } else {
        Err(CalcError::FloatToRatio(f))
    }
}

pub(crate) fn ratio_to_f64(r: &BigRational) -> Result<f64, CalcError> {
    if r.is_zero() {
        return Ok(0.0);
    }
    // integer part first: numerator and denominator may both overflow f64
    let whole = r.trunc().to_integer();
    let i = match whole.to_f64() {
        Some(f) if f.is_finite() => f,
        _ => return Err(CalcError::RatioToFloat(r.clone())),
    };
    let fr = r.fract();
    if fr.is_zero() {
        return Ok(i);
    }
    let n = fr.numer().to_f64();
    let d = fr.denom().to_f64();
    match (n, d) {
        (Some(n), Some(d)) if n.is_finite() && d.is_finite() => Ok(i + n / d),
        _ => {
            // scale both down keeping the leading bits
            let shift = fr.denom().bits().saturating_sub(60);
            let n = (fr.numer() >> shift as usize).to_f64().unwrap_or(0.0);
            let d = (fr.denom() >> shift as usize).to_f64().unwrap_or(1.0);
            Ok(i + n / d)
        }
    }
}

fn clean_digits(s: &str) -> String {
    s.chars().filter(|c| *c != '_' && *c != ',').collect()
}

fn str_to_bigint(s: &str) -> Result<BigInt, CalcError> {
    let s = clean_digits(s);
    let (neg, body) = if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        (false, rest)
    } else {
        (false, s.as_str())
    };

    let lower = body.to_lowercase();
    let parsed = if lower.starts_with("0x") {
        BigInt::from_str_radix(&body[2..], 16).ok()
    } else if lower.ends_with('b') && body.len() > 1 && body[..body.len() - 1].chars().all(|c| c == '0' || c == '1')
    {
        BigInt::from_str_radix(&body[..body.len() - 1], 2).ok()
    } else if body.len() > 1 && body.starts_with('0') && body.chars().all(|c| c.is_ascii_digit()) {
        BigInt::from_str_radix(&body[1..], 8).ok()
    } else if let Some(pos) = lower.find('e') {
        let base = BigInt::from_str_radix(&body[..pos], 10).ok();
        let pow = body[pos + 1..].trim_start_matches('+').parse::<u32>().ok();
        match (base, pow) {
            (Some(b), Some(p)) if p <= MAX_LITERAL_EXPONENT => Some(b * BigInt::from(10).pow(p)),
            _ => None,
        }
    } else {
        BigInt::from_str_radix(body, 10).ok()
    };

    match parsed {
        Some(i) if neg => Ok(-i),
        Some(i) => Ok(i),
        None => Err(CalcError::StrToInt(s.to_owned())),
    }
}

/// `12e999999`: an integer literal whose exponent is too large to expand
fn has_large_exponent(s: &str) -> bool {
    let lower = s.to_lowercase();
    if lower.starts_with("0x") || lower.starts_with("-0x") {
        return false;
    }
    match lower.find('e') {
        Some(pos) => match lower[pos + 1..].trim_start_matches('+').parse::<u64>() {
            Ok(p) => p > MAX_LITERAL_EXPONENT as u64,
            Err(_) => lower[pos + 1..].chars().all(|c| c.is_ascii_digit() || c == '+'),
        },
        None => false,
    }
}

fn str_to_f64(s: &str) -> Result<f64, CalcError> {
    let s = clean_digits(s);
    if let Ok(f) = s.parse::<f64>() {
        Ok(f)
    } else {
        Err(CalcError::StrToFloat(s))
    }
}

macro_rules! arith_op {
    ($id:ident, $op:tt) => {
        pub fn $id(self, rhs: Value) -> CalcResult {
            let v = match (&self, &rhs) {
                (Value::Complex(..), ..) | (.., Value::Complex(..)) => {
                    let c1 = self.into_raw_complex()?;
                    let c2 = rhs.into_raw_complex()?;
                    Value::Complex(c1 $op c2)
                },
                (Value::Float(..), ..) | (.., Value::Float(..)) => {
                    let f1 = self.into_raw_f64()?;
                    let f2 = rhs.into_raw_f64()?;
                    Value::Float(f1 $op f2)
                },
                (Value::Ratio(..), ..) | (.., Value::Ratio(..)) => {
                    let r1 = self.into_raw_ratio()?;
                    let r2 = rhs.into_raw_ratio()?;
                    Value::Ratio(r1 $op r2)
                },
                (Value::Int(i1), Value::Int(i2)) => Value::Int(i1 $op i2),
            };
            Ok(v.normalize())
        }
    }
}

macro_rules! round_op {
    ($id:ident, $ratio_fn:ident) => {
        pub fn $id(self) -> CalcResult {
            match &self {
                Value::Int(..) => Ok(self),
                Value::Ratio(r) => Ok(Value::Int(r.$ratio_fn().to_integer())),
                Value::Float(f) => {
                    let g = f.$id();
                    if g.is_finite() {
                        Ok(Value::Int(f64_to_int(g)?))
                    } else {
                        Ok(Value::Float(g))
                    }
                }
                Value::Complex(c) => Ok(Value::Complex(Complex::new(c.re.$id(), c.im.$id())).normalize()),
            }
        }
    };
}

macro_rules! sin_cos {
    ($id:ident) => {
        pub fn $id(self) -> CalcResult {
            match &self {
                Value::Complex(c) => Ok(Value::Complex(c.$id()).normalize_complex()),
                _ => {
                    let f = self.into_raw_f64()?;
                    Ok(Value::Float(f.$id()))
                },
            }
        }
    }
}

macro_rules! asin_cos {
    ($id:ident) => {
        pub fn $id(self) -> CalcResult {
            match &self {
                Value::Complex(c) => Ok(Value::Complex(c.$id()).normalize_complex()),
                _ => {
                    let f = self.into_raw_f64()?;
                    if (-1.0..=1.0).contains(&f) {
                        Ok(Value::Float(f.$id()))
                    } else {
                        Ok(Value::Complex(Complex::new(f, 0.0).$id()).normalize_complex())
                    }
                }
            }
        }
    }
}

macro_rules! fn_hyper {
    ($id:ident) => {
        pub fn $id(self) -> CalcResult {
            match &self {
                Value::Complex(c) => Ok(Value::Complex(c.$id()).normalize_complex()),
                _ => {
                    let f = self.into_raw_f64()?;
                    Ok(Value::Float(f.$id()))
                }
            }
        }
    }
}

impl Value {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn zero() -> Self {
        Value::Int(BigInt::zero())
    }

    pub fn one() -> Self {
        Value::Int(BigInt::one())
    }

    // --------------------------------

    pub(crate) fn into_float(self) -> CalcResult {
        match self {
            Value::Int(i) => Ok(Value::Float(int_to_f64(&i)?)),
            Value::Float(..) => Ok(self),
            Value::Ratio(r) => Ok(Value::Float(ratio_to_f64(&r)?)),
            Value::Complex(c) => Ok(Value::Float(c.re)),
        }
    }

    pub(crate) fn into_ratio(self) -> CalcResult {
        match self {
            Value::Ratio(..) => Ok(self),
            Value::Int(i) => Ok(Value::Ratio(BigRational::from_integer(i))),
            Value::Float(f) => Ok(Value::Ratio(f64_to_ratio(f)?)),
            Value::Complex(c) => Ok(Value::Ratio(f64_to_ratio(c.re)?)),
        }
    }

    pub(crate) fn into_complex(self) -> CalcResult {
        match self {
            Value::Complex(..) => Ok(self),
            Value::Float(f) => Ok(Value::Complex(Complex::new(f, 0.0))),
            Value::Int(i) => Ok(Value::Complex(Complex::new(int_to_f64(&i)?, 0.0))),
            Value::Ratio(r) => Ok(Value::Complex(Complex::new(ratio_to_f64(&r)?, 0.0))),
        }
    }

    //---------------------------------------------

    pub(crate) fn into_raw_f64(self) -> Result<f64, CalcError> {
        match Value::into_float(self)? {
            Value::Float(f) => Ok(f),
            _ => Err(CalcError::Unreachable),
        }
    }

    pub(crate) fn into_raw_ratio(self) -> Result<BigRational, CalcError> {
        match Value::into_ratio(self)? {
            Value::Ratio(r) => Ok(r),
            _ => Err(CalcError::Unreachable),
        }
    }

    pub(crate) fn into_raw_complex(self) -> Result<Complex<f64>, CalcError> {
        match Value::into_complex(self)? {
            Value::Complex(c) => Ok(c),
            _ => Err(CalcError::Unreachable),
        }
    }

    /// Real value as `f64`; complex numbers with a non-zero imaginary part
    /// are rejected with the operator name
    pub fn to_f64(&self, op: &str) -> Result<f64, CalcError> {
        match self {
            Value::Complex(c) if c.im != 0.0 => Err(CalcError::NotForComplex(op.to_string())),
            _ => self.clone().into_raw_f64(),
        }
    }

    /// Integer value of a number that must be integral
    pub fn to_bigint(&self, op: &str) -> Result<BigInt, CalcError> {
        match self.clone().normalize() {
            Value::Int(i) => Ok(i),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 => f64_to_int(f),
            Value::Complex(..) => Err(CalcError::NotForComplex(op.to_string())),
            _ => Err(CalcError::OnlyInt(op.to_string())),
        }
    }

    /// Integer value truncated towards negative infinity
    pub fn floor_bigint(&self, op: &str) -> Result<BigInt, CalcError> {
        match self {
            Value::Int(i) => Ok(i.clone()),
            Value::Ratio(r) => Ok(r.floor().to_integer()),
            Value::Float(f) => f64_to_int(f.floor()),
            Value::Complex(..) => Err(CalcError::NotForComplex(op.to_string())),
        }
    }

    pub fn to_i64(&self, op: &str) -> Result<i64, CalcError> {
        let i = self.to_bigint(op)?;
        i.to_i64()
            .ok_or_else(|| CalcError::ArgumentOutOfRange(op.to_string(), i.to_string(), "64-bit integer".to_string()))
    }

    pub fn to_usize(&self, op: &str) -> Result<usize, CalcError> {
        let i = self.to_bigint(op)?;
        if i.is_negative() {
            return Err(CalcError::NotForNegativeInt(op.to_string()));
        }
        i.to_usize()
            .ok_or_else(|| CalcError::ArgumentOutOfRange(op.to_string(), i.to_string(), "machine word".to_string()))
    }

    //---------------------------------------------

    /// Convert &str to big integer number
    /// Supported formats:
    /// * Raw integer number - `1234`, digits may be separated with `_` or `,`
    /// * Integer number and exponent - `12e2` = `1200`
    /// * Hexadecimal number - `0x12`
    /// * Binary number with a trailing `b` - `101b`
    /// * Octal number with a leading zero - `017`
    pub fn from_str_integer(s: &str) -> CalcResult {
        if has_large_exponent(s) {
            return Ok(Value::Float(str_to_f64(s)?));
        }
        let i = str_to_bigint(s)?;
        Ok(Value::Int(i))
    }

    /// Convert &str to float number: `1.023`, `.5`, `1.02e-5`
    pub fn from_str_float(s: &str) -> CalcResult {
        let f = str_to_f64(s)?;
        Ok(Value::Float(f).normalize())
    }

    /// Convert &str to complex number. The imaginary part is marked with a
    /// trailing `j` (or `J`): `3+4j`, `-2.5j`, `1e3-2e-2j`
    pub fn from_str_complex(s: &str) -> CalcResult {
        let body = s.trim_end_matches(|c| c == 'j' || c == 'J');
        // the split point is the last sign that does not belong to an exponent
        let bytes = body.as_bytes();
        let mut split = None;
        for pos in (1..bytes.len()).rev() {
            let c = bytes[pos];
            if (c == b'+' || c == b'-') && bytes[pos - 1] != b'e' && bytes[pos - 1] != b'E' {
                split = Some(pos);
                break;
            }
        }
        let (re, im) = match split {
            Some(pos) => (str_to_f64(&body[..pos])?, imaginary_part(&body[pos..])?),
            None => (0.0, imaginary_part(body)?),
        };
        Ok(Value::Complex(Complex::new(re, im)).normalize_complex())
    }

    /// Convert a digit string in an arbitrary radix (2..=62) using the given
    /// numerals. A single `.` separates the fractional part.
    pub fn from_str_radix(s: &str, radix: u32, numerals: &str) -> CalcResult {
        let (neg, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let digit = |c: char| -> Result<u32, CalcError> {
            match numerals.chars().take(radix as usize).position(|n| n == c) {
                Some(d) => Ok(d as u32),
                None => Err(CalcError::StrToInt(s.to_string())),
            }
        };

        let mut parts = body.splitn(2, '.');
        let int_part = parts.next().unwrap_or("");
        let frac_part = parts.next().unwrap_or("");
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(CalcError::StrToInt(s.to_string()));
        }

        let mut whole = BigInt::zero();
        for c in int_part.chars() {
            whole = whole * BigInt::from(radix) + BigInt::from(digit(c)?);
        }
        let mut value = if frac_part.is_empty() {
            Value::Int(whole)
        } else {
            let mut numer = BigInt::zero();
            let mut denom = BigInt::one();
            for c in frac_part.chars() {
                numer = numer * BigInt::from(radix) + BigInt::from(digit(c)?);
                denom *= BigInt::from(radix);
            }
            let r = BigRational::from_integer(whole) + BigRational::new(numer, denom);
            Value::Float(ratio_to_f64(&r)?)
        };
        if neg {
            value = value.negate()?;
        }
        Ok(value.normalize())
    }

    //---------------------------------------------

    /// Returns true if the value is zero
    pub fn is_zero(&self) -> bool {
        match self {
            Value::Int(ref i) => i.is_zero(),
            Value::Float(ref f) => *f == 0.0,
            Value::Ratio(ref r) => r.is_zero(),
            Value::Complex(ref c) => c.is_zero(),
        }
    }

    pub fn is_negative(&self) -> bool {
        match self {
            Value::Int(ref i) => i.is_negative(),
            Value::Float(ref f) => *f < 0.0,
            Value::Ratio(ref r) => r.is_negative(),
            Value::Complex(ref c) => c.re < 0.0,
        }
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Value::Complex(..))
    }

    /// True for integers and for floats/fractions with an integral value
    pub fn is_integer(&self) -> bool {
        match self {
            Value::Int(..) => true,
            Value::Float(f) => f.is_finite() && f.fract() == 0.0,
            Value::Ratio(r) => r.is_integer(),
            Value::Complex(c) => c.im == 0.0 && c.re.is_finite() && c.re.fract() == 0.0,
        }
    }

    // results that are exactly integral fall back to big integers
    fn is_like_int(&self) -> bool {
        match self {
            Value::Int(..) => true,
            Value::Float(f) => {
                let fa = f.abs();
                fa >= 1.0 && fa < MAX_EXACT_FLOAT && fa.fract() == 0.0
            }
            Value::Ratio(ref r) => r.is_integer(),
            Value::Complex(ref c) => c.im == 0.0 && Value::Float(c.re).is_like_int(),
        }
    }

    /// Converts the value to the lowest type that holds it exactly
    pub fn normalize(self) -> Value {
        if let Value::Int(..) = self {
            return self;
        }
        if self.is_like_int() {
            return match &self {
                Value::Ratio(r) => Value::Int(r.to_integer()),
                Value::Float(f) => f64_to_int(*f).map(Value::Int).unwrap_or(self),
                Value::Complex(c) => f64_to_int(c.re).map(Value::Int).unwrap_or(self),
                Value::Int(..) => self,
            };
        }
        self.normalize_complex()
    }

    // complex results with zero imaginary part become floats
    fn normalize_complex(self) -> Value {
        match self {
            Value::Complex(c) if c.im == 0.0 => Value::Float(c.re),
            _ => self,
        }
    }

    arith_op!(add, +);
    arith_op!(sub, -);
    arith_op!(mul, *);

    /// Divides two numbers. Integer division that leaves a remainder
    /// produces a float
    pub fn div(self, rhs: Value) -> CalcResult {
        if rhs.is_zero() {
            return Err(CalcError::DividedByZero(format!("{}", self)));
        }
        let v = match (&self, &rhs) {
            (Value::Complex(..), ..) | (.., Value::Complex(..)) => {
                let c1 = self.into_raw_complex()?;
                let c2 = rhs.into_raw_complex()?;
                Value::Complex(c1 / c2)
            }
            (Value::Float(..), ..) | (.., Value::Float(..)) => {
                let f1 = self.into_raw_f64()?;
                let f2 = rhs.into_raw_f64()?;
                Value::Float(f1 / f2)
            }
            (Value::Ratio(..), ..) | (.., Value::Ratio(..)) => {
                let r1 = self.into_raw_ratio()?;
                let r2 = rhs.into_raw_ratio()?;
                Value::Ratio(r1 / r2)
            }
            (Value::Int(i1), Value::Int(i2)) => {
                let (q, r) = i1.div_rem(i2);
                if r.is_zero() {
                    Value::Int(q)
                } else {
                    Value::Float(ratio_to_f64(&BigRational::new(i1.clone(), i2.clone()))?)
                }
            }
        };
        Ok(v.normalize())
    }

    /// Exact division producing a fraction for integer operands
    pub fn div_exact(self, rhs: Value) -> CalcResult {
        if rhs.is_zero() {
            return Err(CalcError::DividedByZero(format!("{}", self)));
        }
        match (&self, &rhs) {
            (Value::Int(..), Value::Int(..))
            | (Value::Ratio(..), Value::Int(..))
            | (Value::Int(..), Value::Ratio(..))
            | (Value::Ratio(..), Value::Ratio(..)) => {
                let r1 = self.into_raw_ratio()?;
                let r2 = rhs.into_raw_ratio()?;
                Ok(Value::Ratio(r1 / r2).normalize())
            }
            _ => self.div(rhs),
        }
    }

    /// Remainder with the sign of the dividend
    pub fn modulo(self, rhs: Value) -> CalcResult {
        if rhs.is_zero() {
            return Err(CalcError::DividedByZero(format!("{}", self)));
        }
        let v = match (&self, &rhs) {
            (Value::Complex(..), ..) | (.., Value::Complex(..)) => {
                return Err(CalcError::NotForComplex("modulo".to_string()))
            }
            (Value::Float(..), ..) | (.., Value::Float(..)) => {
                let f1 = self.into_raw_f64()?;
                let f2 = rhs.into_raw_f64()?;
                Value::Float(f1 % f2)
            }
            (Value::Ratio(..), ..) | (.., Value::Ratio(..)) => {
                let r1 = self.into_raw_ratio()?;
                let r2 = rhs.into_raw_ratio()?;
                Value::Ratio(r1 % r2)
            }
            (Value::Int(i1), Value::Int(i2)) => Value::Int(i1 % i2),
        };
        Ok(v.normalize())
    }

    /// Inverts the sign of the value
    pub fn negate(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(-c)),
            Value::Ratio(r) => Ok(Value::Ratio(-r)),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Int(i) => Ok(Value::Int(-i)),
        }
    }

    /// Absolute value; for complex numbers it is the modulus
    pub fn abs(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Float(c.norm()).normalize()),
            Value::Ratio(r) => Ok(Value::Ratio(r.abs())),
            Value::Float(f) => Ok(Value::Float(f.abs())),
            Value::Int(i) => Ok(Value::Int(i.abs())),
        }
    }

    /// Returns `-1`, `0` or `1`; for complex numbers the unit vector
    pub fn signum(self) -> CalcResult {
        match &self {
            Value::Complex(c) => {
                if c.is_zero() {
                    Ok(Value::zero())
                } else {
                    Ok(Value::Complex(c / c.norm()).normalize())
                }
            }
            Value::Ratio(r) => Ok(Value::Int(r.signum().to_integer())),
            Value::Float(f) => {
                if *f == 0.0 {
                    Ok(Value::zero())
                } else {
                    Ok(Value::Int(BigInt::from(f.signum() as i64)))
                }
            }
            Value::Int(i) => Ok(Value::Int(i.signum())),
        }
    }

    pub fn conj(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(c.conj())),
            _ => Ok(self),
        }
    }

    pub fn im(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Float(c.im).normalize()),
            _ => Ok(Value::zero()),
        }
    }

    pub fn re(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Float(c.re).normalize()),
            _ => Ok(self),
        }
    }

    /// Argument (phase angle) of a number
    pub fn arg(self) -> CalcResult {
        let c = self.into_raw_complex()?;
        Ok(Value::Float(c.arg()))
    }

    /// Compares two real numbers
    pub fn compare(&self, rhs: &Value) -> Result<Ordering, CalcError> {
        match (self, rhs) {
            (Value::Complex(c), _) | (_, Value::Complex(c)) if c.im != 0.0 => {
                Err(CalcError::NotForComplex("comparison".to_string()))
            }
            (Value::Int(i1), Value::Int(i2)) => Ok(i1.cmp(i2)),
            (Value::Float(..), _) | (_, Value::Float(..)) | (Value::Complex(..), _) | (_, Value::Complex(..)) => {
                let f1 = self.clone().into_raw_f64()?;
                let f2 = rhs.clone().into_raw_f64()?;
                f1.partial_cmp(&f2)
                    .ok_or_else(|| CalcError::InvalidArgument("comparison".to_string(), "nan".to_string()))
            }
            _ => {
                let r1 = self.clone().into_raw_ratio()?;
                let r2 = rhs.clone().into_raw_ratio()?;
                Ok(r1.cmp(&r2))
            }
        }
    }

    /// Numeric equality across types; floats compare with a small tolerance
    pub fn is_equal(&self, rhs: &Value) -> Result<bool, CalcError> {
        match (self, rhs) {
            (Value::Complex(..), _) | (_, Value::Complex(..)) => {
                let c1 = self.clone().into_raw_complex()?;
                let c2 = rhs.clone().into_raw_complex()?;
                Ok(f64_equal(c1.re, c2.re) && f64_equal(c1.im, c2.im))
            }
            (Value::Float(..), _) | (_, Value::Float(..)) => {
                let f1 = self.clone().into_raw_f64()?;
                let f2 = rhs.clone().into_raw_f64()?;
                Ok(f1 == f2 || f64_equal(f1, f2))
            }
            _ => Ok(self.compare(rhs)? == Ordering::Equal),
        }
    }

    round_op!(floor, floor);
    round_op!(ceil, ceil);
    round_op!(trunc, trunc);

    /// Rounds half away from zero
    pub fn round(self) -> CalcResult {
        match &self {
            Value::Int(..) => Ok(self),
            Value::Ratio(r) => Ok(Value::Int(r.round().to_integer())),
            Value::Float(f) => {
                if f.is_finite() {
                    Ok(Value::Int(f64_to_int(f.round())?))
                } else {
                    Ok(self)
                }
            }
            Value::Complex(c) => Ok(Value::Complex(Complex::new(c.re.round(), c.im.round())).normalize()),
        }
    }

    /// Fractional part of a number
    pub fn fract(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(Complex::new(c.re.fract(), c.im.fract()))),
            Value::Ratio(r) => Ok(Value::Ratio(r.fract())),
            Value::Float(f) => Ok(Value::Float(f.fract())),
            Value::Int(..) => Ok(Value::zero()),
        }
    }

    /// Square root. Perfect squares stay exact, negative numbers become complex
    pub fn sqrt(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(c.sqrt()).normalize()),
            Value::Int(i) => {
                if i.is_negative() {
                    let root = Value::Int(-i).sqrt()?;
                    let f = root.into_raw_f64()?;
                    return Ok(Value::Complex(Complex::new(0.0, f)));
                }
                let sq = i.sqrt();
                if &sq * &sq == *i {
                    Ok(Value::Int(sq))
                } else {
                    Ok(Value::Float(int_to_f64(i)?.sqrt()))
                }
            }
            Value::Ratio(r) => {
                if !r.is_negative() {
                    let n = r.numer().sqrt();
                    let d = r.denom().sqrt();
                    if &n * &n == *r.numer() && &d * &d == *r.denom() {
                        return Ok(Value::Ratio(BigRational::new(n, d)));
                    }
                }
                Value::Float(ratio_to_f64(r)?).sqrt()
            }
            Value::Float(f) => {
                if *f >= 0.0 {
                    Ok(Value::Float(f.sqrt()).normalize())
                } else {
                    Ok(Value::Complex(Complex::new(0.0, (-f).sqrt())))
                }
            }
        }
    }

    /// Cube root: real for negative real numbers
    pub fn cbrt(self) -> CalcResult {
        match &self {
            Value::Complex(..) => self.power(Value::Float(1.0 / 3.0)),
            Value::Int(i) => {
                let cb = i.cbrt();
                if &cb * &cb * &cb == *i {
                    return Ok(Value::Int(cb));
                }
                Ok(Value::Float(int_to_f64(i)?.cbrt()))
            }
            _ => {
                let f = self.into_raw_f64()?;
                Ok(Value::Float(f.cbrt()).normalize())
            }
        }
    }

    /// k-th root of a number
    pub fn root(self, k: Value) -> CalcResult {
        if k.is_zero() {
            return Err(CalcError::DividedByZero("root".to_string()));
        }
        if let Value::Int(n) = &k {
            if *n == BigInt::from(2) {
                return self.sqrt();
            }
        }
        if let (Value::Int(i), Value::Int(n)) = (&self, &k) {
            if let Some(n32) = n.to_u32() {
                if !i.is_negative() || n32 % 2 == 1 {
                    let r = i.nth_root(n32);
                    if Pow::pow(&r, n32) == *i {
                        return Ok(Value::Int(r));
                    }
                }
            }
        }
        if !self.is_complex() && !k.is_complex() && self.is_negative() && k.is_integer() {
            let n = k.to_i64("root")?;
            if n % 2 != 0 {
                let f = self.into_raw_f64()?;
                let r = -(-f).powf(1.0 / n as f64);
                return Ok(Value::Float(r).normalize());
            }
        }
        let exponent = Value::one().div(k)?;
        self.power(exponent)
    }

    /// Raises a number into arbitrary power.
    /// Non-negative integer powers of integers and fractions are exact
    pub fn power(self, rhs: Value) -> CalcResult {
        match (&self, &rhs) {
            (Value::Complex(..), ..) | (.., Value::Complex(..)) => {
                let v = self.into_raw_complex()?;
                let p = rhs.into_raw_complex()?;
                if v.is_zero() {
                    return Ok(Value::zero());
                }
                Ok(Value::Complex(v.powc(p)).normalize())
            }
            (Value::Int(b), Value::Int(e)) => {
                if e.is_negative() {
                    let r = BigRational::from_integer(b.clone());
                    if r.is_zero() {
                        return Err(CalcError::DividedByZero("power".to_string()));
                    }
                    let exp = e.to_i32().ok_or_else(|| {
                        CalcError::ArgumentOutOfRange("power".to_string(), e.to_string(), "32-bit".to_string())
                    })?;
                    let p = Pow::pow(r, exp);
                    return Ok(Value::Float(ratio_to_f64(&p)?).normalize());
                }
                Ok(Value::Int(int_power(b, e)?))
            }
            (Value::Ratio(r), Value::Int(e)) => {
                let exp = e.to_i32().ok_or_else(|| {
                    CalcError::ArgumentOutOfRange("power".to_string(), e.to_string(), "32-bit".to_string())
                })?;
                if r.is_zero() && exp < 0 {
                    return Err(CalcError::DividedByZero("power".to_string()));
                }
                Ok(Value::Ratio(Pow::pow(r.clone(), exp)).normalize())
            }
            _ => {
                let b = self.into_raw_f64()?;
                let e = rhs.into_raw_f64()?;
                if b < 0.0 && e.fract() != 0.0 {
                    let c = Complex::new(b, 0.0).powf(e);
                    return Ok(Value::Complex(c).normalize());
                }
                Ok(Value::Float(b.powf(e)).normalize())
            }
        }
    }

    /// e raised to the power of a number
    pub fn exp(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(c.exp()).normalize_complex()),
            _ => {
                let f = self.into_raw_f64()?;
                Ok(Value::Float(f.exp()))
            }
        }
    }

    /// Natural logarithm. Negative numbers produce complex results
    pub fn ln(self) -> CalcResult {
        if self.is_zero() {
            return Err(CalcError::InvalidArgument("ln".to_string(), "0".to_string()));
        }
        match &self {
            Value::Complex(c) => Ok(Value::Complex(c.ln()).normalize_complex()),
            Value::Int(i) if i.bits() > 1000 => {
                // too big for f64: log of the leading bits plus the shift
                let shift = i.bits() - 64;
                let top = int_to_f64(&(i.abs() >> shift as usize))?;
                let re = top.ln() + shift as f64 * consts::LN_2;
                if i.is_negative() {
                    Ok(Value::Complex(Complex::new(re, consts::PI)))
                } else {
                    Ok(Value::Float(re))
                }
            }
            _ => {
                let f = self.into_raw_f64()?;
                if f > 0.0 {
                    Ok(Value::Float(f.ln()))
                } else {
                    Ok(Value::Complex(Complex::new(f, 0.0).ln()).normalize_complex())
                }
            }
        }
    }

    sin_cos!(sin);
    sin_cos!(cos);

    pub fn tan(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(c.tan()).normalize_complex()),
            _ => {
                let f = self.into_raw_f64()?;
                let half = consts::PI / 2.0;
                let k = (f / half).round();
                if k as i64 % 2 != 0 && f64_equal(k * half, f) {
                    Err(CalcError::InvalidArgument("tan".to_string(), format_f64(f)))
                } else {
                    Ok(Value::Float(f.tan()))
                }
            }
        }
    }

    asin_cos!(asin);
    asin_cos!(acos);

    pub fn atan(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(c.atan()).normalize_complex()),
            _ => {
                let f = self.into_raw_f64()?;
                Ok(Value::Float(f.atan()))
            }
        }
    }

    fn_hyper!(sinh);
    fn_hyper!(cosh);
    fn_hyper!(tanh);
    fn_hyper!(asinh);

    pub fn acosh(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(c.acosh()).normalize_complex()),
            _ => {
                let f = self.into_raw_f64()?;
                if f >= 1.0 {
                    Ok(Value::Float(f.acosh()))
                } else {
                    Ok(Value::Complex(Complex::new(f, 0.0).acosh()).normalize_complex())
                }
            }
        }
    }

    pub fn atanh(self) -> CalcResult {
        match &self {
            Value::Complex(c) => Ok(Value::Complex(c.atanh()).normalize_complex()),
            _ => {
                let f = self.into_raw_f64()?;
                if f > -1.0 && f < 1.0 {
                    Ok(Value::Float(f.atanh()))
                } else if f == 1.0 || f == -1.0 {
                    Err(CalcError::InvalidArgument("atanh".to_string(), format_f64(f)))
                } else {
                    Ok(Value::Complex(Complex::new(f, 0.0).atanh()).normalize_complex())
                }
            }
        }
    }
}

fn imaginary_part(s: &str) -> Result<f64, CalcError> {
    match s {
        "" | "+" => Ok(1.0),
        "-" => Ok(-1.0),
        _ => str_to_f64(s),
    }
}

fn int_power(base: &BigInt, exp: &BigInt) -> Result<BigInt, CalcError> {
    if base.is_zero() || base.is_one() || exp.is_zero() {
        return Ok(if exp.is_zero() { BigInt::one() } else { base.clone() });
    }
    if *base == -BigInt::one() {
        return Ok(if exp.is_even() { BigInt::one() } else { -BigInt::one() });
    }
    let e = exp.to_u64().unwrap_or(u64::MAX);
    if base.bits().saturating_mul(e) > MAX_RESULT_BITS {
        return Err(CalcError::ArgumentOutOfRange(
            "power".to_string(),
            exp.to_string(),
            "result too large".to_string(),
        ));
    }
    let mut res = BigInt::one();
    let mut b = base.clone();
    let mut e = e;
    while e > 0 {
        if e & 1 == 1 {
            res *= &b;
        }
        e >>= 1;
        if e > 0 {
            b = &b * &b;
        }
    }
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(i: i64) -> Value {
        Value::Int(BigInt::from(i))
    }

    #[test]
    fn test_int_str() {
        assert_eq!(Value::from_str_integer("10002"), Ok(int(10002)));
        assert_eq!(Value::from_str_integer("150,000"), Ok(int(150000)));
        assert_eq!(Value::from_str_integer("10_00_2"), Ok(int(10002)));
        assert_eq!(Value::from_str_integer("-10002"), Ok(int(-10002)));
        assert_eq!(Value::from_str_integer("33e5"), Ok(int(3300000)));
        assert_eq!(Value::from_str_integer("1e99999999"), Ok(Value::Float(f64::INFINITY)));
        assert_eq!(Value::from_str_integer("12e999999"), Ok(Value::Float(f64::INFINITY)));
        assert_eq!(Value::from_str_integer("1e300"), Ok(Value::Int(BigInt::from(10).pow(300u32))));
        assert_eq!(Value::from_str_integer("0xff"), Ok(int(255)));
        assert_eq!(Value::from_str_integer("-0x10"), Ok(int(-16)));
        assert_eq!(Value::from_str_integer("1011b"), Ok(int(11)));
        assert_eq!(Value::from_str_integer("017"), Ok(int(15)));
        assert!(Value::from_str_integer("08").is_err());
    }

    #[test]
    fn test_float_str() {
        assert_eq!(Value::from_str_float("2.5"), Ok(Value::Float(2.5)));
        assert_eq!(Value::from_str_float(".25"), Ok(Value::Float(0.25)));
        assert_eq!(Value::from_str_float("1.0002e5"), Ok(int(100020)));
        assert_eq!(Value::from_str_float("1e-3"), Ok(Value::Float(0.001)));
    }

    #[test]
    fn test_complex_str() {
        assert_eq!(Value::from_str_complex("3+4j"), Ok(Value::Complex(Complex::new(3.0, 4.0))));
        assert_eq!(Value::from_str_complex("-2j"), Ok(Value::Complex(Complex::new(0.0, -2.0))));
        assert_eq!(Value::from_str_complex("1e3-2e-2J"), Ok(Value::Complex(Complex::new(1000.0, -0.02))));
        assert_eq!(Value::from_str_complex("j"), Ok(Value::Complex(Complex::new(0.0, 1.0))));
    }

    #[test]
    fn test_radix_str() {
        let numerals = "0123456789abcdefghijklmnopqrstuvwxyz";
        assert_eq!(Value::from_str_radix("ff", 16, numerals), Ok(int(255)));
        assert_eq!(Value::from_str_radix("-101", 2, numerals), Ok(int(-5)));
        assert_eq!(Value::from_str_radix("0.1", 2, numerals), Ok(Value::Float(0.5)));
        assert!(Value::from_str_radix("12", 2, numerals).is_err());
    }

    #[test]
    fn test_to_str() {
        assert_eq!(int(12345).to_string(), "12345");
        assert_eq!(Value::Float(2.25).to_string(), "2.25");
        let r = Value::Ratio(BigRational::new(BigInt::from(23), BigInt::from(35)));
        assert_eq!(r.to_string(), "23/35");
        assert_eq!(Value::Complex(Complex::new(4.5, -3.25)).to_string(), "4.5-3.25j");
    }

    #[test]
    fn test_arith() {
        assert_eq!(int(4).add(int(3)), Ok(int(7)));
        assert_eq!(int(5).mul(int(7)), Ok(int(35)));
        assert_eq!(int(3).add(Value::Float(4.5)), Ok(Value::Float(7.5)));
        assert_eq!(Value::Float(0.5).add(Value::Float(0.5)), Ok(int(1)));
        let r = int(3).add(Value::Ratio(BigRational::new(BigInt::from(4), BigInt::from(5))));
        assert_eq!(r, Ok(Value::Ratio(BigRational::new(BigInt::from(19), BigInt::from(5)))));
        assert_eq!(int(12).div(int(4)), Ok(int(3)));
        assert_eq!(int(3).div(int(4)), Ok(Value::Float(0.75)));
        assert!(int(3).div(int(0)).is_err());
        let r = int(1).div_exact(int(3));
        assert_eq!(r, Ok(Value::Ratio(BigRational::new(BigInt::from(1), BigInt::from(3)))));
        assert_eq!(int(11001).modulo(int(100)), Ok(int(1)));
        assert_eq!(int(-7).modulo(int(3)), Ok(int(-1)));
    }

    #[test]
    fn test_compare() {
        assert_eq!(int(3).compare(&Value::Float(3.5)), Ok(Ordering::Less));
        assert_eq!(Value::Float(2.5).is_equal(&Value::Ratio(BigRational::new(BigInt::from(5), BigInt::from(2)))), Ok(true));
        assert!(Value::Complex(Complex::new(1.0, 1.0)).compare(&int(1)).is_err());
    }

    #[test]
    fn test_rounding() {
        assert_eq!(Value::Float(9.99999).ceil(), Ok(int(10)));
        assert_eq!(Value::Float(-0.4).floor(), Ok(int(-1)));
        assert_eq!(Value::Float(2.5).round(), Ok(int(3)));
        assert_eq!(Value::Float(-2.5).round(), Ok(int(-3)));
        assert_eq!(Value::Float(-2.7).trunc(), Ok(int(-2)));
    }

    #[test]
    fn test_roots() {
        assert_eq!(int(1024).sqrt(), Ok(int(32)));
        assert_eq!(int(-4).sqrt(), Ok(Value::Complex(Complex::new(0.0, 2.0))));
        assert_eq!(int(-27).cbrt(), Ok(int(-3)));
        assert_eq!(int(32).root(int(5)), Ok(int(2)));
        assert_eq!(int(-32).root(int(5)), Ok(int(-2)));
        assert_eq!(int(-1).root(int(2)), Ok(Value::Complex(Complex::new(0.0, 1.0))));
        assert_eq!(int(-4).root(int(2)), int(-4).sqrt());
        assert_eq!(int(-1).root(int(2)), int(-1).sqrt());
        let v = Value::Float(2.0).sqrt().unwrap();
        assert!(f64_equal(v.into_raw_f64().unwrap(), consts::SQRT_2));
    }

    #[test]
    fn test_power() {
        assert_eq!(int(2).power(int(10)), Ok(int(1024)));
        assert_eq!(int(2).power(int(-1)), Ok(Value::Float(0.5)));
        assert_eq!(Value::Float(3.0).power(Value::Float(2.0)), Ok(int(9)));
        let r = Value::Ratio(BigRational::new(BigInt::from(2), BigInt::from(3))).power(int(2));
        assert_eq!(r, Ok(Value::Ratio(BigRational::new(BigInt::from(4), BigInt::from(9)))));
        let c = int(-8).power(Value::Float(0.5)).unwrap();
        assert!(c.is_complex());
        let big = int(10).power(int(30)).unwrap();
        assert_eq!(big.to_string(), "1000000000000000000000000000000");
    }

    #[test]
    fn test_transcendental() {
        let v = Value::Float(0.5);
        let r = v.clone().exp().unwrap().ln().unwrap();
        assert!(f64_equal(r.into_raw_f64().unwrap(), 0.5));
        let r = v.clone().sin().unwrap().asin().unwrap();
        assert!(f64_equal(r.into_raw_f64().unwrap(), 0.5));
        assert!(int(2).asin().unwrap().is_complex());
        assert!(int(-1).ln().unwrap().is_complex());
        let big = int(10).power(int(400)).unwrap().ln().unwrap();
        assert!(f64_equal(big.into_raw_f64().unwrap(), 400.0 * consts::LN_10));
    }

    #[test]
    fn test_integer_args() {
        assert_eq!(Value::Float(4.0).to_bigint("op"), Ok(BigInt::from(4)));
        assert!(Value::Float(4.5).to_bigint("op").is_err());
        assert!(int(-1).to_usize("op").is_err());
        assert_eq!(int(-394).abs(), Ok(int(394)));
        assert_eq!(Value::Complex(Complex::new(3.0, 4.0)).abs(), Ok(int(5)));
    }
}
