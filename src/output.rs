//! Formatting of results for the terminal
//!
//! Settings come from the configuration and are overridden by the one-shot
//! modes of the current expression: `hex_mode` and `octal_mode` switch the
//! radix and group digits with leading zeros, `comma_mode` groups thousands
//! with `,`.

use std::time::Duration;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{pow, FromPrimitive, Signed, ToPrimitive, Zero};

use crate::config::{Config, DEFAULT_NUMERALS};
use crate::item::*;
use crate::measurement::Measurement;
use crate::session::Modes;
use crate::value::*;

// decimal exponents below this switch to scientific notation
const MIN_FIXED_EXP: i64 = -5;
const INDENT: usize = 4;

#[derive(Debug, Clone, PartialEq)]
enum Radix {
    Decimal,
    Base(u32),
    /// every digit printed as a decimal number
    Numbers(u32),
    Fib,
}

/// Significant digits and decimal exponent of a nonzero real number:
/// `digits = "12345", exp = 2` stands for `123.45`
struct Digits {
    negative: bool,
    digits: String,
    exp: i64,
}

/// Output settings resolved for one result
#[derive(Debug, Clone)]
pub struct OutputFormat {
    accuracy: usize,
    precision: usize,
    radix: Radix,
    numerals: Vec<char>,
    integer_grouping: usize,
    decimal_grouping: usize,
    integer_delimiter: String,
    decimal_delimiter: String,
    leading_zero: bool,
    line_length: usize,
    list_format_level: usize,
}

impl OutputFormat {
    pub fn new(config: &Config, modes: &Modes) -> Self {
        let radix = if config.output_radix_numerals != 0 {
            Radix::Numbers(config.output_radix_numerals)
        } else if config.output_radix == "fib" {
            Radix::Fib
        } else {
            match config.output_radix.parse::<u32>() {
                Ok(10) if config.numerals == DEFAULT_NUMERALS => Radix::Decimal,
                Ok(r) => Radix::Base(r),
                Err(_) => Radix::Decimal,
            }
        };
        let mut fmt = OutputFormat {
            accuracy: config.output_accuracy.max(1),
            precision: config.precision,
            radix,
            numerals: config.numerals.chars().collect(),
            integer_grouping: config.integer_grouping,
            decimal_grouping: config.decimal_grouping,
            integer_delimiter: config.integer_delimiter.clone(),
            decimal_delimiter: config.decimal_delimiter.clone(),
            leading_zero: config.leading_zero || modes.leading_zero,
            line_length: config.line_length,
            list_format_level: config.list_format_level,
        };
        if config.comma || modes.comma {
            fmt.integer_grouping = 3;
            fmt.integer_delimiter = ",".to_string();
            fmt.leading_zero = false;
        }
        if modes.hex {
            fmt.radix = Radix::Base(16);
            fmt.integer_grouping = 4;
            fmt.leading_zero = true;
        }
        if modes.octal {
            fmt.radix = Radix::Base(8);
            fmt.integer_grouping = 3;
            fmt.leading_zero = true;
        }
        fmt
    }

    /// Formats a result, word-wrapped to the line length
    pub fn format_item(&self, item: &Item) -> String {
        let text = match item {
            Item::List(items) => self.format_list(items, 0),
            other => self.format_scalar(other),
        };
        wrap(&text, self.line_length)
    }

    fn format_scalar(&self, item: &Item) -> String {
        match item {
            Item::Number(v) => self.format_value(v),
            Item::Measure(m) => self.format_measurement(m),
            Item::List(items) => self.format_list(items, 0),
            other => other.to_string(),
        }
    }

    fn format_list(&self, items: &[Item], level: usize) -> String {
        let parts: Vec<String> = items
            .iter()
            .map(|item| match item {
                Item::List(sub) => self.format_list(sub, level + 1),
                other => self.format_scalar(other),
            })
            .collect();
        if level >= self.list_format_level {
            return format!("[ {} ]", parts.join(", "));
        }
        let pad = " ".repeat((level + 1) * INDENT);
        let body: Vec<String> = parts.iter().map(|p| format!("{}{}", pad, p)).collect();
        format!("[\n{}\n{}]", body.join(",\n"), " ".repeat(level * INDENT))
    }

    fn format_measurement(&self, m: &Measurement) -> String {
        // zero takes the plural
        let singular = match m.value.to_f64("output") {
            Ok(x) => x != 0.0 && x.abs() <= 1.0,
            Err(_) => false,
        };
        let units = m.units.display_name(!singular).replace('_', " ");
        format!("{} {}", self.format_value(&m.value), units)
    }

    pub fn format_value(&self, v: &Value) -> String {
        match v {
            Value::Complex(c) => {
                if c.im == 0.0 {
                    return self.format_real(&Value::Float(c.re));
                }
                let re = self.format_real(&Value::Float(c.re));
                let im = self.format_real(&Value::Float(c.im.abs()));
                let sign = if c.im < 0.0 { '-' } else { '+' };
                format!("( {} {} {}j )", re, sign, im)
            }
            other => self.format_real(other),
        }
    }

    fn format_real(&self, v: &Value) -> String {
        if let Value::Float(f) = v {
            if !f.is_finite() {
                return format_f64(*f);
            }
        }
        match self.radix {
            Radix::Decimal => self.format_decimal(v),
            Radix::Fib => match v.floor_bigint("output") {
                Ok(i) if i.is_negative() => format!("-{}", zeckendorf(&-i)),
                Ok(i) => zeckendorf(&i),
                Err(_) => v.to_string(),
            },
            Radix::Base(base) | Radix::Numbers(base) => match exact_ratio(v) {
                Some(r) => self.format_radix(&r, base),
                None => v.to_string(),
            },
        }
    }

    fn format_decimal(&self, v: &Value) -> String {
        let digits = match v {
            Value::Int(i) => {
                let sign = if i.is_negative() { "-" } else { "" };
                return format!("{}{}", sign, self.group_integer(&i.abs().to_string()));
            }
            Value::Float(f) => float_digits(*f, self.accuracy),
            Value::Ratio(r) => ratio_digits(r, self.accuracy),
            Value::Complex(c) => float_digits(c.re, self.accuracy),
        };
        let (int, frac, suffix) = self.layout(&digits);
        let mut out = String::new();
        if digits.negative {
            out.push('-');
        }
        out += &self.group_integer(&int);
        if !frac.is_empty() {
            out.push('.');
            out += &self.group_fraction(&frac);
        }
        out + &suffix
    }

    /// Splits significant digits into integer part, fraction part and
    /// exponent suffix
    fn layout(&self, d: &Digits) -> (String, String, String) {
        let digits = d.digits.trim_end_matches('0');
        let digits = if digits.is_empty() { "0" } else { digits };
        if d.exp >= self.accuracy as i64 || d.exp < MIN_FIXED_EXP {
            let sign = if d.exp < 0 { '-' } else { '+' };
            return (digits[..1].to_string(), digits[1..].to_string(), format!("e{}{}", sign, d.exp.abs()));
        }
        if d.exp < 0 {
            let zeros = "0".repeat((-d.exp - 1) as usize);
            return ("0".to_string(), zeros + digits, String::new());
        }
        let int_len = d.exp as usize + 1;
        if digits.len() <= int_len {
            let zeros = "0".repeat(int_len - digits.len());
            (format!("{}{}", digits, zeros), String::new(), String::new())
        } else {
            (digits[..int_len].to_string(), digits[int_len..].to_string(), String::new())
        }
    }

    fn group_integer(&self, s: &str) -> String {
        let g = self.integer_grouping;
        if g == 0 || s.is_empty() {
            return s.to_string();
        }
        let chars: Vec<char> = s.chars().collect();
        let first = chars.len() % g;
        let mut groups = Vec::new();
        if first > 0 {
            let head: String = chars[..first].iter().collect();
            if self.leading_zero {
                groups.push(format!("{}{}", "0".repeat(g - first), head));
            } else {
                groups.push(head);
            }
        }
        for chunk in chars[first..].chunks(g) {
            groups.push(chunk.iter().collect());
        }
        groups.join(&self.integer_delimiter)
    }

    fn group_fraction(&self, s: &str) -> String {
        let g = self.decimal_grouping;
        if g == 0 {
            return s.to_string();
        }
        let chars: Vec<char> = s.chars().collect();
        let groups: Vec<String> = chars.chunks(g).map(|c| c.iter().collect()).collect();
        groups.join(&self.decimal_delimiter)
    }

    fn format_radix(&self, r: &BigRational, base: u32) -> String {
        let negative = r.is_negative();
        let r = r.abs();
        let int = r.to_integer();
        let mut frac = r - BigRational::from_integer(int.clone());
        let int_digits = radix_digits(&int, base);

        let mut frac_digits = Vec::new();
        let b = BigRational::from_integer(BigInt::from(base));
        while !frac.is_zero() && frac_digits.len() < self.precision {
            frac = frac * &b;
            let d = frac.to_integer();
            frac_digits.push(d.to_u32().unwrap_or(0));
            frac = frac - BigRational::from_integer(d);
        }

        let sign = if negative { "-" } else { "" };
        let numerals = &self.numerals;
        if matches!(self.radix, Radix::Numbers(_)) || base as usize > numerals.len() {
            let join = |ds: &[u32]| ds.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(" ");
            let mut out = format!("{}{}", sign, join(&int_digits));
            if !frac_digits.is_empty() {
                out = format!("{} . {}", out, join(&frac_digits));
            }
            return out;
        }
        let spell = |ds: &[u32]| ds.iter().map(|d| numerals[*d as usize]).collect::<String>();
        let mut out = format!("{}{}", sign, self.group_integer(&spell(&int_digits)));
        if !frac_digits.is_empty() {
            out.push('.');
            out += &self.group_fraction(&spell(&frac_digits));
        }
        out
    }
}

fn float_digits(x: f64, accuracy: usize) -> Digits {
    let s = format!("{:.*e}", accuracy - 1, x.abs());
    let (mantissa, exp) = match s.find('e') {
        Some(pos) => (&s[..pos], s[pos + 1..].parse::<i64>().unwrap_or(0)),
        None => (s.as_str(), 0),
    };
    Digits { negative: x < 0.0, digits: mantissa.replace('.', ""), exp }
}

/// Rounds a rational number to `accuracy` significant digits
fn ratio_digits(r: &BigRational, accuracy: usize) -> Digits {
    let negative = r.is_negative();
    let num = r.numer().abs();
    let den = r.denom().abs();
    if num.is_zero() {
        return Digits { negative: false, digits: "0".to_string(), exp: 0 };
    }
    let ten = BigInt::from(10);
    let mut exp = num.to_string().len() as i64 - den.to_string().len() as i64;
    let mut digits = String::new();
    for _ in 0..4 {
        let shift = accuracy as i64 - 1 - exp;
        let (n, d) = if shift >= 0 {
            (&num * pow(ten.clone(), shift as usize), den.clone())
        } else {
            (num.clone(), &den * pow(ten.clone(), (-shift) as usize))
        };
        // round half up
        let scaled: BigInt = (n * 2 + &d) / (d * 2);
        digits = scaled.to_string();
        if digits.len() > accuracy {
            exp += 1;
        } else if digits.len() < accuracy {
            exp -= 1;
        } else {
            break;
        }
    }
    Digits { negative, digits, exp }
}

fn exact_ratio(v: &Value) -> Option<BigRational> {
    match v {
        Value::Int(i) => Some(BigRational::from_integer(i.clone())),
        Value::Float(f) => BigRational::from_f64(*f),
        Value::Ratio(r) => Some(r.clone()),
        Value::Complex(c) => BigRational::from_f64(c.re),
    }
}

/// Digits of a non-negative integer, most significant first
fn radix_digits(n: &BigInt, base: u32) -> Vec<u32> {
    if n.is_zero() {
        return vec![0];
    }
    let b = BigInt::from(base);
    let mut n = n.clone();
    let mut res = Vec::new();
    while !n.is_zero() {
        let (q, r) = n.div_rem(&b);
        res.push(r.to_u32().unwrap_or(0));
        n = q;
    }
    res.reverse();
    res
}

/// Zeckendorf representation: sum of non-consecutive Fibonacci numbers
fn zeckendorf(n: &BigInt) -> String {
    if n.is_zero() {
        return "0".to_string();
    }
    let mut fibs = vec![BigInt::from(1)];
    let (mut a, mut b) = (BigInt::from(1), BigInt::from(2));
    while &b <= n {
        fibs.push(b.clone());
        let next = &a + &b;
        a = std::mem::replace(&mut b, next);
    }
    let mut rest = n.clone();
    let mut out = String::new();
    for f in fibs.iter().rev() {
        if &rest >= f {
            rest -= f;
            out.push('1');
        } else {
            out.push('0');
        }
    }
    out
}

/// Breaks lines longer than `width` at spaces. Continuation lines keep the
/// indentation of the line they come from. Zero width disables wrapping
pub fn wrap(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }
    let mut out = Vec::new();
    for line in text.lines() {
        let indent = line.chars().take_while(|c| *c == ' ').count();
        let indent = if indent < width { indent } else { 0 };
        let mut rest: Vec<char> = line.chars().collect();
        let mut prefix = 0;
        loop {
            if prefix + rest.len() <= width {
                out.push(format!("{}{}", " ".repeat(prefix), rest.iter().collect::<String>()));
                break;
            }
            let room = width.saturating_sub(prefix).max(1);
            let min_pos = if prefix == 0 { indent } else { 0 };
            let cut = rest[..=room].iter().rposition(|c| *c == ' ').filter(|pos| *pos > min_pos).unwrap_or(room);
            let head: String = rest[..cut].iter().collect();
            out.push(format!("{}{}", " ".repeat(prefix), head.trim_end()));
            rest = rest[cut..].iter().copied().skip_while(|c| *c == ' ').collect();
            if rest.is_empty() {
                break;
            }
            prefix = indent;
        }
    }
    out.join("\n")
}

/// Elapsed time as printed by the timer
pub fn format_elapsed(elapsed: Duration) -> String {
    format!("{:.3} seconds", elapsed.as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;
    use crate::stack::evaluate;
    use crate::units::Units;

    fn default_format() -> OutputFormat {
        OutputFormat::new(&Config::default(), &Modes::default())
    }

    fn show(terms: &[&str]) -> String {
        let mut s = Session::new();
        match evaluate(terms, &mut s) {
            Ok(item) => OutputFormat::new(&s.config, &s.modes).format_item(&item),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_decimal() {
        let f = default_format();
        assert_eq!(f.format_value(&Value::from(-1234567i64)), "-1234567");
        assert_eq!(f.format_value(&Value::Float(2.5)), "2.5");
        assert_eq!(f.format_value(&Value::Float(-0.5)), "-0.5");
        assert_eq!(f.format_value(&Value::Float(2f64.sqrt())), "1.41421356237");
        assert_eq!(f.format_value(&Value::Float(1e20)), "1e+20");
        assert_eq!(f.format_value(&Value::Float(1.5e-7)), "1.5e-7");
        assert_eq!(f.format_value(&Value::Float(0.00001)), "0.00001");
        assert_eq!(f.format_value(&Value::Float(123456.75)), "123456.75");
        assert_eq!(f.format_value(&Value::Float(f64::INFINITY)), "inf");
        assert_eq!(show(&["1", "3", "/"]), "0.333333333333");
        assert_eq!(show(&["1", "8", "/"]), "0.125");
    }

    #[test]
    fn test_ratio_digits() {
        let f = default_format();
        let r = BigRational::new(BigInt::from(1), BigInt::from(8));
        assert_eq!(f.format_value(&Value::Ratio(r)), "0.125");
        let r = BigRational::new(BigInt::from(-2), BigInt::from(3));
        assert_eq!(f.format_value(&Value::Ratio(r)), "-0.666666666667");
        let r = BigRational::new(BigInt::from(999_999_999_999_999i64), BigInt::from(1000));
        assert_eq!(f.format_value(&Value::Ratio(r)), "1e+12");
    }

    #[test]
    fn test_complex() {
        let f = default_format();
        assert_eq!(f.format_value(&Value::Complex(num_complex::Complex::new(3.0, 4.0))), "( 3 + 4j )");
        assert_eq!(f.format_value(&Value::Complex(num_complex::Complex::new(1.0, -2.5))), "( 1 - 2.5j )");
    }

    #[test]
    fn test_grouping() {
        let mut cfg = Config::default();
        cfg.comma = true;
        let f = OutputFormat::new(&cfg, &Modes::default());
        assert_eq!(f.format_value(&Value::from(1234567i64)), "1,234,567");
        assert_eq!(f.format_value(&Value::from(-123i64)), "-123");

        let mut cfg = Config::default();
        cfg.integer_grouping = 3;
        cfg.leading_zero = true;
        let f = OutputFormat::new(&cfg, &Modes::default());
        assert_eq!(f.format_value(&Value::from(1234i64)), "001 234");

        let mut cfg = Config::default();
        cfg.decimal_grouping = 2;
        let f = OutputFormat::new(&cfg, &Modes::default());
        assert_eq!(f.format_value(&Value::Float(0.12345)), "0.12 34 5");
    }

    #[test]
    fn test_radix() {
        let modes = Modes { hex: true, ..Modes::default() };
        let f = OutputFormat::new(&Config::default(), &modes);
        assert_eq!(f.format_value(&Value::from(255i64)), "00ff");
        let modes = Modes { octal: true, ..Modes::default() };
        let f = OutputFormat::new(&Config::default(), &modes);
        assert_eq!(f.format_value(&Value::from(8i64)), "010");

        let mut cfg = Config::default();
        cfg.output_radix = "2".to_string();
        let f = OutputFormat::new(&cfg, &Modes::default());
        assert_eq!(f.format_value(&Value::from(10i64)), "1010");
        assert_eq!(f.format_value(&Value::Float(-2.5)), "-10.1");

        cfg.output_radix = "fib".to_string();
        let f = OutputFormat::new(&cfg, &Modes::default());
        assert_eq!(f.format_value(&Value::from(4i64)), "101");
        assert_eq!(f.format_value(&Value::from(10i64)), "10010");

        let mut cfg = Config::default();
        cfg.output_radix_numerals = 100;
        let f = OutputFormat::new(&cfg, &Modes::default());
        assert_eq!(f.format_value(&Value::from(12345i64)), "1 23 45");
    }

    #[test]
    fn test_lists_and_measurements() {
        assert_eq!(show(&["[", "1", "2", "[", "3", "4", "]", "]"]), "[ 1, 2, [ 3, 4 ] ]");
        let mut cfg = Config::default();
        cfg.list_format_level = 1;
        let f = OutputFormat::new(&cfg, &Modes::default());
        let l = Item::List(vec![Item::int(1), Item::List(vec![Item::int(2), Item::int(3)])]);
        assert_eq!(f.format_item(&l), "[\n    1,\n    [ 2, 3 ]\n]");

        let f = default_format();
        let m = Measurement::new(Value::from(2i64), Units::single("meter"));
        assert_eq!(f.format_item(&Item::Measure(m)), "2 meters");
        let m = Measurement::new(Value::from(1i64), Units::single("meter"));
        assert_eq!(f.format_item(&Item::Measure(m)), "1 meter");
        let m = Measurement::new(Value::Float(-0.5), Units::single("meter"));
        assert_eq!(f.format_item(&Item::Measure(m)), "-0.5 meter");
        let m = Measurement::new(Value::from(0i64), Units::single("meter"));
        assert_eq!(f.format_item(&Item::Measure(m)), "0 meters");
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("aaa bbb ccc", 7), "aaa bbb\nccc");
        assert_eq!(wrap("abcdefghij", 4), "abcd\nefgh\nij");
        assert_eq!(wrap("    x y z", 7), "    x y\n    z");
        assert_eq!(wrap("short", 80), "short");
        assert_eq!(wrap("", 80), "");
    }

    #[test]
    fn test_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(1500)), "1.500 seconds");
    }
}
