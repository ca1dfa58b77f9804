use std::f64::consts;

use num_complex::Complex;
use num_bigint::BigInt;
use num_traits::One;

use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::value::*;

const PHI: f64 = 1.618_033_988_749_895;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;
// exact factorials are used for integer gamma arguments up to this value
const MAX_EXACT_GAMMA: i64 = 1000;

const LANCZOS_G: f64 = 7.0;
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Numeric argument of a trigonometric function: angle measurements are
/// converted to radians
fn angle_arg(item: &Item, op: &str) -> CalcResult {
    match item {
        Item::Number(v) => Ok(v.clone()),
        Item::Measure(m) => m.as_angle(op),
        _ => Err(CalcError::ExpectedNumber(op.to_string())),
    }
}

fn real_arg(item: &Item, op: &str) -> Result<f64, CalcError> {
    let v = item.number(op)?;
    if v.is_complex() {
        return Err(CalcError::NotForComplex(op.to_string()));
    }
    v.to_f64(op)
}

fn float_result(f: f64) -> ItemResult {
    Ok(Item::Number(Value::Float(f).normalize()))
}

fn reciprocal(v: Value) -> CalcResult {
    Value::one().div(v)
}

macro_rules! trig_op {
    ($id:ident, $method:ident) => {
        fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
            Ok(Item::Number(angle_arg(&args[0], stringify!($id))?.$method()?))
        }
    };
    ($id:ident, $method:ident, inverse) => {
        fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
            Ok(Item::Number(reciprocal(angle_arg(&args[0], stringify!($id))?.$method()?)?))
        }
    };
}

trig_op!(sin, sin);
trig_op!(cos, cos);
trig_op!(tan, tan);
trig_op!(sec, cos, inverse);
trig_op!(csc, sin, inverse);
trig_op!(cot, tan, inverse);
trig_op!(sinh, sinh);
trig_op!(cosh, cosh);
trig_op!(tanh, tanh);
trig_op!(sech, cosh, inverse);
trig_op!(csch, sinh, inverse);
trig_op!(coth, tanh, inverse);

macro_rules! arc_op {
    ($id:ident, $method:ident) => {
        fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
            Ok(Item::Number(args[0].number(stringify!($id))?.clone().$method()?))
        }
    };
    ($id:ident, $method:ident, inverse) => {
        fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
            let v = args[0].number(stringify!($id))?.clone();
            Ok(Item::Number(reciprocal(v)?.$method()?))
        }
    };
}

arc_op!(asin, asin);
arc_op!(acos, acos);
arc_op!(atan, atan);
arc_op!(asec, acos, inverse);
arc_op!(acsc, asin, inverse);
arc_op!(acot, atan, inverse);
arc_op!(asinh, asinh);
arc_op!(acosh, acosh);
arc_op!(atanh, atanh);
arc_op!(asech, acosh, inverse);
arc_op!(acsch, asinh, inverse);
arc_op!(acoth, atanh, inverse);

fn exp(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Number(args[0].number("exp")?.clone().exp()?))
}

fn exp10(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Number(Value::from(10i64).power(args[0].number("exp10")?.clone())?))
}

fn expphi(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Number(Value::Float(PHI).power(args[0].number("expphi")?.clone())?))
}

fn ln(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Number(args[0].number("ln")?.clone().ln()?))
}

/// Logarithm in the given base. Exact powers of an integer base give
/// integers
fn log_base(v: Value, base: Value, op: &str) -> CalcResult {
    if let (Value::Int(n), Value::Int(b)) = (&v, &base) {
        if n > &BigInt::one() && b > &BigInt::one() {
            let mut k = 0u64;
            let mut p = BigInt::one();
            while &p < n {
                p *= b;
                k += 1;
            }
            if &p == n {
                return Ok(Value::from(k));
            }
        }
    }
    let denom = base.ln()?;
    if denom.is_zero() {
        return Err(CalcError::InvalidArgument(op.to_string(), "1".to_string()));
    }
    v.ln()?.div(denom)
}

fn log10(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Number(log_base(args[0].number("log10")?.clone(), Value::from(10i64), "log10")?))
}

fn log2(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Number(log_base(args[0].number("log2")?.clone(), Value::from(2i64), "log2")?))
}

fn logxy(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].number("logxy")?.clone();
    let k = args[1].number("logxy")?.clone();
    Ok(Item::Number(log_base(n, k, "logxy")?))
}

/// Lanczos approximation of the gamma function
pub(crate) fn gamma_f64(x: f64) -> f64 {
    if x < 0.5 {
        return consts::PI / ((consts::PI * x).sin() * gamma_f64(1.0 - x));
    }
    let x = x - 1.0;
    let mut a = LANCZOS[0];
    let t = x + LANCZOS_G + 0.5;
    for (i, c) in LANCZOS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    (2.0 * consts::PI).sqrt() * t.powf(x + 0.5) * (-t).exp() * a
}

/// Logarithm of the absolute value of the gamma function
pub(crate) fn lgamma_f64(x: f64) -> f64 {
    if x < 0.5 {
        let s = (consts::PI * x).sin().abs();
        return consts::PI.ln() - s.ln() - lgamma_f64(1.0 - x);
    }
    let x = x - 1.0;
    let mut a = LANCZOS[0];
    let t = x + LANCZOS_G + 0.5;
    for (i, c) in LANCZOS.iter().enumerate().skip(1) {
        a += c / (x + i as f64);
    }
    0.5 * (2.0 * consts::PI).ln() + (x + 0.5) * t.ln() - t + a.ln()
}

fn gamma(_: &mut Session, args: &[Item]) -> ItemResult {
    let v = args[0].number("gamma")?;
    if v.is_integer() && !v.is_complex() {
        let n = v.to_i64("gamma")?;
        if n <= 0 {
            return Err(CalcError::InvalidArgument("gamma".to_string(), n.to_string()));
        }
        if n <= MAX_EXACT_GAMMA {
            let fact = (1..n).fold(BigInt::one(), |acc, i| acc * i);
            return Ok(Item::Number(Value::Int(fact)));
        }
    }
    float_result(gamma_f64(real_arg(&args[0], "gamma")?))
}

fn lgamma(_: &mut Session, args: &[Item]) -> ItemResult {
    let x = real_arg(&args[0], "lgamma")?;
    if x <= 0.0 && x.fract() == 0.0 {
        return Err(CalcError::InvalidArgument("lgamma".to_string(), format_f64(x)));
    }
    Ok(Item::Number(Value::Float(lgamma_f64(x))))
}

/// Riemann zeta for real arguments: Borwein's alternating series for
/// `s >= 1/2`, the functional equation below that
pub(crate) fn zeta_f64(s: f64) -> Result<f64, CalcError> {
    if s == 1.0 {
        return Err(CalcError::InvalidArgument("zeta".to_string(), "1".to_string()));
    }
    if s == 0.0 {
        return Ok(-0.5);
    }
    if s < 0.5 {
        if s < 0.0 && (s / 2.0).fract() == 0.0 {
            return Ok(0.0);
        }
        let reflected = zeta_f64(1.0 - s)?;
        return Ok(2f64.powf(s)
            * consts::PI.powf(s - 1.0)
            * (consts::PI * s / 2.0).sin()
            * gamma_f64(1.0 - s)
            * reflected);
    }
    let n = 40usize;
    let mut d = Vec::with_capacity(n + 1);
    let mut term = 1.0;
    let mut sum = 1.0;
    d.push(sum);
    for i in 0..n {
        let i = i as f64;
        let nf = n as f64;
        term *= 4.0 * (nf + i) * (nf - i) / ((2.0 * i + 1.0) * (2.0 * i + 2.0));
        sum += term;
        d.push(sum);
    }
    let dn = d[n];
    let mut acc = 0.0;
    for (k, dk) in d.iter().enumerate().take(n) {
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        acc += sign * (dk - dn) / ((k + 1) as f64).powf(s);
    }
    Ok(-acc / (dn * (1.0 - 2f64.powf(1.0 - s))))
}

fn zeta(_: &mut Session, args: &[Item]) -> ItemResult {
    float_result(zeta_f64(real_arg(&args[0], "zeta")?)?)
}

/// Principal branch of the Lambert W function
pub(crate) fn lambertw_f64(x: f64) -> Result<f64, CalcError> {
    let branch = -1.0 / consts::E;
    if x < branch {
        return Err(CalcError::ArgumentOutOfRange("lambertw".to_string(), format_f64(x), "-1/e..".to_string()));
    }
    if x == 0.0 {
        return Ok(0.0);
    }
    let mut w = if x < 1.0 {
        let p = (2.0 * (consts::E * x + 1.0)).sqrt();
        -1.0 + p - p * p / 3.0
    } else {
        let l = x.ln();
        l - l.ln().max(0.0)
    };
    for _ in 0..100 {
        let ew = w.exp();
        let f = w * ew - x;
        let wp1 = w + 1.0;
        if wp1 == 0.0 {
            break;
        }
        let step = f / (ew * wp1 - (w + 2.0) * f / (2.0 * wp1));
        w -= step;
        if step.abs() <= 1e-15 * (1.0 + w.abs()) {
            break;
        }
    }
    Ok(w)
}

fn lambertw(_: &mut Session, args: &[Item]) -> ItemResult {
    float_result(lambertw_f64(real_arg(&args[0], "lambertw")?)?)
}

/// Logarithmic integral, Ramanujan's series
pub(crate) fn li_f64(x: f64) -> Result<f64, CalcError> {
    if x <= 0.0 || x == 1.0 {
        return Err(CalcError::InvalidArgument("li".to_string(), format_f64(x)));
    }
    let l = x.ln();
    let mut sum = 0.0;
    let mut inner = 0.0;
    let mut power = 1.0;
    let mut fact = 1.0;
    for n in 1..200 {
        power *= l;
        fact *= n as f64;
        if (n - 1) % 2 == 0 {
            inner += 1.0 / (2 * ((n - 1) / 2) + 1) as f64;
        }
        let sign = if n % 2 == 1 { 1.0 } else { -1.0 };
        let term = sign * power / (fact * 2f64.powi(n - 1)) * inner;
        sum += term;
        if !fact.is_finite() || term.abs() < 1e-17 * sum.abs() {
            break;
        }
    }
    Ok(EULER_GAMMA + l.abs().ln() + x.sqrt() * sum)
}

fn li(_: &mut Session, args: &[Item]) -> ItemResult {
    float_result(li_f64(real_arg(&args[0], "li")?)?)
}

fn agm(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut a = real_arg(&args[0], "agm")?;
    let mut b = real_arg(&args[1], "agm")?;
    if a < 0.0 || b < 0.0 {
        return Err(CalcError::NotForNegativeInt("agm".to_string()));
    }
    for _ in 0..100 {
        let (na, nb) = ((a + b) / 2.0, (a * b).sqrt());
        if f64_equal(na, a) && f64_equal(nb, b) {
            break;
        }
        a = na;
        b = nb;
    }
    float_result(a)
}

fn unitroots(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].to_usize("unitroots")?;
    if n == 0 {
        return Err(CalcError::InvalidArgument("unitroots".to_string(), "0".to_string()));
    }
    let roots = (0..n)
        .map(|k| {
            let angle = 2.0 * consts::PI * k as f64 / n as f64;
            let (s, c) = angle.sin_cos();
            let clean = |f: f64| if f.abs() < 1e-15 { 0.0 } else { f };
            Item::Number(Value::Complex(Complex::new(clean(c), clean(s))).normalize())
        })
        .collect();
    Ok(Item::List(roots))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "logarithms";
    reg.add(OperatorInfo::new("exp", &[Scalar], cat, "calculates the nth power of e", exp));
    reg.add(OperatorInfo::new("exp10", &[Scalar], cat, "calculates the nth power of 10", exp10));
    reg.add(OperatorInfo::new("expphi", &[Scalar], cat, "calculates the nth power of phi", expphi));
    reg.add(OperatorInfo::new("ln", &[Scalar], cat, "calculates the natural logarithm of n", ln));
    reg.add(OperatorInfo::new("log10", &[Scalar], cat, "calculates the base-10 logarithm of n", log10));
    reg.add(OperatorInfo::new("log2", &[Scalar], cat, "calculates the base-2 logarithm of n", log2));
    reg.add(OperatorInfo::new("logxy", &[Scalar, Scalar], cat, "calculates the base-k logarithm of n", logxy));
    reg.add(OperatorInfo::new("lambertw", &[Scalar], cat, "calculates the Lambert W function of n", lambertw));
    reg.add(OperatorInfo::new("li", &[Scalar], cat, "calculates the logarithmic integral of n", li));

    let cat = "trigonometry";
    reg.add(OperatorInfo::new("sin", &[Scalar], cat, "calculates the sine of n", sin));
    reg.add(OperatorInfo::new("cos", &[Scalar], cat, "calculates the cosine of n", cos));
    reg.add(OperatorInfo::new("tan", &[Scalar], cat, "calculates the tangent of n", tan));
    reg.add(OperatorInfo::new("sec", &[Scalar], cat, "calculates the secant of n", sec));
    reg.add(OperatorInfo::new("csc", &[Scalar], cat, "calculates the cosecant of n", csc));
    reg.add(OperatorInfo::new("cot", &[Scalar], cat, "calculates the cotangent of n", cot));
    reg.add(OperatorInfo::new("asin", &[Scalar], cat, "calculates the arcsine of n", asin));
    reg.add(OperatorInfo::new("acos", &[Scalar], cat, "calculates the arccosine of n", acos));
    reg.add(OperatorInfo::new("atan", &[Scalar], cat, "calculates the arctangent of n", atan));
    reg.add(OperatorInfo::new("asec", &[Scalar], cat, "calculates the arcsecant of n", asec));
    reg.add(OperatorInfo::new("acsc", &[Scalar], cat, "calculates the arccosecant of n", acsc));
    reg.add(OperatorInfo::new("acot", &[Scalar], cat, "calculates the arccotangent of n", acot));
    reg.add(OperatorInfo::new("sinh", &[Scalar], cat, "calculates the hyperbolic sine of n", sinh));
    reg.add(OperatorInfo::new("cosh", &[Scalar], cat, "calculates the hyperbolic cosine of n", cosh));
    reg.add(OperatorInfo::new("tanh", &[Scalar], cat, "calculates the hyperbolic tangent of n", tanh));
    reg.add(OperatorInfo::new("sech", &[Scalar], cat, "calculates the hyperbolic secant of n", sech));
    reg.add(OperatorInfo::new("csch", &[Scalar], cat, "calculates the hyperbolic cosecant of n", csch));
    reg.add(OperatorInfo::new("coth", &[Scalar], cat, "calculates the hyperbolic cotangent of n", coth));
    reg.add(OperatorInfo::new("asinh", &[Scalar], cat, "calculates the hyperbolic arcsine of n", asinh));
    reg.add(OperatorInfo::new("acosh", &[Scalar], cat, "calculates the hyperbolic arccosine of n", acosh));
    reg.add(OperatorInfo::new("atanh", &[Scalar], cat, "calculates the hyperbolic arctangent of n", atanh));
    reg.add(OperatorInfo::new("asech", &[Scalar], cat, "calculates the hyperbolic arcsecant of n", asech));
    reg.add(OperatorInfo::new("acsch", &[Scalar], cat, "calculates the hyperbolic arccosecant of n", acsch));
    reg.add(OperatorInfo::new("acoth", &[Scalar], cat, "calculates the hyperbolic arccotangent of n", acoth));

    let cat = "special";
    reg.add(OperatorInfo::new("gamma", &[Scalar], cat, "calculates the gamma function of n", gamma));
    reg.add(OperatorInfo::new("lgamma", &[Scalar], cat, "calculates the log of the gamma function of n", lgamma));
    reg.add(OperatorInfo::new("zeta", &[Scalar], cat, "calculates the Riemann zeta function of n", zeta));
    reg.add(OperatorInfo::new("agm", &[Scalar, Scalar], cat, "calculates the arithmetic-geometric mean of n and k", agm));
    reg.add(OperatorInfo::new("unitroots", &[Scalar], cat, "calculates the nth roots of unity", unitroots));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::evaluate;

    fn eval_f64(terms: &[&str]) -> f64 {
        let mut s = Session::new();
        evaluate(terms, &mut s).unwrap().to_f64("test").unwrap()
    }

    #[test]
    fn test_logs() {
        let mut s = Session::new();
        assert_eq!(evaluate(&["1000", "log10"], &mut s), Ok(Item::int(3)));
        assert_eq!(evaluate(&["1024", "log2"], &mut s), Ok(Item::int(10)));
        assert_eq!(evaluate(&["81", "3", "logxy"], &mut s), Ok(Item::int(4)));
        assert!(f64_equal(eval_f64(&["e", "ln"]), 1.0));
        assert_eq!(evaluate(&["3", "exp10"], &mut s), Ok(Item::int(1000)));
    }

    #[test]
    fn test_trig() {
        assert!(eval_f64(&["pi", "sin"]).abs() < 1e-15);
        assert!(f64_equal(eval_f64(&["90", "degrees", "sin"]), 1.0));
        assert!(f64_equal(eval_f64(&["0", "sec"]), 1.0));
        assert!(f64_equal(eval_f64(&["1", "atan", "4", "*"]), consts::PI));
        assert!(f64_equal(eval_f64(&["2", "asec"]), consts::PI / 3.0));
    }

    #[test]
    fn test_special() {
        let mut s = Session::new();
        assert_eq!(evaluate(&["5", "gamma"], &mut s), Ok(Item::int(24)));
        assert!(f64_equal(eval_f64(&["0.5", "gamma"]), consts::PI.sqrt()));
        assert!(f64_equal(eval_f64(&["2", "zeta"]), consts::PI * consts::PI / 6.0));
        assert!((eval_f64(&["-1", "zeta"]) + 1.0 / 12.0).abs() < 1e-12);
        assert!(f64_equal(eval_f64(&["1", "lambertw"]), 0.567_143_290_409_783_8));
        assert!((eval_f64(&["10", "li"]) - 6.165_599_504_787_297).abs() < 1e-10);
        assert!(f64_equal(eval_f64(&["1", "2", "sqrt", "agm"]), 1.198_140_234_735_592_2));
        assert!(f64_equal(eval_f64(&["10", "lgamma"]), 362_880f64.ln()));
        assert!(evaluate(&["0", "gamma"], &mut s).is_err());
        assert!(evaluate(&["1", "zeta"], &mut s).is_err());
    }

    #[test]
    fn test_unitroots() {
        let mut s = Session::new();
        let roots = evaluate(&["4", "unitroots"], &mut s).unwrap();
        match roots {
            Item::List(items) => {
                assert_eq!(items.len(), 4);
                assert_eq!(items[0], Item::int(1));
            }
            other => panic!("unexpected {}", other),
        }
    }
}
