use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, Zero};

use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::value::*;

const MAX_INDEX: usize = 1_000_000;
const MAX_BERNOULLI: usize = 2_000;
const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

fn index_arg(item: &Item, op: &str) -> Result<usize, CalcError> {
    let n = item.to_usize(op)?;
    if n > MAX_INDEX {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), n.to_string(), format!("0..{}", MAX_INDEX)));
    }
    Ok(n)
}

fn int_item(i: BigInt) -> Item {
    Item::Number(Value::Int(i))
}

/// `(F(n), F(n+1))` by fast doubling
pub(crate) fn fibonacci_pair(n: usize) -> (BigInt, BigInt) {
    if n == 0 {
        return (BigInt::zero(), BigInt::one());
    }
    let (a, b) = fibonacci_pair(n / 2);
    let c = &a * (&b * 2u32 - &a);
    let d = &a * &a + &b * &b;
    if n % 2 == 0 {
        (c, d)
    } else {
        let next = &c + &d;
        (d, next)
    }
}

/// n-th term of the sequence where every term is the sum of the previous
/// `order` terms, starting with `order - 1` zeros and a one
fn n_bonacci(order: usize, n: usize) -> BigInt {
    let mut window = vec![BigInt::zero(); order];
    window[order - 1] = BigInt::one();
    if n < order {
        return window[n].clone();
    }
    for _ in order..=n {
        let next: BigInt = window.iter().sum();
        window.remove(0);
        window.push(next);
    }
    window[order - 1].clone()
}

/// Terms of a linear recurrence with integer steps `a(n) = c1*a(n-1) + c2*a(n-2)`
fn two_term(seed0: i64, seed1: i64, c1: i64, c2: i64, n: usize) -> BigInt {
    let (mut a, mut b) = (BigInt::from(seed0), BigInt::from(seed1));
    for _ in 0..n {
        let next = &b * c1 + &a * c2;
        a = b;
        b = next;
    }
    a
}

fn fibonacci(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(int_item(fibonacci_pair(index_arg(&args[0], "fibonacci")?).0))
}

fn lucas(_: &mut Session, args: &[Item]) -> ItemResult {
    let (f, f1) = fibonacci_pair(index_arg(&args[0], "lucas")?);
    Ok(int_item(f1 * 2u32 - f))
}

macro_rules! bonacci_ops {
    ($( $id:ident, $order:expr; )+) => {
        $(
            fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
                Ok(int_item(n_bonacci($order, index_arg(&args[0], stringify!($id))?)))
            }
        )+
    };
}

bonacci_ops! {
    tribonacci, 3;
    tetranacci, 4;
    pentanacci, 5;
    hexanacci, 6;
    heptanacci, 7;
}

fn padovan(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = index_arg(&args[0], "padovan")?;
    let mut p = [BigInt::one(), BigInt::one(), BigInt::one()];
    for _ in 0..n {
        let next = &p[0] + &p[1];
        p = [p[1].clone(), p[2].clone(), next];
    }
    Ok(int_item(p[0].clone()))
}

fn pell(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(int_item(two_term(0, 1, 2, 1, index_arg(&args[0], "pell")?)))
}

fn jacobsthal(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(int_item(two_term(0, 1, 1, 2, index_arg(&args[0], "jacobsthal")?)))
}

/// Starts with 2; every next term is the product of all previous plus one
fn sylvester(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = index_arg(&args[0], "sylvester")?;
    if n == 0 {
        return Err(CalcError::InvalidArgument("sylvester".to_string(), "0".to_string()));
    }
    let mut term = BigInt::from(2);
    for _ in 1..n {
        term = &term * &term - &term + 1;
    }
    Ok(int_item(term))
}

fn harmonic(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].to_usize("harmonic")?;
    let h = if n <= MAX_INDEX {
        (1..=n).rev().map(|k| 1.0 / k as f64).sum()
    } else {
        let x = n as f64;
        x.ln() + EULER_GAMMA + 1.0 / (2.0 * x) - 1.0 / (12.0 * x * x)
    };
    Ok(Item::Number(Value::Float(h).normalize()))
}

/// Tangent numbers T(1) .. T(n): 1, 2, 16, 272, ...
fn tangent_numbers(n: usize) -> Vec<BigInt> {
    let mut t = vec![BigInt::zero(); n + 1];
    if n == 0 {
        return t;
    }
    t[1] = BigInt::one();
    for k in 2..=n {
        t[k] = &t[k - 1] * (k - 1);
    }
    for k in 2..=n {
        for j in k..=n {
            t[j] = &t[j - 1] * (j - k) + &t[j] * (j - k + 2);
        }
    }
    t
}

/// B(2k) = (-1)^(k-1) 2k T(k) / (4^k (4^k - 1)), with B(1) = -1/2
fn bernoulli_number(n: usize) -> BigRational {
    match n {
        0 => return BigRational::one(),
        1 => return BigRational::new(-BigInt::one(), BigInt::from(2)),
        _ if n % 2 == 1 => return BigRational::zero(),
        _ => {}
    }
    let k = n / 2;
    let t = tangent_numbers(k);
    let four_k = BigInt::one() << (2 * k);
    let numer = &t[k] * n;
    let denom = &four_k * (&four_k - 1);
    let b = BigRational::new(numer, denom);
    if k % 2 == 0 {
        -b
    } else {
        b
    }
}

fn bernoulli(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].to_usize("bernoulli")?;
    if n > MAX_BERNOULLI {
        return Err(CalcError::ArgumentOutOfRange("bernoulli".to_string(), n.to_string(), format!("0..{}", MAX_BERNOULLI)));
    }
    Ok(Item::Number(Value::Ratio(bernoulli_number(n)).normalize()))
}

/// `[ coefficients ] [ seeds ] n linearrecur`: the n-th term (counting from 1)
/// where every term is the sum of the previous terms times the coefficients,
/// oldest term first
fn linearrecur(_: &mut Session, args: &[Item]) -> ItemResult {
    let coeffs = args[0].values("linearrecur")?;
    let mut seeds = args[1].values("linearrecur")?;
    let n = index_arg(&args[2], "linearrecur")?;
    if coeffs.is_empty() || seeds.is_empty() {
        return Err(CalcError::InvalidArgument("linearrecur".to_string(), "[ ]".to_string()));
    }
    if n == 0 {
        return Err(CalcError::InvalidArgument("linearrecur".to_string(), "0".to_string()));
    }
    // missing seeds come from the recurrence truncated to the known terms
    while seeds.len() < coeffs.len() {
        let mut next = Value::zero();
        for (s, c) in seeds.iter().zip(coeffs.iter()) {
            next = next.add(s.clone().mul(c.clone())?)?;
        }
        seeds.push(next);
    }
    if n <= seeds.len() {
        return Ok(Item::Number(seeds[n - 1].clone()));
    }
    let k = coeffs.len();
    let mut window = seeds.split_off(seeds.len() - k);
    for _ in window.len() + seeds.len()..n {
        let mut next = Value::zero();
        for (w, c) in window.iter().zip(coeffs.iter()) {
            next = next.add(w.clone().mul(c.clone())?)?;
        }
        window.remove(0);
        window.push(next);
    }
    Ok(Item::Number(window[k - 1].clone()))
}

/// Digits in the given base, most significant first
fn base(_: &mut Session, args: &[Item]) -> ItemResult {
    let digits = args[0].values("base")?;
    let b = args[1].number("base")?.clone();
    let mut res = Value::zero();
    for d in digits {
        res = res.mul(b.clone())?.add(d)?;
    }
    Ok(Item::Number(res))
}

/// Greedy expansion of n/d into distinct unit fractions
fn egypt(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].number("egypt")?.to_bigint("egypt")?;
    let d = args[1].number("egypt")?.to_bigint("egypt")?;
    if !n.is_positive() || !d.is_positive() {
        return Err(CalcError::NotForNegativeInt("egypt".to_string()));
    }
    if n > d {
        return Err(CalcError::InvalidArgument("egypt".to_string(), format!("{}/{}", n, d)));
    }
    let mut rest = BigRational::new(n, d);
    let mut res = Vec::new();
    while !rest.is_zero() {
        if rest.numer().is_one() {
            res.push(Item::Number(Value::Ratio(rest).normalize()));
            break;
        }
        let unit = BigRational::new(BigInt::one(), rest.denom() / rest.numer() + 1);
        rest -= &unit;
        res.push(Item::Number(Value::Ratio(unit).normalize()));
    }
    Ok(Item::List(res))
}

fn continued_fraction_terms(x: BigRational, max_terms: usize) -> Vec<BigInt> {
    let mut x = x;
    let mut terms = Vec::new();
    while terms.len() < max_terms {
        let a = x.floor().to_integer();
        let rest = &x - BigRational::from_integer(a.clone());
        terms.push(a);
        if rest.is_zero() {
            break;
        }
        x = rest.recip();
    }
    terms
}

fn evaluate_cf(terms: &[BigInt]) -> Option<BigRational> {
    let mut iter = terms.iter().rev();
    let mut res = BigRational::from_integer(iter.next()?.clone());
    for a in iter {
        if res.is_zero() {
            return None;
        }
        res = BigRational::from_integer(a.clone()) + res.recip();
    }
    Some(res)
}

/// Value of a continued fraction `[ a0 a1 a2 ... ]`
fn cf(_: &mut Session, args: &[Item]) -> ItemResult {
    let terms: Result<Vec<BigInt>, CalcError> =
        args[0].values("cf")?.iter().map(|v| v.to_bigint("cf")).collect();
    let r = evaluate_cf(&terms?).ok_or_else(|| CalcError::DividedByZero("cf".to_string()))?;
    let (n, d) = (Value::Int(r.numer().clone()), Value::Int(r.denom().clone()));
    Ok(Item::Number(n.div(d)?))
}

/// Approximates n as `[ numerator denominator ]` using at most k terms of
/// its continued fraction
fn fraction(_: &mut Session, args: &[Item]) -> ItemResult {
    let x = args[0].number("fraction")?.clone().into_raw_ratio()?;
    let k = args[1].to_usize("fraction")?.max(1);
    let terms = continued_fraction_terms(x, k);
    let r = evaluate_cf(&terms).ok_or_else(|| CalcError::DividedByZero("fraction".to_string()))?;
    Ok(Item::List(vec![int_item(r.numer().clone()), int_item(r.denom().clone())]))
}

/// `n k repunit`: n ones written in base k
fn repunit(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = index_arg(&args[0], "repunit")?;
    let k = args[1].number("repunit")?.to_bigint("repunit")?;
    let mut res = BigInt::zero();
    for _ in 0..n {
        res = res * &k + 1;
    }
    Ok(int_item(res))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "number_theory";
    reg.add(OperatorInfo::new("fibonacci", &[Scalar], cat, "returns the nth Fibonacci number", fibonacci));
    reg.add(OperatorInfo::new("lucas", &[Scalar], cat, "returns the nth Lucas number", lucas));
    reg.add(OperatorInfo::new("tribonacci", &[Scalar], cat, "returns the nth tribonacci number", tribonacci));
    reg.add(OperatorInfo::new("tetranacci", &[Scalar], cat, "returns the nth tetranacci number", tetranacci));
    reg.add(OperatorInfo::new("pentanacci", &[Scalar], cat, "returns the nth pentanacci number", pentanacci));
    reg.add(OperatorInfo::new("hexanacci", &[Scalar], cat, "returns the nth hexanacci number", hexanacci));
    reg.add(OperatorInfo::new("heptanacci", &[Scalar], cat, "returns the nth heptanacci number", heptanacci));
    reg.add(OperatorInfo::new("padovan", &[Scalar], cat, "returns the nth Padovan number", padovan));
    reg.add(OperatorInfo::new("pell", &[Scalar], cat, "returns the nth Pell number", pell));
    reg.add(OperatorInfo::new("jacobsthal", &[Scalar], cat, "returns the nth Jacobsthal number", jacobsthal));
    reg.add(OperatorInfo::new("sylvester", &[Scalar], cat, "returns the nth term of Sylvester's sequence", sylvester));
    reg.add(OperatorInfo::new("harmonic", &[Scalar], cat, "returns the nth harmonic number", harmonic));
    reg.add(OperatorInfo::new("bernoulli", &[Scalar], cat, "returns the nth Bernoulli number", bernoulli));
    reg.add(OperatorInfo::new("linearrecur", &[List, List, Scalar], cat, "calculates the nth term of a linear recurrence", linearrecur));
    reg.add(OperatorInfo::new("base", &[List, Scalar], cat, "interprets a list of digits in base k", base));
    reg.add(OperatorInfo::new("egypt", &[Scalar, Scalar], cat, "calculates the greedy Egyptian fractions for n/d", egypt));
    reg.add(OperatorInfo::new("cf", &[List], cat, "evaluates a continued fraction", cf));
    reg.add(OperatorInfo::new("fraction", &[Scalar, Scalar], cat, "approximates n as a fraction using k continued fraction terms", fraction));
    reg.add(OperatorInfo::new("repunit", &[Scalar, Scalar], cat, "returns the nth repunit in base k", repunit));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::evaluate;

    fn eval(terms: &[&str]) -> String {
        let mut s = Session::new();
        match evaluate(terms, &mut s) {
            Ok(item) => item.to_string(),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_fibonacci_family() {
        assert_eq!(eval(&["0", "fib"]), "0");
        assert_eq!(eval(&["10", "fibonacci"]), "55");
        assert_eq!(eval(&["100", "fib"]), "354224848179261915075");
        assert_eq!(eval(&["1", "10", "range", "lucas"]), "[ 1, 3, 4, 7, 11, 18, 29, 47, 76, 123 ]");
        assert_eq!(eval(&["0", "9", "range", "tribonacci"]), "[ 0, 0, 1, 1, 2, 4, 7, 13, 24, 44 ]");
        assert_eq!(eval(&["10", "tetranacci"]), "56");
        assert_eq!(eval(&["0", "9", "range", "padovan"]), "[ 1, 1, 1, 2, 2, 3, 4, 5, 7, 9 ]");
        assert_eq!(eval(&["0", "6", "range", "pell"]), "[ 0, 1, 2, 5, 12, 29, 70 ]");
        assert_eq!(eval(&["0", "6", "range", "jacobsthal"]), "[ 0, 1, 1, 3, 5, 11, 21 ]");
        assert_eq!(eval(&["1", "5", "range", "sylvester"]), "[ 2, 3, 7, 43, 1807 ]");
    }

    #[test]
    fn test_recurrences() {
        assert_eq!(eval(&["[", "1", "1", "]", "[", "0", "1", "]", "10", "linearrecur"]), "34");
        assert_eq!(eval(&["[", "1", "1", "]", "[", "1", "]", "5", "linearrecur"]), "5");
        assert_eq!(eval(&["[", "1", "1", "]", "[", "2", "1", "]", "1", "linearrecur"]), "2");
        assert_eq!(eval(&["3", "10", "repunit"]), "111");
        assert_eq!(eval(&["4", "2", "repunit"]), "15");
    }

    #[test]
    fn test_rationals() {
        assert_eq!(eval(&["0", "bernoulli"]), "1");
        assert_eq!(eval(&["1", "bernoulli"]), "-1/2");
        assert_eq!(eval(&["4", "bernoulli"]), "-1/30");
        assert_eq!(eval(&["12", "bernoulli"]), "-691/2730");
        assert_eq!(eval(&["3", "bernoulli"]), "0");
        assert_eq!(eval(&["6", "bernoulli"]), "1/42");
        assert_eq!(eval(&["10", "bernoulli"]), "5/66");
        assert_eq!(eval(&["2001", "bernoulli"]), "error in arg 2:  argument 2001 of 'bernoulli' out of range (0..2000)");
        assert_eq!(eval(&["4", "13", "egypt"]), "[ 1/4, 1/18, 1/468 ]");
        assert_eq!(eval(&["[", "1", "2", "]", "cf"]), "1.5");
        assert_eq!(eval(&["pi", "4", "fraction"]), "[ 355, 113 ]");
        assert_eq!(eval(&["2", "harmonic"]), "1.5");
    }

    #[test]
    fn test_base() {
        assert_eq!(eval(&["[", "1", "0", "1", "]", "2", "base"]), "5");
        assert_eq!(eval(&["[", "1", "2", "3", "]", "10", "base"]), "123");
    }
}
