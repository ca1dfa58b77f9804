use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::errors::*;
use crate::item::*;
use crate::math::gamma_f64;
use crate::numbertheory::fibonacci_pair;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::value::*;

const MAX_FACTORIAL: usize = 100_000;
const MAX_INDEX: usize = 10_000;
// products and triangles whose size grows quadratically with n
const MAX_QUADRATIC_INDEX: usize = 1_000;
const MAX_BELL: usize = 2_000;

fn count_arg(item: &Item, op: &str, max: usize) -> Result<usize, CalcError> {
    let n = item.to_usize(op)?;
    if n > max {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), n.to_string(), format!("0..{}", max)));
    }
    Ok(n)
}

fn int_item(i: BigInt) -> Item {
    Item::Number(Value::Int(i))
}

pub(crate) fn factorial_big(n: usize) -> BigInt {
    (2..=n).fold(BigInt::one(), |acc, i| acc * i)
}

/// Binomial coefficient for any integer n, including negative ones
pub(crate) fn binomial_big(n: &BigInt, k: usize) -> BigInt {
    let mut res = BigInt::one();
    for i in 0..k {
        res = res * (n - i) / (i + 1);
    }
    res
}

fn binom(n: usize, k: usize) -> BigInt {
    if k > n {
        return BigInt::zero();
    }
    binomial_big(&BigInt::from(n), k.min(n - k))
}

fn factorial(_: &mut Session, args: &[Item]) -> ItemResult {
    let v = args[0].number("factorial")?;
    if v.is_integer() && !v.is_complex() {
        if v.is_negative() {
            return Err(CalcError::NotForNegativeInt("factorial".to_string()));
        }
        return Ok(int_item(factorial_big(count_arg(&args[0], "factorial", MAX_FACTORIAL)?)));
    }
    let x = v.to_f64("factorial")?;
    Ok(Item::Number(Value::Float(gamma_f64(x + 1.0))))
}

/// `n * (n-2) * (n-4) * ...`
fn doublefac(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "doublefac", MAX_FACTORIAL)?;
    Ok(int_item((1..=n).rev().step_by(2).fold(BigInt::one(), |acc, i| acc * i)))
}

/// `n! - (n-1)! + (n-2)! - ...`
fn altfac(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "altfac", MAX_INDEX)?;
    let mut res = BigInt::zero();
    let mut fact = BigInt::one();
    for i in 1..=n {
        fact *= i;
        if (n - i) % 2 == 0 {
            res += &fact;
        } else {
            res -= &fact;
        }
    }
    Ok(int_item(res))
}

/// Product of `k^k` for k up to n
fn hyperfac(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "hyperfac", MAX_QUADRATIC_INDEX)?;
    let res = (1..=n).fold(BigInt::one(), |acc, k| acc * num_traits::pow(BigInt::from(k), k));
    Ok(int_item(res))
}

/// Product of the factorials up to n
fn superfac(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "superfac", MAX_QUADRATIC_INDEX)?;
    let mut fact = BigInt::one();
    let mut res = BigInt::one();
    for k in 1..=n {
        fact *= k;
        res *= &fact;
    }
    Ok(int_item(res))
}

fn fibonorial(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "fibonorial", MAX_QUADRATIC_INDEX)?;
    let (mut a, mut b) = fibonacci_pair(1);
    let mut res = BigInt::one();
    for _ in 1..=n {
        res *= &a;
        let next = &a + &b;
        a = b;
        b = next;
    }
    Ok(int_item(res))
}

fn binomial(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].number("binomial")?;
    let k = args[1].number("binomial")?;
    if n.is_integer() && k.is_integer() && !n.is_complex() && !k.is_complex() {
        let n = n.to_bigint("binomial")?;
        let k = k.to_bigint("binomial")?;
        if k.is_negative() || (!n.is_negative() && k > n) {
            return Ok(Item::int(0));
        }
        let k = k.to_usize().ok_or_else(|| {
            CalcError::ArgumentOutOfRange("binomial".to_string(), k.to_string(), "machine size".to_string())
        })?;
        let k = match (&n - k).to_usize() {
            Some(rest) if !n.is_negative() && rest < k => rest,
            _ => k,
        };
        return Ok(int_item(binomial_big(&n, k)));
    }
    let n = n.to_f64("binomial")?;
    let k = k.to_f64("binomial")?;
    let res = gamma_f64(n + 1.0) / (gamma_f64(k + 1.0) * gamma_f64(n - k + 1.0));
    Ok(Item::Number(Value::Float(res).normalize()))
}

/// Number of ordered arrangements of r items taken from n
fn perm(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "perm", MAX_FACTORIAL)?;
    let r = args[1].to_usize("perm")?;
    if r > n {
        return Err(CalcError::ArgumentOutOfRange("perm".to_string(), r.to_string(), format!("0..{}", n)));
    }
    Ok(int_item((n - r + 1..=n).fold(BigInt::one(), |acc, i| acc * i)))
}

/// Bell numbers through the Bell triangle
fn bell(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "bell", MAX_BELL)?;
    let mut row = vec![BigInt::one()];
    for _ in 0..n {
        let mut next = Vec::with_capacity(row.len() + 1);
        let mut last = row[row.len() - 1].clone();
        next.push(last.clone());
        for v in &row {
            last = &last + v;
            next.push(last.clone());
        }
        row = next;
    }
    Ok(int_item(row[0].clone()))
}

fn catalan(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "catalan", MAX_FACTORIAL)?;
    Ok(int_item(binom(2 * n, n) / (n + 1)))
}

/// Central Delannoy numbers
fn delannoy(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "delannoy", MAX_INDEX)?;
    let mut res = BigInt::zero();
    // C(n, k) and C(n + k, k)
    let (mut a, mut b) = (BigInt::one(), BigInt::one());
    for k in 0..=n {
        res += &a * &b;
        a = a * (n - k) / (k + 1);
        b = b * (n + k + 1) / (k + 1);
    }
    Ok(int_item(res))
}

fn motzkin(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "motzkin", MAX_INDEX)?;
    let (mut prev, mut cur) = (BigInt::one(), BigInt::one());
    for i in 2..=n {
        let next = (&cur * (2 * i + 1) + &prev * (3 * i - 3)) / (i + 2);
        prev = cur;
        cur = next;
    }
    Ok(int_item(cur))
}

/// Large Schroeder numbers, counted from 1
fn schroeder(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "schroeder", MAX_INDEX)?;
    if n == 0 {
        return Err(CalcError::InvalidArgument("schroeder".to_string(), "0".to_string()));
    }
    if n == 1 {
        return Ok(Item::int(1));
    }
    let m = n - 1;
    let mut res = BigInt::zero();
    // 2^k, C(m, k) and C(m, k - 1)
    let (mut pow2, mut a, mut b) = (BigInt::from(2), BigInt::from(m), BigInt::one());
    for k in 1..=m {
        res += &pow2 * &a * &b;
        pow2 <<= 1usize;
        let next = &a * (m - k) / (k + 1);
        b = std::mem::replace(&mut a, next);
    }
    Ok(int_item(res / m))
}

fn aperynum(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "aperynum", MAX_INDEX)?;
    let mut res = BigInt::zero();
    let (mut a, mut b) = (BigInt::one(), BigInt::one());
    for k in 0..=n {
        res += &a * &a * &b * &b;
        a = a * (n - k) / (k + 1);
        b = b * (n + k + 1) / (k + 1);
    }
    Ok(int_item(res))
}

/// Row n of Pascal's triangle, counting from 1
fn pascal_triangle(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "pascal_triangle", MAX_INDEX)?;
    if n == 0 {
        return Err(CalcError::InvalidArgument("pascal_triangle".to_string(), "0".to_string()));
    }
    let mut row = Vec::with_capacity(n);
    let mut c = BigInt::one();
    for k in 0..n {
        let next = &c * (n - 1 - k) / (k + 1);
        row.push(int_item(std::mem::replace(&mut c, next)));
    }
    Ok(Item::List(row))
}

/// Partitions of n through Euler's pentagonal number theorem
fn partitions(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "partitions", MAX_INDEX)?;
    let mut p = vec![BigInt::zero(); n + 1];
    p[0] = BigInt::one();
    for i in 1..=n {
        let mut total = BigInt::zero();
        for k in 1.. {
            let pent1 = k * (3 * k - 1) / 2;
            if pent1 > i {
                break;
            }
            let pent2 = k * (3 * k + 1) / 2;
            let mut term = p[i - pent1].clone();
            if pent2 <= i {
                term += &p[i - pent2];
            }
            if k % 2 == 1 {
                total += term;
            } else {
                total -= term;
            }
        }
        p[i] = total;
    }
    Ok(int_item(p[n].clone()))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "combinatorics";
    reg.add(OperatorInfo::new("factorial", &[Scalar], cat, "calculates n!", factorial));
    reg.add(OperatorInfo::new("doublefac", &[Scalar], cat, "calculates the double factorial of n", doublefac));
    reg.add(OperatorInfo::new("altfac", &[Scalar], cat, "calculates the alternating factorial of n", altfac));
    reg.add(OperatorInfo::new("hyperfac", &[Scalar], cat, "calculates the hyperfactorial of n", hyperfac));
    reg.add(OperatorInfo::new("superfac", &[Scalar], cat, "calculates the superfactorial of n", superfac));
    reg.add(OperatorInfo::new("fibonorial", &[Scalar], cat, "multiplies the first n Fibonacci numbers", fibonorial));
    reg.add(OperatorInfo::new("binomial", &[Scalar, Scalar], cat, "calculates the binomial coefficient of n and k", binomial));
    reg.add(OperatorInfo::new("perm", &[Scalar, Scalar], cat, "calculates the permutations of r items out of n", perm));
    reg.add(OperatorInfo::new("bell", &[Scalar], cat, "returns the nth Bell number", bell));
    reg.add(OperatorInfo::new("catalan", &[Scalar], cat, "returns the nth Catalan number", catalan));
    reg.add(OperatorInfo::new("delannoy", &[Scalar], cat, "returns the nth central Delannoy number", delannoy));
    reg.add(OperatorInfo::new("motzkin", &[Scalar], cat, "returns the nth Motzkin number", motzkin));
    reg.add(OperatorInfo::new("schroeder", &[Scalar], cat, "returns the nth Schroeder number", schroeder));
    reg.add(OperatorInfo::new("aperynum", &[Scalar], cat, "returns the nth Apery number", aperynum));
    reg.add(OperatorInfo::new("pascal_triangle", &[Scalar], cat, "returns the nth row of Pascal's triangle", pascal_triangle));
    reg.add(OperatorInfo::new("partitions", &[Scalar], cat, "counts the partitions of n", partitions));
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
    fn test_factorials() {
        assert_eq!(eval(&["5", "!"]), "120");
        assert_eq!(eval(&["0", "factorial"]), "1");
        assert_eq!(eval(&["25", "factorial"]), "15511210043330985984000000");
        assert_eq!(eval(&["0.5", "factorial", "2", "*", "pi", "sqrt", "/", "1000", "*", "round"]), "1000");
        assert_eq!(eval(&["7", "!!"]), "105");
        assert_eq!(eval(&["8", "doublefac"]), "384");
        assert_eq!(eval(&["4", "altfac"]), "19");
        assert_eq!(eval(&["3", "hyperfac"]), "108");
        assert_eq!(eval(&["4", "superfac"]), "288");
        assert_eq!(eval(&["5", "fibonorial"]), "30");
        assert_eq!(eval(&["-1", "!"]), "error in arg 2:  'factorial' is not supported for negative numbers");
    }

    #[test]
    fn test_binomial() {
        assert_eq!(eval(&["10", "3", "binomial"]), "120");
        assert_eq!(eval(&["52", "5", "nCr"]), "2598960");
        assert_eq!(eval(&["3", "5", "binomial"]), "0");
        assert_eq!(eval(&["-4", "2", "binomial"]), "10");
        assert_eq!(eval(&["10", "3", "perm"]), "720");
        assert_eq!(eval(&["5", "pascal_triangle"]), "[ 1, 4, 6, 4, 1 ]");
    }

    #[test]
    fn test_sequences() {
        assert_eq!(eval(&["0", "6", "range", "bell"]), "[ 1, 1, 2, 5, 15, 52, 203 ]");
        assert_eq!(eval(&["0", "6", "range", "catalan"]), "[ 1, 1, 2, 5, 14, 42, 132 ]");
        assert_eq!(eval(&["0", "4", "range", "delannoy"]), "[ 1, 3, 13, 63, 321 ]");
        assert_eq!(eval(&["0", "7", "range", "motzkin"]), "[ 1, 1, 2, 4, 9, 21, 51, 127 ]");
        assert_eq!(eval(&["1", "5", "range", "schroeder"]), "[ 1, 2, 6, 22, 90 ]");
        assert_eq!(eval(&["0", "3", "range", "aperynum"]), "[ 1, 5, 73, 1445 ]");
        assert_eq!(eval(&["100", "partitions"]), "190569292");
        assert_eq!(eval(&["2001", "bell"]), "error in arg 2:  argument 2001 of 'bell' out of range (0..2000)");
        assert_eq!(eval(&["1001", "hyperfac"]), "error in arg 2:  argument 1001 of 'hyperfac' out of range (0..1000)");
        assert_eq!(eval(&["30", "motzkin"]), "1697385471211");
        assert_eq!(eval(&["20", "delannoy"]), "260543813797441");
    }
}
