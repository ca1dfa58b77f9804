use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Num, One, Signed, Zero};

use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::value::*;

/// Longest digit string `dupdigits` will append
const MAX_DUP_DIGITS: usize = 100_000;
const MAX_PALINDROME_STEPS: usize = 100_000;

fn int_arg(item: &Item, op: &str) -> Result<BigInt, CalcError> {
    item.number(op)?.to_bigint(op)
}

fn natural_arg(item: &Item, op: &str) -> Result<BigInt, CalcError> {
    let n = int_arg(item, op)?;
    if n.is_negative() {
        return Err(CalcError::NotForNegativeInt(op.to_string()));
    }
    Ok(n)
}

fn steps_arg(item: &Item, op: &str, max: usize) -> Result<usize, CalcError> {
    let k = item.to_usize(op)?;
    if k > max {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), k.to_string(), format!("0..{}", max)));
    }
    Ok(k)
}

fn digit_string(n: &BigInt) -> String {
    n.abs().to_string()
}

fn digit_values(n: &BigInt) -> impl Iterator<Item = u32> {
    digit_string(n).into_bytes().into_iter().map(|b| (b - b'0') as u32)
}

fn int_item(n: BigInt) -> Item {
    Item::Number(Value::Int(n))
}

fn bool_item(b: bool) -> Item {
    Item::Number(Value::from(b))
}

/// The digits of n in reverse order, keeping the sign
pub fn reverse_digits(n: &BigInt) -> Result<BigInt, CalcError> {
    let reversed: String = digit_string(n).chars().rev().collect();
    let r = BigInt::from_str_radix(&reversed, 10).map_err(|_| CalcError::StrToInt(reversed.clone()))?;
    Ok(if n.is_negative() { -r } else { r })
}

pub fn is_palindrome(n: &BigInt) -> bool {
    let s = digit_string(n);
    s.bytes().eq(s.bytes().rev())
}

/// n followed by the digits of k
fn append_digits(n: &BigInt, k: &BigInt, count: usize) -> BigInt {
    let shifted = n * BigInt::from(10).pow(count as u32);
    if n.is_negative() {
        shifted - k
    } else {
        shifted + k
    }
}

fn digits(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "digits")?;
    Ok(Item::Number(digit_string(&n).len().into()))
}

fn sumdigits(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "sumdigits")?;
    let sum: u64 = digit_values(&n).map(u64::from).sum();
    Ok(Item::Number(sum.into()))
}

fn multiplydigits(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "multiplydigits")?;
    Ok(int_item(digit_values(&n).map(BigInt::from).product()))
}

fn reversal(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "reversal")?;
    Ok(int_item(reverse_digits(&n)?))
}

fn adddigits(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "adddigits")?;
    let k = natural_arg(&args[1], "adddigits")?;
    let count = digit_string(&k).len();
    Ok(int_item(append_digits(&n, &k, count)))
}

fn combinedigits(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut res = BigInt::zero();
    for item in args[0].list("combinedigits")? {
        let k = natural_arg(item, "combinedigits")?;
        let count = digit_string(&k).len();
        res = append_digits(&res, &k, count);
    }
    Ok(int_item(res))
}

/// Appends the last k digits of n to n
fn dupdigits(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "dupdigits")?;
    let k = steps_arg(&args[1], "dupdigits", MAX_DUP_DIGITS)?;
    let modulus = BigInt::from(10).pow(k as u32);
    let tail = n.abs().mod_floor(&modulus);
    Ok(int_item(append_digits(&n, &tail, k)))
}

fn ispalindrome(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(bool_item(is_palindrome(&int_arg(&args[0], "ispalindrome")?)))
}

/// Contains every decimal digit at least once
fn ispandigital(_: &mut Session, args: &[Item]) -> ItemResult {
    let s = digit_string(&int_arg(&args[0], "ispandigital")?);
    Ok(bool_item(('0'..='9').all(|c| s.contains(c))))
}

/// Equals the sum of its digits each raised to the number of digits
fn isnarcissistic(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = natural_arg(&args[0], "isnarcissistic")?;
    let count = digit_string(&n).len() as u32;
    let sum: BigInt = digit_values(&n).map(|d| BigInt::from(d).pow(count)).sum();
    Ok(bool_item(sum == n))
}

/// The two halves of n^2 add up to n
fn iskaprekar(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = natural_arg(&args[0], "iskaprekar")?;
    if n.is_one() {
        return Ok(bool_item(true));
    }
    if n < BigInt::from(9) {
        return Ok(bool_item(false));
    }
    let square = (&n * &n).to_string();
    let (head, tail) = square.split_at(square.len() / 2);
    let parse = |s: &str| BigInt::from_str_radix(s, 10).map_err(|_| CalcError::StrToInt(s.to_string()));
    Ok(bool_item(parse(head)? + parse(tail)? == n))
}

/// n^2 ends with the digits of n
fn isautomorphic(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = natural_arg(&args[0], "isautomorphic")?;
    Ok(bool_item((&n * &n).to_string().ends_with(&n.to_string())))
}

/// Divisible by the sum of its digits
fn isharshad(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = natural_arg(&args[0], "isharshad")?;
    if n.is_zero() {
        return Ok(bool_item(false));
    }
    let sum: BigInt = digit_values(&n).map(BigInt::from).sum();
    Ok(bool_item(n.is_multiple_of(&sum)))
}

/// Steps of multiplying the digits until a single digit is left
fn persistence(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut n = natural_arg(&args[0], "persistence")?;
    let mut steps = 0u64;
    while n >= BigInt::from(10) {
        n = digit_values(&n).map(BigInt::from).product();
        steps += 1;
    }
    Ok(Item::Number(steps.into()))
}

/// `n k findpalindrome`: adds the reversal of n to n until a palindrome
/// shows up, returning [ steps, palindrome ], or [ k, 0 ] after k steps
fn findpalindrome(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut next = natural_arg(&args[0], "findpalindrome")?;
    let k = steps_arg(&args[1], "findpalindrome", MAX_PALINDROME_STEPS)?;
    for i in 0..=k {
        if is_palindrome(&next) {
            return Ok(Item::List(vec![Item::Number(i.into()), int_item(next)]));
        }
        next = reverse_digits(&next)? + next;
    }
    Ok(Item::List(vec![Item::Number(k.into()), int_item(BigInt::zero())]))
}

/// At most k reversal additions, stopping early at a palindrome
fn reversal_addition(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut next = natural_arg(&args[0], "reversal_addition")?;
    let k = steps_arg(&args[1], "reversal_addition", MAX_PALINDROME_STEPS)?;
    for _ in 0..k {
        if is_palindrome(&next) {
            break;
        }
        next = reverse_digits(&next)? + next;
    }
    Ok(int_item(next))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "lexicographic";
    reg.add(OperatorInfo::new("digits", &[Scalar], cat, "counts the decimal digits of n", digits));
    reg.add(OperatorInfo::new("sumdigits", &[Scalar], cat, "sums the decimal digits of n", sumdigits));
    reg.add(OperatorInfo::new("multiplydigits", &[Scalar], cat, "multiplies the decimal digits of n", multiplydigits));
    reg.add(OperatorInfo::new("reversal", &[Scalar], cat, "reverses the decimal digits of n", reversal));
    reg.add(OperatorInfo::new("adddigits", &[Scalar, Scalar], cat, "appends the digits of k to n", adddigits));
    reg.add(OperatorInfo::new("combinedigits", &[List], cat, "concatenates the digits of a list of numbers", combinedigits));
    reg.add(OperatorInfo::new("dupdigits", &[Scalar, Scalar], cat, "appends the last k digits of n to n", dupdigits));
    reg.add(OperatorInfo::new("ispalindrome", &[Scalar], cat, "returns 1 if n reads the same backwards", ispalindrome));
    reg.add(OperatorInfo::new("ispandigital", &[Scalar], cat, "returns 1 if n contains every digit", ispandigital));
    reg.add(OperatorInfo::new("isnarcissistic", &[Scalar], cat, "returns 1 if n is a narcissistic number", isnarcissistic));
    reg.add(OperatorInfo::new("iskaprekar", &[Scalar], cat, "returns 1 if n is a Kaprekar number", iskaprekar));
    reg.add(OperatorInfo::new("isautomorphic", &[Scalar], cat, "returns 1 if n^2 ends with n", isautomorphic));
    reg.add(OperatorInfo::new("isharshad", &[Scalar], cat, "returns 1 if n is divisible by its digit sum", isharshad));
    reg.add(OperatorInfo::new("persistence", &[Scalar], cat, "returns the multiplicative persistence of n", persistence));
    reg.add(OperatorInfo::new(
        "findpalindrome",
        &[Scalar, Scalar],
        cat,
        "finds a palindrome by reversal additions, at most k steps",
        findpalindrome,
    ));
    reg.add(OperatorInfo::new(
        "reversal_addition",
        &[Scalar, Scalar],
        cat,
        "performs k reversal additions on n",
        reversal_addition,
    ));
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
    fn test_digit_sums() {
        assert_eq!(eval(&["12345", "digits"]), "5");
        assert_eq!(eval(&["12345", "sumdigits"]), "15");
        assert_eq!(eval(&["2345", "multiplydigits"]), "120");
        assert_eq!(eval(&["39", "persistence"]), "3");
    }

    #[test]
    fn test_reversal() {
        assert_eq!(eval(&["120", "reversal"]), "21");
        assert_eq!(eval(&["1090", "reversal"]), "901");
        assert_eq!(eval(&["-120", "reversal"]), "-21");
        assert_eq!(eval(&["89", "24", "findpalindrome"]), "[ 24, 8813200023188 ]");
        assert_eq!(eval(&["10", "3", "findpalindrome"]), "[ 1, 11 ]");
        assert_eq!(eval(&["196", "2", "findpalindrome"]), "[ 2, 0 ]");
        assert_eq!(eval(&["87", "1", "reversal_addition"]), "165");
        assert_eq!(eval(&["87", "4", "reversal_addition"]), "4884");
    }

    #[test]
    fn test_building() {
        assert_eq!(eval(&["12", "345", "adddigits"]), "12345");
        assert_eq!(eval(&["12", "0", "adddigits"]), "120");
        assert_eq!(eval(&["[", "1", "23", "0", "456", "]", "combinedigits"]), "1230456");
        assert_eq!(eval(&["1234", "2", "dupdigits"]), "123434");
    }

    #[test]
    fn test_predicates() {
        assert_eq!(eval(&["12321", "ispalindrome"]), "1");
        assert_eq!(eval(&["12345", "ispalindrome"]), "0");
        assert_eq!(eval(&["1234567890", "ispandigital"]), "1");
        assert_eq!(eval(&["123456789", "ispandigital"]), "0");
        assert_eq!(eval(&["153", "isnarcissistic"]), "1");
        assert_eq!(eval(&["154", "isnarcissistic"]), "0");
        assert_eq!(eval(&["45", "iskaprekar"]), "1");
        assert_eq!(eval(&["297", "iskaprekar"]), "1");
        assert_eq!(eval(&["46", "iskaprekar"]), "0");
        assert_eq!(eval(&["76", "isautomorphic"]), "1");
        assert_eq!(eval(&["18", "isharshad"]), "1");
        assert_eq!(eval(&["19", "isharshad"]), "0");
    }
}
