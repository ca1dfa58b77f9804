use std::cmp::Ordering;

use crate::errors::*;
use crate::item::*;
use crate::measurement::Measurement;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::units::Units;
use crate::value::*;

// power towers grow past any useful size very fast
const MAX_TETRATION: i64 = 1000;

fn invalid(op: &str, item: &Item) -> CalcError {
    CalcError::InvalidArgument(op.to_string(), item.to_string())
}

fn scaled(m: Measurement, v: Value, op: &str) -> ItemResult {
    let value = match op {
        "multiply" => m.value.mul(v)?,
        _ => m.value.div(v)?,
    };
    Ok(Measurement::new(value, m.units).into())
}

/// Adds numbers, measurements and time offsets to dates
pub fn add_items(a: Item, b: Item) -> ItemResult {
    match (a, b) {
        (Item::Number(x), Item::Number(y)) => Ok(Item::Number(x.add(y)?)),
        (Item::Measure(m1), Item::Measure(m2)) => m1.add(m2),
        (Item::Measure(m), Item::Number(v)) | (Item::Number(v), Item::Measure(m)) => {
            Ok(Measurement::new(m.value.add(v)?, m.units).into())
        }
        (Item::Time(t), Item::Measure(m)) | (Item::Measure(m), Item::Time(t)) => Ok(Item::Time(t.add_duration(&m)?)),
        (_, b) => Err(invalid("add", &b)),
    }
}

pub fn subtract_items(a: Item, b: Item) -> ItemResult {
    match (a, b) {
        (Item::Number(x), Item::Number(y)) => Ok(Item::Number(x.sub(y)?)),
        (Item::Measure(m1), Item::Measure(m2)) => m1.sub(m2),
        (Item::Measure(m), Item::Number(v)) => Ok(Measurement::new(m.value.sub(v)?, m.units).into()),
        (Item::Number(v), Item::Measure(m)) => Ok(Measurement::new(v.sub(m.value)?, m.units).into()),
        (Item::Time(t), Item::Measure(m)) => {
            let back = Measurement::new(m.value.negate()?, m.units);
            Ok(Item::Time(t.add_duration(&back)?))
        }
        (Item::Time(t1), Item::Time(t2)) => Ok(Item::Measure(t1.difference(&t2)?)),
        (_, b) => Err(invalid("subtract", &b)),
    }
}

pub fn multiply_items(a: Item, b: Item) -> ItemResult {
    match (a, b) {
        (Item::Number(x), Item::Number(y)) => Ok(Item::Number(x.mul(y)?)),
        (Item::Measure(m1), Item::Measure(m2)) => m1.mul(m2),
        (Item::Measure(m), Item::Number(v)) | (Item::Number(v), Item::Measure(m)) => scaled(m, v, "multiply"),
        (_, b) => Err(invalid("multiply", &b)),
    }
}

pub fn divide_items(a: Item, b: Item) -> ItemResult {
    match (a, b) {
        (Item::Number(x), Item::Number(y)) => Ok(Item::Number(x.div(y)?)),
        (Item::Measure(m1), Item::Measure(m2)) => m1.div(m2),
        (Item::Measure(m), Item::Number(v)) => scaled(m, v, "divide"),
        (Item::Number(v), Item::Measure(m)) => {
            Ok(Measurement::new(v.div(m.value)?, Units::new().divide(&m.units)).into())
        }
        (_, b) => Err(invalid("divide", &b)),
    }
}

pub fn power_items(a: Item, b: &Value) -> ItemResult {
    match a {
        Item::Number(x) => Ok(Item::Number(x.power(b.clone())?)),
        Item::Measure(m) => {
            if !b.is_integer() {
                return Err(CalcError::OnlyInt("power".to_string()));
            }
            m.power(b)
        }
        other => Err(invalid("power", &other)),
    }
}

/// Orders two numbers, two compatible measurements or two dates
pub fn compare_items(a: &Item, b: &Item, op: &str) -> Result<Ordering, CalcError> {
    match (a, b) {
        (Item::Number(x), Item::Number(y)) => x.compare(y),
        (Item::Measure(m1), Item::Measure(m2)) => m1.value.compare(&m2.convert_value(&m1.units)?),
        (Item::Time(t1), Item::Time(t2)) => Ok(t1.unix().cmp(&t2.unix())),
        _ => Err(invalid(op, b)),
    }
}

pub fn items_equal(a: &Item, b: &Item) -> Result<bool, CalcError> {
    match (a, b) {
        (Item::Number(x), Item::Number(y)) => x.is_equal(y),
        (Item::Measure(m1), Item::Measure(m2)) => match m2.convert_value(&m1.units) {
            Ok(v) => m1.value.is_equal(&v),
            Err(CalcError::IncompatibleUnits(..)) => Ok(false),
            Err(e) => Err(e),
        },
        (Item::Time(t1), Item::Time(t2)) => Ok(t1 == t2),
        (Item::Text(s1), Item::Text(s2)) => Ok(s1 == s2),
        (Item::List(l1), Item::List(l2)) => {
            if l1.len() != l2.len() {
                return Ok(false);
            }
            for (i1, i2) in l1.iter().zip(l2.iter()) {
                if !items_equal(i1, i2)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

/// Applies `f` to a number or to the magnitude of a measurement
fn map_value(item: &Item, op: &str, f: impl Fn(Value) -> CalcResult) -> ItemResult {
    match item {
        Item::Number(v) => Ok(Item::Number(f(v.clone())?)),
        Item::Measure(m) => Ok(Measurement::new(f(m.value.clone())?, m.units.clone()).into()),
        _ => Err(CalcError::ExpectedNumber(op.to_string())),
    }
}

fn map_number(item: &Item, op: &str, f: impl Fn(Value) -> CalcResult) -> ItemResult {
    Ok(Item::Number(f(item.number(op)?.clone())?))
}

macro_rules! binary_op {
    ($id:ident, $func:ident) => {
        fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
            $func(args[0].clone(), args[1].clone())
        }
    };
}

binary_op!(add, add_items);
binary_op!(subtract, subtract_items);
binary_op!(multiply, multiply_items);
binary_op!(divide, divide_items);

macro_rules! keep_units_op {
    ($id:ident, $method:ident) => {
        fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
            map_value(&args[0], stringify!($id), |v| v.$method())
        }
    };
}

keep_units_op!(negative, negate);
keep_units_op!(abs, abs);
keep_units_op!(floor, floor);
keep_units_op!(ceiling, ceil);
keep_units_op!(round, round);
keep_units_op!(nint, round);

macro_rules! number_op {
    ($id:ident, $method:ident) => {
        fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
            map_number(&args[0], stringify!($id), |v| v.$method())
        }
    };
}

number_op!(sign, signum);
number_op!(root2, sqrt);
number_op!(root3, cbrt);
number_op!(argument, arg);
number_op!(conjugate, conj);
number_op!(real, re);
number_op!(imaginary, im);

fn modulo(_: &mut Session, args: &[Item]) -> ItemResult {
    map_value(&args[0], "modulo", |v| v.modulo(args[1].number("modulo")?.clone()))
}

fn reciprocal(_: &mut Session, args: &[Item]) -> ItemResult {
    divide_items(Item::int(1), args[0].clone())
}

fn power(_: &mut Session, args: &[Item]) -> ItemResult {
    power_items(args[0].clone(), args[1].number("power")?)
}

fn square(_: &mut Session, args: &[Item]) -> ItemResult {
    power_items(args[0].clone(), &Value::from(2i64))
}

fn cube(_: &mut Session, args: &[Item]) -> ItemResult {
    power_items(args[0].clone(), &Value::from(3i64))
}

fn root(_: &mut Session, args: &[Item]) -> ItemResult {
    let k = args[1].number("root")?.clone();
    map_number(&args[0], "root", |v| v.root(k.clone()))
}

fn hypot(_: &mut Session, args: &[Item]) -> ItemResult {
    let a = args[0].number("hypot")?.clone();
    let b = args[1].number("hypot")?.clone();
    let sum = a.clone().mul(a)?.add(b.clone().mul(b)?)?;
    Ok(Item::Number(sum.sqrt()?))
}

macro_rules! compare_op {
    ($id:ident, $($ord:pat)|+) => {
        fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
            let ord = compare_items(&args[0], &args[1], stringify!($id))?;
            Ok(Item::from(matches!(ord, $($ord)|+)))
        }
    };
}

compare_op!(greater, Ordering::Greater);
compare_op!(less, Ordering::Less);
compare_op!(not_greater, Ordering::Less | Ordering::Equal);
compare_op!(not_less, Ordering::Greater | Ordering::Equal);

fn equal(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::from(items_equal(&args[0], &args[1])?))
}

fn not_equal(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::from(!items_equal(&args[0], &args[1])?))
}

fn is_divisible(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].number("is_divisible")?.clone();
    let k = args[1].number("is_divisible")?.clone();
    if k.is_zero() {
        return Ok(Item::from(false));
    }
    Ok(Item::from(n.modulo(k)?.is_zero()))
}

fn issquare(_: &mut Session, args: &[Item]) -> ItemResult {
    let v = args[0].number("issquare")?;
    if !v.is_integer() || v.is_negative() {
        return Ok(Item::from(false));
    }
    let n = v.to_bigint("issquare")?;
    let r = n.sqrt();
    Ok(Item::from(&r * &r == n))
}

/// `n` raised to itself `k` times
fn tetrate(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].number("tetrate")?.clone();
    let k = args[1].to_i64("tetrate")?;
    if k < 0 || k > MAX_TETRATION {
        return Err(CalcError::ArgumentOutOfRange(
            "tetrate".to_string(),
            k.to_string(),
            format!("0..{}", MAX_TETRATION),
        ));
    }
    let mut res = Value::one();
    for _ in 0..k {
        res = n.clone().power(res)?;
    }
    Ok(Item::Number(res))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "arithmetic";
    reg.add(OperatorInfo::new("add", &[Scalar, Scalar], cat, "adds n to k", add));
    reg.add(OperatorInfo::new("subtract", &[Scalar, Scalar], cat, "subtracts k from n", subtract));
    reg.add(OperatorInfo::new("multiply", &[Scalar, Scalar], cat, "multiplies n by k", multiply));
    reg.add(OperatorInfo::new("divide", &[Scalar, Scalar], cat, "divides n by k", divide));
    reg.add(OperatorInfo::new("modulo", &[Scalar, Scalar], cat, "calculates n modulo k", modulo));
    reg.add(OperatorInfo::new("negative", &[Scalar], cat, "calculates the negative of n", negative));
    reg.add(OperatorInfo::new("reciprocal", &[Scalar], cat, "returns the reciprocal of n", reciprocal));
    reg.add(OperatorInfo::new("abs", &[Scalar], cat, "calculates the absolute value of n", abs));
    reg.add(OperatorInfo::new("sign", &[Scalar], cat, "returns the sign of a value", sign));
    reg.add(OperatorInfo::new("floor", &[Scalar], cat, "calculates the next lowest integer for n", floor));
    reg.add(OperatorInfo::new("ceiling", &[Scalar], cat, "returns the next highest integer for n", ceiling));
    reg.add(OperatorInfo::new("round", &[Scalar], cat, "rounds n to the nearest integer", round));
    reg.add(OperatorInfo::new("nint", &[Scalar], cat, "returns the nearest integer to n", nint));
    reg.add(OperatorInfo::new("power", &[Scalar, Scalar], cat, "calculates the kth power of n", power));
    reg.add(OperatorInfo::new("root", &[Scalar, Scalar], cat, "calculates the kth root of n", root));
    reg.add(OperatorInfo::new("root2", &[Scalar], cat, "calculates the square root of n", root2));
    reg.add(OperatorInfo::new("root3", &[Scalar], cat, "calculates the cube root of n", root3));
    reg.add(OperatorInfo::new("square", &[Scalar], cat, "calculates the square of n", square));
    reg.add(OperatorInfo::new("cube", &[Scalar], cat, "calculates the cube of n", cube));
    reg.add(OperatorInfo::new("hypot", &[Scalar, Scalar], cat, "calculates the hypotenuse of n and k", hypot));
    reg.add(OperatorInfo::new("tetrate", &[Scalar, Scalar], cat, "tetrates n by k", tetrate));
    reg.add(OperatorInfo::new("equal", &[Scalar, Scalar], cat, "returns 1 if n equals k, otherwise returns 0", equal));
    reg.add(OperatorInfo::new("not_equal", &[Scalar, Scalar], cat, "returns 1 if n does not equal k", not_equal));
    reg.add(OperatorInfo::new("greater", &[Scalar, Scalar], cat, "returns 1 if n is greater than k", greater));
    reg.add(OperatorInfo::new("less", &[Scalar, Scalar], cat, "returns 1 if n is less than k", less));
    reg.add(OperatorInfo::new("not_greater", &[Scalar, Scalar], cat, "returns 1 if n is not greater than k", not_greater));
    reg.add(OperatorInfo::new("not_less", &[Scalar, Scalar], cat, "returns 1 if n is not less than k", not_less));
    reg.add(OperatorInfo::new("is_divisible", &[Scalar, Scalar], cat, "returns 1 if n is divisible by k", is_divisible));
    reg.add(OperatorInfo::new("issquare", &[Scalar], cat, "returns 1 if n is a perfect square", issquare));
    let cat = "complex_math";
    reg.add(OperatorInfo::new("argument", &[Scalar], cat, "calculates the complex argument of n", argument));
    reg.add(OperatorInfo::new("conjugate", &[Scalar], cat, "calculates the complex conjugate of n", conjugate));
    reg.add(OperatorInfo::new("real", &[Scalar], cat, "returns the real part of a complex number", real));
    reg.add(OperatorInfo::new("imaginary", &[Scalar], cat, "returns the imaginary part of n", imaginary));
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
    fn test_numbers() {
        assert_eq!(eval(&["5", "2", "/"]), "2.5");
        assert_eq!(eval(&["6", "3", "/"]), "2");
        assert_eq!(eval(&["-7", "3", "mod"]), "-1");
        assert_eq!(eval(&["2", "100", "**"]), "1267650600228229401496703205376");
        assert_eq!(eval(&["27", "3", "root"]), "3");
        assert_eq!(eval(&["3", "4", "hypot"]), "5");
        assert_eq!(eval(&["2", "3", "tetrate"]), "16");
        assert_eq!(eval(&["1", "0", "/"]), "error in arg 3:  '1' divided by zero");
    }

    #[test]
    fn test_comparisons() {
        assert_eq!(eval(&["3", "3.0", "equal"]), "1");
        assert_eq!(eval(&["3", "4", "!="]), "1");
        assert_eq!(eval(&["3", "4", "<="]), "1");
        assert_eq!(eval(&["5", "4", "not_greater"]), "0");
        assert_eq!(eval(&["1", "km", "999", "m", ">"]), "1");
        assert_eq!(eval(&["1000", "m", "1", "km", "=="]), "1");
    }

    #[test]
    fn test_predicates() {
        assert_eq!(eval(&["1024", "issquare"]), "1");
        assert_eq!(eval(&["1023", "issquare"]), "0");
        assert_eq!(eval(&["12", "4", "is_divisible"]), "1");
        assert_eq!(eval(&["12", "5", "is_divisible"]), "0");
    }

    #[test]
    fn test_measurements() {
        assert_eq!(eval(&["2", "meters", "3", "*"]), "6 meter");
        assert_eq!(eval(&["1", "km", "500", "m", "+"]), "1.5 kilometer");
        assert_eq!(eval(&["10", "meters", "2", "seconds", "/", "unit_type"]), "velocity");
        assert_eq!(eval(&["3", "meters", "-2", "*", "abs"]), "6 meter");
    }

    #[test]
    fn test_dates() {
        let mut s = Session::new();
        let res = evaluate(&["[", "2020", "1", "31", "]", "maketime", "1", "month", "+"], &mut s).unwrap();
        assert_eq!(res.to_string(), "2020-02-29");
        let res = evaluate(
            &["[", "2020", "3", "1", "]", "maketime", "[", "2020", "1", "1", "]", "maketime", "-"],
            &mut s,
        )
        .unwrap();
        assert_eq!(res.to_string(), "60 day");
    }

    #[test]
    fn test_complex() {
        assert_eq!(eval(&["3+4j", "abs"]), "5");
        assert_eq!(eval(&["3+4j", "re"]), "3");
        assert_eq!(eval(&["3+4j", "im"]), "4");
        assert_eq!(eval(&["-4", "sqrt", "im"]), "2");
    }
}
