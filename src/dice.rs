//! Random numbers and dice expressions
//!
//! A dice expression is a comma-separated list of groups such as `3d6`,
//! `4d6x1` (drop the lowest die), `5d8h2` (drop the two highest dice) or
//! `2d4+1` (add a modifier).

use itertools::Itertools;
use log::debug;
use num_bigint::{BigInt, Sign};
use num_traits::Signed;
use rand::seq::{IteratorRandom, SliceRandom};
use rand::Rng;

use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::value::*;

const MAX_COUNT: usize = 1_000_000;
const MAX_DICE: u64 = 10_000;
/// Largest number of outcomes `permute_dice` enumerates
const MAX_PERMUTATIONS: u64 = 1_000_000;

#[derive(Debug, Clone, PartialEq)]
pub struct DiceGroup {
    pub count: u64,
    pub sides: u64,
    pub drop_lowest: u64,
    pub drop_highest: u64,
    pub modifier: i64,
}

fn take_number(chars: &mut std::iter::Peekable<std::str::Chars>) -> Option<u64> {
    let mut digits = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        digits.push(c);
        chars.next();
    }
    digits.parse().ok()
}

fn parse_group(expr: &str) -> Option<DiceGroup> {
    let mut chars = expr.chars().peekable();
    let count = take_number(&mut chars).unwrap_or(1);
    let mut group = DiceGroup { count, sides: 0, drop_lowest: 0, drop_highest: 0, modifier: 0 };
    while let Some(op) = chars.next() {
        let n = take_number(&mut chars);
        match op {
            'd' if group.sides == 0 => group.sides = n.filter(|s| *s >= 2)?,
            'x' => group.drop_lowest = n.unwrap_or(1),
            'h' => group.drop_highest = n.unwrap_or(1),
            '+' => group.modifier += n.unwrap_or(1) as i64,
            '-' => group.modifier -= n.unwrap_or(1) as i64,
            _ => return None,
        }
    }
    let valid = group.sides >= 2
        && (1..=MAX_DICE).contains(&group.count)
        && group.drop_lowest + group.drop_highest < group.count;
    if valid {
        Some(group)
    } else {
        None
    }
}

/// Parses `3d6,2d4+1`; None when the text is not a dice expression
pub fn parse_dice(expr: &str) -> Option<Vec<DiceGroup>> {
    if !expr.starts_with(|c: char| c.is_ascii_digit() || c == 'd') {
        return None;
    }
    expr.split(',').map(parse_group).collect()
}

pub fn is_dice_expression(term: &str) -> bool {
    parse_dice(term).is_some()
}

fn dice_arg(item: &Item, op: &str) -> Result<Vec<DiceGroup>, CalcError> {
    match item {
        Item::Text(s) | Item::Name(s) => parse_dice(s).ok_or_else(|| CalcError::InvalidArgument(op.to_string(), s.clone())),
        _ => Err(CalcError::InvalidArgument(op.to_string(), item.to_string())),
    }
}

/// Sum of one group's dice after dropping the lowest and highest ones
fn score(group: &DiceGroup, mut values: Vec<u64>) -> i64 {
    if group.drop_lowest > 0 || group.drop_highest > 0 {
        values.sort_unstable();
    }
    let end = values.len() - group.drop_highest as usize;
    let kept: u64 = values[group.drop_lowest as usize..end].iter().sum();
    kept as i64 + group.modifier
}

pub fn roll<R: Rng>(rng: &mut R, groups: &[DiceGroup]) -> i64 {
    groups
        .iter()
        .map(|g| {
            let values: Vec<u64> = (0..g.count).map(|_| rng.random_range(1..=g.sides)).collect();
            score(g, values)
        })
        .sum()
}

/// Every possible total of the expression, in enumeration order
pub fn permutations(groups: &[DiceGroup]) -> Result<Vec<i64>, CalcError> {
    let mut outcomes: u64 = 1;
    for g in groups {
        for _ in 0..g.count {
            outcomes = outcomes.saturating_mul(g.sides);
        }
    }
    if outcomes > MAX_PERMUTATIONS {
        return Err(CalcError::ArgumentOutOfRange(
            "permute_dice".to_string(),
            outcomes.to_string(),
            format!("at most {} outcomes", MAX_PERMUTATIONS),
        ));
    }
    debug!("enumerating {} dice outcomes", outcomes);
    let dice: Vec<(usize, u64)> =
        groups.iter().enumerate().flat_map(|(idx, g)| (0..g.count).map(move |_| (idx, g.sides))).collect();
    let totals = dice
        .iter()
        .map(|&(_, sides)| 1..=sides)
        .multi_cartesian_product()
        .map(|faces| {
            groups
                .iter()
                .enumerate()
                .map(|(idx, g)| {
                    let values =
                        dice.iter().zip(faces.iter()).filter(|((group, _), _)| *group == idx).map(|(_, f)| *f).collect();
                    score(g, values)
                })
                .sum::<i64>()
        })
        .collect();
    Ok(totals)
}

/// Uniform integer in 0..n
fn random_below<R: Rng>(rng: &mut R, n: &BigInt) -> BigInt {
    let bits = n.bits();
    let len = ((bits + 7) / 8) as usize;
    let mut buf = vec![0u8; len];
    loop {
        rng.fill(&mut buf[..]);
        if let Some(top) = buf.last_mut() {
            *top &= 0xffu8 >> (len as u64 * 8 - bits);
        }
        let v = BigInt::from_bytes_le(Sign::Plus, &buf);
        if v < *n {
            return v;
        }
    }
}

fn count_arg(item: &Item, op: &str) -> Result<usize, CalcError> {
    let n = item.to_usize(op)?;
    if n > MAX_COUNT {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), n.to_string(), format!("0..{}", MAX_COUNT)));
    }
    Ok(n)
}

fn limit_arg(item: &Item, op: &str) -> Result<BigInt, CalcError> {
    let n = item.number(op)?.to_bigint(op)?;
    if !n.is_positive() {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), n.to_string(), "1..".to_string()));
    }
    Ok(n)
}

fn random(_: &mut Session, _: &[Item]) -> ItemResult {
    Ok(Item::Number(Value::Float(rand::rng().random::<f64>())))
}

fn random_list(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = count_arg(&args[0], "random_")?;
    let mut rng = rand::rng();
    Ok(Item::List((0..n).map(|_| Item::Number(Value::Float(rng.random::<f64>()))).collect()))
}

fn random_integer(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = limit_arg(&args[0], "random_integer")?;
    Ok(Item::Number(Value::Int(random_below(&mut rand::rng(), &n))))
}

fn random_integer_list(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = limit_arg(&args[0], "random_integer_")?;
    let k = count_arg(&args[1], "random_integer_")?;
    let mut rng = rand::rng();
    Ok(Item::List((0..k).map(|_| Item::Number(Value::Int(random_below(&mut rng, &n)))).collect()))
}

fn random_element(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = args[0].list("random_element")?;
    match items.iter().choose(&mut rand::rng()) {
        Some(item) => Ok(item.clone()),
        None => Err(CalcError::InvalidArgument("random_element".to_string(), "[ ]".to_string())),
    }
}

fn shuffle(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut items = args[0].list("shuffle")?.to_vec();
    items.shuffle(&mut rand::rng());
    Ok(Item::List(items))
}

fn roll_dice(_: &mut Session, args: &[Item]) -> ItemResult {
    let groups = dice_arg(&args[0], "roll_dice")?;
    Ok(Item::Number(roll(&mut rand::rng(), &groups).into()))
}

fn roll_dice_list(_: &mut Session, args: &[Item]) -> ItemResult {
    let groups = dice_arg(&args[0], "roll_dice_")?;
    let k = count_arg(&args[1], "roll_dice_")?;
    let mut rng = rand::rng();
    Ok(Item::List((0..k).map(|_| Item::Number(roll(&mut rng, &groups).into())).collect()))
}

/// `n k roll_simple_dice`: n dice with k sides
fn roll_simple_dice(_: &mut Session, args: &[Item]) -> ItemResult {
    let op = "roll_simple_dice";
    let count = args[0].to_usize(op)? as u64;
    let sides = args[1].to_usize(op)? as u64;
    if !(1..=MAX_DICE).contains(&count) {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), count.to_string(), format!("1..{}", MAX_DICE)));
    }
    if sides < 2 {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), sides.to_string(), "2..".to_string()));
    }
    let group = DiceGroup { count, sides, drop_lowest: 0, drop_highest: 0, modifier: 0 };
    Ok(Item::Number(roll(&mut rand::rng(), &[group]).into()))
}

fn permute_dice(_: &mut Session, args: &[Item]) -> ItemResult {
    let groups = dice_arg(&args[0], "permute_dice")?;
    let totals = permutations(&groups)?;
    Ok(Item::List(totals.into_iter().map(|t| Item::Number(t.into())).collect()))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "special";
    reg.add(OperatorInfo::new("random", &[], cat, "returns a random number between 0 and 1", random));
    reg.add(OperatorInfo::new("random_", &[Scalar], cat, "returns a list of n random numbers", random_list));
    reg.add(OperatorInfo::new("random_integer", &[Scalar], cat, "returns a random integer from 0 to n - 1", random_integer));
    reg.add(OperatorInfo::new(
        "random_integer_",
        &[Scalar, Scalar],
        cat,
        "returns k random integers from 0 to n - 1",
        random_integer_list,
    ));
    reg.add(OperatorInfo::new("random_element", &[List], cat, "returns a random element of a list", random_element).nested());
    reg.add(OperatorInfo::new("shuffle", &[List], cat, "randomly shuffles a list", shuffle).nested());
    reg.add(OperatorInfo::new("roll_dice", &[Scalar], cat, "rolls dice described by an expression such as 3d6", roll_dice));
    reg.add(OperatorInfo::new("roll_dice_", &[Scalar, Scalar], cat, "rolls a dice expression k times", roll_dice_list));
    reg.add(OperatorInfo::new("roll_simple_dice", &[Scalar, Scalar], cat, "rolls n dice with k sides", roll_simple_dice));
    reg.add(OperatorInfo::new("permute_dice", &[Scalar], cat, "lists every total of a dice expression", permute_dice));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::evaluate;
    use num_traits::Zero;

    fn eval(terms: &[&str]) -> String {
        let mut s = Session::new();
        match evaluate(terms, &mut s) {
            Ok(item) => item.to_string(),
            Err(e) => e.to_string(),
        }
    }

    fn group(count: u64, sides: u64, drop_lowest: u64, drop_highest: u64, modifier: i64) -> DiceGroup {
        DiceGroup { count, sides, drop_lowest, drop_highest, modifier }
    }

    #[test]
    fn test_parse() {
        assert_eq!(parse_dice("3d6"), Some(vec![group(3, 6, 0, 0, 0)]));
        assert_eq!(parse_dice("d20"), Some(vec![group(1, 20, 0, 0, 0)]));
        assert_eq!(parse_dice("4d6x"), Some(vec![group(4, 6, 1, 0, 0)]));
        assert_eq!(parse_dice("10d12x2-4"), Some(vec![group(10, 12, 2, 0, -4)]));
        assert_eq!(parse_dice("3d8+5,2d4h1"), Some(vec![group(3, 8, 0, 0, 5), group(2, 4, 0, 1, 0)]));
        assert_eq!(parse_dice("2d6x2"), None);
        assert_eq!(parse_dice("3d1"), None);
        assert_eq!(parse_dice("0xd6"), None);
        assert_eq!(parse_dice("12"), None);
        assert_eq!(parse_dice("day"), None);
    }

    #[test]
    fn test_roll() {
        let mut rng = rand::rng();
        let groups = parse_dice("10d6+2").unwrap();
        for _ in 0..100 {
            let r = roll(&mut rng, &groups);
            assert!((12..=62).contains(&r));
        }
        let r: i64 = eval(&["3d6", "roll_dice"]).parse().unwrap();
        assert!((3..=18).contains(&r));
        let r: i64 = eval(&["2", "4", "roll_simple_dice"]).parse().unwrap();
        assert!((2..=8).contains(&r));
        assert_eq!(eval(&["3d6", "5", "roll_dice_", "count"]), "5");
    }

    #[test]
    fn test_permute() {
        assert_eq!(eval(&["2d2", "permute_dice"]), "[ 2, 3, 3, 4 ]");
        assert_eq!(eval(&["3d2x1", "permute_dice"]), "[ 2, 3, 3, 4, 3, 4, 4, 4 ]");
        assert_eq!(eval(&["1d3+1", "permute_dice"]), "[ 2, 3, 4 ]");
        assert!(permutations(&parse_dice("10d20").unwrap()).is_err());
    }

    #[test]
    fn test_random() {
        let r: f64 = eval(&["random"]).parse().unwrap_or(-1.0);
        assert!((0.0..1.0).contains(&r));
        let mut rng = rand::rng();
        let n = BigInt::from(1000);
        for _ in 0..200 {
            let v = random_below(&mut rng, &n);
            assert!(!v.is_negative() && v < n);
        }
        assert!(random_below(&mut rng, &BigInt::from(1)).is_zero());
        assert_eq!(eval(&["10", "20", "random_integer_", "count"]), "20");
        assert_eq!(eval(&["1", "10", "range", "shuffle", "sort"]), "[ 1, 2, 3, 4, 5, 6, 7, 8, 9, 10 ]");
        let e: i64 = eval(&["1", "10", "range", "random_element"]).parse().unwrap();
        assert!((1..=10).contains(&e));
    }
}
