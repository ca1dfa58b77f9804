use std::fmt;

use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::stack::Stack;
use crate::value::*;

/// Operators that consume a function definition
pub const FUNCTION_OPERATORS: &[&str] = &["eval", "eval2", "eval3", "filter", "unfilter", "nsum", "nprod"];

// sums and products are evaluated term by term
const MAX_RANGE: i64 = 1_000_000;

/// User-defined function: the terms following `x`, `y` or `z`
#[derive(Clone, Debug, PartialEq, Default)]
pub struct Function {
    body: Vec<String>,
}

impl Function {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn push(&mut self, term: &str) {
        self.body.push(term.to_string());
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// Evaluates the body with `x`, `y` and `z` bound to the arguments
    pub fn evaluate(&self, session: &mut Session, args: &[Item]) -> ItemResult {
        let mut stack = Stack::new();
        for term in &self.body {
            let bound = match term.as_str() {
                "x" => args.get(0),
                "y" => args.get(1),
                "z" => args.get(2),
                _ => None,
            };
            match bound {
                Some(item) => stack.push(item.clone()),
                None if term == "x" || term == "y" || term == "z" => {
                    return Err(CalcError::NotEnoughArgs(term.to_string(), args.len() + 1))
                }
                None => stack.push_term(session, term)?,
            }
        }
        stack.into_result()
    }
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<function: {}>", self.body.join(" "))
    }
}

fn eval(session: &mut Session, args: &[Item]) -> ItemResult {
    let f = args[1].function("eval")?;
    f.evaluate(session, &args[..1])
}

fn eval2(session: &mut Session, args: &[Item]) -> ItemResult {
    let f = args[2].function("eval2")?;
    f.evaluate(session, &args[..2])
}

fn eval3(session: &mut Session, args: &[Item]) -> ItemResult {
    let f = args[3].function("eval3")?;
    f.evaluate(session, &args[..3])
}

fn filter_items(session: &mut Session, args: &[Item], op: &str, keep: bool) -> ItemResult {
    let f = args[1].function(op)?;
    let mut res = Vec::new();
    for item in args[0].list(op)? {
        if f.evaluate(session, &[item.clone()])?.is_true() == keep {
            res.push(item.clone());
        }
    }
    Ok(Item::List(res))
}

fn filter(session: &mut Session, args: &[Item]) -> ItemResult {
    filter_items(session, args, "filter", true)
}

fn unfilter(session: &mut Session, args: &[Item]) -> ItemResult {
    filter_items(session, args, "unfilter", false)
}

fn fold_range(session: &mut Session, args: &[Item], op: &str, start: Value) -> ItemResult {
    let from = args[0].to_i64(op)?;
    let to = args[1].to_i64(op)?;
    if to - from > MAX_RANGE {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), to.to_string(), format!("at most {} terms", MAX_RANGE)));
    }
    let f = args[2].function(op)?;
    let mut acc = Item::Number(start);
    for n in from..=to {
        let term = f.evaluate(session, &[Item::int(n)])?;
        acc = if op == "nsum" {
            crate::arithmetic::add_items(acc, term)?
        } else {
            crate::arithmetic::multiply_items(acc, term)?
        };
    }
    Ok(acc)
}

fn nsum(session: &mut Session, args: &[Item]) -> ItemResult {
    fold_range(session, args, "nsum", Value::zero())
}

fn nprod(session: &mut Session, args: &[Item]) -> ItemResult {
    fold_range(session, args, "nprod", Value::one())
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "functions";
    reg.add(OperatorInfo::new("eval", &[Scalar, Any], cat, "evaluates the function f for the given argument n", eval));
    reg.add(OperatorInfo::new("eval2", &[Scalar, Scalar, Any], cat, "evaluates the function f for arguments a and b", eval2));
    reg.add(OperatorInfo::new(
        "eval3",
        &[Scalar, Scalar, Scalar, Any],
        cat,
        "evaluates the function f for arguments a, b and c",
        eval3,
    ));
    reg.add(OperatorInfo::new("filter", &[List, Any], cat, "keeps the items for which f is non-zero", filter));
    reg.add(OperatorInfo::new("unfilter", &[List, Any], cat, "keeps the items for which f is zero", unfilter));
    reg.add(OperatorInfo::new("nsum", &[Scalar, Scalar, Any], cat, "sums f(n) for n from a to b", nsum));
    reg.add(OperatorInfo::new("nprod", &[Scalar, Scalar, Any], cat, "multiplies f(n) for n from a to b", nprod));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::evaluate;

    #[test]
    fn test_eval() {
        let mut s = Session::new();
        assert_eq!(evaluate(&["3", "x", "2", "*", "eval"], &mut s), Ok(Item::int(6)));
        assert_eq!(evaluate(&["5", "x", "2", "**", "1", "-", "eval"], &mut s), Ok(Item::int(24)));
        assert_eq!(evaluate(&["2", "3", "x", "y", "+", "eval2"], &mut s), Ok(Item::int(5)));
        let squares = evaluate(&["[", "1", "2", "3", "]", "x", "x", "*", "eval"], &mut s);
        assert_eq!(squares, Ok(Item::List(vec![Item::int(1), Item::int(4), Item::int(9)])));
    }

    #[test]
    fn test_filter_and_sums() {
        let mut s = Session::new();
        let odd = evaluate(&["1", "10", "range", "x", "2", "mod", "filter"], &mut s);
        assert_eq!(odd.map(|i| i.to_string()), Ok("[ 1, 3, 5, 7, 9 ]".to_string()));
        let even = evaluate(&["1", "6", "range", "x", "2", "mod", "unfilter"], &mut s);
        assert_eq!(even.map(|i| i.to_string()), Ok("[ 2, 4, 6 ]".to_string()));
        assert_eq!(evaluate(&["1", "10", "x", "nsum"], &mut s), Ok(Item::int(55)));
        assert_eq!(evaluate(&["1", "5", "x", "nprod"], &mut s), Ok(Item::int(120)));
    }

    #[test]
    fn test_unfinished() {
        let mut s = Session::new();
        assert_eq!(evaluate(&["3", "x", "2", "*"], &mut s), Err(CalcError::UnfinishedFunction));
    }
}
