use pest::Parser;

use crate::errors::*;
use crate::value::*;

#[derive(Parser)]
#[grammar = "rpn.pest"]
pub struct TermParser;

/// Classified command-line term
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Number(Value),
    /// `$name`
    Variable(String),
    /// `$N`, a previous result
    History(usize),
    OpenList,
    CloseList,
    /// operator, alias, unit or anything else
    Word(String),
}

/// Classifies a term using decimal number syntax
pub fn parse_term(term: &str) -> Result<Term, CalcError> {
    let mut pairs = match TermParser::parse(Rule::term, term) {
        Ok(p) => p,
        Err(..) => return Ok(Term::Word(term.to_string())),
    };
    let pair = match pairs.next() {
        Some(p) => p,
        None => return Ok(Term::Word(term.to_string())),
    };
    let val = pair.as_str();
    match pair.as_rule() {
        Rule::open_list => Ok(Term::OpenList),
        Rule::close_list => Ok(Term::CloseList),
        Rule::history => {
            let n = val[1..].parse::<usize>().map_err(|_| CalcError::ParseFailed(val.to_string()))?;
            Ok(Term::History(n))
        }
        Rule::variable => Ok(Term::Variable(val[1..].to_string())),
        Rule::hex | Rule::bin | Rule::oct | Rule::int | Rule::int_exp => {
            Ok(Term::Number(Value::from_str_integer(val)?))
        }
        Rule::float => Ok(Term::Number(Value::from_str_float(val)?)),
        Rule::complex => Ok(Term::Number(Value::from_str_complex(val)?)),
        _ => Ok(Term::Word(term.to_string())),
    }
}

fn is_radix_number(term: &str, radix: u32, numerals: &str) -> bool {
    let body = term.strip_prefix('-').unwrap_or(term);
    if body.is_empty() || body == "." || body.matches('.').count() > 1 {
        return false;
    }
    let digits: Vec<char> = numerals.chars().take(radix as usize).collect();
    body.chars().all(|c| c == '.' || digits.contains(&c))
}

/// Parses a number in the given input radix. `Ok(None)` means the term is
/// not a number at all
pub fn parse_number(term: &str, radix: u32, numerals: &str) -> Result<Option<Value>, CalcError> {
    if radix != 10 {
        if is_radix_number(term, radix, numerals) {
            return Value::from_str_radix(term, radix, numerals).map(Some);
        }
        return Ok(None);
    }
    match parse_term(term)? {
        Term::Number(v) => Ok(Some(v)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_NUMERALS;
    use num_bigint::BigInt;
    use num_complex::Complex;

    fn int(i: i64) -> Term {
        Term::Number(Value::Int(BigInt::from(i)))
    }

    #[test]
    fn test_numbers() {
        assert_eq!(parse_term("42"), Ok(int(42)));
        assert_eq!(parse_term("-42"), Ok(int(-42)));
        assert_eq!(parse_term("150,000"), Ok(int(150000)));
        assert_eq!(parse_term("1_000"), Ok(int(1000)));
        assert_eq!(parse_term("0x1F"), Ok(int(31)));
        assert_eq!(parse_term("1011b"), Ok(int(11)));
        assert_eq!(parse_term("017"), Ok(int(15)));
        assert_eq!(parse_term("12e3"), Ok(int(12000)));
        assert_eq!(parse_term("1.5"), Ok(Term::Number(Value::Float(1.5))));
        assert_eq!(parse_term(".5"), Ok(Term::Number(Value::Float(0.5))));
        assert_eq!(parse_term("1e-3"), Ok(Term::Number(Value::Float(0.001))));
        assert_eq!(parse_term("3+4j"), Ok(Term::Number(Value::Complex(Complex::new(3.0, 4.0)))));
        assert_eq!(parse_term("-2j"), Ok(Term::Number(Value::Complex(Complex::new(0.0, -2.0)))));
        assert_eq!(parse_term("1.5-0.5j"), Ok(Term::Number(Value::Complex(Complex::new(1.5, -0.5)))));
    }

    #[test]
    fn test_other_terms() {
        assert_eq!(parse_term("["), Ok(Term::OpenList));
        assert_eq!(parse_term("]"), Ok(Term::CloseList));
        assert_eq!(parse_term("$12"), Ok(Term::History(12)));
        assert_eq!(parse_term("$speed_2"), Ok(Term::Variable("speed_2".to_string())));
        assert_eq!(parse_term("-"), Ok(Term::Word("-".to_string())));
        assert_eq!(parse_term("add"), Ok(Term::Word("add".to_string())));
        assert_eq!(parse_term("meter/second"), Ok(Term::Word("meter/second".to_string())));
        assert_eq!(parse_term("1/x"), Ok(Term::Word("1/x".to_string())));
        assert_eq!(parse_term("2x"), Ok(Term::Word("2x".to_string())));
    }

    #[test]
    fn test_radix() {
        assert_eq!(parse_number("ff", 16, DEFAULT_NUMERALS), Ok(Some(Value::Int(BigInt::from(255)))));
        assert_eq!(parse_number("102", 2, DEFAULT_NUMERALS), Ok(None));
        assert_eq!(parse_number("sin", 10, DEFAULT_NUMERALS), Ok(None));
        assert_eq!(parse_number("7", 10, DEFAULT_NUMERALS), Ok(Some(Value::Int(BigInt::from(7)))));
    }
}
