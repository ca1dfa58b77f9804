use std::fmt;

use crate::datetime::DateTime;
use crate::errors::*;
use crate::function::Function;
use crate::measurement::Measurement;
use crate::value::*;

/// Result of a stack-level operation
pub type ItemResult = Result<Item, CalcError>;

/// Anything that can live on the evaluation stack
#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Number(Value),
    List(Vec<Item>),
    Measure(Measurement),
    Time(DateTime),
    Text(String),
    /// variable name that has no value yet (the argument of `set`)
    Name(String),
    Function(Function),
    /// result of operators that only have a side effect
    Nothing,
}

impl Default for Item {
    fn default() -> Item {
        Item::Number(Value::zero())
    }
}

impl From<Value> for Item {
    fn from(v: Value) -> Self {
        Item::Number(v)
    }
}

impl From<Vec<Item>> for Item {
    fn from(items: Vec<Item>) -> Self {
        Item::List(items)
    }
}

impl From<Measurement> for Item {
    fn from(m: Measurement) -> Self {
        m.simplify()
    }
}

impl From<bool> for Item {
    fn from(b: bool) -> Self {
        Item::Number(Value::from(b))
    }
}

impl Item {
    pub fn int(i: i64) -> Item {
        Item::Number(Value::from(i))
    }

    pub fn is_list(&self) -> bool {
        matches!(self, Item::List(..))
    }

    /// Numeric value of the item. Measurements give their magnitude
    pub fn value(&self, op: &str) -> Result<&Value, CalcError> {
        match self {
            Item::Number(v) => Ok(v),
            Item::Measure(m) => Ok(&m.value),
            _ => Err(CalcError::ExpectedNumber(op.to_string())),
        }
    }

    /// Numeric value of a plain number; measurements are rejected
    pub fn number(&self, op: &str) -> Result<&Value, CalcError> {
        match self {
            Item::Number(v) => Ok(v),
            _ => Err(CalcError::ExpectedNumber(op.to_string())),
        }
    }

    pub fn to_f64(&self, op: &str) -> Result<f64, CalcError> {
        self.value(op)?.to_f64(op)
    }

    pub fn to_usize(&self, op: &str) -> Result<usize, CalcError> {
        self.number(op)?.to_usize(op)
    }

    pub fn to_i64(&self, op: &str) -> Result<i64, CalcError> {
        self.number(op)?.to_i64(op)
    }

    pub fn list(&self, op: &str) -> Result<&[Item], CalcError> {
        match self {
            Item::List(items) => Ok(items),
            _ => Err(CalcError::ExpectedList(op.to_string())),
        }
    }

    /// Numbers of a list argument
    pub fn values(&self, op: &str) -> Result<Vec<Value>, CalcError> {
        self.list(op)?.iter().map(|i| i.number(op).map(|v| v.clone())).collect()
    }

    pub fn function(&self, op: &str) -> Result<&Function, CalcError> {
        match self {
            Item::Function(f) => Ok(f),
            _ => Err(CalcError::FunctionExpected(op.to_string())),
        }
    }

    /// Non-zero numbers and non-empty lists are true
    pub fn is_true(&self) -> bool {
        match self {
            Item::Number(v) => !v.is_zero(),
            Item::Measure(m) => !m.value.is_zero(),
            Item::List(items) => !items.is_empty(),
            Item::Text(s) => !s.is_empty(),
            Item::Nothing => false,
            _ => true,
        }
    }

    /// Flattens nested lists into one level
    pub fn flatten(self) -> Item {
        fn walk(item: Item, out: &mut Vec<Item>) {
            match item {
                Item::List(items) => items.into_iter().for_each(|i| walk(i, out)),
                other => out.push(other),
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        Item::List(out)
    }
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Item::Number(v) => write!(f, "{}", v),
            Item::List(items) => {
                write!(f, "[ ")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, " ]")
            }
            Item::Measure(m) => write!(f, "{} {}", m.value, m.units),
            Item::Time(t) => write!(f, "{}", t),
            Item::Text(s) => write!(f, "{}", s),
            Item::Name(s) => write!(f, "${}", s),
            Item::Function(func) => write!(f, "{}", func),
            Item::Nothing => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten() {
        let l = Item::List(vec![Item::int(1), Item::List(vec![Item::int(2), Item::List(vec![Item::int(3)])])]);
        assert_eq!(l.flatten(), Item::List(vec![Item::int(1), Item::int(2), Item::int(3)]));
    }

    #[test]
    fn test_display() {
        let l = Item::List(vec![Item::int(1), Item::List(vec![Item::int(2), Item::int(3)])]);
        assert_eq!(l.to_string(), "[ 1, [ 2, 3 ] ]");
    }

    #[test]
    fn test_args() {
        assert!(Item::Text("a".to_string()).number("sqrt").is_err());
        assert_eq!(Item::int(5).to_usize("op"), Ok(5));
        assert!(Item::int(5).list("sum").is_err());
        assert!(!Item::int(0).is_true());
    }
}
