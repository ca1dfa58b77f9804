use log::debug;

use crate::dice::is_dice_expression;
use crate::errors::*;
use crate::function::{Function, FUNCTION_OPERATORS};
use crate::item::*;
use crate::measurement::apply_unit;
use crate::operators::{lookup, resolve_alias, Arg, OperatorInfo};
use crate::parse::{parse_number, parse_term, Term};
use crate::session::Session;
use crate::units::{lookup_unit, Units};
use crate::value::*;

/// RPN evaluation stack. Level 0 holds the arguments, every open `[`
/// starts a new level that becomes a list on the matching `]`
pub struct Stack {
    levels: Vec<Vec<Item>>,
    function: Option<Function>,
}

impl Default for Stack {
    fn default() -> Stack {
        Stack { levels: vec![Vec::new()], function: None }
    }
}

macro_rules! pop_arg {
    ($self:ident, $op:expr, $count:expr) => {
        match $self.current().pop() {
            Some(item) => item,
            None => return Err(CalcError::NotEnoughArgs($op.to_string(), $count)),
        }
    };
}

impl Stack {
    pub fn new() -> Self {
        Default::default()
    }

    fn current(&mut self) -> &mut Vec<Item> {
        if self.levels.is_empty() {
            self.levels.push(Vec::new());
        }
        let idx = self.levels.len() - 1;
        &mut self.levels[idx]
    }

    pub fn push(&mut self, item: Item) {
        self.current().push(item);
    }

    /// Processes one term
    pub fn push_term(&mut self, session: &mut Session, term: &str) -> Result<(), CalcError> {
        debug!("term '{}'", term);
        let term = resolve_alias(term);

        if let Some(func) = self.function.as_mut() {
            if !FUNCTION_OPERATORS.contains(&term) {
                func.push(term);
                return Ok(());
            }
            if let Some(func) = self.function.take() {
                self.push(Item::Function(func));
            }
        }

        if let Some(forced) = term.strip_prefix('\\') {
            return match parse_number(forced, session.config.input_radix, &session.config.numerals)? {
                Some(v) => {
                    self.push(Item::Number(v));
                    Ok(())
                }
                None => Err(CalcError::ParseFailed(term.to_string())),
            };
        }

        match parse_term(term)? {
            Term::OpenList => {
                self.levels.push(Vec::new());
                return Ok(());
            }
            Term::CloseList => {
                if self.levels.len() < 2 {
                    return Err(CalcError::BracketMismatch(-1));
                }
                let items = self.levels.pop().unwrap_or_default();
                self.push(Item::List(items));
                return Ok(());
            }
            Term::Variable(name) => {
                let item = match session.variable(&name) {
                    Some(item) => item.clone(),
                    None => Item::Name(name),
                };
                self.push(item);
                return Ok(());
            }
            Term::History(n) => {
                let item = session.result(n)?;
                self.push(item);
                return Ok(());
            }
            Term::Number(v) if session.config.input_radix == 10 => {
                self.push(Item::Number(v));
                return Ok(());
            }
            _ => {}
        }

        self.push_word(session, term)
    }

    fn push_word(&mut self, session: &mut Session, term: &str) -> Result<(), CalcError> {
        match term {
            "x" | "y" | "z" => {
                let mut func = Function::new();
                func.push(term);
                self.function = Some(func);
                return Ok(());
            }
            "dup" => {
                let count = pop_arg!(self, "dup", 2).to_usize("dup")?;
                let item = pop_arg!(self, "dup", 2);
                for _ in 0..count {
                    self.push(item.clone());
                }
                return Ok(());
            }
            "flatten" => {
                let item = pop_arg!(self, "flatten", 1);
                self.push(item.flatten());
                return Ok(());
            }
            "unlist" => {
                match pop_arg!(self, "unlist", 1) {
                    Item::List(items) => self.current().extend(items),
                    other => self.push(other),
                }
                return Ok(());
            }
            "previous" => {
                let item = pop_arg!(self, "previous", 1);
                self.push(item.clone());
                self.push(item);
                return Ok(());
            }
            _ => {}
        }

        if let Some(unit) = lookup_unit(term) {
            return self.apply_units(Units::single(&unit.name));
        }

        if let Some(info) = lookup(term) {
            return self.apply_operator(session, info);
        }

        if session.config.input_radix <= 10 && is_dice_expression(term) {
            self.push(Item::Text(term.to_string()));
            return Ok(());
        }

        if let Some(v) = parse_number(term, session.config.input_radix, &session.config.numerals)? {
            self.push(Item::Number(v));
            return Ok(());
        }

        if term.contains(|c| c == '*' || c == '/' || c == '^') {
            if let Ok(units) = Units::parse(term) {
                return self.apply_units(units);
            }
        }

        Err(CalcError::UnknownOperator(term.to_string()))
    }

    fn apply_operator(&mut self, session: &mut Session, info: &OperatorInfo) -> Result<(), CalcError> {
        let n = info.args.len();
        let level = self.current();
        if level.len() < n {
            return Err(CalcError::NotEnoughArgs(info.name.to_string(), n));
        }
        let args = level.split_off(level.len() - n);
        debug!("operator '{}' with {} argument(s)", info.name, n);
        match apply(session, info, args)? {
            Item::Nothing => {}
            item => self.push(item),
        }
        Ok(())
    }

    fn apply_units(&mut self, units: Units) -> Result<(), CalcError> {
        let item = match self.current().pop() {
            Some(Item::Number(v)) => apply_unit(v, &units)?,
            Some(Item::List(items)) => Item::List(attach_units(items, &units)?),
            Some(other) => {
                self.push(other);
                apply_unit(Value::one(), &units)?
            }
            None => apply_unit(Value::one(), &units)?,
        };
        self.push(item);
        Ok(())
    }

    /// The only item left on the stack
    pub fn into_result(mut self) -> ItemResult {
        if self.function.is_some() {
            return Err(CalcError::UnfinishedFunction);
        }
        if self.levels.len() != 1 {
            return Err(CalcError::BracketMismatch(self.levels.len() as i32 - 1));
        }
        let mut level = self.levels.pop().unwrap_or_default();
        match level.len() {
            0 => Ok(Item::Nothing),
            1 => Ok(level.pop().unwrap_or_default()),
            _ => Err(CalcError::UnexpectedEnd),
        }
    }
}

fn attach_units(items: Vec<Item>, units: &Units) -> Result<Vec<Item>, CalcError> {
    items
        .into_iter()
        .map(|item| match item {
            Item::Number(v) => apply_unit(v, units),
            Item::List(inner) => Ok(Item::List(attach_units(inner, units)?)),
            other => Ok(other),
        })
        .collect()
}

/// Calls an operator, broadcasting over lists where the operator expects
/// single values
pub(crate) fn apply(session: &mut Session, info: &OperatorInfo, mut args: Vec<Item>) -> ItemResult {
    for (arg, kind) in args.iter_mut().zip(info.args.iter()) {
        if *kind == Arg::List && !arg.is_list() {
            let scalar = std::mem::replace(arg, Item::Nothing);
            *arg = Item::List(vec![scalar]);
        }
    }

    if info.args.len() == 1 && info.args[0] == Arg::List && !info.nested {
        if let Item::List(items) = &args[0] {
            if !items.is_empty() && items.iter().all(|i| i.is_list()) {
                let items = items.clone();
                let res: Result<Vec<Item>, CalcError> =
                    items.into_iter().map(|i| apply(session, info, vec![i])).collect();
                return res.map(Item::List);
            }
        }
    }

    let broadcast: Vec<usize> = args
        .iter()
        .zip(info.args.iter())
        .enumerate()
        .filter(|(_, (arg, kind))| **kind == Arg::Scalar && arg.is_list())
        .map(|(idx, _)| idx)
        .collect();
    if broadcast.is_empty() {
        return (info.func)(session, &args);
    }

    let len = broadcast
        .iter()
        .map(|&idx| match &args[idx] {
            Item::List(items) => items.len(),
            _ => 0,
        })
        .min()
        .unwrap_or(0);
    let mut res = Vec::with_capacity(len);
    for pos in 0..len {
        let call: Vec<Item> = args
            .iter()
            .enumerate()
            .map(|(idx, arg)| match arg {
                Item::List(items) if broadcast.contains(&idx) => items[pos].clone(),
                _ => arg.clone(),
            })
            .collect();
        match apply(session, info, call)? {
            Item::Nothing => {}
            item => res.push(item),
        }
    }
    Ok(Item::List(res))
}

/// Counts `[` minus `]` over all terms
fn check_brackets<S: AsRef<str>>(terms: &[S]) -> Result<(), CalcError> {
    let mut count = 0i32;
    for t in terms {
        match t.as_ref() {
            "[" => count += 1,
            "]" => count -= 1,
            _ => {}
        }
    }
    if count != 0 {
        return Err(CalcError::BracketMismatch(count));
    }
    Ok(())
}

/// Evaluates an RPN expression and returns the single item left on the stack
pub fn evaluate<S: AsRef<str>>(terms: &[S], session: &mut Session) -> ItemResult {
    check_brackets(terms)?;
    let mut stack = Stack::new();
    for (idx, term) in terms.iter().enumerate() {
        stack.push_term(session, term.as_ref()).map_err(|e| e.at(idx + 1))?;
    }
    stack.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_str(terms: &[&str]) -> String {
        let mut s = Session::new();
        match evaluate(terms, &mut s) {
            Ok(item) => item.to_string(),
            Err(e) => format!("{}", e),
        }
    }

    #[test]
    fn test_basic() {
        let mut s = Session::new();
        assert_eq!(evaluate(&["2", "2", "+"], &mut s), Ok(Item::int(4)));
        assert_eq!(evaluate(&["4", "3", "add"], &mut s), Ok(Item::int(7)));
        assert_eq!(evaluate(&["11001", "100", "modulo"], &mut s), Ok(Item::int(1)));
        assert_eq!(evaluate(&["-394", "abs"], &mut s), Ok(Item::int(394)));
        assert_eq!(evaluate(&["9.99999", "ceiling"], &mut s), Ok(Item::int(10)));
        assert_eq!(evaluate(&["-0.4", "floor"], &mut s), Ok(Item::int(-1)));
        assert_eq!(evaluate(&["1024", "issquare"], &mut s), Ok(Item::int(1)));
        assert_eq!(evaluate(&["e", "pi", "greater"], &mut s), Ok(Item::int(0)));
    }

    #[test]
    fn test_errors() {
        assert_eq!(eval_str(&["2", "add"]), "error in arg 2:  operator 'add' requires 2 arguments");
        assert_eq!(eval_str(&["2", "3"]), "unexpected end of input");
        assert_eq!(eval_str(&["[", "2", "3"]), "mismatched brackets (count: 1)");
        assert_eq!(eval_str(&["2", "florp"]), "error in arg 2:  unrecognized operator or value 'florp'");
        assert_eq!(eval_str(&["3", "x", "2"]), "unexpected end of input in function definition");
    }

    #[test]
    fn test_lists() {
        assert_eq!(eval_str(&["[", "1", "2", "3", "]", "2", "*"]), "[ 2, 4, 6 ]");
        assert_eq!(eval_str(&["[", "1", "2", "3", "]", "[", "10", "20", "]", "+"]), "[ 11, 22 ]");
        assert_eq!(eval_str(&["[", "[", "1", "2", "]", "[", "3", "4", "]", "]", "sum"]), "[ 3, 7 ]");
        assert_eq!(eval_str(&["1", "10", "range", "mean"]), "5.5");
        assert_eq!(
            eval_str(&["12", "1", "12", "range", "is_divisible"]),
            "[ 1, 1, 1, 1, 0, 1, 0, 0, 0, 0, 0, 1 ]"
        );
    }

    #[test]
    fn test_modifiers() {
        assert_eq!(eval_str(&["[", "5", "3", "dup", "]"]), "[ 5, 5, 5 ]");
        assert_eq!(eval_str(&["[", "1", "[", "2", "3", "]", "]", "flatten"]), "[ 1, 2, 3 ]");
        assert_eq!(eval_str(&["[", "1", "2", "]", "unlist", "+"]), "3");
        assert_eq!(eval_str(&["7", "previous", "*"]), "49");
    }

    #[test]
    fn test_units() {
        assert_eq!(eval_str(&["2", "gallons", "cups", "convert"]), "32 cup");
        assert_eq!(eval_str(&["5", "dozen"]), "60");
        assert_eq!(eval_str(&["10", "meter/second", "unit_type"]), "velocity");
        assert_eq!(eval_str(&["[", "1", "2", "]", "meters", "count"]), "2");
        assert_eq!(eval_str(&["1", "atmosphere", "pascal", "convert"]), "101325 pascal");
        assert_eq!(eval_str(&["3", "rev", "unit_type"]), "angle");
        assert_eq!(eval_str(&["5", "pascal_triangle"]), "[ 1, 4, 6, 4, 1 ]");
    }

    #[test]
    fn test_units_before_operators() {
        for info in crate::operators::REGISTRY.iter() {
            assert!(lookup_unit(info.name).is_none(), "operator '{}' is a unit name", info.name);
        }
        for alias in crate::operators::ALIASES.keys() {
            assert!(lookup_unit(alias).is_none(), "alias '{}' is a unit name", alias);
        }
    }

    #[test]
    fn test_dice_terms() {
        assert_eq!(eval_str(&["3d6"]), "3d6");
        assert_eq!(eval_str(&["2d2", "permute_dice"]), "[ 2, 3, 3, 4 ]");
        let mut s = Session::new();
        s.config.input_radix = 16;
        assert_eq!(evaluate(&["3d6"], &mut s), Ok(Item::int(0x3d6)));
    }

    #[test]
    fn test_side_effects() {
        let mut s = Session::new();
        assert_eq!(evaluate(&["hex_mode"], &mut s), Ok(Item::Nothing));
        assert_eq!(evaluate(&["255", "hex_mode"], &mut s), Ok(Item::int(255)));
    }

    #[test]
    fn test_input_radix() {
        let mut s = Session::new();
        s.config.input_radix = 16;
        assert_eq!(evaluate(&["ff", "1", "+"], &mut s), Ok(Item::int(256)));
        assert_eq!(evaluate(&["\\add"], &mut s), Ok(Item::int(0xadd)));
    }
}
