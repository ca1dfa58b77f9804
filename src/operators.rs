use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;
use log::debug;

use crate::item::*;
use crate::session::Session;

/// Signature of every operator: arguments in stack order (deepest first)
pub type OpFn = fn(&mut Session, &[Item]) -> ItemResult;

/// Kind of an operator argument
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Arg {
    /// single value; lists are broadcast element by element
    Scalar,
    /// list; a scalar is promoted to a one-element list
    List,
    /// passed as is
    Any,
}

#[derive(Clone)]
pub struct OperatorInfo {
    pub name: &'static str,
    pub args: &'static [Arg],
    pub category: &'static str,
    pub brief: &'static str,
    pub func: OpFn,
    /// the operator prints something and may leave nothing on the stack
    pub side_effect: bool,
    /// the operator handles lists of lists itself
    pub nested: bool,
}

impl OperatorInfo {
    pub fn new(
        name: &'static str,
        args: &'static [Arg],
        category: &'static str,
        brief: &'static str,
        func: OpFn,
    ) -> Self {
        OperatorInfo { name, args, category, brief, func, side_effect: false, nested: false }
    }

    pub fn side_effect(mut self) -> Self {
        self.side_effect = true;
        self
    }

    pub fn nested(mut self) -> Self {
        self.nested = true;
        self
    }

    /// Argument placeholder used in help: `n`, `n k`, `a b c`
    pub fn args_prefix(&self) -> String {
        match self.args.len() {
            0 => String::new(),
            1 => "n ".to_string(),
            2 => "n k ".to_string(),
            n => "abcdefgh".chars().take(n).map(|c| format!("{} ", c)).collect(),
        }
    }
}

/// All operators sorted by name
#[derive(Default)]
pub struct Registry {
    ops: BTreeMap<&'static str, OperatorInfo>,
}

impl Registry {
    pub fn add(&mut self, info: OperatorInfo) {
        self.ops.insert(info.name, info);
    }

    pub fn get(&self, name: &str) -> Option<&OperatorInfo> {
        self.ops.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OperatorInfo> {
        self.ops.values()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn categories(&self) -> Vec<&'static str> {
        let mut cats: Vec<&'static str> = self.ops.values().map(|o| o.category).collect();
        cats.sort_unstable();
        cats.dedup();
        cats
    }
}

fn build_registry() -> Registry {
    let mut reg = Registry::default();
    register(&mut reg);
    crate::arithmetic::register(&mut reg);
    crate::math::register(&mut reg);
    crate::constants::register(&mut reg);
    crate::lists::register(&mut reg);
    crate::function::register(&mut reg);
    crate::measurement::register(&mut reg);
    crate::primes::register(&mut reg);
    crate::factor::register(&mut reg);
    crate::numbertheory::register(&mut reg);
    crate::lexicographic::register(&mut reg);
    crate::combinatorics::register(&mut reg);
    crate::polytope::register(&mut reg);
    crate::computer::register(&mut reg);
    crate::datetime::register(&mut reg);
    crate::astronomy::register(&mut reg);
    crate::name::register(&mut reg);
    crate::dice::register(&mut reg);
    crate::session::register(&mut reg);
    crate::help::register(&mut reg);
    debug!("{} operators registered", reg.len());
    reg
}

static ALIAS_LIST: &[(&str, &str)] = &[
    ("+", "add"),
    ("-", "subtract"),
    ("*", "multiply"),
    ("/", "divide"),
    ("**", "power"),
    ("^", "power"),
    ("%", "modulo"),
    ("mod", "modulo"),
    ("!", "factorial"),
    ("!!", "doublefac"),
    ("neg", "negative"),
    ("inv", "reciprocal"),
    ("1/x", "reciprocal"),
    ("ceil", "ceiling"),
    ("sqrt", "root2"),
    ("cbrt", "root3"),
    ("sqr", "square"),
    ("avg", "mean"),
    ("average", "mean"),
    ("fib", "fibonacci"),
    ("log", "ln"),
    ("arg", "argument"),
    ("conj", "conjugate"),
    ("re", "real"),
    ("im", "imaginary"),
    ("=", "equal"),
    ("==", "equal"),
    ("!=", "not_equal"),
    (">", "greater"),
    ("<", "less"),
    (">=", "not_less"),
    ("<=", "not_greater"),
    ("twin", "twinprime"),
    ("twin_", "twinprime_"),
    ("sexy", "sexyprime"),
    ("sexy_", "sexyprime_"),
    ("cousin", "cousinprime"),
    ("cousin_", "cousinprime_"),
    ("triplet", "tripletprime"),
    ("triplet_", "tripletprime_"),
    ("quad", "quadprime"),
    ("quad_", "quadprime_"),
    ("quint", "quintprime"),
    ("quint_", "quintprime_"),
    ("sext", "sextprime"),
    ("sext_", "sextprime_"),
    ("sophie", "sophieprime"),
    ("safe", "safeprime"),
    ("sexy3", "sexytriplet"),
    ("sexy3_", "sexytriplet_"),
    ("sexy4", "sexyquad"),
    ("sexy4_", "sexyquad_"),
    ("sum_digits", "sumdigits"),
    ("tri", "triangular"),
    ("tri?", "triangular?"),
    ("pent", "pentagonal"),
    ("pent?", "pentagonal?"),
    ("hex", "hexagonal"),
    ("hex?", "hexagonal?"),
    ("hept", "heptagonal"),
    ("oct", "octagonal"),
    ("non", "nonagonal"),
    ("dec", "decagonal"),
    ("pyr", "pyramid"),
    ("tet", "tetrahedral"),
    ("binom", "binomial"),
    ("choose", "binomial"),
    ("nCr", "binomial"),
    ("nPr", "perm"),
    ("pascal_tri", "pascal_triangle"),
    ("pascaltri", "pascal_triangle"),
    ("divcount", "countdiv"),
    ("sum_divisors", "sigma"),
    ("tounix", "tounixtime"),
    ("fromunix", "fromunixtime"),
    ("dow", "weekday"),
    ("_dump_operators", "_dumpops"),
    ("_dump_aliases", "_dumpalias"),
    ("&", "and"),
    ("|", "or"),
    ("~", "not"),
    ("<<", "shiftleft"),
    (">>", "shiftright"),
    ("popcount", "countbits"),
    ("sort_descending", "sortdesc"),
    ("len", "count"),
    ("gmean", "geomean"),
    ("prod", "product"),
    ("unixtime", "tounixtime"),
];

lazy_static! {
    pub static ref REGISTRY: Registry = build_registry();
    pub static ref ALIASES: HashMap<&'static str, &'static str> = ALIAS_LIST.iter().copied().collect();
}

/// Resolves an alias to the operator name, or returns the term itself
pub fn resolve_alias(term: &str) -> &str {
    match ALIASES.get(term) {
        Some(name) => name,
        None => term,
    }
}

pub fn lookup(term: &str) -> Option<&'static OperatorInfo> {
    REGISTRY.get(resolve_alias(term))
}

/// Aliases of an operator, sorted
pub fn aliases_of(name: &str) -> Vec<&'static str> {
    let mut res: Vec<&'static str> = ALIAS_LIST.iter().filter(|(_, op)| *op == name).map(|(a, _)| *a).collect();
    res.sort_unstable();
    res
}

fn dump_operators(session: &mut Session, _: &[Item]) -> ItemResult {
    for op in REGISTRY.iter() {
        session.emit(format!("   {}, args: {}", op.name, op.args.len()));
    }
    Ok(Item::Number(REGISTRY.len().into()))
}

fn dump_aliases(session: &mut Session, _: &[Item]) -> ItemResult {
    let mut aliases: Vec<&(&str, &str)> = ALIAS_LIST.iter().collect();
    aliases.sort_unstable();
    for (alias, op) in aliases {
        session.emit(format!("   {}: {}", alias, op));
    }
    Ok(Item::Number(ALIAS_LIST.len().into()))
}

fn dump_stats(session: &mut Session, _: &[Item]) -> ItemResult {
    let lines = session.cache_stats();
    let count = lines.len();
    for line in lines {
        session.emit(line);
    }
    Ok(Item::Number(count.into()))
}

fn register(reg: &mut Registry) {
    let cat = "internal";
    reg.add(OperatorInfo::new("_dumpops", &[], cat, "lists all operators with their argument counts", dump_operators).side_effect());
    reg.add(OperatorInfo::new("_dumpalias", &[], cat, "lists all operator aliases", dump_aliases).side_effect());
    reg.add(OperatorInfo::new("_stats", &[], cat, "dumps cache statistics", dump_stats).side_effect());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aliases_resolve_to_operators() {
        for (alias, op) in ALIAS_LIST {
            assert!(REGISTRY.get(op).is_some(), "alias {} points to unknown operator {}", alias, op);
        }
    }

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("+").map(|o| o.name), Some("add"));
        assert_eq!(lookup("add").map(|o| o.args.len()), Some(2));
        assert!(lookup("nosuchop").is_none());
        assert!(aliases_of("power").contains(&"**"));
    }

    #[test]
    fn test_dump() {
        let mut s = Session::new();
        let res = dump_operators(&mut s, &[]).unwrap();
        assert_eq!(res, Item::Number(REGISTRY.len().into()));
        let lines = s.take_output();
        assert!(lines.contains(&"   add, args: 2".to_string()));
    }
}
