use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::Config;
use crate::errors::*;
use crate::factor::FactorCache;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::persistence;
use crate::primes::PrimeCache;
use crate::value::*;

/// One-shot output modes, cleared before every interactive prompt
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Modes {
    pub comma: bool,
    pub hex: bool,
    pub octal: bool,
    pub leading_zero: bool,
    pub timer: bool,
}

/// Evaluation state shared by all expressions of a run
pub struct Session {
    pub config: Config,
    pub modes: Modes,
    variables: HashMap<String, Item>,
    results: Vec<Item>,
    pub(crate) primes: PrimeCache,
    pub(crate) factors: FactorCache,
    data_dir: Option<PathBuf>,
    output: Vec<String>,
}

impl Default for Session {
    fn default() -> Session {
        Session {
            config: Config::default(),
            modes: Modes::default(),
            variables: HashMap::new(),
            results: Vec::new(),
            primes: PrimeCache::default(),
            factors: FactorCache::default(),
            data_dir: None,
            output: Vec::new(),
        }
    }
}

impl Session {
    /// Session with default settings and in-memory caches only
    pub fn new() -> Self {
        Default::default()
    }

    /// Session using the configuration's data directory for persistent caches
    pub fn with_config(config: Config) -> Self {
        let data_dir = config.data_dir();
        let (primes, factors) = match &data_dir {
            Some(dir) => (PrimeCache::load(dir), FactorCache::load(dir)),
            None => (PrimeCache::default(), FactorCache::default()),
        };
        Session { config, primes, factors, data_dir, ..Default::default() }
    }

    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    /// Writes modified caches back to the data directory
    pub fn save_caches(&mut self) {
        let dir = match &self.data_dir {
            Some(d) => d.clone(),
            None => return,
        };
        if let Err(e) = self.primes.save(&dir) {
            warn!("failed to save prime cache: {}", e);
        }
        if let Err(e) = self.factors.save(&dir) {
            warn!("failed to save factor cache: {}", e);
        }
    }

    /// Queues a line of text printed before the result
    pub fn emit(&mut self, line: String) {
        self.output.push(line);
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    pub fn variable(&self, name: &str) -> Option<&Item> {
        self.variables.get(name)
    }

    pub fn set_variable(&mut self, name: &str, item: Item) {
        debug!("${} = {}", name, item);
        self.variables.insert(name.to_string(), item);
    }

    /// Stores the result of an evaluation in the history and the result file
    pub fn push_result(&mut self, item: Item) {
        if let Some(dir) = &self.data_dir {
            if let Err(e) = persistence::save_result(dir, &item) {
                warn!("failed to save the result: {}", e);
            }
        }
        self.results.push(item);
    }

    /// History entry `n`, counting from 1
    pub fn result(&self, n: usize) -> ItemResult {
        if n == 0 || n > self.results.len() {
            return Err(CalcError::HistoryOutOfRange(n));
        }
        Ok(self.results[n - 1].clone())
    }

    pub fn result_count(&self) -> usize {
        self.results.len()
    }

    pub fn reset_modes(&mut self) {
        self.modes = Modes::default();
    }

    pub fn cache_stats(&self) -> Vec<String> {
        let mut lines = self.primes.stats();
        lines.extend(self.factors.stats());
        lines
    }
}

/// Formats a number with `,` between thousands
pub(crate) fn thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (idx, c) in digits.chars().enumerate() {
        if idx != 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn setting(args: &[Item], op: &str, min: usize, max: usize) -> Result<usize, CalcError> {
    let n = args[0].to_usize(op)?;
    if n < min || n > max {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), n.to_string(), format!("{}..{}", min, max)));
    }
    Ok(n)
}

fn accuracy(session: &mut Session, args: &[Item]) -> ItemResult {
    session.config.output_accuracy = setting(args, "accuracy", 1, 1000)?;
    Ok(args[0].clone())
}

fn precision(session: &mut Session, args: &[Item]) -> ItemResult {
    session.config.precision = setting(args, "precision", 0, 1000)?;
    Ok(args[0].clone())
}

fn comma(session: &mut Session, args: &[Item]) -> ItemResult {
    session.config.comma = args[0].is_true();
    Ok(args[0].clone())
}

fn leading_zero(session: &mut Session, args: &[Item]) -> ItemResult {
    session.config.leading_zero = args[0].is_true();
    Ok(args[0].clone())
}

fn timer(session: &mut Session, args: &[Item]) -> ItemResult {
    session.config.timer = args[0].is_true();
    Ok(args[0].clone())
}

fn integer_grouping(session: &mut Session, args: &[Item]) -> ItemResult {
    session.config.integer_grouping = setting(args, "integer_grouping", 0, 1000)?;
    Ok(args[0].clone())
}

fn decimal_grouping(session: &mut Session, args: &[Item]) -> ItemResult {
    session.config.decimal_grouping = setting(args, "decimal_grouping", 0, 1000)?;
    Ok(args[0].clone())
}

fn input_radix(session: &mut Session, args: &[Item]) -> ItemResult {
    session.config.input_radix = setting(args, "input_radix", 2, 62)? as u32;
    Ok(args[0].clone())
}

fn output_radix(session: &mut Session, args: &[Item]) -> ItemResult {
    session.config.output_radix = setting(args, "output_radix", 2, 62)?.to_string();
    Ok(args[0].clone())
}

fn comma_mode(session: &mut Session, _: &[Item]) -> ItemResult {
    session.modes.comma = true;
    Ok(Item::Nothing)
}

fn hex_mode(session: &mut Session, _: &[Item]) -> ItemResult {
    session.modes.hex = true;
    Ok(Item::Nothing)
}

fn octal_mode(session: &mut Session, _: &[Item]) -> ItemResult {
    session.modes.octal = true;
    Ok(Item::Nothing)
}

fn leading_zero_mode(session: &mut Session, _: &[Item]) -> ItemResult {
    session.modes.leading_zero = true;
    Ok(Item::Nothing)
}

fn timer_mode(session: &mut Session, _: &[Item]) -> ItemResult {
    session.modes.timer = true;
    Ok(Item::Nothing)
}

fn set(session: &mut Session, args: &[Item]) -> ItemResult {
    match &args[0] {
        Item::Name(name) => {
            session.set_variable(name, args[1].clone());
            Ok(args[1].clone())
        }
        other => Err(CalcError::InvalidArgument("set".to_string(), other.to_string())),
    }
}

fn result(session: &mut Session, _: &[Item]) -> ItemResult {
    match session.data_dir() {
        Some(dir) => persistence::load_result(dir),
        None => Ok(Item::Number(Value::zero())),
    }
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "settings";
    reg.add(OperatorInfo::new("accuracy", &[Scalar], cat, "sets the output accuracy", accuracy));
    reg.add(OperatorInfo::new("precision", &[Scalar], cat, "sets the precision of non-decimal output", precision));
    reg.add(OperatorInfo::new("comma", &[Scalar], cat, "sets comma mode on or off", comma));
    reg.add(OperatorInfo::new("leading_zero", &[Scalar], cat, "sets leading zero mode on or off", leading_zero));
    reg.add(OperatorInfo::new("timer", &[Scalar], cat, "sets the timer on or off", timer));
    reg.add(OperatorInfo::new("integer_grouping", &[Scalar], cat, "sets the integer digit grouping", integer_grouping));
    reg.add(OperatorInfo::new("decimal_grouping", &[Scalar], cat, "sets the decimal digit grouping", decimal_grouping));
    reg.add(OperatorInfo::new("input_radix", &[Scalar], cat, "sets the input radix", input_radix));
    reg.add(OperatorInfo::new("output_radix", &[Scalar], cat, "sets the output radix", output_radix));
    reg.add(OperatorInfo::new("comma_mode", &[], cat, "turns comma mode on for the current expression", comma_mode).side_effect());
    reg.add(OperatorInfo::new("hex_mode", &[], cat, "prints the result in hexadecimal", hex_mode).side_effect());
    reg.add(OperatorInfo::new("octal_mode", &[], cat, "prints the result in octal", octal_mode).side_effect());
    reg.add(
        OperatorInfo::new("leading_zero_mode", &[], cat, "turns leading zero mode on for the current expression", leading_zero_mode)
            .side_effect(),
    );
    reg.add(OperatorInfo::new("timer_mode", &[], cat, "times the current expression", timer_mode).side_effect());
    reg.add(OperatorInfo::new("set", &[Any, Any], "special", "assigns a value to a variable", set));
    reg.add(OperatorInfo::new("result", &[], "special", "loads the result of the previous run", result));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::evaluate;

    #[test]
    fn test_history() {
        let mut s = Session::new();
        assert!(s.result(1).is_err());
        s.push_result(Item::int(4));
        assert_eq!(s.result(1), Ok(Item::int(4)));
        assert_eq!(evaluate(&["$1", "3", "+"], &mut s), Ok(Item::int(7)));
        assert_eq!(evaluate(&["$2"], &mut s), Err(CalcError::HistoryOutOfRange(2).at(1)));
    }

    #[test]
    fn test_variables() {
        let mut s = Session::new();
        assert_eq!(evaluate(&["$a", "5", "set"], &mut s), Ok(Item::int(5)));
        assert_eq!(evaluate(&["$a", "2", "*"], &mut s), Ok(Item::int(10)));
    }

    #[test]
    fn test_settings() {
        let mut s = Session::new();
        assert_eq!(evaluate(&["20", "accuracy"], &mut s), Ok(Item::int(20)));
        assert_eq!(s.config.output_accuracy, 20);
        assert_eq!(evaluate(&["5", "hex_mode"], &mut s), Ok(Item::int(5)));
        assert!(s.modes.hex);
        s.reset_modes();
        assert_eq!(s.modes, Modes::default());
        assert!(evaluate(&["99", "input_radix"], &mut s).is_err());
    }

    #[test]
    fn test_saved_result() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config { data_dir: Some(dir.path().to_path_buf()), ..Config::default() };
        let mut s = Session::with_config(cfg.clone());
        s.push_result(Item::int(42));
        let mut s2 = Session::with_config(cfg);
        assert_eq!(evaluate(&["result"], &mut s2), Ok(Item::int(42)));
    }

    #[test]
    fn test_thousands() {
        assert_eq!(thousands(0), "0");
        assert_eq!(thousands(1234567), "1,234,567");
        assert_eq!(thousands(100), "100");
    }
}
