use num_bigint::BigInt;
use num_rational::BigRational;
use std::fmt;

#[derive(PartialEq, Clone)]
pub enum CalcError {
    StrToFloat(String),
    StrToInt(String),
    IntToFloat(BigInt),
    RatioToFloat(BigRational),
    FloatToInt(f64),
    FloatToRatio(f64),
    DividedByZero(String),

    NotForComplex(String),
    NotForNegativeInt(String),
    OnlyInt(String),

    InvalidArgument(String, String),
    ArgumentOutOfRange(String, String, String),
    IndexOutOfRange(String, usize),

    UnknownOperator(String),
    NotEnoughArgs(String, usize),
    AtTerm(usize, Box<CalcError>),
    BracketMismatch(i32),
    UnexpectedEnd,
    UnfinishedFunction,
    FunctionExpected(String),
    NoFunctionDefinition(String),
    VarUndeclared(String),
    HistoryOutOfRange(usize),

    ExpectedNumber(String),
    ExpectedList(String),
    IncompatibleUnits(String, String),
    UndefinedUnit(String),
    InvalidDate(String),

    ParseFailed(String),
    Config(String),
    Io(String),

    Unreachable,
}

impl CalcError {
    /// Attaches the 1-based position of the term that failed
    pub fn at(self, index: usize) -> CalcError {
        match self {
            CalcError::AtTerm(..) => self,
            e => CalcError::AtTerm(index, Box::new(e)),
        }
    }
}

impl fmt::Display for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self {
            CalcError::StrToFloat(s) => write!(f, "failed to convert '{}' to float", s),
            CalcError::StrToInt(s) => write!(f, "failed to convert '{}' to integer", s),
            CalcError::IntToFloat(i) => write!(f, "integer {} is too large for a float", i),
            CalcError::RatioToFloat(r) => write!(f, "fraction {} cannot be converted to float", r),
            CalcError::FloatToInt(g) => write!(f, "float {} cannot be converted to integer", g),
            CalcError::FloatToRatio(g) => write!(f, "float {} cannot be converted to fraction", g),
            CalcError::DividedByZero(s) => write!(f, "'{}' divided by zero", s),

            CalcError::NotForComplex(s) => write!(f, "'{}' is not supported for complex numbers", s),
            CalcError::NotForNegativeInt(s) => write!(f, "'{}' is not supported for negative numbers", s),
            CalcError::OnlyInt(s) => write!(f, "'{}' supports only integers", s),

            CalcError::InvalidArgument(op, val) => write!(f, "invalid argument {} for operator '{}'", val, op),
            CalcError::ArgumentOutOfRange(op, val, range) => {
                write!(f, "argument {} of '{}' out of range ({})", val, op, range)
            }
            CalcError::IndexOutOfRange(op, idx) => write!(f, "index {} out of range for '{}'", idx, op),

            CalcError::UnknownOperator(s) => write!(f, "unrecognized operator or value '{}'", s),
            CalcError::NotEnoughArgs(op, n) => {
                let plural = if *n > 1 { "s" } else { "" };
                write!(f, "operator '{}' requires {} argument{}", op, n, plural)
            }
            CalcError::AtTerm(idx, e) => write!(f, "error in arg {}:  {}", idx, e),
            CalcError::BracketMismatch(count) => write!(f, "mismatched brackets (count: {})", count),
            CalcError::UnexpectedEnd => write!(f, "unexpected end of input"),
            CalcError::UnfinishedFunction => write!(f, "unexpected end of input in function definition"),
            CalcError::FunctionExpected(op) => write!(f, "'{}' expects a function argument", op),
            CalcError::NoFunctionDefinition(op) => {
                write!(f, "function operator '{}' requires a function definition", op)
            }
            CalcError::VarUndeclared(s) => write!(f, "variable '{}' is not defined", s),
            CalcError::HistoryOutOfRange(i) => write!(f, "result index {} out of range", i),

            CalcError::ExpectedNumber(op) => write!(f, "'{}' expects a numeric argument", op),
            CalcError::ExpectedList(op) => write!(f, "'{}' expects a list argument", op),
            CalcError::IncompatibleUnits(from, to) => write!(f, "incompatible units: '{}' and '{}'", from, to),
            CalcError::UndefinedUnit(s) => write!(f, "undefined unit '{}'", s),
            CalcError::InvalidDate(s) => write!(f, "invalid date: {}", s),

            CalcError::ParseFailed(s) => write!(f, "failed to parse '{}'", s),
            CalcError::Config(s) => write!(f, "configuration error: {}", s),
            CalcError::Io(s) => write!(f, "i/o error: {}", s),

            CalcError::Unreachable => write!(f, "unreachable"),
        }
    }
}

impl fmt::Debug for CalcError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self)
    }
}

impl std::error::Error for CalcError {}

impl From<std::io::Error> for CalcError {
    fn from(e: std::io::Error) -> Self {
        CalcError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let e = CalcError::NotEnoughArgs("add".to_string(), 2);
        assert_eq!(e.to_string(), "operator 'add' requires 2 arguments");
        let e = CalcError::NotEnoughArgs("sqrt".to_string(), 1);
        assert_eq!(e.to_string(), "operator 'sqrt' requires 1 argument");
        let e = CalcError::NotEnoughArgs("add".to_string(), 2).at(3);
        assert_eq!(e.to_string(), "error in arg 3:  operator 'add' requires 2 arguments");
    }

    #[test]
    fn test_at_keeps_first_position() {
        let e = CalcError::UnexpectedEnd.at(2).at(5);
        assert_eq!(e, CalcError::AtTerm(2, Box::new(CalcError::UnexpectedEnd)));
    }
}
