//! # RPN calculator
//!
//! Terms are evaluated left to right against a stack: operands are pushed,
//! operators pop their arguments and push their result. `2 3 +` is `5`.
//!
//! Number types, from lowest to highest:
//! * Big integers
//! * Rational numbers
//! * Float numbers (IEEE doubles)
//! * Complex numbers. Input format is `1+2j`
//!
//! Results are narrowed back when possible: `1 2 / 1 2 / +` is the integer `1`.
//!
//! Besides numbers the stack holds:
//! * lists: `[ 1 2 3 ]`. Operators that expect a single value are applied to
//! every element of a list, two lists are paired element by element
//! * measurements: `10 miles km convert`
//! * date-times: `2020-01-31 1 month +`
//! * user functions: `1 10 range x 2 ** eval`
//!
//! Example:
//! ```
//! use rpncalc::session::Session;
//! use rpncalc::stack::evaluate;
//!
//! let mut session = Session::new();
//! let res = evaluate(&["2", "3", "+", "4", "*"], &mut session).unwrap();
//! assert_eq!(res.to_string(), "20");
//! ```
//!
//! Prime and factor caches are loaded lazily from the data directory and
//! written back by `Session::save_caches`.

#[macro_use]
extern crate pest_derive;

pub mod arithmetic;
pub mod astronomy;
pub mod combinatorics;
pub mod computer;
pub mod config;
pub mod constants;
pub mod datetime;
pub mod dice;
pub mod errors;
pub mod factor;
pub mod function;
pub mod help;
pub mod item;
pub mod lexicographic;
pub mod lists;
pub mod math;
pub mod measurement;
pub mod name;
pub mod numbertheory;
pub mod operators;
pub mod output;
pub mod parse;
pub mod persistence;
pub mod polytope;
pub mod primes;
pub mod session;
pub mod stack;
pub mod units;
pub mod value;
