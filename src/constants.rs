use num_bigint::BigInt;
use num_traits::One;

use crate::item::*;
use crate::operators::{OperatorInfo, Registry};
use crate::session::Session;
use crate::value::*;

fn float(f: f64) -> Value {
    Value::Float(f)
}

fn int(i: i64) -> Value {
    Value::from(i)
}

/// `2^bits - 1`
fn max_unsigned(bits: usize) -> Value {
    Value::Int((BigInt::one() << bits) - 1)
}

fn max_signed(bits: usize) -> Value {
    max_unsigned(bits - 1)
}

fn min_signed(bits: usize) -> Value {
    Value::Int(-(BigInt::one() << (bits - 1)))
}

macro_rules! constant_ops {
    ($( $id:ident, $name:expr, $cat:expr, $brief:expr, $val:expr; )+) => {
        $(
            fn $id(_: &mut Session, _: &[Item]) -> ItemResult {
                Ok(Item::Number($val))
            }
        )+

        pub(crate) fn register(reg: &mut Registry) {
            $( reg.add(OperatorInfo::new($name, &[], $cat, $brief, $id)); )+
        }
    };
}

constant_ops! {
    pi, "pi", "constants", "returns pi (Archimedes' constant)", float(std::f64::consts::PI);
    e, "e", "constants", "returns e (Euler's number)", float(std::f64::consts::E);
    phi, "phi", "constants", "returns phi (the golden ratio)", float(1.618_033_988_749_895);
    euler, "euler", "constants", "returns the Euler-Mascheroni constant", float(0.577_215_664_901_532_9);
    catalans, "catalans", "constants", "returns Catalan's constant", float(0.915_965_594_177_219);
    apery, "apery", "constants", "returns Apery's constant", float(1.202_056_903_159_594_2);
    glaisher, "glaisher", "constants", "returns Glaisher's constant", float(1.282_427_129_100_622_6);
    khinchin, "khinchin", "constants", "returns Khinchin's constant", float(2.685_452_001_065_306);
    mertens, "mertens", "constants", "returns Mertens' constant", float(0.261_497_212_847_642_8);
    mills, "mills", "constants", "returns Mills' constant", float(1.306_377_883_863_080_7);
    plastic, "plastic", "constants", "returns the plastic constant", float(1.324_717_957_244_746);
    robbins, "robbins", "constants", "returns Robbins' constant", float(0.661_707_182_267_176_2);
    prevost, "prevost", "constants", "returns Prevost's constant", float(3.359_885_666_243_177_6);
    champernowne, "champernowne", "constants", "returns the Champernowne constant", float(0.123_456_789_101_112_13);
    copeland, "copeland", "constants", "returns the Copeland-Erdos constant", float(0.235_711_131_719_232_9);
    omega, "omega", "constants", "returns the omega constant, W(1)", float(0.567_143_290_409_783_8);
    infinity, "infinity", "constants", "evaluates to infinity", float(f64::INFINITY);
    negative_infinity, "negative_infinity", "constants", "evaluates to negative infinity", float(f64::NEG_INFINITY);
    true_, "true", "constants", "used with boolean settings", int(1);
    false_, "false", "constants", "used with boolean settings", int(0);
    default, "default", "constants", "used with settings operators", int(-1);
    avogadro, "avogadro", "constants", "returns Avogadro's number", float(6.022_140_857e23);

    january, "january", "date_time", "returns 1", int(1);
    february, "february", "date_time", "returns 2", int(2);
    march, "march", "date_time", "returns 3", int(3);
    april, "april", "date_time", "returns 4", int(4);
    may, "may", "date_time", "returns 5", int(5);
    june, "june", "date_time", "returns 6", int(6);
    july, "july", "date_time", "returns 7", int(7);
    august, "august", "date_time", "returns 8", int(8);
    september, "september", "date_time", "returns 9", int(9);
    october, "october", "date_time", "returns 10", int(10);
    november, "november", "date_time", "returns 11", int(11);
    december, "december", "date_time", "returns 12", int(12);
    monday, "monday", "date_time", "returns 1", int(1);
    tuesday, "tuesday", "date_time", "returns 2", int(2);
    wednesday, "wednesday", "date_time", "returns 3", int(3);
    thursday, "thursday", "date_time", "returns 4", int(4);
    friday, "friday", "date_time", "returns 5", int(5);
    saturday, "saturday", "date_time", "returns 6", int(6);
    sunday, "sunday", "date_time", "returns 7", int(7);

    maxchar, "maxchar", "constants", "returns the maximum 8-bit signed integer", max_signed(8);
    minchar, "minchar", "constants", "returns the minimum 8-bit signed integer", min_signed(8);
    maxuchar, "maxuchar", "constants", "returns the maximum 8-bit unsigned integer", max_unsigned(8);
    minuchar, "minuchar", "constants", "returns 0", int(0);
    maxshort, "maxshort", "constants", "returns the maximum 16-bit signed integer", max_signed(16);
    minshort, "minshort", "constants", "returns the minimum 16-bit signed integer", min_signed(16);
    maxushort, "maxushort", "constants", "returns the maximum 16-bit unsigned integer", max_unsigned(16);
    minushort, "minushort", "constants", "returns 0", int(0);
    maxlong, "maxlong", "constants", "returns the maximum 32-bit signed integer", max_signed(32);
    minlong, "minlong", "constants", "returns the minimum 32-bit signed integer", min_signed(32);
    maxulong, "maxulong", "constants", "returns the maximum 32-bit unsigned integer", max_unsigned(32);
    minulong, "minulong", "constants", "returns 0", int(0);
    maxlonglong, "maxlonglong", "constants", "returns the maximum 64-bit signed integer", max_signed(64);
    minlonglong, "minlonglong", "constants", "returns the minimum 64-bit signed integer", min_signed(64);
    maxulonglong, "maxulonglong", "constants", "returns the maximum 64-bit unsigned integer", max_unsigned(64);
    minulonglong, "minulonglong", "constants", "returns 0", int(0);
    maxquadlong, "maxquadlong", "constants", "returns the maximum 128-bit signed integer", max_signed(128);
    minquadlong, "minquadlong", "constants", "returns the minimum 128-bit signed integer", min_signed(128);
    maxuquadlong, "maxuquadlong", "constants", "returns the maximum 128-bit unsigned integer", max_unsigned(128);
    minuquadlong, "minuquadlong", "constants", "returns 0", int(0);
    maxfloat, "maxfloat", "constants", "returns the largest 32-bit float", float(f32::MAX as f64);
    minfloat, "minfloat", "constants", "returns the smallest normal 32-bit float", float(f32::MIN_POSITIVE as f64);
    maxdouble, "maxdouble", "constants", "returns the largest 64-bit float", float(f64::MAX);
    mindouble, "mindouble", "constants", "returns the smallest normal 64-bit float", float(f64::MIN_POSITIVE);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::evaluate;

    fn eval(terms: &[&str]) -> String {
        let mut s = Session::new();
        evaluate(terms, &mut s).unwrap().to_string()
    }

    #[test]
    fn test_limits() {
        assert_eq!(eval(&["maxchar"]), "127");
        assert_eq!(eval(&["minshort"]), "-32768");
        assert_eq!(eval(&["maxulonglong"]), "18446744073709551615");
        assert_eq!(eval(&["minquadlong"]), "-170141183460469231731687303715884105728");
        assert_eq!(eval(&["minulong"]), "0");
    }

    #[test]
    fn test_names() {
        assert_eq!(eval(&["june"]), "6");
        assert_eq!(eval(&["sunday"]), "7");
        assert_eq!(eval(&["true", "false", "+"]), "1");
        assert_eq!(eval(&["infinity"]), "inf");
    }
}
