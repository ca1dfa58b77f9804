use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::value::*;

const MAX_BITS: usize = 1 << 20;

fn int_item(i: BigInt) -> Item {
    Item::Number(Value::Int(i))
}

fn int_arg(item: &Item, op: &str) -> Result<BigInt, CalcError> {
    item.value(op)?.to_bigint(op)
}

fn unsigned_arg(item: &Item, op: &str) -> Result<BigInt, CalcError> {
    let n = int_arg(item, op)?;
    if n.is_negative() {
        return Err(CalcError::NotForNegativeInt(op.to_string()));
    }
    Ok(n)
}

fn bits_arg(item: &Item, op: &str) -> Result<usize, CalcError> {
    let k = item.to_usize(op)?;
    if k == 0 || k > MAX_BITS {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), k.to_string(), format!("1..{}", MAX_BITS)));
    }
    Ok(k)
}

/// Inverts all bits of `n` within whole groups of `group` bits
fn invert_bits(n: &BigInt, group: usize) -> BigInt {
    let bits = n.bits() as usize;
    let groups = if bits == 0 { 1 } else { (bits + group - 1) / group };
    ((BigInt::one() << (groups * group)) - 1u32) ^ n
}

fn bitwise(args: &[Item], op: &str, f: fn(&BigInt, &BigInt) -> BigInt) -> ItemResult {
    let a = int_arg(&args[0], op)?;
    let b = int_arg(&args[1], op)?;
    Ok(int_item(f(&a, &b)))
}

fn and(_: &mut Session, args: &[Item]) -> ItemResult {
    bitwise(args, "and", |a, b| a & b)
}

fn or(_: &mut Session, args: &[Item]) -> ItemResult {
    bitwise(args, "or", |a, b| a | b)
}

fn xor(_: &mut Session, args: &[Item]) -> ItemResult {
    bitwise(args, "xor", |a, b| a ^ b)
}

fn not(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = unsigned_arg(&args[0], "not")?;
    Ok(int_item(invert_bits(&n, session.config.bitwise_group_size)))
}

fn nand(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = unsigned_arg(&args[0], "nand")? & unsigned_arg(&args[1], "nand")?;
    Ok(int_item(invert_bits(&n, session.config.bitwise_group_size)))
}

fn nor(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = unsigned_arg(&args[0], "nor")? | unsigned_arg(&args[1], "nor")?;
    Ok(int_item(invert_bits(&n, session.config.bitwise_group_size)))
}

fn shiftleft(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "shiftleft")?;
    let k = args[1].to_usize("shiftleft")?;
    if k > MAX_BITS {
        return Err(CalcError::ArgumentOutOfRange("shiftleft".to_string(), k.to_string(), format!("0..{}", MAX_BITS)));
    }
    Ok(int_item(n << k))
}

fn shiftright(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "shiftright")?;
    let k = args[1].to_usize("shiftright")?;
    Ok(int_item(n >> k))
}

fn countbits(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = unsigned_arg(&args[0], "countbits")?;
    Ok(Item::Number(Value::from(n.magnitude().count_ones())))
}

fn parity(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = unsigned_arg(&args[0], "parity")?;
    Ok(Item::Number(Value::from(n.magnitude().count_ones() & 1)))
}

/// Two's complement reading of the low `k` bits of `n`
fn to_signed(n: &BigInt, k: usize) -> BigInt {
    let half = BigInt::one() << (k - 1);
    (n + &half).mod_floor(&(&half << 1)) - half
}

fn to_unsigned(n: &BigInt, k: usize) -> BigInt {
    n.mod_floor(&(BigInt::one() << k))
}

fn integer(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "integer")?;
    let k = bits_arg(&args[1], "integer")?;
    Ok(int_item(to_signed(&n, k)))
}

fn uinteger(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "uinteger")?;
    let k = bits_arg(&args[1], "uinteger")?;
    Ok(int_item(to_unsigned(&n, k)))
}

macro_rules! machine_ops {
    ($( $id:ident, $bits:expr, $conv:ident; )+) => {
        $(
            fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
                let n = int_arg(&args[0], stringify!($id))?;
                Ok(int_item($conv(&n, $bits)))
            }
        )+
    };
}

machine_ops! {
    char, 8, to_signed;
    short, 16, to_signed;
    long, 32, to_signed;
    longlong, 64, to_signed;
    uchar, 8, to_unsigned;
    ushort, 16, to_unsigned;
    ulong, 32, to_unsigned;
    ulonglong, 64, to_unsigned;
}

fn float(_: &mut Session, args: &[Item]) -> ItemResult {
    let x = args[0].to_f64("float")? as f32;
    Ok(Item::Number(Value::from(u64::from(x.to_bits()))))
}

fn double(_: &mut Session, args: &[Item]) -> ItemResult {
    let x = args[0].to_f64("double")?;
    Ok(Item::Number(Value::from(x.to_bits())))
}

fn unfloat(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = unsigned_arg(&args[0], "unfloat")?;
    let bits = n
        .to_u32()
        .ok_or_else(|| CalcError::ArgumentOutOfRange("unfloat".to_string(), n.to_string(), "0..2^32".to_string()))?;
    Ok(Item::Number(Value::Float(f64::from(f32::from_bits(bits))).normalize()))
}

fn undouble(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = unsigned_arg(&args[0], "undouble")?;
    let bits = n
        .to_u64()
        .ok_or_else(|| CalcError::ArgumentOutOfRange("undouble".to_string(), n.to_string(), "0..2^64".to_string()))?;
    Ok(Item::Number(Value::Float(f64::from_bits(bits)).normalize()))
}

fn field_sizes(item: &Item, op: &str) -> Result<Vec<usize>, CalcError> {
    item.list(op)?.iter().map(|f| bits_arg(f, op)).collect()
}

/// Packs values into bit fields. The last value takes the lowest bits
fn pack(_: &mut Session, args: &[Item]) -> ItemResult {
    let values = args[0].list("pack")?;
    let fields = field_sizes(&args[1], "pack")?;
    let mut res = BigInt::zero();
    for (v, size) in values.iter().zip(fields.iter()) {
        res = (res << *size) | to_unsigned(&int_arg(v, "pack")?, *size);
    }
    Ok(int_item(res))
}

/// Splits a value into bit fields, the last field taken from the lowest bits
fn unpack(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut n = unsigned_arg(&args[0], "unpack")?;
    let fields = field_sizes(&args[1], "unpack")?;
    let mut res = Vec::with_capacity(fields.len());
    for size in fields.iter().rev() {
        res.push(int_item(to_unsigned(&n, *size)));
        n >>= *size;
    }
    res.reverse();
    Ok(Item::List(res))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "bitwise";
    reg.add(OperatorInfo::new("and", &[Scalar, Scalar], cat, "calculates the bitwise 'and' of n and k", and));
    reg.add(OperatorInfo::new("or", &[Scalar, Scalar], cat, "calculates the bitwise 'or' of n and k", or));
    reg.add(OperatorInfo::new("xor", &[Scalar, Scalar], cat, "calculates the bitwise 'xor' of n and k", xor));
    reg.add(OperatorInfo::new("nand", &[Scalar, Scalar], cat, "calculates the bitwise 'nand' of n and k", nand));
    reg.add(OperatorInfo::new("nor", &[Scalar, Scalar], cat, "calculates the bitwise 'nor' of n and k", nor));
    reg.add(OperatorInfo::new("not", &[Scalar], cat, "inverts the bits of n within whole bit groups", not));
    reg.add(OperatorInfo::new("shiftleft", &[Scalar, Scalar], cat, "shifts n left by k bits", shiftleft));
    reg.add(OperatorInfo::new("shiftright", &[Scalar, Scalar], cat, "shifts n right by k bits", shiftright));
    reg.add(OperatorInfo::new("countbits", &[Scalar], cat, "counts the set bits of n", countbits));
    reg.add(OperatorInfo::new("parity", &[Scalar], cat, "returns 1 for an odd count of set bits", parity));
    reg.add(OperatorInfo::new("pack", &[List, List], cat, "packs values into bit fields of the given sizes", pack));
    reg.add(OperatorInfo::new("unpack", &[Scalar, List], cat, "unpacks n into bit fields of the given sizes", unpack));

    let cat = "computer";
    reg.add(OperatorInfo::new("integer", &[Scalar, Scalar], cat, "converts n to a signed k-bit integer", integer));
    reg.add(OperatorInfo::new("uinteger", &[Scalar, Scalar], cat, "converts n to an unsigned k-bit integer", uinteger));
    reg.add(OperatorInfo::new("char", &[Scalar], cat, "converts n to a signed 8-bit integer", char));
    reg.add(OperatorInfo::new("short", &[Scalar], cat, "converts n to a signed 16-bit integer", short));
    reg.add(OperatorInfo::new("long", &[Scalar], cat, "converts n to a signed 32-bit integer", long));
    reg.add(OperatorInfo::new("longlong", &[Scalar], cat, "converts n to a signed 64-bit integer", longlong));
    reg.add(OperatorInfo::new("uchar", &[Scalar], cat, "converts n to an unsigned 8-bit integer", uchar));
    reg.add(OperatorInfo::new("ushort", &[Scalar], cat, "converts n to an unsigned 16-bit integer", ushort));
    reg.add(OperatorInfo::new("ulong", &[Scalar], cat, "converts n to an unsigned 32-bit integer", ulong));
    reg.add(OperatorInfo::new("ulonglong", &[Scalar], cat, "converts n to an unsigned 64-bit integer", ulonglong));
    reg.add(OperatorInfo::new("float", &[Scalar], cat, "returns the bits of n as a 32-bit IEEE float", float));
    reg.add(OperatorInfo::new("double", &[Scalar], cat, "returns the bits of n as a 64-bit IEEE float", double));
    reg.add(OperatorInfo::new("unfloat", &[Scalar], cat, "reads n as the bits of a 32-bit IEEE float", unfloat));
    reg.add(OperatorInfo::new("undouble", &[Scalar], cat, "reads n as the bits of a 64-bit IEEE float", undouble));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::evaluate;

    fn eval(terms: &[&str]) -> String {
        let mut s = Session::new();
        match evaluate(terms, &mut s) {
            Ok(item) => item.to_string(),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(eval(&["12", "10", "and"]), "8");
        assert_eq!(eval(&["12", "10", "or"]), "14");
        assert_eq!(eval(&["12", "10", "xor"]), "6");
        assert_eq!(eval(&["0", "not"]), "65535");
        assert_eq!(eval(&["1", "not"]), "65534");
        assert_eq!(eval(&["65536", "not"]), "4294901759");
        assert_eq!(eval(&["12", "10", "nand"]), "65527");
        assert_eq!(eval(&["-1", "not"]), "error in arg 2:  'not' is not supported for negative numbers");
        assert_eq!(eval(&["1", "10", "shiftleft"]), "1024");
        assert_eq!(eval(&["1024", "3", "shiftright"]), "128");
        assert_eq!(eval(&["255", "countbits"]), "8");
        assert_eq!(eval(&["7", "parity"]), "1");
        assert_eq!(eval(&["6", "parity"]), "0");
    }

    #[test]
    fn test_group_size() {
        let mut s = Session::new();
        s.config.bitwise_group_size = 8;
        assert_eq!(evaluate(&["1", "not"], &mut s).unwrap().to_string(), "254");
    }

    #[test]
    fn test_machine_types() {
        assert_eq!(eval(&["200", "char"]), "-56");
        assert_eq!(eval(&["-1", "uchar"]), "255");
        assert_eq!(eval(&["65535", "short"]), "-1");
        assert_eq!(eval(&["-1", "ulong"]), "4294967295");
        assert_eq!(eval(&["-1", "ulonglong"]), "18446744073709551615");
        assert_eq!(eval(&["2147483648", "long"]), "-2147483648");
        assert_eq!(eval(&["12", "3", "integer"]), "-4");
        assert_eq!(eval(&["1", "float"]), "1065353216");
        assert_eq!(eval(&["1065353216", "unfloat"]), "1");
        assert_eq!(eval(&["2", "double"]), "4611686018427387904");
        assert_eq!(eval(&["4611686018427387904", "undouble"]), "2");
    }

    #[test]
    fn test_pack() {
        assert_eq!(eval(&["[", "1", "2", "3", "]", "[", "4", "4", "4", "]", "pack"]), "291");
        assert_eq!(eval(&["291", "[", "4", "4", "4", "]", "unpack"]), "[ 1, 2, 3 ]");
        assert_eq!(eval(&["[", "1", "0", "]", "[", "1", "0", "]", "pack"]), "error in arg 9:  argument 0 of 'pack' out of range (1..1048576)");
    }
}
