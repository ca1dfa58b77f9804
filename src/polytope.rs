use std::f64::consts::PI;

use num_bigint::BigInt;
use num_traits::{One, Zero};

use crate::combinatorics::binomial_big;
use crate::errors::*;
use crate::item::*;
use crate::math::gamma_f64;
use crate::measurement::Measurement;
use crate::operators::{Arg, OpFn, OperatorInfo, Registry};
use crate::session::Session;
use crate::units::Units;
use crate::value::*;

fn int_item(i: BigInt) -> Item {
    Item::Number(Value::Int(i))
}

fn int_arg(item: &Item, op: &str) -> Result<BigInt, CalcError> {
    item.number(op)?.to_bigint(op)
}

fn sides_arg(item: &Item, op: &str) -> Result<BigInt, CalcError> {
    let k = int_arg(item, op)?;
    if k < BigInt::from(3) {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), k.to_string(), "3..".to_string()));
    }
    Ok(k)
}

/// nth k-gonal number: `((k-2)n^2 - (k-4)n) / 2`
fn polygonal_number(n: &BigInt, k: &BigInt) -> BigInt {
    ((k - 2) * n * n - (k - 4) * n) / 2
}

/// Index of `x` among k-gonal numbers. Integral only when `x` is one of them
fn polygonal_index(x: &Value, k: &BigInt) -> CalcResult {
    let k2 = Value::Int(k - 2);
    let k4 = Value::Int(k - 4);
    let disc = Value::from(8i64).mul(k2.clone())?.mul(x.clone())?.add(k4.clone().mul(k4.clone())?)?;
    disc.sqrt()?.add(k4)?.div(Value::from(2i64).mul(k2)?)
}

/// nth centered k-gonal number: `k*n*(n-1)/2 + 1`
fn centered_number(n: &BigInt, k: &BigInt) -> BigInt {
    k * n * (n - 1) / 2 + 1
}

fn centered_index(x: &Value, k: &BigInt) -> CalcResult {
    let kv = Value::Int(k.clone());
    let disc = kv.clone().mul(kv.clone())?.add(Value::from(8i64).mul(kv.clone())?.mul(x.clone().sub(Value::one())?)?)?;
    disc.sqrt()?.add(kv.clone())?.div(Value::from(2i64).mul(kv)?)
}

fn polygonal(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "polygonal")?;
    let k = sides_arg(&args[1], "polygonal")?;
    Ok(int_item(polygonal_number(&n, &k)))
}

fn polygonal_inv(_: &mut Session, args: &[Item]) -> ItemResult {
    let x = args[0].number("polygonal?")?;
    let k = sides_arg(&args[1], "polygonal?")?;
    Ok(Item::Number(polygonal_index(x, &k)?))
}

fn centered(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "centered")?;
    let k = sides_arg(&args[1], "centered")?;
    Ok(int_item(centered_number(&n, &k)))
}

macro_rules! polygon_ops {
    ($( $value:ident, $inverse:ident, $name:expr, $inv_name:expr, $sides:expr, $number:ident, $index:ident; )+) => {
        $(
            fn $value(_: &mut Session, args: &[Item]) -> ItemResult {
                let n = int_arg(&args[0], $name)?;
                Ok(int_item($number(&n, &BigInt::from($sides))))
            }

            fn $inverse(_: &mut Session, args: &[Item]) -> ItemResult {
                let x = args[0].number($inv_name)?;
                Ok(Item::Number($index(x, &BigInt::from($sides))?))
            }
        )+
    };
}

polygon_ops! {
    triangular, triangular_inv, "triangular", "triangular?", 3, polygonal_number, polygonal_index;
    pentagonal, pentagonal_inv, "pentagonal", "pentagonal?", 5, polygonal_number, polygonal_index;
    hexagonal, hexagonal_inv, "hexagonal", "hexagonal?", 6, polygonal_number, polygonal_index;
    heptagonal, heptagonal_inv, "heptagonal", "heptagonal?", 7, polygonal_number, polygonal_index;
    octagonal, octagonal_inv, "octagonal", "octagonal?", 8, polygonal_number, polygonal_index;
    nonagonal, nonagonal_inv, "nonagonal", "nonagonal?", 9, polygonal_number, polygonal_index;
    decagonal, decagonal_inv, "decagonal", "decagonal?", 10, polygonal_number, polygonal_index;
    ctriangular, ctriangular_inv, "ctriangular", "ctriangular?", 3, centered_number, centered_index;
    csquare, csquare_inv, "csquare", "csquare?", 4, centered_number, centered_index;
    cpentagonal, cpentagonal_inv, "cpentagonal", "cpentagonal?", 5, centered_number, centered_index;
    chexagonal, chexagonal_inv, "chexagonal", "chexagonal?", 6, centered_number, centered_index;
    cheptagonal, cheptagonal_inv, "cheptagonal", "cheptagonal?", 7, centered_number, centered_index;
    coctagonal, coctagonal_inv, "coctagonal", "coctagonal?", 8, centered_number, centered_index;
    cnonagonal, cnonagonal_inv, "cnonagonal", "cnonagonal?", 9, centered_number, centered_index;
    cdecagonal, cdecagonal_inv, "cdecagonal", "cdecagonal?", 10, centered_number, centered_index;
}

macro_rules! solid_ops {
    ($( $id:ident, |$n:ident| $formula:expr; )+) => {
        $(
            fn $id(_: &mut Session, args: &[Item]) -> ItemResult {
                let $n = int_arg(&args[0], stringify!($id))?;
                let $n = &$n;
                Ok(int_item($formula))
            }
        )+
    };
}

solid_ops! {
    pyramid, |n| n * (n + 1) * (n * 2 + 1) / 6;
    tetrahedral, |n| n * (n + 1) * (n + 2) / 6;
    octahedral, |n| n * (n * n * 2 + 1) / 3;
    dodecahedral, |n| n * (n * 3 - 1) * (n * 3 - 2) / 2;
    icosahedral, |n| n * (n * n * 5 - n * 5 + 2) / 2;
    pentatope, |n| n * (n + 1) * (n + 2) * (n + 3) / 24;
    rhombdodec, |n| (n * 2 - 1) * (n * n * 2 - n * 2 + 1);
    centeredcube, |n| n * n * n + (n - 1) * (n - 1) * (n - 1);
    steloct, |n| n * (n * n * 2 - 1);
    truncoct, |n| n * n * n * 16 - n * n * 33 + n * 24 - 6;
    trunctet, |n| n * (n * n * 23 - n * 27 + 10) / 6;
}

/// nth figurate number of dimension k
fn polytope(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "polytope")?;
    let k = args[1].to_usize("polytope")?;
    if k == 0 {
        return Err(CalcError::ArgumentOutOfRange("polytope".to_string(), "0".to_string(), "1..".to_string()));
    }
    Ok(int_item(binomial_big(&(n + k - 1), k)))
}

/// Numbers both square and triangular: 0, 1, 36, 1225, ...
fn squaretri(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].to_usize("squaretri")?;
    let (mut a, mut b) = (BigInt::zero(), BigInt::one());
    for _ in 0..n {
        let next = &b * 34 - &a + 2;
        a = std::mem::replace(&mut b, next);
    }
    Ok(int_item(a))
}

/// Area of a regular n-gon with unit sides
fn polyarea(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].to_f64("polyarea")?;
    if n < 3.0 {
        return Err(CalcError::ArgumentOutOfRange("polyarea".to_string(), n.to_string(), "3..".to_string()));
    }
    Ok(Item::Number(Value::Float(n / (4.0 * (PI / n).tan())).normalize()))
}

fn trianglearea(_: &mut Session, args: &[Item]) -> ItemResult {
    let a = args[0].to_f64("trianglearea")?;
    let b = args[1].to_f64("trianglearea")?;
    let c = args[2].to_f64("trianglearea")?;
    let s = (a + b + c) / 2.0;
    let sq = s * (s - a) * (s - b) * (s - c);
    if sq < 0.0 {
        return Err(CalcError::InvalidArgument("trianglearea".to_string(), format!("{} {} {}", a, b, c)));
    }
    Ok(Item::Number(Value::Float(sq.sqrt()).normalize()))
}

// Sizes of an n-sphere of unit radius in k dimensions
fn unit_area(k: f64) -> f64 {
    2.0 * PI.powf(k / 2.0) / gamma_f64(k / 2.0)
}

fn unit_volume(k: f64) -> f64 {
    PI.powf(k / 2.0) / gamma_f64(k / 2.0 + 1.0)
}

fn dims_arg(item: &Item, op: &str) -> Result<i32, CalcError> {
    let k = item.to_i64(op)?;
    if !(3..=1000).contains(&k) {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), k.to_string(), "3..1000".to_string()));
    }
    Ok(k as i32)
}

/// Radius in meters of the sphere described by a length, a surface area or
/// a volume. Plain numbers are taken as the radius
fn sphere_radius(item: &Item, k: i32, op: &str) -> Result<f64, CalcError> {
    let m = match item {
        Item::Measure(m) => m,
        _ => return item.to_f64(op),
    };
    let dims = m.units.dims()?;
    let meter = Units::single("meter");
    for p in &[1, k - 1, k] {
        let target = meter.power(*p);
        if target.dims()? != dims {
            continue;
        }
        let x = m.convert_value(&target)?.to_f64(op)?;
        return Ok(if *p == 1 {
            x
        } else if *p == k - 1 {
            (x / unit_area(f64::from(k))).powf(1.0 / f64::from(k - 1))
        } else {
            (x / unit_volume(f64::from(k))).powf(1.0 / f64::from(k))
        });
    }
    Err(CalcError::InvalidArgument(op.to_string(), item.to_string()))
}

fn sphere_measure(value: f64, power: i32) -> Item {
    Measurement::new(Value::Float(value).normalize(), Units::single("meter").power(power)).simplify()
}

fn nspherearea(_: &mut Session, args: &[Item]) -> ItemResult {
    let k = dims_arg(&args[1], "nspherearea")?;
    let r = sphere_radius(&args[0], k, "nspherearea")?;
    Ok(sphere_measure(unit_area(f64::from(k)) * r.powi(k - 1), k - 1))
}

fn nspherevolume(_: &mut Session, args: &[Item]) -> ItemResult {
    let k = dims_arg(&args[1], "nspherevolume")?;
    let r = sphere_radius(&args[0], k, "nspherevolume")?;
    Ok(sphere_measure(unit_volume(f64::from(k)) * r.powi(k), k))
}

fn nsphereradius(_: &mut Session, args: &[Item]) -> ItemResult {
    let k = dims_arg(&args[1], "nsphereradius")?;
    let r = sphere_radius(&args[0], k, "nsphereradius")?;
    Ok(sphere_measure(r, 1))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "polygonal_numbers";
    reg.add(OperatorInfo::new("polygonal", &[Scalar, Scalar], cat, "returns the nth k-gonal number", polygonal));
    reg.add(OperatorInfo::new("polygonal?", &[Scalar, Scalar], cat, "finds the index of n among k-gonal numbers", polygonal_inv));
    reg.add(OperatorInfo::new("centered", &[Scalar, Scalar], cat, "returns the nth centered k-gonal number", centered));
    let named: &[(&'static str, &'static str, OpFn, OpFn)] = &[
        ("triangular", "triangular?", triangular, triangular_inv),
        ("pentagonal", "pentagonal?", pentagonal, pentagonal_inv),
        ("hexagonal", "hexagonal?", hexagonal, hexagonal_inv),
        ("heptagonal", "heptagonal?", heptagonal, heptagonal_inv),
        ("octagonal", "octagonal?", octagonal, octagonal_inv),
        ("nonagonal", "nonagonal?", nonagonal, nonagonal_inv),
        ("decagonal", "decagonal?", decagonal, decagonal_inv),
        ("ctriangular", "ctriangular?", ctriangular, ctriangular_inv),
        ("csquare", "csquare?", csquare, csquare_inv),
        ("cpentagonal", "cpentagonal?", cpentagonal, cpentagonal_inv),
        ("chexagonal", "chexagonal?", chexagonal, chexagonal_inv),
        ("cheptagonal", "cheptagonal?", cheptagonal, cheptagonal_inv),
        ("coctagonal", "coctagonal?", coctagonal, coctagonal_inv),
        ("cnonagonal", "cnonagonal?", cnonagonal, cnonagonal_inv),
        ("cdecagonal", "cdecagonal?", cdecagonal, cdecagonal_inv),
    ];
    for (name, inv_name, value, inverse) in named {
        reg.add(OperatorInfo::new(name, &[Scalar], cat, "returns the nth number of this kind", *value));
        reg.add(OperatorInfo::new(inv_name, &[Scalar], cat, "finds the index of n among numbers of this kind", *inverse));
    }

    let cat = "polyhedral_numbers";
    reg.add(OperatorInfo::new("pyramid", &[Scalar], cat, "returns the nth square pyramidal number", pyramid));
    reg.add(OperatorInfo::new("tetrahedral", &[Scalar], cat, "returns the nth tetrahedral number", tetrahedral));
    reg.add(OperatorInfo::new("octahedral", &[Scalar], cat, "returns the nth octahedral number", octahedral));
    reg.add(OperatorInfo::new("dodecahedral", &[Scalar], cat, "returns the nth dodecahedral number", dodecahedral));
    reg.add(OperatorInfo::new("icosahedral", &[Scalar], cat, "returns the nth icosahedral number", icosahedral));
    reg.add(OperatorInfo::new("pentatope", &[Scalar], cat, "returns the nth pentatope number", pentatope));
    reg.add(OperatorInfo::new("polytope", &[Scalar, Scalar], cat, "returns the nth figurate number of dimension k", polytope));
    reg.add(OperatorInfo::new("rhombdodec", &[Scalar], cat, "returns the nth rhombic dodecahedral number", rhombdodec));
    reg.add(OperatorInfo::new("centeredcube", &[Scalar], cat, "returns the nth centered cube number", centeredcube));
    reg.add(OperatorInfo::new("steloct", &[Scalar], cat, "returns the nth stella octangula number", steloct));
    reg.add(OperatorInfo::new("truncoct", &[Scalar], cat, "returns the nth truncated octahedral number", truncoct));
    reg.add(OperatorInfo::new("trunctet", &[Scalar], cat, "returns the nth truncated tetrahedral number", trunctet));
    reg.add(OperatorInfo::new("squaretri", &[Scalar], cat, "returns the nth square triangular number", squaretri));

    let cat = "geometry";
    reg.add(OperatorInfo::new("polyarea", &[Scalar], cat, "calculates the area of a regular n-gon with unit sides", polyarea));
    reg.add(OperatorInfo::new("trianglearea", &[Scalar, Scalar, Scalar], cat, "calculates the area of a triangle from its sides", trianglearea));
    reg.add(OperatorInfo::new("nspherearea", &[Scalar, Scalar], cat, "calculates the surface area of a k-dimensional sphere", nspherearea));
    reg.add(OperatorInfo::new("nspherevolume", &[Scalar, Scalar], cat, "calculates the volume of a k-dimensional sphere", nspherevolume));
    reg.add(OperatorInfo::new("nsphereradius", &[Scalar, Scalar], cat, "calculates the radius of a k-dimensional sphere", nsphereradius));
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
    fn test_polygonal() {
        assert_eq!(eval(&["1", "6", "range", "triangular"]), "[ 1, 3, 6, 10, 15, 21 ]");
        assert_eq!(eval(&["1", "5", "range", "pentagonal"]), "[ 1, 5, 12, 22, 35 ]");
        assert_eq!(eval(&["4", "hex"]), "28");
        assert_eq!(eval(&["5", "4", "polygonal"]), "25");
        assert_eq!(eval(&["3", "2", "polygonal"]), "error in arg 3:  argument 2 of 'polygonal' out of range (3..)");
        assert_eq!(eval(&["1", "5", "range", "csquare"]), "[ 1, 5, 13, 25, 41 ]");
        assert_eq!(eval(&["4", "chexagonal"]), "37");
    }

    #[test]
    fn test_polygonal_inverse() {
        assert_eq!(eval(&["15", "triangular?"]), "5");
        assert_eq!(eval(&["35", "pent?"]), "5");
        assert_eq!(eval(&["25", "4", "polygonal?"]), "5");
        assert_eq!(eval(&["37", "chexagonal?"]), "4");
        assert_eq!(eval(&["10", "triangular?", "1000", "*", "round"]), "4000");
        assert_eq!(eval(&["16", "triangular?", "1000", "*", "round"]), "5179");
    }

    #[test]
    fn test_solids() {
        assert_eq!(eval(&["1", "5", "range", "pyramid"]), "[ 1, 5, 14, 30, 55 ]");
        assert_eq!(eval(&["1", "5", "range", "tet"]), "[ 1, 4, 10, 20, 35 ]");
        assert_eq!(eval(&["1", "4", "range", "octahedral"]), "[ 1, 6, 19, 44 ]");
        assert_eq!(eval(&["1", "4", "range", "dodecahedral"]), "[ 1, 20, 84, 220 ]");
        assert_eq!(eval(&["1", "4", "range", "icosahedral"]), "[ 1, 12, 48, 124 ]");
        assert_eq!(eval(&["1", "4", "range", "pentatope"]), "[ 1, 5, 15, 35 ]");
        assert_eq!(eval(&["5", "3", "polytope"]), "35");
        assert_eq!(eval(&["1", "3", "range", "rhombdodec"]), "[ 1, 15, 65 ]");
        assert_eq!(eval(&["1", "3", "range", "centeredcube"]), "[ 1, 9, 35 ]");
        assert_eq!(eval(&["1", "3", "range", "steloct"]), "[ 1, 14, 51 ]");
        assert_eq!(eval(&["1", "3", "range", "truncoct"]), "[ 1, 38, 201 ]");
        assert_eq!(eval(&["1", "3", "range", "trunctet"]), "[ 1, 16, 68 ]");
        assert_eq!(eval(&["0", "4", "range", "squaretri"]), "[ 0, 1, 36, 1225, 41616 ]");
    }

    #[test]
    fn test_geometry() {
        assert_eq!(eval(&["3", "4", "5", "trianglearea"]), "6");
        assert_eq!(eval(&["4", "polyarea", "1000000", "*", "round"]), "1000000");
        assert_eq!(eval(&["2", "polyarea"]), "error in arg 2:  argument 2 of 'polyarea' out of range (3..)");
        assert_eq!(eval(&["1", "2", "10", "trianglearea"]), "error in arg 4:  invalid argument 1 2 10 for operator 'trianglearea'");
    }

    #[test]
    fn test_nsphere() {
        assert_eq!(eval(&["1", "3", "nspherevolume", "value", "1000000", "*", "round"]), "4188790");
        assert_eq!(eval(&["2", "meter", "3", "nspherearea", "value", "1000", "*", "round"]), "50265");
        assert_eq!(eval(&["200", "cm", "3", "nspherearea", "value", "1000", "*", "round"]), "50265");
        assert_eq!(eval(&["1", "3", "nspherevolume", "3", "nsphereradius", "value", "1000", "*", "round"]), "1000");
        assert_eq!(eval(&["2", "3", "nspherearea", "3", "nsphereradius", "value", "1000", "*", "round"]), "2000");
        assert_eq!(eval(&["1", "3", "nsphereradius"]), "1 meter");
    }
}
