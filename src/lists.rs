use std::cmp::Ordering;

use itertools::Itertools;
use num_bigint::BigInt;
use num_complex::Complex;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::arithmetic::{add_items, compare_items, divide_items, items_equal, multiply_items, subtract_items};
use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::value::*;

// ranges are materialized, keep them reasonable
const MAX_RANGE_LEN: usize = 10_000_000;
const SOLVE_ITERATIONS: usize = 1000;

fn range_limit(op: &str, len: f64) -> Result<(), CalcError> {
    if !len.is_finite() || len > MAX_RANGE_LEN as f64 {
        return Err(CalcError::ArgumentOutOfRange(
            op.to_string(),
            format_f64(len),
            format!("at most {} items", MAX_RANGE_LEN),
        ));
    }
    Ok(())
}

fn sorted(items: &[Item], op: &str) -> Result<Vec<Item>, CalcError> {
    let mut err = None;
    let mut res = items.to_vec();
    res.sort_by(|a, b| {
        compare_items(a, b, op).unwrap_or_else(|e| {
            err.get_or_insert(e);
            Ordering::Equal
        })
    });
    match err {
        Some(e) => Err(e),
        None => Ok(res),
    }
}

/// Index of the first item that wins against all others
fn extreme_index(items: &[Item], op: &str, wanted: Ordering) -> Result<Option<usize>, CalcError> {
    let mut best: Option<usize> = None;
    for (idx, item) in items.iter().enumerate() {
        best = match best {
            None => Some(idx),
            Some(b) if compare_items(item, &items[b], op)? == wanted => Some(idx),
            keep => keep,
        };
    }
    Ok(best)
}

fn sum_items(items: &[Item]) -> ItemResult {
    let mut iter = items.iter().cloned();
    let first = match iter.next() {
        Some(i) => i,
        None => return Ok(Item::int(0)),
    };
    iter.try_fold(first, add_items)
}

fn product_items(items: &[Item]) -> ItemResult {
    items.iter().cloned().try_fold(Item::int(1), multiply_items)
}

fn non_empty<'a>(arg: &'a Item, op: &str) -> Result<&'a [Item], CalcError> {
    let items = arg.list(op)?;
    if items.is_empty() {
        return Err(CalcError::InvalidArgument(op.to_string(), "[ ]".to_string()));
    }
    Ok(items)
}

fn alternate(items: &[Item], from: usize) -> Result<Vec<Item>, CalcError> {
    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            if idx % 2 == from {
                subtract_items(Item::int(0), item.clone())
            } else {
                Ok(item.clone())
            }
        })
        .collect()
}

fn altsign(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::List(alternate(args[0].list("altsign")?, 1)?))
}

fn altsign2(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::List(alternate(args[0].list("altsign2")?, 0)?))
}

fn altsum(_: &mut Session, args: &[Item]) -> ItemResult {
    sum_items(&alternate(args[0].list("altsum")?, 1)?)
}

fn altsum2(_: &mut Session, args: &[Item]) -> ItemResult {
    sum_items(&alternate(args[0].list("altsum2")?, 0)?)
}

fn append(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut res = args[0].list("append")?.to_vec();
    res.extend_from_slice(args[1].list("append")?);
    Ok(Item::List(res))
}

fn count(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Number(args[0].list("count")?.len().into()))
}

fn diffs(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = args[0].list("diffs")?;
    let res: Result<Vec<Item>, CalcError> =
        items.iter().tuple_windows().map(|(a, b)| subtract_items(b.clone(), a.clone())).collect();
    res.map(Item::List)
}

fn diffs2(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = args[0].list("diffs2")?;
    let res: Result<Vec<Item>, CalcError> =
        items.iter().skip(1).map(|b| subtract_items(b.clone(), items[0].clone())).collect();
    res.map(Item::List)
}

fn ratios(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = args[0].list("ratios")?;
    let res: Result<Vec<Item>, CalcError> =
        items.iter().tuple_windows().map(|(a, b)| divide_items(b.clone(), a.clone())).collect();
    res.map(Item::List)
}

fn element(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = args[0].list("element")?;
    let idx = args[1].to_usize("element")?;
    items.get(idx).cloned().ok_or_else(|| CalcError::IndexOutOfRange("element".to_string(), idx))
}

fn interleave(_: &mut Session, args: &[Item]) -> ItemResult {
    let l1 = args[0].list("interleave")?;
    let l2 = args[1].list("interleave")?;
    let res = l1.iter().zip(l2.iter()).flat_map(|(a, b)| vec![a.clone(), b.clone()]).collect();
    Ok(Item::List(res))
}

fn contains(items: &[Item], item: &Item) -> Result<bool, CalcError> {
    for i in items {
        if items_equal(i, item)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn unique_items(items: &[Item]) -> Result<Vec<Item>, CalcError> {
    let mut res: Vec<Item> = Vec::new();
    for item in items {
        if !contains(&res, item)? {
            res.push(item.clone());
        }
    }
    Ok(res)
}

fn intersection(_: &mut Session, args: &[Item]) -> ItemResult {
    let l2 = args[1].list("intersection")?;
    let mut res = Vec::new();
    for item in unique_items(args[0].list("intersection")?)? {
        if contains(l2, &item)? {
            res.push(item);
        }
    }
    Ok(Item::List(res))
}

fn union(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut all = args[0].list("union")?.to_vec();
    all.extend_from_slice(args[1].list("union")?);
    Ok(Item::List(unique_items(&all)?))
}

fn unique(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::List(unique_items(args[0].list("unique")?)?))
}

fn max(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = non_empty(&args[0], "max")?;
    let idx = extreme_index(items, "max", Ordering::Greater)?.unwrap_or(0);
    Ok(items[idx].clone())
}

fn min(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = non_empty(&args[0], "min")?;
    let idx = extreme_index(items, "min", Ordering::Less)?.unwrap_or(0);
    Ok(items[idx].clone())
}

fn maxindex(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = non_empty(&args[0], "maxindex")?;
    Ok(Item::Number(extreme_index(items, "maxindex", Ordering::Greater)?.unwrap_or(0).into()))
}

fn minindex(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = non_empty(&args[0], "minindex")?;
    Ok(Item::Number(extreme_index(items, "minindex", Ordering::Less)?.unwrap_or(0).into()))
}

fn mean(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = non_empty(&args[0], "mean")?;
    divide_items(sum_items(items)?, Item::Number(items.len().into()))
}

fn geomean(_: &mut Session, args: &[Item]) -> ItemResult {
    let items = non_empty(&args[0], "geomean")?;
    let prod = product_items(items)?;
    let n = Value::from(items.len());
    Ok(Item::Number(prod.number("geomean")?.clone().root(n)?))
}

fn product(_: &mut Session, args: &[Item]) -> ItemResult {
    product_items(args[0].list("product")?)
}

fn sum(_: &mut Session, args: &[Item]) -> ItemResult {
    sum_items(args[0].list("sum")?)
}

fn stddev(_: &mut Session, args: &[Item]) -> ItemResult {
    let values = args[0].values("stddev")?;
    if values.is_empty() {
        return Err(CalcError::InvalidArgument("stddev".to_string(), "[ ]".to_string()));
    }
    let n = Value::from(values.len());
    let mut total = Value::zero();
    for v in &values {
        total = total.add(v.clone())?;
    }
    let avg = total.div(n.clone())?;
    let mut dev = Value::zero();
    for v in values {
        let d = v.sub(avg.clone())?;
        dev = dev.add(d.clone().mul(d)?)?;
    }
    Ok(Item::Number(dev.div(n)?.sqrt()?))
}

fn reverse(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::List(args[0].list("reverse")?.iter().rev().cloned().collect()))
}

fn sort(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::List(sorted(args[0].list("sort")?, "sort")?))
}

fn sortdesc(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut res = sorted(args[0].list("sortdesc")?, "sortdesc")?;
    res.reverse();
    Ok(Item::List(res))
}

/// `a^(b^(c^...))`
fn tower(_: &mut Session, args: &[Item]) -> ItemResult {
    let values = args[0].values("tower")?;
    let mut iter = values.into_iter().rev();
    let mut res = match iter.next() {
        Some(v) => v,
        None => return Ok(Item::int(1)),
    };
    for v in iter {
        res = v.power(res)?;
    }
    Ok(Item::Number(res))
}

/// `((a^b)^c)^...`
fn tower2(_: &mut Session, args: &[Item]) -> ItemResult {
    let values = args[0].values("tower2")?;
    let mut iter = values.into_iter();
    let mut res = match iter.next() {
        Some(v) => v,
        None => return Ok(Item::int(1)),
    };
    for v in iter {
        res = res.power(v)?;
    }
    Ok(Item::Number(res))
}

fn range(_: &mut Session, args: &[Item]) -> ItemResult {
    let start = args[0].number("range")?.clone();
    let end = args[1].number("range")?.clone();
    let step = if start.compare(&end)? == Ordering::Greater { -1 } else { 1 };
    stepped_range(start, end, Value::from(step as i64), "range")
}

fn range2(_: &mut Session, args: &[Item]) -> ItemResult {
    let start = args[0].number("range2")?.clone();
    let end = args[1].number("range2")?.clone();
    let step = args[2].number("range2")?.clone();
    stepped_range(start, end, step, "range2")
}

fn stepped_range(start: Value, end: Value, step: Value, op: &str) -> ItemResult {
    if step.is_zero() {
        return Err(CalcError::InvalidArgument(op.to_string(), "0".to_string()));
    }
    let len = (end.to_f64(op)? - start.to_f64(op)?) / step.to_f64(op)?;
    if len < 0.0 {
        return Ok(Item::List(Vec::new()));
    }
    range_limit(op, len)?;
    let descending = step.is_negative();
    let mut res = Vec::new();
    let mut v = start;
    loop {
        let ord = v.compare(&end)?;
        if (descending && ord == Ordering::Less) || (!descending && ord == Ordering::Greater) {
            break;
        }
        res.push(Item::Number(v.clone()));
        v = v.add(step.clone())?;
    }
    Ok(Item::List(res))
}

fn georange(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut v = args[0].number("georange")?.clone();
    let ratio = args[1].number("georange")?.clone();
    let count = args[2].to_usize("georange")?;
    range_limit("georange", count as f64)?;
    let mut res = Vec::with_capacity(count);
    for _ in 0..count {
        res.push(Item::Number(v.clone()));
        v = v.mul(ratio.clone())?;
    }
    Ok(Item::List(res))
}

fn exprange(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut v = args[0].number("exprange")?.clone();
    let exp = args[1].number("exprange")?.clone();
    let count = args[2].to_usize("exprange")?;
    range_limit("exprange", count as f64)?;
    let mut res = Vec::with_capacity(count);
    for _ in 0..count {
        res.push(Item::Number(v.clone()));
        v = v.power(exp.clone())?;
    }
    Ok(Item::List(res))
}

fn indices_where(args: &[Item], op: &str, want_zero: bool) -> ItemResult {
    let mut res = Vec::new();
    for (idx, item) in args[0].list(op)?.iter().enumerate() {
        if item.value(op)?.is_zero() == want_zero {
            res.push(Item::Number(idx.into()));
        }
    }
    Ok(Item::List(res))
}

fn nonzero(_: &mut Session, args: &[Item]) -> ItemResult {
    indices_where(args, "nonzero", false)
}

fn zero(_: &mut Session, args: &[Item]) -> ItemResult {
    indices_where(args, "zero", true)
}

fn int_values(item: &Item, op: &str) -> Result<Vec<BigInt>, CalcError> {
    item.values(op)?.iter().map(|v| v.to_bigint(op)).collect()
}

fn gcd_of(values: &[BigInt]) -> BigInt {
    values.iter().fold(BigInt::zero(), |acc, v| acc.gcd(v))
}

fn gcd(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Number(Value::Int(gcd_of(&int_values(&args[0], "gcd")?))))
}

fn lcm(_: &mut Session, args: &[Item]) -> ItemResult {
    let values = int_values(&args[0], "lcm")?;
    let res = values.iter().fold(BigInt::one(), |acc, v| acc.lcm(v));
    Ok(Item::Number(Value::Int(res)))
}

/// Divides every element by the greatest common divisor of the list
fn reduce(_: &mut Session, args: &[Item]) -> ItemResult {
    let values = int_values(&args[0], "reduce")?;
    let g = gcd_of(&values);
    if g.is_zero() {
        return Ok(args[0].clone());
    }
    Ok(Item::List(values.into_iter().map(|v| Item::Number(Value::Int(v / &g))).collect()))
}

// polynomials are lists of coefficients, highest power first

fn poly_add(p1: &[Value], p2: &[Value]) -> Result<Vec<Value>, CalcError> {
    let len = p1.len().max(p2.len());
    let pad = |p: &[Value]| -> Vec<Value> {
        let mut res = vec![Value::zero(); len - p.len()];
        res.extend_from_slice(p);
        res
    };
    pad(p1).into_iter().zip(pad(p2)).map(|(a, b)| a.add(b)).collect()
}

fn poly_mul(p1: &[Value], p2: &[Value]) -> Result<Vec<Value>, CalcError> {
    if p1.is_empty() || p2.is_empty() {
        return Ok(Vec::new());
    }
    let mut res = vec![Value::zero(); p1.len() + p2.len() - 1];
    for (i, a) in p1.iter().enumerate() {
        for (j, b) in p2.iter().enumerate() {
            res[i + j] = res[i + j].clone().add(a.clone().mul(b.clone())?)?;
        }
    }
    Ok(res)
}

fn poly_item(p: Vec<Value>) -> Item {
    Item::List(p.into_iter().map(Item::Number).collect())
}

fn polyadd(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(poly_item(poly_add(&args[0].values("polyadd")?, &args[1].values("polyadd")?)?))
}

fn polymul(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(poly_item(poly_mul(&args[0].values("polymul")?, &args[1].values("polymul")?)?))
}

fn polynomials(arg: &Item, op: &str) -> Result<Vec<Vec<Value>>, CalcError> {
    let items = arg.list(op)?;
    if items.iter().all(|i| !i.is_list()) {
        return Ok(vec![arg.values(op)?]);
    }
    items.iter().map(|i| i.values(op)).collect()
}

fn polysum(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut res = Vec::new();
    for p in polynomials(&args[0], "polysum")? {
        res = poly_add(&res, &p)?;
    }
    Ok(poly_item(res))
}

fn polyprod(_: &mut Session, args: &[Item]) -> ItemResult {
    let mut res = vec![Value::one()];
    for p in polynomials(&args[0], "polyprod")? {
        res = poly_mul(&res, &p)?;
    }
    Ok(poly_item(res))
}

fn polyval(_: &mut Session, args: &[Item]) -> ItemResult {
    let coeffs = args[0].values("polyval")?;
    let x = args[1].number("polyval")?.clone();
    let mut res = Value::zero();
    for c in coeffs {
        res = res.mul(x.clone())?.add(c)?;
    }
    Ok(Item::Number(res))
}

fn snap(f: f64) -> f64 {
    let r = f.round();
    if (f - r).abs() < 1e-10 * r.abs().max(1.0) {
        r
    } else {
        f
    }
}

/// Roots of a polynomial with complex coefficients, Durand-Kerner iteration
fn durand_kerner(coeffs: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let lead = coeffs[0];
    let monic: Vec<Complex<f64>> = coeffs.iter().map(|c| c / lead).collect();
    let degree = monic.len() - 1;
    let eval = |z: Complex<f64>| monic.iter().fold(Complex::new(0.0, 0.0), |acc, c| acc * z + c);

    let seed = Complex::new(0.4, 0.9);
    let mut roots: Vec<Complex<f64>> = (0..degree).map(|k| seed.powi(k as i32)).collect();
    for _ in 0..SOLVE_ITERATIONS {
        let mut delta = 0.0f64;
        for i in 0..degree {
            let mut denom = Complex::new(1.0, 0.0);
            for j in 0..degree {
                if i != j {
                    denom *= roots[i] - roots[j];
                }
            }
            if denom.norm() == 0.0 {
                continue;
            }
            let step = eval(roots[i]) / denom;
            roots[i] -= step;
            delta = delta.max(step.norm());
        }
        if delta < 1e-15 {
            break;
        }
    }
    roots
}

fn solve_polynomial(coeffs: Vec<Value>, op: &str) -> ItemResult {
    let coeffs: Vec<Value> = coeffs.into_iter().skip_while(|c| c.is_zero()).collect();
    match coeffs.len() {
        0 | 1 => Err(CalcError::InvalidArgument(op.to_string(), "constant polynomial".to_string())),
        2 => {
            let root = coeffs[1].clone().negate()?.div(coeffs[0].clone())?;
            Ok(Item::List(vec![Item::Number(root)]))
        }
        3 => {
            let (a, b, c) = (coeffs[0].clone(), coeffs[1].clone(), coeffs[2].clone());
            let disc = b.clone().mul(b.clone())?.sub(Value::from(4i64).mul(a.clone())?.mul(c)?)?;
            let sq = disc.sqrt()?;
            let two_a = Value::from(2i64).mul(a)?;
            let r1 = b.clone().negate()?.add(sq.clone())?.div(two_a.clone())?;
            let r2 = b.negate()?.sub(sq)?.div(two_a)?;
            Ok(Item::List(vec![Item::Number(r1), Item::Number(r2)]))
        }
        _ => {
            let complex: Vec<Complex<f64>> =
                coeffs.into_iter().map(|c| c.into_raw_complex()).collect::<Result<_, _>>()?;
            let mut roots: Vec<Complex<f64>> = durand_kerner(&complex)
                .into_iter()
                .map(|z| {
                    let scale = z.norm().max(1.0);
                    let re = if z.re.abs() < 1e-12 * scale { 0.0 } else { snap(z.re) };
                    let im = if z.im.abs() < 1e-12 * scale { 0.0 } else { snap(z.im) };
                    Complex::new(re, im)
                })
                .collect();
            roots.sort_by(|a, b| {
                a.re.partial_cmp(&b.re).unwrap_or(Ordering::Equal).then(a.im.partial_cmp(&b.im).unwrap_or(Ordering::Equal))
            });
            Ok(Item::List(roots.into_iter().map(|z| Item::Number(Value::Complex(z).normalize())).collect()))
        }
    }
}

fn solve(_: &mut Session, args: &[Item]) -> ItemResult {
    solve_polynomial(args[0].values("solve")?, "solve")
}

fn solve_n(args: &[Item], op: &str) -> ItemResult {
    let coeffs: Result<Vec<Value>, CalcError> = args.iter().map(|a| a.number(op).map(|v| v.clone())).collect();
    solve_polynomial(coeffs?, op)
}

fn solve2(_: &mut Session, args: &[Item]) -> ItemResult {
    solve_n(args, "solve2")
}

fn solve3(_: &mut Session, args: &[Item]) -> ItemResult {
    solve_n(args, "solve3")
}

fn solve4(_: &mut Session, args: &[Item]) -> ItemResult {
    solve_n(args, "solve4")
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "list_operators";
    reg.add(OperatorInfo::new("altsign", &[List], cat, "alternates signs in the list by making every even element negative", altsign));
    reg.add(OperatorInfo::new("altsign2", &[List], cat, "alternates signs in the list by making every odd element negative", altsign2));
    reg.add(OperatorInfo::new("altsum", &[List], cat, "calculates the alternating sum of a list, starting with a plus", altsum));
    reg.add(OperatorInfo::new("altsum2", &[List], cat, "calculates the alternating sum of a list, starting with a minus", altsum2));
    reg.add(OperatorInfo::new("append", &[List, List], cat, "appends the second list to the first", append));
    reg.add(OperatorInfo::new("count", &[List], cat, "counts the elements of a list", count));
    reg.add(OperatorInfo::new("diffs", &[List], cat, "returns a list of the differences between successive items", diffs));
    reg.add(OperatorInfo::new("diffs2", &[List], cat, "returns a list of the differences from the first item", diffs2));
    reg.add(OperatorInfo::new("element", &[List, Scalar], cat, "returns the element of list n at index k", element));
    reg.add(OperatorInfo::new("interleave", &[List, List], cat, "interleaves the elements of two lists", interleave));
    reg.add(OperatorInfo::new("intersection", &[List, List], cat, "returns the elements common to both lists", intersection));
    reg.add(OperatorInfo::new("union", &[List, List], cat, "returns the elements found in either list", union));
    reg.add(OperatorInfo::new("unique", &[List], cat, "returns the unique elements of a list", unique));
    reg.add(OperatorInfo::new("max", &[List], cat, "returns the largest value in a list", max));
    reg.add(OperatorInfo::new("min", &[List], cat, "returns the smallest value in a list", min));
    reg.add(OperatorInfo::new("maxindex", &[List], cat, "returns the index of the largest value in a list", maxindex));
    reg.add(OperatorInfo::new("minindex", &[List], cat, "returns the index of the smallest value in a list", minindex));
    reg.add(OperatorInfo::new("nonzero", &[List], cat, "returns the indices of the non-zero elements", nonzero));
    reg.add(OperatorInfo::new("zero", &[List], cat, "returns the indices of the zero elements", zero));
    reg.add(OperatorInfo::new("ratios", &[List], cat, "returns a list of the ratios of successive items", ratios));
    reg.add(OperatorInfo::new("reverse", &[List], cat, "returns the list in reverse order", reverse));
    reg.add(OperatorInfo::new("sort", &[List], cat, "sorts the elements of a list in ascending order", sort));
    reg.add(OperatorInfo::new("sortdesc", &[List], cat, "sorts the elements of a list in descending order", sortdesc));
    reg.add(OperatorInfo::new("range", &[Scalar, Scalar], cat, "generates the integers from n to k", range));
    reg.add(OperatorInfo::new("range2", &[Scalar, Scalar, Scalar], cat, "generates values from a to b by step c", range2));
    reg.add(OperatorInfo::new("georange", &[Scalar, Scalar, Scalar], cat, "generates c values starting at a multiplying by b", georange));
    reg.add(OperatorInfo::new("exprange", &[Scalar, Scalar, Scalar], cat, "generates c values starting at a raising to the power b", exprange));
    reg.add(OperatorInfo::new("reduce", &[List], cat, "divides the elements of a list by their greatest common divisor", reduce));

    let cat = "arithmetic";
    reg.add(OperatorInfo::new("sum", &[List], cat, "sums a list of values", sum));
    reg.add(OperatorInfo::new("product", &[List], cat, "multiplies a list of values", product));
    reg.add(OperatorInfo::new("mean", &[List], cat, "calculates the mean of a list of values", mean));
    reg.add(OperatorInfo::new("geomean", &[List], cat, "calculates the geometric mean of a list of values", geomean));
    reg.add(OperatorInfo::new("stddev", &[List], cat, "calculates the standard deviation of a list of values", stddev));
    reg.add(OperatorInfo::new("gcd", &[List], cat, "calculates the greatest common divisor of a list", gcd));
    reg.add(OperatorInfo::new("lcm", &[List], cat, "calculates the least common multiple of a list", lcm));
    reg.add(OperatorInfo::new("tower", &[List], cat, "calculates the power tower of a list, evaluated from the top", tower));
    reg.add(OperatorInfo::new("tower2", &[List], cat, "calculates the power tower of a list, evaluated from the bottom", tower2));

    let cat = "polynomials";
    reg.add(OperatorInfo::new("polyadd", &[List, List], cat, "adds two polynomials", polyadd));
    reg.add(OperatorInfo::new("polymul", &[List, List], cat, "multiplies two polynomials", polymul));
    reg.add(OperatorInfo::new("polysum", &[List], cat, "sums a list of polynomials", polysum).nested());
    reg.add(OperatorInfo::new("polyprod", &[List], cat, "multiplies a list of polynomials", polyprod).nested());
    reg.add(OperatorInfo::new("polyval", &[List, Scalar], cat, "evaluates polynomial n at the value k", polyval));
    reg.add(OperatorInfo::new("solve", &[List], cat, "finds the roots of a polynomial", solve));
    reg.add(OperatorInfo::new("solve2", &[Scalar, Scalar, Scalar], cat, "solves a quadratic equation", solve2));
    reg.add(OperatorInfo::new("solve3", &[Scalar, Scalar, Scalar, Scalar], cat, "solves a cubic equation", solve3));
    reg.add(OperatorInfo::new("solve4", &[Scalar, Scalar, Scalar, Scalar, Scalar], cat, "solves a quartic equation", solve4));
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
    fn test_ranges() {
        assert_eq!(eval(&["1", "5", "range"]), "[ 1, 2, 3, 4, 5 ]");
        assert_eq!(eval(&["3", "1", "range"]), "[ 3, 2, 1 ]");
        assert_eq!(eval(&["1", "10", "3", "range2"]), "[ 1, 4, 7, 10 ]");
        assert_eq!(eval(&["1", "2", "5", "georange"]), "[ 1, 2, 4, 8, 16 ]");
        assert_eq!(eval(&["2", "2", "4", "exprange"]), "[ 2, 4, 16, 256 ]");
        assert_eq!(eval(&["1", "10", "range", "mean"]), "5.5");
    }

    #[test]
    fn test_reductions() {
        assert_eq!(eval(&["[", "1", "2", "3", "4", "]", "sum"]), "10");
        assert_eq!(eval(&["1", "5", "range", "product"]), "120");
        assert_eq!(eval(&["[", "1", "2", "3", "4", "]", "altsum"]), "-2");
        assert_eq!(eval(&["[", "1", "2", "3", "4", "]", "altsum2"]), "2");
        assert_eq!(eval(&["[", "2", "4", "4", "4", "5", "5", "7", "9", "]", "stddev"]), "2");
        assert_eq!(eval(&["[", "2", "8", "]", "geomean"]), "4");
        assert_eq!(eval(&["[", "12", "18", "24", "]", "gcd"]), "6");
        assert_eq!(eval(&["[", "4", "6", "]", "lcm"]), "12");
        assert_eq!(eval(&["[", "2", "3", "2", "]", "tower"]), "512");
        assert_eq!(eval(&["[", "2", "3", "2", "]", "tower2"]), "64");
        assert_eq!(eval(&["[", "1", "meter", "50", "cm", "]", "sum"]), "1.5 meter");
    }

    #[test]
    fn test_list_shapes() {
        assert_eq!(eval(&["[", "1", "4", "9", "16", "]", "diffs"]), "[ 3, 5, 7 ]");
        assert_eq!(eval(&["[", "1", "4", "9", "]", "diffs2"]), "[ 3, 8 ]");
        assert_eq!(eval(&["[", "1", "2", "8", "]", "ratios"]), "[ 2, 4 ]");
        assert_eq!(eval(&["[", "1", "2", "3", "]", "altsign"]), "[ 1, -2, 3 ]");
        assert_eq!(eval(&["[", "3", "1", "2", "]", "sort"]), "[ 1, 2, 3 ]");
        assert_eq!(eval(&["[", "3", "1", "2", "]", "sortdesc"]), "[ 3, 2, 1 ]");
        assert_eq!(eval(&["[", "3", "1", "3", "2", "1", "]", "unique"]), "[ 3, 1, 2 ]");
        assert_eq!(eval(&["[", "1", "2", "]", "[", "3", "4", "]", "interleave"]), "[ 1, 3, 2, 4 ]");
        assert_eq!(eval(&["[", "1", "2", "3", "]", "[", "2", "3", "4", "]", "intersection"]), "[ 2, 3 ]");
        assert_eq!(eval(&["[", "1", "2", "]", "[", "2", "3", "]", "union"]), "[ 1, 2, 3 ]");
        assert_eq!(eval(&["[", "1", "2", "]", "3", "append"]), "[ 1, 2, 3 ]");
        assert_eq!(eval(&["[", "5", "9", "2", "]", "maxindex"]), "1");
        assert_eq!(eval(&["[", "5", "9", "2", "]", "min"]), "2");
        assert_eq!(eval(&["[", "0", "5", "0", "]", "nonzero"]), "[ 1 ]");
        assert_eq!(eval(&["[", "4", "6", "8", "]", "reduce"]), "[ 2, 3, 4 ]");
        assert_eq!(eval(&["[", "5", "6", "7", "]", "[", "0", "2", "]", "element"]), "[ 5, 7 ]");
        assert_eq!(eval(&["[", "5", "6", "]", "4", "element"]), "error in arg 6:  index 4 out of range for 'element'");
    }

    #[test]
    fn test_polynomials() {
        assert_eq!(eval(&["[", "1", "2", "]", "[", "1", "2", "3", "]", "polyadd"]), "[ 1, 3, 5 ]");
        assert_eq!(eval(&["[", "1", "1", "]", "[", "1", "-1", "]", "polymul"]), "[ 1, 0, -1 ]");
        assert_eq!(eval(&["[", "[", "1", "1", "]", "[", "1", "1", "]", "]", "polyprod"]), "[ 1, 2, 1 ]");
        assert_eq!(eval(&["[", "[", "1", "1", "]", "[", "2", "]", "]", "polysum"]), "[ 1, 3 ]");
        assert_eq!(eval(&["[", "1", "2", "3", "]", "4", "polyval"]), "27");
    }

    #[test]
    fn test_solve() {
        assert_eq!(eval(&["1", "-3", "2", "solve2"]), "[ 2, 1 ]");
        assert_eq!(eval(&["[", "2", "-4", "]", "solve"]), "[ 2 ]");
        assert_eq!(eval(&["1", "-6", "11", "-6", "solve3"]), "[ 1, 2, 3 ]");
        assert_eq!(eval(&["1", "0", "-5", "0", "4", "solve4"]), "[ -2, -1, 1, 2 ]");
    }
}
