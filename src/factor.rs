use std::collections::BTreeMap;
use std::path::Path;

use itertools::Itertools;
use log::debug;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, ToPrimitive, Zero};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::persistence::{self, FACTOR_CACHE};
use crate::primes::{is_prime, PrimeIter, SMALL_PRIMES};
use crate::session::{thousands, Session};
use crate::value::*;

/// Only factorizations of numbers above this are worth persisting
const CACHE_THRESHOLD: u64 = 1_000_000;
const TRIAL_PRIMES: usize = 1000;
const BRENT_BATCH: usize = 128;
// rho gives up after about 2^17 iterations on numbers past 64 bits
const BRENT_LIMIT: usize = 1 << 17;
const ECM_FIRST_BOUND: u64 = 11_000;
const ECM_CURVES_PER_BOUND: usize = 60;
// giant step size of stage 2
const ECM_WHEEL: u64 = 210;

/// Persistent map from a number to its prime factors
#[derive(Default, Serialize, Deserialize)]
pub struct FactorCache {
    factors: BTreeMap<String, Vec<String>>,
    #[serde(skip)]
    dirty: bool,
}

impl FactorCache {
    pub fn load(dir: &Path) -> FactorCache {
        persistence::load_json(dir, FACTOR_CACHE).unwrap_or_default()
    }

    pub fn save(&mut self, dir: &Path) -> Result<(), CalcError> {
        if !self.dirty {
            return Ok(());
        }
        persistence::save_json(dir, FACTOR_CACHE, self)?;
        self.dirty = false;
        Ok(())
    }

    pub fn stats(&self) -> Vec<String> {
        let max = self.factors.keys().filter_map(|k| k.parse::<BigInt>().ok()).max().unwrap_or_default();
        vec![format!(
            "{:>10} {:23} max: {:>14} ({})",
            thousands(self.factors.len() as u64),
            "factorizations",
            max.to_string(),
            FACTOR_CACHE
        )]
    }

    fn get(&self, n: &BigInt) -> Option<Vec<BigInt>> {
        let cached = self.factors.get(&n.to_string())?;
        cached.iter().map(|f| f.parse::<BigInt>().ok()).collect()
    }

    fn insert(&mut self, n: &BigInt, factors: &[BigInt]) {
        self.factors.insert(n.to_string(), factors.iter().map(|f| f.to_string()).collect());
        self.dirty = true;
    }
}

/// Finds a divisor of an odd composite number, Brent's variant of
/// Pollard's rho. The result may be n itself; None once `limit` iterations
/// are spent.
fn brent(n: &BigInt, c: &BigInt, limit: usize) -> Option<BigInt> {
    let f = |x: &BigInt| (x * x + c) % n;
    let mut y = BigInt::from(2);
    let mut x = y.clone();
    let mut ys = y.clone();
    let mut q = BigInt::one();
    let mut g = BigInt::one();
    let mut r = 1usize;
    while g.is_one() {
        x = y.clone();
        for _ in 0..r {
            y = f(&y);
        }
        let mut k = 0;
        while k < r && g.is_one() {
            ys = y.clone();
            for _ in 0..BRENT_BATCH.min(r - k) {
                y = f(&y);
                q = (q * (&x - &y).abs()) % n;
            }
            g = q.gcd(n);
            k += BRENT_BATCH;
        }
        r *= 2;
        if g.is_one() && r > limit {
            return None;
        }
    }
    if g == *n {
        loop {
            ys = f(&ys);
            g = (&x - &ys).abs().gcd(n);
            if !g.is_one() {
                break;
            }
        }
    }
    Some(g)
}

/// Point of a Montgomery curve in projective `(X : Z)` coordinates
#[derive(Clone, Debug)]
struct Point {
    x: BigInt,
    z: BigInt,
}

/// Montgomery curve `By^2 = x^3 + Ax^2 + x` modulo n, kept as `(A + 2) / 4`
struct Curve<'a> {
    n: &'a BigInt,
    a24: BigInt,
}

impl<'a> Curve<'a> {
    /// Suyama's parametrization for the seed sigma. Err holds the gcd with n
    /// when the parameters are not invertible.
    fn suyama(n: &'a BigInt, sigma: &BigInt) -> Result<(Curve<'a>, Point), BigInt> {
        let u = (sigma * sigma - 5u32).mod_floor(n);
        let v = (sigma * 4u32).mod_floor(n);
        let u3 = (&u * &u * &u).mod_floor(n);
        let diff = (&v - &u).mod_floor(n);
        let num = (&diff * &diff * &diff * (&u * 3u32 + &v)).mod_floor(n);
        let den = (&u3 * &v * 16u32).mod_floor(n);
        let eg = den.extended_gcd(n);
        if !eg.gcd.is_one() {
            return Err(eg.gcd.abs());
        }
        let a24 = (num * eg.x).mod_floor(n);
        let start = Point { x: u3, z: (&v * &v * &v).mod_floor(n) };
        Ok((Curve { n, a24 }, start))
    }

    fn reduce(&self, v: BigInt) -> BigInt {
        v.mod_floor(self.n)
    }

    fn double(&self, p: &Point) -> Point {
        let sum = &p.x + &p.z;
        let diff = &p.x - &p.z;
        let t1 = self.reduce(&sum * &sum);
        let t2 = self.reduce(&diff * &diff);
        let t3 = &t1 - &t2;
        let z = self.reduce(&t3 * (&t2 + self.reduce(&self.a24 * &t3)));
        Point { x: self.reduce(t1 * t2), z }
    }

    /// `p + q` given `p - q`
    fn add(&self, p: &Point, q: &Point, diff: &Point) -> Point {
        let u = self.reduce((&p.x - &p.z) * (&q.x + &q.z));
        let v = self.reduce((&p.x + &p.z) * (&q.x - &q.z));
        let sum = &u + &v;
        let sub = u - v;
        Point { x: self.reduce(&diff.z * self.reduce(&sum * &sum)), z: self.reduce(&diff.x * self.reduce(&sub * &sub)) }
    }

    /// Montgomery ladder, k >= 1
    fn multiply(&self, k: u64, p: &Point) -> Point {
        let mut r0 = p.clone();
        let mut r1 = self.double(p);
        for bit in (0..63 - k.leading_zeros()).rev() {
            if (k >> bit) & 1 == 1 {
                r0 = self.add(&r1, &r0, p);
                r1 = self.double(&r1);
            } else {
                r1 = self.add(&r0, &r1, p);
                r0 = self.double(&r0);
            }
        }
        r0
    }
}

/// One curve of Lenstra's elliptic curve method: stage 1 multiplies by
/// every prime power up to `b1`, stage 2 looks for one more prime up to
/// `b2` with a baby-step giant-step pairing. Returns a proper divisor.
fn ecm_curve(n: &BigInt, sigma: &BigInt, b1: u64, b2: u64, primes: &[u64]) -> Option<BigInt> {
    let (curve, mut q) = match Curve::suyama(n, sigma) {
        Ok(c) => c,
        Err(g) => return if &g != n { Some(g) } else { None },
    };
    for &p in primes.iter().take_while(|&&p| p <= b1) {
        let mut pk = p;
        while pk <= b1 / p {
            pk *= p;
        }
        q = curve.multiply(pk, &q);
    }
    let g = q.z.gcd(n);
    if !g.is_one() {
        return if &g != n { Some(g) } else { None };
    }

    // baby steps jQ for j < wheel / 2
    let half = (ECM_WHEEL / 2) as usize;
    let mut baby = vec![q.clone(), curve.double(&q)];
    while baby.len() < half {
        let len = baby.len();
        let next = curve.add(&baby[len - 1], &q, &baby[len - 2]);
        baby.push(next);
    }
    let step = curve.multiply(ECM_WHEEL, &q);
    let first = (b1 / ECM_WHEEL).max(2);
    let mut prev = curve.multiply((first - 1) * ECM_WHEEL, &q);
    let mut giant = curve.multiply(first * ECM_WHEEL, &q);
    let mut acc = BigInt::one();
    let mut m = first;
    let mut idx = primes.partition_point(|&p| p <= b1);
    while idx < primes.len() && primes[idx] <= b2 {
        let centre = m * ECM_WHEEL;
        while idx < primes.len() && primes[idx] <= centre + ECM_WHEEL / 2 && primes[idx] <= b2 {
            let j = (primes[idx] as i64 - centre as i64).unsigned_abs() as usize;
            if j > 0 && j < half {
                let b = &baby[j - 1];
                acc = curve.reduce(acc * (&giant.x * &b.z - &b.x * &giant.z));
            }
            idx += 1;
        }
        let next = curve.add(&giant, &step, &prev);
        prev = std::mem::replace(&mut giant, next);
        m += 1;
    }
    let g = acc.gcd(n);
    if !g.is_one() && &g != n {
        Some(g)
    } else {
        None
    }
}

/// Elliptic curve factoring with growing bounds until a divisor turns up
fn ecm(n: &BigInt) -> BigInt {
    let mut rng = rand::rng();
    let mut b1 = ECM_FIRST_BOUND;
    loop {
        let b2 = b1 * 50;
        let primes: Vec<u64> = PrimeIter::new(2).take_while(|&p| p <= b2 + ECM_WHEEL).collect();
        debug!("ecm on {} with B1 = {}", n, b1);
        for _ in 0..ECM_CURVES_PER_BOUND {
            let sigma = BigInt::from(rng.random_range(6..u64::MAX));
            if let Some(d) = ecm_curve(n, &sigma, b1, b2, &primes) {
                return d;
            }
        }
        b1 *= 5;
    }
}

fn split_composite(n: BigInt, out: &mut Vec<BigInt>) {
    if n.is_one() {
        return;
    }
    if is_prime(&n) {
        out.push(n);
        return;
    }
    let limit = if n.bits() <= 64 { usize::MAX } else { BRENT_LIMIT };
    let mut c = BigInt::one();
    let d = loop {
        match brent(&n, &c, limit) {
            Some(d) if d != n => break d,
            Some(_) => c += 1,
            None => break ecm(&n),
        }
    };
    let rest = &n / &d;
    split_composite(d, out);
    split_composite(rest, out);
}

/// Prime factors of n > 1 in ascending order, with repetitions
fn prime_factors(n: &BigInt) -> Vec<BigInt> {
    let mut n = n.clone();
    let mut res = Vec::new();
    for &p in SMALL_PRIMES.iter().take(TRIAL_PRIMES) {
        let bp = BigInt::from(p);
        if &bp * &bp > n {
            break;
        }
        while (&n % p).is_zero() {
            res.push(bp.clone());
            n /= p;
        }
    }
    split_composite(n, &mut res);
    res.sort();
    res
}

/// Factors an integer: negative numbers get a leading -1, 0 and 1 factor
/// to themselves
pub(crate) fn factorize(session: &mut Session, n: &BigInt) -> Vec<BigInt> {
    if n.is_zero() || n.is_one() {
        return vec![n.clone()];
    }
    if n.is_negative() {
        let mut res = vec![BigInt::from(-1)];
        let abs = -n;
        if !abs.is_one() {
            res.extend(factorize(session, &abs));
        }
        return res;
    }
    let cacheable = n.to_u64().map(|v| v > CACHE_THRESHOLD).unwrap_or(true);
    if cacheable {
        if let Some(cached) = session.factors.get(n) {
            debug!("factors of {} found in cache", n);
            return cached;
        }
    }
    let res = prime_factors(n);
    if cacheable {
        session.factors.insert(n, &res);
    }
    res
}

/// Prime factors of |n| grouped into `(prime, exponent)`
fn factor_pairs(session: &mut Session, n: &BigInt) -> Vec<(BigInt, u32)> {
    let abs = n.abs();
    if abs <= BigInt::one() {
        return Vec::new();
    }
    factorize(session, &abs).into_iter().dedup_with_count().map(|(count, p)| (p, count as u32)).collect()
}

fn int_arg(item: &Item, op: &str) -> Result<BigInt, CalcError> {
    item.number(op)?.to_bigint(op)
}

fn sigma_of(pairs: &[(BigInt, u32)]) -> BigInt {
    pairs.iter().fold(BigInt::one(), |acc, (p, e)| acc * ((num_traits::pow(p.clone(), *e as usize + 1) - 1) / (p - 1)))
}

fn factor(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "factor")?;
    Ok(Item::List(factorize(session, &n).into_iter().map(|f| Item::Number(Value::Int(f))).collect()))
}

fn divisors(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "divisors")?;
    if n.is_zero() {
        return Ok(Item::List(vec![Item::int(0)]));
    }
    let mut res = vec![BigInt::one()];
    for (p, e) in factor_pairs(session, &n) {
        let mut next = Vec::with_capacity(res.len() * (e as usize + 1));
        for d in &res {
            let mut m = d.clone();
            next.push(m.clone());
            for _ in 0..e {
                m *= &p;
                next.push(m.clone());
            }
        }
        res = next;
    }
    res.sort();
    Ok(Item::List(res.into_iter().map(|d| Item::Number(Value::Int(d))).collect()))
}

fn countdiv(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "countdiv")?;
    if n.is_zero() {
        return Ok(Item::int(0));
    }
    let count = factor_pairs(session, &n).iter().fold(BigInt::one(), |acc, (_, e)| acc * (e + 1));
    Ok(Item::Number(Value::Int(count)))
}

fn sigma(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "sigma")?;
    if n.is_zero() {
        return Ok(Item::int(0));
    }
    Ok(Item::Number(Value::Int(sigma_of(&factor_pairs(session, &n)))))
}

fn aliquot(session: &mut Session, args: &[Item]) -> ItemResult {
    let mut n = int_arg(&args[0], "aliquot")?.abs();
    let count = args[1].to_usize("aliquot")?;
    let mut res = Vec::with_capacity(count);
    for idx in 0..count {
        res.push(Item::Number(Value::Int(n.clone())));
        if n.is_zero() {
            break;
        }
        if idx + 1 < count {
            n = sigma_of(&factor_pairs(session, &n)) - &n;
        }
    }
    Ok(Item::List(res))
}

fn totient(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "totient")?;
    if n < BigInt::from(2) {
        return Ok(Item::Number(Value::Int(n)));
    }
    let res = factor_pairs(session, &n)
        .iter()
        .fold(BigInt::one(), |acc, (p, e)| acc * (p - 1) * num_traits::pow(p.clone(), *e as usize - 1));
    Ok(Item::Number(Value::Int(res)))
}

fn mobius(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "mobius")?;
    if n.is_zero() {
        return Ok(Item::int(0));
    }
    let pairs = factor_pairs(session, &n);
    if pairs.iter().any(|(_, e)| *e > 1) {
        return Ok(Item::int(0));
    }
    Ok(Item::int(if pairs.len() % 2 == 1 { -1 } else { 1 }))
}

fn radical(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "radical")?;
    if n.is_zero() {
        return Ok(Item::int(0));
    }
    let res = factor_pairs(session, &n).into_iter().fold(BigInt::one(), |acc, (p, _)| acc * p);
    Ok(Item::Number(Value::Int(res)))
}

fn issquarefree(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = int_arg(&args[0], "issquarefree")?;
    if n.is_zero() {
        return Ok(Item::from(false));
    }
    Ok(Item::from(factor_pairs(session, &n).iter().all(|(_, e)| *e == 1)))
}

fn compare_sigma(session: &mut Session, args: &[Item], op: &str) -> Result<std::cmp::Ordering, CalcError> {
    let n = int_arg(&args[0], op)?;
    if !n.is_positive() {
        return Err(CalcError::NotForNegativeInt(op.to_string()));
    }
    let proper = sigma_of(&factor_pairs(session, &n)) - &n;
    Ok(proper.cmp(&n))
}

fn isperfect(session: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::from(compare_sigma(session, args, "isperfect")? == std::cmp::Ordering::Equal))
}

fn isabundant(session: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::from(compare_sigma(session, args, "isabundant")? == std::cmp::Ordering::Greater))
}

fn isdeficient(session: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::from(compare_sigma(session, args, "isdeficient")? == std::cmp::Ordering::Less))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "number_theory";
    reg.add(OperatorInfo::new("factor", &[Scalar], cat, "returns the prime factors of n", factor));
    reg.add(OperatorInfo::new("divisors", &[Scalar], cat, "returns all divisors of n", divisors));
    reg.add(OperatorInfo::new("countdiv", &[Scalar], cat, "counts the divisors of n", countdiv));
    reg.add(OperatorInfo::new("sigma", &[Scalar], cat, "sums the divisors of n", sigma));
    reg.add(OperatorInfo::new("aliquot", &[Scalar, Scalar], cat, "returns k terms of the aliquot sequence of n", aliquot));
    reg.add(OperatorInfo::new("totient", &[Scalar], cat, "calculates Euler's totient of n", totient));
    reg.add(OperatorInfo::new("mobius", &[Scalar], cat, "calculates the Mobius function of n", mobius));
    reg.add(OperatorInfo::new("radical", &[Scalar], cat, "returns the largest square-free divisor of n", radical));
    reg.add(OperatorInfo::new("issquarefree", &[Scalar], cat, "returns whether n has no repeated prime factors", issquarefree));
    reg.add(OperatorInfo::new("isperfect", &[Scalar], cat, "returns whether n is a perfect number", isperfect));
    reg.add(OperatorInfo::new("isabundant", &[Scalar], cat, "returns whether n is an abundant number", isabundant));
    reg.add(OperatorInfo::new("isdeficient", &[Scalar], cat, "returns whether n is a deficient number", isdeficient));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::stack::evaluate;

    fn eval(terms: &[&str]) -> String {
        let mut s = Session::new();
        match evaluate(terms, &mut s) {
            Ok(item) => item.to_string(),
            Err(e) => e.to_string(),
        }
    }

    #[test]
    fn test_factor() {
        assert_eq!(eval(&["360", "factor"]), "[ 2, 2, 2, 3, 3, 5 ]");
        assert_eq!(eval(&["-12", "factor"]), "[ -1, 2, 2, 3 ]");
        assert_eq!(eval(&["-1", "factor"]), "[ -1 ]");
        assert_eq!(eval(&["0", "factor"]), "[ 0 ]");
        assert_eq!(eval(&["1", "factor"]), "[ 1 ]");
        assert_eq!(eval(&["97", "factor"]), "[ 97 ]");
        // product of two primes beyond the trial division range
        assert_eq!(eval(&["1000003", "1000033", "*", "factor"]), "[ 1000003, 1000033 ]");
        assert_eq!(eval(&["2", "64", "**", "1", "+", "factor"]), "[ 274177, 67280421310721 ]");
        // seventh Fermat number, out of reach of rho
        assert_eq!(
            eval(&["2", "128", "**", "1", "+", "factor"]),
            "[ 59649589127497217, 5704689200685129054721 ]"
        );
    }

    #[test]
    fn test_ecm() {
        let f7 = (BigInt::one() << 128usize) + 1;
        assert_eq!(brent(&f7, &BigInt::one(), 1 << 10), None);

        let n = BigInt::from(1_000_003u64) * BigInt::from(1_000_033u64) * BigInt::from(999_983u64);
        let d = ecm(&n);
        assert!(d > BigInt::one() && d < n);
        assert!((&n % &d).is_zero());
    }

    #[test]
    fn test_cache_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config { data_dir: Some(dir.path().to_path_buf()), ..Config::default() };
        let mut s = Session::with_config(cfg.clone());
        assert_eq!(
            evaluate(&["600851475143", "factor"], &mut s).map(|i| i.to_string()),
            Ok("[ 71, 839, 1471, 6857 ]".to_string())
        );
        evaluate(&["360", "factor"], &mut s).unwrap();
        s.save_caches();
        assert!(dir.path().join(FACTOR_CACHE).exists());

        let reloaded = Session::with_config(cfg);
        let expected: Vec<BigInt> = [71, 839, 1471, 6857].iter().map(|&p| BigInt::from(p)).collect();
        assert_eq!(reloaded.factors.get(&BigInt::from(600_851_475_143u64)), Some(expected));
        assert_eq!(reloaded.factors.get(&BigInt::from(360)), None);
        assert!(!reloaded.factors.dirty);
    }

    #[test]
    fn test_cache() {
        let mut s = Session::new();
        let n = BigInt::from(600_851_475_143u64);
        let expected: Vec<BigInt> = [71, 839, 1471, 6857].iter().map(|&p| BigInt::from(p)).collect();
        assert_eq!(factorize(&mut s, &n), expected);
        assert_eq!(s.factors.get(&n), Some(expected));
        assert!(s.factors.dirty);
        assert_eq!(s.factors.stats()[0].trim_start().split(' ').next(), Some("1"));

        let small = BigInt::from(360);
        factorize(&mut s, &small);
        assert_eq!(s.factors.get(&small), None);
    }

    #[test]
    fn test_divisor_functions() {
        assert_eq!(eval(&["12", "divisors"]), "[ 1, 2, 3, 4, 6, 12 ]");
        assert_eq!(eval(&["12", "countdiv"]), "6");
        assert_eq!(eval(&["12", "sigma"]), "28");
        assert_eq!(eval(&["12", "5", "aliquot"]), "[ 12, 16, 15, 9, 4 ]");
        assert_eq!(eval(&["36", "totient"]), "12");
        assert_eq!(eval(&["1", "totient"]), "1");
        assert_eq!(eval(&["30", "mobius"]), "-1");
        assert_eq!(eval(&["12", "mobius"]), "0");
        assert_eq!(eval(&["72", "radical"]), "6");
        assert_eq!(eval(&["30", "issquarefree"]), "1");
        assert_eq!(eval(&["28", "isperfect"]), "1");
        assert_eq!(eval(&["12", "isabundant"]), "1");
        assert_eq!(eval(&["13", "isdeficient"]), "1");
    }
}
