use std::collections::BTreeMap;
use std::path::Path;

use lazy_static::lazy_static;
use log::debug;
use num_bigint::BigInt;
use num_integer::{Integer, Roots};
use num_traits::{One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::persistence::{self, PRIME_CACHE};
use crate::session::{thousands, Session};
use crate::value::*;

/// Upper bound of the in-memory sieve of small primes
const SMALL_LIMIT: usize = 1 << 20;
/// Segmented sieving needs base primes up to the square root of the segment end
const SEGMENT_LIMIT: u64 = (SMALL_LIMIT as u64) * (SMALL_LIMIT as u64);
const SEGMENT_SIZE: u64 = 1 << 18;
/// Deterministic Miller-Rabin with these bases is exact below 3.3e24
const MR_BASES: [u32; 13] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41];
const MR_EXACT_LIMIT: &str = "3317044064679887385961981";
// the prime counting sieve takes O(n^(3/4)) steps
const PRIMEPI_LIMIT: u64 = 1_000_000_000_000;
const NTH_LIMIT: u64 = 1_000_000_000_000;

lazy_static! {
    pub(crate) static ref SMALL_PRIMES: Vec<u64> = simple_sieve(SMALL_LIMIT);
    static ref MR_LIMIT: BigInt = BigInt::parse_bytes(MR_EXACT_LIMIT.as_bytes(), 10).unwrap_or_default();
}

fn simple_sieve(limit: usize) -> Vec<u64> {
    let mut composite = vec![false; limit];
    let mut primes = Vec::new();
    for i in 2..limit {
        if composite[i] {
            continue;
        }
        primes.push(i as u64);
        let mut j = i * i;
        while j < limit {
            composite[j] = true;
            j += i;
        }
    }
    primes
}

fn sieve_segment(lo: u64, hi: u64) -> Vec<u64> {
    let mut candidate = vec![true; (hi - lo) as usize];
    for &p in SMALL_PRIMES.iter() {
        if p * p >= hi {
            break;
        }
        let mut m = ((lo + p - 1) / p * p).max(p * p);
        while m < hi {
            candidate[(m - lo) as usize] = false;
            m += p;
        }
    }
    candidate
        .iter()
        .enumerate()
        .filter(|(idx, &c)| c && lo + *idx as u64 >= 2)
        .map(|(idx, _)| lo + idx as u64)
        .collect()
}

/// Iterates primes starting at the given value (inclusive)
pub(crate) struct PrimeIter {
    segment: Vec<u64>,
    pos: usize,
    next_lo: u64,
}

impl PrimeIter {
    pub(crate) fn new(start: u64) -> Self {
        PrimeIter { segment: Vec::new(), pos: 0, next_lo: start }
    }

    fn fill(&mut self) -> Option<()> {
        let lo = self.next_lo;
        if lo >= SEGMENT_LIMIT {
            let p = next_prime_u64(lo)?;
            self.segment = vec![p];
            self.next_lo = p.checked_add(1)?;
        } else {
            let hi = (lo + SEGMENT_SIZE).min(SEGMENT_LIMIT);
            self.segment = sieve_segment(lo, hi);
            self.next_lo = hi;
        }
        self.pos = 0;
        Some(())
    }
}

impl Iterator for PrimeIter {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        while self.pos >= self.segment.len() {
            self.fill()?;
        }
        self.pos += 1;
        Some(self.segment[self.pos - 1])
    }
}

fn mul_mod(a: u64, b: u64, m: u64) -> u64 {
    ((a as u128 * b as u128) % m as u128) as u64
}

fn pow_mod(mut base: u64, mut exp: u64, m: u64) -> u64 {
    let mut res = 1u64;
    base %= m;
    while exp > 0 {
        if exp & 1 == 1 {
            res = mul_mod(res, base, m);
        }
        base = mul_mod(base, base, m);
        exp >>= 1;
    }
    res
}

fn miller_rabin_u64(n: u64) -> bool {
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;
    'bases: for &a in MR_BASES.iter() {
        let a = a as u64 % n;
        if a == 0 {
            continue;
        }
        let mut x = pow_mod(a, d, n);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = mul_mod(x, x, n);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

pub(crate) fn is_prime_u64(n: u64) -> bool {
    if n < SMALL_LIMIT as u64 {
        return SMALL_PRIMES.binary_search(&n).is_ok();
    }
    for &p in SMALL_PRIMES.iter().take(50) {
        if n % p == 0 {
            return false;
        }
    }
    miller_rabin_u64(n)
}

fn miller_rabin(n: &BigInt, base: u32) -> bool {
    let one = BigInt::one();
    let n1 = n - &one;
    let s = n1.trailing_zeros().unwrap_or(0);
    let d = &n1 >> s;
    let mut x = BigInt::from(base).modpow(&d, n);
    if x.is_one() || x == n1 {
        return true;
    }
    for _ in 1..s {
        x = (&x * &x) % n;
        if x == n1 {
            return true;
        }
    }
    false
}

fn jacobi(a: &BigInt, n: &BigInt) -> i32 {
    let mut a = a.mod_floor(n);
    let mut n = n.clone();
    let mut t = 1;
    while !a.is_zero() {
        while a.is_even() {
            a >>= 1;
            let r = (&n % 8u32).to_u32().unwrap_or(0);
            if r == 3 || r == 5 {
                t = -t;
            }
        }
        std::mem::swap(&mut a, &mut n);
        if (&a % 4u32).to_u32() == Some(3) && (&n % 4u32).to_u32() == Some(3) {
            t = -t;
        }
        a = a.mod_floor(&n);
    }
    if n.is_one() {
        t
    } else {
        0
    }
}

fn half_mod(x: BigInt, n: &BigInt) -> BigInt {
    let x = if x.is_odd() { x + n } else { x };
    let h: BigInt = x >> 1usize;
    h.mod_floor(n)
}

/// Strong Lucas probable prime test with Selfridge parameters
fn strong_lucas(n: &BigInt) -> bool {
    let sq = n.sqrt();
    if &sq * &sq == *n {
        return false;
    }
    let mut d = BigInt::from(5);
    loop {
        match jacobi(&d, n) {
            -1 => break,
            0 if d.abs() != *n => return false,
            _ => {}
        }
        d = if d.is_positive() { -(d + BigInt::from(2)) } else { -d + BigInt::from(2) };
    }
    let q: BigInt = (BigInt::one() - &d) / 4;
    let np1: BigInt = n + 1;
    let s = np1.trailing_zeros().unwrap_or(0);
    let k = &np1 >> s;

    let mut u = BigInt::one();
    let mut v = BigInt::one();
    let mut qk = q.mod_floor(n);
    let bits = k.bits();
    for i in (0..bits.saturating_sub(1)).rev() {
        u = (&u * &v).mod_floor(n);
        v = (&v * &v - &qk * 2u32).mod_floor(n);
        qk = (&qk * &qk).mod_floor(n);
        if k.bit(i) {
            let u2 = half_mod(&u + &v, n);
            let v2 = half_mod(&d * &u + &v, n);
            u = u2;
            v = v2;
            qk = (&qk * &q).mod_floor(n);
        }
    }
    if u.is_zero() || v.is_zero() {
        return true;
    }
    for _ in 1..s {
        v = (&v * &v - &qk * 2u32).mod_floor(n);
        if v.is_zero() {
            return true;
        }
        qk = (&qk * &qk).mod_floor(n);
    }
    false
}

/// Primality test for arbitrary integers
pub fn is_prime(n: &BigInt) -> bool {
    if let Some(small) = n.to_u64() {
        return is_prime_u64(small);
    }
    if n.is_negative() {
        return false;
    }
    for &p in SMALL_PRIMES.iter().take(200) {
        if (n % p).is_zero() {
            return false;
        }
    }
    if *n < *MR_LIMIT {
        return MR_BASES.iter().all(|&b| miller_rabin(n, b));
    }
    miller_rabin(n, 2) && strong_lucas(n)
}

/// First prime >= n
pub(crate) fn next_prime_u64(n: u64) -> Option<u64> {
    if n <= 2 {
        return Some(2);
    }
    let mut p = n | 1;
    while !is_prime_u64(p) {
        p = p.checked_add(2)?;
    }
    Some(p)
}

/// Counts primes up to n, Lucy Hedgehog's method
pub(crate) fn prime_pi(n: u64) -> u64 {
    if n < 2 {
        return 0;
    }
    let r = n.sqrt() as usize;
    let mut small: Vec<u64> = (0..=r as u64).map(|i| i.saturating_sub(1)).collect();
    let mut large: Vec<u64> = (0..=r as u64).map(|i| if i == 0 { 0 } else { n / i - 1 }).collect();
    for p in 2..=r {
        if small[p] == small[p - 1] {
            continue;
        }
        let sp = small[p - 1];
        let p2 = (p * p) as u64;
        for i in 1..=r {
            if n / (i as u64) < p2 {
                break;
            }
            let d = i * p;
            let val = if d <= r { large[d] } else { small[(n / d as u64) as usize] };
            large[i] -= val - sp;
        }
        for v in (p * p..=r).rev() {
            small[v] -= small[v / p] - sp;
        }
    }
    large[1]
}

#[derive(Clone, Copy)]
enum Shape {
    /// all of `p + offset` are prime for one of the patterns
    Offsets(&'static [&'static [u64]]),
    /// the middle prime of 2k+1 consecutive primes with mirrored gaps
    Balanced(usize),
    Test(fn(u64) -> bool),
}

/// A family of primes counted by index
pub(crate) struct Constellation {
    name: &'static str,
    shape: Shape,
}

impl Constellation {
    fn window(&self) -> usize {
        match self.shape {
            Shape::Balanced(k) => 2 * k + 1,
            _ => 1,
        }
    }

    fn matches(&self, w: &[u64]) -> bool {
        match self.shape {
            Shape::Offsets(patterns) => patterns.iter().any(|offs| pattern_matches(w[0], offs)),
            Shape::Balanced(k) => (0..k).all(|i| w[k - i] - w[k - i - 1] == w[k + i + 1] - w[k + i]),
            Shape::Test(f) => f(w[0]),
        }
    }

    fn value(&self, w: &[u64]) -> u64 {
        match self.shape {
            Shape::Balanced(k) => w[k],
            _ => w[0],
        }
    }

    fn members(&self, w: &[u64]) -> Vec<u64> {
        match self.shape {
            Shape::Offsets(patterns) => patterns
                .iter()
                .find(|offs| pattern_matches(w[0], offs))
                .map(|offs| offs.iter().map(|o| w[0] + o).collect())
                .unwrap_or_default(),
            _ => w.to_vec(),
        }
    }
}

fn pattern_matches(p: u64, offsets: &[u64]) -> bool {
    offsets.iter().skip(1).all(|o| p.checked_add(*o).map(is_prime_u64).unwrap_or(false))
}

fn isolated(p: u64) -> bool {
    (p < 4 || !is_prime_u64(p - 2)) && !p.checked_add(2).map(is_prime_u64).unwrap_or(false)
}

fn sophie(p: u64) -> bool {
    p.checked_mul(2).and_then(|q| q.checked_add(1)).map(is_prime_u64).unwrap_or(false)
}

fn safe(p: u64) -> bool {
    p > 3 && is_prime_u64((p - 1) / 2)
}

const EVERY: Constellation = Constellation { name: "prime", shape: Shape::Offsets(&[&[0]]) };
const TWIN: Constellation = Constellation { name: "twin", shape: Shape::Offsets(&[&[0, 2]]) };
const COUSIN: Constellation = Constellation { name: "cousin", shape: Shape::Offsets(&[&[0, 4]]) };
const SEXY: Constellation = Constellation { name: "sexy", shape: Shape::Offsets(&[&[0, 6]]) };
const SEXY_TRIPLET: Constellation = Constellation { name: "sexy_triplet", shape: Shape::Offsets(&[&[0, 6, 12]]) };
const SEXY_QUAD: Constellation = Constellation { name: "sexy_quad", shape: Shape::Offsets(&[&[0, 6, 12, 18]]) };
const TRIPLET: Constellation = Constellation { name: "triplet", shape: Shape::Offsets(&[&[0, 2, 6], &[0, 4, 6]]) };
const QUAD: Constellation = Constellation { name: "quad", shape: Shape::Offsets(&[&[0, 2, 6, 8]]) };
const QUINT: Constellation =
    Constellation { name: "quint", shape: Shape::Offsets(&[&[0, 2, 6, 8, 12], &[0, 4, 6, 10, 12]]) };
const SEXT: Constellation = Constellation { name: "sext", shape: Shape::Offsets(&[&[0, 4, 6, 10, 12, 16]]) };
const BALANCED: Constellation = Constellation { name: "balanced", shape: Shape::Balanced(1) };
const DOUBLE_BALANCED: Constellation = Constellation { name: "double_balanced", shape: Shape::Balanced(2) };
const TRIPLE_BALANCED: Constellation = Constellation { name: "triple_balanced", shape: Shape::Balanced(3) };
const ISOLATED: Constellation = Constellation { name: "isolated", shape: Shape::Test(isolated) };
const SOPHIE: Constellation = Constellation { name: "sophie", shape: Shape::Test(sophie) };
const SAFE: Constellation = Constellation { name: "safe", shape: Shape::Test(safe) };

/// Sparse index-to-prime checkpoints of every prime family
#[derive(Default, Serialize, Deserialize)]
pub struct PrimeCache {
    tables: BTreeMap<String, BTreeMap<u64, u64>>,
    #[serde(skip)]
    dirty: bool,
}

impl PrimeCache {
    pub fn load(dir: &Path) -> PrimeCache {
        persistence::load_json(dir, PRIME_CACHE).unwrap_or_default()
    }

    pub fn save(&mut self, dir: &Path) -> Result<(), CalcError> {
        if !self.dirty {
            return Ok(());
        }
        persistence::save_json(dir, PRIME_CACHE, self)?;
        self.dirty = false;
        Ok(())
    }

    pub fn stats(&self) -> Vec<String> {
        self.tables
            .iter()
            .map(|(name, table)| {
                let max = table.keys().next_back().copied().unwrap_or(0);
                format!("{:>10} {:23} max: {:>14} ({})", thousands(table.len() as u64), name, thousands(max), PRIME_CACHE)
            })
            .collect()
    }

    fn checkpoint_step(c: &Constellation) -> u64 {
        if c.name == EVERY.name {
            100_000
        } else {
            1_000
        }
    }

    /// Window of consecutive primes holding the n-th member of the family
    fn nth_window(&mut self, c: &Constellation, n: u64, op: &str) -> Result<Vec<u64>, CalcError> {
        if n < 1 || n > NTH_LIMIT {
            return Err(CalcError::ArgumentOutOfRange(op.to_string(), n.to_string(), format!("1..{}", NTH_LIMIT)));
        }
        let step = Self::checkpoint_step(c);
        let table = self.tables.entry(c.name.to_string()).or_default();
        let (mut idx, start) = table.range(..=n).next_back().map(|(i, p)| (*i, *p)).unwrap_or((0, 2));
        debug!("{}: searching for #{} from #{} ({})", c.name, n, idx, start);

        let overflow = || CalcError::ArgumentOutOfRange(op.to_string(), n.to_string(), "64-bit".to_string());
        let mut iter = PrimeIter::new(start);
        let mut window: Vec<u64> = iter.by_ref().take(c.window()).collect();
        if window.len() < c.window() {
            return Err(overflow());
        }
        if idx == 0 && c.matches(&window) {
            idx = 1;
        }
        while idx < n {
            window.remove(0);
            window.push(iter.next().ok_or_else(overflow)?);
            if c.matches(&window) {
                idx += 1;
                if idx % step == 0 {
                    table.insert(idx, window[0]);
                    self.dirty = true;
                }
            }
        }
        if n > step && !table.contains_key(&n) {
            table.insert(n, window[0]);
            self.dirty = true;
        }
        Ok(window)
    }

    fn nth(&mut self, c: &Constellation, n: u64, op: &str) -> Result<u64, CalcError> {
        if c.name == EVERY.name && n >= 1 && n <= SMALL_PRIMES.len() as u64 {
            return Ok(SMALL_PRIMES[n as usize - 1]);
        }
        let w = self.nth_window(c, n, op)?;
        Ok(c.value(&w))
    }

    pub(crate) fn nth_prime(&mut self, n: u64) -> Result<u64, CalcError> {
        self.nth(&EVERY, n, "prime")
    }
}

fn index_arg(item: &Item, op: &str) -> Result<u64, CalcError> {
    item.number(op)?
        .to_bigint(op)?
        .to_u64()
        .ok_or_else(|| CalcError::ArgumentOutOfRange(op.to_string(), item.to_string(), "64-bit".to_string()))
}

fn number(n: u64) -> Item {
    Item::Number(Value::from(n))
}

fn isprime(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].number("isprime")?.to_bigint("isprime")?;
    Ok(Item::from(is_prime(&n)))
}

fn prime(session: &mut Session, args: &[Item]) -> ItemResult {
    Ok(number(session.primes.nth_prime(index_arg(&args[0], "prime")?)?))
}

fn primes(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = index_arg(&args[0], "primes")?;
    let count = args[1].to_usize("primes")?;
    let first = session.primes.nth_prime(n)?;
    Ok(Item::List(PrimeIter::new(first).take(count).map(number).collect()))
}

fn primepi(_: &mut Session, args: &[Item]) -> ItemResult {
    let n = args[0].number("primepi")?.floor_bigint("primepi")?;
    if n.is_negative() {
        return Ok(Item::int(0));
    }
    match n.to_u64() {
        Some(v) if v <= PRIMEPI_LIMIT => Ok(number(prime_pi(v))),
        _ => Err(CalcError::ArgumentOutOfRange("primepi".to_string(), n.to_string(), format!("0..{}", PRIMEPI_LIMIT))),
    }
}

fn first_prime_from(item: &Item, op: &str) -> Result<u64, CalcError> {
    let n = index_arg(item, op)?;
    next_prime_u64(n).ok_or_else(|| CalcError::ArgumentOutOfRange(op.to_string(), n.to_string(), "64-bit".to_string()))
}

/// Index of the first prime >= n
fn find_prime(_: &mut Session, args: &[Item]) -> ItemResult {
    let p = first_prime_from(&args[0], "prime?")?;
    Ok(number(prime_pi(p)))
}

fn nthprime_(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(number(first_prime_from(&args[0], "nthprime?")?))
}

fn primorial(session: &mut Session, args: &[Item]) -> ItemResult {
    let n = index_arg(&args[0], "primorial")?;
    let mut res = BigInt::one();
    if n > 0 {
        let last = session.primes.nth_prime(n)?;
        for p in PrimeIter::new(2).take_while(|p| *p <= last) {
            res *= p;
        }
    }
    Ok(Item::Number(Value::Int(res)))
}

fn superprime(session: &mut Session, args: &[Item]) -> ItemResult {
    let p = session.primes.nth_prime(index_arg(&args[0], "superprime")?)?;
    Ok(number(session.primes.nth_prime(p)?))
}

fn polyprime(session: &mut Session, args: &[Item]) -> ItemResult {
    let mut p = index_arg(&args[0], "polyprime")?;
    let depth = args[1].to_usize("polyprime")?;
    for _ in 0..depth {
        p = session.primes.nth_prime(p)?;
    }
    Ok(number(p))
}

macro_rules! family_ops {
    ($( $value:ident, $list:ident, $family:expr, $name:expr; )+) => {
        $(
            fn $value(session: &mut Session, args: &[Item]) -> ItemResult {
                let n = index_arg(&args[0], $name)?;
                Ok(number(session.primes.nth(&$family, n, $name)?))
            }

            fn $list(session: &mut Session, args: &[Item]) -> ItemResult {
                let n = index_arg(&args[0], $name)?;
                let w = session.primes.nth_window(&$family, n, $name)?;
                Ok(Item::List($family.members(&w).into_iter().map(number).collect()))
            }
        )+
    };
}

family_ops! {
    twinprime, twinprime_list, TWIN, "twinprime";
    cousinprime, cousinprime_list, COUSIN, "cousinprime";
    sexyprime, sexyprime_list, SEXY, "sexyprime";
    sexytriplet, sexytriplet_list, SEXY_TRIPLET, "sexytriplet";
    sexyquad, sexyquad_list, SEXY_QUAD, "sexyquad";
    tripletprime, tripletprime_list, TRIPLET, "tripletprime";
    quadprime, quadprime_list, QUAD, "quadprime";
    quintprime, quintprime_list, QUINT, "quintprime";
    sextprime, sextprime_list, SEXT, "sextprime";
    balanced, balanced_list, BALANCED, "balanced";
    doublebal, doublebal_list, DOUBLE_BALANCED, "doublebal";
    triplebal, triplebal_list, TRIPLE_BALANCED, "triplebal";
}

fn isolatedprime(session: &mut Session, args: &[Item]) -> ItemResult {
    Ok(number(session.primes.nth(&ISOLATED, index_arg(&args[0], "isolated")?, "isolated")?))
}

fn sophieprime(session: &mut Session, args: &[Item]) -> ItemResult {
    Ok(number(session.primes.nth(&SOPHIE, index_arg(&args[0], "sophieprime")?, "sophieprime")?))
}

fn safeprime(session: &mut Session, args: &[Item]) -> ItemResult {
    Ok(number(session.primes.nth(&SAFE, index_arg(&args[0], "safeprime")?, "safeprime")?))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "prime_numbers";
    reg.add(OperatorInfo::new("isprime", &[Scalar], cat, "returns whether n is prime", isprime));
    reg.add(OperatorInfo::new("prime", &[Scalar], cat, "returns the nth prime", prime));
    reg.add(OperatorInfo::new("primes", &[Scalar, Scalar], cat, "returns k primes starting with the nth", primes));
    reg.add(OperatorInfo::new("primepi", &[Scalar], cat, "counts the primes less than or equal to n", primepi));
    reg.add(OperatorInfo::new("prime?", &[Scalar], cat, "returns the index of the first prime >= n", find_prime));
    reg.add(OperatorInfo::new("nthprime?", &[Scalar], cat, "returns the first prime >= n", nthprime_));
    reg.add(OperatorInfo::new("primorial", &[Scalar], cat, "multiplies the first n primes", primorial));
    reg.add(OperatorInfo::new("superprime", &[Scalar], cat, "returns the nth prime with a prime index", superprime));
    reg.add(OperatorInfo::new("polyprime", &[Scalar, Scalar], cat, "applies the nth prime function k times to n", polyprime));
    reg.add(OperatorInfo::new("twinprime", &[Scalar], cat, "returns the first member of the nth twin prime pair", twinprime));
    reg.add(OperatorInfo::new("twinprime_", &[Scalar], cat, "returns the nth twin prime pair", twinprime_list));
    reg.add(OperatorInfo::new("cousinprime", &[Scalar], cat, "returns the first member of the nth cousin prime pair", cousinprime));
    reg.add(OperatorInfo::new("cousinprime_", &[Scalar], cat, "returns the nth cousin prime pair", cousinprime_list));
    reg.add(OperatorInfo::new("sexyprime", &[Scalar], cat, "returns the first member of the nth sexy prime pair", sexyprime));
    reg.add(OperatorInfo::new("sexyprime_", &[Scalar], cat, "returns the nth sexy prime pair", sexyprime_list));
    reg.add(OperatorInfo::new("sexytriplet", &[Scalar], cat, "returns the first member of the nth sexy triplet", sexytriplet));
    reg.add(OperatorInfo::new("sexytriplet_", &[Scalar], cat, "returns the nth sexy triplet", sexytriplet_list));
    reg.add(OperatorInfo::new("sexyquad", &[Scalar], cat, "returns the first member of the nth sexy quadruplet", sexyquad));
    reg.add(OperatorInfo::new("sexyquad_", &[Scalar], cat, "returns the nth sexy quadruplet", sexyquad_list));
    reg.add(OperatorInfo::new("tripletprime", &[Scalar], cat, "returns the first member of the nth prime triplet", tripletprime));
    reg.add(OperatorInfo::new("tripletprime_", &[Scalar], cat, "returns the nth prime triplet", tripletprime_list));
    reg.add(OperatorInfo::new("quadprime", &[Scalar], cat, "returns the first member of the nth prime quadruplet", quadprime));
    reg.add(OperatorInfo::new("quadprime_", &[Scalar], cat, "returns the nth prime quadruplet", quadprime_list));
    reg.add(OperatorInfo::new("quintprime", &[Scalar], cat, "returns the first member of the nth prime quintuplet", quintprime));
    reg.add(OperatorInfo::new("quintprime_", &[Scalar], cat, "returns the nth prime quintuplet", quintprime_list));
    reg.add(OperatorInfo::new("sextprime", &[Scalar], cat, "returns the first member of the nth prime sextuplet", sextprime));
    reg.add(OperatorInfo::new("sextprime_", &[Scalar], cat, "returns the nth prime sextuplet", sextprime_list));
    reg.add(OperatorInfo::new("balanced", &[Scalar], cat, "returns the nth balanced prime", balanced));
    reg.add(OperatorInfo::new("balanced_", &[Scalar], cat, "returns the nth balanced prime with its neighbors", balanced_list));
    reg.add(OperatorInfo::new("doublebal", &[Scalar], cat, "returns the nth double balanced prime", doublebal));
    reg.add(OperatorInfo::new("doublebal_", &[Scalar], cat, "returns the nth double balanced prime with its neighbors", doublebal_list));
    reg.add(OperatorInfo::new("triplebal", &[Scalar], cat, "returns the nth triple balanced prime", triplebal));
    reg.add(OperatorInfo::new("triplebal_", &[Scalar], cat, "returns the nth triple balanced prime with its neighbors", triplebal_list));
    reg.add(OperatorInfo::new("isolated", &[Scalar], cat, "returns the nth isolated prime", isolatedprime));
    reg.add(OperatorInfo::new("sophieprime", &[Scalar], cat, "returns the nth Sophie Germain prime", sophieprime));
    reg.add(OperatorInfo::new("safeprime", &[Scalar], cat, "returns the nth safe prime", safeprime));
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
    fn test_is_prime() {
        assert!(is_prime_u64(2));
        assert!(!is_prime_u64(1));
        assert!(is_prime_u64(1_000_003));
        assert!(!is_prime_u64(1_000_001));
        // Carmichael number
        assert!(!is_prime_u64(3_215_031_751));
        assert!(is_prime_u64(18_446_744_073_709_551_557));
        let m127 = (BigInt::one() << 127) - 1;
        assert!(is_prime(&m127));
        let m89 = (BigInt::one() << 89) - 1;
        assert!(is_prime(&m89));
        assert!(!is_prime(&(&m89 * 3)));
        let composite = &m89 * &m127;
        assert!(!is_prime(&composite));
        assert!(strong_lucas(&m89));
    }

    #[test]
    fn test_sieve() {
        let from_iter: Vec<u64> = PrimeIter::new(90).take(5).collect();
        assert_eq!(from_iter, vec![97, 101, 103, 107, 109]);
        let segment: Vec<u64> = PrimeIter::new(SMALL_LIMIT as u64 * 3).take(1).collect();
        assert_eq!(segment[0], next_prime_u64(SMALL_LIMIT as u64 * 3).unwrap());
    }

    #[test]
    fn test_prime_pi() {
        assert_eq!(prime_pi(1), 0);
        assert_eq!(prime_pi(2), 1);
        assert_eq!(prime_pi(100), 25);
        assert_eq!(prime_pi(1000), 168);
        assert_eq!(prime_pi(1_000_000), 78498);
        assert_eq!(prime_pi(10_000_000_000), 455_052_511);
        assert_eq!(eval(&["1000", "primepi"]), "168");
        assert_eq!(
            eval(&["1000000000001", "primepi"]),
            "error in arg 2:  argument 1000000000001 of 'primepi' out of range (0..1000000000000)"
        );
    }

    #[test]
    fn test_nth_prime() {
        assert_eq!(eval(&["1", "prime"]), "2");
        assert_eq!(eval(&["1000", "prime"]), "7919");
        assert_eq!(eval(&["100000", "prime"]), "1299709");
        assert_eq!(eval(&["200000", "prime"]), "2750159");
        assert_eq!(eval(&["1", "5", "primes"]), "[ 2, 3, 5, 7, 11 ]");
        assert_eq!(eval(&["6", "primorial"]), "30030");
        assert_eq!(eval(&["3", "superprime"]), "11");
        assert_eq!(eval(&["1", "3", "polyprime"]), "5");
        assert_eq!(eval(&["100", "prime?"]), "26");
        assert_eq!(eval(&["100", "nthprime?"]), "101");
        assert_eq!(eval(&["0", "prime"]), "error in arg 2:  argument 0 of 'prime' out of range (1..1000000000000)");
    }

    #[test]
    fn test_checkpoints() {
        let mut cache = PrimeCache::default();
        let p = cache.nth(&TWIN, 2500, "twinprime").unwrap();
        assert!(cache.dirty);
        assert!(cache.tables["twin"].contains_key(&2000));
        assert!(is_prime_u64(p) && is_prime_u64(p + 2));

        // resuming from the stored checkpoint gives the same answer as a cold search
        let warm = cache.nth(&TWIN, 2501, "twinprime").unwrap();
        let cold = PrimeCache::default().nth(&TWIN, 2501, "twinprime").unwrap();
        assert_eq!(warm, cold);
        assert!(warm > p);
        assert_eq!(cache.stats().len(), 1);
    }

    #[test]
    fn test_checkpoint_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config { data_dir: Some(dir.path().to_path_buf()), ..Config::default() };
        let mut s = Session::with_config(cfg.clone());
        let first = evaluate(&["2500", "twinprime"], &mut s).unwrap();
        s.save_caches();
        assert!(dir.path().join(PRIME_CACHE).exists());

        let mut resumed = Session::with_config(cfg);
        assert!(resumed.primes.tables["twin"].contains_key(&2000));
        assert!(resumed.primes.tables["twin"].contains_key(&2500));
        assert!(!resumed.primes.dirty);
        assert_eq!(evaluate(&["2500", "twinprime"], &mut resumed), Ok(first));
        assert_eq!(
            evaluate(&["2501", "twinprime"], &mut resumed),
            evaluate(&["2501", "twinprime"], &mut Session::new())
        );
    }

    #[test]
    fn test_families() {
        assert_eq!(eval(&["1", "twinprime_"]), "[ 3, 5 ]");
        assert_eq!(eval(&["3", "twin"]), "11");
        assert_eq!(eval(&["1", "cousinprime_"]), "[ 3, 7 ]");
        assert_eq!(eval(&["1", "sexyprime_"]), "[ 5, 11 ]");
        assert_eq!(eval(&["2", "sexytriplet_"]), "[ 7, 13, 19 ]");
        assert_eq!(eval(&["1", "sexyquad_"]), "[ 5, 11, 17, 23 ]");
        assert_eq!(eval(&["2", "tripletprime_"]), "[ 7, 11, 13 ]");
        assert_eq!(eval(&["1", "quadprime_"]), "[ 5, 7, 11, 13 ]");
        assert_eq!(eval(&["2", "quintprime_"]), "[ 7, 11, 13, 17, 19 ]");
        assert_eq!(eval(&["1", "sextprime_"]), "[ 7, 11, 13, 17, 19, 23 ]");
        assert_eq!(eval(&["1", "balanced_"]), "[ 3, 5, 7 ]");
        assert_eq!(eval(&["2", "balanced"]), "53");
        assert_eq!(eval(&["1", "doublebal"]), "18731");
        assert_eq!(eval(&["1", "doublebal_"]), "[ 18713, 18719, 18731, 18743, 18749 ]");
        assert_eq!(eval(&["2", "isolated"]), "23");
        assert_eq!(eval(&["4", "sophieprime"]), "11");
        assert_eq!(eval(&["4", "safeprime"]), "23");
        assert_eq!(eval(&["97", "isprime"]), "1");
    }
}
