use std::fs;
use std::path::Path;

use log::{debug, warn};
use num_bigint::BigInt;
use num_complex::Complex;
use num_rational::BigRational;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::*;
use crate::item::*;
use crate::measurement::Measurement;
use crate::units::Units;
use crate::value::*;

pub const FACTOR_CACHE: &str = "factors.json";
pub const PRIME_CACHE: &str = "primes.json";
pub const RESULT_FILE: &str = "result.json";

/// Reads a JSON file from the data directory. Missing or broken files give `None`
pub fn load_json<T: DeserializeOwned>(dir: &Path, name: &str) -> Option<T> {
    let path = dir.join(name);
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(_) => {
            debug!("no cache file {}", path.display());
            return None;
        }
    };
    match serde_json::from_str(&text) {
        Ok(v) => {
            debug!("loaded {}", path.display());
            Some(v)
        }
        Err(e) => {
            warn!("ignoring broken file {}: {}", path.display(), e);
            None
        }
    }
}

pub fn save_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<(), CalcError> {
    fs::create_dir_all(dir)?;
    let text = serde_json::to_string(value).map_err(|e| CalcError::Io(e.to_string()))?;
    let path = dir.join(name);
    fs::write(&path, text)?;
    debug!("saved {}", path.display());
    Ok(())
}

/// On-disk form of a stack item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum SavedItem {
    Int(String),
    Float(f64),
    Ratio(String, String),
    Complex(f64, f64),
    List(Vec<SavedItem>),
    Measure(Box<SavedItem>, String),
    Time(i64),
    Text(String),
}

fn save_value(v: &Value) -> SavedItem {
    match v {
        Value::Int(i) => SavedItem::Int(i.to_string()),
        Value::Float(f) => SavedItem::Float(*f),
        Value::Ratio(r) => SavedItem::Ratio(r.numer().to_string(), r.denom().to_string()),
        Value::Complex(c) => SavedItem::Complex(c.re, c.im),
    }
}

impl SavedItem {
    /// Items that cannot be stored (functions, names) give `None`
    pub fn from_item(item: &Item) -> Option<SavedItem> {
        match item {
            Item::Number(v) => Some(save_value(v)),
            Item::List(items) => items.iter().map(SavedItem::from_item).collect::<Option<Vec<_>>>().map(SavedItem::List),
            Item::Measure(m) => Some(SavedItem::Measure(Box::new(save_value(&m.value)), m.units.to_string())),
            Item::Time(t) => Some(SavedItem::Time(t.unix())),
            Item::Text(s) => Some(SavedItem::Text(s.clone())),
            _ => None,
        }
    }

    pub fn into_item(self) -> ItemResult {
        let parse_int = |s: &str| s.parse::<BigInt>().map_err(|_| CalcError::StrToInt(s.to_string()));
        match self {
            SavedItem::Int(s) => Ok(Item::Number(Value::Int(parse_int(&s)?))),
            SavedItem::Float(f) => Ok(Item::Number(Value::Float(f))),
            SavedItem::Ratio(n, d) => {
                let d = parse_int(&d)?;
                if d == BigInt::from(0) {
                    return Err(CalcError::DividedByZero(n));
                }
                Ok(Item::Number(Value::from(BigRational::new(parse_int(&n)?, d))))
            }
            SavedItem::Complex(re, im) => Ok(Item::Number(Value::Complex(Complex::new(re, im)))),
            SavedItem::List(items) => Ok(Item::List(items.into_iter().map(|i| i.into_item()).collect::<Result<_, _>>()?)),
            SavedItem::Measure(v, units) => match v.into_item()? {
                Item::Number(value) => Ok(Measurement::new(value, Units::parse(&units)?).into()),
                other => Err(CalcError::ExpectedNumber(other.to_string())),
            },
            SavedItem::Time(secs) => Ok(Item::Time(crate::datetime::DateTime::from_unix(secs))),
            SavedItem::Text(s) => Ok(Item::Text(s)),
        }
    }
}

pub fn save_result(dir: &Path, item: &Item) -> Result<(), CalcError> {
    match SavedItem::from_item(item) {
        Some(saved) => save_json(dir, RESULT_FILE, &saved),
        None => Ok(()),
    }
}

pub fn load_result(dir: &Path) -> ItemResult {
    match load_json::<SavedItem>(dir, RESULT_FILE) {
        Some(saved) => saved.into_item(),
        None => Ok(Item::Number(Value::zero())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_json_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = BTreeMap::new();
        map.insert(100u64, 541u64);
        save_json(dir.path(), PRIME_CACHE, &map).unwrap();
        let loaded: Option<BTreeMap<u64, u64>> = load_json(dir.path(), PRIME_CACHE);
        assert_eq!(loaded, Some(map));
        let missing: Option<BTreeMap<u64, u64>> = load_json(dir.path(), "missing.json");
        assert!(missing.is_none());
        fs::write(dir.path().join("broken.json"), "{not json").unwrap();
        let broken: Option<BTreeMap<u64, u64>> = load_json(dir.path(), "broken.json");
        assert!(broken.is_none());
    }

    #[test]
    fn test_result_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_result(dir.path()), Ok(Item::int(0)));
        let item = Item::List(vec![
            Item::int(1_234_567_890_123_456_789),
            Item::Measure(Measurement::new(Value::Float(2.5), Units::single("meter"))),
        ]);
        save_result(dir.path(), &item).unwrap();
        assert_eq!(load_result(dir.path()), Ok(item));
    }
}
