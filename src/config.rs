use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::errors::*;

pub const CONFIG_ENV: &str = "RPN_CONFIG";
pub const DEFAULT_NUMERALS: &str = "0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Calculator settings. Every field may be omitted in the configuration
/// file, missing fields get their default values.
///
/// # Example
/// ```toml
/// output_accuracy = 20
/// integer_grouping = 3
/// integer_delimiter = ","
/// use_cache = false
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// significant digits in decimal output
    pub output_accuracy: usize,
    /// fraction digits in non-decimal output
    pub precision: usize,
    pub input_radix: u32,
    /// 2 to 62, or `fib` for the Zeckendorf representation
    pub output_radix: String,
    /// when non-zero, digits are printed as decimal numbers in this radix
    pub output_radix_numerals: u32,
    pub integer_grouping: usize,
    pub decimal_grouping: usize,
    pub integer_delimiter: String,
    pub decimal_delimiter: String,
    pub comma: bool,
    pub leading_zero: bool,
    pub line_length: usize,
    pub list_format_level: usize,
    pub bitwise_group_size: usize,
    pub numerals: String,
    pub timer: bool,
    pub data_dir: Option<PathBuf>,
    pub use_cache: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            output_accuracy: 12,
            precision: 20,
            input_radix: 10,
            output_radix: "10".to_string(),
            output_radix_numerals: 0,
            integer_grouping: 0,
            decimal_grouping: 0,
            integer_delimiter: " ".to_string(),
            decimal_delimiter: " ".to_string(),
            comma: false,
            leading_zero: false,
            line_length: 80,
            list_format_level: 0,
            bitwise_group_size: 16,
            numerals: DEFAULT_NUMERALS.to_string(),
            timer: false,
            data_dir: None,
            use_cache: true,
        }
    }
}

fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").filter(|h| !h.is_empty()).map(PathBuf::from)
}

impl Config {
    pub fn from_toml(text: &str) -> Result<Config, CalcError> {
        let cfg: Config = toml::from_str(text).map_err(|e| CalcError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Loads configuration from the explicit path, `RPN_CONFIG` or
    /// `$HOME/.config/rpn/config.toml`, in that order. A missing file
    /// gives the default configuration
    pub fn load(path: Option<&Path>) -> Result<Config, CalcError> {
        let path = match path {
            Some(p) => Some(p.to_path_buf()),
            None => env::var_os(CONFIG_ENV)
                .map(PathBuf::from)
                .or_else(|| home_dir().map(|h| h.join(".config").join("rpn").join("config.toml"))),
        };
        let path = match path {
            Some(p) if p.exists() => p,
            Some(p) => {
                debug!("configuration file {} not found, using defaults", p.display());
                return Ok(Config::default());
            }
            None => return Ok(Config::default()),
        };
        let text = fs::read_to_string(&path).map_err(|e| CalcError::Config(format!("{}: {}", path.display(), e)))?;
        info!("loading configuration from {}", path.display());
        Config::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), CalcError> {
        if !(2..=62).contains(&self.input_radix) {
            return Err(CalcError::Config(format!("input_radix {} is out of range 2..62", self.input_radix)));
        }
        if self.output_radix != "fib" {
            match self.output_radix.parse::<u32>() {
                Ok(r) if (2..=62).contains(&r) => {}
                _ => return Err(CalcError::Config(format!("invalid output_radix '{}'", self.output_radix))),
            }
        }
        if self.output_radix_numerals == 1 {
            return Err(CalcError::Config("output_radix_numerals must be at least 2".to_string()));
        }
        if self.numerals.chars().count() < 2 {
            return Err(CalcError::Config("numerals must contain at least 2 symbols".to_string()));
        }
        if self.output_accuracy == 0 {
            return Err(CalcError::Config("output_accuracy must be positive".to_string()));
        }
        Ok(())
    }

    /// Directory for the persistent caches and the saved result
    pub fn data_dir(&self) -> Option<PathBuf> {
        if !self.use_cache {
            return None;
        }
        self.data_dir.clone().or_else(|| home_dir().map(|h| h.join(".cache").join("rpn")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let cfg = Config::from_toml("").unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.output_accuracy, 12);
        assert_eq!(cfg.numerals.len(), 62);
    }

    #[test]
    fn test_partial_file() {
        let cfg = Config::from_toml("output_accuracy = 20\ncomma = true\n").unwrap();
        assert_eq!(cfg.output_accuracy, 20);
        assert!(cfg.comma);
        assert_eq!(cfg.line_length, 80);
        assert!(Config::from_toml("input_radix = 99").is_err());
        assert!(Config::from_toml("output_radix = \"fib\"").is_ok());
        assert!(Config::from_toml("output_accuracy = \"many\"").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "line_length = 40").unwrap();
        writeln!(f, "use_cache = false").unwrap();
        let cfg = Config::load(Some(&path)).unwrap();
        assert_eq!(cfg.line_length, 40);
        assert_eq!(cfg.data_dir(), None);
        let missing = Config::load(Some(&dir.path().join("nope.toml"))).unwrap();
        assert_eq!(missing, Config::default());
    }
}
