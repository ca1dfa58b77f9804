use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;
use std::fmt;

use lazy_static::lazy_static;

use crate::errors::*;

/// Number of base dimensions:
/// length, mass, time, current, temperature, amount, luminous intensity,
/// angle, information
pub const DIMENSIONS: usize = 9;
pub type Dims = [i32; DIMENSIONS];

const LENGTH: Dims = [1, 0, 0, 0, 0, 0, 0, 0, 0];
const MASS: Dims = [0, 1, 0, 0, 0, 0, 0, 0, 0];
const TIME: Dims = [0, 0, 1, 0, 0, 0, 0, 0, 0];
const CURRENT: Dims = [0, 0, 0, 1, 0, 0, 0, 0, 0];
const TEMPERATURE: Dims = [0, 0, 0, 0, 1, 0, 0, 0, 0];
const AMOUNT: Dims = [0, 0, 0, 0, 0, 1, 0, 0, 0];
const LUMINOUS: Dims = [0, 0, 0, 0, 0, 0, 1, 0, 0];
const ANGLE: Dims = [0, 0, 0, 0, 0, 0, 0, 1, 0];
const INFORMATION: Dims = [0, 0, 0, 0, 0, 0, 0, 0, 1];
const NONE: Dims = [0; DIMENSIONS];

/// Physical quantity kind: a name and its dimension vector
pub struct UnitType {
    pub name: &'static str,
    pub dims: Dims,
    pub base_unit: &'static str,
}

pub static UNIT_TYPES: &[UnitType] = &[
    UnitType { name: "acceleration", dims: [1, 0, -2, 0, 0, 0, 0, 0, 0], base_unit: "meter/second^2" },
    UnitType { name: "amount_of_substance", dims: AMOUNT, base_unit: "mole" },
    UnitType { name: "angle", dims: ANGLE, base_unit: "radian" },
    UnitType { name: "area", dims: [2, 0, 0, 0, 0, 0, 0, 0, 0], base_unit: "meter^2" },
    UnitType { name: "charge", dims: [0, 0, 1, 1, 0, 0, 0, 0, 0], base_unit: "coulomb" },
    UnitType { name: "constant", dims: NONE, base_unit: "unity" },
    UnitType { name: "current", dims: CURRENT, base_unit: "ampere" },
    UnitType { name: "data_rate", dims: [0, 0, -1, 0, 0, 0, 0, 0, 1], base_unit: "bit/second" },
    UnitType { name: "electric_potential", dims: [2, 1, -3, -1, 0, 0, 0, 0, 0], base_unit: "volt" },
    UnitType { name: "electrical_resistance", dims: [2, 1, -3, -2, 0, 0, 0, 0, 0], base_unit: "ohm" },
    UnitType { name: "energy", dims: [2, 1, -2, 0, 0, 0, 0, 0, 0], base_unit: "joule" },
    UnitType { name: "force", dims: [1, 1, -2, 0, 0, 0, 0, 0, 0], base_unit: "newton" },
    UnitType { name: "frequency", dims: [0, 0, -1, 0, 0, 0, 0, 0, 0], base_unit: "hertz" },
    UnitType { name: "information_entropy", dims: INFORMATION, base_unit: "bit" },
    UnitType { name: "length", dims: LENGTH, base_unit: "meter" },
    UnitType { name: "luminous_intensity", dims: LUMINOUS, base_unit: "candela" },
    UnitType { name: "mass", dims: MASS, base_unit: "kilogram" },
    UnitType { name: "power", dims: [2, 1, -3, 0, 0, 0, 0, 0, 0], base_unit: "watt" },
    UnitType { name: "pressure", dims: [-1, 1, -2, 0, 0, 0, 0, 0, 0], base_unit: "pascal" },
    UnitType { name: "temperature", dims: TEMPERATURE, base_unit: "kelvin" },
    UnitType { name: "time", dims: TIME, base_unit: "second" },
    UnitType { name: "velocity", dims: [1, 0, -1, 0, 0, 0, 0, 0, 0], base_unit: "meter/second" },
    UnitType { name: "volume", dims: [3, 0, 0, 0, 0, 0, 0, 0, 0], base_unit: "meter^3" },
];

#[derive(Clone, Copy, PartialEq)]
enum Prefixes {
    No,
    Metric,
    Data,
}

// name, plural, abbreviations, unit type, factor to the coherent SI unit, prefixes
struct UnitDef(&'static str, &'static str, &'static str, &'static str, f64, Prefixes);

const GALLON: f64 = 0.003_785_411_784;
const POUND: f64 = 0.453_592_37;

static UNIT_DEFS: &[UnitDef] = &[
    // length
    UnitDef("meter", "meters", "m", "length", 1.0, Prefixes::Metric),
    UnitDef("foot", "feet", "ft", "length", 0.3048, Prefixes::No),
    UnitDef("inch", "inches", "in", "length", 0.0254, Prefixes::No),
    UnitDef("yard", "yards", "yd", "length", 0.9144, Prefixes::No),
    UnitDef("mile", "miles", "mi", "length", 1609.344, Prefixes::No),
    UnitDef("nautical_mile", "nautical_miles", "nmi", "length", 1852.0, Prefixes::No),
    UnitDef("angstrom", "angstroms", "", "length", 1e-10, Prefixes::No),
    UnitDef("light_year", "light_years", "ly", "length", 9_460_730_472_580_800.0, Prefixes::No),
    UnitDef("parsec", "parsecs", "pc", "length", 3.085_677_581_491_367e16, Prefixes::Metric),
    UnitDef("astronomical_unit", "astronomical_units", "au", "length", 149_597_870_700.0, Prefixes::No),
    UnitDef("furlong", "furlongs", "", "length", 201.168, Prefixes::No),
    UnitDef("fathom", "fathoms", "", "length", 1.8288, Prefixes::No),
    UnitDef("rod", "rods", "", "length", 5.0292, Prefixes::No),
    UnitDef("chain", "chains", "", "length", 20.1168, Prefixes::No),
    UnitDef("league", "leagues", "", "length", 4828.032, Prefixes::No),
    UnitDef("point", "points", "", "length", 0.0254 / 72.0, Prefixes::No),
    UnitDef("pica", "picas", "", "length", 0.0254 / 6.0, Prefixes::No),
    // mass
    UnitDef("gram", "grams", "g", "mass", 0.001, Prefixes::Metric),
    UnitDef("pound", "pounds", "lb lbs", "mass", POUND, Prefixes::No),
    UnitDef("ounce", "ounces", "oz", "mass", POUND / 16.0, Prefixes::No),
    UnitDef("ton", "tons", "", "mass", POUND * 2000.0, Prefixes::No),
    UnitDef("tonne", "tonnes", "t", "mass", 1000.0, Prefixes::No),
    UnitDef("stone", "stones", "st", "mass", POUND * 14.0, Prefixes::No),
    UnitDef("grain", "grains", "gr", "mass", POUND / 7000.0, Prefixes::No),
    UnitDef("carat", "carats", "ct", "mass", 0.0002, Prefixes::No),
    UnitDef("troy_ounce", "troy_ounces", "ozt", "mass", 0.031_103_476_8, Prefixes::No),
    UnitDef("dalton", "daltons", "Da", "mass", 1.660_539_066_60e-27, Prefixes::No),
    // time
    UnitDef("second", "seconds", "s", "time", 1.0, Prefixes::Metric),
    UnitDef("minute", "minutes", "", "time", 60.0, Prefixes::No),
    UnitDef("hour", "hours", "hr", "time", 3600.0, Prefixes::No),
    UnitDef("day", "days", "", "time", 86400.0, Prefixes::No),
    UnitDef("week", "weeks", "wk", "time", 604_800.0, Prefixes::No),
    UnitDef("fortnight", "fortnights", "", "time", 1_209_600.0, Prefixes::No),
    UnitDef("month", "months", "mo", "time", 2_629_800.0, Prefixes::No),
    UnitDef("year", "years", "yr", "time", 31_557_600.0, Prefixes::No),
    UnitDef("decade", "decades", "", "time", 315_576_000.0, Prefixes::No),
    UnitDef("century", "centuries", "", "time", 3_155_760_000.0, Prefixes::No),
    UnitDef("millennium", "millennia", "", "time", 31_557_600_000.0, Prefixes::No),
    // electricity
    UnitDef("ampere", "amperes", "A amp amps", "current", 1.0, Prefixes::Metric),
    UnitDef("coulomb", "coulombs", "C", "charge", 1.0, Prefixes::Metric),
    UnitDef("volt", "volts", "V", "electric_potential", 1.0, Prefixes::Metric),
    UnitDef("ohm", "ohms", "", "electrical_resistance", 1.0, Prefixes::Metric),
    // temperature, see TEMPERATURE_OFFSETS
    UnitDef("kelvin", "kelvins", "K", "temperature", 1.0, Prefixes::Metric),
    UnitDef("celsius", "celsius", "degC", "temperature", 1.0, Prefixes::No),
    UnitDef("fahrenheit", "fahrenheit", "degF", "temperature", 5.0 / 9.0, Prefixes::No),
    UnitDef("rankine", "rankine", "degR", "temperature", 5.0 / 9.0, Prefixes::No),
    UnitDef("reaumur", "reaumur", "degRe", "temperature", 1.25, Prefixes::No),
    UnitDef("delisle", "delisle", "degDe", "temperature", -2.0 / 3.0, Prefixes::No),
    UnitDef("newton_degree", "newton_degrees", "degN", "temperature", 100.0 / 33.0, Prefixes::No),
    UnitDef("romer", "romer", "degRo", "temperature", 40.0 / 21.0, Prefixes::No),
    // other base units
    UnitDef("mole", "moles", "mol", "amount_of_substance", 1.0, Prefixes::Metric),
    UnitDef("candela", "candelas", "cd", "luminous_intensity", 1.0, Prefixes::Metric),
    // angle
    UnitDef("radian", "radians", "rad", "angle", 1.0, Prefixes::No),
    UnitDef("degree", "degrees", "deg", "angle", PI / 180.0, Prefixes::No),
    UnitDef("arcminute", "arcminutes", "arcmin", "angle", PI / 10800.0, Prefixes::No),
    UnitDef("arcsecond", "arcseconds", "arcsec", "angle", PI / 648_000.0, Prefixes::No),
    UnitDef("gradian", "gradians", "grad", "angle", PI / 200.0, Prefixes::No),
    UnitDef("turn", "turns", "rev", "angle", 2.0 * PI, Prefixes::No),
    // information
    UnitDef("bit", "bits", "", "information_entropy", 1.0, Prefixes::Data),
    UnitDef("byte", "bytes", "B", "information_entropy", 8.0, Prefixes::Data),
    UnitDef("nibble", "nibbles", "", "information_entropy", 4.0, Prefixes::No),
    // area
    UnitDef("acre", "acres", "ac", "area", 4046.856_422_4, Prefixes::No),
    UnitDef("are", "ares", "", "area", 100.0, Prefixes::No),
    UnitDef("hectare", "hectares", "ha", "area", 10_000.0, Prefixes::No),
    UnitDef("barn", "barns", "", "area", 1e-28, Prefixes::No),
    // volume
    UnitDef("liter", "liters", "l L", "volume", 0.001, Prefixes::Metric),
    UnitDef("gallon", "gallons", "gal", "volume", GALLON, Prefixes::No),
    UnitDef("quart", "quarts", "qt", "volume", GALLON / 4.0, Prefixes::No),
    UnitDef("pint", "pints", "pt", "volume", GALLON / 8.0, Prefixes::No),
    UnitDef("cup", "cups", "", "volume", GALLON / 16.0, Prefixes::No),
    UnitDef("gill", "gills", "", "volume", GALLON / 32.0, Prefixes::No),
    UnitDef("fluid_ounce", "fluid_ounces", "floz", "volume", GALLON / 128.0, Prefixes::No),
    UnitDef("tablespoon", "tablespoons", "tbsp", "volume", GALLON / 256.0, Prefixes::No),
    UnitDef("teaspoon", "teaspoons", "tsp", "volume", GALLON / 768.0, Prefixes::No),
    UnitDef("barrel", "barrels", "bbl", "volume", GALLON * 42.0, Prefixes::No),
    UnitDef("imperial_gallon", "imperial_gallons", "", "volume", 0.004_546_09, Prefixes::No),
    // velocity and acceleration
    UnitDef("mile_per_hour", "miles_per_hour", "mph", "velocity", 0.447_04, Prefixes::No),
    UnitDef("knot", "knots", "kt", "velocity", 1852.0 / 3600.0, Prefixes::No),
    UnitDef("mach", "mach", "", "velocity", 340.29, Prefixes::No),
    UnitDef("gee", "gees", "", "acceleration", 9.806_65, Prefixes::No),
    // mechanics
    UnitDef("newton", "newtons", "N", "force", 1.0, Prefixes::Metric),
    UnitDef("dyne", "dynes", "dyn", "force", 1e-5, Prefixes::No),
    UnitDef("pound_force", "pounds_force", "lbf", "force", 4.448_221_615_260_5, Prefixes::No),
    UnitDef("poundal", "poundals", "pdl", "force", 0.138_254_954_376, Prefixes::No),
    UnitDef("joule", "joules", "J", "energy", 1.0, Prefixes::Metric),
    UnitDef("calorie", "calories", "cal", "energy", 4.184, Prefixes::Metric),
    UnitDef("btu", "btus", "BTU", "energy", 1055.055_852_62, Prefixes::No),
    UnitDef("electron_volt", "electron_volts", "eV", "energy", 1.602_176_634e-19, Prefixes::Metric),
    UnitDef("erg", "ergs", "", "energy", 1e-7, Prefixes::No),
    UnitDef("watt_hour", "watt_hours", "Wh", "energy", 3600.0, Prefixes::Metric),
    UnitDef("therm", "therms", "", "energy", 105_505_585.262, Prefixes::No),
    UnitDef("watt", "watts", "W", "power", 1.0, Prefixes::Metric),
    UnitDef("horsepower", "horsepower", "hp", "power", 745.699_871_582_270_2, Prefixes::No),
    UnitDef("pascal", "pascals", "Pa", "pressure", 1.0, Prefixes::Metric),
    UnitDef("atmosphere", "atmospheres", "atm", "pressure", 101_325.0, Prefixes::No),
    UnitDef("bar", "bars", "", "pressure", 100_000.0, Prefixes::Metric),
    UnitDef("psi", "psi", "", "pressure", 6894.757_293_168, Prefixes::No),
    UnitDef("torr", "torr", "", "pressure", 133.322_368_421, Prefixes::No),
    UnitDef("mmhg", "mmhg", "", "pressure", 133.322_387_415, Prefixes::No),
    UnitDef("hertz", "hertz", "Hz", "frequency", 1.0, Prefixes::Metric),
    // plain numbers
    UnitDef("unity", "unities", "", "constant", 1.0, Prefixes::No),
    UnitDef("pair", "pairs", "", "constant", 2.0, Prefixes::No),
    UnitDef("dozen", "dozens", "", "constant", 12.0, Prefixes::No),
    UnitDef("score", "scores", "", "constant", 20.0, Prefixes::No),
    UnitDef("gross", "gross", "", "constant", 144.0, Prefixes::No),
    UnitDef("hundred", "hundreds", "", "constant", 100.0, Prefixes::No),
    UnitDef("thousand", "thousands", "", "constant", 1e3, Prefixes::No),
    UnitDef("million", "millions", "", "constant", 1e6, Prefixes::No),
    UnitDef("billion", "billions", "", "constant", 1e9, Prefixes::No),
    UnitDef("trillion", "trillions", "", "constant", 1e12, Prefixes::No),
    UnitDef("percent", "percent", "", "constant", 0.01, Prefixes::No),
    UnitDef("permille", "permille", "", "constant", 0.001, Prefixes::No),
    UnitDef("ppm", "ppm", "", "constant", 1e-6, Prefixes::No),
    UnitDef("ppb", "ppb", "", "constant", 1e-9, Prefixes::No),
];

// kelvin = value * factor + offset
static TEMPERATURE_OFFSETS: &[(&str, f64)] = &[
    ("celsius", 273.15),
    ("fahrenheit", 459.67 * 5.0 / 9.0),
    ("reaumur", 273.15),
    ("delisle", 373.15),
    ("newton_degree", 273.15),
    ("romer", 273.15 - 7.5 * 40.0 / 21.0),
];

static METRIC_PREFIXES: &[(&str, &str, f64)] = &[
    ("yotta", "Y", 1e24),
    ("zetta", "Z", 1e21),
    ("exa", "E", 1e18),
    ("peta", "P", 1e15),
    ("tera", "T", 1e12),
    ("giga", "G", 1e9),
    ("mega", "M", 1e6),
    ("kilo", "k", 1e3),
    ("hecto", "h", 1e2),
    ("deca", "da", 1e1),
    ("deci", "d", 1e-1),
    ("centi", "c", 1e-2),
    ("milli", "m", 1e-3),
    ("micro", "u", 1e-6),
    ("nano", "n", 1e-9),
    ("pico", "p", 1e-12),
    ("femto", "f", 1e-15),
    ("atto", "a", 1e-18),
    ("zepto", "z", 1e-21),
    ("yocto", "y", 1e-24),
];

static BINARY_PREFIXES: &[(&str, &str, i32)] = &[
    ("kibi", "Ki", 10),
    ("mebi", "Mi", 20),
    ("gibi", "Gi", 30),
    ("tebi", "Ti", 40),
    ("pebi", "Pi", 50),
    ("exbi", "Ei", 60),
    ("zebi", "Zi", 70),
    ("yobi", "Yi", 80),
];

/// Description of a single named unit
#[derive(Debug, Clone)]
pub struct UnitInfo {
    pub name: String,
    pub plural: String,
    pub abbrevs: Vec<String>,
    pub unit_type: &'static str,
    pub dims: Dims,
    pub factor: f64,
    pub offset: f64,
}

fn type_dims(name: &str) -> Dims {
    UNIT_TYPES.iter().find(|t| t.name == name).map(|t| t.dims).unwrap_or(NONE)
}

fn build_units() -> Vec<UnitInfo> {
    let mut units = Vec::new();
    for def in UNIT_DEFS {
        let UnitDef(name, plural, abbrevs, unit_type, factor, _) = *def;
        let offset = TEMPERATURE_OFFSETS.iter().find(|(n, _)| *n == name).map(|(_, o)| *o).unwrap_or(0.0);
        units.push(UnitInfo {
            name: name.to_string(),
            plural: plural.to_string(),
            abbrevs: abbrevs.split_whitespace().map(|s| s.to_string()).collect(),
            unit_type,
            dims: type_dims(unit_type),
            factor,
            offset,
        });
    }

    // prefixed units come after all base units, so base abbreviations win
    for def in UNIT_DEFS {
        let UnitDef(name, plural, abbrevs, unit_type, factor, prefixes) = *def;
        if prefixes == Prefixes::No {
            continue;
        }
        let mut add = |pname: &str, psym: &str, mult: f64| {
            units.push(UnitInfo {
                name: format!("{}{}", pname, name),
                plural: format!("{}{}", pname, plural),
                abbrevs: abbrevs.split_whitespace().map(|a| format!("{}{}", psym, a)).collect(),
                unit_type,
                dims: type_dims(unit_type),
                factor: factor * mult,
                offset: 0.0,
            });
        };
        match prefixes {
            Prefixes::Metric => {
                for (pname, psym, mult) in METRIC_PREFIXES {
                    add(pname, psym, *mult);
                }
            }
            Prefixes::Data => {
                for (pname, psym, mult) in METRIC_PREFIXES.iter().take(8) {
                    add(pname, psym, *mult);
                }
                for (pname, psym, bits) in BINARY_PREFIXES {
                    add(pname, psym, 2f64.powi(*bits));
                }
            }
            Prefixes::No => {}
        }
    }
    units
}

lazy_static! {
    pub static ref UNITS: Vec<UnitInfo> = build_units();
    // every spelling of a unit mapped to its index in UNITS
    static ref UNIT_NAMES: HashMap<String, usize> = {
        let mut names = HashMap::new();
        for (idx, u) in UNITS.iter().enumerate() {
            names.entry(u.name.clone()).or_insert(idx);
        }
        for (idx, u) in UNITS.iter().enumerate() {
            names.entry(u.plural.clone()).or_insert(idx);
        }
        for (idx, u) in UNITS.iter().enumerate() {
            for a in &u.abbrevs {
                names.entry(a.clone()).or_insert(idx);
            }
        }
        names
    };
}

/// Finds a unit by its name, plural or abbreviation
pub fn lookup_unit(term: &str) -> Option<&'static UnitInfo> {
    if let Some(idx) = UNIT_NAMES.get(term) {
        return Some(&UNITS[*idx]);
    }
    let low = term.to_lowercase();
    if low != term {
        // names and plurals are case insensitive, abbreviations are not
        if let Some(idx) = UNIT_NAMES.get(&low) {
            let u = &UNITS[*idx];
            if u.name == low || u.plural == low {
                return Some(u);
            }
        }
    }
    None
}

fn unit_info(name: &str) -> Result<&'static UnitInfo, CalcError> {
    lookup_unit(name).ok_or_else(|| CalcError::UndefinedUnit(name.to_string()))
}

/// Units of all types with the given name
pub fn units_of_type(unit_type: &str) -> Vec<&'static UnitInfo> {
    UNITS.iter().filter(|u| u.unit_type == unit_type).collect()
}

pub fn unit_type(name: &str) -> Option<&'static UnitType> {
    UNIT_TYPES.iter().find(|t| t.name == name)
}

/// Product of units raised to integer powers, keyed by unit name
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Units(BTreeMap<String, i32>);

impl Units {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn single(name: &str) -> Self {
        let mut map = BTreeMap::new();
        map.insert(name.to_string(), 1);
        Units(map)
    }

    /// Parses a unit expression: `meter/second^2`, `foot*pound`, `meter^2`.
    /// Everything after the first `/` is in the denominator
    pub fn parse(expr: &str) -> Result<Units, CalcError> {
        let mut units = Units::new();
        let mut parts = expr.splitn(2, '/');
        let numer = parts.next().unwrap_or("");
        let denom = parts.next().unwrap_or("");
        for (text, sign) in [(numer, 1), (denom, -1)] {
            for piece in text.split('*').filter(|p| !p.is_empty()) {
                let (name, exp) = match piece.find('^') {
                    Some(pos) => {
                        let exp = piece[pos + 1..]
                            .parse::<i32>()
                            .map_err(|_| CalcError::UndefinedUnit(expr.to_string()))?;
                        (&piece[..pos], exp)
                    }
                    None => (piece, 1),
                };
                let info = unit_info(name)?;
                units.add(&info.name, exp * sign);
            }
        }
        if units.is_empty() {
            return Err(CalcError::UndefinedUnit(expr.to_string()));
        }
        Ok(units)
    }

    fn add(&mut self, name: &str, exp: i32) {
        let e = self.0.entry(name.to_string()).or_insert(0);
        *e += exp;
        if *e == 0 {
            self.0.remove(name);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &i32)> {
        self.0.iter()
    }

    pub fn multiply(&self, other: &Units) -> Units {
        let mut res = self.clone();
        for (name, exp) in other.iter() {
            res.add(name, *exp);
        }
        res
    }

    pub fn divide(&self, other: &Units) -> Units {
        self.multiply(&other.power(-1))
    }

    pub fn power(&self, n: i32) -> Units {
        if n == 0 {
            return Units::new();
        }
        Units(self.0.iter().map(|(k, v)| (k.clone(), v * n)).collect())
    }

    pub fn dims(&self) -> Result<Dims, CalcError> {
        let mut dims = NONE;
        for (name, exp) in self.iter() {
            let info = unit_info(name)?;
            for (d, ud) in dims.iter_mut().zip(info.dims.iter()) {
                *d += ud * exp;
            }
        }
        Ok(dims)
    }

    /// Conversion factor to coherent SI units
    pub fn factor(&self) -> Result<f64, CalcError> {
        let mut factor = 1.0;
        for (name, exp) in self.iter() {
            factor *= unit_info(name)?.factor.powi(*exp);
        }
        Ok(factor)
    }

    /// Temperature offset of a lone temperature unit
    pub fn temperature_offset(&self) -> Option<(f64, f64)> {
        if self.0.len() != 1 {
            return None;
        }
        let (name, exp) = self.0.iter().next()?;
        let info = lookup_unit(name)?;
        if *exp == 1 && info.unit_type == "temperature" {
            Some((info.factor, info.offset))
        } else {
            None
        }
    }

    /// Name of the unit type these units measure, if any
    pub fn unit_type(&self) -> Option<&'static str> {
        let dims = self.dims().ok()?;
        if self.0.len() == 1 {
            let name = self.0.keys().next()?;
            if let Some(info) = lookup_unit(name) {
                if self.0[name] == 1 {
                    return Some(info.unit_type);
                }
            }
        }
        UNIT_TYPES.iter().find(|t| t.dims == dims).map(|t| t.name)
    }

    pub fn is_dimensionless(&self) -> bool {
        matches!(self.dims(), Ok(d) if d == NONE)
    }

    /// Human readable form: `meters per second^2`, `foot-pounds`
    pub fn display_name(&self, plural: bool) -> String {
        let numer: Vec<(&String, i32)> = self.iter().filter(|(_, e)| **e > 0).map(|(n, e)| (n, *e)).collect();
        let denom: Vec<(&String, i32)> = self.iter().filter(|(_, e)| **e < 0).map(|(n, e)| (n, -*e)).collect();

        let with_exp = |name: String, exp: i32| {
            if exp == 1 {
                name
            } else {
                format!("{}^{}", name, exp)
            }
        };

        let mut parts = Vec::new();
        for (idx, (name, exp)) in numer.iter().enumerate() {
            let last = idx + 1 == numer.len();
            let spelled = match lookup_unit(name) {
                Some(info) if plural && last => info.plural.clone(),
                _ => (*name).clone(),
            };
            parts.push(with_exp(spelled, *exp));
        }
        let mut out = parts.join("-");
        for (name, exp) in denom {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str("per ");
            out.push_str(&with_exp(name.clone(), exp));
        }
        out.replace('_', " ")
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let fmt_part = |name: &String, exp: i32| {
            if exp == 1 {
                name.clone()
            } else {
                format!("{}^{}", name, exp)
            }
        };
        let numer: Vec<String> = self.iter().filter(|(_, e)| **e > 0).map(|(n, e)| fmt_part(n, *e)).collect();
        let denom: Vec<String> = self.iter().filter(|(_, e)| **e < 0).map(|(n, e)| fmt_part(n, -*e)).collect();
        write!(f, "{}", numer.join("*"))?;
        if !denom.is_empty() {
            write!(f, "/{}", denom.join("*"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup_unit("miles").map(|u| u.name.as_str()), Some("mile"));
        assert_eq!(lookup_unit("km").map(|u| u.name.as_str()), Some("kilometer"));
        assert_eq!(lookup_unit("Meters").map(|u| u.name.as_str()), Some("meter"));
        assert_eq!(lookup_unit("KiB").map(|u| u.name.as_str()), Some("kibibyte"));
        assert_eq!(lookup_unit("m").map(|u| u.name.as_str()), Some("meter"));
        assert!(lookup_unit("M").is_none());
        assert!(lookup_unit("florp").is_none());
    }

    #[test]
    fn test_parse_and_format() {
        let u = Units::parse("meter/second^2").unwrap();
        assert_eq!(u.to_string(), "meter/second^2");
        assert_eq!(u.unit_type(), Some("acceleration"));
        assert_eq!(u.display_name(true), "meters per second^2");
        let u = Units::parse("ft*lb").unwrap();
        assert_eq!(u.to_string(), "foot*pound");
        assert_eq!(u.display_name(true), "foot-pounds");
        assert!(Units::parse("meter/florp").is_err());
    }

    #[test]
    fn test_algebra() {
        let m = Units::single("meter");
        let s = Units::single("second");
        let v = m.divide(&s);
        assert_eq!(v.unit_type(), Some("velocity"));
        assert_eq!(v.multiply(&s), m);
        assert_eq!(m.power(2).to_string(), "meter^2");
        assert!(m.divide(&Units::single("foot")).is_dimensionless());
        assert_eq!(Units::single("light_year").display_name(true), "light years");
    }
}
