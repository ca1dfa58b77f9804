//! Seasons and lunar phases computed from the mean orbital elements with
//! their main periodic corrections (Meeus, Astronomical Algorithms,
//! chapters 27 and 49). Results are accurate to about a minute between the
//! years 1000 and 3000.

use crate::datetime::{time_arg, year_arg, DateTime};
use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::value::*;

const UNIX_EPOCH_JD: f64 = 2_440_587.5;
const SECONDS_PER_DAY: f64 = 86_400.0;
const SYNODIC_MONTH: f64 = 29.530_588_861;
const LUNATIONS_PER_YEAR: f64 = 12.3685;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Season {
    VernalEquinox,
    SummerSolstice,
    AutumnalEquinox,
    WinterSolstice,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MoonPhase {
    New,
    FirstQuarter,
    Full,
    LastQuarter,
}

impl MoonPhase {
    fn offset(self) -> f64 {
        match self {
            MoonPhase::New => 0.0,
            MoonPhase::FirstQuarter => 0.25,
            MoonPhase::Full => 0.5,
            MoonPhase::LastQuarter => 0.75,
        }
    }
}

// amplitude, phase and rate (degrees) of the periodic terms of the seasons
static SEASON_TERMS: &[(f64, f64, f64)] = &[
    (485.0, 324.96, 1934.136),
    (203.0, 337.23, 32964.467),
    (199.0, 342.08, 20.186),
    (182.0, 27.85, 445267.112),
    (156.0, 73.14, 45036.886),
    (136.0, 171.52, 22518.443),
    (77.0, 222.54, 65928.934),
    (74.0, 296.72, 3034.906),
    (70.0, 243.58, 9037.513),
    (58.0, 119.81, 33718.147),
    (52.0, 297.17, 150.678),
    (50.0, 21.02, 2281.226),
    (45.0, 247.54, 29929.562),
    (44.0, 325.15, 31555.956),
    (29.0, 60.93, 4443.417),
    (18.0, 155.12, 67555.328),
    (17.0, 288.79, 4562.452),
    (16.0, 198.04, 62894.029),
    (14.0, 199.76, 31436.921),
    (12.0, 95.39, 14577.848),
    (12.0, 287.11, 31931.756),
    (12.0, 320.81, 34777.259),
    (9.0, 227.73, 1222.114),
    (8.0, 15.45, 16859.074),
];

fn polynomial(coeffs: &[f64], x: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn cos_deg(x: f64) -> f64 {
    x.to_radians().cos()
}

/// Difference between dynamical and universal time in seconds
pub fn delta_t(year: f64) -> f64 {
    if (1961.0..1986.0).contains(&year) {
        let t = year - 1975.0;
        45.45 + 1.067 * t - t * t / 260.0 - t * t * t / 718.0
    } else if (1986.0..2005.0).contains(&year) {
        polynomial(&[63.86, 0.3345, -0.060374, 0.0017275, 0.000651814, 0.00002373599], year - 2000.0)
    } else if (2005.0..2050.0).contains(&year) {
        polynomial(&[62.92, 0.32217, 0.005589], year - 2000.0)
    } else {
        let u = (year - 1820.0) / 100.0;
        -20.0 + 32.0 * u * u
    }
}

fn from_julian_ephemeris(jde: f64, year: f64) -> DateTime {
    let secs = (jde - UNIX_EPOCH_JD) * SECONDS_PER_DAY - delta_t(year);
    DateTime::from_unix(secs.round() as i64)
}

/// Moment of an equinox or solstice of a year in -1000..=3000
pub fn season(year: i64, which: Season) -> Result<DateTime, CalcError> {
    let coeffs: [f64; 5] = match (year >= 1000, which) {
        (true, Season::VernalEquinox) => [2451623.80984, 365242.37404, 0.05169, -0.00411, -0.00057],
        (true, Season::SummerSolstice) => [2451716.56767, 365241.62603, 0.00325, 0.00888, -0.00030],
        (true, Season::AutumnalEquinox) => [2451810.21715, 365242.01767, -0.11575, 0.00337, 0.00078],
        (true, Season::WinterSolstice) => [2451900.05952, 365242.74049, -0.06223, -0.00823, 0.00032],
        (false, Season::VernalEquinox) => [1721139.29189, 365242.13740, 0.06134, 0.00111, -0.00071],
        (false, Season::SummerSolstice) => [1721233.25401, 365241.72562, -0.05323, 0.00907, 0.00025],
        (false, Season::AutumnalEquinox) => [1721325.70455, 365242.49558, -0.11677, -0.00297, 0.00074],
        (false, Season::WinterSolstice) => [1721414.39987, 365242.88257, -0.00769, -0.00933, -0.00006],
    };
    if !(-1000..=3000).contains(&year) {
        return Err(CalcError::ArgumentOutOfRange("season".to_string(), year.to_string(), "-1000..3000".to_string()));
    }
    let y = if year >= 1000 { (year as f64 - 2000.0) / 1000.0 } else { year as f64 / 1000.0 };
    let jde0 = polynomial(&coeffs, y);
    let t = (jde0 - 2_451_545.0) / 36525.0;
    let w = 35999.373 * t - 2.47;
    let lambda = 1.0 + 0.0334 * cos_deg(w) + 0.0007 * cos_deg(2.0 * w);
    let s: f64 = SEASON_TERMS.iter().map(|(a, b, c)| a * cos_deg(b + c * t)).sum();
    Ok(from_julian_ephemeris(jde0 + 0.00001 * s / lambda, year as f64))
}

/// Moment of lunation `k` (0 is the new moon of 2000-01-06) plus the phase offset
fn lunar_phase(k: f64, phase: MoonPhase) -> DateTime {
    let k = k + phase.offset();
    let t = k / 1236.85;
    let jde = 2_451_550.09766 + SYNODIC_MONTH * k + polynomial(&[0.0, 0.0, 0.00015437, -0.000000150, 0.00000000073], t);
    let e = polynomial(&[1.0, -0.002516, -0.0000074], t);
    let m = 2.5534 + 29.105_356_70 * k + polynomial(&[0.0, 0.0, -0.0000014, -0.00000011], t);
    let mp = 201.5643 + 385.816_935_28 * k + polynomial(&[0.0, 0.0, 0.0107582, 0.00001238, -0.000000058], t);
    let f = 160.7108 + 390.670_502_84 * k + polynomial(&[0.0, 0.0, -0.0016118, -0.00000227, 0.000000011], t);
    let om = 124.7746 - 1.563_755_88 * k + polynomial(&[0.0, 0.0, 0.0020672, 0.00000215], t);

    let correction = match phase {
        MoonPhase::New | MoonPhase::Full => {
            let (a, b, c, d, g, h) = if phase == MoonPhase::New {
                (-0.40720, 0.17241, 0.01608, 0.01039, 0.00739, -0.00514)
            } else {
                (-0.40614, 0.17302, 0.01614, 0.01043, 0.00734, -0.00515)
            };
            a * sin_deg(mp) + b * e * sin_deg(m) + c * sin_deg(2.0 * mp) + d * sin_deg(2.0 * f)
                + g * e * sin_deg(mp - m)
                + h * e * sin_deg(mp + m)
                + 0.00208 * e * e * sin_deg(2.0 * m)
                - 0.00111 * sin_deg(mp - 2.0 * f)
                - 0.00057 * sin_deg(mp + 2.0 * f)
                + 0.00056 * e * sin_deg(2.0 * mp + m)
                - 0.00042 * sin_deg(3.0 * mp)
                + 0.00042 * e * sin_deg(m + 2.0 * f)
                + 0.00038 * e * sin_deg(m - 2.0 * f)
                - 0.00024 * e * sin_deg(2.0 * mp - m)
                - 0.00017 * sin_deg(om)
        }
        MoonPhase::FirstQuarter | MoonPhase::LastQuarter => {
            let q = -0.62801 * sin_deg(mp) + 0.17172 * e * sin_deg(m) - 0.01183 * e * sin_deg(mp + m)
                + 0.00862 * sin_deg(2.0 * mp)
                + 0.00804 * sin_deg(2.0 * f)
                + 0.00454 * e * sin_deg(mp - m)
                + 0.00204 * e * e * sin_deg(2.0 * m)
                - 0.00180 * sin_deg(mp - 2.0 * f)
                - 0.00070 * sin_deg(mp + 2.0 * f)
                - 0.00040 * sin_deg(3.0 * mp)
                - 0.00034 * e * sin_deg(2.0 * mp - m)
                + 0.00032 * e * sin_deg(m + 2.0 * f)
                + 0.00032 * e * sin_deg(m - 2.0 * f)
                - 0.00028 * e * e * sin_deg(mp + 2.0 * m)
                + 0.00027 * e * sin_deg(2.0 * mp + m)
                - 0.00017 * sin_deg(om);
            let w = 0.00306 - 0.00038 * e * cos_deg(m) + 0.00026 * cos_deg(mp) - 0.00002 * cos_deg(mp - m)
                + 0.00002 * cos_deg(mp + m)
                + 0.00002 * cos_deg(2.0 * f);
            if phase == MoonPhase::FirstQuarter {
                q + w
            } else {
                q - w
            }
        }
    };
    // planetary arguments
    let planetary = 0.000325 * sin_deg(299.77 + 0.107408 * k - 0.009173 * t * t)
        + 0.000165 * sin_deg(251.88 + 0.016321 * k)
        + 0.000164 * sin_deg(251.83 + 26.651886 * k)
        + 0.000126 * sin_deg(349.42 + 36.412478 * k)
        + 0.000110 * sin_deg(84.66 + 18.206239 * k);
    from_julian_ephemeris(jde + correction + planetary, 2000.0 + k / LUNATIONS_PER_YEAR)
}

fn lunation_near(dt: &DateTime) -> f64 {
    let years = dt.unix() as f64 / (365.2425 * SECONDS_PER_DAY) + 1970.0;
    ((years - 2000.0) * LUNATIONS_PER_YEAR).floor()
}

/// First moment of the phase strictly after `dt`
pub fn next_phase(dt: &DateTime, phase: MoonPhase) -> DateTime {
    let mut k = lunation_near(dt) - 2.0;
    loop {
        let res = lunar_phase(k, phase);
        if res > *dt {
            return res;
        }
        k += 1.0;
    }
}

/// Last moment of the phase at or before `dt`
pub fn previous_phase(dt: &DateTime, phase: MoonPhase) -> DateTime {
    let mut k = lunation_near(dt) + 2.0;
    loop {
        let res = lunar_phase(k, phase);
        if res <= *dt {
            return res;
        }
        k -= 1.0;
    }
}

/// Fraction of the current lunation elapsed at `dt`, 0 at the new moon
pub fn moon_phase(dt: &DateTime) -> f64 {
    let previous = previous_phase(dt, MoonPhase::New);
    let next = next_phase(dt, MoonPhase::New);
    (dt.unix() - previous.unix()) as f64 / (next.unix() - previous.unix()) as f64
}

fn checked_date(item: &Item, op: &str) -> Result<DateTime, CalcError> {
    let dt = time_arg(item, op)?;
    if !(-1000..=3000).contains(&dt.year()) {
        return Err(CalcError::ArgumentOutOfRange(op.to_string(), dt.to_string(), "-1000..3000".to_string()));
    }
    Ok(dt)
}

macro_rules! season_op {
    ($func:ident, $season:expr) => {
        fn $func(_: &mut Session, args: &[Item]) -> ItemResult {
            let year = year_arg(&args[0], stringify!($func))?;
            season(year, $season).map(Item::Time).map_err(|e| match e {
                CalcError::ArgumentOutOfRange(_, val, range) => {
                    CalcError::ArgumentOutOfRange(stringify!($func).to_string(), val, range)
                }
                e => e,
            })
        }
    };
}

season_op!(vernal_equinox, Season::VernalEquinox);
season_op!(summer_solstice, Season::SummerSolstice);
season_op!(autumnal_equinox, Season::AutumnalEquinox);
season_op!(winter_solstice, Season::WinterSolstice);

macro_rules! phase_op {
    ($func:ident, $search:ident, $phase:expr) => {
        fn $func(_: &mut Session, args: &[Item]) -> ItemResult {
            let dt = checked_date(&args[0], stringify!($func))?;
            Ok(Item::Time($search(&dt, $phase)))
        }
    };
}

phase_op!(next_new_moon, next_phase, MoonPhase::New);
phase_op!(next_first_quarter_moon, next_phase, MoonPhase::FirstQuarter);
phase_op!(next_full_moon, next_phase, MoonPhase::Full);
phase_op!(next_last_quarter_moon, next_phase, MoonPhase::LastQuarter);
phase_op!(previous_new_moon, previous_phase, MoonPhase::New);
phase_op!(previous_first_quarter_moon, previous_phase, MoonPhase::FirstQuarter);
phase_op!(previous_full_moon, previous_phase, MoonPhase::Full);
phase_op!(previous_last_quarter_moon, previous_phase, MoonPhase::LastQuarter);

fn moon_phase_op(_: &mut Session, args: &[Item]) -> ItemResult {
    let dt = checked_date(&args[0], "moon_phase")?;
    Ok(Item::Number(Value::Float(moon_phase(&dt))))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "astronomy";
    reg.add(OperatorInfo::new("vernal_equinox", &[Scalar], cat, "returns the March equinox of a year", vernal_equinox));
    reg.add(OperatorInfo::new("summer_solstice", &[Scalar], cat, "returns the June solstice of a year", summer_solstice));
    reg.add(OperatorInfo::new(
        "autumnal_equinox",
        &[Scalar],
        cat,
        "returns the September equinox of a year",
        autumnal_equinox,
    ));
    reg.add(OperatorInfo::new("winter_solstice", &[Scalar], cat, "returns the December solstice of a year", winter_solstice));
    reg.add(OperatorInfo::new("next_new_moon", &[Scalar], cat, "returns the next new moon after a date", next_new_moon));
    reg.add(OperatorInfo::new(
        "next_first_quarter_moon",
        &[Scalar],
        cat,
        "returns the next first quarter moon after a date",
        next_first_quarter_moon,
    ));
    reg.add(OperatorInfo::new("next_full_moon", &[Scalar], cat, "returns the next full moon after a date", next_full_moon));
    reg.add(OperatorInfo::new(
        "next_last_quarter_moon",
        &[Scalar],
        cat,
        "returns the next last quarter moon after a date",
        next_last_quarter_moon,
    ));
    reg.add(OperatorInfo::new(
        "previous_new_moon",
        &[Scalar],
        cat,
        "returns the last new moon before a date",
        previous_new_moon,
    ));
    reg.add(OperatorInfo::new(
        "previous_first_quarter_moon",
        &[Scalar],
        cat,
        "returns the last first quarter moon before a date",
        previous_first_quarter_moon,
    ));
    reg.add(OperatorInfo::new(
        "previous_full_moon",
        &[Scalar],
        cat,
        "returns the last full moon before a date",
        previous_full_moon,
    ));
    reg.add(OperatorInfo::new(
        "previous_last_quarter_moon",
        &[Scalar],
        cat,
        "returns the last last quarter moon before a date",
        previous_last_quarter_moon,
    ));
    reg.add(OperatorInfo::new(
        "moon_phase",
        &[Scalar],
        cat,
        "returns the fraction of the lunar cycle elapsed at a date",
        moon_phase_op,
    ));
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

    fn at(parts: &[i64]) -> DateTime {
        DateTime::from_parts(parts).unwrap()
    }

    fn assert_close(got: DateTime, expected: DateTime, seconds: i64) {
        let diff = (got.unix() - expected.unix()).abs();
        assert!(diff <= seconds, "{} differs from {} by {} s", got, expected, diff);
    }

    #[test]
    fn test_seasons() {
        assert_close(season(2015, Season::VernalEquinox).unwrap(), at(&[2015, 3, 20, 22, 45]), 180);
        assert_close(season(2015, Season::SummerSolstice).unwrap(), at(&[2015, 6, 21, 16, 38]), 180);
        assert_close(season(2015, Season::AutumnalEquinox).unwrap(), at(&[2015, 9, 23, 8, 20]), 180);
        assert_close(season(2015, Season::WinterSolstice).unwrap(), at(&[2015, 12, 22, 4, 48]), 180);
        assert!(season(3001, Season::WinterSolstice).is_err());
        assert!(eval(&["2015", "vernal_equinox"]).starts_with("2015-03-20 22:4"));
        assert_eq!(
            eval(&["4000", "winter_solstice"]),
            "error in arg 2:  argument 4000 of 'winter_solstice' out of range (-1000..3000)"
        );
    }

    #[test]
    fn test_lunar_phases() {
        let dt = at(&[2015, 9, 10]);
        assert_close(next_phase(&dt, MoonPhase::New), at(&[2015, 9, 13, 6, 41]), 600);
        assert_close(next_phase(&dt, MoonPhase::FirstQuarter), at(&[2015, 9, 21, 8, 59]), 600);
        assert_close(next_phase(&dt, MoonPhase::Full), at(&[2015, 9, 28, 2, 50]), 600);
        assert_close(next_phase(&dt, MoonPhase::LastQuarter), at(&[2015, 10, 4, 21, 6]), 600);
        let dt = at(&[2015, 10, 1]);
        assert_close(previous_phase(&dt, MoonPhase::Full), at(&[2015, 9, 28, 2, 50]), 600);
        assert_close(previous_phase(&dt, MoonPhase::New), at(&[2015, 9, 13, 6, 41]), 600);
    }

    #[test]
    fn test_moon_phase() {
        let phase = moon_phase(&at(&[2015, 9, 28, 2, 50]));
        assert!((phase - 0.5).abs() < 0.01, "{}", phase);
        assert!(moon_phase(&at(&[2015, 9, 13, 8])) < 0.01);
        let phase: f64 = eval(&["[", "2015", "9", "21", "9", "]", "maketime", "moon_phase"]).parse().unwrap();
        assert!((phase - 0.27).abs() < 0.02, "{}", phase);
    }
}
