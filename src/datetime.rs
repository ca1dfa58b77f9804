use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::*;
use crate::item::*;
use crate::measurement::Measurement;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::units::Units;
use crate::value::*;

const SECONDS_PER_DAY: i64 = 86_400;

pub static WEEKDAY_NAMES: [&str; 7] = ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"];
pub static MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Point in time (UTC, proleptic Gregorian calendar) with one second resolution
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct DateTime {
    secs: i64,
    has_time: bool,
}

/// Days since 1970-01-01 of a civil date
pub fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = month as i64;
    let mp = if m > 2 { m - 3 } else { m + 9 };
    let doy = (153 * mp + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Civil date (year, month, day) of a day number
pub fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}

pub fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i64, month: u32) -> u32 {
    match month {
        2 if is_leap_year(year) => 29,
        2 => 28,
        4 | 6 | 9 | 11 => 30,
        _ => 31,
    }
}

/// Number of ISO weeks in a year, 52 or 53
pub fn iso_weeks(year: i64) -> i64 {
    DateTime::from_date(year, 12, 28).iso_date().1
}

fn check_date(year: i64, month: i64, day: i64) -> Result<(), CalcError> {
    if !(1..=12).contains(&month) {
        return Err(CalcError::InvalidDate(format!("month {}", month)));
    }
    if day < 1 || day > days_in_month(year, month as u32) as i64 {
        return Err(CalcError::InvalidDate(format!("day {}", day)));
    }
    Ok(())
}

impl DateTime {
    pub fn from_date(year: i64, month: u32, day: u32) -> Self {
        DateTime { secs: days_from_civil(year, month, day) * SECONDS_PER_DAY, has_time: false }
    }

    pub fn from_parts(parts: &[i64]) -> Result<Self, CalcError> {
        let get = |idx: usize, default: i64| parts.get(idx).copied().unwrap_or(default);
        let (year, month, day) = (get(0, 1970), get(1, 1), get(2, 1));
        check_date(year, month, day)?;
        let (hour, minute, second) = (get(3, 0), get(4, 0), get(5, 0));
        if !(0..24).contains(&hour) || !(0..60).contains(&minute) || !(0..60).contains(&second) {
            return Err(CalcError::InvalidDate(format!("{}:{}:{}", hour, minute, second)));
        }
        let mut dt = DateTime::from_date(year, month as u32, day as u32);
        dt.secs += hour * 3600 + minute * 60 + second;
        dt.has_time = parts.len() > 3;
        Ok(dt)
    }

    pub fn from_unix(secs: i64) -> Self {
        DateTime { secs, has_time: true }
    }

    pub fn now() -> Self {
        let secs = match SystemTime::now().duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        };
        DateTime::from_unix(secs)
    }

    pub fn today() -> Self {
        let now = DateTime::now();
        DateTime { secs: now.days() * SECONDS_PER_DAY, has_time: false }
    }

    pub fn unix(&self) -> i64 {
        self.secs
    }

    pub fn days(&self) -> i64 {
        self.secs.div_euclid(SECONDS_PER_DAY)
    }

    pub fn date(&self) -> (i64, u32, u32) {
        civil_from_days(self.days())
    }

    pub fn year(&self) -> i64 {
        self.date().0
    }

    pub fn time(&self) -> (i64, i64, i64) {
        let s = self.secs.rem_euclid(SECONDS_PER_DAY);
        (s / 3600, s / 60 % 60, s % 60)
    }

    /// ISO weekday: Monday is 1, Sunday is 7
    pub fn weekday(&self) -> u32 {
        ((self.days() + 3).rem_euclid(7) + 1) as u32
    }

    pub fn day_of_year(&self) -> i64 {
        let (y, _, _) = self.date();
        self.days() - days_from_civil(y, 1, 1) + 1
    }

    /// ISO year, week number and weekday
    pub fn iso_date(&self) -> (i64, i64, u32) {
        let wd = self.weekday();
        // the Thursday of the same week decides the ISO year
        let thursday = DateTime::from_days(self.days() - wd as i64 + 4);
        let iso_year = thursday.year();
        let week = (thursday.day_of_year() - 1) / 7 + 1;
        (iso_year, week, wd)
    }

    fn from_days(days: i64) -> Self {
        DateTime { secs: days * SECONDS_PER_DAY, has_time: false }
    }

    pub fn add_seconds(&self, secs: i64) -> Self {
        DateTime { secs: self.secs + secs, has_time: self.has_time || secs % SECONDS_PER_DAY != 0 }
    }

    pub fn add_months(&self, months: i64) -> Result<Self, CalcError> {
        let (y, m, d) = self.date();
        let total = y * 12 + (m as i64 - 1) + months;
        let year = total.div_euclid(12);
        let month = (total.rem_euclid(12) + 1) as u32;
        let day = d.min(days_in_month(year, month));
        let rest = self.secs.rem_euclid(SECONDS_PER_DAY);
        let mut dt = DateTime::from_date(year, month, day);
        dt.secs += rest;
        dt.has_time = self.has_time;
        Ok(dt)
    }

    /// Adds a time measurement. Whole months and years move the calendar
    pub fn add_duration(&self, m: &Measurement) -> Result<Self, CalcError> {
        let single = m.units.iter().next().map(|(n, e)| (n.as_str(), *e));
        if m.units.iter().count() == 1 && m.value.is_integer() {
            match single {
                Some(("month", 1)) => return self.add_months(m.value.to_i64("add")?),
                Some(("year", 1)) => return self.add_months(m.value.to_i64("add")? * 12),
                _ => {}
            }
        }
        let secs = m.convert_value(&Units::single("second"))?.round()?.to_i64("add")?;
        Ok(self.add_seconds(secs))
    }

    /// Difference between two dates as a measurement in days
    pub fn difference(&self, other: &DateTime) -> Result<Measurement, CalcError> {
        let secs = Value::from(self.secs - other.secs);
        let days = secs.div(Value::from(SECONDS_PER_DAY))?;
        Ok(Measurement::new(days, Units::single("day")))
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let (y, m, d) = self.date();
        write!(f, "{:04}-{:02}-{:02}", y, m, d)?;
        if self.has_time {
            let (hh, mm, ss) = self.time();
            write!(f, " {:02}:{:02}:{:02}", hh, mm, ss)?;
        }
        Ok(())
    }
}

/// Date of Easter Sunday (anonymous Gregorian algorithm)
pub fn easter(year: i64) -> DateTime {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15).rem_euclid(30);
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k).rem_euclid(7);
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    DateTime::from_date(year, month as u32, day as u32)
}

/// nth given weekday of a month; negative `n` counts from the end of the month
pub fn nth_weekday(year: i64, month: u32, n: i64, weekday: u32) -> Result<DateTime, CalcError> {
    if n == 0 || !(1..=7).contains(&weekday) || !(1..=12).contains(&month) {
        return Err(CalcError::InvalidDate(format!("{} {} {} {}", year, month, n, weekday)));
    }
    if n > 0 {
        let first = DateTime::from_date(year, month, 1);
        let shift = (weekday as i64 - first.weekday() as i64).rem_euclid(7);
        let day = 1 + shift + (n - 1) * 7;
        if day > days_in_month(year, month) as i64 {
            return Err(CalcError::InvalidDate(format!("week {} of {}-{:02}", n, year, month)));
        }
        Ok(DateTime::from_date(year, month, day as u32))
    } else {
        let last_day = days_in_month(year, month);
        let last = DateTime::from_date(year, month, last_day);
        let shift = (last.weekday() as i64 - weekday as i64).rem_euclid(7);
        let day = last_day as i64 - shift + (n + 1) * 7;
        if day < 1 {
            return Err(CalcError::InvalidDate(format!("week {} of {}-{:02}", n, year, month)));
        }
        Ok(DateTime::from_date(year, month, day as u32))
    }
}

/// nth given weekday of a year; negative `n` counts from the end of the year
pub fn nth_weekday_of_year(year: i64, n: i64, weekday: u32) -> Result<DateTime, CalcError> {
    if n == 0 || !(1..=7).contains(&weekday) {
        return Err(CalcError::InvalidDate(format!("{} {} {}", year, n, weekday)));
    }
    let days = if n > 0 {
        let first = DateTime::from_date(year, 1, 1);
        first.days() + (weekday as i64 - first.weekday() as i64).rem_euclid(7) + (n - 1) * 7
    } else {
        let last = DateTime::from_date(year, 12, 31);
        last.days() - (last.weekday() as i64 - weekday as i64).rem_euclid(7) + (n + 1) * 7
    };
    let dt = DateTime::from_days(days);
    if dt.year() != year {
        return Err(CalcError::InvalidDate(format!("week {} of {}", n, year)));
    }
    Ok(dt)
}

/// Text calendar of the month containing the date
pub fn month_calendar(dt: &DateTime) -> String {
    let (year, month, _) = dt.date();
    let mut out = format!("{:^20}\n", format!("{} {}", MONTH_NAMES[month as usize - 1], year));
    out.push_str("Su Mo Tu We Th Fr Sa\n");
    let first = DateTime::from_date(year, month, 1).weekday() % 7;
    let mut line = "   ".repeat(first as usize);
    let mut column = first;
    for day in 1..=days_in_month(year, month) {
        line.push_str(&format!("{:2}", day));
        column += 1;
        if column == 7 {
            out.push_str(line.trim_end());
            out.push('\n');
            line.clear();
            column = 0;
        } else {
            line.push(' ');
        }
    }
    if !line.is_empty() {
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out.trim_end().to_string()
}

pub(crate) fn time_arg(item: &Item, op: &str) -> Result<DateTime, CalcError> {
    match item {
        Item::Time(t) => Ok(*t),
        _ => Err(CalcError::InvalidArgument(op.to_string(), item.to_string())),
    }
}

pub(crate) fn year_arg(item: &Item, op: &str) -> Result<i64, CalcError> {
    match item {
        Item::Time(t) => Ok(t.year()),
        _ => item.to_i64(op),
    }
}

fn int_list(item: &Item, op: &str) -> Result<Vec<i64>, CalcError> {
    item.list(op)?.iter().map(|i| i.to_i64(op)).collect()
}

fn today(_: &mut Session, _: &[Item]) -> ItemResult {
    Ok(Item::Time(DateTime::today()))
}

fn now(_: &mut Session, _: &[Item]) -> ItemResult {
    Ok(Item::Time(DateTime::now()))
}

fn maketime(_: &mut Session, args: &[Item]) -> ItemResult {
    let parts = int_list(&args[0], "maketime")?;
    if parts.is_empty() || parts.len() > 6 {
        return Err(CalcError::InvalidArgument("maketime".to_string(), args[0].to_string()));
    }
    Ok(Item::Time(DateTime::from_parts(&parts)?))
}

fn makeisotime(_: &mut Session, args: &[Item]) -> ItemResult {
    let parts = int_list(&args[0], "makeisotime")?;
    if parts.len() != 3 || !(1..=7).contains(&parts[2]) {
        return Err(CalcError::InvalidArgument("makeisotime".to_string(), args[0].to_string()));
    }
    if parts[1] < 1 || parts[1] > iso_weeks(parts[0]) {
        return Err(CalcError::InvalidDate(format!("week {} of {}", parts[1], parts[0])));
    }
    // week 1 is the week with the year's first Thursday
    let jan4 = DateTime::from_date(parts[0], 1, 4);
    let monday = jan4.days() - (jan4.weekday() as i64 - 1);
    Ok(Item::Time(DateTime::from_days(monday + (parts[1] - 1) * 7 + parts[2] - 1)))
}

fn makejuliantime(_: &mut Session, args: &[Item]) -> ItemResult {
    let parts = int_list(&args[0], "makejuliantime")?;
    if parts.len() != 2 {
        return Err(CalcError::InvalidArgument("makejuliantime".to_string(), args[0].to_string()));
    }
    let days_in_year = if is_leap_year(parts[0]) { 366 } else { 365 };
    if !(1..=days_in_year).contains(&parts[1]) {
        return Err(CalcError::InvalidDate(format!("day {}", parts[1])));
    }
    Ok(Item::Time(DateTime::from_days(days_from_civil(parts[0], 1, 1) + parts[1] - 1)))
}

fn tounixtime(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::int(time_arg(&args[0], "tounixtime")?.unix()))
}

fn fromunixtime(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Time(DateTime::from_unix(args[0].to_i64("fromunixtime")?)))
}

fn weekday(_: &mut Session, args: &[Item]) -> ItemResult {
    let t = time_arg(&args[0], "weekday")?;
    Ok(Item::Text(WEEKDAY_NAMES[t.weekday() as usize - 1].to_string()))
}

fn iso_day(_: &mut Session, args: &[Item]) -> ItemResult {
    let (y, w, d) = time_arg(&args[0], "iso_day")?.iso_date();
    Ok(Item::List(vec![Item::int(y), Item::int(w), Item::int(d as i64)]))
}

fn julian_day(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::int(time_arg(&args[0], "julian_day")?.day_of_year()))
}

fn easter_op(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Time(easter(year_arg(&args[0], "easter")?)))
}

fn ash_wednesday(_: &mut Session, args: &[Item]) -> ItemResult {
    let e = easter(year_arg(&args[0], "ash_wednesday")?);
    Ok(Item::Time(DateTime::from_days(e.days() - 46)))
}

fn thanksgiving(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Time(nth_weekday(year_arg(&args[0], "thanksgiving")?, 11, 4, 4)?))
}

fn labor_day(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Time(nth_weekday(year_arg(&args[0], "labor_day")?, 9, 1, 1)?))
}

fn memorial_day(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Time(nth_weekday(year_arg(&args[0], "memorial_day")?, 5, -1, 1)?))
}

fn presidents_day(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Time(nth_weekday(year_arg(&args[0], "presidents_day")?, 2, 3, 1)?))
}

fn election_day(_: &mut Session, args: &[Item]) -> ItemResult {
    let monday = nth_weekday(year_arg(&args[0], "election_day")?, 11, 1, 1)?;
    Ok(Item::Time(DateTime::from_days(monday.days() + 1)))
}

fn dst_start(_: &mut Session, args: &[Item]) -> ItemResult {
    let year = year_arg(&args[0], "dst_start")?;
    let dt = if year >= 2007 { nth_weekday(year, 3, 2, 7)? } else { nth_weekday(year, 4, 1, 7)? };
    Ok(Item::Time(dt))
}

fn dst_end(_: &mut Session, args: &[Item]) -> ItemResult {
    let year = year_arg(&args[0], "dst_end")?;
    let dt = if year >= 2007 { nth_weekday(year, 11, 1, 7)? } else { nth_weekday(year, 10, -1, 7)? };
    Ok(Item::Time(dt))
}

fn nthweekday(_: &mut Session, args: &[Item]) -> ItemResult {
    let op = "nthweekday";
    let year = args[0].to_i64(op)?;
    let month = args[1].to_i64(op)?;
    let n = args[2].to_i64(op)?;
    let wd = args[3].to_i64(op)?;
    if !(1..=12).contains(&month) || !(1..=7).contains(&wd) {
        return Err(CalcError::InvalidDate(format!("{} {} {} {}", year, month, n, wd)));
    }
    Ok(Item::Time(nth_weekday(year, month as u32, n, wd as u32)?))
}

fn nthweekdayofyear(_: &mut Session, args: &[Item]) -> ItemResult {
    let op = "nthweekdayofyear";
    let wd = args[2].to_i64(op)?;
    if !(1..=7).contains(&wd) {
        return Err(CalcError::InvalidDate(format!("weekday {}", wd)));
    }
    Ok(Item::Time(nth_weekday_of_year(args[0].to_i64(op)?, args[1].to_i64(op)?, wd as u32)?))
}

fn calendar(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Text(month_calendar(&time_arg(&args[0], "calendar")?)))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "date_time";
    reg.add(OperatorInfo::new("today", &[], cat, "returns the current date", today));
    reg.add(OperatorInfo::new("now", &[], cat, "returns the current date and time", now));
    reg.add(OperatorInfo::new("maketime", &[List], cat, "creates a date-time from [ y m d h m s ]", maketime));
    reg.add(OperatorInfo::new("makeisotime", &[List], cat, "creates a date from [ year week day ]", makeisotime));
    reg.add(OperatorInfo::new(
        "makejuliantime",
        &[List],
        cat,
        "creates a date from [ year day_of_year ]",
        makejuliantime,
    ));
    reg.add(OperatorInfo::new("tounixtime", &[Scalar], cat, "converts a date-time to Unix time", tounixtime));
    reg.add(OperatorInfo::new("fromunixtime", &[Scalar], cat, "converts Unix time to a date-time", fromunixtime));
    reg.add(OperatorInfo::new("weekday", &[Scalar], cat, "returns the name of the day of the week", weekday));
    reg.add(OperatorInfo::new("iso_day", &[Scalar], cat, "returns the ISO [ year week day ] of a date", iso_day));
    reg.add(OperatorInfo::new("julian_day", &[Scalar], cat, "returns the day of the year of a date", julian_day));
    reg.add(OperatorInfo::new("easter", &[Scalar], cat, "calculates the date of Easter", easter_op));
    reg.add(OperatorInfo::new("ash_wednesday", &[Scalar], cat, "calculates the date of Ash Wednesday", ash_wednesday));
    reg.add(OperatorInfo::new("thanksgiving", &[Scalar], cat, "calculates the date of Thanksgiving", thanksgiving));
    reg.add(OperatorInfo::new("labor_day", &[Scalar], cat, "calculates the date of Labor Day", labor_day));
    reg.add(OperatorInfo::new("memorial_day", &[Scalar], cat, "calculates the date of Memorial Day", memorial_day));
    reg.add(OperatorInfo::new(
        "presidents_day",
        &[Scalar],
        cat,
        "calculates the date of Presidents Day",
        presidents_day,
    ));
    reg.add(OperatorInfo::new("election_day", &[Scalar], cat, "calculates the date of Election Day", election_day));
    reg.add(OperatorInfo::new("dst_start", &[Scalar], cat, "calculates the start of daylight saving time", dst_start));
    reg.add(OperatorInfo::new("dst_end", &[Scalar], cat, "calculates the end of daylight saving time", dst_end));
    reg.add(OperatorInfo::new(
        "nthweekday",
        &[Scalar, Scalar, Scalar, Scalar],
        cat,
        "finds the nth given weekday of a month",
        nthweekday,
    ));
    reg.add(OperatorInfo::new(
        "nthweekdayofyear",
        &[Scalar, Scalar, Scalar],
        cat,
        "finds the nth given weekday of a year",
        nthweekdayofyear,
    ));
    reg.add(OperatorInfo::new("calendar", &[Scalar], cat, "prints a month calendar", calendar));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_civil() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
        assert_eq!(civil_from_days(0), (1970, 1, 1));
        assert_eq!(civil_from_days(days_from_civil(2000, 2, 29)), (2000, 2, 29));
        assert_eq!(civil_from_days(-1), (1969, 12, 31));
        assert_eq!(DateTime::from_date(2024, 7, 4).weekday(), 4);
    }

    #[test]
    fn test_holidays() {
        assert_eq!(easter(2024).to_string(), "2024-03-31");
        assert_eq!(easter(2019).to_string(), "2019-04-21");
        assert_eq!(nth_weekday(2023, 11, 4, 4).unwrap().to_string(), "2023-11-23");
        assert_eq!(nth_weekday(2023, 5, -1, 1).unwrap().to_string(), "2023-05-29");
        assert!(nth_weekday(2023, 2, 5, 1).is_err());
        assert_eq!(nth_weekday_of_year(2023, 1, 1).unwrap().to_string(), "2023-01-02");
    }

    #[test]
    fn test_iso() {
        assert_eq!(DateTime::from_date(2021, 1, 3).iso_date(), (2020, 53, 7));
        assert_eq!(DateTime::from_date(2024, 12, 30).iso_date(), (2025, 1, 1));
        assert_eq!(DateTime::from_date(2024, 3, 1).day_of_year(), 61);
        assert_eq!(iso_weeks(2020), 53);
        assert_eq!(iso_weeks(2021), 52);
    }

    #[test]
    fn test_makeisotime() {
        let mut s = Session::new();
        let res = crate::stack::evaluate(&["[", "2020", "53", "7", "]", "makeisotime"], &mut s).unwrap();
        assert_eq!(res.to_string(), "2021-01-03");
        let res = crate::stack::evaluate(&["[", "2021", "1", "1", "]", "makeisotime"], &mut s).unwrap();
        assert_eq!(res.to_string(), "2021-01-04");
        assert!(crate::stack::evaluate(&["[", "2021", "53", "7", "]", "makeisotime"], &mut s).is_err());
    }

    #[test]
    fn test_arith() {
        let dt = DateTime::from_parts(&[2020, 1, 31]).unwrap();
        assert_eq!(dt.add_months(1).unwrap().to_string(), "2020-02-29");
        let m = Measurement::new(Value::from(36i64), Units::single("hour"));
        assert_eq!(dt.add_duration(&m).unwrap().to_string(), "2020-02-01 12:00:00");
        let later = DateTime::from_date(2020, 3, 1);
        let diff = later.difference(&dt).unwrap();
        assert_eq!(diff.value, Value::from(30i64));
        assert!(DateTime::from_parts(&[2021, 2, 29]).is_err());
    }

    #[test]
    fn test_calendar() {
        let cal = month_calendar(&DateTime::from_date(2024, 2, 10));
        let lines: Vec<&str> = cal.lines().collect();
        assert_eq!(lines[1], "Su Mo Tu We Th Fr Sa");
        assert_eq!(lines[2], "             1  2  3");
        assert_eq!(lines.len(), 7);
    }
}
