use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;
use crate::units::*;
use crate::value::*;

/// Number with attached units
#[derive(Clone, Debug, PartialEq)]
pub struct Measurement {
    pub value: Value,
    pub units: Units,
}

impl Measurement {
    pub fn new(value: Value, units: Units) -> Self {
        Measurement { value, units }
    }

    /// Collapses measurements without dimensions into plain numbers
    pub fn simplify(self) -> Item {
        if self.units.is_empty() {
            return Item::Number(self.value);
        }
        if self.units.is_dimensionless() {
            if let Ok(factor) = self.units.factor() {
                if let Ok(v) = self.value.clone().mul(Value::Float(factor).normalize()) {
                    return Item::Number(v);
                }
            }
        }
        Item::Measure(self)
    }

    /// Value of the measurement expressed in `target` units
    pub fn convert_value(&self, target: &Units) -> CalcResult {
        if self.units == *target {
            return Ok(self.value.clone());
        }
        if self.units.dims()? != target.dims()? {
            return Err(CalcError::IncompatibleUnits(self.units.to_string(), target.to_string()));
        }
        if let (Some((f1, o1)), Some((f2, o2))) = (self.units.temperature_offset(), target.temperature_offset()) {
            let kelvin = self.value.clone().to_f64("convert")? * f1 + o1;
            return Ok(Value::Float((kelvin - o2) / f2).normalize());
        }
        let ratio = self.units.factor()? / target.factor()?;
        self.value.clone().mul(Value::Float(ratio).normalize())
    }

    pub fn convert(&self, target: &Units) -> Result<Measurement, CalcError> {
        Ok(Measurement::new(self.convert_value(target)?, target.clone()))
    }

    /// Breaks the measurement into whole parts of every unit but the last,
    /// e.g. seconds into `[ day hour minute second ]`
    pub fn breakdown(&self, targets: &[Units]) -> Result<Vec<Measurement>, CalcError> {
        let last = match targets.last() {
            Some(u) => u,
            None => return Ok(Vec::new()),
        };
        let mut rest = self.convert_value(last)?;
        if let Value::Float(f) = rest {
            // conversion noise would turn 40 seconds into 39.9999...
            let r = f.round();
            if (f - r).abs() < 1e-9 * r.abs().max(1.0) {
                rest = Value::Float(r).normalize();
            }
        }

        let mut parts = Vec::with_capacity(targets.len());
        for unit in &targets[..targets.len() - 1] {
            let size = Measurement::new(Value::one(), unit.clone()).convert_value(last)?;
            let whole = rest.clone().div(size.clone())?.trunc()?;
            rest = rest.sub(whole.clone().mul(size)?)?;
            parts.push(Measurement::new(whole, unit.clone()));
        }
        parts.push(Measurement::new(rest, last.clone()));
        Ok(parts)
    }

    pub fn add(self, rhs: Measurement) -> ItemResult {
        let v = rhs.convert_value(&self.units)?;
        Ok(Measurement::new(self.value.add(v)?, self.units).into())
    }

    pub fn sub(self, rhs: Measurement) -> ItemResult {
        let v = rhs.convert_value(&self.units)?;
        Ok(Measurement::new(self.value.sub(v)?, self.units).into())
    }

    pub fn mul(self, rhs: Measurement) -> ItemResult {
        let units = self.units.multiply(&rhs.units);
        Ok(Measurement::new(self.value.mul(rhs.value)?, units).into())
    }

    pub fn div(self, rhs: Measurement) -> ItemResult {
        let units = self.units.divide(&rhs.units);
        Ok(Measurement::new(self.value.div(rhs.value)?, units).into())
    }

    pub fn power(self, exp: &Value) -> ItemResult {
        let n = exp.to_i64("power")?;
        let n32 = n as i32;
        let units = self.units.power(n32);
        Ok(Measurement::new(self.value.power(exp.clone())?, units).into())
    }

    /// Value in radians for angles, the plain value otherwise
    pub fn as_angle(&self, op: &str) -> CalcResult {
        if self.units.unit_type() == Some("angle") {
            return self.convert_value(&Units::single("radian"));
        }
        Err(CalcError::InvalidArgument(op.to_string(), self.units.to_string()))
    }
}

/// Units named by a conversion target: a unit, a measurement or a list of them
fn target_units(item: &Item) -> Result<Vec<Units>, CalcError> {
    match item {
        Item::Measure(m) => Ok(vec![m.units.clone()]),
        Item::Text(s) | Item::Name(s) => Ok(vec![Units::parse(s)?]),
        Item::List(items) => {
            let mut res = Vec::new();
            for i in items {
                res.extend(target_units(i)?);
            }
            Ok(res)
        }
        _ => Err(CalcError::InvalidArgument("convert".to_string(), item.to_string())),
    }
}

fn measurement_arg(item: &Item, op: &str) -> Result<Measurement, CalcError> {
    match item {
        Item::Measure(m) => Ok(m.clone()),
        _ => Err(CalcError::InvalidArgument(op.to_string(), item.to_string())),
    }
}

/// Converts a measurement into other units
pub fn convert(_: &mut Session, args: &[Item]) -> ItemResult {
    let m = measurement_arg(&args[0], "convert")?;
    let targets = target_units(&args[1])?;
    match targets.len() {
        0 => Err(CalcError::InvalidArgument("convert".to_string(), args[1].to_string())),
        1 => Ok(Item::Measure(m.convert(&targets[0])?)),
        _ => {
            let parts = m.breakdown(&targets)?;
            Ok(Item::List(parts.into_iter().map(Item::Measure).collect()))
        }
    }
}

fn breakdown_into(args: &[Item], op: &str, units: &[&str]) -> ItemResult {
    let m = measurement_arg(&args[0], op)?;
    let targets: Vec<Units> = units.iter().map(|u| Units::single(u)).collect();
    let parts = m.breakdown(&targets)?;
    Ok(Item::List(parts.into_iter().map(Item::Measure).collect()))
}

fn dhms(_: &mut Session, args: &[Item]) -> ItemResult {
    breakdown_into(args, "dhms", &["day", "hour", "minute", "second"])
}

fn hms(_: &mut Session, args: &[Item]) -> ItemResult {
    breakdown_into(args, "hms", &["hour", "minute", "second"])
}

fn ydhms(_: &mut Session, args: &[Item]) -> ItemResult {
    breakdown_into(args, "ydhms", &["year", "day", "hour", "minute", "second"])
}

fn dms(_: &mut Session, args: &[Item]) -> ItemResult {
    breakdown_into(args, "dms", &["degree", "arcminute", "arcsecond"])
}

/// Attaches units to a number, or counts the value of plain-number units
pub fn apply_unit(value: Value, units: &Units) -> ItemResult {
    if let Some("constant") = units.unit_type() {
        let factor = units.factor()?;
        return Ok(Item::Number(value.mul(Value::Float(factor).normalize())?));
    }
    Ok(Measurement::new(value, units.clone()).into())
}

fn unit_type_op(_: &mut Session, args: &[Item]) -> ItemResult {
    let m = measurement_arg(&args[0], "unit_type")?;
    match m.units.unit_type() {
        Some(t) => Ok(Item::Text(t.to_string())),
        None => Ok(Item::Text(m.units.to_string())),
    }
}

fn value_op(_: &mut Session, args: &[Item]) -> ItemResult {
    Ok(Item::Number(args[0].value("value")?.clone()))
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "conversion";
    reg.add(OperatorInfo::new("convert", &[Scalar, Any], cat, "performs unit conversion", convert));
    reg.add(OperatorInfo::new("dhms", &[Scalar], cat, "shortcut for '[ day hour minute second ] convert'", dhms));
    reg.add(OperatorInfo::new("hms", &[Scalar], cat, "shortcut for '[ hour minute second ] convert'", hms));
    reg.add(OperatorInfo::new(
        "ydhms",
        &[Scalar],
        cat,
        "shortcut for '[ year day hour minute second ] convert'",
        ydhms,
    ));
    reg.add(OperatorInfo::new("dms", &[Scalar], cat, "shortcut for '[ degree arcminute arcsecond ] convert'", dms));
    reg.add(OperatorInfo::new("unit_type", &[Scalar], cat, "returns the unit type of a measurement", unit_type_op));
    reg.add(OperatorInfo::new("value", &[Scalar], cat, "returns the numerical value of a measurement", value_op));
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigInt;

    fn measure(v: i64, unit: &str) -> Measurement {
        Measurement::new(Value::from(v), Units::parse(unit).unwrap())
    }

    #[test]
    fn test_convert() {
        let m = measure(10, "mile").convert(&Units::parse("km").unwrap()).unwrap();
        assert!(f64_equal(m.value.to_f64("").unwrap(), 16.09344));
        let m = measure(2, "gallon").convert(&Units::parse("cup").unwrap()).unwrap();
        assert_eq!(m.value, Value::Int(BigInt::from(32)));
        assert!(measure(2, "gallon").convert(&Units::parse("meter").unwrap()).is_err());
    }

    #[test]
    fn test_temperature() {
        let m = measure(100, "celsius").convert(&Units::single("fahrenheit")).unwrap();
        assert!(f64_equal(m.value.to_f64("").unwrap(), 212.0));
        let m = measure(0, "celsius").convert(&Units::single("kelvin")).unwrap();
        assert!(f64_equal(m.value.to_f64("").unwrap(), 273.15));
    }

    #[test]
    fn test_breakdown() {
        let targets: Vec<Units> = ["hour", "minute", "second"].iter().map(|u| Units::single(u)).collect();
        let parts = measure(3700, "second").breakdown(&targets).unwrap();
        let values: Vec<Value> = parts.into_iter().map(|m| m.value).collect();
        assert_eq!(values, vec![Value::from(1i64), Value::from(1i64), Value::from(40i64)]);
    }

    #[test]
    fn test_arith() {
        let sum = measure(1, "meter").add(measure(1, "foot")).unwrap();
        match sum {
            Item::Measure(m) => assert!(f64_equal(m.value.to_f64("").unwrap(), 1.3048)),
            _ => panic!("measurement expected"),
        }
        let ratio = measure(10, "meter").div(measure(2, "meter")).unwrap();
        assert_eq!(ratio, Item::int(5));
        let speed = measure(10, "meter").div(measure(2, "second")).unwrap();
        match speed {
            Item::Measure(m) => assert_eq!(m.units.unit_type(), Some("velocity")),
            _ => panic!("measurement expected"),
        }
        assert_eq!(apply_unit(Value::from(2i64), &Units::single("dozen")), Ok(Item::int(24)));
    }
}
