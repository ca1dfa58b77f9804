use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{Signed, ToPrimitive, Zero};

use crate::errors::*;
use crate::item::*;
use crate::operators::{Arg, OperatorInfo, Registry};
use crate::session::Session;

const UNITS: [&str; 20] = [
    "", "one", "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven", "twelve", "thirteen",
    "fourteen", "fifteen", "sixteen", "seventeen", "eighteen", "nineteen",
];

const UNITS_ORDINAL: [&str; 20] = [
    "", "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth", "tenth", "eleventh",
    "twelfth", "thirteenth", "fourteenth", "fifteenth", "sixteenth", "seventeenth", "eighteenth", "nineteenth",
];

const TENS: [&str; 10] = ["", "", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty", "ninety"];

const TENS_ORDINAL: [&str; 10] =
    ["", "", "twentieth", "thirtieth", "fortieth", "fiftieth", "sixtieth", "seventieth", "eightieth", "ninetieth"];

const GROUPS: [&str; 12] = [
    "", "thousand", "million", "billion", "trillion", "quadrillion", "quintillion", "sextillion", "septillion",
    "octillion", "nonillion", "decillion",
];

// Latin prefixes for the larger groups. The second field lists the letters
// the preceding ones prefix may take before it
const LATIN_ONES: [&str; 10] = ["", "un", "duo", "tre", "quattuor", "quinqua", "se", "septe", "octo", "nove"];

const LATIN_TENS: [(&str, &str); 10] = [
    ("", ""),
    ("deci", "n"),
    ("viginti", "ms"),
    ("triginta", "ns"),
    ("quadraginta", "ns"),
    ("quinquaginta", "ns"),
    ("sexaginta", "n"),
    ("septuaginta", "n"),
    ("octoginta", "mx"),
    ("nonaginta", ""),
];

const LATIN_HUNDREDS: [(&str, &str); 10] = [
    ("", ""),
    ("centi", "nx"),
    ("ducenti", "n"),
    ("trecenti", "ns"),
    ("quadringenti", "ns"),
    ("quingenti", "ns"),
    ("sescenti", "n"),
    ("septingenti", "n"),
    ("octingenti", "mx"),
    ("nongenti", ""),
];

/// Largest group that has a name: 10^3003
const MAX_GROUP: usize = 1000;

fn modified_ones(name: &str, code: &str) -> String {
    let suffix = match name {
        "septe" | "nove" if code.contains('n') => "n",
        "septe" | "nove" if code.contains('m') => "m",
        "tre" | "se" if code.contains('s') => "s",
        "tre" if code.contains('x') => "s",
        "se" if code.contains('x') => "x",
        _ => "",
    };
    format!("{}{}", name, suffix)
}

/// Name of the nth group of three digits: "thousand", "million", ...
fn group_name(n: usize) -> String {
    if n < GROUPS.len() {
        return GROUPS[n].to_string();
    }
    let n = n - 1;
    let (hundreds, tens, ones) = (n / 100, (n / 10) % 10, n % 10);
    let mut name = LATIN_ONES[ones].to_string();
    if tens > 0 {
        if !name.is_empty() {
            name = modified_ones(&name, LATIN_TENS[tens].1);
        }
        name += LATIN_TENS[tens].0;
    }
    if hundreds > 0 {
        if tens == 0 {
            name = modified_ones(&name, LATIN_HUNDREDS[hundreds].1);
        }
        name += LATIN_HUNDREDS[hundreds].0;
    }
    if name.ends_with('a') || name.ends_with('i') {
        name.pop();
    }
    name + "illion"
}

/// Name of a number between 0 and 999; empty for 0
fn small_name(n: usize, ordinal: bool) -> String {
    let (hundreds, tens, ones) = (n / 100, (n / 10) % 10, n % 10);
    let mut words = Vec::new();
    if hundreds > 0 {
        let th = if ordinal && tens == 0 && ones == 0 { "th" } else { "" };
        words.push(format!("{} hundred{}", UNITS[hundreds], th));
    }
    let units = if ordinal { &UNITS_ORDINAL } else { &UNITS };
    if tens > 1 {
        if ones == 0 {
            words.push((if ordinal { TENS_ORDINAL[tens] } else { TENS[tens] }).to_string());
        } else {
            words.push(format!("{}-{}", TENS[tens], units[ones]));
        }
    } else if tens == 1 || ones > 0 {
        words.push(units[tens * 10 + ones].to_string());
    }
    words.join(" ")
}

/// English words for an integer, cardinal or ordinal
pub fn number_name(n: &BigInt, ordinal: bool) -> Result<String, CalcError> {
    if n.is_zero() {
        return Ok(if ordinal { "zeroth" } else { "zero" }.to_string());
    }
    let mut current = n.abs();
    let thousand = BigInt::from(1000);
    let mut sections = Vec::new();
    let mut group = 0;
    while !current.is_zero() {
        if group > MAX_GROUP {
            return Err(CalcError::ArgumentOutOfRange("name".to_string(), n.to_string(), "below 10^3003".to_string()));
        }
        let (rest, section) = current.div_rem(&thousand);
        let section = section.to_usize().unwrap_or(0);
        if section != 0 {
            let last = sections.is_empty();
            let mut words = small_name(section, ordinal && last && group == 0);
            let gname = group_name(group);
            if !gname.is_empty() {
                words = format!("{} {}", words, gname);
                if ordinal && last {
                    words += "th";
                }
            }
            sections.push(words);
        }
        current = rest;
        group += 1;
    }
    sections.reverse();
    let name = sections.join(" ");
    Ok(if n.is_negative() { format!("negative {}", name) } else { name })
}

fn name_item(item: &Item, op: &str, ordinal: bool) -> ItemResult {
    let (value, units) = match item {
        Item::Measure(m) => {
            let one = m.value.to_bigint(op)?.abs() == BigInt::from(1);
            (&m.value, Some(m.units.display_name(!one)))
        }
        _ => (item.number(op)?, None),
    };
    let mut name = number_name(&value.to_bigint(op)?, ordinal)?;
    if let Some(units) = units {
        name = format!("{} {}", name, units);
    }
    Ok(Item::Text(name))
}

fn name(_: &mut Session, args: &[Item]) -> ItemResult {
    name_item(&args[0], "name", false)
}

fn ordinal_name(_: &mut Session, args: &[Item]) -> ItemResult {
    name_item(&args[0], "ordinal_name", true)
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    let cat = "conversion";
    reg.add(OperatorInfo::new("name", &[Scalar], cat, "returns the English name of an integer", name));
    reg.add(OperatorInfo::new("ordinal_name", &[Scalar], cat, "returns the English ordinal name of an integer", ordinal_name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name_of(n: i64) -> String {
        number_name(&BigInt::from(n), false).unwrap()
    }

    fn ordinal_of(n: i64) -> String {
        number_name(&BigInt::from(n), true).unwrap()
    }

    #[test]
    fn test_cardinal() {
        assert_eq!(name_of(0), "zero");
        assert_eq!(name_of(7), "seven");
        assert_eq!(name_of(15), "fifteen");
        assert_eq!(name_of(40), "forty");
        assert_eq!(name_of(123), "one hundred twenty-three");
        assert_eq!(name_of(1000), "one thousand");
        assert_eq!(name_of(1_000_001), "one million one");
        assert_eq!(name_of(-2_500_000), "negative two million five hundred thousand");
        assert_eq!(name_of(9_007_199_254_740_993), "nine quadrillion seven trillion one hundred ninety-nine billion two hundred fifty-four million seven hundred forty thousand nine hundred ninety-three");
    }

    #[test]
    fn test_ordinal() {
        assert_eq!(ordinal_of(0), "zeroth");
        assert_eq!(ordinal_of(1), "first");
        assert_eq!(ordinal_of(12), "twelfth");
        assert_eq!(ordinal_of(20), "twentieth");
        assert_eq!(ordinal_of(23), "twenty-third");
        assert_eq!(ordinal_of(100), "one hundredth");
        assert_eq!(ordinal_of(1000), "one thousandth");
        assert_eq!(ordinal_of(1001), "one thousand first");
    }

    #[test]
    fn test_group_names() {
        assert_eq!(group_name(11), "decillion");
        assert_eq!(group_name(12), "undecillion");
        assert_eq!(group_name(21), "vigintillion");
        assert_eq!(group_name(22), "unvigintillion");
        assert_eq!(group_name(28), "septemvigintillion");
        assert_eq!(group_name(101), "centillion");
    }

    #[test]
    fn test_operator() {
        let mut s = Session::new();
        let res = crate::stack::evaluate(&["123", "name"], &mut s).unwrap();
        assert_eq!(res.to_string(), "one hundred twenty-three");
        let res = crate::stack::evaluate(&["3", "ordinal_name"], &mut s).unwrap();
        assert_eq!(res.to_string(), "third");
    }
}
