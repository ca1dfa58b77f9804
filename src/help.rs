//! Help texts: general topics, operator and category help, unit listings

use crate::item::*;
use crate::operators::{aliases_of, resolve_alias, Arg, OperatorInfo, Registry, REGISTRY};
use crate::output::wrap;
use crate::session::Session;
use crate::units::{lookup_unit, unit_type, units_of_type, UnitInfo, UNIT_TYPES};
use crate::value::format_f64;

pub const PROGRAM_NAME: &str = "rpn";
pub const PROGRAM_DESCRIPTION: &str = "RPN command-line calculator";
pub const PROGRAM_VERSION: &str = env!("CARGO_PKG_VERSION");

const UNIT_TYPES_TOPIC: &str = "unit_types";

const ABOUT: &str = "\
rpn is a command-line Reverse Polish Notation calculator. Operands are pushed on a stack and \
operators take their arguments from it, so '2 3 +' prints 5. Integers and rationals are exact, \
floats are IEEE doubles and complex numbers are supported throughout. Lists of operands, \
measurements with units and dates are first-class values.";

const OPTIONS: &str = "\
-a [n], --output_accuracy [n]: significant digits of decimal output (default 12)
-b n, --input_radix n: radix of input numbers, 2 to 62 (default 10)
-c, --comma: group integer digits by three with commas
-d [n], --decimal_grouping [n]: group fraction digits (default 5 when given without a value)
-g [n], --integer_grouping [n]: group integer digits (default 3 when given without a value)
-l n, --line_length n: line length used for wrapping (default 80)
-n str, --numerals str: symbols used for digits in non-decimal output
-o, --octal: octal output, same as -r8 -w9 -g3 -z
-p n, --precision n: fraction digits of non-decimal output (default 20)
-r n, --output_radix n: output radix, 2 to 62 or 'fib' (default 10)
-R n, --output_radix_numerals n: print each digit of base n as a decimal number
-s [n], --list_format_level [n]: print nested lists one item per line down to level n
-t, --timer: print the time taken by each evaluation
-w n, --bitwise_group_size n: bit group size for 'not' (default 16)
-x, --hex: hexadecimal output, same as -r16 -w16 -g4 -z
-z, --leading_zero: fill the first digit group with zeros
-D, --debug: print debug logging
-!, --print_options: print the resolved options before evaluating
--config path: read settings from this TOML file";

const ARGUMENTS: &str = "\
Numbers may be integers (1234, 1_234, 1,234), floats (1.5, .5, 2.5e10), complex numbers \
(3+4j, -2j), hexadecimal (0x1f), binary (1011b) or octal (017). A leading backslash forces a \
term to be read as a number in the input radix. '[' and ']' build lists, '$n' recalls the nth \
result of an interactive session and '$name' refers to a variable.";

const INPUT: &str = "\
Terms are read left to right. Operands are pushed on the stack, operators pop their arguments \
and push the result. An operator given a list where it expects a single value is applied to \
every element of the list. Two lists are paired element by element, the shorter list \
deciding the length of the result. Unit names attach units to the value before them.";

const OUTPUT: &str = "\
Decimal results are rounded to the output accuracy and switch to scientific notation when \
they are very large or very small. Integers are always printed exactly. The -r, -x and -o \
options select another radix and -g, -d and -c group digits. Complex numbers print as \
'( re + imj )' and lists as '[ a, b, c ]'.";

const UNIT_CONVERSION: &str = "\
Measurements are numbers with units: '10 miles'. 'convert' changes units: \
'10 miles km convert' prints 16.09344 kilometers. The target may be a list of units, \
'100000 seconds [ day hour minute second ] convert'. Compound units are written as \
'meter/second^2' and arithmetic on measurements combines their units.";

const USER_FUNCTIONS: &str = "\
A function is written with the variables x, y and z followed by the terms of its body and \
closed by an operator that uses it: '1 10 range x 2 ** eval' squares the numbers from 1 to 10. \
'filter', 'nsum' and 'nprod' apply functions to ranges and lists.";

const INTERACTIVE_MODE: &str = "\
rpn starts an interactive session when no terms are given. Every line is evaluated as an \
expression, its result numbered and available as '$n'. 'help' enters help mode, where \
'topics' lists the topics, and 'exit' or 'quit' leaves the session.";

const METRIC: &str = "\
All metric prefixes from yocto to yotta and the binary prefixes from kibi to yobi can be \
combined with metric units: 'kilometer', 'mg', 'gibibyte'.";

const NOTES: &str = "\
Settings changed with 'accuracy', 'comma' and similar operators last for the rest of the \
session. 'hex_mode', 'octal_mode', 'comma_mode', 'leading_zero_mode' and 'timer_mode' apply \
to the current expression only. Prime and factor caches are kept in the data directory \
between runs.";

static TOPICS: &[(&str, &str)] = &[
    ("about", ABOUT),
    ("arguments", ARGUMENTS),
    ("input", INPUT),
    ("interactive_mode", INTERACTIVE_MODE),
    ("metric", METRIC),
    ("notes", NOTES),
    ("options", OPTIONS),
    ("output", OUTPUT),
    ("unit_conversion", UNIT_CONVERSION),
    ("user_functions", USER_FUNCTIONS),
];

fn topic_text(name: &str) -> Option<&'static str> {
    TOPICS.iter().find(|(t, _)| *t == name).map(|(_, text)| *text)
}

/// Wraps text to the line width, indenting every line
fn paragraph(text: &str, indent: usize, width: usize) -> Vec<String> {
    let pad = " ".repeat(indent);
    text.lines()
        .flat_map(|line| {
            let wrapped = wrap(&format!("{}{}", pad, line), width.saturating_sub(1));
            wrapped.lines().map(String::from).collect::<Vec<_>>()
        })
        .collect()
}

pub fn title_screen() -> Vec<String> {
    vec![
        format!("{} {} - {}", PROGRAM_NAME, PROGRAM_VERSION, PROGRAM_DESCRIPTION),
        String::new(),
        "Type \"help\" for more information, and \"exit\" to exit.".to_string(),
    ]
}

fn topic_lists(width: usize) -> Vec<String> {
    let mut topics: Vec<&str> = TOPICS.iter().map(|(t, _)| *t).collect();
    topics.push(UNIT_TYPES_TOPIC);
    topics.sort_unstable();

    let mut lines = vec!["The following is a list of general topics:".to_string(), String::new()];
    lines.extend(paragraph(&topics.join(", "), 4, width));
    lines.push(String::new());
    lines.push("The following is a list of operator categories:".to_string());
    lines.push(String::new());
    lines.extend(paragraph(&REGISTRY.categories().join(", "), 4, width));
    lines
}

pub fn general_help(width: usize) -> Vec<String> {
    let mut lines = vec![format!("{} {} - {}", PROGRAM_NAME, PROGRAM_VERSION, PROGRAM_DESCRIPTION), String::new()];
    lines.extend(paragraph(
        "For help on a specific topic, use 'rpn help' and add a help topic, an operator category, an operator or a unit name.",
        0,
        width,
    ));
    lines.push(String::new());
    lines.extend(topic_lists(width));
    lines
}

/// Help listing for interactive mode and the `topic` operator
pub fn interactive_help(width: usize) -> Vec<String> {
    let mut lines = paragraph(
        "For help on a specific topic, use the topic operator with a general topic, an operator category, an operator or a unit name.",
        0,
        width,
    );
    lines.push(String::new());
    lines.extend(topic_lists(width));
    lines
}

pub fn help_mode_help() -> String {
    "rpn help mode - 'topics' for a list of topics, 'exit' to return to rpn".to_string()
}

fn with_aliases(name: &str) -> String {
    let aliases = aliases_of(name);
    if aliases.is_empty() {
        name.to_string()
    } else {
        format!("{} ({})", name, aliases.join(", "))
    }
}

fn operator_help(info: &OperatorInfo, width: usize) -> Vec<String> {
    let mut lines = vec![format!("{}{} - {}", info.args_prefix(), info.name, info.brief), String::new()];
    let aliases = aliases_of(info.name);
    match aliases.len() {
        0 => {}
        1 => lines.push(format!("alias:  {}", aliases[0])),
        _ => lines.extend(paragraph(&format!("aliases:  {}", aliases.join(", ")), 0, width)),
    }
    lines.push(format!("category: {}", info.category));
    lines
}

fn category_help(category: &str, width: usize) -> Vec<String> {
    let mut lines = paragraph(
        &format!("The {} category includes the following operators (with aliases in parentheses):", category),
        0,
        width,
    );
    lines.push(String::new());
    lines.extend(REGISTRY.iter().filter(|op| op.category == category).map(|op| with_aliases(op.name)));
    lines
}

fn unit_name(unit: &UnitInfo) -> String {
    if unit.abbrevs.is_empty() {
        unit.name.clone()
    } else {
        format!("{} ({})", unit.name, unit.abbrevs.join(", "))
    }
}

fn unit_types_help(width: usize) -> Vec<String> {
    let names: Vec<&str> = UNIT_TYPES.iter().map(|t| t.name).collect();
    paragraph(&names.join(", "), 4, width)
}

fn unit_type_help(unit_type: &str) -> Vec<String> {
    let mut units: Vec<String> = units_of_type(unit_type).into_iter().map(unit_name).collect();
    units.sort();
    units.into_iter().map(|u| format!("    {}", u)).collect()
}

fn factor_text(x: f64) -> String {
    if x.fract() == 0.0 && x.abs() < 1e15 {
        (x as i64).to_string()
    } else {
        format_f64(x)
    }
}

/// Name, spellings, unit type and size in the base unit of the type
fn unit_help(unit: &UnitInfo, width: usize) -> Vec<String> {
    let base = unit_type(unit.unit_type).map(|t| t.base_unit).unwrap_or("");
    let mut lines = vec![unit.name.replace('_', " "), String::new()];
    lines.push(format!("plural:  {}", unit.plural.replace('_', " ")));
    if !unit.abbrevs.is_empty() {
        lines.push(format!("abbreviations:  {}", unit.abbrevs.join(", ")));
    }
    lines.push(format!("unit type:  {}", unit.unit_type));
    lines.push(String::new());
    let text = if unit.name == base {
        format!("'{}' is the base unit of {}.", unit.name, unit.unit_type)
    } else if unit.offset != 0.0 {
        format!("x {} = x * {} + {} {}", unit.plural.replace('_', " "), factor_text(unit.factor), factor_text(unit.offset), base)
    } else {
        format!("1 {} = {} {}", unit.name.replace('_', " "), factor_text(unit.factor), base)
    };
    lines.extend(paragraph(&text, 0, width));
    lines
}

fn is_category(reg: &Registry, name: &str) -> bool {
    reg.categories().iter().any(|c| *c == name)
}

/// Help for a single term: an operator or alias, a topic, a category,
/// `unit_types`, a unit type or a unit. Unknown terms are matched as prefixes
pub fn help(term: &str, width: usize) -> Vec<String> {
    if term.is_empty() {
        return general_help(width);
    }
    let name = resolve_alias(term);
    if let Some(info) = REGISTRY.get(name) {
        return operator_help(info, width);
    }
    if let Some(text) = topic_text(name) {
        return paragraph(text, 0, width);
    }
    if is_category(&REGISTRY, name) {
        return category_help(name, width);
    }
    if name == UNIT_TYPES_TOPIC {
        return unit_types_help(width);
    }
    if UNIT_TYPES.iter().any(|t| t.name == name) {
        return unit_type_help(name);
    }
    if let Some(unit) = lookup_unit(term) {
        return unit_help(unit, width);
    }

    let interpreting = |found: &str| format!("Interpreting topic as '{}'.", found);
    if UNIT_TYPES_TOPIC.starts_with(term) {
        let mut lines = vec![interpreting(UNIT_TYPES_TOPIC)];
        lines.extend(unit_types_help(width));
        return lines;
    }
    if let Some(t) = UNIT_TYPES.iter().find(|t| t.name.starts_with(term)) {
        let mut lines = vec![interpreting(t.name)];
        lines.extend(unit_type_help(t.name));
        return lines;
    }
    if let Some(op) = REGISTRY.iter().find(|op| op.name.starts_with(term)) {
        let mut lines = vec![interpreting(op.name), String::new()];
        lines.extend(operator_help(op, width));
        return lines;
    }
    if let Some(&(topic, text)) = TOPICS.iter().find(|(t, _)| t.starts_with(term)) {
        let mut lines = vec![interpreting(topic), String::new()];
        lines.extend(paragraph(text, 0, width));
        return lines;
    }
    if let Some(cat) = REGISTRY.categories().into_iter().find(|c| c.starts_with(term)) {
        let mut lines = vec![interpreting(cat), String::new()];
        lines.extend(category_help(cat, width));
        return lines;
    }
    vec!["Help topic not found.".to_string()]
}

/// Prints help from inside an expression: `$prime topic`, `meter topic`
fn topic(session: &mut Session, args: &[Item]) -> ItemResult {
    let term = match &args[0] {
        Item::Text(s) | Item::Name(s) => s.clone(),
        Item::Measure(m) => match m.units.iter().next() {
            Some((name, _)) => name.clone(),
            None => String::new(),
        },
        _ => {
            session.emit("The 'topic' operator requires a string argument.".to_string());
            return Ok(Item::Nothing);
        }
    };
    let width = session.config.line_length;
    let lines = if term.is_empty() { interactive_help(width) } else { help(&term, width) };
    for line in lines {
        session.emit(line);
    }
    Ok(Item::Nothing)
}

pub(crate) fn register(reg: &mut Registry) {
    use Arg::*;
    reg.add(OperatorInfo::new("topic", &[Any], "special", "prints help for a topic", topic).side_effect());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stack::evaluate;

    #[test]
    fn test_operator_help() {
        let lines = help("polygonal", 80);
        assert_eq!(lines[0], "n k polygonal - returns the nth k-gonal number");
        assert!(lines.contains(&"category: polygonal_numbers".to_string()));

        let lines = help("+", 80);
        assert!(lines[0].starts_with("n k add - "));
        assert!(lines.contains(&"alias:  +".to_string()));
    }

    #[test]
    fn test_topics_and_categories() {
        let lines = help("about", 80);
        assert!(lines[0].starts_with("rpn is a command-line Reverse Polish Notation calculator"));
        assert!(lines.iter().all(|l| l.len() < 80));

        let lines = help("bitwise", 80);
        assert!(lines.contains(&"and (&)".to_string()));
        assert!(lines.contains(&"countbits (popcount)".to_string()));

        let lines = help("", 80);
        assert!(lines.contains(&"The following is a list of general topics:".to_string()));
    }

    #[test]
    fn test_units_help() {
        let lines = help("unit_types", 80);
        assert!(lines[0].starts_with("    acceleration, "));
        let lines = help("length", 80);
        assert!(lines.iter().any(|l| l.starts_with("    meter")));
    }

    #[test]
    fn test_unit_help() {
        let lines = help("meter", 80);
        assert_eq!(lines[0], "meter");
        assert!(lines.contains(&"plural:  meters".to_string()));
        assert!(lines.contains(&"abbreviations:  m".to_string()));
        assert!(lines.contains(&"unit type:  length".to_string()));
        assert!(lines.contains(&"'meter' is the base unit of length.".to_string()));

        let lines = help("ft", 80);
        assert_eq!(lines[0], "foot");
        assert!(lines.contains(&"1 foot = 0.3048 meter".to_string()));
        assert_eq!(help("light_years", 80)[0], "light year");
        assert!(help("celsius", 80).iter().any(|l| l.starts_with("x celsius = x * 1 + 273.15")));
    }

    #[test]
    fn test_prefix_fallback() {
        assert_eq!(help("unit_t", 80)[0], "Interpreting topic as 'unit_types'.");
        assert_eq!(help("leng", 80)[0], "Interpreting topic as 'length'.");
        assert_eq!(help("polygonal_n", 80)[0], "Interpreting topic as 'polygonal_numbers'.");
        assert_eq!(help("interactive", 80)[0], "Interpreting topic as 'interactive_mode'.");
        assert_eq!(help("xyzzy", 80), vec!["Help topic not found.".to_string()]);
    }

    #[test]
    fn test_topic_operator() {
        let mut s = Session::new();
        assert_eq!(evaluate(&["$about", "topic"], &mut s), Ok(Item::Nothing));
        let out = s.take_output();
        assert!(out[0].starts_with("rpn is a command-line"));

        assert_eq!(evaluate(&["2", "topic"], &mut s), Ok(Item::Nothing));
        assert_eq!(s.take_output(), vec!["The 'topic' operator requires a string argument.".to_string()]);

        assert_eq!(evaluate(&["meter", "topic"], &mut s), Ok(Item::Nothing));
        assert_eq!(s.take_output()[0], "meter");
    }
}
