use std::path::PathBuf;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, LevelFilter};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use rpncalc::config::Config;
use rpncalc::help;
use rpncalc::item::Item;
use rpncalc::output::{format_elapsed, OutputFormat};
use rpncalc::session::Session;
use rpncalc::stack::evaluate;

// Negative numbers look like flags to the argument parser, so they are
// hidden behind this prefix until the terms are collected
const NEGATIVE_MARK: char = '\u{1}';

#[derive(Parser, Debug)]
#[command(name = help::PROGRAM_NAME, version, about = help::PROGRAM_DESCRIPTION)]
struct Cli {
    /// significant digits of decimal output
    #[arg(short = 'a', long = "output_accuracy", num_args = 0..=1, default_missing_value = "12")]
    output_accuracy: Option<usize>,
    /// radix of input numbers (2 to 62)
    #[arg(short = 'b', long = "input_radix")]
    input_radix: Option<u32>,
    /// group integer digits by three with commas
    #[arg(short = 'c', long = "comma")]
    comma: bool,
    /// group fraction digits
    #[arg(short = 'd', long = "decimal_grouping", num_args = 0..=1, default_missing_value = "5")]
    decimal_grouping: Option<usize>,
    /// group integer digits
    #[arg(short = 'g', long = "integer_grouping", num_args = 0..=1, default_missing_value = "3")]
    integer_grouping: Option<usize>,
    /// line length used for wrapping
    #[arg(short = 'l', long = "line_length")]
    line_length: Option<usize>,
    /// symbols used for digits of non-decimal output
    #[arg(short = 'n', long = "numerals")]
    numerals: Option<String>,
    /// octal output, same as -r8 -w9 -g3 -z
    #[arg(short = 'o', long = "octal")]
    octal: bool,
    /// fraction digits of non-decimal output
    #[arg(short = 'p', long = "precision")]
    precision: Option<usize>,
    /// output radix (2 to 62, or 'fib')
    #[arg(short = 'r', long = "output_radix")]
    output_radix: Option<String>,
    /// print every digit of this radix as a decimal number
    #[arg(short = 'R', long = "output_radix_numerals")]
    output_radix_numerals: Option<u32>,
    /// print nested lists one item per line down to this level
    #[arg(short = 's', long = "list_format_level", num_args = 0..=1, default_missing_value = "1")]
    list_format_level: Option<usize>,
    /// print the time taken by each evaluation
    #[arg(short = 't', long = "timer")]
    timer: bool,
    /// bit group size for 'not'
    #[arg(short = 'w', long = "bitwise_group_size")]
    bitwise_group_size: Option<usize>,
    /// hexadecimal output, same as -r16 -w16 -g4 -z
    #[arg(short = 'x', long = "hex")]
    hex: bool,
    /// fill the first digit group with zeros
    #[arg(short = 'z', long = "leading_zero")]
    leading_zero: bool,
    /// print debug logging
    #[arg(short = 'D', long = "debug")]
    debug: bool,
    /// print the resolved options before evaluating
    #[arg(short = '!', long = "print_options")]
    print_options: bool,
    /// configuration file
    #[arg(long = "config")]
    config: Option<PathBuf>,
    /// terms of the expression; starts an interactive session when empty
    terms: Vec<String>,
}

fn protect_negative_numbers(args: impl Iterator<Item = String>) -> Vec<String> {
    args.map(|arg| {
        let mut chars = arg.chars();
        match (chars.next(), chars.next()) {
            (Some('-'), Some(c)) if c.is_ascii_digit() || c == '.' => format!("{}{}", NEGATIVE_MARK, &arg[1..]),
            _ => arg,
        }
    })
    .collect()
}

fn restore_negative_number(term: String) -> String {
    match term.strip_prefix(NEGATIVE_MARK) {
        Some(rest) => format!("-{}", rest),
        None => term,
    }
}

fn check_conflicts(cli: &Cli) -> Result<()> {
    if cli.hex && cli.octal {
        bail!("-x and -o cannot be used together");
    }
    if let Some(radix) = &cli.output_radix {
        if cli.hex && radix != "16" {
            bail!("-x conflicts with -r {}", radix);
        }
        if cli.octal && radix != "8" {
            bail!("-o conflicts with -r {}", radix);
        }
    }
    if cli.output_radix_numerals.is_some()
        && (cli.hex
            || cli.octal
            || cli.output_radix.is_some()
            || cli.comma
            || cli.decimal_grouping.is_some()
            || cli.integer_grouping.is_some())
    {
        bail!("-R cannot be combined with -x, -o, -r, -c, -d or -g");
    }
    if cli.comma && cli.integer_grouping.is_some() {
        bail!("-c and -g cannot be used together");
    }
    Ok(())
}

/// Applies command-line overrides on top of the loaded configuration
fn apply_options(cli: &Cli, mut cfg: Config) -> Result<Config> {
    if let Some(v) = cli.output_accuracy {
        cfg.output_accuracy = v;
    }
    if let Some(v) = cli.input_radix {
        cfg.input_radix = v;
    }
    if let Some(v) = cli.decimal_grouping {
        cfg.decimal_grouping = v;
    }
    if let Some(v) = cli.integer_grouping {
        cfg.integer_grouping = v;
    }
    if let Some(v) = cli.line_length {
        cfg.line_length = v;
    }
    if let Some(v) = &cli.numerals {
        cfg.numerals = v.clone();
    }
    if let Some(v) = cli.precision {
        cfg.precision = v;
    }
    if let Some(v) = &cli.output_radix {
        cfg.output_radix = v.clone();
    }
    if let Some(v) = cli.output_radix_numerals {
        cfg.output_radix_numerals = v;
    }
    if let Some(v) = cli.list_format_level {
        cfg.list_format_level = v;
    }
    if let Some(v) = cli.bitwise_group_size {
        cfg.bitwise_group_size = v;
    }
    cfg.comma |= cli.comma;
    cfg.timer |= cli.timer;
    cfg.leading_zero |= cli.leading_zero;
    if cli.hex {
        cfg.output_radix = "16".to_string();
        cfg.bitwise_group_size = 16;
        cfg.integer_grouping = 4;
        cfg.leading_zero = true;
    }
    if cli.octal {
        cfg.output_radix = "8".to_string();
        cfg.bitwise_group_size = 9;
        cfg.integer_grouping = 3;
        cfg.leading_zero = true;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

/// Evaluates one expression and prints its output and result
fn run_expression<S: AsRef<str>>(session: &mut Session, terms: &[S]) {
    let start = Instant::now();
    let result = evaluate(terms, session);
    print_lines(&session.take_output());
    match result {
        Ok(Item::Nothing) => {}
        Ok(item) => {
            let fmt = OutputFormat::new(&session.config, &session.modes);
            println!("{}", fmt.format_item(&item));
            session.push_result(item);
        }
        Err(e) => println!("{}:  {}", help::PROGRAM_NAME, e),
    }
    if session.config.timer || session.modes.timer {
        println!();
        println!("{}", format_elapsed(start.elapsed()));
    }
}

fn help_mode(rl: &mut DefaultEditor, width: usize) -> Result<()> {
    println!("{}", help::help_mode_help());
    loop {
        let line = match rl.readline(&format!("{} help> ", help::PROGRAM_NAME)) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let term = line.trim();
        match term {
            "" => println!("{}", help::help_mode_help()),
            "exit" | "quit" => return Ok(()),
            "topics" => print_lines(&help::general_help(width)),
            _ => {
                rl.add_history_entry(term)?;
                print_lines(&help::help(term, width));
            }
        }
        println!();
    }
}

fn interactive(session: &mut Session) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    print_lines(&help::title_screen());
    loop {
        session.reset_modes();
        let prompt = format!("{} ({})> ", help::PROGRAM_NAME, session.result_count() + 1);
        let line = match rl.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let terms: Vec<&str> = line.split_whitespace().collect();
        if terms.is_empty() {
            continue;
        }
        rl.add_history_entry(line.as_str())?;
        match terms[0] {
            "exit" | "quit" => break,
            "help" if terms.len() == 1 => help_mode(&mut rl, session.config.line_length)?,
            "help" => print_lines(&help::help(terms[1], session.config.line_length)),
            _ => run_expression(session, &terms),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse_from(protect_negative_numbers(std::env::args()));

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    check_conflicts(&cli)?;
    let cfg = Config::load(cli.config.as_deref()).context("failed to load the configuration")?;
    let cfg = apply_options(&cli, cfg)?;
    if cli.print_options {
        print!("{}", toml::to_string_pretty(&cfg)?);
        println!();
    }
    debug!("configuration: {:?}", cfg);

    let width = cfg.line_length;
    let mut session = Session::with_config(cfg);
    let terms: Vec<String> = cli.terms.into_iter().map(restore_negative_number).collect();

    match terms.first().map(String::as_str) {
        None => interactive(&mut session)?,
        Some("help") => match terms.get(1) {
            Some(term) => print_lines(&help::help(term, width)),
            None => print_lines(&help::general_help(width)),
        },
        Some(_) => run_expression(&mut session, &terms),
    }
    session.save_caches();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let args = std::iter::once("rpn").chain(args.iter().copied()).map(String::from);
        Cli::try_parse_from(protect_negative_numbers(args)).unwrap()
    }

    #[test]
    fn test_long_flags() {
        let c = cli(&["--output_accuracy", "20", "--integer_grouping", "4", "--leading_zero", "--input_radix", "16", "ff"]);
        assert_eq!(c.output_accuracy, Some(20));
        assert_eq!(c.integer_grouping, Some(4));
        assert_eq!(c.input_radix, Some(16));
        assert!(c.leading_zero);
        assert_eq!(c.terms, vec!["ff".to_string()]);
        assert!(Cli::try_parse_from(["rpn", "--output-accuracy", "20"]).is_err());
    }

    #[test]
    fn test_negative_terms() {
        let c = cli(&["-a20", "-5", "-.5", "+"]);
        assert_eq!(c.output_accuracy, Some(20));
        let terms: Vec<String> = c.terms.into_iter().map(restore_negative_number).collect();
        assert_eq!(terms, vec!["-5", "-.5", "+"]);
    }

    #[test]
    fn test_conflicts() {
        assert!(check_conflicts(&cli(&["-x", "-o", "1"])).is_err());
        assert!(check_conflicts(&cli(&["-x", "-r", "8", "1"])).is_err());
        assert!(check_conflicts(&cli(&["-x", "-r", "16", "1"])).is_ok());
        assert!(check_conflicts(&cli(&["-o", "-r", "16", "1"])).is_err());
        assert!(check_conflicts(&cli(&["-R", "10", "-c", "1"])).is_err());
        assert!(check_conflicts(&cli(&["-R", "10", "-g4", "1"])).is_err());
        assert!(check_conflicts(&cli(&["-R", "10", "1"])).is_ok());
        assert!(check_conflicts(&cli(&["-c", "-g4", "1"])).is_err());
        assert!(check_conflicts(&cli(&["-c", "-a20", "1"])).is_ok());
    }

    #[test]
    fn test_apply_options() {
        let cfg = apply_options(&cli(&["-x", "1"]), Config::default()).unwrap();
        assert_eq!(cfg.output_radix, "16");
        assert_eq!(cfg.bitwise_group_size, 16);
        assert_eq!(cfg.integer_grouping, 4);
        assert!(cfg.leading_zero);

        let cfg = apply_options(&cli(&["-o", "1"]), Config::default()).unwrap();
        assert_eq!(cfg.output_radix, "8");
        assert_eq!(cfg.bitwise_group_size, 9);

        let cfg = apply_options(&cli(&["-a30", "-l", "60", "-c", "-t", "-n", "01", "1"]), Config::default()).unwrap();
        assert_eq!(cfg.output_accuracy, 30);
        assert_eq!(cfg.line_length, 60);
        assert_eq!(cfg.numerals, "01");
        assert!(cfg.comma && cfg.timer);

        // options left out keep the configured values
        let base = Config { line_length: 72, ..Config::default() };
        let cfg = apply_options(&cli(&["1"]), base.clone()).unwrap();
        assert_eq!(cfg, base);

        assert!(apply_options(&cli(&["-b", "1", "1"]), Config::default()).is_err());
        assert!(apply_options(&cli(&["-r", "99", "1"]), Config::default()).is_err());
        assert!(apply_options(&cli(&["-a", "0", "1"]), Config::default()).is_err());
    }
}
