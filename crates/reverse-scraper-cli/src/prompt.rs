use std::io::{self, BufRead, Write};

use reverse_scraper_core::{LinkBounds, Result};

pub fn link_prompt(bounds: &LinkBounds) -> String {
    format!("How many image links to attempt? Defaults to {}.", bounds.default)
}

/// Ask for the number of links per image. Blank or unusable answers fall
/// back to the default; out-of-range numbers are clamped.
pub fn ask_link_count<R: BufRead, W: Write>(
    bounds: &LinkBounds,
    input: &mut R,
    output: &mut W,
) -> Result<usize> {
    writeln!(output, "{}", link_prompt(bounds))?;
    write!(output, "> ")?;
    output.flush()?;

    let mut answer = String::new();
    let raw = match input.read_line(&mut answer)? {
        0 => None,
        _ => Some(answer.as_str()),
    };
    bounds.resolve(raw)
}

pub fn ask_link_count_stdin(bounds: &LinkBounds) -> Result<usize> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    ask_link_count(bounds, &mut input, &mut io::stdout())
}
