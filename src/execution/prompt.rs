use std::io::{self, BufRead, Write};

use crate::models::Side;

const CHOICES: [(Side, &str); 2] = [
    (Side::Buy, "BUY in at markdown (need units to trade)"),
    (Side::Sell, "SELL out at markup (need liquidity)"),
];

/// Asks the operator which side to trade first
pub trait SidePrompt: Send {
    fn choose_start_side(&mut self) -> io::Result<Side>;
}

/// Always answers with the same side
#[derive(Debug, Clone, Copy)]
pub struct FixedSide(pub Side);

impl SidePrompt for FixedSide {
    fn choose_start_side(&mut self) -> io::Result<Side> {
        Ok(self.0)
    }
}

/// Interactive prompt over a line reader (stdin by default), SELL on empty input
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::BufReader<io::Stdin>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead + Send, W: Write + Send> SidePrompt for TerminalPrompt<R, W> {
    fn choose_start_side(&mut self) -> io::Result<Side> {
        loop {
            for (i, (_, label)) in CHOICES.iter().enumerate() {
                writeln!(self.output, "  {}. {}", i + 1, label)?;
            }
            write!(self.output, "Enter your choice as a number or unique substring [SELL]: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "no answer given for the starting side",
                ));
            }

            match parse_choice(&line) {
                Some(side) => return Ok(side),
                None => writeln!(self.output, "Invalid choice: {}", line.trim())?,
            }
        }
    }
}

/// Map an answer to a side: empty -> SELL, "1"/"2", or a unique substring of a choice
pub fn parse_choice(input: &str) -> Option<Side> {
    let answer = input.trim().to_ascii_lowercase();
    if answer.is_empty() {
        return Some(Side::Sell);
    }

    if let Ok(n) = answer.parse::<usize>() {
        return CHOICES.get(n.checked_sub(1)?).map(|(side, _)| *side);
    }

    let mut matches = CHOICES
        .iter()
        .filter(|(_, label)| label.to_ascii_lowercase().contains(&answer));
    match (matches.next(), matches.next()) {
        (Some((side, _)), None) => Some(*side),
        _ => None,
    }
}
