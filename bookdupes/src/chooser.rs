//! Retention format choice
//!
//! The pruner never reads the console itself; it asks a [`FormatChooser`].

use std::io::{self, BufRead, Write};

/// Picks which format of a duplicate group survives
pub trait FormatChooser {
    /// `formats` is sorted and non-empty; `default` is one of them
    fn choose(&mut self, title: &str, formats: &[String], default: &str) -> String;
}

/// Always takes the computed default (non-interactive runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoChooser;

impl FormatChooser for AutoChooser {
    fn choose(&mut self, _title: &str, _formats: &[String], default: &str) -> String {
        default.to_string()
    }
}

/// Asks on a terminal until a listed format (or empty for the default) is entered
pub struct PromptChooser<R, W> {
    input: R,
    output: W,
}

impl PromptChooser<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> PromptChooser<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

/// "a", "a and b", "a, b and c"
pub fn human_join(items: &[String]) -> String {
    match items {
        [] => "unknown".to_string(),
        [only] => only.clone(),
        [rest @ .., last] => format!("{} and {}", rest.join(", "), last),
    }
}

impl<R: BufRead, W: Write> FormatChooser for PromptChooser<R, W> {
    fn choose(&mut self, title: &str, formats: &[String], default: &str) -> String {
        let options = formats.join("/");
        // Console write failures only lose the prompt text; the answer still decides
        let _ = writeln!(
            self.output,
            "\n[PRUNE] I found a duplicate book: '{}'.\n        You have {}. Which would you like to keep?",
            title,
            human_join(formats)
        );

        loop {
            let _ = write!(self.output, "Choose ({}) [{}]: ", options, default);
            let _ = self.output.flush();

            let mut line = String::new();
            match self.input.read_line(&mut line) {
                // EOF or unreadable input: nothing more will come, take the default
                Ok(0) | Err(_) => return default.to_string(),
                Ok(_) => {}
            }

            let answer = line.trim().to_lowercase();
            if answer.is_empty() {
                return default.to_string();
            }
            if formats.iter().any(|f| *f == answer) {
                return answer;
            }
            let _ = writeln!(self.output, "Please type one of: {}", options);
        }
    }
}
