//! The `irtcat administer` command.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use irtcat_core::traits::{ResponseSource, SessionObserver};
use irtcat_core::{AdaptiveTest, AssessmentResult, ItemParameters, Response};

use super::{resolve_settings, TestOverrides};

/// Live examinee answering on a line-oriented console.
pub struct ConsoleExaminee<R, W> {
    input: R,
    output: W,
    asked: usize,
}

impl<R: BufRead, W: Write> ConsoleExaminee<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            asked: 0,
        }
    }
}

fn parse_answer(line: &str) -> Option<Response> {
    match line.trim().to_lowercase().as_str() {
        "1" | "y" | "yes" | "c" | "correct" => Some(Response::Correct),
        "0" | "n" | "no" | "i" | "incorrect" => Some(Response::Incorrect),
        _ => None,
    }
}

impl<R: BufRead, W: Write> ResponseSource for ConsoleExaminee<R, W> {
    fn respond(&mut self, item: &ItemParameters) -> Result<Response> {
        self.asked += 1;
        loop {
            write!(
                self.output,
                "Item {}: {} (b = {:+.2}). Correct? [1/0, q to quit]: ",
                self.asked, item.item_id, item.difficulty
            )?;
            self.output.flush()?;

            let mut line = String::new();
            let read = self
                .input
                .read_line(&mut line)
                .context("failed to read answer")?;
            if read == 0 || matches!(line.trim(), "q" | "quit") {
                anyhow::bail!("session aborted by examinee");
            }

            match parse_answer(&line) {
                Some(response) => return Ok(response),
                None => writeln!(self.output, "  please answer 1 (correct) or 0 (incorrect)")?,
            }
        }
    }
}

/// Console progress observer.
struct ConsoleObserver;

impl SessionObserver for ConsoleObserver {
    fn on_item_administered(&self, _: usize, _: &ItemParameters, _: Response) {}

    fn on_estimate_updated(&self, theta: f64, standard_error: f64) {
        println!("  theta = {theta:+.3}, SE = {standard_error:.3}");
    }

    fn on_complete(&self, result: &AssessmentResult) {
        println!("\nTest finished: {}", result.stopping_reason);
    }
}

pub fn execute(
    item_bank: Option<PathBuf>,
    overrides: TestOverrides,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let settings = resolve_settings(item_bank, &overrides, config_path.as_deref())?;

    println!(
        "Adaptive test: {} items in bank, {} to {} items, stop at SE < {}",
        settings.bank.len(),
        settings.test.min_items,
        settings.test.max_items,
        settings.test.se_threshold
    );

    let stdin = std::io::stdin();
    let mut examinee = ConsoleExaminee::new(stdin.lock(), std::io::stdout());
    let mut test = AdaptiveTest::new(settings.bank, settings.test)?;
    let result = test.run(&mut examinee, &ConsoleObserver)?;

    println!("Final ability: {:+.3}", result.estimated_theta);
    println!("Standard error: {:.3}", result.standard_error);
    println!(
        "Items: {} ({:.0}% correct), reliability {:.3}",
        result.total_items,
        result.proportion_correct() * 100.0,
        result.reliability
    );

    if let Some(path) = output {
        result.save_json(&path)?;
        eprintln!("Result saved to: {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn item() -> ItemParameters {
        ItemParameters::two_pl("q1", 0.5, 1.0).unwrap()
    }

    #[test]
    fn reads_answers() {
        let mut out = Vec::new();
        let mut examinee = ConsoleExaminee::new(Cursor::new("1\nno\n"), &mut out);
        assert_eq!(examinee.respond(&item()).unwrap(), Response::Correct);
        assert_eq!(examinee.respond(&item()).unwrap(), Response::Incorrect);

        let prompts = String::from_utf8(out).unwrap();
        assert!(prompts.contains("Item 1: q1 (b = +0.50)"));
        assert!(prompts.contains("Item 2: q1"));
    }

    #[test]
    fn reprompts_on_garbage() {
        let mut out = Vec::new();
        let mut examinee = ConsoleExaminee::new(Cursor::new("maybe\n\ny\n"), &mut out);
        assert_eq!(examinee.respond(&item()).unwrap(), Response::Correct);
        let prompts = String::from_utf8(out).unwrap();
        assert_eq!(prompts.matches("please answer").count(), 2);
    }

    #[test]
    fn eof_and_quit_abort() {
        let mut examinee = ConsoleExaminee::new(Cursor::new(""), Vec::new());
        assert!(examinee.respond(&item()).is_err());

        let mut examinee = ConsoleExaminee::new(Cursor::new("q\n"), Vec::new());
        let err = examinee.respond(&item()).unwrap_err();
        assert!(err.to_string().contains("aborted"));
    }
}
