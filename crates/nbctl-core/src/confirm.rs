//! Interactive yes/no gate for destructive actions
//!
//! The gate reads from any `BufRead` and writes prompts to any `Write`, so
//! a scripted input can drive it without a terminal.

use crate::error::{DeployError, Result};
use std::io::{BufRead, Write};

const RETRY_PROMPT: &str = "are you sure? y/n";

/// Gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationDecision {
    Pending,
    Affirmed,
    Declined,
}

impl ConfirmationDecision {
    /// Transition on one line of input; `None` means the read failed
    ///
    /// Only an exact `y` or `n` leaves `Pending`. Terminal states never
    /// change.
    pub fn on_input(self, input: Option<&str>) -> Self {
        match self {
            ConfirmationDecision::Pending => match input.map(str::trim) {
                Some("y") => ConfirmationDecision::Affirmed,
                Some("n") => ConfirmationDecision::Declined,
                _ => ConfirmationDecision::Pending,
            },
            terminal => terminal,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConfirmationDecision::Pending)
    }
}

pub struct ConfirmationGate<R, W> {
    input: R,
    output: W,
    question: String,
}

impl ConfirmationGate<std::io::StdinLock<'static>, std::io::Stderr> {
    /// Gate reading the terminal, prompting on stderr
    pub fn stdin(question: impl Into<String>) -> Self {
        Self::new(std::io::stdin().lock(), std::io::stderr(), question)
    }
}

impl<R: BufRead, W: Write> ConfirmationGate<R, W> {
    pub fn new(input: R, output: W, question: impl Into<String>) -> Self {
        Self {
            input,
            output,
            question: question.into(),
        }
    }

    /// Prompt until a terminal decision is reached
    ///
    /// End of input resolves to `Declined`: the answer can no longer become
    /// `y`, and re-prompting a closed stream would spin forever.
    pub fn decide(&mut self) -> Result<ConfirmationDecision> {
        let mut state = ConfirmationDecision::Pending;
        writeln!(self.output, "{}", self.question)?;

        while !state.is_terminal() {
            let mut line = String::new();
            let input = match self.input.read_line(&mut line) {
                Ok(0) => {
                    tracing::debug!("confirmation input closed");
                    return Ok(ConfirmationDecision::Declined);
                }
                Ok(_) => Some(line.as_str()),
                Err(e) => {
                    tracing::debug!(error = %e, "failed to read confirmation input");
                    None
                }
            };

            state = state.on_input(input);
            if !state.is_terminal() {
                writeln!(self.output, "{RETRY_PROMPT}")?;
            }
        }

        Ok(state)
    }

    /// `Ok` only when affirmed
    pub fn confirm(&mut self) -> Result<()> {
        match self.decide()? {
            ConfirmationDecision::Affirmed => Ok(()),
            _ => Err(DeployError::ConfirmationDeclined),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn gate(input: &str) -> ConfirmationGate<Cursor<Vec<u8>>, Vec<u8>> {
        ConfirmationGate::new(
            Cursor::new(input.as_bytes().to_vec()),
            Vec::new(),
            "remove everything? y/n",
        )
    }

    fn retries(gate: &ConfirmationGate<Cursor<Vec<u8>>, Vec<u8>>) -> usize {
        String::from_utf8_lossy(&gate.output)
            .matches(RETRY_PROMPT)
            .count()
    }

    #[test]
    fn test_transitions() {
        use ConfirmationDecision::*;
        assert_eq!(Pending.on_input(Some("y")), Affirmed);
        assert_eq!(Pending.on_input(Some("n\n")), Declined);
        assert_eq!(Pending.on_input(Some("yes")), Pending);
        assert_eq!(Pending.on_input(Some("Y")), Pending);
        assert_eq!(Pending.on_input(Some("")), Pending);
        assert_eq!(Pending.on_input(None), Pending);
        assert_eq!(Affirmed.on_input(Some("n")), Affirmed);
        assert_eq!(Declined.on_input(Some("y")), Declined);
    }

    #[test]
    fn test_yes_affirms() {
        let mut gate = gate("y\n");
        assert_eq!(gate.decide().unwrap(), ConfirmationDecision::Affirmed);
        assert_eq!(retries(&gate), 0);
    }

    #[test]
    fn test_no_declines_with_error() {
        let mut gate = gate("n\n");
        let err = gate.confirm().unwrap_err();
        assert!(matches!(err, DeployError::ConfirmationDeclined));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_ambiguous_input_reprompts_each_time() {
        let mut gate = gate("maybe\nyes\n\nN\ny\n");
        assert_eq!(gate.decide().unwrap(), ConfirmationDecision::Affirmed);
        assert_eq!(retries(&gate), 4);
    }

    #[test]
    fn test_question_shown_first() {
        let mut gate = gate("y\n");
        gate.decide().unwrap();
        let output = String::from_utf8_lossy(&gate.output);
        assert!(output.starts_with("remove everything? y/n"));
    }

    #[test]
    fn test_closed_input_declines() {
        let mut gate = gate("what\n");
        assert_eq!(gate.decide().unwrap(), ConfirmationDecision::Declined);
        assert_eq!(retries(&gate), 1);
    }
}
