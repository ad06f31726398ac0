//! Go/no-go gate consulted before an operation changes the host.
use std::fmt;
use std::io::{self, BufRead, Stderr, StdinLock, Write};
use std::sync::{Mutex, PoisonError};

/// Invalid answers tolerated before the prompt gives up and declines.
const MAX_ATTEMPTS: usize = 3;

/// Asks whether an operation may proceed.
#[cfg_attr(test, mockall::automock)]
pub trait Confirm {
    /// Return `true` to proceed. `default` is the answer when the caller
    /// expresses no explicit choice.
    fn confirm(&self, prompt: &str, default: bool) -> bool;
}

/// A gate that always gives the same answer (`--yes`, scripted callers).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAnswer(pub bool);

impl Confirm for FixedAnswer {
    fn confirm(&self, prompt: &str, _default: bool) -> bool {
        tracing::debug!("{prompt} -> {}", if self.0 { "yes" } else { "no" });
        self.0
    }
}

/// Interactive y/n prompt.
///
/// An empty answer or end of input selects the default.
pub struct TerminalPrompt<R, W> {
    io: Mutex<(R, W)>,
}

impl<R, W> fmt::Debug for TerminalPrompt<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TerminalPrompt").finish_non_exhaustive()
    }
}

impl TerminalPrompt<StdinLock<'static>, Stderr> {
    /// Prompt on stderr and read answers from stdin.
    #[must_use]
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    /// Prompt that reads answers from `input` and writes questions to `output`.
    #[must_use]
    pub const fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new((input, output)),
        }
    }

    /// Consume the prompt and return its reader and writer.
    #[must_use]
    pub fn into_inner(self) -> (R, W) {
        self.io.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalPrompt<R, W> {
    fn confirm(&self, prompt: &str, default: bool) -> bool {
        let mut guard = self.io.lock().unwrap_or_else(PoisonError::into_inner);
        let (input, output) = &mut *guard;
        let hint = if default { "[Y/n]" } else { "[y/N]" };

        for _ in 0..MAX_ATTEMPTS {
            // A closed terminal is treated like an empty answer.
            let _ = write!(output, "{prompt} {hint} ");
            let _ = output.flush();

            let mut answer = String::new();
            match input.read_line(&mut answer) {
                Ok(0) | Err(_) => return default,
                Ok(_) => {}
            }

            match answer.trim().to_ascii_lowercase().as_str() {
                "" => return default,
                "y" | "yes" => return true,
                "n" | "no" => return false,
                _ => {
                    let _ = writeln!(output, "please answer y or n");
                }
            }
        }

        tracing::warn!("no valid answer to '{prompt}', declining");
        false
    }
}
