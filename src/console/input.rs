use std::io::Write;

use secrecy::Secret;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

/// Line-oriented console input. One instance owns stdin for the whole
/// interactive session.
pub struct ConsoleInput {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleInput {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prints a prompt and reads one trimmed line. EOF reads as an empty
    /// line so menus fall through to their cancel path.
    pub async fn prompt(&mut self, label: &str) -> std::io::Result<String> {
        print!("{label}");
        std::io::stdout().flush()?;
        let line = self.lines.next_line().await?.unwrap_or_default();
        Ok(line.trim().to_string())
    }

    /// Reads a password. The console does not echo-suppress; the value is
    /// wrapped immediately so it stays out of logs.
    pub async fn prompt_secret(&mut self, label: &str) -> std::io::Result<Secret<String>> {
        Ok(Secret::new(self.prompt(label).await?))
    }
}

impl Default for ConsoleInput {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of a 1-based menu selection over a list of `count` entries, where
/// 0 cancels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Cancel,
    Index(usize),
    OutOfRange,
    NotANumber,
}

pub fn parse_selection(input: &str, count: usize) -> Selection {
    match input.trim().parse::<usize>() {
        Err(_) => Selection::NotANumber,
        Ok(0) => Selection::Cancel,
        Ok(n) if n <= count => Selection::Index(n - 1),
        Ok(_) => Selection::OutOfRange,
    }
}

/// Yes/no confirmation; anything other than y/yes (any case) is a no.
pub fn is_confirmation(input: &str) -> bool {
    matches!(input.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_is_one_based_with_zero_cancel() {
        assert_eq!(parse_selection("0", 3), Selection::Cancel);
        assert_eq!(parse_selection("1", 3), Selection::Index(0));
        assert_eq!(parse_selection("3", 3), Selection::Index(2));
    }

    #[test]
    fn test_selection_rejects_out_of_range_and_garbage() {
        assert_eq!(parse_selection("4", 3), Selection::OutOfRange);
        assert_eq!(parse_selection("abc", 3), Selection::NotANumber);
        assert_eq!(parse_selection("-1", 3), Selection::NotANumber);
        assert_eq!(parse_selection("", 3), Selection::NotANumber);
    }

    #[test]
    fn test_confirmation_accepts_only_yes() {
        assert!(is_confirmation("y"));
        assert!(is_confirmation("YES"));
        assert!(!is_confirmation("n"));
        assert!(!is_confirmation(""));
        assert!(!is_confirmation("si"));
    }
}
