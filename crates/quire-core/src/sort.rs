// SPDX-License-Identifier: MIT
//
// Natural sort key — tokenizes a filename into alternating text and number
// runs so that "page_2" orders before "page_10".

use std::cmp::Ordering;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Ordering key derived from a filename.
///
/// The base filename is split on maximal ASCII digit runs into a sequence of
/// tokens: digit runs compare numerically, text runs compare
/// case-insensitively. Keys that are byte-identical after case folding compare
/// equal; callers rely on stable sorts to keep the original order for ties.
///
/// Derived identically for explicit file selections and directory scans, so
/// merge order never depends on where the input came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NaturalSortKey {
    tokens: Vec<Token>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
enum Token {
    /// Digit run with leading zeros stripped ("000" becomes "0"). Comparing
    /// by trimmed length first, then lexicographically, is exact numeric
    /// order at arbitrary precision.
    Number(String),
    /// Case-folded text run.
    Text(String),
}

impl Token {
    fn from_run(run: &str, is_digit: bool) -> Self {
        if is_digit {
            let trimmed = run.trim_start_matches('0');
            if trimmed.is_empty() {
                Token::Number("0".to_string())
            } else {
                Token::Number(trimmed.to_string())
            }
        } else {
            Token::Text(run.to_lowercase())
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Token::Number(a), Token::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (Token::Text(a), Token::Text(b)) => a.cmp(b),
            // Runs alternate, so mixed comparisons only occur when one name
            // starts with digits and the other with text.
            (Token::Number(_), Token::Text(_)) => Ordering::Less,
            (Token::Text(_), Token::Number(_)) => Ordering::Greater,
        }
    }
}

impl NaturalSortKey {
    /// Build a key from the base filename of `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let name = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_name(&name)
    }

    /// Build a key directly from a filename.
    pub fn from_name(name: &str) -> Self {
        let mut tokens = Vec::new();
        let mut run = String::new();
        let mut run_is_digit = false;

        for ch in name.chars() {
            let is_digit = ch.is_ascii_digit();
            if !run.is_empty() && is_digit != run_is_digit {
                tokens.push(Token::from_run(&run, run_is_digit));
                run.clear();
            }
            run_is_digit = is_digit;
            run.push(ch);
        }
        if !run.is_empty() {
            tokens.push(Token::from_run(&run, run_is_digit));
        }

        Self { tokens }
    }
}

impl Ord for NaturalSortKey {
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left = self.tokens.iter();
        let mut right = other.tokens.iter();
        loop {
            match (left.next(), right.next()) {
                (Some(a), Some(b)) => match a.compare(b) {
                    Ordering::Equal => continue,
                    unequal => return unequal,
                },
                (Some(_), None) => return Ordering::Greater,
                (None, Some(_)) => return Ordering::Less,
                (None, None) => return Ordering::Equal,
            }
        }
    }
}

impl PartialOrd for NaturalSortKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
