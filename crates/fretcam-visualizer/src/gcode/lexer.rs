//! Line tokenizer
//!
//! Comments are removed first: `( ... )` anywhere in the line and `;` to the
//! end of the line. The remainder is upper-cased, whitespace is dropped and
//! the text is split into words made of one letter and a signed decimal.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::issue::{IssueCode, SimulationIssue};

/// A single letter/number pair such as `X-12.5`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Word {
    pub letter: char,
    pub value: f64,
}

/// Result of tokenizing one source line
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LexedLine {
    /// 1-based source line number
    pub line: usize,
    pub words: Vec<Word>,
    pub comments: Vec<String>,
    pub issues: Vec<SimulationIssue>,
}

impl LexedLine {
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn word_regex() -> &'static Regex {
    static WORD_REGEX: std::sync::OnceLock<Regex> = std::sync::OnceLock::new();
    WORD_REGEX.get_or_init(|| {
        Regex::new(r"^([A-Z])([+-]?(?:[0-9]+(?:\.[0-9]*)?|\.[0-9]+))").expect("invalid regex pattern")
    })
}

/// Removes comments, returning the code part and the comment texts.
///
/// An unclosed parenthesis drops the rest of the line and records an issue.
fn strip_comments(line_no: usize, raw: &str, lexed: &mut LexedLine) -> String {
    let mut code = String::with_capacity(raw.len());
    let mut comment = String::new();
    let mut in_paren = false;

    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if in_paren {
            if c == ')' {
                in_paren = false;
                lexed.comments.push(std::mem::take(&mut comment));
            } else {
                comment.push(c);
            }
            continue;
        }
        match c {
            '(' => in_paren = true,
            ';' => {
                let rest: String = chars.by_ref().collect();
                lexed.comments.push(rest.trim().to_string());
                break;
            }
            _ => code.push(c),
        }
    }

    if in_paren {
        lexed.issues.push(SimulationIssue::warning(
            line_no,
            IssueCode::UnclosedComment,
            "unclosed '(' comment, rest of line ignored",
        ));
        lexed.comments.push(comment);
    }
    code
}

/// Tokenizes one line of G-code.
pub fn tokenize_line(line_no: usize, raw: &str) -> LexedLine {
    let mut lexed = LexedLine {
        line: line_no,
        ..Default::default()
    };

    let code = strip_comments(line_no, raw, &mut lexed);
    let compact: String = code
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();

    // Program delimiters and block-delete markers carry no words.
    let compact = compact.trim_start_matches('/');
    if compact.is_empty() || compact == "%" {
        return lexed;
    }

    let regex = word_regex();
    let mut rest = compact;
    while !rest.is_empty() {
        if let Some(caps) = regex.captures(rest) {
            let whole = caps.get(0).map_or(0, |m| m.end());
            let letter = caps[1].chars().next().unwrap_or('?');
            match caps[2].parse::<f64>() {
                Ok(value) => lexed.words.push(Word { letter, value }),
                Err(_) => lexed.issues.push(SimulationIssue::warning(
                    line_no,
                    IssueCode::MalformedWord,
                    format!("cannot parse number in '{}'", &caps[0]),
                )),
            }
            rest = &rest[whole..];
        } else {
            // Skip to the next letter so one bad token does not hide the rest.
            let skip = rest
                .char_indices()
                .skip(1)
                .find(|(_, c)| c.is_ascii_alphabetic())
                .map_or(rest.len(), |(i, _)| i);
            lexed.issues.push(SimulationIssue::warning(
                line_no,
                IssueCode::MalformedWord,
                format!("malformed token '{}'", &rest[..skip]),
            ));
            rest = &rest[skip..];
        }
    }

    trace!("Line {}: {} words", line_no, lexed.words.len());
    lexed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letters(lexed: &LexedLine) -> String {
        lexed.words.iter().map(|w| w.letter).collect()
    }

    #[test]
    fn test_basic_words() {
        let lexed = tokenize_line(1, "G1 X10.5 Y-3 F1200");
        assert_eq!(letters(&lexed), "GXYF");
        assert_eq!(lexed.words[1].value, 10.5);
        assert_eq!(lexed.words[2].value, -3.0);
        assert!(lexed.issues.is_empty());
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let a = tokenize_line(1, "g1x10 y 2.5");
        let b = tokenize_line(1, "G1 X10 Y2.5");
        assert_eq!(a.words, b.words);
    }

    #[test]
    fn test_decimal_forms() {
        let lexed = tokenize_line(1, "X.5 Y-.25 Z+3. I10");
        let values: Vec<f64> = lexed.words.iter().map(|w| w.value).collect();
        assert_eq!(values, vec![0.5, -0.25, 3.0, 10.0]);
    }

    #[test]
    fn test_comments_removed() {
        let lexed = tokenize_line(4, "G0 (rapid (nested?) X5 ; trailing note");
        // Comments do not nest: the first ')' closes.
        assert_eq!(lexed.words[0], Word { letter: 'G', value: 0.0 });
        assert_eq!(lexed.comments[0], "rapid (nested?");

        let lexed = tokenize_line(2, "G1 X1 ; move (not a comment start");
        assert_eq!(letters(&lexed), "GX");
        assert!(lexed.issues.is_empty());
    }

    #[test]
    fn test_unclosed_paren() {
        let lexed = tokenize_line(7, "G1 X1 (oops Y2");
        assert_eq!(letters(&lexed), "GX");
        assert_eq!(lexed.issues.len(), 1);
        assert_eq!(lexed.issues[0].code, IssueCode::UnclosedComment);
        assert_eq!(lexed.issues[0].line, 7);
    }

    #[test]
    fn test_malformed_token_skipped() {
        let lexed = tokenize_line(1, "G1 X Y5");
        assert_eq!(letters(&lexed), "GY");
        assert_eq!(lexed.issues[0].code, IssueCode::MalformedWord);
    }

    #[test]
    fn test_percent_line() {
        assert!(tokenize_line(1, "%").is_empty());
        assert!(tokenize_line(1, "   ").is_empty());
    }
}
