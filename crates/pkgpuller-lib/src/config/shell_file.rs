use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ShellFileError {
    #[error("line {line}: expected NAME=value")]
    MissingAssignment { line: usize },
    #[error("line {line}: unterminated {quote} quote")]
    UnterminatedQuote { line: usize, quote: char },
}

/// Parses the variable assignments of a shell-sourced `.config` file.
///
/// Only plain `NAME=value` / `export NAME=value` assignments are understood. Quoted values may
/// span several lines, which is how `.repo` definitions are embedded. No expansion is performed.
pub fn parse_shell_assignments(content: &str) -> Result<HashMap<String, String>, ShellFileError> {
    let mut assignments = HashMap::new();
    let mut chars = content.chars().peekable();
    let mut line = 1;

    loop {
        while let Some(&c) = chars.peek() {
            match c {
                '\n' => {
                    line += 1;
                    chars.next();
                }
                c if c.is_whitespace() || c == ';' => {
                    chars.next();
                }
                '#' => {
                    while chars.peek().is_some_and(|&c| c != '\n') {
                        chars.next();
                    }
                }
                _ => break,
            }
        }
        if chars.peek().is_none() {
            break;
        }

        let start_line = line;
        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if c == '=' || c.is_whitespace() {
                break;
            }
            name.push(c);
            chars.next();
        }

        if name == "export" {
            continue;
        }
        if chars.next() != Some('=') || name.is_empty() {
            return Err(ShellFileError::MissingAssignment { line: start_line });
        }

        let mut value = String::new();
        while let Some(&c) = chars.peek() {
            match c {
                '"' | '\'' => {
                    chars.next();
                    let quote = c;
                    let mut closed = false;
                    while let Some(inner) = chars.next() {
                        match inner {
                            '\n' => {
                                line += 1;
                                value.push(inner);
                            }
                            '\\' if quote == '"' => match chars.peek() {
                                Some(&next @ ('"' | '\\' | '$' | '`')) => {
                                    value.push(next);
                                    chars.next();
                                }
                                Some('\n') => {
                                    line += 1;
                                    chars.next();
                                }
                                _ => value.push(inner),
                            },
                            c if c == quote => {
                                closed = true;
                                break;
                            }
                            _ => value.push(inner),
                        }
                    }
                    if !closed {
                        return Err(ShellFileError::UnterminatedQuote {
                            line: start_line,
                            quote,
                        });
                    }
                }
                c if c.is_whitespace() || c == ';' => break,
                _ => {
                    value.push(c);
                    chars.next();
                }
            }
        }

        // Trailing words after an unquoted value (`FOO=bar baz`) run `baz` as a command in a
        // real shell; they carry no assignment, so skip to the end of the line.
        while chars.peek().is_some_and(|&c| c != '\n' && c != ';') {
            chars.next();
        }

        assignments.insert(name, value);
    }

    Ok(assignments)
}
