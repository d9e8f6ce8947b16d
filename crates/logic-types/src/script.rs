//! Text notation for command lists.
//!
//! This is the output contract of the natural-language front-end: a flat,
//! case-insensitive token stream.
//!
//! | tokens | meaning |
//! |---|---|
//! | `F`, `A`, `FORWARD`, `AVANCER` | move forward |
//! | `R`, `D`, `RIGHT`, `DROITE` | turn right |
//! | `L`, `G`, `LEFT`, `GAUCHE` | turn left |
//! | `F1` .. `F5` | call a function |
//! | `if <red\|blue\|green> { ... }` | guard every enclosed command |
//!
//! Blocks cannot nest. Commas and whitespace separate tokens; braces are
//! tokens on their own. A whole program is written as `F<n>: <commands>`
//! lines, see [`parse_program_text`].

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::enums::{Action, Condition, FunctionId};
use crate::structs::Command;

/// Errors raised while reading command text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScriptError {
    /// A token that is not a command, call, color or brace.
    #[error("unknown token `{0}`")]
    UnknownToken(String),

    /// `if` followed by something other than a color name.
    #[error("expected a color after `if`, found `{0}`")]
    UnknownColor(String),

    /// `if <color>` not followed by `{`.
    #[error("expected `{{` after `if {0}`")]
    ExpectedBlock(Condition),

    /// A block opened but never closed.
    #[error("unclosed `if` block")]
    UnclosedBlock,

    /// A `}` without a matching block.
    #[error("unexpected `}}`")]
    UnexpectedClose,

    /// An `if` (or a bare `{`) inside a block.
    #[error("conditional blocks cannot be nested")]
    NestedBlock,

    /// A program line without a valid `F<n>:` header.
    #[error("line {line}: expected `F1:` .. `F5:` header")]
    MissingHeader {
        /// One-based line number.
        line: usize,
    },

    /// The same function defined on two lines.
    #[error("line {line}: {function} is defined twice")]
    DuplicateFunction {
        /// One-based line number of the second definition.
        line: usize,
        /// The repeated function.
        function: FunctionId,
    },

    /// An error inside the command list of a program line.
    #[error("line {line}: {source}")]
    Line {
        /// One-based line number.
        line: usize,
        /// The underlying error.
        source: Box<Self>,
    },
}

/// Parse a flat command list such as `F if blue { F R } F2`.
pub fn parse_commands(text: &str) -> Result<Vec<Command>, ScriptError> {
    let tokens = tokenize(text);
    let mut commands = Vec::with_capacity(tokens.len());
    let mut iter = tokens.into_iter();
    let mut block: Option<Condition> = None;

    while let Some(token) = iter.next() {
        let upper = token.to_ascii_uppercase();
        match upper.as_str() {
            "IF" => {
                if block.is_some() {
                    return Err(ScriptError::NestedBlock);
                }
                let color = iter.next().unwrap_or_default();
                let condition = Condition::from_name(&color)
                    .ok_or(ScriptError::UnknownColor(color))?;
                if iter.next().as_deref() != Some("{") {
                    return Err(ScriptError::ExpectedBlock(condition));
                }
                block = Some(condition);
            }
            "{" => return Err(ScriptError::NestedBlock),
            "}" => {
                if block.take().is_none() {
                    return Err(ScriptError::UnexpectedClose);
                }
            }
            _ => {
                let action = parse_action(&upper).ok_or(ScriptError::UnknownToken(token))?;
                commands.push(Command {
                    action,
                    condition: block,
                });
            }
        }
    }

    if block.is_some() {
        return Err(ScriptError::UnclosedBlock);
    }
    Ok(commands)
}

/// Parse several `F<n>: <commands>` lines into per-function command lists.
///
/// Blank lines and lines starting with `#` are skipped. Functions that are
/// not mentioned are absent from the map.
pub fn parse_program_text(text: &str) -> Result<BTreeMap<FunctionId, Vec<Command>>, ScriptError> {
    let mut functions = BTreeMap::new();

    for (i, raw) in text.lines().enumerate() {
        let line = i.saturating_add(1);
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (header, body) = trimmed
            .split_once(':')
            .ok_or(ScriptError::MissingHeader { line })?;
        let function =
            FunctionId::parse(header.trim()).ok_or(ScriptError::MissingHeader { line })?;
        let commands = parse_commands(body).map_err(|source| ScriptError::Line {
            line,
            source: Box::new(source),
        })?;

        if functions.insert(function, commands).is_some() {
            return Err(ScriptError::DuplicateFunction { line, function });
        }
    }

    Ok(functions)
}

/// Render commands back into text notation.
///
/// Consecutive commands sharing a condition are grouped into one block, so
/// the output parses back to the same list.
pub fn format_commands(commands: &[Command]) -> String {
    let mut out = String::new();
    let mut open: Option<Condition> = None;

    for command in commands {
        if command.condition != open {
            if open.is_some() {
                out.push_str(" }");
            }
            if let Some(condition) = command.condition {
                push_separator(&mut out);
                let _ = write!(out, "if {condition} {{");
            }
            open = command.condition;
        }
        push_separator(&mut out);
        let _ = write!(out, "{}", command.action);
    }
    if open.is_some() {
        out.push_str(" }");
    }
    out
}

fn push_separator(out: &mut String) {
    if !out.is_empty() {
        out.push(' ');
    }
}

fn parse_action(upper: &str) -> Option<Action> {
    match upper {
        "F" | "A" | "FORWARD" | "AVANCER" => Some(Action::Forward),
        "R" | "D" | "RIGHT" | "DROITE" => Some(Action::TurnRight),
        "L" | "G" | "LEFT" | "GAUCHE" => Some(Action::TurnLeft),
        other => FunctionId::parse(other).map(Action::Call),
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_whitespace() || c == ',' || c == ';' {
            flush(&mut current, &mut tokens);
        } else if c == '{' || c == '}' {
            flush(&mut current, &mut tokens);
            tokens.push(c.to_string());
        } else {
            current.push(c);
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}
