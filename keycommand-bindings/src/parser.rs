//! Key combination parser.
//!
//! Parses human-readable key strings like "Cmd+Shift+S" into [`Combination`]s.
//! Used to declare default bindings in code and to read the forbidden list
//! from the settings file.

use crate::combination::{Combination, Input, Modifiers, NamedInput};
use thiserror::Error;

/// Error type for key parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Empty key combination")]
    Empty,
    #[error("Key combination ends with modifier, no key specified")]
    MissingKey,
    #[error("Multiple keys specified: already have key, found '{0}'")]
    MultipleKeys(String),
    #[error("Unknown key: '{0}'")]
    UnknownInput(String),
}

/// Parse a key combination string into a [`Combination`].
///
/// Supported format: "Modifier+Modifier+Key"
///
/// Modifiers:
/// - `Ctrl`, `Control` - Control key
/// - `Alt`, `Option`, `Opt` - Alt/Option key
/// - `Shift` - Shift key
/// - `Cmd`, `Command`, `Super`, `Meta` - Command key
///
/// Keys:
/// - Single characters: `A`, `s`, `1`, `/`, `+`, etc.
/// - Named keys: `Left`, `Right`, `Up`, `Down`, `Escape`, `Backspace`,
///   `Delete`, `Tab`, `Return`/`Enter`, `Space`
/// - `Unassigned` - the sentinel of a deactivated binding (takes no modifiers)
pub fn parse_combination(s: &str) -> Result<Combination, ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err(ParseError::Empty);
    }

    // "+" as the key itself: "Cmd++" or a lone "+".
    let (modifier_part, trailing_plus) = if trimmed == "+" {
        ("", true)
    } else if let Some(rest) = trimmed.strip_suffix("++") {
        (rest, true)
    } else {
        (trimmed, false)
    };

    let parts: Vec<&str> = if modifier_part.is_empty() {
        Vec::new()
    } else {
        modifier_part.split('+').map(str::trim).collect()
    };

    let mut modifiers = Modifiers::empty();
    let mut key_part: Option<&str> = None;

    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;

        match parse_modifier(part) {
            Some(modifier) => {
                modifiers |= modifier;
                if is_last && !trailing_plus {
                    return Err(ParseError::MissingKey);
                }
            }
            None => {
                if key_part.is_some() || trailing_plus {
                    return Err(ParseError::MultipleKeys(part.to_string()));
                }
                if part.is_empty() {
                    return Err(ParseError::MissingKey);
                }
                key_part = Some(part);
            }
        }
    }

    let input = if trailing_plus {
        Input::character('+')
    } else {
        let key_str = key_part.ok_or(ParseError::MissingKey)?;
        parse_input(key_str)?
    };

    Ok(Combination::new(input, modifiers))
}

/// Parse a modifier name.
fn parse_modifier(s: &str) -> Option<Modifiers> {
    match s.to_lowercase().as_str() {
        "ctrl" | "control" => Some(Modifiers::CONTROL),
        "alt" | "option" | "opt" => Some(Modifiers::ALTERNATE),
        "shift" => Some(Modifiers::SHIFT),
        "cmd" | "command" | "super" | "meta" => Some(Modifiers::COMMAND),
        _ => None,
    }
}

/// Parse a key string into an [`Input`].
fn parse_input(s: &str) -> Result<Input, ParseError> {
    // Try named keys first (case-insensitive)
    if let Some(input) = parse_named_input(s) {
        return Ok(input);
    }

    // Single character
    let mut chars = s.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Ok(Input::character(c));
    }

    Err(ParseError::UnknownInput(s.to_string()))
}

/// Parse a named key string.
fn parse_named_input(s: &str) -> Option<Input> {
    let named = match s.to_lowercase().as_str() {
        // Arrow keys
        "left" | "leftarrow" | "arrowleft" => NamedInput::LeftArrow,
        "right" | "rightarrow" | "arrowright" => NamedInput::RightArrow,
        "up" | "uparrow" | "arrowup" => NamedInput::UpArrow,
        "down" | "downarrow" | "arrowdown" => NamedInput::DownArrow,

        // Editing keys
        "escape" | "esc" => NamedInput::Escape,
        "backspace" => NamedInput::Backspace,
        "delete" | "del" => NamedInput::Delete,
        "tab" => NamedInput::Tab,
        "return" | "enter" => NamedInput::Return,

        "space" => return Some(Input::character(' ')),
        "unassigned" => return Some(Input::Unassigned),
        _ => return None,
    };
    Some(Input::Named(named))
}
