//! Key combinations: a non-modifier input plus a set of modifiers.
//!
//! Character inputs are stored lower-cased, so two combinations compare equal
//! regardless of the case they were declared or captured in.

use bitflags::bitflags;
use keycommand_config::StoredCombination;
use std::fmt;
use std::str::FromStr;

use crate::parser::ParseError;

/// Canonical string of the unassigned sentinel input.
pub const UNASSIGNED_INPUT: &str = "Unassigned";

bitflags! {
    /// Set of modifier keys held for a combination.
    ///
    /// Bit values are persisted and must stay stable.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct Modifiers: u8 {
        /// Control key
        const CONTROL = 1;
        /// Alt/Option key
        const ALTERNATE = 2;
        /// Shift key
        const SHIFT = 4;
        /// Command key
        const COMMAND = 8;
    }
}

/// Symbolic (non-printable) inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedInput {
    LeftArrow,
    RightArrow,
    UpArrow,
    DownArrow,
    Escape,
    Backspace,
    Delete,
    Tab,
    Return,
}

impl NamedInput {
    /// Every named input, in declaration order.
    pub const ALL: [NamedInput; 9] = [
        NamedInput::LeftArrow,
        NamedInput::RightArrow,
        NamedInput::UpArrow,
        NamedInput::DownArrow,
        NamedInput::Escape,
        NamedInput::Backspace,
        NamedInput::Delete,
        NamedInput::Tab,
        NamedInput::Return,
    ];

    /// Canonical (persisted) name.
    pub fn as_str(self) -> &'static str {
        match self {
            NamedInput::LeftArrow => "LeftArrow",
            NamedInput::RightArrow => "RightArrow",
            NamedInput::UpArrow => "UpArrow",
            NamedInput::DownArrow => "DownArrow",
            NamedInput::Escape => "Escape",
            NamedInput::Backspace => "Backspace",
            NamedInput::Delete => "Delete",
            NamedInput::Tab => "Tab",
            NamedInput::Return => "Return",
        }
    }
}

/// The non-modifier part of a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Input {
    /// A printable character, stored lower-cased.
    Character(char),
    /// A symbolic key.
    Named(NamedInput),
    /// Sentinel of an explicitly unassigned binding. Never matches anything.
    Unassigned,
}

impl Input {
    /// Character input, normalized for case-insensitive comparison.
    pub fn character(c: char) -> Self {
        let mut lower = c.to_lowercase();
        match (lower.next(), lower.next()) {
            (Some(l), None) => Input::Character(l),
            // Characters whose lower-case form expands keep their original form.
            _ => Input::Character(c),
        }
    }

    /// Canonical string representation, as persisted.
    pub fn as_canonical(&self) -> String {
        match self {
            Input::Character(c) => c.to_string(),
            Input::Named(named) => named.as_str().to_string(),
            Input::Unassigned => UNASSIGNED_INPUT.to_string(),
        }
    }

    /// Whether this is the unassigned sentinel.
    pub fn is_unassigned(&self) -> bool {
        matches!(self, Input::Unassigned)
    }
}

impl FromStr for Input {
    type Err = ParseError;

    /// Parse a canonical input string.
    ///
    /// Accepts exactly what [`Input::as_canonical`] produces (named inputs are
    /// matched case-insensitively).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Input::character(c));
        }
        if s.eq_ignore_ascii_case(UNASSIGNED_INPUT) {
            return Ok(Input::Unassigned);
        }
        NamedInput::ALL
            .into_iter()
            .find(|named| s.eq_ignore_ascii_case(named.as_str()))
            .map(Input::Named)
            .ok_or_else(|| ParseError::UnknownInput(s.to_string()))
    }
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::Character(' ') => write!(f, "Space"),
            Input::Character(c) => {
                // Upper-case forms that expand ("ß" -> "SS") would not parse back.
                let mut upper = c.to_uppercase();
                match (upper.next(), upper.next()) {
                    (Some(u), None) => write!(f, "{}", u),
                    _ => write!(f, "{}", c),
                }
            }
            Input::Named(named) => write!(f, "{}", named.as_str()),
            Input::Unassigned => write!(f, "{}", UNASSIGNED_INPUT),
        }
    }
}

/// An (input, modifiers) pair identifying a physical key chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Combination {
    pub input: Input,
    pub modifiers: Modifiers,
}

impl Combination {
    /// Create a combination. The unassigned sentinel always drops modifiers.
    pub fn new(input: Input, modifiers: Modifiers) -> Self {
        if input.is_unassigned() {
            return Self::unassigned();
        }
        Self { input, modifiers }
    }

    /// Character combination.
    pub fn character(c: char, modifiers: Modifiers) -> Self {
        Self::new(Input::character(c), modifiers)
    }

    /// Named-key combination.
    pub fn named(named: NamedInput, modifiers: Modifiers) -> Self {
        Self::new(Input::Named(named), modifiers)
    }

    /// The unassigned sentinel combination.
    pub const fn unassigned() -> Self {
        Self {
            input: Input::Unassigned,
            modifiers: Modifiers::empty(),
        }
    }

    /// Whether this is the unassigned sentinel.
    pub fn is_unassigned(&self) -> bool {
        self.input.is_unassigned()
    }

    /// Persisted form of this combination.
    pub fn to_stored(&self) -> StoredCombination {
        StoredCombination::new(self.input.as_canonical(), u64::from(self.modifiers.bits()))
    }

    /// Rebuild a combination from its persisted form. Unknown modifier bits are
    /// dropped.
    pub fn from_stored(stored: &StoredCombination) -> Result<Self, ParseError> {
        let input = stored.input.parse::<Input>()?;
        let known = stored.modifiers & u64::from(Modifiers::all().bits());
        let modifiers = u8::try_from(known).map_or(Modifiers::empty(), Modifiers::from_bits_truncate);
        Ok(Self::new(input, modifiers))
    }
}

impl fmt::Display for Combination {
    /// Renders `Ctrl+Alt+Shift+Cmd+<key>`, which the parser accepts back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();

        if self.modifiers.contains(Modifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(Modifiers::ALTERNATE) {
            parts.push("Alt".to_string());
        }
        if self.modifiers.contains(Modifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.modifiers.contains(Modifiers::COMMAND) {
            parts.push("Cmd".to_string());
        }
        parts.push(self.input.to_string());

        write!(f, "{}", parts.join("+"))
    }
}
