// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellMode {
    #[default]
    View,
    Edit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Number,
}

impl InputKind {
    fn accepts(self, ch: char) -> bool {
        match self {
            Self::Text => !ch.is_control(),
            Self::Number => ch.is_ascii_digit() || matches!(ch, '.' | '-' | '+' | 'e' | 'E'),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKey {
    Enter,
    Backspace,
    Char(char),
}

/// View/edit toggle for one table cell.
///
/// The cell never holds the value: callers pass the current value in and
/// apply the returned replacement themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditableCell {
    mode: CellMode,
    input: InputKind,
}

impl EditableCell {
    pub const fn new(input: InputKind) -> Self {
        Self {
            mode: CellMode::View,
            input,
        }
    }

    pub const fn mode(self) -> CellMode {
        self.mode
    }

    pub fn is_editing(self) -> bool {
        self.mode == CellMode::Edit
    }

    pub fn focus(&mut self) {
        self.mode = CellMode::Edit;
    }

    pub fn blur(&mut self) {
        self.mode = CellMode::View;
    }

    /// Returns the replacement value when the key changed it.
    pub fn handle_key(&mut self, key: CellKey, value: &str) -> Option<String> {
        match key {
            CellKey::Enter => {
                self.mode = CellMode::View;
                None
            }
            _ if self.mode == CellMode::View => None,
            CellKey::Backspace => {
                let mut next = value.to_owned();
                next.pop()?;
                Some(next)
            }
            CellKey::Char(ch) if self.input.accepts(ch) => {
                let mut next = value.to_owned();
                next.push(ch);
                Some(next)
            }
            CellKey::Char(_) => None,
        }
    }
}
