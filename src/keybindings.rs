use std::fmt;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::ConfigStore;
use crate::error::{Result, WmError};

/// Window-management actions run by the default key-down handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    FocusNext,
    FocusPrev,
    Close,
    ToggleMaximize,
    Reposition,
    Resize,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Quit,
        Action::FocusNext,
        Action::FocusPrev,
        Action::Close,
        Action::ToggleMaximize,
        Action::Reposition,
        Action::Resize,
    ];

    /// Config name, as in `global.keys.<name>`.
    pub fn config_name(self) -> &'static str {
        match self {
            Action::Quit => "quit",
            Action::FocusNext => "focus_next",
            Action::FocusPrev => "focus_prev",
            Action::Close => "close",
            Action::ToggleMaximize => "toggle_maximize",
            Action::Reposition => "reposition",
            Action::Resize => "resize",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Action::Quit => "Quit",
            Action::FocusNext => "Focus next window",
            Action::FocusPrev => "Focus previous window",
            Action::Close => "Close window",
            Action::ToggleMaximize => "Maximize / restore",
            Action::Reposition => "Move window",
            Action::Resize => "Resize window",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyCombo {
    pub code: KeyCode,
    pub mods: KeyModifiers,
}

impl KeyCombo {
    pub fn new(code: KeyCode, mods: KeyModifiers) -> Self {
        Self { code, mods }
    }

    /// Letters compare case-insensitively: terminals report Shift+q as
    /// `Char('Q')` with SHIFT set.
    pub fn matches(&self, key: &KeyEvent) -> bool {
        let same_code = match (key.code, self.code) {
            (KeyCode::Char(got), KeyCode::Char(want)) => got.eq_ignore_ascii_case(&want),
            (got, want) => got == want,
        };
        same_code && key.modifiers == self.mods
    }

    /// Parse one combo such as `<Ctrl-q>`, `<Shift-F5>` or `<Tab>`. The
    /// angle brackets are optional.
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = || WmError::InvalidKeyBinding(text.to_string());
        let inner = text.trim();
        let inner = inner
            .strip_prefix('<')
            .and_then(|rest| rest.strip_suffix('>'))
            .unwrap_or(inner);
        if inner.is_empty() {
            return Err(invalid());
        }

        let mut mods = KeyModifiers::NONE;
        let mut rest = inner;
        loop {
            let Some((prefix, tail)) = rest.split_once('-') else {
                break;
            };
            // `Ctrl--` binds the minus key itself.
            if tail.is_empty() {
                break;
            }
            match prefix.to_ascii_lowercase().as_str() {
                "ctrl" | "c" => mods |= KeyModifiers::CONTROL,
                "alt" | "a" | "meta" | "m" => mods |= KeyModifiers::ALT,
                "shift" | "s" => mods |= KeyModifiers::SHIFT,
                _ => return Err(invalid()),
            }
            rest = tail;
        }

        let code = parse_key_name(rest).ok_or_else(invalid)?;
        Ok(Self::new(code, mods))
    }

    /// Parse `"<Key1>;<Key2>"`: alternatives bound to one action.
    pub fn parse_list(text: &str) -> Result<Vec<Self>> {
        text.split(';')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Self::parse)
            .collect()
    }

    pub fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.mods.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.mods.contains(KeyModifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.mods.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        let code = match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::BackTab => "BackTab".to_string(),
            other => format!("{other:?}"),
        };
        parts.push(code);
        parts.join("+")
    }
}

impl fmt::Display for KeyCombo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

fn parse_key_name(name: &str) -> Option<KeyCode> {
    let mut chars = name.chars();
    if let (Some(c), None) = (chars.next(), chars.next()) {
        return Some(KeyCode::Char(c.to_ascii_lowercase()));
    }
    let lower = name.to_ascii_lowercase();
    let code = match lower.as_str() {
        "tab" => KeyCode::Tab,
        "backtab" => KeyCode::BackTab,
        "enter" | "return" => KeyCode::Enter,
        "esc" | "escape" => KeyCode::Esc,
        "space" => KeyCode::Char(' '),
        "backspace" => KeyCode::Backspace,
        "delete" | "del" => KeyCode::Delete,
        "insert" | "ins" => KeyCode::Insert,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "home" => KeyCode::Home,
        "end" => KeyCode::End,
        "pageup" | "pgup" => KeyCode::PageUp,
        "pagedown" | "pgdn" => KeyCode::PageDown,
        f if f.starts_with('f') => {
            let n: u8 = f[1..].parse().ok()?;
            if !(1..=24).contains(&n) {
                return None;
            }
            KeyCode::F(n)
        }
        _ => return None,
    };
    Some(code)
}

#[derive(Debug, Clone)]
pub struct KeyBindings {
    map: Vec<(Action, Vec<KeyCombo>)>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use Action::*;
        let mut kb = Self::empty();
        kb.add(Quit, KeyCombo::new(KeyCode::Char('q'), KeyModifiers::CONTROL));
        kb.add(FocusNext, KeyCombo::new(KeyCode::Tab, KeyModifiers::NONE));
        kb.add(FocusPrev, KeyCombo::new(KeyCode::BackTab, KeyModifiers::NONE));
        kb.add(Close, KeyCombo::new(KeyCode::Char('w'), KeyModifiers::CONTROL));
        kb.add(ToggleMaximize, KeyCombo::new(KeyCode::F(5), KeyModifiers::NONE));
        kb.add(Reposition, KeyCombo::new(KeyCode::F(7), KeyModifiers::NONE));
        kb.add(Resize, KeyCombo::new(KeyCode::F(8), KeyModifiers::NONE));
        kb
    }
}

impl KeyBindings {
    pub fn empty() -> Self {
        Self { map: Vec::new() }
    }

    /// Defaults overridden by any `global.keys.<action>` entries.
    pub fn from_config(config: &ConfigStore) -> Result<Self> {
        let mut kb = Self::default();
        for action in Action::ALL {
            let key = format!("global.keys.{}", action.config_name());
            if let Some(value) = config.get(&key) {
                kb.set(action, KeyCombo::parse_list(value)?);
            }
        }
        Ok(kb)
    }

    pub fn add(&mut self, action: Action, combo: KeyCombo) {
        match self.map.iter_mut().find(|(a, _)| *a == action) {
            Some((_, list)) => list.push(combo),
            None => self.map.push((action, vec![combo])),
        }
    }

    /// Replace every combo bound to `action`.
    pub fn set(&mut self, action: Action, combos: Vec<KeyCombo>) {
        self.map.retain(|(a, _)| *a != action);
        if !combos.is_empty() {
            self.map.push((action, combos));
        }
    }

    pub fn matches(&self, action: Action, key: &KeyEvent) -> bool {
        self.map
            .iter()
            .any(|(a, list)| *a == action && list.iter().any(|c| c.matches(key)))
    }

    /// First action bound to `key`, in `Action::ALL` order.
    pub fn action_for_key(&self, key: &KeyEvent) -> Option<Action> {
        Action::ALL
            .into_iter()
            .find(|action| self.matches(*action, key))
    }

    pub fn combos_for(&self, action: Action) -> Vec<String> {
        self.map
            .iter()
            .filter(|(a, _)| *a == action)
            .flat_map(|(_, list)| list.iter().map(KeyCombo::display))
            .collect()
    }
}
