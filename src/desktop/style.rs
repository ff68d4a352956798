use ratatui::style::Style;

use super::Desktop;
use crate::config::ConfigStore;
use crate::error::Result;
use crate::theme::parse_style;
use crate::window::WindowId;

impl Desktop {
    /// Look `key` up for `id`: its own config node, then each class of its
    /// lineage, then the global node.
    pub fn get_setting(&self, id: WindowId, key: &str) -> Option<&str> {
        let window = self.tree.get(id)?;
        let lineage = self
            .classes
            .lineage(window.class)
            .iter()
            .filter_map(|class| self.classes.name(*class));
        self.config.lookup(window.name.as_deref(), lineage, key)
    }

    /// Parsed style setting. A malformed value is logged and ignored.
    pub fn style_setting(&self, id: WindowId, key: &str) -> Option<Style> {
        let raw = self.get_setting(id, key)?;
        match parse_style(raw) {
            Ok(style) => Some(style),
            Err(err) => {
                tracing::warn!(window = %id, key, %err, "ignoring malformed style");
                None
            }
        }
    }

    /// Apply the style stored under `key` to the window's colors. Returns
    /// `Ok(false)` when no setting applies.
    pub fn apply_style(&mut self, id: WindowId, key: &str) -> Result<bool> {
        let Some(raw) = self.get_setting(id, key) else {
            return Ok(false);
        };
        let style = parse_style(raw)?;
        self.set_colors(id, style)?;
        Ok(true)
    }

    pub fn set_config(&mut self, config: ConfigStore) -> Result<()> {
        self.bindings = crate::keybindings::KeyBindings::from_config(&config)?;
        self.config = config;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WmError;
    use crate::geometry::{Rect, WindowFlags};
    use indoc::indoc;
    use ratatui::style::{Color, Modifier};

    fn desktop() -> Desktop {
        let config = ConfigStore::parse(indoc! {"
            global.text = white:black
            class.frame.text = yellow:blue:bold
            class.dialog.border = cyan
            window.about.text = red
            window.broken.text = nocolor:black
        "})
        .unwrap();
        let mut desktop = Desktop::with_config(40, 10, config).unwrap();
        desktop.classes_mut().register("frame", None).unwrap();
        desktop.classes_mut().register("dialog", Some("frame")).unwrap();
        desktop
    }

    #[test]
    fn settings_resolve_through_name_lineage_and_global() {
        let mut desktop = desktop();
        let root = desktop.root();
        let plain = desktop
            .create_window(root, Rect::new(0, 0, 5, 5), WindowFlags::BORDER)
            .unwrap();
        let dialog = desktop
            .create_window_with_class(root, Rect::new(0, 0, 5, 5), WindowFlags::BORDER, "dialog")
            .unwrap();
        assert_eq!(desktop.get_setting(plain, "text"), Some("white:black"));
        assert_eq!(desktop.get_setting(dialog, "text"), Some("yellow:blue:bold"));
        assert_eq!(desktop.get_setting(dialog, "border"), Some("cyan"));
        assert_eq!(desktop.get_setting(plain, "border"), None);

        desktop.set_name(dialog, "about").unwrap();
        assert_eq!(desktop.get_setting(dialog, "text"), Some("red"));
    }

    #[test]
    fn apply_style_sets_colors() {
        let mut desktop = desktop();
        let root = desktop.root();
        let w = desktop
            .create_window_with_class(root, Rect::new(0, 0, 5, 5), WindowFlags::BORDER, "frame")
            .unwrap();
        assert!(desktop.apply_style(w, "text").unwrap());
        let state = desktop.render_state(w).unwrap();
        assert_eq!(state.fg, Color::Yellow);
        assert_eq!(state.bg, Color::Blue);
        assert!(state.attr.contains(Modifier::BOLD));
        assert!(!desktop.apply_style(w, "missing").unwrap());
    }

    #[test]
    fn malformed_style_is_reported() {
        let mut desktop = desktop();
        let root = desktop.root();
        let w = desktop
            .create_window(root, Rect::new(0, 0, 5, 5), WindowFlags::BORDER)
            .unwrap();
        desktop.set_name(w, "broken").unwrap();
        assert!(desktop.style_setting(w, "text").is_none());
        assert!(matches!(
            desktop.apply_style(w, "text"),
            Err(WmError::InvalidStyle(_))
        ));
    }
}
