use ratatui::style::{Color, Modifier, Style};

use crate::error::{Result, WmError};
use crate::term_color::parse_color;

/// Parse a `"fg:bg:attrib,attrib"` style. Trailing parts may be omitted;
/// an omitted or empty color leaves that channel unset.
pub fn parse_style(spec: &str) -> Result<Style> {
    let mut parts = spec.splitn(3, ':');
    let mut style = Style::default();
    if let Some(fg) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
        style = style.fg(parse_color(fg)?);
    }
    if let Some(bg) = parts.next().map(str::trim).filter(|s| !s.is_empty()) {
        style = style.bg(parse_color(bg)?);
    }
    if let Some(attrs) = parts.next() {
        for attr in attrs.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            style = style.add_modifier(parse_attribute(attr)?);
        }
    }
    Ok(style)
}

fn parse_attribute(name: &str) -> Result<Modifier> {
    let modifier = match name.to_ascii_lowercase().as_str() {
        "bold" => Modifier::BOLD,
        "dim" => Modifier::DIM,
        "italic" => Modifier::ITALIC,
        "underline" | "underlined" => Modifier::UNDERLINED,
        "blink" => Modifier::SLOW_BLINK,
        "reverse" => Modifier::REVERSED,
        "hidden" => Modifier::HIDDEN,
        "crossed" | "strikethrough" => Modifier::CROSSED_OUT,
        "normal" | "none" => Modifier::empty(),
        _ => return Err(WmError::InvalidStyle(name.to_string())),
    };
    Ok(modifier)
}

// Decoration defaults, used when no `border`/`caption` setting applies.

pub fn decorator_header_focused() -> Style {
    Style::default()
        .bg(Color::Blue)
        .fg(Color::White)
        .add_modifier(Modifier::BOLD)
}

pub fn decorator_header() -> Style {
    Style::default().bg(Color::DarkGray).fg(Color::White)
}

pub fn decorator_border() -> Style {
    Style::default().fg(Color::DarkGray).bg(Color::Reset)
}

pub fn decorator_border_focused() -> Style {
    Style::default().fg(Color::White).bg(Color::Reset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_style_with_attributes() {
        let style = parse_style("yellow:blue:bold,underline").unwrap();
        assert_eq!(style.fg, Some(Color::Yellow));
        assert_eq!(style.bg, Some(Color::Blue));
        assert!(style.add_modifier.contains(Modifier::BOLD | Modifier::UNDERLINED));
    }

    #[test]
    fn partial_styles_leave_channels_unset() {
        let fg_only = parse_style("red").unwrap();
        assert_eq!(fg_only.fg, Some(Color::Red));
        assert_eq!(fg_only.bg, None);

        let bg_only = parse_style(":green").unwrap();
        assert_eq!(bg_only.fg, None);
        assert_eq!(bg_only.bg, Some(Color::Green));

        let attrs_only = parse_style("::reverse").unwrap();
        assert!(attrs_only.add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn unknown_attribute_is_rejected() {
        assert!(matches!(
            parse_style("white:black:sparkly"),
            Err(WmError::InvalidStyle(attr)) if attr == "sparkly"
        ));
    }
}
