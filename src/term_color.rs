use ratatui::style::Color;

use crate::error::{Result, WmError};

/// Map an RGB triple to a `Color` the current terminal can show: truecolor
/// when `COLORTERM` advertises it, otherwise the nearest xterm-256 index.
pub fn map_rgb_to_color(r: u8, g: u8, b: u8) -> Color {
    if let Ok(var) = std::env::var("COLORTERM") {
        let lv = var.to_lowercase();
        if lv.contains("truecolor") || lv.contains("24bit") {
            return Color::Rgb(r, g, b);
        }
    }
    Color::Indexed(rgb_to_xterm_index(r, g, b))
}

/// Parse one color token of a style string: a named ANSI color, `default`,
/// an xterm index (`0..=255`) or `#rrggbb`.
pub fn parse_color(token: &str) -> Result<Color> {
    let lower = token.trim().to_ascii_lowercase();
    let color = match lower.as_str() {
        "default" | "reset" | "" => Color::Reset,
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" | "brown" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "gray" | "grey" | "lightgray" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        "white" => Color::White,
        hex if hex.starts_with('#') => {
            let (r, g, b) = parse_hex(hex).ok_or_else(|| WmError::InvalidStyle(token.into()))?;
            map_rgb_to_color(r, g, b)
        }
        other => other
            .parse::<u8>()
            .map(Color::Indexed)
            .map_err(|_| WmError::InvalidStyle(token.to_string()))?,
    };
    Ok(color)
}

fn parse_hex(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&digits[range], 16).ok();
    Some((channel(0..2)?, channel(2..4)?, channel(4..6)?))
}

fn rgb_to_xterm_index(r: u8, g: u8, b: u8) -> u8 {
    let (r6, g6, b6) = (to_6cube(r), to_6cube(g), to_6cube(b));
    let cube_index = 16 + 36 * r6 + 6 * g6 + b6;
    let (cr, cg, cb) = from_6cube(r6, g6, b6);

    // The 24-step gray ramp (232..=255) is sometimes closer than the cube.
    let gray_index = rgb_to_gray_index(r, g, b);
    let (gr, gg, gb) = from_gray(gray_index);

    if color_distance_sq((r, g, b), (gr, gg, gb)) < color_distance_sq((r, g, b), (cr, cg, cb)) {
        232 + gray_index
    } else {
        cube_index
    }
}

fn to_6cube(v: u8) -> u8 {
    ((v as u16 * 5 + 127) / 255) as u8
}

fn from_6cube(r6: u8, g6: u8, b6: u8) -> (u8, u8, u8) {
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    let level = |c: u8| LEVELS.get(c as usize).copied().unwrap_or(0);
    (level(r6), level(g6), level(b6))
}

fn rgb_to_gray_index(r: u8, g: u8, b: u8) -> u8 {
    let avg = (r as u16 + g as u16 + b as u16) / 3;
    ((avg * 23 + 127) / 255) as u8
}

fn from_gray(idx: u8) -> (u8, u8, u8) {
    let v = (8 + idx as u16 * 10).min(255) as u8;
    (v, v, v)
}

fn color_distance_sq(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let d = |x: u8, y: u8| {
        let diff = x as i32 - y as i32;
        (diff * diff) as u32
    };
    d(a.0, b.0) + d(a.1, b.1) + d(a.2, b.2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_and_indexed_colors() {
        assert_eq!(parse_color("Blue").unwrap(), Color::Blue);
        assert_eq!(parse_color("default").unwrap(), Color::Reset);
        assert_eq!(parse_color("202").unwrap(), Color::Indexed(202));
        assert!(matches!(parse_color("chartreuse"), Err(WmError::InvalidStyle(_))));
    }

    #[test]
    fn hex_colors_map_to_rgb_or_index() {
        match parse_color("#ff8000").unwrap() {
            Color::Rgb(255, 128, 0) | Color::Indexed(_) => {}
            other => panic!("unexpected color {other:?}"),
        }
        assert!(parse_color("#ff80").is_err());
        assert!(parse_color("#gg0000").is_err());
    }

    #[test]
    fn pure_cube_colors_hit_their_cube_index() {
        assert_eq!(rgb_to_xterm_index(255, 0, 0), 196);
        assert_eq!(rgb_to_xterm_index(0, 0, 255), 21);
    }

    #[test]
    fn mid_grays_prefer_the_gray_ramp() {
        let idx = rgb_to_xterm_index(128, 128, 128);
        assert!((232..=255).contains(&idx));
    }
}
