use crate::types::Color;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_SIZE: f32 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
    Grafana,
    Ant,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Light, Theme::Dark, Theme::Grafana, Theme::Ant];

    pub fn name(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Grafana => "grafana",
            Theme::Ant => "ant",
        }
    }

    /// Case-insensitive lookup; unknown names fall back to `Light`.
    pub fn from_name(name: &str) -> Theme {
        let wanted = name.trim();
        Theme::ALL
            .into_iter()
            .find(|theme| theme.name().eq_ignore_ascii_case(wanted))
            .unwrap_or_default()
    }

    pub fn palette(self) -> Palette {
        match self {
            Theme::Light | Theme::Ant => Palette::light(),
            Theme::Dark => Palette {
                background: Color::rgb(16, 12, 42),
                table_header_background: Color::rgb(38, 38, 42),
                table_header_text: Color::rgb(216, 217, 218),
                table_body_text: Color::rgb(238, 238, 238),
                table_row_backgrounds: [Color::rgb(16, 22, 30), Color::rgb(24, 30, 38)],
                ..Palette::light()
            },
            Theme::Grafana => Palette {
                background: Color::rgb(31, 29, 29),
                table_header_background: Color::rgb(52, 50, 50),
                table_header_text: Color::rgb(216, 217, 218),
                table_body_text: Color::rgb(216, 217, 218),
                table_row_backgrounds: [Color::rgb(31, 29, 29), Color::rgb(40, 38, 38)],
                ..Palette::light()
            },
        }
    }
}

/// Colors and font size a table reads when its spec leaves them unset.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    /// Canvas fill behind the table.
    pub background: Color,
    pub font_size: f32,
    pub table_header_background: Color,
    pub table_header_text: Color,
    pub table_body_text: Color,
    /// Even rows use `[0]`, odd rows `[1]`.
    pub table_row_backgrounds: [Color; 2],
}

impl Palette {
    fn light() -> Self {
        Self {
            background: Color::WHITE,
            font_size: DEFAULT_FONT_SIZE,
            table_header_background: Color::rgb(240, 240, 240),
            table_header_text: Color::rgb(98, 105, 118),
            table_body_text: Color::rgb(70, 70, 70),
            table_row_backgrounds: [Color::WHITE, Color::rgb(247, 247, 247)],
        }
    }
}

impl Default for Palette {
    fn default() -> Self {
        Theme::Light.palette()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_theme_names_fall_back_to_light() {
        assert_eq!(Theme::from_name("DARK"), Theme::Dark);
        assert_eq!(Theme::from_name(" grafana "), Theme::Grafana);
        assert_eq!(Theme::from_name("solarized"), Theme::Light);
    }

    #[test]
    fn light_palette_carries_table_defaults() {
        let palette = Theme::Light.palette();
        assert_eq!(palette.background, Color::WHITE);
        assert_eq!(palette.table_header_background, Color::rgb(240, 240, 240));
        assert_eq!(palette.table_header_text, Color::rgb(98, 105, 118));
        assert_eq!(palette.table_body_text, Color::rgb(70, 70, 70));
        assert_eq!(
            palette.table_row_backgrounds,
            [Color::WHITE, Color::rgb(247, 247, 247)]
        );
        assert_eq!(palette.font_size, DEFAULT_FONT_SIZE);
        assert_eq!(Theme::Ant.palette(), palette);
    }

    #[test]
    fn dark_themes_swap_table_colors() {
        let light = Palette::default();
        for theme in [Theme::Dark, Theme::Grafana] {
            let palette = theme.palette();
            assert_ne!(palette.background, light.background, "{}", theme.name());
            assert_ne!(palette.table_body_text, light.table_body_text);
            assert_eq!(palette.font_size, light.font_size);
        }
    }

    #[test]
    fn names_round_trip() {
        for theme in Theme::ALL {
            assert_eq!(Theme::from_name(theme.name()), theme);
        }
    }
}
