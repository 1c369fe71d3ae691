/// Fixed-ratio text measurement used for wrap decisions. Glyph widths are
/// approximated as `glyph_width_ratio * font_size_px` for every character.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMeasurer {
    glyph_width_ratio: f32,
}

impl TextMeasurer {
    pub fn new(glyph_width_ratio: f32) -> Self {
        Self { glyph_width_ratio }
    }

    pub fn avg_glyph_width(&self, font_size_px: f32) -> f64 {
        self.glyph_width_ratio as f64 * font_size_px as f64
    }

    pub fn estimate_width(&self, text: &str, font_size_px: f32) -> f64 {
        text.chars().count() as f64 * self.avg_glyph_width(font_size_px)
    }

    pub fn max_chars_per_line(&self, column_width: i32, font_size_px: f32, padding: i32) -> usize {
        let interior = i64::from(column_width) - 2 * i64::from(padding);
        if interior <= 0 {
            return 0;
        }
        let glyph = self.avg_glyph_width(font_size_px);
        if !(glyph > 0.0) || !glyph.is_finite() {
            return usize::MAX;
        }
        (interior as f64 / glyph).floor() as usize
    }

    /// Greedy word wrap over whitespace-delimited tokens. A token longer than
    /// a line stays whole on its own line. Always returns at least one line.
    pub fn wrap(
        &self,
        text: &str,
        column_width: i32,
        font_size_px: f32,
        padding: i32,
    ) -> Vec<String> {
        let max_chars = self.max_chars_per_line(column_width, font_size_px, padding);
        wrap_tokens(text, max_chars)
    }
}

impl Default for TextMeasurer {
    fn default() -> Self {
        Self::new(0.5)
    }
}

fn wrap_tokens(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for token in text.split_whitespace() {
        let token_len = token.chars().count();
        if current.is_empty() {
            current.push_str(token);
            current_len = token_len;
            continue;
        }
        if current_len + 1 + token_len <= max_chars {
            current.push(' ');
            current.push_str(token);
            current_len += 1 + token_len;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(token);
            current_len = token_len;
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    // 12pt at 92 dpi.
    const FONT_PX: f32 = 12.0 * 92.0 / 72.0;

    #[test]
    fn derives_char_budget_from_interior_width() {
        let m = TextMeasurer::default();
        assert_eq!(m.max_chars_per_line(120, FONT_PX, 10), 13);
        assert_eq!(m.max_chars_per_line(20, FONT_PX, 10), 0);
        assert_eq!(m.max_chars_per_line(5, FONT_PX, 10), 0);
        assert_eq!(m.max_chars_per_line(i32::MAX, FONT_PX, i32::MAX), 0);
        assert_eq!(m.max_chars_per_line(i32::MIN, FONT_PX, 0), 0);
    }

    #[test]
    fn wraps_address_into_two_lines_in_narrow_column() {
        let m = TextMeasurer::default();
        let lines = m.wrap("New York No. 1 Lake Park", 120, FONT_PX, 10);
        assert_eq!(lines, vec!["New York No.", "1 Lake Park"]);
        let lines = m.wrap("New York No. 1 Lake Park", 300, FONT_PX, 10);
        assert_eq!(lines, vec!["New York No. 1 Lake Park"]);
    }

    #[test]
    fn long_token_stays_whole() {
        let m = TextMeasurer::default();
        let lines = m.wrap("a supercalifragilistic b", 60, FONT_PX, 10);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn empty_and_blank_text_yield_one_empty_line() {
        let m = TextMeasurer::default();
        assert_eq!(m.wrap("", 100, FONT_PX, 10), vec![String::new()]);
        assert_eq!(m.wrap(" \t ", 100, FONT_PX, 10), vec![String::new()]);
    }

    #[test]
    fn collapses_whitespace_between_tokens() {
        let m = TextMeasurer::default();
        assert_eq!(m.wrap("Jim Green\t", 300, FONT_PX, 10), vec!["Jim Green"]);
        assert_eq!(m.wrap("a \n  b", 300, FONT_PX, 10), vec!["a b"]);
    }

    #[test]
    fn lines_fit_unless_single_token() {
        let m = TextMeasurer::default();
        let samples = [
            "nice, developer",
            "London No. 1 Lake Park",
            "the quick brown fox jumps over the lazy dog",
            "x yy zzz wwww vvvvv uuuuuu ttttttt",
        ];
        for width in [40, 60, 80, 100, 120, 200, 300] {
            let interior = (width - 20) as f64;
            for text in samples {
                for line in m.wrap(text, width, FONT_PX, 10) {
                    let fits = m.estimate_width(&line, FONT_PX) <= interior;
                    let single = !line.contains(' ');
                    assert!(fits || single, "'{line}' overflows width {width}");
                }
            }
        }
    }

    #[test]
    fn wrap_is_deterministic() {
        let m = TextMeasurer::default();
        let a = m.wrap("Sidney No. 1 Lake Park", 120, FONT_PX, 10);
        let b = m.wrap("Sidney No. 1 Lake Park", 120, FONT_PX, 10);
        assert_eq!(a, b);
    }
}
