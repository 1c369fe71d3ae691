use crate::canvas::{Command, Document};
use crate::types::{Color, Rect};
use std::fmt::Write as _;

const SVG_OPEN: &str =
    "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\"";

/// Encodes a recorded document as SVG markup. Output depends only on the
/// command list, so identical documents always produce identical bytes.
pub(crate) fn document_to_svg(document: &Document) -> Vec<u8> {
    let mut out = String::with_capacity(256 + document.commands.len() * 160);
    let _ = writeln!(
        out,
        "{SVG_OPEN} width=\"{}\" height=\"{}\">",
        document.size.width, document.size.height
    );

    if let Some(background) = document.background {
        if !background.is_transparent() {
            let full = Rect::new(
                0,
                0,
                document.size.width as i32,
                document.size.height as i32,
            );
            write_rect(&mut out, full, &fill_style(background));
        }
    }

    for cmd in &document.commands {
        match cmd {
            Command::FillRect { rect, color } => write_rect(&mut out, *rect, &fill_style(*color)),
            Command::StrokeRect { rect, color, width } => {
                write_rect(&mut out, *rect, &stroke_style(*color, *width))
            }
            Command::Text {
                x,
                y,
                text,
                color,
                font_size,
            } => {
                let _ = write!(
                    out,
                    "<text x=\"{x}\" y=\"{y}\" style=\"{};font-size:{:.1}px;font-family:{}\">{}</text>",
                    fill_style(*color),
                    document.font_size_px(*font_size),
                    escape_attr(&document.font_family),
                    escape_text(text)
                );
            }
        }
    }

    out.push_str("</svg>");
    out.into_bytes()
}

fn write_rect(out: &mut String, rect: Rect, style: &str) {
    let (left, top, right, bottom) = (rect.x, rect.y, rect.right(), rect.bottom());
    let _ = write!(
        out,
        "<path d=\"M {left} {top}\nL {right} {top}\nL {right} {bottom}\nL {left} {bottom}\nL {left} {top}\" style=\"{style}\"/>"
    );
}

fn fill_style(color: Color) -> String {
    format!("stroke-width:0;stroke:none;fill:{}", color.css_rgba())
}

fn stroke_style(color: Color, width: f32) -> String {
    format!(
        "stroke-width:{};stroke:{};fill:none",
        format_number(width),
        color.css_rgba()
    )
}

// Integers print without a fractional part; everything else keeps at most two decimals.
fn format_number(value: f32) -> String {
    if value.fract() == 0.0 {
        return format!("{}", value as i64);
    }
    let text = format!("{value:.2}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}

// Attribute values are double-quoted, so single quotes in font lists stay as-is.
fn escape_attr(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
