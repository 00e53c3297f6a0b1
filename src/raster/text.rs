//! Text rasterization: glyph outlines from ab_glyph turned into tiny-skia paths,
//! so rotation, flips and the export scale apply like for any other shape.

use ab_glyph::{Font, FontArc, GlyphId, OutlineCurve, PxScale, ScaleFont};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tiny_skia::{FillRule, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::capture::FontProvider;
use crate::element::{TextAlign, TextElement};

/// Stroke width of the simulated bold weight, relative to the font size
const FAUX_BOLD: f32 = 0.035;

/// Fonts resolved by family name, falling back to egui's bundled font.
pub struct FontCache {
    provider: Option<Arc<dyn FontProvider>>,
    fonts: HashMap<String, Option<FontArc>>,
}

impl FontCache {
    pub fn new(provider: Option<Arc<dyn FontProvider>>) -> Self {
        Self {
            provider,
            fonts: HashMap::new(),
        }
    }

    pub fn get(&mut self, family: &str) -> Option<FontArc> {
        if let Some(cached) = self.fonts.get(family) {
            return cached.clone();
        }
        let font = self
            .provider
            .as_ref()
            .and_then(|p| p.load_font(family))
            .and_then(|bytes| match FontArc::try_from_vec(bytes) {
                Ok(font) => Some(font),
                Err(e) => {
                    warn!("Font {family} could not be parsed: {e}");
                    None
                }
            })
            .or_else(bundled_font);
        if font.is_none() {
            warn!("No font available for family {family}");
        }
        self.fonts.insert(family.to_owned(), font.clone());
        font
    }
}

/// First proportional font egui ships with
fn bundled_font() -> Option<FontArc> {
    let defs = egui::FontDefinitions::default();
    let name = defs.families.get(&egui::FontFamily::Proportional)?.first()?.clone();
    let data = defs.font_data.get(&name)?;
    debug!("Falling back to bundled font {name}");
    FontArc::try_from_vec(data.font.to_vec()).ok()
}

/// Glyph outlines of every line, in element space.
pub fn text_path(text: &TextElement, font: &FontArc) -> Option<Path> {
    let scaled = font.as_scaled(PxScale::from(text.font.size));
    let lines: Vec<&str> = text.lines().collect();
    let widths: Vec<f32> = lines.iter().map(|line| line_width(line, &scaled, text.font.letter_spacing)).collect();
    let block = widths.iter().copied().fold(0.0_f32, f32::max);

    let mut builder = PathBuilder::new();
    for (i, line) in lines.iter().enumerate() {
        let indent = match text.font.align {
            TextAlign::Left => 0.0,
            TextAlign::Center => (block - widths[i]) / 2.0,
            TextAlign::Right => block - widths[i],
        };
        let baseline = text.position.y + i as f32 * text.line_advance() + scaled.ascent();
        let mut pen = text.position.x + indent;
        let mut prev: Option<GlyphId> = None;
        for ch in line.chars() {
            let id = font.glyph_id(ch);
            if let Some(prev) = prev {
                pen += scaled.kern(prev, id);
            }
            push_glyph(&mut builder, font, id, pen, baseline, scaled.h_scale_factor(), scaled.v_scale_factor());
            pen += scaled.h_advance(id) + text.font.letter_spacing;
            prev = Some(id);
        }
    }
    builder.finish()
}

fn line_width(line: &str, scaled: &ab_glyph::PxScaleFont<&FontArc>, spacing: f32) -> f32 {
    let mut width = 0.0;
    let mut prev: Option<GlyphId> = None;
    let mut count = 0;
    for ch in line.chars() {
        let id = scaled.font.glyph_id(ch);
        if let Some(prev) = prev {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        prev = Some(id);
        count += 1;
    }
    if count > 1 {
        width += spacing * (count - 1) as f32;
    }
    width
}

fn push_glyph(builder: &mut PathBuilder, font: &FontArc, id: GlyphId, x: f32, baseline: f32, sx: f32, sy: f32) {
    let Some(outline) = font.outline(id) else {
        return;
    };
    // Font units are y-up from the baseline
    let map = |p: ab_glyph::Point| (x + p.x * sx, baseline - p.y * sy);
    let mut last: Option<(f32, f32)> = None;
    for curve in &outline.curves {
        let (start, end) = match curve {
            OutlineCurve::Line(a, b) => (map(*a), map(*b)),
            OutlineCurve::Quad(a, _, c) => (map(*a), map(*c)),
            OutlineCurve::Cubic(a, _, _, d) => (map(*a), map(*d)),
        };
        if last != Some(start) {
            if last.is_some() {
                builder.close();
            }
            builder.move_to(start.0, start.1);
        }
        match curve {
            OutlineCurve::Line(_, _) => builder.line_to(end.0, end.1),
            OutlineCurve::Quad(_, b, _) => {
                let b = map(*b);
                builder.quad_to(b.0, b.1, end.0, end.1);
            }
            OutlineCurve::Cubic(_, b, c, _) => {
                let (b, c) = (map(*b), map(*c));
                builder.cubic_to(b.0, b.1, c.0, c.1, end.0, end.1);
            }
        }
        last = Some(end);
    }
    if last.is_some() {
        builder.close();
    }
}

/// Paint a text element. Shadow first, then outline, then the glyph fill.
pub fn draw_text(pixmap: &mut Pixmap, text: &TextElement, font: &FontArc, transform: Transform) {
    let Some(path) = text_path(text, font) else {
        return;
    };
    let opacity = text.opacity.clamp(0.0, 1.0);

    if let Some(shadow) = &text.shadow {
        let offset = transform.pre_translate(shadow.offset.x, shadow.offset.y);
        let paint = super::paint(shadow.color, opacity);
        if shadow.blur > 0.0 {
            if let Some(mut layer) = Pixmap::new(pixmap.width(), pixmap.height()) {
                layer.fill_path(&path, &paint, FillRule::Winding, offset, None);
                super::blur_pixmap(&mut layer, shadow.blur / 2.0);
                pixmap.draw_pixmap(0, 0, layer.as_ref(), &tiny_skia::PixmapPaint::default(), Transform::identity(), None);
            }
        } else {
            pixmap.fill_path(&path, &paint, FillRule::Winding, offset, None);
        }
    }

    if let Some(outline) = &text.outline {
        let stroke = Stroke {
            width: outline.width * 2.0,
            line_join: tiny_skia::LineJoin::Round,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &super::paint(outline.color, opacity), &stroke, transform, None);
    }

    let fill = super::paint(text.color, opacity);
    pixmap.fill_path(&path, &fill, FillRule::Winding, transform, None);
    if text.font.is_bold() {
        let stroke = Stroke {
            width: text.font.size * FAUX_BOLD,
            line_join: tiny_skia::LineJoin::Round,
            ..Stroke::default()
        };
        pixmap.stroke_path(&path, &fill, &stroke, transform, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::TextFont;
    use egui::{Color32, pos2};

    #[test]
    fn bundled_font_lays_out_text() {
        let mut cache = FontCache::new(None);
        let font = cache.get("Sans").expect("egui ships a proportional font");
        let text = TextElement::new(pos2(10.0, 10.0), "Hi\nthere".into(), TextFont::default(), Color32::BLACK);
        let bounds = text_path(&text, &font).unwrap().bounds();
        assert!(bounds.left() >= 10.0);
        // Second line extends below the first line's advance
        assert!(bounds.bottom() > 10.0 + text.line_advance());
    }

    #[test]
    fn whitespace_has_no_path() {
        let mut cache = FontCache::new(None);
        let font = cache.get("Sans").unwrap();
        let text = TextElement::new(pos2(0.0, 0.0), "   ".into(), TextFont::default(), Color32::BLACK);
        assert!(text_path(&text, &font).is_none());
    }

    #[test]
    fn paints_pixels() {
        let mut cache = FontCache::new(None);
        let font = cache.get("Sans").unwrap();
        let text = TextElement::new(pos2(2.0, 2.0), "W".into(), TextFont::default(), Color32::BLACK);
        let mut pixmap = Pixmap::new(40, 40).unwrap();
        draw_text(&mut pixmap, &text, &font, Transform::identity());
        assert!(pixmap.pixels().iter().any(|p| p.alpha() > 0));
    }
}
