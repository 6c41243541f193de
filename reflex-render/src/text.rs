use ab_glyph::{point, Font, FontVec, Glyph, PxScale, ScaleFont};
use anyhow::{Context, Result};
use reflex_core::Rgba;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tiny_skia::{Pixmap, PremultipliedColorU8};

/// Entries kept before the cache is flushed. Box and stats texts change per
/// round, so the working set stays small.
const TEXT_CACHE_LIMIT: usize = 256;

pub fn load_font(path: impl AsRef<Path>) -> Result<FontVec> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).with_context(|| format!("reading font {}", path.display()))?;
    FontVec::try_from_vec(bytes).with_context(|| format!("parsing font {}", path.display()))
}

/// Rasterizes a single line of text into a tight, premultiplied pixmap.
/// Returns `None` for text without visible glyphs.
pub fn render_text_pixmap<F: Font>(text: &str, font_size: f32, font: &F, color: Rgba) -> Option<Pixmap> {
    let scale = PxScale::from(font_size);
    let sf = font.as_scaled(scale);

    // Layout with baseline at ascent
    let mut pen_x = 0.0f32;
    let mut glyphs = Vec::<Glyph>::new();
    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = glyphs.last() {
            pen_x += sf.kern(prev.id, id);
        }
        glyphs.push(Glyph {
            id,
            scale,
            position: point(pen_x, sf.ascent()),
        });
        pen_x += sf.h_advance(id);
    }

    let outlines: Vec<_> = glyphs
        .into_iter()
        .filter_map(|g| font.outline_glyph(g))
        .collect();
    if outlines.is_empty() {
        return None;
    }

    let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
    let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
    for out in &outlines {
        let b = out.px_bounds();
        min_x = min_x.min(b.min.x);
        min_y = min_y.min(b.min.y);
        max_x = max_x.max(b.max.x);
        max_y = max_y.max(b.max.y);
    }

    let w = (max_x.ceil() - min_x.floor()).max(1.0) as u32;
    let h = (max_y.ceil() - min_y.floor()).max(1.0) as u32;
    let mut pm = Pixmap::new(w, h)?;
    let stride = w as usize;
    let dst = pm.pixels_mut();

    for out in &outlines {
        let b = out.px_bounds();
        out.draw(|x, y, cov| {
            if cov <= f32::EPSILON {
                return;
            }
            let ix = (x as f32 + b.min.x - min_x).floor() as i32;
            let iy = (y as f32 + b.min.y - min_y).floor() as i32;
            if ix < 0 || iy < 0 || ix >= w as i32 || iy >= h as i32 {
                return;
            }
            let i = iy as usize * stride + ix as usize;

            // Porter-Duff over in premultiplied space
            let a = (cov * color[3] as f32 / 255.0).clamp(0.0, 1.0);
            let bg = dst[i];
            let inv = 1.0 - a;
            let blend = |src: u8, under: u8| ((src as f32 * a) + under as f32 * inv).min(255.0) as u8;
            let out_a = blend(255, bg.alpha());
            let px = PremultipliedColorU8::from_rgba(
                blend(color[0], bg.red()).min(out_a),
                blend(color[1], bg.green()).min(out_a),
                blend(color[2], bg.blue()).min(out_a),
                out_a,
            );
            if let Some(px) = px {
                dst[i] = px;
            }
        });
    }

    Some(pm)
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    size_tenths: u32,
    color: Rgba,
}

/// Rendered text pixmaps keyed by content, size and color
pub struct TextCache {
    font: Option<Arc<FontVec>>,
    map: HashMap<TextKey, Arc<Pixmap>>,
}

impl TextCache {
    pub fn new(font: Option<Arc<FontVec>>) -> Self {
        Self {
            font,
            map: HashMap::new(),
        }
    }

    pub fn get_or_render(&mut self, text: &str, size: f32, color: Rgba) -> Option<Arc<Pixmap>> {
        let font = self.font.as_ref()?;
        let key = TextKey {
            text: text.to_string(),
            size_tenths: (size * 10.0).round() as u32,
            color,
        };
        if let Some(pm) = self.map.get(&key) {
            return Some(Arc::clone(pm));
        }
        if self.map.len() >= TEXT_CACHE_LIMIT {
            self.map.clear();
        }
        let pm = Arc::new(render_text_pixmap(text, size, &**font, color)?);
        self.map.insert(key, Arc::clone(&pm));
        Some(pm)
    }
}
