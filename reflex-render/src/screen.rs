use crate::dashboard::Dashboard;
use crate::text::TextCache;
use ab_glyph::FontVec;
use anyhow::{anyhow, bail, Result};
use reflex_core::{BoxAppearance, Rgba};
use std::sync::Arc;
use tiny_skia::{Color, Paint, Pixmap, PixmapPaint, Rect, Transform};

const MARGIN: f32 = 24.0;
const LINE_HEIGHT: f32 = 30.0;
const BUTTON_SIZE: (f32, f32) = (180.0, 40.0);

const BACKGROUND: Rgba = [0x12, 0x12, 0x12, 255];
const TEXT_COLOR: Rgba = [0xf2, 0xf2, 0xf2, 255];
const BUTTON_COLOR: Rgba = [0x3a, 0x3a, 0x3a, 255];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Region {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.w && y >= self.y && y < self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    fn rect(&self) -> Option<Rect> {
        Rect::from_xywh(self.x, self.y, self.w.max(1.0), self.h.max(1.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    ReactionBox,
    CopyLink,
}

/// Screen regions for a given window size
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    pub width: u32,
    pub height: u32,
    pub reaction_box: Region,
    pub text_lines: [Region; 3],
    pub user_chart: Region,
    pub global_chart: Region,
    pub copy_button: Region,
}

impl Layout {
    pub fn new(width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        let content_w = (w - 2.0 * MARGIN).max(1.0);

        let reaction_box = Region {
            x: MARGIN,
            y: MARGIN,
            w: content_w,
            h: (h * 0.38).max(80.0),
        };

        let text_top = reaction_box.y + reaction_box.h + 16.0;
        let line = |i: usize| Region {
            x: MARGIN,
            y: text_top + i as f32 * LINE_HEIGHT,
            w: content_w,
            h: LINE_HEIGHT,
        };
        let text_lines = [line(0), line(1), line(2)];

        let copy_button = Region {
            x: (w - BUTTON_SIZE.0) * 0.5,
            y: h - MARGIN - BUTTON_SIZE.1,
            w: BUTTON_SIZE.0,
            h: BUTTON_SIZE.1,
        };

        let charts_top = text_top + 3.0 * LINE_HEIGHT + 8.0;
        let chart_h = (copy_button.y - 16.0 - charts_top).max(1.0);
        let chart_w = ((w - 3.0 * MARGIN) * 0.5).max(1.0);
        let user_chart = Region {
            x: MARGIN,
            y: charts_top,
            w: chart_w,
            h: chart_h,
        };
        let global_chart = Region {
            x: 2.0 * MARGIN + chart_w,
            ..user_chart
        };

        Self {
            width,
            height,
            reaction_box,
            text_lines,
            user_chart,
            global_chart,
            copy_button,
        }
    }

    pub fn chart_size(&self) -> (u32, u32) {
        (self.user_chart.w as u32, self.user_chart.h as u32)
    }

    pub fn hit_test(&self, x: f32, y: f32) -> Option<HitTarget> {
        if self.reaction_box.contains(x, y) {
            Some(HitTarget::ReactionBox)
        } else if self.copy_button.contains(x, y) {
            Some(HitTarget::CopyLink)
        } else {
            None
        }
    }
}

fn solid(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    paint
}

/// Composes the whole window into an offscreen canvas and copies it into
/// the RGBA frame buffer.
pub struct ScreenRenderer {
    layout: Layout,
    canvas: Pixmap,
    text: TextCache,
}

impl ScreenRenderer {
    pub fn new(width: u32, height: u32, font: Option<Arc<FontVec>>) -> Result<Self> {
        let canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("Failed to create {width}x{height} canvas"))?;
        Ok(Self {
            layout: Layout::new(width, height),
            canvas,
            text: TextCache::new(font),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        self.canvas = Pixmap::new(width, height)
            .ok_or_else(|| anyhow!("Failed to resize canvas to {width}x{height}"))?;
        self.layout = Layout::new(width, height);
        Ok(())
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn render_frame(
        &mut self,
        appearance: &BoxAppearance,
        dashboard: &Dashboard,
        now_ns: u64,
        frame_buffer: &mut [u8],
    ) -> Result<()> {
        let layout = self.layout.clone();
        self.canvas.fill(Color::from_rgba8(
            BACKGROUND[0],
            BACKGROUND[1],
            BACKGROUND[2],
            BACKGROUND[3],
        ));

        self.fill_region(&layout.reaction_box, appearance.color);
        self.draw_text_centered(&appearance.text, 30.0, layout.reaction_box.center());

        let lines = [
            &dashboard.stats_line,
            &dashboard.percentile_line,
            &dashboard.participants_line,
        ];
        for (region, line) in layout.text_lines.iter().zip(lines) {
            if !line.is_empty() {
                self.draw_text_centered(line, 20.0, region.center());
            }
        }

        for (region, panel) in [
            (&layout.user_chart, &dashboard.user_chart),
            (&layout.global_chart, &dashboard.global_chart),
        ] {
            if let Some(chart) = panel.chart() {
                self.canvas.draw_pixmap(
                    region.x as i32,
                    region.y as i32,
                    chart.pixmap().as_ref(),
                    &PixmapPaint::default(),
                    Transform::identity(),
                    None,
                );
            }
        }

        self.fill_region(&layout.copy_button, BUTTON_COLOR);
        self.draw_text_centered(
            dashboard.copy_link.label(now_ns),
            18.0,
            layout.copy_button.center(),
        );

        let data = self.canvas.data();
        if frame_buffer.len() != data.len() {
            bail!(
                "frame buffer is {} bytes, canvas is {} bytes",
                frame_buffer.len(),
                data.len()
            );
        }
        frame_buffer.copy_from_slice(data);
        Ok(())
    }

    fn fill_region(&mut self, region: &Region, color: Rgba) {
        if let Some(rect) = region.rect() {
            self.canvas
                .fill_rect(rect, &solid(color), Transform::identity(), None);
        }
    }

    fn draw_text_centered(&mut self, text: &str, size: f32, center: (f32, f32)) {
        let Some(pm) = self.text.get_or_render(text, size, TEXT_COLOR) else {
            return;
        };
        let x = (center.0 - pm.width() as f32 * 0.5) as i32;
        let y = (center.1 - pm.height() as f32 * 0.5) as i32;
        self.canvas.draw_pixmap(
            x,
            y,
            Pixmap::as_ref(&pm),
            &PixmapPaint::default(),
            Transform::identity(),
            None,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reflex_core::{Outcome, TestState};

    #[test]
    fn layout_routes_clicks_to_box_and_button() {
        let layout = Layout::new(1280, 800);
        let (bx, by) = layout.reaction_box.center();
        assert_eq!(layout.hit_test(bx, by), Some(HitTarget::ReactionBox));
        let (cx, cy) = layout.copy_button.center();
        assert_eq!(layout.hit_test(cx, cy), Some(HitTarget::CopyLink));
        assert_eq!(layout.hit_test(1.0, 799.0), None);
    }

    #[test]
    fn charts_sit_side_by_side_above_the_button() {
        let layout = Layout::new(1280, 800);
        assert_eq!(layout.user_chart.y, layout.global_chart.y);
        assert!(layout.user_chart.x + layout.user_chart.w < layout.global_chart.x);
        assert!(layout.user_chart.y + layout.user_chart.h < layout.copy_button.y);
        let (w, h) = layout.chart_size();
        assert!(w > 100 && h > 50);
    }

    #[test]
    fn frame_shows_box_color() {
        let mut renderer = ScreenRenderer::new(640, 480, None).unwrap();
        let board = Dashboard::new(None, renderer.layout().chart_size());
        let appearance = TestState::Resolved(Outcome::TooEarly).appearance();
        let mut frame = vec![0u8; 640 * 480 * 4];
        renderer
            .render_frame(&appearance, &board, 0, &mut frame)
            .unwrap();

        let (cx, cy) = renderer.layout().reaction_box.center();
        let i = (cy as usize * 640 + cx as usize) * 4;
        assert_eq!(&frame[i..i + 4], &appearance.color);
    }

    #[test]
    fn mismatched_frame_buffer_is_an_error() {
        let mut renderer = ScreenRenderer::new(64, 64, None).unwrap();
        let board = Dashboard::new(None, (10, 10));
        let mut frame = vec![0u8; 16];
        assert!(renderer
            .render_frame(&TestState::Idle.appearance(), &board, 0, &mut frame)
            .is_err());
    }
}
