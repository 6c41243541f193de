use crate::text::render_text_pixmap;
use ab_glyph::FontVec;
use reflex_core::{CurvePoint, Rgba};
use tiny_skia::{
    Color, FillRule, Paint, PathBuilder, Pixmap, PixmapPaint, Rect, Stroke, Transform,
};

const MARGIN_LEFT: f32 = 16.0;
const MARGIN_RIGHT: f32 = 16.0;
const MARGIN_TOP: f32 = 34.0;
const MARGIN_BOTTOM: f32 = 48.0;
const AXIS_TITLE: &str = "Reaction Time (ms)";
const TICKS: usize = 5;

const PANEL_BACKGROUND: Rgba = [0x26, 0x26, 0x26, 255];
const AXIS_COLOR: Rgba = [0x9a, 0x9a, 0x9a, 255];
const LABEL_COLOR: Rgba = [0xe6, 0xe6, 0xe6, 255];

/// Colors and legend of one distribution chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartStyle {
    pub label: &'static str,
    pub border: Rgba,
    pub fill: Rgba,
}

impl ChartStyle {
    pub const USER: ChartStyle = ChartStyle {
        label: "Your Distribution",
        border: [0x26, 0x50, 0x95, 255],
        fill: [38, 80, 149, 51],
    };

    pub const POPULATION: ChartStyle = ChartStyle {
        label: "Population Distribution",
        border: [0xe4, 0x4c, 0x31, 255],
        fill: [228, 76, 49, 51],
    };
}

fn paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(Color::from_rgba8(color[0], color[1], color[2], color[3]));
    paint.anti_alias = true;
    paint
}

/// One rendered filled-line density plot
pub struct DistributionChart {
    pixmap: Pixmap,
    x_max: f64,
    y_max: f64,
}

impl DistributionChart {
    /// Draws `curve` as a filled line over a linear x axis. The y axis is
    /// scaled to the curve peak and not drawn. Returns `None` when the
    /// surface is too small or the curve is empty.
    pub fn render(
        curve: &[CurvePoint],
        style: &ChartStyle,
        width: u32,
        height: u32,
        font: Option<&FontVec>,
    ) -> Option<Self> {
        let mut pixmap = Pixmap::new(width, height)?;
        let plot_w = width as f32 - MARGIN_LEFT - MARGIN_RIGHT;
        let plot_h = height as f32 - MARGIN_TOP - MARGIN_BOTTOM;
        if curve.is_empty() || plot_w <= 1.0 || plot_h <= 1.0 {
            return None;
        }

        pixmap.fill(Color::from_rgba8(
            PANEL_BACKGROUND[0],
            PANEL_BACKGROUND[1],
            PANEL_BACKGROUND[2],
            PANEL_BACKGROUND[3],
        ));

        let x_max = curve.iter().map(|p| p.x).fold(0.0, f64::max);
        let y_max = curve.iter().map(|p| p.y).fold(0.0, f64::max);
        let x_span = if x_max > 0.0 { x_max } else { 1.0 };
        let y_span = if y_max > 0.0 { y_max } else { 1.0 };
        let baseline = MARGIN_TOP + plot_h;

        let to_px = |p: &CurvePoint| {
            (
                MARGIN_LEFT + (p.x / x_span) as f32 * plot_w,
                baseline - (p.y / y_span) as f32 * plot_h,
            )
        };

        let mut line = PathBuilder::new();
        let mut area = PathBuilder::new();
        let (x0, _) = to_px(&curve[0]);
        area.move_to(x0, baseline);
        for (i, p) in curve.iter().enumerate() {
            let (x, y) = to_px(p);
            if i == 0 {
                line.move_to(x, y);
            } else {
                line.line_to(x, y);
            }
            area.line_to(x, y);
        }
        let (x_last, _) = to_px(&curve[curve.len() - 1]);
        area.line_to(x_last, baseline);
        area.close();

        if let Some(path) = area.finish() {
            pixmap.fill_path(
                &path,
                &paint(style.fill),
                FillRule::Winding,
                Transform::identity(),
                None,
            );
        }
        if let Some(path) = line.finish() {
            let stroke = Stroke {
                width: 2.0,
                ..Stroke::default()
            };
            pixmap.stroke_path(
                &path,
                &paint(style.border),
                &stroke,
                Transform::identity(),
                None,
            );
        }

        if let Some(axis) = Rect::from_xywh(MARGIN_LEFT, baseline, plot_w, 1.0) {
            pixmap.fill_rect(axis, &paint(AXIS_COLOR), Transform::identity(), None);
        }

        if let Some(font) = font {
            let mut blit = |text: &str, size: f32, color: Rgba, cx: f32, top: f32| {
                if let Some(pm) = render_text_pixmap(text, size, font, color) {
                    let x = (cx - pm.width() as f32 * 0.5).max(0.0) as i32;
                    pixmap.draw_pixmap(
                        x,
                        top as i32,
                        pm.as_ref(),
                        &PixmapPaint::default(),
                        Transform::identity(),
                        None,
                    );
                }
            };

            blit(style.label, 16.0, style.border, width as f32 * 0.5, 8.0);
            for i in 0..TICKS {
                let frac = i as f32 / (TICKS - 1) as f32;
                let value = (x_max * frac as f64).round();
                let cx = MARGIN_LEFT + frac * plot_w;
                blit(&format!("{value}"), 12.0, AXIS_COLOR, cx, baseline + 6.0);
            }
            blit(AXIS_TITLE, 14.0, LABEL_COLOR, width as f32 * 0.5, baseline + 24.0);
        }

        Some(Self {
            pixmap,
            x_max,
            y_max,
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    pub fn y_max(&self) -> f64 {
        self.y_max
    }
}

/// Chart surface holding at most one live chart.
pub struct ChartPanel {
    style: ChartStyle,
    width: u32,
    height: u32,
    curve: Vec<CurvePoint>,
    chart: Option<DistributionChart>,
    generation: u64,
}

impl ChartPanel {
    pub fn new(style: ChartStyle, width: u32, height: u32) -> Self {
        Self {
            style,
            width,
            height,
            curve: Vec::new(),
            chart: None,
            generation: 0,
        }
    }

    /// Replaces the plotted curve. The previous chart is dropped before the
    /// replacement is allocated.
    pub fn update(&mut self, curve: Vec<CurvePoint>, font: Option<&FontVec>) {
        self.curve = curve;
        self.rerender(font);
    }

    pub fn resize(&mut self, width: u32, height: u32, font: Option<&FontVec>) {
        if (width, height) == (self.width, self.height) {
            return;
        }
        self.width = width;
        self.height = height;
        if !self.curve.is_empty() {
            self.rerender(font);
        }
    }

    fn rerender(&mut self, font: Option<&FontVec>) {
        self.chart = None;
        self.chart =
            DistributionChart::render(&self.curve, &self.style, self.width, self.height, font);
        self.generation += 1;
    }

    pub fn chart(&self) -> Option<&DistributionChart> {
        self.chart.as_ref()
    }

    pub fn curve(&self) -> &[CurvePoint] {
        &self.curve
    }

    pub fn style(&self) -> &ChartStyle {
        &self.style
    }

    /// Number of times a chart has been (re)created on this panel.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}
