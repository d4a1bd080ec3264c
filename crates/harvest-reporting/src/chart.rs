//! Bar chart of figures per document.

use ab_glyph::{FontVec, PxScale};
use image::{Rgba, RgbaImage, imageops};
use imageproc::drawing::{draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut};
use imageproc::geometric_transformations::{Interpolation, rotate};
use imageproc::rect::Rect;

use crate::fonts::TextMeasure;

const MARGIN_LEFT: u32 = 80;
const MARGIN_RIGHT: u32 = 20;
const MARGIN_TOP: u32 = 50;
const MARGIN_BOTTOM: u32 = 170;
const TICK_LEN: i32 = 5;
const LABEL_MAX_CHARS: usize = 24;

const TITLE_PX: f32 = 22.0;
const AXIS_LABEL_PX: f32 = 16.0;
const TICK_PX: f32 = 13.0;

#[derive(Debug, Clone)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub bar_color: [u8; 3],
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 500,
            title: "Figures per Document".to_string(),
            x_label: "Document".to_string(),
            y_label: "Number of Figures".to_string(),
            // lightcoral
            bar_color: [240, 128, 128],
        }
    }
}

/// Pixel rectangle of the plotting area, axes on its left and bottom edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlotArea {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PlotArea {
    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    pub label: String,
    pub value: usize,
    pub x: u32,
    pub width: u32,
    /// Top edge; equals the plot bottom for a zero bar.
    pub top: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartLayout {
    pub plot: PlotArea,
    pub y_max: usize,
    pub y_step: usize,
    pub bars: Vec<Bar>,
}

impl ChartLayout {
    /// Pixel row of a y-axis value.
    pub fn y_for(&self, value: usize) -> u32 {
        let offset = value as f32 / self.y_max as f32 * self.plot.height() as f32;
        self.plot.bottom - (offset.round() as u32).min(self.plot.height())
    }
}

/// Tick spacing from the 1-2-5 series giving at most five intervals.
fn nice_step(max: usize) -> usize {
    let mut magnitude = 1usize;
    loop {
        for m in [1, 2, 5] {
            let step = m * magnitude;
            if step * 5 >= max {
                return step;
            }
        }
        magnitude *= 10;
    }
}

/// Shorten long filenames so slanted labels stay inside the margin.
pub fn truncate_label(label: &str) -> String {
    if label.chars().count() <= LABEL_MAX_CHARS {
        return label.to_string();
    }
    let head: String = label.chars().take(LABEL_MAX_CHARS - 3).collect();
    format!("{head}...")
}

/// Geometry of the chart for `(document, figure count)` pairs in order.
pub fn bar_layout(data: &[(&str, usize)], options: &ChartOptions) -> ChartLayout {
    let plot = PlotArea {
        left: MARGIN_LEFT,
        top: MARGIN_TOP,
        right: options.width.saturating_sub(MARGIN_RIGHT).max(MARGIN_LEFT + 1),
        bottom: options.height.saturating_sub(MARGIN_BOTTOM).max(MARGIN_TOP + 1),
    };
    let max = data.iter().map(|(_, v)| *v).max().unwrap_or(0);
    let y_step = nice_step(max);
    let y_max = (max.div_ceil(y_step) * y_step).max(y_step);

    let mut layout = ChartLayout {
        plot,
        y_max,
        y_step,
        bars: Vec::with_capacity(data.len()),
    };
    if data.is_empty() {
        return layout;
    }

    let slot = plot.width() as f32 / data.len() as f32;
    let bar_width = ((slot * 0.8).floor() as u32).max(1);
    for (i, (label, value)) in data.iter().enumerate() {
        let x = plot.left + (slot * i as f32 + slot * 0.1).round() as u32;
        let top = layout.y_for(*value);
        layout.bars.push(Bar {
            label: truncate_label(label),
            value: *value,
            x,
            width: bar_width,
            top,
        });
    }
    layout
}

fn draw_text(img: &mut RgbaImage, font: &FontVec, text: &str, px: f32, x: i32, y: i32) {
    draw_text_mut(img, Rgba([0, 0, 0, 255]), x, y, PxScale::from(px), font, text);
}

/// Text rendered on its own transparent tile and turned to read bottom-up.
fn vertical_text(font: &FontVec, text: &str, px: f32) -> RgbaImage {
    let (w, h) = font.text_size(text, px);
    let mut tile = RgbaImage::new(w.max(1), h.max(1));
    draw_text(&mut tile, font, text, px, 0, 0);
    imageops::rotate270(&tile)
}

/// Text on a square transparent tile, turned 45 degrees counterclockwise
/// about the tile centre. The end of the text sits on the centre, so the
/// label hangs down and to the left of its anchor.
fn slanted_text(font: &FontVec, text: &str, px: f32) -> RgbaImage {
    let (w, h) = font.text_size(text, px);
    let side = (w + h).max(2);
    let mut tile = RgbaImage::new(side, side);
    let center = side as i32 / 2;
    draw_text(&mut tile, font, text, px, center - w as i32, center - h as i32 / 2);
    let pivot = (side as f32 / 2.0, side as f32 / 2.0);
    rotate(
        &tile,
        pivot,
        -std::f32::consts::FRAC_PI_4,
        Interpolation::Bilinear,
        Rgba([0, 0, 0, 0]),
    )
}

pub fn render_bar_chart(
    data: &[(&str, usize)],
    options: &ChartOptions,
    font: Option<&FontVec>,
) -> RgbaImage {
    let layout = bar_layout(data, options);
    let plot = layout.plot;
    let mut img = RgbaImage::from_pixel(options.width, options.height, Rgba([255, 255, 255, 255]));
    let axis = Rgba([0, 0, 0, 255]);
    let [r, g, b] = options.bar_color;

    for bar in &layout.bars {
        let height = plot.bottom - bar.top;
        if height == 0 {
            continue;
        }
        let rect = Rect::at(bar.x as i32, bar.top as i32).of_size(bar.width, height);
        draw_filled_rect_mut(&mut img, rect, Rgba([r, g, b, 255]));
    }

    let (left, top, right, bottom) = (
        plot.left as f32,
        plot.top as f32,
        plot.right as f32,
        plot.bottom as f32,
    );
    draw_line_segment_mut(&mut img, (left, top), (left, bottom), axis);
    draw_line_segment_mut(&mut img, (left, bottom), (right, bottom), axis);

    for value in (0..=layout.y_max).step_by(layout.y_step) {
        let y = layout.y_for(value) as f32;
        draw_line_segment_mut(&mut img, (left - TICK_LEN as f32, y), (left, y), axis);
    }

    let Some(font) = font else {
        return img;
    };

    for value in (0..=layout.y_max).step_by(layout.y_step) {
        let text = value.to_string();
        let (tw, th) = font.text_size(&text, TICK_PX);
        let y = layout.y_for(value) as i32;
        draw_text(
            &mut img,
            font,
            &text,
            TICK_PX,
            plot.left as i32 - TICK_LEN - 4 - tw as i32,
            y - th as i32 / 2,
        );
    }

    for bar in &layout.bars {
        let label = slanted_text(font, &bar.label, TICK_PX);
        let half = i64::from(label.width()) / 2;
        let anchor_x = i64::from(bar.x + bar.width / 2);
        let anchor_y = i64::from(plot.bottom) + 6 + TICK_PX as i64 / 2;
        imageops::overlay(&mut img, &label, anchor_x - half, anchor_y - half);
    }

    let (tw, _) = font.text_size(&options.title, TITLE_PX);
    draw_text(
        &mut img,
        font,
        &options.title,
        TITLE_PX,
        (options.width as i32 - tw as i32) / 2,
        14,
    );

    let (tw, th) = font.text_size(&options.x_label, AXIS_LABEL_PX);
    draw_text(
        &mut img,
        font,
        &options.x_label,
        AXIS_LABEL_PX,
        (plot.left + plot.width() / 2) as i32 - tw as i32 / 2,
        options.height as i32 - th as i32 - 10,
    );

    let y_label = vertical_text(font, &options.y_label, AXIS_LABEL_PX);
    imageops::overlay(
        &mut img,
        &y_label,
        12,
        i64::from(plot.top + plot.height() / 2) - i64::from(y_label.height()) / 2,
    );

    img
}
