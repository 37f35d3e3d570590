//! Square post images for a single digit or the decimal point.
//!
//! Glyphs are drawn as seven-segment shapes so rendering needs no font
//! files. A digit is scaled so its height is a fixed share of the canvas
//! and centred on its own bounding box; the dot sits on the digit baseline.
//! Whole numbers such as `3.14` can also be laid out on one canvas.

use crate::config::toml_config::{RenderConfig, RenderStyle};
use crate::domain::model::UploadImage;
use crate::domain::ports::{DigitRenderer, Glyph};
use crate::utils::error::{PosterError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, Rgb, RgbImage};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::path::Path;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const BLACK: Rgb<u8> = Rgb([0, 0, 0]);

const PALETTES: [[[u8; 3]; 3]; 8] = [
    [[255, 94, 77], [255, 154, 0], [255, 206, 84]],
    [[64, 224, 208], [70, 130, 180], [123, 104, 238]],
    [[46, 125, 50], [102, 187, 106], [165, 214, 167]],
    [[142, 36, 170], [155, 39, 176], [186, 104, 200]],
    [[233, 30, 99], [244, 143, 177], [248, 187, 208]],
    [[33, 150, 243], [100, 181, 246], [144, 202, 249]],
    [[45, 45, 45], [90, 90, 90], [135, 135, 135]],
    [[255, 87, 34], [255, 152, 0], [255, 193, 7]],
];

// Segment order: a (top), b (upper right), c (lower right), d (bottom),
// e (lower left), f (upper left), g (middle).
const SEGMENTS: [[bool; 7]; 10] = [
    [true, true, true, true, true, true, false],
    [false, true, true, false, false, false, false],
    [true, true, false, true, true, false, true],
    [true, true, true, true, false, false, true],
    [false, true, true, false, false, true, true],
    [true, false, true, true, false, true, true],
    [true, false, true, true, true, true, true],
    [true, true, true, false, false, false, false],
    [true, true, true, true, true, true, true],
    [true, true, true, true, false, true, true],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rect {
    x: i64,
    y: i64,
    w: i64,
    h: i64,
}

impl Rect {
    fn right(&self) -> i64 {
        self.x + self.w
    }

    fn bottom(&self) -> i64 {
        self.y + self.h
    }
}

/// Digit box geometry for a canvas: glyph height, width and stroke thickness.
#[derive(Debug, Clone, Copy)]
struct GlyphMetrics {
    height: i64,
    width: i64,
    stroke: i64,
}

impl GlyphMetrics {
    fn for_canvas(size: u32, ratio: f32) -> Self {
        let height = ((size as f32 * ratio) as i64).max(10);
        Self {
            height,
            width: (height as f32 * 0.55) as i64,
            stroke: ((height as f32 * 0.12) as i64).max(2),
        }
    }

    /// Top edge of a vertically centred digit; the baseline is `top + height`.
    fn top(&self, size: u32) -> i64 {
        (size as i64 - self.height) / 2
    }
}

#[derive(Debug, Clone)]
pub struct CosmicRenderer {
    size: u32,
    style: RenderStyle,
    seed: Option<u64>,
}

impl CosmicRenderer {
    pub fn new(size: u32, style: RenderStyle) -> Self {
        Self {
            size,
            style,
            seed: None,
        }
    }

    pub fn from_config(config: &RenderConfig) -> Self {
        Self {
            size: config.size,
            style: config.style,
            seed: config.seed,
        }
    }

    /// Fixes the random background so the same glyph always renders identically.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    fn rng(&self, salt: u64) -> SmallRng {
        match self.seed {
            Some(seed) => SmallRng::seed_from_u64(seed.wrapping_mul(31).wrapping_add(salt)),
            None => SmallRng::from_entropy(),
        }
    }

    fn glyph_ratio(&self) -> f32 {
        match self.style {
            RenderStyle::Starfield => 0.6,
            RenderStyle::Gradient => 0.7,
        }
    }

    fn paint_background(&self, img: &mut RgbImage, rng: &mut SmallRng) {
        match self.style {
            RenderStyle::Starfield => add_stars(img, rng),
            RenderStyle::Gradient => {
                let palette = PALETTES[rng.gen_range(0..PALETTES.len())];
                paint_gradient(img, &palette);
                add_noise(img, rng, 0.02);
            }
        }
    }

    fn glyph_rects(&self, glyph: Glyph) -> Vec<Rect> {
        let metrics = GlyphMetrics::for_canvas(self.size, self.glyph_ratio());
        match glyph {
            Glyph::Digit(d) => {
                let rects = segment_rects(d, &metrics);
                center_horizontally_and_vertically(rects, self.size)
            }
            Glyph::Dot => {
                let baseline = metrics.top(self.size) + metrics.height;
                let dot = (metrics.height / 12).max(15);
                vec![Rect {
                    x: self.size as i64 / 2 - dot / 2,
                    y: baseline - dot,
                    w: dot,
                    h: dot,
                }]
            }
        }
    }

    /// Glyph boxes for a whole number, left to right, centred on the canvas.
    /// Each box is paired with whether it is drawn round (the dot).
    fn number_shapes(&self, number: &str) -> Result<Vec<(Rect, bool)>> {
        let max_width = self.size as f32 * 0.9;
        let mut metrics = GlyphMetrics::for_canvas(self.size, 0.5);
        let (_, width) = layout_number(number, &metrics)?;
        if width as f32 > max_width {
            metrics = GlyphMetrics::for_canvas(self.size, 0.5 * max_width / width as f32);
        }

        let (shapes, width) = layout_number(number, &metrics)?;
        if width > self.size as i64 {
            return Err(PosterError::RenderError {
                message: format!("{} does not fit on a {}px canvas", number, self.size),
            });
        }

        let (rects, round): (Vec<Rect>, Vec<bool>) = shapes.into_iter().unzip();
        let rects = center_horizontally_and_vertically(rects, self.size);
        Ok(rects.into_iter().zip(round).collect())
    }

    fn draw_shapes(&self, img: &mut RgbImage, shapes: &[(Rect, bool)]) {
        if self.style == RenderStyle::Gradient {
            let offset = (self.size as i64 / 180).max(1);
            for (rect, round) in shapes {
                let shadow = Rect {
                    x: rect.x + offset,
                    y: rect.y + offset,
                    ..*rect
                };
                fill_shape(img, shadow, *round, |p| blend(p, BLACK, 0.4));
            }
        }

        for (rect, round) in shapes {
            fill_shape(img, *rect, *round, |_| WHITE);
        }
    }

    fn check_canvas(&self) -> Result<()> {
        if self.size < 32 {
            return Err(PosterError::RenderError {
                message: format!("canvas of {}px is too small", self.size),
            });
        }
        Ok(())
    }

    fn blank_canvas(&self, rng: &mut SmallRng) -> RgbImage {
        let mut img = RgbImage::from_pixel(self.size, self.size, BLACK);
        self.paint_background(&mut img, rng);
        img
    }

    /// Draws a number made of digits and at most one decimal point on a
    /// single canvas, shrinking the glyphs until the number fits.
    pub fn render_number(&self, number: &str) -> Result<RgbImage> {
        self.check_canvas()?;
        let shapes = self.number_shapes(number)?;

        let salt = number
            .bytes()
            .fold(11u64, |acc, b| acc.wrapping_mul(131).wrapping_add(b as u64));
        let mut rng = self.rng(salt);
        let mut img = self.blank_canvas(&mut rng);
        self.draw_shapes(&mut img, &shapes);

        tracing::debug!(number, size = self.size, style = ?self.style, "rendered number");
        Ok(img)
    }
}

impl DigitRenderer for CosmicRenderer {
    fn render(&self, glyph: Glyph) -> Result<RgbImage> {
        if let Glyph::Digit(d) = glyph {
            if d > 9 {
                return Err(PosterError::RenderError {
                    message: format!("digit must be between 0 and 9, got {}", d),
                });
            }
        }
        self.check_canvas()?;

        let salt = match glyph {
            Glyph::Digit(d) => d as u64,
            Glyph::Dot => 10,
        };
        let mut rng = self.rng(salt);
        let mut img = self.blank_canvas(&mut rng);
        let round = matches!(glyph, Glyph::Dot);
        let shapes: Vec<(Rect, bool)> = self
            .glyph_rects(glyph)
            .into_iter()
            .map(|rect| (rect, round))
            .collect();
        self.draw_shapes(&mut img, &shapes);

        tracing::debug!(?glyph, size = self.size, style = ?self.style, "rendered glyph");
        Ok(img)
    }
}

fn segment_rects(digit: u8, m: &GlyphMetrics) -> Vec<Rect> {
    let (w, h, t) = (m.width, m.height, m.stroke);
    let half = h / 2 + t / 2;
    let lower = h / 2 - t / 2;
    let shapes = [
        Rect { x: 0, y: 0, w, h: t },
        Rect { x: w - t, y: 0, w: t, h: half },
        Rect { x: w - t, y: lower, w: t, h: h - lower },
        Rect { x: 0, y: h - t, w, h: t },
        Rect { x: 0, y: lower, w: t, h: h - lower },
        Rect { x: 0, y: 0, w: t, h: half },
        Rect { x: 0, y: (h - t) / 2, w, h: t },
    ];

    SEGMENTS[digit as usize]
        .iter()
        .zip(shapes)
        .filter(|(on, _)| **on)
        .map(|(_, rect)| rect)
        .collect()
}

/// Places glyphs from x = 0 with a quarter-width gap, digits hanging from
/// y = 0 and the dot on their baseline. Returns the shapes and total width.
fn layout_number(number: &str, m: &GlyphMetrics) -> Result<(Vec<(Rect, bool)>, i64)> {
    let invalid = |message: String| PosterError::RenderError { message };
    if number.is_empty() {
        return Err(invalid("cannot render an empty number".to_string()));
    }
    if number.matches('.').count() > 1 {
        return Err(invalid(format!("{} has more than one decimal point", number)));
    }

    let gap = (m.width / 4).max(1);
    let dot = (m.height / 12).max(m.stroke);
    let mut shapes = Vec::new();
    let mut x = 0;
    for ch in number.chars() {
        match ch {
            '.' => {
                let rect = Rect {
                    x,
                    y: m.height - dot,
                    w: dot,
                    h: dot,
                };
                shapes.push((rect, true));
                x += dot + gap;
            }
            _ => {
                let digit = ch
                    .to_digit(10)
                    .ok_or_else(|| invalid(format!("{:?} is not a digit", ch)))?;
                for rect in segment_rects(digit as u8, m) {
                    shapes.push((Rect { x: rect.x + x, ..rect }, false));
                }
                x += m.width + gap;
            }
        }
    }
    Ok((shapes, x - gap))
}

fn center_horizontally_and_vertically(rects: Vec<Rect>, size: u32) -> Vec<Rect> {
    let left = rects.iter().map(|r| r.x).min().unwrap_or(0);
    let top = rects.iter().map(|r| r.y).min().unwrap_or(0);
    let right = rects.iter().map(Rect::right).max().unwrap_or(0);
    let bottom = rects.iter().map(Rect::bottom).max().unwrap_or(0);

    let dx = (size as i64 - (right - left)) / 2 - left;
    let dy = (size as i64 - (bottom - top)) / 2 - top;
    rects
        .into_iter()
        .map(|r| Rect {
            x: r.x + dx,
            y: r.y + dy,
            ..r
        })
        .collect()
}

fn fill_shape(img: &mut RgbImage, rect: Rect, round: bool, color: impl Fn(Rgb<u8>) -> Rgb<u8>) {
    let (width, height) = (img.width() as i64, img.height() as i64);
    let radius = rect.w as f64 / 2.0;
    let (cx, cy) = (rect.x as f64 + radius, rect.y as f64 + radius);

    for y in rect.y.max(0)..rect.bottom().min(height) {
        for x in rect.x.max(0)..rect.right().min(width) {
            if round {
                let (px, py) = (x as f64 + 0.5 - cx, y as f64 + 0.5 - cy);
                if px * px + py * py > radius * radius {
                    continue;
                }
            }
            let pixel = img.get_pixel_mut(x as u32, y as u32);
            *pixel = color(*pixel);
        }
    }
}

fn blend(base: Rgb<u8>, over: Rgb<u8>, alpha: f32) -> Rgb<u8> {
    let mix = |a: u8, b: u8| (a as f32 * (1.0 - alpha) + b as f32 * alpha).round() as u8;
    Rgb([
        mix(base[0], over[0]),
        mix(base[1], over[1]),
        mix(base[2], over[2]),
    ])
}

/// 60 to 100 stars; mostly single pixels, some with faint cross arms.
fn add_stars(img: &mut RgbImage, rng: &mut SmallRng) {
    let (w, h) = img.dimensions();
    let count = rng.gen_range(60..=100);

    for _ in 0..count {
        let x = rng.gen_range(0..w);
        let y = rng.gen_range(0..h);
        img.put_pixel(x, y, WHITE);

        let arm = match rng.gen_range(0..100) {
            0..=74 => continue,
            75..=94 => Rgb([80, 80, 80]),
            _ => Rgb([120, 120, 120]),
        };
        for (dx, dy) in [(-1i64, 0i64), (1, 0), (0, -1), (0, 1)] {
            let (nx, ny) = (x as i64 + dx, y as i64 + dy);
            if nx >= 0 && ny >= 0 && nx < w as i64 && ny < h as i64 {
                img.put_pixel(nx as u32, ny as u32, arm);
            }
        }
    }
}

fn paint_gradient(img: &mut RgbImage, palette: &[[u8; 3]; 3]) {
    let size = img.width().max(1) as f32;
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let ratio = (x + y) as f32 / (2.0 * size);
        let (from, to, t) = if ratio < 0.5 {
            (palette[0], palette[1], ratio * 2.0)
        } else {
            (palette[1], palette[2], (ratio - 0.5) * 2.0)
        };
        *pixel = blend(Rgb(from), Rgb(to), t.clamp(0.0, 1.0));
    }
}

fn add_noise(img: &mut RgbImage, rng: &mut SmallRng, intensity: f64) {
    for pixel in img.pixels_mut() {
        if rng.gen_bool(intensity) {
            let noise: i16 = rng.gen_range(-20..=20);
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as i16 + noise).clamp(0, 255) as u8;
            }
        }
    }
}

pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<UploadImage> {
    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(image)?;
    Ok(UploadImage {
        bytes,
        width: image.width(),
        height: image.height(),
        mime_type: "image/jpeg".to_string(),
    })
}

/// Reads any supported image file and re-encodes it as JPEG for upload.
pub fn load_upload_image(path: &Path, quality: u8) -> Result<UploadImage> {
    let image = image::open(path)?.to_rgb8();
    encode_jpeg(&image, quality)
}

pub fn save_png(image: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

pub fn file_name_for(glyph: Glyph) -> String {
    match glyph {
        Glyph::Digit(d) => format!("digit_{}.png", d),
        Glyph::Dot => "decimal_dot.png".to_string(),
    }
}

pub fn number_file_name(number: &str) -> String {
    format!("number_{}.png", number.replace('.', "_"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn renderer() -> CosmicRenderer {
        CosmicRenderer::new(270, RenderStyle::Starfield).with_seed(42)
    }

    fn white_bbox(img: &RgbImage, min_run: u32) -> (u32, u32, u32, u32) {
        // Stars are single white pixels; only runs of `min_run` count.
        let (w, h) = img.dimensions();
        let is_white = |x: u32, y: u32| img.get_pixel(x, y) == &WHITE;
        let row_hit = |y: u32| (0..w.saturating_sub(min_run)).any(|x| (0..min_run).all(|k| is_white(x + k, y)));
        let col_hit = |x: u32| (0..h.saturating_sub(min_run)).any(|y| (0..min_run).all(|k| is_white(x, y + k)));
        let top = (0..h).find(|&y| row_hit(y)).unwrap();
        let bottom = (0..h).rev().find(|&y| row_hit(y)).unwrap();
        let left = (0..w).find(|&x| col_hit(x)).unwrap();
        let right = (0..w).rev().find(|&x| col_hit(x)).unwrap();
        (left, top, right, bottom)
    }

    #[test]
    fn test_render_dimensions() {
        let img = renderer().render(Glyph::Digit(3)).unwrap();
        assert_eq!(img.dimensions(), (270, 270));
    }

    #[test]
    fn test_seeded_render_is_deterministic() {
        let a = renderer().render(Glyph::Digit(7)).unwrap();
        let b = renderer().render(Glyph::Digit(7)).unwrap();
        assert_eq!(a, b);

        let gradient = CosmicRenderer::new(128, RenderStyle::Gradient).with_seed(1);
        assert_eq!(
            gradient.render(Glyph::Dot).unwrap(),
            gradient.render(Glyph::Dot).unwrap()
        );
    }

    #[test]
    fn test_digit_is_centered() {
        for digit in [1u8, 7, 8] {
            let img = renderer().render(Glyph::Digit(digit)).unwrap();
            let (left, top, right, bottom) = white_bbox(&img, 8);
            let cx = (left + right) as i64 / 2;
            let cy = (top + bottom) as i64 / 2;
            assert!((cx - 135).abs() <= 2, "digit {} off centre at x={}", digit, cx);
            assert!((cy - 135).abs() <= 2, "digit {} off centre at y={}", digit, cy);
        }
    }

    #[test]
    fn test_dot_sits_on_baseline() {
        let r = renderer();
        let digit = r.render(Glyph::Digit(8)).unwrap();
        let dot = r.render(Glyph::Dot).unwrap();

        let (_, _, _, digit_bottom) = white_bbox(&digit, 3);
        let (left, top, right, dot_bottom) = white_bbox(&dot, 3);
        assert!((digit_bottom as i64 - dot_bottom as i64).abs() <= 1);
        assert!(dot_bottom > 135);
        assert!(right - left < 30 && dot_bottom - top < 30);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(renderer().render(Glyph::Digit(10)).is_err());
        assert!(CosmicRenderer::new(8, RenderStyle::Starfield)
            .render(Glyph::Dot)
            .is_err());
    }

    #[test]
    fn test_number_is_centered_and_wider_than_a_digit() {
        let r = renderer();
        let number = r.render_number("314").unwrap();
        assert_eq!(number.dimensions(), (270, 270));

        let (left, top, right, bottom) = white_bbox(&number, 8);
        assert!((((left + right) / 2) as i64 - 135).abs() <= 2);
        assert!((((top + bottom) / 2) as i64 - 135).abs() <= 2);

        let (d_left, _, d_right, _) = white_bbox(&r.render(Glyph::Digit(8)).unwrap(), 8);
        assert!(right - left > 2 * (d_right - d_left));
        assert!(right - left <= 243);
    }

    #[test]
    fn test_long_number_shrinks_to_fit() {
        // No pure white in the gradient background, so every white run is glyph.
        let r = CosmicRenderer::new(270, RenderStyle::Gradient).with_seed(3);
        let img = r.render_number("3.14159265358979").unwrap();

        let (left, _, right, _) = white_bbox(&img, 2);
        assert!(left > 0 && right < 269);
        assert_eq!(img, r.render_number("3.14159265358979").unwrap());
    }

    #[test]
    fn test_number_rejects_bad_text() {
        let r = renderer();
        assert!(r.render_number("").is_err());
        assert!(r.render_number("3a").is_err());
        assert!(r.render_number("3.1.4").is_err());
        assert!(r.render_number("-1").is_err());
    }

    #[test]
    fn test_encode_jpeg() {
        let img = renderer().render(Glyph::Digit(4)).unwrap();
        let upload = encode_jpeg(&img, 90).unwrap();
        assert_eq!(&upload.bytes[..2], &[0xFF, 0xD8]);
        assert_eq!((upload.width, upload.height), (270, 270));
        assert_eq!(upload.mime_type, "image/jpeg");
    }

    #[test]
    fn test_save_and_reload_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join(file_name_for(Glyph::Dot));
        let img = renderer().render(Glyph::Dot).unwrap();

        save_png(&img, &path).unwrap();
        let upload = load_upload_image(&path, 80).unwrap();
        assert_eq!((upload.width, upload.height), (270, 270));

        assert_eq!(number_file_name("3.14"), "number_3_14.png");
    }
}
