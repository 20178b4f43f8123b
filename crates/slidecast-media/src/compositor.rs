//! Frame compositing: letterboxing, cross-fades and the caption band.

use std::collections::HashMap;
use std::path::PathBuf;

use fontdue::layout::{
    CoordinateSystem, GlyphRasterConfig, HorizontalAlign, Layout, LayoutSettings, TextStyle,
    VerticalAlign, WrapStyle,
};
use fontdue::{Font, FontSettings};
use image::{imageops, Rgb, RgbImage};
use tracing::warn;

use crate::error::{MediaError, MediaResult};

/// Caption length cap; longer prompts are cut and ellipsized.
const CAPTION_MAX_CHARS: usize = 60;

/// Caption band opacity over the underlying frame.
const BAND_ALPHA: f32 = 0.75;

/// A source image with its caption text.
#[derive(Debug, Clone)]
pub struct Slide {
    pub image: RgbImage,
    pub caption: String,
}

/// A slide scaled once into its letterbox position.
#[derive(Debug, Clone)]
pub struct PreparedSlide {
    scaled: RgbImage,
    x: u32,
    y: u32,
    pub caption: String,
}

/// Scale-to-fit placement preserving aspect ratio, centered on the free axis.
pub fn compute_letterbox(
    canvas_w: u32,
    canvas_h: u32,
    img_w: u32,
    img_h: u32,
) -> (u32, u32, u32, u32) {
    let img_ratio = img_w as f64 / img_h as f64;
    let canvas_ratio = canvas_w as f64 / canvas_h as f64;

    if img_ratio > canvas_ratio {
        // Image is wider than the canvas: fill the width, center vertically
        let height = ((canvas_w as f64 / img_ratio).round() as u32).max(1);
        (0, (canvas_h - height.min(canvas_h)) / 2, canvas_w, height.min(canvas_h))
    } else {
        // Image is taller: fill the height, center horizontally
        let width = ((canvas_h as f64 * img_ratio).round() as u32).max(1);
        ((canvas_w - width.min(canvas_w)) / 2, 0, width.min(canvas_w), canvas_h)
    }
}

/// Cut the caption to at most 60 characters, ellipsizing longer text.
pub fn truncate_caption(text: &str) -> String {
    if text.chars().count() > CAPTION_MAX_CHARS {
        let cut: String = text.chars().take(CAPTION_MAX_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        text.to_string()
    }
}

/// Gradient stand-in for an image that failed to load or decode.
pub fn placeholder_image(width: u32, height: u32) -> RgbImage {
    let top = [0x6a_u8, 0x11, 0xcb];
    let bottom = [0x25_u8, 0x75, 0xfc];
    RgbImage::from_fn(width, height, |_, y| {
        let t = y as f32 / height.max(1) as f32;
        Rgb([
            (top[0] as f32 + (bottom[0] as f32 - top[0] as f32) * t) as u8,
            (top[1] as f32 + (bottom[1] as f32 - top[1] as f32) * t) as u8,
            (top[2] as f32 + (bottom[2] as f32 - top[2] as f32) * t) as u8,
        ])
    })
}

struct GlyphBitmap {
    width: usize,
    height: usize,
    coverage: Vec<u8>,
}

/// A parsed caption font with a glyph raster cache.
pub struct CaptionFont {
    font: Font,
    cache: HashMap<GlyphRasterConfig, GlyphBitmap>,
}

impl CaptionFont {
    pub fn from_bytes(bytes: Vec<u8>) -> MediaResult<Self> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| MediaError::invalid_media(format!("font parse failed: {e}")))?;
        Ok(Self {
            font,
            cache: HashMap::new(),
        })
    }

    /// Resolve a usable font: `SLIDECAST_CAPTION_FONT`, then common system
    /// locations. `None` renders the band without text.
    pub fn discover() -> Option<Self> {
        let mut candidates: Vec<PathBuf> = Vec::new();
        if let Ok(path) = std::env::var("SLIDECAST_CAPTION_FONT") {
            if !path.is_empty() {
                candidates.push(PathBuf::from(path));
            }
        }
        candidates.extend(
            [
                "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
                "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/TTF/DejaVuSans.ttf",
                "/usr/share/fonts/dejavu/DejaVuSans.ttf",
                "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
                "C:\\Windows\\Fonts\\arial.ttf",
            ]
            .iter()
            .map(PathBuf::from),
        );

        for path in candidates {
            if let Ok(bytes) = std::fs::read(&path) {
                match Self::from_bytes(bytes) {
                    Ok(font) => return Some(font),
                    Err(e) => warn!("skipping caption font {}: {e}", path.display()),
                }
            }
        }
        None
    }

    /// Rasterize `text` centered inside the given region, in white.
    fn draw_centered(
        &mut self,
        canvas: &mut RgbImage,
        text: &str,
        region_y: u32,
        region_h: u32,
        px: f32,
    ) {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: 0.0,
            y: region_y as f32,
            max_width: Some(canvas.width() as f32),
            max_height: Some(region_h as f32),
            horizontal_align: HorizontalAlign::Center,
            vertical_align: VerticalAlign::Middle,
            line_height: 1.0,
            wrap_style: WrapStyle::Word,
            wrap_hard_breaks: true,
        });
        layout.append(&[&self.font], &TextStyle::new(text, px, 0));

        let Self { font, cache } = self;
        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let bitmap = cache.entry(glyph.key).or_insert_with(|| {
                let (_, coverage) = font.rasterize_config(glyph.key);
                GlyphBitmap {
                    width: glyph.width,
                    height: glyph.height,
                    coverage,
                }
            });
            blend_glyph(
                canvas,
                glyph.x.round() as i64,
                glyph.y.round() as i64,
                bitmap,
            );
        }
    }
}

impl std::fmt::Debug for CaptionFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptionFont")
            .field("cached_glyphs", &self.cache.len())
            .finish()
    }
}

fn blend_glyph(canvas: &mut RgbImage, x: i64, y: i64, bitmap: &GlyphBitmap) {
    let (cw, ch) = (canvas.width() as i64, canvas.height() as i64);
    for gy in 0..bitmap.height as i64 {
        for gx in 0..bitmap.width as i64 {
            let (px, py) = (x + gx, y + gy);
            if px < 0 || py < 0 || px >= cw || py >= ch {
                continue;
            }
            let coverage = bitmap.coverage[(gy as usize) * bitmap.width + gx as usize] as f32 / 255.0;
            if coverage == 0.0 {
                continue;
            }
            let pixel = canvas.get_pixel_mut(px as u32, py as u32);
            for channel in pixel.0.iter_mut() {
                *channel = (*channel as f32 + (255.0 - *channel as f32) * coverage) as u8;
            }
        }
    }
}

/// Paints frames: black clear, letterboxed base image, optional incoming
/// image at `1 - progress` opacity, caption band over the bottom third.
pub struct FrameCompositor {
    width: u32,
    height: u32,
    font: Option<CaptionFont>,
    warned_no_font: bool,
}

impl FrameCompositor {
    pub fn new(width: u32, height: u32, font: Option<CaptionFont>) -> Self {
        Self {
            width,
            height,
            font,
            warned_no_font: false,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Scale a slide into its letterbox position once, ahead of the loop.
    pub fn prepare(&self, slide: &Slide) -> PreparedSlide {
        let (x, y, w, h) = compute_letterbox(
            self.width,
            self.height,
            slide.image.width(),
            slide.image.height(),
        );
        let scaled = imageops::resize(&slide.image, w, h, imageops::FilterType::Lanczos3);
        PreparedSlide {
            scaled,
            x,
            y,
            caption: slide.caption.clone(),
        }
    }

    /// Render one frame.
    ///
    /// The caption always belongs to the fully drawn base image, matching
    /// the pre-transition slide until the fade settles.
    pub fn render(
        &mut self,
        base: &PreparedSlide,
        incoming: Option<(&PreparedSlide, f64)>,
    ) -> RgbImage {
        // Clear to black
        let mut canvas = RgbImage::new(self.width, self.height);

        imageops::overlay(&mut canvas, &base.scaled, base.x as i64, base.y as i64);

        if let Some((slide, progress)) = incoming {
            let alpha = (1.0 - progress).clamp(0.0, 1.0) as f32;
            blend_image(&mut canvas, &slide.scaled, slide.x, slide.y, alpha);
        }

        self.draw_caption_band(&mut canvas, &base.caption);
        canvas
    }

    fn draw_caption_band(&mut self, canvas: &mut RgbImage, caption: &str) {
        let band_y = self.height - self.height / 3;
        let band_h = self.height - band_y;

        // Semi-opaque darkening toward black
        let keep = 1.0 - BAND_ALPHA;
        for y in band_y..self.height {
            for x in 0..self.width {
                let pixel = canvas.get_pixel_mut(x, y);
                for channel in pixel.0.iter_mut() {
                    *channel = (*channel as f32 * keep) as u8;
                }
            }
        }

        let caption = truncate_caption(caption);
        if caption.is_empty() {
            return;
        }
        match self.font.as_mut() {
            Some(font) => {
                let px = (self.height as f32 / 24.0).max(12.0);
                font.draw_centered(canvas, &caption, band_y, band_h, px);
            }
            None if !self.warned_no_font => {
                self.warned_no_font = true;
                warn!("no caption font available; rendering band without text");
            }
            None => {}
        }
    }
}

impl std::fmt::Debug for FrameCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameCompositor")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("has_font", &self.font.is_some())
            .finish()
    }
}

/// Draw `top` onto `canvas` at the given offset with uniform opacity.
fn blend_image(canvas: &mut RgbImage, top: &RgbImage, x: u32, y: u32, alpha: f32) {
    if alpha <= 0.0 {
        return;
    }
    if alpha >= 1.0 {
        imageops::overlay(canvas, top, x as i64, y as i64);
        return;
    }
    for ty in 0..top.height() {
        for tx in 0..top.width() {
            let (cx, cy) = (x + tx, y + ty);
            if cx >= canvas.width() || cy >= canvas.height() {
                continue;
            }
            let src = top.get_pixel(tx, ty);
            let dst = canvas.get_pixel_mut(cx, cy);
            for c in 0..3 {
                dst.0[c] = (dst.0[c] as f32 * (1.0 - alpha) + src.0[c] as f32 * alpha) as u8;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_wide_image() {
        // 2:1 image in a 16:9 canvas fills the width
        let (x, y, w, h) = compute_letterbox(1280, 720, 1000, 500);
        assert_eq!((x, w), (0, 1280));
        assert_eq!(h, 640);
        assert_eq!(y, 40);
    }

    #[test]
    fn test_letterbox_tall_image() {
        // Portrait image in a landscape canvas fills the height
        let (x, y, w, h) = compute_letterbox(1280, 720, 720, 1280);
        assert_eq!((y, h), (0, 720));
        assert_eq!(w, 405);
        assert_eq!(x, (1280 - 405) / 2);
    }

    #[test]
    fn test_letterbox_matching_ratio_fills_canvas() {
        let (x, y, w, h) = compute_letterbox(1280, 720, 1920, 1080);
        assert_eq!((x, y, w, h), (0, 0, 1280, 720));
    }

    #[test]
    fn test_truncate_caption() {
        let short = "a mountain at dawn";
        assert_eq!(truncate_caption(short), short);

        let long = "x".repeat(80);
        let truncated = truncate_caption(&long);
        assert_eq!(truncated.chars().count(), 60);
        assert!(truncated.ends_with("..."));
    }

    fn solid_slide(w: u32, h: u32, value: u8, caption: &str) -> Slide {
        Slide {
            image: RgbImage::from_pixel(w, h, Rgb([value, value, value])),
            caption: caption.to_string(),
        }
    }

    #[test]
    fn test_render_clears_to_black_outside_letterbox() {
        let mut compositor = FrameCompositor::new(64, 64, None);
        // Wide image leaves bars at top and bottom
        let prepared = compositor.prepare(&solid_slide(64, 16, 200, ""));
        let frame = compositor.render(&prepared, None);
        assert_eq!(frame.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(frame.get_pixel(32, 32).0, [200, 200, 200]);
    }

    #[test]
    fn test_cross_fade_blends_incoming() {
        let mut compositor = FrameCompositor::new(32, 32, None);
        let dark = compositor.prepare(&solid_slide(32, 32, 0, ""));
        let bright = compositor.prepare(&solid_slide(32, 32, 200, ""));

        // progress 0.25 -> incoming opacity 0.75
        let frame = compositor.render(&dark, Some((&bright, 0.25)));
        let value = frame.get_pixel(16, 8).0[0];
        assert!((value as i32 - 150).abs() <= 2, "value {value}");
    }

    #[test]
    fn test_caption_band_darkens_bottom_third() {
        let mut compositor = FrameCompositor::new(60, 60, None);
        let slide = compositor.prepare(&solid_slide(60, 60, 100, "caption"));
        let frame = compositor.render(&slide, None);

        // Above the band: untouched; inside the band: darkened
        assert_eq!(frame.get_pixel(30, 10).0[0], 100);
        assert_eq!(frame.get_pixel(30, 55).0[0], 25);
    }

    #[test]
    fn test_placeholder_is_a_gradient() {
        let img = placeholder_image(16, 16);
        assert_ne!(img.get_pixel(8, 0).0, img.get_pixel(8, 15).0);
    }
}
