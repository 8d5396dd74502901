use crate::config::PrompterConfig;
use crate::foundation::core::FrameRgba;
use crate::foundation::error::{PromptError, PromptResult};
use crate::render::composite::over_in_place;
use crate::render::scale::aspect_fill;
use crate::render::text::{TextBrushRgba8, TextLayoutEngine};
use crate::script::orp::FocusSplit;
use crate::script::tokenize::Token;

const TEXT_WHITE: TextBrushRgba8 = TextBrushRgba8 {
    r: 255,
    g: 255,
    b: 255,
    a: 255,
};

/// Accent color for the focus glyph.
const TEXT_FOCUS: TextBrushRgba8 = TextBrushRgba8 {
    r: 255,
    g: 62,
    b: 62,
    a: 255,
};

/// Legibility band: black at 60% opacity.
const BAND_ALPHA: u8 = 153;

/// Horizontal start of the word run such that the focus glyph's midpoint
/// sits exactly on the surface's horizontal midpoint, for every word.
pub fn overlay_start_x(surface_width: f32, width_before: f32, width_focus: f32) -> f32 {
    surface_width / 2.0 - width_before - width_focus / 2.0
}

/// Compositor settings, frozen for the lifetime of a session.
///
/// `reference_viewport_width` is the operator viewport width the overlay
/// scale is computed against: `draw_font_px = font_size_px *
/// surface_width / reference_viewport_width`, which keeps the recorded
/// overlay visually proportionate to the operator's preview regardless of
/// capture resolution.
#[derive(Clone, Copy, Debug)]
pub struct CompositorOpts {
    pub font_size_px: u32,
    pub reference_viewport_width: f32,
    pub show_orp: bool,
}

impl CompositorOpts {
    pub fn from_config(cfg: &PrompterConfig) -> Self {
        Self {
            font_size_px: cfg.font_size_px,
            reference_viewport_width: cfg.reference_viewport_width,
            show_orp: cfg.show_orp,
        }
    }

    pub fn validate(&self) -> PromptResult<()> {
        if self.font_size_px == 0 {
            return Err(PromptError::validation("font_size_px must be > 0"));
        }
        if !self.reference_viewport_width.is_finite() || self.reference_viewport_width <= 0.0 {
            return Err(PromptError::validation(
                "reference_viewport_width must be finite and > 0",
            ));
        }
        Ok(())
    }
}

/// Per-tick frame composition seam: blit the live frame onto the render
/// surface, overlaying the current word while pacing runs.
///
/// The coordinator drives composition through this trait so sessions can
/// be exercised with a glyph-free composer in tests.
pub trait FrameComposer {
    fn composite(
        &mut self,
        src: &FrameRgba,
        dst: &mut FrameRgba,
        token: Option<&Token>,
        running: bool,
    ) -> PromptResult<()>;
}

/// Draws the live frame plus the current word overlay onto a render
/// surface. Safe to call at display cadence; without a running token it
/// only blits the live frame.
pub struct Compositor {
    text: TextLayoutEngine,
    opts: CompositorOpts,
    ctx: Option<vello_cpu::RenderContext>,
    overlay: Option<vello_cpu::Pixmap>,
}

impl Compositor {
    pub fn new(font_bytes: Vec<u8>, opts: CompositorOpts) -> PromptResult<Self> {
        opts.validate()?;
        Ok(Self {
            text: TextLayoutEngine::new(font_bytes)?,
            opts,
            ctx: None,
            overlay: None,
        })
    }

    pub fn opts(&self) -> CompositorOpts {
        self.opts
    }

    /// Composite one frame: aspect-fill `src` onto `dst`, then overlay the
    /// current word when pacing is running.
    pub fn composite(
        &mut self,
        src: &FrameRgba,
        dst: &mut FrameRgba,
        token: Option<&Token>,
        running: bool,
    ) -> PromptResult<()> {
        aspect_fill(src, dst)?;

        let Some(token) = token else {
            return Ok(());
        };
        if !running {
            return Ok(());
        }
        self.draw_word_overlay(dst, token.as_str())
    }

    fn draw_word_overlay(&mut self, dst: &mut FrameRgba, word: &str) -> PromptResult<()> {
        let width_u16: u16 = dst
            .width
            .try_into()
            .map_err(|_| PromptError::validation("surface width exceeds u16"))?;
        let height_u16: u16 = dst
            .height
            .try_into()
            .map_err(|_| PromptError::validation("surface height exceeds u16"))?;

        let surface_w = dst.width as f32;
        let surface_h = dst.height as f32;
        let scale_ratio = surface_w / self.opts.reference_viewport_width;
        let draw_font_px = self.opts.font_size_px as f32 * scale_ratio;
        if !draw_font_px.is_finite() || draw_font_px <= 0.0 {
            return Err(PromptError::validation("derived overlay font size invalid"));
        }

        // Segment layouts and x offsets, measured before any drawing.
        let mut segments: Vec<(parley::Layout<TextBrushRgba8>, f32)> = Vec::with_capacity(3);
        if self.opts.show_orp {
            let split = FocusSplit::of_word(word);
            let before = self.text.layout(&split.before, draw_font_px, TEXT_WHITE)?;
            let focus = self.text.layout(&split.focus, draw_font_px, TEXT_FOCUS)?;
            let after = self.text.layout(&split.after, draw_font_px, TEXT_WHITE)?;

            let w_before = TextLayoutEngine::advance_width(&before);
            let w_focus = TextLayoutEngine::advance_width(&focus);
            let start_x = overlay_start_x(surface_w, w_before, w_focus);
            segments.push((before, start_x));
            segments.push((focus, start_x + w_before));
            segments.push((after, start_x + w_before + w_focus));
        } else {
            let whole = self.text.layout(word, draw_font_px, TEXT_WHITE)?;
            let w = TextLayoutEngine::advance_width(&whole);
            segments.push((whole, (surface_w - w) / 2.0));
        }

        let center_y = surface_h / 2.0;
        let text_h = segments
            .iter()
            .map(|(l, _)| l.height())
            .fold(0.0f32, f32::max);
        let text_top = center_y - text_h / 2.0;

        let mut ctx = match self.ctx.take() {
            Some(c) if c.width() == width_u16 && c.height() == height_u16 => c,
            _ => vello_cpu::RenderContext::new(width_u16, height_u16),
        };
        ctx.reset();

        // Legibility band, full width, vertically centered.
        let band_h = 1.5 * draw_font_px;
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(0, 0, 0, BAND_ALPHA));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            f64::from(center_y - band_h / 2.0),
            f64::from(surface_w),
            f64::from(center_y + band_h / 2.0),
        ));

        for (layout, x) in &segments {
            ctx.set_transform(vello_cpu::kurbo::Affine::translate((
                f64::from(*x),
                f64::from(text_top),
            )));
            for line in layout.lines() {
                for item in line.items() {
                    let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                        continue;
                    };
                    let brush = run.style().brush;
                    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                        brush.r, brush.g, brush.b, brush.a,
                    ));
                    let glyphs = run.glyphs().map(|g| vello_cpu::Glyph {
                        id: g.id,
                        x: g.x,
                        y: g.y,
                    });
                    ctx.glyph_run(self.text.font())
                        .font_size(run.run().font_size())
                        .fill_glyphs(glyphs);
                }
            }
        }
        ctx.flush();

        let mut overlay = match self.overlay.take() {
            Some(p) if p.width() == width_u16 && p.height() == height_u16 => p,
            _ => vello_cpu::Pixmap::new(width_u16, height_u16),
        };
        overlay.data_as_u8_slice_mut().fill(0);
        ctx.render_to_pixmap(&mut overlay);

        over_in_place(&mut dst.data, overlay.data_as_u8_slice())?;

        self.ctx = Some(ctx);
        self.overlay = Some(overlay);
        Ok(())
    }
}

impl FrameComposer for Compositor {
    fn composite(
        &mut self,
        src: &FrameRgba,
        dst: &mut FrameRgba,
        token: Option<&Token>,
        running: bool,
    ) -> PromptResult<()> {
        Compositor::composite(self, src, dst, token, running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_midpoint_equals_surface_midpoint() {
        // The defining layout invariant: for any segment widths, the focus
        // glyph's horizontal center lands on the surface's center.
        let cases = [
            (1920.0, 0.0, 40.0),
            (1920.0, 310.5, 38.25),
            (640.0, 55.0, 21.0),
            (640.0, 600.0, 12.0),
        ];
        for (surface_w, w_before, w_focus) in cases {
            let start = overlay_start_x(surface_w, w_before, w_focus);
            let focus_mid = start + w_before + w_focus / 2.0;
            assert!(
                (focus_mid - surface_w / 2.0).abs() < 1e-3,
                "surface {surface_w}: focus mid {focus_mid}"
            );
        }
    }

    #[test]
    fn opts_validation() {
        let mut opts = CompositorOpts {
            font_size_px: 120,
            reference_viewport_width: 1280.0,
            show_orp: true,
        };
        opts.validate().unwrap();
        opts.font_size_px = 0;
        assert!(opts.validate().is_err());
        opts.font_size_px = 120;
        opts.reference_viewport_width = 0.0;
        assert!(opts.validate().is_err());
    }
}
