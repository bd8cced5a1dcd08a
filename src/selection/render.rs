//! Cairo rendering for the selection overlay.
//!
//! Every frame is composed from the frozen desktop snapshot: dim everything
//! outside the live selection, stroke a red border around it, and draw the
//! size readout and the help caption on top. The composed surface is handed
//! to the window as a row-major 0RGB buffer.

use cairo::{FontSlant, FontWeight, Format, ImageSurface};

use super::SelectionError;
use crate::capture::PixelSnapshot;
use crate::util::Rect;

const DIM_ALPHA: f64 = 120.0 / 255.0;
const LABEL_BG_ALPHA: f64 = 200.0 / 255.0;
const HELP_BG_ALPHA: f64 = 180.0 / 255.0;
const BORDER_WIDTH: f64 = 2.0;
const SIZE_FONT_PX: f64 = 13.0;
const HELP_FONT_PX: f64 = 16.0;
const HELP_TEXT: &str = "Drag to select area | ESC to cancel";

/// Frame composer for one selection session.
pub struct OverlayScene {
    base: ImageSurface,
    scratch: ImageSurface,
    width: i32,
    height: i32,
}

impl OverlayScene {
    /// Build a scene over a frozen desktop snapshot.
    pub fn new(snapshot: &PixelSnapshot) -> Result<Self, SelectionError> {
        let width = snapshot.width() as i32;
        let height = snapshot.height() as i32;
        let base = snapshot_surface(snapshot)?;
        let scratch = ImageSurface::create(Format::ARgb32, width, height)?;
        Ok(Self {
            base,
            scratch,
            width,
            height,
        })
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    /// Compose one frame. `selection` is the live rectangle to keep
    /// undimmed, already filtered to a positive area.
    pub fn render(&mut self, selection: Option<Rect>) -> Result<Vec<u32>, SelectionError> {
        {
            let ctx = cairo::Context::new(&self.scratch)?;
            ctx.set_source_surface(&self.base, 0.0, 0.0)?;
            ctx.paint()?;

            dim_around(&ctx, self.width, self.height, selection)?;

            if let Some(sel) = selection {
                draw_border(&ctx, sel)?;
                draw_size_label(&ctx, self.height, sel)?;
            }

            draw_help_caption(&ctx, self.width)?;
        }
        // The context must be gone before the pixel data can be borrowed.
        surface_to_buffer(&mut self.scratch)
    }
}

/// Convert RGBA snapshot pixels into a cairo ARGB32 surface.
fn snapshot_surface(snapshot: &PixelSnapshot) -> Result<ImageSurface, SelectionError> {
    let width = snapshot.width() as i32;
    let height = snapshot.height() as i32;
    let mut surface = ImageSurface::create(Format::ARgb32, width, height)?;

    {
        let stride = surface.stride() as usize;
        let mut data = surface.data()?;
        for (y, row) in snapshot.pixels().rows().enumerate() {
            let line = &mut data[y * stride..];
            for (x, pixel) in row.enumerate() {
                let [r, g, b, a] = pixel.0;
                let offset = x * 4;
                // ARGB32 is BGRA in memory on little-endian.
                line[offset] = b;
                line[offset + 1] = g;
                line[offset + 2] = r;
                line[offset + 3] = a;
            }
        }
    }
    surface.mark_dirty();
    Ok(surface)
}

/// Read a composed surface out as the 0RGB u32 buffer minifb expects.
fn surface_to_buffer(surface: &mut ImageSurface) -> Result<Vec<u32>, SelectionError> {
    let width = surface.width() as usize;
    let height = surface.height() as usize;
    let stride = surface.stride() as usize;

    let data = surface.data()?;
    let mut buffer = vec![0u32; width * height];
    for y in 0..height {
        let row = &data[y * stride..y * stride + width * 4];
        for (x, px) in row.chunks_exact(4).enumerate() {
            buffer[y * width + x] = u32::from_le_bytes([px[0], px[1], px[2], px[3]]);
        }
    }
    Ok(buffer)
}

/// Dim the desktop, leaving the selection window untouched.
fn dim_around(
    ctx: &cairo::Context,
    width: i32,
    height: i32,
    selection: Option<Rect>,
) -> Result<(), cairo::Error> {
    ctx.set_source_rgba(0.0, 0.0, 0.0, DIM_ALPHA);
    match selection {
        None => ctx.rectangle(0.0, 0.0, width as f64, height as f64),
        Some(sel) => {
            // Four strips around the selection; skip strips the selection
            // pushes off the surface.
            let strips = [
                (0, 0, width, sel.y),
                (0, sel.bottom(), width, height - sel.bottom()),
                (0, sel.y, sel.x, sel.height),
                (sel.right(), sel.y, width - sel.right(), sel.height),
            ];
            for (x, y, w, h) in strips {
                if w > 0 && h > 0 {
                    ctx.rectangle(x as f64, y as f64, w as f64, h as f64);
                }
            }
        }
    }
    ctx.fill()
}

fn draw_border(ctx: &cairo::Context, sel: Rect) -> Result<(), cairo::Error> {
    ctx.set_source_rgb(1.0, 0.0, 0.0);
    ctx.set_line_width(BORDER_WIDTH);
    ctx.rectangle(
        sel.x as f64,
        sel.y as f64,
        sel.width as f64,
        sel.height as f64,
    );
    ctx.stroke()
}

/// Pick the size label's top-left corner.
///
/// The label prefers to sit above the selection; selections hugging the
/// top edge push it below, and selections filling the screen bottom pull
/// it inside.
fn label_origin(sel: Rect, text_w: f64, text_h: f64, surface_h: i32) -> (f64, f64) {
    let text_x = sel.x as f64 + (sel.width as f64 - text_w) / 2.0;
    let mut text_y = if sel.y > 25 {
        sel.y as f64 - text_h - 5.0
    } else {
        sel.bottom() as f64 + 5.0
    };

    if text_y < 0.0 {
        text_y = sel.bottom() as f64 + 5.0;
    }
    if text_y + text_h > surface_h as f64 {
        text_y = sel.y as f64 + 5.0;
    }

    (text_x, text_y)
}

fn draw_size_label(ctx: &cairo::Context, height: i32, sel: Rect) -> Result<(), cairo::Error> {
    let text = format!("{} x {}", sel.width, sel.height);
    ctx.select_font_face("Sans", FontSlant::Normal, FontWeight::Bold);
    ctx.set_font_size(SIZE_FONT_PX);
    let extents = ctx.text_extents(&text)?;
    let font = ctx.font_extents()?;
    let text_w = extents.width();
    let text_h = font.ascent() + font.descent();

    let (text_x, text_y) = label_origin(sel, text_w, text_h, height);

    ctx.set_source_rgba(0.0, 0.0, 0.0, LABEL_BG_ALPHA);
    ctx.rectangle(text_x - 3.0, text_y - 2.0, text_w + 6.0, text_h + 4.0);
    ctx.fill()?;

    ctx.set_source_rgb(1.0, 1.0, 1.0);
    ctx.move_to(text_x, text_y + font.ascent());
    ctx.show_text(&text)
}

fn draw_help_caption(ctx: &cairo::Context, width: i32) -> Result<(), cairo::Error> {
    ctx.select_font_face("Sans", FontSlant::Normal, FontWeight::Bold);
    ctx.set_font_size(HELP_FONT_PX);
    let extents = ctx.text_extents(HELP_TEXT)?;
    let font = ctx.font_extents()?;
    let text_w = extents.width();
    let text_h = font.ascent() + font.descent();

    let hx = (width as f64 - text_w) / 2.0;
    let hy = 20.0;

    ctx.set_source_rgba(0.0, 0.0, 0.0, HELP_BG_ALPHA);
    ctx.rectangle(hx - 10.0, hy - 5.0, text_w + 20.0, text_h + 10.0);
    ctx.fill()?;

    ctx.set_source_rgb(1.0, 1.0, 1.0);
    ctx.move_to(hx, hy + font.ascent());
    ctx.show_text(HELP_TEXT)
}
