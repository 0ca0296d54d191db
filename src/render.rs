use crate::bottle::Bottle;
use crate::color::{Rgb, Rgba};
use crate::particles::Particle;
use crate::shader::SurfaceShader;
use crate::silhouette::Silhouette;
use crate::vec2::Vec2;
use crossterm::{
    cursor,
    event::{DisableMouseCapture, EnableMouseCapture},
    execute, queue,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use std::io::{self, Write};

/// Glass outline opacity.
pub const BORDER_ALPHA: u8 = 102;
const BORDER: Rgba = Rgba::new(220, 230, 240, BORDER_ALPHA);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
    pub bold: bool,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
            bold: false,
        }
    }
}

pub struct CellBuffer {
    pub w: u16,
    pub h: u16,
    pub cells: Vec<Cell>,
}

impl CellBuffer {
    pub fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }

    pub fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub fn get(&self, x: u16, y: u16) -> Option<Cell> {
        (x < self.w && y < self.h).then(|| self.cells[self.idx(x, y)])
    }

    pub fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    pub fn clear(&mut self, bg: Color) {
        self.cells.fill(Cell {
            bg,
            ..Cell::default()
        });
    }
}

/// Sub-pixel canvas, row 0 at the top. Two columns and four rows per cell.
pub struct PixelCanvas {
    pub w: u32,
    pub h: u32,
    pub px: Vec<Rgba>,
}

impl PixelCanvas {
    pub fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Rgba::TRANSPARENT; (w as usize) * (h as usize)],
        }
    }

    pub fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }

    pub fn get(&self, x: u32, y: u32) -> Rgba {
        if x >= self.w || y >= self.h {
            return Rgba::TRANSPARENT;
        }
        self.px[self.idx(x, y)]
    }

    pub fn clear(&mut self, p: Rgba) {
        self.px.fill(p);
    }

    /// Source-over compositing.
    pub fn blend_over(&mut self, x: i32, y: i32, src: Rgba) {
        if x < 0 || y < 0 {
            return;
        }
        let (x, y) = (x as u32, y as u32);
        if x >= self.w || y >= self.h {
            return;
        }
        let i = self.idx(x, y);
        let dst = self.px[i];

        let sa = src.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;

        let out_a = sa + da * (1.0 - sa);
        if out_a <= 1e-6 {
            self.px[i] = Rgba::TRANSPARENT;
            return;
        }

        let blend = |sc: u8, dc: u8| -> u8 {
            let sc = sc as f32 / 255.0;
            let dc = dc as f32 / 255.0;
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            (out.clamp(0.0, 1.0) * 255.0 + 0.5) as u8
        };

        self.px[i] = Rgba::new(
            blend(src.r, dst.r),
            blend(src.g, dst.g),
            blend(src.b, dst.b),
            (out_a.clamp(0.0, 1.0) * 255.0 + 0.5) as u8,
        );
    }
}

/// Maps y-up world units onto the y-down canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct View {
    pub scale: f32,
    pub origin: Vec2,
    pub canvas_h: u32,
}

impl View {
    /// Largest uniform scale that fits a `world_w` by `world_h` world,
    /// centered horizontally and resting on the canvas bottom.
    pub fn fit(world_w: f32, world_h: f32, canvas_w: u32, canvas_h: u32) -> Self {
        let sx = canvas_w as f32 / world_w.max(1e-3);
        let sy = canvas_h as f32 / world_h.max(1e-3);
        let scale = sx.min(sy).max(1e-3);
        Self {
            scale,
            origin: Vec2::new((canvas_w as f32 - world_w * scale) * 0.5, 0.0),
            canvas_h,
        }
    }

    pub fn to_canvas(&self, p: Vec2) -> (f32, f32) {
        (
            self.origin.x + p.x * self.scale,
            self.canvas_h as f32 - (self.origin.y + p.y * self.scale),
        )
    }

    pub fn to_world(&self, x: f32, y: f32) -> Vec2 {
        Vec2::new(
            (x - self.origin.x) / self.scale,
            (self.canvas_h as f32 - y - self.origin.y) / self.scale,
        )
    }
}

/// Rasterizes one bottle: liquid clipped to the silhouette, then the glass edge.
pub fn draw_bottle(
    canvas: &mut PixelCanvas,
    view: &View,
    bottle: &Bottle,
    silhouette: &Silhouette,
    shader: &SurfaceShader,
    time: f32,
) {
    let (w, h) = (bottle.width(), bottle.height());
    let center = bottle.center();
    let rotation = bottle.rotation();

    let (mut x0, mut y0, mut x1, mut y1) = (f32::MAX, f32::MAX, f32::MIN, f32::MIN);
    for (sx, sy) in [(-0.5, -0.5), (0.5, -0.5), (0.5, 0.5), (-0.5, 0.5)] {
        let corner = center.add(Vec2::new(sx * w, sy * h).rotate(rotation));
        let (cx, cy) = view.to_canvas(corner);
        x0 = x0.min(cx);
        y0 = y0.min(cy);
        x1 = x1.max(cx);
        y1 = y1.max(cy);
    }
    let x0 = x0.floor().max(0.0) as i32;
    let y0 = y0.floor().max(0.0) as i32;
    let x1 = (x1.ceil() as i32).min(canvas.w as i32 - 1);
    let y1 = (y1.ceil() as i32).min(canvas.h as i32 - 1);

    // One canvas pixel, in UV.
    let du = 1.0 / (w * view.scale);
    let dv = 1.0 / (h * view.scale);

    for y in y0..=y1 {
        for x in x0..=x1 {
            let p = view.to_world(x as f32 + 0.5, y as f32 + 0.5);
            let local = p.sub(center).rotate(-rotation);
            let u = local.x / w + 0.5;
            let v = local.y / h + 0.5;
            if !silhouette.contains(u, v) {
                continue;
            }
            if let Some(c) = shader.shade(u, v, time, bottle.uniforms(), bottle.palette()) {
                canvas.blend_over(x, y, c);
            }
            if silhouette.is_edge(u, v, du, dv) {
                canvas.blend_over(x, y, BORDER);
            }
        }
    }
}

/// Soft dot per particle, faded by its remaining life.
pub fn draw_particles<'a>(
    canvas: &mut PixelCanvas,
    view: &View,
    particles: impl Iterator<Item = &'a Particle>,
) {
    for p in particles {
        let alpha = (p.alpha() * 255.0).round().clamp(0.0, 255.0) as u8;
        if alpha == 0 {
            continue;
        }
        let (cx, cy) = view.to_canvas(p.pos);
        let r = (p.scale() * 1.5).max(0.5);
        let ri = r.ceil() as i32;
        let c = p.color.opaque().with_alpha(alpha);
        for dy in -ri..=ri {
            for dx in -ri..=ri {
                let (fx, fy) = (dx as f32, dy as f32);
                if fx * fx + fy * fy > r * r {
                    continue;
                }
                canvas.blend_over(cx as i32 + dx, cy as i32 + dy, c);
            }
        }
    }
}

pub struct Terminal {
    pub out: io::Stdout,
    pub cols: u16,
    pub rows: u16,
    pub prev: CellBuffer,
    pub cur: CellBuffer,
    pub canvas: PixelCanvas,
}

impl Terminal {
    pub fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            EnableMouseCapture,
            cursor::Hide,
            DisableLineWrap,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        let (cols, rows) = terminal::size()?;
        let prev = CellBuffer::new(cols, rows);
        let cur = CellBuffer::new(cols, rows);

        // Braille: 2×4 pixels per cell
        let canvas = PixelCanvas::new(cols as u32 * 2, rows as u32 * 4);

        Ok(Self {
            out,
            cols,
            rows,
            prev,
            cur,
            canvas,
        })
    }

    pub fn end(&mut self) -> anyhow::Result<()> {
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            DisableMouseCapture,
            cursor::Show,
            EnableLineWrap,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    pub fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.canvas = PixelCanvas::new(c as u32 * 2, r as u32 * 4);
        queue!(self.out, Clear(ClearType::All))?;
        Ok(true)
    }

    pub fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut last_bold = false;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                if last_bold != c.bold {
                    let attr = if c.bold {
                        Attribute::Bold
                    } else {
                        Attribute::NormalIntensity
                    };
                    queue!(self.out, SetAttribute(attr))?;
                    last_bold = c.bold;
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(
            self.out,
            SetAttribute(Attribute::Reset),
            ResetColor,
            EndSynchronizedUpdate
        )?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Braille encoding: 2×4 pixels -> U+2800..U+28FF
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

pub fn canvas_to_cells(canvas: &PixelCanvas, out: &mut CellBuffer, bg: Color) {
    let cols = out.w as u32;
    let rows = out.h as u32;

    for cy in 0..rows {
        for cx in 0..cols {
            let px0 = cx * 2;
            let py0 = cy * 4;

            let mut mask: u8 = 0;
            let mut sum = [0u32; 3];
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let p = canvas.get(px0 + dx, py0 + dy);
                    // alpha below threshold is not ink
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum[0] += p.r as u32;
                        sum[1] += p.g as u32;
                        sum[2] += p.b as u32;
                        ink_count += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');
            let fg = if ink_count > 0 {
                Rgb::new(
                    (sum[0] / ink_count) as u8,
                    (sum[1] / ink_count) as u8,
                    (sum[2] / ink_count) as u8,
                )
                .to_color()
            } else {
                Color::White
            };

            out.set(
                cx as u16,
                cy as u16,
                Cell {
                    ch,
                    fg,
                    bg,
                    bold: false,
                },
            );
        }
    }
}

/* -----------------------------
   Text overlay
------------------------------ */

pub fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(
            xx,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        );
    }
}

/// Slot meter such as `[███·····]`, one character per slot.
pub fn slot_meter(filled: usize, slots: usize) -> String {
    let mut s = String::with_capacity(slots + 2);
    s.push('[');
    for i in 0..slots {
        s.push(if i < filled { '█' } else { '·' });
    }
    s.push(']');
    s
}

/// Boxed overlay centered on the buffer. Body lines past the box are dropped.
pub fn draw_center_box(buf: &mut CellBuffer, title: &str, body: &str) {
    let (w, h) = (buf.w, buf.h);
    let bw = 60.min(w.saturating_sub(4));
    let bh = 18.min(h.saturating_sub(4));
    if bw < 4 || bh < 4 {
        return;
    }
    let x0 = (w - bw) / 2;
    let y0 = (h - bh) / 2;
    let (fg, bg) = (Color::White, Color::Black);
    let put = |buf: &mut CellBuffer, x: u16, y: u16, ch: char| {
        buf.set(
            x,
            y,
            Cell {
                ch,
                fg,
                bg,
                bold: false,
            },
        )
    };

    for y in y0..y0 + bh {
        for x in x0..x0 + bw {
            put(buf, x, y, ' ');
        }
    }
    for x in x0..x0 + bw {
        put(buf, x, y0, '─');
        put(buf, x, y0 + bh - 1, '─');
    }
    for y in y0..y0 + bh {
        put(buf, x0, y, '│');
        put(buf, x0 + bw - 1, y, '│');
    }
    put(buf, x0, y0, '┌');
    put(buf, x0 + bw - 1, y0, '┐');
    put(buf, x0, y0 + bh - 1, '└');
    put(buf, x0 + bw - 1, y0 + bh - 1, '┘');

    draw_text(buf, x0 + 2, y0 + 1, title, fg, bg);
    let mut yy = y0 + 3;
    for line in body.lines() {
        if yy >= y0 + bh - 1 {
            break;
        }
        draw_text(buf, x0 + 2, yy, line, fg, bg);
        yy += 1;
    }
}
