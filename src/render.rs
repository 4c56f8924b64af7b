use crossterm::{
    cursor, queue,
    style::{self, Color as CColor},
};
use std::io::{self, Write};

use crate::game::{GameLoop, Obstacle};

// ── Colors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    const fn lerp(a: Rgb, b: Rgb, t_256: u16) -> Rgb {
        let t = t_256 as i32;
        Rgb(
            (a.0 as i32 + (b.0 as i32 - a.0 as i32) * t / 256) as u8,
            (a.1 as i32 + (b.1 as i32 - a.1 as i32) * t / 256) as u8,
            (a.2 as i32 + (b.2 as i32 - a.2 as i32) * t / 256) as u8,
        )
    }

    const fn dim(self) -> Rgb {
        Rgb(self.0 / 2, self.1 / 2, self.2 / 2)
    }
}

impl From<Rgb> for CColor {
    fn from(c: Rgb) -> Self {
        CColor::Rgb {
            r: c.0,
            g: c.1,
            b: c.2,
        }
    }
}

const SKY_TOP: Rgb = Rgb(70, 180, 200);
const SKY_BOT: Rgb = Rgb(190, 232, 245);
const PIPE_L: Rgb = Rgb(74, 122, 26);
const PIPE_M: Rgb = Rgb(100, 170, 40);
const PIPE_R: Rgb = Rgb(115, 191, 46);
const PIPE_HI: Rgb = Rgb(145, 215, 62);
const CAP_DARK: Rgb = Rgb(60, 100, 20);
const BIRD_Y: Rgb = Rgb(245, 200, 66);
const BIRD_HI: Rgb = Rgb(255, 225, 100);
const BIRD_WING: Rgb = Rgb(215, 165, 35);
const BIRD_EYE: Rgb = Rgb(255, 255, 255);
const BIRD_PUPIL: Rgb = Rgb(20, 20, 20);
const BIRD_BEAK: Rgb = Rgb(225, 75, 35);
const HILL_FAR: Rgb = Rgb(120, 195, 75);
const HILL_NEAR: Rgb = Rgb(95, 175, 55);
const PANEL: Rgb = Rgb(210, 185, 110);
const PANEL_FACE: Rgb = Rgb(220, 195, 120);
const BUTTON: Rgb = Rgb(255, 255, 255);
const BUTTON_TEXT: Rgb = Rgb(20, 20, 20);
const WHITE: Rgb = Rgb(255, 255, 255);
const SHADOW: Rgb = Rgb(30, 30, 30);

// ── Pixel buffer with half-block rendering ──────────────────────────────────

pub struct PixelBuf {
    w: usize,
    h: usize, // pixel height = terminal rows * 2
    px: Vec<Rgb>,
}

impl PixelBuf {
    pub fn new(w: usize, h: usize) -> Self {
        Self {
            w,
            h,
            px: vec![SKY_TOP; w * h],
        }
    }

    pub fn width(&self) -> usize {
        self.w
    }

    pub fn height(&self) -> usize {
        self.h
    }

    pub fn resize(&mut self, w: usize, h: usize) {
        self.w = w;
        self.h = h;
        self.px.resize(w * h, SKY_TOP);
    }

    pub fn set(&mut self, x: i32, y: i32, c: Rgb) {
        if x >= 0 && y >= 0 && (x as usize) < self.w && (y as usize) < self.h {
            self.px[y as usize * self.w + x as usize] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Rgb {
        self.px[y * self.w + x]
    }

    /// Fill a rectangle, clipped to the buffer before iterating.
    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, c: Rgb) {
        let clip = |from: i32, len: i32, max: usize| {
            let lo = (from as i64).clamp(0, max as i64) as usize;
            let hi = (from as i64 + len as i64).clamp(0, max as i64) as usize;
            lo..hi.max(lo)
        };
        let cols = clip(x, w, self.w);
        for row in clip(y, h, self.h) {
            self.px[row * self.w + cols.start..row * self.w + cols.end].fill(c);
        }
    }

    /// Write the buffer as upper half-blocks: foreground is the top pixel,
    /// background the bottom one. Colors are only re-sent when they change.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, cursor::MoveTo(0, 0))?;
        let rows = self.h / 2;
        // Unknown after a reset, so the first cell of a line always sets both.
        let mut fg: Option<Rgb> = None;
        let mut bg: Option<Rgb> = None;

        for row in 0..rows {
            for col in 0..self.w {
                let top = self.get(col, row * 2);
                let bot = self.get(col, row * 2 + 1);

                if top != bot && fg != Some(top) {
                    queue!(out, style::SetForegroundColor(top.into()))?;
                    fg = Some(top);
                }
                if bg != Some(bot) {
                    queue!(out, style::SetBackgroundColor(bot.into()))?;
                    bg = Some(bot);
                }
                let cell = if top == bot { ' ' } else { '\u{2580}' }; // ▀
                queue!(out, style::Print(cell))?;
            }
            if row + 1 < rows {
                queue!(out, style::ResetColor, style::Print("\r\n"))?;
                fg = None;
                bg = None;
            }
        }
        queue!(out, style::ResetColor)?;
        out.flush()
    }
}

// ── 3x5 bitmap font ─────────────────────────────────────────────────────────

/// Rows of a 3x5 glyph, top first; bit 2 is the leftmost pixel.
#[rustfmt::skip]
fn glyph(ch: char) -> Option<[u8; 5]> {
    Some(match ch {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b011, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b010, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'G' => [0b111, 0b100, 0b101, 0b101, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        _ => return None,
    })
}

/// Draw `text` centred on `cx` with a drop shadow. Unknown characters are
/// left blank but still take up a cell.
fn draw_text(buf: &mut PixelBuf, cx: i32, y: i32, text: &str, fg: Rgb) {
    let len = text.chars().count() as i32;
    let start_x = cx - (len * 4 - 1) / 2; // 3px per glyph + 1px spacing
    for (i, ch) in text.chars().enumerate() {
        let Some(rows) = glyph(ch) else { continue };
        let gx = start_x + i as i32 * 4;
        for (dy, bits) in rows.iter().enumerate() {
            for dx in 0..3 {
                if bits & (0b100 >> dx) != 0 {
                    let (px, py) = (gx + dx, y + dy as i32);
                    buf.set(px + 1, py + 1, SHADOW);
                    buf.set(px, py, fg);
                }
            }
        }
    }
}

fn draw_number(buf: &mut PixelBuf, cx: i32, y: i32, n: u32, fg: Rgb) {
    draw_text(buf, cx, y, &n.to_string(), fg);
}

// ── Scene ───────────────────────────────────────────────────────────────────

/// Furthest pixel coordinate the renderer works with, on or off screen.
pub const PX_LIMIT: i32 = 1 << 20;

/// Draws a [`GameLoop`] into a [`PixelBuf`], mapping game units to pixels.
pub struct Renderer {
    /// Game units per pixel.
    scale: f64,
    frame: u64,
    scroll: f64,
}

impl Renderer {
    pub fn new(scale: f64) -> Self {
        Self {
            scale,
            frame: 0,
            scroll: 0.0,
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Game-unit coordinate to pixel coordinate, saturating at
    /// [`PX_LIMIT`] so offsets from it cannot overflow.
    pub fn to_px(&self, units: f64) -> i32 {
        let limit = PX_LIMIT as f64;
        (units / self.scale).floor().clamp(-limit, limit) as i32
    }

    pub fn draw(&mut self, game: &GameLoop, buf: &mut PixelBuf) {
        self.frame += 1;
        if !game.is_game_over() {
            self.scroll += game.physics().pipe_speed / self.scale;
        }

        self.draw_sky(buf);
        self.draw_hills(buf);
        for obstacle in game.obstacles() {
            self.draw_obstacle(buf, obstacle, game.physics().gap);
        }
        self.draw_entity(buf, game);
        let cx = buf.width() as i32 / 2;
        draw_number(buf, cx, 4, game.score(), WHITE);

        if game.is_game_over() {
            self.draw_game_over(buf, game.score());
        }
    }

    fn draw_sky(&self, buf: &mut PixelBuf) {
        let (w, h) = (buf.width(), buf.height());
        for y in 0..h {
            let t = ((y * 256) / h.max(1)) as u16;
            let c = Rgb::lerp(SKY_TOP, SKY_BOT, t);
            for x in 0..w {
                buf.set(x as i32, y as i32, c);
            }
        }
    }

    fn draw_hills(&self, buf: &mut PixelBuf) {
        let base = buf.height() as i32;
        let s = buf.height() as f64 / 48.0;
        // Far hills
        for x in 0..buf.width() as i32 {
            let fx = (x as f64 + self.scroll * 0.2) * 0.04;
            let h = (fx.sin() * 6.0 + (fx * 1.7).sin() * 3.0) * s;
            let top = base - h as i32 - (4.0 * s) as i32;
            for y in top..base {
                buf.set(x, y, HILL_FAR);
            }
        }
        // Near hills
        for x in 0..buf.width() as i32 {
            let fx = (x as f64 + self.scroll * 0.4) * 0.06;
            let h = (fx.sin() * 4.0 + (fx * 2.3).sin() * 2.0) * s;
            let top = base - h as i32 - (2.0 * s) as i32;
            for y in top..base {
                buf.set(x, y, HILL_NEAR);
            }
        }
    }

    fn draw_obstacle(&self, buf: &mut PixelBuf, obstacle: &Obstacle, gap: f64) {
        let px = self.to_px(obstacle.x);
        let pw = self.to_px(obstacle.width).clamp(1, buf.width().max(1) as i32);
        let top_y = self.to_px(obstacle.y);
        let gap_top = self.to_px(obstacle.gap_top());
        let gap_bot = self.to_px(obstacle.gap_bottom(gap));
        let bot_end = self.to_px(obstacle.gap_bottom(gap) + obstacle.height);
        let cap_extra = 1;
        let cap_h = (pw / 3).clamp(1, 4);

        let visible = 0..buf.width() as i32;

        for x in (0..pw).filter(|x| visible.contains(&(px + x))) {
            let c = pipe_shade(x, pw);
            buf.fill_rect(px + x, top_y, 1, gap_top - cap_h - top_y, c);
            buf.fill_rect(px + x, gap_bot + cap_h, 1, bot_end - gap_bot - cap_h, c);
        }

        // Caps face the gap.
        for x in (-cap_extra..pw + cap_extra).filter(|x| visible.contains(&(px + x))) {
            let c = pipe_shade(x + cap_extra, pw + cap_extra * 2);
            buf.fill_rect(px + x, gap_top - cap_h, 1, cap_h, c);
            buf.fill_rect(px + x, gap_bot, 1, cap_h, c);
            buf.set(px + x, gap_top - 1, CAP_DARK);
            buf.set(px + x, gap_bot, CAP_DARK);
        }
    }

    fn draw_entity(&self, buf: &mut PixelBuf, game: &GameLoop) {
        let entity = game.entity();
        let cx = self.to_px(entity.x);
        let cy = self.to_px(entity.y);
        let s = (game.physics().entity_size / self.scale / 6.0).clamp(0.5, 64.0);

        // Nose up or down by one pixel row at +-45 degrees.
        let tilt = (entity.rotation_degrees() / 45.0).clamp(-1.0, 1.0) as i32;

        let bw = (3.0 * s).max(2.0) as i32;
        let bh = (2.0 * s).max(2.0) as i32;
        buf.fill_rect(cx - bw, cy - bh, bw * 2 + 1, bh * 2, BIRD_Y);
        buf.fill_rect(cx - bw + 1, cy - bh, bw * 2 - 2, 1, BIRD_HI);

        // Wing
        let wing_y_off = if game.is_game_over() || self.frame % 8 < 4 { -1 } else { 1 };
        let wing_w = (2.0 * s).max(1.0) as i32;
        buf.fill_rect(cx - bw + 1, cy + wing_y_off, wing_w, 1, BIRD_WING);

        // Eye
        let ex = cx + bw - 1;
        let ey = cy - bh + 1;
        buf.set(ex, ey, BIRD_EYE);
        buf.set(ex, ey + 1, BIRD_PUPIL);

        // Beak
        let beak_w = (2.0 * s).max(2.0) as i32;
        buf.fill_rect(cx + bw + 1, cy + tilt, beak_w, 1, BIRD_BEAK);

        // Tail
        buf.fill_rect(cx - bw - 1, cy - 1 - tilt, 1, 2, BIRD_WING);
    }

    /// Dim the scene and show a panel: caption, score, and a "play again"
    /// button.
    fn draw_game_over(&self, buf: &mut PixelBuf, score: u32) {
        for y in 0..buf.height() {
            for x in 0..buf.width() {
                let c = buf.get(x, y);
                buf.set(x as i32, y as i32, c.dim());
            }
        }

        let cx = buf.width() as i32 / 2;
        let cy = buf.height() as i32 / 2;
        let panel_w = 40;
        let panel_h = 26;
        let px = cx - panel_w / 2;
        let py = cy - panel_h / 2;
        buf.fill_rect(px - 1, py - 1, panel_w + 2, panel_h + 2, SHADOW);
        buf.fill_rect(px, py, panel_w, panel_h, PANEL);
        buf.fill_rect(px + 1, py + 1, panel_w - 2, panel_h - 2, PANEL_FACE);

        draw_text(buf, cx, py + 2, "GAME OVER", BIRD_Y);
        draw_number(buf, cx, py + 9, score, WHITE);

        // Play again: a white button with a right-pointing arrow.
        let bx = cx - 7;
        let by = py + 17;
        buf.fill_rect(bx, by, 14, 6, BUTTON);
        for i in 0..3 {
            buf.fill_rect(cx - 1 + i, by + 1 + i, 1, 4 - i * 2, BUTTON_TEXT);
        }
    }
}

/// Horizontal gradient across a pipe, as stops on a 0..=256 scale. The
/// highlight sits left of centre and both edges are dark.
const PIPE_STOPS: [(u16, Rgb); 5] = [
    (0, PIPE_L),
    (64, PIPE_M),
    (100, PIPE_HI),
    (160, PIPE_R),
    (256, PIPE_L),
];

fn pipe_shade(x: i32, total_w: i32) -> Rgb {
    if total_w <= 1 {
        return PIPE_M;
    }
    let t = (x.clamp(0, total_w - 1) * 256 / (total_w - 1)) as u16;
    for stop in PIPE_STOPS.windows(2) {
        let ((t0, from), (t1, to)) = (stop[0], stop[1]);
        if t <= t1 {
            return Rgb::lerp(from, to, (t - t0) * 256 / (t1 - t0));
        }
    }
    PIPE_L
}
