use crate::bottle::{Bottle, BottleConfig, BottleEvent};
use crate::color::Rgb;
use crate::config::Config;
use crate::input::{collect_input_nonblocking, map_event_to_action, Action};
use crate::render::{
    canvas_to_cells, draw_bottle, draw_center_box, draw_particles, draw_text, slot_meter, Cell,
    Terminal, View,
};
use crate::shader::SurfaceShader;
use crate::shelf::{BottleId, Shelf};
use crate::silhouette::Silhouette;
use crossterm::style::Color;
use log::{debug, info};
use rand::{rngs::StdRng, SeedableRng};
use std::time::{Duration, Instant};

const BOTTLE_W: f32 = 24.0;
const BOTTLE_H: f32 = 64.0;
const SPACING: f32 = 48.0;
const FLOOR_Y: f32 = 6.0;
const WORLD_H: f32 = BOTTLE_H * 1.7;
const TILT_STEP: f32 = 0.25;
const TILT_SECS: f32 = 0.15;
const SIM_STEP: Duration = Duration::from_micros(8_333);

const HELP: &str = "Fill a bottle slot by slot, then pour its top slot into\n\
the next bottle.\n\n\
F  fill the selected bottle with a random color\n\
P  pour into the next bottle\n\
D  pour onto the floor\n\
X  drain the top slot in place\n\
C  empty the selected bottle\n\
←→ tilt   Tab / 1-9 select   Space pause\n\n\
Mouse: left half fills, right half pours (split mode).\n\n\
Esc or H to close help.";

/// Builds the shelf described by `config`. Bottle 0 gets the prefill colors.
pub fn build_shelf(config: &Config) -> crate::error::Result<Shelf> {
    let mut shelf = Shelf::new();
    for i in 0..config.bottles {
        let mut bc = BottleConfig::new(config.slots, BOTTLE_W, BOTTLE_H);
        bc.filtering = config.filtering;
        bc.fill_duration = config.fill_duration;
        bc.pour_duration = config.pour_duration;
        bc.seed = config.seed;
        let bottle = if i == 0 {
            Bottle::prefilled(bc, &config.prefill)?
        } else {
            Bottle::new(bc)?
        };
        shelf.add(bottle);
    }
    shelf.layout(world_width(config.bottles), FLOOR_Y);
    Ok(shelf)
}

fn world_width(bottles: usize) -> f32 {
    bottles as f32 * SPACING
}

pub(crate) struct App {
    config: Config,
    shelf: Shelf,
    silhouette: Silhouette,
    shader: SurfaceShader,
    term: Terminal,
    rng: StdRng,
    selected: BottleId,
    paused: bool,
    help_open: bool,
    should_quit: bool,
    status: String,
}

impl App {
    fn init(config: Config) -> anyhow::Result<Self> {
        let shelf = build_shelf(&config)?;
        let rng = StdRng::seed_from_u64(config.seed);
        let term = Terminal::begin()?;
        info!(
            "shelf ready: {} bottles x {} slots, dispatch {:?}",
            config.bottles, config.slots, config.dispatch
        );

        Ok(Self {
            config,
            shelf,
            silhouette: Silhouette::flask(BOTTLE_W as u32 * 2, BOTTLE_H as u32 * 2),
            shader: SurfaceShader::default(),
            term,
            rng,
            selected: BottleId(0),
            paused: false,
            help_open: false,
            should_quit: false,
            status: String::new(),
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.config.fps as f32);

        let mut last_frame = Instant::now();
        let mut sim_accum = Duration::ZERO;

        while !self.should_quit {
            self.term.resize_if_needed()?;

            // input
            let cols = self.term.cols;
            for ev in collect_input_nonblocking(frame_dt)? {
                if let Some(action) =
                    map_event_to_action(self.config.dispatch, self.help_open, &ev, cols)
                {
                    self.apply(action)?;
                }
                if self.should_quit {
                    break;
                }
            }

            // sim fixed-step
            let now = Instant::now();
            let real_dt = now.saturating_duration_since(last_frame);
            last_frame = now;
            if self.paused {
                sim_accum = Duration::ZERO;
            } else {
                // cap catch-up after a stall
                sim_accum = sim_accum.saturating_add(real_dt).min(SIM_STEP * 30);
            }
            while sim_accum >= SIM_STEP {
                for (id, event) in self.shelf.update(SIM_STEP.as_secs_f32())? {
                    self.on_event(id, event);
                }
                sim_accum = sim_accum.saturating_sub(SIM_STEP);
            }

            // render
            self.render_frame()?;

            // frame cap
            spin_sleep(frame_dt, now);
        }
        Ok(())
    }

    fn apply(&mut self, action: Action) -> anyhow::Result<()> {
        let sel = self.selected;
        let n = self.shelf.len();
        match action {
            Action::Quit => self.should_quit = true,
            Action::HelpToggle => self.help_open = !self.help_open,
            Action::Back => self.help_open = false,
            Action::PauseToggle => {
                self.paused = !self.paused;
                debug!("paused={}", self.paused);
            }
            Action::Select(i) if i < n => self.selected = BottleId(i),
            Action::Select(_) => {}
            Action::SelectNext => self.selected = BottleId((sel.0 + 1) % n),
            Action::SelectPrev => self.selected = BottleId((sel.0 + n - 1) % n),
            Action::Fill => {
                let color = Rgb::random(&mut self.rng);
                if !self.shelf.fill(sel, color)? {
                    self.refuse(sel, "fill");
                }
            }
            Action::Pour => {
                let target = (n > 1).then(|| BottleId((sel.0 + 1) % n));
                if !self.shelf.pour(sel, target)? {
                    self.refuse(sel, "pour");
                }
            }
            Action::Drain => {
                if !self.shelf.pour(sel, None)? {
                    self.refuse(sel, "pour");
                }
            }
            Action::RemoveTop => {
                if !self.shelf.remove_top(sel)? {
                    self.refuse(sel, "drain");
                }
            }
            Action::Clear => {
                if !self.shelf.clear(sel)? {
                    self.refuse(sel, "clear");
                }
            }
            Action::Tilt(dir) => {
                let angle = self.shelf.get(sel)?.rotation() + dir as f32 * TILT_STEP;
                if !self.shelf.tilt(sel, angle, TILT_SECS)? {
                    self.refuse(sel, "tilt");
                }
            }
        }
        Ok(())
    }

    fn refuse(&mut self, id: BottleId, what: &str) {
        self.status = format!("bottle {id}: cannot {what} right now");
    }

    fn on_event(&mut self, id: BottleId, event: BottleEvent) {
        match event {
            BottleEvent::PourFinished { target, .. } => {
                self.status = match target {
                    Some(t) => format!("poured {id} into {t}"),
                    None => format!("poured out {id}"),
                };
            }
            BottleEvent::DrainFinished { .. } => self.status = format!("drained {id}"),
            BottleEvent::FillFinished | BottleEvent::TiltFinished => {}
        }
    }

    fn render_frame(&mut self) -> anyhow::Result<()> {
        let bg = Color::Black;
        self.term.cur.clear(bg);
        self.term.canvas.clear(crate::color::Rgba::TRANSPARENT);

        let view = View::fit(
            world_width(self.shelf.len()),
            WORLD_H,
            self.term.canvas.w,
            self.term.canvas.h,
        );
        let time = self.shelf.time();
        for bottle in self.shelf.iter() {
            draw_bottle(
                &mut self.term.canvas,
                &view,
                bottle,
                &self.silhouette,
                &self.shader,
                time,
            );
        }
        for bottle in self.shelf.iter() {
            draw_particles(&mut self.term.canvas, &view, bottle.particles());
        }
        canvas_to_cells(&self.term.canvas, &mut self.term.cur, bg);

        self.draw_labels(&view);
        self.draw_hud();
        if self.help_open {
            draw_center_box(&mut self.term.cur, "How to pour", HELP);
        }

        self.term.present(true)?;
        Ok(())
    }

    fn draw_labels(&mut self, view: &View) {
        let (_, floor_px) = view.to_canvas(crate::vec2::Vec2::new(0.0, FLOOR_Y));
        let row = ((floor_px / 4.0) as u16).min(self.term.rows.saturating_sub(2));
        for bottle in self.shelf.iter() {
            let (x, _) = view.to_canvas(bottle.base());
            let col = (x / 2.0) as u16;
            let id = bottle.id();
            let label = format!("{}", id.0 + 1);
            let selected = id == self.selected;
            let cell = Cell {
                ch: if selected { '▲' } else { ' ' },
                fg: Color::Yellow,
                bg: Color::Black,
                bold: true,
            };
            self.term.cur.set(col.saturating_sub(1), row, cell);
            let fg = if selected { Color::Yellow } else { Color::Grey };
            draw_text(&mut self.term.cur, col, row, &label, fg, Color::Black);
        }
    }

    fn draw_hud(&mut self) {
        let (fg, bg) = (Color::White, Color::Black);
        let Ok(b) = self.shelf.get(self.selected) else {
            return;
        };
        let mut title = format!(
            "bottlepour  |  bottle {}  {} {}/{}  |  {:?}",
            self.selected,
            slot_meter(b.current_slots(), b.max_slots()),
            b.current_slots(),
            b.max_slots(),
            self.config.dispatch
        );
        if self.paused {
            title.push_str("  |  PAUSED");
        }
        draw_text(&mut self.term.cur, 1, 0, &title, fg, bg);
        if !self.status.is_empty() {
            draw_text(&mut self.term.cur, 1, 1, &self.status, Color::Grey, bg);
        }
        let hint = "Keys: f fill | p pour | d pour out | x drain top | ←→ tilt | tab select | space pause | h help | q quit";
        let last = self.term.rows.saturating_sub(1);
        draw_text(&mut self.term.cur, 1, last, hint, fg, bg);
    }
}

pub fn run(config: Config) -> anyhow::Result<()> {
    let mut app = App::init(config)?;
    let result = app.run();
    app.term.end()?;
    info!("bye");
    result
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
