//! Fill-state model for one bottle.
//!
//! Slots fill from the bottom. The logical state (`slot_colors`,
//! `current_slots`) and the rendered state (`ShaderUniforms`) are kept apart:
//! a fill writes the slot first and then animates the surface up to it, while
//! a drain or pour animates the surface down and only commits the removal once
//! the animation is over.

use log::{debug, info, trace};

use crate::anim::Tween;
use crate::color::Rgb;
use crate::error::{Error, PaletteError, Result};
use crate::palette::{self, Filtering, PaletteTexture};
use crate::particles::{pour_direction, EmitterConfig, ParticleEmitter, Particle};
use crate::pour::{PourTiming, PourTransaction};
use crate::shader::ShaderUniforms;
use crate::shelf::BottleId;
use crate::vec2::Vec2;

/// Largest tilt a bottle accepts.
pub const MAX_ROTATION: f32 = std::f32::consts::FRAC_PI_2;

// Non-finite angles fall back to upright.
fn clamp_rotation(angle: f32) -> f32 {
    if angle.is_finite() {
        angle.clamp(-MAX_ROTATION, MAX_ROTATION)
    } else {
        0.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BottleConfig {
    pub max_slots: usize,
    pub width: f32,
    pub height: f32,
    /// Palette strip height; `None` picks [`palette::default_height`].
    pub palette_height: Option<u32>,
    pub filtering: Filtering,
    pub fill_duration: f32,
    pub pour_duration: f32,
    pub pour_angle: f32,
    /// How far the bottle rises while tilted for a pour.
    pub pour_lift: f32,
    pub timing: PourTiming,
    /// Downward acceleration for pour particles, world units/s².
    pub gravity: f32,
    pub emitter: EmitterConfig,
    pub seed: u64,
}

impl BottleConfig {
    pub fn new(max_slots: usize, width: f32, height: f32) -> Self {
        Self {
            max_slots,
            width,
            height,
            palette_height: None,
            filtering: Filtering::Nearest,
            fill_duration: 0.5,
            pour_duration: 1.2,
            pour_angle: 1.1,
            pour_lift: height * 0.6,
            timing: PourTiming::default(),
            gravity: height * 2.5,
            emitter: EmitterConfig::for_height(height),
            seed: 0xB0_77_1E,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BottleEvent {
    FillFinished,
    DrainFinished { color: Rgb },
    PourFinished { color: Rgb, target: Option<BottleId> },
    TiltFinished,
}

enum Activity {
    Idle,
    Filling(Tween),
    Draining { tween: Tween, color: Rgb },
    Pouring(PourTransaction),
    Tilting(Tween),
}

pub struct Bottle {
    id: BottleId,
    config: BottleConfig,
    slot_colors: Vec<Option<Rgb>>,
    current_slots: usize,
    palette: PaletteTexture,
    uniforms: ShaderUniforms,
    base: Vec2,
    lift: f32,
    activity: Activity,
    emitters: Vec<ParticleEmitter>,
    pours_started: u64,
}

impl Bottle {
    pub fn new(config: BottleConfig) -> Result<Self> {
        if config.max_slots == 0 {
            return Err(Error::ZeroCapacity);
        }
        if !(config.width > 0.0 && config.height > 0.0) {
            return Err(Error::BadDimensions {
                width: config.width,
                height: config.height,
            });
        }
        let height = match config.palette_height {
            Some(h) => h,
            None => palette::default_height(config.max_slots)?,
        };
        if (height as usize) < config.max_slots {
            return Err(PaletteError::TooShort {
                height,
                slots: config.max_slots,
            }
            .into());
        }
        let slot_colors = vec![None; config.max_slots];
        let palette = PaletteTexture::generate(&slot_colors, height, config.filtering)?;
        let uniforms = ShaderUniforms {
            percent: 0.0,
            rotation: 0.0,
            slot_count: config.max_slots as f32,
        };
        Ok(Self {
            id: BottleId(0),
            config,
            slot_colors,
            current_slots: 0,
            palette,
            uniforms,
            base: Vec2::zero(),
            lift: 0.0,
            activity: Activity::Idle,
            emitters: Vec::new(),
            pours_started: 0,
        })
    }

    /// Starts with `colors` already settled, bottom first.
    pub fn prefilled(config: BottleConfig, colors: &[Rgb]) -> Result<Self> {
        let mut bottle = Self::new(config)?;
        for (slot, color) in bottle.slot_colors.iter_mut().zip(colors) {
            *slot = Some(*color);
        }
        bottle.current_slots = colors.len().min(bottle.config.max_slots);
        bottle.uniforms.percent = bottle.current_percent();
        bottle.regenerate_palette()?;
        Ok(bottle)
    }

    pub fn id(&self) -> BottleId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: BottleId) {
        self.id = id;
    }

    pub fn config(&self) -> &BottleConfig {
        &self.config
    }

    pub fn max_slots(&self) -> usize {
        self.config.max_slots
    }

    pub fn current_slots(&self) -> usize {
        self.current_slots
    }

    pub fn slot_colors(&self) -> &[Option<Rgb>] {
        &self.slot_colors
    }

    pub fn current_percent(&self) -> f32 {
        self.current_slots as f32 / self.config.max_slots as f32
    }

    pub fn is_full(&self) -> bool {
        self.current_slots == self.config.max_slots
    }

    pub fn is_empty(&self) -> bool {
        self.current_slots == 0
    }

    pub fn is_animating(&self) -> bool {
        !matches!(self.activity, Activity::Idle)
    }

    pub fn top_color(&self) -> Option<Rgb> {
        self.current_slots
            .checked_sub(1)
            .and_then(|i| self.slot_colors[i])
    }

    pub fn palette(&self) -> &PaletteTexture {
        &self.palette
    }

    pub fn uniforms(&self) -> &ShaderUniforms {
        &self.uniforms
    }

    pub fn width(&self) -> f32 {
        self.config.width
    }

    pub fn height(&self) -> f32 {
        self.config.height
    }

    pub fn rotation(&self) -> f32 {
        self.uniforms.rotation
    }

    /// Bottom-center point in world space.
    pub fn base(&self) -> Vec2 {
        self.base
    }

    pub fn set_base(&mut self, base: Vec2) {
        self.base = base;
    }

    pub fn center(&self) -> Vec2 {
        self.base.add(Vec2::new(0.0, self.config.height * 0.5 + self.lift()))
    }

    /// Current rise above the base, proportional to the pour tilt.
    pub fn lift(&self) -> f32 {
        self.lift
    }

    /// World position of the neck, following the current tilt.
    pub fn mouth(&self) -> Vec2 {
        let neck = Vec2::new(0.0, self.config.height * 0.5).rotate(self.uniforms.rotation);
        self.center().add(neck)
    }

    /// World height of the rendered liquid surface, ignoring tilt.
    pub fn surface_y(&self) -> f32 {
        self.base.y + self.uniforms.percent.clamp(0.0, 1.0) * self.config.height
    }

    /// Bottle this one is currently pouring into.
    pub fn pour_target(&self) -> Option<BottleId> {
        match &self.activity {
            Activity::Pouring(tx) => tx.target,
            _ => None,
        }
    }

    pub fn emitters(&self) -> &[ParticleEmitter] {
        &self.emitters
    }

    pub fn particles(&self) -> impl Iterator<Item = &Particle> {
        self.emitters.iter().flat_map(|e| e.particles().iter())
    }

    /// Adds one slot of `color` on top and animates the surface up to it.
    ///
    /// Returns `Ok(false)` without touching anything when the bottle is full or
    /// busy.
    pub fn add_full_slot(&mut self, color: Rgb) -> Result<bool> {
        let duration = self.config.fill_duration;
        self.receive(color, 0.0, duration)
    }

    /// Fill that waits `delay` seconds before the surface starts to rise.
    pub fn receive(&mut self, color: Rgb, delay: f32, duration: f32) -> Result<bool> {
        if self.is_full() {
            debug!("bottle {}: fill rejected, full", self.id);
            return Ok(false);
        }
        if self.is_animating() {
            debug!("bottle {}: fill rejected, busy", self.id);
            return Ok(false);
        }

        self.slot_colors[self.current_slots] = Some(color);
        self.current_slots += 1;
        self.regenerate_palette()?;

        let tween = Tween::new(self.uniforms.percent, self.current_percent(), duration)
            .with_delay(delay);
        self.activity = Activity::Filling(tween);
        debug!(
            "bottle {}: filling to {}/{}",
            self.id, self.current_slots, self.config.max_slots
        );
        Ok(true)
    }

    /// Animates the top slot away. The slot is cleared when the drain ends.
    pub fn remove_top_slot(&mut self) -> bool {
        let Some(color) = self.top_color() else {
            debug!("bottle {}: remove rejected, empty", self.id);
            return false;
        };
        if self.is_animating() {
            debug!("bottle {}: remove rejected, busy", self.id);
            return false;
        }
        let target = (self.current_slots - 1) as f32 / self.config.max_slots as f32;
        let tween = Tween::new(self.uniforms.percent, target, self.config.fill_duration);
        self.activity = Activity::Draining { tween, color };
        true
    }

    /// Starts the tilt, drain, settle sequence for the top slot.
    ///
    /// The caller is responsible for the receiving side; see
    /// [`crate::shelf::Shelf::pour`].
    pub fn start_pour(&mut self, target: Option<BottleId>, angle: f32) -> bool {
        let Some(color) = self.top_color() else {
            debug!("bottle {}: pour rejected, empty", self.id);
            return false;
        };
        if self.is_animating() {
            debug!("bottle {}: pour rejected, busy", self.id);
            return false;
        }

        let angle = clamp_rotation(angle);
        let target_percent = (self.current_slots - 1) as f32 / self.config.max_slots as f32;
        let tx = PourTransaction::new(
            self.id,
            target,
            color,
            self.uniforms.rotation,
            self.uniforms.percent,
            target_percent,
            angle,
            self.config.pour_duration,
            self.config.timing,
        );
        match target {
            Some(t) => info!("bottle {}: pouring into {}", self.id, t),
            None => info!("bottle {}: pouring out", self.id),
        }
        self.activity = Activity::Pouring(tx);
        true
    }

    /// Eases the bottle to `angle` and leaves it there.
    pub fn tilt_to(&mut self, angle: f32, duration: f32) -> bool {
        if self.is_animating() {
            debug!("bottle {}: tilt rejected, busy", self.id);
            return false;
        }
        let angle = clamp_rotation(angle);
        self.activity = Activity::Tilting(Tween::new(self.uniforms.rotation, angle, duration));
        true
    }

    /// Empties every slot at once.
    pub fn clear(&mut self) -> Result<bool> {
        if self.is_animating() {
            return Ok(false);
        }
        self.slot_colors.fill(None);
        self.current_slots = 0;
        self.uniforms.percent = 0.0;
        self.regenerate_palette()?;
        Ok(true)
    }

    /// Advances the active transition and the particle pool by `dt`.
    ///
    /// `target_surface` is the world height particles should vanish at; the
    /// bottle's own floor is used when it is `None`.
    pub fn update(&mut self, dt: f32, target_surface: Option<f32>) -> Result<Vec<BottleEvent>> {
        let mut events = Vec::new();

        let activity = std::mem::replace(&mut self.activity, Activity::Idle);
        self.activity = match activity {
            Activity::Idle => Activity::Idle,
            Activity::Filling(mut tween) => {
                self.uniforms.percent = tween.step(dt);
                if tween.is_finished() {
                    events.push(BottleEvent::FillFinished);
                    Activity::Idle
                } else {
                    Activity::Filling(tween)
                }
            }
            Activity::Draining { mut tween, color } => {
                self.uniforms.percent = tween.step(dt);
                if tween.is_finished() {
                    self.commit_removal()?;
                    events.push(BottleEvent::DrainFinished { color });
                    Activity::Idle
                } else {
                    Activity::Draining { tween, color }
                }
            }
            Activity::Tilting(mut tween) => {
                self.uniforms.rotation = tween.step(dt);
                if tween.is_finished() {
                    events.push(BottleEvent::TiltFinished);
                    Activity::Idle
                } else {
                    Activity::Tilting(tween)
                }
            }
            Activity::Pouring(mut tx) => {
                let tick = tx.advance(dt);
                self.uniforms.rotation = tick.rotation;
                self.uniforms.percent = tick.percent;
                self.lift = if tx.angle != 0.0 {
                    (tick.rotation / tx.angle).clamp(0.0, 1.0) * self.config.pour_lift
                } else {
                    0.0
                };
                let floor = target_surface.unwrap_or(self.base.y);

                if tick.drain_started {
                    self.start_emitter(tx.top_color, floor);
                }
                let mouth = self.mouth();
                if let Some(e) = self.emitters.iter_mut().rev().find(|e| e.is_emitting()) {
                    e.retarget(mouth, floor);
                    if tick.drain_stopped {
                        e.stop();
                    }
                }

                if tick.finished {
                    self.commit_removal()?;
                    info!("bottle {}: pour finished", self.id);
                    events.push(BottleEvent::PourFinished {
                        color: tx.top_color,
                        target: tx.target,
                    });
                    Activity::Idle
                } else {
                    Activity::Pouring(tx)
                }
            }
        };

        for e in &mut self.emitters {
            e.step(dt);
        }
        let before = self.emitters.len();
        self.emitters.retain(|e| !e.is_finished());
        if self.emitters.len() < before {
            trace!("bottle {}: emitter torn down", self.id);
        }

        Ok(events)
    }

    fn start_emitter(&mut self, color: Rgb, target_y: f32) {
        self.pours_started += 1;
        let seed = self.config.seed
            ^ (self.id.0 as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
            ^ self.pours_started;
        let emitter = ParticleEmitter::start(
            color,
            self.mouth(),
            pour_direction(self.uniforms.rotation),
            target_y,
            self.config.gravity,
            self.config.emitter,
            seed,
        );
        self.emitters.push(emitter);
    }

    fn commit_removal(&mut self) -> Result<()> {
        if self.current_slots == 0 {
            return Ok(());
        }
        self.current_slots -= 1;
        self.slot_colors[self.current_slots] = None;
        self.regenerate_palette()
    }

    fn regenerate_palette(&mut self) -> Result<()> {
        self.palette = PaletteTexture::generate(
            &self.slot_colors,
            self.palette.height(),
            self.config.filtering,
        )?;
        Ok(())
    }
}
