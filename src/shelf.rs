//! A row of bottles and the pours between them.

use std::fmt;

use log::{debug, warn};

use crate::bottle::{Bottle, BottleEvent};
use crate::color::Rgb;
use crate::error::{Error, Result};
use crate::vec2::Vec2;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BottleId(pub usize);

impl fmt::Display for BottleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Default)]
pub struct Shelf {
    bottles: Vec<Bottle>,
    time: f32,
}

impl Shelf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, mut bottle: Bottle) -> BottleId {
        let id = BottleId(self.bottles.len());
        bottle.set_id(id);
        self.bottles.push(bottle);
        id
    }

    pub fn len(&self) -> usize {
        self.bottles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bottles.is_empty()
    }

    pub fn get(&self, id: BottleId) -> Result<&Bottle> {
        self.bottles.get(id.0).ok_or(Error::UnknownBottle(id))
    }

    pub fn get_mut(&mut self, id: BottleId) -> Result<&mut Bottle> {
        self.bottles.get_mut(id.0).ok_or(Error::UnknownBottle(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bottle> {
        self.bottles.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = BottleId> {
        (0..self.bottles.len()).map(BottleId)
    }

    /// Shader clock in seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_animating(&self) -> bool {
        self.bottles.iter().any(Bottle::is_animating)
    }

    pub fn fill(&mut self, id: BottleId, color: Rgb) -> Result<bool> {
        self.get_mut(id)?.add_full_slot(color)
    }

    pub fn remove_top(&mut self, id: BottleId) -> Result<bool> {
        Ok(self.get_mut(id)?.remove_top_slot())
    }

    pub fn tilt(&mut self, id: BottleId, angle: f32, duration: f32) -> Result<bool> {
        Ok(self.get_mut(id)?.tilt_to(angle, duration))
    }

    pub fn clear(&mut self, id: BottleId) -> Result<bool> {
        self.get_mut(id)?.clear()
    }

    /// Pours the top slot of `source` into `target`, or onto the floor.
    ///
    /// The source tilts toward the target. The target starts rising once the
    /// source has finished tilting and rises for as long as the source drains.
    /// Returns `Ok(false)` when either side cannot take part right now.
    pub fn pour(&mut self, source: BottleId, target: Option<BottleId>) -> Result<bool> {
        let src = self.get(source)?;
        let Some(color) = src.top_color() else {
            debug!("pour {source}: nothing to pour");
            return Ok(false);
        };
        if src.is_animating() {
            debug!("pour {source}: source busy");
            return Ok(false);
        }

        let mut angle = src.config().pour_angle.abs();
        let (tilt_secs, drain_secs) = {
            let cfg = src.config();
            (
                cfg.timing.tilt_secs(cfg.pour_duration),
                cfg.timing.drain_secs(cfg.pour_duration),
            )
        };
        let src_x = src.base().x;

        if let Some(t) = target {
            if t == source {
                return Err(Error::SelfPour(source));
            }
            let dst = self.get(t)?;
            if dst.is_full() || dst.is_animating() {
                debug!("pour {source} -> {t}: target cannot receive");
                return Ok(false);
            }
            // Clockwise tilt spills to the right.
            if dst.base().x > src_x {
                angle = -angle;
            }
        }

        if !self.get_mut(source)?.start_pour(target, angle) {
            return Ok(false);
        }
        if let Some(t) = target {
            if !self.get_mut(t)?.receive(color, tilt_secs, drain_secs)? {
                warn!("pour {source} -> {t}: target refused after checks");
            }
        }
        Ok(true)
    }

    /// Steps every bottle by `dt` seconds and collects what finished.
    pub fn update(&mut self, dt: f32) -> Result<Vec<(BottleId, BottleEvent)>> {
        if dt.is_finite() && dt > 0.0 {
            self.time += dt;
        }

        // Surfaces are read before anyone moves so pours see a consistent frame.
        let surfaces: Vec<Option<f32>> = self
            .bottles
            .iter()
            .map(|b| {
                b.pour_target()
                    .and_then(|t| self.bottles.get(t.0))
                    .map(Bottle::surface_y)
            })
            .collect();

        let mut events = Vec::new();
        for (bottle, surface) in self.bottles.iter_mut().zip(surfaces) {
            let id = bottle.id();
            for e in bottle.update(dt, surface)? {
                events.push((id, e));
            }
        }
        Ok(events)
    }

    /// Spreads the bottles evenly across `width`, standing on `floor_y`.
    pub fn layout(&mut self, width: f32, floor_y: f32) {
        let n = self.bottles.len();
        if n == 0 {
            return;
        }
        let step = width / n as f32;
        for (i, b) in self.bottles.iter_mut().enumerate() {
            b.set_base(Vec2::new(step * (i as f32 + 0.5), floor_y));
        }
    }
}
