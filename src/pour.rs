//! Phase sequencing for one pour: tilt, drain, tilt back, commit.

use crate::anim::Tween;
use crate::color::Rgb;
use crate::shelf::BottleId;

/// Phase lengths as fractions of the pour duration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PourTiming {
    pub tilt: f32,
    pub drain: f32,
    pub settle: f32,
}

impl Default for PourTiming {
    fn default() -> Self {
        Self {
            tilt: 0.3,
            drain: 0.5,
            settle: 0.25,
        }
    }
}

impl PourTiming {
    pub fn tilt_secs(&self, duration: f32) -> f32 {
        duration * self.tilt
    }

    pub fn drain_secs(&self, duration: f32) -> f32 {
        duration * self.drain
    }

    pub fn settle_secs(&self, duration: f32) -> f32 {
        duration * self.settle
    }

    pub fn total_secs(&self, duration: f32) -> f32 {
        self.tilt_secs(duration) + self.drain_secs(duration) + self.settle_secs(duration)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PourPhase {
    Tilt,
    Drain,
    Settle,
    Done,
}

/// What a pour step produced. Flags mark phase edges crossed during the step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PourTick {
    pub rotation: f32,
    pub percent: f32,
    pub drain_started: bool,
    pub drain_stopped: bool,
    pub finished: bool,
}

#[derive(Clone, Debug)]
pub struct PourTransaction {
    pub source: BottleId,
    pub target: Option<BottleId>,
    pub top_color: Rgb,
    pub start_percent: f32,
    pub target_percent: f32,
    pub angle: f32,
    pub duration: f32,
    timing: PourTiming,
    phase: PourPhase,
    tween: Tween,
    rotation: f32,
    percent: f32,
}

impl PourTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: BottleId,
        target: Option<BottleId>,
        top_color: Rgb,
        start_rotation: f32,
        start_percent: f32,
        target_percent: f32,
        angle: f32,
        duration: f32,
        timing: PourTiming,
    ) -> Self {
        Self {
            source,
            target,
            top_color,
            start_percent,
            target_percent,
            angle,
            duration,
            timing,
            phase: PourPhase::Tilt,
            tween: Tween::new(start_rotation, angle, timing.tilt_secs(duration)),
            rotation: start_rotation,
            percent: start_percent,
        }
    }

    pub fn phase(&self) -> PourPhase {
        self.phase
    }

    pub fn advance(&mut self, dt: f32) -> PourTick {
        let mut tick = PourTick::default();
        let mut dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        loop {
            if self.phase == PourPhase::Done {
                break;
            }
            let remaining = self.tween.remaining();
            let value = self.tween.step(dt);
            match self.phase {
                PourPhase::Drain => self.percent = value,
                _ => self.rotation = value,
            }
            if !self.tween.is_finished() {
                break;
            }
            dt = (dt - remaining).max(0.0);

            match self.phase {
                PourPhase::Tilt => {
                    self.phase = PourPhase::Drain;
                    self.tween = Tween::new(
                        self.start_percent,
                        self.target_percent,
                        self.timing.drain_secs(self.duration),
                    );
                    tick.drain_started = true;
                }
                PourPhase::Drain => {
                    self.phase = PourPhase::Settle;
                    self.tween =
                        Tween::new(self.angle, 0.0, self.timing.settle_secs(self.duration));
                    tick.drain_stopped = true;
                }
                PourPhase::Settle => {
                    self.phase = PourPhase::Done;
                    tick.finished = true;
                }
                PourPhase::Done => {}
            }
        }

        tick.rotation = self.rotation;
        tick.percent = self.percent;
        tick
    }
}
