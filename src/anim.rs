//! Frame-stepped scalar transitions.
//!
//! A [`Tween`] carries everything a transition needs across frames; the
//! owner calls [`Tween::step`] once per tick and reads [`Tween::value`].

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    Linear,
    #[default]
    EaseInOut,
}

impl Easing {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOut => t * t * (3.0 - 2.0 * t),
        }
    }
}

#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tween {
    start: f32,
    target: f32,
    duration: f32,
    delay: f32,
    elapsed: f32,
    easing: Easing,
}

impl Tween {
    /// A non-finite endpoint collapses onto the other one (or zero).
    pub fn new(start: f32, target: f32, duration: f32) -> Self {
        let (start, target) = match (start.is_finite(), target.is_finite()) {
            (true, true) => (start, target),
            (true, false) => (start, start),
            (false, true) => (target, target),
            (false, false) => (0.0, 0.0),
        };
        Self {
            start,
            target,
            duration: if duration.is_finite() { duration.max(0.0) } else { 0.0 },
            delay: 0.0,
            elapsed: 0.0,
            easing: Easing::EaseInOut,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn start(&self) -> f32 {
        self.start
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Normalized progress in `[0, 1]`, zero while the delay runs.
    pub fn progress(&self) -> f32 {
        if self.is_finished() {
            return 1.0;
        }
        let t = self.elapsed - self.delay;
        if t <= 0.0 {
            return 0.0;
        }
        (t / self.duration).min(1.0)
    }

    pub fn value(&self) -> f32 {
        lerp(self.start, self.target, self.easing.apply(self.progress()))
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }

    /// Advances by `dt` seconds and returns the new value.
    pub fn step(&mut self, dt: f32) -> f32 {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed = (self.elapsed + dt).min(self.delay + self.duration);
        }
        self.value()
    }

    /// Seconds of this tween still to run, delay included.
    pub fn remaining(&self) -> f32 {
        (self.delay + self.duration - self.elapsed).max(0.0)
    }
}
