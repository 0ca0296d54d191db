//! Pour stream particles.
//!
//! Particles are launched from the bottle mouth and fall ballistically. Each
//! one gets a lifetime predicted from the free-fall time down to the target
//! surface, so it fades out as it arrives instead of overshooting.

use std::f32::consts::PI;

use log::trace;
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::color::Rgb;
use crate::vec2::Vec2;

/// Lifetime floor for degenerate drops or gravity.
pub const MIN_LIFETIME: f32 = 0.05;
pub const DEFAULT_DAMPING: f32 = 0.95;

/// Free-fall time from `drop` height under `gravity`, times `damping`.
///
/// `damping` in `[0.9, 1.0]` trims the time to account for the launch
/// velocity. The result is never below [`MIN_LIFETIME`].
pub fn particle_lifetime(drop: f32, gravity: f32, damping: f32) -> f32 {
    let drop = drop.abs();
    if !drop.is_finite() || !gravity.is_finite() || gravity <= 1e-6 {
        return MIN_LIFETIME;
    }
    let damping = damping.clamp(0.9, 1.0);
    let t = (2.0 * drop / gravity).sqrt() * damping;
    t.max(MIN_LIFETIME)
}

/// Emission direction for a bottle tilted by `rotation`.
pub fn pour_direction(rotation: f32) -> f32 {
    if rotation > 0.0 {
        PI
    } else {
        0.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EmitterConfig {
    /// Particles per second while emitting.
    pub birth_rate: f32,
    pub speed: f32,
    pub speed_range: f32,
    pub angle_range: f32,
    pub scale: f32,
    pub scale_range: f32,
    pub damping: f32,
    /// Extra time kept after stop before the emitter is torn down.
    pub grace: f32,
    pub max_particles: usize,
}

impl EmitterConfig {
    /// Defaults sized for a bottle `height` world units tall.
    pub fn for_height(height: f32) -> Self {
        Self {
            birth_rate: 80.0,
            speed: height * 0.625,
            speed_range: height * 0.2,
            angle_range: 0.2,
            scale: 0.8,
            scale_range: 0.4,
            damping: DEFAULT_DAMPING,
            grace: 1.0,
            max_particles: 2000,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub age: f32,
    pub lifetime: f32,
    pub color: Rgb,
    pub base_scale: f32,
    /// Per-second change of alpha and relative scale; `-1 / lifetime`.
    pub decay: f32,
}

impl Particle {
    fn remaining01(&self) -> f32 {
        if self.is_expired() {
            return 0.0;
        }
        (1.0 + self.decay * self.age).clamp(0.0, 1.0)
    }

    pub fn alpha(&self) -> f32 {
        self.remaining01()
    }

    pub fn scale(&self) -> f32 {
        self.base_scale * self.remaining01()
    }

    pub fn is_expired(&self) -> bool {
        self.age >= self.lifetime
    }
}

pub struct ParticleEmitter {
    config: EmitterConfig,
    color: Rgb,
    launch: Vec2,
    direction: f32,
    target_y: f32,
    gravity: f32,
    rng: StdRng,
    particles: Vec<Particle>,
    birth_acc: f32,
    stopped_for: Option<f32>,
    longest_lifetime: f32,
}

impl ParticleEmitter {
    pub fn start(
        color: Rgb,
        launch: Vec2,
        direction: f32,
        target_y: f32,
        gravity: f32,
        config: EmitterConfig,
        seed: u64,
    ) -> Self {
        trace!(
            "emitter start at ({:.1},{:.1}) target_y={:.1} dir={:.2}",
            launch.x,
            launch.y,
            target_y,
            direction
        );
        Self {
            config,
            color,
            launch,
            direction,
            target_y,
            gravity,
            rng: StdRng::seed_from_u64(seed),
            particles: Vec::new(),
            birth_acc: 0.0,
            stopped_for: None,
            longest_lifetime: 0.0,
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_emitting(&self) -> bool {
        self.stopped_for.is_none()
    }

    /// Lifetime a particle launched right now would get.
    pub fn expected_lifetime(&self) -> f32 {
        particle_lifetime(
            self.launch.y - self.target_y,
            self.gravity,
            self.config.damping,
        )
    }

    /// Moves the launch point and the surface particles should vanish at.
    pub fn retarget(&mut self, launch: Vec2, target_y: f32) {
        self.launch = launch;
        self.target_y = target_y;
    }

    /// Stops births. Live particles run out their own lifetimes.
    pub fn stop(&mut self) {
        if self.stopped_for.is_none() {
            self.stopped_for = Some(0.0);
        }
    }

    pub fn is_finished(&self) -> bool {
        match self.stopped_for {
            None => false,
            Some(t) => {
                self.particles.is_empty() || t >= self.longest_lifetime + self.config.grace
            }
        }
    }

    pub fn step(&mut self, dt: f32) {
        if !(dt.is_finite() && dt > 0.0) {
            return;
        }

        match self.stopped_for.as_mut() {
            Some(t) => *t += dt,
            None => self.spawn(dt),
        }

        let g = self.gravity.max(0.0);
        let target_y = self.target_y;
        let falls_onto_target = target_y < self.launch.y;
        for p in &mut self.particles {
            p.vel.y -= g * dt;
            p.pos = p.pos.add(p.vel.scale(dt));
            p.age += dt;
            if falls_onto_target && p.vel.y < 0.0 && p.pos.y <= target_y {
                p.age = p.lifetime;
            }
        }
        self.particles.retain(|p| !p.is_expired());
    }

    fn spawn(&mut self, dt: f32) {
        let c = self.config;
        self.birth_acc += c.birth_rate.max(0.0) * dt;
        let births = self.birth_acc.floor();
        self.birth_acc -= births;

        let lifetime = self.expected_lifetime();
        self.longest_lifetime = self.longest_lifetime.max(lifetime);

        for _ in 0..births as usize {
            if self.particles.len() >= c.max_particles {
                break;
            }
            let angle = self.direction + self.rng.gen_range(-0.5..=0.5) * c.angle_range;
            let speed = c.speed + self.rng.gen_range(-0.5..=0.5) * c.speed_range;
            let scale = (c.scale + self.rng.gen_range(-0.5..=0.5) * c.scale_range).max(0.05);
            self.particles.push(Particle {
                pos: self.launch,
                vel: Vec2::from_angle(angle).scale(speed.max(0.0)),
                age: 0.0,
                lifetime,
                color: self.color,
                base_scale: scale,
                decay: -1.0 / lifetime,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!((a - b).abs() <= tol, "expected {a} to be within {tol} of {b}");
    }

    fn emitter(target_y: f32) -> ParticleEmitter {
        ParticleEmitter::start(
            Rgb::new(255, 0, 0),
            Vec2::new(0.0, 100.0),
            0.0,
            target_y,
            250.0,
            EmitterConfig::for_height(40.0),
            42,
        )
    }

    #[test]
    fn lifetime_matches_free_fall() {
        assert_close(particle_lifetime(80.0, 10.0, 1.0), 4.0, 1e-5);
        assert_close(particle_lifetime(-80.0, 10.0, 0.9), 3.6, 1e-5);
    }

    #[test]
    fn lifetime_grows_with_drop_and_shrinks_with_gravity() {
        let mut prev = 0.0;
        for i in 0..50 {
            let t = particle_lifetime(i as f32 * 3.0, 200.0, DEFAULT_DAMPING);
            assert!(t >= prev);
            prev = t;
        }
        let mut prev = f32::MAX;
        for i in 1..50 {
            let t = particle_lifetime(60.0, i as f32 * 25.0, DEFAULT_DAMPING);
            assert!(t <= prev);
            prev = t;
        }
    }

    #[test]
    fn degenerate_inputs_floor_the_lifetime() {
        assert_eq!(particle_lifetime(0.0, 100.0, 1.0), MIN_LIFETIME);
        assert_eq!(particle_lifetime(50.0, 0.0, 1.0), MIN_LIFETIME);
        assert_eq!(particle_lifetime(50.0, -9.8, 1.0), MIN_LIFETIME);
        assert_eq!(particle_lifetime(f32::NAN, 9.8, 1.0), MIN_LIFETIME);
    }

    #[test]
    fn decay_reaches_zero_at_arrival() {
        let mut e = emitter(0.0);
        e.step(0.05);
        let p = e.particles()[0];
        assert_close(p.decay, -1.0 / p.lifetime, 1e-6);
        let mut q = p;
        q.age = p.lifetime;
        assert_eq!(q.alpha(), 0.0);
        assert_eq!(q.scale(), 0.0);
        q.age = p.lifetime * 0.5;
        assert_close(q.alpha(), 0.5, 1e-5);
    }

    #[test]
    fn emits_at_birth_rate() {
        let mut e = emitter(-1000.0);
        for _ in 0..10 {
            e.step(0.05);
        }
        assert_eq!(e.particles().len(), 40);
    }

    #[test]
    fn stop_keeps_live_particles_until_they_expire() {
        let mut e = emitter(0.0);
        for _ in 0..5 {
            e.step(0.02);
        }
        let live = e.particles().len();
        assert!(live > 0);
        e.stop();
        assert!(!e.is_emitting());
        assert!(!e.is_finished());
        e.step(0.001);
        assert_eq!(e.particles().len(), live);
        for _ in 0..400 {
            e.step(0.02);
        }
        assert!(e.particles().is_empty());
        assert!(e.is_finished());
    }

    #[test]
    fn rising_target_retires_particles_early() {
        let mut low = emitter(0.0);
        let mut high = emitter(0.0);
        for _ in 0..20 {
            low.step(0.02);
            high.step(0.02);
        }
        high.retarget(Vec2::new(0.0, 100.0), 90.0);
        for _ in 0..10 {
            low.step(0.02);
            high.step(0.02);
        }
        assert!(high.particles().len() < low.particles().len());
        assert!(high.particles().iter().all(|p| p.pos.y > 90.0 || p.vel.y >= 0.0));
    }

    #[test]
    fn direction_follows_tilt_sign() {
        assert_eq!(pour_direction(0.8), PI);
        assert_eq!(pour_direction(-0.8), 0.0);
        assert_eq!(pour_direction(0.0), 0.0);
    }
}
