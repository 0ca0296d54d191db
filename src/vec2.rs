/// World-space point or direction. World y points up.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    pub fn add(self, o: Vec2) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }

    pub fn sub(self, o: Vec2) -> Self {
        Self::new(self.x - o.x, self.y - o.y)
    }

    pub fn scale(self, k: f32) -> Self {
        Self::new(self.x * k, self.y * k)
    }

    pub fn len(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Counter-clockwise rotation by `angle` radians.
    pub fn rotate(self, angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }

    pub fn from_angle(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self::new(c, s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32, tol: f32) {
        assert!((a - b).abs() <= tol, "expected {a} to be within {tol} of {b}");
    }

    #[test]
    fn rotate_quarter_turn_is_counter_clockwise() {
        let p = Vec2::new(0.0, 1.0).rotate(std::f32::consts::FRAC_PI_2);
        assert_close(p.x, -1.0, 1e-6);
        assert_close(p.y, 0.0, 1e-6);
    }

    #[test]
    fn rotate_preserves_length() {
        let p = Vec2::new(3.0, 4.0);
        assert_close(p.rotate(0.7).len(), 5.0, 1e-5);
    }
}
