//! Bottle outline as an alpha mask over the bottle's UV rectangle.
//!
//! The mask only clips the liquid and draws the glass edge; it never affects
//! the fill logic.

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq)]
pub struct Silhouette {
    w: u32,
    h: u32,
    /// Row-major, row 0 at the top.
    alpha: Vec<u8>,
}

impl Silhouette {
    /// Wraps a caller-supplied alpha grid.
    pub fn from_alpha(w: u32, h: u32, alpha: Vec<u8>) -> Result<Self> {
        if w == 0 || h == 0 || alpha.len() != (w as usize) * (h as usize) {
            return Err(Error::BadDimensions {
                width: w as f32,
                height: h as f32,
            });
        }
        Ok(Self { w, h, alpha })
    }

    /// Round-shouldered flask: wide body, tapered shoulder, narrow neck.
    pub fn flask(w: u32, h: u32) -> Self {
        let w = w.max(1);
        let h = h.max(1);
        let mut alpha = vec![0u8; (w as usize) * (h as usize)];
        for row in 0..h {
            let v = 1.0 - (row as f32 + 0.5) / h as f32;
            let half = flask_half_width(v);
            for col in 0..w {
                let u = (col as f32 + 0.5) / w as f32;
                if (u - 0.5).abs() <= half {
                    alpha[(row * w + col) as usize] = 255;
                }
            }
        }
        Self { w, h, alpha }
    }

    pub fn width(&self) -> u32 {
        self.w
    }

    pub fn height(&self) -> u32 {
        self.h
    }

    /// Nearest sample at bottle UV (`v` up). Outside the rect is transparent.
    pub fn alpha_at(&self, u: f32, v: f32) -> u8 {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return 0;
        }
        let col = ((u * self.w as f32) as u32).min(self.w - 1);
        let row = (((1.0 - v) * self.h as f32) as u32).min(self.h - 1);
        self.alpha[(row * self.w + col) as usize]
    }

    pub fn contains(&self, u: f32, v: f32) -> bool {
        self.alpha_at(u, v) >= 128
    }

    /// Inside, with at least one neighbour `(du, dv)` away outside.
    pub fn is_edge(&self, u: f32, v: f32, du: f32, dv: f32) -> bool {
        self.contains(u, v)
            && !(self.contains(u - du, v)
                && self.contains(u + du, v)
                && self.contains(u, v - dv)
                && self.contains(u, v + dv))
    }
}

fn flask_half_width(v: f32) -> f32 {
    const BODY: f32 = 0.46;
    const NECK: f32 = 0.16;
    const SHOULDER_LO: f32 = 0.68;
    const SHOULDER_HI: f32 = 0.82;
    const CORNER: f32 = 0.1;

    if v < CORNER {
        // quarter-circle bottom corners
        let dy = (CORNER - v) / CORNER;
        BODY - CORNER * (1.0 - (1.0 - dy * dy).max(0.0).sqrt())
    } else if v <= SHOULDER_LO {
        BODY
    } else if v <= SHOULDER_HI {
        let t = (v - SHOULDER_LO) / (SHOULDER_HI - SHOULDER_LO);
        let t = t * t * (3.0 - 2.0 * t);
        BODY + (NECK - BODY) * t
    } else {
        NECK
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flask_is_wide_at_the_body_and_narrow_at_the_neck() {
        let s = Silhouette::flask(40, 80);
        assert!(s.contains(0.1, 0.4));
        assert!(s.contains(0.9, 0.4));
        assert!(!s.contains(0.1, 0.95));
        assert!(s.contains(0.5, 0.95));
        assert!(s.contains(0.5, 0.02));
    }

    #[test]
    fn outside_the_rect_is_transparent() {
        let s = Silhouette::flask(10, 10);
        assert_eq!(s.alpha_at(-0.1, 0.5), 0);
        assert_eq!(s.alpha_at(0.5, 1.1), 0);
        assert_eq!(s.alpha_at(f32::NAN, 0.5), 0);
    }

    #[test]
    fn edges_are_found_on_the_outline_only() {
        let s = Silhouette::flask(40, 80);
        let (du, dv) = (1.0 / 40.0, 1.0 / 80.0);
        assert!(s.is_edge(0.5, 0.995, du, dv));
        assert!(!s.is_edge(0.5, 0.4, du, dv));
        assert!(!s.is_edge(0.02, 0.95, du, dv));
    }

    #[test]
    fn custom_grid_must_match_its_size() {
        assert!(Silhouette::from_alpha(2, 2, vec![255; 3]).is_err());
        let s = Silhouette::from_alpha(2, 1, vec![0, 255]).unwrap();
        assert!(!s.contains(0.25, 0.5));
        assert!(s.contains(0.75, 0.5));
    }
}
