//! Per-pixel liquid surface function.
//!
//! Coordinates are bottle-local UV: `u` runs left to right, `v` bottom to top,
//! both in `[0, 1]` over the bottle's bounding rectangle. The bottle itself is
//! drawn rotated, so the shader tilts the surface the opposite way to keep it
//! level in the world.

use crate::color::Rgba;
use crate::palette::PaletteTexture;

/// Values fed to the shader each frame. One set per bottle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShaderUniforms {
    /// Rendered fill fraction; lags the logical fill while animating.
    pub percent: f32,
    /// Current tilt in radians, counter-clockwise positive.
    pub rotation: f32,
    pub slot_count: f32,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaderParams {
    pub time_scale: f32,
    /// Rotation clamp, just short of the tangent pole.
    pub max_tilt: f32,
    pub wave_amplitude: f32,
    pub wave_frequency: f32,
    pub surface_inset: f32,
    pub separator_width: f32,
    pub separator_shade: f32,
    pub highlight_band: f32,
    pub highlight_boost: f32,
    pub epsilon: f32,
}

impl Default for ShaderParams {
    fn default() -> Self {
        Self {
            time_scale: 2.5,
            max_tilt: 1.45,
            wave_amplitude: 0.008,
            wave_frequency: 7.0,
            surface_inset: 0.02,
            separator_width: 0.03,
            separator_shade: 0.8,
            highlight_band: 0.02,
            highlight_boost: 0.2,
            epsilon: 1e-4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SurfaceShader {
    pub params: ShaderParams,
}

impl SurfaceShader {
    pub fn new(params: ShaderParams) -> Self {
        Self { params }
    }

    /// Height of the liquid surface in column `u`, wave and tilt included.
    pub fn surface_limit(&self, u: f32, time: f32, uniforms: &ShaderUniforms) -> f32 {
        let p = &self.params;
        let percent = clamp01(uniforms.percent);
        let rotation = finite_or_zero(uniforms.rotation).clamp(-p.max_tilt, p.max_tilt);
        let tilt = (u - 0.5) * rotation.tan();
        let wave = (u * p.wave_frequency + finite_or_zero(time) * p.time_scale).sin()
            * p.wave_amplitude;
        percent - p.surface_inset + wave - tilt
    }

    /// Shades one pixel. `None` means discard (no liquid there).
    pub fn shade(
        &self,
        u: f32,
        v: f32,
        time: f32,
        uniforms: &ShaderUniforms,
        palette: &PaletteTexture,
    ) -> Option<Rgba> {
        let p = &self.params;
        let percent = clamp01(uniforms.percent);
        if percent <= 0.0 {
            return None;
        }

        let limit = self.surface_limit(u, time, uniforms);
        if !(v <= limit) {
            return None;
        }

        // Level: bands stay put on screen. Tilted: bands squeeze to the local
        // column so the liquid reads as pooling.
        let blend = finite_or_zero(uniforms.rotation).sin().abs();
        let proportional = v / limit.max(p.epsilon) * percent;
        let s = v + (proportional - v) * blend;

        let texel = palette.sample(s);
        if texel.is_transparent() {
            return None;
        }
        let mut rgb = [texel.r as f32, texel.g as f32, texel.b as f32];

        let boundary = (s * uniforms.slot_count.max(1.0)).fract();
        if boundary < p.separator_width || boundary > 1.0 - p.separator_width {
            for c in &mut rgb {
                *c *= p.separator_shade;
            }
        }

        if v > limit - p.highlight_band {
            for c in &mut rgb {
                *c += p.highlight_boost * 255.0;
            }
        }

        let to8 = |x: f32| x.round().clamp(0.0, 255.0) as u8;
        Some(Rgba::new(to8(rgb[0]), to8(rgb[1]), to8(rgb[2]), 255))
    }
}

fn clamp01(x: f32) -> f32 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn finite_or_zero(x: f32) -> f32 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::palette::Filtering;
    use std::f32::consts::FRAC_PI_2;

    const RED: Rgb = Rgb::new(255, 59, 48);
    const BLUE: Rgb = Rgb::new(0, 122, 255);

    fn palette(filled: &[Rgb], slots: usize) -> PaletteTexture {
        let mut colors = vec![None; slots];
        for (i, c) in filled.iter().enumerate() {
            colors[i] = Some(*c);
        }
        PaletteTexture::generate(&colors, 256, Filtering::Nearest).unwrap()
    }

    fn uniforms(percent: f32, rotation: f32) -> ShaderUniforms {
        ShaderUniforms {
            percent,
            rotation,
            slot_count: 8.0,
        }
    }

    #[test]
    fn empty_bottle_discards_everything() {
        let sh = SurfaceShader::default();
        let pal = palette(&[RED], 8);
        for i in 0..=10 {
            for j in 0..=10 {
                let (u, v) = (i as f32 / 10.0, j as f32 / 10.0);
                assert!(sh.shade(u, v, 0.3, &uniforms(0.0, 0.0), &pal).is_none());
            }
        }
    }

    #[test]
    fn level_liquid_shows_band_color_below_surface_only() {
        let sh = SurfaceShader::default();
        let pal = palette(&[RED], 8);
        let un = uniforms(0.125, 0.0);
        assert_eq!(sh.shade(0.5, 0.05, 0.0, &un, &pal), Some(RED.opaque()));
        assert_eq!(sh.shade(0.5, 0.2, 0.0, &un, &pal), None);
        assert_eq!(sh.shade(0.5, 0.9, 0.0, &un, &pal), None);
    }

    #[test]
    fn percent_is_clamped() {
        let sh = SurfaceShader::default();
        let pal = palette(&[RED; 8], 8);
        let over = sh.shade(0.3, 0.5, 1.0, &uniforms(3.0, 0.0), &pal);
        let full = sh.shade(0.3, 0.5, 1.0, &uniforms(1.0, 0.0), &pal);
        assert_eq!(over, full);
        assert!(sh.shade(0.3, 0.5, 1.0, &uniforms(-1.0, 0.0), &pal).is_none());
    }

    #[test]
    fn surface_band_is_highlighted() {
        let sh = SurfaceShader::default();
        let pal = palette(&[RED, RED, RED, RED], 8);
        let un = uniforms(0.5, 0.0);
        let limit = sh.surface_limit(0.5, 0.0, &un);
        let lit = sh.shade(0.5, limit - 0.005, 0.0, &un, &pal).unwrap();
        assert_eq!(lit.rgb(), Rgb::new(255, 110, 99));
    }

    #[test]
    fn slot_boundaries_are_darkened() {
        let sh = SurfaceShader::default();
        let pal = palette(&[RED, BLUE], 8);
        let un = uniforms(0.25, 0.0);
        let sep = sh.shade(0.5, 0.126, 0.0, &un, &pal).unwrap();
        assert_eq!(sep.rgb(), BLUE.scale(0.8));
        let body = sh.shade(0.5, 0.06, 0.0, &un, &pal).unwrap();
        assert_eq!(body.rgb(), RED);
    }

    #[test]
    fn tilt_raises_the_low_side_of_the_surface() {
        let sh = SurfaceShader::default();
        let un = uniforms(0.5, 0.4);
        let left = sh.surface_limit(0.1, 0.0, &un);
        let right = sh.surface_limit(0.9, 0.0, &un);
        assert!(left > right, "{left} <= {right}");
    }

    #[test]
    fn right_angle_tilt_stays_finite() {
        let sh = SurfaceShader::default();
        let pal = palette(&[RED, BLUE, RED], 8);
        let sep = sh.params.separator_shade;
        let dim = |x: u8| (x as f32 * sep).round() as u8;
        let shaded = Rgba::new(dim(RED.r), dim(RED.g), dim(RED.b), 255);
        for rot in [FRAC_PI_2, -FRAC_PI_2, 10.0, f32::INFINITY] {
            let un = uniforms(0.375, rot);
            let mut wet_columns = 0;
            for i in 0..=20 {
                let u = i as f32 / 20.0;
                let limit = sh.surface_limit(u, 0.7, &un);
                assert!(limit.is_finite(), "rot={rot} u={u}");
                let bottom = sh.shade(u, 0.02, 0.7, &un, &pal);
                if limit < 0.02 {
                    assert_eq!(bottom, None, "rot={rot} u={u}");
                } else if limit > 0.1 {
                    // Bottom band, possibly on a separator line.
                    let c = bottom.unwrap_or_else(|| panic!("dry at rot={rot} u={u}"));
                    assert!(c == RED.opaque() || c == shaded, "rot={rot} u={u} {c:?}");
                    wet_columns += 1;
                }
            }
            assert!(wet_columns > 0, "rot={rot}");
        }
    }

    #[test]
    fn tilted_columns_sample_proportionally() {
        let sh = SurfaceShader::default();
        let pal = palette(&[RED, BLUE], 8);
        // Tilted hard: at the high column the top of the liquid must still
        // read as the top slot color.
        let un = uniforms(0.25, 1.2);
        let u = 0.4;
        let limit = sh.surface_limit(u, 0.0, &un);
        assert!(limit > 0.25);
        let near_top = sh.shade(u, limit * 0.8, 0.0, &un, &pal).unwrap();
        assert_eq!(near_top.b, BLUE.b);
    }

    #[test]
    fn wave_moves_with_time() {
        let sh = SurfaceShader::default();
        let un = uniforms(0.5, 0.0);
        let a = sh.surface_limit(0.3, 0.0, &un);
        let b = sh.surface_limit(0.3, 0.5, &un);
        assert!((a - b).abs() > 1e-4);
        assert!((a - 0.48).abs() <= 0.0081);
    }
}
