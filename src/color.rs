use crossterm::style::Color;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn scale(self, k: f32) -> Rgb {
        let k = k.max(0.0);
        let s = |v: u8| -> u8 { ((v as f32) * k).round().clamp(0.0, 255.0) as u8 };
        Rgb::new(s(self.r), s(self.g), s(self.b))
    }

    pub fn to_color(self) -> Color {
        Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }

    pub fn opaque(self) -> Rgba {
        Rgba::new(self.r, self.g, self.b, 255)
    }

    /// Vivid random color: any hue, saturation 0.7..1, brightness 0.8..1.
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Rgb {
        let h = rng.gen_range(0.0..1.0);
        let s = rng.gen_range(0.7..=1.0);
        let v = rng.gen_range(0.8..=1.0);
        hsv(h, s, v)
    }

    /// Accepts a slot color name or `#rrggbb`.
    pub fn parse(s: &str) -> Option<Rgb> {
        let s = s.trim();
        if let Some(hex) = s.strip_prefix('#') {
            if hex.len() != 6 {
                return None;
            }
            let v = u32::from_str_radix(hex, 16).ok()?;
            return Some(Rgb::new((v >> 16) as u8, (v >> 8) as u8, v as u8));
        }
        SLOT_COLORS
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(s))
            .map(|(_, c)| *c)
    }
}

/// The eight slot colors, bottom to top.
pub const SLOT_COLORS: [(&str, Rgb); 8] = [
    ("red", Rgb::new(255, 59, 48)),
    ("orange", Rgb::new(255, 149, 0)),
    ("yellow", Rgb::new(255, 204, 0)),
    ("green", Rgb::new(52, 199, 89)),
    ("teal", Rgb::new(48, 176, 199)),
    ("blue", Rgb::new(0, 122, 255)),
    ("purple", Rgb::new(175, 82, 222)),
    ("brown", Rgb::new(162, 132, 94)),
];

pub fn hsv(h: f32, s: f32, v: f32) -> Rgb {
    let h = h.rem_euclid(1.0) * 6.0;
    let s = s.clamp(0.0, 1.0);
    let v = v.clamp(0.0, 1.0);
    let i = h.floor();
    let f = h - i;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    let (r, g, b) = match i as u32 % 6 {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };
    let to8 = |x: f32| (x * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(to8(r), to8(g), to8(b))
}

/// Straight (non-premultiplied) RGBA texel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    pub fn is_transparent(self) -> bool {
        self.a == 0
    }

    pub fn with_alpha(self, a: u8) -> Rgba {
        Rgba { a, ..self }
    }
}
