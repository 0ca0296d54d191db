//! 1×H lookup strip holding one horizontal color band per slot.
//!
//! Band 0 is the bottom of the bottle and sits at the bottom rows of the
//! texture (row 0 is the top row, as in an image).

use std::ops::Range;

use clap::ValueEnum;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::color::{Rgb, Rgba};
use crate::error::PaletteError;

/// Texels per slot used by [`default_height`].
pub const TEXELS_PER_SLOT: u32 = 32;
pub const MIN_HEIGHT: u32 = 256;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Filtering {
    /// Hard band edges.
    #[default]
    Nearest,
    /// Smooth transitions between neighbouring bands.
    Linear,
}

pub fn default_height(slots: usize) -> Result<u32, PaletteError> {
    u32::try_from(slots)
        .ok()
        .and_then(|s| s.checked_mul(TEXELS_PER_SLOT))
        .map(|h| h.max(MIN_HEIGHT))
        .ok_or(PaletteError::TooManySlots { slots })
}

#[derive(Clone, Debug, PartialEq)]
pub struct PaletteTexture {
    height: u32,
    slots: usize,
    filtering: Filtering,
    texels: Vec<Rgba>,
}

impl PaletteTexture {
    pub fn generate(
        slots: &[Option<Rgb>],
        height: u32,
        filtering: Filtering,
    ) -> Result<Self, PaletteError> {
        if slots.is_empty() {
            return Err(PaletteError::NoSlots);
        }
        if (height as usize) < slots.len() {
            return Err(PaletteError::TooShort {
                height,
                slots: slots.len(),
            });
        }

        let mut texels = vec![Rgba::TRANSPARENT; height as usize];
        for (i, slot) in slots.iter().enumerate() {
            let Some(color) = slot else { continue };
            let rows = band_rows(i, slots.len(), height);
            texels[rows.start as usize..rows.end as usize].fill(color.opaque());
        }
        trace!(
            "palette regenerated: {} slots, {} filled, h={}",
            slots.len(),
            slots.iter().filter(|s| s.is_some()).count(),
            height
        );

        Ok(Self {
            height,
            slots: slots.len(),
            filtering,
            texels,
        })
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn texel(&self, row: u32) -> Rgba {
        self.texels[row.min(self.height - 1) as usize]
    }

    /// Reads band `i` back from the texture at its center row.
    pub fn band_color(&self, i: usize) -> Rgba {
        if i >= self.slots {
            return Rgba::TRANSPARENT;
        }
        let rows = band_rows(i, self.slots, self.height);
        self.texel((rows.start + rows.end) / 2)
    }

    /// Samples at bottle height `v` (0 = bottom, 1 = top).
    pub fn sample(&self, v: f32) -> Rgba {
        let h = self.height as f32;
        let v = if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        match self.filtering {
            Filtering::Nearest => {
                let from_bottom = ((v * h) as u32).min(self.height - 1);
                self.texel(self.height - 1 - from_bottom)
            }
            Filtering::Linear => {
                let y = (v * h - 0.5).clamp(0.0, h - 1.0);
                let y0 = y.floor() as u32;
                let y1 = (y0 + 1).min(self.height - 1);
                let t = y - y0 as f32;
                let a = self.texel(self.height - 1 - y0);
                let b = self.texel(self.height - 1 - y1);
                blend_texels(a, b, t)
            }
        }
    }
}

/// Texture rows covered by band `i` of `slots`.
pub fn band_rows(i: usize, slots: usize, height: u32) -> Range<u32> {
    let h = height as usize;
    let start = h - ((i + 1) * h) / slots;
    let end = h - (i * h) / slots;
    start as u32..end as u32
}

// Alpha-weighted so a transparent neighbour fades rather than darkens.
fn blend_texels(a: Rgba, b: Rgba, t: f32) -> Rgba {
    let wa = a.a as f32 * (1.0 - t);
    let wb = b.a as f32 * t;
    let out_a = wa + wb;
    if out_a <= 1e-3 {
        return Rgba::TRANSPARENT;
    }
    let ch = |x: u8, y: u8| -> u8 {
        ((x as f32 * wa + y as f32 * wb) / out_a).round().clamp(0.0, 255.0) as u8
    };
    Rgba::new(
        ch(a.r, b.r),
        ch(a.g, b.g),
        ch(a.b, b.b),
        out_a.round().clamp(0.0, 255.0) as u8,
    )
}
