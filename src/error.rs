use thiserror::Error;

use crate::shelf::BottleId;

/// Palette texture could not be built. Rendering cannot continue without one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaletteError {
    #[error("palette needs at least one slot")]
    NoSlots,

    #[error("palette height {height} cannot hold {slots} bands")]
    TooShort { height: u32, slots: usize },

    #[error("{slots} slots do not fit in a palette strip")]
    TooManySlots { slots: usize },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("bottle capacity must be at least one slot")]
    ZeroCapacity,

    #[error("bottle dimensions must be positive, got {width}x{height}")]
    BadDimensions { width: f32, height: f32 },

    #[error(transparent)]
    Palette(#[from] PaletteError),

    #[error("no bottle with id {0}")]
    UnknownBottle(BottleId),

    #[error("bottle {0} cannot pour into itself")]
    SelfPour(BottleId),
}

pub type Result<T> = std::result::Result<T, Error>;
