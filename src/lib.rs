//! Liquid bottles for the terminal.
//!
//! Each [`Bottle`] holds a stack of colored slots. Filling, draining and
//! pouring are animated: the rendered surface eases toward the logical fill,
//! pours tilt the bottle and shed particles that land on the receiving
//! bottle's surface. Rendering goes through [`shader::SurfaceShader`] and a
//! braille canvas.

pub mod anim;
pub mod app;
pub mod bottle;
pub mod color;
pub mod config;
pub mod error;
pub mod input;
pub mod palette;
pub mod particles;
pub mod pour;
pub mod render;
pub mod shader;
pub mod shelf;
pub mod silhouette;
pub mod vec2;

pub use bottle::{Bottle, BottleConfig, BottleEvent};
pub use color::{Rgb, Rgba};
pub use error::{Error, PaletteError, Result};
pub use palette::{Filtering, PaletteTexture};
pub use shelf::{BottleId, Shelf};
