use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use log::warn;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::color::Rgb;
use crate::input::Dispatch;
use crate::palette::Filtering;

pub const FPS_RANGE: (u32, u32) = (10, 240);
pub const MAX_BOTTLES: usize = 9;
pub const MAX_SLOTS: usize = 16;

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "bottlepour")]
#[command(about = "Terminal liquid bottles: fill them slot by slot and pour between them", long_about = None)]
pub struct Args {
    /// Frame rate cap
    #[arg(long)]
    pub fps: Option<u32>,

    /// Number of bottles on the shelf (1-9)
    #[arg(long)]
    pub bottles: Option<usize>,

    /// Slots per bottle (1-16)
    #[arg(long)]
    pub slots: Option<usize>,

    /// Seed for fill colors and pour particles
    #[arg(long)]
    pub seed: Option<u64>,

    /// Palette sampling between bands
    #[arg(long, value_enum)]
    pub filtering: Option<Filtering>,

    /// What a mouse press does
    #[arg(long, value_enum)]
    pub dispatch: Option<Dispatch>,

    /// Seconds for one slot to fill or drain
    #[arg(long)]
    pub fill_duration: Option<f32>,

    /// Seconds for a full pour, tilt to settle
    #[arg(long)]
    pub pour_duration: Option<f32>,

    /// Comma-separated colors for the first bottle, bottom first (names or #rrggbb)
    #[arg(long, value_delimiter = ',')]
    pub prefill: Vec<String>,

    /// Settings file; defaults to the per-user data directory
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log file; the terminal is taken over by the renderer
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub fps_cap: u32,
    pub bottles: usize,
    pub slots: usize,
    pub seed: u64,
    pub filtering: Filtering,
    pub dispatch: Dispatch,
    pub fill_duration: f32,
    pub pour_duration: f32,
    pub prefill: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fps_cap: 60,
            bottles: 4,
            slots: 8,
            seed: 0xB0771E,
            filtering: Filtering::Nearest,
            dispatch: Dispatch::SplitScreen,
            fill_duration: 0.5,
            pour_duration: 1.2,
            prefill: Vec::new(),
        }
    }
}

impl Settings {
    /// Command-line values win over file values.
    pub fn merge(mut self, args: &Args) -> Self {
        if let Some(v) = args.fps {
            self.fps_cap = v;
        }
        if let Some(v) = args.bottles {
            self.bottles = v;
        }
        if let Some(v) = args.slots {
            self.slots = v;
        }
        if let Some(v) = args.seed {
            self.seed = v;
        }
        if let Some(v) = args.filtering {
            self.filtering = v;
        }
        if let Some(v) = args.dispatch {
            self.dispatch = v;
        }
        if let Some(v) = args.fill_duration {
            self.fill_duration = v;
        }
        if let Some(v) = args.pour_duration {
            self.pour_duration = v;
        }
        if !args.prefill.is_empty() {
            self.prefill = args.prefill.clone();
        }
        self
    }
}

/// Validated runtime configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub fps: u32,
    pub bottles: usize,
    pub slots: usize,
    pub seed: u64,
    pub filtering: Filtering,
    pub dispatch: Dispatch,
    pub fill_duration: f32,
    pub pour_duration: f32,
    pub prefill: Vec<Rgb>,
}

impl From<Settings> for Config {
    fn from(s: Settings) -> Self {
        let mut prefill = Vec::new();
        for name in &s.prefill {
            match Rgb::parse(name.trim()) {
                Some(c) => prefill.push(c),
                None => warn!("ignoring unknown prefill color {name:?}"),
            }
        }
        let slots = s.slots.clamp(1, MAX_SLOTS);
        prefill.truncate(slots);

        Self {
            fps: s.fps_cap.clamp(FPS_RANGE.0, FPS_RANGE.1),
            bottles: s.bottles.clamp(1, MAX_BOTTLES),
            slots,
            seed: s.seed,
            filtering: s.filtering,
            dispatch: s.dispatch,
            fill_duration: duration_or(s.fill_duration, 0.5),
            pour_duration: duration_or(s.pour_duration, 1.2),
            prefill,
        }
    }
}

fn duration_or(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v.clamp(0.0, 30.0)
    } else {
        fallback
    }
}

pub struct Paths {
    pub settings_path: PathBuf,
    pub log_path: PathBuf,
}

pub fn project_paths() -> Result<Paths> {
    let proj = ProjectDirs::from("com", "bottlepour", "Bottlepour")
        .context("could not resolve project directories")?;
    let dir = proj.data_local_dir().to_path_buf();
    fs::create_dir_all(&dir)
        .with_context(|| format!("creating data directory {}", dir.display()))?;
    Ok(Paths {
        settings_path: dir.join("settings.json"),
        log_path: dir.join("bottlepour.log"),
    })
}

/// Missing or unreadable files fall back to defaults.
pub fn load_settings(path: &Path) -> Settings {
    let Ok(s) = fs::read_to_string(path) else {
        return Settings::default();
    };
    match serde_json::from_str::<Settings>(&s) {
        Ok(v) => v,
        Err(e) => {
            warn!("ignoring malformed settings {}: {e}", path.display());
            Settings::default()
        }
    }
}

pub fn save_settings_atomic(path: &Path, s: &Settings) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    let data = serde_json::to_vec_pretty(s)?;
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("bottlepour-{}-{name}", std::process::id()))
    }

    #[test]
    fn cli_overrides_file_values() {
        let file = Settings {
            bottles: 3,
            slots: 6,
            ..Settings::default()
        };
        let args = Args::try_parse_from([
            "bottlepour",
            "--slots",
            "5",
            "--filtering",
            "linear",
            "--dispatch",
            "fill",
            "--prefill",
            "red,#00ff00",
        ])
        .unwrap();
        let cfg = Config::from(file.merge(&args));
        assert_eq!(cfg.bottles, 3);
        assert_eq!(cfg.slots, 5);
        assert_eq!(cfg.filtering, Filtering::Linear);
        assert_eq!(cfg.dispatch, Dispatch::AlwaysFill);
        assert_eq!(cfg.prefill, vec![Rgb::new(255, 59, 48), Rgb::new(0, 255, 0)]);
    }

    #[test]
    fn values_are_clamped() {
        let s = Settings {
            fps_cap: 1000,
            bottles: 0,
            slots: 99,
            fill_duration: f32::NAN,
            ..Settings::default()
        };
        let cfg = Config::from(s);
        assert_eq!(cfg.fps, 240);
        assert_eq!(cfg.bottles, 1);
        assert_eq!(cfg.slots, MAX_SLOTS);
        assert_eq!(cfg.fill_duration, 0.5);
    }

    #[test]
    fn prefill_is_cut_to_capacity_and_skips_unknown_names() {
        let s = Settings {
            slots: 2,
            prefill: vec!["blue".into(), "mauve-ish".into(), "red".into(), "green".into()],
            ..Settings::default()
        };
        let cfg = Config::from(s);
        assert_eq!(cfg.prefill.len(), 2);
        assert_eq!(cfg.prefill[0], Rgb::new(0, 122, 255));
    }

    #[test]
    fn settings_file_round_trips_and_tolerates_garbage() {
        let path = temp_path("settings.json");
        let s = Settings {
            slots: 12,
            dispatch: Dispatch::AlwaysFill,
            ..Settings::default()
        };
        save_settings_atomic(&path, &s).unwrap();
        assert_eq!(load_settings(&path), s);

        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_settings(&path), Settings::default());

        fs::write(&path, r#"{"slots": 3}"#).unwrap();
        assert_eq!(load_settings(&path).slots, 3);
        assert_eq!(load_settings(&path).bottles, 4);
        let _ = fs::remove_file(&path);

        assert_eq!(load_settings(&temp_path("missing.json")), Settings::default());
    }
}
