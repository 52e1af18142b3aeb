//! Configuration types for the simulation.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Board dimensions and draw scale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Width of the board in cells
    pub width: i32,
    /// Height of the board in cells
    pub height: i32,
    /// Pixels per cell handed to the rendering collaborator
    pub scale: i32,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            width: 30,
            height: 70,
            scale: 5,
        }
    }
}

/// How the soil spreads moisture between cells each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DiffusionMode {
    /// In-place pass over every cell, column by column
    Sequential,
    /// Double-buffered pass split into column bands processed in parallel
    Banded { bands: usize },
}

impl Default for DiffusionMode {
    fn default() -> Self {
        DiffusionMode::Sequential
    }
}

/// Soil block placement and moisture behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoilConfig {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Inverse chance of absorbing a drop / pushing moisture to a neighbour
    pub absorb_rate: i64,
    /// Inverse chance of a surface cell drying out by one step
    pub evaporate_rate: i64,
    pub diffusion: DiffusionMode,
}

impl Default for SoilConfig {
    fn default() -> Self {
        Self {
            x: 0,
            y: 40,
            width: 30,
            height: 30,
            absorb_rate: 3,
            evaporate_rate: 200,
            diffusion: DiffusionMode::Sequential,
        }
    }
}

/// Root network parameters. The roots share the soil footprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootsConfig {
    /// Anchor column, local to the soil footprint
    pub anchor_x: i32,
    /// Anchor row, local to the soil footprint
    pub anchor_y: i32,
    /// Inverse chance per tick that a root cell sprouts
    pub grow_rate: i64,
    /// Ticks between soil absorption passes
    pub absorb_interval: u64,
}

impl Default for RootsConfig {
    fn default() -> Self {
        Self {
            anchor_x: 15,
            anchor_y: 0,
            grow_rate: 1500,
            absorb_interval: 500,
        }
    }
}

/// Plant placement and growth economy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlantConfig {
    pub x: i32,
    pub y: i32,
    /// Ticks between water pulls from the roots
    pub speed: u64,
    pub water_cost_per_cell: u32,
}

impl Default for PlantConfig {
    fn default() -> Self {
        Self {
            x: 15,
            y: 39,
            speed: 2,
            water_cost_per_cell: 20,
        }
    }
}

/// A cloud placed at scenario setup, outside weather control
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CloudConfig {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// Ticks between drops while raining
    pub rate: u64,
    pub raining: bool,
}

/// Cloud spawning and rain toggling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Base inverse chance of spawning a cloud per tick
    pub cloud_spawn: i64,
    /// Base inverse chance of rain starting, divided by the cloud count
    pub rain_start: i64,
    /// Inverse chance of rain stopping per tick
    pub rain_stop: i64,
    /// Ticks between drops for weather-driven clouds
    pub rain_interval: u64,
    /// Cloud count at which the sky stops getting darker
    pub max_cloud_darkness: usize,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            cloud_spawn: 2000,
            rain_start: 20000,
            rain_stop: 3000,
            rain_interval: 2,
            max_cloud_darkness: 5,
        }
    }
}

/// Complete scenario setup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Random seed for reproducibility
    pub seed: u64,
    /// Ticks between metrics snapshots in the log (0 disables them)
    pub metrics_interval: u64,
    pub board: BoardConfig,
    pub soil: SoilConfig,
    pub roots: RootsConfig,
    pub plant: PlantConfig,
    #[serde(default)]
    pub clouds: Vec<CloudConfig>,
    #[serde(default)]
    pub weather: Option<WeatherConfig>,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            metrics_interval: 1000,
            board: BoardConfig::default(),
            soil: SoilConfig::default(),
            roots: RootsConfig::default(),
            plant: PlantConfig::default(),
            clouds: Vec::new(),
            weather: Some(WeatherConfig::default()),
        }
    }
}

impl ScenarioConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: ScenarioConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject scenarios that would break board or root invariants at runtime
    pub fn validate(&self) -> Result<()> {
        let board = &self.board;
        if board.width <= 0 || board.height <= 0 {
            return Err(Error::Validation(format!(
                "board must have positive dimensions, got {}x{}",
                board.width, board.height
            )));
        }
        if board.scale <= 0 {
            return Err(Error::Validation("board scale must be positive".to_string()));
        }

        let soil = &self.soil;
        if soil.width <= 0 || soil.height <= 0 {
            return Err(Error::Validation("soil must have positive dimensions".to_string()));
        }
        check_rect("soil", soil.x, soil.y, soil.width, soil.height, board)?;
        if soil.absorb_rate < 1 || soil.evaporate_rate < 1 {
            return Err(Error::Validation("soil rates must be at least 1".to_string()));
        }
        if let DiffusionMode::Banded { bands } = soil.diffusion {
            if bands == 0 {
                return Err(Error::Validation("banded diffusion needs at least one band".to_string()));
            }
        }

        let roots = &self.roots;
        if roots.anchor_x < 0
            || roots.anchor_y < 0
            || roots.anchor_x >= soil.width
            || roots.anchor_y >= soil.height
        {
            return Err(Error::Validation(format!(
                "roots anchor ({}, {}) is not inside the soil",
                roots.anchor_x, roots.anchor_y
            )));
        }
        if roots.absorb_interval == 0 {
            return Err(Error::Validation("roots absorb interval must be positive".to_string()));
        }

        let plant = &self.plant;
        check_rect("plant", plant.x, plant.y, 1, 1, board)?;
        if plant.speed == 0 {
            return Err(Error::Validation("plant speed must be positive".to_string()));
        }

        for (idx, cloud) in self.clouds.iter().enumerate() {
            if cloud.width < 3 || cloud.height < 1 {
                return Err(Error::Validation(format!(
                    "cloud {} must be at least 3 cells wide and 1 tall",
                    idx
                )));
            }
            check_rect(&format!("cloud {}", idx), cloud.x, cloud.y, cloud.width, cloud.height, board)?;
            let overlaps_soil = cloud.x < soil.x + soil.width
                && soil.x < cloud.x + cloud.width
                && cloud.y < soil.y + soil.height
                && soil.y < cloud.y + cloud.height;
            if overlaps_soil {
                return Err(Error::Validation(format!("cloud {} overlaps the soil", idx)));
            }
            if cloud.rate == 0 {
                return Err(Error::Validation(format!("cloud {} rate must be positive", idx)));
            }
        }

        if let Some(weather) = &self.weather {
            if weather.rain_interval == 0 {
                return Err(Error::Validation("weather rain interval must be positive".to_string()));
            }
        }

        Ok(())
    }
}

fn check_rect(what: &str, x: i32, y: i32, width: i32, height: i32, board: &BoardConfig) -> Result<()> {
    if x < 0 || y < 0 || x + width > board.width || y + height > board.height {
        return Err(Error::Validation(format!(
            "{} at ({}, {}) size {}x{} does not fit on a {}x{} board",
            what, x, y, width, height, board.width, board.height
        )));
    }
    Ok(())
}
