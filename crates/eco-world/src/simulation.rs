//! Simulation driver: builds a scenario and runs the tick loop.

use crate::board::Board;
use crate::cloud::Cloud;
use crate::entity::{Entity, TickContext, Tickable};
use crate::plant::Plant;
use crate::render::{DrawCommand, Drawable};
use crate::roots::Roots;
use crate::soil::Soil;
use crate::weather::Weather;
use eco_core::{EntityId, Position, Result, ScenarioConfig};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub struct Simulation {
    board: Board,
    config: ScenarioConfig,
    rng: ChaCha8Rng,
    tick: u64,
    soil: EntityId,
    roots: EntityId,
    plant: EntityId,
    weather: Option<EntityId>,
}

impl Simulation {
    pub fn new(config: ScenarioConfig) -> Result<Self> {
        config.validate()?;

        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        let mut board = Board::new(config.board.width, config.board.height);

        for cloud in &config.clouds {
            board.add_entity(Entity::Cloud(Cloud::from_config(cloud)))?;
        }

        let soil_config = &config.soil;
        let soil = board.add_entity(Entity::Soil(Soil::from_config(soil_config)))?;

        // the roots share the soil footprint
        let roots = board.add_entity(Entity::Roots(Roots::new(
            Position::new(soil_config.x, soil_config.y),
            soil_config.width,
            soil_config.height,
            Position::new(config.roots.anchor_x, config.roots.anchor_y),
            config.roots.grow_rate,
            config.roots.absorb_interval,
        )))?;

        let plant = board.add_entity(Entity::Plant(Plant::from_config(&config.plant, roots)))?;

        let weather = match &config.weather {
            Some(weather) => Some(board.add_entity(Entity::Weather(Weather::new(weather.clone())))?),
            None => None,
        };

        info!(
            event = "scenario_built",
            seed = config.seed,
            width = config.board.width,
            height = config.board.height,
            entities = board.len(),
            "Scenario built"
        );

        Ok(Self {
            board,
            config,
            rng,
            tick: 0,
            soil,
            roots,
            plant,
            weather,
        })
    }

    /// Run the simulation for the specified number of ticks
    #[instrument(skip(self), fields(seed = self.config.seed))]
    pub fn run(&mut self, ticks: u64) -> Result<SimulationSummary> {
        info!(
            event = "simulation_started",
            start_tick = self.tick,
            "Starting simulation for {} ticks",
            ticks
        );

        for _ in 0..ticks {
            self.step()?;
        }

        let summary = self.summary();
        info!(
            event = "simulation_finished",
            ticks = summary.ticks,
            root_cells = summary.root_cells,
            plant_cells = summary.plant_cells,
            water_mass = summary.water_mass,
            "Simulation finished"
        );
        Ok(summary)
    }

    /// Advance every live entity by one tick, in registration order.
    ///
    /// Entities registered during the tick wait for the next one; entities
    /// removed during the tick are skipped. An invariant violation stops the
    /// tick and is returned.
    pub fn step(&mut self) -> Result<()> {
        for id in self.board.entities() {
            let Some(mut entity) = self.board.check_out(id) else {
                continue;
            };
            let mut ctx = TickContext {
                id,
                tick: self.tick,
                board: &mut self.board,
                rng: &mut self.rng,
            };
            let outcome = entity.update(&mut ctx);
            self.board.check_in(id, entity);
            outcome?;
        }

        self.tick += 1;
        let interval = self.config.metrics_interval;
        if interval > 0 && self.tick % interval == 0 {
            self.log_metrics();
        }
        Ok(())
    }

    /// Draw intents for the current state, back to front, at the board's scale
    pub fn frame(&mut self) -> Result<Vec<DrawCommand>> {
        if let Some(id) = self.weather {
            if let Some(mut entity) = self.board.check_out(id) {
                let outcome = match entity.as_weather_mut() {
                    Some(weather) => weather.ensure_sun(&mut self.board, &mut self.rng).map(|_| ()),
                    None => Ok(()),
                };
                self.board.check_in(id, entity);
                outcome?;
            }
        }

        let scale = self.config.board.scale;
        let mut out = Vec::new();
        for (_, entity) in self.board.iter() {
            entity.draw(scale, &mut out);
        }
        out.sort_by_key(|command| command.layer);
        Ok(out)
    }

    pub fn summary(&self) -> SimulationSummary {
        let mut water_entities = 0;
        let mut water_mass = 0;
        let mut clouds = 0;
        let mut cloud_rain = false;
        for (_, entity) in self.board.iter() {
            match entity {
                Entity::Water(water) => {
                    water_entities += 1;
                    water_mass += water.density() as i64;
                }
                Entity::Cloud(cloud) => {
                    clouds += 1;
                    cloud_rain |= cloud.is_raining();
                }
                _ => {}
            }
        }

        SimulationSummary {
            ticks: self.tick,
            water_entities,
            water_mass,
            soil_moisture: self.soil().map(Soil::total_wetness).unwrap_or(0),
            root_cells: self.roots().map(Roots::len).unwrap_or(0),
            plant_cells: self.plant().map(Plant::cell_count).unwrap_or(0),
            plant_water: self.plant().map(Plant::water).unwrap_or(0),
            clouds,
            raining: self.weather().map(Weather::is_raining).unwrap_or(cloud_rain),
        }
    }

    fn log_metrics(&self) {
        let summary = self.summary();
        info!(
            event = "ecosystem_metrics",
            tick = summary.ticks,
            water_entities = summary.water_entities,
            water_mass = summary.water_mass,
            soil_moisture = summary.soil_moisture,
            root_cells = summary.root_cells,
            plant_cells = summary.plant_cells,
            plant_water = summary.plant_water,
            clouds = summary.clouds,
            raining = summary.raining,
            "Ecosystem snapshot"
        );
    }

    /// Total density held by every water entity
    pub fn water_mass(&self) -> i64 {
        self.board
            .iter()
            .filter_map(|(_, entity)| entity.as_water())
            .map(|water| water.density() as i64)
            .sum()
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn soil(&self) -> Option<&Soil> {
        self.board.get(self.soil).and_then(Entity::as_soil)
    }

    pub fn roots(&self) -> Option<&Roots> {
        self.board.get(self.roots).and_then(Entity::as_roots)
    }

    pub fn plant(&self) -> Option<&Plant> {
        self.board.get(self.plant).and_then(Entity::as_plant)
    }

    pub fn weather(&self) -> Option<&Weather> {
        self.weather
            .and_then(|id| self.board.get(id))
            .and_then(Entity::as_weather)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub ticks: u64,
    pub water_entities: usize,
    pub water_mass: i64,
    pub soil_moisture: u64,
    pub root_cells: usize,
    pub plant_cells: usize,
    pub plant_water: u32,
    pub clouds: usize,
    pub raining: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Layer;
    use eco_core::{BoardConfig, CloudConfig, Error, PlantConfig, RootsConfig, SoilConfig};

    fn init_logging() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// 20x20 board, soil on rows 10-19, roots at the soil's top centre and a
    /// cloud raining straight down on them
    fn rainy_garden(seed: u64) -> ScenarioConfig {
        ScenarioConfig {
            seed,
            metrics_interval: 1000,
            board: BoardConfig {
                width: 20,
                height: 20,
                scale: 5,
            },
            soil: SoilConfig {
                x: 0,
                y: 10,
                width: 20,
                height: 10,
                ..SoilConfig::default()
            },
            roots: RootsConfig {
                anchor_x: 10,
                anchor_y: 0,
                grow_rate: 20,
                absorb_interval: 10,
            },
            plant: PlantConfig {
                x: 10,
                y: 9,
                ..PlantConfig::default()
            },
            clouds: vec![CloudConfig {
                x: 7,
                y: 1,
                width: 6,
                height: 2,
                rate: 1,
                raining: true,
            }],
            weather: None,
        }
    }

    #[test]
    fn test_simulation_creation() {
        init_logging();
        let sim = Simulation::new(ScenarioConfig::default()).unwrap();
        assert_eq!(sim.tick(), 0);
        assert_eq!(sim.board().size(), (30, 70));
        assert!(sim.weather().is_some());
        assert_eq!(sim.roots().unwrap().len(), 1);
        assert_eq!(sim.plant().unwrap().cell_count(), 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ScenarioConfig::default();
        config.roots.anchor_x = -1;
        assert!(matches!(Simulation::new(config), Err(Error::Validation(_))));
    }

    #[test]
    fn test_rainy_garden_grows() {
        init_logging();
        let mut sim = Simulation::new(rainy_garden(11)).unwrap();
        let summary = sim.run(5000).unwrap();

        assert_eq!(summary.ticks, 5000);
        assert!(summary.root_cells > 1, "roots never sprouted: {:?}", summary);
        assert!(summary.plant_cells > 1, "plant never grew: {:?}", summary);
        for (_, entity) in sim.board().iter() {
            if let Some(water) = entity.as_water() {
                assert!(water.density() > 0);
            }
        }
        assert_eq!(sim.water_mass(), summary.water_mass);
    }

    #[test]
    fn test_same_seed_same_run() {
        let mut first = Simulation::new(ScenarioConfig {
            seed: 99,
            ..ScenarioConfig::default()
        })
        .unwrap();
        let mut second = Simulation::new(ScenarioConfig {
            seed: 99,
            ..ScenarioConfig::default()
        })
        .unwrap();

        let a = first.run(600).unwrap();
        let b = second.run(600).unwrap();
        assert_eq!(a, b);
        assert_eq!(
            first.roots().unwrap().dump().unwrap(),
            second.roots().unwrap().dump().unwrap()
        );
    }

    #[test]
    fn test_banded_diffusion_runs_deterministically() {
        let mut config = rainy_garden(5);
        config.soil.diffusion = eco_core::DiffusionMode::Banded { bands: 4 };

        let a = Simulation::new(config.clone()).unwrap().run(500).unwrap();
        let b = Simulation::new(config).unwrap().run(500).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_frame_is_layered() {
        let mut sim = Simulation::new(rainy_garden(3)).unwrap();
        sim.run(50).unwrap();
        let frame = sim.frame().unwrap();

        assert!(!frame.is_empty());
        assert!(frame.windows(2).all(|pair| pair[0].layer <= pair[1].layer));
        assert!(frame.iter().any(|c| c.layer == Layer::Terrain));
        assert!(frame.iter().all(|c| c.width == 5 && c.height == 5));
    }

    #[test]
    fn test_frame_creates_sun_once() {
        let mut sim = Simulation::new(ScenarioConfig::default()).unwrap();
        let frame = sim.frame().unwrap();
        assert_eq!(frame[0].layer, Layer::Sky);
        let sun = sim.weather().unwrap().sun();
        assert!(sun.is_some());

        sim.frame().unwrap();
        assert_eq!(sim.weather().unwrap().sun(), sun);
    }

    #[test]
    fn test_frame_uses_board_scale() {
        let mut config = rainy_garden(4);
        config.board.scale = 3;
        let mut sim = Simulation::new(config).unwrap();
        sim.run(5).unwrap();
        let frame = sim.frame().unwrap();

        assert!(frame.iter().all(|c| c.width == 3 && c.height == 3));
        let soil = frame.iter().find(|c| c.layer == Layer::Terrain).unwrap();
        assert_eq!(soil.x % 3, 0);
        assert_eq!(soil.y % 3, 0);
    }

    #[test]
    fn test_missing_roots_halts_the_run() {
        let mut sim = Simulation::new(rainy_garden(1)).unwrap();
        let roots = sim.roots;
        sim.board.remove_entity(roots);

        // the plant pulls on its second tick
        sim.step().unwrap();
        let err = sim.step().unwrap_err();
        assert!(matches!(err, Error::InvariantViolation(_)));
    }

    #[test]
    fn test_summary_serializes() {
        let sim = Simulation::new(rainy_garden(2)).unwrap();
        let json = serde_json::to_string(&sim.summary()).unwrap();
        let restored: SimulationSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, sim.summary());
        assert!(restored.raining);
        assert_eq!(restored.clouds, 1);
    }
}
