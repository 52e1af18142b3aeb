//! Weather controller: spawns drifting clouds, toggles rain and tints the sky.
//!
//! Weather owns no board cells. It tracks the clouds it spawned by id and
//! checks each one out of the board while moving it.

use crate::board::Board;
use crate::cloud::Cloud;
use crate::entity::{BoardOccupant, Entity, TickContext, Tickable};
use crate::render::{DrawCommand, Drawable, Layer};
use crate::sun::Sun;
use eco_core::{one_in, EntityId, Position, Result, Rgba, WeatherConfig};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Weather {
    config: WeatherConfig,
    clouds: Vec<EntityId>,
    sun: Option<EntityId>,
    raining: bool,
    sky: Rgba,
    board_size: (i32, i32),
}

impl Weather {
    pub fn new(config: WeatherConfig) -> Self {
        Self {
            config,
            clouds: Vec::new(),
            sun: None,
            raining: false,
            sky: Rgba::SKY,
            board_size: (0, 0),
        }
    }

    pub fn is_raining(&self) -> bool {
        self.raining
    }

    pub fn cloud_count(&self) -> usize {
        self.clouds.len()
    }

    pub fn clouds(&self) -> &[EntityId] {
        &self.clouds
    }

    pub fn sky_color(&self) -> Rgba {
        self.sky
    }

    pub fn sun(&self) -> Option<EntityId> {
        self.sun
    }

    fn capped_cloud_count(&self) -> usize {
        self.clouds.len().min(self.config.max_cloud_darkness)
    }

    /// Random row in the upper fifteenth-to-two-fifteenths band of the sky
    fn sky_row(&self, rng: &mut ChaCha8Rng) -> i32 {
        let band = self.board_size.1 / 15;
        band + rng.gen_range(0..band.max(1))
    }

    /// Darken the sky with cloud cover while raining, and hide the sun
    /// behind more than one cloud.
    pub fn recalculate_sky(&mut self, board: &mut Board) {
        let count = if self.raining {
            self.capped_cloud_count()
        } else {
            0
        };
        let full = u32::try_from(self.config.max_cloud_darkness)
            .unwrap_or(u32::MAX)
            .saturating_mul(2);
        self.sky = Rgba::SKY.scaled(full.saturating_sub(count as u32), full);

        if let Some(id) = self.sun {
            if let Some(sun) = board.get_mut(id).and_then(Entity::as_sun_mut) {
                sun.set_hidden(count > 1);
            }
        }
    }

    /// Switch rain on or off for every tracked cloud
    pub fn toggle_rain(&mut self, enable: bool, board: &mut Board) {
        self.raining = enable;
        for &id in &self.clouds {
            if let Some(cloud) = board.get_mut(id).and_then(Entity::as_cloud_mut) {
                cloud.set_status(enable, self.config.rain_interval);
            }
        }
        self.recalculate_sky(board);
        info!(
            event = "rain_toggled",
            raining = enable,
            clouds = self.clouds.len(),
            "Rain {}",
            if enable { "started" } else { "stopped" }
        );
    }

    /// Create the sun on first use
    pub fn ensure_sun(&mut self, board: &mut Board, rng: &mut ChaCha8Rng) -> Result<EntityId> {
        if let Some(id) = self.sun {
            return Ok(id);
        }
        let (width, _) = self.board_size;
        let origin = Position::new(2 * width / 3, self.sky_row(rng));
        let id = board.add_entity(Entity::Sun(Sun::new(origin, width / 15)))?;
        self.sun = Some(id);
        self.recalculate_sky(board);
        Ok(id)
    }

    fn spawn_cloud(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        let width = self.board_size.0 / 8;
        let height = 2 * width / 3;
        let y = self.sky_row(ctx.rng);

        let mut cloud = Cloud::new(Position::new(0, y), width, height, 1);
        cloud.set_status(self.raining, self.config.rain_interval);
        let id = ctx.board.add_entity(Entity::Cloud(cloud))?;
        self.clouds.push(id);
        debug!(event = "cloud_spawned", cloud = %id, y, width, height, "Cloud spawned");

        self.recalculate_sky(ctx.board);
        Ok(())
    }

    /// Drift every cloud to the right and retire the ones reaching the edge
    fn move_clouds(&mut self, ctx: &mut TickContext<'_>) {
        let board_width = self.board_size.0;
        let mut move_rate = self.config.cloud_spawn / board_width.max(1) as i64;
        if !self.raining {
            move_rate /= 4;
        }

        let mut i = 0;
        while i < self.clouds.len() {
            let id = self.clouds[i];
            let Some(mut entity) = ctx.board.check_out(id) else {
                // removed behind our back
                self.clouds.remove(i);
                continue;
            };
            if entity.as_cloud().is_none() {
                ctx.board.check_in(id, entity);
                self.clouds.remove(i);
                continue;
            }

            let mut departed = false;
            if let Some(cloud) = entity.as_cloud_mut() {
                if one_in(ctx.rng, move_rate.saturating_add(1)) {
                    cloud.shift_right(id, ctx.board);
                }
                let shape = cloud.shape();
                if shape.origin.x + shape.width() >= board_width {
                    cloud.release(id, ctx.board);
                    departed = true;
                }
            }

            if departed {
                ctx.board.remove_entity(id);
                self.clouds.remove(i);
                debug!(event = "cloud_departed", cloud = %id, "Cloud left the board");
                self.recalculate_sky(ctx.board);
            } else {
                ctx.board.check_in(id, entity);
                i += 1;
            }
        }
    }
}

impl Tickable for Weather {
    fn update(&mut self, ctx: &mut TickContext<'_>) -> Result<()> {
        let count = self.capped_cloud_count() as i64;
        if one_in(ctx.rng, self.config.cloud_spawn / (2 * count + 1)) {
            self.spawn_cloud(ctx)?;
        }

        self.move_clouds(ctx);

        let clouds = self.clouds.len() as i64;
        if clouds > 0 {
            if self.raining && one_in(ctx.rng, self.config.rain_stop) {
                self.toggle_rain(false, ctx.board);
            } else if !self.raining && one_in(ctx.rng, self.config.rain_start / clouds) {
                self.toggle_rain(true, ctx.board);
            }
        }
        Ok(())
    }
}

impl BoardOccupant for Weather {
    fn add_to_board(&mut self, _id: EntityId, board: &mut Board) -> Result<()> {
        self.board_size = board.size();
        Ok(())
    }
}

impl Drawable for Weather {
    fn layer(&self) -> Layer {
        Layer::Sky
    }

    fn draw(&self, scale: i32, out: &mut Vec<DrawCommand>) {
        let (width, height) = self.board_size;
        out.push(DrawCommand {
            layer: self.layer(),
            x: 0,
            y: 0,
            width: width * scale,
            height: height * scale,
            color: self.sky,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn config(cloud_spawn: i64) -> WeatherConfig {
        WeatherConfig {
            cloud_spawn,
            ..WeatherConfig::default()
        }
    }

    fn setup(cloud_spawn: i64) -> (Board, EntityId) {
        let mut board = Board::new(48, 60);
        let id = board
            .add_entity(Entity::Weather(Weather::new(config(cloud_spawn))))
            .unwrap();
        (board, id)
    }

    fn update(board: &mut Board, rng: &mut ChaCha8Rng, id: EntityId) {
        let mut entity = board.check_out(id).unwrap();
        let mut ctx = TickContext {
            id,
            tick: 0,
            board: &mut *board,
            rng: &mut *rng,
        };
        entity.update(&mut ctx).unwrap();
        board.check_in(id, entity);
    }

    fn weather(board: &Board, id: EntityId) -> &Weather {
        board.get(id).unwrap().as_weather().unwrap()
    }

    #[test]
    fn test_spawns_cloud_at_left_edge() {
        let (mut board, id) = setup(0);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        update(&mut board, &mut rng, id);

        let weather = weather(&board, id);
        assert_eq!(weather.cloud_count(), 1);
        let cloud = board
            .get(weather.clouds()[0])
            .unwrap()
            .as_cloud()
            .unwrap();
        assert_eq!(cloud.shape().width(), 6);
        assert_eq!(cloud.shape().height(), 4);
        // spawned at x 0 and moved at most once
        assert!(cloud.shape().origin.x <= 1);
        assert!((4..8).contains(&cloud.shape().origin.y));
    }

    #[test]
    fn test_cloud_at_right_edge_departs() {
        let (mut board, id) = setup(i64::MAX);
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let cloud_id = board
            .add_entity(Entity::Cloud(Cloud::new(Position::new(42, 5), 6, 4, 1)))
            .unwrap();
        board
            .get_mut(id)
            .unwrap()
            .as_weather_mut()
            .unwrap()
            .clouds
            .push(cloud_id);

        update(&mut board, &mut rng, id);

        assert_eq!(weather(&board, id).cloud_count(), 0);
        assert!(!board.contains(cloud_id));
        assert_eq!(board.entity_at(Position::new(44, 6)), None);
    }

    #[test]
    fn test_toggle_rain_propagates_to_clouds() {
        let (mut board, id) = setup(i64::MAX);
        let cloud_id = board
            .add_entity(Entity::Cloud(Cloud::new(Position::new(5, 5), 6, 4, 1)))
            .unwrap();
        let mut weather = board.check_out(id).unwrap();
        let inner = weather.as_weather_mut().unwrap();
        inner.clouds.push(cloud_id);

        inner.toggle_rain(true, &mut board);
        assert!(inner.is_raining());
        assert!(board.get(cloud_id).unwrap().as_cloud().unwrap().is_raining());
        assert_eq!(inner.sky_color(), Rgba::SKY.scaled(9, 10));

        inner.toggle_rain(false, &mut board);
        assert!(!board.get(cloud_id).unwrap().as_cloud().unwrap().is_raining());
        assert_eq!(inner.sky_color(), Rgba::SKY);
        board.check_in(id, weather);
    }

    #[test]
    fn test_sky_darkness_is_capped_and_hides_sun() {
        let (mut board, id) = setup(i64::MAX);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut entity = board.check_out(id).unwrap();
        let weather = entity.as_weather_mut().unwrap();
        let sun = weather.ensure_sun(&mut board, &mut rng).unwrap();
        assert_eq!(weather.ensure_sun(&mut board, &mut rng).unwrap(), sun);

        for i in 0..8 {
            let cloud = board
                .add_entity(Entity::Cloud(Cloud::new(Position::new(2 + 5 * i, 10), 4, 3, 1)))
                .unwrap();
            weather.clouds.push(cloud);
        }
        weather.toggle_rain(true, &mut board);

        assert_eq!(weather.sky_color(), Rgba::SKY.scaled(5, 10));
        assert!(board.get(sun).unwrap().as_sun().unwrap().is_hidden());

        weather.toggle_rain(false, &mut board);
        assert!(!board.get(sun).unwrap().as_sun().unwrap().is_hidden());
        board.check_in(id, entity);
    }

    #[test]
    fn test_extreme_rates_do_not_overflow() {
        let mut board = Board::new(1, 60);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let controller = Weather::new(WeatherConfig {
            cloud_spawn: i64::MAX,
            max_cloud_darkness: usize::MAX,
            ..WeatherConfig::default()
        });
        let id = board.add_entity(Entity::Weather(controller)).unwrap();
        let cloud_id = board
            .add_entity(Entity::Cloud(Cloud::new(Position::new(0, 5), 1, 1, 1)))
            .unwrap();

        let mut entity = board.check_out(id).unwrap();
        let inner = entity.as_weather_mut().unwrap();
        inner.clouds.push(cloud_id);
        inner.toggle_rain(true, &mut board);
        assert!(inner.sky_color().r <= Rgba::SKY.r);
        board.check_in(id, entity);

        // raining keeps the full cloud_spawn / width move rate
        update(&mut board, &mut rng, id);
        assert_eq!(weather(&board, id).cloud_count(), 0);
        assert!(!board.contains(cloud_id));
    }

    #[test]
    fn test_sun_placement() {
        let (mut board, id) = setup(i64::MAX);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut entity = board.check_out(id).unwrap();
        let sun_id = entity
            .as_weather_mut()
            .unwrap()
            .ensure_sun(&mut board, &mut rng)
            .unwrap();
        let sun = board.get(sun_id).unwrap().as_sun().unwrap();
        assert_eq!(sun.shape().origin.x, 32);
        assert!((4..8).contains(&sun.shape().origin.y));
        assert_eq!(sun.shape().width(), 3);
        board.check_in(id, entity);
    }

    #[test]
    fn test_draws_full_board_sky() {
        let (board, id) = setup(i64::MAX);
        let mut out = Vec::new();
        weather(&board, id).draw(5, &mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].layer, Layer::Sky);
        assert_eq!((out[0].width, out[0].height), (240, 300));
        assert_eq!(out[0].color, Rgba::SKY);
    }
}
