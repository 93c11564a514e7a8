use glam::{Mat4, Quat, Vec3};
use web_time::Instant;

use crate::camera::FollowCamera;
use crate::collision::{Aabb, ColliderKind};
use crate::config::*;
use crate::error::LevelError;
use crate::input::InputState;
use crate::level::Level;
use crate::models::ModelId;
use crate::player::Player;
use crate::settings::Settings;

/// Coin knocked out of a question block, rising and spinning until it
/// vanishes.
pub struct PoppingCoin {
    pub origin: Vec3,
    pub age: f32,
}

impl PoppingCoin {
    fn progress(&self) -> f32 {
        (self.age / COIN_POP_DURATION).clamp(0.0, 1.0)
    }

    fn position(&self) -> Vec3 {
        let t = self.progress();
        // Ease out so the coin slows near the top.
        self.origin + Vec3::Y * COIN_POP_HEIGHT * (1.0 - (1.0 - t) * (1.0 - t))
    }
}

pub struct GameState {
    pub player: Player,
    pub camera: FollowCamera,
    pub level: Level,
    pub score: u32,
    pub popping_coins: Vec<PoppingCoin>,
    elapsed: f32,
    last_update: Instant,
}

impl GameState {
    pub fn new(settings: &Settings) -> Result<Self, LevelError> {
        let level = Level::build(settings.level, &mut settings.rng())?;
        Ok(Self::with_level(level))
    }

    pub fn with_level(level: Level) -> Self {
        let player = Player::new(level.spawn);
        let camera = FollowCamera::new(player.position);
        Self {
            player,
            camera,
            level,
            score: 0,
            popping_coins: Vec::new(),
            elapsed: 0.0,
            last_update: Instant::now(),
        }
    }

    pub fn update(&mut self, input: &mut InputState) {
        let now = Instant::now();
        let dt = (now - self.last_update).as_secs_f32().min(MAX_FRAME_DT);
        self.last_update = now;
        self.step(dt, input);
    }

    /// Advances the world by a fixed `dt`.
    pub fn step(&mut self, dt: f32, input: &mut InputState) {
        let (dx, dy) = input.consume_mouse_delta();
        self.camera.apply_mouse(dx, dy);

        let report = self
            .player
            .update(dt, input, self.camera.yaw, &self.level.colliders);
        if let Some(index) = report.ceiling_hit {
            self.bump_block(index);
        }
        self.collect_coins();
        self.advance_animations(dt);

        if report.respawned {
            self.camera.reset(self.player.position);
        } else {
            self.camera.update(dt, self.player.position);
        }
    }

    fn bump_block(&mut self, collider: usize) {
        let hit = self.level.colliders.get(collider).map(|c| c.kind);
        if hit != Some(ColliderKind::QuestionBlock) {
            return;
        }
        let Some(block) = self
            .level
            .question_blocks
            .iter_mut()
            .find(|b| b.collider == collider && !b.used)
        else {
            return;
        };
        block.used = true;
        self.score += 1;
        self.popping_coins.push(PoppingCoin {
            origin: block.center + Vec3::Y * BLOCK_SIZE,
            age: 0.0,
        });
        log::debug!("Question block at {:?} used, score {}", block.center, self.score);
    }

    fn collect_coins(&mut self) {
        let player = self.player.bounds();
        let before = self.level.coins.len();
        self.level
            .coins
            .retain(|&coin| !player.intersects(&coin_bounds(coin)));
        let collected = before - self.level.coins.len();
        if collected > 0 {
            self.score += collected as u32;
            log::debug!("Collected {collected} coin(s), score {}", self.score);
        }
    }

    fn advance_animations(&mut self, dt: f32) {
        self.elapsed += dt;

        for coin in &mut self.popping_coins {
            coin.age += dt;
        }
        self.popping_coins.retain(|c| c.age < COIN_POP_DURATION);

        let extent = self.level.half_extent;
        for cloud in &mut self.level.clouds {
            cloud.position.x += CLOUD_DRIFT_SPEED * dt;
            if cloud.position.x > extent {
                cloud.position.x -= 2.0 * extent;
            }
        }
    }

    /// Dynamic instances to draw this frame. Static level geometry is not
    /// included.
    pub fn draw_list(&self) -> Vec<(ModelId, Mat4)> {
        let mut list = Vec::with_capacity(
            1 + self.level.coins.len()
                + self.popping_coins.len()
                + self.level.question_blocks.len()
                + self.level.clouds.len(),
        );

        list.push((ModelId::Mario, self.player.model_matrix()));

        let spin = Quat::from_rotation_y(self.elapsed * COIN_SPIN_SPEED);
        for &coin in &self.level.coins {
            list.push((ModelId::Coin, Mat4::from_rotation_translation(spin, coin)));
        }

        let fast_spin = Quat::from_rotation_y(self.elapsed * COIN_SPIN_SPEED * 4.0);
        for coin in &self.popping_coins {
            list.push((
                ModelId::Coin,
                Mat4::from_rotation_translation(fast_spin, coin.position()),
            ));
        }

        for block in &self.level.question_blocks {
            let model = if block.used {
                ModelId::UsedBlock
            } else {
                ModelId::QuestionBlock
            };
            list.push((model, Mat4::from_translation(block.center)));
        }

        for cloud in &self.level.clouds {
            list.push((
                ModelId::Cloud,
                Mat4::from_scale_rotation_translation(
                    Vec3::splat(cloud.scale),
                    Quat::IDENTITY,
                    cloud.position,
                ),
            ));
        }

        list
    }
}

fn coin_bounds(center: Vec3) -> Aabb {
    Aabb::from_center_size(center, Vec3::splat(COIN_RADIUS * 2.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelKind;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use winit::keyboard::KeyCode;

    const DT: f32 = 1.0 / 60.0;

    fn game(layout: &str) -> GameState {
        let level = Level::from_layout(layout, &mut SmallRng::seed_from_u64(3)).unwrap();
        GameState::with_level(level)
    }

    fn run(game: &mut GameState, input: &mut InputState, frames: usize) {
        for _ in 0..frames {
            game.step(DT, input);
        }
    }

    #[test]
    fn walking_into_a_coin_collects_it() {
        let mut game = game("S.C");
        let mut input = InputState::new();
        run(&mut game, &mut input, 30);
        assert_eq!(game.score, 0);

        input.handle_key_press(KeyCode::KeyD);
        run(&mut game, &mut input, 90);
        assert_eq!(game.score, 1);
        assert!(game.level.coins.is_empty());
        assert!(game.draw_list().iter().all(|(id, _)| *id != ModelId::Coin));
    }

    #[test]
    fn question_block_pays_out_once() {
        let mut game = game("?\n.\nS");
        let mut input = InputState::new();
        run(&mut game, &mut input, 30);
        assert!(game.player.grounded);

        input.handle_key_press(KeyCode::Space);
        let mut frames = 0;
        while !game.level.question_blocks[0].used && frames < 120 {
            game.step(DT, &mut input);
            frames += 1;
        }
        assert!(game.level.question_blocks[0].used);
        assert_eq!(game.score, 1);
        assert_eq!(game.popping_coins.len(), 1);
        assert!(
            game.draw_list()
                .iter()
                .any(|(id, _)| *id == ModelId::UsedBlock)
        );

        run(&mut game, &mut input, 120);
        assert_eq!(game.score, 1);
        assert!(game.popping_coins.is_empty());
    }

    #[test]
    fn bumping_a_brick_pays_nothing() {
        let mut game = game("B\n.\nS");
        let mut input = InputState::new();
        run(&mut game, &mut input, 30);
        input.handle_key_press(KeyCode::Space);
        run(&mut game, &mut input, 60);
        assert_eq!(game.score, 0);
        assert!(game.popping_coins.is_empty());
    }

    #[test]
    fn popping_coin_rises_then_stops() {
        let coin = PoppingCoin {
            origin: Vec3::ZERO,
            age: COIN_POP_DURATION * 2.0,
        };
        assert_eq!(coin.position(), Vec3::Y * COIN_POP_HEIGHT);
        let start = PoppingCoin {
            origin: Vec3::ZERO,
            age: 0.0,
        };
        assert_eq!(start.position(), Vec3::ZERO);
    }

    #[test]
    fn clouds_wrap_around_the_level() {
        let mut game = game("S");
        let extent = game.level.half_extent;
        game.level.clouds[0].position.x = extent - 0.01;
        let mut input = InputState::new();
        game.step(0.1, &mut input);
        let x = game.level.clouds[0].position.x;
        assert!(x < 0.0 && x >= -extent, "cloud at {x}");
    }

    #[test]
    fn respawn_snaps_camera() {
        let mut game = game("S");
        game.player.position = Vec3::new(500.0, KILL_PLANE_Y + 0.1, 0.0);
        game.player.velocity = Vec3::new(0.0, -60.0, 0.0);
        let mut input = InputState::new();
        game.step(DT, &mut input);
        assert_eq!(game.player.position, game.level.spawn);
        assert_eq!(game.camera.position, game.level.spawn + game.camera.offset());
    }

    #[test]
    fn mouse_turns_camera_and_movement() {
        let mut game = game("S");
        let mut input = InputState::new();
        input.handle_mouse_move(-std::f32::consts::FRAC_PI_2 / MOUSE_SENSITIVITY, 0.0);
        input.handle_key_press(KeyCode::KeyW);
        run(&mut game, &mut input, 60);
        // Yaw of a quarter turn makes forward point along -X.
        assert!(game.player.position.x < -3.0);
        assert!(game.player.position.z.abs() < 1e-3);
    }

    #[test]
    fn draw_list_covers_every_dynamic_object() {
        let game = GameState::new(&Settings {
            level: LevelKind::Classic,
            seed: Some(5),
            post_processing: false,
        })
        .unwrap();
        let list = game.draw_list();
        let count = |id: ModelId| list.iter().filter(|(m, _)| *m == id).count();
        assert_eq!(count(ModelId::Mario), 1);
        assert_eq!(count(ModelId::Coin), game.level.coins.len());
        assert_eq!(count(ModelId::QuestionBlock), game.level.question_blocks.len());
        assert_eq!(count(ModelId::Cloud), game.level.clouds.len());
    }
}
