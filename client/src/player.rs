use glam::{Mat4, Vec2, Vec3};

use crate::camera::horizontal_basis;
use crate::collision::{Aabb, ColliderSet};
use crate::config::*;
use crate::input::InputState;

/// What happened during one physics step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    /// Collider hit from below while rising.
    pub ceiling_hit: Option<usize>,
    /// Became grounded this step after being airborne.
    pub landed: bool,
    pub respawned: bool,
    pub jumped: bool,
}

pub struct Player {
    /// Centre of the base of the player box.
    pub position: Vec3,
    pub velocity: Vec3,
    /// Yaw the avatar faces; 0 faces +Z.
    pub facing: f32,
    pub grounded: bool,
    pub spawn: Vec3,
}

impl Player {
    pub fn new(spawn: Vec3) -> Self {
        Self {
            position: spawn,
            velocity: Vec3::ZERO,
            facing: 0.0,
            grounded: false,
            spawn,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_feet(self.position, PLAYER_SIZE)
    }

    /// Advances the player by `dt`. Movement input is interpreted relative
    /// to `camera_yaw`. Each axis is moved and checked on its own, in the
    /// order X, Z, Y; an axis move that ends inside a collider is undone
    /// and that velocity component is zeroed.
    pub fn update(
        &mut self,
        dt: f32,
        input: &InputState,
        camera_yaw: f32,
        colliders: &ColliderSet,
    ) -> StepReport {
        let mut report = StepReport::default();
        let was_grounded = self.grounded;

        self.velocity.y -= GRAVITY * dt;

        let axes = input.move_axes();
        let (forward, right) = horizontal_basis(camera_yaw);
        let move_dir = (forward * axes.y + right * axes.x).normalize_or_zero();
        if move_dir != Vec3::ZERO {
            self.facing = move_dir.x.atan2(move_dir.z);
        }
        self.steer(move_dir, dt);

        let old = self.position;

        self.position.x += self.velocity.x * dt;
        if colliders.overlaps_any(&self.bounds()) {
            self.position.x = old.x;
            self.velocity.x = 0.0;
        }

        self.position.z += self.velocity.z * dt;
        if colliders.overlaps_any(&self.bounds()) {
            self.position.z = old.z;
            self.velocity.z = 0.0;
        }

        self.grounded = false;
        self.position.y += self.velocity.y * dt;
        if let Some(index) = colliders.first_overlap(&self.bounds()) {
            if self.velocity.y < 0.0 {
                self.grounded = true;
            } else if self.velocity.y > 0.0 {
                report.ceiling_hit = Some(index);
            }
            self.position.y = old.y;
            self.velocity.y = 0.0;
        }
        report.landed = self.grounded && !was_grounded;

        if self.position.y < KILL_PLANE_Y {
            log::info!("Player fell below the world, respawning");
            self.respawn();
            report.respawned = true;
            return report;
        }

        if input.jump_held() && self.grounded {
            self.velocity.y = JUMP_VELOCITY;
            self.grounded = false;
            let lifted = self.bounds().translated(Vec3::new(0.0, JUMP_LIFT, 0.0));
            if !colliders.overlaps_any(&lifted) {
                self.position.y += JUMP_LIFT;
            }
            report.jumped = true;
        }

        report
    }

    /// Springs horizontal velocity toward the input target: accelerate
    /// toward `move_dir * MOVE_SPEED` while steering, decay toward rest
    /// under friction otherwise.
    fn steer(&mut self, move_dir: Vec3, dt: f32) {
        let current = Vec2::new(self.velocity.x, self.velocity.z);
        let next = if move_dir == Vec3::ZERO {
            move_towards(current, Vec2::ZERO, FRICTION * dt)
        } else {
            let target = Vec2::new(move_dir.x, move_dir.z) * MOVE_SPEED;
            move_towards(current, target, ACCELERATION * dt)
        };
        self.velocity.x = next.x;
        self.velocity.z = next.y;
    }

    pub fn respawn(&mut self) {
        self.position = self.spawn;
        self.velocity = Vec3::ZERO;
        self.grounded = false;
    }

    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_rotation_y(self.facing)
    }

    #[cfg(test)]
    pub fn horizontal_speed(&self) -> f32 {
        Vec2::new(self.velocity.x, self.velocity.z).length()
    }
}

fn move_towards(current: Vec2, target: Vec2, max_delta: f32) -> Vec2 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance <= f32::EPSILON {
        target
    } else {
        current + delta / distance * max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::ColliderKind;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};
    use winit::keyboard::KeyCode;

    const DT: f32 = 1.0 / 60.0;

    fn ground() -> ColliderSet {
        let mut set = ColliderSet::new();
        set.push(
            Aabb::new(Vec3::new(-50.0, -1.0, -50.0), Vec3::new(50.0, 0.0, 50.0)),
            ColliderKind::Ground,
        );
        set
    }

    fn settle(player: &mut Player, colliders: &ColliderSet) {
        let input = InputState::new();
        for _ in 0..240 {
            player.update(DT, &input, 0.0, colliders);
        }
    }

    fn pressed(keys: &[KeyCode]) -> InputState {
        let mut input = InputState::new();
        for key in keys {
            input.handle_key_press(*key);
        }
        input
    }

    #[test]
    fn falls_and_rests_on_ground() {
        let colliders = ground();
        let mut player = Player::new(Vec3::new(0.0, 5.0, 0.0));
        settle(&mut player, &colliders);
        assert!(player.grounded);
        assert_eq!(player.velocity.y, 0.0);
        assert!(player.position.y >= 0.0 && player.position.y < 0.05);
    }

    #[test]
    fn landing_is_reported_once() {
        let colliders = ground();
        let mut player = Player::new(Vec3::new(0.0, 1.0, 0.0));
        let input = InputState::new();
        let landings = (0..240)
            .filter(|_| player.update(DT, &input, 0.0, &colliders).landed)
            .count();
        assert!(landings >= 1);
        assert!(player.grounded);
        assert!(!player.update(DT, &input, 0.0, &colliders).landed);
    }

    #[test]
    fn jump_skips_lift_under_a_low_ceiling() {
        let mut colliders = ground();
        let mut player = Player::new(Vec3::new(0.0, 1.0, 0.0));
        settle(&mut player, &colliders);
        assert!(player.grounded);

        let ceiling_bottom = player.position.y + PLAYER_SIZE.y + JUMP_LIFT * 0.5;
        let ceiling = colliders.push(
            Aabb::new(
                Vec3::new(-2.0, ceiling_bottom, -2.0),
                Vec3::new(2.0, ceiling_bottom + 1.0, 2.0),
            ),
            ColliderKind::Brick,
        );
        let y = player.position.y;

        let input = pressed(&[KeyCode::Space]);
        let report = player.update(DT, &input, 0.0, &colliders);
        assert!(report.jumped);
        assert_eq!(player.position.y, y);
        assert!(!colliders.overlaps_any(&player.bounds()));

        let report = player.update(DT, &InputState::new(), 0.0, &colliders);
        assert_eq!(report.ceiling_hit, Some(ceiling));
        assert!(!colliders.overlaps_any(&player.bounds()));
    }

    #[test]
    fn accelerates_toward_move_speed() {
        let colliders = ground();
        let mut player = Player::new(Vec3::new(0.0, 0.01, 0.0));
        settle(&mut player, &colliders);
        let input = pressed(&[KeyCode::KeyW]);

        player.update(DT, &input, 0.0, &colliders);
        assert!((player.velocity.z + ACCELERATION * DT).abs() < 1e-4);
        assert!(player.velocity.x.abs() < 1e-6);

        for _ in 0..120 {
            player.update(DT, &input, 0.0, &colliders);
        }
        assert!((player.horizontal_speed() - MOVE_SPEED).abs() < 1e-4);
        assert!(player.position.z < -5.0);
    }

    #[test]
    fn friction_stops_without_overshoot() {
        let colliders = ground();
        let mut player = Player::new(Vec3::new(0.0, 0.01, 0.0));
        settle(&mut player, &colliders);
        player.velocity.x = MOVE_SPEED;

        let idle = InputState::new();
        let mut previous = player.velocity.x;
        for _ in 0..120 {
            player.update(DT, &idle, 0.0, &colliders);
            assert!(player.velocity.x >= 0.0);
            assert!(player.velocity.x <= previous);
            previous = player.velocity.x;
        }
        assert_eq!(player.velocity.x, 0.0);
    }

    #[test]
    fn input_follows_camera_yaw() {
        let colliders = ground();
        let mut player = Player::new(Vec3::new(0.0, 0.01, 0.0));
        settle(&mut player, &colliders);
        let input = pressed(&[KeyCode::KeyW]);
        let yaw = std::f32::consts::FRAC_PI_2;
        for _ in 0..60 {
            player.update(DT, &input, yaw, &colliders);
        }
        // Camera sits on +X looking toward -X.
        assert!(player.position.x < -3.0);
        assert!(player.position.z.abs() < 1e-3);
        assert!((player.facing + std::f32::consts::FRAC_PI_2).abs() < 1e-4);
    }

    #[test]
    fn wall_blocks_one_axis_and_lets_the_other_slide() {
        let mut colliders = ground();
        colliders.push(
            Aabb::new(Vec3::new(2.0, 0.0, -50.0), Vec3::new(3.0, 4.0, 50.0)),
            ColliderKind::Wall,
        );
        let mut player = Player::new(Vec3::new(0.0, 0.01, 0.0));
        settle(&mut player, &colliders);

        let input = pressed(&[KeyCode::KeyD, KeyCode::KeyW]);
        for _ in 0..180 {
            player.update(DT, &input, 0.0, &colliders);
            assert!(!colliders.overlaps_any(&player.bounds()));
        }
        assert!(player.bounds().max.x <= 2.0);
        assert!(player.bounds().max.x > 1.7);
        assert!(player.position.z < -5.0);
    }

    #[test]
    fn jump_requires_ground() {
        let colliders = ground();
        let mut player = Player::new(Vec3::new(0.0, 0.01, 0.0));
        settle(&mut player, &colliders);
        let jump = pressed(&[KeyCode::Space]);

        let y_before = player.position.y;
        let report = player.update(DT, &jump, 0.0, &colliders);
        assert!(report.jumped);
        assert_eq!(player.velocity.y, JUMP_VELOCITY);
        assert!((player.position.y - y_before - JUMP_LIFT).abs() < 1e-4);

        let report = player.update(DT, &jump, 0.0, &colliders);
        assert!(!report.jumped);
        assert!(player.velocity.y < JUMP_VELOCITY);
    }

    #[test]
    fn ceiling_hit_reports_collider_and_stops_rise() {
        let mut colliders = ground();
        let block = colliders.push(
            Aabb::from_center_size(Vec3::new(0.0, 3.5, 0.0), Vec3::splat(BLOCK_SIZE)),
            ColliderKind::QuestionBlock,
        );
        let mut player = Player::new(Vec3::new(0.0, 0.01, 0.0));
        settle(&mut player, &colliders);

        let jump = pressed(&[KeyCode::Space]);
        player.update(DT, &jump, 0.0, &colliders);
        let idle = InputState::new();
        let mut hit = None;
        for _ in 0..30 {
            let report = player.update(DT, &idle, 0.0, &colliders);
            if report.ceiling_hit.is_some() {
                hit = report.ceiling_hit;
                break;
            }
        }
        assert_eq!(hit, Some(block));
        assert_eq!(player.velocity.y, 0.0);
        assert!(player.bounds().max.y <= 2.5);
    }

    #[test]
    fn falling_off_the_world_respawns() {
        let colliders = ColliderSet::new();
        let spawn = Vec3::new(1.0, 5.0, -2.0);
        let mut player = Player::new(spawn);
        let idle = InputState::new();
        let mut respawned = false;
        for _ in 0..600 {
            if player.update(DT, &idle, 0.0, &colliders).respawned {
                respawned = true;
                break;
            }
        }
        assert!(respawned);
        assert_eq!(player.position, spawn);
        assert_eq!(player.velocity, Vec3::ZERO);
    }

    #[test]
    fn never_ends_a_step_inside_geometry() {
        let mut colliders = ground();
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..40 {
            let center = Vec3::new(
                rng.random_range(-12.0..12.0),
                rng.random_range(0.5..4.0),
                rng.random_range(-12.0..12.0),
            );
            let size = Vec3::new(
                rng.random_range(0.5..3.0),
                rng.random_range(0.5..3.0),
                rng.random_range(0.5..3.0),
            );
            let bounds = Aabb::from_center_size(center, size);
            if bounds.intersects(&Aabb::from_feet(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 8.0, 1.0))) {
                continue;
            }
            colliders.push(bounds, ColliderKind::Brick);
        }

        let keys = [KeyCode::KeyW, KeyCode::KeyA, KeyCode::KeyS, KeyCode::KeyD, KeyCode::Space];
        let mut player = Player::new(Vec3::new(0.0, 5.0, 0.0));
        let mut input = InputState::new();
        for frame in 0..3000 {
            if frame % 20 == 0 {
                input.release_all();
                for key in keys {
                    if rng.random_bool(0.4) {
                        input.handle_key_press(key);
                    }
                }
            }
            let yaw = rng.random_range(0.0..std::f32::consts::TAU);
            let dt = rng.random_range(0.001..MAX_FRAME_DT);
            let report = player.update(dt, &input, yaw, &colliders);
            if !report.respawned {
                assert!(
                    !colliders.overlaps_any(&player.bounds()),
                    "overlap at frame {frame}: {:?}",
                    player.position
                );
            }
        }
    }
}
