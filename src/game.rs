//! The simulation: gravity, scrolling obstacles, and the game-over latch.
//!
//! Coordinates follow screen convention: x grows to the right, y grows
//! downward. The presentation layer supplies the screen [`Bounds`] and calls
//! [`GameLoop::on_tick`] at a fixed rate and [`GameLoop::on_primary_action`]
//! on every tap.

use rand::Rng;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::Physics;

// ── State ───────────────────────────────────────────────────────────────────

/// Screen size in core units. The zero-size default stands in when the real
/// size is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

impl Bounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// The player-controlled faller.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub x: f64,
    pub y: f64,
    /// Vertical velocity per tick, positive = downward. Unbounded.
    pub velocity: f64,
}

impl Entity {
    /// Sprite rotation: nose up while rising, nose down while falling.
    pub fn rotation_degrees(&self) -> f64 {
        self.velocity * 3.0
    }
}

/// Stable identity of an obstacle across recycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObstacleId(Uuid);

impl ObstacleId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// A top/bottom barrier pair. The top barrier starts at `y`; the gap begins
/// where it ends.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Obstacle {
    pub fn gap_top(&self) -> f64 {
        self.y + self.height
    }

    pub fn gap_bottom(&self, gap: f64) -> f64 {
        self.gap_top() + gap
    }
}

/// Draw a gap offset uniformly from `[-(height + height / 2), 0)`.
///
/// A zero, negative, or non-finite height leaves that range empty; the
/// offset is then pinned to 0.
pub fn random_gap_offset<R: Rng>(rng: &mut R, height: f64) -> f64 {
    let low = -(height + height / 2.0);
    if low < 0.0 && low.is_finite() {
        rng.gen_range(low..0.0)
    } else {
        0.0
    }
}

// ── Events ──────────────────────────────────────────────────────────────────

/// What a single tick changed, for sound and logging.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Obstacles that wrapped around this tick, each worth a point.
    pub recycled: u32,
    /// This tick set the game-over latch.
    pub ended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Jumped,
    Restarted,
}

// ── Game loop ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GameLoop {
    physics: Physics,
    bounds: Bounds,
    entity: Entity,
    obstacles: Vec<Obstacle>,
    score: u32,
    game_over: bool,
}

impl GameLoop {
    pub fn new(physics: Physics, bounds: Bounds) -> Self {
        let entity = Entity {
            x: physics.start_x,
            y: physics.start_y,
            velocity: 0.0,
        };
        Self {
            physics,
            bounds,
            entity,
            obstacles: Vec::new(),
            score: 0,
            game_over: false,
        }
    }

    pub fn physics(&self) -> &Physics {
        &self.physics
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    /// Screen size changed. Play continues with the new edges.
    pub fn set_bounds(&mut self, bounds: Bounds) {
        debug!(width = bounds.width, height = bounds.height, "bounds changed");
        self.bounds = bounds;
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// In insertion order, which is also scroll and draw order.
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Advance the simulation by one tick. Does nothing once the game is over.
    pub fn on_tick<R: Rng>(&mut self, rng: &mut R) -> TickReport {
        let mut report = TickReport::default();
        if self.game_over {
            return report;
        }

        self.apply_gravity();
        report.recycled = self.advance_obstacles(rng);
        self.spawn_obstacle(rng);

        if self.out_of_bounds() {
            self.game_over = true;
            report.ended = true;
            info!(score = self.score, y = self.entity.y, "game over");
        }
        report
    }

    /// A tap: jump while playing, restart once the game is over.
    pub fn on_primary_action(&mut self) -> Action {
        if self.game_over {
            self.restart();
            Action::Restarted
        } else {
            self.entity.velocity = self.physics.jump_velocity;
            Action::Jumped
        }
    }

    pub fn restart(&mut self) {
        self.entity = Entity {
            x: self.physics.start_x,
            y: self.physics.start_y,
            velocity: 0.0,
        };
        self.obstacles.clear();
        self.score = 0;
        self.game_over = false;
        info!("restart");
    }

    fn apply_gravity(&mut self) {
        self.entity.velocity += self.physics.gravity;
        self.entity.y += self.entity.velocity;
    }

    /// Scroll every obstacle left. Ones that leave the screen are moved back
    /// to the right edge in place, keeping their id, and score a point.
    fn advance_obstacles<R: Rng>(&mut self, rng: &mut R) -> u32 {
        let mut recycled = 0;
        for obstacle in &mut self.obstacles {
            obstacle.x -= self.physics.pipe_speed;

            if obstacle.x < -obstacle.width {
                obstacle.x = self.bounds.width;
                obstacle.y = random_gap_offset(rng, obstacle.height);
                recycled += 1;
                debug!(id = ?obstacle.id, y = obstacle.y, "obstacle recycled");
            }
        }
        self.score += recycled;
        recycled
    }

    fn spawn_obstacle<R: Rng>(&mut self, rng: &mut R) {
        if self.obstacles.len() >= self.physics.max_obstacles {
            return;
        }
        let height = self.physics.obstacle_height;
        let obstacle = Obstacle {
            id: ObstacleId::new(),
            x: self.bounds.width + self.physics.pipe_spacing,
            y: random_gap_offset(rng, height),
            width: self.physics.obstacle_width,
            height,
        };
        debug!(id = ?obstacle.id, x = obstacle.x, y = obstacle.y, "obstacle spawned");
        self.obstacles.push(obstacle);
    }

    // Only the vertical screen edges end the game. Obstacles never collide.
    fn out_of_bounds(&self) -> bool {
        self.entity.y < 0.0 || self.entity.y > self.bounds.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const EPS: f64 = 1e-9;

    fn new_game() -> GameLoop {
        GameLoop::new(Physics::default(), Bounds::new(800.0, 480.0))
    }

    fn obstacle_at(x: f64) -> Obstacle {
        Obstacle {
            id: ObstacleId::new(),
            x,
            y: -100.0,
            width: 50.0,
            height: 200.0,
        }
    }

    #[test]
    fn test_new_game_defaults() {
        let game = new_game();
        assert!((game.entity.x - 100.0).abs() < EPS);
        assert!((game.entity.y - 200.0).abs() < EPS);
        assert!(game.entity.velocity.abs() < EPS);
        assert!(game.obstacles.is_empty());
        assert_eq!(game.score, 0);
        assert!(!game.game_over);
    }

    #[test]
    fn test_gravity_integration() {
        let mut game = new_game();
        let mut rng = StdRng::seed_from_u64(42);
        game.entity.velocity = -3.0;
        game.on_tick(&mut rng);
        assert!((game.entity.velocity - (-2.4)).abs() < EPS);
        assert!((game.entity.y - (200.0 - 2.4)).abs() < EPS);
    }

    #[test]
    fn test_obstacle_scrolls_by_pipe_speed() {
        let mut game = new_game();
        let mut rng = StdRng::seed_from_u64(42);
        game.obstacles.push(obstacle_at(300.0));
        game.on_tick(&mut rng);
        assert!((game.obstacles[0].x - 297.5).abs() < EPS);
        assert_eq!(game.score, 0);
    }

    #[test]
    fn test_recycle_in_place() {
        let mut game = new_game();
        let mut rng = StdRng::seed_from_u64(42);
        game.obstacles.push(obstacle_at(-49.0));
        let id = game.obstacles[0].id;

        let report = game.on_tick(&mut rng);

        let recycled = &game.obstacles[0];
        assert_eq!(recycled.id, id);
        assert!((recycled.x - 800.0).abs() < EPS);
        assert!(recycled.y >= -300.0 && recycled.y < 0.0);
        assert_eq!(game.score, 1);
        assert_eq!(report.recycled, 1);
    }

    #[test]
    fn test_obstacle_at_left_edge_is_not_recycled() {
        let mut game = new_game();
        let mut rng = StdRng::seed_from_u64(42);
        // Lands exactly on -width, which is not yet past it.
        game.obstacles.push(obstacle_at(-47.5));
        game.on_tick(&mut rng);
        assert!((game.obstacles[0].x + 50.0).abs() < EPS);
        assert_eq!(game.score, 0);
    }

    #[test]
    fn test_spawn_until_three() {
        let mut game = new_game();
        let mut rng = StdRng::seed_from_u64(7);

        for expected in 1..=3 {
            game.on_tick(&mut rng);
            assert_eq!(game.obstacles.len(), expected);
        }
        game.on_tick(&mut rng);
        assert_eq!(game.obstacles.len(), 3);

        let newest = &game.obstacles[2];
        assert!((newest.x - 997.5).abs() < EPS);
        assert!((newest.width - 50.0).abs() < EPS);
        assert!((newest.height - 200.0).abs() < EPS);
    }

    #[test]
    fn test_spawn_position_beyond_right_edge() {
        let mut game = new_game();
        let mut rng = StdRng::seed_from_u64(7);
        game.on_tick(&mut rng);
        let obstacle = &game.obstacles[0];
        assert!((obstacle.x - 1000.0).abs() < EPS);
        assert!(obstacle.y >= -300.0 && obstacle.y < 0.0);
    }

    #[test]
    fn test_jump_overwrites_velocity() {
        let mut game = new_game();
        game.entity.velocity = 9.0;
        assert_eq!(game.on_primary_action(), Action::Jumped);
        assert!((game.entity.velocity + 12.0).abs() < EPS);
        // Position is untouched until the next tick.
        assert!((game.entity.y - 200.0).abs() < EPS);
    }

    #[test]
    fn test_falling_past_bottom_ends_game() {
        let mut game = new_game();
        let mut rng = StdRng::seed_from_u64(1);
        loop {
            let report = game.on_tick(&mut rng);
            if game.entity.y > 480.0 {
                assert!(report.ended);
                assert!(game.game_over);
                break;
            }
            assert!(!report.ended);
        }
    }

    #[test]
    fn test_game_over_latch_freezes_state() {
        let mut game = new_game();
        let mut rng = StdRng::seed_from_u64(1);
        game.on_tick(&mut rng);
        game.game_over = true;
        let before = (game.entity.clone(), game.obstacles.clone(), game.score);

        let report = game.on_tick(&mut rng);

        assert_eq!(report, TickReport::default());
        assert_eq!(before, (game.entity.clone(), game.obstacles.clone(), game.score));
    }

    #[test]
    fn test_action_after_game_over_restarts() {
        let mut game = new_game();
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..5 {
            game.on_tick(&mut rng);
        }
        game.score = 4;
        game.game_over = true;

        assert_eq!(game.on_primary_action(), Action::Restarted);
        assert!(!game.game_over);
        assert!(game.entity.velocity.abs() < EPS);
        assert!(game.obstacles.is_empty());
        assert_eq!(game.score, 0);
    }

    #[test]
    fn test_random_gap_offset_range() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..1000 {
            let y = random_gap_offset(&mut rng, 200.0);
            assert!((-300.0..0.0).contains(&y));
        }
    }

    #[test]
    fn test_random_gap_offset_degenerate_height() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(random_gap_offset(&mut rng, 0.0), 0.0);
        assert_eq!(random_gap_offset(&mut rng, -10.0), 0.0);
        assert_eq!(random_gap_offset(&mut rng, f64::NAN), 0.0);
        assert_eq!(random_gap_offset(&mut rng, f64::INFINITY), 0.0);
    }

    #[test]
    fn test_zero_size_screen() {
        let mut game = GameLoop::new(Physics::default(), Bounds::default());
        let mut rng = StdRng::seed_from_u64(3);
        let report = game.on_tick(&mut rng);
        assert!(report.ended);
        assert!((game.obstacles[0].x - 200.0).abs() < EPS);
        assert!(game.obstacles[0].y.is_finite());
    }

    #[test]
    fn test_rotation_follows_velocity() {
        let entity = Entity {
            x: 0.0,
            y: 0.0,
            velocity: -12.0,
        };
        assert!((entity.rotation_degrees() + 36.0).abs() < EPS);
    }

    #[test]
    fn test_gap_edges() {
        let obstacle = obstacle_at(0.0);
        assert!((obstacle.gap_top() - 100.0).abs() < EPS);
        assert!((obstacle.gap_bottom(120.0) - 220.0).abs() < EPS);
    }
}
