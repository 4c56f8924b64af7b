//! A tap-to-flap arcade game.
//!
//! [`game::GameLoop`] is the whole simulation; the other modules put it on a
//! terminal with sound.

pub mod config;
pub mod game;
pub mod logging;
pub mod render;
pub mod sound;

pub use config::{Config, Physics};
pub use game::{Action, Bounds, Entity, GameLoop, Obstacle, ObstacleId, TickReport};
