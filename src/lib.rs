//! Deterministic chess rule engine with a move-history controller.
//!
//! The [`engine`] module holds the rules: move generation, legality, special
//! moves, draw detection and the [`engine::Game`] controller that hosts
//! drive. [`config`] reads the console host's settings.

pub mod config;
pub mod engine;
