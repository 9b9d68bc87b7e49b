//! # Bulwark Core
//!
//! Deterministic real-time simulation core for Bulwark RTS.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO
//! - No system randomness
//! - No floating-point math (uses fixed-point)
//!
//! This separation enables:
//! - Lockstep multiplayer (identical simulation across clients)
//! - Headless server builds
//! - Replay systems
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`entity`] - Generational entity identifiers
//! - [`store`] - Component columns and queries
//! - [`command`] - Deferred structural mutation
//! - [`schedule`] - Staged per-tick system scheduler
//! - [`components`] - Component definitions
//! - [`combat`] - Targeting, healing, abilities, death sweep
//! - [`ballistics`] - Projectile flight and impact
//! - [`visibility`] - Fog-of-war presentation gate
//! - [`spawn`] - Entity factories
//! - [`data`] - Externally supplied unit stats
//! - [`simulation`] - Top-level tick loop
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ballistics;
pub mod combat;
pub mod command;
pub mod components;
pub mod data;
pub mod entity;
pub mod error;
pub mod math;
pub mod schedule;
pub mod simulation;
pub mod spawn;
pub mod store;
pub mod visibility;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::command::{CommandBuffer, SpawnBundle};
    pub use crate::components::*;
    pub use crate::entity::Entity;
    pub use crate::error::{Result, SimError};
    pub use crate::math::{Fixed, Vec3Fixed};
    pub use crate::schedule::{Access, Stage, SystemDef, TickCtx, TickReport};
    pub use crate::simulation::{Collaborators, SimConfig, Simulation, TickOutcome};
    pub use crate::spawn::{spawn_building, spawn_hall, spawn_healer, spawn_ranged_unit};
    pub use crate::store::{Component, EntityCensus, KindId, World};
    pub use crate::visibility::{FogProvider, PresentationBinder, VisibilityClass};
}
