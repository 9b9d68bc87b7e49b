//! Top-level simulation façade.
//!
//! [`Simulation`] owns the world, the command buffer, and the built
//! schedule, and advances them one fixed tick at a time. External
//! collaborators (fog queries, presentation bindings) are borrowed per
//! tick rather than owned, so the core stays free of rendering and IO.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use crate::ballistics::ballistics_system;
use crate::combat::{ability_system, healing_system, health_sweep_system, targeting_system};
use crate::command::CommandBuffer;
use crate::components::{
    AbilityState, BuildingTag, CombatState, FactionId, HealerState, Health, Projectile, Transform,
};
use crate::data::{StatProvider, StatTable};
use crate::entity::Entity;
use crate::error::Result;
use crate::math::{Fixed, Vec3Fixed};
use crate::schedule::{Access, Schedule, ScheduleBuilder, Stage, SystemDef, TickCtx, TickReport};
use crate::spawn;
use crate::store::{EntityCensus, World};
use crate::visibility::{visibility_gate_system, FogProvider, PresentationBinder, VisibilityClass};

/// Default simulation rate, ticks per second.
pub const DEFAULT_TICK_RATE: u32 = 20;

/// Static simulation configuration.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Whether projectiles damage same-faction targets. Self-damage is
    /// always excluded regardless.
    pub friendly_fire: bool,
    /// Ticks per second; fixes the per-tick `dt`.
    pub tick_rate: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            friendly_fire: false,
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

/// Per-tick borrowed collaborators.
///
/// All fields are optional; a system that needs a missing one skips its
/// work and the skip shows up in the tick report.
#[derive(Default)]
pub struct Collaborators<'a> {
    /// Fog-of-war queries for the visibility gate.
    pub fog: Option<&'a dyn FogProvider>,
    /// Presentation binding sink for the visibility gate.
    pub binder: Option<&'a mut (dyn PresentationBinder + 'static)>,
    /// Faction from whose point of view visibility is classified.
    pub observer: FactionId,
}

/// Everything one tick produced.
#[derive(Debug)]
pub struct TickOutcome {
    /// Faults and barrier activity.
    pub report: TickReport,
    /// Visibility classifications from the presentation stage.
    pub visibility: Vec<(Entity, VisibilityClass)>,
}

/// Build the standard system schedule.
///
/// Simulation stage: targeting, healing, and abilities (abilities share a
/// batch with targeting; healing conflicts on `Health` and runs after).
/// End-of-simulation stage: ballistics, then the death sweep. Presentation
/// stage: the visibility gate. A command barrier follows each stage.
pub fn default_schedule() -> Result<Schedule> {
    ScheduleBuilder::new()
        .add(SystemDef::new(
            "targeting",
            Stage::Simulation,
            Access::new()
                .read::<Transform>()
                .read::<FactionId>()
                .read::<Health>()
                .write::<CombatState>(),
            targeting_system,
        ))
        .add(SystemDef::new(
            "healing",
            Stage::Simulation,
            Access::new()
                .read::<Transform>()
                .read::<FactionId>()
                .write::<HealerState>()
                .write::<Health>(),
            healing_system,
        ))
        .add(SystemDef::new(
            "abilities",
            Stage::Simulation,
            Access::new().write::<AbilityState>(),
            ability_system,
        ))
        .add(SystemDef::new(
            "ballistics",
            Stage::EndOfSimulation,
            Access::new()
                .read::<FactionId>()
                .write::<Transform>()
                .write::<Projectile>()
                .write::<Health>(),
            ballistics_system,
        ))
        .add(
            SystemDef::new(
                "health_sweep",
                Stage::EndOfSimulation,
                Access::new().read::<Health>(),
                health_sweep_system,
            )
            .after("ballistics"),
        )
        .add(SystemDef::new(
            "visibility_gate",
            Stage::Presentation,
            Access::new()
                .read::<Transform>()
                .read::<FactionId>()
                .read::<BuildingTag>(),
            visibility_gate_system,
        ))
        .build()
}

/// The deterministic simulation core.
///
/// Advance with [`Simulation::tick`]; identical initial state and tick
/// sequences produce identical [`Simulation::state_hash`] values.
pub struct Simulation {
    world: World,
    schedule: Schedule,
    commands: CommandBuffer,
    config: SimConfig,
    stats: Option<StatTable>,
    tick: u64,
    time: Fixed,
}

impl Simulation {
    /// Create a simulation with the standard schedule.
    pub fn new(config: SimConfig) -> Result<Self> {
        Ok(Self {
            world: World::new(),
            schedule: default_schedule()?,
            commands: CommandBuffer::new(),
            config,
            stats: None,
            tick: 0,
            time: Fixed::ZERO,
        })
    }

    /// Install a unit stat table; spawns from then on consult it.
    #[must_use]
    pub fn with_stats(mut self, stats: StatTable) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Read access to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for setup and orders.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Ticks advanced so far.
    #[must_use]
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Simulation time in seconds.
    #[must_use]
    pub fn time(&self) -> Fixed {
        self.time
    }

    /// Per-tick duration derived from the configured tick rate.
    #[must_use]
    pub fn dt(&self) -> Fixed {
        Fixed::from_num(1) / Fixed::from_num(self.config.tick_rate.max(1))
    }

    /// The planned system batches, for inspection and tooling.
    #[must_use]
    pub fn plan(&self) -> Vec<(Stage, Vec<Vec<&str>>)> {
        self.schedule.plan()
    }

    /// Spawn a ranged unit of `kind` using the installed stat table.
    pub fn spawn_unit(&mut self, kind: &str, faction: FactionId, position: Vec3Fixed) -> Entity {
        let stats = self.stats.as_ref().map(|s| s as &dyn StatProvider);
        spawn::spawn_ranged_unit(&mut self.world, kind, faction, position, stats)
    }

    /// Spawn a healer using the installed stat table.
    pub fn spawn_healer(&mut self, faction: FactionId, position: Vec3Fixed) -> Entity {
        let stats = self.stats.as_ref().map(|s| s as &dyn StatProvider);
        spawn::spawn_healer(&mut self.world, faction, position, stats)
    }

    /// Spawn a building using the installed stat table.
    pub fn spawn_building(
        &mut self,
        kind: &str,
        faction: FactionId,
        position: Vec3Fixed,
    ) -> Entity {
        let stats = self.stats.as_ref().map(|s| s as &dyn StatProvider);
        spawn::spawn_building(&mut self.world, kind, faction, position, stats)
    }

    /// Spawn a faction hall using the installed stat table.
    pub fn spawn_hall(&mut self, faction: FactionId, position: Vec3Fixed) -> Entity {
        let stats = self.stats.as_ref().map(|s| s as &dyn StatProvider);
        spawn::spawn_hall(&mut self.world, faction, position, stats)
    }

    /// Advance one tick at the configured rate.
    pub fn tick(&mut self, collaborators: Collaborators<'_>) -> TickOutcome {
        let dt = self.dt();
        self.tick_with_dt(dt, collaborators)
    }

    /// Advance one tick of explicit duration `dt` seconds.
    pub fn tick_with_dt(&mut self, dt: Fixed, collaborators: Collaborators<'_>) -> TickOutcome {
        let mut ctx = TickCtx {
            dt,
            time: self.time,
            tick: self.tick,
            friendly_fire: self.config.friendly_fire,
            commands: &self.commands,
            stats: self.stats.as_ref().map(|s| s as &dyn StatProvider),
            fog: collaborators.fog,
            observer: collaborators.observer,
            binder: collaborators.binder,
            visibility: Vec::new(),
        };
        let report = self.schedule.run_tick(&mut self.world, &mut ctx);
        let visibility = std::mem::take(&mut ctx.visibility);
        drop(ctx);

        self.tick += 1;
        self.time += dt;
        TickOutcome { report, visibility }
    }

    /// Entity counts by kind marker.
    #[must_use]
    pub fn census(&self) -> EntityCensus {
        self.world.census()
    }

    /// Order-independent hash of the observable simulation state.
    ///
    /// Covers entity identities, positions, health, and the tick counter.
    /// Two runs from the same setup hash identically tick for tick, which
    /// is the lockstep-replay check.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.tick.hash(&mut hasher);
        self.world.len().hash(&mut hasher);
        for entity in self.world.entities_with::<Transform>() {
            entity.hash(&mut hasher);
            if let Some(t) = self.world.get::<Transform>(entity) {
                t.position.x.to_bits().hash(&mut hasher);
                t.position.y.to_bits().hash(&mut hasher);
                t.position.z.to_bits().hash(&mut hasher);
            }
        }
        for entity in self.world.entities_with::<Health>() {
            entity.hash(&mut hasher);
            if let Some(h) = self.world.get::<Health>(entity) {
                h.current.hash(&mut hasher);
                h.max.hash(&mut hasher);
            }
        }
        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(x: f64, z: f64) -> Vec3Fixed {
        Vec3Fixed::new(Fixed::from_num(x), Fixed::ZERO, Fixed::from_num(z))
    }

    struct OmniscientFog;

    impl FogProvider for OmniscientFog {
        fn is_visible(&self, _: FactionId, _: Vec3Fixed) -> bool {
            true
        }
        fn is_revealed(&self, _: FactionId, _: Vec3Fixed) -> bool {
            true
        }
    }

    fn seen_all<'a>(fog: &'a OmniscientFog) -> Collaborators<'a> {
        Collaborators {
            fog: Some(fog),
            binder: None,
            observer: FactionId(1),
        }
    }

    #[test]
    fn test_plan_batches_disjoint_simulation_systems() {
        let sim = Simulation::new(SimConfig::default()).expect("schedule builds");
        let plan = sim.plan();

        let (stage, batches) = &plan[0];
        assert_eq!(*stage, Stage::Simulation);
        // Targeting and abilities are disjoint and share the first batch;
        // healing conflicts on Health and lands in the second.
        assert_eq!(batches[0], vec!["targeting", "abilities"]);
        assert_eq!(batches[1], vec!["healing"]);

        let (stage, batches) = &plan[1];
        assert_eq!(*stage, Stage::EndOfSimulation);
        assert_eq!(batches[0], vec!["ballistics"]);
        assert_eq!(batches[1], vec!["health_sweep"]);
    }

    #[test]
    fn test_skirmish_kills_lone_target() {
        let fog = OmniscientFog;
        let mut sim = Simulation::new(SimConfig::default()).expect("sim");
        sim.spawn_unit("archer", FactionId(1), pos(0.0, 0.0));
        let victim = sim.spawn_unit("archer", FactionId(2), pos(8.0, 0.0));
        // Disarm the victim so the fight is one-sided
        sim.world_mut()
            .get_mut::<CombatState>(victim)
            .expect("state")
            .damage = 0;

        // 60 hp at 8 damage per 2 s cooldown: well under 30 s of fighting
        for _ in 0..600 {
            sim.tick(seen_all(&fog));
            if !sim.world().is_alive(victim) {
                break;
            }
        }
        assert!(!sim.world().is_alive(victim));
    }

    #[test]
    fn test_identical_runs_hash_identically() {
        let build = || {
            let mut sim = Simulation::new(SimConfig::default()).expect("sim");
            sim.spawn_unit("archer", FactionId(1), pos(0.0, 0.0));
            sim.spawn_unit("archer", FactionId(2), pos(8.0, 0.0));
            sim.spawn_healer(FactionId(1), pos(-2.0, 0.0));
            sim.spawn_hall(FactionId(2), pos(20.0, 0.0));
            sim
        };

        let fog = OmniscientFog;
        let mut a = build();
        let mut b = build();
        for _ in 0..100 {
            a.tick(seen_all(&fog));
            b.tick(seen_all(&fog));
            assert_eq!(a.state_hash(), b.state_hash());
        }
    }

    #[test]
    fn test_missing_fog_reported_not_fatal() {
        let mut sim = Simulation::new(SimConfig::default()).expect("sim");
        sim.spawn_unit("archer", FactionId(1), pos(0.0, 0.0));

        let outcome = sim.tick(Collaborators::default());
        assert!(!outcome.report.is_clean());
        assert_eq!(outcome.report.faults.len(), 1);
        assert_eq!(outcome.report.faults[0].system, "visibility_gate");
        // The simulation itself kept going
        assert_eq!(sim.current_tick(), 1);
    }

    #[test]
    fn test_time_and_tick_advance() {
        // Power-of-two tick rate: dt is exactly representable, so 16 ticks
        // sum to exactly one second
        let mut sim = Simulation::new(SimConfig {
            friendly_fire: false,
            tick_rate: 16,
        })
        .expect("sim");

        let fog = OmniscientFog;
        for _ in 0..16 {
            sim.tick(seen_all(&fog));
        }
        assert_eq!(sim.current_tick(), 16);
        assert_eq!(sim.time(), Fixed::from_num(1));
    }
}
