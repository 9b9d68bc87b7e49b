//! Per-tick system scheduler.
//!
//! Systems are statically registered with an ordering stage, declared
//! read/write component-kind sets, and optional `runs after` constraints.
//! At build time the scheduler plans each stage into batches: systems with
//! disjoint access sets share a batch (they are data-independent and may be
//! fanned out), systems that conflict fall into later batches in
//! declaration order. The plan is the parallelism contract; execution runs
//! batches in plan order, which keeps every tick deterministic.
//!
//! Command-buffer playback happens at the barrier after each stage, so all
//! structural changes a stage produced are visible to the next stage. One
//! `run_tick` covers all stages; ticks never overlap.
//!
//! A system returning `Err` is isolated: the fault is logged and recorded
//! in the [`TickReport`] and the remaining systems run unaffected.

use crate::command::CommandBuffer;
use crate::components::FactionId;
use crate::data::StatProvider;
use crate::entity::Entity;
use crate::error::{Result, SimError};
use crate::math::Fixed;
use crate::store::{Component, KindId, World};
use crate::visibility::{FogProvider, PresentationBinder, VisibilityClass};

/// Ordering group for systems.
///
/// Stages run in declaration order of this enum; a command barrier sits
/// after every stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Main simulation work: targeting, healing, abilities.
    Simulation,
    /// Work that must observe the simulation barrier: ballistics, death
    /// sweep.
    EndOfSimulation,
    /// Read-only presentation classification; runs last.
    Presentation,
}

impl Stage {
    const ALL: [Stage; 3] = [Stage::Simulation, Stage::EndOfSimulation, Stage::Presentation];
}

/// Declared component access of a system.
#[derive(Debug, Clone, Default)]
pub struct Access {
    reads: Vec<KindId>,
    writes: Vec<KindId>,
}

impl Access {
    /// No declared access (always conflict-free).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a read of component kind `T`.
    #[must_use]
    pub fn read<T: Component>(mut self) -> Self {
        self.reads.push(KindId::of::<T>());
        self
    }

    /// Declare a write of component kind `T`.
    #[must_use]
    pub fn write<T: Component>(mut self) -> Self {
        self.writes.push(KindId::of::<T>());
        self
    }

    /// Whether two access sets cannot safely run in the same batch.
    ///
    /// Conflicts are write-write and read-write overlaps; shared reads are
    /// fine.
    #[must_use]
    pub fn conflicts_with(&self, other: &Self) -> bool {
        let hits = |a: &[KindId], b: &[KindId]| a.iter().any(|k| b.contains(k));
        hits(&self.writes, &other.writes)
            || hits(&self.writes, &other.reads)
            || hits(&self.reads, &other.writes)
    }
}

/// Per-tick context handed to every system.
///
/// Carries the tick clock, the shared command buffer, and the external
/// collaborators. Collaborators are optional: a system that needs a
/// missing one skips its work for the tick (reported, not fatal).
pub struct TickCtx<'a> {
    /// Tick duration, seconds.
    pub dt: Fixed,
    /// Simulation time at the start of this tick, seconds.
    pub time: Fixed,
    /// Tick counter.
    pub tick: u64,
    /// Global friendly-fire policy.
    pub friendly_fire: bool,
    /// Shared deferred-mutation log; flushed at stage barriers.
    pub commands: &'a CommandBuffer,
    /// Unit stat lookup (spawn-time data; systems rarely need it).
    pub stats: Option<&'a dyn StatProvider>,
    /// Fog-of-war queries for the visibility gate.
    pub fog: Option<&'a dyn FogProvider>,
    /// Faction from whose point of view visibility is classified.
    pub observer: FactionId,
    /// Presentation binding sink for the visibility gate. The trait object
    /// itself is `'static`; only the borrow is tick-scoped.
    pub binder: Option<&'a mut (dyn PresentationBinder + 'static)>,
    /// Classifications the visibility gate emitted this tick.
    pub visibility: Vec<(Entity, VisibilityClass)>,
}

/// Boxed system function.
pub type SystemFn = Box<dyn FnMut(&mut World, &mut TickCtx<'_>) -> Result<()> + Send>;

/// A registered system: name, stage, access declaration, ordering
/// constraints, and the function to run.
pub struct SystemDef {
    name: String,
    stage: Stage,
    access: Access,
    after: Vec<String>,
    run: SystemFn,
}

impl SystemDef {
    /// Define a system.
    pub fn new(
        name: &str,
        stage: Stage,
        access: Access,
        run: impl FnMut(&mut World, &mut TickCtx<'_>) -> Result<()> + Send + 'static,
    ) -> Self {
        Self {
            name: name.to_owned(),
            stage,
            access,
            after: Vec::new(),
            run: Box::new(run),
        }
    }

    /// Constrain this system to run after the named one.
    #[must_use]
    pub fn after(mut self, predecessor: &str) -> Self {
        self.after.push(predecessor.to_owned());
        self
    }
}

/// A fault reported by one system during a tick.
#[derive(Debug)]
pub struct SystemFault {
    /// Name of the failing system.
    pub system: String,
    /// The error it returned.
    pub error: SimError,
}

/// Outcome of one tick: faults and barrier activity.
#[derive(Debug, Default)]
pub struct TickReport {
    /// Tick this report covers.
    pub tick: u64,
    /// Isolated system faults (empty on a clean tick).
    pub faults: Vec<SystemFault>,
    /// Structural operations applied across all barriers.
    pub commands_applied: usize,
}

impl TickReport {
    /// Whether every system completed without error.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Builder for a [`Schedule`].
#[derive(Default)]
pub struct ScheduleBuilder {
    systems: Vec<SystemDef>,
}

impl ScheduleBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a system.
    #[must_use]
    pub fn add(mut self, system: SystemDef) -> Self {
        self.systems.push(system);
        self
    }

    /// Validate registrations and plan stage batches.
    pub fn build(self) -> Result<Schedule> {
        // Reject duplicate names and dangling `after` references up front
        for (i, sys) in self.systems.iter().enumerate() {
            if self.systems[..i].iter().any(|s| s.name == sys.name) {
                return Err(SimError::DuplicateSystem(sys.name.clone()));
            }
        }
        for sys in &self.systems {
            for after in &sys.after {
                let Some(pred) = self.systems.iter().find(|s| s.name == *after) else {
                    return Err(SimError::UnknownOrderingTarget {
                        system: sys.name.clone(),
                        after: after.clone(),
                    });
                };
                // `after` only orders within a stage; across stages the
                // stage sequence already decides
                if pred.stage != sys.stage {
                    return Err(SimError::CrossStageOrdering {
                        system: sys.name.clone(),
                        after: after.clone(),
                    });
                }
            }
        }

        let mut stages = Vec::new();
        for stage in Stage::ALL {
            let members: Vec<usize> = self
                .systems
                .iter()
                .enumerate()
                .filter(|(_, s)| s.stage == stage)
                .map(|(i, _)| i)
                .collect();

            // Greedy batch assignment in declaration order: earliest batch
            // with no access conflict and after all same-stage predecessors.
            let mut batches: Vec<Vec<usize>> = Vec::new();
            let mut batch_of: Vec<(usize, usize)> = Vec::new();
            for &idx in &members {
                let sys = &self.systems[idx];
                let min_batch = sys
                    .after
                    .iter()
                    .filter_map(|name| {
                        let pred = self.systems.iter().position(|s| s.name == *name)?;
                        let &(_, b) = batch_of.iter().find(|(i, _)| *i == pred)?;
                        Some(b + 1)
                    })
                    .max()
                    .unwrap_or(0);

                let mut placed = None;
                for (b, batch) in batches.iter().enumerate().skip(min_batch) {
                    let clash = batch
                        .iter()
                        .any(|&other| self.systems[other].access.conflicts_with(&sys.access));
                    if !clash {
                        placed = Some(b);
                        break;
                    }
                }
                let b = match placed {
                    Some(b) => b,
                    None => {
                        batches.push(Vec::new());
                        batches.len() - 1
                    }
                };
                batches[b].push(idx);
                batch_of.push((idx, b));
            }

            stages.push(StagePlan { stage, batches });
        }

        Ok(Schedule {
            systems: self.systems,
            stages,
        })
    }
}

/// Planned batches for one stage.
struct StagePlan {
    stage: Stage,
    batches: Vec<Vec<usize>>,
}

/// A built, runnable schedule.
pub struct Schedule {
    systems: Vec<SystemDef>,
    stages: Vec<StagePlan>,
}

impl Schedule {
    /// The planned batches per stage, by system name.
    ///
    /// Systems sharing an inner vec are data-independent; this is the
    /// contract parallel execution relies on.
    #[must_use]
    pub fn plan(&self) -> Vec<(Stage, Vec<Vec<&str>>)> {
        self.stages
            .iter()
            .map(|plan| {
                let batches = plan
                    .batches
                    .iter()
                    .map(|batch| {
                        batch
                            .iter()
                            .map(|&i| self.systems[i].name.as_str())
                            .collect()
                    })
                    .collect();
                (plan.stage, batches)
            })
            .collect()
    }

    /// Run one full tick: every stage, every batch, with a command barrier
    /// after each stage.
    pub fn run_tick(&mut self, world: &mut World, ctx: &mut TickCtx<'_>) -> TickReport {
        let mut report = TickReport {
            tick: ctx.tick,
            ..TickReport::default()
        };

        for stage_idx in 0..self.stages.len() {
            let batches = self.stages[stage_idx].batches.clone();
            for batch in batches {
                for idx in batch {
                    let sys = &mut self.systems[idx];
                    if let Err(error) = (sys.run)(world, ctx) {
                        tracing::warn!(
                            system = %sys.name,
                            tick = ctx.tick,
                            %error,
                            "system fault isolated; remaining systems continue"
                        );
                        report.faults.push(SystemFault {
                            system: sys.name.clone(),
                            error,
                        });
                    }
                }
            }
            // Stage barrier: structural changes become visible here
            report.commands_applied += ctx.commands.playback(world);
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{Health, Transform};

    fn noop() -> impl FnMut(&mut World, &mut TickCtx<'_>) -> Result<()> + Send {
        |_, _| Ok(())
    }

    fn ctx<'a>(commands: &'a CommandBuffer) -> TickCtx<'a> {
        TickCtx {
            dt: Fixed::from_num(0.05),
            time: Fixed::ZERO,
            tick: 0,
            friendly_fire: false,
            commands,
            stats: None,
            fog: None,
            observer: FactionId(0),
            binder: None,
            visibility: Vec::new(),
        }
    }

    #[test]
    fn test_disjoint_systems_share_a_batch() {
        let schedule = ScheduleBuilder::new()
            .add(SystemDef::new(
                "a",
                Stage::Simulation,
                Access::new().write::<Health>(),
                noop(),
            ))
            .add(SystemDef::new(
                "b",
                Stage::Simulation,
                Access::new().write::<Transform>(),
                noop(),
            ))
            .build()
            .expect("valid schedule");

        let plan = schedule.plan();
        let (_, batches) = &plan[0];
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0], vec!["a", "b"]);
    }

    #[test]
    fn test_write_conflict_splits_batches_in_declaration_order() {
        let schedule = ScheduleBuilder::new()
            .add(SystemDef::new(
                "first",
                Stage::Simulation,
                Access::new().write::<Health>(),
                noop(),
            ))
            .add(SystemDef::new(
                "second",
                Stage::Simulation,
                Access::new().read::<Health>(),
                noop(),
            ))
            .build()
            .expect("valid schedule");

        let plan = schedule.plan();
        let (_, batches) = &plan[0];
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec!["first"]);
        assert_eq!(batches[1], vec!["second"]);
    }

    #[test]
    fn test_after_constraint_orders_batches() {
        let schedule = ScheduleBuilder::new()
            .add(SystemDef::new(
                "early",
                Stage::Simulation,
                Access::new().read::<Health>(),
                noop(),
            ))
            .add(
                SystemDef::new(
                    "late",
                    Stage::Simulation,
                    Access::new().read::<Transform>(),
                    noop(),
                )
                .after("early"),
            )
            .build()
            .expect("valid schedule");

        let plan = schedule.plan();
        let (_, batches) = &plan[0];
        // Disjoint access, but the explicit constraint forces a later batch
        assert_eq!(batches.len(), 2);
        assert_eq!(batches[0], vec!["early"]);
        assert_eq!(batches[1], vec!["late"]);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let result = ScheduleBuilder::new()
            .add(SystemDef::new("same", Stage::Simulation, Access::new(), noop()))
            .add(SystemDef::new("same", Stage::Simulation, Access::new(), noop()))
            .build();
        assert!(matches!(result, Err(SimError::DuplicateSystem(_))));
    }

    #[test]
    fn test_unknown_after_target_rejected() {
        let result = ScheduleBuilder::new()
            .add(
                SystemDef::new("lonely", Stage::Simulation, Access::new(), noop())
                    .after("missing"),
            )
            .build();
        assert!(matches!(result, Err(SimError::UnknownOrderingTarget { .. })));
    }

    #[test]
    fn test_cross_stage_after_rejected() {
        let result = ScheduleBuilder::new()
            .add(SystemDef::new(
                "early",
                Stage::Simulation,
                Access::new(),
                noop(),
            ))
            .add(
                SystemDef::new("late", Stage::EndOfSimulation, Access::new(), noop())
                    .after("early"),
            )
            .build();
        assert!(matches!(result, Err(SimError::CrossStageOrdering { .. })));
    }

    #[test]
    fn test_fault_is_isolated_and_reported() {
        use std::sync::atomic::{AtomicBool, Ordering};
        use std::sync::Arc;

        let ran_after = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran_after);

        let mut schedule = ScheduleBuilder::new()
            .add(SystemDef::new(
                "faulty",
                Stage::Simulation,
                Access::new(),
                |_, _| Err(SimError::InvalidState("boom".into())),
            ))
            .add(SystemDef::new(
                "healthy",
                Stage::Simulation,
                Access::new(),
                move |_, _| {
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                },
            ))
            .build()
            .expect("valid schedule");

        let mut world = World::new();
        let commands = CommandBuffer::new();
        let mut ctx = ctx(&commands);

        let report = schedule.run_tick(&mut world, &mut ctx);
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].system, "faulty");
        assert!(ran_after.load(Ordering::SeqCst));
    }

    #[test]
    fn test_barrier_flushes_between_stages() {
        use crate::command::SpawnBundle;
        use crate::components::UnitTag;
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let seen = Arc::new(AtomicUsize::new(usize::MAX));
        let seen_in_later_stage = Arc::clone(&seen);

        let mut schedule = ScheduleBuilder::new()
            .add(SystemDef::new(
                "producer",
                Stage::Simulation,
                Access::new(),
                |_, ctx: &mut TickCtx<'_>| {
                    ctx.commands.spawn(SpawnBundle::new().with(UnitTag));
                    Ok(())
                },
            ))
            .add(SystemDef::new(
                "consumer",
                Stage::EndOfSimulation,
                Access::new().read::<UnitTag>(),
                move |world: &mut World, _: &mut TickCtx<'_>| {
                    seen_in_later_stage
                        .store(world.entities_with::<UnitTag>().len(), Ordering::SeqCst);
                    Ok(())
                },
            ))
            .build()
            .expect("valid schedule");

        let mut world = World::new();
        let commands = CommandBuffer::new();
        let mut ctx = ctx(&commands);

        let report = schedule.run_tick(&mut world, &mut ctx);
        assert!(report.is_clean());
        // The spawn from Simulation crossed the barrier before EndOfSimulation
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(report.commands_applied, 1);
    }
}
