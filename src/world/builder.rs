#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::engine::SoftwareEngine;
use crate::ffi::Engine;
use crate::math::Vec3;
use crate::solver::{ContactSolverInfo, SolverType};

use super::{DynamicsWorld, WorldType};

/// Plain world settings, loadable from a file with the `serde` feature.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct WorldConfig {
    pub world_type: WorldType,
    pub gravity: Vec3,
    pub solver: SolverType,
    pub threads: usize,
    pub solver_info: ContactSolverInfo,
}

impl Default for WorldConfig {
    fn default() -> Self {
        WorldConfig {
            world_type: WorldType::Discrete,
            gravity: [0.0, -10.0, 0.0],
            solver: SolverType::SequentialImpulse,
            threads: 1,
            solver_info: ContactSolverInfo::default(),
        }
    }
}

/// ```
/// use dynamics_world::{DynamicsWorld, SolverType, WorldType};
///
/// let mut world = DynamicsWorld::builder()
///     .world_type(WorldType::Simple)
///     .gravity([0.0, 0.0, -9.8])
///     .solver(SolverType::Nncg)
///     .debug("demo")
///     .build();
///
/// assert_eq!(WorldType::Simple, world.world_type().unwrap());
/// assert_eq!(SolverType::Nncg, world.constraint_solver().unwrap().solver_type());
/// ```
#[derive(Debug, Clone, Default)]
pub struct WorldBuilder {
    config: WorldConfig,
    debug: Option<&'static str>,
}

impl WorldBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: WorldConfig) -> Self {
        WorldBuilder {
            config,
            debug: None,
        }
    }

    pub fn world_type(mut self, world_type: WorldType) -> Self {
        self.config.world_type = world_type;
        self
    }

    pub fn gravity(mut self, gravity: Vec3) -> Self {
        self.config.gravity = gravity;
        self
    }

    pub fn solver(mut self, solver: SolverType) -> Self {
        self.config.solver = solver;
        self
    }

    pub fn solver_info(mut self, info: ContactSolverInfo) -> Self {
        self.config.solver_info = info;
        self
    }

    pub fn threads(mut self, th: usize) -> Self {
        self.config.threads = th;
        self
    }

    /// Sets the number of threads to the number of CPUs available in the system.
    pub fn max_threads(mut self) -> Self {
        self.config.threads = num_cpus::get();
        self
    }

    pub fn debug(mut self, name: &'static str) -> Self {
        self.debug = Some(name);
        self
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn build(self) -> DynamicsWorld {
        let engine = SoftwareEngine::new(self.config.world_type);
        self.build_with(engine)
    }

    /// Builds a world on top of `engine`. The world type is the engine's own; every other
    /// setting is applied to it.
    pub fn build_with<E: Engine>(self, mut engine: E) -> DynamicsWorld<E> {
        let WorldBuilder { config, debug } = self;

        engine.set_gravity(config.gravity);
        engine.set_threads(config.threads);

        let current = engine.constraint_solver();
        if engine.solver_type(current) != config.solver {
            let solver = engine.create_constraint_solver(config.solver);
            engine.set_constraint_solver(solver);
        }
        engine.solver_info().set(config.solver_info);

        DynamicsWorld::with_debug(engine, debug)
    }
}
