//! Simulation setup and the two run loops.
//!
//! [`Simulation::new`] turns a [`SimulationConfig`] into a generated world
//! and a registered team. [`Simulation::run`] then drives the team in the
//! configured mode:
//!
//! - **Lockstep**: the deterministic round-robin of [`crate::tick`].
//! - **Concurrent**: one tokio task per agent. The environment sits behind
//!   a `tokio::sync::Mutex`; maps travel over a `tokio::sync::broadcast`
//!   channel. A receiver that falls behind logs the gap and carries on,
//!   since the next snapshot from the same peer supersedes the lost ones.
//!
//! Both loops stop at `max_ticks` or once every agent is done or dead.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{Mutex, broadcast};
use tokio::sync::broadcast::error::TryRecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use wumpus_agents::{Agent, AgentError, AgentStatus};
use wumpus_types::{AgentId, Location};
use wumpus_world::{Grid, WorldError};

use crate::config::{ConfigError, RunConfig, RunMode, SimulationConfig};
use crate::environment::{Environment, EnvironmentError};
use crate::report::{EndReason, RunInfo, SimulationReport};
use crate::tick::{Lockstep, TickError};

/// Errors that can occur while setting up or running a simulation.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// The configuration is unusable.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },

    /// The world could not be built or populated.
    #[error("environment error: {source}")]
    Environment {
        /// The underlying environment error.
        #[from]
        source: EnvironmentError,
    },

    /// A lockstep tick failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// An agent task failed in concurrent mode.
    #[error("agent error for {agent_id}: {source}")]
    Agent {
        /// The agent that failed.
        agent_id: AgentId,
        /// The underlying agent error.
        source: AgentError,
    },

    /// An agent task panicked or was cancelled.
    #[error("agent task failed to join: {source}")]
    Join {
        /// The underlying join error.
        #[from]
        source: tokio::task::JoinError,
    },

    /// The final maps could not be merged for the report.
    #[error("report error: {source}")]
    Report {
        /// The underlying map error.
        #[from]
        source: WorldError,
    },
}

/// A map published by one agent to the rest of the team.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// The publisher.
    pub from: AgentId,
    /// The publisher's map at the time of publishing.
    pub grid: Arc<Grid>,
}

/// A configured world and team, ready to run.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    environment: Environment,
    agents: Vec<Agent>,
}

impl Simulation {
    /// Generate the world and register the team described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if the configuration is invalid, or
    /// [`RunnerError::Environment`] if the world cannot be generated.
    pub fn new(config: SimulationConfig) -> Result<Self, RunnerError> {
        config.validate()?;
        let starts: Vec<Location> = config.agents.roster.iter().map(|a| a.start).collect();
        let environment = Environment::generate(&config.world, &starts)?;
        Self::with_environment(config, environment)
    }

    /// Register the team described by `config` in a prepared world.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Environment`] if an agent cannot be placed.
    pub fn with_environment(
        config: SimulationConfig,
        mut environment: Environment,
    ) -> Result<Self, RunnerError> {
        let bounds = environment.bounds();
        let agents: Vec<Agent> = config
            .agent_configs()
            .iter()
            .map(|c| Agent::new(c, bounds, config.inference))
            .collect();
        for agent in &agents {
            environment.register(agent.id(), agent.location(), agent.kit().ammo)?;
            info!(
                agent = %agent.id(),
                name = agent.name(),
                kind = ?agent.kind(),
                at = %agent.location(),
                "agent registered"
            );
        }
        Ok(Self {
            config,
            environment,
            agents,
        })
    }

    /// The team, in roster order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// The ground-truth world.
    pub const fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Run in the configured mode.
    ///
    /// # Errors
    ///
    /// Propagates agent, tick, join, and report failures.
    pub async fn run(self) -> Result<SimulationReport, RunnerError> {
        match self.config.simulation.mode {
            RunMode::Lockstep => self.run_lockstep(),
            RunMode::Concurrent => self.run_concurrent().await,
        }
    }

    /// Run the deterministic lockstep loop.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Tick`] if an agent fails its turn.
    pub fn run_lockstep(self) -> Result<SimulationReport, RunnerError> {
        let started_at = Utc::now();
        let Self {
            config,
            mut environment,
            agents,
        } = self;
        let max_ticks = config.simulation.max_ticks;
        info!(agents = agents.len(), max_ticks, "lockstep run starting");

        let mut lockstep = Lockstep::new(agents);
        while lockstep.tick() < max_ticks && !lockstep.all_finished() {
            lockstep.run_tick(&mut environment)?;
        }

        let run = RunInfo {
            mode: RunMode::Lockstep,
            seed: config.world.seed,
            started_at,
            ticks: lockstep.tick(),
            end_reason: end_reason(lockstep.all_finished()),
        };
        let report = SimulationReport::build(&run, &environment, lockstep.agents())?;
        info!(
            ticks = report.ticks,
            gold = report.gold_deposited,
            monsters = report.monsters_killed,
            deaths = report.deaths,
            "lockstep run finished"
        );
        Ok(report)
    }

    /// Run one tokio task per agent until every agent stops.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Agent`] if an agent fails, or
    /// [`RunnerError::Join`] if a task cannot be joined.
    pub async fn run_concurrent(self) -> Result<SimulationReport, RunnerError> {
        let started_at = Utc::now();
        let Self {
            config,
            environment,
            agents,
        } = self;
        let run_config = config.simulation.clone();
        info!(
            agents = agents.len(),
            max_ticks = run_config.max_ticks,
            "concurrent run starting"
        );

        let environment = Arc::new(Mutex::new(environment));
        let (tx, _) = broadcast::channel::<Snapshot>(run_config.channel_capacity.max(1));
        // Subscribe everyone before anyone can publish.
        let receivers: Vec<broadcast::Receiver<Snapshot>> =
            agents.iter().map(|_| tx.subscribe()).collect();

        let handles: Vec<JoinHandle<Result<(Agent, u64), RunnerError>>> = agents
            .into_iter()
            .zip(receivers)
            .map(|(agent, rx)| {
                tokio::spawn(drive(
                    agent,
                    Arc::clone(&environment),
                    tx.clone(),
                    rx,
                    run_config.clone(),
                ))
            })
            .collect();
        drop(tx);

        let mut agents = Vec::with_capacity(handles.len());
        let mut ticks = 0_u64;
        for handle in handles {
            let (agent, cycles) = handle.await??;
            ticks = ticks.max(cycles);
            agents.push(agent);
        }

        let environment = match Arc::try_unwrap(environment) {
            Ok(mutex) => mutex.into_inner(),
            Err(shared) => shared.lock().await.clone(),
        };
        let run = RunInfo {
            mode: RunMode::Concurrent,
            seed: config.world.seed,
            started_at,
            ticks,
            end_reason: end_reason(agents.iter().all(|a| a.status().is_terminal())),
        };
        let report = SimulationReport::build(&run, &environment, &agents)?;
        info!(
            ticks = report.ticks,
            gold = report.gold_deposited,
            monsters = report.monsters_killed,
            deaths = report.deaths,
            "concurrent run finished"
        );
        Ok(report)
    }
}

const fn end_reason(all_finished: bool) -> EndReason {
    if all_finished {
        EndReason::AllAgentsFinished
    } else {
        EndReason::MaxTicksReached
    }
}

/// One agent's loop in concurrent mode. Returns the agent and its cycles.
async fn drive(
    mut agent: Agent,
    environment: Arc<Mutex<Environment>>,
    tx: broadcast::Sender<Snapshot>,
    mut rx: broadcast::Receiver<Snapshot>,
    run: RunConfig,
) -> Result<(Agent, u64), RunnerError> {
    let agent_id = agent.id();
    let interval = Duration::from_millis(run.tick_interval_ms);
    let mut cycles = 0_u64;

    while cycles < run.max_ticks && !agent.status().is_terminal() {
        loop {
            match rx.try_recv() {
                Ok(snapshot) if snapshot.from != agent_id => {
                    agent
                        .absorb(&snapshot.grid)
                        .map_err(|source| RunnerError::Agent { agent_id, source })?;
                }
                Ok(_) => {}
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(agent = %agent_id, skipped, "map broadcast lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        let report = {
            let mut world = environment.lock().await;
            let report = agent.step(&mut *world);
            if report.as_ref().is_ok_and(|r| r.status == AgentStatus::Done) {
                world.retire(agent_id);
            }
            report
        }
        .map_err(|source| RunnerError::Agent { agent_id, source })?;
        cycles = cycles.saturating_add(1);

        let sent = report
            .snapshot
            .map(|grid| tx.send(Snapshot { from: agent_id, grid }));
        if matches!(sent, Some(Err(_))) {
            debug!(agent = %agent_id, "no peers listening");
        }

        if interval.is_zero() {
            tokio::task::yield_now().await;
        } else {
            tokio::time::sleep(interval).await;
        }
    }

    debug!(agent = %agent_id, cycles, status = ?agent.status(), "agent loop finished");
    Ok((agent, cycles))
}
