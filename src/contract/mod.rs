//! Trait seams for everything this harness consumes from the external
//! orchestration engine and aggregation pipeline: lifecycle phases, module
//! roles, streaming readers, and listener callbacks.
//!
//! The real implementations live outside this crate; the doubles in
//! [`crate::modules`], [`crate::readers`], and [`crate::engine`] satisfy
//! these contracts for tests.

#![allow(missing_docs)]

use std::path::PathBuf;

use crate::core::config::Configuration;
use crate::core::errors::Result;
use crate::samples::{AggregateRecord, FunctionalSample, Sample};

/// One named step of the orchestration lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Prepare,
    Startup,
    Check,
    Shutdown,
    PostProcess,
}

impl Phase {
    /// Every phase, in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Prepare,
        Self::Startup,
        Self::Check,
        Self::Shutdown,
        Self::PostProcess,
    ];

    /// Stable settings key for the phase.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Prepare => "prepare",
            Self::Startup => "startup",
            Self::Check => "check",
            Self::Shutdown => "shutdown",
            Self::PostProcess => "postproc",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-execution scratch state a module may touch: currently just the list
/// of auxiliary files the execution needs shipped.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    pub files: Vec<PathBuf>,
}

/// The slice of engine state handed to a module during `prepare`.
pub struct EngineContext {
    pub config: Configuration,
    pub aggregator: Option<Box<dyn Aggregator>>,
    pub execution: ExecutionContext,
    pub artifacts_dir: PathBuf,
}

impl EngineContext {
    #[must_use]
    pub fn new(config: Configuration, artifacts_dir: PathBuf) -> Self {
        Self {
            config,
            aggregator: None,
            execution: ExecutionContext::default(),
            artifacts_dir,
        }
    }
}

impl std::fmt::Debug for EngineContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("config", &self.config)
            .field("aggregator", &self.aggregator.is_some())
            .field("execution", &self.execution)
            .field("artifacts_dir", &self.artifacts_dir)
            .finish()
    }
}

/// Lifecycle contract every pipeline module satisfies.
///
/// `check` returns `Ok(true)` once the module considers its work complete;
/// the engine keeps polling until every module reports done.
pub trait EngineModule {
    fn prepare(&mut self, ctx: &mut EngineContext) -> Result<()>;
    fn startup(&mut self) -> Result<()>;
    fn check(&mut self) -> Result<bool>;
    fn shutdown(&mut self) -> Result<()>;
    fn post_process(&mut self) -> Result<()>;
}

/// Marker role: drives one load scenario.
pub trait ScenarioExecutor: EngineModule {}

/// Marker role: decides where and how executors run.
pub trait Provisioning: EngineModule {}

/// Role: consumes results after the run.
pub trait Reporter: EngineModule {
    /// Whether the reporter accumulated anything worth reporting.
    fn has_results(&self) -> bool {
        false
    }
}

/// Role: declares auxiliary files the execution needs shipped.
pub trait FileLister {
    fn resource_files(&mut self, execution: &mut ExecutionContext) -> Vec<PathBuf>;
}

/// Role: installs external tools the module depends on.
pub trait ToolInstaller {
    fn install_required_tools(&mut self) -> Result<()>;
}

/// Streaming source of raw samples, drained by the aggregation pipeline.
///
/// `final_pass` marks the last, flush-oriented read of a run; incremental
/// reads pass `false`.
pub trait SamplesReader {
    fn pop_sample(&mut self, final_pass: bool) -> Option<Sample>;

    /// Callback from the owning pipeline after it emits one aggregated
    /// interval. Readers that carry their own listeners forward the record
    /// to them; the default is a no-op.
    fn interval_complete(&mut self, _record: &AggregateRecord) {}
}

/// Streaming source of pass/fail results, parallel to [`SamplesReader`].
pub trait FunctionalReader {
    fn pop_result(&mut self, final_pass: bool) -> Option<FunctionalSample>;
}

/// Registration point the aggregation pipeline exposes to modules.
pub trait Aggregator {
    fn add_reader(&mut self, reader: Box<dyn SamplesReader>);
}

/// Receives one aggregated record per interval from the pipeline.
pub trait AggregatorListener {
    fn aggregated_interval(&mut self, record: &AggregateRecord);
}
