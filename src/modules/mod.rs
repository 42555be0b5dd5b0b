//! The pluggable mock module: one object that stands in for any pipeline
//! stage at once (executor, provisioner, reporter, file-lister,
//! tool-installer), with per-phase fault injection and call tracking.

#![allow(missing_docs)]

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::contract::{
    EngineContext, EngineModule, ExecutionContext, FileLister, Phase, Provisioning, Reporter,
    ScenarioExecutor, ToolInstaller,
};
use crate::core::errors::{FaultKind, FaultSpec, HarnessError, Result};
use crate::readers::FakeSamplesReader;
use crate::samples::SampleGenerator;

/// Default number of `check` calls before the module reports done.
pub const DEFAULT_CHECK_ITERATIONS: u64 = 2;

/// Upper bound (exclusive) on samples synthesized per interval.
const BURST_CAP: usize = 10;

/// Marker path the mock declares from `resource_files`.
pub const RESOURCE_MARKER: &str = "mock-module.resource";

/// Per-phase fault descriptors, one optional slot per lifecycle phase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseFaults {
    slots: [Option<FaultSpec>; 5],
}

impl PhaseFaults {
    fn index(phase: Phase) -> usize {
        match phase {
            Phase::Prepare => 0,
            Phase::Startup => 1,
            Phase::Check => 2,
            Phase::Shutdown => 3,
            Phase::PostProcess => 4,
        }
    }

    pub fn set(&mut self, phase: Phase, spec: FaultSpec) {
        self.slots[Self::index(phase)] = Some(spec);
    }

    #[must_use]
    pub fn get(&self, phase: Phase) -> Option<&FaultSpec> {
        self.slots[Self::index(phase)].as_ref()
    }

    /// Reject descriptors with empty messages; a blank message almost
    /// always means the descriptor was built from a missing settings value.
    fn validate(&self) -> Result<()> {
        for phase in Phase::ALL {
            if let Some(spec) = self.get(phase) {
                if spec.message.is_empty() {
                    return Err(HarnessError::InvalidSettings {
                        details: format!("empty fault message for phase {phase}"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Configuration consumed by [`MockModule::prepare`].
#[derive(Debug, Clone, Default)]
pub struct MockSettings {
    /// Overrides both the default and any engine-config value when set.
    pub check_iterations: Option<u64>,
    pub faults: PhaseFaults,
    pub has_results: bool,
    /// Seed for the synthesized sample batch; OS entropy when unset.
    pub sample_seed: Option<u64>,
}

#[derive(Debug)]
struct MockState {
    settings: MockSettings,
    // Resolved once per prepare(), immutable for the rest of the run.
    prepared: PhaseFaults,
    remaining_checks: u64,
    was_prepare: bool,
    was_startup: bool,
    was_check: bool,
    was_shutdown: bool,
    was_postproc: bool,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            settings: MockSettings::default(),
            prepared: PhaseFaults::default(),
            // Effectively "never completes" until prepare() resolves the
            // real iteration count.
            remaining_checks: u64::MAX,
            was_prepare: false,
            was_startup: false,
            was_check: false,
            was_shutdown: false,
            was_postproc: false,
        }
    }
}

/// Clone-able handle over shared mock state: register one clone with the
/// engine, keep another for post-hoc assertions.
#[derive(Clone, Default)]
pub struct MockModule {
    inner: Arc<Mutex<MockState>>,
}

impl MockModule {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_settings(settings: MockSettings) -> Self {
        let module = Self::new();
        module.inner.lock().settings = settings;
        module
    }

    /// Tweak settings before the lifecycle runs.
    pub fn configure(&self, tweak: impl FnOnce(&mut MockSettings)) {
        tweak(&mut self.inner.lock().settings);
    }

    /// Register a fault descriptor for one phase.
    pub fn fail_at(&self, phase: Phase, kind: FaultKind, message: impl Into<String>) {
        self.inner
            .lock()
            .settings
            .faults
            .set(phase, FaultSpec::new(kind, message));
    }

    #[must_use]
    pub fn was_prepare(&self) -> bool {
        self.inner.lock().was_prepare
    }

    #[must_use]
    pub fn was_startup(&self) -> bool {
        self.inner.lock().was_startup
    }

    #[must_use]
    pub fn was_check(&self) -> bool {
        self.inner.lock().was_check
    }

    #[must_use]
    pub fn was_shutdown(&self) -> bool {
        self.inner.lock().was_shutdown
    }

    #[must_use]
    pub fn was_postproc(&self) -> bool {
        self.inner.lock().was_postproc
    }

    #[must_use]
    pub fn remaining_checks(&self) -> u64 {
        self.inner.lock().remaining_checks
    }

    fn resolve_iterations(state: &MockState, ctx: &EngineContext) -> u64 {
        state
            .settings
            .check_iterations
            .or_else(|| ctx.config.get_u64("modules.mock.check-iterations"))
            .unwrap_or(DEFAULT_CHECK_ITERATIONS)
    }
}

impl EngineModule for MockModule {
    /// Resolves the fault registry and iteration count, synthesizes a
    /// sample batch into the aggregator when one is wired, and only then
    /// raises the prepared `prepare` fault. Setup is deliberately not
    /// rolled back on that failure.
    fn prepare(&mut self, ctx: &mut EngineContext) -> Result<()> {
        tracing::info!("preparing mock");
        let mut state = self.inner.lock();
        state.was_prepare = true;

        state.settings.faults.validate()?;
        state.prepared = state.settings.faults.clone();
        state.remaining_checks = Self::resolve_iterations(&state, ctx);

        if let Some(aggregator) = ctx.aggregator.as_mut() {
            let mut generator = match state.settings.sample_seed {
                Some(seed) => SampleGenerator::seeded(seed),
                None => SampleGenerator::from_entropy(),
            };
            let mut reader = FakeSamplesReader::new();
            let intervals = usize::try_from(state.remaining_checks).unwrap_or(usize::MAX);
            for interval in 0..intervals {
                reader.extend(generator.burst_at(interval, BURST_CAP));
            }
            tracing::debug!(queued = reader.len(), intervals, "registering mock reader");
            aggregator.add_reader(Box::new(reader));
        }

        match state.prepared.get(Phase::Prepare) {
            Some(spec) => Err(spec.clone().into_error(Phase::Prepare)),
            None => Ok(()),
        }
    }

    fn startup(&mut self) -> Result<()> {
        tracing::info!("startup mock");
        let mut state = self.inner.lock();
        state.was_startup = true;
        match state.prepared.get(Phase::Startup) {
            Some(spec) => Err(spec.clone().into_error(Phase::Startup)),
            None => Ok(()),
        }
    }

    /// `Ok(false)` until the configured iteration count is exhausted; at
    /// the terminal call the prepared `check` fault wins over `Ok(true)`.
    fn check(&mut self) -> Result<bool> {
        let mut state = self.inner.lock();
        state.was_check = true;
        tracing::info!(remaining = state.remaining_checks, "mock check");
        // Wraps past zero, so calls after the terminal one report not-done
        // again instead of re-signaling completion.
        state.remaining_checks = state.remaining_checks.wrapping_sub(1);
        if state.remaining_checks == 0 {
            return match state.prepared.get(Phase::Check) {
                Some(spec) => Err(spec.clone().into_error(Phase::Check)),
                None => Ok(true),
            };
        }
        Ok(false)
    }

    fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutdown mock");
        let mut state = self.inner.lock();
        state.was_shutdown = true;
        match state.prepared.get(Phase::Shutdown) {
            Some(spec) => Err(spec.clone().into_error(Phase::Shutdown)),
            None => Ok(()),
        }
    }

    fn post_process(&mut self) -> Result<()> {
        tracing::info!("postproc mock");
        let mut state = self.inner.lock();
        state.was_postproc = true;
        match state.prepared.get(Phase::PostProcess) {
            Some(spec) => Err(spec.clone().into_error(Phase::PostProcess)),
            None => Ok(()),
        }
    }
}

impl ScenarioExecutor for MockModule {}
impl Provisioning for MockModule {}

impl Reporter for MockModule {
    fn has_results(&self) -> bool {
        self.inner.lock().settings.has_results
    }
}

impl FileLister for MockModule {
    fn resource_files(&mut self, execution: &mut ExecutionContext) -> Vec<PathBuf> {
        let marker = PathBuf::from(RESOURCE_MARKER);
        execution.files.push(marker.clone());
        vec![marker]
    }
}

impl ToolInstaller for MockModule {
    fn install_required_tools(&mut self) -> Result<()> {
        tracing::debug!("all required tools present");
        Ok(())
    }
}
