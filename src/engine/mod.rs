//! The emulated engine: a fully wired harness around the orchestration
//! engine's construction, with a pre-seeded config, an auto-registered
//! mock module, and a disposable artifacts directory.

#![allow(missing_docs)]

use std::collections::BTreeMap;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::json;

use crate::contract::{Aggregator, EngineContext, EngineModule};
use crate::core::config::Configuration;
use crate::core::errors::{FaultSpec, HarnessError, Result};
use crate::modules::MockModule;

/// strftime pattern for the artifacts-dir prefix.
const ARTIFACTS_DIR_FORMAT: &str = "%Y-%m-%d_%H-%M-%S.%f";

/// Registry value recorded for the built-in mock module.
const MOCK_MODULE_PATH: &str = "builtin:mock-module";

/// Test harness around the engine seam: owns the context, a module
/// registry, and the mock module registered under both `mock` and `local`.
///
/// The artifacts directory is created eagerly on construction and never
/// cleaned up here; teardown is the test's responsibility.
pub struct EngineEmul {
    pub ctx: EngineContext,
    /// Module instances in registration order; lifecycle phases drive each
    /// instance exactly once, however many names alias it.
    modules: Vec<Box<dyn EngineModule>>,
    registry: BTreeMap<String, usize>,
    /// Which modules already reported done; finished modules are not
    /// polled again because a drained module reports not-done anew.
    completed: Vec<bool>,
    /// Inspection handle for the auto-registered mock.
    pub mock: MockModule,
    /// Raised by `prepare` instead of delegating, when set by a test.
    pub pending_prepare_fault: Option<FaultSpec>,
    pub was_finalize: bool,
}

impl EngineEmul {
    /// Build the harness under `base_dir`, creating a uniquely named,
    /// timestamp-prefixed artifacts directory inside it.
    pub fn new(base_dir: &Path) -> Result<Self> {
        let mock = MockModule::new();
        let prefix = Local::now().format(ARTIFACTS_DIR_FORMAT).to_string();
        let artifacts_dir = unique_artifacts_dir(base_dir, &prefix)?;

        let mut config = Configuration::new();
        config.merge(json!({
            "provisioning": "local",
            "modules": {
                "mock": MOCK_MODULE_PATH,
                "local": MOCK_MODULE_PATH,
            },
            "settings": {
                "check-updates": false,
                "artifacts-dir": artifacts_dir.display().to_string(),
            },
        }));

        // One shared mock instance aliased under both names, so the
        // lifecycle drives it once.
        let modules: Vec<Box<dyn EngineModule>> = vec![Box::new(mock.clone())];
        let registry = BTreeMap::from([("mock".to_string(), 0), ("local".to_string(), 0)]);

        Ok(Self {
            ctx: EngineContext::new(config, artifacts_dir),
            completed: vec![false; modules.len()],
            modules,
            registry,
            mock,
            pending_prepare_fault: None,
            was_finalize: false,
        })
    }

    /// Wire an aggregation double into the context.
    pub fn set_aggregator(&mut self, aggregator: Box<dyn Aggregator>) {
        self.ctx.aggregator = Some(aggregator);
    }

    /// Register a module under `name`. A fresh name appends to the drive
    /// order; re-registering a known name swaps the instance in its slot,
    /// so every alias of that name follows.
    pub fn add_module(&mut self, name: impl Into<String>, module: Box<dyn EngineModule>) {
        let name = name.into();
        if let Some(&index) = self.registry.get(&name) {
            self.modules[index] = module;
            self.completed[index] = false;
        } else {
            self.registry.insert(name, self.modules.len());
            self.modules.push(module);
            self.completed.push(false);
        }
    }

    #[must_use]
    pub fn module_names(&self) -> Vec<&str> {
        self.registry.keys().map(String::as_str).collect()
    }

    #[must_use]
    pub fn artifacts_dir(&self) -> &Path {
        &self.ctx.artifacts_dir
    }

    /// Serialize the current configuration to a temp file and log its
    /// contents. Side-effecting but diagnostic only; the file is left on
    /// disk and its path returned.
    pub fn dump_config(&self) -> Result<PathBuf> {
        let mut file = tempfile::NamedTempFile::new()
            .map_err(|err| HarnessError::io("<tempfile>", &err))?;
        let text = serde_json::to_string_pretty(&self.ctx.config.as_value())?;
        file.write_all(text.as_bytes())
            .map_err(|err| HarnessError::io(file.path(), &err))?;
        tracing::debug!("JSON:\n{text}");
        file.keep()
            .map(|(_, path)| path)
            .map_err(|err| HarnessError::io("<tempfile>", &err.error))
    }

    /// Raise the pending fault if a test preset one; otherwise prepare
    /// every registered module in registration order, first error wins.
    pub fn prepare(&mut self) -> Result<()> {
        if let Some(fault) = &self.pending_prepare_fault {
            return Err(fault.clone().into_error(crate::contract::Phase::Prepare));
        }
        self.completed = vec![false; self.modules.len()];
        for module in &mut self.modules {
            module.prepare(&mut self.ctx)?;
        }
        Ok(())
    }

    /// Start every registered module in order, first error wins.
    pub fn startup(&mut self) -> Result<()> {
        for module in &mut self.modules {
            module.startup()?;
        }
        Ok(())
    }

    /// One polling pass over every unfinished module; `Ok(true)` once all
    /// of them have reported done.
    pub fn check(&mut self) -> Result<bool> {
        let mut all_done = true;
        for (module, done) in self.modules.iter_mut().zip(self.completed.iter_mut()) {
            if *done {
                continue;
            }
            if module.check()? {
                *done = true;
            } else {
                all_done = false;
            }
        }
        Ok(all_done)
    }

    /// Shutdown then post-process across every module. `was_finalize` is
    /// recorded up front; both phases run on every module even when one
    /// raises, and the first error is surfaced afterwards.
    pub fn finalize(&mut self) -> Result<()> {
        self.was_finalize = true;
        let mut first_err = None;
        for module in &mut self.modules {
            if let Err(err) = module.shutdown() {
                first_err.get_or_insert(err);
            }
            if let Err(err) = module.post_process() {
                first_err.get_or_insert(err);
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// First available of `base/prefix`, `base/prefix-1`, `base/prefix-2`, ...
/// created atomically so concurrent harnesses under one base cannot
/// collide.
fn unique_artifacts_dir(base: &Path, prefix: &str) -> Result<PathBuf> {
    fs::create_dir_all(base).map_err(|err| HarnessError::io(base, &err))?;
    for attempt in 0..10_000u32 {
        let name = if attempt == 0 {
            prefix.to_string()
        } else {
            format!("{prefix}-{attempt}")
        };
        let candidate = base.join(name);
        match fs::create_dir(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(err) => return Err(HarnessError::io(&candidate, &err)),
        }
    }
    Err(HarnessError::Runtime {
        details: format!("could not allocate a unique artifacts dir under {}", base.display()),
    })
}

#[cfg(test)]
mod tests {
    use super::EngineEmul;
    use crate::contract::{Aggregator, Phase, SamplesReader};
    use crate::core::errors::{FaultKind, FaultSpec};
    use crate::modules::MockModule;

    fn harness() -> (tempfile::TempDir, EngineEmul) {
        let base = tempfile::tempdir().expect("tempdir");
        let engine = EngineEmul::new(base.path()).expect("engine builds");
        (base, engine)
    }

    /// Counts reader registrations through a shared handle.
    #[derive(Clone, Default)]
    struct CountingAggregator {
        readers: std::sync::Arc<parking_lot::Mutex<Vec<Box<dyn SamplesReader>>>>,
    }

    impl CountingAggregator {
        fn reader_count(&self) -> usize {
            self.readers.lock().len()
        }
    }

    impl Aggregator for CountingAggregator {
        fn add_reader(&mut self, reader: Box<dyn SamplesReader>) {
            self.readers.lock().push(reader);
        }
    }

    #[test]
    fn construction_seeds_config_and_creates_artifacts_dir() {
        let (_base, engine) = harness();

        assert_eq!(engine.ctx.config.get_str("provisioning"), Some("local"));
        assert_eq!(
            engine.ctx.config.get_bool("settings.check-updates"),
            Some(false)
        );
        assert_eq!(
            engine.ctx.config.get_str("modules.mock"),
            engine.ctx.config.get_str("modules.local")
        );
        assert!(engine.artifacts_dir().is_dir());
        assert_eq!(engine.module_names(), vec!["local", "mock"]);
    }

    #[test]
    fn sibling_harnesses_get_distinct_artifact_dirs() {
        let base = tempfile::tempdir().expect("tempdir");
        let first = EngineEmul::new(base.path()).expect("first engine");
        let second = EngineEmul::new(base.path()).expect("second engine");
        assert_ne!(first.artifacts_dir(), second.artifacts_dir());
        assert!(second.artifacts_dir().is_dir());
    }

    #[test]
    fn prepare_drives_the_registered_mock() {
        let (_base, mut engine) = harness();
        engine.prepare().expect("prepare succeeds");
        assert!(engine.mock.was_prepare());
    }

    #[test]
    fn preset_fault_preempts_delegation() {
        let (_base, mut engine) = harness();
        engine.pending_prepare_fault = Some(FaultSpec::new(FaultKind::Interrupt, "abort"));

        let err = engine.prepare().expect_err("fault raises");
        assert_eq!(err.injected_phase(), Some(Phase::Prepare));
        assert!(!engine.mock.was_prepare());
    }

    #[test]
    fn finalize_sets_flag_even_when_shutdown_faults() {
        let (_base, mut engine) = harness();
        engine.prepare().expect("prepare succeeds");
        engine
            .mock
            .fail_at(Phase::Shutdown, FaultKind::Runtime, "late failure");
        engine.prepare().expect("re-prepare resolves faults");

        let err = engine.finalize().expect_err("shutdown fault surfaces");
        assert_eq!(err.injected_phase(), Some(Phase::Shutdown));
        assert!(engine.was_finalize);
        // post_process still ran after the shutdown fault.
        assert!(engine.mock.was_postproc());
    }

    #[test]
    fn aliased_mock_is_prepared_once() {
        let (_base, mut engine) = harness();
        let aggregator = CountingAggregator::default();
        engine.set_aggregator(Box::new(aggregator.clone()));

        engine.prepare().expect("prepare succeeds");
        // Two names, one instance, one registered reader.
        assert_eq!(engine.module_names(), vec!["local", "mock"]);
        assert_eq!(aggregator.reader_count(), 1);
    }

    #[test]
    fn added_module_is_driven_through_every_phase() {
        let (_base, mut engine) = harness();
        let reporter = MockModule::new();
        engine.add_module("reporter", Box::new(reporter.clone()));

        engine.prepare().expect("prepare");
        engine.startup().expect("startup");
        assert!(!engine.check().expect("first pass"));
        assert!(engine.check().expect("second pass completes both"));
        engine.finalize().expect("finalize");

        for module in [&engine.mock, &reporter] {
            assert!(module.was_prepare());
            assert!(module.was_startup());
            assert!(module.was_check());
            assert!(module.was_shutdown());
            assert!(module.was_postproc());
        }
    }

    #[test]
    fn first_prepare_error_stops_later_modules() {
        let (_base, mut engine) = harness();
        engine
            .mock
            .fail_at(Phase::Prepare, FaultKind::Runtime, "early failure");
        let late = MockModule::new();
        engine.add_module("late", Box::new(late.clone()));

        let err = engine.prepare().expect_err("first module's fault wins");
        assert_eq!(err.injected_phase(), Some(Phase::Prepare));
        assert!(engine.mock.was_prepare());
        assert!(!late.was_prepare());
    }

    #[test]
    fn reregistering_a_name_swaps_the_instance() {
        let (_base, mut engine) = harness();
        let replacement = MockModule::new();
        engine.add_module("mock", Box::new(replacement.clone()));

        engine.prepare().expect("prepare");
        // The replacement sits in the shared slot, so the original handle
        // is no longer driven.
        assert!(replacement.was_prepare());
        assert!(!engine.mock.was_prepare());
        assert_eq!(engine.module_names(), vec!["local", "mock"]);
    }

    #[test]
    fn check_waits_for_the_slowest_module() {
        let (_base, mut engine) = harness();
        let slow = MockModule::new();
        slow.configure(|settings| settings.check_iterations = Some(4));
        engine.add_module("slow", Box::new(slow));

        engine.prepare().expect("prepare");
        let results: Vec<bool> = (0..4).map(|_| engine.check().expect("check")).collect();
        // The default mock finishes on pass 2; the engine reports done
        // only when the four-iteration module does.
        assert_eq!(results, vec![false, false, false, true]);
    }

    #[test]
    fn dump_config_writes_readable_json() {
        let (_base, engine) = harness();
        let path = engine.dump_config().expect("dump succeeds");
        let text = std::fs::read_to_string(&path).expect("dump readable");
        assert!(text.contains("provisioning"));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn full_lifecycle_reaches_every_flag() {
        let (_base, mut engine) = harness();
        engine.prepare().expect("prepare");
        engine.startup().expect("startup");
        let mut done = false;
        for _ in 0..16 {
            if engine.check().expect("check") {
                done = true;
                break;
            }
        }
        assert!(done, "default iterations complete within bound");
        engine.finalize().expect("finalize");

        assert!(engine.mock.was_prepare());
        assert!(engine.mock.was_startup());
        assert!(engine.mock.was_check());
        assert!(engine.mock.was_shutdown());
        assert!(engine.mock.was_postproc());
        assert!(engine.was_finalize);
    }
}
