//! Deterministic test-double harness for a load-test orchestration engine.
//!
//! The real engine drives pluggable executors, provisioners, and reporters
//! through a fixed lifecycle (`prepare → startup → check* → shutdown →
//! post_process`) and feeds raw measurement samples into an aggregation
//! pipeline. This crate ships the seams of that system as in-memory
//! doubles so unit tests can exercise orchestration logic with no real
//! processes, sockets, or HTTP:
//!
//! - [`modules::MockModule`] — stands in for any pipeline stage at once,
//!   with per-phase fault injection and call tracking;
//! - [`engine::EngineEmul`] — a wired engine harness with a disposable
//!   artifacts directory and the mock pre-registered;
//! - [`readers`] — fake streaming readers, the ordering-asserting
//!   listener, and a recording aggregator double;
//! - [`net::socket::SocketEmul`] / [`net::cloud::CloudApiMock`] — network
//!   seams without networking.
//!
//! Everything is single-threaded and synchronous: each test owns one
//! harness instance, all injected failures surface as in-line `Result`
//! errors, and nothing is retried or recovered here.

pub mod contract;
pub mod core;
pub mod engine;
pub mod modules;
pub mod net;
pub mod readers;
pub mod samples;

pub use contract::{
    Aggregator, AggregatorListener, EngineContext, EngineModule, ExecutionContext, FileLister,
    FunctionalReader, Phase, Provisioning, Reporter, SamplesReader, ScenarioExecutor,
    ToolInstaller,
};
pub use self::core::config::Configuration;
pub use self::core::errors::{FaultKind, FaultSpec, HarnessError, Result};
pub use engine::EngineEmul;
pub use modules::{MockModule, MockSettings};
pub use net::cloud::{CloudApiMock, CloudResponse, CloudTransport, Fixture, Method};
pub use net::socket::SocketEmul;
pub use readers::{
    CallbackListener, FakeFunctionalReader, FakeSamplesReader, RecordingAggregator,
    SequenceCheckListener,
};
pub use samples::{AggregateRecord, FunctionalSample, FunctionalStatus, Sample, SampleGenerator};
