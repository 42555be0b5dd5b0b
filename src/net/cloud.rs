//! Request/response double for the cloud API transport: fixtures keyed by
//! exact method + URL, an append-only request log, and pre-seeded canned
//! bodies for the API surface the client exercises on startup.

#![allow(missing_docs)]

use std::collections::{HashMap, VecDeque};

use serde_json::{Value, json};

use crate::core::errors::{FaultKind, FaultSpec, HarnessError, Result};

/// Base URL of the emulated cloud API.
pub const API_BASE: &str = "https://a.cloudtest.example/api/v4";

/// HTTP method of an emulated call. Only GET/POST/PATCH carry fixture
/// tables; anything else is a hard configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Put,
    Delete,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// One canned outcome: a JSON body served with status 200, or a fault
/// raised instead of responding.
#[derive(Debug, Clone)]
pub enum CannedOutcome {
    Body(Value),
    Fail(FaultSpec),
}

/// A registered fixture: one outcome served on every call, or an ordered
/// series consumed front-to-back (pagination, polling). Consulting an
/// exhausted series is a fixture bug and surfaces as a hard error.
#[derive(Debug, Clone)]
pub enum Fixture {
    Single(CannedOutcome),
    Series(VecDeque<CannedOutcome>),
}

impl Fixture {
    /// A body served on every call.
    #[must_use]
    pub fn body(value: Value) -> Self {
        Self::Single(CannedOutcome::Body(value))
    }

    /// A fault raised on every call.
    #[must_use]
    pub fn fault(kind: FaultKind, message: impl Into<String>) -> Self {
        Self::Single(CannedOutcome::Fail(FaultSpec::new(kind, message)))
    }

    /// Distinct bodies for successive calls, consumed front-to-back.
    #[must_use]
    pub fn series(bodies: impl IntoIterator<Item = Value>) -> Self {
        Self::Series(bodies.into_iter().map(CannedOutcome::Body).collect())
    }

    /// Mixed series of bodies and faults.
    #[must_use]
    pub fn outcomes(outcomes: impl IntoIterator<Item = CannedOutcome>) -> Self {
        Self::Series(outcomes.into_iter().collect())
    }
}

/// One observed call, logged whether or not the response succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub payload: Option<Value>,
}

/// Emulated HTTP response: status 200 with a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudResponse {
    pub status: u16,
    pub body: String,
}

impl CloudResponse {
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

/// The transport seam of the cloud API client. The real client sends HTTP;
/// [`CloudApiMock`] serves canned fixtures instead.
pub trait CloudTransport {
    fn request(
        &mut self,
        method: Method,
        url: &str,
        payload: Option<Value>,
    ) -> Result<CloudResponse>;
}

/// Fixture-table transport double with an append-only request log.
pub struct CloudApiMock {
    get: HashMap<String, Fixture>,
    post: HashMap<String, Fixture>,
    patch: HashMap<String, Fixture>,
    requests: Vec<RecordedRequest>,
}

impl Default for CloudApiMock {
    fn default() -> Self {
        Self::new()
    }
}

impl CloudApiMock {
    /// A mock pre-seeded with the GET surface the client walks on startup:
    /// version, user, accounts, workspaces, test lookups, projects, the
    /// file browser, and workspace locations.
    #[must_use]
    pub fn new() -> Self {
        let locations = json!([
            {"id": "aws", "sandbox": false, "title": "AWS"},
            {"id": "us-east-1", "sandbox": false, "title": "East"},
            {"id": "us-west", "sandbox": false, "title": "West"},
            {"id": "sandbox", "sandbox": true, "title": "Sandbox"},
            {"id": "sandbox-stale", "sandbox": true, "title": "Sandbox Missing"},
        ]);

        let mut mock = Self::unseeded();
        let seeds = [
            (format!("{API_BASE}/web/version"), json!({})),
            (
                format!("{API_BASE}/user"),
                json!({"defaultProject": {"id": null}}),
            ),
            (
                format!("{API_BASE}/accounts"),
                json!({"result": [{"id": 1}]}),
            ),
            (
                format!("{API_BASE}/workspaces?accountId=1&enabled=true&limit=100"),
                json!({"result": [{"id": 1, "enabled": true}]}),
            ),
            (
                format!("{API_BASE}/multi-tests?workspaceId=1&name=Harness+Cloud+Test"),
                json!({"result": []}),
            ),
            (
                format!("{API_BASE}/tests?workspaceId=1&name=Harness+Cloud+Test"),
                json!({"result": []}),
            ),
            (
                format!("{API_BASE}/projects?workspaceId=1&limit=99999"),
                json!({"result": []}),
            ),
            // Lookup is by exact string, so both query-parameter orderings
            // the client is known to emit need entries.
            (
                format!("{API_BASE}/web/files/1?cmd=open&target=root"),
                json!({"files": []}),
            ),
            (
                format!("{API_BASE}/web/files/1?target=root&cmd=open"),
                json!({"files": []}),
            ),
            (
                format!("{API_BASE}/workspaces/1"),
                json!({"result": {"locations": locations}}),
            ),
        ];
        for (url, body) in seeds {
            mock.get.insert(url, Fixture::body(body));
        }
        mock
    }

    /// A mock with empty fixture tables.
    #[must_use]
    pub fn unseeded() -> Self {
        Self {
            get: HashMap::new(),
            post: HashMap::new(),
            patch: HashMap::new(),
            requests: Vec::new(),
        }
    }

    pub fn expect_get(&mut self, url: impl Into<String>, fixture: Fixture) {
        self.get.insert(url.into(), fixture);
    }

    pub fn expect_post(&mut self, url: impl Into<String>, fixture: Fixture) {
        self.post.insert(url.into(), fixture);
    }

    pub fn expect_patch(&mut self, url: impl Into<String>, fixture: Fixture) {
        self.patch.insert(url.into(), fixture);
    }

    /// Every call observed so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> &[RecordedRequest] {
        &self.requests
    }
}

impl CloudTransport for CloudApiMock {
    /// Logs the call, then resolves the fixture by exact URL. The log
    /// entry lands before any failure, so misses, exhausted series, and
    /// canned faults all stay observable by the test.
    fn request(
        &mut self,
        method: Method,
        url: &str,
        payload: Option<Value>,
    ) -> Result<CloudResponse> {
        self.requests.push(RecordedRequest {
            method,
            url: url.to_string(),
            payload: payload.clone(),
        });

        let table = match method {
            Method::Get => &mut self.get,
            Method::Post => &mut self.post,
            Method::Patch => &mut self.patch,
            Method::Put | Method::Delete => {
                return Err(HarnessError::UnsupportedMethod {
                    method: method.to_string(),
                });
            }
        };

        let fixture = table.get_mut(url).ok_or_else(|| HarnessError::UnmatchedUrl {
            method: method.to_string(),
            url: url.to_string(),
        })?;

        let outcome = match fixture {
            Fixture::Single(outcome) => outcome.clone(),
            Fixture::Series(queue) => {
                queue.pop_front().ok_or_else(|| HarnessError::ExhaustedFixture {
                    url: url.to_string(),
                })?
            }
        };

        tracing::debug!(%method, url, ?payload, "emulated request");
        match outcome {
            CannedOutcome::Fail(spec) => Err(spec.into_canned()),
            CannedOutcome::Body(body) => Ok(CloudResponse {
                status: 200,
                body: serde_json::to_string(&body)?,
            }),
        }
    }
}
