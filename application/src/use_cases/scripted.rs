//! Scripted fakes shared by the use case tests.

use crate::ports::model_service::{ModelError, ModelReply, ModelRequest, ModelService};
use crate::ports::toolbox::Toolbox;
use async_trait::async_trait;
use conclave_domain::{Action, ModelId, Observation};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A scripted model reply
#[derive(Debug, Clone)]
pub(crate) enum ScriptedResponse {
    Text(String),
    Error(ModelError),
}

pub(crate) fn text(s: &str) -> ScriptedResponse {
    ScriptedResponse::Text(s.to_string())
}

pub(crate) fn fail(s: &str) -> ScriptedResponse {
    ScriptedResponse::Error(ModelError::RequestFailed(s.to_string()))
}

/// Model service that answers every call from one queue, in call order.
///
/// Once the script runs out every call fails.
pub(crate) struct ScriptedModel {
    responses: Mutex<VecDeque<ScriptedResponse>>,
    requests: Mutex<Vec<ModelRequest>>,
    cost_per_call: f64,
    unavailable: Vec<ModelId>,
    latency: Option<Duration>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl ScriptedModel {
    pub(crate) fn new(responses: Vec<ScriptedResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            cost_per_call: 0.01,
            unavailable: Vec::new(),
            latency: None,
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Hold every call open for `latency` before answering.
    pub(crate) fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Most calls that were ever open at the same time.
    pub(crate) fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn with_cost(mut self, cost: f64) -> Self {
        self.cost_per_call = cost;
        self
    }

    pub(crate) fn with_unavailable(mut self, model: &str) -> Self {
        self.unavailable.push(ModelId::new(model));
        self
    }

    pub(crate) fn requests(&self) -> Vec<ModelRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl ModelService for ScriptedModel {
    async fn ask(&self, request: ModelRequest) -> Result<ModelReply, ModelError> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| ModelId::new("scripted"));
        self.requests.lock().unwrap().push(request);
        let open = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(open, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(ScriptedResponse::Text(t)) => Ok(ModelReply::new(t, model, self.cost_per_call)),
            Some(ScriptedResponse::Error(e)) => Err(e),
            None => Err(ModelError::RequestFailed("script exhausted".to_string())),
        }
    }

    fn is_available(&self, model: &ModelId) -> bool {
        !self.unavailable.contains(model)
    }
}

/// Toolbox that records dispatched actions and replays scripted observations.
pub(crate) struct RecordingToolbox {
    calls: Mutex<Vec<Action>>,
    observations: Mutex<VecDeque<Observation>>,
}

impl RecordingToolbox {
    pub(crate) fn new() -> Self {
        Self::with_observations(Vec::new())
    }

    pub(crate) fn with_observations(observations: Vec<Observation>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            observations: Mutex::new(observations.into()),
        }
    }

    pub(crate) fn calls(&self) -> Vec<Action> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Toolbox for RecordingToolbox {
    fn capabilities(&self) -> Vec<&'static str> {
        vec!["read_file", "write_file", "list_dir", "shell", "search"]
    }

    async fn dispatch(&self, action: &Action) -> Observation {
        self.calls.lock().unwrap().push(action.clone());
        self.observations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Observation::ok(format!("ok: {}", action)))
    }
}
