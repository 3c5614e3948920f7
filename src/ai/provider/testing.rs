//! Scripted provider for tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use super::{LlmProvider, LlmResponse, SynthesisRequest};
use crate::types::{Result, WikiError};

type Responder = Box<dyn Fn(&SynthesisRequest) -> Result<String> + Send + Sync>;

/// Answers requests from a closure or a fixed sequence, recording every request
pub struct ScriptedProvider {
    responder: Responder,
    queue: Mutex<VecDeque<Result<String>>>,
    delay: Option<Duration>,
    healthy: bool,
    calls: AtomicUsize,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl ScriptedProvider {
    pub fn new(
        responder: impl Fn(&SynthesisRequest) -> Result<String> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            queue: Mutex::new(VecDeque::new()),
            delay: None,
            healthy: true,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replies in order; once exhausted every call fails
    pub fn sequence(replies: Vec<Result<String>>) -> Self {
        let provider = Self::new(|_| Err(WikiError::LlmApi("script exhausted".to_string())));
        *provider.queue.lock().unwrap() = replies.into();
        provider
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Fail health checks
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<LlmResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let queued = self.queue.lock().unwrap().pop_front();
        let reply = match queued {
            Some(reply) => reply,
            None => (self.responder)(request),
        };
        reply.map(LlmResponse::content_only)
    }

    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.healthy)
    }
}
