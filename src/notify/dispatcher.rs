use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::oneshot;
use tracing::{debug, error};

use crate::config::store::ChannelConfigStore;
use crate::notify::channel::{ChannelKind, NotifierBackend, precheck};
use crate::notify::email::EmailBackend;
use crate::notify::outcome::{FailureKind, Outcome};
use crate::notify::request::NotificationRequest;
use crate::notify::slack::SlackApiBackend;
use crate::notify::webhook::SlackWebhookBackend;

/// Outcome per channel kind, iterated in [`ChannelKind`] order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    outcomes: BTreeMap<ChannelKind, Outcome>,
}

impl DispatchReport {
    pub fn get(&self, kind: ChannelKind) -> Option<&Outcome> {
        self.outcomes.get(&kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ChannelKind, &Outcome)> {
        self.outcomes.iter().map(|(kind, outcome)| (*kind, outcome))
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub(crate) fn insert(&mut self, kind: ChannelKind, outcome: Outcome) {
        self.outcomes.insert(kind, outcome);
    }
}

/// Backends available to the dispatcher, at most one per kind.
#[derive(Default)]
pub struct BackendRegistry {
    backends: BTreeMap<ChannelKind, Arc<dyn NotifierBackend>>,
}

impl BackendRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Email, Slack API and Slack webhook backends with their network transports.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EmailBackend::new()));
        registry.register(Arc::new(SlackApiBackend::new()));
        registry.register(Arc::new(SlackWebhookBackend::new()));
        registry
    }

    /// Adds `backend`, replacing any backend of the same kind.
    pub fn register(&mut self, backend: Arc<dyn NotifierBackend>) -> &mut Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    pub fn kinds(&self) -> impl Iterator<Item = ChannelKind> + '_ {
        self.backends.keys().copied()
    }
}

pub struct Dispatcher {
    registry: BackendRegistry,
}

impl Dispatcher {
    pub fn new(registry: BackendRegistry) -> Self {
        Self { registry }
    }

    /// Runs every enabled, targeted backend concurrently and waits for all of them.
    ///
    /// Disabled and untargeted channels are resolved up front without touching their
    /// backend. Each launched backend reports through its own oneshot; a task that ends
    /// without reporting is recorded as an internal failure.
    pub async fn dispatch(
        &self,
        request: NotificationRequest,
        store: &ChannelConfigStore,
    ) -> DispatchReport {
        let request = Arc::new(request);
        let mut report = DispatchReport::default();
        let mut pending = Vec::new();

        for (kind, backend) in &self.registry.backends {
            let kind = *kind;
            let config = store.get(kind);
            let recipients = request.recipients(kind);

            if let Some(outcome) = precheck(kind, recipients, &config) {
                debug!(channel = %kind, outcome = ?outcome, "Channel skipped");
                report.insert(kind, outcome);
                continue;
            }

            let (tx, rx) = oneshot::channel();
            let backend = Arc::clone(backend);
            let request = Arc::clone(&request);
            tokio::spawn(async move {
                let outcome = backend
                    .attempt(&request, request.recipients(kind), &config)
                    .await;
                let _ = tx.send(outcome);
            });
            debug!(channel = %kind, "Channel launched");
            pending.push((kind, rx));
        }

        for (kind, rx) in pending {
            let outcome = rx.await.unwrap_or_else(|_| {
                error!(channel = %kind, "Backend task ended without reporting");
                Outcome::failed(FailureKind::Internal, "backend task ended without a result")
            });
            report.insert(kind, outcome);
        }

        report
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(BackendRegistry::with_defaults())
    }
}
