use crate::api::{ApiError, DeviceConfigApi};
use crate::config_sync::draft::DraftEdit;
use crate::config_sync::synchronizer::{
    ConfigSnapshot, ConfigSynchronizer, MutationKind, MutationOutcome, MutationRequest, MutationResponse,
};
use crate::debounce::Debounce;
use crate::domain::{DeviceConfig, DeviceId};
use crate::notifications::Notifier;
use crate::resolver::{Generation, Lookup, ResolutionState};
use crate::screen::{CONNECTION_FAILURE, ScreenClosed, ScreenSettings};
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver, UnboundedSender};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigScreenEvent {
    /// Full content of the identifier field after a keystroke.
    IdentifierTyped(String),
    Edit(DraftEdit),
    Submit,
    Reset,
    Delete,
    Close,
}

#[derive(Debug)]
enum Completion {
    Lookup {
        generation: Generation,
        result: Result<Option<DeviceConfig>, ApiError>,
    },
    Mutation {
        generation: Generation,
        result: Result<MutationResponse, ApiError>,
    },
}

/// Handle to a running configuration screen. Dropping it tears the screen down.
#[derive(Debug)]
pub struct ConfigScreenHandle {
    events: mpsc::Sender<ConfigScreenEvent>,
    snapshots: watch::Receiver<ConfigSnapshot>,
    task: JoinHandle<()>,
}

impl ConfigScreenHandle {
    pub async fn send(&self, event: ConfigScreenEvent) -> Result<(), ScreenClosed> {
        self.events.send(event).await.map_err(|_| ScreenClosed)
    }

    pub fn snapshots(&self) -> watch::Receiver<ConfigSnapshot> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> ConfigSnapshot {
        self.snapshots.borrow().clone()
    }

    pub async fn close(self) {
        // Fails only if the screen already stopped
        self.events.send(ConfigScreenEvent::Close).await.ok();
        if let Err(e) = self.task.await {
            warn!("⚠️ Configuration screen stopped abnormally: {}", e);
        }
    }
}

#[derive(Debug)]
pub struct ConfigScreen {
    api: Arc<dyn DeviceConfigApi>,
    notifier: Notifier,
    synchronizer: ConfigSynchronizer,
    debounce: Debounce<String>,
    events: Receiver<ConfigScreenEvent>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    snapshots: watch::Sender<ConfigSnapshot>,
}

impl ConfigScreen {
    pub fn spawn(api: Arc<dyn DeviceConfigApi>, notifier: Notifier, settings: ScreenSettings) -> ConfigScreenHandle {
        let (events_tx, events) = mpsc::channel(settings.event_buffer_size.get());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(ConfigSnapshot::default());

        let screen = ConfigScreen {
            api,
            notifier,
            synchronizer: ConfigSynchronizer::new(),
            debounce: Debounce::new(settings.debounce),
            events,
            completions_tx,
            completions_rx,
            snapshots,
        };

        ConfigScreenHandle {
            events: events_tx,
            snapshots: snapshots_rx,
            task: tokio::spawn(screen.run()),
        }
    }

    #[instrument(name = "config_screen", skip_all)]
    async fn run(mut self) {
        debug!("Configuration screen opened");
        loop {
            // User events first so a close is handled before any pending completion
            tokio::select! {
                biased;
                event = self.events.recv() => match event {
                    Some(ConfigScreenEvent::Close) | None => break,
                    Some(event) => self.handle_event(event),
                },
                Some(completion) = self.completions_rx.recv() => self.handle_completion(completion),
                _ = self.debounce.quiesced() => self.commit_settled_identifier(),
            }
            self.publish();
        }

        self.debounce.cancel();
        self.synchronizer.tear_down();
        debug!("Configuration screen closed");
    }

    fn handle_event(&mut self, event: ConfigScreenEvent) {
        match event {
            ConfigScreenEvent::IdentifierTyped(raw) => self.debounce.push(raw, Instant::now()),
            ConfigScreenEvent::Edit(edit) => self.synchronizer.edit(edit),
            ConfigScreenEvent::Submit => match self.synchronizer.submit() {
                Ok(mutation) => self.spawn_mutation(mutation.generation, mutation.request),
                Err(error) => {
                    debug!("Rejected configuration: {}", error);
                    self.notifier.failure("Invalid configuration", error.to_string());
                }
            },
            ConfigScreenEvent::Reset => match self.synchronizer.reset() {
                Some(mutation) => self.spawn_mutation(mutation.generation, mutation.request),
                None => debug!("Reset is only offered for an existing configuration"),
            },
            ConfigScreenEvent::Delete => match self.synchronizer.delete() {
                Some(mutation) => self.spawn_mutation(mutation.generation, mutation.request),
                None => debug!("Delete is only offered for an existing configuration"),
            },
            ConfigScreenEvent::Close => {}
        }
    }

    fn commit_settled_identifier(&mut self) {
        let Some(raw) = self.debounce.poll(Instant::now()) else {
            return;
        };

        let device_id = DeviceId::parse(&raw);
        if device_id.is_none() {
            debug!("Identifier cleared");
        }
        if let Some(lookup) = self.synchronizer.commit(device_id) {
            self.spawn_lookup(lookup);
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Lookup { generation, result } => {
                if !self.synchronizer.complete_lookup(generation, result) {
                    return;
                }
                match self.synchronizer.resolution() {
                    ResolutionState::Found(device_id, _) => {
                        info!(device_id = %device_id, "🔎 Looking up configuration... OK, editing existing configuration")
                    }
                    ResolutionState::NotFound(device_id) => {
                        info!(device_id = %device_id, "🔎 Looking up configuration... OK, creating a new configuration")
                    }
                    ResolutionState::Failed(device_id, reason) => {
                        warn!(device_id = %device_id, "🔎 Looking up configuration... failed, {}", reason);
                        self.notifier.failure("Connection failure", CONNECTION_FAILURE);
                    }
                    _ => {}
                }
            }
            Completion::Mutation { generation, result } => match self.synchronizer.complete_mutation(generation, result) {
                MutationOutcome::Applied(kind) => {
                    info!(?kind, "💾 Configuration mutation... OK");
                    let (title, message) = success_text(kind);
                    self.notifier.success(title, message);
                }
                MutationOutcome::Failed(kind, error) => {
                    warn!(?kind, "💾 Configuration mutation... failed, {}", error);
                    self.notifier.failure(failure_title(kind), CONNECTION_FAILURE);
                }
                MutationOutcome::Discarded => {}
            },
        }
    }

    fn spawn_lookup(&self, lookup: Lookup<DeviceId>) {
        info!(device_id = %lookup.key, generation = %lookup.generation, "🔎 Looking up configuration...");
        let api = Arc::clone(&self.api);
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let result = api.fetch(&lookup.key).await;
            // The screen may be gone by now
            completions.send(Completion::Lookup { generation: lookup.generation, result }).ok();
        });
    }

    fn spawn_mutation(&self, generation: Generation, request: MutationRequest) {
        info!(kind = ?request.kind(), %generation, "💾 Configuration mutation...");
        let api = Arc::clone(&self.api);
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let result = send_mutation(api.as_ref(), request).await;
            completions.send(Completion::Mutation { generation, result }).ok();
        });
    }

    fn publish(&self) {
        let snapshot = self.synchronizer.snapshot();
        self.snapshots.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }
}

async fn send_mutation(api: &dyn DeviceConfigApi, request: MutationRequest) -> Result<MutationResponse, ApiError> {
    match request {
        MutationRequest::Create(body) => api.create(&body).await.map(MutationResponse::Saved),
        MutationRequest::Update(body) => api.update(&body).await.map(MutationResponse::Saved),
        MutationRequest::Reset(device_id) => api.reset(&device_id).await.map(MutationResponse::Saved),
        MutationRequest::Delete(device_id) => api.delete(&device_id).await.map(|_| MutationResponse::Deleted),
    }
}

fn success_text(kind: MutationKind) -> (&'static str, &'static str) {
    match kind {
        MutationKind::Create => ("Configuration created", "The device configuration was created."),
        MutationKind::Update => ("Configuration saved", "The device configuration was updated."),
        MutationKind::Reset => ("Configuration reset", "Default values were restored."),
        MutationKind::Delete => ("Configuration deleted", "The device configuration was removed."),
    }
}

fn failure_title(kind: MutationKind) -> &'static str {
    match kind {
        MutationKind::Create | MutationKind::Update => "Saving failed",
        MutationKind::Reset => "Reset failed",
        MutationKind::Delete => "Delete failed",
    }
}
