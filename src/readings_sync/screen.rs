use crate::api::{ApiError, ReadingsApi};
use crate::debounce::Debounce;
use crate::domain::{DeviceId, FilterMode, Reading};
use crate::notifications::Notifier;
use crate::readings_sync::synchronizer::{ReadingsQuery, ReadingsSnapshot, ReadingsSynchronizer};
use crate::resolver::{Generation, Lookup, ResolutionState};
use crate::screen::{CONNECTION_FAILURE, ScreenClosed, ScreenSettings};
use std::sync::Arc;
use tokio::sync::mpsc::{Receiver, UnboundedReceiver, UnboundedSender};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum ReadingsScreenEvent {
    IdentifierTyped(String),
    Filter(FilterMode),
    /// Switches between all and critical readings.
    ToggleFilter,
    /// Pull-to-refresh.
    Refresh,
    Close,
}

#[derive(Debug)]
struct Completion {
    generation: Generation,
    result: Result<Vec<Reading>, ApiError>,
}

#[derive(Debug)]
pub struct ReadingsScreenHandle {
    events: mpsc::Sender<ReadingsScreenEvent>,
    snapshots: watch::Receiver<ReadingsSnapshot>,
    task: JoinHandle<()>,
}

impl ReadingsScreenHandle {
    pub async fn send(&self, event: ReadingsScreenEvent) -> Result<(), ScreenClosed> {
        self.events.send(event).await.map_err(|_| ScreenClosed)
    }

    pub fn snapshots(&self) -> watch::Receiver<ReadingsSnapshot> {
        self.snapshots.clone()
    }

    pub fn snapshot(&self) -> ReadingsSnapshot {
        self.snapshots.borrow().clone()
    }

    pub async fn close(self) {
        self.events.send(ReadingsScreenEvent::Close).await.ok();
        if let Err(e) = self.task.await {
            warn!("⚠️ Readings screen stopped abnormally: {}", e);
        }
    }
}

#[derive(Debug)]
pub struct ReadingsScreen {
    api: Arc<dyn ReadingsApi>,
    notifier: Notifier,
    synchronizer: ReadingsSynchronizer,
    debounce: Debounce<String>,
    events: Receiver<ReadingsScreenEvent>,
    completions_tx: UnboundedSender<Completion>,
    completions_rx: UnboundedReceiver<Completion>,
    snapshots: watch::Sender<ReadingsSnapshot>,
}

impl ReadingsScreen {
    pub fn spawn(api: Arc<dyn ReadingsApi>, notifier: Notifier, settings: ScreenSettings) -> ReadingsScreenHandle {
        let (events_tx, events) = mpsc::channel(settings.event_buffer_size.get());
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (snapshots, snapshots_rx) = watch::channel(ReadingsSnapshot::default());

        let screen = ReadingsScreen {
            api,
            notifier,
            synchronizer: ReadingsSynchronizer::new(),
            debounce: Debounce::new(settings.debounce),
            events,
            completions_tx,
            completions_rx,
            snapshots,
        };

        ReadingsScreenHandle {
            events: events_tx,
            snapshots: snapshots_rx,
            task: tokio::spawn(screen.run()),
        }
    }

    #[instrument(name = "readings_screen", skip_all)]
    async fn run(mut self) {
        debug!("Readings screen opened");
        loop {
            tokio::select! {
                biased;
                event = self.events.recv() => match event {
                    Some(ReadingsScreenEvent::Close) | None => break,
                    Some(event) => self.handle_event(event),
                },
                Some(completion) = self.completions_rx.recv() => self.handle_completion(completion),
                _ = self.debounce.quiesced() => self.commit_settled_identifier(),
            }
            self.publish();
        }

        self.debounce.cancel();
        self.synchronizer.tear_down();
        debug!("Readings screen closed");
    }

    fn handle_event(&mut self, event: ReadingsScreenEvent) {
        let lookup = match event {
            ReadingsScreenEvent::IdentifierTyped(raw) => {
                self.debounce.push(raw, Instant::now());
                None
            }
            ReadingsScreenEvent::Filter(filter) => self.synchronizer.set_filter(filter),
            ReadingsScreenEvent::ToggleFilter => self.synchronizer.toggle_filter(),
            ReadingsScreenEvent::Refresh => {
                let lookup = self.synchronizer.refresh();
                if lookup.is_none() {
                    debug!("Nothing to refresh without a device");
                }
                lookup
            }
            ReadingsScreenEvent::Close => None,
        };

        if let Some(lookup) = lookup {
            self.spawn_fetch(lookup);
        }
    }

    fn commit_settled_identifier(&mut self) {
        let Some(raw) = self.debounce.poll(Instant::now()) else {
            return;
        };

        if let Some(lookup) = self.synchronizer.set_device(DeviceId::parse(&raw)) {
            self.spawn_fetch(lookup);
        }
    }

    fn handle_completion(&mut self, completion: Completion) {
        if !self.synchronizer.complete(completion.generation, completion.result) {
            return;
        }

        match self.synchronizer.resolution() {
            ResolutionState::Found(query, readings) => {
                let critical = readings.iter().filter(|r| r.is_over_limit).count();
                info!(device_id = %query.device_id, "📈 Fetching readings... OK, {} reading(s), {} over the limit", readings.len(), critical);
            }
            ResolutionState::NotFound(query) => {
                info!(device_id = %query.device_id, "📈 Fetching readings... OK, no readings for this device");
            }
            ResolutionState::Failed(query, reason) => {
                warn!(device_id = %query.device_id, "📈 Fetching readings... failed, {}", reason);
                self.notifier.failure("Connection failure", CONNECTION_FAILURE);
            }
            _ => {}
        }
    }

    fn spawn_fetch(&self, lookup: Lookup<ReadingsQuery>) {
        let Lookup { generation, key } = lookup;
        info!(device_id = %key.device_id, filter = ?key.filter, %generation, "📈 Fetching readings...");
        let api = Arc::clone(&self.api);
        let completions = self.completions_tx.clone();

        tokio::spawn(async move {
            let result = api.fetch(&key.device_id, key.filter).await;
            // The screen may be gone by now
            completions.send(Completion { generation, result }).ok();
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fixtures::{device_id, reading};
    use crate::notifications::Notification;
    use crate::readings_sync::synchronizer::ReadingsView;
    use crate::testing::{ReadingsExchange, ScriptedReadingsApi, server_error};
    use pretty_assertions::assert_eq;
    use std::time::Duration;
    use test_log::test;
    use tokio::time::sleep;

    struct Harness {
        screen: ReadingsScreenHandle,
        exchanges: UnboundedReceiver<ReadingsExchange>,
        notifications: UnboundedReceiver<Notification>,
    }

    fn open() -> Harness {
        let (api, exchanges) = ScriptedReadingsApi::new();
        let (notifier, notifications) = Notifier::channel();
        let screen = ReadingsScreen::spawn(api, notifier, ScreenSettings::default());

        Harness {
            screen,
            exchanges,
            notifications,
        }
    }

    impl Harness {
        async fn send(&self, event: ReadingsScreenEvent) {
            self.screen.send(event).await.unwrap();
        }

        async fn next_exchange(&mut self) -> ReadingsExchange {
            self.exchanges.recv().await.expect("expected a request")
        }

        async fn wait_for_view(&self, view: ReadingsView) -> ReadingsSnapshot {
            let mut snapshots = self.screen.snapshots();
            let snapshot = snapshots.wait_for(|s| s.view == view).await.unwrap();
            snapshot.clone()
        }
    }

    async fn settle() {
        sleep(Duration::from_secs(5)).await;
    }

    #[test(tokio::test(start_paused = true))]
    async fn debounced_identifier_fetches_all_readings() {
        let mut harness = open();

        for raw in ["e", "esp", "esp32"] {
            harness.send(ReadingsScreenEvent::IdentifierTyped(raw.to_string())).await;
        }

        let exchange = harness.next_exchange().await;
        assert_eq!(exchange.device_id, device_id("esp32"));
        assert_eq!(exchange.filter, FilterMode::All);

        let readings = vec![reading(2, "esp32", 61.0, true), reading(1, "esp32", 20.0, false)];
        exchange.reply(Ok(readings.clone()));
        harness.wait_for_view(ReadingsView::Readings(readings)).await;

        settle().await;
        assert!(harness.exchanges.try_recv().is_err());
    }

    #[test(tokio::test(start_paused = true))]
    async fn toggling_the_filter_fetches_critical_readings() {
        let mut harness = open();
        harness.send(ReadingsScreenEvent::IdentifierTyped("esp32".to_string())).await;
        harness.next_exchange().await.reply(Ok(vec![reading(1, "esp32", 20.0, false)]));

        harness.send(ReadingsScreenEvent::Filter(FilterMode::CriticalOnly)).await;

        let exchange = harness.next_exchange().await;
        assert_eq!(exchange.filter, FilterMode::CriticalOnly);
    }

    #[test(tokio::test(start_paused = true))]
    async fn empty_list_and_not_found_show_the_same_state() {
        let mut harness = open();
        harness.send(ReadingsScreenEvent::IdentifierTyped("esp32".to_string())).await;
        harness.next_exchange().await.reply(Ok(vec![]));
        let empty = harness.wait_for_view(ReadingsView::NotFound).await;

        harness.send(ReadingsScreenEvent::Refresh).await;
        harness.next_exchange().await.reply(Err(ApiError::NotFound(device_id("esp32"))));
        settle().await;

        assert_eq!(harness.screen.snapshot(), empty);
        assert!(harness.notifications.try_recv().is_err());
    }

    #[test(tokio::test(start_paused = true))]
    async fn connection_failure_is_reported() {
        let mut harness = open();
        harness.send(ReadingsScreenEvent::IdentifierTyped("esp32".to_string())).await;

        harness.next_exchange().await.reply(Err(server_error()));
        harness.wait_for_view(ReadingsView::NotFound).await;

        let notification = harness.notifications.recv().await.unwrap();
        assert_eq!(notification.title, "Connection failure");
    }

    #[test(tokio::test(start_paused = true))]
    async fn refresh_fetches_the_same_listing_again() {
        let mut harness = open();
        harness.send(ReadingsScreenEvent::IdentifierTyped("esp32".to_string())).await;
        harness.send(ReadingsScreenEvent::Filter(FilterMode::CriticalOnly)).await;
        let first = harness.next_exchange().await;
        first.reply(Ok(vec![]));
        harness.wait_for_view(ReadingsView::NotFound).await;

        harness.send(ReadingsScreenEvent::Refresh).await;

        let second = harness.next_exchange().await;
        assert_eq!(second.device_id, device_id("esp32"));
        assert_eq!(second.filter, FilterMode::CriticalOnly);
    }

    #[test(tokio::test(start_paused = true))]
    async fn superseded_listing_never_shows_up() {
        let mut harness = open();
        harness.send(ReadingsScreenEvent::IdentifierTyped("a".to_string())).await;
        let a = harness.next_exchange().await;
        harness.send(ReadingsScreenEvent::IdentifierTyped("b".to_string())).await;
        let b = harness.next_exchange().await;

        let b_readings = vec![reading(5, "b", 30.0, false)];
        b.reply(Ok(b_readings.clone()));
        harness.wait_for_view(ReadingsView::Readings(b_readings.clone())).await;
        a.reply(Ok(vec![reading(1, "a", 99.0, true)]));
        settle().await;

        assert_eq!(harness.screen.snapshot().readings(), b_readings.as_slice());
    }

    #[test(tokio::test(start_paused = true))]
    async fn closing_before_the_window_elapses_fetches_nothing() {
        let mut harness = open();
        harness.send(ReadingsScreenEvent::IdentifierTyped("esp32".to_string())).await;
        let snapshots = harness.screen.snapshots();

        harness.screen.close().await;
        settle().await;

        assert!(harness.exchanges.try_recv().is_err());
        assert_eq!(*snapshots.borrow(), ReadingsSnapshot::default());
    }

    #[test(tokio::test(start_paused = true))]
    async fn closing_while_a_fetch_is_pending_freezes_the_state() {
        let mut harness = open();
        harness.send(ReadingsScreenEvent::IdentifierTyped("esp32".to_string())).await;
        let exchange = harness.next_exchange().await;
        harness.wait_for_view(ReadingsView::Loading).await;
        let snapshots = harness.screen.snapshots();

        harness.screen.close().await;
        exchange.reply(Ok(vec![reading(1, "esp32", 20.0, false)]));
        settle().await;

        assert_eq!(snapshots.borrow().view, ReadingsView::Loading);
    }

    #[test(tokio::test(start_paused = true))]
    async fn queued_toggles_each_flip_the_filter() {
        let mut harness = open();
        harness.send(ReadingsScreenEvent::IdentifierTyped("esp32".to_string())).await;
        harness.next_exchange().await.reply(Ok(vec![]));
        harness.wait_for_view(ReadingsView::NotFound).await;

        harness.send(ReadingsScreenEvent::ToggleFilter).await;
        harness.send(ReadingsScreenEvent::ToggleFilter).await;

        let criticals = harness.next_exchange().await;
        let all = harness.next_exchange().await;
        assert_eq!(criticals.filter, FilterMode::CriticalOnly);
        assert_eq!(all.filter, FilterMode::All);

        let readings = vec![reading(1, "esp32", 20.0, false)];
        all.reply(Ok(readings.clone()));
        let snapshot = harness.wait_for_view(ReadingsView::Readings(readings)).await;
        assert_eq!(snapshot.filter, FilterMode::All);
    }
}
