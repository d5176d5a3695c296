//! The fetch, compare, render, deliver cycle.

use std::future::Future;
use std::time::Duration;

use agenda_watch_core::diff::{DayGranularity, Delta, DeltaSummary, DiffKind};
use agenda_watch_core::error::FetchResult;
use agenda_watch_core::render::{self, Labels};
use agenda_watch_core::EventStore;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::notifier::Notifier;
use crate::source::CalendarSource;

/// What one cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// No baseline existed; the fetched snapshot became it.
    FirstRun { events: usize },
    Unchanged,
    Changed {
        summary: DeltaSummary,
        delivered: bool,
    },
}

/// Drives cycles and owns the baseline between them.
pub struct Watcher<S, N> {
    source: S,
    notifier: N,
    store: EventStore,
    labels: Labels,
    granularity: DayGranularity,
}

impl<S: CalendarSource, N: Notifier> Watcher<S, N> {
    pub fn new(source: S, notifier: N, labels: Labels, granularity: DayGranularity) -> Self {
        Watcher {
            source,
            notifier,
            store: EventStore::new(),
            labels,
            granularity,
        }
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Run one cycle. A failed fetch leaves the baseline untouched; a
    /// failed delivery does not, since the snapshot itself was good.
    pub async fn run_cycle(&mut self) -> FetchResult<CycleOutcome> {
        debug!("Fetching calendar");
        let snapshot = self.source.fetch().await?;

        let Some(baseline) = self.store.get() else {
            let events = snapshot.len();
            self.store.set(snapshot);
            return Ok(CycleOutcome::FirstRun { events });
        };

        let delta = Delta::compare_with(baseline, &snapshot, self.granularity);
        if delta.is_empty() {
            debug!(events = snapshot.len(), "No changes");
            self.store.set(snapshot);
            return Ok(CycleOutcome::Unchanged);
        }

        log_delta(&delta);
        let groups = render::render(&delta, &self.labels);
        let delivered = match self.notifier.deliver(&groups).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to deliver change notification");
                false
            }
        };

        let summary = delta.summary();
        info!(%summary, delivered, "Calendar changed");
        self.store.set(snapshot);
        Ok(CycleOutcome::Changed { summary, delivered })
    }

    /// Run cycles every `period` until Ctrl-C.
    pub async fn run(&mut self, period: Duration) {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for Ctrl-C");
            }
        };
        self.run_until(period, ctrl_c).await;
    }

    /// Run cycles every `period` until `shutdown` completes, including
    /// while a cycle is in progress. Cycles never overlap: a tick that
    /// comes due while a cycle is still running is skipped.
    pub async fn run_until(&mut self, period: Duration, shutdown: impl Future<Output = ()>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        tokio::pin!(shutdown);

        info!(interval = %humantime::format_duration(period), "Watching calendar");

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = &mut shutdown => break,
            }
            tokio::select! {
                result = self.run_cycle() => log_outcome(result),
                _ = &mut shutdown => break,
            }
        }

        let events = self.store().get().map_or(0, |s| s.len());
        info!(baseline_events = events, "Shutting down");
    }
}

fn log_outcome(result: FetchResult<CycleOutcome>) {
    match result {
        Ok(CycleOutcome::FirstRun { events }) => {
            info!(events, "First run, nothing to compare yet");
        }
        Ok(CycleOutcome::Changed {
            summary,
            delivered: false,
        }) => {
            warn!(%summary, "Changes were not delivered and will not be sent again");
        }
        Ok(_) => {}
        Err(e) => warn!(error = %e, "Fetch failed, keeping previous baseline"),
    }
}

fn log_delta(delta: &Delta) {
    for event in &delta.added {
        info!(id = %event.id, summary = %event.summary, "[{}] added", DiffKind::Added);
    }
    for event in &delta.removed {
        info!(id = %event.id, summary = %event.summary, "[{}] removed", DiffKind::Removed);
    }
    for edit in &delta.edited {
        info!(
            id = %edit.id,
            summary = %edit.after.summary,
            changed = ?edit.diff.changed_fields(),
            "[{}] edited",
            DiffKind::Edited
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agenda_watch_core::error::{DeliveryError, FetchError};
    use agenda_watch_core::render::RenderGroup;
    use agenda_watch_core::{Event, Snapshot};
    use chrono::{DateTime, TimeZone};
    use chrono_tz::{Tz, UTC};
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// Returns queued fetch results in order.
    struct ScriptedSource {
        results: Mutex<VecDeque<FetchResult<Snapshot>>>,
    }

    impl ScriptedSource {
        fn new(results: Vec<FetchResult<Snapshot>>) -> Self {
            ScriptedSource {
                results: Mutex::new(results.into()),
            }
        }
    }

    impl CalendarSource for ScriptedSource {
        async fn fetch(&self) -> FetchResult<Snapshot> {
            self.results
                .lock()
                .unwrap()
                .pop_front()
                .expect("no more scripted fetches")
        }
    }

    /// Records delivered groups; fails every delivery when `fail` is set.
    #[derive(Clone, Default)]
    struct RecordingNotifier {
        delivered: Arc<Mutex<Vec<Vec<RenderGroup>>>>,
        fail: bool,
    }

    impl Notifier for RecordingNotifier {
        async fn deliver(&self, groups: &[RenderGroup]) -> Result<(), DeliveryError> {
            if self.fail {
                return Err(DeliveryError::Status {
                    status: 500,
                    body: "boom".into(),
                });
            }
            self.delivered.lock().unwrap().push(groups.to_vec());
            Ok(())
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Tz> {
        UTC.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap()
    }

    fn baseline() -> Snapshot {
        Snapshot::from_events(vec![
            Event::new("A", "Standup", at(9, 0), at(9, 15)).with_location("Room1"),
        ])
    }

    fn changed() -> Snapshot {
        Snapshot::from_events(vec![
            Event::new("A", "Standup", at(9, 30), at(9, 45)).with_location("Room1"),
            Event::new("B", "Demo", at(14, 0), at(15, 0)),
        ])
    }

    fn watcher(
        results: Vec<FetchResult<Snapshot>>,
        notifier: RecordingNotifier,
    ) -> Watcher<ScriptedSource, RecordingNotifier> {
        Watcher::new(
            ScriptedSource::new(results),
            notifier,
            Labels::english(),
            DayGranularity::CalendarDate,
        )
    }

    #[tokio::test]
    async fn first_run_only_stores_the_baseline() {
        let notifier = RecordingNotifier::default();
        let mut watcher = watcher(vec![Ok(baseline())], notifier.clone());

        let outcome = watcher.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::FirstRun { events: 1 });
        assert_eq!(watcher.store().get(), Some(&baseline()));
        assert!(notifier.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn unchanged_feed_delivers_nothing() {
        let notifier = RecordingNotifier::default();
        let mut watcher = watcher(vec![Ok(baseline()), Ok(baseline())], notifier.clone());

        watcher.run_cycle().await.unwrap();
        let outcome = watcher.run_cycle().await.unwrap();

        assert_eq!(outcome, CycleOutcome::Unchanged);
        assert!(notifier.delivered.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn changes_are_rendered_delivered_and_become_baseline() {
        let notifier = RecordingNotifier::default();
        let mut watcher = watcher(vec![Ok(baseline()), Ok(changed())], notifier.clone());

        watcher.run_cycle().await.unwrap();
        let outcome = watcher.run_cycle().await.unwrap();

        assert_eq!(
            outcome,
            CycleOutcome::Changed {
                summary: DeltaSummary {
                    added: 1,
                    removed: 0,
                    edited: 1
                },
                delivered: true,
            }
        );
        let delivered = notifier.delivered.lock().unwrap();
        assert_eq!(delivered.len(), 1);
        let kinds: Vec<_> = delivered[0].iter().map(|g| g.kind).collect();
        assert_eq!(kinds, vec![DiffKind::Added, DiffKind::Edited]);
        assert_eq!(watcher.store().get(), Some(&changed()));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_the_baseline() {
        let notifier = RecordingNotifier::default();
        let mut watcher = watcher(
            vec![Ok(baseline()), Err(FetchError::Status(503)), Ok(changed())],
            notifier.clone(),
        );

        watcher.run_cycle().await.unwrap();
        let err = watcher.run_cycle().await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
        assert_eq!(watcher.store().get(), Some(&baseline()));

        // The next good fetch is still compared against the old baseline
        let outcome = watcher.run_cycle().await.unwrap();
        assert!(matches!(outcome, CycleOutcome::Changed { .. }));
    }

    #[tokio::test]
    async fn failed_fetch_on_first_cycle_stores_nothing() {
        let mut watcher = watcher(
            vec![Err(FetchError::Parse("bad".into()))],
            RecordingNotifier::default(),
        );

        assert!(watcher.run_cycle().await.is_err());
        assert!(watcher.store().get().is_none());
    }

    #[tokio::test]
    async fn failed_delivery_still_replaces_the_baseline() {
        let notifier = RecordingNotifier {
            fail: true,
            ..Default::default()
        };
        let mut watcher = watcher(vec![Ok(baseline()), Ok(changed()), Ok(changed())], notifier);

        watcher.run_cycle().await.unwrap();
        let outcome = watcher.run_cycle().await.unwrap();
        assert!(matches!(
            outcome,
            CycleOutcome::Changed {
                delivered: false,
                ..
            }
        ));
        assert_eq!(watcher.store().get(), Some(&changed()));

        // Same snapshot again: nothing is re-sent
        assert_eq!(watcher.run_cycle().await.unwrap(), CycleOutcome::Unchanged);
    }

    /// Never finishes a fetch.
    struct StalledSource;

    impl CalendarSource for StalledSource {
        async fn fetch(&self) -> FetchResult<Snapshot> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn shutdown_interrupts_a_stalled_fetch() {
        let mut watcher = Watcher::new(
            StalledSource,
            RecordingNotifier::default(),
            Labels::english(),
            DayGranularity::CalendarDate,
        );
        let shutdown = tokio::time::sleep(Duration::from_millis(20));

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            watcher.run_until(Duration::from_secs(3600), shutdown),
        )
        .await;

        assert!(finished.is_ok());
        assert!(watcher.store().get().is_none());
    }

    #[tokio::test]
    async fn shutdown_between_cycles_keeps_the_baseline() {
        let notifier = RecordingNotifier::default();
        let mut watcher = watcher(vec![Ok(baseline())], notifier);
        let shutdown = tokio::time::sleep(Duration::from_millis(20));

        let finished = tokio::time::timeout(
            Duration::from_secs(5),
            watcher.run_until(Duration::from_secs(3600), shutdown),
        )
        .await;

        assert!(finished.is_ok());
        assert_eq!(watcher.store().get(), Some(&baseline()));
    }
}
