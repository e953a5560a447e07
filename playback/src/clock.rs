use std::{
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use dashlink_bus::{EventBus, Subscription};
use dashlink_core::{EventEnvelope, EventPayload, EventType, PLAYER_EVENT_TYPES, PlayerState, PlayerStatus};
use tokio::task::JoinHandle;

use crate::estimator::{ElapsedEstimator, SyncPoint};

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const UPDATE_BUFFER_SIZE: usize = 16;

/// Smoothly advancing playback position fed by sparse hub updates.
///
/// Owns the estimator, a once-per-second ticker that pushes the current
/// estimate to the UI, and the bus wiring that turns player events into
/// resyncs. The ticker only exists while playback is running: a
/// `running=false` resync cancels it, the next `running=true` resync
/// starts it again, and it is never scheduled twice.
#[derive(Clone)]
pub struct PlaybackClock(Arc<ClockInner>);

struct ClockInner {
    estimator: Mutex<ElapsedEstimator>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    updates: flume::Sender<f64>,
}

impl PlaybackClock {
    /// Create a clock and the receiver the UI reads positions from.
    pub fn new() -> (Self, flume::Receiver<f64>) {
        let (updates, positions) = flume::bounded(UPDATE_BUFFER_SIZE);
        let clock = Self(Arc::new(ClockInner {
            estimator: Mutex::new(ElapsedEstimator::new()),
            ticker: Mutex::new(None),
            updates,
        }));
        (clock, positions)
    }

    /// Current estimate, or `None` before the first authoritative update.
    pub fn current_value(&self) -> Option<f64> {
        self.0.estimator.lock().unwrap().current_value(Instant::now())
    }

    pub fn is_ticking(&self) -> bool {
        self.0
            .ticker
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|ticker| !ticker.is_finished())
    }

    /// Apply an authoritative update and reconcile the ticker with the new
    /// running state. Must be called from within a tokio runtime.
    pub fn resync(&self, point: SyncPoint, duration: Option<f64>) {
        let running = point.running;

        let value = {
            let mut estimator = self.0.estimator.lock().unwrap();
            estimator.resync(point);
            if duration.is_some() {
                estimator.set_duration(duration);
            }
            estimator.current_value(point.captured_at)
        };

        if running {
            self.start_ticker();
        } else {
            self.stop_ticker();
        }

        // push the authoritative value right away instead of waiting for
        // the next tick; paused updates have no tick coming at all
        if let Some(value) = value {
            let _ = self.0.updates.try_send(value);
        }
    }

    /// Subscribe to the player event family on `bus`; every received event
    /// becomes a resync. The returned guard owns the registration.
    pub fn attach(&self, bus: &EventBus) -> Subscription {
        let clock = self.clone();
        bus.subscribe_scoped(
            move |envelope: &EventEnvelope| clock.on_event(envelope),
            PLAYER_EVENT_TYPES.iter().copied().map(EventType::from),
        )
    }

    fn on_event(&self, envelope: &EventEnvelope) {
        let captured_at = Instant::now();

        match EventPayload::decode(envelope) {
            EventPayload::MusicPlay(status) => {
                self.resync_from_status(&status, captured_at, Some(true));
            }
            EventPayload::MusicPause(status) => {
                self.resync_from_status(&status, captured_at, Some(false));
            }
            EventPayload::MusicStop(status) => {
                tracing::info!("playback stopped, resetting position");
                self.resync(
                    SyncPoint {
                        captured_at,
                        elapsed: 0.0,
                        running: false,
                    },
                    status.duration,
                );
            }
            EventPayload::SeekChange(status)
            | EventPayload::VolumeChange(status)
            | EventPayload::NewPlayingTrack(status) => {
                self.resync_from_status(&status, captured_at, None);
            }
            EventPayload::Other(_) => {}
        }
    }

    /// `running` override wins; otherwise the payload state decides, and a
    /// payload without a state keeps whatever the clock was doing.
    fn resync_from_status(&self, status: &PlayerStatus, captured_at: Instant, running: Option<bool>) {
        let running = running
            .or_else(|| status.state.map(|state| state == PlayerState::Play))
            .unwrap_or_else(|| self.0.estimator.lock().unwrap().running());

        // events without a playhead position re-anchor at the current
        // estimate so the displayed value stays monotonic
        let elapsed = status
            .elapsed
            .or_else(|| self.current_value())
            .unwrap_or(0.0);

        self.resync(
            SyncPoint {
                captured_at,
                elapsed,
                running,
            },
            status.duration,
        );
    }

    fn start_ticker(&self) {
        let mut ticker = self.0.ticker.lock().unwrap();
        if ticker.as_ref().is_some_and(|ticker| !ticker.is_finished()) {
            return;
        }

        let inner = self.0.clone();
        *ticker = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);

            loop {
                interval.tick().await;

                let value = inner.estimator.lock().unwrap().current_value(Instant::now());
                let Some(value) = value else { continue };

                if inner.updates.send_async(value).await.is_err() {
                    break;
                }
            }
        }));
    }

    fn stop_ticker(&self) {
        if let Some(ticker) = self.0.ticker.lock().unwrap().take() {
            ticker.abort();
        }
    }
}

impl Drop for ClockInner {
    fn drop(&mut self) {
        if let Some(ticker) = self.ticker.lock().unwrap().take() {
            ticker.abort();
        }
    }
}
