use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::state::{ConnectionStatus, SessionEvent, SessionState};
use crate::capture::{CaptureDevice, CaptureError, CaptureEvent};
use crate::live::LiveClient;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Orchestrates the capture device and the live connection against user
/// intent, presenting one consistent state to the UI layer.
///
/// Cheap to clone; all clones share the same session.
#[derive(Clone)]
pub struct SessionController {
    inner: Arc<Inner>,
}

struct Inner {
    /// Exclusively owned capture device
    capture: Mutex<Box<dyn CaptureDevice>>,

    /// Shared live connection client (not owned; other consumers may exist)
    live: Arc<dyn LiveClient>,

    state: Mutex<SessionState>,

    /// Identifies the current session attempt. Bumped on every start and
    /// teardown so completions of superseded awaits can detect they lost
    /// the race and must not apply effects.
    epoch: AtomicU64,

    /// The single capture-event pump task for the current connected
    /// lifetime, if any. The lock doubles as the commit lock: connection
    /// calls and lifecycle state commits happen while holding it, so a
    /// start and a stop can never interleave their effects.
    pump: Mutex<Option<JoinHandle<()>>>,

    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(capture: Box<dyn CaptureDevice>, live: Arc<dyn LiveClient>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                capture: Mutex::new(capture),
                live,
                state: Mutex::new(SessionState::default()),
                epoch: AtomicU64::new(0),
                pump: Mutex::new(None),
                events,
            }),
        }
    }

    /// Current state snapshot.
    pub async fn state(&self) -> SessionState {
        *self.inner.state.lock().await
    }

    /// Subscribe to state changes and notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Start a session: acquire the microphone, then connect.
    ///
    /// No-op unless currently disconnected. Capture acquisition always
    /// completes (success or failure) before a connection attempt begins;
    /// a permission denial aborts without connecting and surfaces a
    /// `PermissionDenied` event. All failures land back at `Disconnected`.
    pub async fn start(&self) -> SessionState {
        {
            let state = self.inner.state.lock().await;
            if state.status != ConnectionStatus::Disconnected {
                debug!("Start ignored: session is {:?}", state.status);
                return *state;
            }
        }

        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        self.set_state_if(epoch, |s| s.status = ConnectionStatus::Connecting)
            .await;

        // Acquire the microphone first. A real device prompts for
        // permission here; the connection must never be attempted unless
        // this succeeds. The currency checks live inside the device lock
        // so a racing stop cannot slip between check and effect.
        let capture_events = {
            let mut capture = self.inner.capture.lock().await;
            if self.superseded(epoch) {
                debug!("Start superseded before capture acquisition");
                return self.state().await;
            }
            match capture.start().await {
                Ok(rx) => {
                    if self.superseded(epoch) {
                        // A stop raced in while we were waiting on the
                        // device; undo the acquisition while we still hold
                        // the lock.
                        debug!("Start superseded during capture acquisition");
                        if let Err(e) = capture.stop().await {
                            warn!("Failed to stop capture device: {:#}", e);
                        }
                        return self.state().await;
                    }
                    info!("Audio capture started ({})", capture.name());
                    rx
                }
                Err(CaptureError::PermissionDenied) => {
                    warn!("Microphone permission denied");
                    let _ = self.inner.events.send(SessionEvent::PermissionDenied);
                    return self
                        .set_state_if(epoch, |s| s.status = ConnectionStatus::Disconnected)
                        .await;
                }
                Err(e) => {
                    error!("Failed to start audio capture: {}", e);
                    return self
                        .set_state_if(epoch, |s| s.status = ConnectionStatus::Disconnected)
                        .await;
                }
            }
        };

        // Connect and commit while holding the pump slot. A concurrent
        // stop serializes on this lock: it either completed before we got
        // here (we withdraw and it releases the device), or it runs after
        // the commit and observes the stored pump handle.
        let mut pump = self.inner.pump.lock().await;

        if self.superseded(epoch) {
            debug!("Start superseded before connect");
            return self.state().await;
        }

        if let Err(e) = self.inner.live.connect().await {
            error!("Failed to connect live session: {:#}", e);
            // Release the microphone rather than leave it orphaned.
            self.release_capture(epoch).await;
            return self
                .set_state_if(epoch, |s| s.status = ConnectionStatus::Disconnected)
                .await;
        }

        if self.superseded(epoch) {
            // The superseding stop is blocked on this lock; it will
            // disconnect and release the device once we let go.
            debug!("Start superseded during connect");
            return self.state().await;
        }

        // Attach the capture-event pump exactly once per connected lifetime.
        *pump = Some(tokio::spawn(self.clone().pump(capture_events, epoch)));

        info!("Session started");

        self.set_state_if(epoch, |s| {
            s.status = ConnectionStatus::Connected;
            s.mic_muted = false;
        })
        .await
    }

    /// Stop the session.
    ///
    /// Issues disconnect and capture stop whether or not a session is
    /// live; both are defensive no-ops when the resource was never
    /// acquired. Safe to call repeatedly and from any state. A stop that
    /// lost the race to a newer start leaves that start's resources alone.
    pub async fn stop(&self) -> SessionState {
        // Invalidate any suspended start so its completion cannot
        // resurrect state or subscriptions.
        let epoch = self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1;

        let mut pump = self.inner.pump.lock().await;

        if self.superseded(epoch) {
            // A newer attempt owns the session and its resources now;
            // touching them would tear down a session we were not asked
            // to stop.
            debug!("Stop superseded");
            return self.state().await;
        }

        if let Some(task) = pump.take() {
            task.abort();
            let _ = task.await;
        }

        if let Err(e) = self.inner.live.disconnect().await {
            warn!("Failed to disconnect live session: {:#}", e);
        }
        self.release_capture(epoch).await;

        info!("Session stopped");

        self.set_state_if(epoch, |s| s.status = ConnectionStatus::Disconnected)
            .await
    }

    /// Toggle the microphone. Only meaningful while connected; ignored
    /// otherwise to prevent silent state drift.
    pub async fn toggle_mic(&self) -> SessionState {
        let mute = {
            let state = self.inner.state.lock().await;
            if state.status != ConnectionStatus::Connected {
                debug!("Mic toggle ignored: session is {:?}", state.status);
                return *state;
            }
            !state.mic_muted
        };

        {
            let mut capture = self.inner.capture.lock().await;
            if mute {
                capture.mute();
            } else {
                capture.unmute();
            }
        }

        self.set_state(|s| {
            if s.status == ConnectionStatus::Connected {
                s.mic_muted = mute;
            }
        })
        .await
    }

    /// Forward capture events for one connected lifetime.
    ///
    /// Runs until the capture channel closes, the epoch moves on, or the
    /// live connection drops out from under us.
    async fn pump(self, mut events: mpsc::Receiver<CaptureEvent>, epoch: u64) {
        debug!("Capture pump started (epoch {})", epoch);

        while let Some(event) = events.recv().await {
            if self.superseded(epoch) {
                break;
            }

            match event {
                CaptureEvent::Data(chunk) => {
                    let forward = {
                        let state = self.inner.state.lock().await;
                        state.status == ConnectionStatus::Connected && !state.mic_muted
                    };
                    if !forward {
                        // Stale or muted chunk: drop, never queue.
                        continue;
                    }

                    if !self.inner.live.is_connected() {
                        warn!("Live session dropped; tearing down");
                        self.teardown_from_pump(epoch).await;
                        break;
                    }

                    if let Err(e) = self.inner.live.send_realtime_input(vec![chunk]).await {
                        warn!("Failed to forward audio chunk: {:#}", e);
                    }
                }
                CaptureEvent::SpeechStart => {
                    self.set_state(|s| {
                        if s.status == ConnectionStatus::Connected && !s.mic_muted {
                            s.speaking = true;
                        }
                    })
                    .await;
                }
                CaptureEvent::SpeechEnd => {
                    self.set_state(|s| s.speaking = false).await;
                }
            }
        }

        debug!("Capture pump exited (epoch {})", epoch);
    }

    /// Teardown initiated from inside the pump (external disconnect).
    ///
    /// Claims the epoch first so a concurrent `stop()` cannot double-run
    /// the teardown, and drops the pump handle without aborting, since we
    /// are that task.
    async fn teardown_from_pump(&self, epoch: u64) {
        if self
            .inner
            .epoch
            .compare_exchange(epoch, epoch + 1, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Someone else is already tearing this session down.
            return;
        }
        let epoch = epoch + 1;

        let mut pump = self.inner.pump.lock().await;
        *pump = None;

        if let Err(e) = self.inner.live.disconnect().await {
            warn!("Failed to disconnect live session: {:#}", e);
        }
        self.release_capture(epoch).await;

        self.set_state_if(epoch, |s| s.status = ConnectionStatus::Disconnected)
            .await;
    }

    /// Stop the capture device unless a newer attempt has taken ownership
    /// of it in the meantime.
    async fn release_capture(&self, epoch: u64) {
        let mut capture = self.inner.capture.lock().await;
        if self.superseded(epoch) {
            return;
        }
        if let Err(e) = capture.stop().await {
            warn!("Failed to stop capture device: {:#}", e);
        }
    }

    fn superseded(&self, epoch: u64) -> bool {
        self.inner.epoch.load(Ordering::SeqCst) != epoch
    }

    /// Apply a transition, re-establish invariants, and broadcast the new
    /// snapshot if anything changed.
    async fn set_state(&self, apply: impl FnOnce(&mut SessionState)) -> SessionState {
        let mut state = self.inner.state.lock().await;
        let prev = *state;

        apply(&mut state);
        state.normalize();

        if *state != prev {
            info!("Session state: {:?} -> {:?}", prev, *state);
            let _ = self.inner.events.send(SessionEvent::StateChanged(*state));
        }

        *state
    }

    /// Like `set_state`, but the transition is discarded when `epoch` is no
    /// longer current. The check happens under the state lock, so a stale
    /// lifecycle completion can never overwrite a newer attempt's state.
    async fn set_state_if(
        &self,
        epoch: u64,
        apply: impl FnOnce(&mut SessionState),
    ) -> SessionState {
        let mut state = self.inner.state.lock().await;
        if self.superseded(epoch) {
            return *state;
        }
        let prev = *state;

        apply(&mut state);
        state.normalize();

        if *state != prev {
            info!("Session state: {:?} -> {:?}", prev, *state);
            let _ = self.inner.events.send(SessionEvent::StateChanged(*state));
        }

        *state
    }
}
