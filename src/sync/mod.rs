pub mod decode;
pub mod format;
pub mod render;
pub mod state;
pub mod view;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::command::{CAR_HEATER_CONTROL, OutboundCommand};
use crate::config::{Bindings, Config, EventKind, ViewConfig};
use crate::debounce::Debouncer;
use crate::error::{CommandError, TransportError};
use crate::http::{HttpClient, Snapshot};
use crate::socketio::{ChannelState, OutboundFrame};

use decode::Update;
use render::{Fragment, Renderer};
use state::{Origin, ViewState, Write, keys};
use view::ViewContext;

const MAX_SUGGESTIONS: usize = 10;

#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub bindings: Bindings,
    pub view: ViewConfig,
}

impl SyncSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            bindings: config.bindings.clone(),
            view: config.view.clone(),
        }
    }
}

/// Everything the reducer may ask of the outside world. Calls never block;
/// slow work completes later as [`Feedback`].
pub trait Backend {
    fn is_live(&self) -> bool;
    fn emit(&mut self, frame: OutboundFrame) -> Result<(), TransportError>;
    fn post_fallback(&mut self, route: &str, command: &OutboundCommand);
    fn fetch_snapshot(&mut self, snapshot: Snapshot);
}

/// Completion of work started through a [`Backend`].
#[derive(Debug)]
pub enum Feedback {
    Snapshot {
        snapshot: Snapshot,
        result: Result<Value, TransportError>,
    },
    Fallback {
        event: String,
        action: String,
        result: Result<Value, TransportError>,
    },
}

#[derive(Debug, PartialEq)]
pub enum Delivery {
    /// Handed to the live channel.
    Realtime,
    /// One HTTP request spawned; its outcome arrives as feedback.
    Fallback,
    Rejected(CommandError),
    Failed,
}

pub struct ViewStateSync<R, B> {
    renderer: R,
    backend: B,
    settings: SyncSettings,
    state: ViewState,
    refresh: Debouncer<Snapshot>,
    gcodes: Vec<String>,
    channel: ChannelState,
}

impl<R: Renderer, B: Backend> ViewStateSync<R, B> {
    pub fn new(renderer: R, backend: B, settings: SyncSettings) -> Self {
        let refresh = Debouncer::new([
            (Snapshot::AvgRates, settings.view.avg_rates_debounce),
            (Snapshot::OutsideStats, settings.view.outside_stats_debounce),
        ]);
        Self {
            renderer,
            backend,
            settings,
            state: ViewState::new(),
            refresh,
            gcodes: Vec::new(),
            channel: ChannelState::Connecting,
        }
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Decode, merge and re-render one server event. Never fails; bad fields
    /// are dropped and render errors are logged.
    pub fn apply_event(&mut self, kind: &str, payload: &Value) {
        let Some(event_kind) = self.settings.bindings.kind_of(kind) else {
            debug!("Ignoring unbound event {}", kind);
            return;
        };
        let mut update = decode::decode(event_kind, payload);
        if let Update::Location(reading) = &mut update {
            // a reading without its own time was taken on arrival
            if reading.timestamp.is_none() {
                reading.timestamp = Some(Utc::now().to_rfc3339());
            }
        }
        if event_kind == EventKind::LocationReading {
            self.schedule_refresh(&update);
        }
        self.apply_update(kind, update);
    }

    fn apply_update(&mut self, kind: &str, update: Update) -> usize {
        if update == Update::ServerShutdown {
            info!("Server announced shutdown");
            return 0;
        }
        let writes = update.writes();
        if writes.is_empty() {
            debug!("{} carried no usable fields", kind);
            return 0;
        }
        let count = writes.len();
        self.merge_and_render(writes, Origin::Authoritative);
        count
    }

    fn schedule_refresh(&mut self, update: &Update) {
        let Update::Location(reading) = update else {
            return;
        };
        let now = Instant::now();
        self.refresh.trigger(Snapshot::AvgRates, now);
        let outside = self.settings.view.outside_location.trim();
        if reading.name.as_deref().map(str::trim) == Some(outside) {
            self.refresh.trigger(Snapshot::OutsideStats, now);
        }
    }

    fn merge_and_render(&mut self, writes: Vec<Write>, origin: Origin) {
        let now = Utc::now();
        let written = self.state.merge(writes, origin, now);
        let fragments = {
            let ctx = ViewContext {
                state: &self.state,
                config: &self.settings.view,
                now,
            };
            view::fragments_for(&ctx, &written)
        };
        self.render_all(fragments);
    }

    fn render_all(&mut self, fragments: Vec<(String, Fragment)>) {
        for (target, fragment) in fragments {
            if let Err(e) = self.renderer.render(&target, &fragment) {
                warn!("Render failed: {}", e);
            }
        }
    }

    /// Validate, show the optimistic result, then deliver exactly once.
    pub fn emit_command(&mut self, command: OutboundCommand) -> Delivery {
        if let Err(e) = command.validate() {
            warn!("Rejected {} {}: {}", command.event, command.action, e);
            self.merge_and_render(
                vec![
                    Write::text(keys::FLASH_CATEGORY, "error"),
                    Write::text(keys::FLASH_MESSAGE, e.to_string()),
                ],
                Origin::Optimistic,
            );
            return Delivery::Rejected(e);
        }
        let command = command.normalized();

        let optimistic = command.optimistic_writes();
        if !optimistic.is_empty() {
            self.merge_and_render(optimistic, Origin::Optimistic);
        }

        if self.backend.is_live() {
            let frame = OutboundFrame {
                event: command.event.clone(),
                payload: command.payload(),
            };
            match self.backend.emit(frame) {
                Ok(()) => return Delivery::Realtime,
                Err(e) => warn!("Live emit of {} failed: {}", command.event, e),
            }
        }

        let route = self
            .settings
            .bindings
            .fallback_route(&command.event)
            .map(str::to_string);
        match route {
            Some(route) => {
                info!("Channel down, posting {} to {}", command.action, route);
                self.backend.post_fallback(&route, &command);
                Delivery::Fallback
            }
            None => {
                warn!("No fallback route for {}, dropping {}", command.event, command.action);
                self.mark_failed(&command.event, &command.action);
                Delivery::Failed
            }
        }
    }

    fn mark_failed(&mut self, event: &str, action: &str) {
        let mut writes = vec![Write::text(keys::CAR_QUEUE, "failed")];
        if event == CAR_HEATER_CONTROL {
            writes.push(Write::text(keys::car_command(action), "failed"));
        }
        self.merge_and_render(writes, Origin::Optimistic);
    }

    /// A frame the live channel accepted but never wrote.
    pub fn emit_lost(&mut self, frame: &OutboundFrame) {
        let action = frame
            .payload
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default();
        warn!("{} {} was not delivered", frame.event, action);
        self.merge_and_render(
            vec![
                Write::text(keys::FLASH_CATEGORY, "error"),
                Write::text(
                    keys::FLASH_MESSAGE,
                    format!("{} {} was not delivered, connection lost", frame.event, action),
                ),
            ],
            Origin::Optimistic,
        );
        self.mark_failed(&frame.event, action);
    }

    pub fn fallback_outcome(&mut self, event: &str, action: &str, result: Result<Value, TransportError>) {
        match result {
            Ok(_) => {
                info!("Fallback for {} accepted", action);
                self.merge_and_render(
                    vec![Write::text(keys::CAR_QUEUE, "queued")],
                    Origin::Authoritative,
                );
            }
            Err(e) => {
                warn!("Fallback for {} failed: {}", action, e);
                self.mark_failed(event, action);
            }
        }
    }

    pub fn snapshot_loaded(&mut self, snapshot: Snapshot, payload: &Value) {
        if snapshot == Snapshot::GcodeList {
            self.load_gcodes(payload);
            return;
        }
        let Some(kind) = snapshot.event_kind() else {
            return;
        };
        let Some(event_kind) = self.settings.bindings.kind_of(kind) else {
            debug!("Snapshot kind {} is not bound", kind);
            return;
        };
        let applied = self.apply_update(kind, decode::decode(event_kind, payload));
        if applied == 0 {
            self.render_all(view::placeholders(snapshot));
        }
    }

    pub fn snapshot_failed(&mut self, snapshot: Snapshot, error: &TransportError) {
        warn!("Snapshot {:?} failed: {}", snapshot, error);
        self.render_all(view::placeholders(snapshot));
    }

    fn load_gcodes(&mut self, payload: &Value) {
        let Some(list) = payload.get("gcode_list").and_then(Value::as_array) else {
            warn!("G-code list missing from response");
            return;
        };
        self.gcodes = list
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect();
        debug!("Loaded {} g-code commands", self.gcodes.len());
    }

    pub fn handle_feedback(&mut self, feedback: Feedback) {
        match feedback {
            Feedback::Snapshot {
                snapshot,
                result: Ok(payload),
            } => self.snapshot_loaded(snapshot, &payload),
            Feedback::Snapshot {
                snapshot,
                result: Err(e),
            } => self.snapshot_failed(snapshot, &e),
            Feedback::Fallback {
                event,
                action,
                result,
            } => self.fallback_outcome(&event, &action, result),
        }
    }

    pub fn channel_changed(&mut self, channel: ChannelState) {
        if channel == self.channel {
            return;
        }
        self.channel = channel;
        let label = channel.label();
        self.render_all(vec![(
            "connection".to_string(),
            Fragment::with_state(label, label.to_ascii_lowercase()),
        )]);
        if channel == ChannelState::Connected {
            self.backend.fetch_snapshot(Snapshot::AcStatus);
        }
    }

    pub fn refresh_all(&mut self) {
        for snapshot in Snapshot::ALL {
            self.backend.fetch_snapshot(snapshot);
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.refresh.next_deadline()
    }

    pub fn fire_due(&mut self, now: Instant) {
        for snapshot in self.refresh.take_due(now) {
            debug!("Debounced refresh of {:?}", snapshot);
            self.backend.fetch_snapshot(snapshot);
        }
    }

    /// Cached g-code commands starting with the last line of `input`,
    /// case-insensitively.
    pub fn suggest_gcode(&self, input: &str) -> Vec<String> {
        let last = input.rsplit('\n').next().unwrap_or("").trim().to_ascii_uppercase();
        if last.is_empty() {
            return Vec::new();
        }
        self.gcodes
            .iter()
            .filter(|g| g.to_ascii_uppercase().starts_with(&last))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }

    /// The whole rendered view.
    pub fn snapshot(&self) -> Vec<(String, Fragment)> {
        let ctx = ViewContext {
            state: &self.state,
            config: &self.settings.view,
            now: Utc::now(),
        };
        let label = self.channel.label();
        let mut fragments = vec![(
            "connection".to_string(),
            Fragment::with_state(label, label.to_ascii_lowercase()),
        )];
        fragments.extend(view::all_fragments(&ctx));
        fragments
    }
}

/// Backend over the realtime client's queues plus spawned HTTP requests.
pub struct ChannelBackend {
    frames: mpsc::Sender<OutboundFrame>,
    channel: watch::Receiver<ChannelState>,
    http: HttpClient,
    outside_location: String,
    feedback: mpsc::Sender<Feedback>,
}

impl ChannelBackend {
    pub fn new(
        frames: mpsc::Sender<OutboundFrame>,
        channel: watch::Receiver<ChannelState>,
        http: HttpClient,
        outside_location: String,
        feedback: mpsc::Sender<Feedback>,
    ) -> Self {
        Self {
            frames,
            channel,
            http,
            outside_location,
            feedback,
        }
    }
}

impl Backend for ChannelBackend {
    fn is_live(&self) -> bool {
        *self.channel.borrow() == ChannelState::Connected
    }

    fn emit(&mut self, frame: OutboundFrame) -> Result<(), TransportError> {
        self.frames.try_send(frame).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => TransportError::NotConnected,
        })
    }

    fn post_fallback(&mut self, route: &str, command: &OutboundCommand) {
        let http = self.http.clone();
        let feedback = self.feedback.clone();
        let route = route.to_string();
        let body = command.payload();
        let event = command.event.clone();
        let action = command.action.clone();
        tokio::spawn(async move {
            let result = http.post_json(&route, &body).await;
            if feedback
                .send(Feedback::Fallback {
                    event,
                    action,
                    result,
                })
                .await
                .is_err()
            {
                debug!("Feedback channel closed, dropping fallback result");
            }
        });
    }

    fn fetch_snapshot(&mut self, snapshot: Snapshot) {
        let http = self.http.clone();
        let feedback = self.feedback.clone();
        let url = self.http.snapshot_url(snapshot, &self.outside_location);
        tokio::spawn(async move {
            let result = http.get_json(url).await;
            if feedback
                .send(Feedback::Snapshot { snapshot, result })
                .await
                .is_err()
            {
                debug!("Feedback channel closed, dropping {:?} snapshot", snapshot);
            }
        });
    }
}
