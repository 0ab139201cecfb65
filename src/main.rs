mod command;
mod config;
mod debounce;
mod error;
mod http;
mod socketio;
mod sync;

use std::io::Write;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{error, info, warn};

use socketio::{ChannelState, InboundFrame, OutboundFrame};
use sync::render::{ConsoleRenderer, Renderer};
use sync::{Backend, ChannelBackend, Feedback, SyncSettings, ViewStateSync};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Starting dashboard-sync (backend={}, role={}, events bound={})",
        config.dashboard.base_url,
        config.realtime.role,
        config.bindings.events.len(),
    );

    let http = match http::HttpClient::new(&config.dashboard) {
        Ok(h) => h,
        Err(e) => {
            error!("Cannot build HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    let mut sigterm =
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to register SIGTERM handler: {}", e);
                std::process::exit(1);
            }
        };

    // Channels
    let (event_tx, mut event_rx) = mpsc::channel::<InboundFrame>(200);
    let (frame_tx, frame_rx) = mpsc::channel::<OutboundFrame>(50);
    let (lost_tx, mut lost_rx) = mpsc::channel::<OutboundFrame>(50);
    let (state_tx, mut state_rx) = watch::channel(ChannelState::Connecting);
    let (feedback_tx, mut feedback_rx) = mpsc::channel::<Feedback>(50);
    let (line_tx, mut line_rx) = mpsc::channel::<String>(20);

    let socket_client = socketio::client::SocketClient::new(config.realtime.clone());
    let socket_handle = tokio::spawn(async move {
        socket_client.run(event_tx, frame_rx, lost_tx, state_tx).await;
    });

    let stdin_handle = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Reading stdin failed: {}", e);
                    break;
                }
            }
        }
    });

    let backend = ChannelBackend::new(
        frame_tx,
        state_rx.clone(),
        http,
        config.view.outside_location.clone(),
        feedback_tx,
    );
    let mut sync = ViewStateSync::new(
        ConsoleRenderer::stdout(),
        backend,
        SyncSettings::from_config(&config),
    );
    sync.refresh_all();

    // Main loop: the only place the view state is touched
    loop {
        let deadline = sync.next_deadline();
        tokio::select! {
            Some(frame) = event_rx.recv() => {
                sync.apply_event(&frame.event, &frame.payload);
            }
            Some(line) = line_rx.recv() => {
                if handle_line(&mut sync, &line, &mut std::io::stdout()) == Flow::Quit {
                    info!("Quit requested");
                    break;
                }
            }
            Some(frame) = lost_rx.recv() => {
                sync.emit_lost(&frame);
            }
            Some(feedback) = feedback_rx.recv() => {
                sync.handle_feedback(feedback);
            }
            Ok(()) = state_rx.changed() => {
                let channel = *state_rx.borrow_and_update();
                sync.channel_changed(channel);
            }
            _ = tokio::time::sleep_until(deadline.unwrap_or_else(far_future)), if deadline.is_some() => {
                sync.fire_due(Instant::now());
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Received SIGINT, shutting down");
                break;
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
                break;
            }
        }
    }

    // Cleanup
    stdin_handle.abort();
    socket_handle.abort();
    info!("dashboard-sync stopped");
}

fn far_future() -> Instant {
    Instant::now() + Duration::from_secs(3600)
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// One console line: a `:` directive or an `<event> <action> [k=v ...]` command.
/// Directive output goes to `out`.
fn handle_line<R: Renderer, B: Backend, W: Write>(
    sync: &mut ViewStateSync<R, B>,
    line: &str,
    out: &mut W,
) -> Flow {
    let line = line.trim();
    if line.is_empty() {
        return Flow::Continue;
    }

    if let Some(directive) = line.strip_prefix(':') {
        let (name, rest) = directive.split_once(' ').unwrap_or((directive, ""));
        match name {
            "quit" | "q" => return Flow::Quit,
            "state" => print_lines(
                out,
                sync.snapshot()
                    .into_iter()
                    .map(|(target, fragment)| format!("{target}: {fragment}")),
            ),
            "refresh" => sync.refresh_all(),
            "suggest" => {
                // literal "\n" lets a multi-line g-code buffer be typed on one line
                let input = rest.replace("\\n", "\n");
                print_lines(
                    out,
                    sync.suggest_gcode(&input).into_iter().map(|gcode| format!("  {gcode}")),
                );
            }
            other => warn!("Unknown directive :{}", other),
        }
        return Flow::Continue;
    }

    match command::parse_line(line) {
        Ok(cmd) => {
            let delivery = sync.emit_command(cmd);
            info!("Command delivery: {:?}", delivery);
        }
        Err(e) => warn!("Invalid command: {}", e),
    }
    Flow::Continue
}

fn print_lines<W: Write>(out: &mut W, lines: impl IntoIterator<Item = String>) {
    for line in lines {
        if let Err(e) = writeln!(out, "{line}") {
            warn!("Console output failed: {}", e);
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::OutboundCommand;
    use crate::config::{Bindings, TimeUnit, ViewConfig};
    use crate::error::TransportError;
    use crate::http::Snapshot;
    use serde_json::json;
    use crate::sync::render::MemoryRenderer;

    #[derive(Default)]
    struct RecordingBackend {
        emitted: Vec<OutboundFrame>,
        fetches: Vec<Snapshot>,
    }

    impl Backend for RecordingBackend {
        fn is_live(&self) -> bool {
            true
        }

        fn emit(&mut self, frame: OutboundFrame) -> Result<(), TransportError> {
            self.emitted.push(frame);
            Ok(())
        }

        fn post_fallback(&mut self, _route: &str, _command: &OutboundCommand) {}

        fn fetch_snapshot(&mut self, snapshot: Snapshot) {
            self.fetches.push(snapshot);
        }
    }

    fn console() -> ViewStateSync<MemoryRenderer, RecordingBackend> {
        let settings = SyncSettings {
            bindings: Bindings::default(),
            view: ViewConfig {
                remaining_time_unit: TimeUnit::Minutes,
                outside_location: "Parveke".into(),
                stale_after: Duration::from_secs(600),
                avg_rates_debounce: Duration::from_secs(3),
                outside_stats_debounce: Duration::from_secs(2),
            },
        };
        ViewStateSync::new(MemoryRenderer::new(), RecordingBackend::default(), settings)
    }

    fn run(sync: &mut ViewStateSync<MemoryRenderer, RecordingBackend>, line: &str) -> (Flow, String) {
        let mut out = Vec::new();
        let flow = handle_line(sync, line, &mut out);
        (flow, String::from_utf8(out).unwrap())
    }

    #[test]
    fn quit_directives_stop_the_loop() {
        let mut sync = console();
        assert_eq!(run(&mut sync, ":quit").0, Flow::Quit);
        assert_eq!(run(&mut sync, "  :q ").0, Flow::Quit);
        assert_eq!(run(&mut sync, "").0, Flow::Continue);
        assert_eq!(run(&mut sync, ":nope").0, Flow::Continue);
    }

    #[test]
    fn state_lists_rendered_view() {
        let mut sync = console();
        sync.apply_event("status", &json!({"bed_temperature": 57.34}));
        let (flow, out) = run(&mut sync, ":state");
        assert_eq!(flow, Flow::Continue);
        assert!(out.starts_with("connection: Connecting [connecting]\n"));
        assert!(out.contains("bedTemp: 57.3 °C\n"));
    }

    #[test]
    fn refresh_requests_every_snapshot() {
        let mut sync = console();
        run(&mut sync, ":refresh");
        assert_eq!(sync.backend().fetches, Snapshot::ALL.to_vec());
    }

    #[test]
    fn suggest_uses_last_typed_line() {
        let mut sync = console();
        sync.snapshot_loaded(
            Snapshot::GcodeList,
            &json!({"gcode_list": ["G28", "G29", "M104 S200", "M106"]}),
        );
        let (_, out) = run(&mut sync, r":suggest G28\nm10");
        assert_eq!(out, "  M104 S200\n  M106\n");

        let (_, out) = run(&mut sync, ":suggest");
        assert!(out.is_empty());
    }

    #[test]
    fn command_lines_are_emitted() {
        let mut sync = console();
        assert_eq!(run(&mut sync, "ac_control power_on").0, Flow::Continue);
        assert_eq!(
            sync.backend().emitted,
            vec![OutboundFrame {
                event: "ac_control".into(),
                payload: json!({"action": "power_on"}),
            }]
        );

        run(&mut sync, "ac_control");
        assert_eq!(sync.backend().emitted.len(), 1);
    }
}
