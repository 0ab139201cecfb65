use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::json;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{HeaderValue, header};
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::RealtimeConfig;
use crate::error::TransportError;

use super::codec::{self, DEFAULT_NAMESPACE, EnginePacket, SocketPacket};
use super::{ChannelState, InboundFrame, OutboundFrame};

pub struct SocketClient {
    config: RealtimeConfig,
}

impl SocketClient {
    pub fn new(config: RealtimeConfig) -> Self {
        Self { config }
    }

    /// Main connection loop. Connects, forwards events, writes queued emits,
    /// reconnects on failure. Emits that never reach the wire are handed back
    /// on `lost_tx`. Returns once the event consumer is gone.
    pub async fn run(
        &self,
        event_tx: mpsc::Sender<InboundFrame>,
        mut outbound_rx: mpsc::Receiver<OutboundFrame>,
        lost_tx: mpsc::Sender<OutboundFrame>,
        state_tx: watch::Sender<ChannelState>,
    ) {
        let mut backoff = self.config.reconnect_min;

        loop {
            info!("Connecting to realtime channel at {}", self.config.base_url);
            state_tx.send_replace(ChannelState::Connecting);

            let result = self
                .run_session(&event_tx, &mut outbound_rx, &lost_tx, &state_tx)
                .await;
            state_tx.send_replace(ChannelState::Disconnected);
            report_lost(&mut outbound_rx, &lost_tx).await;

            if event_tx.is_closed() {
                info!("Event consumer gone, stopping realtime client");
                return;
            }

            let delay = match result {
                Ok(()) => {
                    info!("Realtime session ended cleanly");
                    backoff = self.config.reconnect_min;
                    backoff
                }
                Err(e) => {
                    error!("Realtime session error: {}. Reconnecting in {:?}", e, backoff);
                    let delay = backoff;
                    backoff = (backoff * 2).min(self.config.reconnect_max);
                    delay
                }
            };
            tokio::time::sleep(delay).await;
        }
    }

    async fn run_session(
        &self,
        event_tx: &mpsc::Sender<InboundFrame>,
        outbound_rx: &mut mpsc::Receiver<OutboundFrame>,
        lost_tx: &mpsc::Sender<OutboundFrame>,
        state_tx: &watch::Sender<ChannelState>,
    ) -> Result<(), TransportError> {
        let url = socket_url(&self.config.base_url)?;
        let mut request = url.as_str().into_client_request()?;
        if let Some(cookie) = &self.config.session_cookie {
            let value =
                HeaderValue::from_str(cookie).map_err(|e| TransportError::BadHeader(e.to_string()))?;
            request.headers_mut().insert(header::COOKIE, value);
        }

        let (ws, _) = connect_async(request).await?;
        let (mut writer, mut reader) = ws.split();

        let handshake = loop {
            match reader.next().await {
                Some(Ok(Message::Text(text))) => match codec::decode(&text)? {
                    EnginePacket::Open(handshake) => break handshake,
                    other => debug!("Ignoring {:?} before handshake", other),
                },
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e.into()),
                None => return Err(TransportError::Closed("stream ended before handshake")),
            }
        };
        debug!("Engine.IO session {} opened", handshake.sid);

        // Stale emits from a previous session are not replayed
        report_lost(outbound_rx, lost_tx).await;

        let connect = EnginePacket::Message(SocketPacket::Connect {
            namespace: DEFAULT_NAMESPACE.to_string(),
            data: Some(json!({ "role": self.config.role })),
        });
        writer.send(Message::Text(codec::encode(&connect))).await?;

        let ping_window = Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
        let watchdog = tokio::time::sleep(ping_window);
        tokio::pin!(watchdog);
        let mut connected = false;

        loop {
            tokio::select! {
                _ = &mut watchdog => {
                    return Err(TransportError::PingTimeout(ping_window));
                }
                msg = reader.next() => {
                    let text = match msg {
                        Some(Ok(Message::Text(text))) => text,
                        Some(Ok(Message::Close(_))) => return Ok(()),
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(TransportError::Closed("stream ended")),
                    };
                    let packet = match codec::decode(&text) {
                        Ok(packet) => packet,
                        Err(e) => {
                            warn!("Dropping undecodable frame: {}", e);
                            continue;
                        }
                    };

                    match packet {
                        EnginePacket::Ping(data) => {
                            writer.send(Message::Text(codec::encode(&EnginePacket::Pong(data)))).await?;
                            watchdog.as_mut().reset(Instant::now() + ping_window);
                        }
                        EnginePacket::Close => return Ok(()),
                        EnginePacket::Message(SocketPacket::Connect { namespace, .. }) => {
                            info!("Connected to realtime namespace {}", namespace);
                            connected = true;
                            state_tx.send_replace(ChannelState::Connected);
                        }
                        EnginePacket::Message(SocketPacket::ConnectError { data, .. }) => {
                            let reason = data
                                .as_ref()
                                .and_then(|d| d.get("message"))
                                .and_then(|m| m.as_str())
                                .unwrap_or("no reason given")
                                .to_string();
                            return Err(TransportError::Refused(reason));
                        }
                        EnginePacket::Message(SocketPacket::Disconnect { namespace }) => {
                            info!("Server disconnected namespace {}", namespace);
                            return Ok(());
                        }
                        EnginePacket::Message(SocketPacket::Event { name, payload, .. }) => {
                            let shutdown = name == "server_shutdown";
                            let frame = InboundFrame { event: name, payload };
                            if event_tx.send(frame).await.is_err() {
                                return Err(TransportError::Closed("event consumer gone"));
                            }
                            if shutdown {
                                info!("Server is shutting down, dropping session");
                                return Ok(());
                            }
                        }
                        EnginePacket::Message(SocketPacket::Ack { id, .. }) => {
                            debug!("Ignoring ack {}", id);
                        }
                        EnginePacket::Open(_)
                        | EnginePacket::Pong(_)
                        | EnginePacket::Upgrade
                        | EnginePacket::Noop => {}
                    }
                }
                Some(frame) = outbound_rx.recv(), if connected => {
                    info!("Emitting {}: {}", frame.event, frame.payload);
                    let packet = EnginePacket::Message(SocketPacket::event(
                        frame.event.clone(),
                        frame.payload.clone(),
                    ));
                    if let Err(e) = writer.send(Message::Text(codec::encode(&packet))).await {
                        if lost_tx.send(frame).await.is_err() {
                            debug!("Lost-emit consumer gone");
                        }
                        return Err(e.into());
                    }
                }
            }
        }
    }
}

/// Hand every still-queued emit back as undelivered.
async fn report_lost(
    outbound_rx: &mut mpsc::Receiver<OutboundFrame>,
    lost_tx: &mpsc::Sender<OutboundFrame>,
) {
    let mut dropped = 0;
    while let Ok(frame) = outbound_rx.try_recv() {
        dropped += 1;
        if lost_tx.send(frame).await.is_err() {
            debug!("Lost-emit consumer gone");
        }
    }
    if dropped > 0 {
        warn!("{} command(s) were not delivered", dropped);
    }
}

/// `http(s)://host/base` → `ws(s)://host/base/socket.io/?EIO=4&transport=websocket`
fn socket_url(base: &Url) -> Result<Url, TransportError> {
    let mut url = base.clone();
    let scheme = match base.scheme() {
        "http" => "ws",
        "https" => "wss",
        _ => return Err(TransportError::BadUrl(base.to_string())),
    };
    url.set_scheme(scheme)
        .map_err(|_| TransportError::BadUrl(base.to_string()))?;
    let base_path = base.path().trim_end_matches('/').to_string();
    url.set_path(&format!("{base_path}/socket.io/"));
    url.set_query(Some("EIO=4&transport=websocket"));
    url.set_fragment(None);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::net::TcpListener;
    use tokio::sync::oneshot;

    #[test]
    fn socket_url_maps_scheme_and_path() {
        let url = socket_url(&Url::parse("https://home.example.net").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://home.example.net/socket.io/?EIO=4&transport=websocket"
        );

        let url = socket_url(&Url::parse("http://10.0.0.2:5000/dash/").unwrap()).unwrap();
        assert_eq!(
            url.as_str(),
            "ws://10.0.0.2:5000/dash/socket.io/?EIO=4&transport=websocket"
        );
    }

    fn test_config(port: u16) -> RealtimeConfig {
        RealtimeConfig {
            base_url: Url::parse(&format!("http://127.0.0.1:{port}")).unwrap(),
            session_cookie: Some("session=abc".into()),
            role: "view".into(),
            reconnect_min: Duration::from_millis(50),
            reconnect_max: Duration::from_millis(100),
        }
    }

    async fn next_text<S>(ws: &mut S) -> String
    where
        S: futures::Stream<Item = Result<Message, tokio_tungstenite::tungstenite::Error>> + Unpin,
    {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text,
                Some(Ok(_)) => continue,
                other => panic!("unexpected websocket item: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn session_forwards_events_and_emits_commands() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(
                r#"0{"sid":"s1","upgrades":[],"pingInterval":25000,"pingTimeout":20000}"#.into(),
            ))
            .await
            .unwrap();

            let connect = next_text(&mut ws).await;
            assert_eq!(connect, r#"40{"role":"view"}"#);
            ws.send(Message::Text(r#"40{"sid":"n1"}"#.into())).await.unwrap();
            ws.send(Message::Text("2".into())).await.unwrap();
            assert_eq!(next_text(&mut ws).await, "3");

            ws.send(Message::Text(r#"42["status",{"bed_temperature":57.34}]"#.into()))
                .await
                .unwrap();

            next_text(&mut ws).await
        });

        let (event_tx, mut event_rx) = mpsc::channel(8);
        let (out_tx, out_rx) = mpsc::channel(8);
        let (lost_tx, _lost_rx) = mpsc::channel(8);
        let (state_tx, mut state_rx) = watch::channel(ChannelState::Disconnected);

        let client = SocketClient::new(test_config(port));
        let handle =
            tokio::spawn(async move { client.run(event_tx, out_rx, lost_tx, state_tx).await });

        let frame = event_rx.recv().await.unwrap();
        assert_eq!(frame.event, "status");
        assert_eq!(frame.payload, json!({"bed_temperature": 57.34}));

        state_rx
            .wait_for(|state| *state == ChannelState::Connected)
            .await
            .unwrap();
        out_tx
            .send(OutboundFrame {
                event: "ac_control".into(),
                payload: json!({"action": "power_on"}),
            })
            .await
            .unwrap();

        let emitted = server.await.unwrap();
        assert_eq!(emitted, r#"42["ac_control",{"action":"power_on"}]"#);
        handle.abort();
    }

    #[tokio::test]
    async fn connect_error_is_reported_as_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(
                r#"0{"sid":"s1","pingInterval":25000,"pingTimeout":20000}"#.into(),
            ))
            .await
            .unwrap();
            let _ = next_text(&mut ws).await;
            ws.send(Message::Text(r#"44{"message":"unauthenticated"}"#.into()))
                .await
                .unwrap();
            // keep the socket open until the client hangs up
            while ws.next().await.is_some() {}
        });

        let (event_tx, _event_rx) = mpsc::channel(8);
        let (_out_tx, mut out_rx) = mpsc::channel(8);
        let (lost_tx, _lost_rx) = mpsc::channel(8);
        let (state_tx, _state_rx) = watch::channel(ChannelState::Disconnected);

        let client = SocketClient::new(test_config(port));
        let err = client
            .run_session(&event_tx, &mut out_rx, &lost_tx, &state_tx)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Refused(reason) if reason == "unauthenticated"));
    }

    #[tokio::test]
    async fn emits_queued_when_the_session_drops_are_reported_lost() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let (opened_tx, opened_rx) = oneshot::channel::<()>();
        let (queued_tx, queued_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(
                r#"0{"sid":"s1","pingInterval":25000,"pingTimeout":20000}"#.into(),
            ))
            .await
            .unwrap();
            // namespace connect request; never acknowledged
            let _ = next_text(&mut ws).await;
            opened_tx.send(()).unwrap();
            queued_rx.await.unwrap();
            ws.send(Message::Close(None)).await.unwrap();
        });

        let (event_tx, _event_rx) = mpsc::channel(8);
        let (out_tx, out_rx) = mpsc::channel(8);
        let (lost_tx, mut lost_rx) = mpsc::channel(8);
        let (state_tx, _state_rx) = watch::channel(ChannelState::Disconnected);

        let client = SocketClient::new(test_config(port));
        let handle =
            tokio::spawn(async move { client.run(event_tx, out_rx, lost_tx, state_tx).await });

        opened_rx.await.unwrap();
        let frame = OutboundFrame {
            event: "car_heater_control".into(),
            payload: json!({"action": "turn_on"}),
        };
        out_tx.send(frame.clone()).await.unwrap();
        queued_tx.send(()).unwrap();

        assert_eq!(lost_rx.recv().await.unwrap(), frame);
        handle.abort();
    }
}
