pub mod client;
pub mod codec;

/// A named event pushed by the server, payload still untrusted JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct InboundFrame {
    pub event: String,
    pub payload: serde_json::Value,
}

/// A named event to emit to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundFrame {
    pub event: String,
    pub payload: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Connecting,
    Connected,
    Disconnected,
}

impl ChannelState {
    pub fn label(self) -> &'static str {
        match self {
            ChannelState::Connecting => "Connecting",
            ChannelState::Connected => "Connected",
            ChannelState::Disconnected => "Disconnected",
        }
    }
}
