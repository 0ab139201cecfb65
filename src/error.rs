use thiserror::Error;

/// Failure to parse or build an Engine.IO / Socket.IO text frame.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("empty frame")]
    Empty,
    #[error("unknown {layer} packet type '{found}'")]
    UnknownType { layer: &'static str, found: char },
    #[error("invalid JSON in frame: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("malformed packet: {0}")]
    Malformed(&'static str),
    #[error("unsupported packet: {0}")]
    Unsupported(&'static str),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid JSON body: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("cannot build realtime url from {0}")]
    BadUrl(String),
    #[error("invalid header value: {0}")]
    BadHeader(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("server refused the connection: {0}")]
    Refused(String),
    #[error("no ping from server within {0:?}")]
    PingTimeout(std::time::Duration),
    #[error("realtime channel is not connected")]
    NotConnected,
    #[error("outbound queue is full")]
    QueueFull,
    #[error("connection closed: {0}")]
    Closed(&'static str),
}

#[derive(Debug, Error, PartialEq)]
pub enum RenderError {
    #[error("render target '{0}' does not exist")]
    MissingTarget(String),
    #[error("render output failed: {0}")]
    Output(String),
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("empty command line")]
    Empty,
    #[error("command needs an action after the event name")]
    MissingAction,
    #[error("parameter '{0}' is not key=value")]
    BadParam(String),
    #[error("unterminated quote")]
    UnterminatedQuote,
    #[error("unsupported {field}: {value}")]
    Unsupported { field: &'static str, value: String },
    #[error("missing parameter '{0}'")]
    MissingParam(&'static str),
    #[error("parameter '{0}' must be numeric")]
    NotNumeric(&'static str),
}
