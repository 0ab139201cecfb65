//! Text framing for Engine.IO v4 carrying Socket.IO v5 packets.
//!
//! A websocket text frame is one Engine.IO packet: a single type digit
//! followed by its data. Type `4` (message) wraps a Socket.IO packet, which is
//! again a type digit, an optional `/namespace,`, an optional ack id and a
//! JSON body. Binary attachments are not supported.

use serde::Deserialize;
use serde_json::Value;

use crate::error::CodecError;

pub const DEFAULT_NAMESPACE: &str = "/";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    #[serde(default)]
    pub upgrades: Vec<String>,
    pub ping_interval: u64,
    pub ping_timeout: u64,
    #[serde(default)]
    pub max_payload: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping(String),
    Pong(String),
    Message(SocketPacket),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect {
        namespace: String,
        data: Option<Value>,
    },
    Disconnect {
        namespace: String,
    },
    Event {
        namespace: String,
        id: Option<u64>,
        name: String,
        payload: Value,
    },
    Ack {
        namespace: String,
        id: u64,
        data: Value,
    },
    ConnectError {
        namespace: String,
        data: Option<Value>,
    },
}

impl SocketPacket {
    pub fn event(name: impl Into<String>, payload: Value) -> Self {
        SocketPacket::Event {
            namespace: DEFAULT_NAMESPACE.to_string(),
            id: None,
            name: name.into(),
            payload,
        }
    }
}

pub fn decode(frame: &str) -> Result<EnginePacket, CodecError> {
    let mut chars = frame.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let rest = chars.as_str();

    match kind {
        '0' => Ok(EnginePacket::Open(serde_json::from_str(rest)?)),
        '1' => Ok(EnginePacket::Close),
        '2' => Ok(EnginePacket::Ping(rest.to_string())),
        '3' => Ok(EnginePacket::Pong(rest.to_string())),
        '4' => decode_socket(rest).map(EnginePacket::Message),
        '5' => Ok(EnginePacket::Upgrade),
        '6' => Ok(EnginePacket::Noop),
        found => Err(CodecError::UnknownType {
            layer: "engine.io",
            found,
        }),
    }
}

fn decode_socket(packet: &str) -> Result<SocketPacket, CodecError> {
    let mut chars = packet.chars();
    let kind = chars.next().ok_or(CodecError::Empty)?;
    let mut rest = chars.as_str();

    if matches!(kind, '5' | '6') {
        return Err(CodecError::Unsupported("binary socket.io packet"));
    }

    let mut namespace = DEFAULT_NAMESPACE.to_string();
    if rest.starts_with('/') {
        let (ns, tail) = match rest.split_once(',') {
            Some((ns, tail)) => (ns, tail),
            None => (rest, ""),
        };
        namespace = ns.to_string();
        rest = tail;
    }

    let digits = rest.chars().take_while(char::is_ascii_digit).count();
    let id = if digits > 0 {
        let (raw, tail) = rest.split_at(digits);
        rest = tail;
        Some(
            raw.parse::<u64>()
                .map_err(|_| CodecError::Malformed("ack id out of range"))?,
        )
    } else {
        None
    };

    let body = if rest.is_empty() {
        None
    } else {
        Some(serde_json::from_str::<Value>(rest)?)
    };

    match kind {
        '0' => Ok(SocketPacket::Connect {
            namespace,
            data: body,
        }),
        '1' => Ok(SocketPacket::Disconnect { namespace }),
        '2' => {
            let (name, payload) = split_event(body)?;
            Ok(SocketPacket::Event {
                namespace,
                id,
                name,
                payload,
            })
        }
        '3' => {
            let id = id.ok_or(CodecError::Malformed("ack without id"))?;
            Ok(SocketPacket::Ack {
                namespace,
                id,
                data: body.unwrap_or(Value::Null),
            })
        }
        '4' => Ok(SocketPacket::ConnectError {
            namespace,
            data: body,
        }),
        found => Err(CodecError::UnknownType {
            layer: "socket.io",
            found,
        }),
    }
}

/// Event bodies are `["name", payload, ...]`. Only the first argument is kept;
/// a bare `["name"]` carries a null payload.
fn split_event(body: Option<Value>) -> Result<(String, Value), CodecError> {
    let Some(Value::Array(mut args)) = body else {
        return Err(CodecError::Malformed("event body is not an array"));
    };
    if args.is_empty() {
        return Err(CodecError::Malformed("event without name"));
    }
    let name = match args.remove(0) {
        Value::String(name) => name,
        _ => return Err(CodecError::Malformed("event name is not a string")),
    };
    let payload = if args.is_empty() {
        Value::Null
    } else {
        args.swap_remove(0)
    };
    Ok((name, payload))
}

pub fn encode(packet: &EnginePacket) -> String {
    match packet {
        EnginePacket::Open(_) => "0".to_string(),
        EnginePacket::Close => "1".to_string(),
        EnginePacket::Ping(data) => format!("2{data}"),
        EnginePacket::Pong(data) => format!("3{data}"),
        EnginePacket::Message(socket) => format!("4{}", encode_socket(socket)),
        EnginePacket::Upgrade => "5".to_string(),
        EnginePacket::Noop => "6".to_string(),
    }
}

fn encode_socket(packet: &SocketPacket) -> String {
    match packet {
        SocketPacket::Connect { namespace, data } => {
            format!("0{}{}", namespace_prefix(namespace), json_or_empty(data.as_ref()))
        }
        SocketPacket::Disconnect { namespace } => format!("1{}", namespace_prefix(namespace)),
        SocketPacket::Event {
            namespace,
            id,
            name,
            payload,
        } => {
            let args = if payload.is_null() {
                Value::Array(vec![Value::String(name.clone())])
            } else {
                Value::Array(vec![Value::String(name.clone()), payload.clone()])
            };
            format!(
                "2{}{}{}",
                namespace_prefix(namespace),
                id.map(|id| id.to_string()).unwrap_or_default(),
                args
            )
        }
        SocketPacket::Ack {
            namespace,
            id,
            data,
        } => format!("3{}{}{}", namespace_prefix(namespace), id, data),
        SocketPacket::ConnectError { namespace, data } => {
            format!("4{}{}", namespace_prefix(namespace), json_or_empty(data.as_ref()))
        }
    }
}

fn namespace_prefix(namespace: &str) -> String {
    if namespace == DEFAULT_NAMESPACE || namespace.is_empty() {
        String::new()
    } else {
        format!("{namespace},")
    }
}

fn json_or_empty(value: Option<&Value>) -> String {
    value.map(Value::to_string).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_open_handshake() {
        let frame = r#"0{"sid":"abc","upgrades":[],"pingInterval":25000,"pingTimeout":20000,"maxPayload":1000000}"#;
        let EnginePacket::Open(handshake) = decode(frame).unwrap() else {
            panic!("expected open packet");
        };
        assert_eq!(handshake.sid, "abc");
        assert_eq!(handshake.ping_interval, 25000);
        assert_eq!(handshake.ping_timeout, 20000);
        assert_eq!(handshake.max_payload, Some(1_000_000));
    }

    #[test]
    fn decodes_event_with_payload() {
        let packet = decode(r#"42["status",{"bed_temperature":57.34}]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                namespace: "/".into(),
                id: None,
                name: "status".into(),
                payload: json!({"bed_temperature": 57.34}),
            })
        );
    }

    #[test]
    fn decodes_event_with_namespace_and_ack_id() {
        let packet = decode(r#"42/printer,17["image",{"image":"AAAA"}]"#).unwrap();
        assert_eq!(
            packet,
            EnginePacket::Message(SocketPacket::Event {
                namespace: "/printer".into(),
                id: Some(17),
                name: "image".into(),
                payload: json!({"image": "AAAA"}),
            })
        );
    }

    #[test]
    fn event_without_payload_is_null() {
        let packet = decode(r#"42["image"]"#).unwrap();
        let EnginePacket::Message(SocketPacket::Event { payload, .. }) = packet else {
            panic!("expected event");
        };
        assert!(payload.is_null());
    }

    #[test]
    fn decodes_connect_ack_and_error() {
        assert_eq!(
            decode(r#"40{"sid":"xyz"}"#).unwrap(),
            EnginePacket::Message(SocketPacket::Connect {
                namespace: "/".into(),
                data: Some(json!({"sid": "xyz"})),
            })
        );
        assert_eq!(
            decode(r#"44{"message":"Not authorized"}"#).unwrap(),
            EnginePacket::Message(SocketPacket::ConnectError {
                namespace: "/".into(),
                data: Some(json!({"message": "Not authorized"})),
            })
        );
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(matches!(decode(""), Err(CodecError::Empty)));
        assert!(matches!(
            decode("9"),
            Err(CodecError::UnknownType { layer: "engine.io", .. })
        ));
        assert!(matches!(
            decode(r#"42{"not":"an array"}"#),
            Err(CodecError::Malformed(_))
        ));
        assert!(matches!(decode("42[1,2]"), Err(CodecError::Malformed(_))));
        assert!(matches!(decode("42[\"x\""), Err(CodecError::InvalidJson(_))));
        assert!(matches!(
            decode(r#"451-["x",{"_placeholder":true,"num":0}]"#),
            Err(CodecError::Unsupported(_))
        ));
    }

    #[test]
    fn encodes_connect_with_auth() {
        let packet = EnginePacket::Message(SocketPacket::Connect {
            namespace: "/".into(),
            data: Some(json!({"role": "view"})),
        });
        assert_eq!(encode(&packet), r#"40{"role":"view"}"#);
    }

    #[test]
    fn encodes_event_for_emit() {
        let packet = EnginePacket::Message(SocketPacket::event(
            "ac_control",
            json!({"action": "power_on"}),
        ));
        assert_eq!(encode(&packet), r#"42["ac_control",{"action":"power_on"}]"#);
    }

    #[test]
    fn encoded_namespaced_event_decodes_back() {
        let original = SocketPacket::Event {
            namespace: "/admin".into(),
            id: Some(3),
            name: "printerAction".into(),
            payload: json!({"action": "home"}),
        };
        let frame = encode(&EnginePacket::Message(original.clone()));
        assert_eq!(frame, r#"42/admin,3["printerAction",{"action":"home"}]"#);
        assert_eq!(decode(&frame).unwrap(), EnginePacket::Message(original));
    }

    #[test]
    fn ping_pong_echo_probe_data() {
        assert_eq!(decode("2probe").unwrap(), EnginePacket::Ping("probe".into()));
        assert_eq!(encode(&EnginePacket::Pong("probe".into())), "3probe");
        assert_eq!(encode(&EnginePacket::Pong(String::new())), "3");
    }
}
