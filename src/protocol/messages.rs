//! Signaling wire messages
//!
//! Every frame is a flat JSON object with a `type` discriminator.
//! Payload fields are optional at this layer; the router decides which
//! ones a message type requires.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::SignalError;

/// A control message sent by a client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    Greeting,
    Register {
        #[serde(default, deserialize_with = "deserialize_text")]
        username: Option<String>,
        #[serde(default, deserialize_with = "deserialize_text")]
        ip: Option<String>,
        #[serde(default, deserialize_with = "deserialize_port")]
        port: Option<u16>,
    },
    GetName,
    GetPeer {
        #[serde(default, deserialize_with = "deserialize_text")]
        username: Option<String>,
    },
    StartChat {
        #[serde(default, deserialize_with = "deserialize_text")]
        target: Option<String>,
    },
    ChatAccept,
    ChatDecline,
    #[serde(other)]
    Unknown,
}

/// A message sent by the server, either as a reply or forwarded to a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    GreetBack { message: String },
    RegisterAck { message: String },
    YourName { username: String },
    PeerInfo { username: String, ip: String, port: u16 },
    ChatRequest { from: String },
    ChatInit { username: String, ip: String, port: u16 },
    Error { message: String },
}

impl ServerMessage {
    pub fn error(reason: impl ToString) -> Self {
        ServerMessage::Error {
            message: reason.to_string(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Decodes one text frame into a `ClientMessage`.
///
/// Unknown `type` values decode to `ClientMessage::Unknown`.
pub fn parse_message(raw: &str) -> Result<ClientMessage, SignalError> {
    Ok(serde_json::from_str(raw)?)
}

/// Any scalar is accepted as text; arrays and objects count as missing.
fn text_from_value(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(text_from_value))
}

/// Ports arrive as numbers from most clients, as strings from some.
/// Whole floats such as `9000.0` are accepted.
/// Anything outside 1..=65535 counts as missing.
fn port_from_value(value: &Value) -> Option<u16> {
    let port = match value {
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u16::MAX as f64)
                .map(|f| f as u64)
        })?,
        Value::String(s) => s.trim().parse::<u64>().ok()?,
        _ => return None,
    };
    u16::try_from(port).ok().filter(|p| *p != 0)
}

fn deserialize_port<'de, D>(deserializer: D) -> Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(port_from_value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_register_with_numeric_port() {
        let msg = parse_message(
            r#"{"type":"register","username":"alice","ip":"10.0.0.5","port":9000}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ClientMessage::Register {
                username: Some("alice".into()),
                ip: Some("10.0.0.5".into()),
                port: Some(9000),
            }
        );
    }

    #[test]
    fn accepts_string_port_and_drops_invalid_ones() {
        let msg = parse_message(r#"{"type":"register","username":"a","ip":"h","port":"7000"}"#)
            .unwrap();
        assert!(matches!(msg, ClientMessage::Register { port: Some(7000), .. }));

        for bad in [r#"0"#, r#"70000"#, r#"-1"#, r#""abc""#, r#"true"#, r#"null"#] {
            let raw = format!(r#"{{"type":"register","username":"a","ip":"h","port":{}}}"#, bad);
            let msg = parse_message(&raw).unwrap();
            assert!(
                matches!(msg, ClientMessage::Register { port: None, .. }),
                "port {} should be treated as missing",
                bad
            );
        }
    }

    #[test]
    fn scalar_fields_are_read_as_text() {
        let msg = parse_message(r#"{"type":"get-peer","username":42}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::GetPeer {
                username: Some("42".into())
            }
        );

        let msg = parse_message(r#"{"type":"start-chat","target":true}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::StartChat {
                target: Some("true".into())
            }
        );

        let msg = parse_message(r#"{"type":"register","username":["a"],"ip":{"h":1},"port":1}"#)
            .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Register {
                username: None,
                ip: None,
                port: Some(1)
            }
        ));
    }

    #[test]
    fn whole_float_port_is_accepted() {
        let msg = parse_message(r#"{"type":"register","username":"a","ip":"h","port":9000.0}"#)
            .unwrap();
        assert!(matches!(msg, ClientMessage::Register { port: Some(9000), .. }));

        let msg = parse_message(r#"{"type":"register","username":"a","ip":"h","port":9000.5}"#)
            .unwrap();
        assert!(matches!(msg, ClientMessage::Register { port: None, .. }));
    }

    #[test]
    fn missing_fields_decode_as_none() {
        let msg = parse_message(r#"{"type":"register"}"#).unwrap();
        assert_eq!(
            msg,
            ClientMessage::Register {
                username: None,
                ip: None,
                port: None,
            }
        );

        let msg = parse_message(r#"{"type":"start-chat"}"#).unwrap();
        assert_eq!(msg, ClientMessage::StartChat { target: None });
    }

    #[test]
    fn unit_messages_ignore_extra_fields() {
        let msg = parse_message(r#"{"type":"chat-accept","noise":1}"#).unwrap();
        assert_eq!(msg, ClientMessage::ChatAccept);
        assert_eq!(
            parse_message(r#"{"type":"greeting"}"#).unwrap(),
            ClientMessage::Greeting
        );
    }

    #[test]
    fn unknown_type_is_not_an_error() {
        let msg = parse_message(r#"{"type":"ping-pong"}"#).unwrap();
        assert_eq!(msg, ClientMessage::Unknown);
    }

    #[test]
    fn undecodable_frames_are_decode_errors() {
        assert!(matches!(
            parse_message("not json"),
            Err(SignalError::Decode(_))
        ));
        assert!(matches!(parse_message("[1,2]"), Err(SignalError::Decode(_))));
        assert!(matches!(
            parse_message(r#"{"username":"x"}"#),
            Err(SignalError::Decode(_))
        ));
    }

    #[test]
    fn server_messages_use_kebab_case_tags() {
        let json = ServerMessage::PeerInfo {
            username: "bob".into(),
            ip: "1.2.3.4".into(),
            port: 4000,
        }
        .to_json()
        .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "peer-info");
        assert_eq!(value["username"], "bob");
        assert_eq!(value["ip"], "1.2.3.4");
        assert_eq!(value["port"], 4000);

        let json = ServerMessage::ChatRequest { from: "amy".into() }
            .to_json()
            .unwrap();
        assert_eq!(json, r#"{"type":"chat-request","from":"amy"}"#);
    }
}
