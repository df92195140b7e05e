//! Bridge event wire-format tests.
//!
//! The sidecar speaks camelCase JSON; these tests pin the mapping into
//! [`BridgeEvent`] and [`InboundMessage`].

use marvin::whatsapp::{BridgeEvent, InboundMessage};

#[test]
fn message_event_deserializes_camel_case_fields() {
    let json = r#"{
        "type": "message",
        "from": "917099073276@c.us",
        "body": "hello there",
        "hasMedia": false,
        "fromMe": false
    }"#;

    let event: BridgeEvent = serde_json::from_str(json).expect("should parse");
    match event {
        BridgeEvent::Message(msg) => {
            assert_eq!(msg.from, "917099073276@c.us");
            assert_eq!(msg.body, "hello there");
            assert!(!msg.has_media);
            assert!(!msg.from_me);
        }
        other => panic!("expected message event, got {other:?}"),
    }
}

#[test]
fn message_event_missing_flags_default_to_false() {
    let json = r#"{"type": "message", "from": "x@c.us"}"#;

    let event: BridgeEvent = serde_json::from_str(json).expect("should parse");
    match event {
        BridgeEvent::Message(msg) => {
            assert_eq!(msg.body, "");
            assert!(!msg.has_media);
            assert!(!msg.from_me);
        }
        other => panic!("expected message event, got {other:?}"),
    }
}

#[test]
fn media_message_sets_flag() {
    let json = r#"{"type": "message", "from": "x@c.us", "hasMedia": true}"#;

    let event: BridgeEvent = serde_json::from_str(json).expect("should parse");
    match event {
        BridgeEvent::Message(msg) => assert!(msg.has_media),
        other => panic!("expected message event, got {other:?}"),
    }
}

#[test]
fn qr_event_carries_payload() {
    let json = r#"{"type": "qr", "data": "aGVsbG8="}"#;

    let event: BridgeEvent = serde_json::from_str(json).expect("should parse");
    match event {
        BridgeEvent::Qr { data } => assert_eq!(data, "aGVsbG8="),
        other => panic!("expected qr event, got {other:?}"),
    }
}

#[test]
fn ready_event_deserializes() {
    let event: BridgeEvent =
        serde_json::from_str(r#"{"type": "ready"}"#).expect("should parse");
    assert!(matches!(event, BridgeEvent::Ready));
}

#[test]
fn disconnected_event_reason_is_optional() {
    let with_reason: BridgeEvent =
        serde_json::from_str(r#"{"type": "disconnected", "reason": "logged out"}"#)
            .expect("should parse");
    match with_reason {
        BridgeEvent::Disconnected { reason } => assert_eq!(reason.as_deref(), Some("logged out")),
        other => panic!("expected disconnected event, got {other:?}"),
    }

    let without: BridgeEvent =
        serde_json::from_str(r#"{"type": "disconnected", "reason": null}"#).expect("should parse");
    match without {
        BridgeEvent::Disconnected { reason } => assert!(reason.is_none()),
        other => panic!("expected disconnected event, got {other:?}"),
    }
}

#[test]
fn event_batches_deserialize_in_order() {
    let json = r#"[
        {"type": "ready"},
        {"type": "message", "from": "a@c.us", "body": "one"},
        {"type": "message", "from": "b@g.us", "body": "two", "fromMe": true}
    ]"#;

    let events: Vec<BridgeEvent> = serde_json::from_str(json).expect("should parse");
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], BridgeEvent::Ready));
    assert!(matches!(&events[1], BridgeEvent::Message(m) if m.body == "one"));
    assert!(matches!(&events[2], BridgeEvent::Message(m) if m.from_me));
}

#[test]
fn inbound_message_round_trips_through_serde() {
    let msg = InboundMessage {
        from: "15550001111@c.us".to_owned(),
        body: "ping".to_owned(),
        has_media: true,
        from_me: false,
    };

    let json = serde_json::to_value(&msg).expect("serialize");
    assert_eq!(json["hasMedia"], true);
    assert_eq!(json["fromMe"], false);

    let back: InboundMessage = serde_json::from_value(json).expect("deserialize");
    assert_eq!(back.from, msg.from);
    assert_eq!(back.body, msg.body);
}
