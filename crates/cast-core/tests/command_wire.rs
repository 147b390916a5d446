//! Integration tests for the control-channel wire format.
//!
//! These exercise the public API the way a host does: untrusted text arrives,
//! is decoded, and valid touches are mapped to device pixels.

use cast_core::{
    decode_payload, deserialize_command, is_valid_normalized_coord, normalized_to_device,
    serialize_command, ControlPayload, DevicePoint, RemoteControlCommand, RemoteKey, Rotation,
    TouchAction,
};
use serde_json::Value;

#[test]
fn test_wire_objects_have_exactly_the_documented_fields() {
    // Arrange
    let touch = RemoteControlCommand::touch(TouchAction::Up, 1.0, 0.0, 42);
    let key = RemoteControlCommand::key(RemoteKey::Back);

    // Act
    let touch: Value = serde_json::from_str(&serialize_command(&touch).unwrap()).unwrap();
    let key: Value = serde_json::from_str(&serialize_command(&key).unwrap()).unwrap();

    // Assert
    let mut touch_fields: Vec<_> = touch.as_object().unwrap().keys().cloned().collect();
    touch_fields.sort();
    assert_eq!(touch_fields, ["action", "pointerId", "type", "x", "y"]);
    assert_eq!(touch["type"], "touch");
    assert_eq!(touch["action"], "up");
    assert_eq!(touch["pointerId"], 42);

    let key_fields: Vec<_> = key.as_object().unwrap().keys().cloned().collect();
    assert_eq!(key_fields.len(), 2);
    assert_eq!(key["type"], "key");
    assert_eq!(key["key"], "back");
}

#[test]
fn test_hostile_payloads_never_decode() {
    let hostile = [
        "",
        " ",
        "\u{0}",
        "{}",
        r#"{"type":null}"#,
        r#"{"type":"touch"}"#,
        r#"{"type":"TOUCH","action":"down","x":0,"y":0,"pointerId":0}"#,
        r#"{"type":"touch","action":"Down","x":0,"y":0,"pointerId":0}"#,
        r#"{"type":"key","key":"BACK"}"#,
        r#"{"type":"touch","action":"down","x":1e999,"y":0,"pointerId":0}"#,
        r#"{"type":"touch","action":"down","x":[0.5],"y":0,"pointerId":0}"#,
        r#"{"type":"touch","action":"down","x":0,"y":0,"pointerId":{"id":1}}"#,
        r#"{"type":"touch","action":"down","x":0,"y":0,"pointerId":1e300}"#,
    ];

    for text in hostile {
        assert_eq!(deserialize_command(text), None, "{text:?} must not decode");
    }
}

#[test]
fn test_decoded_touch_maps_into_device_bounds_even_when_out_of_range() {
    // Arrange: a peer sends coordinates outside [0, 1].
    let payload = ControlPayload::Text(
        r#"{"type":"touch","action":"move","x":1.25,"y":-0.5,"pointerId":0}"#.to_string(),
    );

    // Act
    let cmd = decode_payload(&payload).unwrap();
    let RemoteControlCommand::Touch(touch) = cmd else {
        panic!("expected a touch command");
    };
    let device = normalized_to_device(touch.x, touch.y, 1080, 2340, Rotation::Deg0);

    // Assert
    assert!(!is_valid_normalized_coord(touch.x, touch.y));
    assert_eq!(device, DevicePoint { x: 1080, y: 0 });
}

#[test]
fn test_text_and_binary_payloads_decode_identically() {
    let text = r#"{"type":"key","key":"recents"}"#;
    let a = decode_payload(&ControlPayload::Text(text.to_string()));
    let b = decode_payload(&ControlPayload::Binary(text.as_bytes().to_vec()));
    assert_eq!(a, b);
    assert_eq!(a, Ok(RemoteControlCommand::key(RemoteKey::Recents)));
}
