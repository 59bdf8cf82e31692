//! Bundle codec tests

use oscine_core::{Bundle, Error, Message, Packet, Timetag, MAX_BUNDLE_DEPTH};

#[test]
fn test_roundtrip_flat() {
    let bundle = Bundle::immediate()
        .with(Message::new("/light/1").with(1.0f32))
        .with(Message::new("/light/2").with(0.0f32));

    let decoded = Bundle::parse(&bundle.encode()).expect("parse failed");
    assert_eq!(decoded, bundle);
}

#[test]
fn test_roundtrip_nested_three_deep() {
    let inner = Bundle::new(Timetag(0x0003_0000_0000_0000))
        .with(Message::new("/deep").with("leaf"));
    let middle = Bundle::new(Timetag(0x0002_0000_0000_0000))
        .with(Message::new("/mid").with(2))
        .with(inner);
    let outer = Bundle::new(Timetag(0x0001_0000_0000_0000))
        .with(Message::new("/top").with(1))
        .with(middle);

    let decoded = Bundle::parse(&outer.encode()).expect("parse failed");
    assert_eq!(decoded, outer);
}

#[test]
fn test_roundtrip_empty() {
    let bundle = Bundle::new(Timetag::now());
    let decoded = Bundle::parse(&bundle.encode()).expect("parse failed");
    assert_eq!(decoded, bundle);
}

#[test]
fn test_wrong_tag_names_both_byte_strings() {
    let err = Bundle::parse(b"#bungle\0AAAAAAAA").unwrap_err();
    match &err {
        Error::InvalidBundleTag { expected, actual } => {
            assert_eq!(expected, b"#bundle\0");
            assert_eq!(actual, b"#bungle\0");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_truncated_input() {
    assert!(matches!(
        Bundle::parse(b"#bun"),
        Err(Error::BufferTooSmall { .. })
    ));
}

#[test]
fn test_element_length_overrun() {
    let mut data = Vec::new();
    data.extend_from_slice(b"#bundle\0");
    data.extend_from_slice(&1u64.to_be_bytes());
    data.extend_from_slice(&[0, 0, 1, 0]); // claims 256 bytes
    data.extend_from_slice(b"/x\0\0,\0\0\0");
    match Bundle::parse(&data) {
        Err(Error::ElementLength { claimed: 256, have: 8 }) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_zero_length_prefix_ends_packets() {
    let msg = Message::new("/a").with(1);
    let encoded_msg = msg.encode();

    let mut data = Vec::new();
    data.extend_from_slice(b"#bundle\0");
    data.extend_from_slice(&1u64.to_be_bytes());
    data.extend_from_slice(&(encoded_msg.len() as i32).to_be_bytes());
    data.extend_from_slice(&encoded_msg);
    data.extend_from_slice(&[0, 0, 0, 0]); // terminator
    data.extend_from_slice(&[0xff; 8]); // trailing garbage, never reached

    let bundle = Bundle::parse(&data).expect("parse failed");
    assert_eq!(bundle.packets, vec![Packet::Message(msg)]);
}

#[test]
fn test_nested_error_carries_element_index() {
    let good = Message::new("/ok").encode();

    let mut data = Vec::new();
    data.extend_from_slice(b"#bundle\0");
    data.extend_from_slice(&1u64.to_be_bytes());
    data.extend_from_slice(&(good.len() as i32).to_be_bytes());
    data.extend_from_slice(&good);
    // Second element: a message whose typetag region is missing ','.
    data.extend_from_slice(&[0, 0, 0, 8]);
    data.extend_from_slice(b"/b\0\0ixx\0");

    match Bundle::parse(&data) {
        Err(Error::Element { index: 1, .. }) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_depth_guard_rejects_hostile_nesting() {
    let mut bundle = Bundle::immediate().with(Message::new("/leaf"));
    for _ in 0..MAX_BUNDLE_DEPTH {
        bundle = Bundle::immediate().with(bundle);
    }
    match Bundle::parse(&bundle.encode()) {
        Err(Error::BundleTooDeep(_)) => {}
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_packet_parse_sniffs_leading_byte() {
    let msg = Message::new("/m").with(5);
    match Packet::parse(&msg.encode()).unwrap() {
        Packet::Message(m) => assert_eq!(m, msg),
        Packet::Bundle(_) => panic!("expected message"),
    }

    let bundle = Bundle::immediate().with(msg);
    match Packet::parse(&bundle.encode()).unwrap() {
        Packet::Bundle(b) => assert_eq!(b, bundle),
        Packet::Message(_) => panic!("expected bundle"),
    }

    assert!(Packet::parse(b"xyz").is_err());
    assert!(Packet::parse(&[]).is_err());
}
