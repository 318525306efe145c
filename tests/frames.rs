use ipmi_session::crypto::{AesCbc128, HmacSha1_96};
use ipmi_session::{
    AuthType, Client, Error, IpmiVersion, PayloadCode, PayloadType, Session20, SessionHeader20,
    SessionState, SessionTrailer,
};

const GET_DEVICE_ID: [u8; 7] = [0x20, 0x18, 0xC8, 0x81, 0x04, 0x01, 0x7A];

fn active_client(bmc_session_id: u32, sequence: u32) -> Client {
    let mut client = Client::builder()
        .integrity(HmacSha1_96::new([0x11; 20]))
        .confidentiality(AesCbc128::new([0x22; 16]))
        .build()
        .expect("build");
    let ctx = client.context_mut();
    ctx.open_session_sent(0xA0A2_A3A4).expect("open sent");
    ctx.open_session_received(bmc_session_id).expect("open received");
    ctx.rakp1_sent().expect("rakp1");
    ctx.rakp2_received().expect("rakp2");
    ctx.rakp3_sent().expect("rakp3");
    ctx.activate(sequence).expect("activate");
    client
}

#[test]
fn v15_pre_session_frame_layout() {
    let mut client = Client::builder()
        .version(IpmiVersion::V15)
        .build()
        .expect("build");
    // Get Channel Authentication Capabilities
    let raw = [0x20, 0x18, 0xC8, 0x81, 0x04, 0x38, 0x0E, 0x04, 0x31];

    let frame = client
        .build_outbound_frame(PayloadType::Ipmi, &raw)
        .expect("frame");
    assert_eq!(&frame[..10], &[0, 0, 0, 0, 0, 0, 0, 0, 0, 9]);
    assert_eq!(&frame[10..], &raw);
    assert_eq!(client.parse_inbound_frame(&frame).expect("parse"), raw);
}

#[test]
fn v20_pre_session_frame_layout() {
    let mut client = Client::builder().build().expect("build");
    let request = [0u8; 32];

    let frame = client
        .build_outbound_frame(PayloadType::OpenSessionRequest, &request)
        .expect("frame");
    assert_eq!(frame.len(), 12 + 32);
    assert_eq!(frame[0], 0x06);
    assert_eq!(frame[1], 0x10);
    assert_eq!(&frame[2..10], &[0u8; 8]);
    assert_eq!(&frame[10..12], &[32, 0]);
}

#[test]
fn oem_explicit_header_layout() {
    let header = SessionHeader20 {
        encrypted: false,
        authenticated: true,
        payload_type: PayloadType::Oem {
            iana: 0x0000_02A2,
            payload_id: 0x0102,
        },
        session_id: 0x1122_3344,
        sequence: 0x5566_7788,
        payload_length: 0x0304,
    };

    let bytes = header.pack().expect("pack");
    assert_eq!(bytes.len(), 18);
    assert_eq!(&bytes[..2], &[0x06, 0x42]);
    assert_eq!(&bytes[2..6], &[0xA2, 0x02, 0x00, 0x00]);
    assert_eq!(&bytes[6..8], &[0x02, 0x01]);
    assert_eq!(&bytes[8..12], &[0x44, 0x33, 0x22, 0x11]);
    assert_eq!(&bytes[12..16], &[0x88, 0x77, 0x66, 0x55]);
    assert_eq!(&bytes[16..18], &[0x04, 0x03]);
    assert_eq!(SessionHeader20::unpack(&bytes).expect("unpack"), header);
}

#[test]
fn active_frame_length_covers_ciphertext() {
    let mut client = active_client(0x0200_0001, 1);

    let bytes = client
        .build_outbound_frame(PayloadType::Ipmi, &GET_DEVICE_ID)
        .expect("frame");
    let frame = Session20::unpack(&bytes).expect("unpack");

    assert!(frame.header.encrypted);
    assert!(frame.header.authenticated);
    assert_eq!(frame.header.session_id, 0x0200_0001);
    assert_eq!(frame.header.sequence, 1);
    // IV + one AES block
    assert_eq!(frame.header.payload_length, 32);
    assert_eq!(frame.payload.len(), 32);

    let trailer = frame.trailer.expect("trailer");
    assert_eq!(trailer.next_header(), 0x07);
    assert_eq!(trailer.auth_code().len(), 12);
    assert_eq!((12 + 32 + trailer.integrity_pad().len()) % 4, 0);
    assert_eq!(bytes.len(), 12 + 32 + trailer.len());

    assert_eq!(client.parse_inbound_frame(&bytes).expect("parse"), GET_DEVICE_ID);
}

#[test]
fn trailer_follows_authenticated_frames_in_a_session() {
    let plain = Session20 {
        header: SessionHeader20 {
            encrypted: false,
            authenticated: true,
            payload_type: PayloadType::Ipmi,
            session_id: 0,
            sequence: 0,
            payload_length: 3,
        },
        payload: vec![1, 2, 3],
        trailer: None,
    };
    let bytes = plain.pack().expect("pack");
    assert_eq!(bytes.len(), 15);
    assert_eq!(Session20::unpack(&bytes).expect("unpack"), plain);

    let header = SessionHeader20 {
        session_id: 7,
        ..plain.header
    };
    let header_bytes = header.pack().expect("pack");
    let trailer =
        SessionTrailer::for_frame(&header_bytes, &plain.payload, vec![0xCC; 12]).expect("trailer");
    assert_eq!(trailer.pad_length(), 1);
    let framed = Session20 {
        header,
        payload: plain.payload.clone(),
        trailer: Some(trailer),
    };
    let bytes = framed.pack().expect("pack");
    assert_eq!(bytes.len(), 12 + 3 + 1 + 2 + 12);
    assert_eq!(Session20::unpack(&bytes).expect("unpack"), framed);

    // Same header without trailer bytes.
    let err = Session20::unpack(&bytes[..15]).unwrap_err();
    assert!(matches!(err, Error::SessionTrailer(_)));
    assert!(err.is_buffer_too_short());
}

#[test]
fn short_buffers_are_rejected() {
    let err = Session20::unpack(&[0x06, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0]).unwrap_err();
    assert!(matches!(err, Error::SessionHeader(_)));
    assert!(err.is_buffer_too_short());

    let mut oem = vec![0x06, 0x02];
    oem.extend_from_slice(&[0u8; 15]);
    let err = Session20::unpack(&oem).unwrap_err();
    assert!(err.is_buffer_too_short());

    let truncated_payload = [0x06, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0x04, 0x00, 0xAA, 0xBB];
    let err = Session20::unpack(&truncated_payload).unwrap_err();
    assert!(err.is_buffer_too_short());

    let mut client = Client::builder()
        .version(IpmiVersion::V15)
        .build()
        .expect("build");
    assert!(client.parse_inbound_frame(&[0u8; 9]).unwrap_err().is_buffer_too_short());
}

#[test]
fn sequence_numbers_move_only_when_asked() {
    let mut client = active_client(0x0300_0002, u32::MAX - 1);

    for _ in 0..2 {
        let bytes = client
            .build_outbound_frame(PayloadType::Ipmi, &GET_DEVICE_ID)
            .expect("frame");
        assert_eq!(&bytes[6..10], &(u32::MAX - 1).to_le_bytes());
    }

    assert_eq!(client.context_mut().advance_sequence(), u32::MAX);
    assert_eq!(client.context_mut().advance_sequence(), 0);
    let bytes = client
        .build_outbound_frame(PayloadType::Ipmi, &GET_DEVICE_ID)
        .expect("frame");
    assert_eq!(&bytes[6..10], &[0, 0, 0, 0]);
}

#[test]
fn closed_session_frames_are_plain() {
    let mut client = active_client(9, 5);
    client.context_mut().close_sent().expect("close");
    assert_eq!(client.context().state(), SessionState::CloseSent);

    let bytes = client
        .build_outbound_frame(PayloadType::Ipmi, &GET_DEVICE_ID)
        .expect("frame");
    assert_eq!(bytes[1], 0x00);
    assert_eq!(bytes.len(), 12 + GET_DEVICE_ID.len());

    client.context_mut().reset();
    assert_eq!(client.context().state(), SessionState::PreSession);
    assert!(matches!(
        client.context_mut().rakp1_sent(),
        Err(Error::InvalidState { .. })
    ));
}

#[test]
fn auth_type_wire_values() {
    assert_eq!(AuthType::from_u8(0x06), Some(AuthType::RmcpPlus));
    assert_eq!(AuthType::from_u8(0x03), None);
    assert_eq!(AuthType::Md5.as_u8(), 0x02);
}

#[test]
fn active_session_never_sends_plaintext() {
    let mut client = Client::builder().build().expect("build");
    let ctx = client.context_mut();
    ctx.open_session_sent(1).expect("open sent");
    ctx.open_session_received(0x1234).expect("open received");
    ctx.rakp1_sent().expect("rakp1");
    ctx.rakp2_received().expect("rakp2");
    ctx.rakp3_sent().expect("rakp3");
    ctx.activate(1).expect("activate");

    let err = client.gen_session20(PayloadType::Ipmi, &[1, 2, 3]).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn unassigned_payload_types_round_trip() {
    assert_eq!(PayloadCode::new(0x00), None);
    assert_eq!(PayloadCode::new(0x02), None);
    assert_eq!(PayloadCode::new(0x41), None);

    let code = PayloadCode::new(0x21).expect("OEM payload 1");
    let header = SessionHeader20 {
        encrypted: false,
        authenticated: false,
        payload_type: PayloadType::Other(code),
        session_id: 0,
        sequence: 0,
        payload_length: 0,
    };
    let bytes = header.pack().expect("pack");
    assert_eq!(bytes.len(), 12);
    assert_eq!(bytes[1], 0x21);
    assert_eq!(SessionHeader20::unpack(&bytes).expect("unpack"), header);
}
