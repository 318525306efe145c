use ipmi_session::crypto::{AesCbc128, HmacSha1_96};
use ipmi_session::{Client, PayloadType};

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Get Device ID, wrapped in an IPMI message.
    let raw = [0x20, 0x18, 0xC8, 0x81, 0x04, 0x01, 0x7A];

    let mut client = Client::builder()
        .integrity(HmacSha1_96::new([0x11; 20]))
        .confidentiality(AesCbc128::new([0x22; 16]))
        .build()?;

    let open = client.build_outbound_frame(PayloadType::OpenSessionRequest, &[0u8; 32])?;
    println!("open session request: {}", hex(&open));

    let ctx = client.context_mut();
    ctx.open_session_sent(0xA0A2_A3A4)?;
    ctx.open_session_received(0x0200_0001)?;
    ctx.rakp1_sent()?;
    ctx.rakp2_received()?;
    ctx.rakp3_sent()?;
    ctx.activate(1)?;

    let frame = client.build_outbound_frame(PayloadType::Ipmi, &raw)?;
    println!("active session frame: {}", hex(&frame));

    let payload = client.parse_inbound_frame(&frame)?;
    println!("unframed payload:     {}", hex(&payload));
    client.context_mut().advance_sequence();

    Ok(())
}
