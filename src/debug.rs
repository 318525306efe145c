pub(crate) fn enabled() -> bool {
    std::env::var("IPMI_DEBUG")
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

pub(crate) fn dump_hex(label: &str, bytes: &[u8]) {
    if !enabled() {
        return;
    }
    let out = format_hex(label, bytes);

    #[cfg(feature = "tracing")]
    tracing::trace!("{out}");

    #[cfg(not(feature = "tracing"))]
    eprintln!("{out}");
}

fn format_hex(label: &str, bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(label.len() + bytes.len() * 3 + 8);
    let _ = write!(out, "{label} ({}):", bytes.len());
    for b in bytes {
        let _ = write!(out, " {b:02x}");
    }
    out
}
