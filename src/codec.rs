//! Fixed-width field access at explicit offsets.
//!
//! Multi-byte integers are little-endian, as everywhere in the IPMI session layer.
//! Every writer returns the offset just past the written field and every reader
//! returns the decoded value together with the next read offset, so fields can be
//! chained without tracking positions by hand.

use crate::error::{Error, Result};

fn range(buf_len: usize, off: usize, len: usize) -> Result<core::ops::Range<usize>> {
    match off.checked_add(len) {
        Some(end) if end <= buf_len => Ok(off..end),
        _ => Err(Error::BufferTooShort {
            offset: off,
            needed: len,
            available: buf_len,
        }),
    }
}

pub(crate) fn pack_u8(v: u8, buf: &mut [u8], off: usize) -> Result<usize> {
    pack_bytes(&[v], buf, off)
}

pub(crate) fn pack_u16_le(v: u16, buf: &mut [u8], off: usize) -> Result<usize> {
    pack_bytes(&v.to_le_bytes(), buf, off)
}

pub(crate) fn pack_u32_le(v: u32, buf: &mut [u8], off: usize) -> Result<usize> {
    pack_bytes(&v.to_le_bytes(), buf, off)
}

pub(crate) fn pack_bytes(src: &[u8], buf: &mut [u8], off: usize) -> Result<usize> {
    let r = range(buf.len(), off, src.len())?;
    let end = r.end;
    buf[r].copy_from_slice(src);
    Ok(end)
}

pub(crate) fn unpack_u8(buf: &[u8], off: usize) -> Result<(u8, usize)> {
    let r = range(buf.len(), off, 1)?;
    Ok((buf[r.start], r.end))
}

pub(crate) fn unpack_u16_le(buf: &[u8], off: usize) -> Result<(u16, usize)> {
    let (b, next) = unpack_array::<2>(buf, off)?;
    Ok((u16::from_le_bytes(b), next))
}

pub(crate) fn unpack_u32_le(buf: &[u8], off: usize) -> Result<(u32, usize)> {
    let (b, next) = unpack_array::<4>(buf, off)?;
    Ok((u32::from_le_bytes(b), next))
}

pub(crate) fn unpack_array<const N: usize>(buf: &[u8], off: usize) -> Result<([u8; N], usize)> {
    let r = range(buf.len(), off, N)?;
    let end = r.end;
    let mut out = [0u8; N];
    out.copy_from_slice(&buf[r]);
    Ok((out, end))
}

/// Read exactly `len` bytes.
pub(crate) fn unpack_bytes(buf: &[u8], off: usize, len: usize) -> Result<(&[u8], usize)> {
    let r = range(buf.len(), off, len)?;
    let end = r.end;
    Ok((&buf[r], end))
}

/// Read up to `max` bytes; never fails, an offset past the end yields an empty slice.
pub(crate) fn unpack_bytes_most(buf: &[u8], off: usize, max: usize) -> (&[u8], usize) {
    let start = off.min(buf.len());
    let end = start.saturating_add(max).min(buf.len());
    (&buf[start..end], end)
}
