//! Authentication, integrity and confidentiality collaborators.
//!
//! The frame generator only decides *when* these run and *where* their output
//! lands in the frame. Keys come from the caller: the RAKP exchange that
//! derives them is outside this crate.

use core::fmt;

use aes::Aes128;
use aes::cipher::generic_array::GenericArray;
use aes::cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use hmac::{Hmac, Mac};
use md5::{Digest, Md5};
use rand::RngCore;
use sha1::Sha1;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::error::{Error, Result};
use crate::protocol::trailer::{INTEGRITY_PAD_BYTE, NEXT_HEADER, SessionTrailer};

/// Produces the 16-byte auth code of an authenticated IPMI v1.5 session header.
pub trait AuthCodeGenerator {
    /// Compute the auth code for a frame with the given header fields and payload.
    fn generate_auth_code(&self, session_id: u32, sequence: u32, payload: &[u8])
    -> Result<[u8; 16]>;
}

/// RMCP+ payload confidentiality (negotiated confidentiality algorithm).
pub trait Confidentiality {
    /// Transform a raw payload into the on-wire encrypted payload.
    fn encrypt_payload(&self, payload: &[u8]) -> Result<Vec<u8>>;

    /// Recover the raw payload from an encrypted one.
    fn decrypt_payload(&self, payload: &[u8]) -> Result<Vec<u8>>;
}

/// RMCP+ session integrity (negotiated integrity algorithm).
pub trait Integrity {
    /// Build the trailer for a packed header and the (possibly encrypted) payload.
    fn generate_session_trailer(&self, header: &[u8], payload: &[u8]) -> Result<SessionTrailer>;

    /// Check a received trailer against its header and payload.
    fn verify_session_trailer(
        &self,
        header: &[u8],
        payload: &[u8],
        trailer: &SessionTrailer,
    ) -> Result<()>;
}

/// A minimal secret container that zeroizes its contents on drop.
#[derive(Clone)]
pub(crate) struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub(crate) fn expose(&self) -> &[u8] {
        &self.0
    }

    /// The secret as a fixed 16-byte v1.5 key: truncated, zero-padded.
    pub(crate) fn to_key16(&self) -> Zeroizing<[u8; 16]> {
        let mut out = Zeroizing::new([0u8; 16]);
        let n = self.expose().len().min(16);
        out[..n].copy_from_slice(&self.expose()[..n]);
        out
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<secret>")
    }
}

impl Drop for SecretBytes {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

pub(crate) fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Auth type "straight password/key": the auth code is the password itself.
#[derive(Debug, Clone)]
pub struct StraightPasswordAuth {
    password: SecretBytes,
}

impl StraightPasswordAuth {
    /// Use `password` (at most 16 bytes are significant).
    pub fn new(password: impl Into<Vec<u8>>) -> Self {
        Self {
            password: SecretBytes::new(password.into()),
        }
    }
}

impl AuthCodeGenerator for StraightPasswordAuth {
    fn generate_auth_code(
        &self,
        _session_id: u32,
        _sequence: u32,
        _payload: &[u8],
    ) -> Result<[u8; 16]> {
        Ok(*self.password.to_key16())
    }
}

/// Auth type MD5: `MD5(password || session id || payload || sequence || password)`.
#[derive(Debug, Clone)]
pub struct Md5Auth {
    password: SecretBytes,
}

impl Md5Auth {
    /// Use `password` (at most 16 bytes are significant).
    pub fn new(password: impl Into<Vec<u8>>) -> Self {
        Self {
            password: SecretBytes::new(password.into()),
        }
    }
}

impl AuthCodeGenerator for Md5Auth {
    fn generate_auth_code(
        &self,
        session_id: u32,
        sequence: u32,
        payload: &[u8],
    ) -> Result<[u8; 16]> {
        let key = self.password.to_key16();
        let mut hasher = Md5::new();
        hasher.update(&key[..]);
        hasher.update(session_id.to_le_bytes());
        hasher.update(payload);
        hasher.update(sequence.to_le_bytes());
        hasher.update(&key[..]);
        Ok(hasher.finalize().into())
    }
}

type HmacSha1 = Hmac<Sha1>;

/// HMAC-SHA1 truncated to its first `N` bytes.
pub(crate) fn hmac_sha1<const N: usize>(key: &[u8], data: &[u8]) -> Result<[u8; N]> {
    let mut mac =
        <HmacSha1 as Mac>::new_from_slice(key).map_err(|_| Error::Crypto("invalid HMAC key"))?;
    mac.update(data);
    let digest = mac.finalize().into_bytes();
    digest
        .get(..N)
        .and_then(|d| d.try_into().ok())
        .ok_or(Error::Crypto("HMAC-SHA1 truncation longer than digest"))
}

/// Integrity algorithm HMAC-SHA1-96 keyed with K1.
#[derive(Clone)]
pub struct HmacSha1_96 {
    k1: Zeroizing<[u8; 20]>,
}

impl HmacSha1_96 {
    /// Auth code length in bytes.
    pub const AUTH_CODE_LEN: usize = 12;

    /// Use the session's K1.
    pub fn new(k1: [u8; 20]) -> Self {
        Self {
            k1: Zeroizing::new(k1),
        }
    }
}

impl fmt::Debug for HmacSha1_96 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacSha1_96").finish_non_exhaustive()
    }
}

impl Integrity for HmacSha1_96 {
    fn generate_session_trailer(&self, header: &[u8], payload: &[u8]) -> Result<SessionTrailer> {
        let mut trailer = SessionTrailer::for_frame(header, payload, Vec::new())?;
        let auth_code = hmac_sha1::<{ HmacSha1_96::AUTH_CODE_LEN }>(
            &self.k1[..],
            &trailer.integrity_data(header, payload),
        )?;
        trailer.set_auth_code(auth_code.to_vec())?;
        Ok(trailer)
    }

    fn verify_session_trailer(
        &self,
        header: &[u8],
        payload: &[u8],
        trailer: &SessionTrailer,
    ) -> Result<()> {
        if trailer.next_header() != NEXT_HEADER {
            return Err(Error::Protocol("unexpected next header"));
        }
        if trailer.integrity_pad().len() != trailer.pad_length() as usize {
            return Err(Error::Protocol("pad length mismatch"));
        }
        if trailer.integrity_pad().iter().any(|&b| b != INTEGRITY_PAD_BYTE) {
            return Err(Error::Protocol("invalid integrity pad bytes"));
        }
        if trailer.auth_code().len() < Self::AUTH_CODE_LEN {
            return Err(Error::AuthenticationFailed("auth code too short"));
        }

        let expected = hmac_sha1::<{ HmacSha1_96::AUTH_CODE_LEN }>(
            &self.k1[..],
            &trailer.integrity_data(header, payload),
        )?;
        if !ct_eq(&trailer.auth_code()[..Self::AUTH_CODE_LEN], &expected) {
            return Err(Error::AuthenticationFailed("invalid packet auth code"));
        }
        Ok(())
    }
}

/// Confidentiality algorithm AES-CBC-128.
///
/// On the wire: `IV(16) || AES-CBC(payload || 01 02 .. n || n)`.
#[derive(Clone)]
pub struct AesCbc128 {
    key: Zeroizing<[u8; 16]>,
}

impl AesCbc128 {
    /// Use the AES key (the first 16 bytes of K2).
    pub fn new(key: [u8; 16]) -> Self {
        Self {
            key: Zeroizing::new(key),
        }
    }

    /// Encrypt with a caller-chosen IV.
    pub fn encrypt_with_iv(&self, payload: &[u8], iv: &[u8; 16]) -> Result<Vec<u8>> {
        // Confidentiality trailer: [pad bytes][pad_len]
        let base = payload.len() + 1;
        let pad_len = (16 - (base % 16)) % 16;

        let mut to_encrypt = Zeroizing::new(Vec::with_capacity(base + pad_len));
        to_encrypt.extend_from_slice(payload);
        for i in 0..pad_len {
            to_encrypt.push((i + 1) as u8);
        }
        to_encrypt.push(pad_len as u8);

        let ciphertext = aes128_cbc_encrypt(&self.key, iv, &to_encrypt)?;

        let mut out = Vec::with_capacity(16 + ciphertext.len());
        out.extend_from_slice(iv);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }
}

impl fmt::Debug for AesCbc128 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesCbc128").finish_non_exhaustive()
    }
}

impl Confidentiality for AesCbc128 {
    fn encrypt_payload(&self, payload: &[u8]) -> Result<Vec<u8>> {
        let mut iv = [0u8; 16];
        rand::rng().fill_bytes(&mut iv);
        self.encrypt_with_iv(payload, &iv)
    }

    fn decrypt_payload(&self, payload: &[u8]) -> Result<Vec<u8>> {
        if payload.len() < 16 {
            return Err(Error::Crypto("encrypted payload too short"));
        }

        let iv: [u8; 16] = payload[..16]
            .try_into()
            .map_err(|_| Error::Crypto("invalid IV"))?;
        let ciphertext = &payload[16..];
        if ciphertext.is_empty() || !ciphertext.len().is_multiple_of(16) {
            return Err(Error::Crypto("invalid AES-CBC ciphertext length"));
        }

        let mut plaintext = aes128_cbc_decrypt(&self.key, &iv, ciphertext)?;
        let pad_len = *plaintext
            .last()
            .ok_or(Error::Crypto("missing confidentiality pad length"))? as usize;

        if pad_len > plaintext.len().saturating_sub(1) {
            return Err(Error::Crypto("invalid confidentiality pad length"));
        }

        let trailer_start = plaintext.len() - 1 - pad_len;
        let pad_bytes = &plaintext[trailer_start..plaintext.len() - 1];
        for (i, &b) in pad_bytes.iter().enumerate() {
            if b != (i as u8 + 1) {
                return Err(Error::Crypto("invalid confidentiality pad bytes"));
            }
        }

        plaintext.truncate(trailer_start);
        Ok(plaintext)
    }
}

fn aes128(key: &[u8; 16]) -> Result<Aes128> {
    Aes128::new_from_slice(key).map_err(|_| Error::Crypto("invalid AES-128 key"))
}

/// Raw AES-128-CBC over whole blocks; the confidentiality pad is the caller's.
pub(crate) fn aes128_cbc_encrypt(
    key: &[u8; 16],
    iv: &[u8; 16],
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    if !plaintext.len().is_multiple_of(16) {
        return Err(Error::Crypto("AES-CBC input is not block aligned"));
    }
    let cipher = aes128(key)?;

    let mut out = plaintext.to_vec();
    let mut chain = *iv;
    for block in out.chunks_exact_mut(16) {
        block.iter_mut().zip(chain).for_each(|(b, c)| *b ^= c);
        cipher.encrypt_block(GenericArray::from_mut_slice(block));
        chain.copy_from_slice(block);
    }
    Ok(out)
}

/// Inverse of [`aes128_cbc_encrypt`].
pub(crate) fn aes128_cbc_decrypt(
    key: &[u8; 16],
    iv: &[u8; 16],
    ciphertext: &[u8],
) -> Result<Vec<u8>> {
    if !ciphertext.len().is_multiple_of(16) {
        return Err(Error::Crypto("AES-CBC input is not block aligned"));
    }
    let cipher = aes128(key)?;

    let mut out = ciphertext.to_vec();
    let mut chain = *iv;
    for block in out.chunks_exact_mut(16) {
        let mut next = [0u8; 16];
        next.copy_from_slice(block);
        cipher.decrypt_block(GenericArray::from_mut_slice(block));
        block.iter_mut().zip(chain).for_each(|(b, c)| *b ^= c);
        chain = next;
    }
    Ok(out)
}
