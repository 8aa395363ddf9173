// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Authenticated decryption of version 1 envelopes (AES-GCM).
//!
//! Wire format details:
//! - `ct` carries the ciphertext with the tag appended (`ts / 8` bytes).
//! - The nonce is the decoded `iv` minus its last three bytes. A 16-byte
//!   wire IV therefore yields a 13-byte GCM nonce.
//! - A key longer than `ks / 8` bytes is truncated.
//!
//! No plaintext is released unless the tag verifies.

use aes_gcm::aead::consts::{U12, U13, U14, U15, U16};
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::{Aes128, Aes192, Aes256};
use aes_gcm::AesGcm;
use keyslot_core::KeyslotError;
use zeroize::Zeroizing;

use crate::envelope::Envelope;

/// Bytes stripped from the end of the wire IV.
pub const IV_TRIM: usize = 3;

/// GCM nonce lengths accepted after trimming.
pub const NONCE_LENGTHS: [usize; 3] = [12, 13, 16];

/// Tag lengths accepted, in bytes.
pub const TAG_LENGTHS: std::ops::RangeInclusive<usize> = 12..=16;

/// Decrypt `envelope` with `key` and return the plaintext.
pub fn decrypt(key: &[u8], envelope: &Envelope) -> Result<Zeroizing<Vec<u8>>, KeyslotError> {
    let key_bits = aes_gcm_key_bits(envelope)?;

    if envelope.ts % 8 != 0 || !TAG_LENGTHS.contains(&((envelope.ts / 8) as usize)) {
        return Err(KeyslotError::UnsupportedVersion(format!(
            "tag size of {} bits is not supported",
            envelope.ts
        )));
    }
    let tag_len = (envelope.ts / 8) as usize;

    let key_len = key_bits / 8;
    if key.len() < key_len {
        return Err(KeyslotError::Config(format!(
            "derived key has {} bytes, {} needs {key_len}",
            key.len(),
            envelope.cipher_name()
        )));
    }
    let key = &key[..key_len];

    let iv = envelope.iv_bytes()?;
    let nonce_len = iv.len().saturating_sub(IV_TRIM);
    if !NONCE_LENGTHS.contains(&nonce_len) {
        return Err(KeyslotError::UnsupportedVersion(format!(
            "IV of {} bytes is not supported",
            iv.len()
        )));
    }
    let nonce = &iv[..nonce_len];

    let sealed = envelope.ct_bytes()?;
    if sealed.len() < tag_len {
        return Err(KeyslotError::AuthenticationFailure);
    }
    let (ciphertext, tag) = sealed.split_at(sealed.len() - tag_len);

    let mut buffer = Zeroizing::new(ciphertext.to_vec());
    open_detached(key_bits, key, nonce, &mut buffer, tag)?;
    Ok(buffer)
}

/// Key size in bits for an `aes-*-gcm` envelope.
fn aes_gcm_key_bits(envelope: &Envelope) -> Result<usize, KeyslotError> {
    let is_aes_gcm =
        envelope.cipher.eq_ignore_ascii_case("aes") && envelope.mode.eq_ignore_ascii_case("gcm");
    match envelope.ks {
        128 | 192 | 256 if is_aes_gcm => Ok(envelope.ks as usize),
        _ => Err(KeyslotError::UnsupportedVersion(format!(
            "cipher {} is not supported",
            envelope.cipher_name()
        ))),
    }
}

macro_rules! open_with {
    ($aes:ty, $nonce:ty, $tag:ty, $key:expr, $iv:expr, $buffer:expr, $tag_bytes:expr) => {{
        let cipher = AesGcm::<$aes, $nonce, $tag>::new_from_slice($key)
            .map_err(|_| KeyslotError::Config("invalid AES key length".into()))?;
        cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice($iv),
                b"",
                $buffer,
                GenericArray::from_slice($tag_bytes),
            )
            .map_err(|_| KeyslotError::AuthenticationFailure)
    }};
}

macro_rules! dispatch_tag {
    ($aes:ty, $nonce:ty, $key:expr, $iv:expr, $buffer:expr, $tag_bytes:expr) => {
        match $tag_bytes.len() {
            12 => open_with!($aes, $nonce, U12, $key, $iv, $buffer, $tag_bytes),
            13 => open_with!($aes, $nonce, U13, $key, $iv, $buffer, $tag_bytes),
            14 => open_with!($aes, $nonce, U14, $key, $iv, $buffer, $tag_bytes),
            15 => open_with!($aes, $nonce, U15, $key, $iv, $buffer, $tag_bytes),
            16 => open_with!($aes, $nonce, U16, $key, $iv, $buffer, $tag_bytes),
            other => Err(KeyslotError::UnsupportedVersion(format!(
                "tag of {other} bytes is not supported"
            ))),
        }
    };
}

macro_rules! dispatch_nonce {
    ($aes:ty, $key:expr, $iv:expr, $buffer:expr, $tag_bytes:expr) => {
        match $iv.len() {
            12 => dispatch_tag!($aes, U12, $key, $iv, $buffer, $tag_bytes),
            13 => dispatch_tag!($aes, U13, $key, $iv, $buffer, $tag_bytes),
            16 => dispatch_tag!($aes, U16, $key, $iv, $buffer, $tag_bytes),
            other => Err(KeyslotError::UnsupportedVersion(format!(
                "nonce of {other} bytes is not supported"
            ))),
        }
    };
}

/// Verify `tag` and decrypt `buffer` in place.
fn open_detached(
    key_bits: usize,
    key: &[u8],
    nonce: &[u8],
    buffer: &mut [u8],
    tag: &[u8],
) -> Result<(), KeyslotError> {
    match key_bits {
        128 => dispatch_nonce!(Aes128, key, nonce, buffer, tag),
        192 => dispatch_nonce!(Aes192, key, nonce, buffer, tag),
        256 => dispatch_nonce!(Aes256, key, nonce, buffer, tag),
        other => Err(KeyslotError::UnsupportedVersion(format!(
            "AES key size {other} is not supported"
        ))),
    }
}
