// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pure scrypt key derivation with a configurable PBKDF2 hash.
//!
//! The vault service derives slot keys with PBKDF2-HMAC-SHA512 wrapped around
//! the usual ROMix core, so the hash is a parameter here. With
//! [`Prf::Sha256`] the output matches the published scrypt test vectors.

use std::num::NonZeroU32;

use keyslot_core::KeyslotError;
use ring::pbkdf2;
use zeroize::{Zeroize, Zeroizing};

use crate::salsa::salsa20_8;

/// Largest buffer size the parameter rules allow (`2^32 - 1`).
const SIZE_MAX: u64 = u32::MAX as u64;

/// scrypt runs PBKDF2 with a single iteration on both ends.
const ONE_ITERATION: NonZeroU32 = NonZeroU32::MIN;

/// Hash used by the PBKDF2 steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prf {
    Sha256,
    Sha512,
}

impl Prf {
    fn algorithm(self) -> pbkdf2::Algorithm {
        match self {
            Prf::Sha256 => pbkdf2::PBKDF2_HMAC_SHA256,
            Prf::Sha512 => pbkdf2::PBKDF2_HMAC_SHA512,
        }
    }

    /// Digest length in bytes.
    pub fn digest_len(self) -> usize {
        match self {
            Prf::Sha256 => 32,
            Prf::Sha512 => 64,
        }
    }
}

/// Cost and output parameters for one derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScryptParams {
    /// CPU/memory cost, a power of two.
    pub n: u32,
    /// Block size.
    pub r: u32,
    /// Parallelism.
    pub p: u32,
    /// Derived key length in bytes.
    pub output_len: usize,
    pub prf: Prf,
}

impl ScryptParams {
    pub const DEFAULT_N: u32 = 32768;
    pub const DEFAULT_R: u32 = 8;
    pub const DEFAULT_P: u32 = 1;

    /// Build and validate a parameter set.
    pub fn new(n: u32, r: u32, p: u32, output_len: usize, prf: Prf) -> Result<Self, KeyslotError> {
        let params = Self {
            n,
            r,
            p,
            output_len,
            prf,
        };
        params.validate()?;
        Ok(params)
    }

    /// The preset used for vault slots: `N = 32768, r = 8, p = 1`,
    /// PBKDF2-HMAC-SHA512 and a full 64-byte digest as output.
    pub fn slot() -> Self {
        Self {
            n: Self::DEFAULT_N,
            r: Self::DEFAULT_R,
            p: Self::DEFAULT_P,
            output_len: Prf::Sha512.digest_len(),
            prf: Prf::Sha512,
        }
    }

    /// Same hash and output length, different cost.
    pub fn with_cost(self, n: u32, r: u32, p: u32) -> Result<Self, KeyslotError> {
        Self::new(n, r, p, self.output_len, self.prf)
    }

    /// Check the scrypt parameter rules.
    pub fn validate(&self) -> Result<(), KeyslotError> {
        let (n, r, p) = (u64::from(self.n), u64::from(self.r), u64::from(self.p));

        if r == 0 || p == 0 {
            return Err(KeyslotError::Config(
                "the parameters r, p must be at least 1".into(),
            ));
        }
        if self.output_len == 0 {
            return Err(KeyslotError::Config(
                "the derived key length must be at least 1".into(),
            ));
        }
        if r * p >= 1 << 30 {
            return Err(KeyslotError::Config(
                "the parameters r, p must satisfy r * p < 2^30".into(),
            ));
        }
        if n < 2 || !n.is_power_of_two() {
            return Err(KeyslotError::Config(
                "the parameter N must be a power of 2".into(),
            ));
        }
        if n * 128 * r > SIZE_MAX {
            return Err(KeyslotError::Config("N too big".into()));
        }
        if r * 128 * p > SIZE_MAX {
            return Err(KeyslotError::Config("r too big".into()));
        }
        Ok(())
    }
}

impl Default for ScryptParams {
    fn default() -> Self {
        Self::slot()
    }
}

/// Derive `params.output_len` bytes from `password` and `salt`.
///
/// CPU bound and memory hungry (`128 * r * N` bytes); async callers should
/// run it on the blocking pool.
pub fn scrypt(
    password: &[u8],
    salt: &[u8],
    params: &ScryptParams,
) -> Result<Zeroizing<Vec<u8>>, KeyslotError> {
    params.validate()?;

    let n = params.n as usize;
    let lane_words = 32 * params.r as usize;
    let algorithm = params.prf.algorithm();

    let mut bytes = Zeroizing::new(vec![0u8; 4 * lane_words * params.p as usize]);
    pbkdf2::derive(algorithm, ONE_ITERATION, salt, password, &mut bytes);

    let mut words: Zeroizing<Vec<u32>> = Zeroizing::new(
        bytes
            .chunks_exact(4)
            .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
            .collect(),
    );
    reverse_words(&mut words);

    let mut v = Zeroizing::new(vec![0u32; lane_words * n]);
    let mut scratch = Zeroizing::new(vec![0u32; lane_words]);
    for lane in words.chunks_exact_mut(lane_words) {
        ro_mix(lane, n, &mut v, &mut scratch);
    }

    reverse_words(&mut words);
    for (chunk, word) in bytes.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_be_bytes());
    }

    let mut output = Zeroizing::new(vec![0u8; params.output_len]);
    pbkdf2::derive(algorithm, ONE_ITERATION, &bytes, password, &mut output);
    Ok(output)
}

/// Swap the byte order of every word.
fn reverse_words(words: &mut [u32]) {
    for word in words {
        *word = word.swap_bytes();
    }
}

/// ROMix over one lane of `32 * r` words. `v` holds `n` lane snapshots.
fn ro_mix(x: &mut [u32], n: usize, v: &mut [u32], scratch: &mut [u32]) {
    let len = x.len();

    for snapshot in v.chunks_exact_mut(len).take(n) {
        snapshot.copy_from_slice(x);
        block_mix(x, scratch);
    }

    for _ in 0..n {
        let j = (x[len - 16] as usize) & (n - 1);
        for (word, stored) in x.iter_mut().zip(&v[j * len..(j + 1) * len]) {
            *word ^= stored;
        }
        block_mix(x, scratch);
    }
}

/// BlockMix: Salsa20/8 over each 64-byte sub-block, chained from the last
/// one. Even outputs fill the first half of the result, odd outputs the
/// second half.
fn block_mix(b: &mut [u32], out: &mut [u32]) {
    let blocks = b.len() / 16;
    let half = b.len() / 2;

    let mut x = [0u32; 16];
    x.copy_from_slice(&b[b.len() - 16..]);

    for i in 0..blocks {
        for (word, input) in x.iter_mut().zip(&b[16 * i..16 * (i + 1)]) {
            *word ^= input;
        }
        salsa20_8(&mut x);

        let dst = 16 * (i / 2) + if i % 2 == 0 { 0 } else { half };
        out[dst..dst + 16].copy_from_slice(&x);
    }

    b.copy_from_slice(out);
    x.zeroize();
}
