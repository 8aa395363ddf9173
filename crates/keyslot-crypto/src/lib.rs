// SPDX-FileCopyrightText: 2026 Keyslot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cryptography for keyslot.
//!
//! Slot keys are protected by a password-derived key: scrypt (with a
//! PBKDF2-HMAC-SHA512 wrapper) produces it, either through an external
//! accelerator executable or the built-in implementation. Both the slot key
//! and the stored value travel as version 1 AES-GCM envelopes.

pub mod accelerator;
pub mod cipher;
pub mod envelope;
pub mod kdf;
pub mod salsa;
pub mod scrypt;

pub use accelerator::{pad_password_hex, AcceleratorProvider};
pub use cipher::decrypt;
pub use envelope::Envelope;
pub use kdf::{KdfChain, KdfProvider, KdfRequest, ScryptProvider};
pub use scrypt::{scrypt, Prf, ScryptParams};
