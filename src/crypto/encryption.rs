//! Raw symmetric encryption of byte strings.
//!
//! Two schemes are available:
//!
//! - **AES-256-CBC** with PKCS#7 padding.  A fresh random 16-byte IV is
//!   prepended: `[ 16-byte IV | ciphertext ]`.  There is no auth tag; a
//!   wrong key is detected only through invalid padding.
//! - **AES-256-GCM** authenticated encryption.  A fresh random 12-byte
//!   nonce is prepended: `[ 12-byte nonce | ciphertext + 16-byte tag ]`.

use aes::Aes256;
use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::TryRngCore;
use serde::{Deserialize, Serialize};

use crate::errors::{LockboxError, Result};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Size of the CBC initialization vector in bytes.
pub const IV_LEN: usize = 16;

/// AES block size in bytes.
pub const BLOCK_LEN: usize = 16;

/// Size of the AES-256-GCM nonce in bytes.
pub const NONCE_LEN: usize = 12;

/// Which cipher new values are written with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CipherScheme {
    #[default]
    AesCbc,
    AesGcm,
}

/// Encrypt `plaintext` with a 32-byte `key` under `scheme`.
pub fn encrypt(scheme: CipherScheme, key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    match scheme {
        CipherScheme::AesCbc => encrypt_cbc(key, plaintext),
        CipherScheme::AesGcm => encrypt_gcm(key, plaintext),
    }
}

/// Decrypt data that was produced by `encrypt` with the same `scheme`.
pub fn decrypt(scheme: CipherScheme, key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    match scheme {
        CipherScheme::AesCbc => decrypt_cbc(key, data),
        CipherScheme::AesGcm => decrypt_gcm(key, data),
    }
}

fn encrypt_cbc(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let mut iv = [0u8; IV_LEN];
    rand::rngs::OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| LockboxError::EncryptionFailed(format!("OS randomness unavailable: {e}")))?;

    let cipher = Aes256CbcEnc::new_from_slices(key, &iv)
        .map_err(|e| LockboxError::EncryptionFailed(format!("invalid key length: {e}")))?;
    let ciphertext = cipher.encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut output = Vec::with_capacity(IV_LEN + ciphertext.len());
    output.extend_from_slice(&iv);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

fn decrypt_cbc(key: &[u8], iv_and_ciphertext: &[u8]) -> Result<Vec<u8>> {
    if iv_and_ciphertext.len() < IV_LEN {
        return Err(LockboxError::CorruptToken);
    }

    let (iv, ciphertext) = iv_and_ciphertext.split_at(IV_LEN);
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_LEN != 0 {
        return Err(LockboxError::CorruptToken);
    }

    let cipher =
        Aes256CbcDec::new_from_slices(key, iv).map_err(|_| LockboxError::CorruptToken)?;

    // Bad padding is how a wrong key usually shows up.
    cipher
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| LockboxError::CorruptToken)
}

fn encrypt_gcm(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| LockboxError::EncryptionFailed(format!("invalid key length: {e}")))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, plaintext)
        .map_err(|e| LockboxError::EncryptionFailed(format!("encryption error: {e}")))?;

    let mut output = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    output.extend_from_slice(&nonce);
    output.extend_from_slice(&ciphertext);
    Ok(output)
}

fn decrypt_gcm(key: &[u8], nonce_and_ciphertext: &[u8]) -> Result<Vec<u8>> {
    if nonce_and_ciphertext.len() < NONCE_LEN {
        return Err(LockboxError::CorruptToken);
    }

    let (nonce_bytes, ciphertext) = nonce_and_ciphertext.split_at(NONCE_LEN);
    let nonce = Nonce::from_slice(nonce_bytes);

    let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| LockboxError::CorruptToken)?;

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| LockboxError::CorruptToken)
}
