//! Encrypted tokens: the persisted text form of one secret field.
//!
//! Token layout:
//!
//! ```text
//! aes-cbc:  base64( IV[16] | ciphertext )
//! aes-gcm:  "gcm1:" base64( nonce[12] | ciphertext | tag[16] )
//! ```
//!
//! The standard base64 alphabet never contains `:`, so the prefix makes
//! every token self-describing.  The configured scheme only decides how
//! new tokens are written; old tokens stay readable after a switch.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use zeroize::Zeroize;

use crate::errors::{LockboxError, Result};

use super::encryption::{self, CipherScheme};
use super::keys::SessionKeyStore;

/// Prefix marking an AES-256-GCM token.
const GCM_PREFIX: &str = "gcm1:";

/// Encrypt `plaintext` under `key`, producing a printable token.
pub fn seal(scheme: CipherScheme, key: &[u8], plaintext: &str) -> Result<String> {
    let raw = encryption::encrypt(scheme, key, plaintext.as_bytes())?;
    let encoded = BASE64.encode(raw);
    Ok(match scheme {
        CipherScheme::AesCbc => encoded,
        CipherScheme::AesGcm => format!("{GCM_PREFIX}{encoded}"),
    })
}

/// Decrypt a token produced by `seal`.
pub fn open(key: &[u8], token: &str) -> Result<String> {
    let (scheme, body) = match token.strip_prefix(GCM_PREFIX) {
        Some(body) => (CipherScheme::AesGcm, body),
        None => (CipherScheme::AesCbc, token),
    };

    let raw = BASE64
        .decode(body.trim())
        .map_err(|_| LockboxError::CorruptToken)?;
    let plaintext = encryption::decrypt(scheme, key, &raw)?;

    String::from_utf8(plaintext).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        LockboxError::CorruptToken
    })
}

/// Field encryptor bound to the shared session key.
///
/// Every call reads the key from the `SessionKeyStore`; with no key set
/// it fails with `NotUnlocked`.
#[derive(Debug, Clone)]
pub struct CipherBox {
    keys: SessionKeyStore,
    scheme: CipherScheme,
}

impl CipherBox {
    pub fn new(keys: SessionKeyStore, scheme: CipherScheme) -> Self {
        Self { keys, scheme }
    }

    /// Encrypt one field value into an `EncryptedToken`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let key = self.keys.require()?;
        seal(self.scheme, key.as_bytes(), plaintext)
    }

    /// Decrypt one `EncryptedToken` back into its field value.
    pub fn decrypt(&self, token: &str) -> Result<String> {
        let key = self.keys.require()?;
        open(key.as_bytes(), token)
    }

    /// Fail with `NotUnlocked` unless a session key is set.
    pub fn require_unlocked(&self) -> Result<()> {
        if self.keys.is_unlocked() {
            Ok(())
        } else {
            Err(LockboxError::NotUnlocked)
        }
    }

    pub fn scheme(&self) -> CipherScheme {
        self.scheme
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::SessionKey;

    fn unlocked(scheme: CipherScheme) -> CipherBox {
        let keys = SessionKeyStore::new();
        keys.set(SessionKey::new([0x11u8; 32]));
        CipherBox::new(keys, scheme)
    }

    #[test]
    fn cbc_tokens_are_plain_base64() {
        let token = unlocked(CipherScheme::AesCbc).encrypt("secret").unwrap();
        assert!(!token.contains(':'));
        // 16-byte IV + one block, base64-encoded.
        assert_eq!(BASE64.decode(&token).unwrap().len(), 32);
    }

    #[test]
    fn gcm_tokens_carry_a_prefix() {
        let token = unlocked(CipherScheme::AesGcm).encrypt("secret").unwrap();
        assert!(token.starts_with(GCM_PREFIX));
    }

    #[test]
    fn tokens_from_either_scheme_decrypt() {
        let cbc = unlocked(CipherScheme::AesCbc);
        let gcm = unlocked(CipherScheme::AesGcm);
        let token = gcm.encrypt("written-with-gcm").unwrap();
        assert_eq!(cbc.decrypt(&token).unwrap(), "written-with-gcm");
    }

    #[test]
    fn locked_box_refuses_to_work() {
        let cipher = CipherBox::new(SessionKeyStore::new(), CipherScheme::AesCbc);
        assert!(matches!(cipher.encrypt("x"), Err(LockboxError::NotUnlocked)));
        assert!(matches!(cipher.decrypt("AAAA"), Err(LockboxError::NotUnlocked)));
    }

    #[test]
    fn garbage_is_a_corrupt_token() {
        let cipher = unlocked(CipherScheme::AesCbc);
        assert!(matches!(
            cipher.decrypt("not base64 at all!"),
            Err(LockboxError::CorruptToken)
        ));
        assert!(matches!(cipher.decrypt("QUJD"), Err(LockboxError::CorruptToken)));
    }
}
