//! Symmetric encryption of stored credentials.
//!
//! Uses:
//! - SHA-256 to derive a 32-byte key from the configured shared secret
//! - ChaCha20-Poly1305 for authenticated encryption
//!
//! Blobs are serialized as `nonceHex:ciphertextHex`, with the Poly1305 tag
//! carried at the end of the ciphertext.

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::{Zeroize, Zeroizing};

/// Separator between the nonce and ciphertext halves of a blob.
pub const BLOB_SEPARATOR: char = ':';

const NONCE_LEN: usize = 12;

/// Key material used when no secret is configured. Development only;
/// production config refuses to load without `vault.secret`.
pub const DEVELOPMENT_SECRET: &str = "botkeeper-default-key-please-change-in-production";

/// Cryptographic errors
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Encryption failed")]
    EncryptionFailed,

    #[error("Invalid encrypted data format")]
    MalformedBlob,

    #[error("Invalid nonce")]
    InvalidNonce,

    #[error("Invalid hex encoding: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("Decryption failed - invalid ciphertext or wrong key")]
    DecryptionFailed,

    #[error("Decrypted credential is not valid UTF-8")]
    InvalidUtf8,
}

/// Result type for crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Encrypts, decrypts and masks bot credentials with a single derived key.
pub struct CredentialVault {
    cipher: ChaCha20Poly1305,
}

impl CredentialVault {
    /// Build a vault keyed by the SHA-256 digest of `secret`.
    pub fn new(secret: &str) -> Self {
        let digest = Sha256::digest(secret.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));
        key.zeroize();
        Self { cipher }
    }

    /// Encrypt a credential under a fresh random nonce.
    pub fn encrypt(&self, plaintext: &str) -> CryptoResult<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(format!(
            "{}{}{}",
            hex::encode(nonce_bytes),
            BLOB_SEPARATOR,
            hex::encode(ciphertext)
        ))
    }

    /// Decrypt a blob produced by [`CredentialVault::encrypt`].
    ///
    /// The plaintext is wiped from memory when the returned value drops.
    pub fn decrypt(&self, blob: &str) -> CryptoResult<Zeroizing<String>> {
        let mut parts = blob.split(BLOB_SEPARATOR);
        let (Some(nonce_hex), Some(ciphertext_hex), None) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(CryptoError::MalformedBlob);
        };

        let nonce_bytes = hex::decode(nonce_hex).map_err(|_| CryptoError::InvalidNonce)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CryptoError::InvalidNonce);
        }
        let ciphertext = hex::decode(ciphertext_hex)?;

        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(plaintext)
            .map(Zeroizing::new)
            .map_err(|e| {
                e.into_bytes().zeroize();
                CryptoError::InvalidUtf8
            })
    }

    /// Decrypt and mask in one step. Undecryptable blobs mask to the
    /// placeholder rather than failing, so one bad record cannot take
    /// down a whole listing.
    pub fn masked(&self, blob: &str) -> String {
        match self.decrypt(blob) {
            Ok(plaintext) => super::mask(&plaintext),
            Err(_) => super::MASK_PLACEHOLDER.to_string(),
        }
    }
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault")
            .field("cipher", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn vault() -> CredentialVault {
        CredentialVault::new("unit-test-secret")
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let vault = vault();
        let token = "MTA4NzY1NDMyMTA5ODc2NTQzMg.GaBcDe.fake-discord-token";
        let blob = vault.encrypt(token).unwrap();
        assert_eq!(vault.decrypt(&blob).unwrap().as_str(), token);
    }

    #[test]
    fn test_blob_format() {
        let blob = vault().encrypt("secret").unwrap();
        let (nonce_hex, ciphertext_hex) = blob.split_once(BLOB_SEPARATOR).unwrap();
        assert_eq!(nonce_hex.len(), NONCE_LEN * 2);
        assert!(hex::decode(nonce_hex).is_ok());
        assert!(hex::decode(ciphertext_hex).is_ok());
        assert!(!blob.contains("secret"));
    }

    #[test]
    fn test_encrypt_is_nondeterministic() {
        let vault = vault();
        let a = vault.encrypt("same-token").unwrap();
        let b = vault.encrypt("same-token").unwrap();
        assert_ne!(a, b);
        assert_eq!(vault.decrypt(&a).unwrap().as_str(), "same-token");
        assert_eq!(vault.decrypt(&b).unwrap().as_str(), "same-token");
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob = vault().encrypt("token").unwrap();
        let other = CredentialVault::new("a-different-secret");
        assert!(matches!(
            other.decrypt(&blob),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_malformed_blobs_rejected() {
        let vault = vault();
        assert!(matches!(vault.decrypt("no-separator"), Err(CryptoError::MalformedBlob)));
        assert!(matches!(vault.decrypt("a:b:c"), Err(CryptoError::MalformedBlob)));
        assert!(matches!(vault.decrypt("zz:00"), Err(CryptoError::InvalidNonce)));
        assert!(matches!(vault.decrypt("0011:00"), Err(CryptoError::InvalidNonce)));

        let blob = vault.encrypt("token").unwrap();
        let (nonce_hex, _) = blob.split_once(BLOB_SEPARATOR).unwrap();
        assert!(matches!(
            vault.decrypt(&format!("{nonce_hex}:not-hex")),
            Err(CryptoError::Hex(_))
        ));
        assert!(matches!(
            vault.decrypt(&format!("{nonce_hex}:")),
            Err(CryptoError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let vault = vault();
        let blob = vault.encrypt("token-to-tamper-with").unwrap();
        let (nonce_hex, ciphertext_hex) = blob.split_once(BLOB_SEPARATOR).unwrap();
        let mut bytes = hex::decode(ciphertext_hex).unwrap();
        bytes[0] ^= 0x01;
        let tampered = format!("{nonce_hex}:{}", hex::encode(bytes));
        assert!(matches!(vault.decrypt(&tampered), Err(CryptoError::DecryptionFailed)));
    }

    #[test]
    fn test_masked_falls_back_to_placeholder() {
        let vault = vault();
        assert_eq!(vault.masked("garbage"), "***");
        let blob = vault.encrypt("abcdefghijklmnopqrstuvwxyz").unwrap();
        assert_eq!(vault.masked(&blob), "abcdefghij...vwxyz");
    }

    #[test]
    fn test_debug_redacts_key() {
        let rendered = format!("{:?}", vault());
        assert!(rendered.contains("<redacted>"));
    }

    proptest! {
        #[test]
        fn prop_roundtrip_any_string(plaintext in any::<String>()) {
            let vault = vault();
            let blob = vault.encrypt(&plaintext).unwrap();
            let decrypted = vault.decrypt(&blob).unwrap();
            prop_assert_eq!(decrypted.as_str(), plaintext.as_str());
        }
    }
}
