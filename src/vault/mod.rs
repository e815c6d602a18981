//! Credential vault.
//!
//! Bot tokens are encrypted before they ever reach the instance table and
//! only leave this process in masked form.
//!
//! ## Security Model
//!
//! - One symmetric key, derived from the configured shared secret
//! - A fresh nonce per encryption, so equal tokens never share a blob
//! - Decrypted plaintext is zeroized on drop
//! - Callers outside the registry only ever see [`mask`] output

pub mod cipher;
pub mod mask;

pub use cipher::{CredentialVault, CryptoError, CryptoResult, DEVELOPMENT_SECRET};
pub use mask::{mask, MASK_PLACEHOLDER};
