//! Credential encryption boundary.
//!
//! AES-256-GCM with a 16-byte random nonce per encryption. The ciphertext and
//! the authentication tag are stored together as `<ciphertext_b64>:<tag_b64>`;
//! the nonce is stored alongside, separately, in base64. Decryption verifies
//! the tag before releasing a single plaintext byte, and a tag mismatch is
//! terminal for that credential.

use aes_gcm::{
    aead::{consts::U16, generic_array::GenericArray},
    aes::Aes256,
    AeadInPlace, AesGcm, KeyInit,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use domain_types::{CryptoError, CustomResult, EncryptedSecret};
use error_stack::{report, ResultExt};
use masking::{PeekInterface, Secret};
use rand::RngCore;

type CredentialAead = AesGcm<Aes256, U16>;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 16;
const TAG_LEN: usize = 16;

/// The only type in the workspace that sees credential plaintext.
pub struct CredentialCipher {
    cipher: CredentialAead,
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("CredentialCipher")
    }
}

impl CredentialCipher {
    /// Builds a cipher from a base64-encoded 256-bit key.
    pub fn from_key(key: &Secret<String>) -> CustomResult<Self, CryptoError> {
        let key_bytes = BASE64
            .decode(key.peek())
            .change_context(CryptoError::InvalidKeyLength)?;
        Self::from_key_bytes(&key_bytes)
    }

    pub fn from_key_bytes(key: &[u8]) -> CustomResult<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(report!(CryptoError::InvalidKeyLength));
        }
        Ok(Self {
            cipher: CredentialAead::new(GenericArray::from_slice(key)),
        })
    }

    /// Random throwaway key. Everything encrypted under it is unreadable once
    /// the process exits, so this constructor is wired up only for sandbox
    /// operation and tests, never from production configuration.
    pub fn ephemeral() -> Self {
        let mut key = [0u8; KEY_LEN];
        rand::rngs::OsRng.fill_bytes(&mut key);
        Self {
            cipher: CredentialAead::new(GenericArray::from_slice(&key)),
        }
    }

    pub fn encrypt(&self, plaintext: &str) -> CustomResult<EncryptedSecret, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(GenericArray::from_slice(&nonce), b"", &mut buffer)
            .map_err(|_| report!(CryptoError::EncryptionFailed))?;

        Ok(EncryptedSecret {
            ciphertext: format!("{}:{}", BASE64.encode(&buffer), BASE64.encode(tag)),
            iv: BASE64.encode(nonce),
        })
    }

    pub fn decrypt(&self, secret: &EncryptedSecret) -> CustomResult<Secret<String>, CryptoError> {
        let (ciphertext_b64, tag_b64) = secret
            .ciphertext
            .split_once(':')
            .ok_or_else(|| report!(CryptoError::MalformedCiphertext))?;

        let mut buffer = BASE64
            .decode(ciphertext_b64)
            .change_context(CryptoError::MalformedCiphertext)?;
        let tag = BASE64
            .decode(tag_b64)
            .change_context(CryptoError::MalformedCiphertext)?;
        let nonce = BASE64
            .decode(&secret.iv)
            .change_context(CryptoError::MalformedCiphertext)?;
        if tag.len() != TAG_LEN || nonce.len() != NONCE_LEN {
            return Err(report!(CryptoError::MalformedCiphertext));
        }

        self.cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(&nonce),
                b"",
                &mut buffer,
                GenericArray::from_slice(&tag),
            )
            .map_err(|_| report!(CryptoError::IntegrityCheckFailed))?;

        let plaintext =
            String::from_utf8(buffer).change_context(CryptoError::MalformedCiphertext)?;
        Ok(Secret::new(plaintext))
    }
}
