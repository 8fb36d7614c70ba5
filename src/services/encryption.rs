use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

const NONCE_LEN: usize = 12;

/// AES-256-GCM encryption for sensitive profile data at rest
/// (users' health conditions).
pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl EncryptionService {
    /// Create from a base64-encoded 32-byte key.
    pub fn new(key_base64: &str) -> Result<Self, EncryptionError> {
        let key_bytes = STANDARD
            .decode(key_base64)
            .map_err(|_| EncryptionError::InvalidKey)?;

        if key_bytes.len() != 32 {
            return Err(EncryptionError::InvalidKey);
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|_| EncryptionError::InvalidKey)?;

        Ok(Self { cipher })
    }

    /// Encrypt data, returning nonce (12 bytes) prepended to ciphertext.
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext)
            .map_err(|_| EncryptionError::EncryptFailed)?;

        let mut output = nonce.to_vec();
        output.extend(ciphertext);
        Ok(output)
    }

    /// Decrypt data where the first 12 bytes are the nonce.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, EncryptionError> {
        if data.len() < NONCE_LEN {
            return Err(EncryptionError::DecryptFailed);
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        self.cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| EncryptionError::DecryptFailed)
    }

    /// Serialize `value` as JSON and encrypt it into a base64 text column.
    pub fn seal<T: Serialize>(&self, value: &T) -> Result<String, EncryptionError> {
        let json = serde_json::to_vec(value).map_err(|_| EncryptionError::EncryptFailed)?;
        Ok(STANDARD.encode(self.encrypt(&json)?))
    }

    /// Inverse of [`EncryptionService::seal`].
    pub fn open<T: DeserializeOwned>(&self, sealed: &str) -> Result<T, EncryptionError> {
        let data = STANDARD
            .decode(sealed)
            .map_err(|_| EncryptionError::DecryptFailed)?;
        let json = self.decrypt(&data)?;
        serde_json::from_slice(&json).map_err(|_| EncryptionError::DecryptFailed)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("Invalid encryption key (must be 32 bytes, base64-encoded)")]
    InvalidKey,

    #[error("Encryption failed")]
    EncryptFailed,

    #[error("Decryption failed")]
    DecryptFailed,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> EncryptionService {
        EncryptionService::new(&STANDARD.encode([7u8; 32])).unwrap()
    }

    #[test]
    fn test_rejects_short_key() {
        let short = STANDARD.encode([0u8; 16]);
        assert!(matches!(
            EncryptionService::new(&short),
            Err(EncryptionError::InvalidKey)
        ));
    }

    #[test]
    fn test_sealed_conditions_are_opaque() {
        let svc = service();
        let conditions = vec!["asthma".to_string(), "copd".to_string()];
        let sealed = svc.seal(&conditions).unwrap();
        assert!(!sealed.contains("asthma"));

        let opened: Vec<String> = svc.open(&sealed).unwrap();
        assert_eq!(opened, conditions);
    }

    #[test]
    fn test_tampered_ciphertext_fails() {
        let svc = service();
        let mut data = svc.encrypt(b"asthma").unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xff;
        assert!(matches!(svc.decrypt(&data), Err(EncryptionError::DecryptFailed)));
        assert!(matches!(svc.decrypt(&[1, 2, 3]), Err(EncryptionError::DecryptFailed)));
    }
}
