//! Passphrase-sealed container for tracker data.
//!
//! Layout: `MAGIC (8) || salt (16) || nonce (12) || ciphertext`. The header
//! is authenticated as associated data, so tampering with the salt or nonce
//! fails decryption just like a wrong passphrase does.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use zeroize::Zeroizing;

const MAGIC: &[u8; 8] = b"CYKELVLT";
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN + NONCE_LEN;

// Argon2id: 64 MiB, 3 passes, single lane.
const KDF_MEMORY_KIB: u32 = 65536;
const KDF_ITERATIONS: u32 = 3;
const KDF_LANES: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("key derivation failed")]
    KeyDerivation,
    #[error("encryption failed")]
    Encryption,
    #[error("cannot open vault: wrong passphrase or corrupted data")]
    Decryption,
    #[error("not a cykel vault")]
    NotAVault,
}

/// Whether `bytes` look like a sealed vault rather than plain JSON.
pub fn is_sealed(bytes: &[u8]) -> bool {
    bytes.starts_with(MAGIC)
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, VaultError> {
    let params = Params::new(KDF_MEMORY_KIB, KDF_ITERATIONS, KDF_LANES, Some(KEY_LEN))
        .map_err(|_| VaultError::KeyDerivation)?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|_| VaultError::KeyDerivation)?;
    Ok(key)
}

pub fn seal(passphrase: &str, plaintext: &[u8]) -> Result<Vec<u8>, VaultError> {
    let mut header = [0u8; HEADER_LEN];
    header[..MAGIC.len()].copy_from_slice(MAGIC);
    rand::thread_rng().fill_bytes(&mut header[MAGIC.len()..]);

    let salt = &header[MAGIC.len()..MAGIC.len() + SALT_LEN];
    let nonce = Nonce::from_slice(&header[MAGIC.len() + SALT_LEN..]);

    let key = derive_key(passphrase, salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| VaultError::Encryption)?;
    let ciphertext = cipher
        .encrypt(
            nonce,
            Payload {
                msg: plaintext,
                aad: &header,
            },
        )
        .map_err(|_| VaultError::Encryption)?;

    let mut sealed = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    sealed.extend_from_slice(&header);
    sealed.extend_from_slice(&ciphertext);
    Ok(sealed)
}

/// Decrypt a vault produced by [`seal`]. The plaintext is wiped on drop.
pub fn open(passphrase: &str, sealed: &[u8]) -> Result<Zeroizing<Vec<u8>>, VaultError> {
    if !is_sealed(sealed) || sealed.len() <= HEADER_LEN {
        return Err(VaultError::NotAVault);
    }
    let (header, ciphertext) = sealed.split_at(HEADER_LEN);
    let salt = &header[MAGIC.len()..MAGIC.len() + SALT_LEN];
    let nonce = Nonce::from_slice(&header[MAGIC.len() + SALT_LEN..]);

    let key = derive_key(passphrase, salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| VaultError::Decryption)?;
    let plaintext = cipher
        .decrypt(
            nonce,
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map_err(|_| VaultError::Decryption)?;

    Ok(Zeroizing::new(plaintext))
}
