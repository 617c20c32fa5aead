//! The password-protected log container.
//!
//! An envelope is `b"Salted__" || salt (8 bytes) || AES-256-CBC(PKCS#7) ciphertext`. Key and IV
//! are derived from the password and the salt with one iteration of OpenSSL's `EVP_BytesToKey`
//! over SHA-256, so envelopes can be opened with
//! `openssl enc -d -aes-256-cbc -md sha256 -pass pass:<password>`.

use crate::error::CryptoError;
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::generic_array::GenericArray;
use cbc::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// The marker every envelope starts with.
pub const MAGIC: &[u8; 8] = b"Salted__";
pub const SALT_LEN: usize = 8;
const KEY_LEN: usize = 32;
const IV_LEN: usize = 16;
const HEADER_LEN: usize = MAGIC.len() + SALT_LEN;

/// Encrypt `plaintext` under `password` with a fresh random salt.
pub fn encrypt(plaintext: &[u8], password: &str) -> Vec<u8> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);

    encrypt_with_salt(plaintext, password, &salt)
}

pub(crate) fn encrypt_with_salt(
    plaintext: &[u8],
    password: &str,
    salt: &[u8; SALT_LEN],
) -> Vec<u8> {
    let (key, iv) = derive_key_iv(password.as_bytes(), salt);
    let ciphertext = Aes256CbcEnc::new(
        GenericArray::from_slice(&key[..]),
        GenericArray::from_slice(&iv[..]),
    )
    .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

    let mut envelope = Vec::with_capacity(HEADER_LEN + ciphertext.len());
    envelope.extend_from_slice(MAGIC);
    envelope.extend_from_slice(salt);
    envelope.extend_from_slice(&ciphertext);
    envelope
}

/// Decrypt an envelope produced by [`encrypt`].
pub fn decrypt(envelope: &[u8], password: &str) -> Result<Vec<u8>, CryptoError> {
    if envelope.len() < MAGIC.len() || &envelope[..MAGIC.len()] != MAGIC {
        return Err(CryptoError::InvalidFormat("missing Salted__ marker".into()));
    }

    if envelope.len() < HEADER_LEN {
        return Err(CryptoError::InvalidFormat("truncated salt".into()));
    }

    let (header, ciphertext) = envelope.split_at(HEADER_LEN);
    let salt = &header[MAGIC.len()..];
    let (key, iv) = derive_key_iv(password.as_bytes(), salt);

    Aes256CbcDec::new(
        GenericArray::from_slice(&key[..]),
        GenericArray::from_slice(&iv[..]),
    )
    .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
    .map_err(|_| CryptoError::DecryptionFailed)
}

/// `EVP_BytesToKey(SHA-256, count = 1)`: `D_i = SHA256(D_{i-1} || password || salt)`, concatenated
/// until there is enough material for the key followed by the IV.
fn derive_key_iv(
    password: &[u8],
    salt: &[u8],
) -> (Zeroizing<[u8; KEY_LEN]>, Zeroizing<[u8; IV_LEN]>) {
    let mut material = Zeroizing::new(Vec::with_capacity(2 * KEY_LEN));
    let mut prev: Option<Zeroizing<Vec<u8>>> = None;

    while material.len() < KEY_LEN + IV_LEN {
        let mut hasher = Sha256::new();
        if let Some(prev) = &prev {
            hasher.update(prev.as_slice());
        }
        hasher.update(password);
        hasher.update(salt);

        let digest = Zeroizing::new(hasher.finalize().to_vec());
        material.extend_from_slice(&digest);
        prev = Some(digest);
    }

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    let mut iv = Zeroizing::new([0u8; IV_LEN]);
    key.copy_from_slice(&material[..KEY_LEN]);
    iv.copy_from_slice(&material[KEY_LEN..KEY_LEN + IV_LEN]);

    (key, iv)
}
