//! # Recoverable ECDSA Signatures (secp256k1)
//!
//! Validator identity is a [`Signatory`]: the SHA-256 of the uncompressed
//! public key coordinates `x || y`. Signatures carry a recovery id so that the
//! signatory can be recovered from `(hash, signature)` alone.
//!
//! ## Security Properties
//!
//! - RFC 6979 deterministic nonces (no RNG dependency for signing)
//! - Low-S normalization; the recovery id is flipped to match
//! - Recovery on malformed input returns an error, never a silent identity

use crate::{CryptoError, Hash};
use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroize;

/// Number of bytes in a [`Signature`] (`r || s || v`).
pub const SIGNATURE_LENGTH: usize = 65;

/// Number of bytes in a [`Signatory`].
pub const SIGNATORY_LENGTH: usize = 32;

/// Validator identity derived from a secp256k1 public key.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Signatory(pub [u8; SIGNATORY_LENGTH]);

impl Signatory {
    /// The all-zero signatory used by the genesis block.
    pub const ZERO: Signatory = Signatory([0u8; SIGNATORY_LENGTH]);

    /// SHA-256 of the 64-byte uncompressed coordinates of `key`.
    pub fn from_public_key(key: &VerifyingKey) -> Self {
        let point = key.to_encoded_point(false);
        // Skip the 0x04 SEC1 tag
        Signatory(Sha256::digest(&point.as_bytes()[1..]).into())
    }

    /// Decode from a byte slice that must be exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; SIGNATORY_LENGTH] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                expected: SIGNATORY_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Signatory(array))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATORY_LENGTH] {
        &self.0
    }
}

impl fmt::Display for Signatory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Signatory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signatory({})", &hex::encode(self.0)[..12])
    }
}

/// Recoverable ECDSA signature over a [`Hash`], encoded as `r || s || v`.
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Signature(#[serde_as(as = "Bytes")] pub [u8; SIGNATURE_LENGTH]);

impl Signature {
    /// The all-zero signature used by the genesis block. It never recovers.
    pub const ZERO: Signature = Signature([0u8; SIGNATURE_LENGTH]);

    /// Decode from a byte slice that must be exactly 65 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let array: [u8; SIGNATURE_LENGTH] =
            bytes.try_into().map_err(|_| CryptoError::InvalidLength {
                expected: SIGNATURE_LENGTH,
                actual: bytes.len(),
            })?;
        Ok(Signature(array))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; SIGNATURE_LENGTH] {
        &self.0
    }

    /// Recover the signatory that produced this signature over `hash`.
    pub fn recover(&self, hash: &Hash) -> Result<Signatory, CryptoError> {
        let v = self.0[64];
        let recovery_id = RecoveryId::from_byte(v).ok_or(CryptoError::InvalidRecoveryId(v))?;
        let signature = EcdsaSignature::from_slice(&self.0[..64])
            .map_err(|_| CryptoError::InvalidSignatureFormat)?;
        let key = VerifyingKey::recover_from_prehash(hash.as_bytes(), &signature, recovery_id)
            .map_err(|_| CryptoError::RecoveryFailed)?;
        Ok(Signatory::from_public_key(&key))
    }

    /// True when this signature recovers to `signatory` over `hash`.
    pub fn verify(&self, hash: &Hash, signatory: &Signatory) -> bool {
        matches!(self.recover(hash), Ok(recovered) if recovered == *signatory)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Signature::ZERO
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({})", &hex::encode(self.0)[..12])
    }
}

/// Signing capability bound to one replica key.
pub trait Signer: Send + Sync {
    /// Sign a hash.
    fn sign(&self, hash: &Hash) -> Result<Signature, CryptoError>;

    /// Identity of the key behind this signer.
    fn signatory(&self) -> Signatory;
}

/// secp256k1 ECDSA keypair.
#[derive(Clone)]
pub struct Secp256k1KeyPair {
    signing_key: SigningKey,
    signatory: Signatory,
}

impl Secp256k1KeyPair {
    /// Generate random keypair.
    pub fn generate() -> Self {
        Self::from_signing_key(SigningKey::random(&mut rand::thread_rng()))
    }

    /// Create from secret key bytes (32 bytes).
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_bytes((&bytes).into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self::from_signing_key(signing_key))
    }

    fn from_signing_key(signing_key: SigningKey) -> Self {
        let signatory = Signatory::from_public_key(signing_key.verifying_key());
        Self {
            signing_key,
            signatory,
        }
    }

    /// Public key of this keypair.
    pub fn verifying_key(&self) -> VerifyingKey {
        *self.signing_key.verifying_key()
    }

    /// Get secret key bytes (for serialization).
    pub fn to_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes().into()
    }
}

impl Signer for Secp256k1KeyPair {
    fn sign(&self, hash: &Hash) -> Result<Signature, CryptoError> {
        let (mut signature, mut recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(hash.as_bytes())
            .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

        if let Some(normalized) = signature.normalize_s() {
            signature = normalized;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }

        let mut bytes = [0u8; SIGNATURE_LENGTH];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = recovery_id.to_byte();
        Ok(Signature(bytes))
    }

    fn signatory(&self) -> Signatory {
        self.signatory
    }
}

impl fmt::Debug for Secp256k1KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secp256k1KeyPair")
            .field("signatory", &self.signatory)
            .finish_non_exhaustive()
    }
}

impl Drop for Secp256k1KeyPair {
    fn drop(&mut self) {
        // Zeroize secret key material
        let mut bytes: [u8; 32] = self.signing_key.to_bytes().into();
        bytes.zeroize();
    }
}

/// Check many `(hash, signature, signatory)` triples in parallel.
///
/// Output is index-aligned with the input.
pub fn verify_batch(items: &[(Hash, Signature, Signatory)]) -> Vec<bool> {
    items
        .par_iter()
        .map(|(hash, signature, signatory)| signature.verify(hash, signatory))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keypair(seed: u8) -> Secp256k1KeyPair {
        Secp256k1KeyPair::from_bytes([seed; 32]).unwrap()
    }

    #[test]
    fn test_sign_recover_roundtrip() {
        let keypair = Secp256k1KeyPair::generate();
        let hash = Hash::digest(b"Hello, secp256k1!");

        let signature = keypair.sign(&hash).unwrap();

        assert_eq!(signature.recover(&hash).unwrap(), keypair.signatory());
        assert!(signature.verify(&hash, &keypair.signatory()));
    }

    #[test]
    fn test_deterministic_signatures() {
        let keypair = keypair(0xAB);
        let hash = Hash::digest(b"deterministic test");

        assert_eq!(keypair.sign(&hash).unwrap(), keypair.sign(&hash).unwrap());
    }

    #[test]
    fn test_tampered_hash_never_recovers_original() {
        let keypair = keypair(3);
        let hash = Hash::digest(b"vote");
        let signature = keypair.sign(&hash).unwrap();

        let other = Hash::digest(b"other vote");
        match signature.recover(&other) {
            Ok(signatory) => assert_ne!(signatory, keypair.signatory()),
            Err(_) => {}
        }
    }

    #[test]
    fn test_tampered_signature_never_recovers_original() {
        let keypair = keypair(4);
        let hash = Hash::digest(b"vote");
        let signature = keypair.sign(&hash).unwrap();

        for index in [0usize, 17, 40, 63] {
            let mut bytes = signature.0;
            bytes[index] ^= 0x01;
            match Signature(bytes).recover(&hash) {
                Ok(signatory) => assert_ne!(signatory, keypair.signatory()),
                Err(_) => {}
            }
        }
    }

    #[test]
    fn test_zero_signature_fails() {
        let hash = Hash::digest(b"genesis");
        assert!(Signature::ZERO.recover(&hash).is_err());
    }

    #[test]
    fn test_invalid_recovery_id() {
        let keypair = keypair(5);
        let hash = Hash::digest(b"vote");
        let mut signature = keypair.sign(&hash).unwrap();
        signature.0[64] = 9;

        assert_eq!(signature.recover(&hash), Err(CryptoError::InvalidRecoveryId(9)));
    }

    #[test]
    fn test_from_slice_lengths() {
        assert!(Signature::from_slice(&[0u8; 64]).is_err());
        assert!(Signature::from_slice(&[0u8; 65]).is_ok());
        assert_eq!(
            Signatory::from_slice(&[0u8; 33]),
            Err(CryptoError::InvalidLength {
                expected: 32,
                actual: 33
            })
        );
    }

    #[test]
    fn test_signatory_is_hash_of_coordinates() {
        let keypair = keypair(6);
        let point = keypair.verifying_key().to_encoded_point(false);
        let expected = Hash::digest(&point.as_bytes()[1..]);

        assert_eq!(keypair.signatory().0, expected.0);
    }

    #[test]
    fn test_roundtrip_bytes() {
        let original = Secp256k1KeyPair::generate();
        let restored = Secp256k1KeyPair::from_bytes(original.to_bytes()).unwrap();

        assert_eq!(original.signatory(), restored.signatory());
    }

    #[test]
    fn test_zero_private_key_rejected() {
        assert_eq!(
            Secp256k1KeyPair::from_bytes([0u8; 32]).unwrap_err(),
            CryptoError::InvalidPrivateKey
        );
    }

    #[test]
    fn test_verify_batch_is_index_aligned() {
        let a = keypair(7);
        let b = keypair(8);
        let hash = Hash::digest(b"batch");
        let sig_a = a.sign(&hash).unwrap();

        let results = verify_batch(&[
            (hash, sig_a, a.signatory()),
            (hash, sig_a, b.signatory()),
            (hash, Signature::ZERO, a.signatory()),
        ]);

        assert_eq!(results, vec![true, false, false]);
    }

    #[test]
    fn test_signature_serde_roundtrip() {
        let keypair = keypair(9);
        let signature = keypair.sign(&Hash::digest(b"serde")).unwrap();

        let json = serde_json::to_string(&signature).unwrap();
        let decoded: Signature = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, signature);
    }
}
