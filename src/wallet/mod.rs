use rand::rngs::OsRng;
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey, ecdsa::Signature};
use sha2::{Digest, Sha256};

use crate::error::{LedgerError, Result};

/// Generate a new secp256k1 keypair and return (priv_hex, pub_hex_compressed).
/// The public key hex doubles as the account address.
pub fn generate_keypair_hex() -> (String, String) {
    let secp = Secp256k1::new();
    let (sk, pk) = secp.generate_keypair(&mut OsRng);
    (hex::encode(sk.secret_bytes()), hex::encode(pk.serialize()))
}

/// Derive the compressed public key hex belonging to a private key hex.
pub fn public_key_hex(private_key_hex: &str) -> Result<String> {
    let secp = Secp256k1::signing_only();
    let sk = parse_secret_key(private_key_hex)?;
    Ok(hex::encode(PublicKey::from_secret_key(&secp, &sk).serialize()))
}

/// Sign `message` (SHA-256 digested first) and return the DER signature as hex.
pub fn sign_hex(private_key_hex: Option<&str>, message: &[u8]) -> Result<String> {
    let sk_hex = private_key_hex
        .filter(|k| !k.is_empty())
        .ok_or(LedgerError::MissingKeyMaterial("private key required to sign"))?;
    let sk = parse_secret_key(sk_hex)?;

    let secp = Secp256k1::signing_only();
    let sig = secp.sign_ecdsa(&digest(message), &sk);
    Ok(hex::encode(&*sig.serialize_der()))
}

/// Verify a hex DER signature over `message` against a hex public key.
///
/// Anything that does not decode (signature or key) is simply `false`; only a
/// missing public key is an error.
pub fn verify_hex(public_key_hex: Option<&str>, sig_hex: &str, message: &[u8]) -> Result<bool> {
    let pk_hex = public_key_hex
        .filter(|k| !k.is_empty())
        .ok_or(LedgerError::MissingKeyMaterial("public key required to verify"))?;

    let Some(pk) = hex::decode(pk_hex)
        .ok()
        .and_then(|b| PublicKey::from_slice(&b).ok())
    else {
        return Ok(false);
    };
    let Some(sig) = hex::decode(sig_hex)
        .ok()
        .and_then(|b| Signature::from_der(&b).ok())
    else {
        return Ok(false);
    };

    let secp = Secp256k1::verification_only();
    Ok(secp.verify_ecdsa(&digest(message), &sig, &pk).is_ok())
}

fn parse_secret_key(sk_hex: &str) -> Result<SecretKey> {
    let bytes = hex::decode(sk_hex)?;
    SecretKey::from_slice(&bytes).map_err(|e| LedgerError::InvalidKeyMaterial(e.to_string()))
}

fn digest(message: &[u8]) -> Message {
    let hashed: [u8; 32] = Sha256::digest(message).into();
    Message::from_digest(hashed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify() {
        let (sk, pk) = generate_keypair_hex();
        assert_eq!(public_key_hex(&sk).unwrap(), pk);

        let sig = sign_hex(Some(&sk), b"payload").unwrap();
        assert!(verify_hex(Some(&pk), &sig, b"payload").unwrap());
        assert!(!verify_hex(Some(&pk), &sig, b"other payload").unwrap());
    }

    #[test]
    fn wrong_key_is_false() {
        let (sk, _) = generate_keypair_hex();
        let (_, other_pk) = generate_keypair_hex();
        let sig = sign_hex(Some(&sk), b"payload").unwrap();
        assert!(!verify_hex(Some(&other_pk), &sig, b"payload").unwrap());
    }

    #[test]
    fn garbage_input_is_false_not_error() {
        let (_, pk) = generate_keypair_hex();
        assert!(!verify_hex(Some(&pk), "zz-not-hex", b"m").unwrap());
        assert!(!verify_hex(Some(&pk), "deadbeef", b"m").unwrap());
        assert!(!verify_hex(Some("not-a-key"), "deadbeef", b"m").unwrap());
    }

    #[test]
    fn missing_keys_are_errors() {
        assert!(matches!(
            sign_hex(None, b"m"),
            Err(LedgerError::MissingKeyMaterial(_))
        ));
        assert!(matches!(
            verify_hex(None, "00", b"m"),
            Err(LedgerError::MissingKeyMaterial(_))
        ));
        assert!(matches!(
            sign_hex(Some("abcd"), b"m"),
            Err(LedgerError::InvalidKeyMaterial(_))
        ));
    }
}
