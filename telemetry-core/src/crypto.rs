// Telemetry decryption module.
// Invariants: decrypted payloads are never logged or persisted in this layer.

use salsa20::cipher::{KeyIvInit, StreamCipher};
use salsa20::Salsa20;
use thiserror::Error;

use crate::layout::V1;

const KEY_BYTES: &[u8] = b"Simulator Interface Packet GT7 ver 0.0";
const IV_XOR_CONST: u32 = 0xDEAD_BEAF;

/// A datagram that could not be decrypted. Always recoverable: the caller
/// drops the packet, counts the failure, and keeps receiving.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum DecryptError {
    #[error("datagram too short for IV seed: {len} bytes")]
    TooShort { len: usize },
    #[error("magic mismatch after decryption: 0x{found:08X}")]
    BadMagic { found: u32 },
}

fn build_nonce(iv1: u32) -> [u8; 8] {
    let iv2 = iv1 ^ IV_XOR_CONST;
    let mut nonce = [0u8; 8];
    nonce[0..4].copy_from_slice(&iv2.to_le_bytes());
    nonce[4..8].copy_from_slice(&iv1.to_le_bytes());
    nonce
}

fn keystream_cipher(iv1: u32) -> Salsa20 {
    let mut key = [0u8; 32];
    key.copy_from_slice(&KEY_BYTES[0..32]);
    Salsa20::new(&key.into(), &build_nonce(iv1).into())
}

/// Reverses the console's Salsa20 stream cipher. The IV seed is carried in
/// the datagram itself, so no out-of-band exchange is needed.
pub fn decrypt_packet(dat: &[u8]) -> Result<Vec<u8>, DecryptError> {
    let iv_end = V1.iv_offset + 4;
    if dat.len() < iv_end {
        return Err(DecryptError::TooShort { len: dat.len() });
    }

    let mut seed = [0u8; 4];
    seed.copy_from_slice(&dat[V1.iv_offset..iv_end]);
    let iv1 = u32::from_le_bytes(seed);

    let mut out = dat.to_vec();
    keystream_cipher(iv1).apply_keystream(&mut out);

    let magic_end = V1.magic_offset + 4;
    if out.len() < magic_end {
        return Err(DecryptError::TooShort { len: out.len() });
    }
    let mut magic_bytes = [0u8; 4];
    magic_bytes.copy_from_slice(&out[V1.magic_offset..magic_end]);
    let magic = u32::from_le_bytes(magic_bytes);
    if magic != V1.magic {
        return Err(DecryptError::BadMagic { found: magic });
    }

    Ok(out)
}

/// Applies the console's cipher to a plaintext packet, embedding `seed` at
/// the IV offset of the ciphertext. Used for test fixtures and replay
/// tooling; the agent itself only decrypts.
pub fn encrypt_packet(plain: &[u8], seed: u32) -> Vec<u8> {
    let mut out = plain.to_vec();
    keystream_cipher(seed).apply_keystream(&mut out);

    let iv_end = V1.iv_offset + 4;
    if out.len() >= iv_end {
        out[V1.iv_offset..iv_end].copy_from_slice(&seed.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn plaintext_with_magic(len: usize) -> Vec<u8> {
        let mut plain = vec![0u8; len];
        plain[0..4].copy_from_slice(&V1.magic.to_le_bytes());
        plain
    }

    #[test]
    fn round_trips_valid_packet() {
        let mut plain = plaintext_with_magic(V1.packet_len);
        plain[0x70..0x74].copy_from_slice(&42i32.to_le_bytes());
        let encrypted = encrypt_packet(&plain, 0x1234_5678);

        let decrypted = decrypt_packet(&encrypted).expect("decrypt");
        assert_eq!(&decrypted[0..4], &V1.magic.to_le_bytes());
        assert_eq!(&decrypted[0x70..0x74], &42i32.to_le_bytes());
    }

    #[test]
    fn seed_zero_round_trips() {
        let plain = plaintext_with_magic(V1.packet_len);
        let encrypted = encrypt_packet(&plain, 0);
        assert!(decrypt_packet(&encrypted).is_ok());
    }

    #[test]
    fn rejects_short_datagram() {
        let err = decrypt_packet(&[0u8; 0x20]).unwrap_err();
        assert_eq!(err, DecryptError::TooShort { len: 0x20 });
    }

    #[test]
    fn rejects_corrupt_magic() {
        let mut plain = plaintext_with_magic(V1.packet_len);
        plain[0] ^= 0xFF;
        let encrypted = encrypt_packet(&plain, 7);
        assert!(matches!(
            decrypt_packet(&encrypted),
            Err(DecryptError::BadMagic { .. })
        ));
    }

    #[test]
    fn rejects_truncated_ciphertext() {
        let plain = plaintext_with_magic(V1.packet_len);
        let encrypted = encrypt_packet(&plain, 99);
        // Cut below the IV seed region.
        assert!(matches!(
            decrypt_packet(&encrypted[..0x40]),
            Err(DecryptError::TooShort { .. })
        ));
    }

    proptest! {
        // Arbitrary garbage must never panic, only fail.
        #[test]
        fn never_panics_on_garbage(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let _ = decrypt_packet(&data);
        }
    }
}
