use bytes::Bytes;

/// Reverses the per-file transform applied to filtered MRG members.
///
/// The key starts at `seed` and evolves with every ciphertext byte and its
/// position, so identical plaintext bytes never encrypt the same way twice.
pub fn decrypt(seed: u8, input: &[u8]) -> Bytes {
    let mut key = seed;
    input
        .iter()
        .enumerate()
        .map(|(i, &b)| {
            let plain = b.rotate_left(1) ^ key;
            key = key.wrapping_add(b) ^ i as u8;
            plain
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encrypt(seed: u8, input: &[u8]) -> Vec<u8> {
        let mut key = seed;
        input
            .iter()
            .enumerate()
            .map(|(i, &b)| {
                let cipher = (b ^ key).rotate_right(1);
                key = key.wrapping_add(cipher) ^ i as u8;
                cipher
            })
            .collect()
    }

    #[test]
    fn golden_vectors() {
        assert_eq!(&decrypt(0x00, &[0x00, 0x00, 0x00])[..], &[0x00, 0x00, 0x01]);
        assert_eq!(&decrypt(0x5A, &[0x00, 0xFF, 0x80])[..], &[0x5A, 0xA5, 0x59]);
        assert_eq!(
            &decrypt(0x01, &[0x81, 0x02, 0x10, 0x20])[..],
            &[0x02, 0x86, 0xA5, 0xD7]
        );
        assert!(decrypt(0x33, &[]).is_empty());
    }

    #[test]
    fn depends_on_position_and_history() {
        let plain = [0x41u8; 16];
        let cipher = encrypt(0, &plain);
        assert!(cipher.windows(2).any(|w| w[0] != w[1]));
        assert_ne!(encrypt(1, &plain), cipher);
    }

    #[test]
    fn round_trip() {
        let plain = b"The quick brown fox jumps over the lazy dog".to_vec();
        for seed in [0u8, 1, 0x7F, 0xFF].iter() {
            let cipher = encrypt(*seed, &plain);
            assert_eq!(&decrypt(*seed, &cipher)[..], &plain[..]);
        }
    }
}
