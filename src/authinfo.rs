//! Transfer password generation

use rand::Rng;

/// Length of generated transfer passwords
pub const AUTHINFO_PW_LEN: usize = 8;

/// Alphabet without look-alike characters (0/O, 1/l/I)
const AUTHINFO_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz23456789";

/// Generate a fresh random transfer password
pub fn generate_authinfo_pw() -> String {
    let mut rng = rand::thread_rng();
    (0..AUTHINFO_PW_LEN)
        .map(|_| AUTHINFO_CHARSET[rng.gen_range(0..AUTHINFO_CHARSET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_alphabet() {
        for _ in 0..100 {
            let pw = generate_authinfo_pw();
            assert_eq!(pw.len(), AUTHINFO_PW_LEN);
            assert!(pw.bytes().all(|b| AUTHINFO_CHARSET.contains(&b)));
        }
    }

    #[test]
    fn test_no_ambiguous_characters() {
        for c in [b'0', b'O', b'1', b'l', b'I'] {
            assert!(!AUTHINFO_CHARSET.contains(&c));
        }
    }
}
