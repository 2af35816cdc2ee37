use rand::Rng;

use crate::monitoring::types::CHECK_ID_LEN;

const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase-alphanumeric string of the given length.
pub fn random_string(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char).collect()
}

/// Mint a record ID in the shape the `checks` and `tokens` collections
/// use.
pub fn random_record_id() -> String {
    random_string(CHECK_ID_LEN)
}
