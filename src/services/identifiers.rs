use rand::{Rng, RngCore};

const PUBLIC_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CONSONANTS: &[u8] = b"bcdfghjklmnprstvwz";
const VOWELS: &[u8] = b"aeiou";

pub(crate) fn public_id() -> String {
    let mut rng = rand::thread_rng();
    let groups: Vec<String> = (0..3)
        .map(|_| {
            (0..4)
                .map(|_| PUBLIC_ALPHABET[rng.gen_range(0..PUBLIC_ALPHABET.len())] as char)
                .collect()
        })
        .collect();
    groups.join("-")
}

pub(crate) fn private_key() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub(crate) fn pronounceable_ccid() -> String {
    let mut rng = rand::thread_rng();
    let words: Vec<String> =
        (0..4).map(|_| format!("{}{}", syllable(&mut rng), syllable(&mut rng))).collect();
    words.join("-")
}

fn syllable(rng: &mut impl Rng) -> String {
    let consonant = CONSONANTS[rng.gen_range(0..CONSONANTS.len())] as char;
    let vowel = VOWELS[rng.gen_range(0..VOWELS.len())] as char;
    format!("{consonant}{vowel}")
}

pub(crate) fn is_valid_segment(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= 128
        && value.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}
