/// Returned in place of any credential too short to partially reveal.
pub const MASK_PLACEHOLDER: &str = "***";

const MIN_MASKABLE_LEN: usize = 15;
const VISIBLE_HEAD: usize = 10;
const VISIBLE_TAIL: usize = 5;

/// Redact a plaintext credential for display.
///
/// Lengths are counted in characters, so multi-byte input never splits
/// inside a code point.
pub fn mask(plaintext: &str) -> String {
    let len = plaintext.chars().count();
    if len < MIN_MASKABLE_LEN {
        return MASK_PLACEHOLDER.to_string();
    }

    let head: String = plaintext.chars().take(VISIBLE_HEAD).collect();
    let tail: String = plaintext.chars().skip(len - VISIBLE_TAIL).collect();
    format!("{head}...{tail}")
}
