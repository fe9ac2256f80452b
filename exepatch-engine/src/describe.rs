//! Built-in catalogue of recognized opcode transforms
//!
//! Purely cosmetic: descriptions make the run report readable for patch
//! authors. Unrecognized transforms simply have no description.

/// Describe a byte replacement in x86 terms, if it matches a known shape
pub fn describe_transform(original: &[u8], replacement: &[u8]) -> Option<String> {
    let (&orig0, &repl0) = (original.first()?, replacement.first()?);

    // Short conditional jumps (70..7f)
    if (0x70..=0x7f).contains(&orig0) {
        if repl0 == 0xeb {
            return Some("conditional jump forced unconditional".into());
        }
        if repl0 == orig0 ^ 0x01 {
            return Some("conditional jump inverted".into());
        }
    }

    // Near conditional jumps (0f 80..8f)
    if orig0 == 0x0f
        && let Some(&orig1) = original.get(1)
        && (0x80..=0x8f).contains(&orig1)
    {
        if replacement.starts_with(&[0x90, 0xe9]) || replacement.starts_with(&[0xe9]) {
            return Some("near conditional jump forced unconditional".into());
        }
        if replacement.starts_with(&[0x0f, orig1 ^ 0x01]) {
            return Some("near conditional jump inverted".into());
        }
    }

    if !replacement.is_empty() && replacement.iter().all(|&b| b == 0x90) {
        return Some("instructions replaced with no-op padding".into());
    }

    if repl0 == 0xc3 && orig0 != 0xc3 {
        return Some("early return inserted".into());
    }

    None
}
