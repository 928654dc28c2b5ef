//! Register decoder: raw PDU payload bytes -> a sequence of typed [`Value`]s.
//!
//! This is the direct descendant of the source's `ModbusData.translate`/`reg`
//! methods. The seven-step algorithm (byte-swap, bit unpacking for coil
//! functions, register assembly, write-echo passthrough, raw-bytes bypass,
//! grouped typed decode, display-offset bookkeeping) is kept in the same
//! order so the two can be read side by side.

use crate::bytes::{bytes_to_registers, swap_bytes, word_swap_group};
use crate::constants::{FC_READ_COILS, FC_READ_DISCRETE_INPUTS, FC_WRITE_SINGLE_COIL, FC_WRITE_SINGLE_REGISTER};
use crate::value::{DataType, Value};

/// Flags controlling how a payload is turned into values.
#[derive(Debug, Clone, Copy)]
pub struct DecodeOptions {
    pub byte_swap: bool,
    pub word_swap: bool,
    pub raw_bytes: bool,
}

/// Decode a response payload into a sequence of [`Value`]s.
///
/// `func` is the Modbus function code that produced `payload`; `num_vals` is
/// the logical value count the caller asked for (used to bound bit-unpacking
/// for coil/discrete-input reads).
pub fn decode_registers(
    payload: &[u8],
    func: u8,
    data_type: DataType,
    opts: DecodeOptions,
    num_vals: usize,
) -> Vec<Value> {
    let mut payload = payload.to_vec();
    if opts.byte_swap {
        swap_bytes(&mut payload);
    }

    if func == FC_READ_COILS || func == FC_READ_DISCRETE_INPUTS {
        if opts.raw_bytes {
            return payload.into_iter().map(|b| Value::Raw(vec![b])).collect();
        }
        return unpack_bits(&payload, num_vals);
    }

    let registers = bytes_to_registers(&payload);

    if func == FC_WRITE_SINGLE_COIL || func == FC_WRITE_SINGLE_REGISTER {
        return registers
            .first()
            .map(|&r| vec![Value::UInt(r as u64)])
            .unwrap_or_default();
    }

    if opts.raw_bytes {
        return registers
            .iter()
            .map(|&r| Value::Raw(vec![(r >> 8) as u8, (r & 0xFF) as u8]))
            .collect();
    }

    let width = data_type.registers_per_value();
    let mut values = Vec::new();
    for group in registers.chunks(width) {
        if group.len() < width {
            break;
        }
        let mut group = group.to_vec();
        if opts.word_swap {
            word_swap_group(&mut group);
        }
        values.extend(decode_group(&group, data_type));
    }
    values
}

/// Unpack a byte buffer into individual coil/discrete-input bits,
/// least-significant-bit-first, stopping after `num_vals` bits.
fn unpack_bits(payload: &[u8], num_vals: usize) -> Vec<Value> {
    let mut bits = Vec::with_capacity(num_vals);
    'outer: for byte in payload {
        for i in 0..8 {
            if bits.len() >= num_vals {
                break 'outer;
            }
            bits.push(Value::Bit((byte >> i) & 1 == 1));
        }
    }
    bits
}

/// Decode one register group (already word-swapped if applicable) per
/// Table 2. `group[0]` is `r0`, the lowest-order register.
fn decode_group(group: &[u16], data_type: DataType) -> Vec<Value> {
    use DataType::*;
    match data_type {
        Uint8 => {
            let r0 = group[0];
            vec![Value::UInt((r0 >> 8) as u64), Value::UInt((r0 & 0xFF) as u64)]
        }
        Sint8 => {
            let r0 = group[0];
            vec![
                Value::SInt((r0 >> 8) as u8 as i8 as i64),
                Value::SInt((r0 & 0xFF) as u8 as i8 as i64),
            ]
        }
        Uint16 | Bin | Hex => vec![Value::UInt(group[0] as u64)],
        Sint16 => vec![Value::SInt(group[0] as i16 as i64)],
        Sm1k16 | Sm10k16 => vec![sign_magnitude(group[0], 1)],
        Ascii => {
            let r0 = group[0];
            let hi = (r0 >> 8) as u8 as char;
            let lo = (r0 & 0xFF) as u8 as char;
            vec![Value::Text(format!("{hi}{lo}"))]
        }
        Uint32 => vec![Value::UInt(pack_u32(group) as u64)],
        Sint32 => vec![Value::SInt(pack_u32(group) as i32 as i64)],
        Float => vec![Value::Float(f32::from_bits(pack_u32(group)) as f64)],
        Um1k32 => vec![Value::UInt(group[1] as u64 * 1000 + group[0] as u64)],
        Sm1k32 => vec![sign_magnitude_mult(group[1], group[0] as u64, 1000)],
        Um10k32 => vec![Value::UInt(group[1] as u64 * 10_000 + group[0] as u64)],
        Sm10k32 => vec![sign_magnitude_mult(group[1], group[0] as u64, 10_000)],
        Uint48 => vec![Value::UInt(pack_u48(group))],
        Sint48 => vec![Value::SInt(sign_extend_48(pack_u48(group)))],
        Um1k48 => {
            let v = group[2] as u64 * 1_000_000 + group[1] as u64 * 1000 + group[0] as u64;
            vec![Value::UInt(v)]
        }
        Sm1k48 => {
            let lower = group[1] as u64 * 1000 + group[0] as u64;
            vec![sign_magnitude_mult(group[2], lower, 1_000_000)]
        }
        Um10k48 => {
            let v = group[2] as u64 * 100_000_000 + group[1] as u64 * 10_000 + group[0] as u64;
            vec![Value::UInt(v)]
        }
        Sm10k48 => {
            let lower = group[1] as u64 * 10_000 + group[0] as u64;
            vec![sign_magnitude_mult(group[2], lower, 100_000_000)]
        }
        Uint64 => vec![Value::UInt(pack_u64(group))],
        Sint64 => vec![Value::SInt(pack_u64(group) as i64)],
        Dbl => vec![Value::Float(f64::from_bits(pack_u64(group)))],
        Um1k64 => {
            let v = group[3] as u64 * 1_000_000_000
                + group[2] as u64 * 1_000_000
                + group[1] as u64 * 1000
                + group[0] as u64;
            vec![Value::UInt(v)]
        }
        Sm1k64 => {
            let lower = group[2] as u64 * 1_000_000 + group[1] as u64 * 1000 + group[0] as u64;
            vec![sign_magnitude_mult(group[3], lower, 1_000_000_000)]
        }
        Um10k64 => {
            let v = group[3] as u64 * 1_000_000_000_000
                + group[2] as u64 * 100_000_000
                + group[1] as u64 * 10_000
                + group[0] as u64;
            vec![Value::UInt(v)]
        }
        Sm10k64 => {
            let lower = group[2] as u64 * 100_000_000 + group[1] as u64 * 10_000 + group[0] as u64;
            vec![sign_magnitude_mult(group[3], lower, 1_000_000_000_000)]
        }
        Engy => {
            let exp = (group[3] >> 8) as u8 as i8;
            // The low byte of r3 is an undocumented mantissa sub-byte in the
            // source; it is ignored here as well (see the design notes).
            let mantissa = ((group[2] as u64) << 32) | ((group[1] as u64) << 16) | group[0] as u64;
            let value = mantissa as f64 * 10f64.powi(exp as i32);
            vec![Value::Float(value)]
        }
    }
}

/// Decode a bit-15-sign / bit-0..14-magnitude register into a signed value.
fn sign_magnitude(r: u16, _scale: u64) -> Value {
    let sign = r & 0x8000 != 0;
    let magnitude = (r & 0x7FFF) as i64;
    Value::SInt(if sign { -magnitude } else { magnitude })
}

/// Combine a sign/top register with an already-computed lower magnitude and
/// the top register's own multiplier.
fn sign_magnitude_mult(top: u16, lower: u64, top_mult: u64) -> Value {
    let sign = top & 0x8000 != 0;
    let magnitude = (top & 0x7FFF) as u64 * top_mult + lower;
    Value::SInt(if sign {
        -(magnitude as i64)
    } else {
        magnitude as i64
    })
}

fn pack_u32(group: &[u16]) -> u32 {
    (group[1] as u32) << 16 | group[0] as u32
}

fn pack_u48(group: &[u16]) -> u64 {
    (group[2] as u64) << 32 | (group[1] as u64) << 16 | group[0] as u64
}

fn pack_u64(group: &[u16]) -> u64 {
    (group[3] as u64) << 48 | (group[2] as u64) << 32 | (group[1] as u64) << 16 | group[0] as u64
}

/// Sign-extend a 48-bit two's-complement value (stored in the low 48 bits of
/// a `u64`) to a full-width `i64`. Added per design-note decision: the
/// source leaves `sint48` unsupported, this reimplementation supports it.
fn sign_extend_48(v: u64) -> i64 {
    const SIGN_BIT: u64 = 1 << 47;
    if v & SIGN_BIT != 0 {
        (v | !0x0000_FFFF_FFFF_FFFFu64) as i64
    } else {
        v as i64
    }
}

/// Number of 16-bit registers a read/write of `num_vals` values of
/// `data_type` requires, per Table 1 (bit functions handled separately by
/// the caller since they count bits, not registers).
pub fn registers_needed(data_type: DataType, num_vals: usize) -> usize {
    if data_type.is_byte_packed() {
        num_vals.div_ceil(2)
    } else {
        num_vals * data_type.registers_per_value()
    }
}

/// Function-dependent display-address offset (step 7 of the decode
/// algorithm). `last_reg` is clamped to a minimum of 1 before the log10
/// call per the design-note fix for the source's unstable `last_reg == 0`
/// case.
pub fn display_offset(func: u8, last_reg: u32) -> u32 {
    let last_reg = last_reg.max(1);
    let digits = (last_reg as f64).log10().floor() as u32 + 1;
    let k = digits.max(4) - 4;
    let pow10k = 10u32.pow(k);
    match func {
        1 => 0,
        2 | 5 => 10_000 * pow10k,
        4 => 30_000 * pow10k,
        3 | 6 => 40_000 * pow10k,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(byte_swap: bool, word_swap: bool, raw_bytes: bool) -> DecodeOptions {
        DecodeOptions {
            byte_swap,
            word_swap,
            raw_bytes,
        }
    }

    #[test]
    fn uint16_single_register() {
        let payload = [0x00, 0x2A];
        let values = decode_registers(&payload, 3, DataType::Uint16, opts(false, false, false), 1);
        assert_eq!(values, vec![Value::UInt(42)]);
    }

    #[test]
    fn float_decode_with_word_swap() {
        // r0 = 0x4248, r1 = 0x0000 on the wire; word_swap reverses the group
        // before decode so the bit pattern read back is 0x42480000 = 50.0625f32.
        let payload = [0x42, 0x48, 0x00, 0x00];
        let values = decode_registers(&payload, 3, DataType::Float, opts(false, true, false), 1);
        match values.as_slice() {
            [Value::Float(f)] => assert!((f - 50.0625).abs() < 1e-9),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn sm1k32_negative() {
        let payload = [0x00, 0xFA, 0x80, 0x03]; // r0=250, r1=0x8003
        let values = decode_registers(&payload, 3, DataType::Sm1k32, opts(false, false, false), 1);
        assert_eq!(values, vec![Value::SInt(-3250)]);
    }

    #[test]
    fn coil_read_lsb_first() {
        let payload = [0xCD, 0x01];
        let values = decode_registers(&payload, FC_READ_COILS, DataType::Uint16, opts(false, false, false), 10);
        let bits: Vec<bool> = values
            .into_iter()
            .map(|v| matches!(v, Value::Bit(true)))
            .collect();
        assert_eq!(
            bits,
            vec![true, false, true, true, false, false, true, true, true, false]
        );
    }

    #[test]
    fn write_single_register_echoes_value() {
        let payload = [0x00, 0x2A];
        let values = decode_registers(
            &payload,
            FC_WRITE_SINGLE_REGISTER,
            DataType::Uint16,
            opts(false, false, false),
            1,
        );
        assert_eq!(values, vec![Value::UInt(42)]);
    }

    #[test]
    fn sint48_is_supported_and_sign_extends() {
        let group = [0xFFFFu16, 0xFFFF, 0xFFFF];
        let value = decode_group(&group, DataType::Sint48);
        assert_eq!(value, vec![Value::SInt(-1)]);
    }

    #[test]
    fn engy_ignores_mantissa_sub_byte() {
        // exp = 2, mantissa = 5; low byte of r3 varies and must not matter.
        let g1 = [5u16, 0, 0, 0x0200];
        let g2 = [5u16, 0, 0, 0x02FF];
        assert_eq!(decode_group(&g1, DataType::Engy), decode_group(&g2, DataType::Engy));
        match decode_group(&g1, DataType::Engy).as_slice() {
            [Value::Float(v)] => assert!((v - 500.0).abs() < 1e-9),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn registers_needed_matches_table_1() {
        assert_eq!(registers_needed(DataType::Uint16, 3), 3);
        assert_eq!(registers_needed(DataType::Float, 2), 4);
        assert_eq!(registers_needed(DataType::Engy, 1), 4);
        assert_eq!(registers_needed(DataType::Uint8, 3), 2);
    }

    #[test]
    fn display_offset_clamps_zero_last_reg() {
        // Must not panic/NaN on last_reg == 0.
        assert_eq!(display_offset(3, 0), 40_000);
    }

    #[test]
    fn display_offset_scales_with_digit_count() {
        assert_eq!(display_offset(4, 9999), 30_000);
        assert_eq!(display_offset(4, 10000), 300_000);
    }
}
