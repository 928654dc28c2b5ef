#![no_main]
use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use mbpoll::codec::{decode_registers, DecodeOptions};
use mbpoll::value::DataType;

#[derive(Arbitrary, Debug)]
struct Input {
    payload: Vec<u8>,
    func: u8,
    byte_swap: bool,
    word_swap: bool,
    raw_bytes: bool,
    num_vals: u16,
    data_type_index: u8,
}

const DATA_TYPES: &[DataType] = &[
    DataType::Uint16,
    DataType::Sint16,
    DataType::Sm1k16,
    DataType::Sm10k16,
    DataType::Uint32,
    DataType::Sint32,
    DataType::Float,
    DataType::Um1k32,
    DataType::Sm1k32,
    DataType::Uint48,
    DataType::Sint48,
    DataType::Uint64,
    DataType::Sint64,
    DataType::Dbl,
    DataType::Engy,
];

fuzz_target!(|input: Input| {
    let data_type = DATA_TYPES[input.data_type_index as usize % DATA_TYPES.len()];
    let opts = DecodeOptions {
        byte_swap: input.byte_swap,
        word_swap: input.word_swap,
        raw_bytes: input.raw_bytes,
    };
    // Must never panic regardless of payload length or requested width.
    let _ = decode_registers(&input.payload, input.func, data_type, opts, input.num_vals as usize);
});
