use crate::error::HodokiError;
use bytes::Bytes;

const DICT_CAPACITY: usize = 0x1000;
const DICT_START: usize = 1;
const MIN_MATCH: usize = 3;
/// Eight 18 byte back-references per 17 input bytes.
const MAX_EXPANSION: usize = 9;

/// Decompresses the fc01 LZSS variant into exactly `output_size` bytes.
///
/// Flags come eight per control byte, least significant bit first. A set bit
/// is a literal; a clear bit is a little endian `u16` holding a 12 bit
/// absolute dictionary position and a 4 bit length.
pub fn decompress(input: &[u8], output_size: usize) -> Result<Bytes, HodokiError> {
    if output_size > input.len().saturating_mul(MAX_EXPANSION) {
        return Err(HodokiError::CorruptData(format!(
            "{} bytes cannot expand to {} bytes",
            input.len(),
            output_size
        )));
    }

    let mut dict = vec![0u8; DICT_CAPACITY];
    let mut dict_pos = DICT_START;
    let mut dict_size = 0;
    let mut output = Vec::with_capacity(output_size);
    let mut input = input.iter().copied();

    let mut control = 0u16;
    while output.len() < output_size {
        control >>= 1;
        if control & 0x100 == 0 {
            control = u16::from(next_byte(&mut input)?) | 0xFF00;
        }

        if control & 1 != 0 {
            let b = next_byte(&mut input)?;
            output.push(b);
            dict[dict_pos] = b;
            dict_pos = (dict_pos + 1) % DICT_CAPACITY;
            dict_size = (dict_size + 1).min(DICT_CAPACITY);
        } else {
            let lo = next_byte(&mut input)?;
            let hi = next_byte(&mut input)?;
            let tmp = u16::from_le_bytes([lo, hi]);
            let mut look_behind = (tmp >> 4) as usize;
            let repetitions = (tmp & 0xF) as usize + MIN_MATCH;
            for _ in 0..repetitions {
                if output.len() >= output_size {
                    break;
                }
                // Written slots are DICT_START..DICT_START + dict_size
                if (look_behind + DICT_CAPACITY - DICT_START) % DICT_CAPACITY
                    >= dict_size
                {
                    return Err(HodokiError::CorruptData(format!(
                        "Back-reference to unwritten slot {:#X}",
                        look_behind
                    )));
                }
                let b = dict[look_behind];
                output.push(b);
                dict[dict_pos] = b;
                dict_pos = (dict_pos + 1) % DICT_CAPACITY;
                dict_size = (dict_size + 1).min(DICT_CAPACITY);
                look_behind = (look_behind + 1) % DICT_CAPACITY;
            }
        }
    }
    Ok(Bytes::from(output))
}

fn next_byte(input: &mut impl Iterator<Item = u8>) -> Result<u8, HodokiError> {
    input.next().ok_or_else(|| {
        HodokiError::CorruptData(String::from("Compressed stream ended early"))
    })
}
