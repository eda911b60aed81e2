use super::ResourceScheme;
use crate::{entity::Entity, error::HodokiError, stream::MemoryStream};
use scroll::{Pread, LE};

const HEADER_SIZE: usize = 0x2C;
/// RIFF chunk size counts everything after its own size field.
const RIFF_OVERHEAD: u32 = 36;
const UNCOMPRESSED: i32 = -1;

/// Key NWA audio, converted to RIFF/WAVE.
#[derive(Debug, Clone)]
pub enum NwaScheme {
    Universal,
}

impl ResourceScheme for NwaScheme {
    fn get_name(&self) -> &str {
        "key/nwa"
    }

    fn is_recognized(&self, entity: &mut Entity) -> bool {
        if entity.extension().as_deref() != Some("nwa") {
            return false;
        }
        entity
            .stream
            .peek(|s| {
                s.seek(0)?;
                let header = s.read(HEADER_SIZE)?.pread_with::<NwaHeader>(0, LE)?;
                Ok::<_, anyhow::Error>(header.is_sane())
            })
            .unwrap_or(false)
    }

    fn convert(&self, entity: &mut Entity) -> anyhow::Result<Entity> {
        let name = wav_name(entity.name());
        let stream = &mut entity.stream;
        stream.seek(0)?;
        let header = stream.read(HEADER_SIZE)?.pread_with::<NwaHeader>(0, LE)?;
        log::debug!("Header: {:#?}", header);
        if !header.is_sane() {
            return Err(HodokiError::CorruptData(format!(
                "{} channels of {} bit samples",
                header.channels, header.bits_per_sample
            ))
            .into());
        }
        if header.compression_level != UNCOMPRESSED {
            return Err(HodokiError::Unimplemented(format!(
                "NWA compression level {}",
                header.compression_level
            ))
            .into());
        }

        let samples = stream.read(header.uncompressed_size as usize)?;
        let expected = u64::from(header.sample_count)
            * u64::from(header.bits_per_sample / 8);
        if expected != samples.len() as u64 {
            log::warn!(
                "{} samples do not fill {} bytes",
                header.sample_count,
                samples.len()
            );
        }

        let data_size = header.uncompressed_size;
        let riff_size = data_size.checked_add(RIFF_OVERHEAD).ok_or_else(|| {
            HodokiError::CorruptData(format!("{} bytes of samples", data_size))
        })?;
        let block_align = header.channels * (header.bits_per_sample / 8);
        let mut output = MemoryStream::new();
        output
            .write(b"RIFF")
            .write_u32_le(riff_size)
            .write(b"WAVE")
            .write(b"fmt ")
            .write_u32_le(16)
            .write_u16_le(1)
            .write_u16_le(header.channels)
            .write_u32_le(header.sample_rate)
            .write_u32_le(header.sample_rate.wrapping_mul(u32::from(block_align)))
            .write_u16_le(block_align)
            .write_u16_le(header.bits_per_sample)
            .write(b"data")
            .write_u32_le(data_size)
            .write(&samples);
        Ok(Entity::new(name, output))
    }
}

#[derive(Debug, Pread, Clone, Copy)]
struct NwaHeader {
    channels: u16,
    bits_per_sample: u16,
    sample_rate: u32,
    compression_level: i32,
    _use_run_length: u32,
    _block_count: u32,
    uncompressed_size: u32,
    _compressed_size: u32,
    sample_count: u32,
    _block_size: u32,
    _rest_size: u32,
    _dummy: u32,
}

impl NwaHeader {
    fn is_sane(&self) -> bool {
        (self.channels == 1 || self.channels == 2)
            && (self.bits_per_sample == 8 || self.bits_per_sample == 16)
    }
}

fn wav_name(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.wav", stem),
        _ => format!("{}.wav", name),
    }
}
