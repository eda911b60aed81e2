use super::Scheme;
use crate::{
    codec::{decryptor, lzss},
    decoder::{self, Decoder},
    entity::{Entity, EntitySaver},
    error::HodokiError,
    stream::MemoryStream,
};
use encoding_rs::SHIFT_JIS;
use scroll::{Pread, LE};
use std::convert::TryFrom;

const MAGIC: &[u8] = b"MRG\x00";
const HEADER_SIZE: usize = 16;
/// Header bytes counted by `table_end` besides the magic.
const HEADER_OVERHEAD: u32 = 12;
const ENTRY_SIZE: usize = 0x20;
const NAME_SIZE: usize = 0x0E;
/// Seed of the per-file transform. Unrelated to the table key.
const FILE_SEED: u8 = 0;

/// fc01 MRG archives.
#[derive(Debug, Clone, Default)]
pub struct MrgScheme {
    nested: Vec<Decoder>,
}

impl MrgScheme {
    pub fn new() -> Self {
        Self::default()
    }

    /// Members recognized by `decoder` are decoded instead of being saved.
    pub fn with_nested(mut self, decoder: Decoder) -> Self {
        self.nested.push(decoder);
        self
    }
}

impl Scheme for MrgScheme {
    fn get_name(&self) -> &str {
        "fc01/mrg"
    }

    fn is_recognized(&self, entity: &mut Entity) -> bool {
        entity
            .stream
            .peek(|s| Ok::<_, HodokiError>(s.seek(0)?.read(MAGIC.len())? == MAGIC))
            .unwrap_or(false)
    }

    fn unpack(
        &self,
        entity: &mut Entity,
        saver: &mut dyn EntitySaver,
        depth: usize,
    ) -> anyhow::Result<()> {
        let table = read_table(&mut entity.stream)?;
        for entry in &table {
            log::debug!("Extracting: {:?}", entry);
            let member = read_file(&mut entity.stream, entry)?;
            decoder::save_or_descend(&self.nested, member, saver, depth)?;
        }
        Ok(())
    }
}

#[derive(Debug, Pread, Clone, Copy)]
struct MrgHeader {
    magic: [u8; 4],
    _unk: u32,
    table_end: u32,
    file_count: u32,
}

#[derive(Debug)]
struct MrgEntry {
    name: String,
    offset: u32,
    size_orig: u32,
    size_comp: u32,
    filter: u8,
}

fn read_table(stream: &mut MemoryStream) -> anyhow::Result<Vec<MrgEntry>> {
    stream.seek(0)?;
    let header = stream.read(HEADER_SIZE)?.pread_with::<MrgHeader>(0, LE)?;
    log::debug!("Header: {:#?}", header);
    if header.magic[..] != *MAGIC {
        return Err(HodokiError::CorruptData(String::from("Not a MRG archive")).into());
    }

    let table_size = header
        .table_end
        .checked_sub(HEADER_OVERHEAD + MAGIC.len() as u32)
        .ok_or_else(|| {
            HodokiError::CorruptData(format!("Table end {:#X} inside header", header.table_end))
        })? as usize;
    let file_count = header.file_count as usize;
    // One record more than there are files: its offset closes the last file
    let records_size = file_count
        .checked_add(1)
        .and_then(|records| records.checked_mul(ENTRY_SIZE))
        .filter(|&size| size <= table_size)
        .ok_or_else(|| {
            HodokiError::CorruptData(format!(
                "{} files do not fit a {:#X} byte table",
                file_count, table_size
            ))
        })?;
    log::debug!("Table: {:#X} bytes, {:#X} used", table_size, records_size);

    let mut table_data = stream.read(table_size)?.to_vec();
    let key = recover_key(&table_data, stream.size())?;
    log::debug!("Table key: {:#04X}", key);
    descramble(&mut table_data, key);

    let mut table_io = MemoryStream::from(table_data);
    let mut table = Vec::with_capacity(file_count);
    for _ in 0..file_count {
        let name = SHIFT_JIS
            .decode(&table_io.read_to_zero(NAME_SIZE)?)
            .0
            .into_owned();
        let size_orig = table_io.read_u32_le()?;
        let filter = table_io.read_u8()?;
        table_io.skip(9)?;
        let offset = table_io.read_u32_le()?;
        table.push(MrgEntry {
            name,
            offset,
            size_orig,
            size_comp: 0,
            filter,
        });
    }

    table_io.seek(ENTRY_SIZE)?;
    for entry in table.iter_mut() {
        table_io.skip(0x1C)?;
        let end = table_io.read_u32_le()?;
        entry.size_comp = end.checked_sub(entry.offset).ok_or_else(|| {
            HodokiError::CorruptData(format!(
                "{} ends at {:#X} before its start {:#X}",
                entry.name, end, entry.offset
            ))
        })?;
    }
    Ok(table)
}

/// Recovers the key the table was scrambled with.
///
/// The last four table bytes hold the end offset of the last file, which is
/// the size of the whole archive. Its top byte gives away the key used on the
/// last table byte and every other key follows from the schedule.
pub fn recover_key(table: &[u8], archive_size: usize) -> Result<u8, HodokiError> {
    let size = u32::try_from(archive_size).map_err(|_| HodokiError::KeyRecoveryFailed {
        expected: archive_size as u64,
        actual: 0,
    })?;
    if table.len() < 4 {
        return Err(HodokiError::KeyRecoveryFailed {
            expected: u64::from(size),
            actual: 0,
        });
    }

    let last = table.len() - 1;
    let tmp = table[last].rotate_left(1);
    let mut key = tmp ^ (size >> 24) as u8;
    let mut pos = 1;
    let mut last_offset = u32::from(tmp ^ key);
    for &b in table[last - 3..last].iter().rev() {
        pos += 1;
        key = key.wrapping_sub(pos as u8);
        last_offset = (last_offset << 8) | u32::from(b.rotate_left(1) ^ key);
    }
    if last_offset != size {
        return Err(HodokiError::KeyRecoveryFailed {
            expected: u64::from(size),
            actual: u64::from(last_offset),
        });
    }
    for step in pos + 1..=table.len() {
        key = key.wrapping_sub(step as u8);
    }
    Ok(key)
}

pub fn descramble(table: &mut [u8], mut key: u8) {
    let len = table.len();
    for (i, b) in table.iter_mut().enumerate() {
        *b = b.rotate_left(1) ^ key;
        key = key.wrapping_add((len - i) as u8);
    }
}

fn read_file(stream: &mut MemoryStream, entry: &MrgEntry) -> anyhow::Result<Entity> {
    stream.seek(entry.offset as usize)?;
    let mut data = stream.read(entry.size_comp as usize)?;
    match entry.filter {
        0 => {
            if entry.size_orig != entry.size_comp {
                log::warn!(
                    "{}: stored {} bytes, table says {}",
                    entry.name,
                    entry.size_comp,
                    entry.size_orig
                );
            }
        }
        1..=3 => {
            if entry.filter >= 2 {
                data = decryptor::decrypt(FILE_SEED, &data);
            }
            if entry.filter < 3 {
                data = lzss::decompress(&data, entry.size_orig as usize)?;
            }
        }
        filter => {
            return Err(HodokiError::CorruptData(format!(
                "{}: unknown filter {}",
                entry.name, filter
            ))
            .into())
        }
    }
    Ok(Entity::new(entry.name.clone(), data))
}
