use super::Scheme;
use crate::{
    entity::{Entity, EntitySaver},
    error::HodokiError,
};
use encoding_rs::SHIFT_JIS;
use scroll::{ctx, Pread, LE};

const MAGIC: &[u8] = b"LB\x01\x00";
const HEADER_SIZE: usize = 12;
const FILE_ENTRY_SIZE: usize = 0x28;
const NAME_SIZE: usize = 0x20;

/// Liar-soft XFL archives.
#[derive(Debug, Clone)]
pub enum XflScheme {
    Universal,
}

impl Scheme for XflScheme {
    fn get_name(&self) -> &str {
        "liar_soft/xfl"
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
        _depth: usize,
    ) -> anyhow::Result<()> {
        let stream = &mut entity.stream;
        stream.seek(0)?;
        let header = stream.read(HEADER_SIZE)?.pread_with::<XflHeader>(0, LE)?;
        log::debug!("Header: {:#?}", header);

        let file_count = header.file_count as usize;
        if file_count
            .checked_mul(FILE_ENTRY_SIZE)
            .map_or(true, |size| size > header.table_size as usize)
        {
            return Err(HodokiError::CorruptData(format!(
                "{} files do not fit a {:#X} byte table",
                file_count, header.table_size
            ))
            .into());
        }
        let buf = stream.read(header.table_size as usize)?;
        let off = &mut 0;
        let mut file_entries = Vec::with_capacity(file_count);
        for _ in 0..file_count {
            file_entries.push(buf.gread::<XflFileEntry>(off)?);
        }
        log::debug!("Entries: {:#?}", file_entries);

        let data_offset = HEADER_SIZE + header.table_size as usize;
        for entry in file_entries {
            stream.seek(data_offset + entry.file_offset as usize)?;
            let contents = stream.read(entry.file_size as usize)?;
            saver.save(Entity::new(entry.file_name, contents))?;
        }
        Ok(())
    }
}

#[derive(Debug, Pread, Copy, Clone)]
struct XflHeader {
    _magic: [u8; 4],
    table_size: u32,
    file_count: u32,
}

#[derive(Debug)]
struct XflFileEntry {
    file_name: String,
    file_offset: u32,
    file_size: u32,
}

impl<'a> ctx::TryFromCtx<'a, ()> for XflFileEntry {
    type Error = anyhow::Error;

    fn try_from_ctx(
        buf: &'a [u8],
        _: (),
    ) -> Result<(Self, usize), Self::Error> {
        let off = &mut 0;
        let name = buf.gread_with::<&[u8]>(off, NAME_SIZE)?;
        let file_name = SHIFT_JIS
            .decode(name.split(|&b| b == 0).next().unwrap_or(name))
            .0
            .to_string();
        let file_offset = buf.gread_with::<u32>(off, LE)?;
        let file_size = buf.gread_with::<u32>(off, LE)?;
        Ok((
            Self {
                file_name,
                file_offset,
                file_size,
            },
            *off,
        ))
    }
}
