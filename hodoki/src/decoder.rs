use crate::{
    entity::{Entity, EntitySaver},
    error::HodokiError,
    resource::ResourceScheme,
    scheme::Scheme,
};

/// Archives nested deeper than this are rejected.
pub const MAX_NESTING_DEPTH: usize = 8;

#[derive(Debug, Clone)]
pub enum Decoder {
    Archive(Box<dyn Scheme>),
    Resource(Box<dyn ResourceScheme>),
}

impl Decoder {
    pub fn archive(scheme: impl Scheme + 'static) -> Self {
        Self::Archive(Box::new(scheme))
    }

    pub fn resource(scheme: impl ResourceScheme + 'static) -> Self {
        Self::Resource(Box::new(scheme))
    }

    pub fn get_name(&self) -> &str {
        match self {
            Self::Archive(scheme) => scheme.get_name(),
            Self::Resource(scheme) => scheme.get_name(),
        }
    }

    pub fn is_recognized(&self, entity: &mut Entity) -> bool {
        match self {
            Self::Archive(scheme) => scheme.is_recognized(entity),
            Self::Resource(scheme) => scheme.is_recognized(entity),
        }
    }

    /// Unpacks an archive into `saver`, or saves the single converted entity.
    pub fn decode(
        &self,
        entity: &mut Entity,
        saver: &mut dyn EntitySaver,
    ) -> anyhow::Result<()> {
        self.decode_at(entity, saver, 0)
    }

    pub fn decode_at(
        &self,
        entity: &mut Entity,
        saver: &mut dyn EntitySaver,
        depth: usize,
    ) -> anyhow::Result<()> {
        if depth > MAX_NESTING_DEPTH {
            return Err(HodokiError::NestingTooDeep(MAX_NESTING_DEPTH).into());
        }
        match self {
            Self::Archive(scheme) => scheme.unpack(entity, saver, depth),
            Self::Resource(scheme) => saver.save(scheme.convert(entity)?),
        }
    }
}

/// Routes a member through the first nested decoder recognizing it, or hands
/// it to `saver` untouched.
pub fn save_or_descend(
    nested: &[Decoder],
    mut entity: Entity,
    saver: &mut dyn EntitySaver,
    depth: usize,
) -> anyhow::Result<()> {
    match nested
        .iter()
        .find(|decoder| decoder.is_recognized(&mut entity))
    {
        Some(decoder) => {
            log::debug!(
                "Decoding nested {} with {}",
                entity.name(),
                decoder.get_name()
            );
            entity.stream.seek(0)?;
            decoder.decode_at(&mut entity, saver, depth + 1)
        }
        None => saver.save(entity),
    }
}
