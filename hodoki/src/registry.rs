use crate::{
    decoder::Decoder,
    entity::{Entity, EntitySaver},
    error::HodokiError,
    resource::nwa::NwaScheme,
    scheme::{mrg::MrgScheme, xfl::XflScheme},
};
use enum_iterator::IntoEnumIterator;
use itertools::Itertools;
use once_cell::sync::Lazy;

/// Every built-in format, populated on first use and never modified after.
pub static REGISTRY: Lazy<Registry> = Lazy::new(Registry::with_builtin_formats);

#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoEnumIterator)]
pub enum Format {
    Fc01Mrg,
    LiarSoftXfl,
    KeyNwa,
}

impl Format {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Fc01Mrg => "fc01/mrg",
            Self::LiarSoftXfl => "liar_soft/xfl",
            Self::KeyNwa => "key/nwa",
        }
    }

    pub fn decoder(&self) -> Decoder {
        match self {
            // Some fc01 titles keep packs inside packs
            Self::Fc01Mrg => Decoder::archive(
                MrgScheme::new().with_nested(Decoder::archive(MrgScheme::new())),
            ),
            Self::LiarSoftXfl => Decoder::archive(XflScheme::Universal),
            Self::KeyNwa => Decoder::resource(NwaScheme::Universal),
        }
    }
}

/// Decoders keyed by format tag, probed in registration order.
#[derive(Debug, Default)]
pub struct Registry {
    decoders: Vec<(String, Decoder)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_builtin_formats() -> Self {
        Self {
            decoders: Format::into_enum_iter()
                .map(|format| (format.tag().to_string(), format.decoder()))
                .collect(),
        }
    }

    pub fn register(
        &mut self,
        tag: impl Into<String>,
        decoder: Decoder,
    ) -> Result<&mut Self, HodokiError> {
        let tag = tag.into();
        if self.decoders.iter().any(|(known, _)| *known == tag) {
            return Err(HodokiError::DuplicateFormat(tag));
        }
        self.decoders.push((tag, decoder));
        Ok(self)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.decoders.iter().map(|(tag, _)| tag.as_str())
    }

    pub fn get(&self, tag: &str) -> Result<&Decoder, HodokiError> {
        self.decoders
            .iter()
            .find(|(known, _)| known == tag)
            .map(|(_, decoder)| decoder)
            .ok_or_else(|| HodokiError::UnknownFormat(tag.to_string()))
    }

    /// Returns the only decoder recognizing `entity`. More than one match
    /// means two registered formats overlap and is reported as an error.
    pub fn find(&self, entity: &mut Entity) -> Result<&Decoder, HodokiError> {
        let matches = self
            .decoders
            .iter()
            .filter(|(_, decoder)| decoder.is_recognized(entity))
            .collect::<Vec<_>>();
        match matches.as_slice() {
            [] => Err(HodokiError::FormatNotRecognized(entity.name().to_string())),
            [(tag, decoder)] => {
                log::debug!("Recognized {} as {}", entity.name(), tag);
                Ok(decoder)
            }
            _ => Err(HodokiError::AmbiguousFormat {
                name: entity.name().to_string(),
                tags: matches.iter().map(|(tag, _)| tag).join(", "),
            }),
        }
    }

    /// Decodes with the decoder registered under `tag`, or the recognized one
    /// when no tag is given.
    pub fn decode(
        &self,
        entity: &mut Entity,
        tag: Option<&str>,
        saver: &mut dyn EntitySaver,
    ) -> anyhow::Result<()> {
        let decoder = match tag {
            Some(tag) => self.get(tag)?,
            None => self.find(entity)?,
        };
        decoder.decode(entity, saver)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{entity::MemorySaver, scheme::Scheme};

    #[derive(Debug, Clone)]
    struct Never;

    impl Scheme for Never {
        fn get_name(&self) -> &str {
            "test/never"
        }
        fn is_recognized(&self, _entity: &mut Entity) -> bool {
            false
        }
        fn unpack(
            &self,
            _entity: &mut Entity,
            _saver: &mut dyn EntitySaver,
            _depth: usize,
        ) -> anyhow::Result<()> {
            unreachable!()
        }
    }

    #[derive(Debug, Clone)]
    struct Magic(&'static [u8]);

    impl Scheme for Magic {
        fn get_name(&self) -> &str {
            "test/magic"
        }
        fn is_recognized(&self, entity: &mut Entity) -> bool {
            let magic = self.0;
            entity
                .stream
                .peek(|s| s.read(magic.len()))
                .map(|m| m == magic)
                .unwrap_or(false)
        }
        fn unpack(
            &self,
            entity: &mut Entity,
            saver: &mut dyn EntitySaver,
            _depth: usize,
        ) -> anyhow::Result<()> {
            entity.stream.skip(self.0.len() as isize)?;
            let rest = entity.stream.read_to_end();
            saver.save(Entity::new("payload", rest))
        }
    }

    fn registry(decoders: Vec<(&str, Decoder)>) -> Registry {
        let mut registry = Registry::new();
        for (tag, decoder) in decoders {
            registry.register(tag, decoder).unwrap();
        }
        registry
    }

    #[test]
    fn recognition_ignores_registration_order() {
        let forward = registry(vec![
            ("d1", Decoder::archive(Never)),
            ("d2", Decoder::archive(Magic(b"D2\0\0"))),
        ]);
        let backward = registry(vec![
            ("d2", Decoder::archive(Magic(b"D2\0\0"))),
            ("d1", Decoder::archive(Never)),
        ]);
        for registry in [forward, backward].iter() {
            let mut entity = Entity::new("x", &b"D2\0\0data"[..]);
            let decoder = registry.find(&mut entity).unwrap();
            assert_eq!(decoder.get_name(), "test/magic");
            assert_eq!(entity.stream.tell(), 0);
        }
    }

    #[test]
    fn no_match() {
        let registry = registry(vec![
            ("d1", Decoder::archive(Never)),
            ("d2", Decoder::archive(Magic(b"D2\0\0"))),
        ]);
        let mut entity = Entity::new("x.bin", &b"D3"[..]);
        assert!(matches!(
            registry.find(&mut entity),
            Err(HodokiError::FormatNotRecognized(name)) if name == "x.bin"
        ));
        assert!(matches!(
            Registry::new().find(&mut entity),
            Err(HodokiError::FormatNotRecognized(_))
        ));
    }

    #[test]
    fn overlapping_formats_are_reported() {
        let registry = registry(vec![
            ("short", Decoder::archive(Magic(b"D2"))),
            ("long", Decoder::archive(Magic(b"D2\0\0"))),
        ]);
        let mut entity = Entity::new("x", &b"D2\0\0"[..]);
        match registry.find(&mut entity) {
            Err(HodokiError::AmbiguousFormat { tags, .. }) => {
                assert_eq!(tags, "short, long")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn duplicate_and_unknown_tags() {
        let mut registry = Registry::new();
        registry.register("d1", Decoder::archive(Never)).unwrap();
        assert!(matches!(
            registry.register("d1", Decoder::archive(Never)),
            Err(HodokiError::DuplicateFormat(_))
        ));
        assert!(registry.get("d1").is_ok());
        assert!(matches!(
            registry.get("d9"),
            Err(HodokiError::UnknownFormat(_))
        ));
    }

    #[test]
    fn explicit_tag_skips_recognition() {
        let registry = registry(vec![
            ("d1", Decoder::archive(Never)),
            ("d2", Decoder::archive(Magic(b"D2\0\0"))),
        ]);
        let mut entity = Entity::new("x", &b"??\0\0abc"[..]);
        let mut saver = MemorySaver::new();
        assert!(registry.decode(&mut entity, None, &mut saver).is_err());
        registry
            .decode(&mut entity, Some("d2"), &mut saver)
            .unwrap();
        assert_eq!(saver.entities[0].stream.as_bytes(), b"abc");
    }

    #[test]
    fn builtin_formats() {
        assert_eq!(
            REGISTRY.tags().collect::<Vec<_>>(),
            vec!["fc01/mrg", "liar_soft/xfl", "key/nwa"]
        );
        let mut entity = Entity::new("x", &b"MRG\0"[..]);
        assert_eq!(REGISTRY.find(&mut entity).unwrap().get_name(), "fc01/mrg");
        let mut entity = Entity::new("x", &b"LB\x01\0"[..]);
        assert_eq!(
            REGISTRY.find(&mut entity).unwrap().get_name(),
            "liar_soft/xfl"
        );
    }
}
