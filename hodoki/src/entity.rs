use crate::stream::MemoryStream;

/// One extracted artifact: a name and its contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    name: String,
    pub stream: MemoryStream,
}

impl Entity {
    pub fn new(name: impl Into<String>, stream: impl Into<MemoryStream>) -> Self {
        Self {
            name: name.into(),
            stream: stream.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lower-cased extension of the entity name, if any.
    pub fn extension(&self) -> Option<String> {
        let file_name = self.name.rsplit(|c: char| c == '/' || c == '\\').next()?;
        let (stem, extension) = file_name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(extension.to_ascii_lowercase())
    }
}

/// Consumer of decoded entities.
pub trait EntitySaver {
    fn save(&mut self, entity: Entity) -> anyhow::Result<()>;
}

/// Keeps every saved entity in order.
#[derive(Debug, Default)]
pub struct MemorySaver {
    pub entities: Vec<Entity>,
}

impl MemorySaver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EntitySaver for MemorySaver {
    fn save(&mut self, entity: Entity) -> anyhow::Result<()> {
        log::debug!(
            "Saving {} ({} bytes)",
            entity.name(),
            entity.stream.size()
        );
        self.entities.push(entity);
        Ok(())
    }
}
