use crate::entity::Entity;
use dyn_clone::DynClone;
use std::fmt::Debug;

pub mod nwa;

/// Single entity converter.
pub trait ResourceScheme: Debug + Send + Sync + DynClone {
    fn get_name(&self) -> &str;
    /// Cheap structural probe. Must leave the stream position untouched.
    fn is_recognized(&self, entity: &mut Entity) -> bool;
    fn convert(&self, entity: &mut Entity) -> anyhow::Result<Entity>;
}

dyn_clone::clone_trait_object!(ResourceScheme);
