use crate::entity::{Entity, EntitySaver};
use dyn_clone::DynClone;
use std::fmt::Debug;

pub mod mrg;
pub mod xfl;

/// Archive decoder: recognizes a container and unpacks its members.
pub trait Scheme: Debug + Send + Sync + DynClone {
    fn get_name(&self) -> &str;
    /// Cheap structural probe. Must leave the stream position untouched.
    fn is_recognized(&self, entity: &mut Entity) -> bool;
    /// Passes every member to `saver` in table order. `depth` counts the
    /// archives this one is nested in.
    fn unpack(
        &self,
        entity: &mut Entity,
        saver: &mut dyn EntitySaver,
        depth: usize,
    ) -> anyhow::Result<()>;
}

dyn_clone::clone_trait_object!(Scheme);
