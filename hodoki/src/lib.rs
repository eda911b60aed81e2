#![deny(
    rust_2018_idioms,
    unreachable_pub,
    unsafe_code,
    unused_imports,
    unused_mut,
    missing_debug_implementations
)]

pub mod codec;
pub mod decoder;
pub mod entity;
pub mod error;
pub mod registry;
pub mod resource;
pub mod scheme;
pub mod stream;

pub use registry::REGISTRY;
