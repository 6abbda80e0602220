pub mod client;

pub use client::{IpfsStorage, StorageStrategy};
