//! Reconstructed process-tree state: descriptors, processes, the world.

pub mod descriptor;
pub mod process;
pub mod world;

pub use descriptor::{size_text, Descriptor, DescriptorClass, DescriptorKind, SocketInfo};
pub use process::Process;
pub use world::{DisplaySlot, SlotRegistry, WorldState};
