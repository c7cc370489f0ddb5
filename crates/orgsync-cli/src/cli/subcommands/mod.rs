pub mod hierarchy;

pub use hierarchy::HierarchyCommands;
