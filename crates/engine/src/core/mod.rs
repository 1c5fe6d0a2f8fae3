//! Core types and collaborator traits.

pub mod traits;
pub mod types;

pub use traits::{ManifestStore, RegistryLookup};
pub use types::{
    ChangeAction, ChangeRecord, DependencyMap, DependencySlot, Manifest, PackageManager,
    Workspace, WorkspaceKind,
};
