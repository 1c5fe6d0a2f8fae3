//! Core data types shared by the index, planner, and executor.

use crate::error::{Error, Result};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Package name → version string, in declaration order.
pub type DependencyMap = IndexMap<String, String>;

/// One of the three independent dependency-declaration mappings of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DependencySlot {
    /// Runtime dependencies (`dependencies`).
    Dependencies,
    /// Development dependencies (`devDependencies`).
    DevDependencies,
    /// Peer dependencies (`peerDependencies`).
    PeerDependencies,
}

impl DependencySlot {
    /// All slots in lookup order. First-match-wins searches walk this order.
    pub const ALL: [Self; 3] = [
        Self::Dependencies,
        Self::DevDependencies,
        Self::PeerDependencies,
    ];

    /// The manifest key of this slot.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dependencies => "dependencies",
            Self::DevDependencies => "devDependencies",
            Self::PeerDependencies => "peerDependencies",
        }
    }
}

impl fmt::Display for DependencySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencySlot {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "dependencies" | "deps" | "prod" => Ok(Self::Dependencies),
            "devDependencies" | "dev-dependencies" | "dev" => Ok(Self::DevDependencies),
            "peerDependencies" | "peer-dependencies" | "peer" => Ok(Self::PeerDependencies),
            other => Err(Error::validation(format!(
                "unknown dependency slot '{other}' (expected dependencies, devDependencies or peerDependencies)"
            ))),
        }
    }
}

/// Role of a workspace inside the monorepo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceKind {
    /// The monorepo's own top-level manifest.
    Root,
    /// A member under the apps directory.
    App,
    /// A member under the packages directory.
    Library,
}

impl fmt::Display for WorkspaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Root => write!(f, "root"),
            Self::App => write!(f, "app"),
            Self::Library => write!(f, "library"),
        }
    }
}

/// A parsed `package.json`.
///
/// Only the fields the engine reads are typed. Everything else lands in
/// [`Manifest::extra`] and is written back untouched, including typed keys
/// whose value is `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "JsonObject")]
pub struct Manifest {
    /// Declared package name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Runtime dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<DependencyMap>,

    /// Development dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dev_dependencies: Option<DependencyMap>,

    /// Peer dependencies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peer_dependencies: Option<DependencyMap>,

    /// Unrecognized fields, round-tripped unchanged.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Moves `key` out of `raw` into a typed value. A `null` value stays in
/// `raw` so the key survives a rewrite.
fn take_typed<T: DeserializeOwned>(
    raw: &mut JsonObject,
    key: &str,
) -> serde_json::Result<Option<T>> {
    match raw.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(_) => raw
            .shift_remove(key)
            .map(serde_json::from_value)
            .transpose(),
    }
}

impl TryFrom<JsonObject> for Manifest {
    type Error = serde_json::Error;

    fn try_from(mut raw: JsonObject) -> serde_json::Result<Self> {
        Ok(Self {
            name: take_typed(&mut raw, "name")?,
            dependencies: take_typed(&mut raw, DependencySlot::Dependencies.as_str())?,
            dev_dependencies: take_typed(&mut raw, DependencySlot::DevDependencies.as_str())?,
            peer_dependencies: take_typed(&mut raw, DependencySlot::PeerDependencies.as_str())?,
            extra: raw,
        })
    }
}

impl Manifest {
    /// Parses a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] when the text is not a valid manifest.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Serializes with two-space indentation and a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Json`] if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String> {
        let mut out = serde_json::to_string_pretty(self)?;
        out.push('\n');
        Ok(out)
    }

    /// Returns the mapping for `slot`, if the manifest declares it.
    #[must_use]
    pub const fn slot(&self, slot: DependencySlot) -> Option<&DependencyMap> {
        match slot {
            DependencySlot::Dependencies => self.dependencies.as_ref(),
            DependencySlot::DevDependencies => self.dev_dependencies.as_ref(),
            DependencySlot::PeerDependencies => self.peer_dependencies.as_ref(),
        }
    }

    fn slot_entry(&mut self, slot: DependencySlot) -> &mut Option<DependencyMap> {
        match slot {
            DependencySlot::Dependencies => &mut self.dependencies,
            DependencySlot::DevDependencies => &mut self.dev_dependencies,
            DependencySlot::PeerDependencies => &mut self.peer_dependencies,
        }
    }

    /// Version declared for `package` in `slot`.
    #[must_use]
    pub fn get(&self, slot: DependencySlot, package: &str) -> Option<&str> {
        self.slot(slot)
            .and_then(|deps| deps.get(package))
            .map(String::as_str)
    }

    /// Sets `package` to `version` in `slot`, creating the slot if needed.
    /// Returns the previous value.
    pub fn set(
        &mut self,
        slot: DependencySlot,
        package: impl Into<String>,
        version: impl Into<String>,
    ) -> Option<String> {
        if self.slot(slot).is_none() {
            // A `null` slot kept in `extra` is replaced by the real mapping.
            self.extra.shift_remove(slot.as_str());
        }
        self.slot_entry(slot)
            .get_or_insert_with(DependencyMap::new)
            .insert(package.into(), version.into())
    }

    /// Removes `package` from `slot`, keeping the order of the remaining
    /// entries. An emptied slot stays in the manifest as `{}`.
    pub fn remove(&mut self, slot: DependencySlot, package: &str) -> Option<String> {
        self.slot_entry(slot)
            .as_mut()
            .and_then(|deps| deps.shift_remove(package))
    }

    /// Every slot declaring `package`, in [`DependencySlot::ALL`] order.
    #[must_use]
    pub fn slots_declaring(&self, package: &str) -> Vec<(DependencySlot, &str)> {
        DependencySlot::ALL
            .into_iter()
            .filter_map(|slot| self.get(slot, package).map(|v| (slot, v)))
            .collect()
    }

    /// The first slot declaring `package` (dependencies, then dev, then peer).
    #[must_use]
    pub fn first_slot_declaring(&self, package: &str) -> Option<DependencySlot> {
        DependencySlot::ALL
            .into_iter()
            .find(|slot| self.get(*slot, package).is_some())
    }

    /// Merged read-only view of all three slots.
    ///
    /// On a name collision the later slot's version wins while the key keeps
    /// the position of its first appearance. Only for reporting; never write
    /// through this view.
    #[must_use]
    pub fn effective_declarations(&self) -> IndexMap<&str, &str> {
        let mut merged = IndexMap::new();
        for slot in DependencySlot::ALL {
            if let Some(deps) = self.slot(slot) {
                for (name, version) in deps {
                    merged.insert(name.as_str(), version.as_str());
                }
            }
        }
        merged
    }

    /// Effective version of `package` across the merged view.
    #[must_use]
    pub fn effective_version(&self, package: &str) -> Option<&str> {
        DependencySlot::ALL
            .into_iter()
            .rev()
            .find_map(|slot| self.get(slot, package))
    }

    /// Whether the manifest carries a `workspaces` field.
    #[must_use]
    pub fn declares_workspaces(&self) -> bool {
        self.extra.contains_key("workspaces")
    }
}

/// One discovered monorepo member (or the root itself).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workspace {
    /// Directory holding the manifest. Identity key.
    pub path: PathBuf,
    /// Declared name, or a fallback derived from the directory.
    pub name: String,
    /// Role in the monorepo.
    pub kind: WorkspaceKind,
    /// Path relative to the monorepo root (`.` for the root).
    pub relative_path: PathBuf,
    /// Parsed declarations.
    #[serde(skip)]
    pub manifest: Manifest,
}

impl Workspace {
    /// Creates a workspace, falling back to `fallback_name` when the manifest
    /// has no usable `name`.
    #[must_use]
    pub fn new(
        path: impl Into<PathBuf>,
        relative_path: impl Into<PathBuf>,
        kind: WorkspaceKind,
        fallback_name: &str,
        manifest: Manifest,
    ) -> Self {
        let name = manifest
            .name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(fallback_name)
            .to_string();

        Self {
            path: path.into(),
            name,
            kind,
            relative_path: relative_path.into(),
            manifest,
        }
    }

    /// Whether any slot declares `package`.
    #[must_use]
    pub fn has_package(&self, package: &str) -> bool {
        self.manifest.effective_version(package).is_some()
    }

    /// Effective version of `package` in this workspace.
    #[must_use]
    pub fn version_of(&self, package: &str) -> Option<&str> {
        self.manifest.effective_version(package)
    }

    /// Whether this workspace lives at `path`.
    #[must_use]
    pub fn is_at(&self, path: &Path) -> bool {
        self.path == path
    }
}

/// The kind of edit a [`ChangeRecord`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeAction {
    /// The package was not declared in the slot.
    Add,
    /// The package's version in the slot changes.
    Update,
    /// The package is dropped from the slot.
    Remove,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Add => write!(f, "add"),
            Self::Update => write!(f, "update"),
            Self::Remove => write!(f, "remove"),
        }
    }
}

/// One planned edit to one slot of one workspace manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeRecord {
    /// Workspace directory (identity).
    pub workspace: PathBuf,
    /// Workspace display name.
    pub workspace_name: String,
    /// Package being edited.
    pub package: String,
    /// Slot being edited.
    pub slot: DependencySlot,
    /// Value before the edit; `None` when the package was not declared.
    pub before: Option<String>,
    /// Value after the edit; `None` for removals.
    pub after: Option<String>,
    /// Edit kind.
    pub action: ChangeAction,
}

impl ChangeRecord {
    /// Applies this record to an in-memory manifest.
    pub fn apply_to(&self, manifest: &mut Manifest) {
        match (&self.action, &self.after) {
            (ChangeAction::Remove, _) | (_, None) => {
                manifest.remove(self.slot, &self.package);
            }
            (ChangeAction::Add | ChangeAction::Update, Some(after)) => {
                manifest.set(self.slot, self.package.clone(), after.clone());
            }
        }
    }
}

impl fmt::Display for ChangeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let before = self.before.as_deref().unwrap_or("(none)");
        let after = self.after.as_deref().unwrap_or("(removed)");
        write!(
            f,
            "{} [{}] {} {}: {} -> {}",
            self.workspace_name, self.slot, self.action, self.package, before, after
        )
    }
}

/// Package managers the installer knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageManager {
    /// Bun (`bun.lockb` or `bun.lock`).
    Bun,
    /// Yarn (`yarn.lock`).
    Yarn,
    /// pnpm (`pnpm-lock.yaml`).
    Pnpm,
    /// npm, the fallback.
    Npm,
}

impl PackageManager {
    /// Lockfiles that identify this manager. npm has none: it is the
    /// fallback when no other lockfile is present.
    #[must_use]
    pub const fn lockfile_names(self) -> &'static [&'static str] {
        match self {
            Self::Bun => &["bun.lockb", "bun.lock"],
            Self::Yarn => &["yarn.lock"],
            Self::Pnpm => &["pnpm-lock.yaml"],
            Self::Npm => &[],
        }
    }

    /// Executable name.
    #[must_use]
    pub const fn program(self) -> &'static str {
        match self {
            Self::Bun => "bun",
            Self::Yarn => "yarn",
            Self::Pnpm => "pnpm",
            Self::Npm => "npm",
        }
    }

    /// Full install invocation as program followed by arguments.
    #[must_use]
    pub const fn install_command(self) -> [&'static str; 2] {
        [self.program(), "install"]
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}
