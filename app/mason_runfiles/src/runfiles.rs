/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use std::sync::Arc;

use allocative::Allocative;
use dupe::Dupe;
use mason_artifact::artifact::Artifact;
use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
use mason_core::fs::paths::forward_rel_path::ForwardRelativePathBuf;
use once_cell::sync::Lazy;
use starlark_map::small_map::SmallMap;
use starlark_map::small_set::SmallSet;

/// Root-relative paths starting with this component belong to an external
/// repository and are subject to the external-runfiles layout convention.
const EXTERNAL_PREFIX: &str = "external";

/// The runfiles of a single target: a deduplicated, insertion-ordered
/// mapping from runtime-relative path to backing artifact, plus the
/// runtime paths that must exist as empty files to create directory
/// structure.
///
/// Built once at analysis time via [`RunfilesBuilder`], immutable
/// thereafter, shared by reference across all consumers of the target.
#[derive(Clone, Debug, PartialEq, Eq, Allocative)]
pub struct Runfiles {
    workspace_name: ForwardRelativePathBuf,
    entries: SmallMap<ForwardRelativePathBuf, Artifact>,
    empty_files: SmallSet<ForwardRelativePathBuf>,
}

static EMPTY: Lazy<Arc<Runfiles>> = Lazy::new(|| {
    Arc::new(Runfiles {
        workspace_name: ForwardRelativePathBuf::new(),
        entries: SmallMap::new(),
        empty_files: SmallSet::new(),
    })
});

impl Runfiles {
    /// The canonical zero-entry runfiles value, shared process-wide.
    pub fn empty() -> Arc<Runfiles> {
        EMPTY.dupe()
    }

    pub fn builder(
        workspace_name: &ForwardRelativePath,
        legacy_external_runfiles: bool,
    ) -> RunfilesBuilder {
        RunfilesBuilder {
            workspace_name: workspace_name.to_buf(),
            legacy_external_runfiles,
            entries: SmallMap::new(),
            empty_files: SmallSet::new(),
        }
    }

    pub fn workspace_name(&self) -> &ForwardRelativePath {
        &self.workspace_name
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.empty_files.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `(runtime path, artifact)` pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&ForwardRelativePath, &Artifact)> {
        self.entries.iter().map(|(k, v)| (k.as_path(), v))
    }

    /// The backing artifacts in insertion order. An artifact mapped at
    /// several runtime paths appears once per mapping.
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.entries.values()
    }

    pub fn artifact_at(&self, runtime_path: &ForwardRelativePath) -> Option<&Artifact> {
        self.entries.get(runtime_path)
    }

    /// Runtime paths to be created as empty files, in insertion order.
    pub fn empty_files(&self) -> impl Iterator<Item = &ForwardRelativePath> {
        self.empty_files.iter().map(|p| p.as_path())
    }
}

/// Accumulates runfiles mappings and freezes them into a [`Runfiles`].
///
/// Duplicate runtime paths are resolved last-wins: a later addition
/// replaces the mapped artifact while keeping the original insertion
/// position, so the result is deterministic in insertion order. Exact
/// duplicates (same path and artifact) collapse silently.
pub struct RunfilesBuilder {
    workspace_name: ForwardRelativePathBuf,
    legacy_external_runfiles: bool,
    entries: SmallMap<ForwardRelativePathBuf, Artifact>,
    empty_files: SmallSet<ForwardRelativePathBuf>,
}

impl RunfilesBuilder {
    /// Adds an artifact at the runtime path implied by the active layout
    /// convention.
    pub fn add_artifact(mut self, artifact: Artifact) -> Self {
        let runtime_path = self.runtime_path_for(&artifact);
        self.insert(runtime_path, artifact);
        self
    }

    pub fn add_artifacts(mut self, artifacts: impl IntoIterator<Item = Artifact>) -> Self {
        for artifact in artifacts {
            self = self.add_artifact(artifact);
        }
        self
    }

    /// Adds an artifact at an explicit runtime path, bypassing the layout
    /// convention. This is how root symlinks are expressed.
    pub fn add_artifact_at(
        mut self,
        runtime_path: ForwardRelativePathBuf,
        artifact: Artifact,
    ) -> Self {
        self.insert(runtime_path, artifact);
        self
    }

    /// Records a workspace-relative path to be staged as an empty file.
    pub fn add_empty_file(mut self, path: &ForwardRelativePath) -> Self {
        self.empty_files.insert(self.workspace_name.join(path));
        self
    }

    pub fn build(self) -> Runfiles {
        Runfiles {
            workspace_name: self.workspace_name,
            entries: self.entries,
            empty_files: self.empty_files,
        }
    }

    /// Runtime path for an artifact. External repository files
    /// (`external/<repo>/...`) stay under the workspace directory in the
    /// legacy layout and are staged at `<repo>/...` beside it otherwise;
    /// everything else lands at `<workspace>/<root-relative-path>`.
    fn runtime_path_for(&self, artifact: &Artifact) -> ForwardRelativePathBuf {
        let rel = artifact.root_relative_path();
        match rel.strip_prefix(ForwardRelativePath::unchecked_new(EXTERNAL_PREFIX)) {
            Ok(external) if !self.legacy_external_runfiles => external.to_buf(),
            _ => self.workspace_name.join(rel),
        }
    }

    fn insert(&mut self, runtime_path: ForwardRelativePathBuf, artifact: Artifact) {
        match self.entries.get(&runtime_path) {
            Some(prev) if *prev == artifact => return,
            Some(prev) => {
                tracing::debug!(
                    "runfiles path `{}` remapped from `{}` to `{}`",
                    runtime_path,
                    prev,
                    artifact
                );
            }
            None => {}
        }
        self.entries.insert(runtime_path, artifact);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dupe::Dupe;
    use mason_artifact::artifact::testing::ArtifactTestingExt;
    use mason_artifact::artifact::Artifact;
    use mason_artifact::root::ArtifactRoot;
    use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    use mason_core::fs::paths::forward_rel_path::ForwardRelativePathBuf;

    use crate::runfiles::Runfiles;

    fn derived_root() -> ArtifactRoot {
        ArtifactRoot::derived(ForwardRelativePathBuf::try_from("out/gen".to_owned()).unwrap())
    }

    fn workspace() -> &'static ForwardRelativePath {
        ForwardRelativePath::unchecked_new("wksp")
    }

    #[test]
    fn empty_is_shared_and_empty() {
        let e1 = Runfiles::empty();
        let e2 = Runfiles::empty();

        assert!(e1.is_empty());
        assert_eq!(0, e1.len());
        assert!(Arc::ptr_eq(&e1, &e2));
    }

    #[test]
    fn artifacts_land_under_workspace() -> anyhow::Result<()> {
        let thing = Artifact::testing_new(&derived_root(), "pkg/thing");

        let runfiles = Runfiles::builder(workspace(), false)
            .add_artifact(thing.dupe())
            .build();

        assert_eq!(
            Some(&thing),
            runfiles.artifact_at(ForwardRelativePath::new("wksp/pkg/thing")?)
        );
        assert_eq!(1, runfiles.len());

        Ok(())
    }

    #[test]
    fn external_artifacts_staged_beside_workspace_by_default() -> anyhow::Result<()> {
        let ext = Artifact::testing_new(&derived_root(), "external/repo/lib.so");

        let runfiles = Runfiles::builder(workspace(), false)
            .add_artifact(ext.dupe())
            .build();

        assert_eq!(
            Some(&ext),
            runfiles.artifact_at(ForwardRelativePath::new("repo/lib.so")?)
        );
        assert_eq!(
            None,
            runfiles.artifact_at(ForwardRelativePath::new("wksp/external/repo/lib.so")?)
        );

        Ok(())
    }

    #[test]
    fn legacy_layout_keeps_external_artifacts_under_workspace() -> anyhow::Result<()> {
        let ext = Artifact::testing_new(&derived_root(), "external/repo/lib.so");

        let runfiles = Runfiles::builder(workspace(), true)
            .add_artifact(ext.dupe())
            .build();

        assert_eq!(
            Some(&ext),
            runfiles.artifact_at(ForwardRelativePath::new("wksp/external/repo/lib.so")?)
        );

        Ok(())
    }

    #[test]
    fn exact_duplicates_collapse() {
        let thing = Artifact::testing_new(&derived_root(), "pkg/thing");

        let runfiles = Runfiles::builder(workspace(), false)
            .add_artifact(thing.dupe())
            .add_artifact(thing.dupe())
            .build();

        assert_eq!(1, runfiles.len());
        assert_eq!(vec![&thing], runfiles.artifacts().collect::<Vec<_>>());
    }

    #[test]
    fn conflicting_runtime_paths_resolve_last_wins() -> anyhow::Result<()> {
        let first = Artifact::testing_new(&derived_root(), "pkg/first");
        let second = Artifact::testing_new(&derived_root(), "pkg/second");
        let path = || ForwardRelativePathBuf::try_from("wksp/data".to_owned()).unwrap();

        let runfiles = Runfiles::builder(workspace(), false)
            .add_artifact_at(path(), first.dupe())
            .add_artifact_at(path(), second.dupe())
            .build();

        assert_eq!(1, runfiles.len());
        assert_eq!(
            Some(&second),
            runfiles.artifact_at(ForwardRelativePath::new("wksp/data")?)
        );

        Ok(())
    }

    #[test]
    fn conflict_resolution_keeps_insertion_position() {
        let a = Artifact::testing_new(&derived_root(), "pkg/a");
        let b = Artifact::testing_new(&derived_root(), "pkg/b");
        let replacement = Artifact::testing_new(&derived_root(), "pkg/replacement");
        let a_path = || ForwardRelativePathBuf::try_from("wksp/a".to_owned()).unwrap();
        let b_path = || ForwardRelativePathBuf::try_from("wksp/b".to_owned()).unwrap();

        let runfiles = Runfiles::builder(workspace(), false)
            .add_artifact_at(a_path(), a)
            .add_artifact_at(b_path(), b.dupe())
            .add_artifact_at(a_path(), replacement.dupe())
            .build();

        assert_eq!(
            vec![&replacement, &b],
            runfiles.artifacts().collect::<Vec<_>>()
        );
    }

    #[test]
    fn empty_files_are_workspace_relative() -> anyhow::Result<()> {
        let runfiles = Runfiles::builder(workspace(), false)
            .add_empty_file(ForwardRelativePath::new("pkg/__init__.py")?)
            .add_empty_file(ForwardRelativePath::new("pkg/__init__.py")?)
            .build();

        assert!(!runfiles.is_empty());
        assert_eq!(
            vec![ForwardRelativePath::new("wksp/pkg/__init__.py")?],
            runfiles.empty_files().collect::<Vec<_>>()
        );

        Ok(())
    }
}
