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
use starlark_map::small_set::SmallSet;

use crate::runfiles::Runfiles;

/// What the execution layer sees of a target's runfiles: the directory the
/// tree is rooted under, the artifacts that must actually be built and
/// fetched before staging, and the optional manifest artifact for
/// manifest-driven staging.
///
/// Immutable after construction and queried concurrently by action
/// execution workers, so it is an Arc'd value.
#[derive(Clone, Dupe, Debug, Allocative)]
pub struct RunfilesSupplier(Arc<RunfilesSupplierData>);

#[derive(Debug, Allocative)]
struct RunfilesSupplierData {
    runfiles_dir: ForwardRelativePathBuf,
    runfiles: Arc<Runfiles>,
    manifest: Option<Artifact>,
}

impl RunfilesSupplier {
    pub fn new(runfiles_dir: ForwardRelativePathBuf, runfiles: Arc<Runfiles>) -> Self {
        Self::with_manifest(runfiles_dir, runfiles, None)
    }

    pub fn with_manifest(
        runfiles_dir: ForwardRelativePathBuf,
        runfiles: Arc<Runfiles>,
        manifest: Option<Artifact>,
    ) -> Self {
        RunfilesSupplier(Arc::new(RunfilesSupplierData {
            runfiles_dir,
            runfiles,
            manifest,
        }))
    }

    /// The directory under which this target's runfiles tree is rooted.
    pub fn runfiles_dir(&self) -> &ForwardRelativePath {
        &self.0.runfiles_dir
    }

    pub fn runfiles(&self) -> &Runfiles {
        &self.0.runfiles
    }

    /// The backing artifacts that have real file content: every artifact
    /// of the wrapped runfiles whose root is not a middleman root, exact
    /// duplicates collapsed. Synchronization placeholders are excluded no
    /// matter where or how many times they appear, since asking the
    /// staging layer for them would fail on a file that does not exist.
    pub fn artifacts(&self) -> SmallSet<Artifact> {
        let mut artifacts = SmallSet::new();
        for artifact in self.0.runfiles.artifacts() {
            if !artifact.is_middleman() {
                artifacts.insert(artifact.dupe());
            }
        }
        artifacts
    }

    /// The manifest artifact supplied at construction, if any.
    pub fn manifests(&self) -> impl Iterator<Item = &Artifact> {
        self.0.manifest.iter()
    }
}
