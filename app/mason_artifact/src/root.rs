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
use derive_more::Display;
use dupe::Dupe;
use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
use mason_core::fs::paths::forward_rel_path::ForwardRelativePathBuf;

/// Classifies the directory an [`ArtifactRoot`] denotes.
///
/// `Middleman` is load-bearing: an artifact under a middleman root is a
/// synchronization-only edge in the build graph and never has file
/// content, so it must never reach the materialization layer.
#[derive(Clone, Copy, Dupe, Debug, Display, PartialEq, Eq, Hash, Allocative)]
pub enum RootKind {
    #[display("source")]
    Source,
    #[display("derived")]
    Derived,
    #[display("middleman")]
    Middleman,
}

/// A base directory artifacts are addressed relative to, identified by an
/// exec-root-relative path plus its [`RootKind`]. Cheap to clone, value
/// equality.
#[derive(Clone, Dupe, Debug, Display, PartialEq, Eq, Hash, Allocative)]
#[display("{_0}")]
pub struct ArtifactRoot(Arc<RootData>);

#[derive(Debug, Display, PartialEq, Eq, Hash, Allocative)]
#[display("{exec_path}")]
struct RootData {
    kind: RootKind,
    exec_path: ForwardRelativePathBuf,
}

impl ArtifactRoot {
    fn new(kind: RootKind, exec_path: ForwardRelativePathBuf) -> Self {
        ArtifactRoot(Arc::new(RootData { kind, exec_path }))
    }

    /// Root for checked-in source files.
    pub fn source(exec_path: ForwardRelativePathBuf) -> Self {
        Self::new(RootKind::Source, exec_path)
    }

    /// Root for files produced by actions.
    pub fn derived(exec_path: ForwardRelativePathBuf) -> Self {
        Self::new(RootKind::Derived, exec_path)
    }

    /// Root for synchronization placeholders. Artifacts under this root
    /// carry no bytes.
    pub fn middleman(exec_path: ForwardRelativePathBuf) -> Self {
        Self::new(RootKind::Middleman, exec_path)
    }

    pub fn kind(&self) -> RootKind {
        self.0.kind
    }

    #[inline]
    pub fn is_middleman(&self) -> bool {
        self.0.kind == RootKind::Middleman
    }

    pub fn exec_path(&self) -> &ForwardRelativePath {
        &self.0.exec_path
    }
}

#[cfg(test)]
mod tests {
    use mason_core::fs::paths::forward_rel_path::ForwardRelativePathBuf;

    use crate::root::ArtifactRoot;
    use crate::root::RootKind;

    fn path(s: &str) -> ForwardRelativePathBuf {
        ForwardRelativePathBuf::try_from(s.to_owned()).unwrap()
    }

    #[test]
    fn root_kind_classification() {
        assert!(!ArtifactRoot::source(path("cell")).is_middleman());
        assert!(!ArtifactRoot::derived(path("out/gen")).is_middleman());
        assert!(ArtifactRoot::middleman(path("out/middlemen")).is_middleman());
        assert_eq!(
            RootKind::Derived,
            ArtifactRoot::derived(path("out/gen")).kind()
        );
    }

    #[test]
    fn root_equality_is_by_value() {
        let r1 = ArtifactRoot::derived(path("out/gen"));
        let r2 = ArtifactRoot::derived(path("out/gen"));
        let r3 = ArtifactRoot::source(path("out/gen"));

        assert_eq!(r1, r2);
        assert_ne!(r1, r3);
    }
}
