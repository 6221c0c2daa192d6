/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use std::fmt;
use std::fmt::Formatter;
use std::sync::Arc;

use allocative::Allocative;
use dupe::Dupe;
use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
use mason_core::fs::paths::forward_rel_path::ForwardRelativePathBuf;
use starlark_map::Hashed;
use static_assertions::assert_eq_size;

use crate::root::ArtifactRoot;

/// An immutable handle to a file the build graph tracks. The underlying
/// data is not very large, but we store many copies of it, which is why we
/// store this as an Arc.
///
/// Two artifacts are equal iff their root and root-relative path are
/// equal; the hash is precomputed so artifacts are cheap set keys.
#[derive(Clone, Debug, Dupe, PartialEq, Eq, Hash, Allocative)]
pub struct Artifact(Arc<ArtifactData>);

assert_eq_size!(Artifact, [usize; 1]);

#[derive(Debug, PartialEq, Eq, Hash, Allocative)]
struct ArtifactData {
    key: Hashed<ArtifactKey>,
}

#[derive(Debug, PartialEq, Eq, Hash, Allocative)]
struct ArtifactKey {
    root: ArtifactRoot,
    path: ForwardRelativePathBuf,
}

impl Artifact {
    pub fn new(root: ArtifactRoot, path: ForwardRelativePathBuf) -> Self {
        Artifact(Arc::new(ArtifactData {
            key: Hashed::new(ArtifactKey { root, path }),
        }))
    }

    pub fn root(&self) -> &ArtifactRoot {
        &self.0.key.key().root
    }

    /// The path of this artifact relative to its root.
    pub fn root_relative_path(&self) -> &ForwardRelativePath {
        &self.0.key.key().path
    }

    /// The path of this artifact relative to the exec root.
    pub fn exec_path(&self) -> ForwardRelativePathBuf {
        self.root().exec_path().join(self.root_relative_path())
    }

    /// Whether this artifact is a synchronization placeholder. Placeholder
    /// artifacts carry no file content and must never be materialized.
    #[inline]
    pub fn is_middleman(&self) -> bool {
        self.root().is_middleman()
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let key = self.0.key.key();
        if key.root.exec_path().is_empty() {
            write!(f, "{}", key.path)
        } else {
            write!(f, "{}/{}", key.root, key.path)
        }
    }
}

pub mod testing {
    use dupe::Dupe;
    use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;

    use crate::artifact::Artifact;
    use crate::root::ArtifactRoot;

    pub trait ArtifactTestingExt {
        fn testing_new(root: &ArtifactRoot, path: &str) -> Artifact;
    }

    impl ArtifactTestingExt for Artifact {
        fn testing_new(root: &ArtifactRoot, path: &str) -> Artifact {
            Artifact::new(root.dupe(), ForwardRelativePath::new(path).unwrap().to_buf())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use dupe::Dupe;
    use mason_core::fs::paths::forward_rel_path::ForwardRelativePathBuf;

    use crate::artifact::testing::ArtifactTestingExt;
    use crate::artifact::Artifact;
    use crate::root::ArtifactRoot;

    fn derived_root() -> ArtifactRoot {
        ArtifactRoot::derived(ForwardRelativePathBuf::try_from("out/gen".to_owned()).unwrap())
    }

    #[test]
    fn artifact_equality_is_root_plus_path() {
        let a1 = Artifact::testing_new(&derived_root(), "pkg/thing");
        let a2 = Artifact::testing_new(&derived_root(), "pkg/thing");
        let a3 = Artifact::testing_new(&derived_root(), "pkg/other");
        let a4 = Artifact::testing_new(
            &ArtifactRoot::source(
                ForwardRelativePathBuf::try_from("out/gen".to_owned()).unwrap(),
            ),
            "pkg/thing",
        );

        assert_eq!(a1, a2);
        assert_ne!(a1, a3);
        assert_ne!(a1, a4);
    }

    #[test]
    fn artifact_usable_as_set_key() {
        let a1 = Artifact::testing_new(&derived_root(), "pkg/thing");
        let a2 = Artifact::testing_new(&derived_root(), "pkg/thing");

        let mut set = HashSet::new();
        set.insert(a1.dupe());
        set.insert(a2);
        set.insert(a1);

        assert_eq!(1, set.len());
    }

    #[test]
    fn exec_path_joins_root_and_relative_path() {
        let artifact = Artifact::testing_new(&derived_root(), "pkg/thing");

        assert_eq!("out/gen/pkg/thing", artifact.exec_path().as_str());
        assert_eq!("out/gen/pkg/thing", format!("{artifact}"));
    }

    #[test]
    fn middleman_classification_follows_root() {
        let middleman_root = ArtifactRoot::middleman(
            ForwardRelativePathBuf::try_from("out/middlemen".to_owned()).unwrap(),
        );

        assert!(Artifact::testing_new(&middleman_root, "pkg/mm").is_middleman());
        assert!(!Artifact::testing_new(&derived_root(), "pkg/thing").is_middleman());
    }
}
