/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;

use allocative::Allocative;
use ref_cast::RefCast;
use relative_path::RelativePath;
use relative_path::RelativePathBuf;
use thiserror::Error;

/// Errors from creating a [`ForwardRelativePath`].
#[derive(Error, Debug)]
enum ForwardRelativePathError {
    #[error("expected a relative path but got an absolute path instead: `{0}`")]
    PathNotRelative(String),
    #[error("expected a normalized path but got a non-normalized path instead: `{0}`")]
    PathNotNormalized(String),
    #[error("`{0}` is not a prefix of `{1}`")]
    StripPrefix(String, String),
}

/// A forward pointing, fully normalized relative path.
///
/// The empty path is allowed. Each component is non-empty and neither `.`
/// nor `..`, so the path never points above its root. This is the only
/// path shape the build graph ever stores; conversion to platform paths
/// happens at the fs boundary.
#[derive(Debug, Hash, PartialEq, Eq, PartialOrd, Ord, RefCast, Allocative)]
#[repr(transparent)]
pub struct ForwardRelativePath(str);

/// The owned version of [`ForwardRelativePath`].
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, Allocative)]
pub struct ForwardRelativePathBuf(String);

impl ForwardRelativePath {
    #[inline]
    pub fn unchecked_new<S: ?Sized + AsRef<str>>(s: &S) -> &Self {
        ForwardRelativePath::ref_cast(s.as_ref())
    }

    #[inline]
    pub fn empty() -> &'static ForwardRelativePath {
        ForwardRelativePath::unchecked_new("")
    }

    /// Creates a `ForwardRelativePath` if the given string represents a
    /// forward, normalized relative path, otherwise error.
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    ///
    /// assert!(ForwardRelativePath::new("foo/bar").is_ok());
    /// assert!(ForwardRelativePath::new("").is_ok());
    /// assert!(ForwardRelativePath::new("/abs/bar").is_err());
    /// assert!(ForwardRelativePath::new("normalize/./bar").is_err());
    /// assert!(ForwardRelativePath::new("normalize/../bar").is_err());
    /// assert!(ForwardRelativePath::new("trailing/slash/").is_err());
    /// ```
    pub fn new<S: ?Sized + AsRef<str>>(s: &S) -> anyhow::Result<&ForwardRelativePath> {
        let s = s.as_ref();
        verify_forward_rel_path(s)?;
        Ok(ForwardRelativePath::unchecked_new(s))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Creates an owned `ForwardRelativePathBuf` with path adjoined to self.
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    ///
    /// let path = ForwardRelativePath::new("foo/bar")?;
    /// assert_eq!(
    ///     path.join(ForwardRelativePath::new("baz")?).as_str(),
    ///     "foo/bar/baz"
    /// );
    /// assert_eq!(path.join(ForwardRelativePath::empty()).as_str(), "foo/bar");
    /// assert_eq!(
    ///     ForwardRelativePath::empty()
    ///         .join(ForwardRelativePath::new("baz")?)
    ///         .as_str(),
    ///     "baz"
    /// );
    ///
    /// # anyhow::Ok(())
    /// ```
    pub fn join<P: AsRef<ForwardRelativePath>>(&self, path: P) -> ForwardRelativePathBuf {
        let path = path.as_ref();
        if self.is_empty() {
            path.to_buf()
        } else if path.is_empty() {
            self.to_buf()
        } else {
            let mut s = String::with_capacity(self.0.len() + 1 + path.0.len());
            s.push_str(&self.0);
            s.push('/');
            s.push_str(&path.0);
            ForwardRelativePathBuf(s)
        }
    }

    /// Returns a relative path of the parent directory, or `None` for the
    /// empty path.
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    ///
    /// assert_eq!(
    ///     Some(ForwardRelativePath::new("foo")?),
    ///     ForwardRelativePath::new("foo/bar")?.parent()
    /// );
    /// assert_eq!(
    ///     Some(ForwardRelativePath::empty()),
    ///     ForwardRelativePath::new("foo")?.parent()
    /// );
    /// assert_eq!(None, ForwardRelativePath::empty().parent());
    ///
    /// # anyhow::Ok(())
    /// ```
    pub fn parent(&self) -> Option<&ForwardRelativePath> {
        if self.is_empty() {
            return None;
        }
        match self.0.rfind('/') {
            Some(i) => Some(ForwardRelativePath::unchecked_new(&self.0[..i])),
            None => Some(ForwardRelativePath::empty()),
        }
    }

    /// Returns the final component of the path, if there is one.
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    ///
    /// assert_eq!(
    ///     Some("bin"),
    ///     ForwardRelativePath::new("usr/bin")?.file_name()
    /// );
    /// assert_eq!(None, ForwardRelativePath::empty().file_name());
    ///
    /// # anyhow::Ok(())
    /// ```
    pub fn file_name(&self) -> Option<&str> {
        if self.is_empty() {
            return None;
        }
        match self.0.rfind('/') {
            Some(i) => Some(&self.0[i + 1..]),
            None => Some(&self.0),
        }
    }

    /// Determines whether `base` is a prefix of `self`, considering whole
    /// path components only.
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    ///
    /// let path = ForwardRelativePath::new("some/foo")?;
    ///
    /// assert!(path.starts_with(ForwardRelativePath::new("some")?));
    /// assert!(path.starts_with(ForwardRelativePath::empty()));
    /// assert!(!path.starts_with(ForwardRelativePath::new("som")?));
    ///
    /// # anyhow::Ok(())
    /// ```
    pub fn starts_with<P: AsRef<ForwardRelativePath>>(&self, base: P) -> bool {
        let base = base.as_ref();
        base.is_empty()
            || self.0 == base.0
            || (self.0.starts_with(&base.0) && self.0.as_bytes()[base.0.len()] == b'/')
    }

    /// Returns a path that, when joined onto `base`, yields `self`. Error
    /// if `base` is not a whole-component prefix of `self`.
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    ///
    /// let path = ForwardRelativePath::new("test/haha/foo.txt")?;
    ///
    /// assert_eq!(
    ///     path.strip_prefix(ForwardRelativePath::new("test")?)?,
    ///     ForwardRelativePath::new("haha/foo.txt")?
    /// );
    /// assert!(path.strip_prefix(ForwardRelativePath::new("asdf")?).is_err());
    ///
    /// # anyhow::Ok(())
    /// ```
    pub fn strip_prefix<P: AsRef<ForwardRelativePath>>(
        &self,
        base: P,
    ) -> anyhow::Result<&ForwardRelativePath> {
        let base = base.as_ref();
        if base.is_empty() {
            Ok(self)
        } else if self.0 == base.0 {
            Ok(ForwardRelativePath::empty())
        } else if self.0.starts_with(&base.0) && self.0.as_bytes()[base.0.len()] == b'/' {
            Ok(ForwardRelativePath::unchecked_new(
                &self.0[base.0.len() + 1..],
            ))
        } else {
            Err(
                ForwardRelativePathError::StripPrefix(base.0.to_owned(), self.0.to_owned())
                    .into(),
            )
        }
    }

    /// Iterator over the components of this path.
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    ///
    /// let p = ForwardRelativePath::new("foo/bar/baz")?;
    /// let mut it = p.iter();
    ///
    /// assert_eq!(it.next(), Some("foo"));
    /// assert_eq!(it.next(), Some("bar"));
    /// assert_eq!(it.next(), Some("baz"));
    /// assert_eq!(it.next(), None);
    /// assert_eq!(ForwardRelativePath::empty().iter().next(), None);
    ///
    /// # anyhow::Ok(())
    /// ```
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    #[inline]
    pub fn to_buf(&self) -> ForwardRelativePathBuf {
        self.to_owned()
    }
}

impl ForwardRelativePathBuf {
    #[inline]
    pub fn unchecked_new(s: String) -> Self {
        ForwardRelativePathBuf(s)
    }

    #[inline]
    pub fn new() -> Self {
        ForwardRelativePathBuf(String::new())
    }

    #[inline]
    pub fn as_path(&self) -> &ForwardRelativePath {
        self
    }

    /// Pushes a `ForwardRelativePath` to the existing buffer.
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePathBuf;
    ///
    /// let mut path = ForwardRelativePathBuf::try_from("foo".to_owned())?;
    /// path.push(ForwardRelativePath::new("bar")?);
    /// assert_eq!("foo/bar", path.as_str());
    /// path.push(ForwardRelativePath::empty());
    /// assert_eq!("foo/bar", path.as_str());
    ///
    /// # anyhow::Ok(())
    /// ```
    pub fn push<P: AsRef<ForwardRelativePath>>(&mut self, path: P) {
        let path = path.as_ref();
        if path.is_empty() {
            return;
        }
        if !self.0.is_empty() {
            self.0.push('/');
        }
        self.0.push_str(path.as_str());
    }

    #[inline]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Default for ForwardRelativePathBuf {
    #[inline]
    fn default() -> Self {
        ForwardRelativePathBuf::new()
    }
}

fn verify_forward_rel_path(s: &str) -> anyhow::Result<()> {
    if s.starts_with('/') {
        return Err(ForwardRelativePathError::PathNotRelative(s.to_owned()).into());
    }
    if s.is_empty() {
        return Ok(());
    }
    for segment in s.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(ForwardRelativePathError::PathNotNormalized(s.to_owned()).into());
        }
    }
    Ok(())
}

impl fmt::Display for ForwardRelativePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ForwardRelativePathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ForwardRelativePath {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ForwardRelativePathBuf {
    #[inline]
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<RelativePath> for ForwardRelativePath {
    #[inline]
    fn as_ref(&self) -> &RelativePath {
        RelativePath::new(&self.0)
    }
}

impl AsRef<RelativePath> for ForwardRelativePathBuf {
    #[inline]
    fn as_ref(&self) -> &RelativePath {
        RelativePath::new(&self.0)
    }
}

impl AsRef<ForwardRelativePath> for ForwardRelativePath {
    #[inline]
    fn as_ref(&self) -> &ForwardRelativePath {
        self
    }
}

impl AsRef<ForwardRelativePath> for ForwardRelativePathBuf {
    #[inline]
    fn as_ref(&self) -> &ForwardRelativePath {
        ForwardRelativePath::unchecked_new(self.0.as_str())
    }
}

impl Borrow<ForwardRelativePath> for ForwardRelativePathBuf {
    #[inline]
    fn borrow(&self) -> &ForwardRelativePath {
        self.as_ref()
    }
}

impl Deref for ForwardRelativePathBuf {
    type Target = ForwardRelativePath;

    #[inline]
    fn deref(&self) -> &ForwardRelativePath {
        ForwardRelativePath::unchecked_new(self.0.as_str())
    }
}

impl ToOwned for ForwardRelativePath {
    type Owned = ForwardRelativePathBuf;

    #[inline]
    fn to_owned(&self) -> ForwardRelativePathBuf {
        ForwardRelativePathBuf(self.0.to_owned())
    }
}

impl<'a> From<&'a ForwardRelativePath> for ForwardRelativePathBuf {
    #[inline]
    fn from(p: &'a ForwardRelativePath) -> ForwardRelativePathBuf {
        p.to_buf()
    }
}

impl<'a> TryFrom<&'a str> for &'a ForwardRelativePath {
    type Error = anyhow::Error;

    /// no allocation conversion
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePath;
    ///
    /// assert!(<&ForwardRelativePath>::try_from("foo/bar").is_ok());
    /// assert!(<&ForwardRelativePath>::try_from("").is_ok());
    /// assert!(<&ForwardRelativePath>::try_from("/abs/bar").is_err());
    /// assert!(<&ForwardRelativePath>::try_from("normalize/../bar").is_err());
    /// ```
    #[inline]
    fn try_from(s: &'a str) -> anyhow::Result<&'a ForwardRelativePath> {
        ForwardRelativePath::new(s)
    }
}

impl TryFrom<String> for ForwardRelativePathBuf {
    type Error = anyhow::Error;

    /// no allocation conversion
    ///
    /// ```
    /// use mason_core::fs::paths::forward_rel_path::ForwardRelativePathBuf;
    ///
    /// assert!(ForwardRelativePathBuf::try_from("foo/bar".to_owned()).is_ok());
    /// assert!(ForwardRelativePathBuf::try_from("".to_owned()).is_ok());
    /// assert!(ForwardRelativePathBuf::try_from("/abs/bar".to_owned()).is_err());
    /// assert!(ForwardRelativePathBuf::try_from("normalize/./bar".to_owned()).is_err());
    /// ```
    #[inline]
    fn try_from(s: String) -> anyhow::Result<ForwardRelativePathBuf> {
        verify_forward_rel_path(&s)?;
        Ok(ForwardRelativePathBuf(s))
    }
}

impl TryFrom<RelativePathBuf> for ForwardRelativePathBuf {
    type Error = anyhow::Error;

    #[inline]
    fn try_from(p: RelativePathBuf) -> anyhow::Result<ForwardRelativePathBuf> {
        ForwardRelativePathBuf::try_from(p.into_string())
    }
}

impl PartialEq<str> for ForwardRelativePath {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        &self.0 == other
    }
}

impl PartialEq<str> for ForwardRelativePathBuf {
    #[inline]
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<ForwardRelativePath> for ForwardRelativePathBuf {
    #[inline]
    fn eq(&self, other: &ForwardRelativePath) -> bool {
        self.0 == other.0
    }
}

impl PartialEq<ForwardRelativePathBuf> for ForwardRelativePath {
    #[inline]
    fn eq(&self, other: &ForwardRelativePathBuf) -> bool {
        self.0 == other.0
    }
}
