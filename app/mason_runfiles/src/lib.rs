/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 *
 * This source code is licensed under both the MIT license found in the
 * LICENSE-MIT file in the root directory of this source tree and the Apache
 * License, Version 2.0 found in the LICENSE-APACHE file in the root directory
 * of this source tree.
 */

//! Runfiles resolution: computing the set of files an executable target
//! needs staged beside it at execution time.
//!
//! The build graph produces a [`runfiles::Runfiles`] per target at
//! analysis time; the execution layer queries it through a
//! [`supplier::RunfilesSupplier`], which filters out synchronization
//! placeholders and exposes the optional staging manifest.

pub mod runfiles;
pub mod supplier;
