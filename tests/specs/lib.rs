// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Spec-test member crate.
//!
//! The behavioral specs live under `sync/` and are wired into `tend-sync`
//! as `[[test]]` targets; this library target only anchors the package.
