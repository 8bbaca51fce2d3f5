// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Lifecycle state and the render-in-progress guard.

use std::cell::Cell;

/// Where a mirror is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Renders on visibility notifications.
    Enabled,
    /// Torn down; [`crate::PlanarMirror::enable`] brings it back.
    Disabled,
    /// Torn down for good.
    Destroyed,
}

/// Marks a render as in progress for as long as it lives.
///
/// Only one guard can exist per flag at a time; [`RenderGuard::try_acquire`]
/// returns `None` while another one is alive.
#[derive(Debug)]
pub struct RenderGuard<'a> {
    flag: &'a Cell<bool>,
}

impl<'a> RenderGuard<'a> {
    /// Sets `flag`, unless it is already set.
    pub fn try_acquire(flag: &'a Cell<bool>) -> Option<Self> {
        if flag.replace(true) {
            None
        } else {
            Some(Self { flag })
        }
    }
}

impl Drop for RenderGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
    }
}
