// SPDX-License-Identifier: MIT

//! Common types shared across the pattern compiler and simulator.

pub mod entry;
pub mod time;
