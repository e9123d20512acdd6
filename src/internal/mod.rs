//! Internal utilities shared across modules.

pub mod fs_utils;
