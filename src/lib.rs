// src/lib.rs
// launchdeck: supervisor and shared-model workspace manager for
// ComfyUI, A1111, Forge, kohya_ss and user-declared CUSTOM apps.

pub mod api;
pub mod bus;
pub mod config;
pub mod error;
pub mod installer;
pub mod mapping;
pub mod path_manager;
pub mod reconciler;
pub mod supervisor;
pub mod util;
