// src/util/mod.rs
// Manifest/hashing utilities shared by the installer and reconciler.

pub mod hashing;
pub mod jsonio;
pub mod sizefmt;

pub use hashing::sha256_file;
pub use jsonio::{read_json_or_default, write_json_atomic};
pub use sizefmt::{folder_size_kb, human_bytes};
