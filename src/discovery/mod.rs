//! Discovery & Barrel Loader (§4.1): scan a directory, statically
//! interpret each eligible source file's top-level declarations, and
//! resolve late-bound cross-file references through the two-pass +
//! barrel-replay protocol.

pub mod barrel;
mod eval;
mod loader;
pub mod parser;
mod scanner;

pub use barrel::Barrel;
pub use loader::{collect_barrel_exports, discover};
pub use scanner::scan_eligible_files;
