//! Grammars with their function and branch-point queries.

pub mod go;
pub mod javascript;
pub mod python;
pub mod typescript;
