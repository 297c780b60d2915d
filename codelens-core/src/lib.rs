//! Core of codelens: the analysis lifecycle controller and everything it leans
//! on, with no terminal code.

pub mod backend;
pub mod db;
pub mod debounce;
pub mod draft;
pub mod error;
pub mod language;
pub mod progress;
pub mod schema;
pub mod session;
pub mod types;
pub mod validate;
