pub mod file;
pub mod mime;
pub mod progress;
