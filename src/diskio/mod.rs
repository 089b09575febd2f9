pub mod compression;
pub mod file;
pub mod stream;
