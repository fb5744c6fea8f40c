pub mod diff;
pub mod import;
pub mod sync;
