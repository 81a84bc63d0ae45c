//! Menu Catalog

pub mod catalog;

pub use catalog::MenuCatalog;
