//! Fetch-transform-publish pipeline. [`update`] downloads the registry into a
//! temporary file, [`parse`] turns it into metric lines and atomically
//! replaces the output file.

mod download;
mod parse;

pub use download::update;
pub use parse::parse;
