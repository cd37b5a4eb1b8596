//! Thin ingestion adapters, kept outside the core algorithms' invariant
//! surface: a legend-driven delimited-text reader and a greyscale image
//! buffer.

mod csv;
mod image;

pub use csv::from_csv;
pub use image::GreyImage;
