//! Integral-image cumulants backing the random-feature oracle for greyscale
//! image samples (§4.5).

mod integral;

pub use integral::{ImageOracle, ImageOracleTable, Rect, RectStats};
