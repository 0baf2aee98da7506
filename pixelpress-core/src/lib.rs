#![allow(clippy::needless_range_loop)]

//! Lossless image compression: PNG-style predictive filters feeding
//! adaptive arithmetic, LZ-arithmetic, or external DEFLATE/Zstd entropy
//! back-ends, behind a single per-channel/per-image pipeline driver.

pub mod arithmetic;
pub mod bits;
pub mod elias;
pub mod error;
pub mod external;
pub mod filters;
pub mod image;
pub mod lz77;
pub mod lz_arithmetic;
pub mod models;
pub mod pipeline;

pub use bits::{BitBuffer, BitCursor};
pub use error::{Error, Result};
pub use filters::{FilterType, Heuristic};
pub use image::Image;
pub use pipeline::{BackEnd, PipelineDriver};
