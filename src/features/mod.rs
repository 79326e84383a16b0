//! Feature encoding: binary fields, one-hot categoricals, numeric scaling.
//!
//! The same `Preprocessor` is fitted by the trainer and replayed by the service,
//! so the model always sees columns in training order:
//! scaled numeric columns first, then the one-hot block.

pub mod encoding;
pub mod onehot;
pub mod preprocess;
pub mod scaler;

pub use encoding::*;
pub use onehot::*;
pub use preprocess::*;
pub use scaler::*;
