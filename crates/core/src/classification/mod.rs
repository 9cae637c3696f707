//! Error Classifier - turns raised failures into `ClassifiedError` records.

mod classification_model;
mod classifier;

pub use classification_model::{ClassifiedError, ErrorCode, Failure, RateLimitSource};
pub use classifier::{classify, classify_error, MessageMode};

#[cfg(test)]
mod tests;
