//! Types and traits for recording values obtained during training.
//!
//! A [`Record`] is a set of named values, e.g. the average episode reward at a
//! training step. The [`Trainer`](crate::Trainer) writes records into a
//! [`Recorder`], which decides where they go.
//!
//! ```rust
//! use qlearn_core::record::{Record, RecordValue};
//!
//! let mut record = Record::empty();
//! record.insert("step", RecordValue::Integer(1000));
//! record.insert("avg_reward", RecordValue::Scalar(22.5));
//! assert_eq!(record.get_scalar("avg_reward").unwrap(), 22.5);
//! ```
mod base;
mod buffered_recorder;
mod console_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use console_recorder::ConsoleRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
