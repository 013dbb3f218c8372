use super::{Record, Recorder};
use log::warn;

/// Prints training progress to stdout.
///
/// Each record written by the [`Trainer`](crate::Trainer) becomes a line
/// `Step: <step>, Avg Reward: <avg_reward>`. Records lacking either value are
/// skipped.
#[derive(Default)]
pub struct ConsoleRecorder {}

impl ConsoleRecorder {
    /// Constructs the recorder.
    pub fn new() -> Self {
        Self {}
    }

    /// Formats a progress line, if the record has the values for one.
    pub fn format(record: &Record) -> Option<String> {
        let step = record.get_integer("step").ok()?;
        let avg_reward = record.get_scalar("avg_reward").ok()?;
        Some(format!("Step: {}, Avg Reward: {:?}", step, avg_reward))
    }
}

impl Recorder for ConsoleRecorder {
    fn write(&mut self, record: Record) {
        match Self::format(&record) {
            Some(line) => println!("{}", line),
            None => warn!("Record without step or avg_reward: {:?}", record),
        }
    }
}
