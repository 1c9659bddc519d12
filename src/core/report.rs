//! # Command results.
//!
//! [`Reply`] is what a successfully executed command returns; [`DrainReport`]
//! is the outcome of `stop_all`. Both render as human-readable text via
//! `Display`. The text is advisory and not a stable format.

use std::fmt;

use crate::workers::WorkerInfo;

/// Outcome of a stop-all drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Workers that exited within the grace period.
    pub stopped: Vec<String>,
    /// Workers still finishing when the grace period ran out (entries removed anyway).
    pub timed_out: Vec<String>,
}

impl DrainReport {
    /// True if every drained worker exited in time.
    pub fn is_clean(&self) -> bool {
        self.timed_out.is_empty()
    }

    /// Number of workers drained.
    pub fn total(&self) -> usize {
        self.stopped.len() + self.timed_out.len()
    }
}

impl fmt::Display for DrainReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total() == 0 {
            return f.write_str("no managed workers to stop");
        }
        write!(f, "stopped {} worker(s)", self.stopped.len())?;
        if !self.is_clean() {
            write!(
                f,
                "; still finishing after grace: {}",
                self.timed_out.join(", ")
            )?;
        }
        Ok(())
    }
}

/// Successful result of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Worker registered and started.
    Created(WorkerInfo),
    /// Worker exited and removed itself within the stop grace period.
    Stopped {
        /// Worker name.
        name: String,
    },
    /// Snapshot of live workers, sorted by name.
    Workers(Vec<WorkerInfo>),
    /// Outcome of stop-all.
    Drained(DrainReport),
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Created(info) => {
                write!(f, "worker '{}' started ({}", info.name, info.kind)?;
                if !info.interval.is_zero() {
                    write!(f, ", interval={:?}", info.interval)?;
                }
                if let Some(lifetime) = info.lifetime {
                    write!(f, ", lifetime={lifetime:?}")?;
                }
                write!(f, ", daemon={})", info.daemon)
            }
            Reply::Stopped { name } => write!(f, "worker '{name}' stopped"),
            Reply::Workers(workers) if workers.is_empty() => f.write_str("no managed workers"),
            Reply::Workers(workers) => {
                writeln!(f, "managed workers: {}", workers.len())?;
                writeln!(
                    f,
                    "{:<20} {:<9} {:<7} {:<10} {:<6} {:>8}",
                    "NAME", "KIND", "DAEMON", "STATE", "ALIVE", "UPTIME"
                )?;
                for (i, w) in workers.iter().enumerate() {
                    if i + 1 == workers.len() {
                        write!(f, "{w}")?;
                    } else {
                        writeln!(f, "{w}")?;
                    }
                }
                Ok(())
            }
            Reply::Drained(report) => write!(f, "{report}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_report_mentions_stragglers() {
        let report = DrainReport {
            stopped: vec!["a".into()],
            timed_out: vec!["slow".into()],
        };
        assert!(!report.is_clean());
        assert_eq!(report.total(), 2);
        let text = report.to_string();
        assert!(text.contains("stopped 1"));
        assert!(text.contains("slow"));
    }

    #[test]
    fn empty_replies_say_so() {
        assert_eq!(Reply::Workers(Vec::new()).to_string(), "no managed workers");
        assert_eq!(
            Reply::Drained(DrainReport::default()).to_string(),
            "no managed workers to stop"
        );
    }
}
