//! Run records: the hall-of-fame and per-length statistics files.
//!
//! Every record is flushed as soon as it is written, so an interrupted
//! sweep keeps everything it found.

use std::fs::File;
use std::io::{BufWriter, Result, Write};
use std::path::Path;

/// One solved trial.
#[derive(Clone, Debug, PartialEq)]
pub struct HallOfFameEntry {
    pub target_len: usize,
    pub trial: usize,
    /// Machine steps spent across every evaluation of the trial.
    pub steps: u64,
    /// Winning program in text form.
    pub program: String,
}

impl HallOfFameEntry {
    pub fn to_line(&self) -> String {
        format!(
            "{} {} {} {}",
            self.target_len, self.trial, self.steps, self.program
        )
    }

    pub fn header() -> &'static str {
        "target_len trial steps program"
    }
}

/// Append-only writer for solved trials.
pub struct HallOfFame {
    writer: BufWriter<File>,
}

impl HallOfFame {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", HallOfFameEntry::header())?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn record(&mut self, entry: &HallOfFameEntry) -> Result<()> {
        writeln!(self.writer, "{}", entry.to_line())?;
        self.writer.flush()
    }
}

/// Average machine steps per solved target length.
pub struct StatsLog {
    writer: BufWriter<File>,
}

impl StatsLog {
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "target_len avg_steps")?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn record(&mut self, target_len: usize, avg_steps: f64) -> Result<()> {
        writeln!(self.writer, "{} {:.1}", target_len, avg_steps)?;
        self.writer.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_hall_of_fame_lines() {
        let path = "/tmp/evotape_test_hof.txt";
        let entry = HallOfFameEntry {
            target_len: 3,
            trial: 1,
            steps: 12345,
            program: "+.+.+.".to_string(),
        };

        let mut hof = HallOfFame::create(path).unwrap();
        hof.record(&entry).unwrap();

        let contents = fs::read_to_string(path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some(HallOfFameEntry::header()));
        assert_eq!(lines.next(), Some("3 1 12345 +.+.+."));
        assert_eq!(lines.next(), None);

        // Cleanup
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_stats_log_lines() {
        let path = "/tmp/evotape_test_stats.txt";

        let mut stats = StatsLog::create(path).unwrap();
        stats.record(1, 4200.0).unwrap();
        stats.record(2, 987.5).unwrap();

        let contents = fs::read_to_string(path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("target_len avg_steps"));
        assert_eq!(lines.next(), Some("1 4200.0"));
        assert_eq!(lines.next(), Some("2 987.5"));
        assert_eq!(lines.next(), None);

        // Cleanup
        let _ = fs::remove_file(path);
    }
}
