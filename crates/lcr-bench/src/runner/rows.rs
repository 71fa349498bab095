use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use lcr_core::TrialRecord;
use serde::Serialize;

use super::RunnerError;

/// One JSON line per finished trial.
#[derive(Debug, Serialize)]
struct TrialLogRow<'a> {
    run_id: &'a str,
    seed: u64,
    #[serde(flatten)]
    record: &'a TrialRecord,
}

/// Streams trial rows to `<stem>.trials.jsonl`.
pub(super) struct TrialLog {
    writer: BufWriter<File>,
    rows_written: u64,
}

impl TrialLog {
    pub(super) fn create(path: &Path) -> Result<Self, RunnerError> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
            rows_written: 0,
        })
    }

    pub(super) fn write(
        &mut self,
        run_id: &str,
        seed: u64,
        record: &TrialRecord,
    ) -> Result<(), RunnerError> {
        let row = TrialLogRow {
            run_id,
            seed,
            record,
        };
        serde_json::to_writer(&mut self.writer, &row)?;
        self.writer.write_all(b"\n")?;
        self.rows_written += 1;
        Ok(())
    }

    pub(super) fn finish(mut self) -> Result<u64, RunnerError> {
        self.writer.flush()?;
        Ok(self.rows_written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lcr_core::{GameOutcome, Seat};
    use tempfile::tempdir;

    #[test]
    fn rows_are_flat_json_lines() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("rows.jsonl");
        let mut log = TrialLog::create(&path).expect("create");
        let record = TrialRecord {
            trial: 3,
            outcome: GameOutcome {
                winner: Seat::new(1),
                rounds: 4,
                turns: 7,
                rolls: 15,
                forfeited: 5,
                final_stake: 1,
            },
        };
        log.write("unit", 99, &record).expect("write");
        assert_eq!(log.finish().expect("flush"), 1);

        let text = std::fs::read_to_string(&path).expect("readable");
        let value: serde_json::Value = serde_json::from_str(text.trim()).expect("json");
        assert_eq!(value["run_id"], "unit");
        assert_eq!(value["seed"], 99);
        assert_eq!(value["trial"], 3);
        assert_eq!(value["winner"], 1);
        assert_eq!(value["rounds"], 4);
    }
}
