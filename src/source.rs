//! Data sources: named inputs that `Scan` nodes open at materialization.
//!
//! # Line format
//!
//! [`JsonLinesSource`] reads one JSON object per line:
//!
//! ```text
//! {"fields": {"country": "PL", "amount": 10}}
//! {"retract": true, "fields": {"country": "PL", "amount": 10}}
//! ```
//!
//! `retract` defaults to `false`. Blank lines are skipped. Field order in the
//! produced record follows the key order of the decoded object.

use crate::error::PlanStreamError;
use crate::exec::{ExecutionContext, Operator};
use crate::record::{EventKind, Record};
use crate::value::{Value, VariableName};
use serde::Deserialize;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Mutex;

/// Something a `Scan` can read from.
pub trait DataSource {
    /// Start a fresh read of the source.
    fn open(&self) -> Result<Box<dyn Operator>, PlanStreamError>;
}

/// Operator replaying a fixed list of records.
#[derive(Debug, Default)]
pub struct Replay {
    records: VecDeque<Record>,
}

impl Replay {
    pub fn new(records: Vec<Record>) -> Self {
        Replay {
            records: records.into(),
        }
    }
}

impl Operator for Replay {
    fn next(&mut self, _ctx: &ExecutionContext) -> Result<Option<Record>, PlanStreamError> {
        Ok(self.records.pop_front())
    }
}

/// In-memory source; every `open` replays the same records from the start.
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    records: Vec<Record>,
}

impl InMemorySource {
    pub fn new(records: Vec<Record>) -> Self {
        InMemorySource { records }
    }
}

impl DataSource for InMemorySource {
    fn open(&self) -> Result<Box<dyn Operator>, PlanStreamError> {
        Ok(Box::new(Replay::new(self.records.clone())))
    }
}

// ── JSON lines ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Line {
    #[serde(default)]
    retract: bool,
    fields: serde_json::Map<String, serde_json::Value>,
}

enum Input {
    Path(PathBuf),
    /// A stream that can be read once, e.g. stdin.
    Reader(Mutex<Option<Box<dyn BufRead + Send>>>),
}

pub struct JsonLinesSource {
    input: Input,
}

impl JsonLinesSource {
    /// Reopens the file on every `open`.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        JsonLinesSource {
            input: Input::Path(path.into()),
        }
    }

    /// Wraps a one-shot reader; a second `open` fails.
    pub fn from_reader(reader: impl BufRead + Send + 'static) -> Self {
        JsonLinesSource {
            input: Input::Reader(Mutex::new(Some(Box::new(reader)))),
        }
    }
}

impl DataSource for JsonLinesSource {
    fn open(&self) -> Result<Box<dyn Operator>, PlanStreamError> {
        let reader: Box<dyn BufRead> = match &self.input {
            Input::Path(path) => {
                let file = File::open(path).map_err(|e| {
                    PlanStreamError::Compilation(format!(
                        "couldn't open input {}: {e}",
                        path.display()
                    ))
                })?;
                Box::new(BufReader::new(file))
            }
            Input::Reader(slot) => slot
                .lock()
                .map_err(|_| PlanStreamError::InternalError("input reader lock poisoned".into()))?
                .take()
                .ok_or_else(|| {
                    PlanStreamError::Compilation("input stream was already opened".into())
                })?,
        };
        Ok(Box::new(JsonLinesReader::new(reader)))
    }
}

/// Operator decoding records from JSON lines.
pub struct JsonLinesReader<R> {
    reader: R,
    line_no: usize,
    buf: String,
}

impl<R: BufRead> JsonLinesReader<R> {
    pub fn new(reader: R) -> Self {
        JsonLinesReader {
            reader,
            line_no: 0,
            buf: String::new(),
        }
    }

    fn decode(&self, text: &str) -> Result<Record, PlanStreamError> {
        let line: Line = serde_json::from_str(text).map_err(|e| {
            PlanStreamError::Evaluation(format!("line {}: malformed record: {e}", self.line_no))
        })?;
        let mut names = Vec::with_capacity(line.fields.len());
        let mut values = Vec::with_capacity(line.fields.len());
        for (name, raw) in &line.fields {
            let value = Value::from_raw_value(raw).ok_or_else(|| {
                PlanStreamError::Evaluation(format!(
                    "line {}: field {name} holds an object, which has no value form",
                    self.line_no
                ))
            })?;
            names.push(VariableName::new(name.as_str()));
            values.push(value);
        }
        let kind = if line.retract {
            EventKind::Retract
        } else {
            EventKind::Insert
        };
        Ok(Record::new(names, values, kind))
    }
}

impl<R: BufRead> Operator for JsonLinesReader<R> {
    fn next(&mut self, _ctx: &ExecutionContext) -> Result<Option<Record>, PlanStreamError> {
        loop {
            self.buf.clear();
            let n = self.reader.read_line(&mut self.buf).map_err(|e| {
                PlanStreamError::Evaluation(format!("couldn't read line {}: {e}", self.line_no + 1))
            })?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let text = self.buf.trim();
            if text.is_empty() {
                continue;
            }
            return self.decode(text).map(Some);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn read_all(source: &dyn DataSource) -> Result<Vec<Record>, PlanStreamError> {
        let ctx = ExecutionContext::default();
        let mut op = source.open()?;
        let mut out = Vec::new();
        while let Some(r) = op.next(&ctx)? {
            out.push(r);
        }
        Ok(out)
    }

    #[test]
    fn test_in_memory_source_reopens_from_start() {
        let source = InMemorySource::new(vec![Record::insert([("a", Value::Int(1))])]);
        assert_eq!(read_all(&source).unwrap().len(), 1);
        assert_eq!(read_all(&source).unwrap().len(), 1);
    }

    #[test]
    fn test_json_lines_decodes_kinds_and_values() {
        let text = "{\"fields\": {\"country\": \"PL\", \"amount\": 10}}\n\n\
                    {\"retract\": true, \"fields\": {\"amount\": 2.5, \"tags\": [1, 2]}}\n";
        let source = JsonLinesSource::from_reader(Cursor::new(text.to_string()));
        let records = read_all(&source).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].event_kind(), EventKind::Insert);
        assert_eq!(records[0].value(&"country".into()), Some(&Value::from("PL")));
        assert_eq!(records[1].event_kind(), EventKind::Retract);
        assert_eq!(records[1].value(&"amount".into()), Some(&Value::Float(2.5)));
        assert_eq!(
            records[1].value(&"tags".into()),
            Some(&Value::Tuple(vec![Value::Int(1), Value::Int(2)]))
        );
    }

    #[test]
    fn test_one_shot_reader_cannot_reopen() {
        let source = JsonLinesSource::from_reader(Cursor::new(String::new()));
        assert!(read_all(&source).unwrap().is_empty());
        assert!(matches!(
            source.open().err(),
            Some(PlanStreamError::Compilation(_))
        ));
    }

    #[test]
    fn test_malformed_line_reports_line_number() {
        let source = JsonLinesSource::from_reader(Cursor::new(
            "{\"fields\": {}}\n{\"fields\": 3}\n".to_string(),
        ));
        let err = read_all(&source).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{err}");
    }

    #[test]
    fn test_missing_file_is_compilation_error() {
        let source = JsonLinesSource::from_path("/nonexistent/plan_stream/input.jsonl");
        assert!(matches!(
            source.open().err(),
            Some(PlanStreamError::Compilation(_))
        ));
    }
}
