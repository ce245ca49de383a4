//! JSON-array sink.
//!
//! ```text
//! [{"country":"PL","total":10}
//! ,{"country":"PL","total":30}
//! ]
//! ```
//!
//! `[` precedes the first record, `,` every later one, and `]` is written
//! on close (`[]` when nothing was written). Each record is a flat object of
//! field name to raw value with sorted keys, followed by a newline. A
//! delimiter write that does not take exactly one byte is a short write and
//! is reported, never retried.

use super::Output;
use crate::error::PlanStreamError;
use crate::record::Record;
use std::io::Write;

pub struct JsonArrayOutput<W: Write> {
    writer: W,
    records_written: u64,
    closed: bool,
}

impl<W: Write> JsonArrayOutput<W> {
    pub fn new(writer: W) -> Self {
        JsonArrayOutput {
            writer,
            records_written: 0,
            closed: false,
        }
    }

    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn delimiter(&mut self, byte: u8, what: &str) -> Result<(), PlanStreamError> {
        let n = self
            .writer
            .write(&[byte])
            .map_err(|source| PlanStreamError::SinkIo {
                context: format!("couldn't write {what}"),
                source,
            })?;
        if n != 1 {
            return Err(PlanStreamError::short_write(format!("couldn't write {what}")));
        }
        Ok(())
    }
}

fn encode(record: &Record) -> serde_json::Value {
    let object: serde_json::Map<String, serde_json::Value> = record
        .fields()
        .iter()
        .zip(record.values())
        .map(|(name, value)| (name.as_str().to_string(), value.to_raw_value()))
        .collect();
    serde_json::Value::Object(object)
}

impl<W: Write> Output for JsonArrayOutput<W> {
    fn write_record(&mut self, record: &Record) -> Result<(), PlanStreamError> {
        if self.closed {
            return Err(PlanStreamError::InternalError(
                "record written to a closed json sink".into(),
            ));
        }
        if self.records_written == 0 {
            self.delimiter(b'[', "leading square bracket")?;
        } else {
            self.delimiter(b',', "separating comma")?;
        }
        serde_json::to_writer(&mut self.writer, &encode(record)).map_err(|e| {
            PlanStreamError::SinkIo {
                context: "couldn't encode record as json".into(),
                source: e.into(),
            }
        })?;
        self.writer
            .write_all(b"\n")
            .map_err(|source| PlanStreamError::SinkIo {
                context: "couldn't terminate record".into(),
                source,
            })?;
        self.records_written += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), PlanStreamError> {
        if self.closed {
            return Err(PlanStreamError::InternalError(
                "json sink closed twice".into(),
            ));
        }
        self.closed = true;
        if self.records_written == 0 {
            self.delimiter(b'[', "leading square bracket")?;
        }
        self.delimiter(b']', "trailing square bracket")?;
        self.writer.flush().map_err(|source| PlanStreamError::SinkIo {
            context: "couldn't flush output".into(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlanStreamErrorKind;
    use crate::value::Value;
    use std::io;

    #[test]
    fn test_two_records_framing() {
        let mut out = JsonArrayOutput::new(Vec::new());
        out.write_record(&Record::insert([("b", Value::Int(1)), ("a", Value::from("x"))]))
            .unwrap();
        out.write_record(&Record::retract([("a", Value::Null)]))
            .unwrap();
        out.close().unwrap();
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text, "[{\"a\":\"x\",\"b\":1}\n,{\"a\":null}\n]");
    }

    #[test]
    fn test_empty_output_is_empty_array() {
        let mut out = JsonArrayOutput::new(Vec::new());
        out.close().unwrap();
        assert_eq!(out.into_inner(), b"[]");
    }

    #[test]
    fn test_double_close_rejected() {
        let mut out = JsonArrayOutput::new(Vec::new());
        out.close().unwrap();
        assert!(out.close().is_err());
    }

    /// Accepts `budget` delimiter-sized writes, then reports zero bytes.
    struct Stingy {
        budget: usize,
    }

    impl Write for Stingy {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Ok(0);
            }
            self.budget -= 1;
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_short_write_on_leading_bracket() {
        let mut out = JsonArrayOutput::new(Stingy { budget: 0 });
        let err = out
            .write_record(&Record::insert([("a", Value::Int(1))]))
            .unwrap_err();
        assert_eq!(err.kind(), PlanStreamErrorKind::Io);
        assert!(err.to_string().contains("leading square bracket"), "{err}");
    }

    #[test]
    fn test_write_error_is_wrapped() {
        struct Broken;
        impl Write for Broken {
            fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }
        let mut out = JsonArrayOutput::new(Broken);
        let err = out.close().unwrap_err();
        assert!(matches!(err, PlanStreamError::SinkIo { .. }));
        assert!(err.to_string().contains("pipe closed"), "{err}");
    }
}
