use std::fs::File;
use std::io::{self, BufWriter, StdoutLock, Write};

use camino::Utf8Path;
use serde::Serialize;

use crate::app::ExportSummary;
use crate::error::ExportError;

pub enum OutputSink {
    File(BufWriter<File>),
    Stdout(StdoutLock<'static>),
}

impl OutputSink {
    pub fn open(path: Option<&Utf8Path>) -> Result<Self, ExportError> {
        match path {
            Some(path) => {
                let file = File::create(path)
                    .map_err(|err| ExportError::Output(format!("create {path}: {err}")))?;
                Ok(OutputSink::File(BufWriter::new(file)))
            }
            None => Ok(OutputSink::Stdout(io::stdout().lock())),
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            OutputSink::File(_) => "file",
            OutputSink::Stdout(_) => "stdout",
        }
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            OutputSink::File(file) => file.write(buf),
            OutputSink::Stdout(stdout) => stdout.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            OutputSink::File(file) => file.flush(),
            OutputSink::Stdout(stdout) => stdout.flush(),
        }
    }
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_summary(summary: &ExportSummary) -> io::Result<()> {
        Self::print_json(&mut io::stderr(), summary)
    }

    pub fn print_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        out.write_all(json.as_bytes())?;
        out.write_all(b"\n")?;
        Ok(())
    }
}
