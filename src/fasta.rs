use std::fmt;
use std::io::{self, Write};

pub const LINE_WIDTH: usize = 60;

pub fn wrap(sequence: &str, width: usize) -> Vec<&str> {
    assert!(width > 0, "wrap width must be positive");
    let mut lines = Vec::new();
    let mut line_start = 0;
    for (count, (index, _)) in sequence.char_indices().enumerate() {
        if count > 0 && count % width == 0 {
            lines.push(&sequence[line_start..index]);
            line_start = index;
        }
    }
    if line_start < sequence.len() {
        lines.push(&sequence[line_start..]);
    }
    lines
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastaRecord {
    pub header: String,
    pub sequence: String,
}

impl FastaRecord {
    pub fn new(header: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            sequence: sequence.into(),
        }
    }
}

impl fmt::Display for FastaRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, ">{}", self.header)?;
        write!(f, "{}", wrap(&self.sequence, LINE_WIDTH).join("\n"))
    }
}

pub struct FastaWriter<W: Write> {
    inner: W,
    records: usize,
}

impl<W: Write> FastaWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, records: 0 }
    }

    pub fn write_record(&mut self, record: &FastaRecord) -> io::Result<()> {
        writeln!(self.inner, "{record}")?;
        self.records += 1;
        Ok(())
    }

    pub fn records(&self) -> usize {
        self.records
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.inner.flush()?;
        Ok(self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_short_sequence() {
        assert_eq!(wrap("GGATGCTT", LINE_WIDTH), vec!["GGATGCTT"]);
        assert!(wrap("", LINE_WIDTH).is_empty());
    }

    #[test]
    fn wrap_line_counts_and_round_trip() {
        for len in [1usize, 59, 60, 61, 119, 120, 121, 1000] {
            let seq: String = "ACGT".chars().cycle().take(len).collect();
            let lines = wrap(&seq, LINE_WIDTH);
            assert_eq!(lines.len(), len.div_ceil(LINE_WIDTH), "len {len}");
            let (last, full) = lines.split_last().unwrap();
            assert!(full.iter().all(|line| line.len() == LINE_WIDTH));
            assert!(!last.is_empty() && last.len() <= LINE_WIDTH);
            assert_eq!(lines.concat(), seq);
        }
    }

    #[test]
    fn wrap_counts_characters_not_bytes() {
        let seq = format!("{}é{}", "A".repeat(59), "C".repeat(70));
        let lines = wrap(&seq, LINE_WIDTH);
        let lengths: Vec<usize> = lines.iter().map(|line| line.chars().count()).collect();
        assert_eq!(lengths, vec![60, 60, 10]);
        assert_eq!(lines.concat(), seq);
    }

    #[test]
    fn record_display() {
        let record = FastaRecord::new("ENST00000001.3", "GGATGCTT");
        assert_eq!(record.to_string(), ">ENST00000001.3\nGGATGCTT");
    }

    #[test]
    fn record_display_multiline_has_no_trailing_break() {
        let seq = "A".repeat(130);
        let text = FastaRecord::new("x", seq).to_string();
        let full = "A".repeat(60);
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines, [">x", full.as_str(), full.as_str(), "AAAAAAAAAA"]);
    }

    #[test]
    fn writer_terminates_each_record() {
        let mut writer = FastaWriter::new(Vec::new());
        writer.write_record(&FastaRecord::new("a", "AC")).unwrap();
        writer.write_record(&FastaRecord::new("b", "GT")).unwrap();
        assert_eq!(writer.records(), 2);
        let bytes = writer.finish().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), ">a\nAC\n>b\nGT\n");
    }
}
