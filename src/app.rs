use std::io::Write;

use serde::Serialize;

use crate::config::DEFAULT_BIOTYPE;
use crate::domain::{Orientation, Transcript, UnstrandedPolicy};
use crate::error::ExportError;
use crate::fasta::{FastaRecord, FastaWriter};
use crate::sequence::reverse_complement;
use crate::store::{SequenceStore, TranscriptStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    pub biotype: String,
    pub flank_length: u32,
    pub unstranded: UnstrandedPolicy,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            biotype: DEFAULT_BIOTYPE.to_string(),
            flank_length: 0,
            unstranded: UnstrandedPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub biotype: String,
    pub flank_length: u32,
    pub records: usize,
    pub bases: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptSequence {
    pub left_flank: String,
    pub spliced: String,
    pub right_flank: String,
    pub orientation: Orientation,
}

impl TranscriptSequence {
    pub fn assemble(&self) -> String {
        match self.orientation {
            Orientation::Forward => {
                format!("{}{}{}", self.left_flank, self.spliced, self.right_flank)
            }
            Orientation::Reverse => format!(
                "{}{}{}",
                reverse_complement(&self.left_flank),
                self.spliced,
                reverse_complement(&self.right_flank)
            ),
        }
    }
}

pub struct Exporter<T: TranscriptStore, S: SequenceStore> {
    transcripts: T,
    sequences: S,
    options: ExportOptions,
}

impl<T: TranscriptStore, S: SequenceStore> Exporter<T, S> {
    pub fn new(transcripts: T, sequences: S, options: ExportOptions) -> Self {
        Self {
            transcripts,
            sequences,
            options,
        }
    }

    pub fn run<W: Write>(
        &self,
        writer: &mut FastaWriter<W>,
    ) -> Result<ExportSummary, ExportError> {
        let result = self.export_all(writer);
        let flushed = writer
            .flush()
            .map_err(|err| ExportError::Output(err.to_string()));
        let summary = result?;
        flushed?;
        Ok(summary)
    }

    fn export_all<W: Write>(
        &self,
        writer: &mut FastaWriter<W>,
    ) -> Result<ExportSummary, ExportError> {
        let transcripts = self.transcripts.fetch_by_biotype(&self.options.biotype)?;
        tracing::info!(
            biotype = %self.options.biotype,
            count = transcripts.len(),
            flank_length = self.options.flank_length,
            "exporting transcripts"
        );

        let mut summary = ExportSummary {
            biotype: self.options.biotype.clone(),
            flank_length: self.options.flank_length,
            records: 0,
            bases: 0,
        };
        for transcript in &transcripts {
            let record = self.build_record(transcript)?;
            writer
                .write_record(&record)
                .map_err(|err| ExportError::Output(err.to_string()))?;
            summary.records += 1;
            summary.bases += record.sequence.len() as u64;
        }
        Ok(summary)
    }

    pub fn transcript_sequence(
        &self,
        transcript: &Transcript,
    ) -> Result<TranscriptSequence, ExportError> {
        let orientation = transcript.orientation(self.options.unstranded)?;
        let flank = self.options.flank_length;
        let region = &transcript.seq_region;
        let left_flank = self
            .sequences
            .fetch_range(region, transcript.left_flank(flank), orientation)?;
        let right_flank = self
            .sequences
            .fetch_range(region, transcript.right_flank(flank), orientation)?;
        let spliced = self.transcripts.spliced_sequence(transcript)?;
        Ok(TranscriptSequence {
            left_flank,
            spliced,
            right_flank,
            orientation,
        })
    }

    pub fn build_record(&self, transcript: &Transcript) -> Result<FastaRecord, ExportError> {
        let parts = self.transcript_sequence(transcript)?;
        tracing::debug!(
            stable_id = %transcript.stable_id_version(),
            seq_region = %transcript.seq_region,
            start = transcript.start,
            end = transcript.end,
            strand = %transcript.strand,
            left = parts.left_flank.len(),
            spliced = parts.spliced.len(),
            right = parts.right_flank.len(),
            "assembled"
        );
        let sequence = parts.assemble();
        if let Some(found) = sequence.chars().find(|ch| !ch.is_ascii()) {
            return Err(ExportError::InvalidSequence {
                stable_id: transcript.stable_id_version(),
                found,
            });
        }
        Ok(FastaRecord::new(transcript.stable_id_version(), sequence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_is_literal_concatenation() {
        let parts = TranscriptSequence {
            left_flank: "GG".to_string(),
            spliced: "ATGC".to_string(),
            right_flank: "TT".to_string(),
            orientation: Orientation::Forward,
        };
        assert_eq!(parts.assemble(), "GGATGCTT");
    }

    #[test]
    fn reverse_complements_flanks_independently() {
        let parts = TranscriptSequence {
            left_flank: "GG".to_string(),
            spliced: "ATGC".to_string(),
            right_flank: "TT".to_string(),
            orientation: Orientation::Reverse,
        };
        assert_eq!(parts.assemble(), "CCATGCAA");
    }

    #[test]
    fn reverse_is_not_whole_string_reverse_complement() {
        let parts = TranscriptSequence {
            left_flank: "GAC".to_string(),
            spliced: "ATGAAA".to_string(),
            right_flank: "CTT".to_string(),
            orientation: Orientation::Reverse,
        };
        let whole = reverse_complement(&format!(
            "{}{}{}",
            parts.left_flank, parts.spliced, parts.right_flank
        ));
        assert_ne!(parts.assemble(), whole);
    }

    #[test]
    fn self_reverse_complementary_case_coincides() {
        let parts = TranscriptSequence {
            left_flank: "AT".to_string(),
            spliced: "GC".to_string(),
            right_flank: "AT".to_string(),
            orientation: Orientation::Reverse,
        };
        let whole = reverse_complement("ATGCAT");
        assert_eq!(parts.assemble(), whole);
    }
}
