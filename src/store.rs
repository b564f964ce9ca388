use std::sync::Arc;

use crate::domain::{Interval, Orientation, Transcript};
use crate::error::ExportError;

pub trait TranscriptStore {
    fn fetch_by_biotype(&self, biotype: &str) -> Result<Vec<Transcript>, ExportError>;

    fn spliced_sequence(&self, transcript: &Transcript) -> Result<String, ExportError>;
}

pub trait SequenceStore {
    fn fetch_range(
        &self,
        seq_region: &str,
        interval: Interval,
        orientation: Orientation,
    ) -> Result<String, ExportError>;
}

impl<S: SequenceStore + ?Sized> SequenceStore for Arc<S> {
    fn fetch_range(
        &self,
        seq_region: &str,
        interval: Interval,
        orientation: Orientation,
    ) -> Result<String, ExportError> {
        (**self).fetch_range(seq_region, interval, orientation)
    }
}

impl<S: SequenceStore + ?Sized> SequenceStore for &S {
    fn fetch_range(
        &self,
        seq_region: &str,
        interval: Interval,
        orientation: Orientation,
    ) -> Result<String, ExportError> {
        (**self).fetch_range(seq_region, interval, orientation)
    }
}
