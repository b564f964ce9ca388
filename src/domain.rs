use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::ExportError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
    Unknown,
}

impl Strand {
    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            1 => Some(Strand::Forward),
            -1 => Some(Strand::Reverse),
            0 => Some(Strand::Unknown),
            _ => None,
        }
    }

    pub fn as_db(self) -> i64 {
        match self {
            Strand::Forward => 1,
            Strand::Reverse => -1,
            Strand::Unknown => 0,
        }
    }
}

impl fmt::Display for Strand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_db())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    Forward,
    Reverse,
}

impl Orientation {
    pub fn as_db(self) -> i64 {
        match self {
            Orientation::Forward => 1,
            Orientation::Reverse => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UnstrandedPolicy {
    Forward,
    #[default]
    Reverse,
    Error,
}

impl fmt::Display for UnstrandedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnstrandedPolicy::Forward => write!(f, "forward"),
            UnstrandedPolicy::Reverse => write!(f, "reverse"),
            UnstrandedPolicy::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub start: i64,
    pub end: i64,
}

impl Interval {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn is_empty(&self) -> bool {
        self.end < self.start
    }

    pub fn len(&self) -> u64 {
        if self.is_empty() {
            0
        } else {
            (self.end - self.start + 1) as u64
        }
    }

    pub fn clip(&self, length: i64) -> Interval {
        Interval {
            start: self.start.max(1),
            end: self.end.min(length),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub dbid: u64,
    pub stable_id: String,
    pub version: Option<u32>,
    pub biotype: String,
    pub seq_region: String,
    pub start: i64,
    pub end: i64,
    pub strand: Strand,
}

impl Transcript {
    pub fn stable_id_version(&self) -> String {
        match self.version {
            Some(version) => format!("{}.{}", self.stable_id, version),
            None => self.stable_id.clone(),
        }
    }

    pub fn left_flank(&self, length: u32) -> Interval {
        Interval::new(self.start - i64::from(length), self.start - 1)
    }

    pub fn right_flank(&self, length: u32) -> Interval {
        Interval::new(self.end + 1, self.end + i64::from(length))
    }

    pub fn orientation(&self, policy: UnstrandedPolicy) -> Result<Orientation, ExportError> {
        match (self.strand, policy) {
            (Strand::Forward, _) => Ok(Orientation::Forward),
            (Strand::Reverse, _) => Ok(Orientation::Reverse),
            (Strand::Unknown, UnstrandedPolicy::Forward) => Ok(Orientation::Forward),
            (Strand::Unknown, UnstrandedPolicy::Reverse) => Ok(Orientation::Reverse),
            (Strand::Unknown, UnstrandedPolicy::Error) => {
                Err(ExportError::Unstranded(self.stable_id_version()))
            }
        }
    }
}
