use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use sqlx::Row;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use tokio::runtime::{Builder, Runtime};

use crate::config::DbConfig;
use crate::domain::{Interval, Orientation, Strand, Transcript};
use crate::error::ExportError;
use crate::sequence::reverse_complement;
use crate::store::{SequenceStore, TranscriptStore};

const TRANSCRIPTS_BY_BIOTYPE: &str = r#"
    SELECT CAST(t.transcript_id AS SIGNED) AS transcript_id,
           t.stable_id,
           CAST(t.version AS SIGNED) AS version,
           t.biotype,
           sr.name AS seq_region,
           CAST(sr.seq_region_id AS SIGNED) AS seq_region_id,
           CAST(sr.length AS SIGNED) AS seq_region_length,
           CAST(t.seq_region_start AS SIGNED) AS seq_region_start,
           CAST(t.seq_region_end AS SIGNED) AS seq_region_end,
           CAST(t.seq_region_strand AS SIGNED) AS seq_region_strand
    FROM transcript t
    JOIN seq_region sr ON sr.seq_region_id = t.seq_region_id
    WHERE t.biotype = ?
    ORDER BY t.transcript_id
"#;

const EXONS_BY_TRANSCRIPT: &str = r#"
    SELECT CAST(e.seq_region_start AS SIGNED) AS seq_region_start,
           CAST(e.seq_region_end AS SIGNED) AS seq_region_end,
           CAST(e.seq_region_strand AS SIGNED) AS seq_region_strand
    FROM exon_transcript et
    JOIN exon e ON e.exon_id = et.exon_id
    WHERE et.transcript_id = ?
    ORDER BY et.`rank`
"#;

const SEQ_REGION_BY_NAME: &str = r#"
    SELECT CAST(sr.seq_region_id AS SIGNED) AS seq_region_id,
           CAST(sr.length AS SIGNED) AS length
    FROM seq_region sr
    JOIN coord_system cs ON cs.coord_system_id = sr.coord_system_id
    WHERE sr.name = ? AND FIND_IN_SET('default_version', cs.attrib) > 0
    ORDER BY cs.`rank`
    LIMIT 1
"#;

const DNA_SUBSTRING: &str = r#"
    SELECT SUBSTRING(d.sequence, ?, ?) AS sequence
    FROM dna d
    WHERE d.seq_region_id = ?
"#;

const ASSEMBLY_COMPONENTS: &str = r#"
    SELECT CAST(a.cmp_seq_region_id AS SIGNED) AS cmp_seq_region_id,
           CAST(a.asm_start AS SIGNED) AS asm_start,
           CAST(a.asm_end AS SIGNED) AS asm_end,
           CAST(a.cmp_start AS SIGNED) AS cmp_start,
           CAST(a.cmp_end AS SIGNED) AS cmp_end,
           CAST(a.ori AS SIGNED) AS ori
    FROM assembly a
    JOIN dna d ON d.seq_region_id = a.cmp_seq_region_id
    WHERE a.asm_seq_region_id = ? AND a.asm_start <= ? AND a.asm_end >= ?
    ORDER BY a.asm_start
"#;

pub struct EnsemblDb {
    pool: MySqlPool,
    runtime: Runtime,
    label: String,
    regions: RegionCache,
}

impl EnsemblDb {
    pub fn connect(label: &str, config: &DbConfig) -> Result<Self, ExportError> {
        let connection_error = |message: String| ExportError::Connection {
            store: label.to_string(),
            message,
        };
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| connection_error(err.to_string()))?;

        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .database(&config.dbname);
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        let pool = runtime
            .block_on(
                MySqlPoolOptions::new()
                    .max_connections(1)
                    .connect_with(options),
            )
            .map_err(|err| connection_error(err.to_string()))?;

        tracing::info!(
            store = label,
            host = %config.host,
            port = config.port,
            dbname = %config.dbname,
            "connected"
        );

        Ok(Self {
            pool,
            runtime,
            label: label.to_string(),
            regions: RegionCache::default(),
        })
    }

    fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    fn seq_region(&self, name: &str) -> Result<SeqRegion, ExportError> {
        if let Some(region) = self.regions.get(name) {
            return Ok(region);
        }
        let row = self
            .block_on(
                sqlx::query(SEQ_REGION_BY_NAME)
                    .bind(name)
                    .fetch_optional(&self.pool),
            )?
            .ok_or_else(|| ExportError::UnknownSeqRegion(format!("{name} in {}", self.label)))?;
        let region = SeqRegion {
            id: row.try_get("seq_region_id")?,
            length: row.try_get("length")?,
        };
        tracing::trace!(store = %self.label, name, id = region.id, "resolved seq region");
        Ok(self.regions.insert(name, region))
    }

    fn dna_substring(
        &self,
        seq_region_id: i64,
        interval: Interval,
    ) -> Result<Option<String>, ExportError> {
        let row = self.block_on(
            sqlx::query(DNA_SUBSTRING)
                .bind(interval.start)
                .bind(interval.len() as i64)
                .bind(seq_region_id)
                .fetch_optional(&self.pool),
        )?;
        match row {
            Some(row) => Ok(Some(row.try_get("sequence")?)),
            None => Ok(None),
        }
    }

    fn assembly_components(
        &self,
        asm_seq_region_id: i64,
        interval: Interval,
    ) -> Result<Vec<AssemblyComponent>, ExportError> {
        let rows = self.block_on(
            sqlx::query(ASSEMBLY_COMPONENTS)
                .bind(asm_seq_region_id)
                .bind(interval.end)
                .bind(interval.start)
                .fetch_all(&self.pool),
        )?;
        rows.iter()
            .map(|row| -> Result<AssemblyComponent, ExportError> {
                Ok(AssemblyComponent {
                    cmp_seq_region_id: row.try_get("cmp_seq_region_id")?,
                    asm: Interval::new(row.try_get("asm_start")?, row.try_get("asm_end")?),
                    cmp: Interval::new(row.try_get("cmp_start")?, row.try_get("cmp_end")?),
                    ori: row.try_get("ori")?,
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SeqRegion {
    id: i64,
    length: i64,
}

#[derive(Debug, Default)]
struct RegionCache {
    by_name: Mutex<HashMap<String, SeqRegion>>,
}

impl RegionCache {
    fn get(&self, name: &str) -> Option<SeqRegion> {
        self.lock().get(name).copied()
    }

    fn insert(&self, name: &str, region: SeqRegion) -> SeqRegion {
        *self.lock().entry(name.to_string()).or_insert(region)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SeqRegion>> {
        self.by_name
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssemblyComponent {
    pub cmp_seq_region_id: i64,
    pub asm: Interval,
    pub cmp: Interval,
    pub ori: i64,
}

impl AssemblyComponent {
    pub fn project(&self, interval: Interval) -> Option<(Interval, Interval)> {
        let start = interval.start.max(self.asm.start);
        let end = interval.end.min(self.asm.end);
        if end < start {
            return None;
        }
        let cmp = if self.ori < 0 {
            Interval::new(
                self.cmp.end - (end - self.asm.start),
                self.cmp.end - (start - self.asm.start),
            )
        } else {
            Interval::new(
                self.cmp.start + (start - self.asm.start),
                self.cmp.start + (end - self.asm.start),
            )
        };
        Some((Interval::new(start, end), cmp))
    }
}

pub fn stitch(interval: Interval, pieces: &[(i64, String)]) -> String {
    let len = interval.len() as usize;
    let mut out = vec![b'N'; len];
    for (start, seq) in pieces {
        let Ok(offset) = usize::try_from(start - interval.start) else {
            continue;
        };
        if offset >= len {
            continue;
        }
        let end = (offset + seq.len()).min(len);
        out[offset..end].copy_from_slice(&seq.as_bytes()[..end - offset]);
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[derive(Clone)]
pub struct EnsemblDnaStore {
    db: Arc<EnsemblDb>,
}

impl EnsemblDnaStore {
    pub fn new(db: Arc<EnsemblDb>) -> Self {
        Self { db }
    }

    fn forward_sequence(
        &self,
        region: SeqRegion,
        interval: Interval,
    ) -> Result<String, ExportError> {
        if let Some(seq) = self.db.dna_substring(region.id, interval)? {
            return Ok(seq);
        }

        let mut pieces = Vec::new();
        for component in self.db.assembly_components(region.id, interval)? {
            let Some((asm, cmp)) = component.project(interval) else {
                continue;
            };
            let Some(seq) = self.db.dna_substring(component.cmp_seq_region_id, cmp)? else {
                continue;
            };
            let seq = if component.ori < 0 {
                reverse_complement(&seq)
            } else {
                seq
            };
            pieces.push((asm.start, seq));
        }
        Ok(stitch(interval, &pieces))
    }
}

impl SequenceStore for EnsemblDnaStore {
    fn fetch_range(
        &self,
        seq_region: &str,
        interval: Interval,
        orientation: Orientation,
    ) -> Result<String, ExportError> {
        if interval.is_empty() {
            return Ok(String::new());
        }
        let region = self.db.seq_region(seq_region)?;
        let clipped = interval.clip(region.length);
        if clipped != interval {
            tracing::debug!(
                seq_region,
                requested = %interval,
                clipped = %clipped,
                "clipped to region"
            );
        }
        if clipped.is_empty() {
            return Ok(String::new());
        }
        let forward = self.forward_sequence(region, clipped)?;
        Ok(match orientation {
            Orientation::Forward => forward,
            Orientation::Reverse => reverse_complement(&forward),
        })
    }
}

pub struct EnsemblCoreStore<S: SequenceStore> {
    db: Arc<EnsemblDb>,
    dna: S,
}

impl<S: SequenceStore> EnsemblCoreStore<S> {
    pub fn new(db: Arc<EnsemblDb>, dna: S) -> Self {
        Self { db, dna }
    }

    fn exons(&self, transcript: &Transcript) -> Result<Vec<(Interval, Orientation)>, ExportError> {
        let rows = self.db.block_on(
            sqlx::query(EXONS_BY_TRANSCRIPT)
                .bind(transcript.dbid as i64)
                .fetch_all(&self.db.pool),
        )?;
        rows.iter()
            .map(|row| -> Result<(Interval, Orientation), ExportError> {
                let strand: i64 = row.try_get("seq_region_strand")?;
                let orientation = if strand < 0 {
                    Orientation::Reverse
                } else {
                    Orientation::Forward
                };
                Ok((
                    Interval::new(row.try_get("seq_region_start")?, row.try_get("seq_region_end")?),
                    orientation,
                ))
            })
            .collect()
    }
}

fn transcript_from_row(row: &MySqlRow) -> Result<Transcript, ExportError> {
    let dbid: i64 = row.try_get("transcript_id")?;
    let stable_id = row
        .try_get::<Option<String>, _>("stable_id")?
        .unwrap_or_else(|| dbid.to_string());
    let version = row
        .try_get::<Option<i64>, _>("version")?
        .and_then(|value| u32::try_from(value).ok());
    let raw_strand: i64 = row.try_get("seq_region_strand")?;
    let strand = Strand::from_db(raw_strand).ok_or_else(|| ExportError::InvalidStrand {
        stable_id: stable_id.clone(),
        strand: raw_strand,
    })?;

    Ok(Transcript {
        dbid: dbid as u64,
        stable_id,
        version,
        biotype: row.try_get("biotype")?,
        seq_region: row.try_get("seq_region")?,
        start: row.try_get("seq_region_start")?,
        end: row.try_get("seq_region_end")?,
        strand,
    })
}

impl<S: SequenceStore> TranscriptStore for EnsemblCoreStore<S> {
    fn fetch_by_biotype(&self, biotype: &str) -> Result<Vec<Transcript>, ExportError> {
        let rows = self.db.block_on(
            sqlx::query(TRANSCRIPTS_BY_BIOTYPE)
                .bind(biotype)
                .fetch_all(&self.db.pool),
        )?;
        rows.iter()
            .map(|row| -> Result<Transcript, ExportError> {
                let transcript = transcript_from_row(row)?;
                self.db.regions.insert(
                    &transcript.seq_region,
                    SeqRegion {
                        id: row.try_get("seq_region_id")?,
                        length: row.try_get("seq_region_length")?,
                    },
                );
                Ok(transcript)
            })
            .collect()
    }

    fn spliced_sequence(&self, transcript: &Transcript) -> Result<String, ExportError> {
        let mut spliced = String::new();
        for (interval, orientation) in self.exons(transcript)? {
            let exon = self
                .dna
                .fetch_range(&transcript.seq_region, interval, orientation)?;
            spliced.push_str(&exon);
        }
        Ok(spliced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(asm: (i64, i64), cmp: (i64, i64), ori: i64) -> AssemblyComponent {
        AssemblyComponent {
            cmp_seq_region_id: 7,
            asm: Interval::new(asm.0, asm.1),
            cmp: Interval::new(cmp.0, cmp.1),
            ori,
        }
    }

    #[test]
    fn project_forward_component() {
        let c = component((101, 200), (1, 100), 1);
        let (asm, cmp) = c.project(Interval::new(150, 250)).unwrap();
        assert_eq!(asm, Interval::new(150, 200));
        assert_eq!(cmp, Interval::new(50, 100));
    }

    #[test]
    fn project_reverse_component() {
        let c = component((101, 200), (1, 100), -1);
        let (asm, cmp) = c.project(Interval::new(101, 110)).unwrap();
        assert_eq!(asm, Interval::new(101, 110));
        assert_eq!(cmp, Interval::new(91, 100));
    }

    #[test]
    fn project_disjoint() {
        let c = component((101, 200), (1, 100), 1);
        assert!(c.project(Interval::new(1, 100)).is_none());
        assert!(c.project(Interval::new(201, 300)).is_none());
    }

    #[test]
    fn region_cache_keeps_first_resolution() {
        let cache = RegionCache::default();
        assert_eq!(cache.get("1"), None);
        let seeded = SeqRegion {
            id: 131,
            length: 248_956_422,
        };
        assert_eq!(cache.insert("1", seeded), seeded);
        let other = SeqRegion {
            id: 9,
            length: 10,
        };
        assert_eq!(cache.insert("1", other), seeded);
        assert_eq!(cache.get("1"), Some(seeded));
        assert_eq!(cache.get("X"), None);
    }

    #[test]
    fn stitch_pads_gaps_with_n() {
        let pieces = vec![(10, "ACG".to_string()), (15, "TT".to_string())];
        assert_eq!(stitch(Interval::new(10, 17), &pieces), "ACGNNTTN");
    }

    #[test]
    fn stitch_truncates_overhang() {
        let pieces = vec![(3, "ACGTACGT".to_string())];
        assert_eq!(stitch(Interval::new(1, 5), &pieces), "NNACG");
        assert_eq!(stitch(Interval::new(1, 0), &pieces), "");
    }
}
