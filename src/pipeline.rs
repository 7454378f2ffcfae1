//! Sequential fetch → normalize → label → write loop.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};

use crate::auth::{TokenProvider, MAIL_READ_SCOPE};
use crate::error::Result;
use crate::graph::{MessageFetcher, RecordCursor};
use crate::labeler::Labeler;
use crate::normalize;
use crate::sink::CsvSink;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub pages: usize,
    pub fetched: usize,
    /// Skipped records keyed by reason.
    pub skipped: BTreeMap<&'static str, usize>,
    pub written: usize,
    pub positive: usize,
}

impl RunStats {
    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Drain `cursor`, asking the operator about every record that survives
/// normalization and writing each answer before the next record is pulled.
///
/// The labeler call blocks the task until the operator answers.
pub async fn label_records<L, W>(
    cursor: &mut RecordCursor,
    labeler: &mut L,
    sink: &mut CsvSink<W>,
) -> Result<RunStats>
where
    L: Labeler + ?Sized,
    W: Write,
{
    let mut stats = RunStats::default();
    labeler.begin()?;

    while let Some(raw) = cursor.next_record().await? {
        stats.fetched += 1;
        let id = raw.id.clone();
        match normalize::classify(raw) {
            Err(reason) => {
                debug!(id = %id, reason = %reason, "Skipping message");
                *stats.skipped.entry(reason.as_str()).or_default() += 1;
            }
            Ok(record) => {
                let labeled = labeler.label(record)?;
                sink.write_row(&labeled)?;
                stats.written += 1;
                if labeled.label {
                    stats.positive += 1;
                }
            }
        }
    }

    stats.pages = cursor.pages_fetched();
    Ok(stats)
}

/// Full run: acquire a token, create `output`, then label everything `query_url`
/// returns. The token is obtained before the output file is touched.
pub async fn run<P, L>(
    provider: &P,
    fetcher: &MessageFetcher,
    query_url: &str,
    labeler: &mut L,
    output: &Path,
) -> Result<RunStats>
where
    P: TokenProvider + ?Sized,
    L: Labeler + ?Sized,
{
    let token = provider.acquire_token(&[MAIL_READ_SCOPE]).await?;
    let mut sink = CsvSink::create(output)?;
    let mut cursor = fetcher.fetch(query_url, token);

    let stats = label_records(&mut cursor, labeler, &mut sink).await?;
    sink.finish()?;

    info!(
        pages = stats.pages,
        fetched = stats.fetched,
        skipped = stats.skipped_total(),
        written = stats.written,
        positive = stats.positive,
        "Labelling run complete"
    );
    Ok(stats)
}
