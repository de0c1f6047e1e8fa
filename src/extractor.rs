// Identifier Extractor
// Reads lines sequentially, parses each one in its own task, and collects
// outcomes in line order regardless of which task finishes first

use crate::error::ExtractError;
use crate::parser::{decode_line, CompositeKeyParser, LineOutcome, LineParser};
use futures::stream::{FuturesOrdered, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Knobs for a single extraction run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Stop after this many identifiers (0 = no limit)
    #[serde(default)]
    pub max_results: usize,

    /// Cap on lines dispatched but not yet collected (0 = no cap)
    #[serde(default)]
    pub max_in_flight: usize,

    /// Leading lines to skip without parsing (export banners, headers)
    #[serde(default)]
    pub skip_lines: usize,
}

impl ExtractConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: limit the number of identifiers returned
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Builder pattern: bound the number of outstanding parse tasks
    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight;
        self
    }

    /// Builder pattern: skip leading lines
    pub fn with_skip_lines(mut self, skip_lines: usize) -> Self {
        self.skip_lines = skip_lines;
        self
    }

    fn has_capacity(&self, in_flight: usize) -> bool {
        self.max_in_flight == 0 || in_flight < self.max_in_flight
    }
}

// ============================================================================
// COLLECTOR
// ============================================================================

/// Per-run tallies, logged when an extraction finishes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractSummary {
    pub dispatched: usize,
    pub matched: usize,
    pub foreign: usize,
    pub defects: usize,
}

/// Sole owner of the result list. Fed one outcome per line, in line order.
struct Collector {
    limit: usize,
    identifiers: Vec<String>,
    summary: ExtractSummary,
    next_line: usize,
}

impl Collector {
    fn new(limit: usize) -> Self {
        Collector {
            limit,
            identifiers: Vec::new(),
            summary: ExtractSummary::default(),
            next_line: 0,
        }
    }

    fn accept(&mut self, line: usize, outcome: LineOutcome) {
        debug_assert_eq!(line, self.next_line, "outcomes must arrive in line order");
        self.next_line = line + 1;

        match outcome {
            LineOutcome::Match(id) => {
                self.summary.matched += 1;
                self.identifiers.push(id);
            }
            LineOutcome::Foreign => self.summary.foreign += 1,
            LineOutcome::Defect(defect) => {
                self.summary.defects += 1;
                warn!(line = line + 1, error = %defect, "Skipping feed line");
            }
        }
    }

    fn is_satisfied(&self) -> bool {
        self.limit > 0 && self.identifiers.len() >= self.limit
    }
}

// ============================================================================
// EXTRACTOR
// ============================================================================

/// Concurrent, order-preserving identifier extractor
///
/// Every line read from the input is handed to a spawned tokio task. The
/// task handles are queued in a `FuturesOrdered`, which yields results in
/// push order, so the collector sees line 1, line 2, ... no matter how the
/// tasks were scheduled.
///
/// Must be called from within a tokio runtime.
///
/// # Example:
/// ```no_run
/// # async fn demo() -> Result<(), patent_feed::ExtractError> {
/// use patent_feed::{CompositeKeyParser, ExtractConfig, Extractor};
///
/// let feed: &[u8] = b"US-7650331-B1,Widget\nEP-1234567-A1,Gadget\n";
/// let extractor = Extractor::new(CompositeKeyParser::new("US"))
///     .with_config(ExtractConfig::new().with_max_results(10));
/// let ids = extractor.extract(feed).await?;
/// assert_eq!(ids, vec!["7650331"]);
/// # Ok(())
/// # }
/// ```
pub struct Extractor<P = CompositeKeyParser> {
    parser: Arc<P>,
    config: ExtractConfig,
}

impl<P: LineParser> Extractor<P> {
    pub fn new(parser: P) -> Self {
        Extractor {
            parser: Arc::new(parser),
            config: ExtractConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ExtractConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract identifiers from a line source.
    ///
    /// # Returns
    /// * `Ok(Vec<String>)` - identifiers in input order, at most
    ///   `max_results` of them when a limit is set
    /// * `Err(ExtractError)` - the stream failed or a task died; nothing
    ///   collected so far is returned
    pub async fn extract<R>(&self, reader: R) -> Result<Vec<String>, ExtractError>
    where
        R: AsyncBufRead + Unpin,
    {
        self.extract_with_summary(reader)
            .await
            .map(|(identifiers, _)| identifiers)
    }

    /// Same as [`Extractor::extract`], also returning the per-run tallies
    pub async fn extract_with_summary<R>(
        &self,
        reader: R,
    ) -> Result<(Vec<String>, ExtractSummary), ExtractError>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut reader = reader;
        let mut buf: Vec<u8> = Vec::new();
        let mut pending: FuturesOrdered<JoinHandle<(usize, LineOutcome)>> = FuturesOrdered::new();
        let mut collector = Collector::new(self.config.max_results);
        let mut skipped = 0usize;
        let mut exhausted = false;

        loop {
            let can_read = !exhausted && self.config.has_capacity(pending.len());
            if !can_read && pending.is_empty() {
                break;
            }

            tokio::select! {
                // Drain finished lines first so a satisfied limit stops
                // dispatch as early as possible
                biased;

                Some(joined) = pending.next(), if !pending.is_empty() => {
                    let (line, outcome) = joined?;
                    collector.accept(line, outcome);
                    if collector.is_satisfied() {
                        break;
                    }
                }

                // A cancelled read leaves its partial bytes in `buf`; the
                // next call appends to them
                read = reader.read_until(b'\n', &mut buf), if can_read => {
                    read.map_err(ExtractError::StreamRead)?;

                    if buf.is_empty() {
                        exhausted = true;
                    } else if skipped < self.config.skip_lines {
                        skipped += 1;
                        buf.clear();
                    } else {
                        let raw = std::mem::take(&mut buf);
                        let line = collector.summary.dispatched;
                        collector.summary.dispatched += 1;
                        let parser = Arc::clone(&self.parser);
                        pending.push_back(tokio::spawn(async move {
                            let outcome = match decode_line(&raw) {
                                Ok(text) => parser.parse_line(&text),
                                Err(defect) => LineOutcome::Defect(defect),
                            };
                            (line, outcome)
                        }));
                    }
                }

                else => break,
            }
        }

        // Anything still pending is past the limit; those tasks run to
        // completion detached and their outcomes are dropped
        let summary = collector.summary;
        debug!(
            dispatched = summary.dispatched,
            matched = summary.matched,
            foreign = summary.foreign,
            defects = summary.defects,
            discarded = pending.len(),
            returned = collector.identifiers.len(),
            "Extraction finished"
        );

        Ok((collector.identifiers, summary))
    }
}

/// Extract up to `max_results` identifiers for `jurisdiction` (0 = all)
pub async fn extract<R>(
    reader: R,
    jurisdiction: &str,
    max_results: usize,
) -> Result<Vec<String>, ExtractError>
where
    R: AsyncBufRead + Unpin,
{
    Extractor::new(CompositeKeyParser::new(jurisdiction))
        .with_config(ExtractConfig::new().with_max_results(max_results))
        .extract(reader)
        .await
}
