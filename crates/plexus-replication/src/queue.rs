//! Offline delta queue with an optional JSON-lines write-ahead log.

use crate::error::Result;
use plexus_graph::GraphDelta;
use std::collections::VecDeque;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// FIFO of deltas produced while no online channel was reachable.
///
/// With a log path, every queued delta is appended as one JSON line before it
/// is acknowledged, the log is reloaded on open, and it is rewritten whenever
/// deltas leave the queue.
#[derive(Debug, Default)]
pub struct OfflineQueue {
    entries: VecDeque<GraphDelta>,
    wal: Option<PathBuf>,
}

impl OfflineQueue {
    /// Queue that lives only in memory.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open (or create) a log-backed queue, replaying any deltas left over
    /// from a previous run.
    ///
    /// Lines that fail to parse are skipped with a warning.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut entries = VecDeque::new();
        if path.exists() {
            let reader = BufReader::new(File::open(&path)?);
            for (line_no, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<GraphDelta>(&line) {
                    Ok(delta) => entries.push_back(delta),
                    Err(e) => warn!(path = %path.display(), line = line_no + 1, error = %e, "Skipping corrupt queue entry"),
                }
            }
        }

        if !entries.is_empty() {
            debug!(path = %path.display(), queued = entries.len(), "Replayed offline queue");
        }

        Ok(Self { entries, wal: Some(path) })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn front(&self) -> Option<&GraphDelta> {
        self.entries.front()
    }

    /// Snapshot of the queued deltas, oldest first.
    pub fn to_vec(&self) -> Vec<GraphDelta> {
        self.entries.iter().cloned().collect()
    }

    /// Append a delta.
    ///
    /// The delta is always kept in memory; an error only means the log
    /// append failed.
    pub fn push(&mut self, delta: GraphDelta) -> Result<()> {
        let appended = match &self.wal {
            Some(path) => append_line(path, &delta),
            None => Ok(()),
        };
        self.entries.push_back(delta);
        appended
    }

    /// Drop the `count` oldest deltas after they were delivered.
    pub fn acknowledge(&mut self, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let count = count.min(self.entries.len());
        self.entries.drain(..count);
        self.rewrite()
    }

    /// Discard everything, truncating the log.
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.rewrite()
    }

    fn rewrite(&self) -> Result<()> {
        let Some(path) = &self.wal else {
            return Ok(());
        };

        let tmp = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            for delta in &self.entries {
                serde_json::to_writer(&mut writer, delta)?;
                writeln!(writer)?;
            }
            writer.flush()?;
        }
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn append_line(path: &Path, delta: &GraphDelta) -> Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, delta)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn delta(edge: &str) -> GraphDelta {
        GraphDelta::new("alpha").with_removed_edge(edge)
    }

    #[test]
    fn fifo_order_and_acknowledge() {
        let mut queue = OfflineQueue::in_memory();
        queue.push(delta("a->b")).unwrap();
        queue.push(delta("b->c")).unwrap();
        queue.push(delta("c->d")).unwrap();

        queue.acknowledge(2).unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.front().unwrap().removed_edges, vec!["c->d".to_string()]);

        queue.acknowledge(10).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn log_survives_reopen() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join("queue.jsonl");

        {
            let mut queue = OfflineQueue::open(&path)?;
            queue.push(delta("a->b"))?;
            queue.push(delta("b->c"))?;
            queue.push(delta("c->d"))?;
            queue.acknowledge(1)?;
        }

        let reopened = OfflineQueue::open(&path)?;
        let edges: Vec<_> = reopened
            .to_vec()
            .into_iter()
            .flat_map(|d| d.removed_edges)
            .collect();
        assert_eq!(edges, vec!["b->c".to_string(), "c->d".to_string()]);
        Ok(())
    }

    #[test]
    fn clear_truncates_log() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("queue.jsonl");

        let mut queue = OfflineQueue::open(&path)?;
        queue.push(delta("a->b"))?;
        queue.clear()?;

        assert!(queue.is_empty());
        assert_eq!(fs::read_to_string(&path)?, "");
        assert!(OfflineQueue::open(&path)?.is_empty());
        Ok(())
    }

    #[test]
    fn corrupt_lines_are_skipped() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("queue.jsonl");
        let good = serde_json::to_string(&delta("a->b"))?;
        fs::write(&path, format!("{good}\nnot json\n\n{good}\n"))?;

        let queue = OfflineQueue::open(&path)?;
        assert_eq!(queue.len(), 2);
        Ok(())
    }
}
