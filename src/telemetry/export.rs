use anyhow::{Context, Result};
use chrono::SecondsFormat;
use std::path::PathBuf;
use tracing::info;

use super::record::{ExportedTurn, SessionConfiguration, TelemetryRecord};
use crate::log::ConversationTurn;

/// Host-provided artifact delivery capability.
///
/// The exporter builds the bytes and the filename; how they reach the user
/// (directory write, download, upload) is the host's concern.
pub trait ArtifactSink: Send + Sync {
    fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<()>;
}

/// Sink that writes artifacts into a directory
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for DirectorySink {
    fn deliver(&self, filename: &str, bytes: &[u8]) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("Failed to create export directory: {:?}", self.dir))?;

        let path = self.dir.join(filename);
        std::fs::write(&path, bytes)
            .with_context(|| format!("Failed to write telemetry artifact: {:?}", path))?;

        info!("Telemetry artifact written: {}", path.display());

        Ok(())
    }
}

/// Build and deliver a telemetry artifact from the given snapshot.
///
/// Returns the generated filename. The snapshot is taken at call time from
/// the passed-in data; nothing is deferred or queued.
pub fn export(
    configuration: SessionConfiguration,
    tools: Vec<serde_json::Value>,
    turns: &[ConversationTurn],
    sink: &dyn ArtifactSink,
) -> Result<String> {
    let record = TelemetryRecord {
        configuration,
        tools,
        conversation: turns.iter().map(ExportedTurn::from).collect(),
    };

    let bytes = serde_json::to_vec_pretty(&record).context("Failed to serialize telemetry")?;
    let filename = artifact_filename(chrono::Utc::now());

    sink.deliver(&filename, &bytes)?;

    info!(
        "Exported telemetry: {} ({} turns)",
        filename,
        record.conversation.len()
    );

    Ok(filename)
}

/// `eburon-telemetry-<timestamp>.json` with colons and periods replaced by
/// dashes so the name is safe on every filesystem.
fn artifact_filename(now: chrono::DateTime<chrono::Utc>) -> String {
    let timestamp = now
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("eburon-telemetry-{}.json", timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn filename_has_no_colons_or_stray_dots() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 30, 45).unwrap();
        let name = artifact_filename(now);

        assert_eq!(name, "eburon-telemetry-2025-06-01T12-30-45-000Z.json");
        assert!(!name.contains(':'));
        assert_eq!(name.matches('.').count(), 1, "only the extension dot");
    }
}
