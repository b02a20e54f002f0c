use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use movescan_core::{Result, ScanOutput, ScannerBackend};
use zip::write::SimpleFileOptions;

/// Build a zip archive in memory. Entries ending in `/` become directories.
#[allow(unused)]
pub fn zip_bytes(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for (name, contents) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(contents.as_bytes()).unwrap();
        }
    }
    writer.finish().unwrap().into_inner()
}

/// Writes a small JSON report naming the module directory and the module
/// files it saw, counting every invocation.
#[derive(Debug, Default)]
pub struct RecordingScanner {
    calls: Arc<AtomicUsize>,
}

#[allow(unused)]
impl RecordingScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl ScannerBackend for RecordingScanner {
    async fn run(&self, input: &Path, output: &Path) -> Result<ScanOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut modules: Vec<String> = std::fs::read_dir(input)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        modules.sort();

        let report = serde_json::json!({
            "module_dir": input.file_name().map(|n| n.to_string_lossy().into_owned()),
            "modules": modules,
        });
        tokio::fs::write(output, serde_json::to_vec(&report).unwrap()).await?;
        Ok(ScanOutput::default())
    }
}
