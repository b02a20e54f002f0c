use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum_test::TestServer;
use movescan_core::{PipelineError, ScanOutput, ScannerBackend};
use movescan_server::{
    AppState, create_router,
    infra::config::{ConfigLoader, EnvConfig},
};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

/// Writes a fixed JSON report for any module directory.
#[derive(Debug)]
pub struct StaticScanner(pub &'static str);

#[async_trait]
impl ScannerBackend for StaticScanner {
    async fn run(&self, _input: &Path, output: &Path) -> movescan_core::Result<ScanOutput> {
        tokio::fs::write(output, self.0).await?;
        Ok(ScanOutput::default())
    }
}

/// Always reports a timeout.
#[allow(unused)]
#[derive(Debug)]
pub struct StalledScanner;

#[async_trait]
impl ScannerBackend for StalledScanner {
    async fn run(&self, _input: &Path, _output: &Path) -> movescan_core::Result<ScanOutput> {
        Err(PipelineError::ScanTimeout {
            timeout: std::time::Duration::from_millis(1),
        })
    }
}

#[allow(unused)]
pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub root: TempDir,
}

/// Server over an isolated storage root, configured purely from the given
/// environment values.
#[allow(unused)]
pub fn build_test_app(
    backend: Arc<dyn ScannerBackend>,
    extra_env: &[(&str, &str)],
) -> Result<TestApp> {
    let root = TempDir::new()?;
    let mut vars: Vec<(String, String)> = vec![(
        "STORAGE_ROOT".to_string(),
        root.path().display().to_string(),
    )];
    vars.extend(extra_env.iter().map(|(k, v)| (k.to_string(), v.to_string())));

    let env = EnvConfig::from_lookup(|name| {
        vars.iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    });
    let load = ConfigLoader::new().without_env_file().with_env(env).load()?;

    let state = AppState::with_backend(Arc::new(load.config), backend);
    let server = TestServer::builder()
        .build(create_router(state.clone()))
        .map_err(|err| anyhow!(err.to_string()))?;

    Ok(TestApp {
        server,
        state,
        root,
    })
}

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
