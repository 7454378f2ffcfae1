use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::config::TimeWindow;
use crate::error::Result;
use crate::pipeline::RunStats;

/// JSON summary of a completed run, written next to the CSV on request.
#[derive(Debug, Serialize)]
pub struct Manifest {
    pub run_id: Uuid,
    pub output: String,
    pub window: TimeWindow,
    pub stats: RunStats,
    pub duration_s: f64,
    pub csv_sha256: String,
    pub version: String,
}

impl Manifest {
    pub fn new(
        run_id: Uuid,
        output: &Path,
        window: TimeWindow,
        stats: RunStats,
        duration_s: f64,
    ) -> Result<Self> {
        Ok(Self {
            run_id,
            output: output.display().to_string(),
            window,
            stats,
            duration_s,
            csv_sha256: sha256_file(output)?,
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_vec_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        File::create(path)?.write_all(&json)?;
        Ok(())
    }
}

pub fn sha256_file(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}
