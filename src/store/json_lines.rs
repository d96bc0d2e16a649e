//! File-backed store writing one JSON object per line.
//!
//! ```text
//! {"agency":"1","first_name":"Santiago","last_name":"Lorca","document":"30904465","birthdate":"1999-03-17","number":7574}
//! ```

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use super::{BetStore, BoxFuture};
use crate::bet::Bet;
use crate::error::{LotteryError, Result};

/// Bet store appending to a JSON-lines file.
#[derive(Debug, Clone)]
pub struct JsonLinesStore {
    path: PathBuf,
}

impl JsonLinesStore {
    /// Create a store for `path`. The file is created on first append.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_lines(&self, bets: &[Bet]) -> Result<()> {
        // Serialize everything first so a bad record leaves the file untouched.
        let mut buf = Vec::new();
        for bet in bets {
            serde_json::to_writer(&mut buf, bet)?;
            buf.push(b'\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }

    async fn read_lines(&self) -> Result<Vec<Bet>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        contents
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(LotteryError::from))
            .collect()
    }
}

impl BetStore for JsonLinesStore {
    fn append<'a>(&'a self, bets: &'a [Bet]) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.append_lines(bets)
                .await
                .map_err(|e| LotteryError::Store(format!("append to {}: {e}", self.path.display())))
        })
    }

    fn load(&self) -> BoxFuture<'_, Result<Vec<Bet>>> {
        Box::pin(async move {
            self.read_lines()
                .await
                .map_err(|e| LotteryError::Store(format!("load from {}: {e}", self.path.display())))
        })
    }
}
