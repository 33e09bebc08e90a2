//! Writing downloaded bodies to the output directory

use futures::{Stream, StreamExt};
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

use crate::errors::PersistError;

/// Stream `body` into `<output_dir>/<local_name>.txt`, replacing any existing file.
///
/// The output directory must already exist.
pub async fn save<S, B, E>(body: S, output_dir: &Path, local_name: &str) -> Result<PathBuf, PersistError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Display,
{
    let path = output_dir.join(format!("{}.txt", local_name));
    let io_error = |source: std::io::Error| PersistError::Io {
        path: path.clone(),
        source,
    };

    let mut file = File::create(&path).await.map_err(io_error)?;
    let mut body = std::pin::pin!(body);

    while let Some(chunk) = body.next().await {
        let chunk = chunk.map_err(|e| PersistError::Body {
            path: path.clone(),
            message: e.to_string(),
        })?;
        file.write_all(chunk.as_ref()).await.map_err(io_error)?;
    }

    file.flush().await.map_err(io_error)?;
    Ok(path)
}
