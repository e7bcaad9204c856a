use std::io;
use std::io::SeekFrom;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures_util::stream::{unfold, Stream};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

/// Upper bound on a single read, independent of the requested range size.
pub const CHUNK_SIZE: u64 = 64 * 1024;

/// A read that stalls this long ends the stream, so a hung disk or client
/// cannot pin the file handle forever.
pub const READ_TIMEOUT: Duration = Duration::from_secs(30);

pub struct AudioSource {
    pub file: File,
    pub size: u64,
}

/// Opens the audio file and reads its current size. The open itself is the
/// existence check; callers map failure to a not-found response.
pub async fn open_audio(path: &Path) -> io::Result<AudioSource> {
    let file = File::open(path).await?;
    let size = file.metadata().await?.len();
    Ok(AudioSource { file, size })
}

/// Byte window `[start, start + len)` of `file` as a chunked stream.
pub async fn slice_stream(
    mut file: File,
    start: u64,
    len: u64,
) -> io::Result<impl Stream<Item = Result<Bytes, io::Error>>> {
    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }
    Ok(byte_stream(file, len))
}

/// Reads `len` bytes in chunks of at most `CHUNK_SIZE`, each read bounded by
/// `READ_TIMEOUT`. The file handle lives inside the stream state, so
/// dropping the stream (client disconnect included) releases it.
pub fn byte_stream(file: File, len: u64) -> impl Stream<Item = Result<Bytes, io::Error>> {
    unfold((file, len), |(mut file, remaining)| async move {
        if remaining == 0 {
            return None;
        }
        let chunk = remaining.min(CHUNK_SIZE) as usize;
        let mut buf = vec![0u8; chunk];
        match tokio::time::timeout(READ_TIMEOUT, file.read(&mut buf)).await {
            Err(_) => {
                let err = io::Error::new(io::ErrorKind::TimedOut, "audio read timed out");
                Some((Err(err), (file, 0)))
            }
            Ok(Err(err)) => Some((Err(err), (file, 0))),
            Ok(Ok(0)) => None,
            Ok(Ok(read)) => {
                buf.truncate(read);
                Some((Ok(Bytes::from(buf)), (file, remaining - read as u64)))
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{byte_stream, open_audio, slice_stream, CHUNK_SIZE};
    use futures_util::StreamExt;
    use std::io::Write;

    fn write_fixture(len: usize) -> (tempfile::TempDir, std::path::PathBuf, Vec<u8>) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("track.mp3");
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&data).unwrap();
        (dir, path, data)
    }

    async fn collect(
        stream: impl futures_util::Stream<Item = Result<bytes::Bytes, std::io::Error>>,
    ) -> Vec<u8> {
        let chunks: Vec<_> = stream.collect().await;
        let mut out = Vec::new();
        for chunk in chunks {
            let chunk = chunk.unwrap();
            assert!(chunk.len() as u64 <= CHUNK_SIZE);
            out.extend_from_slice(&chunk);
        }
        out
    }

    #[tokio::test]
    async fn full_stream_returns_whole_file() {
        let (_dir, path, data) = write_fixture(200_000);
        let source = open_audio(&path).await.unwrap();
        assert_eq!(source.size, 200_000);
        let body = collect(byte_stream(source.file, source.size)).await;
        assert_eq!(body, data);
    }

    #[tokio::test]
    async fn slice_stream_returns_exact_window() {
        let (_dir, path, data) = write_fixture(200_000);
        let source = open_audio(&path).await.unwrap();
        let stream = slice_stream(source.file, 1_000, 150_000).await.unwrap();
        let body = collect(stream).await;
        assert_eq!(body, &data[1_000..151_000]);
    }

    #[tokio::test]
    async fn zero_length_slice_is_empty() {
        let (_dir, path, _) = write_fixture(1_000);
        let source = open_audio(&path).await.unwrap();
        let stream = slice_stream(source.file, 10, 0).await.unwrap();
        let body = collect(stream).await;
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gone.mp3");
        assert!(open_audio(&path).await.is_err());
    }
}
