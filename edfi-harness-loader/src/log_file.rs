use edfi_harness_runtime::{
    file::{AsyncWriteExt, OpenOptions},
    spawn_task, TaskHandle,
};
use edfi_harness_types::{BatchResult, ResourceSnapshot, RESULT_LOG_HEADER};
use flume::{unbounded, Sender};
use std::{
    io,
    path::{Path, PathBuf},
};

#[derive(Debug)]
enum Entry {
    Line(String),
    Snapshot(ResourceSnapshot),
}

/// A file truncated on creation, then appended to by a single writer task.
///
/// Entries are written in the order they arrive. Any number of [`LogSender`]s may feed the same file.
#[derive(Debug)]
pub struct LogFile {
    path: PathBuf,
    sender: LogSender,
    task: TaskHandle<io::Result<usize>>,
}

#[derive(Debug, Clone)]
/// Cloneable handle to the writer task of a [`LogFile`]. Sending never blocks.
pub struct LogSender {
    sender: Sender<Entry>,
}

impl LogFile {
    /// The result log of a batch: the header `from_offset,size,response_time`, then one row per success.
    pub async fn result_log(path: impl Into<PathBuf>) -> io::Result<Self> {
        let log = Self::create(path.into()).await?;
        log.sender.send(Entry::Line(RESULT_LOG_HEADER.to_owned()));
        Ok(log)
    }

    /// The snapshot log of a batch. The first snapshot written contributes the header of the stats tool;
    /// every snapshot contributes its rows.
    pub async fn snapshot_log(path: impl Into<PathBuf>) -> io::Result<Self> {
        Self::create(path.into()).await
    }

    async fn create(path: PathBuf) -> io::Result<Self> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .await?;
        let (sender, pending) = unbounded();
        let display = path.display().to_string();

        let task = spawn_task(async move {
            let mut lines = 0;
            let mut has_header = false;
            while let Ok(entry) = pending.recv_async().await {
                let mut text = String::new();
                match entry {
                    Entry::Line(line) => push_line(&mut text, &line, &mut lines),
                    Entry::Snapshot(snapshot) => {
                        if !has_header {
                            push_line(&mut text, snapshot.header(), &mut lines);
                            has_header = true;
                        }
                        for row in snapshot.rows() {
                            push_line(&mut text, row, &mut lines);
                        }
                    }
                }
                file.write_all(text.as_bytes()).await?;
                file.flush().await?;
            }
            log::debug!("LogFile task finish ({display})");
            Ok::<_, io::Error>(lines)
        });

        Ok(Self {
            path,
            sender: LogSender { sender },
            task,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sender(&self) -> LogSender {
        self.sender.clone()
    }

    /// Wait for every entry sent so far to be written. Returns the number of lines in the file.
    ///
    /// Entries sent through a [`LogSender`] still alive after this point are lost.
    pub async fn close(self) -> io::Result<usize> {
        let Self { path, sender, task } = self;
        drop(sender);
        match task.await {
            Ok(written) => written,
            Err(e) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("Writer of {} failed: {e}", path.display()),
            )),
        }
    }
}

fn push_line(text: &mut String, line: &str, lines: &mut usize) {
    text.push_str(line);
    text.push('\n');
    *lines += 1;
}

impl LogSender {
    pub fn result(&self, result: &BatchResult) {
        self.send(Entry::Line(result.to_log_row()));
    }

    pub fn snapshot(&self, snapshot: ResourceSnapshot) {
        self.send(Entry::Snapshot(snapshot));
    }

    fn send(&self, entry: Entry) {
        if let Err(e) = self.sender.send(entry) {
            log::warn!("Log writer is gone, dropped {:?}", e.into_inner());
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use edfi_harness_types::{RequestDescriptor, Response, Timestamp};
    use std::time::Duration;

    fn temp_file(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("edfi-harness-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn test_result_log() -> io::Result<()> {
        let path = temp_file("result-log.csv");
        std::fs::write(&path, "stale\nstale\n")?;

        let log = LogFile::result_log(&path).await?;
        let sender = log.sender();
        for offset in [10, 20] {
            sender.result(&BatchResult::new(
                RequestDescriptor::new(offset, 1).unwrap(),
                0,
                Duration::from_millis(250),
                Response::Empty,
            ));
        }
        drop(sender);
        assert_eq!(log.close().await?, 3);

        let text = std::fs::read_to_string(&path)?;
        assert_eq!(text, "from_offset,size,response_time\n10,1,0.25\n20,1,0.25\n");
        std::fs::remove_file(&path)
    }

    #[tokio::test]
    async fn test_snapshot_log() -> io::Result<()> {
        let path = temp_file("snapshot-log.txt");
        let log = LogFile::snapshot_log(&path).await?;
        for cpu in ["1.00%", "2.00%"] {
            let output = format!("NAME   CPU %\nopensearch   {cpu}\n");
            log.sender().snapshot(
                ResourceSnapshot::parse("opensearch", Timestamp::now_utc(), &output).unwrap(),
            );
        }
        assert_eq!(log.close().await?, 3);

        let text = std::fs::read_to_string(&path)?;
        assert_eq!(
            text,
            "NAME   CPU %\nopensearch   1.00%\nopensearch   2.00%\n"
        );
        std::fs::remove_file(&path)
    }
}
