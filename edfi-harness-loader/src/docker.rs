use edfi_harness_runtime::spawn_blocking;
use edfi_harness_types::{ProcessStats, ResourceSnapshot, StatsErr, Timestamp};
use std::process::Command;

#[derive(Debug, Clone)]
/// Samples a container with `docker stats --no-stream <container>`.
pub struct DockerStats {
    program: String,
}

impl Default for DockerStats {
    fn default() -> Self {
        Self::new()
    }
}

impl DockerStats {
    pub fn new() -> Self {
        Self::with_program("docker")
    }

    /// Use another docker-compatible CLI, e.g. `podman`.
    pub fn with_program<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl ProcessStats for DockerStats {
    async fn capture(&self, process: &str) -> Result<ResourceSnapshot, StatsErr> {
        let program = self.program.clone();
        let process = process.to_owned();
        spawn_blocking(move || docker_stats(&program, &process))
            .await
            .map_err(|e| StatsErr::Runtime(e.to_string()))?
    }
}

fn docker_stats(program: &str, process: &str) -> Result<ResourceSnapshot, StatsErr> {
    let output = Command::new(program)
        .args(["stats", "--no-stream", process])
        .output()
        .map_err(StatsErr::Spawn)?;
    let taken_at = Timestamp::now_utc();
    if !output.status.success() {
        return Err(StatsErr::ExitStatus {
            process: process.to_owned(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
        });
    }
    ResourceSnapshot::parse(process, taken_at, &String::from_utf8_lossy(&output.stdout))
}
