//! Chained external process execution.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use tokio::process::{Child, ChildStdout, Command};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::error::ProcessError;

/// Maximum number of stages a pipeline may hold.
pub const MAX_STAGES: usize = 3;

/// Where a stage reads its stdin from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageInput {
    /// `/dev/null`.
    Null,
    /// The previous stage's stdout, through an anonymous pipe.
    Previous,
}

/// Where a stage writes its stdout to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutput {
    /// Discarded.
    Discard,
    /// The next stage's stdin, through an anonymous pipe.
    Next,
    /// Collected and returned from [`ProcessPipeline::run`].
    Capture,
}

/// One external process invocation.
#[derive(Debug, Clone)]
pub struct Stage {
    program: PathBuf,
    args: Vec<String>,
    stdin: StageInput,
    stdout: StageOutput,
}

impl Stage {
    /// Creates a stage with null stdin and discarded stdout.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: StageInput::Null,
            stdout: StageOutput::Discard,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Adds a path argument.
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy())
    }

    /// Reads stdin from the previous stage.
    pub fn stdin_from_previous(mut self) -> Self {
        self.stdin = StageInput::Previous;
        self
    }

    /// Pipes stdout into the next stage.
    pub fn stdout_to_next(mut self) -> Self {
        self.stdout = StageOutput::Next;
        self
    }

    /// Captures stdout for the caller.
    pub fn capture_stdout(mut self) -> Self {
        self.stdout = StageOutput::Capture;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.args
    }

    pub fn input(&self) -> StageInput {
        self.stdin
    }

    pub fn output(&self) -> StageOutput {
        self.stdout
    }

    /// Short program name for logs and errors.
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.to_string_lossy().into_owned())
    }
}

/// Temporary files removed when dropped, whatever the outcome.
#[derive(Debug, Default)]
pub struct TempFiles {
    paths: Vec<PathBuf>,
}

impl TempFiles {
    pub fn push(&mut self, path: PathBuf) {
        self.paths.push(path);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Drop for TempFiles {
    fn drop(&mut self) {
        for path in &self.paths {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to remove temp file {}: {}", path.display(), e);
                }
            }
        }
    }
}

/// An ordered list of 1-3 process stages plus the temp files they produce.
///
/// Consecutive stages joined by `stdout_to_next` / `stdin_from_previous`
/// run concurrently as one chain; otherwise stages run one after another.
/// Every stage's exit status is checked. Temp files are deleted and running
/// children killed on every exit path, including cancellation.
#[derive(Debug, Default)]
pub struct ProcessPipeline {
    stages: Vec<Stage>,
    temp_files: TempFiles,
}

impl ProcessPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage.
    pub fn stage(mut self, stage: Stage) -> Self {
        self.stages.push(stage);
        self
    }

    /// Registers a temp file to delete at teardown.
    pub fn temp_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_files.push(path.into());
        self
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn temp_files(&self) -> &[PathBuf] {
        self.temp_files.paths()
    }

    /// Checks that stage wiring is consistent.
    pub fn validate(&self) -> Result<(), ProcessError> {
        if self.stages.is_empty() || self.stages.len() > MAX_STAGES {
            return Err(ProcessError::InvalidWiring(format!(
                "expected 1 to {} stages, got {}",
                MAX_STAGES,
                self.stages.len()
            )));
        }

        for (idx, stage) in self.stages.iter().enumerate() {
            let next_reads = self
                .stages
                .get(idx + 1)
                .map(|next| next.stdin == StageInput::Previous)
                .unwrap_or(false);
            let writes_next = stage.stdout == StageOutput::Next;
            if writes_next != next_reads {
                return Err(ProcessError::InvalidWiring(format!(
                    "stage {} ({}) stdout and stage {} stdin do not match",
                    idx + 1,
                    stage.program_name(),
                    idx + 2
                )));
            }
        }

        if self.stages[0].stdin == StageInput::Previous {
            return Err(ProcessError::InvalidWiring(
                "first stage cannot read from a previous stage".to_string(),
            ));
        }

        Ok(())
    }

    /// Runs all stages and returns the stdout captured by the final stage
    /// (empty unless it used [`Stage::capture_stdout`]).
    pub async fn run(self, cancel: &CancellationToken) -> Result<Vec<u8>, ProcessError> {
        self.validate()?;

        let Self { stages, temp_files } = self;
        let mut output = Vec::new();
        let mut start = 0;

        while start < stages.len() {
            let mut end = start;
            while stages[end].stdout == StageOutput::Next {
                end += 1;
            }
            output = run_chain(&stages[start..=end], cancel).await?;
            start = end + 1;
        }

        drop(temp_files);
        Ok(output)
    }
}

/// Spawns a chain of piped stages and waits for all of them.
///
/// The last stage is awaited first so that an upstream stage blocked on a
/// full pipe cannot stall the wait.
async fn run_chain(chain: &[Stage], cancel: &CancellationToken) -> Result<Vec<u8>, ProcessError> {
    if cancel.is_cancelled() {
        return Err(ProcessError::Cancelled);
    }

    let mut children: Vec<(String, Child)> = Vec::with_capacity(chain.len());
    let mut upstream: Option<ChildStdout> = None;

    for (pos, stage) in chain.iter().enumerate() {
        let is_last = pos + 1 == chain.len();
        let name = stage.program_name();
        debug!("Running {} {}", name, stage.args.join(" "));

        let mut command = Command::new(&stage.program);
        command.args(&stage.args).kill_on_drop(true);

        match stage.stdin {
            StageInput::Null => {
                command.stdin(Stdio::null());
            }
            StageInput::Previous => {
                let pipe = upstream.take().ok_or_else(|| {
                    ProcessError::InvalidWiring(format!("{} has no upstream stage", name))
                })?;
                let stdin: Stdio = pipe.try_into()?;
                command.stdin(stdin);
            }
        }

        command.stdout(match stage.stdout {
            StageOutput::Discard => Stdio::null(),
            StageOutput::Next | StageOutput::Capture => Stdio::piped(),
        });
        command.stderr(if is_last { Stdio::piped() } else { Stdio::null() });

        let mut child = command.spawn().map_err(|source| ProcessError::Spawn {
            program: name.clone(),
            source,
        })?;
        // The command still holds our copy of the upstream read end; drop it
        // now so the child sees EOF when the writer exits.
        drop(command);

        if stage.stdout == StageOutput::Next {
            upstream = child.stdout.take();
        }
        children.push((name, child));
    }

    let wait = async move {
        let Some((last_name, last)) = children.pop() else {
            return Ok(Vec::new());
        };

        let output = last.wait_with_output().await?;
        check_status(&last_name, output.status, Some(&output.stderr))?;

        for (name, mut child) in children.into_iter().rev() {
            let status = child.wait().await?;
            check_status(&name, status, None)?;
        }

        Ok(output.stdout)
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ProcessError::Cancelled),
        result = wait => result,
    }
}

fn check_status(program: &str, status: ExitStatus, stderr: Option<&[u8]>) -> Result<(), ProcessError> {
    if status.success() {
        return Ok(());
    }

    let stderr = stderr
        .map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .filter(|s| !s.is_empty());

    Err(ProcessError::Failed {
        program: program.to_string(),
        code: status.code(),
        stderr,
    })
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn sh(script: &str) -> Stage {
        Stage::new("sh").args(["-c", script])
    }

    #[tokio::test]
    async fn test_single_stage_capture() {
        let pipeline = ProcessPipeline::new().stage(sh("printf hello").capture_stdout());
        let out = pipeline.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(out, b"hello");
    }

    #[tokio::test]
    async fn test_two_stage_pipe() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out.txt");

        let pipeline = ProcessPipeline::new()
            .stage(sh("printf 'raw audio'").stdout_to_next())
            .stage(
                Stage::new("sh")
                    .args(["-c", "tr a-z A-Z > \"$0\""])
                    .path_arg(&target)
                    .stdin_from_previous(),
            );
        pipeline.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "RAW AUDIO");
    }

    #[tokio::test]
    async fn test_large_stream_does_not_deadlock() {
        // Well above a pipe buffer.
        let pipeline = ProcessPipeline::new()
            .stage(sh("head -c 2000000 /dev/zero").stdout_to_next())
            .stage(sh("wc -c").stdin_from_previous().capture_stdout());
        let out = pipeline.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(String::from_utf8_lossy(&out).trim(), "2000000");
    }

    #[tokio::test]
    async fn test_sequential_stages_then_remux_style() {
        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join("_tmp_a.wav");
        let target = dir.path().join("a.m4a");

        let pipeline = ProcessPipeline::new()
            .stage(Stage::new("sh").args(["-c", "printf data > \"$0\""]).path_arg(&tmp))
            .stage(
                Stage::new("sh")
                    .args(["-c", "cp \"$0\" \"$1\""])
                    .path_arg(&tmp)
                    .path_arg(&target),
            )
            .temp_file(&tmp);
        pipeline.run(&CancellationToken::new()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "data");
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn test_non_zero_exit_fails() {
        let pipeline = ProcessPipeline::new().stage(sh("echo broken >&2; exit 3"));
        let err = pipeline.run(&CancellationToken::new()).await.unwrap_err();
        match err {
            ProcessError::Failed {
                program,
                code,
                stderr,
            } => {
                assert_eq!(program, "sh");
                assert_eq!(code, Some(3));
                assert_eq!(stderr.as_deref(), Some("broken"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upstream_failure_reported() {
        let pipeline = ProcessPipeline::new()
            .stage(sh("exit 7").stdout_to_next())
            .stage(sh("cat > /dev/null").stdin_from_previous());
        let err = pipeline.run(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ProcessError::Failed { code: Some(7), .. }));
    }

    #[tokio::test]
    async fn test_temp_files_removed_on_failure() {
        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join("_tmp_track.m4a");
        std::fs::write(&tmp, b"partial").unwrap();

        let pipeline = ProcessPipeline::new().stage(sh("exit 1")).temp_file(&tmp);
        assert!(pipeline.run(&CancellationToken::new()).await.is_err());
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn test_missing_program_is_spawn_error() {
        let pipeline = ProcessPipeline::new().stage(Stage::new("/nonexistent/encoder"));
        let err = pipeline.run(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[tokio::test]
    async fn test_cancellation_kills_running_stage() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let dir = TempDir::new().unwrap();
        let tmp = dir.path().join("_tmp_disc.m4a");
        std::fs::write(&tmp, b"partial").unwrap();

        let started = Instant::now();
        let pipeline = ProcessPipeline::new()
            .stage(sh("sleep 10"))
            .temp_file(&tmp);
        let err = pipeline.run(&cancel).await.unwrap_err();

        assert!(matches!(err, ProcessError::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(!tmp.exists());
    }

    #[test]
    fn test_validate_rejects_bad_wiring() {
        let dangling = ProcessPipeline::new().stage(sh("true").stdout_to_next());
        assert!(matches!(dangling.validate(), Err(ProcessError::InvalidWiring(_))));

        let orphan = ProcessPipeline::new()
            .stage(sh("true"))
            .stage(sh("cat").stdin_from_previous());
        assert!(orphan.validate().is_err());

        let too_many = ProcessPipeline::new()
            .stage(sh("true"))
            .stage(sh("true"))
            .stage(sh("true"))
            .stage(sh("true"));
        assert!(too_many.validate().is_err());

        assert!(ProcessPipeline::new().validate().is_err());
    }
}
