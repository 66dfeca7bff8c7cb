use tracing::trace;

/// Best-effort cosmetic process title.
///
/// The current title is kept in-process and mirrored to the kernel comm
/// name on Linux (truncated to its 15-byte limit) so process-listing tools
/// can see it. Not part of any functional contract.
pub struct ProcTitle {
    program: String,
    current: String,
}

impl ProcTitle {
    pub fn new(program: impl Into<String>) -> Self {
        ProcTitle {
            program: program.into(),
            current: String::new(),
        }
    }

    pub fn set(&mut self, status: impl AsRef<str>) {
        let title = format!("{}: {}", self.program, status.as_ref());
        trace!(%title, "process title");

        #[cfg(target_os = "linux")]
        {
            let truncated = &title.as_bytes()[..title.len().min(15)];
            let _ = std::fs::write("/proc/self/comm", truncated);
        }

        self.current = title;
    }

    pub fn current(&self) -> &str {
        &self.current
    }
}
