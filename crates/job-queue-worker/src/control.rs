use tokio::sync::mpsc;
use tracing::{debug, info};

/// Out-of-band commands for a running worker.
///
/// Delivered asynchronously and applied at loop-iteration boundaries; only
/// the kill paths may interrupt an in-flight isolated-context wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Finish the current loop and exit once the in-flight job completes.
    Shutdown,
    /// Finish immediately, killing any in-flight isolated context.
    ShutdownNow,
    /// Kill the in-flight isolated context only.
    KillChild,
    Pause,
    Resume,
    /// Rebuild the store connections without losing loop state.
    Reconnect,
}

/// Cloneable sender half of a worker's control channel.
#[derive(Clone)]
pub struct ControlHandle {
    tx: mpsc::UnboundedSender<Control>,
}

impl ControlHandle {
    pub fn send(&self, command: Control) {
        // A dropped receiver means the worker is already gone; nothing to do.
        let _ = self.tx.send(command);
    }

    pub fn shutdown(&self) {
        self.send(Control::Shutdown);
    }

    pub fn shutdown_now(&self) {
        self.send(Control::ShutdownNow);
    }

    pub fn kill_child(&self) {
        self.send(Control::KillChild);
    }

    pub fn pause(&self) {
        self.send(Control::Pause);
    }

    pub fn resume(&self) {
        self.send(Control::Resume);
    }

    pub fn reconnect(&self) {
        self.send(Control::Reconnect);
    }
}

pub(crate) fn channel() -> (ControlHandle, mpsc::UnboundedReceiver<Control>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ControlHandle { tx }, rx)
}

/// Map OS signals onto the control channel.
///
/// On Unix: TERM/INT → terminate now, QUIT → graceful quit, USR1 → kill
/// child, USR2 → pause, CONT → resume, PIPE → reconnect. Elsewhere only
/// ctrl-c is wired, to terminate now.
#[cfg(unix)]
pub fn install_signal_handlers(handle: ControlHandle) -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    let mut int = signal(SignalKind::interrupt())?;
    let mut quit = signal(SignalKind::quit())?;
    let mut usr1 = signal(SignalKind::user_defined1())?;
    let mut usr2 = signal(SignalKind::user_defined2())?;
    let mut cont = signal(SignalKind::from_raw(libc::SIGCONT))?;
    let mut pipe = signal(SignalKind::pipe())?;

    tokio::spawn(async move {
        loop {
            let command = tokio::select! {
                _ = term.recv() => Control::ShutdownNow,
                _ = int.recv() => Control::ShutdownNow,
                _ = quit.recv() => Control::Shutdown,
                _ = usr1.recv() => Control::KillChild,
                _ = usr2.recv() => Control::Pause,
                _ = cont.recv() => Control::Resume,
                _ = pipe.recv() => Control::Reconnect,
            };
            info!(?command, "signal received");
            handle.send(command);
        }
    });

    debug!("registered signal handlers");
    Ok(())
}

#[cfg(not(unix))]
pub fn install_signal_handlers(handle: ControlHandle) -> std::io::Result<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received");
            handle.send(Control::ShutdownNow);
        }
    });

    debug!("registered ctrl-c handler");
    Ok(())
}
