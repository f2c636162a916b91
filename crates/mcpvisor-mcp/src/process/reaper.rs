//! Per-process supervisor task.
//!
//! Owns the `Child`, applies termination requests and publishes the exit
//! status exactly once. When every handle (control sender) is gone the child
//! is killed, so an abandoned handle never leaks a process.

use std::process::ExitStatus;

use mcpvisor_core::{ProcessExit, ProviderId, Termination};
use tokio::process::Child;
use tokio::sync::{mpsc, watch};
use tracing::{debug, warn};

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

pub(super) async fn supervise(
    mut child: Child,
    mut control: mpsc::UnboundedReceiver<Termination>,
    exit: watch::Sender<Option<ProcessExit>>,
    provider_id: ProviderId,
) {
    let pid = child.id();
    let mut control_open = true;

    let status = loop {
        tokio::select! {
            status = child.wait() => break status,
            request = control.recv(), if control_open => match request {
                Some(Termination::Graceful) => terminate(&mut child),
                Some(Termination::Forced) => kill(&mut child),
                None => {
                    control_open = false;
                    debug!(provider_id = %provider_id, ?pid, "All handles dropped, killing process");
                    kill(&mut child);
                }
            },
        }
    };

    let exit_info = match status {
        Ok(status) => exit_from_status(status),
        Err(e) => {
            warn!(provider_id = %provider_id, ?pid, error = %e, "Failed to reap provider process");
            ProcessExit::unknown()
        }
    };

    debug!(provider_id = %provider_id, ?pid, exit = %exit_info, "Provider process exited");
    exit.send_replace(Some(exit_info));
}

/// Ask the process to exit.
#[cfg(unix)]
fn terminate(child: &mut Child) {
    let Some(pid) = child.id() else {
        return;
    };
    let Ok(raw) = i32::try_from(pid) else {
        kill(child);
        return;
    };

    debug!(pid, "Sending SIGTERM");
    match signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
        // ESRCH: exited between the check and the signal
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(e) => {
            warn!(pid, error = %e, "Failed to send SIGTERM, killing instead");
            kill(child);
        }
    }
}

/// No graceful termination outside Unix.
#[cfg(not(unix))]
fn terminate(child: &mut Child) {
    kill(child);
}

fn kill(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        // InvalidInput: already reaped
        debug!(pid = ?child.id(), error = %e, "Kill request failed");
    }
}

#[cfg(unix)]
fn exit_from_status(status: ExitStatus) -> ProcessExit {
    use std::os::unix::process::ExitStatusExt;
    ProcessExit {
        code: status.code(),
        signal: status.signal(),
    }
}

#[cfg(not(unix))]
fn exit_from_status(status: ExitStatus) -> ProcessExit {
    ProcessExit {
        code: status.code(),
        signal: None,
    }
}
