//! Detached process launching
//!
//! Applications run through `sh -c` in their own process group, so a
//! terminal-generated signal aimed at the manager never reaches them.
//! Children are polled once per loop iteration and reaped when they exit.

use std::io;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};

use tracing::{debug, info, warn};

/// Launches commands and reaps finished children.
#[derive(Debug, Default)]
pub struct Spawner {
    children: Vec<Child>,
}

impl Spawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an external command
    pub fn spawn(&mut self, command: &str) -> io::Result<()> {
        let command = command.trim();
        if command.is_empty() {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, "empty command"));
        }
        info!("Spawning command: {}", command);
        let child = Command::new("sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .process_group(0)
            .spawn()?;
        debug!("Spawned pid {}", child.id());
        self.children.push(child);
        Ok(())
    }

    /// Collect exited children without blocking.
    pub fn reap(&mut self) {
        self.children.retain_mut(|child| match child.try_wait() {
            Ok(Some(status)) => {
                debug!("Child {} exited with {}", child.id(), status);
                false
            },
            Ok(None) => true,
            Err(e) => {
                warn!("Failed to poll child {}: {}", child.id(), e);
                false
            },
        });
    }

    pub fn running(&self) -> usize {
        self.children.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_empty_command_rejected() {
        let mut spawner = Spawner::new();
        let err = spawner.spawn("   ").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert_eq!(spawner.running(), 0);
    }

    #[test]
    fn test_spawn_and_reap() {
        let mut spawner = Spawner::new();
        spawner.spawn("true").unwrap();
        assert_eq!(spawner.running(), 1);

        let deadline = Instant::now() + Duration::from_secs(5);
        while spawner.running() > 0 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
            spawner.reap();
        }
        assert_eq!(spawner.running(), 0);
    }
}
