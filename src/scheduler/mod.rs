//! Refresh scheduling. A single deadline drives the loop: it starts at "now",
//! and after each update cycle it is moved forward either by the refresh
//! interval (success) or by a jittered exponential backoff (failure).

mod backoff;

use std::sync::Arc;
use std::time::Duration;

use tokio::task;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info};

use crate::config::Config;
use crate::error::{CollectorError, ParseError};
use crate::pipeline;

pub use backoff::backoff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Sleeping until the next regular refresh.
    Waiting,
    /// An update cycle is in progress.
    Running,
    /// Sleeping until a retry after a failed cycle.
    BackoffWaiting,
}

pub struct Scheduler {
    config: Arc<Config>,
    retries: u32,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
            retries: 0,
            state: SchedulerState::Waiting,
        }
    }

    #[cfg(test)]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    #[cfg(test)]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    fn transition(&mut self, next: SchedulerState) {
        if self.state != next {
            debug!(from = ?self.state, to = ?next, retries = self.retries, "Scheduler state change");
        }
        self.state = next;
    }

    /// Run update cycles forever. The first cycle starts immediately.
    pub async fn run(mut self) {
        let mut next_fire = Instant::now();
        loop {
            sleep_until(next_fire).await;
            let delay = self.run_cycle().await;
            next_fire = Instant::now() + delay;
        }
    }

    /// Run one update cycle and return how long to wait before the next one.
    pub async fn run_cycle(&mut self) -> Duration {
        self.transition(SchedulerState::Running);
        info!("Updating OUI database");

        match self.update_and_publish().await {
            Ok(entries) => {
                self.retries = 0;
                self.transition(SchedulerState::Waiting);

                let interval = self.config.refresh_interval;
                info!(entries, "Successfully updated OUI database");
                if let Some(next) = chrono::Duration::from_std(interval)
                    .ok()
                    .and_then(|d| chrono::Local::now().checked_add_signed(d))
                {
                    info!(time = %next.to_rfc3339(), "Next OUI database refresh time");
                }

                interval
            }
            Err(e) => {
                let delay = backoff(self.retries);
                let message = match &e {
                    CollectorError::Download(_) => "Error updating OUI database",
                    CollectorError::Parse(_) | CollectorError::Publish(_) => {
                        "Error parsing OUI database"
                    }
                };
                error!(error = %e, retry = ?delay, attempt = self.retries.saturating_add(1), "{}", message);

                self.retries = self.retries.saturating_add(1);
                self.transition(SchedulerState::BackoffWaiting);
                delay
            }
        }
    }

    async fn update_and_publish(&self) -> Result<usize, CollectorError> {
        let download = pipeline::update(&self.config).await?;

        let config = Arc::clone(&self.config);
        let (download, result) = task::spawn_blocking(move || {
            let result = pipeline::parse(&download, &config);
            (download, result)
        })
        .await
        .map_err(ParseError::from)?;
        let entries = result?;

        if let Err(e) = download.close() {
            error!(error = %e, "Error removing temporary file");
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{REGISTRY_CSV, serve_once, unreachable_url};
    use std::fs;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir, registry_url: String) -> Config {
        Config {
            output_file: dir.path().join("oui.prom"),
            download_dir: dir.path().join("downloads"),
            registry_url,
            refresh_interval: Duration::from_secs(3600),
            ..Config::default()
        }
    }

    #[test]
    fn test_new_scheduler_is_idle() {
        let scheduler = Scheduler::new(Config::default());
        assert_eq!(scheduler.retries(), 0);
        assert_eq!(scheduler.state(), SchedulerState::Waiting);
    }

    #[tokio::test]
    async fn test_download_failure_schedules_retry() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir, unreachable_url());
        fs::create_dir(&config.download_dir).unwrap();
        fs::write(&config.output_file, "existing\n").unwrap();
        let mut scheduler = Scheduler::new(config.clone());

        let delay = scheduler.run_cycle().await;
        assert!(delay >= Duration::from_secs(4) && delay < Duration::from_secs(6));
        assert_eq!(scheduler.retries(), 1);
        assert_eq!(scheduler.state(), SchedulerState::BackoffWaiting);

        let delay = scheduler.run_cycle().await;
        assert!(delay >= Duration::from_secs(8) && delay < Duration::from_secs(12));
        assert_eq!(scheduler.retries(), 2);

        assert_eq!(fs::read_to_string(&config.output_file).unwrap(), "existing\n");
        assert!(!config.temp_output_path().exists());
        assert_eq!(fs::read_dir(&config.download_dir).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_successful_cycle_publishes_and_resets() {
        let dir = TempDir::new().unwrap();
        let server = serve_once(200, REGISTRY_CSV).await;
        let config = config_in(&dir, server.url.clone());
        fs::create_dir(&config.download_dir).unwrap();
        let mut scheduler = Scheduler::new(config.clone());
        scheduler.retries = 3;

        let delay = scheduler.run_cycle().await;
        assert_eq!(delay, Duration::from_secs(3600));
        assert_eq!(scheduler.retries(), 0);
        assert_eq!(scheduler.state(), SchedulerState::Waiting);

        let output = fs::read_to_string(&config.output_file).unwrap();
        assert!(output.contains(r#"mac_oui_info{oui="aa:bb:cc",organization_name="Acme | Acme2"} 1"#));
        assert!(output.contains(r#"mac_oui_info{oui="28:6f:b9",organization_name="Juniper Networks"} 1"#));
        assert_eq!(output.lines().count(), 2);

        let downloads: Vec<_> = fs::read_dir(&config.download_dir).unwrap().collect();
        assert!(downloads.is_empty(), "downloaded CSV left behind: {:?}", downloads);
    }

    #[tokio::test]
    async fn test_unwritable_output_schedules_retry() {
        let dir = TempDir::new().unwrap();
        let server = serve_once(200, REGISTRY_CSV).await;
        let config = Config {
            output_file: dir.path().join("missing").join("oui.prom"),
            registry_url: server.url.clone(),
            ..Config::default()
        };
        let mut scheduler = Scheduler::new(config);

        let delay = scheduler.run_cycle().await;
        assert!(delay >= Duration::from_secs(4) && delay < Duration::from_secs(6));
        assert_eq!(scheduler.retries(), 1);
        assert_eq!(scheduler.state(), SchedulerState::BackoffWaiting);
    }
}
