//! Manual "check now" trigger.

use std::sync::Arc;

use tokio::sync::Notify;

/// Wakes the scheduler out of its interval wait.
///
/// Triggers that arrive while a cycle is running are kept as a single
/// pending wake-up; repeated triggers collapse into one extra cycle.
#[derive(Debug, Clone, Default)]
pub struct ManualTrigger {
    notify: Arc<Notify>,
}

impl ManualTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fire(&self) {
        self.notify.notify_one();
    }

    /// Wait for the next trigger.
    pub async fn fired(&self) {
        self.notify.notified().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_trigger_before_wait_is_kept() {
        let trigger = ManualTrigger::new();
        trigger.fire();
        assert!(timeout(Duration::from_millis(100), trigger.fired()).await.is_ok());
    }

    #[tokio::test]
    async fn test_repeated_triggers_coalesce() {
        let trigger = ManualTrigger::new();
        trigger.fire();
        trigger.fire();
        trigger.fire();

        assert!(timeout(Duration::from_millis(100), trigger.fired()).await.is_ok());
        assert!(timeout(Duration::from_millis(100), trigger.fired()).await.is_err());
    }

    #[tokio::test]
    async fn test_wakes_a_waiting_task() {
        let trigger = ManualTrigger::new();
        let waiter = {
            let trigger = trigger.clone();
            tokio::spawn(async move { trigger.fired().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.fire();
        assert!(timeout(Duration::from_secs(1), waiter).await.is_ok());
    }
}
