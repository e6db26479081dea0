//! Static catalog of daemon implementations the host can run.

pub const REPOSITORY_PULL_LOCAL_DAEMON: &str = "RepositoryPullLocalDaemon";
pub const GARBAGE_COLLECTOR_DAEMON: &str = "GarbageCollectorDaemon";
pub const TASKMASTER_DAEMON: &str = "TaskmasterDaemon";
pub const TRIGGER_DAEMON: &str = "TriggerDaemon";

/// Every daemon identifier, in display order.
pub const DAEMON_CLASSES: &[&str] = &[
    GARBAGE_COLLECTOR_DAEMON,
    REPOSITORY_PULL_LOCAL_DAEMON,
    TASKMASTER_DAEMON,
    TRIGGER_DAEMON,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_sorted_and_unique() {
        let mut sorted = DAEMON_CLASSES.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted, DAEMON_CLASSES);
    }
}
