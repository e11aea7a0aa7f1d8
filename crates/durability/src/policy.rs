//! Restart and stop policies

use meshstate_core::Scalar;

/// Which checkpoint instant, if any, to restart from
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum RestartPolicy {
    /// Start fresh; no checkpoint is opened
    #[default]
    None,
    /// Restart from the instant whose time matches within tolerance
    Time(Scalar),
    /// Restart from the latest complete instant
    Latest,
}

impl RestartPolicy {
    /// Keyword used in configuration
    pub fn keyword(&self) -> &'static str {
        match self {
            RestartPolicy::None => "none",
            RestartPolicy::Time(_) => "restartTime",
            RestartPolicy::Latest => "latestTime",
        }
    }

    /// True unless restarting is disabled
    pub fn is_enabled(&self) -> bool {
        !matches!(self, RestartPolicy::None)
    }
}

/// When to ask the host to stop after a checkpoint
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum StopPolicy {
    /// Never
    #[default]
    None,
    /// After the next checkpoint
    Now,
    /// Once the simulation time reaches the given value
    Time(Scalar),
}

impl StopPolicy {
    /// Keyword used in configuration
    pub fn keyword(&self) -> &'static str {
        match self {
            StopPolicy::None => "none",
            StopPolicy::Now => "now",
            StopPolicy::Time(_) => "stopTime",
        }
    }
}

/// Stop policy with one-shot triggering
///
/// Once the policy fires it disables itself, so a host that chooses to
/// continue is not asked again.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StopControl {
    policy: StopPolicy,
    triggered: bool,
}

impl StopControl {
    /// Wrap a policy
    pub fn new(policy: StopPolicy) -> Self {
        StopControl {
            policy,
            triggered: false,
        }
    }

    /// Configured policy
    pub fn policy(&self) -> StopPolicy {
        self.policy
    }

    /// True once the policy has fired
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    /// Evaluate the policy at simulation time `time`
    pub fn check(&mut self, time: Scalar) -> bool {
        if self.triggered {
            return false;
        }
        let fire = match self.policy {
            StopPolicy::None => false,
            StopPolicy::Now => true,
            StopPolicy::Time(stop) => time >= stop,
        };
        self.triggered = fire;
        fire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_now_fires_once() {
        let mut stop = StopControl::new(StopPolicy::Now);
        assert!(stop.check(0.1));
        assert!(stop.is_triggered());
        assert!(!stop.check(0.2));
    }

    #[test]
    fn test_stop_time() {
        let mut stop = StopControl::new(StopPolicy::Time(0.5));
        assert!(!stop.check(0.4));
        assert!(stop.check(0.5));
        assert!(!stop.check(0.6));
    }

    #[test]
    fn test_stop_none_never_fires() {
        let mut stop = StopControl::default();
        assert!(!stop.check(1e9));
    }

    #[test]
    fn test_restart_keywords() {
        assert_eq!(RestartPolicy::Latest.keyword(), "latestTime");
        assert!(!RestartPolicy::None.is_enabled());
        assert!(RestartPolicy::Time(0.2).is_enabled());
    }
}
