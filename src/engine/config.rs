use crate::error;
use crate::lang::Error;
use crate::mach::DEFAULT_MAX_STEPS;
use std::convert::TryFrom;

/// Scheduler period. Only these rates are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecInterval {
    Ms10,
    Ms20,
    Ms25,
    Ms50,
    Ms75,
    Ms100,
}

impl ExecInterval {
    pub fn as_ms(self) -> u32 {
        match self {
            ExecInterval::Ms10 => 10,
            ExecInterval::Ms20 => 20,
            ExecInterval::Ms25 => 25,
            ExecInterval::Ms50 => 50,
            ExecInterval::Ms75 => 75,
            ExecInterval::Ms100 => 100,
        }
    }

    pub fn as_us(self) -> u64 {
        self.as_ms() as u64 * 1000
    }
}

impl Default for ExecInterval {
    fn default() -> Self {
        ExecInterval::Ms10
    }
}

impl TryFrom<u32> for ExecInterval {
    type Error = Error;

    fn try_from(ms: u32) -> Result<Self, Self::Error> {
        Ok(match ms {
            10 => ExecInterval::Ms10,
            20 => ExecInterval::Ms20,
            25 => ExecInterval::Ms25,
            50 => ExecInterval::Ms50,
            75 => ExecInterval::Ms75,
            100 => ExecInterval::Ms100,
            _ => {
                let msg = format!("{} MS; USE 10, 20, 25, 50, 75 OR 100", ms);
                return Err(error!(InvalidInterval; &msg));
            }
        })
    }
}

impl std::fmt::Display for ExecInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}ms", self.as_ms())
    }
}

/// Engine settings applied at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub interval: ExecInterval,
    /// Instruction ceiling for one program run.
    pub max_steps: u32,
    pub enabled: bool,
    /// Log every program execution.
    pub debug: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            interval: ExecInterval::default(),
            max_steps: DEFAULT_MAX_STEPS,
            enabled: true,
            debug: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::ErrorCode;

    #[test]
    fn test_interval_set() {
        for ms in &[10, 20, 25, 50, 75, 100] {
            assert_eq!(ExecInterval::try_from(*ms).unwrap().as_ms(), *ms);
        }
        for ms in &[0, 5, 30, 1000] {
            assert!(ExecInterval::try_from(*ms)
                .unwrap_err()
                .is(ErrorCode::InvalidInterval));
        }
    }

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.interval.as_ms(), 10);
        assert_eq!(config.max_steps, 10000);
        assert!(config.enabled);
        assert!(!config.debug);
    }
}
