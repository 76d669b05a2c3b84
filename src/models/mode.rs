use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 答题模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// 填写后立即提交
    Instant,
    /// 只填写，由人工提交
    #[default]
    Semi,
    /// 随机延迟后提交
    Delayed,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Instant, Mode::Semi, Mode::Delayed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Instant => "instant",
            Mode::Semi => "semi",
            Mode::Delayed => "delayed",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("未知的答题模式: {0}")]
pub struct UnknownMode(pub String);

impl FromStr for Mode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        Mode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == name)
            .ok_or_else(|| UnknownMode(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_round_trips_through_name() {
        for mode in Mode::ALL {
            assert_eq!(mode.to_string().parse::<Mode>(), Ok(mode));
        }
        assert_eq!(" INSTANT ".parse::<Mode>(), Ok(Mode::Instant));
        assert!("turbo".parse::<Mode>().is_err());
    }

    #[test]
    fn test_unknown_mode_message() {
        let err = "turbo".parse::<Mode>().unwrap_err();
        assert_eq!(err.to_string(), "未知的答题模式: turbo");
        let _: &dyn std::error::Error = &err;
    }
}
