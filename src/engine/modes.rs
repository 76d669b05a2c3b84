//! 答题模式策略
//!
//! 把答题模式映射为"是否自动提交 + 提交前延迟范围"。纯函数，不持有状态。

use std::time::Duration;

use rand::Rng;

use crate::models::Mode;

/// 模式对应的提交行为
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeBehavior {
    pub auto_submit: bool,
    pub min_delay: Duration,
    pub max_delay: Duration,
}

impl ModeBehavior {
    /// 完全人工：不自动提交，无延迟
    pub const MANUAL: ModeBehavior = ModeBehavior {
        auto_submit: false,
        min_delay: Duration::ZERO,
        max_delay: Duration::ZERO,
    };
}

pub fn resolve_behavior(mode: Mode) -> ModeBehavior {
    match mode {
        Mode::Instant => ModeBehavior {
            auto_submit: true,
            ..ModeBehavior::MANUAL
        },
        Mode::Semi => ModeBehavior::MANUAL,
        Mode::Delayed => ModeBehavior {
            auto_submit: true,
            min_delay: Duration::from_millis(800),
            max_delay: Duration::from_millis(2500),
        },
    }
}

/// 按模式名解析行为，无法识别的名字按完全人工处理
pub fn resolve_behavior_named(name: &str) -> ModeBehavior {
    name.parse::<Mode>()
        .map(resolve_behavior)
        .unwrap_or(ModeBehavior::MANUAL)
}

/// 在 `[min_delay, max_delay]`（毫秒，闭区间）内均匀取一个延迟
///
/// 两端都为 0 时直接返回 0；`max < min` 时按 `min` 处理。
pub fn random_delay<R: Rng + ?Sized>(behavior: &ModeBehavior, rng: &mut R) -> Duration {
    let min = behavior.min_delay.as_millis() as u64;
    let max = behavior.max_delay.as_millis() as u64;
    if min == 0 && max == 0 {
        return Duration::ZERO;
    }
    if max <= min {
        return Duration::from_millis(min);
    }
    Duration::from_millis(rng.gen_range(min..=max))
}
