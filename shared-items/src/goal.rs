use serde::{Deserialize, Serialize};
use std::fmt;

use crate::dates::TimeFrame;
use crate::error::{ItemError, Result};

/// Target count for a habit over a rolling window, e.g. `10 km per 1 week`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    #[serde(alias = "goalNumber")]
    pub target_count: f64,
    pub unit: String,
    #[serde(alias = "timeFrameCount")]
    pub window_count: u32,
    #[serde(alias = "timeFrameLabel")]
    pub window_unit: TimeFrame,
}

impl Goal {
    pub fn new(target_count: f64, unit: impl Into<String>, window_count: u32, window_unit: TimeFrame) -> Result<Self> {
        let goal = Self {
            target_count,
            unit: unit.into(),
            window_count,
            window_unit,
        };
        goal.validate()?;
        Ok(goal)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.target_count.is_finite() || self.target_count <= 0.0 {
            return Err(ItemError::InvalidGoal(format!(
                "target count must be positive, got {}",
                self.target_count
            )));
        }
        if self.window_count == 0 {
            return Err(ItemError::InvalidGoal("window must span at least one unit".to_string()));
        }
        Ok(())
    }

    pub fn duration_days(&self) -> u32 {
        self.window_count.saturating_mul(self.window_unit.days())
    }

    pub fn ideal_count_per_day(&self) -> f64 {
        self.target_count / f64::from(self.duration_days().max(1))
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} per {} {}",
            self.target_count, self.unit, self.window_count, self.window_unit
        )
    }
}
