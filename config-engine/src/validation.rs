// Semantic checks serde cannot express
use crate::engine::EngineConfig;
use crate::error::{ConfigError, Result};

pub fn validate(config: &EngineConfig) -> Result<()> {
    let c = &config.collections;
    let named = [
        ("collections.habits", &c.habits),
        ("collections.tasks", &c.tasks),
        ("collections.users", &c.users),
        ("collections.user_habits", &c.user_habits),
        ("collections.user_tasks", &c.user_tasks),
        ("collections.user_invites", &c.user_invites),
        ("collections.user_private", &c.user_private),
        ("collections.user_friend_requests", &c.user_friend_requests),
        ("collections.item_invites", &c.item_invites),
        ("local_keys.habit_list", &config.local_keys.habit_list),
        ("local_keys.task_list", &config.local_keys.task_list),
        ("local_keys.daily_checkin", &config.local_keys.daily_checkin),
        ("daily_checkin.id", &config.daily_checkin.id),
    ];

    for (field, value) in named {
        if value.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!("{field} must not be empty")));
        }
        if value.contains('/') {
            return Err(ConfigError::ValidationError(format!("{field} must not contain '/'")));
        }
    }

    if config.tasks.expiry_days == 0 {
        return Err(ConfigError::ValidationError("tasks.expiry_days must be at least 1".to_string()));
    }
    if config.charts.max_buckets == 0 {
        return Err(ConfigError::ValidationError("charts.max_buckets must be at least 1".to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_empty_and_nested_names() {
        let mut config = EngineConfig::default();
        config.collections.users = " ".to_string();
        assert!(validate(&config).is_err());

        let mut config = EngineConfig::default();
        config.collections.habits = "a/b".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_zero_expiry() {
        let mut config = EngineConfig::default();
        config.tasks.expiry_days = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("expiry_days"));
    }
}
