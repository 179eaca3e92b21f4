use super::*;

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            username: "@".to_string(),
            admin_enabled: true,
            admins: Vec::new(),
            welcome_sticker:
                "CAACAgIAAxkBAAIZtmG7xqAThaURsQfRbA2WBsheCoBKAAJaDwACwWSJS2gGfUBK_uGIIwQ"
                    .to_string(),
        }
    }
}

impl Default for EsiosConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_url: "https://api.esios.ree.es".to_string(),
            prices_indicator: 1001,
            sections_indicator: 1002,
            timeout_seconds: 10,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "./data".to_string(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            low_percentile: 25,
            high_percentile: 70,
            round_decimals: 5,
            default_zone: Zone::Peninsula,
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_push_time: "08:00".to_string(),
            timezone: "Europe/Madrid".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "DEBUG".to_string(),
            console_level: Some("INFO".to_string()),
            file_level: None,
            console_output: true,
            json_format: false,
            backup_count: 30,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig::default(),
            esios: EsiosConfig::default(),
            storage: StorageConfig::default(),
            analysis: AnalysisConfig::default(),
            schedule: ScheduleConfig::default(),
            logging: LoggingConfig::default(),
            cache_writer_capacity: 64,
        }
    }
}
