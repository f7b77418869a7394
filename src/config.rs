use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{AppError, AppResult};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "FPS_CONFIG";

/// 程序配置文件
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 输入目录（扫描仪/生产者写入图片的位置）
    pub input_dir: PathBuf,
    /// 输出目录（生成的 PDF 文档）
    pub output_dir: PathBuf,
    /// 隔离目录（不符合命名规则的文件）
    pub holding_dir: PathBuf,
    /// 页面文件名前缀，如 `img` 对应 `img_001.jpg`
    pub page_prefix: String,
    /// 独占打开探测的最大尝试次数
    pub lock_attempts: u32,
    /// 每次探测失败后的等待时间（毫秒）
    pub lock_backoff_ms: u64,
    /// 空闲多久视为当前文档完成（毫秒）
    pub idle_timeout_ms: u64,
    /// 图片相对页面宽高的缩放比例
    pub page_scale: f32,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub log_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("in"),
            output_dir: PathBuf::from("out"),
            holding_dir: PathBuf::from("temp"),
            page_prefix: "img".to_string(),
            lock_attempts: 3,
            lock_backoff_ms: 5000,
            idle_timeout_ms: 5000,
            page_scale: 0.75,
            verbose_logging: false,
            log_file: PathBuf::from("log.txt"),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// 从 TOML 文件加载配置，缺省字段使用默认值
    pub fn from_toml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("无法读取配置文件: {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("无法解析配置文件: {}", path.display()))?;
        Ok(config)
    }

    /// 加载配置：设置了 `FPS_CONFIG` 时读取该文件，环境变量总是最后覆盖
    pub fn load() -> anyhow::Result<Self> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_toml_file(path)?.with_env_overrides(),
            Err(_) => Self::from_env(),
        };
        config.validate()?;
        Ok(config)
    }

    fn with_env_overrides(self) -> Self {
        Self {
            input_dir: std::env::var("INPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.input_dir),
            output_dir: std::env::var("OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.output_dir),
            holding_dir: std::env::var("HOLDING_DIR")
                .map(PathBuf::from)
                .unwrap_or(self.holding_dir),
            page_prefix: std::env::var("PAGE_PREFIX").unwrap_or(self.page_prefix),
            lock_attempts: std::env::var("LOCK_ATTEMPTS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.lock_attempts),
            lock_backoff_ms: std::env::var("LOCK_BACKOFF_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.lock_backoff_ms),
            idle_timeout_ms: std::env::var("IDLE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.idle_timeout_ms),
            page_scale: std::env::var("PAGE_SCALE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.page_scale),
            verbose_logging: std::env::var("VERBOSE_LOGGING")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(self.verbose_logging),
            log_file: std::env::var("LOG_FILE")
                .map(PathBuf::from)
                .unwrap_or(self.log_file),
        }
    }

    /// 检查配置取值是否可用
    pub fn validate(&self) -> AppResult<()> {
        if self.lock_attempts == 0 {
            return Err(AppError::Config("lock_attempts 必须大于 0".to_string()));
        }
        if !(self.page_scale > 0.0 && self.page_scale <= 1.0) {
            return Err(AppError::Config(format!(
                "page_scale 必须在 (0, 1] 范围内, 当前值: {}",
                self.page_scale
            )));
        }
        if self.page_prefix.is_empty() {
            return Err(AppError::Config("page_prefix 不能为空".to_string()));
        }
        Ok(())
    }

    pub fn lock_backoff(&self) -> Duration {
        Duration::from_millis(self.lock_backoff_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_service_constants() {
        let config = Config::default();
        assert_eq!(config.lock_attempts, 3);
        assert_eq!(config.lock_backoff(), Duration::from_secs(5));
        assert_eq!(config.idle_timeout(), Duration::from_secs(5));
        assert_eq!(config.page_scale, 0.75);
        assert_eq!(config.page_prefix, "img");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_file_partial() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("service.toml");
        std::fs::write(
            &path,
            "input_dir = \"scans\"\nidle_timeout_ms = 250\nverbose_logging = true\n",
        )
        .unwrap();

        let config = Config::from_toml_file(&path).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("scans"));
        assert_eq!(config.idle_timeout_ms, 250);
        assert!(config.verbose_logging);
        // 未指定的字段保持默认值
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert_eq!(config.lock_attempts, 3);
    }

    #[test]
    fn test_from_toml_file_missing() {
        let err = Config::from_toml_file("/definitely/not/here.toml").unwrap_err();
        assert!(err.to_string().contains("无法读取配置文件"));
    }

    #[test]
    fn test_env_overrides_parse_or_keep_base() {
        std::env::set_var("OUTPUT_DIR", "pdfs");
        std::env::set_var("LOCK_ATTEMPTS", "7");
        std::env::set_var("PAGE_SCALE", "not-a-number");

        let base = Config {
            page_scale: 0.5,
            ..Config::default()
        };
        let config = base.with_env_overrides();

        std::env::remove_var("OUTPUT_DIR");
        std::env::remove_var("LOCK_ATTEMPTS");
        std::env::remove_var("PAGE_SCALE");

        assert_eq!(config.output_dir, PathBuf::from("pdfs"));
        assert_eq!(config.lock_attempts, 7);
        // 无法解析的值保留原值
        assert_eq!(config.page_scale, 0.5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_attempts = Config {
            lock_attempts: 0,
            ..Config::default()
        };
        assert!(matches!(zero_attempts.validate(), Err(AppError::Config(_))));

        let bad_scale = Config {
            page_scale: 1.5,
            ..Config::default()
        };
        assert!(bad_scale.validate().is_err());

        let empty_prefix = Config {
            page_prefix: String::new(),
            ..Config::default()
        };
        assert!(empty_prefix.validate().is_err());
    }
}
