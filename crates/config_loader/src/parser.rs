//! 配置解析模块
//!
//! 支持 TOML (主要) 和 JSON 格式，缺省字段取默认值。

use std::path::Path;

use contracts::{ContractError, StreamingConfig};

/// 配置文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML 格式 (推荐)
    Toml,
    /// JSON 格式
    Json,
}

impl ConfigFormat {
    /// 从文件扩展名推断格式
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// 从文件路径推断格式
    pub fn from_path(path: &Path) -> Result<Self, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;
        Self::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    fn label(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }
}

/// 根据格式解析配置
pub fn parse(content: &str, format: ConfigFormat) -> Result<StreamingConfig, ContractError> {
    let parsed = match format {
        ConfigFormat::Toml => toml::from_str(content).map_err(|e| Box::new(e) as BoxError),
        ConfigFormat::Json => serde_json::from_str(content).map_err(|e| Box::new(e) as BoxError),
    };
    parsed.map_err(|e| ContractError::ConfigParse {
        message: format!("{} parse error: {e}", format.label()),
        source: Some(e),
    })
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_partial_sections() {
        let content = r#"
[directory]
manager_base_url = "http://192.168.1.141:30001"

[sampler]
interval_ms = 250
"#;
        let config = parse(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.directory.manager_base_url, "http://192.168.1.141:30001");
        assert_eq!(config.directory.request_timeout_ms, 5000);
        assert_eq!(config.sampler.interval_ms, 250);
        assert_eq!(config.node.port, 30080);
        assert!(config.store.path.is_none());
    }

    #[test]
    fn test_parse_empty_toml_is_default() {
        let config = parse("", ConfigFormat::Toml).unwrap();
        assert_eq!(config.sampler.interval_ms, 200);
        assert_eq!(config.dispatch.user_id, "user_app");
        assert_eq!(config.dispatch.queue_capacity, 1);
    }

    #[test]
    fn test_parse_json_overrides() {
        let content = r#"{
            "node": { "port": 8080, "health_path": "/healthz" },
            "dispatch": { "queue_capacity": 2, "user_id": "patient-7" },
            "store": { "path": "/var/lib/telemetry/sessions.json" }
        }"#;
        let config = parse(content, ConfigFormat::Json).unwrap();
        assert_eq!(config.node.port, 8080);
        assert_eq!(config.node.health_path, "/healthz");
        assert_eq!(config.node.upload_path, "/api/datarecovery/data");
        assert_eq!(config.dispatch.user_id, "patient-7");
        assert!(config.store.path.is_some());
    }

    #[test]
    fn test_parse_errors_carry_format() {
        let err = parse("invalid toml [[[", ConfigFormat::Toml).unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { source: Some(_), .. }));
        assert!(err.to_string().contains("TOML"));

        let err = parse("{ nope", ConfigFormat::Json).unwrap_err();
        assert!(err.to_string().contains("JSON"));
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(ConfigFormat::from_extension("TOML"), Some(ConfigFormat::Toml));
        assert_eq!(ConfigFormat::from_extension("json"), Some(ConfigFormat::Json));
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
        assert_eq!(
            ConfigFormat::from_path(Path::new("conf/streaming.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert!(ConfigFormat::from_path(Path::new("streaming")).is_err());
    }
}
