//! 配置校验模块
//!
//! 校验规则：
//! - manager_base_url 为 http(s) URL
//! - 路径以 '/' 开头
//! - 节点端口非零
//! - 采样间隔 > 0
//! - 分发队列容量 > 0，user_id 非空

use contracts::{ContractError, StreamingConfig};

/// 校验 StreamingConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &StreamingConfig) -> Result<(), ContractError> {
    validate_directory(config)?;
    validate_node(config)?;
    validate_sampler(config)?;
    validate_dispatch(config)?;
    Ok(())
}

/// 校验目录服务配置
fn validate_directory(config: &StreamingConfig) -> Result<(), ContractError> {
    let directory = &config.directory;
    let url = directory.manager_base_url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ContractError::config_validation(
            "directory.manager_base_url",
            format!("expected an http(s) URL, got '{url}'"),
        ));
    }
    validate_path("directory.available_node_path", &directory.available_node_path)?;
    validate_timeout("directory.request_timeout_ms", directory.request_timeout_ms)
}

/// 校验节点端点配置
fn validate_node(config: &StreamingConfig) -> Result<(), ContractError> {
    let node = &config.node;
    if node.port == 0 {
        return Err(ContractError::config_validation(
            "node.port",
            "port must be non-zero",
        ));
    }
    validate_path("node.health_path", &node.health_path)?;
    validate_path("node.upload_path", &node.upload_path)?;
    validate_timeout("node.request_timeout_ms", node.request_timeout_ms)
}

/// 校验采样配置
fn validate_sampler(config: &StreamingConfig) -> Result<(), ContractError> {
    if config.sampler.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "sampler.interval_ms",
            "interval_ms must be > 0",
        ));
    }
    Ok(())
}

/// 校验分发配置
fn validate_dispatch(config: &StreamingConfig) -> Result<(), ContractError> {
    let dispatch = &config.dispatch;
    if dispatch.queue_capacity == 0 {
        return Err(ContractError::config_validation(
            "dispatch.queue_capacity",
            "queue_capacity must be > 0",
        ));
    }
    if dispatch.user_id.trim().is_empty() {
        return Err(ContractError::config_validation(
            "dispatch.user_id",
            "user_id cannot be empty",
        ));
    }
    Ok(())
}

fn validate_path(field: &str, path: &str) -> Result<(), ContractError> {
    if !path.starts_with('/') {
        return Err(ContractError::config_validation(
            field,
            format!("path must start with '/', got '{path}'"),
        ));
    }
    Ok(())
}

fn validate_timeout(field: &str, timeout_ms: u64) -> Result<(), ContractError> {
    if timeout_ms == 0 {
        return Err(ContractError::config_validation(
            field,
            "timeout must be > 0",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&StreamingConfig::default()).is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = StreamingConfig::default();
        config.sampler.interval_ms = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("sampler.interval_ms"));
    }

    #[test]
    fn test_bad_manager_url_rejected() {
        let mut config = StreamingConfig::default();
        config.directory.manager_base_url = "192.168.1.141:30001".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("directory.manager_base_url"));
    }

    #[test]
    fn test_relative_path_rejected() {
        let mut config = StreamingConfig::default();
        config.node.upload_path = "api/datarecovery/data".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("node.upload_path"));
    }

    #[test]
    fn test_zero_queue_and_empty_user_rejected() {
        let mut config = StreamingConfig::default();
        config.dispatch.queue_capacity = 0;
        assert!(validate(&config).is_err());

        let mut config = StreamingConfig::default();
        config.dispatch.user_id = "  ".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = StreamingConfig::default();
        config.node.port = 0;
        assert!(validate(&config).is_err());
    }
}
