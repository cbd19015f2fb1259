//! 注入器配置加载
//!
//! 按 默认值 -> 配置文件 -> 环境变量 的顺序叠加，后者覆盖前者。
//! 环境变量形如 `DI_MAX_RESOLUTION_DEPTH=32`、`DI_SINGLETON_POLICY=relaxed`。

use di_abstractions::InjectorConfig;
use infrastructure_common::{ConfigError, ConfigResult};
use std::path::Path;
use tracing::{debug, error};

/// 默认环境变量前缀
pub const ENV_PREFIX: &str = "DI";

/// 加载注入器配置
///
/// 显式给出的配置文件必须存在，否则返回 [`ConfigError::FileNotFound`]。
pub fn load_injector_config(path: Option<&Path>) -> ConfigResult<InjectorConfig> {
    load_injector_config_with_prefix(path, ENV_PREFIX)
}

/// 使用指定的环境变量前缀加载注入器配置
pub fn load_injector_config_with_prefix(
    path: Option<&Path>,
    env_prefix: &str,
) -> ConfigResult<InjectorConfig> {
    let mut builder = config::Config::builder();

    if let Some(path) = path {
        if !path.exists() {
            error!("配置文件不存在: {}", path.display());
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            });
        }
        debug!("加载注入器配置文件: {}", path.display());
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix(env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .map_err(|e| {
            error!("配置构建失败: {}", e);
            ConfigError::ParseError {
                source: Box::new(e),
            }
        })?;

    let config: InjectorConfig = settings.try_deserialize().map_err(|e| {
        error!("注入器配置绑定失败: {}", e);
        ConfigError::ParseError {
            source: Box::new(e),
        }
    })?;

    validate_injector_config(&config)?;
    debug!("注入器配置: {:?}", config);
    Ok(config)
}

/// 验证注入器配置
pub fn validate_injector_config(config: &InjectorConfig) -> ConfigResult<()> {
    if config.max_resolution_depth == 0 {
        return Err(ConfigError::ValidationError {
            message: "max_resolution_depth 必须大于 0".to_string(),
        });
    }
    Ok(())
}
