//! 容器配置定义

use crate::errors::{ContainerError, ContainerResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "WEAVE";

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 上下文ID，为空时自动生成
    pub id: Option<String>,
    /// 显示名称
    pub display_name: String,
    /// 是否允许同名定义覆盖
    pub allow_definition_overriding: bool,
    /// 注册型后置处理器发现轮次上限
    pub max_post_processor_rounds: usize,
    /// 关闭后是否允许再次刷新
    pub refreshable: bool,
    /// 是否在没有配置标记的情况下启用自动代理
    pub auto_proxy: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            id: None,
            display_name: "weave-context".to_string(),
            allow_definition_overriding: true,
            max_post_processor_rounds: 100,
            refreshable: false,
            auto_proxy: false,
        }
    }
}

impl ContainerConfig {
    /// 加载配置：可选的 TOML 文件叠加 `WEAVE_*` 环境变量
    pub fn load(path: Option<&Path>) -> ContainerResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!("加载容器配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path).required(false));
        }
        builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(|e| ContainerError::Configuration {
                message: format!("加载容器配置失败: {e}"),
            })
    }

    /// 从 TOML 字符串解析配置
    pub fn from_toml_str(content: &str) -> ContainerResult<Self> {
        toml::from_str(content).map_err(|e| ContainerError::Configuration {
            message: format!("解析容器配置失败: {e}"),
        })
    }

    /// 校验配置
    pub fn validate(&self) -> ContainerResult<()> {
        if self.max_post_processor_rounds == 0 {
            return Err(ContainerError::Configuration {
                message: "max_post_processor_rounds 必须大于 0".to_string(),
            });
        }
        Ok(())
    }

    /// 设置是否可刷新
    pub fn refreshable(mut self, refreshable: bool) -> Self {
        self.refreshable = refreshable;
        self
    }

    /// 设置是否允许覆盖
    pub fn allow_definition_overriding(mut self, allow: bool) -> Self {
        self.allow_definition_overriding = allow;
        self
    }

    /// 设置是否自动代理
    pub fn auto_proxy(mut self, enabled: bool) -> Self {
        self.auto_proxy = enabled;
        self
    }
}
