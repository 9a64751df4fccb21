//! 上下文构建器

use crate::context::ApplicationContext;
use di_abstractions::{
    ApplicationListener, BeanDefinitionRegistryPostProcessor, BeanFactoryPostProcessor,
    BeanPostProcessor, ComponentScanner, Scope, TypeCatalog, TypeDescriptor,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use weave_aop::Advisor;
use weave_common::{ContainerConfig, ContainerError, ContainerResult};

/// 上下文构建器
///
/// 收集配置、组件和扩展点，`build` 时创建并刷新上下文。
pub struct ContextBuilder {
    /// 容器配置
    config: Option<ContainerConfig>,
    /// 配置文件路径
    config_file: Option<PathBuf>,
    /// 组件类型
    components: Vec<Arc<TypeDescriptor>>,
    /// 扫描的包
    packages: Vec<String>,
    /// 组件扫描器
    scanners: Vec<Arc<dyn ComponentScanner>>,
    registry_processors: Vec<Arc<dyn BeanDefinitionRegistryPostProcessor>>,
    factory_processors: Vec<Arc<dyn BeanFactoryPostProcessor>>,
    bean_processors: Vec<Arc<dyn BeanPostProcessor>>,
    advisors: Vec<Arc<Advisor>>,
    listeners: Vec<Arc<dyn ApplicationListener>>,
    scopes: Vec<(String, Arc<dyn Scope>)>,
    /// 日志配置
    logging_config: LoggingConfig,
    /// 是否初始化日志
    logging_enabled: bool,
}

impl ContextBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self {
            config: None,
            config_file: None,
            components: Vec::new(),
            packages: Vec::new(),
            scanners: Vec::new(),
            registry_processors: Vec::new(),
            factory_processors: Vec::new(),
            bean_processors: Vec::new(),
            advisors: Vec::new(),
            listeners: Vec::new(),
            scopes: Vec::new(),
            logging_config: LoggingConfig::default(),
            logging_enabled: false,
        }
    }

    /// 使用指定的容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 从 TOML 文件加载容器配置，`WEAVE_*` 环境变量优先
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        info!("添加容器配置文件: {}", path.display());
        self.config_file = Some(path);
        self
    }

    /// 注册组件类型
    pub fn register(mut self, descriptor: Arc<TypeDescriptor>) -> Self {
        debug!("注册组件类型: {}", descriptor.type_info());
        self.components.push(descriptor);
        self
    }

    /// 注册多个组件类型
    pub fn register_all<I>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = Arc<TypeDescriptor>>,
    {
        self.components.extend(descriptors);
        self
    }

    /// 扫描指定的包
    pub fn scan<S: Into<String>>(mut self, package: S) -> Self {
        let package = package.into();
        info!("添加包扫描: {}", package);
        self.packages.push(package);
        self
    }

    /// 添加组件扫描器
    pub fn add_component_scanner(mut self, scanner: Arc<dyn ComponentScanner>) -> Self {
        debug!("添加组件扫描器: {}", scanner.name());
        self.scanners.push(scanner);
        self
    }

    /// 以类型目录作为组件扫描器
    pub fn with_catalog(self, catalog: TypeCatalog) -> Self {
        self.add_component_scanner(Arc::new(catalog))
    }

    /// 添加注册表后置处理器
    pub fn add_registry_post_processor(
        mut self,
        processor: Arc<dyn BeanDefinitionRegistryPostProcessor>,
    ) -> Self {
        self.registry_processors.push(processor);
        self
    }

    /// 添加工厂后置处理器
    pub fn add_factory_post_processor(mut self, processor: Arc<dyn BeanFactoryPostProcessor>) -> Self {
        self.factory_processors.push(processor);
        self
    }

    /// 添加 bean 后置处理器
    pub fn add_bean_post_processor(mut self, processor: Arc<dyn BeanPostProcessor>) -> Self {
        self.bean_processors.push(processor);
        self
    }

    /// 添加通知器
    pub fn add_advisor(mut self, advisor: Advisor) -> Self {
        info!("添加通知器: {}", advisor.name());
        self.advisors.push(Arc::new(advisor));
        self
    }

    /// 添加事件监听器
    pub fn add_listener(mut self, listener: Arc<dyn ApplicationListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// 注册自定义作用域
    pub fn register_scope<S: Into<String>>(mut self, name: S, scope: Arc<dyn Scope>) -> Self {
        self.scopes.push((name.into(), scope));
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 创建上下文但不刷新
    pub fn build_unrefreshed(self) -> ContainerResult<ApplicationContext> {
        if self.logging_enabled {
            self.logging_config.init()?;
        }

        let config = match (self.config, &self.config_file) {
            (Some(config), None) => config,
            (None, path) => ContainerConfig::load(path.as_deref())?,
            (Some(_), Some(path)) => {
                return Err(ContainerError::Configuration {
                    message: format!(
                        "不能同时指定容器配置和配置文件: {}",
                        path.display()
                    ),
                })
            }
        };
        config.validate()?;

        let context = ApplicationContext::new(config);
        context.register(&self.components)?;
        for scanner in self.scanners {
            context.add_scanner(scanner)?;
        }
        let packages: Vec<&str> = self.packages.iter().map(String::as_str).collect();
        context.scan(&packages)?;
        for processor in self.registry_processors {
            context.add_bean_definition_registry_post_processor(processor)?;
        }
        for processor in self.factory_processors {
            context.add_bean_factory_post_processor(processor)?;
        }
        for processor in self.bean_processors {
            context.add_bean_post_processor(processor)?;
        }
        for advisor in self.advisors {
            context.add_advisor(advisor)?;
        }
        for listener in self.listeners {
            context.add_application_listener(listener)?;
        }
        for (name, scope) in self.scopes {
            context.register_scope(&name, scope)?;
        }
        Ok(context)
    }

    /// 创建并刷新上下文
    pub fn build(self) -> ContainerResult<ApplicationContext> {
        info!("开始构建应用上下文");
        let context = self.build_unrefreshed()?;
        context.refresh()?;
        info!("应用上下文构建完成: {}", context.id());
        Ok(context)
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 初始化全局日志订阅者
    ///
    /// `RUST_LOG` 存在时优先使用；已经初始化过时只记录调试日志。
    pub fn init(&self) -> ContainerResult<()> {
        let filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(self.level.as_str()))
            .map_err(|e| ContainerError::Configuration {
                message: format!("日志过滤器无效: {e}"),
            })?;
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        let result = if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        };
        match result {
            Ok(()) => info!("日志系统初始化完成"),
            Err(e) => debug!("日志系统已初始化，跳过: {}", e),
        }
        Ok(())
    }
}
