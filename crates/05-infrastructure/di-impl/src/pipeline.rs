//! 后置处理器流水线
//!
//! 执行顺序：
//!
//! 1. 配置类解析，以及以编程方式添加的注册表后置处理器
//! 2. 注册表中最高优先级（`PriorityOrdered`）的注册表后置处理器
//! 3. 有序（`Ordered`）的注册表后置处理器
//! 4. 反复发现新注册的注册表后置处理器并执行，直到某一轮没有新的处理器
//! 5. 工厂后置处理器：先执行注册表后置处理器的工厂回调，再执行编程添加的，
//!    最后按优先级、有序、无序执行注册表中的工厂后置处理器
//!
//! 每个处理器在一次流水线执行中只调用一次。

use crate::factory::DefaultBeanFactory;
use crate::parser::ConfigurationClassPostProcessor;
use di_abstractions::{
    typed, BeanDefinitionRegistry, BeanDefinitionRegistryPostProcessor, BeanFactoryPostProcessor,
    ConfigurableBeanFactory,
};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use weave_common::{ContainerError, ContainerResult, NamingConventions, OrderKind, TypeInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Priority,
    Ordered,
    Plain,
}

impl Category {
    fn of(order: OrderKind) -> Self {
        match order {
            OrderKind::PriorityOrdered(_) => Self::Priority,
            OrderKind::Ordered(_) => Self::Ordered,
            OrderKind::Unordered => Self::Plain,
        }
    }
}

/// 流水线执行结果
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    /// 按执行顺序排列的处理器名称
    pub invoked: Vec<String>,
    /// 发现新处理器的轮数
    pub rounds: usize,
}

/// 后置处理器流水线
pub struct PostProcessorPipeline {
    factory: Arc<DefaultBeanFactory>,
    max_rounds: usize,
    parser: Option<Arc<ConfigurationClassPostProcessor>>,
    registry_processors: Vec<Arc<dyn BeanDefinitionRegistryPostProcessor>>,
    factory_processors: Vec<Arc<dyn BeanFactoryPostProcessor>>,
}

impl PostProcessorPipeline {
    /// 创建流水线
    pub fn new(factory: Arc<DefaultBeanFactory>, max_rounds: usize) -> Self {
        Self {
            factory,
            max_rounds,
            parser: None,
            registry_processors: Vec::new(),
            factory_processors: Vec::new(),
        }
    }

    /// 设置配置类解析器
    pub fn with_parser(mut self, parser: Arc<ConfigurationClassPostProcessor>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// 编程添加的注册表后置处理器，按添加顺序执行
    pub fn with_registry_processors(
        mut self,
        processors: Vec<Arc<dyn BeanDefinitionRegistryPostProcessor>>,
    ) -> Self {
        self.registry_processors = processors;
        self
    }

    /// 编程添加的工厂后置处理器，按添加顺序执行
    pub fn with_factory_processors(
        mut self,
        processors: Vec<Arc<dyn BeanFactoryPostProcessor>>,
    ) -> Self {
        self.factory_processors = processors;
        self
    }

    /// 执行流水线
    pub fn run(&self) -> ContainerResult<PipelineReport> {
        let registry: &dyn BeanDefinitionRegistry = self.factory.registry().as_ref();
        let mut report = PipelineReport::default();
        let mut executed: Vec<Arc<dyn BeanDefinitionRegistryPostProcessor>> = Vec::new();
        let mut processed: HashSet<String> = HashSet::new();

        if let Some(parser) = &self.parser {
            Self::record(&mut report, parser.name());
            parser.post_process_bean_definition_registry(registry)?;
            executed.push(parser.clone());
        }
        for processor in &self.registry_processors {
            Self::record(&mut report, processor.name());
            processor.post_process_bean_definition_registry(registry)?;
            executed.push(processor.clone());
        }

        for category in [Category::Priority, Category::Ordered] {
            let found =
                self.discover::<dyn BeanDefinitionRegistryPostProcessor>(&processed, Some(category))?;
            for (name, processor) in found {
                processed.insert(name.clone());
                Self::record(&mut report, &name);
                processor.post_process_bean_definition_registry(registry)?;
                executed.push(processor);
            }
            self.reparse(registry)?;
        }

        loop {
            self.reparse(registry)?;
            let found = self.discover::<dyn BeanDefinitionRegistryPostProcessor>(&processed, None)?;
            if found.is_empty() {
                break;
            }
            report.rounds += 1;
            if report.rounds > self.max_rounds {
                return Err(ContainerError::PostProcessorNonTermination {
                    rounds: self.max_rounds,
                });
            }
            debug!("第 {} 轮发现 {} 个注册表后置处理器", report.rounds, found.len());
            for (name, processor) in found {
                processed.insert(name.clone());
                Self::record(&mut report, &name);
                processor.post_process_bean_definition_registry(registry)?;
                executed.push(processor);
            }
        }

        let factory: &dyn ConfigurableBeanFactory = self.factory.as_ref();
        for processor in &executed {
            processor.post_process_bean_factory(factory)?;
        }
        for processor in &self.factory_processors {
            Self::record(&mut report, processor.name());
            processor.post_process_bean_factory(factory)?;
        }

        for category in [Category::Priority, Category::Ordered, Category::Plain] {
            let found = self.discover::<dyn BeanFactoryPostProcessor>(&processed, Some(category))?;
            for (name, processor) in found {
                Self::record(&mut report, &name);
                processor.post_process_bean_factory(factory)?;
            }
        }

        info!(
            "后置处理器执行完成: {} 个处理器，{} 个 bean 定义",
            report.invoked.len(),
            registry.get_bean_definition_count()
        );
        Ok(report)
    }

    fn record(report: &mut PipelineReport, name: &str) {
        debug!("执行后置处理器: {}", name);
        report.invoked.push(name.to_string());
    }

    fn reparse(&self, registry: &dyn BeanDefinitionRegistry) -> ContainerResult<()> {
        if let Some(parser) = &self.parser {
            parser.parse(registry)?;
        }
        Ok(())
    }

    /// 发现注册表中尚未执行的处理器，按排序值排列；`category` 为 `None` 时不区分类别
    fn discover<P>(
        &self,
        processed: &HashSet<String>,
        category: Option<Category>,
    ) -> ContainerResult<Vec<(String, Arc<P>)>>
    where
        P: ?Sized + Send + Sync + 'static,
    {
        let type_info = TypeInfo::of::<P>();
        let registry = self.factory.registry();
        let mut found = Vec::new();
        for name in registry.names_for_type(type_info.id) {
            if processed.contains(&name) {
                continue;
            }
            let definition =
                registry.get_bean_definition(NamingConventions::transformed_bean_name(&name))?;
            if category.is_some_and(|category| Category::of(definition.order) != category) {
                continue;
            }
            found.push((definition.order, name));
        }
        found.sort_by_key(|(order, _)| *order);
        found
            .into_iter()
            .map(|(_, name)| {
                let view = self.factory.get_view(&name, &type_info)?;
                let processor = typed::<P>(&name, &view, &type_info)?;
                Ok((name, processor))
            })
            .collect()
    }
}
