//! bean 定义注册表抽象接口

use crate::definition::BeanDefinition;
use std::any::TypeId;
use std::collections::HashSet;
use std::sync::Arc;
use weave_common::{ContainerError, ContainerResult};

/// bean 定义注册表 trait
///
/// 名称到定义的映射、别名表以及按类型的索引
pub trait BeanDefinitionRegistry: Send + Sync {
    /// 注册定义，同时注册定义中声明的别名
    fn register_bean_definition(&self, name: &str, definition: BeanDefinition)
        -> ContainerResult<()>;

    /// 移除定义
    fn remove_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>>;

    /// 获取定义，支持别名
    fn get_bean_definition(&self, name: &str) -> ContainerResult<Arc<BeanDefinition>>;

    /// 是否包含定义，支持别名
    fn contains_bean_definition(&self, name: &str) -> bool;

    /// 所有定义名称，按注册顺序
    fn get_bean_definition_names(&self) -> Vec<String>;

    /// 定义数量
    fn get_bean_definition_count(&self) -> usize;

    /// 注册别名
    fn register_alias(&self, name: &str, alias: &str) -> ContainerResult<()>;

    /// 获取名称的所有别名
    fn get_aliases(&self, name: &str) -> Vec<String>;

    /// 把别名解析为规范名称
    fn canonical_name(&self, name: &str) -> String;

    /// 能以指定类型获取的 bean 名称，按注册顺序；工厂 bean 自身以 `&名称` 出现
    fn names_for_type(&self, type_id: TypeId) -> Vec<String>;

    /// 名称或别名是否已被占用
    fn is_name_in_use(&self, name: &str) -> bool {
        self.contains_bean_definition(name)
    }
}

/// 依赖图节点
#[derive(Debug, Clone)]
pub struct DependencyGraphNode {
    /// bean 名称
    pub name: String,
    /// 依赖的 bean 名称
    pub dependencies: Vec<String>,
}

/// 循环依赖检测器
pub trait CircularDependencyDetector: Send + Sync {
    /// 检测循环依赖
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> ContainerResult<()>;

    /// 根据 `depends_on` 构建依赖图
    fn build_dependency_graph(&self, registry: &dyn BeanDefinitionRegistry)
        -> Vec<DependencyGraphNode>;
}

/// 默认循环依赖检测器
#[derive(Debug, Default)]
pub struct DefaultCircularDependencyDetector;

impl CircularDependencyDetector for DefaultCircularDependencyDetector {
    fn detect_circular_dependencies(&self, graph: &[DependencyGraphNode]) -> ContainerResult<()> {
        // 使用深度优先搜索检测循环依赖
        let mut visited = HashSet::new();
        let mut visiting = Vec::new();

        for node in graph {
            if !visited.contains(node.name.as_str()) {
                Self::dfs_check(&node.name, graph, &mut visited, &mut visiting)?;
            }
        }

        Ok(())
    }

    fn build_dependency_graph(
        &self,
        registry: &dyn BeanDefinitionRegistry,
    ) -> Vec<DependencyGraphNode> {
        registry
            .get_bean_definition_names()
            .into_iter()
            .filter_map(|name| {
                let definition = registry.get_bean_definition(&name).ok()?;
                Some(DependencyGraphNode {
                    dependencies: definition
                        .depends_on
                        .iter()
                        .map(|dep| registry.canonical_name(dep))
                        .collect(),
                    name,
                })
            })
            .collect()
    }
}

impl DefaultCircularDependencyDetector {
    fn dfs_check<'g>(
        current: &'g str,
        graph: &'g [DependencyGraphNode],
        visited: &mut HashSet<&'g str>,
        visiting: &mut Vec<&'g str>,
    ) -> ContainerResult<()> {
        if let Some(start) = visiting.iter().position(|name| *name == current) {
            // 检测到循环依赖
            let mut chain: Vec<String> = visiting[start..].iter().map(|s| s.to_string()).collect();
            chain.push(current.to_string());
            return Err(ContainerError::CircularDependency { chain });
        }

        if visited.contains(current) {
            return Ok(());
        }

        visiting.push(current);

        // 查找当前节点的依赖
        if let Some(node) = graph.iter().find(|n| n.name == current) {
            for dep in &node.dependencies {
                Self::dfs_check(dep, graph, visited, visiting)?;
            }
        }

        visiting.pop();
        visited.insert(current);

        Ok(())
    }
}
