//! 依赖解析抽象接口
//!
//! [`BeanResolver`] 在创建 bean 的过程中使用，携带当前的解析链以检测循环依赖；
//! [`BeanLookup`] 是交给 bean 的上下文句柄，可以在任意时刻按名称或类型查找 bean。

use serde_json::Value;
use std::sync::Arc;
use weave_common::{view_as, Bean, BeanView, ContainerError, ContainerResult, TypeInfo};

/// 解析上下文
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    /// 当前解析链，用于检测循环依赖
    pub resolution_chain: Vec<String>,
}

impl ResolveContext {
    /// 创建新的解析上下文
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加 bean 名称到解析链
    pub fn push_name(&mut self, name: &str) -> ContainerResult<()> {
        if let Some(start) = self.resolution_chain.iter().position(|n| n == name) {
            let mut chain = self.resolution_chain[start..].to_vec();
            chain.push(name.to_string());
            return Err(ContainerError::CircularDependency { chain });
        }
        self.resolution_chain.push(name.to_string());
        Ok(())
    }

    /// 从解析链中移除最后一个名称
    pub fn pop_name(&mut self) {
        self.resolution_chain.pop();
    }

    /// 是否正在解析指定名称
    pub fn contains(&self, name: &str) -> bool {
        self.resolution_chain.iter().any(|n| n == name)
    }

    /// 当前正在创建的 bean
    pub fn current(&self) -> Option<&str> {
        self.resolution_chain.last().map(String::as_str)
    }
}

/// 创建过程中的依赖解析器
pub trait BeanResolver {
    /// 按名称解析
    fn resolve_by_name(&mut self, name: &str) -> ContainerResult<Bean>;

    /// 按类型解析，可选限定符
    fn resolve_view(&mut self, type_info: &TypeInfo, qualifier: Option<&str>)
        -> ContainerResult<BeanView>;

    /// 按名称解析并转换为指定类型
    fn resolve_named_view(&mut self, name: &str, type_info: &TypeInfo) -> ContainerResult<BeanView>;

    /// 按类型解析，没有候选时返回 `None`
    fn resolve_optional_view(
        &mut self,
        type_info: &TypeInfo,
        qualifier: Option<&str>,
    ) -> ContainerResult<Option<BeanView>>;

    /// 解析指定类型的所有 bean，按注册顺序
    fn resolve_views_of_type(&mut self, type_info: &TypeInfo)
        -> ContainerResult<Vec<(String, BeanView)>>;

    /// 正在创建的 bean 名称
    fn requesting_bean(&self) -> &str;
}

impl dyn BeanResolver + '_ {
    /// 按类型解析
    pub fn get<T: ?Sized + Send + Sync + 'static>(&mut self) -> ContainerResult<Arc<T>> {
        let type_info = TypeInfo::of::<T>();
        let view = self.resolve_view(&type_info, None)?;
        typed(&type_info.module_path, &view, &type_info)
    }

    /// 按名称解析
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        name: &str,
    ) -> ContainerResult<Arc<T>> {
        let type_info = TypeInfo::of::<T>();
        let view = self.resolve_named_view(name, &type_info)?;
        typed(name, &view, &type_info)
    }

    /// 按类型和限定符解析
    pub fn get_qualified<T: ?Sized + Send + Sync + 'static>(
        &mut self,
        qualifier: &str,
    ) -> ContainerResult<Arc<T>> {
        let type_info = TypeInfo::of::<T>();
        let view = self.resolve_view(&type_info, Some(qualifier))?;
        typed(qualifier, &view, &type_info)
    }

    /// 按类型解析可选依赖
    pub fn get_optional<T: ?Sized + Send + Sync + 'static>(
        &mut self,
    ) -> ContainerResult<Option<Arc<T>>> {
        let type_info = TypeInfo::of::<T>();
        self.resolve_optional_view(&type_info, None)?
            .map(|view| typed(&type_info.module_path, &view, &type_info))
            .transpose()
    }

    /// 解析指定类型的所有 bean
    pub fn get_all<T: ?Sized + Send + Sync + 'static>(&mut self) -> ContainerResult<Vec<Arc<T>>> {
        let type_info = TypeInfo::of::<T>();
        self.resolve_views_of_type(&type_info)?
            .iter()
            .map(|(name, view)| typed(name, view, &type_info))
            .collect()
    }
}

/// 上下文句柄
///
/// 只持有对上下文的弱引用，上下文被释放后所有查找返回生命周期错误。
pub trait BeanLookup: Send + Sync {
    /// 按名称获取 bean
    fn get_bean_by_name(&self, name: &str) -> ContainerResult<Bean>;

    /// 按类型获取，可选限定符
    fn get_view(&self, type_info: &TypeInfo, qualifier: Option<&str>) -> ContainerResult<BeanView>;

    /// 按名称获取并转换为指定类型
    fn get_named_view(&self, name: &str, type_info: &TypeInfo) -> ContainerResult<BeanView>;

    /// 获取指定类型的所有 bean
    fn get_views_of_type(&self, type_info: &TypeInfo) -> ContainerResult<Vec<(String, BeanView)>>;

    /// 是否包含指定名称的 bean
    fn contains_bean(&self, name: &str) -> bool;

    /// bean 定义数量
    fn get_bean_definition_count(&self) -> usize;

    /// 所有 bean 定义名称，按注册顺序
    fn get_bean_definition_names(&self) -> Vec<String>;

    /// 发布自定义事件
    fn publish_event(&self, name: &str, payload: Value) -> ContainerResult<()>;

    /// 上下文ID
    fn context_id(&self) -> String;
}

impl dyn BeanLookup + '_ {
    /// 按类型获取
    pub fn get<T: ?Sized + Send + Sync + 'static>(&self) -> ContainerResult<Arc<T>> {
        let type_info = TypeInfo::of::<T>();
        let view = self.get_view(&type_info, None)?;
        typed(&type_info.module_path, &view, &type_info)
    }

    /// 按名称获取
    pub fn get_named<T: ?Sized + Send + Sync + 'static>(&self, name: &str) -> ContainerResult<Arc<T>> {
        let type_info = TypeInfo::of::<T>();
        let view = self.get_named_view(name, &type_info)?;
        typed(name, &view, &type_info)
    }

    /// 按类型和限定符获取
    pub fn get_qualified<T: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: &str,
    ) -> ContainerResult<Arc<T>> {
        let type_info = TypeInfo::of::<T>();
        let view = self.get_view(&type_info, Some(qualifier))?;
        typed(qualifier, &view, &type_info)
    }

    /// 获取指定类型的所有 bean
    pub fn get_beans_of_type<T: ?Sized + Send + Sync + 'static>(
        &self,
    ) -> ContainerResult<Vec<(String, Arc<T>)>> {
        let type_info = TypeInfo::of::<T>();
        self.get_views_of_type(&type_info)?
            .iter()
            .map(|(name, view)| Ok((name.clone(), typed(name, view, &type_info)?)))
            .collect()
    }
}

/// 从类型化视图中取出 `Arc<T>`
pub fn typed<T: ?Sized + 'static>(
    name: &str,
    view: &BeanView,
    type_info: &TypeInfo,
) -> ContainerResult<Arc<T>> {
    view_as::<T>(view).ok_or_else(|| ContainerError::BeanNotOfRequiredType {
        name: name.to_string(),
        required_type: type_info.module_path.clone(),
    })
}
