//! 组件扫描器抽象接口
//!
//! 提供按包发现类型描述符的能力

use crate::descriptor::TypeDescriptor;
use std::sync::Arc;
use tracing::debug;

/// 组件扫描器 trait
///
/// 返回指定包（模块路径前缀）下的所有类型描述符，是否作为组件注册由调用方判断。
pub trait ComponentScanner: Send + Sync {
    /// 扫描指定包
    fn scan(&self, package: &str) -> Vec<Arc<TypeDescriptor>>;

    /// 获取扫描器名称
    fn name(&self) -> &str;
}

/// 内存中的类型目录
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: Vec<Arc<TypeDescriptor>>,
}

impl TypeCatalog {
    /// 创建空目录
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加类型描述符
    pub fn with(mut self, descriptor: Arc<TypeDescriptor>) -> Self {
        self.add(descriptor);
        self
    }

    /// 添加类型描述符
    pub fn add(&mut self, descriptor: Arc<TypeDescriptor>) {
        if !self.types.iter().any(|t| Arc::ptr_eq(t, &descriptor)) {
            self.types.push(descriptor);
        }
    }

    /// 类型数量
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl ComponentScanner for TypeCatalog {
    fn scan(&self, package: &str) -> Vec<Arc<TypeDescriptor>> {
        let package = package.trim_end_matches("::");
        let found: Vec<_> = self
            .types
            .iter()
            .filter(|descriptor| {
                let type_package = descriptor.type_info().package();
                type_package == package
                    || type_package
                        .strip_prefix(package)
                        .is_some_and(|rest| rest.starts_with("::"))
            })
            .cloned()
            .collect();
        debug!("扫描包 {}: 发现 {} 个类型", package, found.len());
        found
    }

    fn name(&self) -> &str {
        "TypeCatalog"
    }
}
