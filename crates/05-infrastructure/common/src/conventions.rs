//! 约定规范定义
//!
//! 提供 bean 命名、作用域名称和名称前缀的约定规范

use crate::metadata::TypeInfo;

/// 单例作用域名称
pub const SCOPE_SINGLETON: &str = "singleton";

/// 原型作用域名称
pub const SCOPE_PROTOTYPE: &str = "prototype";

/// 线程作用域名称
pub const SCOPE_THREAD: &str = "thread";

/// 获取工厂 bean 本身时使用的名称前缀
pub const FACTORY_BEAN_PREFIX: &str = "&";

/// 作用域代理的目标 bean 名称前缀
pub const SCOPED_TARGET_PREFIX: &str = "scopedTarget.";

/// 命名约定规范
#[derive(Debug)]
pub struct NamingConventions;

impl NamingConventions {
    /// 从类型信息生成默认 bean 名称
    ///
    /// 简短类型名首字母小写；前两个字符都是大写时保持原样（如 `URLParser`）。
    pub fn bean_name(type_info: &TypeInfo) -> String {
        Self::decapitalize(type_info.short_name())
    }

    /// 首字母小写
    pub fn decapitalize(name: &str) -> String {
        let mut chars = name.chars();
        let Some(first) = chars.next() else {
            return String::new();
        };
        if chars.next().is_some_and(char::is_uppercase) && first.is_uppercase() {
            return name.to_string();
        }
        first.to_lowercase().chain(name.chars().skip(1)).collect()
    }

    /// 是否为工厂 bean 自身的引用（以 `&` 开头）
    pub fn is_factory_dereference(name: &str) -> bool {
        name.starts_with(FACTORY_BEAN_PREFIX)
    }

    /// 去掉所有的 `&` 前缀
    pub fn transformed_bean_name(name: &str) -> &str {
        name.trim_start_matches(FACTORY_BEAN_PREFIX)
    }

    /// 工厂 bean 自身的引用名称
    pub fn factory_bean_name(name: &str) -> String {
        format!("{FACTORY_BEAN_PREFIX}{}", Self::transformed_bean_name(name))
    }

    /// 作用域代理目标 bean 的名称
    pub fn scoped_target_name(name: &str) -> String {
        format!("{SCOPED_TARGET_PREFIX}{name}")
    }

    /// 是否为作用域代理目标 bean 的名称
    pub fn is_scoped_target(name: &str) -> bool {
        name.starts_with(SCOPED_TARGET_PREFIX)
    }

}
