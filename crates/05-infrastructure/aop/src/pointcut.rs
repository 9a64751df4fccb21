//! 切点表达式
//!
//! 支持的语法：
//!
//! - `execution(返回类型 声明类型.方法名(参数))`，`*` 为通配符，`(..)` 匹配任意参数
//! - `within(类型)` 匹配声明类型的所有方法
//! - `bean(名称)` 匹配 bean 名称
//! - 使用 `&&`、`||`、`!` 和括号组合
//!
//! 类型模式包含 `.` 时匹配以点号分隔的全限定名称（`*` 不跨越 `.`，`..` 匹配任意层级），
//! 否则匹配简短类型名称。

use regex::Regex;
use std::fmt;
use weave_common::{ContainerError, ContainerResult, MethodSignature, TypeInfo, TypeMetadata};

/// 切点
#[derive(Clone)]
pub struct Pointcut {
    expression: String,
    expr: Expr,
}

#[derive(Debug, Clone)]
enum Expr {
    Execution(ExecutionPattern),
    Within(TypePattern),
    Bean(Regex),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
}

#[derive(Debug, Clone)]
struct ExecutionPattern {
    returns: Option<Regex>,
    declaring: Option<TypePattern>,
    method: Regex,
    params: ParamsPattern,
}

#[derive(Debug, Clone)]
enum ParamsPattern {
    Any,
    Exact(Vec<Regex>),
    Prefix(Vec<Regex>),
}

#[derive(Debug, Clone)]
struct TypePattern {
    regex: Regex,
    qualified: bool,
}

impl Pointcut {
    /// 解析切点表达式
    pub fn parse(expression: &str) -> ContainerResult<Self> {
        let mut parser = Parser {
            src: expression,
            pos: 0,
        };
        let expr = parser
            .parse_or()
            .and_then(|expr| {
                parser.skip_ws();
                if parser.pos < parser.src.len() {
                    Err(format!("位置 {} 存在多余的内容", parser.pos))
                } else {
                    Ok(expr)
                }
            })
            .map_err(|message| ContainerError::validation(expression, message))?;
        Ok(Self {
            expression: expression.to_string(),
            expr,
        })
    }

    /// 原始表达式
    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// 是否匹配指定方法
    pub fn matches_method(
        &self,
        target: &TypeInfo,
        bean_name: &str,
        method: &MethodSignature,
    ) -> bool {
        self.expr.matches(target, bean_name, method)
    }

    /// 是否匹配类型的任意一个方法
    pub fn matches_any(&self, metadata: &TypeMetadata, bean_name: &str) -> bool {
        metadata
            .methods
            .iter()
            .any(|method| self.matches_method(&metadata.type_info, bean_name, method))
    }
}

impl fmt::Debug for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pointcut").field(&self.expression).finish()
    }
}

impl fmt::Display for Pointcut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

impl Expr {
    fn matches(&self, target: &TypeInfo, bean_name: &str, method: &MethodSignature) -> bool {
        match self {
            Self::Execution(pattern) => pattern.matches(target, method),
            Self::Within(pattern) => pattern.matches(target),
            Self::Bean(regex) => regex.is_match(bean_name),
            Self::And(left, right) => {
                left.matches(target, bean_name, method) && right.matches(target, bean_name, method)
            }
            Self::Or(left, right) => {
                left.matches(target, bean_name, method) || right.matches(target, bean_name, method)
            }
            Self::Not(inner) => !inner.matches(target, bean_name, method),
        }
    }
}

impl ExecutionPattern {
    fn parse(body: &str) -> Result<Self, String> {
        let body = body.trim();
        let open = body
            .find('(')
            .ok_or_else(|| format!("execution 缺少参数列表: {body}"))?;
        let params = body[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| format!("execution 参数列表未闭合: {body}"))?;

        let mut head = body[..open].split_whitespace();
        let (Some(returns), Some(qualified_method), None) = (head.next(), head.next(), head.next())
        else {
            return Err(format!("execution 需要 `返回类型 方法` 形式: {body}"));
        };

        let (declaring, method) = match qualified_method.rsplit_once('.') {
            Some((declaring, method)) => (Some(TypePattern::parse(declaring)?), method),
            None => (None, qualified_method),
        };

        Ok(Self {
            returns: (returns != "*").then(|| wildcard(returns)).transpose()?,
            declaring,
            method: wildcard(method)?,
            params: ParamsPattern::parse(params)?,
        })
    }

    fn matches(&self, target: &TypeInfo, method: &MethodSignature) -> bool {
        self.returns
            .as_ref()
            .map_or(true, |returns| returns.is_match(&method.returns))
            && self
                .declaring
                .as_ref()
                .map_or(true, |declaring| declaring.matches(target))
            && self.method.is_match(&method.name)
            && self.params.matches(&method.params)
    }
}

impl ParamsPattern {
    fn parse(params: &str) -> Result<Self, String> {
        let params = params.trim();
        if params == ".." {
            return Ok(Self::Any);
        }
        if params.is_empty() {
            return Ok(Self::Exact(Vec::new()));
        }
        let items: Vec<&str> = params.split(',').map(str::trim).collect();
        match items.split_last() {
            Some((&"..", prefix)) => Ok(Self::Prefix(
                prefix.iter().map(|p| wildcard(p)).collect::<Result<_, _>>()?,
            )),
            _ if items.contains(&"..") => Err(format!("`..` 只能出现在参数列表末尾: {params}")),
            _ => Ok(Self::Exact(
                items.iter().map(|p| wildcard(p)).collect::<Result<_, _>>()?,
            )),
        }
    }

    fn matches(&self, params: &[String]) -> bool {
        let pairwise = |patterns: &[Regex]| {
            patterns
                .iter()
                .zip(params)
                .all(|(pattern, param)| pattern.is_match(param))
        };
        match self {
            Self::Any => true,
            Self::Exact(patterns) => patterns.len() == params.len() && pairwise(patterns),
            Self::Prefix(patterns) => patterns.len() <= params.len() && pairwise(patterns),
        }
    }
}

impl TypePattern {
    fn parse(pattern: &str) -> Result<Self, String> {
        if pattern.contains('.') {
            let mut source = String::from("^");
            let mut rest = pattern;
            while let Some(ch) = rest.chars().next() {
                if let Some(tail) = rest.strip_prefix("..") {
                    source.push_str(r"\.(?:.*\.)?");
                    rest = tail;
                    continue;
                }
                match ch {
                    '.' => source.push_str(r"\."),
                    '*' => source.push_str("[^.]*"),
                    other => source.push_str(&regex::escape(&other.to_string())),
                }
                rest = &rest[ch.len_utf8()..];
            }
            source.push('$');
            Ok(Self {
                regex: Regex::new(&source).map_err(|e| e.to_string())?,
                qualified: true,
            })
        } else {
            Ok(Self {
                regex: wildcard(pattern)?,
                qualified: false,
            })
        }
    }

    fn matches(&self, target: &TypeInfo) -> bool {
        if self.qualified {
            self.regex.is_match(&target.qualified_name())
        } else {
            self.regex.is_match(target.short_name())
        }
    }
}

/// `*` 通配符模式转换为正则表达式
fn wildcard(pattern: &str) -> Result<Regex, String> {
    let source = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    Regex::new(&format!("^{source}$")).map_err(|e| e.to_string())
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn parse_or(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_and()?;
        while self.eat("||") {
            left = Expr::Or(Box::new(left), Box::new(self.parse_and()?));
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, String> {
        let mut left = self.parse_unary()?;
        while self.eat("&&") {
            left = Expr::And(Box::new(left), Box::new(self.parse_unary()?));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr, String> {
        if self.eat("!") {
            return Ok(Expr::Not(Box::new(self.parse_unary()?)));
        }
        if self.eat("(") {
            let inner = self.parse_or()?;
            if !self.eat(")") {
                return Err(format!("位置 {} 缺少 `)`", self.pos));
            }
            return Ok(inner);
        }
        self.parse_designator()
    }

    fn parse_designator(&mut self) -> Result<Expr, String> {
        let src = self.src;
        self.skip_ws();
        let name_len = self
            .rest()
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(self.rest().len());
        let name = &src[self.pos..self.pos + name_len];
        self.pos += name_len;
        if !self.eat("(") {
            return Err(format!("切点指示符 `{name}` 缺少 `(`"));
        }

        let start = self.pos;
        let mut depth = 1_usize;
        let mut end = None;
        for (offset, ch) in self.rest().char_indices() {
            match ch {
                '(' => depth += 1,
                ')' => {
                    depth -= 1;
                    if depth == 0 {
                        end = Some(start + offset);
                        break;
                    }
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| format!("切点指示符 `{name}` 的括号未闭合"))?;
        let body = &src[start..end];
        self.pos = end + 1;

        match name {
            "execution" => Ok(Expr::Execution(ExecutionPattern::parse(body)?)),
            "within" => Ok(Expr::Within(TypePattern::parse(body.trim())?)),
            "bean" => Ok(Expr::Bean(wildcard(body.trim())?)),
            "" => Err(format!("位置 {start} 缺少切点指示符")),
            other => Err(format!("不支持的切点指示符: {other}")),
        }
    }
}
