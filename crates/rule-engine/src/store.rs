//! 规则存储管理
//!
//! 使用 DashMap 提供线程安全的规则缓存，按规则名称加载、更新、删除和评估。

use crate::compiler::{CompiledRule, RuleCompiler};
use crate::error::{Result, RuleError};
use crate::executor::{EvaluationResult, RuleExecutor};
use crate::models::RuleContext;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 规则存储
#[derive(Clone)]
pub struct RuleStore {
    /// 编译后的规则缓存
    rules: Arc<DashMap<String, CompiledRule>>,
    /// 规则编译器
    compiler: Arc<parking_lot::Mutex<RuleCompiler>>,
}

impl RuleStore {
    /// 创建新的规则存储
    pub fn new() -> Self {
        Self {
            rules: Arc::new(DashMap::new()),
            compiler: Arc::new(parking_lot::Mutex::new(RuleCompiler::new())),
        }
    }

    /// 获取当前存储的规则数量
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 检查存储是否为空
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 加载规则，同名规则会被替换
    #[instrument(skip(self, source), fields(rule_name = %name))]
    pub fn load(&self, name: &str, source: &str) -> Result<()> {
        let compiled = {
            let mut compiler = self.compiler.lock();
            compiler.compile(name, source)?
        };

        self.rules.insert(compiled.name.clone(), compiled);

        info!("规则已加载: {}", name);
        Ok(())
    }

    /// 更新规则
    #[instrument(skip(self, source))]
    pub fn update(&self, name: &str, source: &str) -> Result<()> {
        if !self.rules.contains_key(name) {
            warn!("更新不存在的规则: {}", name);
            return Err(RuleError::RuleNotFound(name.to_string()));
        }

        self.load(name, source)
    }

    /// 删除规则
    #[instrument(skip(self))]
    pub fn delete(&self, name: &str) -> Result<()> {
        if self.rules.remove(name).is_some() {
            info!("规则已删除: {}", name);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", name);
            Err(RuleError::RuleNotFound(name.to_string()))
        }
    }

    /// 获取规则
    pub fn get(&self, name: &str) -> Option<CompiledRule> {
        self.rules.get(name).map(|r| r.clone())
    }

    /// 检查规则是否存在
    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// 获取所有规则名称（已排序）
    pub fn list_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rules.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// 按名称评估规则
    pub fn evaluate(
        &self,
        name: &str,
        context: &RuleContext,
        executor: &RuleExecutor,
    ) -> Result<EvaluationResult> {
        let rule = self
            .rules
            .get(name)
            .ok_or_else(|| RuleError::RuleNotFound(name.to_string()))?;

        Ok(executor.execute(&rule, context))
    }

    /// 批量加载规则
    ///
    /// 单条规则失败不影响其他规则，返回成功加载的规则名称。
    #[instrument(skip(self, rules))]
    pub fn load_batch<I, N, S>(&self, rules: I) -> Vec<String>
    where
        I: IntoIterator<Item = (N, S)>,
        N: AsRef<str>,
        S: AsRef<str>,
    {
        let mut loaded = Vec::new();
        let mut errors = Vec::new();

        for (name, source) in rules {
            let name = name.as_ref();
            match self.load(name, source.as_ref()) {
                Ok(()) => loaded.push(name.to_string()),
                Err(e) => errors.push((name.to_string(), e)),
            }
        }

        if !errors.is_empty() {
            warn!("批量加载部分失败: {:?}", errors);
        }

        info!("批量加载完成: {} 成功, {} 失败", loaded.len(), errors.len());
        loaded
    }

    /// 清空所有规则
    #[instrument(skip(self))]
    pub fn clear(&self) {
        let count = self.rules.len();
        self.rules.clear();
        info!("已清空 {} 条规则", count);
    }

    /// 获取规则统计信息
    pub fn stats(&self) -> RuleStoreStats {
        let rules_count = self.rules.len();
        let always_true_count = self
            .rules
            .iter()
            .filter(|r| r.rule.is_always_true())
            .count();
        let total_fields: usize = self.rules.iter().map(|r| r.required_fields.len()).sum();

        RuleStoreStats {
            rules_count,
            always_true_count,
            total_fields,
            avg_fields_per_rule: if rules_count > 0 {
                total_fields as f64 / rules_count as f64
            } else {
                0.0
            },
        }
    }
}

impl Default for RuleStore {
    fn default() -> Self {
        Self::new()
    }
}

/// 规则存储统计信息
#[derive(Debug, Clone)]
pub struct RuleStoreStats {
    /// 规则总数
    pub rules_count: usize,
    /// 恒为真（空）规则数
    pub always_true_count: usize,
    /// 所有规则使用的字段总数
    pub total_fields: usize,
    /// 平均每条规则使用的字段数
    pub avg_fields_per_rule: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    const SAMPLE_RULE: &str = "printer = 'on' && copies > 0";

    #[test]
    fn test_load_rule() {
        let store = RuleStore::new();
        store.load("print_enabled", SAMPLE_RULE).unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.contains("print_enabled"));
    }

    #[test]
    fn test_load_invalid_rule() {
        let store = RuleStore::new();
        assert!(store.load("broken", "printer ===").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn test_get_rule() {
        let store = RuleStore::new();
        store.load("print_enabled", SAMPLE_RULE).unwrap();

        let rule = store.get("print_enabled").unwrap();
        assert_eq!(rule.name(), "print_enabled");
        assert_eq!(rule.source(), SAMPLE_RULE);
    }

    #[test]
    fn test_get_nonexistent_rule() {
        let store = RuleStore::new();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_update_rule() {
        let store = RuleStore::new();
        store.load("print_enabled", SAMPLE_RULE).unwrap();

        store.update("print_enabled", "printer = 'on'").unwrap();

        let rule = store.get("print_enabled").unwrap();
        assert_eq!(rule.source(), "printer = 'on'");
        assert_eq!(rule.compile_version, 2);
    }

    #[test]
    fn test_update_nonexistent_rule() {
        let store = RuleStore::new();
        let result = store.update("print_enabled", SAMPLE_RULE);
        assert!(matches!(result, Err(RuleError::RuleNotFound(_))));
    }

    #[test]
    fn test_delete_rule() {
        let store = RuleStore::new();
        store.load("print_enabled", SAMPLE_RULE).unwrap();

        store.delete("print_enabled").unwrap();

        assert!(!store.contains("print_enabled"));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_delete_nonexistent_rule() {
        let store = RuleStore::new();
        assert!(store.delete("nonexistent").is_err());
    }

    #[test]
    fn test_list_names() {
        let store = RuleStore::new();
        store.load("b_rule", "x = 1").unwrap();
        store.load("a_rule", "y = 2").unwrap();

        assert_eq!(store.list_names(), vec!["a_rule", "b_rule"]);
    }

    #[test]
    fn test_evaluate_by_name() {
        let store = RuleStore::new();
        store.load("print_enabled", SAMPLE_RULE).unwrap();
        let executor = RuleExecutor::new();

        let ctx = RuleContext::new().with("printer", "on").with("copies", 3);
        let result = store.evaluate("print_enabled", &ctx, &executor).unwrap();
        assert!(result.matched);
        assert_eq!(result.value, Value::Bool(true));

        let missing = store.evaluate("nonexistent", &ctx, &executor);
        assert!(matches!(missing, Err(RuleError::RuleNotFound(_))));
    }

    #[test]
    fn test_load_batch() {
        let store = RuleStore::new();
        let loaded = store.load_batch([
            ("rule_1", "a = 1"),
            ("rule_2", "b = 2 &&"),
            ("rule_3", "c = 3"),
        ]);

        assert_eq!(loaded, vec!["rule_1", "rule_3"]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_clear() {
        let store = RuleStore::new();
        store.load("rule_1", "a = 1").unwrap();
        store.load("rule_2", "b = 2").unwrap();

        store.clear();

        assert!(store.is_empty());
    }

    #[test]
    fn test_stats() {
        let store = RuleStore::new();
        store.load("rule_1", "a = 1 && b = 2").unwrap();
        store.load("rule_2", "c = d").unwrap();
        store.load("rule_3", "").unwrap();

        let stats = store.stats();

        assert_eq!(stats.rules_count, 3);
        assert_eq!(stats.always_true_count, 1);
        assert_eq!(stats.total_fields, 4);
        assert!((stats.avg_fields_per_rule - 4.0 / 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_concurrent_access() {
        use std::thread;

        let store = RuleStore::new();
        let store_clone = store.clone();

        let handle = thread::spawn(move || {
            for i in 0..100 {
                store_clone
                    .load(&format!("rule-{}", i), &format!("value = {}", i))
                    .unwrap();
            }
        });

        for i in 100..200 {
            store
                .load(&format!("rule-{}", i), &format!("value = {}", i))
                .unwrap();
        }

        handle.join().unwrap();

        assert_eq!(store.len(), 200);
    }
}
