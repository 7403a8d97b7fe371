//! 指标模块
//!
//! 基于 metrics crate 的门面记录规则相关指标。未安装 recorder 时记录为空操作。

/// 注册指标描述
pub fn describe_metrics() {
    metrics::describe_counter!(
        "rule_parse_failures_total",
        "Total number of rule sources that failed to parse"
    );
    metrics::describe_counter!("rule_evaluations_total", "Total number of rule evaluations");
    metrics::describe_histogram!(
        "rule_evaluation_duration_seconds",
        "Rule evaluation duration in seconds"
    );
}

/// 记录规则解析失败
#[inline]
pub fn record_rule_parse_failure() {
    metrics::counter!("rule_parse_failures_total").increment(1);
}

/// 记录规则评估
#[inline]
pub fn record_rule_evaluation(rule: &str, matched: bool, duration_secs: f64) {
    metrics::counter!(
        "rule_evaluations_total",
        "rule" => rule.to_string(),
        "matched" => matched.to_string()
    )
    .increment(1);

    metrics::histogram!(
        "rule_evaluation_duration_seconds",
        "rule" => rule.to_string()
    )
    .record(duration_secs);
}
