//! 规则引擎命令行
//!
//! 加载配置中的规则，从文件或标准输入读取 JSON 上下文，
//! 逐条评估并以 JSON 输出结果。
//!
//! 用法：`rule-engine [CONTEXT_JSON_FILE]`

use anyhow::{Context, Result};
use photobooth_shared::config::AppConfig;
use photobooth_shared::observability;
use rule_engine::{ComparisonMode, RuleContext, RuleExecutor, RuleStore};
use std::io::Read;
use tracing::{info, warn};

const SERVICE_NAME: &str = "rule-engine";

fn main() -> Result<()> {
    // 统一加载配置：从 config/{service_name}.toml 加载，包含可观测性配置
    let config = AppConfig::load(SERVICE_NAME).unwrap_or_else(|e| {
        eprintln!("Failed to load config, using defaults: {}", e);
        AppConfig::default()
    });

    let obs_config = config.observability.clone().with_service_name(SERVICE_NAME);
    observability::init(&obs_config)?;

    let store = RuleStore::new();
    let loaded = store.load_batch(&config.rules.definitions);
    if loaded.len() < config.rules.definitions.len() {
        warn!(
            configured = config.rules.definitions.len(),
            loaded = loaded.len(),
            "Some rules failed to load"
        );
    }
    info!("Loaded {} rules", loaded.len());

    let context = read_context(std::env::args().nth(1))?;

    let comparison = if config.rules.strict_comparison {
        ComparisonMode::Strict
    } else {
        ComparisonMode::Loose
    };
    let executor = RuleExecutor::new().with_comparison(comparison);

    let mut results = Vec::with_capacity(loaded.len());
    for name in store.list_names() {
        results.push(store.evaluate(&name, &context, &executor)?);
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}

/// 读取评估上下文，未指定文件时读取标准输入
fn read_context(path: Option<String>) -> Result<RuleContext> {
    let json = match path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read context file {}", path))?,
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read context from stdin")?;
            buffer
        }
    };

    if json.trim().is_empty() {
        return Ok(RuleContext::new());
    }

    RuleContext::from_json(&json).context("Context must be a flat JSON object of primitives")
}
