use std::sync::Mutex;

use floodwatch_alert::{AlertEngine, CompiledRule, Condition};
use floodwatch_common::types::Severity;
use floodwatch_storage::{AlertRuleRow, Result, SurveillanceStore};

// ---- DB row -> compiled rule ----

/// Compile a single `AlertRuleRow` into an executable rule.
pub fn build_rule_from_row(row: &AlertRuleRow) -> anyhow::Result<CompiledRule> {
    let severity: Severity = row
        .severity
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{e}"))?;
    let conditions: Vec<Condition> = serde_json::from_str(&row.conditions_json)
        .map_err(|e| anyhow::anyhow!("invalid conditions: {e}"))?;
    if conditions.is_empty() {
        anyhow::bail!("empty condition list");
    }
    Ok(CompiledRule {
        id: row.id.clone(),
        name: row.name.clone(),
        alert_type: row.alert_type.clone(),
        region_pattern: row.region_pattern.clone(),
        severity,
        auto_resolve: row.auto_resolve,
        conditions,
    })
}

/// Compile multiple rows, skipping invalid ones with warnings.
pub fn build_rules_from_rows(rows: &[AlertRuleRow]) -> Vec<CompiledRule> {
    let mut rules = Vec::with_capacity(rows.len());
    for row in rows {
        match build_rule_from_row(row) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                tracing::warn!(
                    rule_id = %row.id,
                    rule_name = %row.name,
                    error = %e,
                    "Skipping invalid alert rule"
                );
            }
        }
    }
    rules
}

// ---- Engine reload ----

/// Reload alert engine rules from the database. Returns the number of
/// loaded rules.
pub async fn reload_alert_engine(
    store: &SurveillanceStore,
    alert_engine: &Mutex<AlertEngine>,
) -> Result<usize> {
    let rows = store.list_enabled_alert_rules().await?;
    let rules = build_rules_from_rows(&rows);
    let count = rules.len();

    let mut engine = alert_engine
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    engine.replace_rules(rules);

    tracing::info!(rule_count = count, "Alert engine reloaded from DB");
    Ok(count)
}
