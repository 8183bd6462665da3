use floodwatch_common::types::Severity;

use crate::condition::Condition;
use crate::RegionSnapshot;

/// An alert rule compiled from its stored row: parsed severity and
/// condition list, ready for evaluation.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub id: String,
    pub name: String,
    pub alert_type: String,
    /// Glob over region codes (e.g. `"CR-*"` or `"*"`)
    pub region_pattern: String,
    pub severity: Severity,
    pub auto_resolve: bool,
    pub conditions: Vec<Condition>,
}

impl CompiledRule {
    pub fn matches_region(&self, region_code: &str) -> bool {
        if self.region_pattern == "*" {
            return true;
        }
        glob_match::glob_match(&self.region_pattern, region_code)
    }

    fn is_met(&self, snapshot: &RegionSnapshot) -> bool {
        !self.conditions.is_empty() && self.conditions.iter().all(|c| c.is_met(snapshot))
    }

    fn trigger(&self, snapshot: &RegionSnapshot) -> AlertTrigger {
        let details: Vec<String> = self
            .conditions
            .iter()
            .map(|c| c.describe(snapshot))
            .collect();
        AlertTrigger {
            title: format!("{}: {}", self.name, snapshot.region_name),
            message: format!(
                "Rule '{}' fired for {} on {}: {}",
                self.name,
                snapshot.region_name,
                snapshot.score_date,
                details.join("; ")
            ),
            triggered_by: snapshot.signals_json(),
        }
    }
}

/// Payload for a newly opened alert.
#[derive(Debug, Clone)]
pub struct AlertTrigger {
    pub title: String,
    pub message: String,
    pub triggered_by: serde_json::Value,
}

/// Result of evaluating one rule against one region. `fired` is `None`
/// when the conditions did not hold, which callers use to auto-resolve
/// a previously opened alert of the same type.
#[derive(Debug)]
pub struct RuleOutcome {
    pub rule_id: String,
    pub alert_type: String,
    pub severity: Severity,
    pub auto_resolve: bool,
    pub fired: Option<AlertTrigger>,
}

/// Holds the compiled rule set and evaluates region snapshots.
///
/// The engine is stateless between evaluations: deduplication lives in
/// the alert store (one unresolved alert per region and type), not here.
pub struct AlertEngine {
    rules: Vec<CompiledRule>,
}

impl AlertEngine {
    pub fn new(rules: Vec<CompiledRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    pub fn get_rule(&self, id: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Replace all rules with a new set (rule CRUD reload path).
    pub fn replace_rules(&mut self, rules: Vec<CompiledRule>) {
        self.rules = rules;
    }

    /// Evaluates every rule whose region pattern matches the snapshot.
    /// Non-matching rules produce no outcome at all; they neither fire
    /// nor clear alerts for that region.
    pub fn evaluate(&self, snapshot: &RegionSnapshot) -> Vec<RuleOutcome> {
        let mut outcomes = Vec::new();
        for rule in &self.rules {
            if !rule.matches_region(&snapshot.region_code) {
                continue;
            }
            let fired = if rule.is_met(snapshot) {
                tracing::debug!(
                    rule_id = %rule.id,
                    region = %snapshot.region_code,
                    alert_type = %rule.alert_type,
                    "Alert rule fired"
                );
                Some(rule.trigger(snapshot))
            } else {
                None
            };
            outcomes.push(RuleOutcome {
                rule_id: rule.id.clone(),
                alert_type: rule.alert_type.clone(),
                severity: rule.severity,
                auto_resolve: rule.auto_resolve,
                fired,
            });
        }
        outcomes
    }
}
