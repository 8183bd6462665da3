use chrono::Utc;

use floodwatch_storage::{AlertRuleRow, SurveillanceStore};

/// Default alert rule definitions for first-time startup.
struct RuleDef {
    name: &'static str,
    alert_type: &'static str,
    region_pattern: &'static str,
    severity: &'static str,
    auto_resolve: bool,
    conditions_json: &'static str,
}

const DEFAULT_RULES: &[RuleDef] = &[
    RuleDef {
        name: "Flooding with active transmission",
        alert_type: "flood_case_compound",
        region_pattern: "*",
        severity: "critical",
        auto_resolve: true,
        conditions_json: r#"[
            {"kind":"metric_threshold","metric":"rainfall_7day_mm","op":"gte","value":150.0},
            {"kind":"flood_observed"},
            {"kind":"metric_threshold","metric":"new_cases","op":"gte","value":1.0}
        ]"#,
    },
    RuleDef {
        name: "Sustained high risk",
        alert_type: "sustained_high_risk",
        region_pattern: "*",
        severity: "critical",
        auto_resolve: true,
        conditions_json: r#"[
            {"kind":"consecutive_level","level":"high","days":2}
        ]"#,
    },
    RuleDef {
        name: "Heavy rainfall",
        alert_type: "heavy_rainfall",
        region_pattern: "*",
        severity: "warning",
        auto_resolve: true,
        conditions_json: r#"[
            {"kind":"metric_threshold","metric":"rainfall_7day_mm","op":"gte","value":150.0}
        ]"#,
    },
    RuleDef {
        name: "Case spike at elevated risk",
        alert_type: "case_spike",
        region_pattern: "*",
        severity: "critical",
        auto_resolve: true,
        conditions_json: r#"[
            {"kind":"metric_threshold","metric":"new_cases","op":"gte","value":20.0},
            {"kind":"level_at_least","level":"medium"}
        ]"#,
    },
];

/// Initialize default alert rules if the database has no rules yet.
///
/// Only seeds when `count_alert_rules() == 0`, so operator-managed rule
/// sets are never touched on restart.
pub async fn init_default_rules(store: &SurveillanceStore) -> anyhow::Result<usize> {
    let count = store.count_alert_rules(None, None).await?;
    if count > 0 {
        tracing::debug!(
            existing = count,
            "Alert rules already exist, skipping seed initialization"
        );
        return Ok(0);
    }

    let now = Utc::now();
    let mut inserted = 0usize;

    for def in DEFAULT_RULES {
        let row = AlertRuleRow {
            id: floodwatch_common::id::next_id(),
            name: def.name.to_string(),
            alert_type: def.alert_type.to_string(),
            region_pattern: def.region_pattern.to_string(),
            severity: def.severity.to_string(),
            enabled: true,
            auto_resolve: def.auto_resolve,
            conditions_json: def.conditions_json.to_string(),
            source: "seed".to_string(),
            created_at: now,
            updated_at: now,
        };
        match store.insert_alert_rule(&row).await {
            Ok(_) => {
                inserted += 1;
                tracing::info!(name = %def.name, alert_type = %def.alert_type, "Seeded alert rule");
            }
            Err(e) => {
                tracing::warn!(name = %def.name, error = %e, "Failed to seed alert rule");
            }
        }
    }

    tracing::info!(
        inserted,
        total = DEFAULT_RULES.len(),
        "Default alert rules initialized"
    );
    Ok(inserted)
}
