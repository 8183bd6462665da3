use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, Utc};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use floodwatch_alert::{AlertEngine, RegionSnapshot};
use floodwatch_common::error::EngineError;
use floodwatch_common::id;
use floodwatch_common::types::{Alert, AlertState, Region, RunSummary};
use floodwatch_risk::{ScoreCalculator, ScoreInputs};
use floodwatch_storage::{StorageError, SurveillanceStore};

use crate::config::RecomputeConfig;

/// Score dates fetched for consecutive-level conditions. Covers any
/// plausible `days` value in a rule; longer streaks are indistinguishable
/// from a 30-day one for alerting purposes.
const LEVEL_HISTORY_DEPTH: usize = 30;

struct RegionOutcome {
    opened: u32,
    resolved: u32,
}

/// Runs the score-classify-alert pipeline across all regions.
///
/// One region's failure never aborts siblings; every run returns a
/// [`RunSummary`] listing per-region errors. A region already being
/// recomputed by another run is counted as failed for this run
/// (single-flight), and recomputing the same date twice is idempotent
/// because scores upsert by (region, score_date).
pub struct RecomputeOrchestrator {
    store: Arc<SurveillanceStore>,
    calculator: Arc<ScoreCalculator>,
    alert_engine: Arc<Mutex<AlertEngine>>,
    config: RecomputeConfig,
    semaphore: Arc<Semaphore>,
    in_flight: Mutex<HashSet<String>>,
}

impl RecomputeOrchestrator {
    pub fn new(
        store: Arc<SurveillanceStore>,
        calculator: Arc<ScoreCalculator>,
        alert_engine: Arc<Mutex<AlertEngine>>,
        config: RecomputeConfig,
    ) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            store,
            calculator,
            alert_engine,
            config,
            semaphore,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    /// Recomputes every region for `score_date` (today when omitted).
    pub async fn run(self: Arc<Self>, requested_date: Option<NaiveDate>) -> RunSummary {
        let score_date = requested_date.unwrap_or_else(|| Utc::now().date_naive());
        let mut summary = RunSummary {
            score_date: Some(score_date),
            ..Default::default()
        };

        let regions = match self.with_retries(|| self.store.list_all_regions()).await {
            Ok(regions) => regions,
            Err(e) => {
                tracing::error!(error = %e, "Recompute run could not list regions");
                summary.errors.push(format!("failed to list regions: {e}"));
                return summary;
            }
        };

        let mut tasks = JoinSet::new();
        for region in regions {
            let this = self.clone();
            tasks.spawn(async move {
                let code = region.code.clone();
                let result = this.recompute_guarded(region, score_date).await;
                (code, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(outcome))) => {
                    summary.regions_succeeded += 1;
                    summary.alerts_opened += outcome.opened;
                    summary.alerts_resolved += outcome.resolved;
                }
                Ok((code, Err(e))) => {
                    tracing::warn!(region = %code, error = %e, "Region recompute failed");
                    summary.regions_failed += 1;
                    summary.errors.push(format!("{code}: {e}"));
                }
                Err(e) => {
                    summary.regions_failed += 1;
                    summary.errors.push(format!("task join error: {e}"));
                }
            }
        }

        tracing::info!(
            score_date = %score_date,
            succeeded = summary.regions_succeeded,
            failed = summary.regions_failed,
            alerts_opened = summary.alerts_opened,
            alerts_resolved = summary.alerts_resolved,
            "Recompute run finished"
        );
        summary
    }

    /// Single-flight guard, bounded-pool permit, and per-region timeout
    /// around the pipeline.
    async fn recompute_guarded(
        &self,
        region: Region,
        score_date: NaiveDate,
    ) -> Result<RegionOutcome, EngineError> {
        {
            let mut in_flight = self
                .in_flight
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !in_flight.insert(region.id.clone()) {
                return Err(EngineError::ConcurrentRecomputeInProgress {
                    region_id: region.id.clone(),
                });
            }
        }

        let timeout = std::time::Duration::from_secs(self.config.region_timeout_secs);
        let result = async {
            let _permit = self
                .semaphore
                .acquire()
                .await
                .map_err(|e| EngineError::StoreUnavailable(e.to_string()))?;
            match tokio::time::timeout(timeout, self.recompute_region(&region, score_date)).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::StoreUnavailable(format!(
                    "region recompute timed out after {}s",
                    self.config.region_timeout_secs
                ))),
            }
        }
        .await;

        let mut in_flight = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        in_flight.remove(&region.id);

        result
    }

    async fn recompute_region(
        &self,
        region: &Region,
        score_date: NaiveDate,
    ) -> Result<RegionOutcome, EngineError> {
        let windows = &self.calculator.config().windows;
        let env_from = score_date - chrono::Duration::days(windows.env_window_days as i64 - 1);
        let case_from = score_date - chrono::Duration::days(windows.case_window_days as i64 - 1);

        let observations = self
            .with_retries(|| {
                self.store
                    .query_environmental_range(&region.id, env_from, score_date)
            })
            .await?;
        let case_reports = self
            .with_retries(|| self.store.query_case_range(&region.id, case_from, score_date))
            .await?;

        let score = self.calculator.compute(&ScoreInputs {
            region,
            score_date,
            observations: &observations,
            case_reports: &case_reports,
        });
        self.with_retries(|| self.store.upsert_risk_score(&score))
            .await?;

        // History includes the score just written, so index 0 is current
        let history = self
            .with_retries(|| {
                self.store
                    .level_history(&region.id, score_date, LEVEL_HISTORY_DEPTH)
            })
            .await?;

        let snapshot = RegionSnapshot {
            region_id: region.id.clone(),
            region_code: region.code.clone(),
            region_name: region.name.clone(),
            score_date,
            level: score.level,
            composite_score: score.composite_score,
            rainfall_mm: observations.iter().rev().find_map(|o| o.rainfall_mm),
            rainfall_7day_mm: score.rainfall_7day_mm,
            ndwi: score.ndwi,
            flood_extent_pct: observations.iter().rev().find_map(|o| o.flood_extent_pct),
            flood_observed: observations.iter().any(|o| o.flood_observed),
            new_cases: score.recent_cases,
            deaths: score.recent_deaths,
            level_history: history.iter().map(|s| s.level).collect(),
        };

        let outcomes = {
            let engine = self
                .alert_engine
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            engine.evaluate(&snapshot)
        };

        let mut outcome = RegionOutcome {
            opened: 0,
            resolved: 0,
        };
        for rule_outcome in &outcomes {
            let existing = self
                .with_retries(|| {
                    self.store
                        .find_unresolved_alert(&region.id, &rule_outcome.alert_type)
                })
                .await?;

            if let Some(trigger) = &rule_outcome.fired {
                // Dedup: an unresolved alert of the same type absorbs the trigger
                if existing.is_none() {
                    let alert = Alert {
                        id: id::next_id(),
                        region_id: region.id.clone(),
                        rule_id: rule_outcome.rule_id.clone(),
                        alert_type: rule_outcome.alert_type.clone(),
                        severity: rule_outcome.severity,
                        level: score.level,
                        title: trigger.title.clone(),
                        message: trigger.message.clone(),
                        triggered_by: trigger.triggered_by.clone(),
                        state: AlertState::Open,
                        created_at: Utc::now(),
                        acknowledged_at: None,
                        acknowledged_by: None,
                        resolved_at: None,
                        resolution: None,
                    };
                    self.with_retries(|| self.store.insert_alert(&alert)).await?;
                    outcome.opened += 1;
                }
            } else if rule_outcome.auto_resolve {
                if let Some(open_alert) = existing {
                    self.with_retries(|| self.store.resolve_alert(&open_alert.id, "auto"))
                        .await?;
                    outcome.resolved += 1;
                    tracing::info!(
                        region = %region.code,
                        alert_type = %rule_outcome.alert_type,
                        alert_id = %open_alert.id,
                        "Alert auto-resolved, conditions cleared"
                    );
                }
            }
        }

        Ok(outcome)
    }

    /// Retries transient database failures with exponential backoff.
    /// Validation errors are never retried.
    async fn with_retries<T, F, Fut>(&self, op: F) -> Result<T, EngineError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = floodwatch_storage::Result<T>>,
    {
        let max_attempts = self.config.store_retry_attempts.max(1);
        let mut attempt: u32 = 0;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    let retryable = matches!(err, StorageError::Db(_));
                    if !retryable || attempt >= max_attempts {
                        return Err(err.into());
                    }
                    let backoff = self
                        .config
                        .store_retry_backoff_ms
                        .saturating_mul(1u64 << (attempt - 1));
                    tracing::warn!(
                        error = %err,
                        attempt,
                        backoff_ms = backoff,
                        "Store operation failed, retrying"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(backoff)).await;
                }
            }
        }
    }
}
