use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};

use floodwatch_common::id;
use floodwatch_common::types::CaseReport;

use crate::entities::case_report::{self, Column, Entity};
use crate::error::{Result, StorageError};
use crate::store::SurveillanceStore;

fn to_domain(m: case_report::Model) -> CaseReport {
    CaseReport {
        region_id: m.region_id,
        report_date: m.report_date,
        new_cases: m.new_cases,
        deaths: m.deaths,
        suspected_cases: m.suspected_cases,
        confirmed_cases: m.confirmed_cases,
    }
}

fn check_count(name: &str, value: i64) -> Result<()> {
    if value < 0 {
        return Err(StorageError::InvalidMetric {
            reason: format!("{name} must be non-negative: {value}"),
        });
    }
    Ok(())
}

impl SurveillanceStore {
    /// Writes one case report, overwriting any existing row for the same
    /// (region, date) key.
    pub async fn upsert_case_report(&self, report: &CaseReport) -> Result<CaseReport> {
        self.require_region(&report.region_id).await?;
        check_count("new_cases", report.new_cases)?;
        check_count("deaths", report.deaths)?;
        check_count("suspected_cases", report.suspected_cases)?;
        check_count("confirmed_cases", report.confirmed_cases)?;

        let now = Utc::now().fixed_offset();
        let existing = Entity::find()
            .filter(Column::RegionId.eq(report.region_id.as_str()))
            .filter(Column::ReportDate.eq(report.report_date))
            .one(self.db())
            .await?;
        let model = if let Some(m) = existing {
            let mut am: case_report::ActiveModel = m.into();
            am.new_cases = Set(report.new_cases);
            am.deaths = Set(report.deaths);
            am.suspected_cases = Set(report.suspected_cases);
            am.confirmed_cases = Set(report.confirmed_cases);
            am.updated_at = Set(now);
            am.update(self.db()).await?
        } else {
            let am = case_report::ActiveModel {
                id: Set(id::next_id()),
                region_id: Set(report.region_id.clone()),
                report_date: Set(report.report_date),
                new_cases: Set(report.new_cases),
                deaths: Set(report.deaths),
                suspected_cases: Set(report.suspected_cases),
                confirmed_cases: Set(report.confirmed_cases),
                created_at: Set(now),
                updated_at: Set(now),
            };
            am.insert(self.db()).await?
        };
        Ok(to_domain(model))
    }

    /// Case reports for one region in `[from, to]`, ascending by date.
    pub async fn query_case_range(
        &self,
        region_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<CaseReport>> {
        let rows = Entity::find()
            .filter(Column::RegionId.eq(region_id))
            .filter(Column::ReportDate.gte(from))
            .filter(Column::ReportDate.lte(to))
            .order_by(Column::ReportDate, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    pub async fn list_case_reports(
        &self,
        region_id: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CaseReport>> {
        let mut q = Entity::find();
        if let Some(rid) = region_id {
            q = q.filter(Column::RegionId.eq(rid));
        }
        if let Some(f) = from {
            q = q.filter(Column::ReportDate.gte(f));
        }
        if let Some(t) = to {
            q = q.filter(Column::ReportDate.lte(t));
        }
        let rows = q
            .order_by(Column::ReportDate, Order::Desc)
            .limit(limit as u64)
            .offset(offset as u64)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_domain).collect())
    }

    pub async fn count_case_reports(
        &self,
        region_id: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<u64> {
        let mut q = Entity::find();
        if let Some(rid) = region_id {
            q = q.filter(Column::RegionId.eq(rid));
        }
        if let Some(f) = from {
            q = q.filter(Column::ReportDate.gte(f));
        }
        if let Some(t) = to {
            q = q.filter(Column::ReportDate.lte(t));
        }
        Ok(q.count(self.db()).await?)
    }
}
