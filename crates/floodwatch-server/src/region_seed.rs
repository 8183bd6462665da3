use chrono::Utc;

use floodwatch_common::id;
use floodwatch_common::types::Region;
use floodwatch_storage::SurveillanceStore;

use crate::config::RegionsSeedFile;

/// Load regions from a JSON seed file and upsert them by code.
/// Re-running against the same file is harmless.
pub async fn init_regions_from_file(
    store: &SurveillanceStore,
    path: &str,
) -> anyhow::Result<usize> {
    let content = std::fs::read_to_string(path)?;
    let seed: RegionsSeedFile = serde_json::from_str(&content)?;

    let now = Utc::now();
    let mut upserted = 0usize;
    for def in &seed.regions {
        let region = Region {
            id: id::next_id(),
            code: def.code.clone(),
            name: def.name.clone(),
            population: def.population,
            area_sq_km: def.area_sq_km,
            water_coverage_pct: def.water_coverage_pct,
            sanitation_coverage_pct: def.sanitation_coverage_pct,
            health_facilities_count: def.health_facilities_count,
            created_at: now,
            updated_at: now,
        };
        match store.upsert_region(&region).await {
            Ok(r) => {
                upserted += 1;
                tracing::info!(code = %r.code, name = %r.name, "Seeded region");
            }
            Err(e) => {
                tracing::warn!(code = %def.code, error = %e, "Failed to seed region");
            }
        }
    }

    tracing::info!(upserted, total = seed.regions.len(), "Regions initialized");
    Ok(upserted)
}
