use log::info;

use crate::error::StoreError;
use crate::store::RollingStore;
use crate::validate::validate_bounded_int;

pub const DEFAULT_START: i64 = 0;
pub const DEFAULT_END: i64 = -1;

/// Reads stored samples, newest first. Bad bounds fall back to the whole
/// history rather than failing the request.
pub async fn get_history(
    store: &RollingStore,
    start_raw: Option<&str>,
    end_raw: Option<&str>,
) -> Result<Vec<String>, StoreError> {
    let start = validate_bounded_int(start_raw, DEFAULT_START);
    let end = validate_bounded_int(end_raw, DEFAULT_END);

    let metrics = store.range_query(start, end).await?;
    info!(
        "Historical metrics fetched from index {} to {} ({} entries).",
        start,
        end,
        metrics.len()
    );
    Ok(metrics)
}
