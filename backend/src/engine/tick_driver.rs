use crate::codec::TickBuffer;
use crate::models::TimeFields;
use crate::propagation::{PropagationService, Result};
use chrono::{DateTime, Utc};

/// Evaluate every loaded object once at `instant` and pack the result.
///
/// The service's per-tick output is dropped before returning; only the
/// encoded buffer survives.
pub fn tick_once<S: PropagationService + ?Sized>(
    service: &mut S,
    instant: &DateTime<Utc>,
) -> Result<TickBuffer> {
    let fields = TimeFields::from_datetime(instant);
    let output = service.tick(&fields)?;
    Ok(TickBuffer::encode(&fields, &output))
}
