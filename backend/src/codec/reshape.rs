//! Conversion of the service's analysis table into owned consumer records.

use super::CodecError;
use crate::models::{AnalysisRow, HistogramBucket, TimeFields, TransitDetail};
use crate::propagation::{AnalysisRowRaw, HistogramBucketRaw, TransitSeries};
use chrono::{DateTime, Utc};

fn instant(fields: &TimeFields) -> Result<DateTime<Utc>, CodecError> {
    fields.to_datetime().ok_or(CodecError::InvalidTime(*fields))
}

fn reshape_series(series: &TransitSeries) -> Result<TransitDetail, CodecError> {
    let len = series.time.len();
    let lengths = [
        series.azimuth.len(),
        series.eclipse_depth.len(),
        series.elevation.len(),
        series.range_sat.len(),
        series.sunlit.len(),
    ];
    if lengths.iter().any(|l| *l != len) {
        return Err(CodecError::RaggedSeries {
            expected: len,
            found: lengths.to_vec(),
        });
    }

    Ok(TransitDetail {
        azimuth: series.azimuth.clone(),
        eclipse_depth: series.eclipse_depth.clone(),
        elevation: series.elevation.clone(),
        range_sat: series.range_sat.clone(),
        sunlit: series.sunlit.clone(),
        time: series.time.iter().map(instant).collect::<Result<_, _>>()?,
    })
}

pub fn reshape_rows(rows: &[AnalysisRowRaw]) -> Result<Vec<AnalysisRow>, CodecError> {
    rows.iter()
        .map(|row| {
            Ok(AnalysisRow {
                id: row.id.clone(),
                transit_count: row.transit,
                starting_event: instant(&row.starting_time)?,
                ending_event: instant(&row.ending_time)?,
                max_elevation: row.max_elevation,
                apex_azimuth: row.apex_azimuth,
                sunlit_ratio: row.sunlit_ratio,
                detailed: reshape_series(&row.detailed)?,
            })
        })
        .collect()
}

pub fn reshape_histogram(
    buckets: &[HistogramBucketRaw],
) -> Result<Vec<HistogramBucket>, CodecError> {
    buckets
        .iter()
        .map(|b| {
            Ok(HistogramBucket {
                time: instant(&b.time)?,
                overfly_count: b.overfly,
                sunlit_count: b.sunlit,
                visible_count: b.visible,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fields(second: f64) -> TimeFields {
        TimeFields {
            year: 2023,
            month: 6,
            day: 1,
            hour: 22,
            minute: 0,
            second,
        }
    }

    fn raw_row() -> AnalysisRowRaw {
        AnalysisRowRaw {
            id: "44713:0".into(),
            transit: 1,
            starting_time: fields(0.0),
            ending_time: fields(20.0),
            max_elevation: 62.5,
            apex_azimuth: 171.0,
            sunlit_ratio: 0.5,
            detailed: TransitSeries {
                azimuth: vec![160.0, 171.0],
                eclipse_depth: vec![-3.0, 1.0],
                elevation: vec![40.0, 62.5],
                range_sat: vec![900.0, 600.0],
                sunlit: vec![true, false],
                time: vec![fields(0.0), fields(20.0)],
            },
        }
    }

    #[test]
    fn test_reshape_row() {
        let rows = reshape_rows(&[raw_row()]).unwrap();
        let row = &rows[0];
        assert_eq!(row.id, "44713:0");
        assert_eq!(row.transit_count, 1);
        assert_eq!(
            row.ending_event,
            Utc.with_ymd_and_hms(2023, 6, 1, 22, 0, 20).unwrap()
        );
        assert_eq!(row.detailed.len(), 2);
        assert_eq!(row.detailed.sunlit, vec![true, false]);
    }

    #[test]
    fn test_ragged_series_is_rejected() {
        let mut raw = raw_row();
        raw.detailed.sunlit.pop();
        assert!(matches!(
            reshape_rows(&[raw]),
            Err(CodecError::RaggedSeries { expected: 2, .. })
        ));
    }

    #[test]
    fn test_reshape_histogram_keeps_order() {
        let raw: Vec<HistogramBucketRaw> = (0..3)
            .map(|i| HistogramBucketRaw {
                time: fields(i as f64 * 10.0),
                overfly: i,
                sunlit: 0,
                visible: 0,
            })
            .collect();
        let buckets = reshape_histogram(&raw).unwrap();
        assert_eq!(buckets.len(), 3);
        assert!(buckets.windows(2).all(|w| w[0].time < w[1].time));
        assert_eq!(buckets[2].overfly_count, 2);
    }
}
