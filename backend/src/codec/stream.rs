//! Fixed-layout `f32` buffer carrying one tick.
//!
//! ```text
//! [0..6)   year, month (zero-based), day, hour, minute, seconds.fraction
//! [6..8)   sun latitude, sun longitude
//! [8..)    per object: status or -errorCode, latitude, longitude, height
//! ```

use super::CodecError;
use crate::models::{TickSample, TimeFields};
use crate::propagation::TickOutput;

pub const HEADER_LEN: usize = 6;
pub const SUN_LEN: usize = 2;
pub const OBJECT_STRIDE: usize = 4;

/// Total buffer length for `object_count` objects.
pub const fn buffer_len(object_count: usize) -> usize {
    HEADER_LEN + SUN_LEN + OBJECT_STRIDE * object_count
}

/// Encoded tick. Moved, not copied, from the driver to the consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct TickBuffer(Vec<f32>);

/// One decoded object quadruple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectRecord {
    /// Visibility status code, or the negated service error code
    pub status: f32,
    pub latitude: f32,
    pub longitude: f32,
    pub height: f32,
}

fn encode_sample(sample: &TickSample) -> [f32; OBJECT_STRIDE] {
    if sample.is_valid() {
        [
            sample.status().code() as f32,
            sample.latitude as f32,
            sample.longitude as f32,
            sample.height as f32,
        ]
    } else {
        [-(sample.error_code as f32), 0.0, 0.0, 0.0]
    }
}

impl TickBuffer {
    /// Pack a service tick. Performs exactly one allocation.
    pub fn encode(time: &TimeFields, output: &TickOutput) -> Self {
        let mut data = Vec::with_capacity(buffer_len(output.objects.len()));
        data.extend_from_slice(&[
            time.year as f32,
            time.month_zero_based() as f32,
            time.day as f32,
            time.hour as f32,
            time.minute as f32,
            time.second as f32,
        ]);
        data.push(output.sun_latitude as f32);
        data.push(output.sun_longitude as f32);
        for sample in &output.objects {
            data.extend_from_slice(&encode_sample(sample));
        }
        TickBuffer(data)
    }

    pub fn from_vec(data: Vec<f32>) -> Result<Self, CodecError> {
        if data.len() < HEADER_LEN + SUN_LEN || (data.len() - HEADER_LEN - SUN_LEN) % OBJECT_STRIDE != 0
        {
            return Err(CodecError::BufferLength(data.len()));
        }
        Ok(TickBuffer(data))
    }

    pub fn from_le_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        if bytes.len() % 4 != 0 {
            return Err(CodecError::ByteLength(bytes.len()));
        }
        let data = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Self::from_vec(data)
    }

    pub fn into_le_bytes(self) -> Vec<u8> {
        self.0.iter().flat_map(|v| v.to_le_bytes()).collect()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn object_count(&self) -> usize {
        (self.0.len() - HEADER_LEN - SUN_LEN) / OBJECT_STRIDE
    }

    pub fn header(&self) -> &[f32] {
        &self.0[..HEADER_LEN]
    }

    /// `(latitude, longitude)` of the sub-solar point
    pub fn sun(&self) -> (f32, f32) {
        (self.0[HEADER_LEN], self.0[HEADER_LEN + 1])
    }

    pub fn objects(&self) -> impl Iterator<Item = ObjectRecord> + '_ {
        self.0[HEADER_LEN + SUN_LEN..]
            .chunks_exact(OBJECT_STRIDE)
            .map(|c| ObjectRecord {
                status: c[0],
                latitude: c[1],
                longitude: c[2],
                height: c[3],
            })
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}
