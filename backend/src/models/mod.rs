pub mod analysis;
pub mod observer;
pub mod tick;
pub mod time;

pub use analysis::{AnalysisResult, AnalysisRow, HistogramBucket, TransitDetail};
pub use observer::Observer;
pub use tick::{TickSample, VisibilityStatus};
pub use time::TimeFields;
