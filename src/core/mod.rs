pub mod axis;
pub mod date;
pub mod metric;
pub mod style;

pub use axis::{AxisError, DateAxis};
pub use metric::{MetricDetail, MetricFigures, RegionRef, TrendPoint};
pub use style::{AnomalyClass, Rgb};
