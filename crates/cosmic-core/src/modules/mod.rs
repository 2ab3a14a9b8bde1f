pub mod combiner;
pub mod plot;
pub mod serialization;
pub mod sweep;

pub use combiner::{TransitionEstimate, combine_transition_probabilities};
pub use plot::{AxisLabels, PointSeries, ScatterPlot, ScatterRenderer};
pub use serialization::{
    OutputFormat, format_csv_row, format_scientific_e6, write_csv, write_json_lines,
    write_records,
};
pub use sweep::{
    GridAxis, GridSample, GridShape, SampleOutcome, SweepDriver, SweepGrid, SweepSamples,
    SweepSummary,
};
