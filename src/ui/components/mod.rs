mod shape_plot;

pub use shape_plot::{envelope_points, waveform_points, ShapePlot};
