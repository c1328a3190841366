use egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoints};

use crate::core::oscillator::{Envelope, Waveform};
use crate::core::synth::NoteShape;

/// One period of `waveform`, phase on x.
pub fn waveform_points(waveform: Waveform, samples: usize) -> Vec<[f32; 2]> {
    (0..samples)
        .map(|i| {
            let phase = i as f32 / samples as f32;
            [phase, waveform.sample(phase)]
        })
        .collect()
}

/// Amplitude of a note over its whole length, seconds on x.
pub fn envelope_points(shape: &NoteShape, samples: usize) -> Vec<[f32; 2]> {
    let envelope = Envelope::new(shape);
    let steps = samples.max(2) - 1;
    (0..=steps)
        .map(|i| {
            let time = envelope.end * i as f32 / steps as f32;
            // The last point sits on `end`, where the envelope is already idle.
            [time, envelope.value_at(time)]
        })
        .collect()
}

/// Small non-interactive line plot used for the synth previews.
pub struct ShapePlot {
    points: Vec<[f32; 2]>,
    height: f32,
    color: Color32,
    fill: bool,
}

impl ShapePlot {
    pub fn new(points: Vec<[f32; 2]>) -> Self {
        Self {
            points,
            height: 100.0,
            color: Color32::from_rgb(0, 188, 212),
            fill: false,
        }
    }

    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    pub fn color(mut self, color: Color32) -> Self {
        self.color = color;
        self
    }

    pub fn fill(mut self, fill: bool) -> Self {
        self.fill = fill;
        self
    }

    pub fn show(self, ui: &mut Ui, id_source: impl std::hash::Hash) {
        let plot = Plot::new(id_source)
            .height(self.height)
            .show_x(false)
            .show_y(false)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false);

        plot.show(ui, |plot_ui| {
            let points =
                PlotPoints::from_iter(self.points.iter().map(|[x, y]| [*x as f64, *y as f64]));
            let mut line = Line::new(points).color(self.color);
            if self.fill {
                line = line.fill(0.0);
            }
            plot_ui.line(line);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_preview_covers_one_period() {
        let points = waveform_points(Waveform::Sawtooth, 100);
        assert_eq!(points.len(), 100);
        assert_eq!(points[0], [0.0, -1.0]);
        assert!(points.iter().all(|[x, _]| (0.0..1.0).contains(x)));
    }

    #[test]
    fn envelope_preview_spans_the_note() {
        let shape = NoteShape {
            attack: 0.25,
            sustain: 0.8,
            release: 0.25,
            length: 0.4,
        };
        let points = envelope_points(&shape, 5);
        let times: Vec<f32> = points.iter().map(|[t, _]| *t).collect();
        assert_eq!(times.len(), 5);
        assert_eq!(times[0], 0.0);
        assert!((times[4] - 0.4).abs() < 1e-6);
        assert!((points[2][1] - 0.8).abs() < 1e-6);
        assert_eq!(points[4][1], 0.0);
    }
}
