use egui::Ui;

use crate::core::oscillator::Waveform;
use crate::core::synth::{SynthConfig, SynthPreset, MAX_DELAY_TIME, MAX_FEEDBACK};
use crate::ui::components::{envelope_points, waveform_points, ShapePlot};

/// Request coming out of the synth panel.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthAction {
    /// Rebuild the engine with the draft under this preset name.
    Apply { name: String, config: SynthConfig },
    SavePreset(SynthPreset),
    DeletePreset(String),
}

/// Editor for the synth configuration.
///
/// Edits go to a draft; nothing reaches the engine until Apply, because master
/// gain and delay are fixed once the graph is built.
pub struct SynthPanel {
    draft: SynthConfig,
    selected: String,
    new_preset_name: String,
}

impl SynthPanel {
    pub fn new(name: &str, config: &SynthConfig) -> Self {
        Self {
            draft: config.clone(),
            selected: name.to_string(),
            new_preset_name: String::new(),
        }
    }

    pub fn draft(&self) -> &SynthConfig {
        &self.draft
    }

    /// Loads a built-in or user preset into the draft.
    pub fn pick(&mut self, name: &str, presets: &[SynthPreset]) -> bool {
        let config = SynthConfig::builtin(name)
            .or_else(|| presets.iter().find(|p| p.name == name).map(|p| p.config.clone()));
        match config {
            Some(config) => {
                self.draft = config;
                self.selected = name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn show(&mut self, ui: &mut Ui, presets: &[SynthPreset]) -> Option<SynthAction> {
        let mut action = None;

        ui.horizontal(|ui| {
            ui.label("Preset:");
            let mut picked = None;
            egui::ComboBox::new("preset_selector", "")
                .selected_text(&self.selected)
                .show_ui(ui, |ui| {
                    for name in SynthConfig::BUILTIN_NAMES {
                        if ui.selectable_label(self.selected == name, name).clicked() {
                            picked = Some(name.to_string());
                        }
                    }
                    if !presets.is_empty() {
                        ui.separator();
                    }
                    for preset in presets {
                        let selected = self.selected == preset.name;
                        if ui.selectable_label(selected, &preset.name).clicked() {
                            picked = Some(preset.name.clone());
                        }
                    }
                });
            if let Some(name) = picked {
                self.pick(&name, presets);
            }

            if ui.button("Apply").clicked() {
                action = Some(SynthAction::Apply {
                    name: self.selected.clone(),
                    config: self.draft.sanitized(),
                });
            }
            let is_user_preset = presets.iter().any(|p| p.name == self.selected);
            if ui.add_enabled(is_user_preset, egui::Button::new("Delete")).clicked() {
                action = Some(SynthAction::DeletePreset(self.selected.clone()));
            }
        });

        ui.separator();

        ui.columns(2, |columns| {
            let ui = &mut columns[0];
            ui.heading("Tone");
            ui.horizontal(|ui| {
                ui.label("Waveform:");
                egui::ComboBox::new("waveform_selector", "")
                    .selected_text(self.draft.waveform.label())
                    .show_ui(ui, |ui| {
                        for waveform in Waveform::ALL {
                            let label = waveform.label();
                            ui.selectable_value(&mut self.draft.waveform, waveform, label);
                        }
                    });
            });
            ShapePlot::new(waveform_points(self.draft.waveform, 100))
                .height(70.0)
                .show(ui, "waveform_preview");

            ui.add(egui::Slider::new(&mut self.draft.master_gain, 0.0..=1.0).text("Master Gain"));
            let vibrato = &mut self.draft.vibrato;
            ui.add(egui::Slider::new(&mut vibrato.rate, 0.0..=20.0).text("Vibrato Rate (Hz)"));
            ui.add(egui::Slider::new(&mut vibrato.depth, 0.0..=20.0).text("Vibrato Depth (Hz)"));

            let ui = &mut columns[1];
            ui.heading("Note");
            ShapePlot::new(envelope_points(&self.draft.note, 100))
                .height(70.0)
                .color(egui::Color32::from_rgb(255, 152, 0))
                .fill(true)
                .show(ui, "envelope_preview");
            ui.add(egui::Slider::new(&mut self.draft.note.length, 0.01..=3.0).text("Length (s)"));
            ui.add(egui::Slider::new(&mut self.draft.note.attack, 0.0..=1.0).text("Attack"));
            ui.add(egui::Slider::new(&mut self.draft.note.sustain, 0.0..=1.0).text("Sustain"));
            ui.add(egui::Slider::new(&mut self.draft.note.release, 0.0..=1.0).text("Release"));

            ui.collapsing("Delay", |ui| {
                ui.checkbox(&mut self.draft.route_to_delay, "Send voices to delay");
                let delay = &mut self.draft.delay;
                ui.add(egui::Slider::new(&mut delay.time, 0.0..=MAX_DELAY_TIME).text("Time (s)"));
                ui.add(egui::Slider::new(&mut delay.feedback, 0.0..=MAX_FEEDBACK).text("Feedback"));
                ui.add(egui::Slider::new(&mut delay.send, 0.0..=1.0).text("Send"));
            });
        });

        ui.separator();
        ui.horizontal(|ui| {
            ui.label("Preset Name:");
            ui.text_edit_singleline(&mut self.new_preset_name);
            let name = self.new_preset_name.trim();
            let valid = !name.is_empty() && SynthConfig::builtin(name).is_none();
            if ui.add_enabled(valid, egui::Button::new("Save Preset")).clicked() {
                let preset = SynthPreset::new(name, self.draft.sanitized());
                self.selected = preset.name.clone();
                self.new_preset_name.clear();
                action = Some(SynthAction::SavePreset(preset));
            }
        });

        action
    }
}
