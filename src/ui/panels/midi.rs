use egui::Ui;

use crate::core::input::KeyRepeat;
use crate::core::midi::ConnectionState;
use crate::settings::AppSettings;

/// What the user asked for in the input panel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MidiPanelResponse {
    pub connect: bool,
    pub settings_changed: bool,
}

pub fn status_text(state: &ConnectionState) -> &'static str {
    match state {
        ConnectionState::Disconnected => "MIDI: Not connected",
        ConnectionState::Pending => "MIDI: Connecting...",
        ConnectionState::Connected(_) => "MIDI: Connected",
    }
}

/// Hardware connection and computer-keyboard settings.
pub fn show(ui: &mut Ui, state: &ConnectionState, settings: &mut AppSettings) -> MidiPanelResponse {
    let mut response = MidiPanelResponse::default();

    ui.heading("MIDI Input");
    ui.horizontal(|ui| {
        let can_connect = *state == ConnectionState::Disconnected;
        if ui.add_enabled(can_connect, egui::Button::new("Connect")).clicked() {
            response.connect = true;
        }
        ui.label(status_text(state));
    });

    if ui
        .checkbox(&mut settings.midi_enabled, "Allow access to MIDI devices")
        .changed()
    {
        response.settings_changed = true;
    }

    if let ConnectionState::Connected(devices) = state {
        ui.group(|ui| {
            if devices.is_empty() {
                ui.label("No input devices found");
            }
            for device in devices {
                match &device.manufacturer {
                    Some(maker) => ui.label(format!("{} ({}) - {}", device.name, maker, device.id)),
                    None => ui.label(format!("{} - {}", device.name, device.id)),
                };
            }
        });
    }

    ui.separator();
    ui.heading("Computer Keyboard");
    ui.horizontal(|ui| {
        ui.label("Held keys:");
        let before = settings.key_repeat;
        ui.radio_value(&mut settings.key_repeat, KeyRepeat::PassThrough, "Repeat notes");
        ui.radio_value(&mut settings.key_repeat, KeyRepeat::Suppress, "Play once");
        if settings.key_repeat != before {
            response.settings_changed = true;
        }
    });

    response
}
