use eframe::egui;
use log::{debug, warn};
use rand::Rng;

use crate::core::input::{key_char, ComputerKeyboard, NoteEvent, Source};
use crate::core::midi::{ConnectOutcome, MidiConnector, MidirAccess};
use crate::core::note::{self, Note, KEY_COUNT};
use crate::core::synth::{AudioOutput, SynthConfig, SynthPreset};
use crate::messaging::{MessageBus, MessageKind, NoteListener, PianoMessage};
use crate::settings::{self, AppSettings};
use crate::ui::panels::{self, ActivityLog, SynthAction, SynthPanel};
use crate::ui::KeyboardView;

/// Messages handled per frame; anything beyond waits for the next one.
const MESSAGES_PER_FRAME: usize = 256;
const KEYBOARD_HEIGHT: f32 = 180.0;

#[derive(PartialEq)]
enum Tab {
    Synth,
    Input,
    Activity,
}

/// One piano session. Owns every component; nothing is global.
pub struct PianoApp {
    bus: MessageBus,
    keyboard: KeyboardView,
    computer_keyboard: ComputerKeyboard,
    audio: AudioOutput,
    midi: MidiConnector,
    settings: AppSettings,
    synth_panel: SynthPanel,
    presets: Vec<SynthPreset>,
    activity: ActivityLog,
    current_tab: Tab,
}

impl eframe::App for PianoApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_computer_keyboard(ctx);
        self.process_messages();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Virtual Piano");
                ui.label("🎹");
                ui.add_space(16.0);
                ui.selectable_value(&mut self.current_tab, Tab::Synth, "Synthesizer");
                ui.selectable_value(&mut self.current_tab, Tab::Input, "Input");
                ui.selectable_value(&mut self.current_tab, Tab::Activity, "Activity");

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Random").clicked() {
                        self.play_random();
                    }
                    ui.label(panels::midi::status_text(self.midi.state()));
                    ui.label(self.audio.status());
                });
            });
        });

        egui::TopBottomPanel::bottom("keyboard")
            .resizable(false)
            .show(ctx, |ui| {
                let response = self.keyboard.show(ui, KEYBOARD_HEIGHT);
                for event in response.events {
                    self.bus.send(PianoMessage::Note(event));
                }
                if let Some(name) = response.picked {
                    match note::frequency(&name) {
                        Ok(hz) => self.activity.push(format!("Picked: {} ({:.2} Hz)", name, hz)),
                        Err(err) => warn!("{}", err),
                    }
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| match self.current_tab {
            Tab::Synth => {
                if let Some(action) = self.synth_panel.show(ui, &self.presets) {
                    self.handle_synth_action(action);
                }
            }
            Tab::Input => {
                let response = panels::midi::show(ui, self.midi.state(), &mut self.settings);
                if response.connect {
                    self.connect_midi();
                }
                if response.settings_changed {
                    self.computer_keyboard.set_policy(self.settings.key_repeat);
                    self.save_settings();
                }
            }
            Tab::Activity => self.activity.show(ui),
        });

        ctx.request_repaint();
    }
}

impl PianoApp {
    pub fn new() -> Self {
        let settings = AppSettings::load();
        let audio = AudioOutput::open(&settings.synth);
        let presets = Self::load_presets();

        let mut bus = MessageBus::new();
        bus.subscribe(MessageKind::Midi, |msg| debug!("midi@message {:?}", msg));

        let mut activity = ActivityLog::new();
        activity.push("Loaded Piano");
        if let AudioOutput::Unavailable { reason, .. } = &audio {
            activity.push(format!("Audio unavailable - {}", reason));
        }

        Self {
            bus,
            keyboard: KeyboardView::new(),
            computer_keyboard: ComputerKeyboard::new(settings.key_repeat),
            audio,
            midi: MidiConnector::new(),
            synth_panel: SynthPanel::new(&settings.preset, &settings.synth),
            settings,
            presets,
            activity,
            current_tab: Tab::Synth,
        }
    }

    fn process_messages(&mut self) {
        let mut listeners: [&mut dyn NoteListener; 2] = [&mut self.keyboard, &mut self.audio];
        let rest = self.bus.process_messages(MESSAGES_PER_FRAME, &mut listeners);

        for msg in rest {
            match msg {
                PianoMessage::Connection(outcome) => self.handle_connection(outcome),
                PianoMessage::Log(line) => self.activity.push(line),
                _ => {}
            }
        }
    }

    fn handle_connection(&mut self, outcome: ConnectOutcome) {
        self.midi.resolve(&outcome);
        match outcome {
            ConnectOutcome::Denied => self.activity.push("MIDI denied"),
            ConnectOutcome::Error(cause) => {
                self.activity.push(format!("MIDI failed - {}", cause));
            }
            ConnectOutcome::Connected(devices) => {
                self.activity.push("MIDI Connected");
                for device in devices {
                    self.activity.push(format!("Device: {} - {}", device.name, device.id));
                }
            }
        }
    }

    fn handle_computer_keyboard(&mut self, ctx: &egui::Context) {
        let typing = ctx.wants_keyboard_input();
        let keys = ctx.input(|i| piano_keys(&i.events, typing));

        for (key, pressed) in keys {
            let event = if pressed {
                self.computer_keyboard.key_down(key)
            } else {
                self.computer_keyboard.key_up(key)
            };
            if let Some(event) = event {
                self.bus.send(PianoMessage::Note(event));
            }
        }
    }

    fn play_random(&mut self) {
        let index = rand::rng().random_range(0..KEY_COUNT);
        if let Some(note) = Note::from_index(index) {
            self.keyboard.clear();
            self.bus.send(PianoMessage::Note(NoteEvent::down(note, Source::Random)));
            self.activity.push(format!("Random: {}", note));
        }
    }

    fn connect_midi(&mut self) {
        let access = MidirAccess::new(self.settings.midi_enabled);
        if self.midi.connect(access, self.bus.sender()) {
            self.activity.push("Connecting to MIDI...");
        }
    }

    fn handle_synth_action(&mut self, action: SynthAction) {
        match action {
            SynthAction::Apply { name, config } => self.apply_synth(name, config),
            SynthAction::SavePreset(preset) => {
                match settings::presets_dir().and_then(|dir| preset.save_to_file(&dir)) {
                    Ok(path) => {
                        let line = format!("Saved preset {} to {}", preset.name, path.display());
                        self.activity.push(line);
                        self.presets = Self::load_presets();
                        self.apply_synth(preset.name, preset.config);
                    }
                    Err(err) => self.activity.push(format!("Could not save preset: {:#}", err)),
                }
            }
            SynthAction::DeletePreset(name) => {
                match settings::presets_dir().and_then(|dir| SynthPreset::delete(&name, &dir)) {
                    Ok(()) => {
                        self.activity.push(format!("Deleted preset {}", name));
                        self.presets = Self::load_presets();
                        self.synth_panel.pick("classic", &self.presets);
                    }
                    Err(err) => self.activity.push(format!("Could not delete preset: {:#}", err)),
                }
            }
        }
    }

    /// Replaces the engine; voices still sounding on the old one are cut.
    fn apply_synth(&mut self, name: String, config: SynthConfig) {
        self.audio = AudioOutput::open(&config);
        self.activity.push(format!("Synth: {} ({})", name, self.audio.status()));
        self.settings.preset = name;
        self.settings.synth = config;
        self.save_settings();
    }

    fn save_settings(&self) {
        if let Err(err) = self.settings.save() {
            warn!("could not save settings: {:#}", err);
        }
    }

    fn load_presets() -> Vec<SynthPreset> {
        match settings::presets_dir().and_then(|dir| SynthPreset::load_all(&dir)) {
            Ok(presets) => presets,
            Err(err) => {
                warn!("could not load presets: {:#}", err);
                Vec::new()
            }
        }
    }
}

/// Piano-row key presses and releases in `events`.
///
/// While a text field has focus presses are typing, not playing, and are
/// dropped. Releases always go through so a key held before the field took
/// focus is not left down.
fn piano_keys(events: &[egui::Event], typing: bool) -> Vec<(char, bool)> {
    events
        .iter()
        .filter_map(|event| match event {
            egui::Event::Key { key, pressed, .. } if !(typing && *pressed) => {
                typed_char(*key).map(|c| (c, *pressed))
            }
            _ => None,
        })
        .collect()
}

/// Character a key types on a US layout, for the keys the piano row uses.
fn typed_char(key: egui::Key) -> Option<char> {
    match key {
        egui::Key::Semicolon => Some(';'),
        egui::Key::Quote => Some('\''),
        other => key_char(other.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{KeyRepeat, Phase};
    use crate::core::note::PitchClass;

    fn key(key: egui::Key, pressed: bool) -> egui::Event {
        egui::Event::Key {
            key,
            physical_key: None,
            pressed,
            repeat: false,
            modifiers: egui::Modifiers::NONE,
        }
    }

    #[test]
    fn typing_drops_presses_but_keeps_releases() {
        let events = [
            key(egui::Key::A, true),
            key(egui::Key::S, false),
            egui::Event::Text("a".into()),
            key(egui::Key::Space, false),
        ];

        assert_eq!(piano_keys(&events, false), vec![('a', true), ('s', false)]);
        assert_eq!(piano_keys(&events, true), vec![('s', false)]);
    }

    fn play(
        keyboard: &mut ComputerKeyboard,
        view: &mut KeyboardView,
        events: &[egui::Event],
        typing: bool,
    ) {
        for (c, pressed) in piano_keys(events, typing) {
            let event = if pressed {
                keyboard.key_down(c)
            } else {
                keyboard.key_up(c)
            };
            if let Some(event) = event {
                view.on_note(&event);
            }
        }
    }

    #[test]
    fn key_released_into_a_text_field_is_not_stuck() {
        let mut keyboard = ComputerKeyboard::new(KeyRepeat::Suppress);
        let mut view = KeyboardView::new();
        let c4 = Note::new(PitchClass::C, 4);

        play(&mut keyboard, &mut view, &[key(egui::Key::A, true)], false);
        assert!(view.is_pressed(c4));

        // focus moves to a text field, then the key comes up
        let events = [key(egui::Key::A, true), key(egui::Key::A, false)];
        play(&mut keyboard, &mut view, &events, true);
        assert_eq!(view.pressed_count(), 0);

        let again = keyboard.key_down('a').map(|event| event.phase);
        assert_eq!(again, Some(Phase::Down));
    }

    #[test]
    fn piano_row_keys_type_their_characters() {
        assert_eq!(typed_char(egui::Key::A), Some('a'));
        assert_eq!(typed_char(egui::Key::Semicolon), Some(';'));
        assert_eq!(typed_char(egui::Key::Quote), Some('\''));
        assert_eq!(typed_char(egui::Key::Space), None);
    }
}
