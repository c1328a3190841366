use egui::{Color32, Pos2, Rect, Sense, Stroke};

use crate::core::input::{NoteEvent, Source};
use crate::core::note::{Note, KEY_COUNT};
use crate::error::PianoError;
use crate::messaging::NoteListener;

pub const WHITE_KEY_COUNT: usize = 52;

const BLACK_KEY_WIDTH_RATIO: f32 = 0.6;
const BLACK_KEY_HEIGHT_RATIO: f32 = 0.62;

/// One visual key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyboardKey {
    pub note: Note,
    pub name: String,
    pub pressed: bool,
}

/// What happened on the keyboard during one frame.
#[derive(Debug, Default)]
pub struct KeyboardResponse {
    /// Pointer presses and releases, to be sent over the bus.
    pub events: Vec<NoteEvent>,
    /// Name of a key latched with the secondary button.
    pub picked: Option<String>,
}

/// The on-screen 88-key keyboard.
///
/// Holds the pressed state of every key. The state is changed through
/// [`select`](Self::select)/[`deselect`](Self::deselect), normally by the bus
/// delivering note events; pointer handling only produces events.
pub struct KeyboardView {
    keys: Vec<KeyboardKey>,
    /// Key that received the last pointer press and gets the matching release.
    captured: Option<usize>,
}

impl KeyboardView {
    pub fn new() -> Self {
        let keys = Note::all()
            .map(|note| KeyboardKey {
                note,
                name: note.to_string(),
                pressed: false,
            })
            .collect();

        Self {
            keys,
            captured: None,
        }
    }

    #[cfg(test)]
    pub fn keys(&self) -> &[KeyboardKey] {
        &self.keys
    }

    fn key_mut(&mut self, note: Note) -> Option<&mut KeyboardKey> {
        let index = note.index()?;
        self.keys.get_mut(index)
    }

    pub fn select(&mut self, note: Note) {
        if let Some(key) = self.key_mut(note) {
            key.pressed = true;
        }
    }

    pub fn deselect(&mut self, note: Note) {
        if let Some(key) = self.key_mut(note) {
            key.pressed = false;
        }
    }

    pub fn clear(&mut self) {
        for key in &mut self.keys {
            key.pressed = false;
        }
    }

    /// Sets the key called `name` to `value`, or flips it when `value` is
    /// `None`. Returns the new state.
    pub fn toggle(&mut self, name: &str, value: Option<bool>) -> Result<bool, PianoError> {
        let key = self
            .keys
            .iter_mut()
            .find(|key| key.name == name)
            .ok_or_else(|| PianoError::MissingKey(name.to_string()))?;

        key.pressed = value.unwrap_or(!key.pressed);
        Ok(key.pressed)
    }

    /// Releases a latched key, or makes it the only pressed one.
    pub fn latch(&mut self, index: usize) -> Option<bool> {
        let key = self.keys.get(index)?;
        let (name, pressed) = (key.name.clone(), key.pressed);
        if !pressed {
            self.clear();
        }
        self.toggle(&name, None).ok()
    }

    #[cfg(test)]
    pub fn is_pressed(&self, note: Note) -> bool {
        note.index()
            .and_then(|index| self.keys.get(index))
            .map_or(false, |key| key.pressed)
    }

    #[cfg(test)]
    pub fn pressed_count(&self) -> usize {
        self.keys.iter().filter(|key| key.pressed).count()
    }

    pub fn pointer_down(&mut self, index: usize) -> Option<NoteEvent> {
        let note = self.keys.get(index)?.note;
        self.captured = Some(index);
        Some(NoteEvent::down(note, Source::Pointer))
    }

    /// Up event for the captured key, wherever the pointer is now.
    pub fn pointer_up(&mut self) -> Option<NoteEvent> {
        let index = self.captured.take()?;
        self.keys
            .get(index)
            .map(|key| NoteEvent::up(key.note, Source::Pointer))
    }

    /// Screen rectangle of every key, in table order.
    pub fn key_rects(&self, rect: Rect) -> Vec<Rect> {
        let white_width = rect.width() / WHITE_KEY_COUNT as f32;
        let black_width = white_width * BLACK_KEY_WIDTH_RATIO;
        let black_height = rect.height() * BLACK_KEY_HEIGHT_RATIO;

        let mut whites_before = 0;
        let mut rects = Vec::with_capacity(KEY_COUNT);
        for key in &self.keys {
            let edge = rect.min.x + whites_before as f32 * white_width;
            if key.note.is_black() {
                rects.push(Rect::from_min_size(
                    egui::pos2(edge - black_width / 2.0, rect.min.y),
                    egui::vec2(black_width, black_height),
                ));
            } else {
                rects.push(Rect::from_min_size(
                    egui::pos2(edge, rect.min.y),
                    egui::vec2(white_width, rect.height()),
                ));
                whites_before += 1;
            }
        }
        rects
    }

    /// Index of the key under `pos`. Black keys sit on top and win.
    pub fn hit_test(&self, rect: Rect, pos: Pos2) -> Option<usize> {
        if !rect.contains(pos) {
            return None;
        }
        let rects = self.key_rects(rect);
        let black = self.keys.iter().enumerate().filter(|(_, key)| key.note.is_black());
        let white = self.keys.iter().enumerate().filter(|(_, key)| !key.note.is_black());

        black
            .chain(white)
            .map(|(index, _)| index)
            .find(|index| rects[*index].contains(pos))
    }

    pub fn show(&mut self, ui: &mut egui::Ui, height: f32) -> KeyboardResponse {
        let size = egui::vec2(ui.available_width(), height);
        let (rect, _) = ui.allocate_exact_size(size, Sense::click_and_drag());
        let rects = self.key_rects(rect);
        let painter = ui.painter_at(rect);

        let whites = self.keys.iter().zip(&rects).filter(|(key, _)| !key.note.is_black());
        for (key, key_rect) in whites {
            let fill = if key.pressed {
                Color32::from_rgb(100, 150, 255)
            } else {
                Color32::WHITE
            };
            let key_rect = key_rect.shrink2(egui::vec2(0.5, 0.0));
            painter.rect_filled(key_rect, 2.0, fill);
            let outline = Stroke::new(1.0, Color32::BLACK);
            painter.rect_stroke(key_rect, 2.0, outline, egui::StrokeKind::Inside);
            painter.text(
                key_rect.center_bottom() - egui::vec2(0.0, 4.0),
                egui::Align2::CENTER_BOTTOM,
                &key.name,
                egui::FontId::proportional(9.0),
                Color32::DARK_GRAY,
            );
        }

        let blacks = self.keys.iter().zip(&rects).filter(|(key, _)| key.note.is_black());
        for (key, key_rect) in blacks {
            let fill = if key.pressed {
                Color32::from_rgb(50, 100, 200)
            } else {
                Color32::BLACK
            };
            painter.rect_filled(*key_rect, 2.0, fill);
        }

        let (primary_pressed, primary_released, secondary_pressed, pointer) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.button_pressed(egui::PointerButton::Secondary),
                i.pointer.interact_pos(),
            )
        });
        let hovered = pointer.and_then(|pos| self.hit_test(rect, pos));

        let mut response = KeyboardResponse::default();
        if primary_pressed {
            if let Some(event) = hovered.and_then(|index| self.pointer_down(index)) {
                response.events.push(event);
            }
        }
        if primary_released {
            response.events.extend(self.pointer_up());
        }
        if secondary_pressed {
            if let Some(index) = hovered {
                self.latch(index);
                response.picked = Some(self.keys[index].name.clone());
            }
        }
        response
    }
}

impl Default for KeyboardView {
    fn default() -> Self {
        Self::new()
    }
}

impl NoteListener for KeyboardView {
    fn on_note(&mut self, event: &NoteEvent) {
        if event.is_down() {
            self.select(event.note);
        } else {
            self.deselect(event.note);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::Phase;
    use crate::core::note::PitchClass;

    fn c4() -> Note {
        Note::new(PitchClass::C, 4)
    }

    #[test]
    fn has_one_key_per_table_entry() {
        let view = KeyboardView::new();
        assert_eq!(view.keys().len(), KEY_COUNT);
        assert_eq!(view.keys()[0].name, "A0");
        assert_eq!(view.keys()[2].name, "B");
        assert_eq!(view.keys()[87].name, "C8");
        let whites = view.keys().iter().filter(|key| !key.note.is_black()).count();
        assert_eq!(whites, WHITE_KEY_COUNT);
    }

    #[test]
    fn select_and_deselect_are_idempotent() {
        let mut view = KeyboardView::new();
        view.select(c4());
        view.select(c4());
        assert!(view.is_pressed(c4()));
        assert_eq!(view.pressed_count(), 1);

        view.deselect(c4());
        view.deselect(c4());
        assert!(!view.is_pressed(c4()));
        assert_eq!(view.pressed_count(), 0);
    }

    #[test]
    fn off_board_notes_are_ignored() {
        let mut view = KeyboardView::new();
        view.select(Note::new(PitchClass::C, 0));
        view.select(Note::new(PitchClass::Db, 8));
        assert_eq!(view.pressed_count(), 0);
    }

    #[test]
    fn clear_releases_everything() {
        let mut view = KeyboardView::new();
        for note in Note::all().step_by(7) {
            view.select(note);
        }
        assert!(view.pressed_count() > 1);
        view.clear();
        assert_eq!(view.pressed_count(), 0);
        view.clear();
        assert_eq!(view.pressed_count(), 0);
    }

    #[test]
    fn toggle_sets_or_flips() {
        let mut view = KeyboardView::new();
        assert_eq!(view.toggle("C4", None), Ok(true));
        assert_eq!(view.toggle("C4", None), Ok(false));
        assert_eq!(view.toggle("C4", Some(true)), Ok(true));
        assert_eq!(view.toggle("C4", Some(true)), Ok(true));
        assert_eq!(view.toggle("B", Some(true)), Ok(true));
        assert_eq!(
            view.toggle("C#4", None),
            Err(PianoError::MissingKey("C#4".into()))
        );
    }

    #[test]
    fn latch_keeps_a_single_key() {
        let mut view = KeyboardView::new();
        view.select(c4());
        let a4 = Note::new(PitchClass::A, 4);
        let a4_index = a4.index().unwrap();

        assert_eq!(view.latch(a4_index), Some(true));
        assert!(view.is_pressed(a4));
        assert_eq!(view.pressed_count(), 1);

        assert_eq!(view.latch(a4_index), Some(false));
        assert_eq!(view.pressed_count(), 0);
        assert_eq!(view.latch(KEY_COUNT), None);
    }

    #[test]
    fn release_goes_to_the_captured_key() {
        let mut view = KeyboardView::new();
        let index = c4().index().unwrap();

        let down = view.pointer_down(index).unwrap();
        assert_eq!(down, NoteEvent::down(c4(), Source::Pointer));

        let up = view.pointer_up().unwrap();
        assert_eq!(up.note, c4());
        assert_eq!(up.phase, Phase::Up);
        assert_eq!(view.pointer_up(), None);
    }

    #[test]
    fn listener_follows_events() {
        let mut view = KeyboardView::new();
        view.on_note(&NoteEvent::down(c4(), Source::Hardware));
        assert!(view.is_pressed(c4()));
        view.on_note(&NoteEvent::up(c4(), Source::ComputerKeyboard));
        assert!(!view.is_pressed(c4()));
    }

    #[test]
    fn hit_test_prefers_black_keys() {
        let view = KeyboardView::new();
        let rect = Rect::from_min_size(Pos2::ZERO, egui::vec2(520.0, 100.0));

        // A0 spans x 0..10, Bb0 sits on x 7..13 down to y 62.
        assert_eq!(view.hit_test(rect, egui::pos2(3.0, 80.0)), Some(0));
        assert_eq!(view.hit_test(rect, egui::pos2(8.0, 20.0)), Some(1));
        assert_eq!(view.hit_test(rect, egui::pos2(8.0, 80.0)), Some(0));
        assert_eq!(view.hit_test(rect, egui::pos2(15.0, 20.0)), Some(2));
        assert_eq!(view.hit_test(rect, egui::pos2(515.0, 50.0)), Some(87));
        assert_eq!(view.hit_test(rect, egui::pos2(600.0, 50.0)), None);
    }
}
