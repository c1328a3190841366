use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{MessageKind, PianoMessage};
use crate::core::input::NoteEvent;

/// Anything that reacts to normalized note events.
pub trait NoteListener {
    fn on_note(&mut self, event: &NoteEvent);
}

type Subscriber = Box<dyn FnMut(&PianoMessage)>;

/// MessageBus carries every input source to the control thread.
///
/// Producers hold cloned senders. The control thread drains the queue once
/// per frame: note events (including hardware messages that normalize to
/// one) go to the listeners passed in, every message goes to the subscribers
/// registered for its kind, and the remaining messages are handed back.
pub struct MessageBus {
    sender: Sender<PianoMessage>,
    receiver: Receiver<PianoMessage>,
    subscribers: Vec<(MessageKind, Subscriber)>,
}

impl MessageBus {
    pub fn new() -> Self {
        let (sender, receiver) = unbounded();

        MessageBus {
            sender,
            receiver,
            subscribers: Vec::new(),
        }
    }

    /// Get a sender that can be cloned and passed to producers
    pub fn sender(&self) -> Sender<PianoMessage> {
        self.sender.clone()
    }

    pub fn send(&self, msg: PianoMessage) {
        // The bus owns its receiver, so the channel cannot be disconnected.
        self.sender.send(msg).ok();
    }

    /// Registers an observer for one kind of message.
    pub fn subscribe(
        &mut self,
        kind: MessageKind,
        subscriber: impl FnMut(&PianoMessage) + 'static,
    ) {
        self.subscribers.push((kind, Box::new(subscriber)));
    }

    /// Process up to `max_messages` pending messages.
    pub fn process_messages(
        &mut self,
        max_messages: usize,
        listeners: &mut [&mut dyn NoteListener],
    ) -> Vec<PianoMessage> {
        let mut unhandled = Vec::new();

        for msg in self.receiver.try_iter().take(max_messages) {
            let kind = msg.kind();
            for (_, subscriber) in self.subscribers.iter_mut().filter(|(k, _)| *k == kind) {
                subscriber(&msg);
            }

            let event = match &msg {
                PianoMessage::Note(event) => Some(*event),
                PianoMessage::Midi(message) => message.to_event(),
                _ => {
                    unhandled.push(msg);
                    continue;
                }
            };

            if let Some(event) = event {
                for listener in listeners.iter_mut() {
                    listener.on_note(&event);
                }
            }
        }

        unhandled
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::input::{Phase, Source};
    use crate::core::midi::MidiMessage;
    use crate::core::note::{Note, PitchClass};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Recorder {
        events: Vec<NoteEvent>,
    }

    impl NoteListener for Recorder {
        fn on_note(&mut self, event: &NoteEvent) {
            self.events.push(*event);
        }
    }

    fn c4() -> Note {
        Note::new(PitchClass::C, 4)
    }

    #[test]
    fn every_listener_sees_every_note() {
        let mut bus = MessageBus::new();
        bus.send(PianoMessage::Note(NoteEvent::down(c4(), Source::Pointer)));
        bus.send(PianoMessage::Note(NoteEvent::up(c4(), Source::Pointer)));

        let mut view = Recorder::default();
        let mut synth = Recorder::default();
        let rest = bus.process_messages(16, &mut [&mut view, &mut synth]);

        assert!(rest.is_empty());
        assert_eq!(view.events.len(), 2);
        assert_eq!(view.events, synth.events);
    }

    #[test]
    fn hardware_messages_are_normalized() {
        let mut bus = MessageBus::new();
        let sender = bus.sender();
        sender
            .send(PianoMessage::Midi(MidiMessage::decode(&[0x90, 60, 90]).unwrap()))
            .unwrap();
        sender
            .send(PianoMessage::Midi(MidiMessage::decode(&[0x90, 10, 90]).unwrap()))
            .unwrap();
        sender
            .send(PianoMessage::Midi(MidiMessage::decode(&[0xe0, 0, 64]).unwrap()))
            .unwrap();

        let mut recorder = Recorder::default();
        bus.process_messages(16, &mut [&mut recorder]);

        assert_eq!(recorder.events, vec![NoteEvent::new(c4(), Phase::Down, Source::Hardware)]);
    }

    #[test]
    fn other_messages_are_returned() {
        let mut bus = MessageBus::new();
        bus.send(PianoMessage::Log("hello".into()));
        let rest = bus.process_messages(16, &mut []);
        assert_eq!(rest, vec![PianoMessage::Log("hello".into())]);
    }

    #[test]
    fn subscribers_only_see_their_kind() {
        let mut bus = MessageBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(MessageKind::Log, move |msg| sink.borrow_mut().push(msg.clone()));

        bus.send(PianoMessage::Note(NoteEvent::down(c4(), Source::ComputerKeyboard)));
        bus.send(PianoMessage::Log("one".into()));
        bus.process_messages(16, &mut []);

        assert_eq!(*seen.borrow(), vec![PianoMessage::Log("one".into())]);
    }

    #[test]
    fn respects_the_per_frame_limit() {
        let mut bus = MessageBus::new();
        for _ in 0..5 {
            bus.send(PianoMessage::Note(NoteEvent::down(c4(), Source::Pointer)));
        }

        let mut recorder = Recorder::default();
        bus.process_messages(3, &mut [&mut recorder]);
        assert_eq!(recorder.events.len(), 3);
        bus.process_messages(3, &mut [&mut recorder]);
        assert_eq!(recorder.events.len(), 5);
    }
}
