//! Window input collected into a per-frame event queue.
//!
//! winit delivers events whenever it likes; the renderer wants them at a frame
//! boundary. [`InputQueue::handle_event`] translates the interesting
//! [`WindowEvent`]s into [`InputEvent`]s and [`InputQueue::drain`] hands them
//! over once per frame, before integration and rendering.

use std::collections::{HashSet, VecDeque};

use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// An input event in the form the frame loop consumes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Key { key: KeyCode, pressed: bool },
    MouseButton { button: MouseButton, pressed: bool },
    CursorMoved { x: f32, y: f32 },
    /// Vertical scroll in lines.
    Scroll { delta: f32 },
}

/// FIFO of input events waiting for the next frame.
#[derive(Debug, Default)]
pub struct InputQueue {
    events: VecDeque<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a window event if it carries input. Returns whether it did.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        let translated = match event {
            WindowEvent::KeyboardInput { event, .. } => match event.physical_key {
                PhysicalKey::Code(key) => Some(InputEvent::Key {
                    key,
                    pressed: event.state == ElementState::Pressed,
                }),
                PhysicalKey::Unidentified(_) => None,
            },
            WindowEvent::MouseInput { state, button, .. } => Some(InputEvent::MouseButton {
                button: *button,
                pressed: *state == ElementState::Pressed,
            }),
            WindowEvent::CursorMoved { position, .. } => Some(InputEvent::CursorMoved {
                x: position.x as f32,
                y: position.y as f32,
            }),
            WindowEvent::MouseWheel { delta, .. } => {
                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 120.0,
                };
                Some(InputEvent::Scroll { delta })
            }
            _ => None,
        };

        match translated {
            Some(event) => {
                self.push(event);
                true
            }
            None => false,
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push_back(event);
    }

    /// Take every queued event in arrival order.
    pub fn drain(&mut self) -> impl Iterator<Item = InputEvent> + '_ {
        self.events.drain(..)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Set of keys currently held down.
#[derive(Debug, Default)]
pub struct HeldKeys {
    keys: HashSet<KeyCode>,
}

impl HeldKeys {
    pub fn press(&mut self, key: KeyCode) {
        self.keys.insert(key);
    }

    pub fn release(&mut self, key: KeyCode) {
        self.keys.remove(&key);
    }

    /// Returns true if the key is currently held down.
    pub fn is_down(&self, key: KeyCode) -> bool {
        self.keys.contains(&key)
    }
}
