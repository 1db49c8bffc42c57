use std::collections::VecDeque;

use glam::Vec2;
use winit::event::{ElementState, MouseButton, WindowEvent};

/// One window-system event the frame loop cares about, captured verbatim in
/// arrival order.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WindowSignal {
    Resized { width: u32, height: u32 },
    CursorMoved(Vec2),
    MouseButton { button: MouseButton, pressed: bool },
}

/// Queue of window signals. Callbacks only append; the frame loop drains the
/// whole queue once per frame boundary, so no callback ever races the
/// renderer or the camera.
#[derive(Default)]
pub struct InputState {
    queue: VecDeque<WindowSignal>,
}

impl InputState {
    /// Map a winit event onto the queue. Events the frame loop does not act
    /// on are dropped here.
    pub fn record(&mut self, event: &WindowEvent) {
        match event {
            WindowEvent::Resized(size) => {
                self.push(WindowSignal::Resized {
                    width: size.width,
                    height: size.height,
                });
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.push(WindowSignal::CursorMoved(Vec2::new(
                    position.x as f32,
                    position.y as f32,
                )));
            }
            WindowEvent::MouseInput { state, button, .. } => {
                self.push(WindowSignal::MouseButton {
                    button: *button,
                    pressed: *state == ElementState::Pressed,
                });
            }
            _ => {}
        }
    }

    pub fn push(&mut self, signal: WindowSignal) {
        self.queue.push_back(signal);
    }

    pub fn drain(&mut self) -> impl Iterator<Item = WindowSignal> + '_ {
        self.queue.drain(..)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signals_drain_in_arrival_order() {
        let mut input = InputState::default();
        input.push(WindowSignal::MouseButton {
            button: MouseButton::Left,
            pressed: true,
        });
        input.push(WindowSignal::CursorMoved(Vec2::new(3.0, 4.0)));
        input.push(WindowSignal::Resized {
            width: 800,
            height: 600,
        });

        let drained: Vec<_> = input.drain().collect();
        assert_eq!(drained.len(), 3);
        assert_eq!(drained[1], WindowSignal::CursorMoved(Vec2::new(3.0, 4.0)));
        assert_eq!(input.drain().count(), 0);
    }
}
