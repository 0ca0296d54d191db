use clap::ValueEnum;
use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a pointer press maps onto the two intents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
pub enum Dispatch {
    /// Left half fills, right half pours.
    #[default]
    #[serde(rename = "split")]
    #[value(name = "split")]
    SplitScreen,
    /// Every press fills.
    #[serde(rename = "fill")]
    #[value(name = "fill")]
    AlwaysFill,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Action {
    /// Add one slot of a random color to the selected bottle.
    Fill,
    /// Pour the selected bottle into the next one.
    Pour,
    /// Pour the selected bottle onto the floor.
    Drain,
    RemoveTop,
    Clear,
    /// Nudge the tilt; -1 leans right, +1 leans left.
    Tilt(i8),
    Select(usize),
    SelectNext,
    SelectPrev,
    PauseToggle,
    HelpToggle,
    Back,
    Quit,
}

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Press { column: u16 },
}

pub fn collect_input_nonblocking(max_frame_time: Duration) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if k.kind == KeyEventKind::Press || k.kind == KeyEventKind::Repeat => {
                out.push(InputEvent::Key {
                    key: k.code,
                    mods: k.modifiers,
                });
            }
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                out.push(InputEvent::Press { column: m.column });
            }
            _ => {}
        }
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

/// Resolves one input event. `cols` is the terminal width, used to split
/// pointer presses into halves.
pub fn map_event_to_action(
    dispatch: Dispatch,
    help_open: bool,
    ev: &InputEvent,
    cols: u16,
) -> Option<Action> {
    let (key, mods) = match *ev {
        InputEvent::Press { .. } if help_open => return Some(Action::Back),
        InputEvent::Press { column } => {
            return match dispatch {
                Dispatch::AlwaysFill => Some(Action::Fill),
                Dispatch::SplitScreen if column < cols / 2 => Some(Action::Fill),
                Dispatch::SplitScreen => Some(Action::Pour),
            };
        }
        InputEvent::Key { key, mods } => (key, mods),
    };

    if matches!(key, KeyCode::Char('c') | KeyCode::Char('C'))
        && mods.contains(KeyModifiers::CONTROL)
    {
        return Some(Action::Quit);
    }
    match key {
        KeyCode::Char('h') | KeyCode::Char('H') | KeyCode::Char('?') => {
            return Some(Action::HelpToggle)
        }
        KeyCode::Char('q') | KeyCode::Char('Q') => return Some(Action::Quit),
        KeyCode::Esc if help_open => return Some(Action::Back),
        KeyCode::Esc => return Some(Action::Quit),
        _ => {}
    }
    if help_open {
        return None;
    }

    match key {
        KeyCode::Char('f') | KeyCode::Char('F') => Some(Action::Fill),
        KeyCode::Char('p') | KeyCode::Char('P') => Some(Action::Pour),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(Action::Drain),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(Action::RemoveTop),
        KeyCode::Char('c') | KeyCode::Char('C') => Some(Action::Clear),
        KeyCode::Char(' ') => Some(Action::PauseToggle),
        KeyCode::Left => Some(Action::Tilt(1)),
        KeyCode::Right => Some(Action::Tilt(-1)),
        KeyCode::Tab => Some(Action::SelectNext),
        KeyCode::BackTab => Some(Action::SelectPrev),
        KeyCode::Char(ch @ '1'..='9') => Some(Action::Select(ch as usize - '1' as usize)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: KeyCode) -> InputEvent {
        InputEvent::Key {
            key: k,
            mods: KeyModifiers::NONE,
        }
    }

    #[test]
    fn split_screen_maps_halves_to_intents() {
        let d = Dispatch::SplitScreen;
        let left = InputEvent::Press { column: 10 };
        let right = InputEvent::Press { column: 50 };
        assert_eq!(map_event_to_action(d, false, &left, 80), Some(Action::Fill));
        assert_eq!(map_event_to_action(d, false, &right, 80), Some(Action::Pour));
    }

    #[test]
    fn always_fill_ignores_position() {
        let ev = InputEvent::Press { column: 79 };
        assert_eq!(
            map_event_to_action(Dispatch::AlwaysFill, false, &ev, 80),
            Some(Action::Fill)
        );
    }

    #[test]
    fn keys_map_to_actions() {
        let d = Dispatch::default();
        let cases = [
            (KeyCode::Char('f'), Action::Fill),
            (KeyCode::Char('p'), Action::Pour),
            (KeyCode::Char('d'), Action::Drain),
            (KeyCode::Char('x'), Action::RemoveTop),
            (KeyCode::Left, Action::Tilt(1)),
            (KeyCode::Right, Action::Tilt(-1)),
            (KeyCode::Tab, Action::SelectNext),
            (KeyCode::Char('3'), Action::Select(2)),
            (KeyCode::Char(' '), Action::PauseToggle),
            (KeyCode::Char('q'), Action::Quit),
            (KeyCode::Esc, Action::Quit),
        ];
        for (k, want) in cases {
            assert_eq!(map_event_to_action(d, false, &key(k), 80), Some(want), "{k:?}");
        }
        assert_eq!(map_event_to_action(d, false, &key(KeyCode::Char('z')), 80), None);
    }

    #[test]
    fn help_overlay_swallows_actions() {
        let d = Dispatch::default();
        assert_eq!(map_event_to_action(d, true, &key(KeyCode::Char('f')), 80), None);
        assert_eq!(
            map_event_to_action(d, true, &key(KeyCode::Esc), 80),
            Some(Action::Back)
        );
        assert_eq!(
            map_event_to_action(d, true, &InputEvent::Press { column: 1 }, 80),
            Some(Action::Back)
        );
    }

    #[test]
    fn ctrl_c_quits() {
        let ev = InputEvent::Key {
            key: KeyCode::Char('c'),
            mods: KeyModifiers::CONTROL,
        };
        assert_eq!(
            map_event_to_action(Dispatch::default(), false, &ev, 80),
            Some(Action::Quit)
        );
    }
}
