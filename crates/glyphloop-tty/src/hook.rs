#![forbid(unsafe_code)]

//! Terminal input translation and the terminal key hook.
//!
//! A terminal has a single input stream, so one reader serves both input
//! paths. The [`Translator`] turns each crossterm event into updates of the
//! shared raw key table (read by polled sampling), queued
//! [`PlatformEvent`]s, and [`RawKeyNotification`]s for the capture thread.
//!
//! The translator lives in a [`SharedTranslator`] slot. While the capture
//! thread runs, [`TtyKeyHook`] holds it and is the only reader. When the
//! hook fails to install, hits a read error, or is dropped, the translator
//! goes back into the slot and polled sampling reads the stream itself
//! without blocking.
//!
//! # Key releases
//!
//! Terminals with keyboard enhancement report releases directly. Others
//! only report presses and auto-repeats; for those, a key counts as
//! released once no down notification has arrived for the release timeout,
//! and a synthetic up notification is emitted.

use std::io::{self, IsTerminal};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crossterm::event::{
    self, Event, KeyEvent as CtKeyEvent, KeyEventKind, MouseButton as CtMouseButton, MouseEvent,
    MouseEventKind,
};
use glyphloop_backend::CellScale;
use glyphloop_core::{
    CaptureStop, KEY_COUNT, KeyCode, KeyHook, MouseButtons, PlatformEvent, RawKeyNotification,
};
use web_time::Instant;

use crate::keymap::{generic_modifier, map_key, modifier_codes};

/// Upper bound on how long the hook blocks on the terminal before
/// rechecking its stop flag and expiring synthetic releases.
pub const HOOK_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default synthetic release timeout: above common autorepeat delays
/// (250 to 660 ms), so a held key is not released before its first repeat.
pub const DEFAULT_KEY_RELEASE_TIMEOUT: Duration = Duration::from_millis(700);

/// Raw key-down table shared by the translator and polled sampling.
pub type SharedKeyTable = Arc<Mutex<[bool; KEY_COUNT]>>;

/// Home of the one [`Translator`]; empty while a key hook holds it.
pub type SharedTranslator = Arc<Mutex<Option<Translator>>>;

/// Crossterm event translator.
#[derive(Debug)]
pub struct Translator {
    keys: SharedKeyTable,
    events: mpsc::Sender<PlatformEvent>,
    down_since: Box<[Option<Instant>; KEY_COUNT]>,
    implied: Box<[Option<Instant>; KEY_COUNT]>,
    release_timeout: Duration,
    reports_releases: bool,
    scale: CellScale,
    buttons: MouseButtons,
}

impl Translator {
    #[must_use]
    pub fn new(keys: SharedKeyTable, events: mpsc::Sender<PlatformEvent>) -> Self {
        Self {
            keys,
            events,
            down_since: Box::new([None; KEY_COUNT]),
            implied: Box::new([None; KEY_COUNT]),
            release_timeout: DEFAULT_KEY_RELEASE_TIMEOUT,
            reports_releases: false,
            scale: CellScale::UNIT,
            buttons: MouseButtons::empty(),
        }
    }

    /// Configure for a freshly opened surface.
    pub fn configure(&mut self, scale: CellScale, release_timeout: Duration, reports_releases: bool) {
        self.scale = CellScale::new(scale.width.max(1), scale.height.max(1));
        self.release_timeout = release_timeout;
        self.reports_releases = reports_releases;
        tracing::debug!(
            reports_releases,
            release_timeout_ms = release_timeout.as_millis() as u64,
            "terminal input translator configured"
        );
    }

    #[must_use]
    pub fn reports_releases(&self) -> bool {
        self.reports_releases
    }

    /// Translate one terminal event.
    pub fn translate(&mut self, event: Event, now: Instant, out: &mut Vec<RawKeyNotification>) {
        match event {
            Event::Key(key) => self.translate_key(key, now, out),
            Event::Mouse(mouse) => self.translate_mouse(mouse),
            Event::FocusGained => self.emit(PlatformEvent::Focus(true)),
            Event::FocusLost => self.emit(PlatformEvent::Focus(false)),
            Event::Resize(columns, rows) => self.emit(PlatformEvent::Resize { columns, rows }),
            Event::Paste(_) => {}
        }
    }

    fn translate_key(&mut self, key: CtKeyEvent, now: Instant, out: &mut Vec<RawKeyNotification>) {
        let Some(code) = map_key(key.code, key.state) else {
            tracing::trace!(?key.code, "unmapped key ignored");
            return;
        };
        let down = !matches!(key.kind, KeyEventKind::Release);
        let mut table = self.keys.lock().unwrap_or_else(|e| e.into_inner());

        table[code.index()] = down;
        if let Some(alias) = generic_modifier(code) {
            table[alias.index()] = down;
        }
        if down {
            out.push(RawKeyNotification::down(code));
            if !self.reports_releases {
                self.down_since[code.index()] = Some(now);
                // Modifiers only show up as flags here; hold them as long as the key.
                for modifier in modifier_codes(key.modifiers) {
                    table[modifier.index()] = true;
                    self.implied[modifier.index()] = Some(now);
                }
            }
        } else {
            self.down_since[code.index()] = None;
            out.push(RawKeyNotification::up(code));
        }
    }

    fn translate_mouse(&mut self, mouse: MouseEvent) {
        let x = i32::from(mouse.column / self.scale.width);
        let y = i32::from(mouse.row / self.scale.height);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                self.emit(PlatformEvent::MouseMoved { x, y });
            }
            MouseEventKind::Down(button) => {
                self.emit(PlatformEvent::MouseMoved { x, y });
                self.buttons.insert(button_flag(button));
                self.emit(PlatformEvent::MouseButtons { mask: self.buttons });
            }
            MouseEventKind::Up(button) => {
                self.emit(PlatformEvent::MouseMoved { x, y });
                self.buttons.remove(button_flag(button));
                self.emit(PlatformEvent::MouseButtons { mask: self.buttons });
            }
            MouseEventKind::ScrollUp => self.emit(PlatformEvent::MouseWheel { forward: true }),
            MouseEventKind::ScrollDown => self.emit(PlatformEvent::MouseWheel { forward: false }),
            MouseEventKind::ScrollLeft | MouseEventKind::ScrollRight => {}
        }
    }

    /// Release keys whose last down notification is older than the timeout.
    pub fn expire(&mut self, now: Instant, out: &mut Vec<RawKeyNotification>) {
        if self.reports_releases {
            return;
        }
        let timeout = self.release_timeout;
        let mut table = self.keys.lock().unwrap_or_else(|e| e.into_inner());
        for (index, since) in self.down_since.iter_mut().enumerate() {
            if let Some(t) = *since
                && now.duration_since(t) >= timeout
            {
                *since = None;
                table[index] = false;
                let code = KeyCode(index as u8);
                if let Some(alias) = generic_modifier(code) {
                    table[alias.index()] = false;
                }
                out.push(RawKeyNotification::up(code));
            }
        }
        for (index, since) in self.implied.iter_mut().enumerate() {
            if let Some(t) = *since
                && now.duration_since(t) >= timeout
            {
                *since = None;
                table[index] = false;
            }
        }
    }

    fn emit(&self, event: PlatformEvent) {
        // The receiver lives in the backend; it only disappears at shutdown.
        let _ = self.events.send(event);
    }
}

fn button_flag(button: CtMouseButton) -> MouseButtons {
    match button {
        CtMouseButton::Left => MouseButtons::LEFT,
        CtMouseButton::Right => MouseButtons::RIGHT,
        CtMouseButton::Middle => MouseButtons::MIDDLE,
    }
}

/// Key hook reading the terminal on the capture thread.
///
/// Borrows the translator out of its slot and returns it on uninstall,
/// failed install, or drop.
#[derive(Debug)]
pub struct TtyKeyHook {
    translator: Option<Translator>,
    home: SharedTranslator,
    pending: Vec<RawKeyNotification>,
    cursor: usize,
}

impl TtyKeyHook {
    /// Take the translator out of `slot`; `None` when another hook holds it.
    #[must_use]
    pub fn take(slot: &SharedTranslator) -> Option<Self> {
        let translator = slot.lock().unwrap_or_else(|e| e.into_inner()).take()?;
        Some(Self {
            translator: Some(translator),
            home: Arc::clone(slot),
            pending: Vec::new(),
            cursor: 0,
        })
    }

    fn give_back(&mut self) {
        if let Some(translator) = self.translator.take() {
            *self.home.lock().unwrap_or_else(|e| e.into_inner()) = Some(translator);
            tracing::debug!("terminal reader returned to polled input");
        }
    }
}

fn next_pending(pending: &mut Vec<RawKeyNotification>, cursor: &mut usize) -> Option<RawKeyNotification> {
    let next = pending.get(*cursor).copied();
    match next {
        Some(_) => *cursor += 1,
        None => {
            pending.clear();
            *cursor = 0;
        }
    }
    next
}

impl KeyHook for TtyKeyHook {
    type Error = io::Error;

    fn install(&mut self) -> Result<(), Self::Error> {
        if !io::stdin().is_terminal() {
            self.give_back();
            return Err(io::Error::other("stdin is not a terminal"));
        }
        tracing::debug!(
            reports_releases = self.translator.as_ref().is_some_and(Translator::reports_releases),
            "terminal key hook installed"
        );
        Ok(())
    }

    fn next_notification(&mut self, stop: &CaptureStop) -> Option<RawKeyNotification> {
        let Self {
            translator,
            pending,
            cursor,
            ..
        } = self;
        let translator = translator.as_mut()?;
        loop {
            if let Some(notification) = next_pending(pending, cursor) {
                return Some(notification);
            }
            if stop.is_stopped() {
                return None;
            }
            translator.expire(Instant::now(), pending);
            if !pending.is_empty() {
                continue;
            }
            match event::poll(HOOK_POLL_INTERVAL) {
                Ok(true) => match event::read() {
                    Ok(ev) => translator.translate(ev, Instant::now(), pending),
                    Err(err) => {
                        tracing::warn!(error = %err, "terminal read failed; key hook exiting");
                        return None;
                    }
                },
                Ok(false) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "terminal poll failed; key hook exiting");
                    return None;
                }
            }
        }
    }

    fn uninstall(&mut self) {
        self.give_back();
        tracing::debug!("terminal key hook uninstalled");
    }
}

impl Drop for TtyKeyHook {
    fn drop(&mut self) {
        self.give_back();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode as CtKeyCode, KeyEventState, KeyModifiers};
    use glyphloop_core::Key;

    fn translator() -> (Translator, SharedKeyTable, mpsc::Receiver<PlatformEvent>) {
        let keys: SharedKeyTable = Arc::new(Mutex::new([false; KEY_COUNT]));
        let (tx, rx) = mpsc::channel();
        (Translator::new(Arc::clone(&keys), tx), keys, rx)
    }

    fn key(code: CtKeyCode, kind: KeyEventKind) -> Event {
        Event::Key(CtKeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind,
            state: KeyEventState::NONE,
        })
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn press_then_synthetic_release() {
        let (mut t, keys, _rx) = translator();
        t.configure(CellScale::UNIT, Duration::from_millis(100), false);
        let start = Instant::now();
        let mut out = Vec::new();

        t.translate(key(CtKeyCode::Char('w'), KeyEventKind::Press), start, &mut out);
        assert_eq!(out, vec![RawKeyNotification::down(Key::W.code())]);
        assert!(keys.lock().unwrap()[Key::W.code().index()]);

        out.clear();
        t.expire(start + Duration::from_millis(50), &mut out);
        assert!(out.is_empty());

        t.expire(start + Duration::from_millis(100), &mut out);
        assert_eq!(out, vec![RawKeyNotification::up(Key::W.code())]);
        assert!(!keys.lock().unwrap()[Key::W.code().index()]);
    }

    #[test]
    fn repeats_extend_the_hold() {
        let (mut t, keys, _rx) = translator();
        t.configure(CellScale::UNIT, Duration::from_millis(100), false);
        let start = Instant::now();
        let mut out = Vec::new();
        t.translate(key(CtKeyCode::Char('a'), KeyEventKind::Press), start, &mut out);
        t.translate(
            key(CtKeyCode::Char('a'), KeyEventKind::Press),
            start + Duration::from_millis(80),
            &mut out,
        );
        out.clear();
        t.expire(start + Duration::from_millis(150), &mut out);
        assert!(out.is_empty());
        assert!(keys.lock().unwrap()[Key::A.code().index()]);
    }

    #[test]
    fn reported_releases_are_not_synthesized() {
        let (mut t, keys, _rx) = translator();
        t.configure(CellScale::UNIT, Duration::from_millis(1), true);
        let start = Instant::now();
        let mut out = Vec::new();
        t.translate(key(CtKeyCode::Esc, KeyEventKind::Press), start, &mut out);
        t.expire(start + Duration::from_secs(1), &mut out);
        assert_eq!(out.len(), 1);
        assert!(keys.lock().unwrap()[Key::Escape.code().index()]);

        t.translate(key(CtKeyCode::Esc, KeyEventKind::Release), start, &mut out);
        assert_eq!(out[1], RawKeyNotification::up(Key::Escape.code()));
        assert!(!keys.lock().unwrap()[Key::Escape.code().index()]);
    }

    #[test]
    fn side_specific_modifier_sets_generic_alias() {
        let (mut t, keys, _rx) = translator();
        t.configure(CellScale::UNIT, Duration::from_millis(100), true);
        let mut out = Vec::new();
        t.translate(
            key(
                CtKeyCode::Modifier(crossterm::event::ModifierKeyCode::LeftShift),
                KeyEventKind::Press,
            ),
            Instant::now(),
            &mut out,
        );
        let table = keys.lock().unwrap();
        assert!(table[Key::LeftShift.code().index()]);
        assert!(table[Key::Shift.code().index()]);
    }

    #[test]
    fn modifier_flags_are_held_with_the_key() {
        let (mut t, keys, _rx) = translator();
        t.configure(CellScale::UNIT, Duration::from_millis(100), false);
        let start = Instant::now();
        let mut out = Vec::new();
        t.translate(
            Event::Key(CtKeyEvent {
                code: CtKeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                kind: KeyEventKind::Press,
                state: KeyEventState::NONE,
            }),
            start,
            &mut out,
        );
        assert!(keys.lock().unwrap()[Key::Ctrl.code().index()]);
        t.expire(start + Duration::from_millis(100), &mut out);
        assert!(!keys.lock().unwrap()[Key::Ctrl.code().index()]);
    }

    #[test]
    fn mouse_events_are_scaled_and_tracked() {
        let (mut t, _keys, rx) = translator();
        t.configure(CellScale::new(2, 1), Duration::from_millis(100), false);
        let now = Instant::now();
        let mut out = Vec::new();
        t.translate(mouse(MouseEventKind::Down(CtMouseButton::Left), 9, 4), now, &mut out);
        t.translate(mouse(MouseEventKind::ScrollUp, 0, 0), now, &mut out);
        t.translate(mouse(MouseEventKind::Up(CtMouseButton::Left), 9, 4), now, &mut out);
        t.translate(Event::FocusLost, now, &mut out);
        t.translate(Event::Resize(100, 40), now, &mut out);

        let events: Vec<PlatformEvent> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                PlatformEvent::MouseMoved { x: 4, y: 4 },
                PlatformEvent::MouseButtons {
                    mask: MouseButtons::LEFT
                },
                PlatformEvent::MouseWheel { forward: true },
                PlatformEvent::MouseMoved { x: 4, y: 4 },
                PlatformEvent::MouseButtons {
                    mask: MouseButtons::empty()
                },
                PlatformEvent::Focus(false),
                PlatformEvent::Resize {
                    columns: 100,
                    rows: 40
                },
            ]
        );
        assert!(out.is_empty());
    }

    #[test]
    fn pending_notifications_drain_in_order() {
        let (t, _keys, _rx) = translator();
        let slot: SharedTranslator = Arc::new(Mutex::new(Some(t)));
        let mut hook = TtyKeyHook::take(&slot).expect("translator in slot");
        hook.pending = vec![
            RawKeyNotification::down(Key::A.code()),
            RawKeyNotification::up(Key::A.code()),
        ];
        let stop = CaptureStop::new();
        assert_eq!(
            hook.next_notification(&stop),
            Some(RawKeyNotification::down(Key::A.code()))
        );
        assert_eq!(
            hook.next_notification(&stop),
            Some(RawKeyNotification::up(Key::A.code()))
        );
        stop.stop();
        assert_eq!(hook.next_notification(&stop), None);
    }

    #[test]
    fn hook_holds_the_only_reader() {
        let (t, _keys, _rx) = translator();
        let slot: SharedTranslator = Arc::new(Mutex::new(Some(t)));
        let hook = TtyKeyHook::take(&slot).expect("translator in slot");
        assert!(slot.lock().unwrap().is_none());
        assert!(TtyKeyHook::take(&slot).is_none());
        drop(hook);
        assert!(slot.lock().unwrap().is_some());
    }

    #[test]
    fn reader_resumes_where_the_hook_left_off() {
        let (t, keys, _rx) = translator();
        let slot: SharedTranslator = Arc::new(Mutex::new(Some(t)));
        let mut hook = TtyKeyHook::take(&slot).expect("translator in slot");
        let start = Instant::now();
        let mut out = Vec::new();
        {
            let held = hook.translator.as_mut().expect("held by hook");
            held.configure(CellScale::UNIT, Duration::from_millis(100), false);
            held.translate(key(CtKeyCode::Char('d'), KeyEventKind::Press), start, &mut out);
        }
        hook.uninstall();
        assert!(hook.translator.is_none());
        assert_eq!(hook.next_notification(&CaptureStop::new()), None);

        // The polled side inherits the held key and its release timer.
        let mut slot = slot.lock().unwrap();
        let reader = slot.as_mut().expect("returned on uninstall");
        assert!(keys.lock().unwrap()[Key::D.code().index()]);
        out.clear();
        reader.expire(start + Duration::from_millis(100), &mut out);
        assert_eq!(out, vec![RawKeyNotification::up(Key::D.code())]);
        assert!(!keys.lock().unwrap()[Key::D.code().index()]);
    }
}
