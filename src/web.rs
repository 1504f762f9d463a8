//! Browser shell: DOM-backed [`Display`], rAF / setTimeout-backed
//! [`Scheduler`], and the keyboard / reset-button wiring.
//!
//! Existing page elements are reused by id (`game-container`, `score`, `timer`,
//! `reset-btn`, `col-s` .. `col-k`); anything missing is created with a bare
//! layout so the game still runs on an empty page.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, HtmlAudioElement, HtmlElement, Window, window};

use crate::clock::{Scheduler, TaskHandle, TaskKind, Ticket};
use crate::config::GameConfig;
use crate::display::{Display, NoteMark};
use crate::error::{Error, Result};
use crate::lane::Lane;
use crate::note::NoteId;
use crate::session::Session;

/// Play-area height used when the container has not been laid out yet.
const FALLBACK_PLAY_HEIGHT: f64 = 600.0;

type GameSession = Session<DomDisplay, BrowserScheduler>;

thread_local! {
    static SESSION: RefCell<Option<GameSession>> = const { RefCell::new(None) };
    static LISTENERS_BOUND: Cell<bool> = const { Cell::new(false) };
}

/// Run `f` against the live session, if any. Callbacks that arrive while the
/// session is already borrowed are dropped.
fn with_session(f: impl FnOnce(&mut GameSession)) {
    SESSION.with(|cell| {
        if let Ok(mut slot) = cell.try_borrow_mut() {
            if let Some(session) = slot.as_mut() {
                f(session);
            }
        }
    });
}

/// Millisecond timestamp on the same clock rAF callbacks receive. Falls back
/// to wall-clock time where `performance` is unavailable.
pub fn now_ms() -> f64 {
    window()
        .and_then(|w| w.performance())
        .map(|p| p.now())
        .unwrap_or_else(js_sys::Date::now)
}

// --- Scheduler ---------------------------------------------------------------

/// Owns the closure behind each outstanding callback so a cancelled one is
/// freed instead of leaking. The session keeps at most one request of each
/// kind in flight, so one slot per kind suffices.
pub struct BrowserScheduler {
    window: Window,
    frame: Option<(TaskHandle, Closure<dyn FnMut(f64)>)>,
    spawn: Option<(TaskHandle, Closure<dyn FnMut()>)>,
}

impl BrowserScheduler {
    pub fn new(window: Window) -> Self {
        Self {
            window,
            frame: None,
            spawn: None,
        }
    }

    /// Closures still held for outstanding (or just fired) callbacks.
    pub fn live_callbacks(&self) -> usize {
        usize::from(self.frame.is_some()) + usize::from(self.spawn.is_some())
    }
}

// A new request replaces the slot's previous closure, which has already fired
// (it may be the one running right now; wasm-bindgen defers its destruction
// until the call returns) or been cancelled.
impl Scheduler for BrowserScheduler {
    fn request_frame(&mut self, ticket: Ticket) -> TaskHandle {
        let cb = Closure::wrap(Box::new(move |ts: f64| {
            with_session(|s| s.on_frame(ticket, ts));
        }) as Box<dyn FnMut(f64)>);
        let id = self
            .window
            .request_animation_frame(cb.as_ref().unchecked_ref())
            .unwrap_or_else(|e| {
                warn!("requestAnimationFrame failed: {}", Error::dom(e));
                -1
            });
        let handle = TaskHandle {
            kind: TaskKind::Frame,
            id,
        };
        self.frame = Some((handle, cb));
        handle
    }

    fn schedule_spawn(&mut self, delay_ms: f64, ticket: Ticket) -> TaskHandle {
        let cb = Closure::wrap(Box::new(move || {
            with_session(|s| s.on_spawn_timer(ticket));
        }) as Box<dyn FnMut()>);
        let id = self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.as_ref().unchecked_ref(),
                delay_ms.round() as i32,
            )
            .unwrap_or_else(|e| {
                warn!("setTimeout failed: {}", Error::dom(e));
                -1
            });
        let handle = TaskHandle {
            kind: TaskKind::SpawnTimer,
            id,
        };
        self.spawn = Some((handle, cb));
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        match handle.kind {
            TaskKind::Frame => {
                if handle.id >= 0 {
                    let _ = self.window.cancel_animation_frame(handle.id);
                }
                if self.frame.as_ref().is_some_and(|(h, _)| *h == handle) {
                    self.frame = None;
                }
            }
            TaskKind::SpawnTimer => {
                if handle.id >= 0 {
                    self.window.clear_timeout_with_handle(handle.id);
                }
                if self.spawn.as_ref().is_some_and(|(h, _)| *h == handle) {
                    self.spawn = None;
                }
            }
        }
    }
}

// --- Display -----------------------------------------------------------------

pub struct DomDisplay {
    window: Window,
    document: Document,
    container: HtmlElement,
    columns: [HtmlElement; 4],
    score: HtmlElement,
    timer: HtmlElement,
    reset_button: HtmlElement,
    cues: [Option<HtmlAudioElement>; 4],
    notes: HashMap<NoteId, (Lane, HtmlElement)>,
}

/// Look up `id`, or create a `tag` element with that id under `parent`.
fn ensure_element(
    doc: &Document,
    parent: &web_sys::Node,
    id: &str,
    tag: &str,
    style: &str,
) -> Result<HtmlElement> {
    if let Some(el) = doc.get_element_by_id(id) {
        return el.dyn_into::<HtmlElement>().map_err(|e| Error::dom(e.into()));
    }
    let el = doc.create_element(tag).map_err(Error::dom)?;
    el.set_id(id);
    el.set_attribute("style", style).map_err(Error::dom)?;
    parent.append_child(&el).map_err(Error::dom)?;
    el.dyn_into::<HtmlElement>().map_err(|e| Error::dom(e.into()))
}

impl DomDisplay {
    pub fn attach(window: Window) -> Result<Self> {
        let document = window.document().ok_or(Error::MissingDocument)?;
        let body = document.body().ok_or(Error::MissingDocument)?;

        let score = ensure_element(&document, &body, "score", "div", "font-family:monospace; font-size:18px;")?;
        let timer = ensure_element(&document, &body, "timer", "div", "font-family:monospace; font-size:18px;")?;
        let container = ensure_element(
            &document,
            &body,
            "game-container",
            "div",
            "position:relative; display:flex; width:400px; height:600px; overflow:hidden; background:#181818;",
        )?;
        let reset_button = ensure_element(&document, &body, "reset-btn", "button", "margin-top:8px;")?;
        if reset_button.text_content().unwrap_or_default().is_empty() {
            reset_button.set_text_content(Some("Reset"));
        }

        let column_style = "position:relative; flex:1; height:100%; border-left:1px solid #333;";
        let columns = [
            ensure_element(&document, &container, Lane::S.column_id(), "div", column_style)?,
            ensure_element(&document, &container, Lane::D.column_id(), "div", column_style)?,
            ensure_element(&document, &container, Lane::J.column_id(), "div", column_style)?,
            ensure_element(&document, &container, Lane::K.column_id(), "div", column_style)?,
        ];

        // Missing audio is not fatal; the lane just stays silent.
        let cues = Lane::ALL.map(|lane| match HtmlAudioElement::new_with_src(lane.cue_asset()) {
            Ok(audio) => Some(audio),
            Err(e) => {
                warn!("no audio cue for lane {lane}: {}", Error::dom(e));
                None
            }
        });

        Ok(Self {
            window,
            document,
            container,
            columns,
            score,
            timer,
            reset_button,
            cues,
            notes: HashMap::new(),
        })
    }

    /// Height of the play area in pixels.
    pub fn play_height(&self) -> f64 {
        match self.container.client_height() {
            h if h > 0 => h as f64,
            _ => FALLBACK_PLAY_HEIGHT,
        }
    }

    fn set_style(el: &HtmlElement, prop: &str, value: &str) {
        if let Err(e) = el.style().set_property(prop, value) {
            warn!("style {prop} rejected: {}", Error::dom(e));
        }
    }
}

impl Display for DomDisplay {
    fn render_note(&mut self, id: NoteId, lane: Lane, height: f64) {
        let el = match self
            .document
            .create_element("div")
            .and_then(|e| e.dyn_into::<HtmlElement>().map_err(JsValue::from))
        {
            Ok(el) => el,
            Err(e) => {
                warn!("could not create {id}: {}", Error::dom(e));
                return;
            }
        };
        el.set_class_name("game-element");
        let _ = el.set_attribute("data-key", &lane.symbol().to_string());
        Self::set_style(&el, "position", "absolute");
        Self::set_style(&el, "left", "4px");
        Self::set_style(&el, "right", "4px");
        Self::set_style(&el, "top", "0px");
        Self::set_style(&el, "height", &format!("{height}px"));
        Self::set_style(&el, "background", "#ffd166");
        if let Err(e) = self.columns[lane.index()].append_child(&el) {
            warn!("could not attach {id}: {}", Error::dom(e));
            return;
        }
        self.notes.insert(id, (lane, el));
    }

    fn set_note_position(&mut self, id: NoteId, y: f64) {
        if let Some((_, el)) = self.notes.get(&id) {
            Self::set_style(el, "transform", &format!("translateY({y}px)"));
        }
    }

    fn mark_note(&mut self, id: NoteId, mark: NoteMark) {
        if let Some((_, el)) = self.notes.get(&id) {
            let color = match mark {
                NoteMark::Hit => "green",
                NoteMark::Miss => "red",
            };
            Self::set_style(el, "background", color);
        }
    }

    fn remove_note(&mut self, id: NoteId, after_ms: f64) {
        let Some((_, el)) = self.notes.remove(&id) else {
            return;
        };
        if after_ms <= 0.0 {
            el.remove();
            return;
        }
        let doomed = el.clone();
        let cb = Closure::once_into_js(move || doomed.remove());
        if self
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(
                cb.unchecked_ref(),
                after_ms.round() as i32,
            )
            .is_err()
        {
            el.remove();
        }
    }

    fn play_cue(&mut self, lane: Lane) {
        if let Some(audio) = &self.cues[lane.index()] {
            audio.set_current_time(0.0);
            // Autoplay policies may reject; the promise is not awaited.
            let _ = audio.play();
        }
    }

    fn clear_lane(&mut self, lane: Lane) {
        self.columns[lane.index()].set_inner_html("");
        self.notes.retain(|_, (l, _)| *l != lane);
    }

    fn show_score(&mut self, score: i64) {
        self.score.set_text_content(Some(&format!("Score: {score}")));
    }

    fn show_countdown(&mut self, seconds: u32) {
        self.timer
            .set_text_content(Some(&format!("Time Left: {seconds}s")));
    }

    fn show_game_over(&mut self, final_score: i64) {
        self.score
            .set_text_content(Some(&format!("Game Over! Final Score: {final_score}")));
    }
}

// --- Entry -------------------------------------------------------------------

fn bind_listeners(document: &Document, reset_button: &HtmlElement) -> Result<()> {
    {
        let closure = Closure::wrap(Box::new(move |evt: web_sys::KeyboardEvent| {
            // Held keys fire repeated keydowns; only the first press counts.
            if evt.repeat() {
                return;
            }
            let ts = now_ms();
            let key = evt.key();
            with_session(|s| {
                s.on_key_press(&key, ts);
            });
        }) as Box<dyn FnMut(_)>);
        document
            .add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref())
            .map_err(Error::dom)?;
        closure.forget();
    }
    {
        let closure = Closure::wrap(Box::new(move |_evt: web_sys::MouseEvent| {
            with_session(|s| s.reset());
        }) as Box<dyn FnMut(_)>);
        reset_button
            .add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .map_err(Error::dom)?;
        closure.forget();
    }
    Ok(())
}

/// Build the shell and start a game. A second launch stops the running game
/// and replaces it; listeners are bound only once.
pub fn launch(config: GameConfig) -> Result<()> {
    config.validate()?;
    crate::logging::init(config.level_filter()?);

    let win = window().ok_or(Error::MissingWindow)?;
    let display = DomDisplay::attach(win.clone())?;
    let play_height = display.play_height();
    let document = display.document.clone();
    let reset_button = display.reset_button.clone();

    let session = Session::new(
        config,
        play_height,
        display,
        BrowserScheduler::new(win),
        SmallRng::from_entropy(),
    );

    SESSION.with(|cell| {
        let mut slot = cell.borrow_mut();
        if let Some(mut old) = slot.replace(session) {
            info!("replacing running game");
            old.shutdown();
        }
        if let Some(s) = slot.as_mut() {
            s.start();
        }
    });

    if !LISTENERS_BOUND.with(|b| b.replace(true)) {
        bind_listeners(&document, &reset_button)?;
    }
    info!("keyfall ready (play area {play_height}px)");
    Ok(())
}

/// Restart the current game from JS (same as clicking the reset button).
pub fn reset() {
    with_session(|s| s.reset());
}
