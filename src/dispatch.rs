// Dispatcher
// Turns a user gesture (shortcut command or context-menu click) into an
// extract or apply call inside the right page frame, and moves snapshots
// between that call and the store. Failures are logged and end as a no-op.

use std::collections::BTreeMap;
use std::fmt;

use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::apply::{apply_style, apply_word_styles};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extract::{extract_style, extract_word_styles};
use crate::page::Page;
use crate::snapshot::{Mode, StyleSnapshot, WordStyleMap};
use crate::store::{self, SnapshotStore};

pub const TOP_FRAME: u32 = 0;

/// Context-menu item ids
pub const COPY_MENU_ID: &str = "copy-rich-format";
pub const PASTE_MENU_ID: &str = "paste-rich-format";

/// `source` of messages sent for a context-menu click
pub const CONTEXT_MENU_SOURCE: &str = "contextMenu";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tab {
    pub id: u32,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Target {
    pub tab_id: u32,
    pub frame_id: u32,
}

impl Target {
    pub fn top(tab_id: u32) -> Self {
        Target {
            tab_id,
            frame_id: TOP_FRAME,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab {} frame {}", self.tab_id, self.frame_id)
    }
}

/// Keyboard shortcut commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Copy(Mode),
    Paste(Mode),
}

impl Command {
    pub fn parse(name: &str) -> Option<Self> {
        let command = match name {
            "copy-format" => Command::Copy(Mode::Classic),
            "paste-format" => Command::Paste(Mode::Classic),
            "copy-word-format" => Command::Copy(Mode::Words),
            "paste-word-format" => Command::Paste(Mode::Words),
            _ => return None,
        };
        Some(command)
    }
}

/// Function run inside a page frame
#[derive(Debug, Clone, PartialEq)]
pub enum Invocation {
    ExtractStyle(Mode),
    ApplyStyle(Payload),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Classic(StyleSnapshot),
    Words(WordStyleMap),
}

#[derive(Debug, Clone, PartialEq)]
pub enum InvocationResult {
    Style(StyleSnapshot),
    Words(WordStyleMap),
    Applied,
}

/// Run `invocation` against `page`
pub fn invoke(page: &mut Page, invocation: Invocation) -> Result<InvocationResult> {
    match invocation {
        Invocation::ExtractStyle(Mode::Classic) => extract_style(page).map(InvocationResult::Style),
        Invocation::ExtractStyle(Mode::Words) => {
            extract_word_styles(page).map(InvocationResult::Words)
        }
        Invocation::ApplyStyle(Payload::Classic(snapshot)) => {
            apply_style(page, Some(&snapshot)).map(|_| InvocationResult::Applied)
        }
        Invocation::ApplyStyle(Payload::Words(map)) => {
            apply_word_styles(page, Some(&map)).map(|_| InvocationResult::Applied)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "copyRichFormatRequested")]
    Copy,
    #[serde(rename = "pasteRichFormatRequested")]
    Paste,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub action: Action,
    pub source: String,
    /// Mode to work in; an agent falls back to its own when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok() -> Self {
        Response {
            status: "ok".to_string(),
            error: None,
        }
    }

    pub fn error(err: &Error) -> Self {
        Response {
            status: "error".to_string(),
            error: Some(err.to_string()),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Page-side handler for context-menu messages
#[derive(Debug, Clone, Copy, Default)]
pub struct PageAgent {
    pub mode: Mode,
}

impl PageAgent {
    pub fn new(mode: Mode) -> Self {
        PageAgent { mode }
    }

    pub fn handle_message(
        &self,
        page: &mut Page,
        message: &Message,
        store: &mut dyn SnapshotStore,
    ) -> Response {
        let mode = message.mode.unwrap_or(self.mode);
        info!(
            "{:?} requested from {} in {mode:?} mode",
            message.action, message.source
        );
        let result = match message.action {
            Action::Copy => copy_in_page(page, store, mode),
            Action::Paste => paste_in_page(page, store, mode),
        };
        match result {
            Ok(()) => Response::ok(),
            Err(err) => {
                warn!("{:?} failed: {err}", message.action);
                Response::error(&err)
            }
        }
    }

}

fn copy_in_page(page: &Page, store: &mut dyn SnapshotStore, mode: Mode) -> Result<()> {
    let key = mode.storage_key();
    match mode {
        Mode::Classic => store::put(store, key, &extract_style(page)?),
        Mode::Words => store::put(store, key, &extract_word_styles(page)?),
    }
}

fn paste_in_page(page: &mut Page, store: &mut dyn SnapshotStore, mode: Mode) -> Result<()> {
    let key = mode.storage_key();
    match mode {
        Mode::Classic => {
            let snapshot: Option<StyleSnapshot> = store::get(store, key)?;
            apply_style(page, snapshot.as_ref())
        }
        Mode::Words => {
            let map: Option<WordStyleMap> = store::get(store, key)?;
            apply_word_styles(page, map.as_ref())
        }
    }
}

/// Transport between the dispatcher and page frames
pub trait PageHost {
    /// Run `invocation` inside the frame and hand back its result
    fn execute(&mut self, target: Target, invocation: Invocation) -> Result<InvocationResult>;

    /// Deliver a message to the frame's page agent
    fn send_to_frame(
        &mut self,
        target: Target,
        message: &Message,
        store: &mut dyn SnapshotStore,
    ) -> Result<Response>;
}

/// In-process host: frames are pages held in memory
#[derive(Debug, Default)]
pub struct LocalHost {
    frames: BTreeMap<Target, Page>,
    agent: PageAgent,
}

impl LocalHost {
    pub fn new(agent: PageAgent) -> Self {
        LocalHost {
            frames: BTreeMap::new(),
            agent,
        }
    }

    pub fn insert(&mut self, target: Target, page: Page) {
        self.frames.insert(target, page);
    }

    pub fn page(&self, target: Target) -> Option<&Page> {
        self.frames.get(&target)
    }

    pub fn page_mut(&mut self, target: Target) -> Option<&mut Page> {
        self.frames.get_mut(&target)
    }

    pub fn remove(&mut self, target: Target) -> Option<Page> {
        self.frames.remove(&target)
    }

    fn frame(&mut self, target: Target) -> Result<&mut Page> {
        self.frames
            .get_mut(&target)
            .ok_or_else(|| Error::Transport(format!("no page in {target}")))
    }
}

impl PageHost for LocalHost {
    fn execute(&mut self, target: Target, invocation: Invocation) -> Result<InvocationResult> {
        invoke(self.frame(target)?, invocation)
    }

    fn send_to_frame(
        &mut self,
        target: Target,
        message: &Message,
        store: &mut dyn SnapshotStore,
    ) -> Result<Response> {
        let agent = self.agent;
        Ok(agent.handle_message(self.frame(target)?, message, store))
    }
}

/// What a gesture ended up doing
#[derive(Debug)]
pub enum Outcome {
    Copied(Mode),
    Pasted(Mode),
    /// Not a page the commands apply to, or an unknown command
    Ignored,
    /// The operation failed and changed nothing
    NoOp(Error),
}

impl Outcome {
    pub fn is_done(&self) -> bool {
        matches!(self, Outcome::Copied(_) | Outcome::Pasted(_))
    }
}

pub struct Dispatcher<H, S> {
    host: H,
    store: S,
    config: Config,
}

impl<H: PageHost, S: SnapshotStore> Dispatcher<H, S> {
    pub fn new(host: H, store: S, config: Config) -> Self {
        Dispatcher {
            host,
            store,
            config,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Install-time reset: nothing has been copied yet
    pub fn on_installed(&mut self) -> Result<()> {
        info!("installed, clearing copied styles");
        for mode in Mode::ALL {
            self.store.save(mode.storage_key(), None)?;
        }
        Ok(())
    }

    /// Keyboard shortcut
    pub fn on_command(&mut self, name: &str, tab: &Tab) -> Outcome {
        if !self.config.allows(&tab.url) {
            info!("not a compose tab, command ignored");
            return Outcome::Ignored;
        }
        let Some(command) = Command::parse(name) else {
            warn!("unknown command {name}");
            return Outcome::Ignored;
        };
        info!("{name} command triggered");

        let target = Target::top(tab.id);
        let result = match command {
            Command::Copy(mode) => self.copy(target, mode).map(|_| Outcome::Copied(mode)),
            Command::Paste(mode) => self.paste(target, mode).map(|_| Outcome::Pasted(mode)),
        };
        result.unwrap_or_else(|err| {
            error!("{name} failed: {err}");
            Outcome::NoOp(err)
        })
    }

    fn copy(&mut self, target: Target, mode: Mode) -> Result<()> {
        let key = mode.storage_key();
        match self.host.execute(target, Invocation::ExtractStyle(mode))? {
            InvocationResult::Style(snapshot) => {
                store::put(&mut self.store, key, &snapshot)?;
                info!("style copied and saved: {snapshot:?}");
            }
            InvocationResult::Words(map) => {
                store::put(&mut self.store, key, &map)?;
                info!("word styles copied and saved: {} tokens", map.tokens.len());
            }
            InvocationResult::Applied => {
                return Err(Error::Transport("extraction returned no result".to_string()));
            }
        }
        Ok(())
    }

    fn paste(&mut self, target: Target, mode: Mode) -> Result<()> {
        let key = mode.storage_key();
        let payload = match mode {
            Mode::Classic => store::get::<StyleSnapshot>(&self.store, key)?.map(Payload::Classic),
            Mode::Words => store::get::<WordStyleMap>(&self.store, key)?.map(Payload::Words),
        };
        let Some(payload) = payload else {
            info!("no style found in storage to paste");
            return Err(Error::StoreMiss);
        };
        self.host.execute(target, Invocation::ApplyStyle(payload))?;
        info!("paste style function executed on page");
        Ok(())
    }

    /// Context-menu click inside `frame_id` of `tab`
    pub fn on_context_menu(&mut self, menu_item_id: &str, tab: &Tab, frame_id: u32) -> Outcome {
        if !self.config.allows(&tab.url) {
            info!("not a compose tab, menu click ignored");
            return Outcome::Ignored;
        }
        let action = match menu_item_id {
            COPY_MENU_ID => Action::Copy,
            PASTE_MENU_ID => Action::Paste,
            _ => return Outcome::Ignored,
        };
        let mode = self.config.mode;
        let message = Message {
            action,
            source: CONTEXT_MENU_SOURCE.to_string(),
            mode: Some(mode),
        };
        let target = Target {
            tab_id: tab.id,
            frame_id,
        };

        match self.host.send_to_frame(target, &message, &mut self.store) {
            Ok(response) if response.is_ok() => match action {
                Action::Copy => Outcome::Copied(mode),
                Action::Paste => Outcome::Pasted(mode),
            },
            Ok(response) => {
                let detail = response.error.unwrap_or(response.status);
                error!("{menu_item_id} failed in {target}: {detail}");
                Outcome::NoOp(Error::Transport(detail))
            }
            Err(err) => {
                error!("could not reach {target}: {err}");
                Outcome::NoOp(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    const GMAIL: &str = "https://mail.google.com/mail/u/0/#inbox?compose=new";

    fn tab() -> Tab {
        Tab {
            id: 7,
            url: GMAIL.to_string(),
        }
    }

    fn dispatcher(body: &str) -> Dispatcher<LocalHost, MemoryStore> {
        let page = Page::from_markup(&format!(
            r#"<div contenteditable="true" aria-label="Message Body">{body}</div>"#
        ))
        .unwrap();
        let mut host = LocalHost::new(PageAgent::default());
        host.insert(Target::top(7), page);
        Dispatcher::new(host, MemoryStore::new(), Config::default())
    }

    fn select(d: &mut Dispatcher<LocalHost, MemoryStore>, text: &str) {
        let page = d.host_mut().page_mut(Target::top(7)).unwrap();
        page.select_text(text, 1).unwrap();
    }

    #[test]
    fn test_message_wire_format() {
        let message = Message {
            action: Action::Paste,
            source: CONTEXT_MENU_SOURCE.to_string(),
            mode: None,
        };
        insta::assert_snapshot!(serde_json::to_string(&message).unwrap(), @r#"{"action":"pasteRichFormatRequested","source":"contextMenu"}"#);
        let message = Message {
            mode: Some(Mode::Words),
            ..message
        };
        insta::assert_snapshot!(serde_json::to_string(&message).unwrap(), @r#"{"action":"pasteRichFormatRequested","source":"contextMenu","mode":"words"}"#);
        let plain: Message =
            serde_json::from_str(r#"{"action":"copyRichFormatRequested","source":"contextMenu"}"#)
                .unwrap();
        assert_eq!(plain.mode, None);
        insta::assert_snapshot!(serde_json::to_string(&Response::ok()).unwrap(), @r#"{"status":"ok"}"#);
    }

    #[test]
    fn test_commands_ignored_off_host() {
        let mut d = dispatcher("text");
        let other = Tab {
            id: 7,
            url: "https://example.com".to_string(),
        };
        assert!(matches!(d.on_command("copy-format", &other), Outcome::Ignored));
        assert!(matches!(d.on_command("bogus", &tab()), Outcome::Ignored));
    }

    #[test]
    fn test_copy_then_paste() {
        let mut d = dispatcher(r#"<b>Bold</b> plain"#);
        select(&mut d, "Bold");
        assert!(matches!(d.on_command("copy-format", &tab()), Outcome::Copied(Mode::Classic)));
        let stored: StyleSnapshot = store::get(d.store(), Mode::Classic.storage_key())
            .unwrap()
            .unwrap();
        assert_eq!(stored.font_weight, "700");

        select(&mut d, "plain");
        assert!(matches!(d.on_command("paste-format", &tab()), Outcome::Pasted(Mode::Classic)));
        let page = d.host().page(Target::top(7)).unwrap();
        assert!(page.to_markup().contains("font-weight: 700 !important"));
    }

    #[test]
    fn test_paste_before_copy_is_store_miss() {
        let mut d = dispatcher("text");
        d.on_installed().unwrap();
        select(&mut d, "text");
        let before = d.host().page(Target::top(7)).unwrap().to_markup();
        assert!(matches!(
            d.on_command("paste-word-format", &tab()),
            Outcome::NoOp(Error::StoreMiss)
        ));
        assert_eq!(d.host().page(Target::top(7)).unwrap().to_markup(), before);
    }

    #[test]
    fn test_failed_copy_keeps_previous_snapshot() {
        let mut d = dispatcher("one two");
        select(&mut d, "one");
        assert!(d.on_command("copy-format", &tab()).is_done());
        d.host_mut()
            .page_mut(Target::top(7))
            .unwrap()
            .selection
            .remove_all_ranges();
        assert!(matches!(
            d.on_command("copy-format", &tab()),
            Outcome::NoOp(Error::NoSelection(_))
        ));
        assert!(d.store().load(Mode::Classic.storage_key()).unwrap().is_some());
    }

    #[test]
    fn test_missing_frame_is_transport_failure() {
        let mut d = dispatcher("text");
        assert!(matches!(
            d.on_context_menu(COPY_MENU_ID, &tab(), 3),
            Outcome::NoOp(Error::Transport(_))
        ));
    }

    #[test]
    fn test_context_menu_round_trip() {
        let mut d = dispatcher(r#"<i>slanted</i> upright"#);
        select(&mut d, "slanted");
        assert!(matches!(
            d.on_context_menu(COPY_MENU_ID, &tab(), TOP_FRAME),
            Outcome::Copied(_)
        ));
        select(&mut d, "upright");
        assert!(d.on_context_menu(PASTE_MENU_ID, &tab(), TOP_FRAME).is_done());
        let markup = d.host().page(Target::top(7)).unwrap().to_markup();
        assert!(markup.contains("font-style: italic !important"));
    }

    #[test]
    fn test_context_menu_acts_in_the_configured_mode() {
        let page = Page::from_markup(
            r#"<div contenteditable="true" aria-label="Message Body"><b>one</b> two</div>"#,
        )
        .unwrap();
        let mut host = LocalHost::new(PageAgent::default());
        host.insert(Target::top(7), page);
        let config = Config {
            mode: Mode::Words,
            ..Config::default()
        };
        let mut d = Dispatcher::new(host, MemoryStore::new(), config);
        select(&mut d, "one two");

        assert!(matches!(
            d.on_context_menu(COPY_MENU_ID, &tab(), TOP_FRAME),
            Outcome::Copied(Mode::Words)
        ));
        assert!(d.store().load(Mode::Words.storage_key()).unwrap().is_some());
        assert!(d.store().load(Mode::Classic.storage_key()).unwrap().is_none());
    }

    #[test]
    fn test_context_menu_error_response() {
        let mut d = dispatcher("text");
        assert!(matches!(
            d.on_context_menu(PASTE_MENU_ID, &tab(), TOP_FRAME),
            Outcome::NoOp(Error::Transport(_))
        ));
    }
}
