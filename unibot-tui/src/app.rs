use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyCode, KeyEventKind,
    KeyModifiers, MouseEventKind,
};
use futures::StreamExt;
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info};
use unibot_core::{
    AgentBackend, AgentController, CommandOutcome, LogViewport, QuestionPage, SessionSnapshot,
    StatusPoller, UnibotConfig, QUESTIONS_PAGE_SIZE,
};

use crate::events::{Action, KeyBinding, Keybinds};
use crate::form::{Focus, StartForm};
use crate::theme::{Theme, TokyoNight};
use crate::ui::layout::MainLayout;

const WHEEL_STEP: isize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Dashboard,
    Questions,
}

impl View {
    pub fn all() -> &'static [View] {
        &[View::Dashboard, View::Questions]
    }

    pub fn name(&self) -> &'static str {
        match self {
            View::Dashboard => "Dashboard",
            View::Questions => "Questions",
        }
    }

    pub fn next(&self) -> View {
        match self {
            View::Dashboard => View::Questions,
            View::Questions => View::Dashboard,
        }
    }
}

/// Results of work spawned off the UI loop.
#[derive(Debug)]
pub enum AppEvent {
    CommandFinished {
        action: &'static str,
        outcome: CommandOutcome,
    },
    QuestionsLoaded {
        page: u64,
        result: Result<QuestionPage, String>,
    },
}

#[derive(Debug)]
pub struct QuestionsState {
    pub page: u64,
    pub data: Option<QuestionPage>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: usize,
}

impl Default for QuestionsState {
    fn default() -> Self {
        Self {
            page: 1,
            data: None,
            loading: false,
            error: None,
            selected: 0,
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub current_view: View,
    pub focus: Focus,
    pub form: StartForm,
    pub session: SessionSnapshot,
    pub viewport: LogViewport,
    pub start_enabled: bool,
    pub can_stop: bool,
    pub questions: QuestionsState,
    pub status_message: Option<String>,
    pub animation_tick: u64,
    theme: Box<dyn Theme>,
    controller: AgentController,
    poller: Option<StatusPoller>,
    keybinds: Keybinds,
    events_tx: mpsc::UnboundedSender<AppEvent>,
    events_rx: mpsc::UnboundedReceiver<AppEvent>,
    tick_rate: Duration,
    poll_interval: Duration,
    mouse_enabled: bool,
}

impl App {
    pub async fn new(config: &UnibotConfig) -> Result<Self> {
        let controller = AgentController::from_config(config, config.tui.follow_threshold_rows)?;
        let last_account = controller
            .read(|s| s.last_account().map(str::to_string))
            .await;
        let session = controller.snapshot().await;
        let (events_tx, events_rx) = mpsc::unbounded_channel();

        Ok(Self {
            should_quit: false,
            current_view: View::Dashboard,
            focus: if last_account.is_some() {
                Focus::Password
            } else {
                Focus::Email
            },
            form: StartForm::new(last_account),
            session,
            viewport: LogViewport::new(config.tui.follow_threshold_rows),
            start_enabled: false,
            can_stop: false,
            questions: QuestionsState::default(),
            status_message: Some(format!("Connecting to {}", config.api.base_url)),
            animation_tick: 0,
            theme: Box::new(TokyoNight),
            controller,
            poller: None,
            keybinds: Keybinds::default(),
            events_tx,
            events_rx,
            tick_rate: Duration::from_millis(config.tui.tick_rate_ms.max(16)),
            poll_interval: config.poll_interval(),
            mouse_enabled: config.tui.mouse_enabled,
        })
    }

    pub fn current_theme(&self) -> &dyn Theme {
        self.theme.as_ref()
    }

    pub async fn run(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> Result<()> {
        if self.mouse_enabled {
            crossterm::execute!(io::stdout(), EnableMouseCapture)?;
        }

        self.poller = Some(StatusPoller::spawn(
            self.controller.clone(),
            self.poll_interval,
        ));

        let mut events = EventStream::new();
        let mut ticker = tokio::time::interval(self.tick_rate);

        let result = loop {
            let size = terminal.size()?;
            self.sync_from_controller(Rect::new(0, 0, size.width, size.height))
                .await;
            terminal.draw(|frame| MainLayout::render(frame, self))?;

            tokio::select! {
                _ = ticker.tick() => {
                    self.animation_tick = self.animation_tick.wrapping_add(1);
                }
                maybe_event = events.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_event(event).await,
                    Some(Err(e)) => break Err(e.into()),
                    None => break Ok(()),
                },
                Some(app_event) = self.events_rx.recv() => self.handle_app_event(app_event),
            }

            if self.should_quit {
                break Ok(());
            }
        };

        if let Some(poller) = self.poller.take() {
            poller.shutdown().await;
        }
        if self.mouse_enabled {
            crossterm::execute!(io::stdout(), DisableMouseCapture)?;
        }

        result
    }

    /// Pull the controller state the next frame needs.
    async fn sync_from_controller(&mut self, screen: Rect) {
        let log_rows = MainLayout::log_rows(screen);
        self.controller.set_log_viewport_height(log_rows).await;

        self.session = self.controller.snapshot().await;
        let (viewport, start_enabled, can_stop) = self
            .controller
            .read(|s| (s.viewport().clone(), s.start_enabled(), s.can_stop()))
            .await;
        self.viewport = viewport;
        self.start_enabled = start_enabled;
        self.can_stop = can_stop;
    }

    async fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                self.handle_key_event(key.code, key.modifiers).await;
            }
            Event::Mouse(mouse) if self.current_view == View::Dashboard => match mouse.kind {
                MouseEventKind::ScrollUp => self.controller.scroll_logs(-WHEEL_STEP).await,
                MouseEventKind::ScrollDown => self.controller.scroll_logs(WHEEL_STEP).await,
                _ => {}
            },
            // Geometry is re-read before every frame.
            _ => {}
        }
    }

    async fn handle_key_event(&mut self, code: KeyCode, modifiers: KeyModifiers) {
        if self.current_view == View::Dashboard && self.handle_form_input(code, modifiers) {
            return;
        }

        if let Some(action) = self.keybinds.action_for(code, modifiers) {
            self.execute_action(action).await;
        }
    }

    /// Returns true when the key was consumed as text input.
    fn handle_form_input(&mut self, code: KeyCode, modifiers: KeyModifiers) -> bool {
        let printable = KeyBinding { code, modifiers }.is_printable();
        match (self.focus, code) {
            (focus, KeyCode::Char(c)) if focus.is_text() && printable => {
                self.form.insert(focus, c);
                true
            }
            (focus, KeyCode::Backspace) if focus.is_text() => {
                self.form.backspace(focus);
                true
            }
            (Focus::SkipVideo, KeyCode::Char(' ')) => {
                self.form.insert(Focus::SkipVideo, ' ');
                true
            }
            _ => false,
        }
    }

    async fn execute_action(&mut self, action: Action) {
        match (self.current_view, action) {
            (_, Action::Quit) => self.should_quit = true,
            (_, Action::SwitchView) => {
                self.current_view = self.current_view.next();
                if self.current_view == View::Questions && self.questions.data.is_none() {
                    self.load_questions();
                }
            }

            (View::Dashboard, Action::NextFocus) => self.focus = self.focus.next(),
            (View::Dashboard, Action::PrevFocus) => self.focus = self.focus.prev(),
            (View::Dashboard, Action::ToggleMode) => {
                self.form.toggle_mode();
                self.status_message = Some(format!("Mode: {}", self.form.mode.label()));
            }
            (View::Dashboard, Action::Start) => self.start(),
            (View::Dashboard, Action::Stop) => self.stop(),
            (View::Dashboard, Action::ClearLogs) => {
                self.controller.clear_logs().await;
                self.status_message = Some("Logs cleared".to_string());
            }
            (View::Dashboard, Action::DismissError) => self.controller.dismiss_error().await,
            (View::Dashboard, Action::ScrollUp) => self.controller.scroll_logs(-1).await,
            (View::Dashboard, Action::ScrollDown) => self.controller.scroll_logs(1).await,
            (View::Dashboard, Action::PageUp) => {
                let page = self.viewport.viewport_height().max(1) as isize;
                self.controller.scroll_logs(-page).await;
            }
            (View::Dashboard, Action::PageDown) => {
                let page = self.viewport.viewport_height().max(1) as isize;
                self.controller.scroll_logs(page).await;
            }
            (View::Dashboard, Action::ScrollTop) => self.controller.scroll_logs_to(0).await,
            (View::Dashboard, Action::ScrollBottom) => {
                self.controller.scroll_logs_to_bottom().await
            }

            (View::Questions, Action::NextPage) => {
                let pages = self.questions.data.as_ref().map_or(1, QuestionPage::page_count);
                if self.questions.page < pages {
                    self.questions.page += 1;
                    self.load_questions();
                }
            }
            (View::Questions, Action::PrevPage) => {
                if self.questions.page > 1 {
                    self.questions.page -= 1;
                    self.load_questions();
                }
            }
            (View::Questions, Action::Reload) => self.load_questions(),
            (View::Questions, Action::ScrollUp) => {
                self.questions.selected = self.questions.selected.saturating_sub(1);
            }
            (View::Questions, Action::ScrollDown) => {
                let count = self.questions.data.as_ref().map_or(0, |d| d.questions.len());
                if self.questions.selected + 1 < count {
                    self.questions.selected += 1;
                }
            }

            _ => {}
        }
    }

    fn start(&mut self) {
        if !self.form.is_complete() {
            self.status_message = Some("Fill in email, password and lesson first".to_string());
            return;
        }
        if !self.start_enabled {
            self.status_message = Some("The agent is busy or already running".to_string());
            return;
        }

        let mode = self.form.mode;
        let request = self.form.to_request();
        let controller = self.controller.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = controller.start(mode, request).await;
            let _ = tx.send(AppEvent::CommandFinished {
                action: "Start",
                outcome,
            });
        });

        self.focus = Focus::Logs;
        self.status_message = Some("Starting agent...".to_string());
    }

    fn stop(&mut self) {
        if !self.can_stop {
            self.status_message = Some("Nothing to stop".to_string());
            return;
        }

        let controller = self.controller.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let outcome = controller.stop().await;
            let _ = tx.send(AppEvent::CommandFinished {
                action: "Stop",
                outcome,
            });
        });
        self.status_message = Some("Stopping agent...".to_string());
    }

    fn load_questions(&mut self) {
        let page = self.questions.page;
        self.questions.loading = true;
        self.questions.selected = 0;

        let backend = self.controller.backend().clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let offset = (page - 1) * QUESTIONS_PAGE_SIZE as u64;
            let result = backend
                .list_questions(QUESTIONS_PAGE_SIZE, offset)
                .await
                .map_err(|e| e.user_message());
            let _ = tx.send(AppEvent::QuestionsLoaded { page, result });
        });
    }

    fn handle_app_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::CommandFinished { action, outcome } => {
                debug!(action, ?outcome, "Command finished");
                self.status_message = Some(match outcome {
                    CommandOutcome::Completed => format!("{} sent", action),
                    CommandOutcome::Skipped => format!("{} skipped", action),
                    CommandOutcome::Failed(_) => format!("{} failed", action),
                });
            }
            AppEvent::QuestionsLoaded { page, result } => {
                if page != self.questions.page {
                    return;
                }
                self.questions.loading = false;
                match result {
                    Ok(data) => {
                        info!(page, total = data.total, "Loaded questions");
                        self.questions.data = Some(data);
                        self.questions.error = None;
                    }
                    Err(message) => self.questions.error = Some(message),
                }
            }
        }
    }
}
