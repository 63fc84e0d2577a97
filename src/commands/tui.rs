use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use log::{info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use crate::bus::{AppEvent, EventBus, Notice, Route, Subscription};
use crate::context::DigimallContext;
use crate::moderation::ModerationAction;
use crate::pages::{ReviewDetailPage, ReviewsPage};
use crate::ports::ReviewBackend;
use crate::query::ReviewTab;
use crate::ui;

const TOAST_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Filters,
}

/// Console state: the reviews page, an optional detail page on top of it,
/// and whatever the bus delivered for display.
pub struct ConsoleApp<'a, B: ReviewBackend> {
    backend: &'a B,
    bus: EventBus,
    events: Subscription,
    list: ReviewsPage<&'a B>,
    detail: Option<ReviewDetailPage<&'a B>>,
    mode: InputMode,
    toast: Option<(Notice, Instant)>,
    backend_label: String,
    quit: bool,
}

impl<'a, B: ReviewBackend> ConsoleApp<'a, B> {
    pub fn new(
        backend: &'a B,
        backend_label: impl Into<String>,
        page_size: u32,
        search_delay: Duration,
    ) -> Self {
        let bus = EventBus::new();
        let events = bus.subscribe();
        let list = ReviewsPage::new(backend, bus.clone(), page_size, search_delay);
        Self {
            backend,
            bus,
            events,
            list,
            detail: None,
            mode: InputMode::Normal,
            toast: None,
            backend_label: backend_label.into(),
            quit: false,
        }
    }

    pub fn list(&self) -> &ReviewsPage<&'a B> {
        &self.list
    }

    pub fn list_mut(&mut self) -> &mut ReviewsPage<&'a B> {
        &mut self.list
    }

    pub fn detail(&self) -> Option<&ReviewDetailPage<&'a B>> {
        self.detail.as_ref()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn toast(&self) -> Option<&Notice> {
        self.toast.as_ref().map(|(notice, _)| notice)
    }

    pub fn backend_label(&self) -> &str {
        &self.backend_label
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn load(&mut self) {
        self.list.load();
    }

    /// Advances timers: the search debounce and the toast lifetime.
    pub fn tick(&mut self, now: Instant) {
        if self.detail.is_none() {
            self.list.tick(now);
        }
        self.drain_events(now);
        if let Some((_, shown_at)) = &self.toast
            && now.duration_since(*shown_at) >= TOAST_TTL
        {
            self.toast = None;
        }
    }

    fn drain_events(&mut self, now: Instant) {
        for event in self.events.drain() {
            match event {
                AppEvent::Notice(notice) => {
                    info!("toast: {}", notice.message);
                    self.toast = Some((notice, now));
                }
                AppEvent::Navigate(Route::Reviews) => {
                    self.detail = None;
                    self.list.refetch();
                }
                AppEvent::Navigate(Route::ReviewDetail(id)) => {
                    let mut detail = ReviewDetailPage::new(self.backend, self.bus.clone(), id);
                    detail.load();
                    self.detail = Some(detail);
                }
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent, now: Instant) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return;
        }
        if self.detail.is_some() {
            self.handle_detail_key(key);
        } else if self.list.modal().is_open() {
            self.handle_list_modal_key(key);
        } else {
            match self.mode {
                InputMode::Normal => self.handle_list_key(key),
                InputMode::Search => self.handle_search_key(key, now),
                InputMode::Filters => self.handle_filters_key(key),
            }
        }
        self.drain_events(now);
    }

    fn handle_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Tab => self.list.set_tab(next_tab(self.list.tab(), 1)),
            KeyCode::BackTab => self.list.set_tab(next_tab(self.list.tab(), -1)),
            KeyCode::Char(ch @ '1'..='4') => {
                let idx = ch as usize - '1' as usize;
                self.list.set_tab(ReviewTab::ALL[idx]);
            }
            KeyCode::Char('j') | KeyCode::Down => self.list.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.list.move_cursor(-1),
            KeyCode::Char('n') | KeyCode::Right => {
                self.list.next_page();
            }
            KeyCode::Char('p') | KeyCode::Left => {
                self.list.prev_page();
            }
            KeyCode::Char(' ') => self.list.toggle_at_cursor(),
            KeyCode::Char('*') => self.list.toggle_all_on_page(),
            KeyCode::Char('/') => self.mode = InputMode::Search,
            KeyCode::Char('f') => self.mode = InputMode::Filters,
            KeyCode::Char('c') => self.list.clear_filters(),
            KeyCode::Char('r') => self.list.refetch(),
            KeyCode::Enter => {
                if let Some(review) = self.list.cursor_review() {
                    self.bus.navigate(Route::ReviewDetail(review.id.clone()));
                }
            }
            KeyCode::Char(ch) => {
                if let Some(action) = single_action_key(ch) {
                    self.list.request_action_at_cursor(action);
                } else if ch.is_ascii_uppercase() {
                    self.list.toolbar_key(ch);
                }
            }
            _ => {}
        }
    }

    fn handle_list_modal_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.list.cancel_modal();
            }
            KeyCode::Enter => {
                self.list.confirm();
            }
            KeyCode::Backspace => self.list.modal_backspace(),
            KeyCode::Char(ch) => self.list.modal_input(ch),
            _ => {}
        }
    }

    fn handle_search_key(&mut self, key: KeyEvent, now: Instant) {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.mode = InputMode::Normal,
            KeyCode::Backspace => self.list.pop_search_char(now),
            KeyCode::Char(ch) => self.list.push_search_char(ch, now),
            _ => {}
        }
    }

    fn handle_filters_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('f') | KeyCode::Char('q') => {
                self.mode = InputMode::Normal
            }
            KeyCode::Char('j') | KeyCode::Down => self.list.panel.move_cursor(1),
            KeyCode::Char('k') | KeyCode::Up => self.list.panel.move_cursor(-1),
            KeyCode::Char(' ') | KeyCode::Enter => {
                if let Err(err) = self.list.cycle_selected_filter() {
                    self.bus.notify(Notice::error(err.to_string()));
                }
            }
            KeyCode::Char('c') => self.list.clear_filters(),
            _ => {}
        }
    }

    fn handle_detail_key(&mut self, key: KeyEvent) {
        let Some(detail) = self.detail.as_mut() else {
            return;
        };
        if detail.modal().is_open() {
            match key.code {
                KeyCode::Esc => {
                    detail.cancel_modal();
                }
                KeyCode::Enter => {
                    detail.confirm();
                }
                KeyCode::Backspace => detail.modal_backspace(),
                KeyCode::Char(ch) => detail.modal_input(ch),
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Esc | KeyCode::Char('b') | KeyCode::Backspace => {
                self.bus.navigate(Route::Reviews);
            }
            KeyCode::Char('r') => detail.load(),
            KeyCode::Char(ch) => {
                if let Some(action) = single_action_key(ch) {
                    detail.request_action(action);
                }
            }
            _ => {}
        }
    }
}

fn single_action_key(ch: char) -> Option<ModerationAction> {
    match ch {
        'a' => Some(ModerationAction::Approve),
        'x' => Some(ModerationAction::Reject),
        'g' => Some(ModerationAction::Flag),
        'd' => Some(ModerationAction::Delete),
        _ => None,
    }
}

fn next_tab(current: ReviewTab, delta: isize) -> ReviewTab {
    let len = ReviewTab::ALL.len() as isize;
    let idx = (current.index() as isize + delta).rem_euclid(len);
    ReviewTab::ALL[idx as usize]
}

pub fn run(context: &DigimallContext) -> Result<()> {
    let backend = context.backend()?;
    let ui_config = &context.config.ui;
    let mut app = ConsoleApp::new(
        &backend,
        backend.label(),
        ui_config.page_size(),
        ui_config.search_delay(),
    );
    app.load();
    info!("console ready ({})", app.backend_label());

    let mut terminal = setup_terminal()?;
    let run_result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal)?;
    if let Err(err) = &run_result {
        warn!("console exited with error: {:#}", err);
    }
    run_result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn run_app<B: ReviewBackend>(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut ConsoleApp<'_, B>,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(16))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.handle_key(key, Instant::now());
        }
        app.tick(Instant::now());

        if app.should_quit() {
            return Ok(());
        }
    }
}
