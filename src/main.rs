pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use kwiz::{
    app_dirs::AppDirs,
    api::{HttpQuizApi, QuestionQuery, QuizApi},
    celebration::Confetti,
    config::{Config, ConfigStore, FileConfigStore},
    controller::QuizController,
    history::{SessionLog, SessionRecord},
    outbox::{Outbox, RetryPolicy},
    question::{Category, CategoryId, Difficulty, OptionTag},
    quiz::{Effect, QuizState},
    runtime::{self, CrosstermEventSource, FixedTicker, QuizEvent, Runner},
    submit::{spawn_submit, SubmitOutcome},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    sync::{mpsc::Sender, Arc},
    thread,
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;

/// terminal quiz client for the learning platform
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Take multiple-choice quizzes from your learning platform in the terminal. Answers are checked instantly and your score is added to your dashboard when you finish."
)]
pub struct Cli {
    /// category id to quiz on, skipping the category picker
    #[clap(short = 'c', long)]
    category: Option<CategoryId>,

    /// only ask questions of this difficulty
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// base url of the platform API (overrides config and KWIZ_API_URL)
    #[clap(long)]
    api_url: Option<String>,

    /// bearer token for the platform API (overrides config and KWIZ_TOKEN)
    #[clap(long)]
    token: Option<String>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// list quiz categories
    Categories,
    /// show your dashboard totals
    Progress,
    /// inspect or resend scores that could not be submitted
    Outbox {
        #[clap(subcommand)]
        action: Option<OutboxAction>,
    },
    /// show recently completed sessions
    History {
        /// number of sessions to show
        #[clap(short = 'n', long, default_value_t = 10)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq)]
pub enum OutboxAction {
    /// list queued scores
    List,
    /// resend queued scores now
    Flush,
}

impl Cli {
    fn resolve_config(&self, stored: Config) -> Config {
        stored
            .with_env()
            .with_overrides(self.api_url.clone(), self.token.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Categories,
    Quiz,
}

/// What the category picker shows
#[derive(Debug, Default)]
pub struct CategoryPicker {
    pub items: Vec<Category>,
    pub cursor: usize,
    pub loading: bool,
    pub error: Option<String>,
}

impl CategoryPicker {
    pub fn selected(&self) -> Option<&Category> {
        self.items.get(self.cursor)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SubmissionStatus {
    Idle,
    Pending,
    Done(SubmitOutcome),
}

/// Local side effects of a finished session
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub difficulty: Option<Difficulty>,
    pub outbox_path: Option<PathBuf>,
    pub history: Option<SessionLog>,
}

impl Settings {
    fn from_config(config: &Config, difficulty: Option<Difficulty>) -> Self {
        Self {
            difficulty,
            outbox_path: config
                .outbox_enabled
                .then(|| AppDirs::outbox_path().unwrap_or_else(|| PathBuf::from("kwiz_outbox.db"))),
            history: config.history_enabled.then(SessionLog::new),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub api: Arc<dyn QuizApi>,
    pub settings: Settings,
    pub state: AppState,
    pub picker: CategoryPicker,
    pub quiz: Option<QuizController>,
    pub quiz_title: String,
    /// highlighted option on the question screen
    pub cursor: usize,
    pub confetti: Confetti,
    pub submission: SubmissionStatus,
    pub ticks: u64,
    pub viewport: (u16, u16),
    generation: u64,
    tx: Sender<QuizEvent>,
}

impl App {
    pub fn new(api: Arc<dyn QuizApi>, settings: Settings, tx: Sender<QuizEvent>) -> Self {
        Self {
            api,
            settings,
            state: AppState::Categories,
            picker: CategoryPicker::default(),
            quiz: None,
            quiz_title: String::new(),
            cursor: 0,
            confetti: Confetti::new(),
            submission: SubmissionStatus::Idle,
            ticks: 0,
            viewport: (80, 24),
            generation: 0,
            tx,
        }
    }

    pub fn load_categories(&mut self) {
        self.picker.loading = true;
        self.picker.error = None;
        runtime::spawn_fetch_categories(self.api.clone(), self.tx.clone());
    }

    fn category_name(&self, id: CategoryId) -> Option<String> {
        self.picker
            .items
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.clone())
    }

    pub fn start_quiz(&mut self, category: CategoryId) {
        let query = QuestionQuery::new(category).with_difficulty(self.settings.difficulty);
        self.quiz_title = self
            .category_name(category)
            .unwrap_or_else(|| format!("Category {category}"));
        self.quiz = Some(QuizController::new(query));
        self.state = AppState::Quiz;
        self.reset_session_view();
        self.fetch_questions(query);
    }

    fn fetch_questions(&mut self, query: QuestionQuery) {
        self.generation += 1;
        runtime::spawn_fetch_questions(self.api.clone(), query, self.generation, self.tx.clone());
    }

    fn reset_session_view(&mut self) {
        self.cursor = 0;
        self.submission = SubmissionStatus::Idle;
        self.confetti.stop();
    }

    fn back_to_categories(&mut self) {
        // fetches and submissions still in flight for the old session are dropped by generation
        self.generation += 1;
        self.quiz = None;
        self.state = AppState::Categories;
        self.reset_session_view();
        if self.picker.items.is_empty() && !self.picker.loading {
            self.load_categories();
        }
    }

    fn apply_effects(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::FetchQuestions => {
                    if let Some(query) = self.quiz.as_ref().map(QuizController::query) {
                        self.reset_session_view();
                        self.fetch_questions(query);
                    }
                }
                Effect::Celebrate => {
                    self.confetti.fire(self.viewport.0, self.viewport.1);
                }
                Effect::SubmitResult { score } => self.submit(score),
            }
        }
    }

    fn submit(&mut self, score: u32) {
        let Some(quiz) = self.quiz.as_ref() else {
            return;
        };
        let category = quiz.query().category;

        if let (Some(log), Some(summary)) = (&self.settings.history, quiz.summary()) {
            let record = SessionRecord::from_summary(self.quiz_title.clone(), &summary);
            if let Err(e) = log.append(&record) {
                tracing::warn!("failed to write session history: {e}");
            }
        }

        // tag the outcome so a later session ignores it
        self.generation += 1;
        let generation = self.generation;
        self.submission = SubmissionStatus::Pending;
        let tx = self.tx.clone();
        spawn_submit(
            self.api.clone(),
            self.settings.outbox_path.clone(),
            score,
            Some(category),
            move |outcome| {
                let _ = tx.send(QuizEvent::Submitted { generation, outcome });
            },
        );
    }

    /// Whether ticks need a redraw (spinner or confetti)
    pub fn is_animating(&self) -> bool {
        let loading = match self.state {
            AppState::Categories => self.picker.loading,
            AppState::Quiz => self
                .quiz
                .as_ref()
                .is_some_and(|q| matches!(q.state(), QuizState::Loading) && q.load_error().is_none()),
        };
        loading || self.confetti.is_active || self.submission == SubmissionStatus::Pending
    }

    fn handle_event(&mut self, event: QuizEvent) -> Flow {
        match event {
            QuizEvent::Tick => {
                self.ticks = self.ticks.wrapping_add(1);
                self.confetti.update();
            }
            QuizEvent::Resize => {}
            QuizEvent::Categories(result) => {
                self.picker.loading = false;
                match result {
                    Ok(items) => {
                        self.picker.items = items;
                        self.picker.cursor = self.picker.cursor.min(self.picker.items.len().saturating_sub(1));
                        if let Some(id) = self.quiz.as_ref().map(|q| q.query().category) {
                            if let Some(name) = self.category_name(id) {
                                self.quiz_title = name;
                            }
                        }
                    }
                    Err(e) => {
                        tracing::error!("failed to fetch categories: {e}");
                        self.picker.error = Some(e);
                    }
                }
            }
            QuizEvent::Questions { generation, result } => {
                if generation != self.generation {
                    tracing::debug!(generation, "dropping stale question set");
                    return Flow::Continue;
                }
                if let Some(quiz) = self.quiz.as_mut() {
                    let effects = match result {
                        Ok(records) => quiz.on_questions_loaded(records),
                        Err(e) => quiz.on_load_failed(&e),
                    };
                    self.apply_effects(effects);
                }
            }
            QuizEvent::Submitted { generation, outcome } => {
                if generation != self.generation {
                    tracing::debug!(generation, %outcome, "dropping outcome of an earlier session");
                    return Flow::Continue;
                }
                self.submission = SubmissionStatus::Done(outcome);
            }
            QuizEvent::Key(key) => return self.on_key(key),
        }
        Flow::Continue
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return Flow::Quit;
        }

        match self.state {
            AppState::Categories => self.on_picker_key(key),
            AppState::Quiz => self.on_quiz_key(key),
        }
        Flow::Continue
    }

    fn on_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.picker.cursor = self.picker.cursor.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.picker.cursor + 1 < self.picker.items.len() {
                    self.picker.cursor += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(id) = self.picker.selected().map(|c| c.id) {
                    self.start_quiz(id);
                }
            }
            KeyCode::Char('r') if !self.picker.loading => self.load_categories(),
            _ => {}
        }
    }

    fn on_quiz_key(&mut self, key: KeyEvent) {
        let Some(quiz) = self.quiz.as_mut() else {
            return;
        };

        let effects = match key.code {
            KeyCode::Char('r') => quiz.restart(),
            KeyCode::Backspace if !quiz.state().is_in_progress() => {
                self.back_to_categories();
                return;
            }
            KeyCode::Up | KeyCode::Down => {
                let tags: Vec<OptionTag> = quiz
                    .current_question()
                    .map(|q| q.options().map(|(tag, _)| tag).collect())
                    .unwrap_or_default();
                if tags.is_empty() || quiz.state().is_answered() {
                    return;
                }
                self.cursor = if key.code == KeyCode::Up {
                    self.cursor.saturating_sub(1)
                } else {
                    (self.cursor + 1).min(tags.len() - 1)
                };
                quiz.select_option(tags[self.cursor])
            }
            KeyCode::Char(c) => match option_for_key(c) {
                Some(tag) => {
                    let effects = quiz.select_option(tag);
                    if quiz.state().selected() == Some(tag) {
                        if let Some(pos) = quiz
                            .current_question()
                            .and_then(|q| q.options().position(|(t, _)| t == tag))
                        {
                            self.cursor = pos;
                        }
                    }
                    effects
                }
                None => Vec::new(),
            },
            KeyCode::Enter if quiz.state().is_answered() => {
                self.cursor = 0;
                quiz.advance()
            }
            KeyCode::Enter => quiz.check_answer(),
            _ => Vec::new(),
        };
        self.apply_effects(effects);
    }
}

/// `1`-`4` or `a`-`d` pick an option directly
fn option_for_key(c: char) -> Option<OptionTag> {
    match c.to_ascii_lowercase() {
        '1' | 'a' => Some(OptionTag::A),
        '2' | 'b' => Some(OptionTag::B),
        '3' | 'c' => Some(OptionTag::C),
        '4' | 'd' => Some(OptionTag::D),
        _ => None,
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let _log_guard = kwiz::logging::init();

    let config = cli.resolve_config(FileConfigStore::new().load());
    let api: Arc<dyn QuizApi> = Arc::new(HttpQuizApi::from_config(&config)?);

    if let Some(command) = cli.command.clone() {
        return run_command(command, api.as_ref(), &config);
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if config.outbox_enabled {
        let flush_api = api.clone();
        let policy = RetryPolicy::from_config(&config);
        thread::spawn(move || match Outbox::open_default() {
            Ok(outbox) => {
                if let Err(e) = outbox.flush(flush_api.as_ref(), &policy) {
                    tracing::warn!("outbox flush failed: {e}");
                }
            }
            Err(e) => tracing::warn!("cannot open outbox: {e}"),
        });
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );
    let mut app = App::new(
        api,
        Settings::from_config(&config, cli.difficulty),
        runner.sender(),
    );
    app.load_categories();
    if let Some(category) = cli.category {
        app.start_quiz(category);
    }

    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend, E: runtime::QuizEventSource, T: runtime::Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::ui(app, f))?;

    loop {
        let event = runner.step();
        let is_tick = matches!(event, QuizEvent::Tick);
        let was_animating = app.is_animating();

        if let Ok(size) = terminal.size() {
            app.viewport = (size.width, size.height);
        }
        if app.handle_event(event) == Flow::Quit {
            break;
        }

        if !is_tick || was_animating || app.is_animating() {
            terminal.draw(|f| ui::ui(app, f))?;
        }
    }

    Ok(())
}

fn run_command(command: Command, api: &dyn QuizApi, config: &Config) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Categories => {
            let categories = api.categories()?;
            if categories.is_empty() {
                println!("No categories available yet.");
            }
            for c in categories {
                match c.description.as_deref().filter(|d| !d.is_empty()) {
                    Some(desc) => println!("{:>4}  {}  - {}", c.id, c.name, desc),
                    None => println!("{:>4}  {}", c.id, c.name),
                }
            }
        }
        Command::Progress => {
            let progress = api.dashboard()?;
            if let Some(email) = progress.user_email.as_deref() {
                println!("{email}");
            }
            println!("total score        {}", progress.total_score);
            println!("quizzes attempted  {}", progress.quizzes_attempted);
            println!("problems solved    {}", progress.problems_solved);
        }
        Command::Outbox { action } => {
            let outbox = Outbox::open_default()?;
            match action.unwrap_or(OutboxAction::List) {
                OutboxAction::List => {
                    let pending = outbox.pending()?;
                    if pending.is_empty() {
                        println!("outbox is empty");
                    }
                    for entry in pending {
                        println!(
                            "#{:<4} score {:<4} queued {}  attempts {}{}",
                            entry.id,
                            entry.submission.score,
                            entry.submission.queued_at.format("%Y-%m-%d %H:%M"),
                            entry.attempts,
                            entry
                                .last_error
                                .map(|e| format!("  ({e})"))
                                .unwrap_or_default()
                        );
                    }
                }
                OutboxAction::Flush => {
                    let report = outbox.flush(api, &RetryPolicy::from_config(config))?;
                    println!(
                        "delivered {}, still queued {}",
                        report.delivered, report.remaining
                    );
                }
            }
        }
        Command::History { limit } => {
            let records = SessionLog::new().recent(limit)?;
            if records.is_empty() {
                println!("no sessions recorded yet");
            }
            for r in records {
                println!(
                    "{}  {:<16} {:>3} pts  {:>3}%  ({} questions)",
                    r.date.format("%Y-%m-%d %H:%M"),
                    r.category,
                    r.score,
                    r.accuracy,
                    r.questions
                );
            }
        }
    }
    Ok(())
}
