pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::Duration,
};
use time_humanize::HumanTime;

use scrawl::{
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    games::{
        memory_match::MemoryMatch, pattern_recognition::PatternRecognition,
        pattern_solver::PatternSolver, spot_difference::SpotDifference, word_builder::WordBuilder,
        GameKind,
    },
    insight::{RiskTier, ScoreBand},
    report::{self, HistoryDb, SessionSummary},
    runtime::{AppEvent, CrosstermEventSource, Runner},
    screening::{self, ChildRegistration, FileResultSink, Prediction},
    session::Phase,
    TICK_RATE_MS,
};

/// terminal mini-games that screen handwriting-related skills
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal suite of five timed mini-games (memory, patterns, timed solving, word building, spot-the-difference) that score accuracy, speed, and consistency and flag dysgraphia-related screening signals. Screening only, not a diagnosis."
)]
pub struct Cli {
    /// game to play (falls back to the saved default)
    #[clap(short = 'g', long, value_enum)]
    game: Option<SupportedGame>,

    /// level to start at, game specific (falls back to the saved default)
    #[clap(short = 'l', long)]
    level: Option<usize>,

    /// deterministic shuffle seed
    #[clap(long)]
    seed: Option<u64>,

    /// player name recorded alongside results
    #[clap(short = 'p', long)]
    player: Option<String>,

    /// print recent session history and exit
    #[clap(long)]
    history: bool,

    /// export full history as CSV to the given path and exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// delete all stored session history and exit
    #[clap(long)]
    clear_history: bool,

    /// screen a handwriting sample image headlessly and exit
    #[clap(long, value_name = "IMAGE")]
    screen: Option<PathBuf>,

    /// classifier verdict JSON file ({"label","confidence"}) for --screen
    #[clap(long, value_name = "PATH", requires = "screen")]
    verdict: Option<PathBuf>,

    /// child age recorded with --screen
    #[clap(long, requires = "screen")]
    age: Option<u8>,

    /// mark the --screen result as a retest
    #[clap(long, requires = "screen")]
    retest: bool,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SupportedGame {
    Memory,
    Patterns,
    Solver,
    Words,
    Spot,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppState {
    Playing,
    Results,
}

/// The game controller currently on screen.
pub enum ActiveGame {
    Memory(MemoryMatch),
    Patterns(PatternRecognition),
    Solver(PatternSolver),
    Words(WordBuilder),
    Spot(SpotDifference),
}

impl ActiveGame {
    pub fn kind(&self) -> GameKind {
        match self {
            ActiveGame::Memory(_) => GameKind::MemoryMatch,
            ActiveGame::Patterns(_) => GameKind::PatternRecognition,
            ActiveGame::Solver(_) => GameKind::PatternSolver,
            ActiveGame::Words(_) => GameKind::WordBuilder,
            ActiveGame::Spot(_) => GameKind::SpotDifference,
        }
    }

    fn phase(&self) -> Phase {
        match self {
            ActiveGame::Memory(g) => g.phase(),
            ActiveGame::Patterns(g) => g.phase(),
            ActiveGame::Solver(g) => g.phase(),
            ActiveGame::Words(g) => g.phase(),
            ActiveGame::Spot(g) => g.phase(),
        }
    }
}

pub struct App {
    pub cli: Cli,
    pub config: Config,
    pub game: ActiveGame,
    pub state: AppState,
    /// Board cursor for memory and spot games.
    pub cursor: usize,
    /// Text entry buffer for word and solver games.
    pub input: String,
    /// Shape/color pickers for solver shape puzzles.
    pub shape_idx: usize,
    pub color_idx: usize,
}

impl App {
    pub fn new(cli: Cli, config: Config) -> Result<Self, Box<dyn Error>> {
        let game = build_game(&cli, &config)?;
        Ok(Self {
            cli,
            config,
            game,
            state: AppState::Playing,
            cursor: 0,
            input: String::new(),
            shape_idx: 0,
            color_idx: 0,
        })
    }

    pub fn restart(&mut self) -> Result<(), Box<dyn Error>> {
        self.game = build_game(&self.cli, &self.config)?;
        self.state = AppState::Playing;
        self.cursor = 0;
        self.input.clear();
        self.shape_idx = 0;
        self.color_idx = 0;
        Ok(())
    }
}

fn build_game(cli: &Cli, config: &Config) -> Result<ActiveGame, Box<dyn Error>> {
    let selected = cli.game.unwrap_or_else(|| {
        SupportedGame::from_str(&config.default_game, true).unwrap_or(SupportedGame::Memory)
    });
    let game = match selected {
        SupportedGame::Memory => {
            let level = cli
                .level
                .unwrap_or(config.memory_level as usize)
                .clamp(1, 3) as u8;
            ActiveGame::Memory(match cli.seed {
                Some(seed) => MemoryMatch::with_seed(level, seed),
                None => MemoryMatch::new(level),
            })
        }
        SupportedGame::Patterns => ActiveGame::Patterns(match cli.seed {
            Some(seed) => PatternRecognition::with_seed(seed)?,
            None => PatternRecognition::new()?,
        }),
        SupportedGame::Solver => ActiveGame::Solver(match cli.seed {
            Some(seed) => PatternSolver::with_seed(seed),
            None => PatternSolver::new(),
        }),
        SupportedGame::Words => {
            let level = cli
                .level
                .map(|l| l.saturating_sub(1))
                .unwrap_or(config.word_level);
            ActiveGame::Words(WordBuilder::with_level(level)?)
        }
        SupportedGame::Spot => ActiveGame::Spot(SpotDifference::new()?),
    };
    Ok(game)
}

/// Headline score and risk tier recorded in history for a finished run.
pub fn summarize(game: &ActiveGame) -> Option<(f64, RiskTier)> {
    match game {
        ActiveGame::Memory(g) => {
            let analysis = g.analysis()?;
            Some((
                analysis.memory_strength,
                band_risk(ScoreBand::from_score(analysis.memory_strength)),
            ))
        }
        ActiveGame::Patterns(g) => {
            let analysis = g.analysis()?;
            Some((
                analysis.overall_accuracy,
                band_risk(ScoreBand::from_score(analysis.overall_accuracy)),
            ))
        }
        ActiveGame::Solver(g) => {
            let analysis = g.analysis();
            Some((analysis.accuracy, analysis.risk))
        }
        ActiveGame::Words(g) => {
            let summary = g.summary()?;
            let risk = match summary.badge {
                "Keep Practicing!" => RiskTier::High,
                "Good Job!" => RiskTier::Moderate,
                _ => RiskTier::Low,
            };
            Some((summary.average_accuracy, risk))
        }
        ActiveGame::Spot(g) => {
            let assessment = g.assessment()?;
            Some((assessment.overall_accuracy, assessment.risk))
        }
    }
}

fn band_risk(band: ScoreBand) -> RiskTier {
    match band {
        ScoreBand::Excellent | ScoreBand::Good => RiskTier::Low,
        ScoreBand::Fair => RiskTier::Moderate,
        ScoreBand::NeedsImprovement => RiskTier::High,
    }
}

fn session_level(game: &ActiveGame) -> String {
    match game {
        ActiveGame::Memory(g) => g.session().level.clone(),
        ActiveGame::Patterns(g) => g.session().level.clone(),
        ActiveGame::Solver(g) => g.session().level.clone(),
        ActiveGame::Words(g) => g.session().level.clone(),
        ActiveGame::Spot(g) => g.session().level.clone(),
    }
}

fn session_duration_ms(game: &ActiveGame) -> u64 {
    match game {
        ActiveGame::Memory(g) => g.session().duration_ms(),
        ActiveGame::Patterns(g) => g.session().duration_ms(),
        ActiveGame::Solver(g) => g.session().duration_ms(),
        ActiveGame::Words(g) => g.session().duration_ms(),
        ActiveGame::Spot(g) => g.session().duration_ms(),
    }
}

fn record_finished_run(app: &App) {
    if !app.config.save_history {
        return;
    }
    let Some((score, risk)) = summarize(&app.game) else {
        return;
    };
    let summary = SessionSummary {
        game: app.game.kind().to_string(),
        level: session_level(&app.game),
        score,
        risk,
        duration_ms: session_duration_ms(&app.game),
        timestamp: chrono::Local::now(),
    };
    if let Ok(db) = HistoryDb::new() {
        let _ = db.record(&summary);
    }
    let _ = report::append_log(&summary);
}

fn print_history() -> Result<(), Box<dyn Error>> {
    let db = HistoryDb::new()?;
    let recent = db.recent(20)?;
    if recent.is_empty() {
        println!("no sessions recorded yet");
        return Ok(());
    }
    for summary in recent {
        let age = chrono::Local::now()
            .signed_duration_since(summary.timestamp)
            .to_std()
            .unwrap_or(Duration::ZERO);
        println!(
            "{:<10} {:<22} {:>5.1}  {:<8} {}",
            summary.game,
            summary.level,
            summary.score,
            summary.risk,
            HumanTime::from_seconds(-(age.as_secs() as i64)),
        );
    }
    Ok(())
}

fn export_history(path: &PathBuf) -> Result<(), Box<dyn Error>> {
    let db = HistoryDb::new()?;
    let all = db.recent(10_000)?;
    report::export_history_csv(&all, path)?;
    println!("exported {} sessions to {}", all.len(), path.display());
    Ok(())
}

/// Headless screening: validate the sample, register the child, and
/// (when a classifier verdict is supplied) file and interpret the
/// result.
fn screen_sample(cli: &Cli, sample: &Path) -> Result<(), Box<dyn Error>> {
    if let Err(err) = screening::validate_sample(sample) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, err.to_string()).exit();
    }
    let name = cli.player.clone().unwrap_or_default();
    let child = match ChildRegistration::new(&name, cli.age) {
        Ok(child) => child,
        Err(err) => {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::ValueValidation, err.to_string()).exit();
        }
    };

    let Some(verdict_path) = &cli.verdict else {
        println!("sample accepted for {} ({})", child.name, child.child_id);
        return Ok(());
    };
    let prediction: Prediction =
        serde_json::from_str(&std::fs::read_to_string(verdict_path)?)?;

    let screenings = AppDirs::screenings_path().ok_or("could not resolve the screenings file")?;
    let mut sink = FileResultSink::new(screenings);
    let result = screening::run_screening(sample, &child, prediction, cli.retest, &mut sink)?;

    println!(
        "{} ({}): {} at {:.0}% confidence",
        result.child_name,
        result.child_id,
        result.prediction,
        result.confidence * 100.0
    );
    println!("{}", prediction.interpretation());
    println!("Screening only, not a diagnosis.");
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    // Headless paths that never touch the terminal UI
    if let Some(sample) = &cli.screen {
        return screen_sample(&cli, sample);
    }
    if cli.history {
        return print_history();
    }
    if let Some(path) = &cli.export {
        return export_history(path);
    }
    if cli.clear_history {
        let db = HistoryDb::new()?;
        db.clear_all()?;
        println!("history cleared");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let store = FileConfigStore::new();
    let mut config = store.load();
    if let Some(player) = &cli.player {
        config.player = Some(player.clone());
        let _ = store.save(&config);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(cli, config)?;
    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(
        CrosstermEventSource::new(),
        Duration::from_millis(TICK_RATE_MS),
    );

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        match runner.step() {
            AppEvent::Tick(elapsed) => {
                let was_playing = app.game.phase() == Phase::InProgress;
                match &mut app.game {
                    ActiveGame::Solver(g) => g.on_tick(elapsed),
                    ActiveGame::Memory(g) => {
                        g.resolve_mismatch();
                    }
                    _ => {}
                }
                if was_playing && app.game.phase() == Phase::Completed {
                    record_finished_run(app);
                    app.state = AppState::Results;
                }
            }
            AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if is_quit(&key) {
                    break;
                }
                match app.state {
                    AppState::Playing => {
                        handle_game_key(app, &key);
                        if app.game.phase() == Phase::Completed {
                            record_finished_run(app);
                            app.state = AppState::Results;
                        }
                    }
                    AppState::Results => match key.code {
                        KeyCode::Char('r') => app.restart()?,
                        _ => {}
                    },
                }
            }
        }
    }

    Ok(())
}

fn is_quit(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

fn handle_game_key(app: &mut App, key: &KeyEvent) {
    match &mut app.game {
        ActiveGame::Memory(game) => {
            let cards = game.cards().len();
            match key.code {
                KeyCode::Left => app.cursor = app.cursor.saturating_sub(1),
                KeyCode::Right => {
                    if cards > 0 && app.cursor + 1 < cards {
                        app.cursor += 1;
                    }
                }
                KeyCode::Up => app.cursor = app.cursor.saturating_sub(ui::MEMORY_COLUMNS),
                KeyCode::Down => {
                    if cards > 0 {
                        app.cursor = (app.cursor + ui::MEMORY_COLUMNS).min(cards - 1);
                    }
                }
                KeyCode::Char(' ') | KeyCode::Enter => {
                    game.flip(app.cursor);
                }
                _ => {}
            }
        }
        ActiveGame::Patterns(game) => {
            if let KeyCode::Char(c @ '1'..='9') = key.code {
                let idx = c as usize - '1' as usize;
                if game.phase() == Phase::NotStarted {
                    game.start();
                }
                if let Some(level) = game.current_level() {
                    if let Some(option) = level.options.get(idx).cloned() {
                        game.answer(&option);
                    }
                }
            } else if key.code == KeyCode::Char('s') && game.phase() == Phase::NotStarted {
                game.start();
            }
        }
        ActiveGame::Solver(game) => {
            use scrawl::games::pattern_solver::{Answer, Puzzle, ShapeCell};
            match key.code {
                KeyCode::Char('s') if game.phase() == Phase::NotStarted => game.start(),
                KeyCode::Char(c @ '0'..='9') => app.input.push(c),
                KeyCode::Char('-') if app.input.is_empty() => app.input.push('-'),
                KeyCode::Backspace => {
                    app.input.pop();
                }
                KeyCode::Tab => app.shape_idx = (app.shape_idx + 1) % ui::SOLVER_SHAPES.len(),
                KeyCode::BackTab => app.color_idx = (app.color_idx + 1) % ui::SOLVER_COLORS.len(),
                KeyCode::Enter => {
                    let answer = match game.puzzle() {
                        Some(Puzzle::Sequence { .. }) => {
                            app.input.parse::<i64>().ok().map(Answer::Number)
                        }
                        Some(Puzzle::Shapes { .. }) => Some(Answer::Shape(ShapeCell {
                            shape: ui::SOLVER_SHAPES[app.shape_idx],
                            color: ui::SOLVER_COLORS[app.color_idx],
                        })),
                        None => None,
                    };
                    if let Some(answer) = answer {
                        game.submit(answer);
                        app.input.clear();
                    }
                }
                _ => {}
            }
        }
        ActiveGame::Words(game) => match key.code {
            KeyCode::Char('s') if game.phase() == Phase::NotStarted && app.input.is_empty() => {
                game.start()
            }
            KeyCode::Char(c) => app.input.push(c),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Enter => {
                if game.submit(&app.input).is_some() {
                    app.input.clear();
                }
            }
            _ => {}
        },
        ActiveGame::Spot(game) => {
            let items = game
                .current_task()
                .map(|t| t.items.len())
                .unwrap_or_default();
            match key.code {
                KeyCode::Char('s') if game.phase() == Phase::NotStarted => game.start(),
                KeyCode::Up | KeyCode::Left => app.cursor = app.cursor.saturating_sub(1),
                KeyCode::Down | KeyCode::Right => {
                    if items > 0 && app.cursor + 1 < items {
                        app.cursor += 1;
                    }
                }
                KeyCode::Char(' ') => {
                    if let Some(item_id) =
                        game.current_task().and_then(|t| t.items.get(app.cursor)).map(|i| i.id)
                    {
                        game.toggle(item_id);
                    }
                }
                KeyCode::Enter => {
                    game.next_task();
                    app.cursor = 0;
                }
                _ => {}
            }
        }
    }
}
