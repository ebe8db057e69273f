pub mod charting;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
    Frame,
};
use crate::{ActiveGame, App, AppState};
use scrawl::games::pattern_solver::{Puzzle, Shape, ShapeColor};
use scrawl::games::{memory_match::MemoryMatch, pattern_recognition::PatternRecognition, GameKind};
use scrawl::insight::{ScoreBand, Severity};
use scrawl::session::Phase;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

/// Cards per row on the memory board.
pub const MEMORY_COLUMNS: usize = 4;

/// Picker order for solver shape answers.
pub const SOLVER_SHAPES: [Shape; 3] = [Shape::Circle, Shape::Square, Shape::Triangle];
pub const SOLVER_COLORS: [ShapeColor; 3] = [ShapeColor::Red, ShapeColor::Blue, ShapeColor::Green];

pub fn draw(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.state {
            AppState::Playing => render_playing(self, area, buf),
            AppState::Results => render_results(self, area, buf),
        }
    }
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn playing_chunks(area: Rect, body: u16) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2), // title + instruction
            Constraint::Length(body),
            Constraint::Min(1),
            Constraint::Length(1), // legend
        ])
        .split(area)
}

fn render_playing(app: &App, area: Rect, buf: &mut Buffer) {
    match &app.game {
        ActiveGame::Memory(game) => render_memory(app, game, area, buf),
        ActiveGame::Patterns(game) => render_patterns(game, area, buf),
        ActiveGame::Solver(game) => render_solver(app, game, area, buf),
        ActiveGame::Words(game) => render_words(app, game, area, buf),
        ActiveGame::Spot(game) => render_spot(app, game, area, buf),
    }
}

fn render_title(text: &str, instruction: &str, chunk: Rect, buf: &mut Buffer) {
    let lines = vec![
        Line::from(Span::styled(text.to_string(), bold())),
        Line::from(Span::styled(
            instruction.to_string(),
            Style::default().add_modifier(Modifier::ITALIC),
        )),
    ];
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunk, buf);
}

fn render_legend(text: &str, chunk: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(
        text.to_string(),
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunk, buf);
}

fn render_memory(app: &App, game: &MemoryMatch, area: Rect, buf: &mut Buffer) {
    let rows = game.cards().len().div_ceil(MEMORY_COLUMNS) as u16;
    let chunks = playing_chunks(area, rows + 2);

    render_title(
        GameKind::MemoryMatch.title(),
        "Flip cards and find every matching pair",
        chunks[0],
        buf,
    );

    let mut lines: Vec<Line> = Vec::new();
    for (row_idx, row) in game.cards().chunks(MEMORY_COLUMNS).enumerate() {
        let mut spans = Vec::new();
        for (col_idx, card) in row.iter().enumerate() {
            let idx = row_idx * MEMORY_COLUMNS + col_idx;
            let face = if card.matched || card.face_up {
                format!(" {} ", card.symbol)
            } else {
                " ■ ".to_string()
            };
            let mut style = if card.matched {
                Style::default().fg(Color::Green)
            } else if card.face_up {
                Style::default().fg(Color::Yellow)
            } else {
                dim()
            };
            if idx == app.cursor {
                style = style.patch(bold().add_modifier(Modifier::REVERSED));
            }
            spans.push(Span::styled(face, style));
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
        lines.push(Line::from(""));
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let status = format!(
        "moves: {}   matched: {}/{}   mismatches: {}",
        game.moves(),
        game.matched_pairs(),
        game.pairs(),
        game.mismatches()
    );
    Paragraph::new(Span::styled(status, dim()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    render_legend("(arrows) move / (space) flip / (esc)ape", chunks[3], buf);
}

fn render_patterns(game: &PatternRecognition, area: Rect, buf: &mut Buffer) {
    let chunks = playing_chunks(area, 8);

    render_title(
        GameKind::PatternRecognition.title(),
        "Pick the option that completes each pattern",
        chunks[0],
        buf,
    );

    let mut lines: Vec<Line> = Vec::new();
    if game.phase() == Phase::NotStarted {
        lines.push(Line::from(Span::styled(
            "Press (s) to start",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        )));
    } else if let Some(level) = game.current_level() {
        lines.push(Line::from(Span::styled(
            format!("{}  ?", level.pattern.join("  ")),
            bold(),
        )));
        lines.push(Line::from(""));
        for (idx, option) in level.options.iter().enumerate() {
            lines.push(Line::from(Span::raw(format!("({}) {}", idx + 1, option))));
        }
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);

    let status = format!(
        "pattern {}/{}   score: {}",
        game.level_number().min(game.total_levels()),
        game.total_levels(),
        game.score()
    );
    Paragraph::new(Span::styled(status, dim()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    render_legend("(1-4) answer / (esc)ape", chunks[3], buf);
}

fn render_solver(app: &App, game: &scrawl::games::pattern_solver::PatternSolver, area: Rect, buf: &mut Buffer) {
    let chunks = playing_chunks(area, 8);

    render_title(
        GameKind::PatternSolver.title(),
        "Solve as many patterns as you can in 30 seconds",
        chunks[0],
        buf,
    );

    let mut lines: Vec<Line> = Vec::new();
    match game.puzzle() {
        None if game.phase() == Phase::NotStarted => {
            lines.push(Line::from(Span::styled(
                "Press (s) to start the clock",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::ITALIC),
            )));
        }
        None => {}
        Some(Puzzle::Sequence { terms, .. }) => {
            let shown = terms
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(Line::from(Span::styled(format!("{shown}, ?"), bold())));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::raw(format!("answer: {}", app.input))));
        }
        Some(Puzzle::Shapes { cells, .. }) => {
            let shown = cells
                .iter()
                .map(|c| format!("{} {}", c.color, c.shape))
                .collect::<Vec<_>>()
                .join("  |  ");
            lines.push(Line::from(Span::styled(format!("{shown}  |  ?"), bold())));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::raw(format!(
                "answer: {} {}   (tab: shape, shift-tab: color)",
                SOLVER_COLORS[app.color_idx], SOLVER_SHAPES[app.shape_idx]
            ))));
        }
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let status = format!(
        "{:.1}s left   level {}   score {}",
        game.seconds_remaining(),
        game.level(),
        game.score()
    );
    Paragraph::new(Span::styled(status, dim()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    render_legend("(digits/tab) answer / (enter) submit / (esc)ape", chunks[3], buf);
}

fn render_words(app: &App, game: &scrawl::games::word_builder::WordBuilder, area: Rect, buf: &mut Buffer) {
    let chunks = playing_chunks(area, 6);

    render_title(&game.level().title, &game.level().instruction, chunks[0], buf);

    let mut lines: Vec<Line> = Vec::new();
    if game.phase() == Phase::NotStarted {
        lines.push(Line::from(Span::styled(
            "Press (s) to start",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::ITALIC),
        )));
    } else if let Some(word) = game.current_word() {
        lines.push(Line::from(Span::styled(word.to_string(), bold())));
        lines.push(Line::from(""));

        // echo the typed input, marking positional mismatches
        let expected: Vec<char> = word.chars().collect();
        let spans: Vec<Span> = app
            .input
            .chars()
            .enumerate()
            .map(|(idx, c)| {
                let ok = expected.get(idx) == Some(&c);
                Span::styled(
                    c.to_string(),
                    if ok {
                        Style::default().patch(bold()).fg(Color::Green)
                    } else {
                        Style::default().patch(bold()).fg(Color::Red)
                    },
                )
            })
            .collect();
        lines.push(Line::from(spans));
    }
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let status = format!(
        "word {}/{}",
        (game.attempts().len() + 1).min(game.level().items.len()),
        game.level().items.len()
    );
    Paragraph::new(Span::styled(status, dim()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    render_legend("(type) word / (enter) submit / (esc)ape", chunks[3], buf);
}

fn render_spot(app: &App, game: &scrawl::games::spot_difference::SpotDifference, area: Rect, buf: &mut Buffer) {
    let body = game
        .current_task()
        .map(|t| t.items.len() as u16)
        .unwrap_or(1);
    let chunks = playing_chunks(area, body);

    if game.phase() == Phase::NotStarted {
        render_title(GameKind::SpotDifference.title(), "Press (s) to start", chunks[0], buf);
        render_legend("(s)tart / (esc)ape", chunks[3], buf);
        return;
    }

    let Some(task) = game.current_task() else {
        return;
    };
    render_title(&task.title, &task.instruction, chunks[0], buf);

    let lines: Vec<Line> = task
        .items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let marker = if game.is_selected(item.id) { "[x]" } else { "[ ]" };
            let mut style = Style::default();
            if idx == app.cursor {
                style = style.patch(bold().add_modifier(Modifier::REVERSED));
            }
            Line::from(Span::styled(format!("{marker} {}", item.text), style))
        })
        .collect();
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let status = format!(
        "task {}/{}   selected: {}",
        game.results().len() + 1,
        game.tasks().len(),
        game.selected().len()
    );
    Paragraph::new(Span::styled(status, dim()))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);

    render_legend(
        "(arrows) move / (space) mark / (enter) next task / (esc)ape",
        chunks[3],
        buf,
    );
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(5),     // reaction-time chart
            Constraint::Length(1),  // headline stats
            Constraint::Length(8),  // findings
            Constraint::Length(1),  // caveat
            Constraint::Length(1),  // legend
        ])
        .split(area);

    render_reaction_chart(app, chunks[0], buf);

    let headline = headline_line(app);
    Paragraph::new(Span::styled(headline, bold()))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    let findings = finding_lines(app);
    Paragraph::new(findings)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP))
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    Paragraph::new(Span::styled(
        "screening signal only, not a diagnosis",
        dim().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[3], buf);

    render_legend("(r)estart / (esc)ape", chunks[4], buf);
}

fn response_coords(app: &App) -> Vec<(f64, f64)> {
    let times = match &app.game {
        ActiveGame::Memory(g) => g.session().response_times_ms(),
        ActiveGame::Patterns(g) => g.session().response_times_ms(),
        ActiveGame::Solver(g) => g.session().response_times_ms(),
        ActiveGame::Words(g) => g.session().response_times_ms(),
        ActiveGame::Spot(g) => g.session().response_times_ms(),
    };
    times
        .iter()
        .enumerate()
        .map(|(idx, &ms)| ((idx + 1) as f64, ms))
        .collect()
}

fn render_reaction_chart(app: &App, chunk: Rect, buf: &mut Buffer) {
    let coords = response_coords(app);
    let (last_action, highest_ms) = charting::compute_chart_params(&coords);

    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(Style::default().fg(Color::Magenta))
        .graph_type(GraphType::Line)
        .data(&coords)];

    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("action")
                .bounds([1.0, last_action])
                .labels(vec![
                    Span::styled("1", bold()),
                    Span::styled(charting::format_label(last_action), bold()),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("response ms")
                .bounds([0.0, highest_ms])
                .labels(vec![
                    Span::styled("0", bold()),
                    Span::styled(charting::format_label(highest_ms), bold()),
                ]),
        );

    chart.render(chunk, buf);
}

fn headline_line(app: &App) -> String {
    match crate::summarize(&app.game) {
        Some((score, risk)) => format!(
            "score {:.0}   band: {}   risk: {}",
            score,
            ScoreBand::from_score(score),
            risk
        ),
        None => "session incomplete".to_string(),
    }
}

fn finding_lines(app: &App) -> Vec<Line<'static>> {
    match &app.game {
        ActiveGame::Memory(game) => game
            .analysis()
            .map(|analysis| {
                analysis
                    .score_set()
                    .iter()
                    .map(|entry| {
                        Line::from(Span::raw(format!("{}: {:.0}", entry.name, entry.value)))
                    })
                    .collect()
            })
            .unwrap_or_default(),
        ActiveGame::Patterns(game) => game
            .analysis()
            .map(|analysis| {
                PatternRecognition::insights(&analysis)
                    .iter()
                    .map(|insight| Line::from(styled_insight(insight.severity, &insight.text)))
                    .collect()
            })
            .unwrap_or_default(),
        ActiveGame::Solver(game) => {
            let analysis = game.analysis();
            let mut lines: Vec<Line> = Vec::new();
            for text in &analysis.strengths {
                lines.push(Line::from(styled_insight(Severity::Strength, text)));
            }
            for text in &analysis.concerns {
                lines.push(Line::from(styled_insight(Severity::Concern, text)));
            }
            for text in &analysis.recommendations {
                lines.push(Line::from(styled_insight(Severity::Note, text)));
            }
            lines
        }
        ActiveGame::Words(game) => game
            .summary()
            .map(|summary| {
                vec![
                    Line::from(Span::styled(summary.badge.to_string(), bold())),
                    Line::from(Span::raw(summary.feedback.to_string())),
                    Line::from(Span::raw(format!(
                        "reversals: {}   errors: {}   avg time: {:.1}s",
                        summary.total_reversals,
                        summary.total_errors,
                        summary.average_time_ms / 1000.0
                    ))),
                ]
            })
            .unwrap_or_default(),
        ActiveGame::Spot(game) => game
            .assessment()
            .map(|assessment| {
                let mut lines: Vec<Line> = assessment
                    .task_results
                    .iter()
                    .map(|r| {
                        Line::from(Span::raw(format!(
                            "{}: {:.0}% ({} false)",
                            r.task_id, r.accuracy, r.false_positives
                        )))
                    })
                    .collect();
                for text in &assessment.recommendations {
                    lines.push(Line::from(styled_insight(Severity::Note, text)));
                }
                lines
            })
            .unwrap_or_default(),
    }
}

fn styled_insight(severity: Severity, text: &str) -> Span<'static> {
    let (marker, color) = match severity {
        Severity::Strength => ("[+]", Color::Green),
        Severity::Concern => ("[!]", Color::Red),
        Severity::Note => ("[=]", Color::Cyan),
    };
    Span::styled(
        format!("{marker} {text}"),
        Style::default().fg(color),
    )
}
