pub mod screen;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use kwiz::{
    celebration::Confetti,
    controller::QuizController,
    question::{OptionTag, Question},
    quiz::QuizState,
};

use crate::{App, SubmissionStatus};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;
const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub fn ui(app: &App, f: &mut Frame) {
    screen::current_screen(&app.state).render(app, f);
}

fn bold() -> Style {
    Style::default().add_modifier(Modifier::BOLD)
}

fn dim() -> Style {
    Style::default().add_modifier(Modifier::DIM)
}

fn italic() -> Style {
    Style::default().add_modifier(Modifier::ITALIC)
}

fn spinner(ticks: u64) -> &'static str {
    SPINNER[(ticks % SPINNER.len() as u64) as usize]
}

fn centered_message(lines: Vec<Line<'_>>, area: Rect, buf: &mut Buffer) {
    let height = lines.len() as u16;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(area.height.saturating_sub(height) / 2),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
}

fn legend(text: &str, area: Rect, buf: &mut Buffer) {
    Paragraph::new(Span::styled(text.to_string(), italic())).render(area, buf);
}

pub(crate) fn render_categories(app: &App, area: Rect, buf: &mut Buffer) {
    let picker = &app.picker;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    Paragraph::new(Span::styled("Choose a category", bold().fg(Color::Cyan)))
        .render(chunks[0], buf);

    if picker.loading {
        Paragraph::new(Span::styled(
            format!("{} Loading categories...", spinner(app.ticks)),
            dim(),
        ))
        .render(chunks[1], buf);
    } else if let Some(err) = &picker.error {
        Paragraph::new(vec![
            Line::from(Span::styled("Could not load categories", bold().fg(Color::Red))),
            Line::from(Span::styled(err.clone(), dim())),
        ])
        .wrap(Wrap { trim: true })
        .render(chunks[1], buf);
    } else if picker.items.is_empty() {
        Paragraph::new(Span::styled("No categories available yet.", dim()))
            .render(chunks[1], buf);
    } else {
        // keep the cursor in view on short terminals
        let visible = chunks[1].height.max(1) as usize;
        let skip = picker.cursor.saturating_sub(visible - 1);
        let lines: Vec<Line> = picker
            .items
            .iter()
            .enumerate()
            .skip(skip)
            .take(visible)
            .map(|(idx, c)| {
                let selected = idx == picker.cursor;
                let marker = if selected { "› " } else { "  " };
                let style = if selected {
                    bold().fg(Color::Yellow)
                } else {
                    Style::default()
                };
                let mut spans = vec![Span::styled(format!("{marker}{}", c.name), style)];
                if let Some(desc) = c.description.as_deref().filter(|d| !d.is_empty()) {
                    spans.push(Span::styled(format!("  {desc}"), dim()));
                }
                Line::from(spans)
            })
            .collect();
        Paragraph::new(lines).render(chunks[1], buf);
    }

    legend(
        "(↑/↓) move / (enter) start / (r)eload / (esc)ape",
        chunks[2],
        buf,
    );
}

pub(crate) fn render_quiz(app: &App, area: Rect, buf: &mut Buffer) {
    let Some(quiz) = app.quiz.as_ref() else {
        return;
    };

    match quiz.state() {
        QuizState::Loading => render_loading(app, quiz, area, buf),
        QuizState::Empty => render_empty(app, quiz, area, buf),
        QuizState::Unanswered { .. } | QuizState::Answered { .. } => {
            render_question(app, quiz, area, buf)
        }
        QuizState::Completed { .. } => render_completed(app, quiz, area, buf),
    }

    if app.confetti.is_active {
        render_confetti(&app.confetti, area, buf);
    }
}

/// "N malformed questions skipped", when the last load dropped any
fn rejected_notice(quiz: &QuizController) -> Option<Span<'static>> {
    let rejected = quiz.rejected().len();
    if rejected == 0 {
        return None;
    }
    let noun = if rejected == 1 { "question" } else { "questions" };
    Some(Span::styled(
        format!("{rejected} malformed {noun} skipped"),
        italic().fg(Color::Yellow),
    ))
}

fn render_empty(app: &App, quiz: &QuizController, area: Rect, buf: &mut Buffer) {
    let mut lines = vec![
        Line::from(Span::styled(app.quiz_title.clone(), bold().fg(Color::Cyan))),
        Line::from(""),
        Line::from(Span::styled("No questions found for this category.", bold())),
    ];
    if let Some(notice) = rejected_notice(quiz) {
        lines.push(Line::from(notice));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "(r)eload / (backspace) categories / (esc)ape",
        italic(),
    )));
    centered_message(lines, area, buf);
}

fn render_loading(app: &App, quiz: &QuizController, area: Rect, buf: &mut Buffer) {
    let lines = match quiz.load_error() {
        Some(err) => vec![
            Line::from(Span::styled(
                "Could not load questions",
                bold().fg(Color::Red),
            )),
            Line::from(Span::styled(err.to_string(), dim())),
            Line::from(""),
            Line::from(Span::styled(
                "(r)etry / (backspace) categories / (esc)ape",
                italic(),
            )),
        ],
        None => vec![Line::from(Span::styled(
            format!("{} Loading questions...", spinner(app.ticks)),
            dim(),
        ))],
    };
    centered_message(lines, area, buf);
}

fn option_style(question: &Question, tag: OptionTag, state: &QuizState, highlighted: bool) -> Style {
    match state {
        QuizState::Answered { selected, .. } => {
            if question.is_correct(tag) {
                bold().fg(Color::Green)
            } else if *selected == tag {
                bold().fg(Color::Red)
            } else {
                dim()
            }
        }
        _ if state.selected() == Some(tag) => bold().fg(Color::Yellow),
        _ if highlighted => bold(),
        _ => Style::default(),
    }
}

fn render_question(app: &App, quiz: &QuizController, area: Rect, buf: &mut Buffer) {
    let (Some(question), Some(index)) = (quiz.current_question(), quiz.state().index()) else {
        return;
    };
    let state = quiz.state();

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_lines =
        ((question.prompt().width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);
    let option_lines = question.option_count() as u16;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),              // header
            Constraint::Length(1),              // notice
            Constraint::Length(prompt_lines + 1),
            Constraint::Length(option_lines + 1),
            Constraint::Length(2),              // feedback
            Constraint::Min(0),
            Constraint::Length(1),              // legend
        ])
        .split(area);

    let header = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[0]);
    Paragraph::new(Line::from(vec![
        Span::styled(app.quiz_title.clone(), bold().fg(Color::Cyan)),
        Span::styled(
            format!("  Question {} of {}", index + 1, quiz.question_count()),
            bold(),
        ),
    ]))
    .render(header[0], buf);
    Paragraph::new(Span::styled(format!("Score: {}", state.score()), bold()))
        .alignment(Alignment::Right)
        .render(header[1], buf);

    if let Some(notice) = rejected_notice(quiz) {
        Paragraph::new(notice).render(chunks[1], buf);
    }

    Paragraph::new(Span::styled(question.prompt().to_string(), bold()))
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let options: Vec<Line> = question
        .options()
        .enumerate()
        .map(|(pos, (tag, text))| {
            let highlighted = !state.is_answered() && pos == app.cursor;
            let marker = if highlighted { "›" } else { " " };
            Line::from(Span::styled(
                format!("{marker} {tag}. {text}"),
                option_style(question, tag, state, highlighted),
            ))
        })
        .collect();
    Paragraph::new(options).render(chunks[3], buf);

    if let QuizState::Answered { correct, .. } = state {
        let feedback = if *correct {
            Line::from(Span::styled("Correct!", bold().fg(Color::Green)))
        } else {
            Line::from(vec![
                Span::styled("Incorrect. ", bold().fg(Color::Red)),
                Span::styled(
                    format!(
                        "The answer was {}. {}",
                        question.correct_tag(),
                        question.correct_text()
                    ),
                    dim(),
                ),
            ])
        };
        Paragraph::new(feedback)
            .wrap(Wrap { trim: true })
            .render(chunks[4], buf);
    }

    let hint = match state {
        QuizState::Answered { .. } if quiz.is_last_question() => {
            "(enter) finish / (r)estart / (esc)ape"
        }
        QuizState::Answered { .. } => "(enter) next question / (r)estart / (esc)ape",
        _ if state.selected().is_some() => "(↑/↓ or 1-4) select / (enter) check / (r)estart / (esc)ape",
        _ => "(↑/↓ or 1-4) select / (r)estart / (esc)ape",
    };
    legend(hint, chunks[6], buf);
}

fn submission_line(app: &App) -> Line<'static> {
    match app.submission {
        SubmissionStatus::Idle => Line::from(""),
        SubmissionStatus::Pending => Line::from(Span::styled(
            format!("{} saving score...", spinner(app.ticks)),
            dim(),
        )),
        SubmissionStatus::Done(outcome) => {
            let color = match outcome {
                kwiz::submit::SubmitOutcome::Delivered => Color::Green,
                kwiz::submit::SubmitOutcome::Queued => Color::Yellow,
                kwiz::submit::SubmitOutcome::Lost => Color::Red,
            };
            Line::from(Span::styled(outcome.to_string(), italic().fg(color)))
        }
    }
}

fn render_completed(app: &App, quiz: &QuizController, area: Rect, buf: &mut Buffer) {
    let Some(summary) = quiz.summary() else {
        return;
    };

    let lines = vec![
        Line::from(Span::styled("Quiz Completed!", bold().fg(Color::Cyan))),
        Line::from(""),
        Line::from(Span::styled(format!("Score: {}", summary.score), bold())),
        Line::from(format!("Total questions: {}", summary.question_count)),
        Line::from(format!(
            "Correct answers: {} of {}",
            summary.correct_count, summary.question_count
        )),
        Line::from(Span::styled(
            format!("Accuracy: {}%", summary.accuracy),
            bold(),
        )),
        Line::from(""),
        submission_line(app),
        Line::from(""),
        Line::from(Span::styled(
            "(r)estart / (backspace) categories / (esc)ape",
            italic(),
        )),
    ];
    centered_message(lines, area, buf);
}

/// Draw confetti on top of whatever screen is showing
fn render_confetti(confetti: &Confetti, area: Rect, buf: &mut Buffer) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for piece in &confetti.pieces {
        if piece.x < 0.0 || piece.y < 0.0 {
            continue;
        }
        let x = piece.x as u16;
        let y = piece.y as u16;

        if x < area.width && y < area.height {
            let color = colors[piece.color_index % colors.len()];
            let life = piece.life();
            let style = if life > 0.7 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if life > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&piece.symbol.to_string());
                cell.set_style(style);
            }
        }
    }
}
