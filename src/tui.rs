use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
};
use std::io::stdout;

use crate::conversation::{Interviewer, next_field};
use crate::models::Role;
use crate::session::Session;

struct AppState {
    session: Session,
    input: String,
    /// Lines scrolled up from the bottom of the transcript.
    scroll_back: u16,
    processing: bool,
}

impl AppState {
    fn new(session: Session) -> Self {
        Self {
            session,
            input: String::new(),
            scroll_back: 0,
            processing: false,
        }
    }

    fn scroll_up(&mut self) {
        self.scroll_back = self.scroll_back.saturating_add(3);
    }

    fn scroll_down(&mut self) {
        self.scroll_back = self.scroll_back.saturating_sub(3);
    }
}

/// Runs the chat screen until Esc, and returns the session for export.
pub fn run_chat(interviewer: &Interviewer) -> Result<Session> {
    let mut state = AppState::new(Session::new());

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, interviewer);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result.map(|_| state.session)
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    interviewer: &Interviewer,
) -> Result<()> {
    loop {
        terminal.draw(|frame| draw(frame, state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Esc => break,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                KeyCode::PageUp | KeyCode::Up => state.scroll_up(),
                KeyCode::PageDown | KeyCode::Down => state.scroll_down(),
                KeyCode::Backspace => {
                    state.input.pop();
                }
                KeyCode::Enter => {
                    let input = state.input.trim().to_string();
                    if input.is_empty() || state.session.is_ended() {
                        continue;
                    }
                    state.input.clear();
                    state.scroll_back = 0;

                    // Gateway calls block the turn; show the indicator first
                    state.processing = true;
                    terminal.draw(|frame| draw(frame, state))?;
                    state.session.respond(&input, interviewer);
                    state.processing = false;
                }
                KeyCode::Char(c) => {
                    if !state.session.is_ended() {
                        state.input.push(c);
                    }
                }
                _ => {}
            }
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState) {
    let outer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(outer[0]);

    draw_sidebar(frame, state, columns[0]);

    let chat = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(columns[1]);

    draw_transcript(frame, state, chat[0]);

    let (input_text, input_title) = if state.session.is_ended() {
        (
            "Conversation ended. Press Esc to leave.".to_string(),
            " Ended ",
        )
    } else if state.processing {
        ("🤔 Processing...".to_string(), " Please wait ")
    } else {
        (format!("{}_", state.input), " Type your message here... ")
    };
    let input = Paragraph::new(input_text)
        .block(Block::default().borders(Borders::ALL).title(input_title));
    frame.render_widget(input, chat[1]);

    let help = Paragraph::new(" Enter:send  Up/Down:scroll  Esc:quit   say 'bye' or 'exit' to end")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, outer[1]);
}

fn draw_sidebar(frame: &mut Frame, state: &AppState, area: Rect) {
    let session = &state.session;
    let has_assessment = session.assessment_progress().is_some();

    let mut constraints = vec![Constraint::Length(3)];
    if has_assessment {
        constraints.push(Constraint::Length(3));
    }
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let (filled, total) = session.profile_progress();
    let profile_gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Candidate Profile "))
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(filled as f64 / total as f64)
        .label(format!("{}/{} fields completed", filled, total));
    frame.render_widget(profile_gauge, rows[0]);

    if let Some((answered, total)) = session.assessment_progress() {
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(" Technical Assessment "))
            .gauge_style(Style::default().fg(Color::Cyan))
            .ratio(answered as f64 / total as f64)
            .label(format!("{}/{} questions answered", answered, total));
        frame.render_widget(gauge, rows[1]);
    }

    let details = Paragraph::new(build_details(session))
        .block(Block::default().borders(Borders::ALL).title(" Session "))
        .wrap(Wrap { trim: false });
    frame.render_widget(details, rows[rows.len() - 1]);
}

fn build_details(session: &Session) -> Text<'_> {
    let candidate = &session.state.candidate;
    let mut lines: Vec<Line> = Vec::new();

    let fields = [
        ("Name", &candidate.name),
        ("Email", &candidate.email),
        ("Phone", &candidate.phone),
        ("Experience", &candidate.experience),
        ("Position", &candidate.position),
        ("Location", &candidate.location),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", label), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(value.as_str()),
            ]));
        }
    }
    if !candidate.tech_stack.is_empty() {
        lines.push(Line::from(Span::styled(
            "Tech Stack:",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", candidate.tech_stack.join(" · ")),
            Style::default().fg(Color::Magenta),
        )));
    }
    if !session.is_ended() {
        if let Some(field) = next_field(candidate) {
            lines.push(Line::from(Span::styled(
                format!("Next: {}", field.label()),
                Style::default().fg(Color::DarkGray),
            )));
        }
    }

    lines.push(Line::from(""));

    let status_style = if session.is_ended() {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Green)
    };
    lines.push(Line::from(format!("Session ID: {}", session.id)));
    lines.push(Line::from(vec![
        Span::raw("Status: "),
        Span::styled(session.status_label(), status_style),
    ]));
    lines.push(Line::from(format!("Started: {}", session.started_at.format("%H:%M"))));

    Text::from(lines)
}

fn draw_transcript(frame: &mut Frame, state: &AppState, area: Rect) {
    let width = area.width.saturating_sub(2).max(10) as usize;
    let height = area.height.saturating_sub(2);
    let lines = transcript_lines(&state.session, width);

    let total = lines.len().min(u16::MAX as usize) as u16;
    let bottom = total.saturating_sub(height);
    let offset = bottom.saturating_sub(state.scroll_back);

    let widget = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title(" Interview Chat "))
        .scroll((offset, 0));
    frame.render_widget(widget, area);
}

fn transcript_lines(session: &Session, width: usize) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for message in &session.transcript {
        let (speaker, style) = match message.role {
            Role::User => ("You", Style::default().fg(Color::Yellow)),
            Role::Assistant => ("TalentScout", Style::default().fg(Color::Magenta)),
            Role::System => ("System", Style::default().fg(Color::DarkGray)),
        };
        lines.push(Line::from(Span::styled(
            speaker,
            style.add_modifier(Modifier::BOLD),
        )));
        for raw in message.content.lines() {
            if raw.is_empty() {
                lines.push(Line::from(""));
                continue;
            }
            for wrapped in textwrap::wrap(raw, width) {
                lines.push(Line::from(wrapped.into_owned()));
            }
        }
        lines.push(Line::from(""));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::tests::ScriptedModel;
    use crate::tech_stack::TechCatalog;

    #[test]
    fn test_transcript_lines_wrap_and_label() {
        let model = ScriptedModel::answering(&[]);
        let catalog = TechCatalog::default();
        let interviewer = Interviewer::new(&model, &catalog);
        let mut session = Session::new();
        session.respond("Jane Doe", &interviewer);

        let lines = transcript_lines(&session, 20);
        let rendered: Vec<String> = lines.iter().map(|l| l.to_string()).collect();

        assert_eq!(rendered[0], "TalentScout");
        assert!(rendered.contains(&"You".to_string()));
        assert!(rendered.contains(&"Jane Doe".to_string()));
        assert!(rendered.iter().all(|l| l.chars().count() <= 20));
    }

    #[test]
    fn test_details_show_next_field_and_status() {
        let session = Session::new();
        let rendered: Vec<String> = build_details(&session)
            .lines
            .iter()
            .map(|l| l.to_string())
            .collect();
        assert!(rendered.contains(&"Next: Name".to_string()));
        assert!(rendered.contains(&"Status: Greeting".to_string()));
        assert!(rendered.contains(&format!("Session ID: {}", session.id)));
    }
}
