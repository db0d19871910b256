mod api;
mod app;
mod config;
mod event;
mod logging;
mod net;
mod session;
mod store;
mod ui;

use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};

use api::ApiClient;
use app::{App, AppScreen, LoginField, ResultScreen};
use config::Config;
use event::{AppEvent, EventHandler};
use net::Dispatcher;
use session::countdown::URGENT_THRESHOLD_SECS;
use session::question::ChoiceKey;
use store::json_store::JsonStore;
use ui::components::palette::PaletteGrid;
use ui::components::question_view::QuestionView;
use ui::components::summary::{SummaryContent, SummaryView};
use ui::components::timer_bar::TimerBar;
use ui::layout::ExamLayout;
use ui::line_input::{InputResult, LineInput};

#[derive(Parser)]
#[command(name = "testarena", version, about = "Terminal runner for TestArena mock tests")]
struct Cli {
    #[arg(short, long, help = "Attempt API base URL")]
    server: Option<String>,

    #[arg(short, long, help = "Label of the source paper")]
    label: Option<String>,

    #[arg(short, long, help = "Test duration in minutes")]
    duration: Option<u64>,

    #[arg(short, long, help = "Theme name")]
    theme: Option<String>,

    #[arg(long, help = "Run the bundled sample paper without a server")]
    offline: bool,

    #[arg(long, help = "Question file (JSON) for offline runs", requires = "offline")]
    questions: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = logging::init();

    let mut config = Config::load().unwrap_or_default();
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    if let Some(label) = cli.label {
        config.paper_label = label;
    }
    if let Some(duration) = cli.duration {
        config.duration_minutes = duration.max(1);
    }
    if let Some(theme_name) = cli.theme {
        config.theme = theme_name;
    }

    let loaded_theme = ui::theme::Theme::load(&config.theme).unwrap_or_default();
    let theme: &'static ui::theme::Theme = Box::leak(Box::new(loaded_theme));

    let token = JsonStore::new()
        .ok()
        .and_then(|store| store.load_auth())
        .and_then(|auth| auth.token);
    let logged_in = token.is_some();

    let events = EventHandler::new(Duration::from_millis(250));
    let client = ApiClient::new(&config.server_url, token);
    let net = Dispatcher::new(client, events.sender());

    let mut app = App::new(config, theme, net, cli.offline, cli.questions);
    app.start(logged_in, Instant::now());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {err:?}");
    }

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key, Instant::now()),
            AppEvent::Tick => app.on_tick(Instant::now()),
            AppEvent::Net(event) => app.handle_net(event, Instant::now()),
            AppEvent::Resize(_, _) => {}
        }

        app.drain_patches();

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent, now: Instant) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.screen {
        AppScreen::Login => handle_login_key(app, key),
        AppScreen::Loading => handle_loading_key(app, key, now),
        AppScreen::Exam => handle_exam_key(app, key, now),
        AppScreen::Result => handle_result_key(app, key),
    }
}

fn handle_login_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Tab | KeyCode::BackTab => {
            app.login.focus = match app.login.focus {
                LoginField::Email => LoginField::Password,
                LoginField::Password => LoginField::Email,
            };
            return;
        }
        KeyCode::Down => {
            app.login.focus = LoginField::Password;
            return;
        }
        KeyCode::Up => {
            app.login.focus = LoginField::Email;
            return;
        }
        _ => {}
    }

    let field = match app.login.focus {
        LoginField::Email => &mut app.login.email,
        LoginField::Password => &mut app.login.password,
    };
    match field.handle(key) {
        InputResult::Submit => match app.login.focus {
            // Enter moves on from the email field, submits from the password.
            LoginField::Email => app.login.focus = LoginField::Password,
            LoginField::Password => app.submit_login(),
        },
        InputResult::Cancel => app.should_quit = true,
        InputResult::Continue => {}
    }
}

fn handle_loading_key(app: &mut App, key: KeyEvent, now: Instant) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('r') => app.retry_loading(now),
        _ => {}
    }
}

fn handle_exam_key(app: &mut App, key: KeyEvent, now: Instant) {
    let Some(exam) = app.exam.as_mut() else {
        return;
    };

    // Finalize started: the view boundary accepts nothing further.
    if exam.is_submitting() {
        return;
    }

    // Submit confirmation dialog takes priority
    if app.view.confirm_submit {
        match key.code {
            KeyCode::Char('y') | KeyCode::Enter => {
                app.view.confirm_submit = false;
                app.submit_now(now);
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                app.view.confirm_submit = false;
            }
            _ => {}
        }
        return;
    }

    // Goto entry consumes digits until Enter
    if let Some(entry) = app.view.goto_entry.as_mut() {
        match key.code {
            KeyCode::Char(ch) if ch.is_ascii_digit() && entry.len() < 4 => entry.push(ch),
            KeyCode::Backspace => {
                entry.pop();
            }
            KeyCode::Enter => {
                let target = entry.parse::<usize>().ok().and_then(|n| n.checked_sub(1));
                app.view.goto_entry = None;
                if let Some(index) = target {
                    // Out-of-range jumps fail silently.
                    exam.go_to(index, now);
                }
            }
            KeyCode::Esc => app.view.goto_entry = None,
            _ => {}
        }
        return;
    }

    let (question_id, options) = {
        let question = exam.attempt.current_question();
        (question.id, question.present_options())
    };

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.view.option_cursor = app.view.option_cursor.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.view.option_cursor + 1 < options.len() {
                app.view.option_cursor += 1;
            }
        }
        KeyCode::Enter => {
            if let Some(&choice) = options.get(app.view.option_cursor) {
                exam.select_choice(question_id, choice, &app.net);
            }
        }
        KeyCode::Char(ch @ ('a' | 'b' | 'c' | 'd' | 'A' | 'B' | 'C' | 'D')) => {
            if let Some(choice) = ChoiceKey::from_char(ch) {
                if let Some(row) = options.iter().position(|&k| k == choice) {
                    app.view.option_cursor = row;
                    exam.select_choice(question_id, choice, &app.net);
                }
            }
        }
        KeyCode::Left | KeyCode::Char('p') => exam.previous(now),
        KeyCode::Right | KeyCode::Char('n') | KeyCode::Char(' ') => {
            exam.save_and_next(app.view.selected, now, &app.net);
        }
        KeyCode::Char('m') => exam.mark_for_review(now),
        KeyCode::Char('x') => exam.clear_response(),
        KeyCode::Char('g') => app.view.goto_entry = Some(String::new()),
        KeyCode::Char('s') => app.view.confirm_submit = true,
        KeyCode::PageUp => app.view.scroll = app.view.scroll.saturating_sub(3),
        KeyCode::PageDown => app.view.scroll = app.view.scroll.saturating_add(3),
        KeyCode::Esc => app.flash = None,
        _ => {}
    }
}

fn handle_result_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => app.should_quit = true,
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    let bg = Block::default().style(Style::default().bg(colors.bg()));
    frame.render_widget(bg, area);

    match app.screen {
        AppScreen::Login => render_login(frame, app),
        AppScreen::Loading => render_loading(frame, app),
        AppScreen::Exam => render_exam(frame, app),
        AppScreen::Result => render_result(frame, app),
    }
}

fn render_field(label: &str, input: &LineInput, focused: bool, app: &App) -> Vec<Line<'static>> {
    let colors = &app.theme.colors;
    let indicator = if focused { " > " } else { "   " };
    let (text, cursor) = input.display();

    let label_style = Style::default()
        .fg(if focused { colors.accent() } else { colors.fg() })
        .add_modifier(if focused {
            Modifier::BOLD
        } else {
            Modifier::empty()
        });

    let mut value_spans: Vec<Span> = vec![Span::raw("     ")];
    if focused {
        let chars: Vec<char> = text.chars().collect();
        let before: String = chars[..cursor.min(chars.len())].iter().collect();
        let at: String = chars.get(cursor).map(|c| c.to_string()).unwrap_or_else(|| " ".to_string());
        let after: String = if cursor + 1 <= chars.len() {
            chars[(cursor + 1).min(chars.len())..].iter().collect()
        } else {
            String::new()
        };
        value_spans.push(Span::styled(before, Style::default().fg(colors.fg())));
        value_spans.push(Span::styled(
            at,
            Style::default().add_modifier(Modifier::REVERSED),
        ));
        value_spans.push(Span::styled(after, Style::default().fg(colors.fg())));
    } else {
        value_spans.push(Span::styled(text, Style::default().fg(colors.text_dim())));
    }

    vec![
        Line::from(Span::styled(format!("{indicator}{label}:"), label_style)),
        Line::from(value_spans),
        Line::from(""),
    ]
}

fn render_login(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let area = ui::layout::centered_rect(50, 60, frame.area());

    let block = Block::bordered()
        .title(" Sign in to TestArena ")
        .border_style(Style::default().fg(colors.accent()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line> = vec![Line::from("")];
    lines.extend(render_field(
        "Email",
        &app.login.email,
        app.login.focus == LoginField::Email,
        app,
    ));
    lines.extend(render_field(
        "Password",
        &app.login.password,
        app.login.focus == LoginField::Password,
        app,
    ));

    if app.login.busy {
        lines.push(Line::from(Span::styled(
            "   Logging in…",
            Style::default().fg(colors.accent()),
        )));
    } else if let Some(error) = &app.login.error {
        lines.push(Line::from(Span::styled(
            format!("   {error}"),
            Style::default().fg(colors.error()),
        )));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "   [Tab] Switch field  [Enter] Sign in  [Esc] Quit",
        Style::default().fg(colors.text_dim()),
    )));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_loading(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let area = ui::layout::centered_rect(50, 40, frame.area());

    let block = Block::bordered()
        .border_style(Style::default().fg(colors.border()))
        .style(Style::default().bg(colors.bg()));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let lines: Vec<Line> = match &app.loading.error {
        Some(error) => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {error}"),
                Style::default().fg(colors.error()),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "  [r] Retry  [q] Quit",
                Style::default().fg(colors.text_dim()),
            )),
        ],
        None => vec![
            Line::from(""),
            Line::from(Span::styled(
                format!("  {}", app.loading.message),
                Style::default().fg(colors.fg()),
            )),
        ],
    };

    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_exam(frame: &mut ratatui::Frame, app: &App) {
    let colors = &app.theme.colors;
    let Some(exam) = app.exam.as_ref() else {
        return;
    };

    let layout = ExamLayout::new(frame.area());
    let attempt = &exam.attempt;

    let timer = TimerBar {
        label: &app.config.paper_label,
        seconds_remaining: attempt.seconds_remaining(),
        urgent: attempt.seconds_remaining() <= URGENT_THRESHOLD_SECS,
        tracked: attempt.attempt_id.is_some(),
        theme: app.theme,
    };
    frame.render_widget(&timer, layout.header);

    let question_view = QuestionView {
        question: attempt.current_question(),
        number: attempt.current_index() + 1,
        total: attempt.question_count(),
        answer: app.view.selected,
        cursor: app.view.option_cursor,
        scroll: app.view.scroll,
        theme: app.theme,
    };
    frame.render_widget(&question_view, layout.question);

    if layout.palette.height > 0 {
        let palette = PaletteGrid {
            attempt,
            theme: app.theme,
            compact: !layout.tier.palette_sidebar(),
        };
        frame.render_widget(&palette, layout.palette);
    }

    let footer_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1)])
        .split(layout.footer);

    let hints = Paragraph::new(Line::from(Span::styled(
        " [↑↓] Option  [Enter/a-d] Answer  [n] Save+next  [p] Prev  [m] Mark  [x] Clear  [g] Goto  [s] Submit",
        Style::default().fg(colors.text_dim()),
    )));
    frame.render_widget(hints, footer_rows[0]);

    let status_line = if app.view.confirm_submit {
        Line::from(Span::styled(
            " Submit this attempt? [y/n]",
            Style::default()
                .fg(colors.warning())
                .add_modifier(Modifier::BOLD),
        ))
    } else if let Some(entry) = &app.view.goto_entry {
        Line::from(Span::styled(
            format!(" Go to question: {entry}_"),
            Style::default().fg(colors.accent()),
        ))
    } else if let Some(flash) = &app.flash {
        Line::from(Span::styled(
            format!(" {flash}"),
            Style::default().fg(colors.warning()),
        ))
    } else {
        Line::from("")
    };
    frame.render_widget(Paragraph::new(status_line), footer_rows[1]);
}

fn render_result(frame: &mut ratatui::Frame, app: &App) {
    let Some(result) = app.result.as_ref() else {
        return;
    };
    let area = ui::layout::centered_rect(55, 65, frame.area());

    let content = match result {
        ResultScreen::Tracked {
            attempt_id,
            outcome: Some(outcome),
            ..
        } => SummaryContent::Confirmed {
            attempt_id: *attempt_id,
            outcome,
        },
        ResultScreen::Tracked {
            attempt_id,
            outcome: None,
            unconfirmed,
        } => SummaryContent::Unconfirmed {
            attempt_id: *attempt_id,
            detail: unconfirmed.as_deref().unwrap_or("unknown error"),
        },
        ResultScreen::Fallback {
            summary,
            saved_locally,
        } => SummaryContent::Fallback {
            summary: *summary,
            saved_locally: *saved_locally,
        },
    };

    let view = SummaryView {
        content,
        theme: app.theme,
    };
    frame.render_widget(&view, area);
}
