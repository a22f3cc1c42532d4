#![forbid(unsafe_code)]

use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use crate::board::{Board, Columns, move_targets};
use crate::error::KanbanError;
use crate::task::model::{self, Status, Task};
use crate::task::storage::Outcome;
use crate::tui::TerminalGuard;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    NewTask,
    Confirm,
}

#[derive(Debug, Clone)]
struct TextInput {
    text: String,
    cursor: usize,
}

impl TextInput {
    fn new(initial: impl Into<String>) -> Self {
        let text = initial.into();
        let cursor = text.chars().count();
        Self { text, cursor }
    }

    fn as_str(&self) -> &str {
        &self.text
    }

    fn insert_char(&mut self, c: char) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        chars.insert(cur, c);
        self.text = chars.into_iter().collect();
        self.cursor = cur + 1;
    }

    fn backspace(&mut self) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        if cur == 0 {
            return;
        }
        chars.remove(cur - 1);
        self.text = chars.into_iter().collect();
        self.cursor = cur - 1;
    }

    fn delete(&mut self) {
        let mut chars: Vec<char> = self.text.chars().collect();
        let cur = self.cursor.min(chars.len());
        if cur >= chars.len() {
            return;
        }
        chars.remove(cur);
        self.text = chars.into_iter().collect();
    }

    fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    fn home(&mut self) {
        self.cursor = 0;
    }

    fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

#[derive(Debug, Clone)]
struct ConfirmDialog {
    id: u64,
    title: String,
}

#[derive(Debug, Clone)]
struct Toast {
    message: String,
    until: Instant,
}

impl Toast {
    fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            until: Instant::now() + Duration::from_secs(3),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NewTaskField {
    Title,
    Date,
}

#[derive(Debug, Clone)]
struct NewTaskDialog {
    title: TextInput,
    date: TextInput,
    field: NewTaskField,
    error: Option<String>,
}

impl NewTaskDialog {
    fn new() -> Self {
        Self {
            title: TextInput::new(""),
            date: TextInput::new(model::format_date(model::today())),
            field: NewTaskField::Title,
            error: None,
        }
    }

    fn active_input(&mut self) -> &mut TextInput {
        match self.field {
            NewTaskField::Title => &mut self.title,
            NewTaskField::Date => &mut self.date,
        }
    }

    fn toggle_field(&mut self) {
        self.field = match self.field {
            NewTaskField::Title => NewTaskField::Date,
            NewTaskField::Date => NewTaskField::Title,
        };
    }
}

#[derive(Debug)]
struct AppState {
    cfg: crate::config::Config,
    board: Board,
    columns: Columns,

    column: Status,
    rows: [usize; 3],
    mode: Mode,

    new_task: Option<NewTaskDialog>,
    confirm: Option<ConfirmDialog>,

    toast: Option<Toast>,
    last_error: Option<String>,
    should_quit: bool,
}

impl AppState {
    fn new(cfg: crate::config::Config, board: Board) -> Self {
        let columns = board.columns();
        Self {
            cfg,
            board,
            columns,
            column: Status::Todo,
            rows: [0; 3],
            mode: Mode::Normal,
            new_task: None,
            confirm: None,
            toast: None,
            last_error: None,
            should_quit: false,
        }
    }

    /// Re-reads the columns from the store and clamps every selection.
    fn refresh(&mut self) {
        self.columns = self.board.columns();
        for status in Status::ALL {
            let len = self.columns.get(status).len();
            let row = &mut self.rows[status.index()];
            *row = (*row).min(len.saturating_sub(1));
        }
    }

    fn selected_task(&self) -> Option<&Task> {
        self.columns
            .get(self.column)
            .get(self.rows[self.column.index()])
    }

    fn select_last_in(&mut self, status: Status) {
        self.column = status;
        self.rows[status.index()] = self.columns.get(status).len().saturating_sub(1);
    }

    fn report<T>(&mut self, res: Result<T, KanbanError>) -> Option<T> {
        match res {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                None
            }
        }
    }
}

pub fn run(cfg: crate::config::Config, board: Board) -> anyhow::Result<()> {
    let mut guard = TerminalGuard::enter()?;

    let mut app = AppState::new(cfg, board);

    loop {
        if let Some(toast) = &app.toast
            && Instant::now() >= toast.until
        {
            app.toast = None;
        }

        guard.terminal_mut().draw(|f| draw(f, &app))?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_key(key, &mut app);
        }
    }

    Ok(())
}

fn draw(f: &mut Frame<'_>, app: &AppState) {
    let area = f.area();

    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(area);

    draw_header(f, root[0], app);
    draw_columns(f, root[1], app);
    draw_footer(f, root[2], app);

    match app.mode {
        Mode::Normal => {}
        Mode::NewTask => {
            if let Some(dialog) = &app.new_task {
                draw_new_task_popup(f, dialog);
            }
        }
        Mode::Confirm => {
            if let Some(confirm) = &app.confirm {
                draw_confirm(f, confirm);
            }
        }
    }
}

fn draw_header(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let line = Line::from(vec![
        Span::styled(
            "Kanban board",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!("  {} tasks  ", app.columns.total())),
        Span::styled(
            app.board.store().path().display().to_string(),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_columns(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
            Constraint::Ratio(1, 3),
        ])
        .split(area);

    for status in Status::ALL {
        let tasks = app.columns.get(status);
        let active = status == app.column;
        let items: Vec<ListItem> = tasks
            .iter()
            .map(|t| {
                ListItem::new(vec![
                    Line::from(vec![
                        Span::styled(format!("#{} ", t.id), Style::default().fg(Color::DarkGray)),
                        Span::styled(t.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                    ]),
                    Line::from(Span::styled(
                        format!("   {}", model::format_date(t.date)),
                        Style::default().fg(Color::DarkGray),
                    )),
                ])
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(if app.cfg.ui.icons {
                format!(" {} {} ({}) ", status.icon(), status.label(), tasks.len())
            } else {
                format!(" {} ({}) ", status.label(), tasks.len())
            })
            .border_style(if active {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default()
            });
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");

        let mut state = ListState::default();
        if active && !tasks.is_empty() {
            state.select(Some(app.rows[status.index()]));
        }
        f.render_stateful_widget(list, chunks[status.index()], &mut state);
    }
}

fn draw_footer(f: &mut Frame<'_>, area: Rect, app: &AppState) {
    let line = if let Some(err) = app.last_error.as_deref() {
        Line::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(err.to_owned(), Style::default().fg(Color::Red)),
        ])
    } else if let Some(toast) = &app.toast {
        Line::from(Span::styled(
            toast.message.clone(),
            Style::default().fg(Color::Green),
        ))
    } else {
        let moves = app
            .selected_task()
            .map(|t| {
                move_targets(t.status)
                    .iter()
                    .map(|s| format!("{}:{}", s.index() + 1, s.label()))
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .unwrap_or_default();
        Line::from(Span::styled(
            format!("a:add  {moves}  d:delete  ←→/hl:column  ↑↓/jk:card  q:quit"),
            Style::default().fg(Color::DarkGray),
        ))
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_new_task_popup(f: &mut Frame<'_>, dialog: &NewTaskDialog) {
    let area = centered_rect(60, 30, f.area());
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Add new task");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let active_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);
    let style_for = |field: NewTaskField| {
        if dialog.field == field {
            active_style
        } else {
            Style::default()
        }
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled("Title: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(dialog.title.as_str(), style_for(NewTaskField::Title)),
        ]),
        Line::from(vec![
            Span::styled("Date:  ", Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(dialog.date.as_str(), style_for(NewTaskField::Date)),
            Span::styled("  (YYYY-MM-DD)", Style::default().fg(Color::DarkGray)),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "Enter: add  Tab: next field  Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    if let Some(err) = dialog.error.as_deref() {
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(
                "Warning: ",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(err, Style::default().fg(Color::Yellow)),
        ]));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);

    let (row, input) = match dialog.field {
        NewTaskField::Title => (0, &dialog.title),
        NewTaskField::Date => (1, &dialog.date),
    };
    let prefix = u16::try_from("Title: ".chars().count()).unwrap_or(0);
    f.set_cursor_position((
        inner.x + prefix + cursor_x_for_text(input.as_str(), input.cursor),
        inner.y + row,
    ));
}

fn draw_confirm(f: &mut Frame<'_>, confirm: &ConfirmDialog) {
    let area = centered_rect(50, 25, f.area());
    f.render_widget(Clear, area);
    let block = Block::default().borders(Borders::ALL).title("Confirm delete");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let lines = vec![
        Line::from(format!(
            "Are you sure you want to delete task #{} '{}'?",
            confirm.id, confirm.title
        )),
        Line::from(""),
        Line::from("[y] Delete    [n] Cancel"),
    ];
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

fn handle_key(key: KeyEvent, app: &mut AppState) {
    if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
        app.should_quit = true;
        return;
    }

    match app.mode {
        Mode::Normal => handle_board_key(key, app),
        Mode::NewTask => handle_new_task_key(key, app),
        Mode::Confirm => handle_confirm_key(key, app),
    }
}

fn handle_board_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Left | KeyCode::Char('h') => {
            app.column = Status::ALL[app.column.index().saturating_sub(1)];
        }
        KeyCode::Right | KeyCode::Char('l') => {
            app.column = Status::ALL[(app.column.index() + 1).min(Status::ALL.len() - 1)];
        }
        KeyCode::Up | KeyCode::Char('k') => {
            let row = &mut app.rows[app.column.index()];
            *row = row.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            let len = app.columns.get(app.column).len();
            let row = &mut app.rows[app.column.index()];
            if *row + 1 < len {
                *row += 1;
            }
        }
        KeyCode::Char('a') => {
            app.new_task = Some(NewTaskDialog::new());
            app.mode = Mode::NewTask;
        }
        KeyCode::Char(c @ '1'..='3') => {
            let target = Status::ALL[usize::from(c as u8 - b'1')];
            move_selected(app, target);
        }
        KeyCode::Char('d') | KeyCode::Delete => {
            if let Some(task) = app.selected_task() {
                app.confirm = Some(ConfirmDialog {
                    id: task.id,
                    title: task.title.clone(),
                });
                app.mode = Mode::Confirm;
            }
        }
        _ => {}
    }
}

fn move_selected(app: &mut AppState, target: Status) {
    let Some(task) = app.selected_task() else {
        return;
    };
    if task.status == target {
        app.toast = Some(Toast::info(format!("Task #{} is already in {target}", task.id)));
        return;
    }
    let id = task.id;
    let res = app.board.move_task(id, target);
    match app.report(res) {
        Some(Outcome::Applied) => {
            app.toast = Some(Toast::info(format!("Moved task #{id} to {target}")));
        }
        Some(Outcome::NotFound) => {
            app.toast = Some(Toast::info(format!("Task #{id} no longer exists")));
        }
        None => {}
    }
    app.refresh();
}

fn handle_new_task_key(key: KeyEvent, app: &mut AppState) {
    let Some(dialog) = app.new_task.as_mut() else {
        app.mode = Mode::Normal;
        return;
    };

    match key.code {
        KeyCode::Esc => {
            app.new_task = None;
            app.mode = Mode::Normal;
        }
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => dialog.toggle_field(),
        KeyCode::Enter => submit_new_task(app),
        _ => handle_text_input_key(key, dialog.active_input()),
    }
}

fn submit_new_task(app: &mut AppState) {
    let Some(dialog) = app.new_task.as_mut() else {
        return;
    };

    let title = dialog.title.as_str().trim().to_owned();
    if title.is_empty() {
        dialog.error = Some("Title cannot be empty.".to_owned());
        dialog.field = NewTaskField::Title;
        return;
    }
    let date = match model::parse_date(dialog.date.as_str()) {
        Ok(d) => d,
        Err(e) => {
            dialog.error = Some(e.to_string());
            dialog.field = NewTaskField::Date;
            return;
        }
    };

    match app.board.add(&title, Some(date)) {
        Ok(task) => {
            app.new_task = None;
            app.mode = Mode::Normal;
            app.last_error = None;
            app.toast = Some(Toast::info(format!("Added task #{}", task.id)));
            app.refresh();
            app.select_last_in(Status::Todo);
        }
        Err(e) => {
            if let Some(dialog) = app.new_task.as_mut() {
                dialog.error = Some(e.to_string());
            }
        }
    }
}

fn handle_confirm_key(key: KeyEvent, app: &mut AppState) {
    match key.code {
        KeyCode::Char('y' | 'Y') => {
            let Some(confirm) = app.confirm.take() else {
                app.mode = Mode::Normal;
                return;
            };
            app.mode = Mode::Normal;
            let res = app.board.delete(confirm.id);
            if let Some(outcome) = app.report(res) {
                let msg = match outcome {
                    Outcome::Applied => format!("Deleted task #{}", confirm.id),
                    Outcome::NotFound => format!("Task #{} no longer exists", confirm.id),
                };
                app.toast = Some(Toast::info(msg));
            }
            app.refresh();
        }
        KeyCode::Char('n' | 'N') | KeyCode::Esc => {
            app.confirm = None;
            app.mode = Mode::Normal;
        }
        _ => {}
    }
}

fn handle_text_input_key(key: KeyEvent, input: &mut TextInput) {
    match key.code {
        KeyCode::Backspace => input.backspace(),
        KeyCode::Delete => input.delete(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.home(),
        KeyCode::End => input.end(),
        KeyCode::Char(c)
            if !key.modifiers.contains(KeyModifiers::CONTROL)
                && !key.modifiers.contains(KeyModifiers::ALT) =>
        {
            input.insert_char(c);
        }
        _ => {}
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

fn cursor_x_for_text(text: &str, cursor: usize) -> u16 {
    let w = text.chars().take(cursor).count();
    u16::try_from(w).unwrap_or(u16::MAX)
}
