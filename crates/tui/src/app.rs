use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pulver_core::{
    editing::{Editor, FieldCommit},
    models::NumericField,
    store::KeyValueStorage,
    view::{CalculatorView, ResultLine},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

const INPUT_POLL: Duration = Duration::from_millis(250);
const MAX_INPUT_LEN: usize = 32;

#[derive(Debug, Clone)]
struct Theme {
    accent: Color,
    muted: Color,
    panel_fg: Color,
    debug_fg: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            accent: Color::Yellow,
            muted: Color::DarkGray,
            panel_fg: Color::White,
            debug_fg: Color::Gray,
            danger: Color::Red,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Field(usize),
    DebugToggle,
}

#[derive(Debug, Clone)]
struct TextField {
    field: NumericField,
    input: String,
    cursor: usize,
    selected: bool,
}

impl TextField {
    fn new(field: NumericField, value: String) -> Self {
        let cursor = value.len();
        Self {
            field,
            input: value,
            cursor,
            selected: false,
        }
    }

    fn reset(&mut self, value: String) {
        self.cursor = value.len();
        self.input = value;
        self.selected = false;
    }

    fn select_all(&mut self) {
        self.selected = true;
        self.cursor = self.input.len();
    }

    fn take_selection(&mut self) -> bool {
        if !self.selected {
            return false;
        }
        self.selected = false;
        self.input.clear();
        self.cursor = 0;
        true
    }

    fn move_cursor(&mut self, delta: isize) {
        self.selected = false;
        let len = self.input.len() as isize;
        let next = (self.cursor as isize + delta).clamp(0, len);
        self.cursor = next as usize;
    }

    fn move_home(&mut self) {
        self.selected = false;
        self.cursor = 0;
    }

    fn move_end(&mut self) {
        self.selected = false;
        self.cursor = self.input.len();
    }

    fn insert(&mut self, ch: char) -> bool {
        if !ch.is_ascii() || ch.is_ascii_control() {
            return false;
        }
        let cleared = self.take_selection();
        if self.input.len() >= MAX_INPUT_LEN {
            return cleared;
        }
        self.input.insert(self.cursor, ch);
        self.cursor += 1;
        true
    }

    fn backspace(&mut self) -> bool {
        if self.take_selection() {
            return true;
        }
        if self.cursor > 0 && self.cursor <= self.input.len() {
            self.cursor -= 1;
            self.input.remove(self.cursor);
            return true;
        }
        false
    }

    fn delete(&mut self) -> bool {
        if self.take_selection() {
            return true;
        }
        if self.cursor < self.input.len() {
            self.input.remove(self.cursor);
            return true;
        }
        false
    }
}

enum AppEvent {
    Input(Event),
    SelectAll(Focus),
}

/// Terminal frontend for the calculator.
pub struct CalculatorApp<S> {
    editor: Editor<S>,
    commits: Option<mpsc::Receiver<FieldCommit>>,
    view: CalculatorView,
    fields: Vec<TextField>,
    focus: Focus,
    status: String,
    storage_location: String,
    event_tx: Option<mpsc::Sender<AppEvent>>,
    theme: Theme,
    should_quit: bool,
}

impl<S: KeyValueStorage> CalculatorApp<S> {
    pub fn new(
        editor: Editor<S>,
        commits: mpsc::Receiver<FieldCommit>,
        storage_location: String,
    ) -> Self {
        let view = editor.view();
        let fields = view
            .inputs
            .iter()
            .map(|input| TextField::new(input.field, input.value.clone()))
            .collect();
        Self {
            editor,
            commits: Some(commits),
            view,
            fields,
            focus: Focus::Field(0),
            status: "Bereit".to_string(),
            storage_location,
            event_tx: None,
            theme: Theme::default(),
            should_quit: false,
        }
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx.clone());
        self.event_tx = Some(event_tx);

        let result = self.event_loop(&mut terminal, event_rx).await;
        self.shutdown();
        restore_terminal(&mut terminal)?;
        self.event_tx = None;
        result
    }

    async fn event_loop<B: Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
        mut event_rx: mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        let mut commits = self
            .commits
            .take()
            .context("event loop already consumed the commit channel")?;
        self.schedule_select_all(self.focus);

        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.should_quit {
                break;
            }

            tokio::select! {
                maybe_event = event_rx.recv() => {
                    if !self.process_app_event(maybe_event) {
                        break;
                    }
                }
                Some(commit) = commits.recv() => self.apply_commit(commit),
            }

            if self.should_quit {
                break;
            }
        }

        self.commits = Some(commits);
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(event)) => {
                if let Err(err) = self.handle_input(event) {
                    error!(?err, "Input handling failed");
                    self.status = format!("Fehler: {err:#}");
                }
                true
            }
            Some(AppEvent::SelectAll(target)) => {
                self.select_all(target);
                true
            }
            None => false,
        }
    }

    fn apply_commit(&mut self, commit: FieldCommit) {
        match self.editor.apply(&commit) {
            Ok(true) => {
                debug!(field = commit.key.key(), "Field committed");
                self.status = format!("{} gespeichert", commit.key.label());
            }
            Ok(false) => return,
            Err(err) => {
                error!(?err, "Failed to persist settings");
                self.status = format!("Speichern fehlgeschlagen: {err:#}");
            }
        }
        self.rebuild();
    }

    fn rebuild(&mut self) {
        self.view = self.editor.view();
        for (field, input) in self.fields.iter_mut().zip(&self.view.inputs) {
            if !self.editor.is_pending(field.field) {
                field.reset(input.value.clone());
            }
        }
    }

    fn shutdown(&mut self) {
        match self.editor.flush() {
            Ok(0) => {}
            Ok(count) => info!(count, "Flushed pending edits on exit"),
            Err(err) => error!(?err, "Failed to flush pending edits"),
        }
    }

    fn handle_input(&mut self, event: Event) -> Result<()> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Key(_) | Event::Resize(_, _) | Event::Mouse(_) => Ok(()),
            Event::FocusGained | Event::FocusLost | Event::Paste(_) => Ok(()),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Ok(());
        }

        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Tab | KeyCode::Down => self.move_focus(1),
            KeyCode::BackTab | KeyCode::Up => self.move_focus(-1),
            _ => match self.focus {
                Focus::Field(index) => self.handle_field_key(index, key),
                Focus::DebugToggle => {
                    if matches!(key.code, KeyCode::Char(' ') | KeyCode::Enter) {
                        self.toggle_debug()?;
                    }
                }
            },
        }
        Ok(())
    }

    fn handle_field_key(&mut self, index: usize, key: KeyEvent) {
        let Some(field) = self.fields.get_mut(index) else {
            return;
        };
        let changed = match key.code {
            KeyCode::Left => {
                field.move_cursor(-1);
                false
            }
            KeyCode::Right => {
                field.move_cursor(1);
                false
            }
            KeyCode::Home => {
                field.move_home();
                false
            }
            KeyCode::End => {
                field.move_end();
                false
            }
            KeyCode::Backspace => field.backspace(),
            KeyCode::Delete => field.delete(),
            KeyCode::Char(ch)
                if key.modifiers.is_empty() || key.modifiers == KeyModifiers::SHIFT =>
            {
                field.insert(ch)
            }
            _ => false,
        };
        if changed {
            let (target, raw) = (field.field, field.input.clone());
            self.editor.input(target, raw);
        }
    }

    fn toggle_debug(&mut self) -> Result<()> {
        let enabled = !self.editor.settings().debug_enabled;
        let result = self.editor.set_debug(enabled);
        self.rebuild();
        result?;
        self.status = if enabled {
            "Debug-Modus aktiviert".to_string()
        } else {
            "Debug-Modus deaktiviert".to_string()
        };
        Ok(())
    }

    fn move_focus(&mut self, delta: isize) {
        let total = self.fields.len() as isize + 1;
        let current = match self.focus {
            Focus::Field(index) => index as isize,
            Focus::DebugToggle => total - 1,
        };
        let next = (current + delta).rem_euclid(total) as usize;
        if let Some(field) = self.focused_field_mut() {
            field.selected = false;
        }
        self.focus = if next < self.fields.len() {
            Focus::Field(next)
        } else {
            Focus::DebugToggle
        };
        self.schedule_select_all(self.focus);
    }

    /// Defers selecting the focused text to the next loop turn.
    fn schedule_select_all(&mut self, target: Focus) {
        let queued = self
            .event_tx
            .as_ref()
            .map(|tx| tx.try_send(AppEvent::SelectAll(target)).is_ok())
            .unwrap_or(false);
        if !queued {
            self.select_all(target);
        }
    }

    fn select_all(&mut self, target: Focus) {
        if self.focus != target {
            return;
        }
        if let Some(field) = self.focused_field_mut() {
            field.select_all();
        }
    }

    fn focused_field_mut(&mut self) -> Option<&mut TextField> {
        match self.focus {
            Focus::Field(index) => self.fields.get_mut(index),
            Focus::DebugToggle => None,
        }
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.size();
        let results_height = self.view.results.len() as u16 + 2;
        let debug_height = self
            .view
            .debug
            .as_ref()
            .map(|panel| panel.lines.len() as u16 + 3)
            .unwrap_or(0);

        let mut constraints = vec![Constraint::Length(3)];
        constraints.extend(self.fields.iter().map(|_| Constraint::Length(3)));
        constraints.push(Constraint::Length(1));
        constraints.push(Constraint::Length(results_height));
        constraints.push(Constraint::Length(debug_height));
        constraints.push(Constraint::Min(0));
        constraints.push(Constraint::Length(4));

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        self.render_title(frame, layout[0]);
        for index in 0..self.fields.len() {
            self.render_field(frame, layout[1 + index], index);
        }
        let after_fields = 1 + self.fields.len();
        self.render_toggle(frame, layout[after_fields]);
        self.render_results(frame, layout[after_fields + 1]);
        if debug_height > 0 {
            self.render_debug(frame, layout[after_fields + 2]);
        }
        self.render_status(frame, layout[after_fields + 4]);
    }

    fn render_title(&self, frame: &mut Frame, area: Rect) {
        let title = Paragraph::new(Line::from(Span::styled(
            "Pulver-Rechner · Abidos Timber",
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().borders(Borders::ALL));
        frame.render_widget(title, area);
    }

    fn render_field(&self, frame: &mut Frame, area: Rect, index: usize) {
        let Some(field) = self.fields.get(index) else {
            return;
        };
        let focused = self.focus == Focus::Field(index);
        let border_style = if focused {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.muted)
        };
        let text_style = if focused && field.selected {
            Style::default().add_modifier(Modifier::REVERSED)
        } else {
            Style::default().fg(self.theme.panel_fg)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(field.field.label());
        let paragraph = Paragraph::new(Line::from(Span::styled(field.input.clone(), text_style)))
            .block(block);
        frame.render_widget(paragraph, area);

        if focused && !field.selected && area.width > 2 && area.height > 2 {
            let max_x = area.x + area.width - 2;
            let x = (area.x + 1 + field.cursor as u16).min(max_x);
            frame.set_cursor(x, area.y + 1);
        }
    }

    fn render_toggle(&self, frame: &mut Frame, area: Rect) {
        let toggle = &self.view.debug_toggle;
        let mark = if toggle.checked { "[x]" } else { "[ ]" };
        let style = if self.focus == Focus::DebugToggle {
            Style::default()
                .fg(self.theme.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(self.theme.panel_fg)
        };
        let line = Line::from(vec![
            Span::styled(format!(" {mark} "), style),
            Span::styled(toggle.label, style),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn render_results(&self, frame: &mut Frame, area: Rect) {
        let lines: Vec<Line> = self
            .view
            .results
            .iter()
            .map(|line| result_line(line, self.theme.panel_fg, self.theme.danger))
            .collect();
        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Ergebnis"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_debug(&self, frame: &mut Frame, area: Rect) {
        let Some(panel) = self.view.debug.as_ref() else {
            return;
        };
        let style = Style::default().fg(self.theme.debug_fg);
        let mut lines = vec![Line::from(Span::styled(
            panel.title,
            style.add_modifier(Modifier::BOLD),
        ))];
        lines.extend(
            panel
                .lines
                .iter()
                .map(|line| Line::from(Span::styled(line.clone(), style))),
        );
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(self.theme.muted)),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let secondary = format!(
            "Tab/↑↓ wechseln · Leertaste Debug · Esc beenden · {}",
            self.storage_location
        );
        let paragraph = Paragraph::new(vec![
            Line::from(self.status.clone()),
            Line::from(Span::styled(secondary, Style::default().fg(self.theme.muted))),
        ])
        .block(block)
        .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }
}

fn result_line(line: &ResultLine, fg: Color, warning: Color) -> Line<'static> {
    let plain = line.plain_text();
    let base = if plain.starts_with("⚠️") {
        Style::default().fg(warning)
    } else {
        Style::default().fg(fg)
    };
    Line::from(
        line.segments
            .iter()
            .map(|segment| {
                let style = if segment.strong {
                    base.add_modifier(Modifier::BOLD)
                } else {
                    base
                };
                Span::styled(segment.text.clone(), style)
            })
            .collect::<Vec<_>>(),
    )
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(INPUT_POLL) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.is_closed() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulver_core::{
        debounce::DEFAULT_DEBOUNCE,
        store::{MemoryStorage, SettingsStore},
    };
    use ratatui::backend::TestBackend;
    use tokio::time::sleep;

    fn new_app(storage: &MemoryStorage) -> CalculatorApp<&MemoryStorage> {
        let (editor, commits) = Editor::open(SettingsStore::new(storage), DEFAULT_DEBOUNCE);
        CalculatorApp::new(editor, commits, "memory".to_string())
    }

    fn press(app: &mut CalculatorApp<&MemoryStorage>, code: KeyCode) {
        app.handle_input(Event::Key(KeyEvent::new(code, KeyModifiers::NONE)))
            .expect("key handled");
    }

    fn type_text(app: &mut CalculatorApp<&MemoryStorage>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn screen(app: &mut CalculatorApp<&MemoryStorage>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(110, 40)).expect("test terminal");
        terminal.draw(|frame| app.draw(frame)).expect("draw");
        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                text.push_str(buffer.get(x, y).symbol());
            }
            text.push('\n');
        }
        text
    }

    async fn next_commit(app: &mut CalculatorApp<&MemoryStorage>) {
        let commits = app.commits.as_mut().expect("commit channel");
        let commit = commits.recv().await.expect("commit delivered");
        app.apply_commit(commit);
    }

    #[tokio::test(start_paused = true)]
    async fn focus_selects_text_so_typing_replaces_it() {
        let storage = MemoryStorage::default();
        let mut app = new_app(&storage);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Field(1));
        assert!(app.fields[1].selected);

        type_text(&mut app, "50");
        assert_eq!(app.fields[1].input, "50");
        assert!(app.editor.is_pending(NumericField::RatioA));

        next_commit(&mut app).await;
        assert_eq!(app.editor.settings().ratio_a, 50.0);
        assert_eq!(SettingsStore::new(&storage).load().ratio_a, 50.0);
    }

    #[tokio::test]
    async fn queued_select_all_only_applies_to_current_focus() {
        let storage = MemoryStorage::default();
        let mut app = new_app(&storage);
        let (tx, mut rx) = mpsc::channel(8);
        app.event_tx = Some(tx);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Field(1));
        assert!(!app.fields[1].selected);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.focus, Focus::Field(2));

        let mut delivered = 0;
        while let Ok(event) = rx.try_recv() {
            assert!(app.process_app_event(Some(event)));
            delivered += 1;
        }
        assert_eq!(delivered, 2);
        assert!(!app.fields[1].selected);
        assert!(app.fields[2].selected);

        type_text(&mut app, "7");
        assert_eq!(app.fields[2].input, "7");
    }

    #[tokio::test(start_paused = true)]
    async fn comma_input_is_normalised_after_commit() {
        let storage = MemoryStorage::default();
        let mut app = new_app(&storage);
        app.select_all(Focus::Field(0));
        type_text(&mut app, "2,5");
        sleep(Duration::from_millis(100)).await;
        assert_eq!(app.editor.settings().target_quantity, 1320.0);

        next_commit(&mut app).await;
        assert_eq!(app.fields[0].input, "2.5");
        assert_eq!(app.editor.settings().target_quantity, 2.5);
    }

    #[tokio::test(start_paused = true)]
    async fn garbage_input_commits_zero() {
        let storage = MemoryStorage::default();
        let mut app = new_app(&storage);
        app.focus = Focus::Field(2);
        app.select_all(Focus::Field(2));
        type_text(&mut app, "abc");

        next_commit(&mut app).await;
        assert_eq!(app.fields[2].input, "0");
        assert_eq!(SettingsStore::new(&storage).load().ratio_b, 0.0);
    }

    #[tokio::test]
    async fn toggle_shows_and_hides_debug_panel() {
        let storage = MemoryStorage::default();
        let mut app = new_app(&storage);
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.focus, Focus::DebugToggle);

        press(&mut app, KeyCode::Char(' '));
        assert!(SettingsStore::new(&storage).load().debug_enabled);
        assert!(screen(&mut app).contains("Faktor f: 93.7500"));

        press(&mut app, KeyCode::Enter);
        assert!(!SettingsStore::new(&storage).load().debug_enabled);
        assert!(!screen(&mut app).contains("DEBUG-INFO"));
    }

    #[tokio::test]
    async fn renders_results_with_grouped_numbers() {
        let storage = MemoryStorage::default();
        let mut app = new_app(&storage);
        let text = screen(&mut app);
        assert!(text.contains("Zielmenge Abidos Timber"));
        assert!(text.contains("13.200"));
        assert!(text.contains("4.219"));
        assert!(text.contains("8.062"));
        assert!(text.contains("[ ] Debug-Modus aktivieren"));
    }

    #[tokio::test]
    async fn editing_keys_move_and_delete() {
        let storage = MemoryStorage::default();
        let mut app = new_app(&storage);
        press(&mut app, KeyCode::Home);
        press(&mut app, KeyCode::Delete);
        assert_eq!(app.fields[0].input, "320");
        press(&mut app, KeyCode::End);
        press(&mut app, KeyCode::Backspace);
        assert_eq!(app.fields[0].input, "32");
        press(&mut app, KeyCode::Left);
        type_text(&mut app, "9");
        assert_eq!(app.fields[0].input, "392");
    }

    #[tokio::test(start_paused = true)]
    async fn quitting_flushes_pending_edit() {
        let storage = MemoryStorage::default();
        let mut app = new_app(&storage);
        app.select_all(Focus::Field(0));
        type_text(&mut app, "77");
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);

        app.shutdown();
        assert_eq!(SettingsStore::new(&storage).load().target_quantity, 77.0);
    }
}
