// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use nutritab_app::{
    CellKey, EditableCell, IngredientRow, InputKind, NutrientColumn, TableCommand, TableEvent,
    TableState, format_number, round2,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIRMATION_WINDOW: Duration = Duration::from_secs(1);
const STATUS_WINDOW: Duration = Duration::from_secs(4);
const MAX_SUGGESTIONS_SHOWN: usize = 8;
const EDIT_CURSOR: &str = "▏";
const REMOVE_GLYPH: &str = "✕";
const COPY_LABEL: &str = "copy to spreadsheet";
const COPIED_LABEL: &str = "copied!";
const ADD_LABEL: &str = "add row";
const TOTAL_LABEL: &str = "total";

/// Header labels; the name column takes two width units, the rest one each.
const COLUMN_LABELS: [&str; 7] = [
    "ingredient",
    "net weight",
    "protein",
    "carbs",
    "lipids",
    "kcal",
    "",
];

pub trait AppRuntime {
    fn write_clipboard(&mut self, text: &str) -> Result<()>;

    /// How long the export confirmation stays visible.
    fn confirmation_window(&self) -> Duration {
        CONFIRMATION_WINDOW
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellColumn {
    Name,
    Weight,
    Remove,
}

impl CellColumn {
    const ALL: [Self; 3] = [Self::Name, Self::Weight, Self::Remove];

    fn table_index(self) -> usize {
        match self {
            Self::Name => 0,
            Self::Weight => 1,
            Self::Remove => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusTarget {
    Cell { row: usize, column: CellColumn },
    AddButton,
    CopyButton,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    ExportConfirmationExpired { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ViewData {
    focus: Option<FocusTarget>,
    cell: EditableCell,
    weight_input: String,
    copied: bool,
    confirmation_token: u64,
    status_line: Option<String>,
    status_token: u64,
    help_visible: bool,
}

impl Default for ViewData {
    fn default() -> Self {
        Self {
            focus: None,
            cell: EditableCell::new(InputKind::Text),
            weight_input: String::new(),
            copied: false,
            confirmation_token: 0,
            status_line: None,
            status_token: 0,
            help_visible: false,
        }
    }
}

pub fn run_app<R: AppRuntime>(state: &mut TableState<'_>, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();
    set_focus(
        state,
        &mut view_data,
        Some(FocusTarget::Cell {
            row: 0,
            column: CellColumn::Name,
        }),
    );

    let mut result = Ok(());
    loop {
        process_internal_events(&mut view_data, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn process_internal_events(view_data: &mut ViewData, rx: &Receiver<InternalEvent>) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                view_data.status_line = None;
            }
            InternalEvent::ExportConfirmationExpired { token }
                if token == view_data.confirmation_token =>
            {
                view_data.copied = false;
            }
            InternalEvent::ClearStatus { .. } | InternalEvent::ExportConfirmationExpired { .. } => {}
        }
    }
}

fn schedule(internal_tx: &Sender<InternalEvent>, delay: Duration, event: InternalEvent) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(event);
    });
}

fn emit_status(
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    view_data.status_line = Some(message.into());
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule(
        internal_tx,
        STATUS_WINDOW,
        InternalEvent::ClearStatus {
            token: view_data.status_token,
        },
    );
}

fn handle_key_event<R: AppRuntime>(
    state: &mut TableState<'_>,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c')) {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if ctrl {
        match key.code {
            KeyCode::Char('n') => add_row(state, view_data, internal_tx),
            KeyCode::Char('d') => {
                if let Some(FocusTarget::Cell { row, .. }) = view_data.focus {
                    remove_row(state, view_data, internal_tx, row);
                }
            }
            KeyCode::Char('e') => export_rows(state, runtime, view_data, internal_tx),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Tab => move_focus(state, view_data, 1),
        KeyCode::BackTab => move_focus(state, view_data, -1),
        KeyCode::Up => move_vertical(state, view_data, -1),
        KeyCode::Down => move_vertical(state, view_data, 1),
        KeyCode::Left => move_horizontal(state, view_data, -1),
        KeyCode::Right => move_horizontal(state, view_data, 1),
        KeyCode::Esc => set_focus(state, view_data, None),
        KeyCode::Enter => activate_focus(state, runtime, view_data, internal_tx),
        KeyCode::Backspace => edit_focused_cell(state, view_data, CellKey::Backspace),
        KeyCode::Char('?') if !view_data.cell.is_editing() || focused_cell(view_data).is_none() => {
            view_data.help_visible = true;
        }
        KeyCode::Char(ch) => edit_focused_cell(state, view_data, CellKey::Char(ch)),
        _ => {}
    }
    false
}

fn focused_cell(view_data: &ViewData) -> Option<(usize, CellColumn)> {
    match view_data.focus {
        Some(FocusTarget::Cell { row, column }) => Some((row, column)),
        _ => None,
    }
}

/// Moves focus, blurring the old cell and focusing the new one. Leaving a name
/// field drops its suggestions.
fn set_focus(state: &mut TableState<'_>, view_data: &mut ViewData, target: Option<FocusTarget>) {
    let target = target.filter(|target| match target {
        FocusTarget::Cell { row, .. } => *row < state.row_count(),
        FocusTarget::AddButton | FocusTarget::CopyButton => true,
    });

    if let Some((row, CellColumn::Name)) = focused_cell(view_data)
        && target
            != Some(FocusTarget::Cell {
                row,
                column: CellColumn::Name,
            })
        && state.suggestions_for(row).is_some()
    {
        state.dispatch(TableCommand::DismissSuggestions);
    }

    view_data.cell.blur();
    view_data.weight_input.clear();
    view_data.focus = target;

    match target {
        Some(FocusTarget::Cell {
            row,
            column: CellColumn::Name,
        }) => {
            debug!(row, "name cell focused");
            view_data.cell = EditableCell::new(InputKind::Text);
            view_data.cell.focus();
        }
        Some(FocusTarget::Cell {
            row,
            column: CellColumn::Weight,
        }) => {
            view_data.cell = EditableCell::new(InputKind::Number);
            view_data.cell.focus();
            view_data.weight_input = state
                .rows()
                .get(row)
                .map(|entry| format_number(entry.weight()))
                .unwrap_or_default();
        }
        _ => {}
    }
}

fn focus_order(state: &TableState<'_>) -> Vec<FocusTarget> {
    let mut order = (0..state.row_count())
        .flat_map(|row| {
            CellColumn::ALL
                .into_iter()
                .map(move |column| FocusTarget::Cell { row, column })
        })
        .collect::<Vec<_>>();
    order.push(FocusTarget::AddButton);
    order.push(FocusTarget::CopyButton);
    order
}

fn move_focus(state: &mut TableState<'_>, view_data: &mut ViewData, delta: isize) {
    let order = focus_order(state);
    let len = order.len() as isize;
    let next = match view_data
        .focus
        .and_then(|focus| order.iter().position(|target| *target == focus))
    {
        Some(current) => (current as isize + delta).rem_euclid(len) as usize,
        None if delta >= 0 => 0,
        None => order.len() - 1,
    };
    set_focus(state, view_data, order.get(next).copied());
}

fn move_vertical(state: &mut TableState<'_>, view_data: &mut ViewData, delta: isize) {
    let Some((row, column)) = focused_cell(view_data) else {
        return;
    };
    if column == CellColumn::Name && state.suggestions_for(row).is_some() {
        state.dispatch(TableCommand::MoveSuggestion(delta));
        return;
    }
    let target = row as isize + delta;
    if target < 0 || target >= state.row_count() as isize {
        return;
    }
    set_focus(
        state,
        view_data,
        Some(FocusTarget::Cell {
            row: target as usize,
            column,
        }),
    );
}

fn move_horizontal(state: &mut TableState<'_>, view_data: &mut ViewData, delta: isize) {
    let Some((row, column)) = focused_cell(view_data) else {
        return;
    };
    let Some(index) = CellColumn::ALL.iter().position(|c| *c == column) else {
        return;
    };
    let target = index as isize + delta;
    if target < 0 || target >= CellColumn::ALL.len() as isize {
        return;
    }
    set_focus(
        state,
        view_data,
        Some(FocusTarget::Cell {
            row,
            column: CellColumn::ALL[target as usize],
        }),
    );
}

fn activate_focus<R: AppRuntime>(
    state: &mut TableState<'_>,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    match view_data.focus {
        Some(FocusTarget::Cell {
            row,
            column: CellColumn::Name,
        }) => {
            let picked = state
                .suggestions_for(row)
                .and_then(|autocomplete| autocomplete.highlighted_option())
                .map(|reference| (reference.id, reference.name.clone()));
            if let Some((reference_id, name)) = picked {
                state.dispatch(TableCommand::SelectSuggestion { row, reference_id });
                emit_status(view_data, internal_tx, format!("matched {name}"));
            } else {
                toggle_cell_mode(view_data);
            }
        }
        Some(FocusTarget::Cell {
            row,
            column: CellColumn::Weight,
        }) => {
            if !view_data.cell.is_editing() {
                view_data.weight_input = state
                    .rows()
                    .get(row)
                    .map(|entry| format_number(entry.weight()))
                    .unwrap_or_default();
            }
            toggle_cell_mode(view_data);
        }
        Some(FocusTarget::Cell {
            row,
            column: CellColumn::Remove,
        }) => remove_row(state, view_data, internal_tx, row),
        Some(FocusTarget::AddButton) => add_row(state, view_data, internal_tx),
        Some(FocusTarget::CopyButton) => export_rows(state, runtime, view_data, internal_tx),
        None => {}
    }
}

/// Enter leaves edit mode; on a cell already in view mode it re-enters edit,
/// the keyboard equivalent of clicking it.
fn toggle_cell_mode(view_data: &mut ViewData) {
    if view_data.cell.is_editing() {
        view_data.cell.handle_key(CellKey::Enter, "");
    } else {
        view_data.cell.focus();
    }
}

fn edit_focused_cell(state: &mut TableState<'_>, view_data: &mut ViewData, key: CellKey) {
    let Some((row, column)) = focused_cell(view_data) else {
        return;
    };
    match column {
        CellColumn::Name => {
            let current = state
                .rows()
                .get(row)
                .map(|entry| entry.name().to_owned())
                .unwrap_or_default();
            if let Some(value) = view_data.cell.handle_key(key, &current) {
                state.dispatch(TableCommand::EditName { row, value });
            }
        }
        CellColumn::Weight => {
            if let Some(raw) = view_data.cell.handle_key(key, &view_data.weight_input) {
                view_data.weight_input.clone_from(&raw);
                state.dispatch(TableCommand::EditWeight { row, raw });
            }
        }
        CellColumn::Remove => {}
    }
}

fn add_row(
    state: &mut TableState<'_>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let events = state.dispatch(TableCommand::AddRow);
    if let Some(TableEvent::RowAdded(row)) = events.first() {
        debug!(row, "row added");
        if !matches!(view_data.focus, Some(FocusTarget::AddButton)) {
            set_focus(
                state,
                view_data,
                Some(FocusTarget::Cell {
                    row: *row,
                    column: CellColumn::Name,
                }),
            );
        }
        emit_status(view_data, internal_tx, "row added");
    }
}

fn remove_row(
    state: &mut TableState<'_>,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    row: usize,
) {
    let previous_focus = view_data.focus;
    set_focus(state, view_data, None);
    let events = state.dispatch(TableCommand::RemoveRow(row));
    if events.is_empty() {
        set_focus(state, view_data, previous_focus);
        return;
    }
    debug!(row, remaining = state.row_count(), "row removed");

    let next_focus = match previous_focus {
        Some(FocusTarget::Cell { column, .. }) if state.row_count() > 0 => {
            Some(FocusTarget::Cell {
                row: row.min(state.row_count() - 1),
                column,
            })
        }
        Some(FocusTarget::Cell { .. }) => Some(FocusTarget::AddButton),
        other => other,
    };
    set_focus(state, view_data, next_focus);
    emit_status(view_data, internal_tx, "row removed");
}

/// Copies the rows as tab-separated text. A failed clipboard write is logged
/// and otherwise ignored; the confirmation shows either way.
fn export_rows<R: AppRuntime>(
    state: &TableState<'_>,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let text = state.export_tsv();
    match runtime.write_clipboard(&text) {
        Ok(()) => info!(
            rows = state.row_count(),
            bytes = text.len(),
            "rows copied to clipboard"
        ),
        Err(error) => warn!(error = %format!("{error:#}"), "clipboard write failed"),
    }

    view_data.copied = true;
    view_data.confirmation_token = view_data.confirmation_token.saturating_add(1);
    schedule(
        internal_tx,
        runtime.confirmation_window(),
        InternalEvent::ExportConfirmationExpired {
            token: view_data.confirmation_token,
        },
    );
}

fn render(frame: &mut ratatui::Frame<'_>, state: &TableState<'_>, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(4),
            Constraint::Length(3),
            Constraint::Length(2),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(state))
        .block(Block::default().title("nutritab").borders(Borders::ALL));
    frame.render_widget(header, layout[0]);

    let offset = scroll_offset(
        state.row_count(),
        visible_row_capacity(layout[1]),
        view_data.focus,
    );
    render_table(frame, layout[1], state, view_data, offset);
    frame.render_widget(action_bar(view_data), layout[2]);

    let status = Paragraph::new(status_text(view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(status, layout[3]);

    render_suggestions(frame, layout[1], state, view_data, offset);

    if view_data.help_visible {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn header_text(state: &TableState<'_>) -> String {
    let rows = state.row_count();
    format!(
        "{} reference ingredients | {} row{} selected",
        state.dataset().len(),
        rows,
        if rows == 1 { "" } else { "s" }
    )
}

fn column_widths() -> [Constraint; 7] {
    [
        Constraint::Ratio(2, 8),
        Constraint::Ratio(1, 8),
        Constraint::Ratio(1, 8),
        Constraint::Ratio(1, 8),
        Constraint::Ratio(1, 8),
        Constraint::Ratio(1, 8),
        Constraint::Ratio(1, 8),
    ]
}

/// Ingredient rows that fit between the header and the totals row.
fn visible_row_capacity(table_area: Rect) -> usize {
    usize::from(table_area.height.saturating_sub(4)).max(1)
}

/// First ingredient row to draw so the focused row stays on screen. The
/// action buttons sit after the last row, so focusing them shows the tail.
fn scroll_offset(row_count: usize, capacity: usize, focus: Option<FocusTarget>) -> usize {
    let anchor = match focus {
        Some(FocusTarget::Cell { row, .. }) => row,
        Some(FocusTarget::AddButton | FocusTarget::CopyButton) => row_count.saturating_sub(1),
        None => 0,
    };
    anchor
        .saturating_sub(capacity.saturating_sub(1))
        .min(row_count.saturating_sub(capacity))
}

fn render_table(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    state: &TableState<'_>,
    view_data: &ViewData,
    offset: usize,
) {
    let capacity = visible_row_capacity(area);
    let header = Row::new(COLUMN_LABELS.iter().map(|label| {
        Cell::from(*label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = state
        .rows()
        .iter()
        .enumerate()
        .skip(offset)
        .take(capacity)
        .map(|(index, row)| {
            let cells = row_cells(state, view_data, index, row)
                .into_iter()
                .enumerate()
                .map(|(column, text)| {
                    let focused = matches!(
                        view_data.focus,
                        Some(FocusTarget::Cell { row: r, column: c })
                            if r == index && c.table_index() == column
                    );
                    let style = if focused {
                        Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default()
                    };
                    Cell::from(text).style(style)
                })
                .collect::<Vec<_>>();
            Row::new(cells)
        })
        .chain(std::iter::once(totals_row(state)));

    let row_count = state.row_count();
    let title = if row_count > capacity {
        format!(
            "ingredients {}-{} of {row_count}",
            offset + 1,
            (offset + capacity).min(row_count)
        )
    } else {
        "ingredients".to_owned()
    };
    let table = Table::new(rows, column_widths())
        .header(header)
        .column_spacing(1)
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(table, area);
}

fn row_cells(
    state: &TableState<'_>,
    view_data: &ViewData,
    index: usize,
    row: &IngredientRow,
) -> Vec<String> {
    let editing = |column: CellColumn| {
        view_data.cell.is_editing() && focused_cell(view_data) == Some((index, column))
    };

    let name = if editing(CellColumn::Name) {
        format!("{}{EDIT_CURSOR}", row.name())
    } else {
        row.name().to_owned()
    };
    let weight = if editing(CellColumn::Weight) {
        format!("{}{EDIT_CURSOR}", view_data.weight_input)
    } else {
        format_number(row.weight())
    };

    let nutrients = row.nutrients(state.dataset());
    let mut cells = vec![name, weight];
    cells.extend(
        NutrientColumn::ALL
            .into_iter()
            .map(|column| format_number(round2(nutrients.get(column)))),
    );
    cells.push(REMOVE_GLYPH.to_owned());
    cells
}

fn totals_row(state: &TableState<'_>) -> Row<'static> {
    let totals = state.totals();
    let mut cells = vec![TOTAL_LABEL.to_owned(), String::new()];
    cells.extend(
        NutrientColumn::ALL
            .into_iter()
            .map(|column| format_number(round2(totals.get(column)))),
    );
    cells.push(String::new());
    Row::new(cells).style(Style::default().add_modifier(Modifier::BOLD))
}

fn action_bar(view_data: &ViewData) -> Paragraph<'static> {
    let button = |label: &str, focused: bool, base: Style| {
        let style = if focused {
            base.add_modifier(Modifier::REVERSED | Modifier::BOLD)
        } else {
            base
        };
        Span::styled(format!("[ {label} ]"), style)
    };
    let copy_label = if view_data.copied {
        COPIED_LABEL
    } else {
        COPY_LABEL
    };

    let line = Line::from(vec![
        button(
            ADD_LABEL,
            view_data.focus == Some(FocusTarget::AddButton),
            Style::default().fg(Color::Blue),
        ),
        Span::raw("   "),
        button(
            copy_label,
            view_data.focus == Some(FocusTarget::CopyButton),
            Style::default().fg(Color::Green),
        ),
    ]);
    Paragraph::new(line).block(Block::default().borders(Borders::ALL))
}

/// Draws the suggestion list just under the focused name cell.
fn render_suggestions(
    frame: &mut ratatui::Frame<'_>,
    table_area: Rect,
    state: &TableState<'_>,
    view_data: &ViewData,
    offset: usize,
) {
    let Some((row, CellColumn::Name)) = focused_cell(view_data) else {
        return;
    };
    let Some(autocomplete) = state.suggestions_for(row) else {
        return;
    };
    let Some(visible_row) = row.checked_sub(offset) else {
        return;
    };
    let Some(area) = suggestion_area(
        table_area,
        frame.area(),
        visible_row,
        autocomplete.options.len(),
    ) else {
        return;
    };

    let skip = autocomplete
        .highlighted
        .saturating_sub(MAX_SUGGESTIONS_SHOWN - 1);
    let lines = autocomplete
        .options
        .iter()
        .enumerate()
        .skip(skip)
        .take(MAX_SUGGESTIONS_SHOWN)
        .map(|(index, option)| {
            let style = if index == autocomplete.highlighted {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            Line::styled(option.name.clone(), style)
        })
        .collect::<Vec<_>>();

    frame.render_widget(Clear, area);
    let list = Paragraph::new(lines).block(
        Block::default()
            .title(format!("{} match", autocomplete.options.len()))
            .borders(Borders::ALL),
    );
    frame.render_widget(list, area);
}

fn suggestion_area(table_area: Rect, screen: Rect, row: usize, options: usize) -> Option<Rect> {
    // Border, header, then one line per row; the list opens below the row.
    let top = table_area
        .y
        .saturating_add(2)
        .saturating_add(u16::try_from(row).ok()?)
        .saturating_add(1);
    let bottom = screen.y.saturating_add(screen.height);
    if top >= bottom {
        return None;
    }
    let wanted = u16::try_from(options.min(MAX_SUGGESTIONS_SHOWN)).ok()? + 2;
    let height = wanted.min(bottom - top);
    let width = (table_area.width.saturating_sub(2) / 4).max(24).min(table_area.width);
    if height < 3 || width == 0 {
        return None;
    }
    Some(Rect::new(table_area.x.saturating_add(1), top, width, height).intersection(screen))
}

fn status_text(view_data: &ViewData) -> String {
    let mode = if view_data.cell.is_editing() && focused_cell(view_data).is_some() {
        "EDIT"
    } else {
        "NAV"
    };
    let default =
        "tab/shift+tab move | enter edit/pick | esc blur | ctrl+n add | ctrl+d del | ctrl+e copy | ? help | ctrl+q";
    match &view_data.status_line {
        Some(status) => format!("{mode} | {status} | {default}"),
        None => format!("{mode} | {default}"),
    }
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+q quit | ctrl+n add row | ctrl+d delete focused row | ctrl+e copy rows\n\
focus: tab/shift+tab next/prev | left/right column | up/down row | esc blur\n\
cells: type to edit | enter done (again to edit) | backspace delete\n\
name: up/down choose suggestion | enter pick\n\
buttons: enter on ✕ removes the row, on add/copy runs it\n\
? close help"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::{
        AppRuntime, CellColumn, FocusTarget, InternalEvent, ViewData, focus_order,
        handle_key_event, process_internal_events, render, scroll_offset, set_focus, status_text,
        suggestion_area, visible_row_capacity,
    };
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use nutritab_app::{IngredientId, Nutrients, ReferenceDataset, TableState};
    use nutritab_testkit::{sample_dataset, unmatched_row};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use ratatui::layout::Rect;
    use std::sync::mpsc;
    use std::time::Duration;

    #[derive(Debug)]
    struct TestRuntime {
        clipboard: Vec<String>,
        fail_clipboard: bool,
        window: Duration,
    }

    impl Default for TestRuntime {
        fn default() -> Self {
            Self {
                clipboard: Vec::new(),
                fail_clipboard: false,
                window: Duration::from_millis(10),
            }
        }
    }

    impl AppRuntime for TestRuntime {
        fn write_clipboard(&mut self, text: &str) -> anyhow::Result<()> {
            if self.fail_clipboard {
                anyhow::bail!("clipboard denied");
            }
            self.clipboard.push(text.to_owned());
            Ok(())
        }

        fn confirmation_window(&self) -> Duration {
            self.window
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(ch: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL)
    }

    fn focused_view(state: &mut TableState<'_>) -> ViewData {
        let mut view_data = ViewData::default();
        set_focus(
            state,
            &mut view_data,
            Some(FocusTarget::Cell {
                row: 0,
                column: CellColumn::Name,
            }),
        );
        view_data
    }

    fn run_keys(
        state: &mut TableState<'_>,
        runtime: &mut TestRuntime,
        view_data: &mut ViewData,
        tx: &mpsc::Sender<InternalEvent>,
        keys: &[KeyEvent],
    ) {
        for key in keys {
            let _ = handle_key_event(state, runtime, view_data, tx, *key);
        }
    }

    fn type_text(text: &str) -> Vec<KeyEvent> {
        text.chars().map(|ch| key(KeyCode::Char(ch))).collect()
    }

    fn screen_text(state: &TableState<'_>, view_data: &ViewData) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 24)).expect("test terminal");
        terminal
            .draw(|frame| render(frame, state, view_data))
            .expect("draw frame");
        let buffer = terminal.backend().buffer().clone();
        let width = buffer.area.width as usize;
        buffer
            .content()
            .chunks(width)
            .map(|line| line.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn ctrl_q_quits() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = mpsc::channel();

        assert!(handle_key_event(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            ctrl('q'),
        ));
    }

    #[test]
    fn typing_then_enter_picks_the_highlighted_suggestion() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = focused_view(&mut state);
        let (tx, _rx) = mpsc::channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &type_text("PO"),
        );
        assert_eq!(state.rows()[0].name(), "PO");
        assert_eq!(state.suggestions_for(0).map(|a| a.options.len()), Some(1));

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Enter)],
        );
        assert_eq!(state.rows()[0].reference_id(), Some(IngredientId::new(5)));
        assert_eq!(state.rows()[0].name(), "Pollo");
        assert!(state.autocomplete().is_none());
        assert_eq!(view_data.status_line.as_deref(), Some("matched Pollo"));
    }

    #[test]
    fn arrow_keys_walk_suggestions_before_rows() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = focused_view(&mut state);
        let (tx, _rx) = mpsc::channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[
                key(KeyCode::Char('a')),
                key(KeyCode::Down),
                key(KeyCode::Enter),
            ],
        );
        assert_eq!(state.rows()[0].name(), "Avena");
    }

    #[test]
    fn weight_edits_rescale_matched_rows() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = focused_view(&mut state);
        let (tx, _rx) = mpsc::channel();

        let mut keys = type_text("pol");
        keys.push(key(KeyCode::Enter));
        keys.push(key(KeyCode::Tab));
        assert_eq!(view_data.weight_input, "");
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &keys);
        assert_eq!(view_data.weight_input, "100");

        let mut edits = vec![key(KeyCode::Backspace); 3];
        edits.extend(type_text("50"));
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &edits);

        assert_eq!(state.rows()[0].weight(), 50.0);
        assert_eq!(
            state.row_nutrients(0),
            Some(Nutrients {
                protein: 10.0,
                carbs: 0.0,
                lipids: 1.0,
                kcal: 75.0,
            })
        );
    }

    #[test]
    fn weight_cell_ignores_letters() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = focused_view(&mut state);
        let (tx, _rx) = mpsc::channel();

        let mut keys = vec![key(KeyCode::Tab), key(KeyCode::Backspace)];
        keys.extend(type_text("1x2"));
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &keys);
        assert_eq!(view_data.weight_input, "12");
        assert_eq!(state.rows()[0].weight(), 12.0);
    }

    #[test]
    fn enter_toggles_between_edit_and_view() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = focused_view(&mut state);
        let (tx, _rx) = mpsc::channel();
        assert!(view_data.cell.is_editing());

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Enter)],
        );
        assert!(!view_data.cell.is_editing());

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &type_text("zz"),
        );
        assert_eq!(state.rows()[0].name(), "");

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Enter)],
        );
        assert!(view_data.cell.is_editing());
    }

    #[test]
    fn leaving_the_name_cell_clears_suggestions() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = focused_view(&mut state);
        let (tx, _rx) = mpsc::channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Char('a'))],
        );
        assert!(state.autocomplete().is_some());

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Esc)],
        );
        assert!(state.autocomplete().is_none());
        assert_eq!(view_data.focus, None);
        assert!(!view_data.cell.is_editing());
    }

    #[test]
    fn tab_order_walks_cells_then_buttons() {
        let dataset = sample_dataset();
        let state = TableState::with_rows(
            &dataset,
            vec![
                unmatched_row("a", 1.0, Nutrients::ZERO),
                unmatched_row("b", 1.0, Nutrients::ZERO),
            ],
        );
        let order = focus_order(&state);
        assert_eq!(order.len(), 8);
        assert_eq!(
            order[4],
            FocusTarget::Cell {
                row: 1,
                column: CellColumn::Weight,
            }
        );
        assert_eq!(order[6], FocusTarget::AddButton);
        assert_eq!(order[7], FocusTarget::CopyButton);
    }

    #[test]
    fn ctrl_n_adds_and_ctrl_d_removes_rows() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = focused_view(&mut state);
        let (tx, _rx) = mpsc::channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[ctrl('n'), ctrl('n')],
        );
        assert_eq!(state.row_count(), 3);
        assert_eq!(
            view_data.focus,
            Some(FocusTarget::Cell {
                row: 2,
                column: CellColumn::Name,
            })
        );

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[ctrl('d')]);
        assert_eq!(state.row_count(), 2);
        assert_eq!(
            view_data.focus,
            Some(FocusTarget::Cell {
                row: 1,
                column: CellColumn::Name,
            })
        );
        assert_eq!(view_data.status_line.as_deref(), Some("row removed"));
    }

    #[test]
    fn removing_the_last_row_moves_focus_to_add_button() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = focused_view(&mut state);
        let (tx, _rx) = mpsc::channel();

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[ctrl('d')]);
        assert_eq!(state.row_count(), 0);
        assert_eq!(view_data.focus, Some(FocusTarget::AddButton));

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Enter)],
        );
        assert_eq!(state.row_count(), 1);
        assert_eq!(view_data.focus, Some(FocusTarget::AddButton));
    }

    #[test]
    fn export_copies_rows_and_confirms_until_timer_fires() {
        let dataset = sample_dataset();
        let mut state = TableState::with_rows(
            &dataset,
            vec![unmatched_row(
                "Egg",
                50.0,
                Nutrients {
                    protein: 6.0,
                    carbs: 0.5,
                    lipids: 5.0,
                    kcal: 70.0,
                },
            )],
        );
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, rx) = mpsc::channel();

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[ctrl('e')]);
        assert_eq!(runtime.clipboard, vec!["Egg\t50\t6\t0.5\t5\t70\n".to_owned()]);
        assert!(view_data.copied);

        let expired = rx
            .recv_timeout(Duration::from_secs(2))
            .expect("confirmation timer fires");
        assert_eq!(
            expired,
            InternalEvent::ExportConfirmationExpired {
                token: view_data.confirmation_token,
            }
        );
        tx.send(expired).expect("requeue timer event");
        process_internal_events(&mut view_data, &rx);
        assert!(!view_data.copied);
    }

    #[test]
    fn newer_export_supersedes_older_confirmation_timer() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime {
            window: Duration::from_secs(60),
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, rx) = mpsc::channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[ctrl('e'), ctrl('e')],
        );
        assert_eq!(view_data.confirmation_token, 2);

        tx.send(InternalEvent::ExportConfirmationExpired { token: 1 })
            .expect("send stale token");
        process_internal_events(&mut view_data, &rx);
        assert!(view_data.copied);
    }

    #[test]
    fn clipboard_failure_still_shows_confirmation() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime {
            fail_clipboard: true,
            ..TestRuntime::default()
        };
        let mut view_data = ViewData::default();
        let (tx, _rx) = mpsc::channel();

        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &[ctrl('e')]);
        assert!(runtime.clipboard.is_empty());
        assert!(view_data.copied);
    }

    #[test]
    fn status_clears_only_for_current_token() {
        let mut view_data = ViewData {
            status_line: Some("row added".to_owned()),
            status_token: 3,
            ..ViewData::default()
        };
        let (tx, rx) = mpsc::channel();

        tx.send(InternalEvent::ClearStatus { token: 2 })
            .expect("send stale token");
        process_internal_events(&mut view_data, &rx);
        assert_eq!(view_data.status_line.as_deref(), Some("row added"));

        tx.send(InternalEvent::ClearStatus { token: 3 })
            .expect("send current token");
        process_internal_events(&mut view_data, &rx);
        assert_eq!(view_data.status_line, None);
    }

    #[test]
    fn question_mark_opens_help_outside_edit_mode() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = mpsc::channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Char('?'))],
        );
        assert!(view_data.help_visible);

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Esc)],
        );
        assert!(!view_data.help_visible);
    }

    #[test]
    fn status_text_reports_mode_and_message() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut view_data = focused_view(&mut state);
        assert!(status_text(&view_data).starts_with("EDIT | tab/shift+tab"));

        view_data.status_line = Some("row added".to_owned());
        view_data.cell.blur();
        assert!(status_text(&view_data).starts_with("NAV | row added |"));
    }

    #[test]
    fn suggestion_area_sits_below_the_row_and_fits_the_screen() {
        let screen = Rect::new(0, 0, 100, 24);
        let table = Rect::new(0, 3, 100, 16);
        let area = suggestion_area(table, screen, 0, 3).expect("room for suggestions");
        assert_eq!(area.y, 6);
        assert_eq!(area.height, 5);
        assert_eq!(area.x, 1);

        assert!(suggestion_area(table, screen, 40, 3).is_none());
    }

    fn numbered_rows(count: usize) -> Vec<nutritab_app::IngredientRow> {
        (0..count)
            .map(|index| unmatched_row(&format!("item {index}"), 10.0, Nutrients::ZERO))
            .collect()
    }

    #[test]
    fn scroll_offset_keeps_focused_row_visible() {
        let focus = |row| {
            Some(FocusTarget::Cell {
                row,
                column: CellColumn::Name,
            })
        };
        assert_eq!(visible_row_capacity(Rect::new(0, 3, 100, 16)), 12);
        assert_eq!(scroll_offset(5, 12, focus(4)), 0);
        assert_eq!(scroll_offset(20, 12, None), 0);
        assert_eq!(scroll_offset(20, 12, focus(11)), 0);
        assert_eq!(scroll_offset(20, 12, focus(12)), 1);
        assert_eq!(scroll_offset(20, 12, focus(19)), 8);
        assert_eq!(scroll_offset(20, 12, Some(FocusTarget::CopyButton)), 8);
        assert_eq!(scroll_offset(0, 12, Some(FocusTarget::AddButton)), 0);
    }

    #[test]
    fn long_tables_keep_totals_and_focused_row_on_screen() {
        let dataset = sample_dataset();
        let mut state = TableState::with_rows(&dataset, numbered_rows(20));
        let mut view_data = ViewData::default();

        let text = screen_text(&state, &view_data);
        assert!(text.contains("total"), "totals row missing:\n{text}");
        assert!(text.contains("item 0"));
        assert!(text.contains("ingredients 1-12 of 20"));

        set_focus(
            &mut state,
            &mut view_data,
            Some(FocusTarget::Cell {
                row: 19,
                column: CellColumn::Weight,
            }),
        );
        let text = screen_text(&state, &view_data);
        assert!(text.contains("total"), "totals row missing:\n{text}");
        assert!(text.contains("item 19"));
        assert!(!text.contains("item 7"));
        assert!(text.contains("ingredients 9-20 of 20"));
    }

    #[test]
    fn suggestions_follow_the_scrolled_row() {
        let dataset = sample_dataset();
        let mut state = TableState::with_rows(&dataset, numbered_rows(20));
        let mut runtime = TestRuntime::default();
        let mut view_data = ViewData::default();
        let (tx, _rx) = mpsc::channel();
        set_focus(
            &mut state,
            &mut view_data,
            Some(FocusTarget::Cell {
                row: 14,
                column: CellColumn::Name,
            }),
        );

        let mut keys = vec![key(KeyCode::Backspace); 7];
        keys.push(key(KeyCode::Char('h')));
        run_keys(&mut state, &mut runtime, &mut view_data, &tx, &keys);
        assert_eq!(state.rows()[14].name(), "h");

        // Offset 3 puts row 14 on screen line 3 + 2 + 11, the list opens below it.
        let text = screen_text(&state, &view_data);
        let lines = text.lines().collect::<Vec<_>>();
        assert!(lines[16].contains("h▏"), "row line: {}", lines[16]);
        assert!(lines[18].contains("Huevo"), "popup line: {}", lines[18]);
    }

    #[test]
    fn render_draws_header_rows_totals_and_actions() {
        let dataset: ReferenceDataset = sample_dataset();
        let mut state = TableState::with_rows(
            &dataset,
            vec![unmatched_row(
                "Egg",
                50.0,
                Nutrients {
                    protein: 6.0,
                    carbs: 0.5,
                    lipids: 5.0,
                    kcal: 70.0,
                },
            )],
        );
        let mut view_data = ViewData::default();
        set_focus(&mut state, &mut view_data, None);

        let text = screen_text(&state, &view_data);
        assert!(text.contains("ingredient"));
        assert!(text.contains("net weight"));
        assert!(text.contains("Egg"));
        assert!(text.contains("total"));
        assert!(text.contains("[ add row ]"));
        assert!(text.contains("[ copy to spreadsheet ]"));
        assert!(text.contains("5 reference ingredients | 1 row selected"));

        view_data.copied = true;
        let text = screen_text(&state, &view_data);
        assert!(text.contains("[ copied! ]"));
    }

    #[test]
    fn render_shows_suggestions_for_focused_name() {
        let dataset = sample_dataset();
        let mut state = TableState::new(&dataset);
        let mut runtime = TestRuntime::default();
        let mut view_data = focused_view(&mut state);
        let (tx, _rx) = mpsc::channel();

        run_keys(
            &mut state,
            &mut runtime,
            &mut view_data,
            &tx,
            &[key(KeyCode::Char('a'))],
        );
        let text = screen_text(&state, &view_data);
        assert!(text.contains("2 match"));
        assert!(text.contains("Arroz blanco"));
        assert!(text.contains("Avena"));
    }
}
