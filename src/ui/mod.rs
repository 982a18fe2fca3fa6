mod components;

use std::sync::OnceLock;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};

use crate::app::{App, Popup};
use crate::config::ThemeConfig;
use crate::form::ItemForm;
use crate::item::ItemType;
use crate::notify::Level;
use crate::theme::Theme;

use components::{centered_rect, field_lines, money, scroll_offset};

// Theme is built from config once at startup
static THEME: OnceLock<Theme> = OnceLock::new();

pub fn init_theme(config: &ThemeConfig) {
    let _ = THEME.set(Theme::from_config(config));
}

fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}

// Helper functions to get theme colors
fn accent() -> Color { theme().accent }
fn inactive() -> Color { theme().inactive }
fn success() -> Color { theme().success }
fn warning() -> Color { theme().warning }
fn danger() -> Color { theme().danger }
fn text() -> Color { theme().text }
fn text_dim() -> Color { theme().text_dim }
fn bg_selected() -> Color { theme().bg_selected }
fn header() -> Color { theme().header }

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(0)
        .constraints([
            Constraint::Length(1), // Info line
            Constraint::Min(8),    // Inventory or form
            Constraint::Length(1), // Footer
        ])
        .split(f.area());

    draw_info_line(f, app, chunks[0]);
    match &app.form {
        Some(form) => draw_form(f, form, chunks[1]),
        None => draw_inventory(f, app, chunks[1]),
    }
    draw_footer(f, app, chunks[2]);

    // Draw popups on top
    match app.popup {
        Popup::None => {}
        Popup::Help => draw_help_popup(f),
        Popup::ConfirmDiscard => draw_confirm_popup(f),
    }
}

fn draw_info_line(f: &mut Frame, app: &App, area: Rect) {
    // Priority: status message > low stock summary > item count
    let line = if let Some(status) = &app.status.message {
        let color = match status.level {
            Level::Info => warning(),
            Level::Success => success(),
            Level::Error => danger(),
        };
        Line::from(Span::styled(status.text.as_str(), Style::default().fg(color)))
    } else {
        let low = app.low_stock_count();
        let mut spans = vec![Span::styled(
            format!("{} items", app.items.len()),
            Style::default().fg(text_dim()),
        )];
        if low > 0 {
            spans.push(Span::styled(" │ ", Style::default().fg(inactive())));
            spans.push(Span::styled(
                format!("⚠ {} low on stock", low),
                Style::default().fg(warning()),
            ));
        }
        Line::from(spans)
    };

    let info = Paragraph::new(line).alignment(Alignment::Center);
    f.render_widget(info, area);
}

fn draw_inventory(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(Span::styled(
            " Inventory ",
            Style::default().fg(accent()).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));

    // Responsive columns based on width
    let wide = area.width > 90;

    let header_cells = if wide {
        vec!["", "Name", "Type", "Price", "GST", "Stock", "Category"]
    } else {
        vec!["", "Name", "Price", "Stock"]
    };
    let header_row = Row::new(
        header_cells
            .into_iter()
            .map(|h| Span::styled(h, Style::default().fg(header())))
            .collect::<Vec<_>>(),
    );

    let rows: Vec<Row> = if app.items.is_empty() {
        vec![
            Row::new(vec![Span::raw(""), Span::styled("No items yet", Style::default().fg(text_dim()))]),
            Row::new(vec![
                Span::raw(""),
                Span::styled("Press 'n' for a product, 's' for a service", Style::default().fg(accent())),
            ]),
        ]
    } else {
        app.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let (icon, icon_color) = match item.item_type {
                    ItemType::Product if item.is_low_stock() => ("󰏗", warning()),
                    ItemType::Product => ("󰏗", success()),
                    ItemType::Service => ("󰖷", accent()),
                };

                let (stock, stock_color) = match item.item_type {
                    ItemType::Service => ("-".to_string(), text_dim()),
                    ItemType::Product => {
                        let color = if item.is_low_stock() { warning() } else { text() };
                        (format!("{} {}", item.stock_quantity, item.unit.code()), color)
                    }
                };

                let row_style = if i == app.selected_item {
                    Style::default().bg(bg_selected()).fg(text())
                } else {
                    Style::default()
                };

                let cells = if wide {
                    vec![
                        Span::styled(icon, Style::default().fg(icon_color)),
                        Span::styled(item.name.as_str(), Style::default().fg(text())),
                        Span::styled(item.item_type.label(), Style::default().fg(text_dim())),
                        Span::styled(money(item.price), Style::default().fg(text())),
                        Span::styled(item.gst_rate.to_string(), Style::default().fg(text_dim())),
                        Span::styled(stock, Style::default().fg(stock_color)),
                        Span::styled(item.category.as_str(), Style::default().fg(text_dim())),
                    ]
                } else {
                    vec![
                        Span::styled(icon, Style::default().fg(icon_color)),
                        Span::styled(item.name.as_str(), Style::default().fg(text())),
                        Span::styled(money(item.price), Style::default().fg(text())),
                        Span::styled(stock, Style::default().fg(stock_color)),
                    ]
                };
                Row::new(cells).style(row_style)
            })
            .collect()
    };

    let widths = if wide {
        vec![
            Constraint::Length(3),
            Constraint::Percentage(35),
            Constraint::Percentage(10),
            Constraint::Percentage(13),
            Constraint::Percentage(8),
            Constraint::Percentage(12),
            Constraint::Percentage(20),
        ]
    } else {
        vec![
            Constraint::Length(3),
            Constraint::Percentage(50),
            Constraint::Percentage(22),
            Constraint::Percentage(25),
        ]
    };

    let table = Table::new(rows, widths)
        .header(header_row.style(Style::default()))
        .block(block);

    f.render_widget(table, area);
}

fn draw_form(f: &mut Frame, form: &ItemForm, area: Rect) {
    let title = match (form.is_edit(), form.item_type()) {
        (true, _) => " Edit Item ".to_string(),
        (false, t) => format!(" New {} ", t.label()),
    };
    let mut title_spans = vec![Span::styled(
        title,
        Style::default().fg(accent()).add_modifier(Modifier::BOLD),
    )];
    if form.is_submitting() {
        title_spans.push(Span::styled(" 󰔟 Saving... ", Style::default().fg(warning())));
    } else if form.is_dirty() {
        title_spans.push(Span::styled("● ", Style::default().fg(warning())));
    }

    let block = Block::default()
        .title(Line::from(title_spans))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(accent()));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Min(3)])
        .split(inner);

    // Tab bar; a tab title turns red when one of its fields has an error
    let tabs = form.visible_tabs();
    let titles: Vec<Line> = tabs
        .iter()
        .map(|tab| {
            let has_error = tab.fields().iter().any(|fld| form.errors().contains(*fld));
            let color = if has_error { danger() } else { text_dim() };
            Line::from(Span::styled(format!(" {} ", tab.label()), Style::default().fg(color)))
        })
        .collect();
    let selected = tabs.iter().position(|t| *t == form.tab()).unwrap_or(0);
    let tab_bar = Tabs::new(titles)
        .select(selected)
        .highlight_style(Style::default().fg(accent()).add_modifier(Modifier::BOLD | Modifier::UNDERLINED))
        .divider(Span::styled("│", Style::default().fg(inactive())))
        .block(Block::default().borders(Borders::BOTTOM).border_style(Style::default().fg(inactive())));
    f.render_widget(tab_bar, chunks[0]);

    // Two lines per field: value, then its error (or blank)
    let fields = form.tab().fields();
    let lines: Vec<Line> = fields
        .iter()
        .flat_map(|field| field_lines(form, *field, theme()))
        .collect();

    // Keep the focused field on screen when the tab is taller than the body
    let focus_idx = fields
        .iter()
        .position(|fld| *fld == form.focused_field())
        .unwrap_or(0);
    let offset = scroll_offset(focus_idx, chunks[1].height);

    let body = Paragraph::new(lines).scroll((offset, 0));
    f.render_widget(body, chunks[1]);
}

fn draw_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints: Vec<(&str, &str)> = if app.form.is_some() {
        vec![
            ("Tab", "Field"),
            ("PgDn", "Tab"),
            ("Space", "Cycle"),
            ("F2", "Save"),
            ("F3", "Save & New"),
            ("Esc", "Back"),
            ("F1", "Help"),
        ]
    } else {
        vec![
            ("↑↓", "Nav"),
            ("n", "Product"),
            ("s", "Service"),
            ("Enter", "Edit"),
            ("R", "Reload"),
            ("h", "Help"),
            ("q", "Quit"),
        ]
    };

    // Responsive: show fewer hints on narrow terminals
    let max_hints = if area.width < 60 { 4 } else if area.width < 80 { 5 } else { hints.len() };

    let hint_spans: Vec<Span> = hints
        .iter()
        .take(max_hints)
        .flat_map(|(key, action)| {
            vec![
                Span::styled(*key, Style::default().fg(accent())),
                Span::styled(format!(" {} │ ", action), Style::default().fg(text_dim())),
            ]
        })
        .collect();

    let footer = Paragraph::new(Line::from(hint_spans)).alignment(Alignment::Center);
    f.render_widget(footer, area);
}

fn draw_help_popup(f: &mut Frame) {
    let area = f.area();
    let popup_area = centered_rect(
        if area.width < 80 { 95 } else { 70 },
        if area.height < 40 { 95 } else { 80 },
        area,
    );

    f.render_widget(Clear, popup_area);

    let section = |title: &'static str| {
        Line::from(Span::styled(
            format!("═══ {} ═══", title),
            Style::default().fg(header()).add_modifier(Modifier::BOLD),
        ))
    };
    let entry = |key: &'static str, what: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", key), Style::default().fg(accent())),
            Span::raw(what),
        ])
    };

    let help_text = vec![
        section("Inventory"),
        entry("↑/↓ j/k", "Move up/down in the list"),
        entry("n", "New product"),
        entry("s", "New service"),
        entry("Enter/e", "Edit selected item"),
        entry("R", "Reload items from the store"),
        entry("q", "Quit"),
        Line::from(""),
        section("Item Form"),
        entry("Tab/↓", "Next field"),
        entry("S-Tab/↑", "Previous field"),
        entry("PgDn/PgUp", "Next/previous tab (Stock is for products only)"),
        entry("Space/←/→", "Cycle a selector (type, unit, GST, tax, discount)"),
        entry("F2/Ctrl+S", "Save and return"),
        entry("F3/Ctrl+N", "Save and start another item of the same type"),
        entry("Esc", "Back (asks first if there are unsaved changes)"),
        Line::from(""),
        section("Command Line"),
        entry("--list", "Print all items as JSON"),
        entry("--new", "Open the new item form (add --service for a service)"),
        entry("--edit <id>", "Open the edit form for an item"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", Style::default().fg(text_dim())),
            Span::styled("Esc", Style::default().fg(accent())),
            Span::styled(" to close", Style::default().fg(text_dim())),
        ]),
    ];

    let help = Paragraph::new(help_text)
        .block(
            Block::default()
                .title(Span::styled(" 󰋖 stockbook Help ", Style::default().fg(accent())))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(accent())),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(help, popup_area);
}

fn draw_confirm_popup(f: &mut Frame) {
    let popup_area = centered_rect(40, 20, f.area());

    f.render_widget(Clear, popup_area);

    let confirm = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("Discard unsaved changes?", Style::default().fg(warning()))),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y", Style::default().fg(success()).add_modifier(Modifier::BOLD)),
            Span::raw(" Discard   "),
            Span::styled("n", Style::default().fg(danger()).add_modifier(Modifier::BOLD)),
            Span::raw(" Keep editing"),
        ]),
    ])
    .block(
        Block::default()
            .title(Span::styled(" Confirm ", Style::default().fg(warning())))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(warning())),
    )
    .alignment(Alignment::Center);

    f.render_widget(confirm, popup_area);
}
