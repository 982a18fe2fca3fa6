//! Small rendering helpers shared by the screens in `mod.rs`

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
};
use rust_decimal::Decimal;

use crate::form::ItemForm;
use crate::item::Field;
use crate::theme::Theme;

const LABEL_WIDTH: usize = 18;

/// Rupee amount with two decimals
pub fn money(amount: Decimal) -> String {
    format!("₹{:.2}", amount)
}

/// Label + value line and an error line for one form field
pub fn field_lines(form: &ItemForm, field: Field, theme: &Theme) -> [Line<'static>; 2] {
    let focused = form.focused_field() == field && !form.is_submitting();
    let error = form.errors().get(field);

    let label_style = match (focused, error.is_some()) {
        (_, true) => Style::default().fg(theme.danger),
        (true, false) => Style::default().fg(theme.accent).add_modifier(Modifier::BOLD),
        (false, false) => Style::default().fg(theme.header),
    };
    let marker = if focused { "▸ " } else { "  " };

    let value = form.display_value(field);
    let mut spans = vec![
        Span::styled(marker, Style::default().fg(theme.accent)),
        Span::styled(format!("{:<width$}", field.label(), width = LABEL_WIDTH), label_style),
    ];

    if field.is_selector() {
        let arrow = Style::default().fg(if focused { theme.accent } else { theme.inactive });
        spans.push(Span::styled("◂ ", arrow));
        spans.push(Span::styled(value, Style::default().fg(theme.text)));
        spans.push(Span::styled(" ▸", arrow));
    } else {
        let value_style = if focused {
            Style::default().fg(theme.text).bg(theme.bg_selected)
        } else {
            Style::default().fg(theme.text)
        };
        let shown = if value.is_empty() && !focused { "-".to_string() } else { value };
        spans.push(Span::styled(shown, value_style));
        if focused {
            spans.push(Span::styled("_", Style::default().fg(theme.accent)));
        }
    }

    let error_line = match error {
        Some(msg) => Line::from(vec![
            Span::raw(" ".repeat(LABEL_WIDTH + 2)),
            Span::styled(format!("⚠ {}", msg), Style::default().fg(theme.danger)),
        ]),
        None => Line::from(""),
    };

    [Line::from(spans), error_line]
}

/// First body row to show so the focused field and its error line fit in `height`
pub fn scroll_offset(focus_idx: usize, height: u16) -> u16 {
    let needed = (focus_idx as u16 + 1) * 2;
    needed.saturating_sub(height)
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FormDefaults;
    use crate::form::SubmitMode;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_money_format() {
        assert_eq!(money(Decimal::new(4105, 1)), "₹410.50");
        assert_eq!(money(Decimal::ZERO), "₹0.00");
    }

    #[test]
    fn test_field_lines_show_error() {
        let mut form = ItemForm::new(None, &FormDefaults::default());
        assert!(form.begin_submit(SubmitMode::Save).is_err());

        let [value, error] = field_lines(&form, Field::Name, &Theme::default());
        assert!(line_text(&value).contains("Item Name *"));
        assert!(line_text(&error).contains("Item name is required"));
    }

    #[test]
    fn test_selector_rendered_with_arrows() {
        let form = ItemForm::new(None, &FormDefaults::default());
        let [value, error] = field_lines(&form, Field::GstRate, &Theme::default());
        assert!(line_text(&value).contains("◂ GST @ 18% ▸"));
        assert!(line_text(&error).is_empty());
    }

    #[test]
    fn test_scroll_offset() {
        assert_eq!(scroll_offset(0, 16), 0);
        assert_eq!(scroll_offset(7, 16), 0);
        assert_eq!(scroll_offset(8, 16), 2);
        assert_eq!(scroll_offset(8, 0), 18);
    }

    #[test]
    fn test_centered_rect_inside_parent() {
        let parent = Rect::new(0, 0, 100, 50);
        let popup = centered_rect(40, 20, parent);
        assert_eq!(popup.width, 40);
        assert_eq!(popup.height, 10);
        assert!(popup.x >= 30 && popup.y >= 20);
    }
}
