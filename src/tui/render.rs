use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use super::{App, Focus};
use crate::view::{self, CommandView, ExecutionView, TranslationView};

/// Minimum popup size to prevent collapse
const MIN_POPUP_WIDTH: u16 = 20;
const MIN_POPUP_HEIGHT: u16 = 5;

/// Share of the width given to the history panel
const HISTORY_PANEL_PERCENT: u16 = 35;

impl App {
    pub(super) fn render(&self, f: &mut Frame) {
        let message_visible = self.controller.validation().is_some()
            || self.controller.error().is_some()
            || self.notification_message.is_some();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Length(3),
                Constraint::Length(u16::from(message_visible)),
                Constraint::Length(u16::from(self.busy.is_visible())),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(f.size());

        self.render_title(f, chunks[0]);
        self.render_query(f, chunks[1]);
        if message_visible {
            self.render_message(f, chunks[2]);
        }
        if self.busy.is_visible() {
            let progress = Paragraph::new(self.busy.display_text()).style(
                Style::default()
                    .fg(self.palette.accent.into())
                    .add_modifier(Modifier::BOLD),
            );
            f.render_widget(progress, chunks[3]);
        }

        if self.show_history {
            let panes = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([
                    Constraint::Percentage(100 - HISTORY_PANEL_PERCENT),
                    Constraint::Percentage(HISTORY_PANEL_PERCENT),
                ])
                .split(chunks[4]);
            self.render_results(f, panes[0]);
            self.render_history(f, panes[1]);
        } else {
            self.render_results(f, chunks[4]);
        }

        self.render_footer(f, chunks[5]);

        if self.focus == Focus::WorkingDirPrompt {
            self.render_working_dir_prompt(f);
        }
    }

    fn text_style(&self) -> Style {
        Style::default().fg(self.palette.text.into())
    }

    fn muted_style(&self) -> Style {
        Style::default()
            .fg(self.palette.muted.into())
            .add_modifier(Modifier::ITALIC)
    }

    fn border_style(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.palette.accent.into())
        } else {
            Style::default().fg(self.palette.muted.into())
        }
    }

    fn render_title(&self, f: &mut Frame, area: Rect) {
        let title = Line::from(vec![
            Span::styled(
                " nlcmd ",
                Style::default()
                    .fg(self.palette.background.into())
                    .bg(self.palette.accent.into())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!(
                    " {} translator · {}",
                    self.config.backend.variant.label(),
                    self.config.backend.base_url
                ),
                self.text_style(),
            ),
        ]);
        f.render_widget(Paragraph::new(title), area);
    }

    fn render_query(&self, f: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::Query;
        let input = self.controller.input();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(focused))
            .title("Query (Enter to translate)");

        let paragraph = Paragraph::new(input).style(self.text_style()).block(block);
        f.render_widget(paragraph, area);

        if focused {
            let inner_width = area.width.saturating_sub(2);
            let cursor = u16::try_from(input.width()).unwrap_or(u16::MAX).min(inner_width);
            f.set_cursor(area.x + 1 + cursor, area.y + 1);
        }
    }

    fn render_message(&self, f: &mut Frame, area: Rect) {
        let (text, color) = if let Some(validation) = self.controller.validation() {
            (validation.to_string(), self.palette.warning)
        } else if let Some(error) = self.controller.error() {
            (error.to_string(), self.palette.danger)
        } else if let Some(note) = &self.notification_message {
            (note.clone(), self.palette.command)
        } else {
            return;
        };

        let message = Paragraph::new(text).style(
            Style::default()
                .fg(color.into())
                .add_modifier(Modifier::BOLD),
        );
        f.render_widget(message, area);
    }

    fn render_results(&self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(false))
            .title("Result");

        let Some(translation) = self.controller.translation_view() else {
            let placeholder = Paragraph::new(vec![
                Line::from(""),
                Line::from("Your command will appear here"),
                Line::from(Span::styled(
                    "Type a request above and press Enter",
                    self.muted_style(),
                )),
            ])
            .alignment(ratatui::layout::Alignment::Center)
            .block(block);
            f.render_widget(placeholder, area);
            return;
        };

        let execution = self.controller.execution_view();
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints(if execution.is_some() {
                [Constraint::Percentage(55), Constraint::Percentage(45)]
            } else {
                [Constraint::Percentage(100), Constraint::Length(0)]
            })
            .split(area);

        let text = self.translation_text(&translation);
        let paragraph = Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, sections[0]);

        if let Some(execution) = execution {
            self.render_execution(f, sections[1], &execution);
        }
    }

    fn translation_text(&self, view: &TranslationView) -> Text<'static> {
        let mut lines: Vec<Line<'static>> = Vec::new();
        let heading = Style::default()
            .fg(self.palette.accent.into())
            .add_modifier(Modifier::BOLD);

        let command_style = match view.command {
            CommandView::Command(_) => Style::default()
                .fg(self.palette.command.into())
                .add_modifier(Modifier::BOLD),
            CommandView::CredentialsRequired => Style::default()
                .fg(self.palette.danger.into())
                .add_modifier(Modifier::BOLD),
        };
        let mut command_line = vec![
            Span::styled("$ ", self.muted_style()),
            Span::styled(view.command.text().to_string(), command_style),
        ];
        if let Some((level, severity)) = view.risk {
            command_line.push(Span::styled(
                format!("  [risk {level}]"),
                Style::default().fg(self.palette.severity(severity).into()),
            ));
        }
        lines.push(Line::from(command_line));
        lines.push(Line::from(""));

        if let Some(safety) = &view.safety {
            lines.push(Line::from(Span::styled(
                format!("{} {}", safety.severity.icon(), safety.text),
                Style::default()
                    .fg(self.palette.severity(safety.severity).into())
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(""));
        }

        lines.push(Line::from(Span::styled("Explanation", heading)));
        lines.push(Line::from(Span::styled(
            view.explanation.clone(),
            self.text_style(),
        )));
        lines.push(Line::from(""));

        lines.push(Line::from(Span::styled("Breakdown", heading)));
        match &view.breakdown {
            Ok(rows) => {
                for (component, explanation) in rows {
                    lines.push(Line::from(vec![
                        Span::styled(
                            format!("  {component}"),
                            Style::default()
                                .fg(self.palette.accent.into())
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(format!("  {explanation}"), self.text_style()),
                    ]));
                }
            }
            Err(placeholder) => {
                lines.push(Line::from(Span::styled(*placeholder, self.muted_style())));
            }
        }

        if let Some(simulation) = &view.simulation {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Simulated output", heading)));
            for line in simulation.lines() {
                lines.push(Line::from(Span::styled(
                    line.to_string(),
                    Style::default().fg(self.palette.muted.into()),
                )));
            }
        }

        Text::from(lines)
    }

    fn render_execution(&self, f: &mut Frame, area: Rect, view: &ExecutionView) {
        let status_color = view
            .status
            .severity()
            .map_or(self.palette.text, |s| self.palette.severity(s));

        let mut title = vec![
            Span::raw("Execution "),
            Span::styled(
                format!("[{}]", view.status.label()),
                Style::default()
                    .fg(status_color.into())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw(" exit "),
            Span::styled(
                view.exit_code.clone(),
                Style::default().fg(self.palette.exit_code(view.exit_style).into()),
            ),
        ];
        if let Some(duration) = &view.duration {
            title.push(Span::raw(format!(" · {duration}")));
        }

        let mut lines: Vec<Line> = view
            .header
            .iter()
            .map(|l| Line::from(Span::styled(l.as_str(), self.muted_style())))
            .collect();
        let body_style = if view.body_is_placeholder {
            self.muted_style()
        } else {
            self.text_style()
        };
        lines.extend(view.body.lines().map(|l| Line::from(Span::styled(l, body_style))));

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(false))
            .title(Line::from(title));
        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }

    fn render_history(&self, f: &mut Frame, area: Rect) {
        let focused = self.focus == Focus::History;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(focused))
            .title(format!(
                "History {}/{} (Tab)",
                self.controller.history().len(),
                self.controller.history().limit()
            ));

        let groups = self.controller.history().grouped_by_day();
        if groups.is_empty() {
            let empty = Paragraph::new(Span::styled(view::EMPTY_HISTORY, self.muted_style()))
                .block(block);
            f.render_widget(empty, area);
            return;
        }

        let mut items: Vec<ListItem> = Vec::new();
        let mut selected_row = None;
        let mut entry_index = 0;
        for group in &groups {
            items.push(ListItem::new(Line::from(Span::styled(
                group.date.format("%Y-%m-%d").to_string(),
                Style::default()
                    .fg(self.palette.accent.into())
                    .add_modifier(Modifier::UNDERLINED),
            ))));
            for entry in &group.entries {
                if entry_index == self.history_selected {
                    selected_row = Some(items.len());
                }
                entry_index += 1;

                let local = entry.timestamp.with_timezone(&chrono::Local);
                let severity = view::Severity::from_risk_level(Some(entry.risk_level));
                let mut meta = vec![
                    Span::styled(local.format("%H:%M").to_string(), self.muted_style()),
                    Span::styled(
                        format!(" risk {}", entry.risk_level),
                        Style::default().fg(self.palette.severity(severity).into()),
                    ),
                ];
                if entry.is_favorite {
                    meta.push(Span::styled(
                        " ★",
                        Style::default().fg(self.palette.warning.into()),
                    ));
                }
                items.push(ListItem::new(vec![
                    Line::from(Span::styled(entry.query.clone(), self.text_style())),
                    Line::from(Span::styled(
                        format!("  {}", entry.command),
                        Style::default().fg(self.palette.command.into()),
                    )),
                    Line::from(meta),
                ]));
            }
        }

        let list = List::new(items).block(block).highlight_style(
            Style::default()
                .bg(Color::Rgb(0x3A, 0x2A, 0x2A))
                .add_modifier(Modifier::BOLD),
        );
        let mut state = ListState::default();
        if focused {
            state.select(selected_row);
        }
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_footer(&self, f: &mut Frame, area: Rect) {
        let hints = format!(
            "Enter translate · {} execute · {} copy · {} favorite · {} history · {} clear · Ctrl+C quit",
            self.config.keybindings.execute,
            self.config.keybindings.copy,
            self.config.keybindings.favorite,
            self.config.keybindings.toggle_history,
            self.config.keybindings.clear,
        );
        let mut spans = vec![Span::styled(hints, self.muted_style())];

        if let Some(signature) = self
            .controller
            .translation_view()
            .and_then(|v| v.signature)
        {
            spans.push(Span::styled(
                format!("  Signature: {signature}"),
                Style::default().fg(self.palette.muted.into()),
            ));
        }
        if let Some(watermark) = &self.watermark {
            spans.push(Span::styled(
                format!("  {}", watermark.footer()),
                Style::default().fg(self.palette.muted.into()),
            ));
        }

        f.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_working_dir_prompt(&self, f: &mut Frame) {
        let area = centered_popup(f.size(), 70, 5);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(self.border_style(true))
            .title("Working Directory (Enter to execute, Esc to cancel)");

        let paragraph = Paragraph::new(vec![
            Line::from(Span::styled(
                self.working_dir_input.as_str(),
                self.text_style(),
            )),
            Line::from(Span::styled(
                "Leave empty to use the server default",
                self.muted_style(),
            )),
        ])
        .block(block);

        f.render_widget(Clear, area);
        f.render_widget(paragraph, area);

        let cursor = u16::try_from(self.working_dir_input.width())
            .unwrap_or(u16::MAX)
            .min(area.width.saturating_sub(2));
        f.set_cursor(area.x + 1 + cursor, area.y + 1);
    }
}

/// Create a centered popup area with minimum size guarantees
#[must_use]
fn centered_popup(parent: Rect, max_width: u16, max_height: u16) -> Rect {
    let width = parent.width.min(max_width).max(MIN_POPUP_WIDTH);
    let height = parent.height.min(max_height).max(MIN_POPUP_HEIGHT);

    // If parent is too small, just use parent size
    let width = width.min(parent.width);
    let height = height.min(parent.height);

    let x = parent.width.saturating_sub(width) / 2;
    let y = parent.height.saturating_sub(height) / 2;
    Rect {
        x: parent.x + x,
        y: parent.y + y,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_popup_fits_parent() {
        let parent = Rect::new(0, 0, 100, 40);
        let popup = centered_popup(parent, 70, 5);
        assert_eq!(popup, Rect::new(15, 17, 70, 5));

        let tiny = Rect::new(0, 0, 10, 3);
        let popup = centered_popup(tiny, 70, 5);
        assert_eq!(popup.width, 10);
        assert_eq!(popup.height, 3);
    }
}
