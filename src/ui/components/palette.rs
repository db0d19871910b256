use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::session::attempt::AttemptState;
use crate::session::status::QuestionStatus;
use crate::ui::theme::Theme;

/// The per-question status grid. Every cell's status is resolved at render
/// time from the attempt flags.
pub struct PaletteGrid<'a> {
    pub attempt: &'a AttemptState,
    pub theme: &'a Theme,
    /// Strip mode: drop the legend when vertical space is tight.
    pub compact: bool,
}

const CELL_WIDTH: usize = 4;

impl Widget for &PaletteGrid<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Palette ")
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let columns = (inner.width as usize / CELL_WIDTH).max(1);
        let current = self.attempt.current_index();

        let mut lines: Vec<Line> = Vec::new();
        let mut row: Vec<Span> = Vec::new();
        for index in 0..self.attempt.question_count() {
            let status = self
                .attempt
                .status_at(index)
                .unwrap_or(QuestionStatus::NotVisited);
            let mut style = Style::default().fg(colors.status_color(status));
            if index == current {
                style = style.add_modifier(Modifier::BOLD | Modifier::REVERSED);
            }
            row.push(Span::styled(format!("{:>3} ", index + 1), style));
            if row.len() == columns {
                lines.push(Line::from(std::mem::take(&mut row)));
            }
        }
        if !row.is_empty() {
            lines.push(Line::from(row));
        }

        if !self.compact && (lines.len() + 3) <= inner.height as usize {
            lines.push(Line::from(""));
            let legend = [
                (QuestionStatus::Answered, "answered"),
                (QuestionStatus::Marked, "marked"),
                (QuestionStatus::AnsweredMarked, "ans+mark"),
                (QuestionStatus::Visited, "visited"),
                (QuestionStatus::NotVisited, "not seen"),
            ];
            let mut legend_line: Vec<Span> = Vec::new();
            for (status, label) in legend {
                legend_line.push(Span::styled(
                    "■ ",
                    Style::default().fg(colors.status_color(status)),
                ));
                legend_line.push(Span::styled(
                    format!("{label}  "),
                    Style::default().fg(colors.text_dim()),
                ));
            }
            lines.push(Line::from(legend_line));
        }

        Paragraph::new(lines)
            .style(Style::default().bg(colors.bg()))
            .render(inner, buf);
    }
}
