use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::session::question::{ChoiceKey, Question};
use crate::ui::theme::Theme;

/// The current question: stem, attachment markers, options. Rebuilt only on
/// navigation patches; answering repaints the selection without touching the
/// scroll offset.
pub struct QuestionView<'a> {
    pub question: &'a Question,
    /// 1-based display number.
    pub number: usize,
    pub total: usize,
    /// Committed answer (selection visual).
    pub answer: Option<ChoiceKey>,
    /// Highlighted row, as a position within the present options.
    pub cursor: usize,
    pub scroll: u16,
    pub theme: &'a Theme,
}

impl Widget for &QuestionView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" Question {}/{} ", self.number, self.total))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(Span::styled(
            self.question.question.clone(),
            Style::default().fg(colors.fg()),
        )));

        if self.question.shows_diagram() {
            let marker = match &self.question.image_path {
                Some(path) => format!("[diagram: {path}]"),
                None => "[diagram in source document]".to_string(),
            };
            lines.push(Line::from(Span::styled(
                marker,
                Style::default().fg(colors.text_dim()),
            )));
        }

        lines.push(Line::from(""));

        for (row, key) in self.question.present_options().into_iter().enumerate() {
            let selected = self.answer == Some(key);
            let on_cursor = self.cursor == row;

            let indicator = if selected { "●" } else { "○" };
            let text = match self.question.option_text(key) {
                Some(text) => text.to_string(),
                None => match self.question.option_image(key) {
                    Some(path) => format!("[image: {path}]"),
                    None => String::new(),
                },
            };

            let mut style = Style::default().fg(if selected {
                colors.option_selected()
            } else {
                colors.fg()
            });
            if selected {
                style = style.add_modifier(Modifier::BOLD);
            }
            if on_cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }

            lines.push(Line::from(Span::styled(
                format!(" {indicator} ({}) {text}", key.label()),
                style,
            )));
        }

        let paragraph = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .style(Style::default().bg(colors.bg()));
        paragraph.render(inner, buf);
    }
}
