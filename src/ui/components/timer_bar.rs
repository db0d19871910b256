use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Widget};

use crate::session::countdown::format_mmss;
use crate::ui::theme::Theme;

/// One-line header: paper label on the left, the MM:SS countdown on the
/// right. Urgent styling kicks in for the last five minutes.
pub struct TimerBar<'a> {
    pub label: &'a str,
    pub seconds_remaining: u64,
    pub urgent: bool,
    /// False in fallback mode (no attempt id).
    pub tracked: bool,
    pub theme: &'a Theme,
}

impl Widget for &TimerBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let mode = if self.tracked { "" } else { "  [untracked]" };
        let left = format!(" testarena  {}{mode}", self.label);
        let right = format!("Time Left {} ", format_mmss(self.seconds_remaining));

        let left_len = left.chars().count();
        let right_len = right.chars().count();
        let pad = (area.width as usize).saturating_sub(left_len + right_len);

        let timer_style = if self.urgent {
            Style::default()
                .fg(colors.timer_urgent())
                .bg(colors.header_bg())
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(colors.timer_fg())
                .bg(colors.header_bg())
        };

        let line = Line::from(vec![
            Span::styled(
                left,
                Style::default()
                    .fg(colors.header_fg())
                    .bg(colors.header_bg())
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" ".repeat(pad), Style::default().bg(colors.header_bg())),
            Span::styled(right, timer_style),
        ]);

        Paragraph::new(line)
            .style(Style::default().bg(colors.header_bg()))
            .render(area, buf);
    }
}
