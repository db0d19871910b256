use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::api::SubmitOutcome;
use crate::session::countdown::format_mmss;
use crate::session::submission::FallbackSummary;
use crate::ui::theme::Theme;

pub enum SummaryContent<'a> {
    /// Server acknowledged the finalize.
    Confirmed {
        attempt_id: i64,
        outcome: &'a SubmitOutcome,
    },
    /// Finalize failed on a non-auth error; the session still ends here, but
    /// the user is told the server never acknowledged it.
    Unconfirmed { attempt_id: i64, detail: &'a str },
    /// Untracked attempt: local counts only.
    Fallback {
        summary: FallbackSummary,
        saved_locally: bool,
    },
}

pub struct SummaryView<'a> {
    pub content: SummaryContent<'a>,
    pub theme: &'a Theme,
}

impl SummaryView<'_> {
    fn stat(label: &str, value: String, style: Style) -> Line<'static> {
        Line::from(vec![
            Span::raw(format!("  {label:<14}")),
            Span::styled(value, style),
        ])
    }
}

impl Widget for &SummaryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Result ")
            .border_style(Style::default().fg(colors.border_focused()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let fg = Style::default().fg(colors.fg());
        let dim = Style::default().fg(colors.text_dim());
        let bold = |c| Style::default().fg(c).add_modifier(Modifier::BOLD);

        let mut lines: Vec<Line> = vec![Line::from("")];
        match &self.content {
            SummaryContent::Confirmed {
                attempt_id,
                outcome,
            } => {
                lines.push(Line::from(Span::styled(
                    format!("Attempt #{attempt_id} submitted"),
                    bold(colors.success()),
                )));
                lines.push(Line::from(""));
                lines.push(SummaryView::stat(
                    "Score",
                    format!("{:.1}", outcome.score),
                    bold(colors.accent()),
                ));
                lines.push(SummaryView::stat(
                    "Correct",
                    outcome.correct.to_string(),
                    Style::default().fg(colors.success()),
                ));
                lines.push(SummaryView::stat(
                    "Wrong",
                    outcome.wrong.to_string(),
                    Style::default().fg(colors.error()),
                ));
                lines.push(SummaryView::stat(
                    "Unanswered",
                    outcome.unanswered.to_string(),
                    dim,
                ));
                lines.push(SummaryView::stat(
                    "Total time",
                    format_mmss(outcome.total_time),
                    fg,
                ));
            }
            SummaryContent::Unconfirmed { attempt_id, detail } => {
                lines.push(Line::from(Span::styled(
                    "Submission not confirmed",
                    bold(colors.warning()),
                )));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(
                    format!("  Attempt #{attempt_id}: the server did not acknowledge"),
                    fg,
                )));
                lines.push(Line::from(Span::styled(
                    "  the final answers and may still list it as ongoing.",
                    fg,
                )));
                lines.push(Line::from(""));
                lines.push(Line::from(Span::styled(format!("  {detail}"), dim)));
            }
            SummaryContent::Fallback {
                summary,
                saved_locally,
            } => {
                lines.push(Line::from(Span::styled(
                    "Untracked attempt (local summary)",
                    bold(colors.warning()),
                )));
                lines.push(Line::from(""));
                lines.push(SummaryView::stat(
                    "Questions",
                    summary.total.to_string(),
                    fg,
                ));
                lines.push(SummaryView::stat(
                    "Attempted",
                    summary.attempted.to_string(),
                    Style::default().fg(colors.success()),
                ));
                lines.push(SummaryView::stat(
                    "Unanswered",
                    summary.unanswered.to_string(),
                    dim,
                ));
                if *saved_locally {
                    lines.push(Line::from(""));
                    lines.push(Line::from(Span::styled("  Saved to local history.", dim)));
                }
            }
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("[q] Quit", dim)).alignment(Alignment::Center));

        Paragraph::new(lines)
            .style(Style::default().bg(colors.bg()))
            .render(inner, buf);
    }
}
