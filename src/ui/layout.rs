use ratatui::layout::{Constraint, Direction, Layout, Rect};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutTier {
    Wide,   // ≥100 cols: question area + palette sidebar
    Medium, // 60-99 cols: full-width question, palette strip below
    Narrow, // <60 cols: question only, palette strip collapses to one row
}

impl LayoutTier {
    pub fn from_area(area: Rect) -> Self {
        if area.width >= 100 {
            LayoutTier::Wide
        } else if area.width >= 60 {
            LayoutTier::Medium
        } else {
            LayoutTier::Narrow
        }
    }

    pub fn palette_sidebar(&self) -> bool {
        *self == LayoutTier::Wide
    }

    fn palette_strip_height(&self, height: u16) -> u16 {
        match self {
            LayoutTier::Wide => 0,
            LayoutTier::Medium if height >= 18 => 6,
            _ => 3,
        }
    }
}

/// Exam-screen frame: timer header, question area, the palette (sidebar on
/// wide terminals, strip below otherwise), key-hint footer.
pub struct ExamLayout {
    pub header: Rect,
    pub question: Rect,
    pub palette: Rect,
    pub footer: Rect,
    pub tier: LayoutTier,
}

impl ExamLayout {
    pub fn new(area: Rect) -> Self {
        let tier = LayoutTier::from_area(area);

        if tier.palette_sidebar() {
            let vertical = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Min(10),
                    Constraint::Length(2),
                ])
                .split(area);
            let horizontal = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(68), Constraint::Percentage(32)])
                .split(vertical[1]);

            Self {
                header: vertical[0],
                question: horizontal[0],
                palette: horizontal[1],
                footer: vertical[2],
                tier,
            }
        } else {
            let strip = tier.palette_strip_height(area.height);
            let vertical = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(1),
                    Constraint::Min(6),
                    Constraint::Length(strip),
                    Constraint::Length(2),
                ])
                .split(area);

            Self {
                header: vertical[0],
                question: vertical[1],
                palette: vertical[2],
                footer: vertical[3],
                tier,
            }
        }
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    const MIN_POPUP_WIDTH: u16 = 50;
    const MIN_POPUP_HEIGHT: u16 = 12;

    let requested_w = area.width.saturating_mul(percent_x.min(100)) / 100;
    let requested_h = area.height.saturating_mul(percent_y.min(100)) / 100;

    let target_w = requested_w.max(MIN_POPUP_WIDTH).min(area.width);
    let target_h = requested_h.max(MIN_POPUP_HEIGHT).min(area.height);

    let left = area
        .x
        .saturating_add((area.width.saturating_sub(target_w)) / 2);
    let top = area
        .y
        .saturating_add((area.height.saturating_sub(target_h)) / 2);

    Rect::new(left, top, target_w, target_h)
}
