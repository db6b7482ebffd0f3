use rand::Rng;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Circle},
        Block, Borders, Paragraph, Widget, Wrap,
    },
    Frame,
};

use tapzone::{
    clock::Clock, geometry::Point, target_field::Target, Hand, SessionPhase, TouchSession,
};

use crate::{App, ExportStatus, ZONE_SIZE};

const OVERLAY_HEIGHT: u16 = 3;
const FOOTER_HEIGHT: u16 = 1;

/// Split the screen into overlay text, the two zones side by side, and a footer
pub fn layout(area: Rect) -> (Rect, Rect, Rect, Rect) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(OVERLAY_HEIGHT),
            Constraint::Min(0),
            Constraint::Length(FOOTER_HEIGHT),
        ])
        .split(area);

    let zones = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);

    (rows[0], zones[0], zones[1], rows[2])
}

pub fn zone_rect(area: Rect, hand: Hand) -> Rect {
    let (_, left, right, _) = layout(area);
    match hand {
        Hand::Left => left,
        Hand::Right => right,
    }
}

/// Zone-local point at the middle of terminal cell (`column`, `row`), if the cell is in `rect`
pub fn cell_to_zone_point(rect: Rect, column: u16, row: u16) -> Option<Point> {
    if rect.width == 0 || rect.height == 0 {
        return None;
    }
    if column < rect.x || column >= rect.right() || row < rect.y || row >= rect.bottom() {
        return None;
    }

    let x = (f64::from(column - rect.x) + 0.5) / f64::from(rect.width) * ZONE_SIZE;
    let y = (f64::from(row - rect.y) + 0.5) / f64::from(rect.height) * ZONE_SIZE;
    Some(Point::new(x, y))
}

/// Terminal cell covering zone-local `point`
pub fn zone_point_to_cell(rect: Rect, point: Point) -> (u16, u16) {
    let col = (point.x / ZONE_SIZE * f64::from(rect.width)).floor() as u16;
    let row = (point.y / ZONE_SIZE * f64::from(rect.height)).floor() as u16;
    (
        rect.x + col.min(rect.width.saturating_sub(1)),
        rect.y + row.min(rect.height.saturating_sub(1)),
    )
}

pub fn overlay_text<C: Clock, R: Rng>(session: &TouchSession<C, R>) -> String {
    if let Some(text) = session.countdown_text() {
        return format!("⏳ {}", text);
    }

    let trial_secs = session.config().trial_secs;
    match session.phase() {
        SessionPhase::Idle => "Press space to start".to_string(),
        SessionPhase::ActiveRight => format!(
            "🖐 Tap the right circle with your right hand ({}s trial)",
            trial_secs
        ),
        SessionPhase::ActiveLeft => format!(
            "🖐 Tap the left circle with your left hand ({}s trial)",
            trial_secs
        ),
        SessionPhase::Finished => "✅ Test complete! Thank you.".to_string(),
        SessionPhase::CountdownRight | SessionPhase::CountdownLeft => String::new(),
    }
}

fn footer_line<C: Clock, R: Rng>(app: &App<C, R>) -> Line<'static> {
    let dim = Style::default().add_modifier(Modifier::DIM);
    match &app.export_status {
        Some(ExportStatus::Saved(path)) => Line::from(Span::styled(
            format!("saved {} | (esc)ape", path.display()),
            Style::default().fg(Color::Green),
        )),
        Some(ExportStatus::Failed(msg)) => Line::from(Span::styled(
            format!("export failed: {} | (s)ave again (esc)ape", msg),
            Style::default().fg(Color::Red),
        )),
        None => Line::from(Span::styled(
            format!(
                "taps: {} | (space) start (esc)ape",
                app.session.log().len()
            ),
            dim,
        )),
    }
}

/// Canvas shape of `target`, drawn at the radius taps are hit-tested with
pub fn target_circle(target: &Target, radius: f64, color: Color) -> Circle {
    // canvas y grows upward, zone y grows downward
    Circle {
        x: target.position.x,
        y: ZONE_SIZE - target.position.y,
        radius,
        color,
    }
}

fn render_zone<C: Clock, R: Rng>(
    session: &TouchSession<C, R>,
    hand: Hand,
    area: Rect,
    buf: &mut Buffer,
) {
    let (zone_color, target_color) = match hand {
        Hand::Left => (Color::Blue, Color::Red),
        Hand::Right => (Color::Green, Color::Rgb(255, 165, 0)),
    };
    let zone_color = if session.active_hand() == Some(hand) {
        zone_color
    } else {
        Color::DarkGray
    };
    let target_radius = session.config().target_radius;
    let half = ZONE_SIZE / 2.0;

    Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, ZONE_SIZE])
        .y_bounds([0.0, ZONE_SIZE])
        .paint(|ctx| {
            ctx.draw(&Circle {
                x: half,
                y: half,
                radius: half,
                color: zone_color,
            });
            for target in session.targets(hand) {
                ctx.draw(&target_circle(target, target_radius, target_color));
            }
        })
        .render(area, buf);
}

impl<C: Clock, R: Rng> Widget for &App<C, R> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (overlay, left, right, footer) = layout(area);

        Paragraph::new(Span::styled(
            overlay_text(&self.session),
            Style::default().add_modifier(Modifier::BOLD),
        ))
        .block(Block::default().borders(Borders::BOTTOM))
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .render(overlay, buf);

        render_zone(&self.session, Hand::Left, left, buf);
        render_zone(&self.session, Hand::Right, right, buf);

        Paragraph::new(footer_line(self))
            .alignment(Alignment::Center)
            .render(footer, buf);
    }
}

pub fn draw<C: Clock, R: Rng>(app: &mut App<C, R>, f: &mut Frame) {
    app.last_area = f.area();
    f.render_widget(&*app, f.area());
}
