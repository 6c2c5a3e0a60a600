use geo::Polygon;
use property_atlas::{PropertyMap, Status};
use ratatui::layout::Rect as TuiRect;
use ratatui::style::{Color, Style};
use ratatui::text::Span;
use ratatui::widgets::canvas::{Canvas, Context, Line, Points};
use ratatui::widgets::{Block, Borders};
use ratatui::Frame;

use crate::host::{MarkerKind, TerminalHost};

/// Obrys wielokąta (pierścień zewnętrzny, domknięty)
fn draw_outline(ctx: &mut Context<'_>, poly: &Polygon<f64>, color: Color) {
    let ring = &poly.exterior().0;
    for window in ring.windows(2) {
        let a = window[0];
        let b = window[1];
        ctx.draw(&Line { x1: a.x, y1: a.y, x2: b.x, y2: b.y, color });
    }
    if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
        ctx.draw(&Line { x1: last.x, y1: last.y, x2: first.x, y2: first.y, color });
    }
}

/// Rysuje mapę: granice prowincji, podświetloną prowincję, znaczniki i dymek
pub fn render(f: &mut Frame<'_>, area: TuiRect, map: &PropertyMap<TerminalHost>, title: &str, highlight: Option<&str>) {
    let host = map.provider();
    let vp = host.viewport();
    let (sw, ne) = (vp.south_west(), vp.north_east());

    let canvas = Canvas::default()
        .block(Block::default().title(title.to_string()).borders(Borders::ALL))
        .x_bounds([sw.x, ne.x])
        .y_bounds([sw.y, ne.y])
        .paint(|ctx| {
            // 1) Wszystkie granice na szaro
            if let Some(regions) = map.regions() {
                for region in regions.iter() {
                    for poly in &region.shape.0 {
                        draw_outline(ctx, poly, Color::DarkGray);
                    }
                }
                // 2) Prowincja wybranej oferty na czerwono
                if let Some(sel) = highlight {
                    for region in regions.iter().filter(|r| r.name == sel) {
                        for poly in &region.shape.0 {
                            draw_outline(ctx, poly, Color::Red);
                        }
                    }
                }
            }
            ctx.layer();

            // 3) Znaczniki
            for marker in host.markers() {
                match marker.kind {
                    MarkerKind::Single { status } => {
                        let color = match status {
                            Status::ForSale => Color::Green,
                            Status::Sold => Color::Gray,
                        };
                        ctx.draw(&Points { coords: &[(marker.at.x, marker.at.y)], color });
                    }
                    MarkerKind::Cluster { count } => {
                        ctx.print(
                            marker.at.x,
                            marker.at.y,
                            Span::styled(format!("({count})"), Style::default().fg(Color::Yellow)),
                        );
                    }
                }
            }

            // 4) Dymek
            if let Some(callout) = host.callout() {
                if let Some(at) = callout.anchor.or_else(|| callout.property.location()) {
                    ctx.print(
                        at.x,
                        at.y,
                        Span::styled(format!("◆ {}", callout.property.id), Style::default().fg(Color::Cyan)),
                    );
                }
            }
        });
    f.render_widget(canvas, area);
}
