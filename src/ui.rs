use ratatui::{
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use property_atlas::{DetailMode, Property, Source, Status};
use crate::map_draw;
use crate::state::AppState;

/// Cena w batach, skrócona do mln / tys.
pub fn format_price(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("{:.2} mln THB", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.1} tys. THB", value / 1_000.0)
    } else {
        format!("{:.0} THB", value)
    }
}

fn detail_text(state: &AppState, p: &Property) -> String {
    let status = match p.status {
        Status::ForSale => "na sprzedaż",
        Status::Sold => "sprzedana",
    };
    let source = match p.source {
        Source::Internal => "wewnętrzne",
        Source::External => "zewnętrzne",
    };
    let region = state
        .map
        .region_of(p)
        .map(|r| r.name.clone())
        .unwrap_or_else(|| "—".to_string());
    format!(
        "{}\nCena: {}\nStatus: {}\nŹródło: {}\nProwincja: {}\n{:.4}, {:.4}",
        p.id,
        format_price(p.price),
        status,
        source,
        region,
        p.lat,
        p.lng
    )
}

pub fn draw<'a>(f: &mut Frame<'a>, state: &mut AppState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(20),
            Constraint::Percentage(60),
            Constraint::Percentage(20),
        ].as_ref())
        .split(f.area());

    // Lewy panel: lista ofert
    let items: Vec<ListItem> = state.list_items
        .iter()
        .map(|id| {
            let price = state.list_property(id).map(|p| format_price(p.price)).unwrap_or_default();
            ListItem::new(format!("{id}  {price}"))
        })
        .collect();
    let mut list_state = ListState::default();
    list_state.select(Some(state.selected));
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!("Oferty ({})", state.filter.label())))
        .highlight_symbol(">> ")
        .highlight_style(Style::default().fg(Color::Red));
    f.render_stateful_widget(list, chunks[0], &mut list_state);

    // Środek: mapa z podświetloną prowincją wybranej oferty
    let highlight = state
        .selected_property()
        .and_then(|p| state.map.region_of(p))
        .map(|r| r.name.clone());
    let title = match state.map.mode() {
        Some(DetailMode::Clustered) => "Mapa – klastry",
        Some(DetailMode::Individual) => "Mapa – oferty",
        None => "Mapa",
    };
    map_draw::render(f, chunks[1], &state.map, title, highlight.as_deref());

    // Prawy panel: Informacje + Szczegóły + Pomoc
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(35),
            Constraint::Percentage(30),
        ].as_ref())
        .split(chunks[2]);

    // — Informacje
    let stats = state.map.stats();
    let camera = state.map.provider().camera();
    let mut info_text = format!(
        "Zoom: {:.1}\nKlastry: {}\nPojedyncze: {}\nZnaczniki: {}\nPrzeliczenia: {}\nOstatnio: +{} / -{}",
        camera.zoom,
        stats.clusters,
        stats.singles,
        state.map.markers().len(),
        stats.recomputations,
        stats.last_report.created,
        stats.last_report.removed,
    );
    if state.map.regions().is_none() {
        info_text.push_str("\nGranice prowincji niedostępne");
    }
    if let Some(msg) = &state.message {
        info_text.push_str(&format!("\n{msg}"));
    }
    let info_paragraph = Paragraph::new(info_text)
        .block(Block::default().borders(Borders::ALL).title("Informacje"))
        .wrap(Wrap { trim: true });
    f.render_widget(info_paragraph, right_chunks[0]);

    // — Szczegóły (dymek)
    let detail = match state.map.provider().callout() {
        Some(callout) => detail_text(state, &callout.property),
        None if state.map.selection().state().is_moving() => "Lecę do oferty…".to_string(),
        None => "Wybierz ofertę, aby zobaczyć szczegóły".to_string(),
    };
    let detail_paragraph = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title("Szczegóły"))
        .style(Style::default().fg(Color::White))
        .wrap(Wrap { trim: true });
    f.render_widget(detail_paragraph, right_chunks[1]);

    // — Pomoc
    let help_paragraph = Paragraph::new(AppState::HELP_TEXT)
        .block(Block::default().borders(Borders::ALL).title("Klawisze"))
        .wrap(Wrap { trim: true });
    f.render_widget(help_paragraph, right_chunks[2]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_are_shortened() {
        assert_eq!(format_price(2_500_000.0), "2.50 mln THB");
        assert_eq!(format_price(850_000.0), "850.0 tys. THB");
        assert_eq!(format_price(999.0), "999 THB");
    }
}
