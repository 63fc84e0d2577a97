//! Rendering of the admin console. Everything here is read-only over the
//! page state; key handling lives in `commands::tui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap},
};

use crate::bus::{Notice, NoticeLevel};
use crate::commands::show::detail_lines;
use crate::commands::stats::summary_lines;
use crate::commands::truncate;
use crate::commands::tui::{ConsoleApp, InputMode};
use crate::filters::{FilterField, FiltersPanel};
use crate::moderation::{ConfirmStyle, ModerationModal};
use crate::pages::{ReviewDetailPage, ReviewsPage};
use crate::ports::ReviewBackend;
use crate::query::ReviewTab;
use crate::review::{Review, Tone, rating_stars};
use crate::toolbar::BulkActionsToolbar;

const CARD_HEIGHT: usize = 4;

pub struct UiPalette {
    pub bg: Color,
    pub fg: Color,
    pub dim: Color,
    pub accent: Color,
    pub success: Color,
    pub warning: Color,
    pub danger: Color,
    pub panel_bg: Color,
}

impl UiPalette {
    pub fn light() -> Self {
        Self {
            bg: Color::Rgb(248, 248, 245),
            fg: Color::Rgb(60, 56, 54),
            dim: Color::Rgb(146, 131, 116),
            accent: Color::Rgb(69, 133, 136),
            success: Color::Rgb(121, 116, 14),
            warning: Color::Rgb(181, 118, 20),
            danger: Color::Rgb(204, 36, 29),
            panel_bg: Color::Rgb(240, 240, 238),
        }
    }

    pub fn tone(&self, tone: Tone) -> Color {
        match tone {
            Tone::Neutral => self.dim,
            Tone::Success => self.success,
            Tone::Warning => self.warning,
            Tone::Danger => self.danger,
        }
    }

    fn confirm(&self, style: ConfirmStyle) -> Color {
        match style {
            ConfirmStyle::Success => self.success,
            ConfirmStyle::Warning => self.warning,
            ConfirmStyle::Destructive => self.danger,
        }
    }

    fn text(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    fn muted(&self) -> Style {
        Style::default().fg(self.dim).bg(self.bg)
    }
}

pub fn draw<B: ReviewBackend>(frame: &mut Frame, app: &ConsoleApp<'_, B>) {
    let palette = UiPalette::light();
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(palette.bg)), area);

    let list = app.list();
    let show_toolbar =
        app.detail().is_none() && BulkActionsToolbar::is_visible(list.selection().len());
    let toolbar_height = if show_toolbar { 1 } else { 0 };
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Length(1),              // Header
            Constraint::Length(1),              // Tabs
            Constraint::Length(1),              // Search
            Constraint::Min(0),                 // Content
            Constraint::Length(toolbar_height), // Bulk toolbar
            Constraint::Length(1),              // Toast
            Constraint::Length(1),              // Footer
        ])
        .split(area);

    let header = Paragraph::new(Line::from(vec![
        Span::styled(
            "digiMall Reviews",
            palette.text().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {}", app.backend_label()), palette.muted()),
    ]))
    .alignment(Alignment::Center);
    frame.render_widget(header, rows[0]);

    match app.detail() {
        Some(detail) => {
            render_detail(frame, rows[3], detail, &palette);
        }
        None => {
            render_tabs(frame, rows[1], list.tab(), &palette);
            render_search(frame, rows[2], list, app.mode(), &palette);
            render_content(frame, rows[3], list, &palette);
            if show_toolbar {
                render_toolbar(frame, rows[4], list.selection().len(), &palette);
            }
        }
    }

    render_toast(frame, rows[5], app.toast(), &palette);
    let footer = Paragraph::new(footer_text(app)).style(palette.muted());
    frame.render_widget(footer, rows[6]);

    if app.mode() == InputMode::Filters && app.detail().is_none() {
        render_filters(frame, area, list, &palette);
    }
    match app.detail() {
        Some(detail) => render_modal(
            frame,
            area,
            detail.modal(),
            detail.can_confirm(),
            detail.is_mutating(),
            &palette,
        ),
        None => render_modal(
            frame,
            area,
            list.modal(),
            list.can_confirm(),
            list.is_mutating(),
            &palette,
        ),
    }
}

fn footer_text<B: ReviewBackend>(app: &ConsoleApp<'_, B>) -> &'static str {
    let modal_open = match app.detail() {
        Some(detail) => detail.modal().is_open(),
        None => app.list().modal().is_open(),
    };
    if modal_open {
        return "Type a reason  [Enter] confirm  [Esc] cancel";
    }
    if app.detail().is_some() {
        return "[a]pprove  [x]reject  [g] flag  [d]elete  [r]eload  [Esc] back  [q]uit";
    }
    match app.mode() {
        InputMode::Search => "Type to search  [Enter/Esc] done",
        InputMode::Filters => "[j/k] move  [Space] change  [c]lear all  [Esc] close",
        InputMode::Normal => {
            "[Tab] tab  [j/k] move  [Space] select  [*] page  [a/x/g/d] moderate  [Enter] open  [/] search  [f]ilters  [q]uit"
        }
    }
}

fn render_tabs(frame: &mut Frame, area: Rect, active: ReviewTab, palette: &UiPalette) {
    let titles: Vec<Line> = ReviewTab::ALL
        .iter()
        .enumerate()
        .map(|(idx, tab)| Line::from(format!("{} {}", idx + 1, tab.title())))
        .collect();
    let tabs = Tabs::new(titles)
        .select(active.index())
        .style(palette.muted())
        .highlight_style(
            Style::default()
                .fg(palette.accent)
                .bg(palette.bg)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        );
    frame.render_widget(tabs, area);
}

fn render_search<B: ReviewBackend>(
    frame: &mut Frame,
    area: Rect,
    page: &ReviewsPage<B>,
    mode: InputMode,
    palette: &UiPalette,
) {
    let mut spans = vec![Span::styled("Search: ", palette.muted())];
    let input = page.search_input();
    if input.is_empty() && mode != InputMode::Search {
        spans.push(Span::styled(
            "Search by title, content, customer or product",
            palette.muted(),
        ));
    } else {
        spans.push(Span::styled(input.to_string(), palette.text()));
    }
    if mode == InputMode::Search {
        spans.push(Span::styled("▏", Style::default().fg(palette.accent)));
    }
    if page.search_pending() {
        spans.push(Span::styled("  …", palette.muted()));
    }
    if page.has_active_filters() {
        spans.push(Span::styled(
            "  [filters active]",
            Style::default().fg(palette.accent).bg(palette.bg),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_content<B: ReviewBackend>(
    frame: &mut Frame,
    area: Rect,
    page: &ReviewsPage<B>,
    palette: &UiPalette,
) {
    if let Some(error) = page.load_error() {
        render_error(frame, area, error, palette);
        return;
    }
    if !page.tab().shows_list() {
        let lines: Vec<Line> = page
            .statistics()
            .map(|stats| summary_lines(stats).into_iter().map(Line::from).collect())
            .unwrap_or_else(|| vec![Line::from("Loading statistics…")]);
        frame.render_widget(Paragraph::new(lines).style(palette.text()), area);
        return;
    }

    let reviews = page.reviews();
    if reviews.is_empty() {
        let message = if page.page().is_none() {
            "Loading reviews…"
        } else {
            "No reviews found"
        };
        frame.render_widget(
            Paragraph::new(message)
                .style(palette.muted())
                .alignment(Alignment::Center),
            area,
        );
        return;
    }

    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(area);
    let visible = (parts[0].height as usize / CARD_HEIGHT).max(1);
    let first = page.cursor().saturating_sub(visible - 1);
    let width = parts[0].width as usize;

    let mut lines = Vec::new();
    for (idx, review) in reviews.iter().enumerate().skip(first).take(visible) {
        let selected = page.selection().contains(&review.id);
        lines.extend(review_card(review, selected, idx == page.cursor(), width, palette));
    }
    frame.render_widget(Paragraph::new(lines).style(palette.text()), parts[0]);

    if let Some(result) = page.page() {
        let info = format!(
            "Page {} of {}  ({} reviews)  [n]ext [p]rev",
            result.page,
            result.total_pages.max(1),
            result.total
        );
        frame.render_widget(Paragraph::new(info).style(palette.muted()), parts[1]);
    }
}

/// Three text lines and a spacer for one review in the list.
pub fn review_card(
    review: &Review,
    selected: bool,
    focused: bool,
    width: usize,
    palette: &UiPalette,
) -> Vec<Line<'static>> {
    let badge = review.status.badge();
    let base = if focused {
        Style::default().fg(palette.fg).bg(palette.panel_bg)
    } else {
        palette.text()
    };
    let checkbox = if selected { "[x] " } else { "[ ] " };
    let pointer = if focused { "›" } else { " " };

    let mut first = vec![
        Span::styled(format!("{}{}", pointer, checkbox), base),
        Span::styled(
            format!("{:<8}", badge.label),
            base.fg(palette.tone(badge.tone)).add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", rating_stars(review.rating)),
            base.fg(palette.warning),
        ),
        Span::styled(
            truncate(review.display_title(), width.saturating_sub(40).max(10)),
            base.add_modifier(Modifier::BOLD),
        ),
    ];
    if review.is_verified_purchase {
        first.push(Span::styled("  ✓ Verified", base.fg(palette.success)));
    }
    if review.is_flagged {
        first.push(Span::styled("  ⚑ Flagged", base.fg(palette.danger)));
    }

    let meta = format!(
        "      {} · {} · by {} · {} · {} helpful",
        review.review_type.label(),
        review.target.name,
        review.author.name,
        review.created_at.format("%Y-%m-%d"),
        review.helpful_count
    );
    let content = format!(
        "      {}",
        truncate(&review.content.replace('\n', " "), width.saturating_sub(8).max(10))
    );

    vec![
        Line::from(first),
        Line::from(Span::styled(meta, base.fg(palette.dim))),
        Line::from(Span::styled(content, base)),
        Line::from(""),
    ]
}

fn render_error(frame: &mut Frame, area: Rect, error: &str, palette: &UiPalette) {
    let lines = vec![
        Line::from(Span::styled(
            "Failed to load reviews",
            Style::default()
                .fg(palette.danger)
                .bg(palette.bg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(error.to_string(), palette.text())),
        Line::from(""),
        Line::from(Span::styled("Press [r] to retry", palette.muted())),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        area,
    );
}

fn render_toolbar(frame: &mut Frame, area: Rect, count: usize, palette: &UiPalette) {
    let bar_style = Style::default().fg(palette.bg).bg(palette.accent);
    let mut spans = vec![Span::styled(
        format!(" {}  ", BulkActionsToolbar::summary(count)),
        bar_style.add_modifier(Modifier::BOLD),
    )];
    for button in BulkActionsToolbar::buttons(count) {
        spans.push(Span::styled(
            format!("[{}] {}  ", button.key, button.label),
            bar_style,
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)).style(bar_style), area);
}

fn render_toast(frame: &mut Frame, area: Rect, toast: Option<&Notice>, palette: &UiPalette) {
    let Some(notice) = toast else {
        return;
    };
    let color = match notice.level {
        NoticeLevel::Success => palette.success,
        NoticeLevel::Error => palette.danger,
    };
    let toast = Paragraph::new(notice.message.clone())
        .style(Style::default().fg(color).bg(palette.bg).add_modifier(Modifier::BOLD));
    frame.render_widget(toast, area);
}

fn render_detail<B: ReviewBackend>(
    frame: &mut Frame,
    area: Rect,
    detail: &ReviewDetailPage<B>,
    palette: &UiPalette,
) {
    if let Some(error) = detail.load_error() {
        render_error(frame, area, error, palette);
        return;
    }
    let Some(review) = detail.review() else {
        frame.render_widget(Paragraph::new("Loading review…").style(palette.muted()), area);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![
            Constraint::Fill(1),
            Constraint::Length(90),
            Constraint::Fill(1),
        ])
        .split(area);

    let badge = review.status.badge();
    let mut lines: Vec<Line> = Vec::new();
    for (idx, text) in detail_lines(review).into_iter().enumerate() {
        let style = match idx {
            0 => palette
                .text()
                .fg(palette.tone(badge.tone))
                .add_modifier(Modifier::BOLD),
            1 | 2 => palette.muted(),
            _ => palette.text(),
        };
        lines.push(Line::from(Span::styled(text, style)));
    }
    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" Review {} ", review.id))
                .style(Style::default().fg(palette.fg).bg(palette.bg)),
        );
    frame.render_widget(body, columns[1]);
}

fn render_filters<B: ReviewBackend>(
    frame: &mut Frame,
    area: Rect,
    page: &ReviewsPage<B>,
    palette: &UiPalette,
) {
    let popup = centered(area, 50, FilterField::ALL.len() as u16 + 4);
    frame.render_widget(Clear, popup);

    let selected = page.panel.selected_field();
    let lines: Vec<Line> = FilterField::ALL
        .iter()
        .map(|field| {
            let value = FiltersPanel::describe(*field, page.filters());
            let style = if *field == selected {
                Style::default()
                    .fg(palette.bg)
                    .bg(palette.accent)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(palette.fg).bg(palette.panel_bg)
            };
            let value_style = if value == "any" && *field != selected {
                style.fg(palette.dim)
            } else {
                style
            };
            Line::from(vec![
                Span::styled(format!(" {:<18}", field.label()), style),
                Span::styled(format!("{:<26}", value), value_style),
            ])
        })
        .collect();

    let panel = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Filters ")
            .style(Style::default().fg(palette.fg).bg(palette.panel_bg)),
    );
    frame.render_widget(panel, popup);
}

fn render_modal(
    frame: &mut Frame,
    area: Rect,
    modal: &ModerationModal,
    can_confirm: bool,
    is_mutating: bool,
    palette: &UiPalette,
) {
    let Some(contract) = modal.contract() else {
        return;
    };
    let count = modal.target_count();
    let popup = centered(area, 64, 11);
    frame.render_widget(Clear, popup);

    let panel = Style::default().fg(palette.fg).bg(palette.panel_bg);
    let mut lines = vec![
        Line::from(Span::styled(contract.description(count), panel)),
        Line::from(""),
    ];
    if let Some(warning) = contract.warning {
        lines.push(Line::from(Span::styled(
            format!("⚠ {}", warning),
            panel.fg(palette.danger).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(""));
    }
    if contract.accepts_reason() {
        let label = if contract.requires_reason {
            "Reason: "
        } else {
            "Comment: "
        };
        let reason = modal.reason();
        let value = if reason.is_empty() {
            Span::styled(contract.placeholder, panel.fg(palette.dim))
        } else {
            Span::styled(reason.to_string(), panel)
        };
        lines.push(Line::from(vec![
            Span::styled(label, panel.add_modifier(Modifier::BOLD)),
            value,
            Span::styled("▏", panel.fg(palette.accent)),
        ]));
        lines.push(Line::from(""));
    }

    let confirm_style = if can_confirm {
        Style::default()
            .fg(palette.bg)
            .bg(palette.confirm(contract.confirm_style))
            .add_modifier(Modifier::BOLD)
    } else {
        panel.fg(palette.dim)
    };
    let confirm_label = if modal.is_submitting() || is_mutating {
        "Working…".to_string()
    } else {
        format!(" [Enter] {} ", contract.confirm_label)
    };
    lines.push(Line::from(vec![
        Span::styled(confirm_label, confirm_style),
        Span::styled("   ", panel),
        Span::styled(
            " [Esc] Cancel ",
            if modal.can_cancel(is_mutating) {
                panel
            } else {
                panel.fg(palette.dim)
            },
        ),
    ]));

    let dialog = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", contract.title(count)))
            .style(panel),
    );
    frame.render_widget(dialog, popup);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
