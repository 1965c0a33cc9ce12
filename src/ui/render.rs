use crate::render::{company_name, recommendation, Recommendation};
use crate::state::{RunPhase, RunState};
use crate::types::{ChartData, HistoryDetail, HistoryItem, StageStatus};
use crate::ui::input_metrics::{
    clamp_to_char_boundary_left, display_width, truncate_to_display_width,
};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, Paragraph, Sparkline, Wrap},
    Frame,
};

pub fn render_stepper(frame: &mut Frame<'_>, area: Rect, run: &RunState) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let mut spans = Vec::new();
    for (position, (stage, status)) in run.stage_statuses().iter().enumerate() {
        if position > 0 {
            spans.push(Span::styled("   ", Style::default()));
        }
        let (marker, style) = match status {
            StageStatus::Pending => ("○", Style::default().fg(Color::DarkGray)),
            StageStatus::Active => (
                "◐",
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            StageStatus::Done => ("●", Style::default().fg(Color::Green)),
        };
        spans.push(Span::styled(format!("{marker} {}", stage.label()), style));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::BOTTOM)),
        area,
    );
}

pub fn render_log(frame: &mut Frame<'_>, area: Rect, run: &RunState, scroll: usize) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let lines: Vec<Line> = run
        .log()
        .iter()
        .map(|entry| {
            let time = entry
                .timestamp
                .split('T')
                .nth(1)
                .map(|t| truncate_to_display_width(t, 8))
                .unwrap_or_default();
            let mut text = format!("{time} {} {}", entry.agent, entry.action);
            if let Some(details) = &entry.details {
                text.push_str(": ");
                text.push_str(details);
            }
            Line::styled(text, Style::default().fg(Color::Gray))
        })
        .collect();

    // Follow the tail unless the user scrolled back.
    let visible = area.height.saturating_sub(2) as usize;
    let tail_offset = lines.len().saturating_sub(visible);
    let offset = if scroll == 0 { tail_offset } else { scroll.min(tail_offset) };

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("Activity"))
            .wrap(Wrap { trim: false })
            .scroll((offset as u16, 0)),
        area,
    );
}

pub fn render_report_pane(
    frame: &mut Frame<'_>,
    area: Rect,
    run: &RunState,
    detail: Option<&HistoryDetail>,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let (title, lines) = if let Some(detail) = detail {
        ("Saved Report", saved_report_lines(detail))
    } else {
        match run.phase() {
            RunPhase::Idle => (
                "Report",
                vec![Line::styled(
                    "Enter a research query below and press Enter.",
                    Style::default().fg(Color::DarkGray),
                )],
            ),
            RunPhase::Running => (
                "Report",
                vec![Line::styled(
                    "Research in progress...",
                    Style::default().fg(Color::Yellow),
                )],
            ),
            RunPhase::Failed => (
                "Report",
                vec![
                    Line::styled(
                        "Research failed",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                    Line::from(run.error().unwrap_or("unknown error").to_string()),
                    Line::styled(
                        "Press Enter to retry.",
                        Style::default().fg(Color::DarkGray),
                    ),
                ],
            ),
            RunPhase::Completed => ("Report", live_report_lines(run)),
        }
    };

    frame.render_widget(
        Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title(title))
            .wrap(Wrap { trim: false }),
        area,
    );
}

fn live_report_lines(run: &RunState) -> Vec<Line<'static>> {
    let Some(result) = run.result() else {
        return vec![Line::from("report payload missing")];
    };

    let mut lines = Vec::new();
    lines.push(badge_line(
        &result.short_summary,
        company_name(&result.short_summary),
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(result.short_summary.clone()));
    lines.push(Line::from(""));
    for line in result.markdown_report.lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::from(""));
    lines.push(verification_line(
        result.verification.verified,
        &result.verification.issues,
    ));
    for check in &result.verification.fact_checks {
        let (mark, style) = if check.verified {
            ("✓", Style::default().fg(Color::Green))
        } else {
            ("✗", Style::default().fg(Color::Red))
        };
        lines.push(Line::from(vec![
            Span::styled(format!("  {mark} "), style),
            Span::raw(check.claim.clone()),
        ]));
    }
    if !result.follow_up_questions.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::styled(
            "Follow-up questions",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        for question in &result.follow_up_questions {
            lines.push(Line::from(format!("  - {question}")));
        }
    }
    lines
}

fn saved_report_lines(detail: &HistoryDetail) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    lines.push(badge_line(
        &detail.short_summary,
        company_name(&detail.short_summary),
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(detail.short_summary.clone()));
    lines.push(Line::from(""));
    for line in detail.full_report.lines() {
        lines.push(Line::from(line.to_string()));
    }
    lines.push(Line::from(""));
    lines.push(verification_line(
        detail.verification.verified,
        &detail.verification.issues,
    ));
    lines
}

fn badge_line(summary: &str, company: Option<String>) -> Line<'static> {
    let badge = recommendation(summary);
    let style = match badge {
        Recommendation::Buy => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        Recommendation::Sell => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        Recommendation::Hold => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    };
    Line::from(vec![
        Span::raw(company.unwrap_or_else(|| "Unknown".to_string())),
        Span::raw("  "),
        Span::styled(format!("[{}]", badge.label()), style),
    ])
}

fn verification_line(verified: bool, issues: &str) -> Line<'static> {
    if verified {
        Line::styled(
            "Verification Passed",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        )
    } else {
        let mut text = String::from("Issues Found");
        if !issues.is_empty() {
            text.push_str(": ");
            text.push_str(issues);
        }
        Line::styled(
            text,
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )
    }
}

pub fn render_chart(
    frame: &mut Frame<'_>,
    area: Rect,
    chart: Option<&ChartData>,
    note: Option<&str>,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let Some(chart) = chart else {
        let placeholder = note.unwrap_or("No chart data");
        frame.render_widget(
            Paragraph::new(placeholder.to_string())
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("Chart")),
            area,
        );
        return;
    };

    let title = match (chart.prices.first(), chart.prices.last()) {
        (Some(first), Some(last)) => {
            let trend = if last >= first { "▲" } else { "▼" };
            format!("Chart {} {trend} {last:.2}", chart.symbol)
        }
        _ => format!("Chart {}", chart.symbol),
    };

    frame.render_widget(
        Sparkline::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .data(&scale_prices(&chart.prices))
            .style(Style::default().fg(Color::Cyan)),
        area,
    );
}

// Sparkline wants u64 heights; map the price range onto 1..=100 so a flat
// series still draws a visible bar.
fn scale_prices(prices: &[f64]) -> Vec<u64> {
    let (min, max) = prices.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
        (lo.min(*p), hi.max(*p))
    });
    let span = max - min;
    prices
        .iter()
        .map(|price| {
            if span <= f64::EPSILON {
                50
            } else {
                1 + ((price - min) / span * 99.0).round() as u64
            }
        })
        .collect()
}

pub fn render_history(
    frame: &mut Frame<'_>,
    area: Rect,
    items: &[HistoryItem],
    selected: usize,
    note: Option<&str>,
) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    if items.is_empty() {
        let placeholder = note.unwrap_or("No history yet");
        frame.render_widget(
            Paragraph::new(placeholder.to_string())
                .style(Style::default().fg(Color::DarkGray))
                .block(Block::default().borders(Borders::ALL).title("History")),
            area,
        );
        return;
    }

    let width = area.width.saturating_sub(2) as usize;
    let list_items: Vec<ListItem> = items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let marker = item.recommendation.as_deref().unwrap_or("-");
            let label = format!("{marker:<4} {}", item.query);
            let mut style = Style::default().fg(Color::Gray);
            if index == selected {
                style = style.fg(Color::White).add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::styled(truncate_to_display_width(&label, width), style))
        })
        .collect();

    frame.render_widget(
        List::new(list_items).block(Block::default().borders(Borders::ALL).title("History")),
        area,
    );
}

pub fn render_input(frame: &mut Frame<'_>, area: Rect, input: &str, cursor_byte: usize, run: &RunState) {
    if area.height == 0 || area.width <= 2 {
        return;
    }

    let (prompt, style) = match run.phase() {
        RunPhase::Idle => ("Analyze > ", Style::default().fg(Color::White)),
        RunPhase::Running => (
            "Running... ",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
        ),
        RunPhase::Completed => ("New query > ", Style::default().fg(Color::White)),
        RunPhase::Failed => ("Retry > ", Style::default().fg(Color::White)),
    };

    frame.render_widget(
        Paragraph::new(format!("{prompt}{input}")).style(style),
        area,
    );

    if run.is_running() {
        return;
    }
    let safe_cursor = clamp_to_char_boundary_left(input, cursor_byte);
    let cursor_col = display_width(prompt) + display_width(&input[..safe_cursor]);
    let cursor_x = area
        .x
        .saturating_add(cursor_col as u16)
        .min(area.x.saturating_add(area.width.saturating_sub(1)));
    frame.set_cursor_position((cursor_x, area.y));
}

pub fn render_status_line(frame: &mut Frame<'_>, area: Rect, status: &str) {
    if area.height == 0 || area.width == 0 {
        return;
    }

    let text = truncate_to_display_width(status, area.width as usize);
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_prices_maps_range_onto_bar_heights() {
        let scaled = scale_prices(&[10.0, 20.0, 15.0]);
        assert_eq!(scaled[0], 1);
        assert_eq!(scaled[1], 100);
        assert!(scaled[2] > scaled[0] && scaled[2] < scaled[1]);
    }

    #[test]
    fn test_scale_prices_flat_series_is_visible() {
        assert_eq!(scale_prices(&[42.0, 42.0]), vec![50, 50]);
    }
}
