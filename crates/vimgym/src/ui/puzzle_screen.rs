//! The puzzle screen: goal, live editor, status line and help.

use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};
use unicode_width::UnicodeWidthStr;

use crate::curriculum::Overall;
use crate::puzzle::{CursorPos, Puzzle, StarRating};
use crate::vim::{ModeEstimate, VimMode};

const PLAYING_HELP: &str = "Ctrl+H: hint  Ctrl+O: solution  Ctrl+R: reset  Ctrl+Q: quit";
const CLEARED_HELP: &str = "[enter] next  [r] retry  [q] quit";

/// Everything the screen shows, borrowed from the app for one frame.
pub struct PuzzleScreen<'a> {
    pub puzzle: &'a Puzzle,
    pub lines: &'a [String],
    pub cursor: CursorPos,
    pub mode: ModeEstimate,
    pub pending: &'a str,
    pub keystrokes: u32,
    pub rating: Option<StarRating>,
    pub show_hint: bool,
    pub show_solution: bool,
    pub overall: Overall,
}

impl Widget for PuzzleScreen<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let goal_lines: Vec<&str> = self.puzzle.after.text.split('\n').collect();
        let goal_height = (goal_lines.len() as u16).saturating_add(2).min(area.height / 3 + 2);
        let footer = self.footer();
        let footer_height = (footer.len() as u16).min(area.height / 3);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(goal_height),
                Constraint::Min(3),
                Constraint::Length(1),
                Constraint::Length(footer_height),
            ])
            .split(area);

        self.render_header(chunks[0], buf);

        let goal_block = Block::default()
            .borders(Borders::ALL)
            .title(" GOAL ")
            .border_style(Style::default().fg(Color::DarkGray));
        let goal: Vec<Line> = goal_lines.iter().map(|l| Line::raw(*l)).collect();
        Paragraph::new(goal).block(goal_block).render(chunks[1], buf);

        self.render_editor(chunks[2], buf);
        self.render_status(chunks[3], buf);

        Paragraph::new(footer)
            .wrap(Wrap { trim: false })
            .render(chunks[4], buf);
    }
}

impl PuzzleScreen<'_> {
    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let title = Line::from(Span::styled(
            format!("Level {}: {}", self.puzzle.level, self.puzzle.title),
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let mut info = format!("Category: {}", self.puzzle.category);
        if self.overall.total > 0 {
            info.push_str(&format!(
                "  Progress: {}/{} ({}%)",
                self.overall.solved, self.overall.total, self.overall.percent
            ));
        }
        let info = Line::from(Span::styled(info, Style::default().fg(Color::DarkGray)));
        Paragraph::new(vec![title, info]).render(area, buf);
    }

    fn render_editor(&self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" EDITOR ")
            .border_style(Style::default().fg(mode_color(self.mode.mode())));
        let inner = block.inner(area);
        block.render(area, buf);

        if self.lines.is_empty() {
            Paragraph::new("(loading...)")
                .style(Style::default().fg(Color::DarkGray))
                .render(inner, buf);
            return;
        }

        let (start, end) = window_range(self.lines.len(), self.cursor.row, inner.height as usize);
        let lines: Vec<Line> = (start..end)
            .map(|row| {
                let line = &self.lines[row];
                if row == self.cursor.row {
                    cursor_line(line, self.cursor.col)
                } else {
                    Line::raw(line.clone())
                }
            })
            .collect();
        Paragraph::new(lines).render(inner, buf);
    }

    fn render_status(&self, area: Rect, buf: &mut Buffer) {
        let mode = self.mode.mode();
        let mut left = vec![Span::styled(
            format!(" {} ", mode.label()),
            Style::default().fg(Color::Black).bg(mode_color(mode)),
        )];
        if !self.pending.is_empty() {
            left.push(Span::styled(
                format!(" {}", self.pending),
                Style::default().fg(Color::Yellow),
            ));
        }

        let right = format!("Keystrokes: {}  (par: {}) ", self.keystrokes, self.puzzle.par());
        let used: usize = left.iter().map(|s| s.content.width()).sum();
        let pad = (area.width as usize).saturating_sub(used + right.width());
        left.push(Span::raw(" ".repeat(pad)));
        left.push(Span::raw(right));

        Paragraph::new(Line::from(left)).render(area, buf);
    }

    fn footer(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        if self.show_hint && !self.puzzle.hint.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("Hint: {}", self.puzzle.hint),
                Style::default().fg(Color::Cyan),
            )));
        }

        if let Some(rating) = self.rating {
            lines.push(Line::raw(""));
            lines.push(Line::from(Span::styled(
                format!("Cleared! {rating}"),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::raw(format!(
                "Keystrokes: {}  (par: {})",
                self.keystrokes,
                self.puzzle.par()
            )));
            if !self.puzzle.optimal_solution.is_empty() {
                lines.push(Line::raw(format!("Optimal: {}", self.puzzle.optimal_solution)));
            }
            lines.push(Line::from(Span::styled(
                CLEARED_HELP,
                Style::default().fg(Color::DarkGray),
            )));
            return lines;
        }

        if self.show_solution && !self.puzzle.optimal_solution.is_empty() {
            lines.push(Line::from(Span::styled(
                format!("Solution: {}", self.puzzle.optimal_solution),
                Style::default().fg(Color::Magenta),
            )));
            if !self.puzzle.solution_explanation.is_empty() {
                lines.push(Line::raw(self.puzzle.solution_explanation.clone()));
            }
        }
        lines.push(Line::from(Span::styled(
            PLAYING_HELP,
            Style::default().fg(Color::DarkGray),
        )));
        lines
    }
}

fn mode_color(mode: VimMode) -> Color {
    match mode {
        VimMode::Normal => Color::Cyan,
        VimMode::Insert => Color::Green,
        VimMode::Replace => Color::Red,
        VimMode::Visual | VimMode::VisualLine | VimMode::VisualBlock => Color::Yellow,
        VimMode::CommandLine => Color::Magenta,
    }
}

/// Renders a line with the character at byte column `col` reversed.
fn cursor_line(line: &str, col: usize) -> Line<'static> {
    let cursor_style = Style::default().add_modifier(Modifier::REVERSED);
    let mut col = col.min(line.len());
    while !line.is_char_boundary(col) {
        col -= 1;
    }

    let (before, rest) = line.split_at(col);
    let mut chars = rest.chars();
    let mut spans = vec![Span::raw(before.to_string())];
    match chars.next() {
        Some(c) => {
            spans.push(Span::styled(c.to_string(), cursor_style));
            spans.push(Span::raw(chars.as_str().to_string()));
        }
        None => spans.push(Span::styled(" ", cursor_style)),
    }
    Line::from(spans)
}

/// Rows to show so the cursor row stays visible, roughly centred.
fn window_range(total: usize, cursor: usize, height: usize) -> (usize, usize) {
    if height == 0 || total <= height {
        return (0, total);
    }
    let cursor = cursor.min(total - 1);
    let start = cursor.saturating_sub(height / 2).min(total - height);
    (start, start + height)
}
