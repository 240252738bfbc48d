//! Text panes: chat log, status line, context gauge, input editor, and the
//! full-screen picker and log views.
//!
//! Each pane renders into a [`FrameBuffer`] sized to its rect.

use tui_parley_core::{blink_phase, ChatLog, ContextGauge, StatusLine};
use tui_parley_input::{wrap_segments, FilePicker, InputEditor};

use crate::fb::{CellStyle, FrameBuffer, Rgb};
use crate::layout::PROMPT;
use crate::types::{ids, EditMode};

const WHITE: Rgb = Rgb::new(230, 230, 230);
const GREY: Rgb = Rgb::new(130, 130, 130);
const CYAN: Rgb = Rgb::new(90, 200, 230);
const YELLOW: Rgb = Rgb::new(230, 200, 80);
const GREEN: Rgb = Rgb::new(110, 200, 110);
const MAGENTA: Rgb = Rgb::new(200, 120, 220);
const RED: Rgb = Rgb::new(230, 90, 90);
const BAR_BG: Rgb = Rgb::new(40, 40, 48);
const SELECT_BG: Rgb = Rgb::new(60, 70, 110);

pub fn speaker_color(speaker: &str) -> Rgb {
    match speaker {
        ids::PLAYER | "you" => CYAN,
        ids::ARBITER => YELLOW,
        s if s.starts_with("peer") => GREEN,
        _ => MAGENTA,
    }
}

/// One visual line of the chat pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatLine {
    pub text: String,
    /// Leading chars that are the `speaker:` label.
    pub label_len: usize,
    pub color: Rgb,
    pub dim: bool,
}

/// Chat messages (and the waiting indicator) wrapped to `width`.
pub fn chat_lines(chat: &ChatLog, now_ms: u64, width: usize) -> Vec<ChatLine> {
    let mut out = Vec::new();
    for msg in chat.messages() {
        let full: Vec<char> = format!("{}: {}", msg.speaker, msg.text).chars().collect();
        let label_len = msg.speaker.chars().count() + 1;
        let color = speaker_color(&msg.speaker);
        for (i, seg) in wrap_segments(&full, width).iter().enumerate() {
            out.push(ChatLine {
                text: full[seg.start..seg.end].iter().collect(),
                label_len: if i == 0 { label_len } else { 0 },
                color,
                dim: false,
            });
        }
    }
    if let Some(target) = chat.waiting() {
        let dots = ".".repeat(blink_phase(now_ms) as usize);
        out.push(ChatLine {
            text: format!("{target} is thinking{dots}"),
            label_len: 0,
            color: GREY,
            dim: true,
        });
    }
    out
}

/// Visual lines the chat occupies at `width`; bounds the scroll offset.
pub fn chat_line_count(chat: &ChatLog, width: usize) -> usize {
    chat_lines(chat, 0, width).len()
}

pub fn render_chat(chat: &ChatLog, now_ms: u64, width: u16, height: u16) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height);
    let lines = chat_lines(chat, now_ms, width as usize);
    let h = height as usize;
    let scroll = chat.scroll().min(lines.len().saturating_sub(h));
    let end = lines.len() - scroll;
    let start = end.saturating_sub(h);

    for (y, line) in lines[start..end].iter().enumerate() {
        let y = y as u16;
        let label: String = line.text.chars().take(line.label_len).collect();
        let body: String = line.text.chars().skip(line.label_len).collect();
        let x = fb.put_str(0, y, &label, CellStyle::fg(line.color).bold());
        let style = if line.dim {
            CellStyle::fg(line.color).dim()
        } else {
            CellStyle::fg(WHITE)
        };
        fb.put_str(x, y, &body, style);
    }
    if scroll > 0 && height > 0 {
        let tag = format!("[+{scroll}]");
        let x = width.saturating_sub(tag.chars().count() as u16);
        fb.put_str(x, 0, &tag, CellStyle::fg(GREY));
    }
    fb
}

/// Plain text of the status line.
pub fn status_text(status: &StatusLine) -> String {
    if status.quit_pending {
        return " Press Ctrl+C again to quit, any other key to cancel".to_string();
    }
    let mut text = format!(
        " {} | {} | peers: {}",
        status.edit_mode.label(),
        status.agent_mode.as_str(),
        status.peers
    );
    if let Some(tool) = &status.last_tool {
        text.push_str(&format!(" | tool: {} ({})", tool, status.tool_total));
    }
    if let Some(notice) = &status.notice {
        text.push_str(" | ");
        text.push_str(notice);
    }
    text
}

pub fn render_status(status: &StatusLine, width: u16) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, 1);
    let bar = CellStyle::fg(WHITE).on(BAR_BG);
    fb.fill_row(0, bar);
    let text = status_text(status);
    if status.quit_pending {
        fb.put_str(0, 0, &text, CellStyle::fg(RED).on(BAR_BG).bold());
        return fb;
    }
    let label = status.edit_mode.label();
    let mode_color = match status.edit_mode {
        EditMode::Insert => GREEN,
        EditMode::Normal => CYAN,
    };
    fb.put_str(0, 0, &text, bar);
    fb.put_str(1, 0, label, CellStyle::fg(mode_color).on(BAR_BG).bold());
    fb
}

/// Percentage bar: `ctx [#####.....] 42%`.
pub fn context_text(gauge: &ContextGauge, width: usize) -> (String, usize) {
    let pct = gauge.percent() as usize;
    let bar_w = width.saturating_sub(11).min(20);
    let filled = (bar_w * pct + 50) / 100;
    let text = format!(
        "ctx [{}{}] {}%",
        "#".repeat(filled),
        ".".repeat(bar_w - filled),
        pct
    );
    (text, filled)
}

pub fn render_context(gauge: &ContextGauge, width: u16) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, 1);
    let color = match gauge.percent() {
        0..=59 => GREEN,
        60..=84 => YELLOW,
        _ => RED,
    };
    let (text, _) = context_text(gauge, width as usize);
    fb.put_str(0, 0, &text, CellStyle::fg(color));
    fb
}

/// Render the editor; returns the cursor cell relative to the pane in INSERT
/// mode.
pub fn render_input(editor: &InputEditor, width: u16, height: u16) -> (FrameBuffer, Option<(u16, u16)>) {
    let mut fb = FrameBuffer::new(width, height);
    let lines = editor.visual_lines();
    let (line, col) = editor.cursor_line_col();
    let h = (height as usize).max(1);
    let first = (line + 1).saturating_sub(h);
    let prompt_w = PROMPT.chars().count() as u16;

    let normal = editor.mode() == EditMode::Normal;
    let text_style = if normal {
        CellStyle::fg(GREY)
    } else {
        CellStyle::fg(WHITE)
    };
    for (y, text) in lines.iter().skip(first).take(h).enumerate() {
        let y = y as u16;
        if first + y as usize == 0 {
            fb.put_str(0, y, PROMPT, CellStyle::fg(CYAN).bold());
        }
        fb.put_str(prompt_w, y, text, text_style);
    }

    let cursor = (!normal).then(|| {
        let x = (prompt_w + col as u16).min(width.saturating_sub(1));
        (x, (line - first) as u16)
    });
    (fb, cursor)
}

/// Full-screen requirements-file picker.
pub fn render_picker(picker: &FilePicker, width: u16, height: u16) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height);
    let title = format!(
        " Select requirements file in {} (Enter: choose, Esc: cancel)",
        picker.dir().display()
    );
    fb.fill_row(0, CellStyle::fg(WHITE).on(BAR_BG));
    fb.put_str(0, 0, &title, CellStyle::fg(WHITE).on(BAR_BG).bold());
    if picker.is_empty() {
        fb.put_str(1, 2, "(no files)", CellStyle::fg(GREY));
        return fb;
    }
    let rows = height.saturating_sub(2) as usize;
    let first = (picker.selected_index() + 1).saturating_sub(rows.max(1));
    for (i, y) in (first..picker.entries().len()).zip(2..height) {
        let selected = i == picker.selected_index();
        let style = if selected {
            CellStyle::fg(WHITE).on(SELECT_BG).bold()
        } else {
            CellStyle::fg(WHITE)
        };
        if selected {
            fb.fill_row(y, style);
        }
        fb.put_str(1, y, &picker.label(i), style);
    }
    fb
}

/// Full-screen view of the last lines of the debug log.
pub fn render_log_view(lines: &[String], width: u16, height: u16) -> FrameBuffer {
    let mut fb = FrameBuffer::new(width, height);
    fb.fill_row(0, CellStyle::fg(WHITE).on(BAR_BG));
    fb.put_str(0, 0, " Debug log (Esc: close)", CellStyle::fg(WHITE).on(BAR_BG).bold());
    let rows = height.saturating_sub(1) as usize;
    let start = lines.len().saturating_sub(rows);
    for (line, y) in lines[start..].iter().zip(1..height) {
        fb.put_str(0, y, line, CellStyle::fg(GREY));
    }
    fb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentMode;

    fn rows(fb: &FrameBuffer) -> Vec<String> {
        (0..fb.height()).map(|y| fb.row_text(y).trim_end().to_string()).collect()
    }

    #[test]
    fn chat_wraps_and_labels_first_line() {
        let mut chat = ChatLog::new();
        chat.push("arbiter", "hello there friend");
        let lines = chat_lines(&chat, 0, 12);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].text, "arbiter: ");
        assert_eq!(lines[0].label_len, 8);
        assert_eq!(lines[1].label_len, 0);
    }

    #[test]
    fn chat_shows_newest_lines_at_bottom_and_scrolls() {
        let mut chat = ChatLog::new();
        for i in 0..5 {
            chat.push("you", format!("m{i}"));
        }
        let fb = render_chat(&chat, 0, 20, 3);
        assert_eq!(rows(&fb), vec!["you: m2", "you: m3", "you: m4"]);

        chat.scroll_up(2, chat_line_count(&chat, 20) - 3);
        let fb = render_chat(&chat, 0, 20, 3);
        assert_eq!(rows(&fb)[1], "you: m1");
        assert!(rows(&fb)[0].ends_with("[+2]"));
    }

    #[test]
    fn waiting_indicator_blinks() {
        let mut chat = ChatLog::new();
        chat.start_waiting("arbiter");
        let a = render_chat(&chat, 0, 30, 2);
        let b = render_chat(&chat, 1000, 30, 2);
        assert_eq!(rows(&a)[0], "arbiter is thinking");
        assert_eq!(rows(&b)[0], "arbiter is thinking..");
    }

    #[test]
    fn status_mentions_mode_tool_and_peers() {
        let mut s = StatusLine {
            agent_mode: AgentMode::Plan,
            peers: 2,
            ..Default::default()
        };
        s.record_tool_use("grep", 3);
        assert_eq!(status_text(&s), " INSERT | plan | peers: 2 | tool: grep (3)");
        s.quit_pending = true;
        assert!(status_text(&s).contains("Ctrl+C again"));
    }

    #[test]
    fn context_bar_fills_proportionally() {
        let mut g = ContextGauge::default();
        g.set(50);
        let (text, filled) = context_text(&g, 40);
        assert_eq!(filled, 10);
        assert_eq!(text, format!("ctx [{}{}] 50%", "#".repeat(10), ".".repeat(10)));
    }

    #[test]
    fn input_cursor_follows_prompt_and_wrap() {
        let mut e = InputEditor::new(4);
        e.insert_str("abcdef");
        let (fb, cursor) = render_input(&e, 6, 2);
        assert_eq!(rows(&fb), vec!["> abcd", "  ef"]);
        assert_eq!(cursor, Some((4, 1)));

        e.set_mode(EditMode::Normal);
        let (_, cursor) = render_input(&e, 6, 2);
        assert_eq!(cursor, None);
    }

    #[test]
    fn cursor_after_a_full_line_is_not_clamped() {
        let layout = crate::layout::Layout::compute(120, 30, 16, 1);
        let width = layout.input_text_width();
        let mut e = InputEditor::new(width);
        e.insert_str(&"x".repeat(width));
        assert_eq!(e.cursor_line_col(), (0, width));

        let (fb, cursor) = render_input(&e, layout.input.w, layout.input.h);
        let prompt = PROMPT.chars().count() as u16;
        let (x, y) = cursor.expect("insert mode shows a cursor");
        assert_eq!((x, y), (prompt + width as u16, 0));
        assert!(x < layout.input.w);
        assert_eq!(rows(&fb)[0].trim_end().chars().count(), prompt as usize + width);
    }

    #[test]
    fn input_scrolls_to_cursor_line() {
        let mut e = InputEditor::new(10);
        e.insert_str("a\nb\nc");
        let (fb, cursor) = render_input(&e, 12, 2);
        assert_eq!(rows(&fb), vec!["  b", "  c"]);
        assert_eq!(cursor, Some((3, 1)));
    }

    #[test]
    fn picker_highlights_selection() {
        let mut p = FilePicker::from_entries(
            "docs".into(),
            vec!["docs/a.md".into(), "docs/b.md".into()],
        );
        p.move_down();
        let fb = render_picker(&p, 40, 5);
        let text = rows(&fb);
        assert_eq!(text[2], " a.md");
        assert_eq!(text[3], " b.md");
        assert_eq!(fb.get(1, 3).unwrap().style.bg, SELECT_BG);
    }
}
