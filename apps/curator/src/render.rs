//! Plain-text rendering of a [`SessionView`].

use std::fmt::Write as _;

use client_core::{SessionView, TileView};

const CAPTION_WIDTH: usize = 18;

pub fn render(view: &SessionView) -> String {
    let mut out = String::new();

    if !view.connected {
        out.push_str("not connected; use 'connect HOST'\n");
        return out;
    }

    let accounts = view
        .accounts
        .iter()
        .map(|account| account.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(out, "accounts: {}", if accounts.is_empty() { "-" } else { accounts.as_str() });

    let Some(account) = &view.account else {
        if view.loading {
            out.push_str("loading...\n");
        } else {
            out.push_str("no account open; use 'account NAME' or 'new NAME'\n");
        }
        render_statuses(&mut out, view);
        return out;
    };

    let _ = writeln!(out, "account: {account}  [{}]", view.saved_banner());
    if view.loading {
        out.push_str("loading...\n");
    } else if view.uploading {
        let _ = writeln!(out, "uploading... {:.0}%", view.upload_percent);
    } else if view.tiles.is_empty() {
        out.push_str("queue is empty\n");
    } else {
        for row in view.tiles.chunks(view.columns.max(1)) {
            let cells: Vec<String> = row
                .iter()
                .map(|tile| render_tile(tile, view.next_pending))
                .collect();
            let _ = writeln!(out, "{}", cells.join(" | "));
        }
    }

    let mut controls = Vec::new();
    if let Some(index) = view.editing {
        controls.push(format!("editing item {index}"));
    }
    if view.download_enabled {
        controls.push(view.download_label().to_string());
    }
    if view.upload_enabled {
        controls.push(if view.gallery_mode {
            "upload (gallery)".to_string()
        } else {
            "upload".to_string()
        });
    }
    if !controls.is_empty() {
        let _ = writeln!(out, "> {}", controls.join(" / "));
    }

    render_statuses(&mut out, view);
    out
}

fn render_tile(tile: &TileView, next_pending: Option<usize>) -> String {
    let marker = if tile.selected {
        '>'
    } else if next_pending == Some(tile.index) {
        '*'
    } else {
        ' '
    };
    let lock = if tile.locked { 'L' } else { ' ' };
    let kind = if tile.members > 1 {
        format!("{}x{}", tile.kind.label(), tile.members)
    } else {
        tile.kind.label().to_string()
    };
    let caption = if tile.captioned {
        truncate(&tile.caption, CAPTION_WIDTH)
    } else {
        "(no caption)".to_string()
    };
    format!(
        "{marker}{index:>3} {lock} {kind:<10} {caption:<width$}",
        index = tile.index,
        width = CAPTION_WIDTH
    )
}

fn truncate(text: &str, width: usize) -> String {
    let text = text.trim().replace('\n', " ");
    if text.chars().count() <= width {
        return text;
    }
    let mut cut: String = text.chars().take(width.saturating_sub(3)).collect();
    cut.push_str("...");
    cut
}

fn render_statuses(out: &mut String, view: &SessionView) {
    for (position, status) in view.statuses.iter().enumerate() {
        let sign = if status.positive { '+' } else { '!' };
        let _ = writeln!(out, "  [{position}] {sign} {}", status.text);
    }
}

#[cfg(test)]
#[path = "tests/render_tests.rs"]
mod tests;
