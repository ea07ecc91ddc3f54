use super::*;

use shared::domain::{AccountName, MediaKind};

fn tile(index: usize, kind: MediaKind, caption: &str, locked: bool) -> TileView {
    TileView {
        index,
        kind,
        preview: Some(format!("http://h:5001/alpha/{index}.jpg")),
        caption: caption.to_string(),
        members: if kind == MediaKind::Gallery { 3 } else { 1 },
        locked,
        selected: false,
        captioned: !caption.is_empty(),
    }
}

fn open_view() -> SessionView {
    SessionView {
        connected: true,
        accounts: vec![AccountName::new("alpha"), AccountName::new("beta")],
        account: Some(AccountName::new("alpha")),
        tiles: vec![
            tile(0, MediaKind::Image, "first light over the bay at dawn", false),
            tile(1, MediaKind::Gallery, "", false),
            tile(2, MediaKind::Video, "clip", true),
        ],
        columns: 2,
        next_pending: Some(1),
        saved: true,
        upload_enabled: true,
        download_enabled: true,
        ..SessionView::default()
    }
}

#[test]
fn disconnected_view_prompts_for_host() {
    assert!(render(&SessionView::default()).starts_with("not connected"));
}

#[test]
fn grid_rows_follow_column_count() {
    let text = render(&open_view());
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "accounts: alpha, beta");
    assert_eq!(lines[1], "account: alpha  [Content is saved and up-to-date]");
    assert!(lines[2].contains("  0   image      first light ove..."));
    assert!(lines[2].contains("*  1   galleryx3  (no caption)"));
    assert!(lines[3].contains("  2 L video      clip"));
    assert_eq!(lines[4], "> Download latest and lock / upload");
}

#[test]
fn uploading_hides_the_grid() {
    let view = SessionView {
        uploading: true,
        upload_percent: 42.4,
        upload_enabled: false,
        ..open_view()
    };
    let text = render(&view);
    assert!(text.contains("uploading... 42%"));
    assert!(!text.contains("galleryx3"));
}

#[test]
fn truncation_counts_characters() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("ééééééééééé", 6), "ééé...");
}
