use super::*;
use crate::fixtures::{gallery, gallery_member, image, names, queue_of};

#[test]
fn swap_exchanges_items_and_bumps_revision() {
    let mut queue = queue_of(&["a", "b", "c"], 3);
    queue.swap(0, 2).expect("swap");
    assert_eq!(names(&queue), ["c", "b", "a"]);
    assert_eq!(queue.revision(), 1);
}

#[test]
fn swap_out_of_range_is_a_no_op() {
    let mut queue = queue_of(&["a", "b"], 2);
    let err = queue.swap(1, 2).expect_err("out of range");
    assert_eq!(err, QueueError::OutOfRange { index: 2, len: 2 });
    assert_eq!(names(&queue), ["a", "b"]);
    assert_eq!(queue.revision(), 0);
}

#[test]
fn swap_ignores_locks() {
    let mut queue = queue_of(&["a", "b"], 1);
    queue.swap(0, 1).expect("queue only checks bounds");
    assert_eq!(names(&queue), ["b", "a"]);
}

#[test]
fn set_caption_replaces_text() {
    let mut queue = queue_of(&["a"], 1);
    queue.set_caption(0, "hello").expect("caption");
    assert_eq!(queue.get(0).map(|i| i.caption.as_str()), Some("hello"));
    assert!(queue.get(0).is_some_and(|i| i.is_captioned()));

    assert!(queue.set_caption(3, "nope").is_err());
}

#[test]
fn remove_shifts_following_items_and_keeps_suffix() {
    let mut queue = queue_of(&["a", "b", "c", "d"], 2);
    let removed = queue.remove(1).expect("remove");
    assert_eq!(removed, image("b"));
    assert_eq!(names(&queue), ["a", "c", "d"]);
    assert_eq!(queue.locked_indices().collect::<Vec<_>>(), [1, 2]);
    assert_eq!(queue.boundary(), 1);

    assert_eq!(
        queue.remove(9),
        Err(QueueError::OutOfRange { index: 9, len: 3 })
    );
}

#[test]
fn promote_gallery_item_moves_member_to_head() {
    let mut queue = ContentQueue::new(vec![image("x"), gallery(&["g0", "g1", "g2", "g3"])]);
    queue.promote_gallery_item(1, 2).expect("promote");

    let Media::Gallery { media } = &queue.items()[1].media else {
        panic!("expected gallery");
    };
    assert_eq!(
        media,
        &vec![
            gallery_member("g2"),
            gallery_member("g0"),
            gallery_member("g1"),
            gallery_member("g3"),
        ]
    );
}

#[test]
fn promote_rejects_non_gallery_and_bad_member() {
    let mut queue = ContentQueue::new(vec![image("x"), gallery(&["g0", "g1"])]);
    assert_eq!(
        queue.promote_gallery_item(0, 0),
        Err(QueueError::NotAGallery { index: 0 })
    );
    assert_eq!(
        queue.promote_gallery_item(1, 2),
        Err(QueueError::GalleryMemberOutOfRange {
            index: 1,
            member: 2,
            size: 2
        })
    );
    assert!(matches!(
        queue.promote_gallery_item(5, 0),
        Err(QueueError::OutOfRange { .. })
    ));
    assert_eq!(queue.revision(), 0);
}

#[test]
fn out_of_range_counts_as_locked() {
    let queue = queue_of(&["a", "b"], 2);
    assert!(!queue.is_locked(0));
    assert!(!queue.is_locked(1));
    assert!(queue.is_locked(2));
    assert!(ContentQueue::default().is_locked(0));
}
