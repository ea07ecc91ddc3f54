use crate::fixtures::{locked, queue_of};
use crate::queue::ContentQueue;

fn assert_suffix(queue: &ContentQueue) {
    let b = queue.boundary();
    let expected: Vec<usize> = (b..queue.len()).collect();
    assert_eq!(locked(queue), expected, "locks must form a suffix");
}

#[test]
fn boundary_is_len_when_nothing_locked() {
    let queue = queue_of(&["a", "b", "c"], 3);
    assert_eq!(queue.boundary(), 3);
    assert_eq!(queue.next_pending_index(), Some(2));
}

#[test]
fn next_pending_is_none_for_empty_or_fully_locked() {
    assert_eq!(ContentQueue::default().next_pending_index(), None);
    assert_eq!(queue_of(&["a", "b"], 0).next_pending_index(), None);
}

#[test]
fn lock_click_scenario() {
    let mut queue = queue_of(&["A", "B", "C", "D"], 4);

    assert_eq!(queue.set_boundary(2), 2);
    assert_eq!(locked(&queue), [2, 3]);
    assert_eq!(queue.next_pending_index(), Some(1));

    assert_eq!(queue.set_boundary(1), 1);
    assert_eq!(locked(&queue), [1, 2, 3]);

    // B is now the frontier item; clicking it again toggles only B off.
    assert_eq!(queue.set_boundary(1), 2);
    assert_eq!(locked(&queue), [2, 3]);
}

#[test]
fn frontier_toggle_and_jump() {
    for b in 1..5 {
        for x in 0..5 {
            let mut queue = queue_of(&["a", "b", "c", "d", "e"], b);
            let result = queue.set_boundary(x);
            if x == b {
                assert_eq!(result, b + 1);
            } else {
                assert_eq!(result, x);
            }
            assert_suffix(&queue);
        }
    }
}

#[test]
fn clicking_last_frontier_item_unlocks_everything() {
    let mut queue = queue_of(&["a", "b", "c"], 2);
    assert_eq!(queue.set_boundary(2), 3);
    assert!(locked(&queue).is_empty());
    assert_eq!(queue.next_pending_index(), Some(2));
}

#[test]
fn set_boundary_repairs_corrupted_locks() {
    let mut queue = queue_of(&["a", "b", "c", "d"], 4);
    queue.items[0].locked = true;
    queue.items[2].locked = true;
    assert_eq!(queue.boundary(), 0);

    assert_eq!(queue.set_boundary(3), 3);
    assert_eq!(locked(&queue), [3]);
}

#[test]
fn suffix_holds_across_mixed_operations() {
    let mut queue = queue_of(&["a", "b", "c", "d", "e", "f"], 6);
    // (op, a, b): 0 = lock click on a, 1 = guarded swap a<->b, 2 = remove a
    let script: [(u8, usize, usize); 10] = [
        (0, 4, 0),
        (1, 0, 1),
        (1, 3, 4),
        (0, 1, 0),
        (2, 2, 0),
        (0, 1, 0),
        (1, 0, 2),
        (2, 0, 0),
        (0, 3, 0),
        (0, 0, 0),
    ];
    for (op, a, b) in script {
        match op {
            0 => {
                queue.set_boundary(a);
            }
            1 => {
                if !queue.is_locked(a) && !queue.is_locked(b) {
                    queue.swap(a, b).expect("both unlocked and in range");
                }
            }
            _ => {
                let _ = queue.remove(a);
            }
        }
        assert_suffix(&queue);
    }
}
