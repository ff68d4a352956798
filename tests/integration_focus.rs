use std::collections::BTreeSet;

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use term_compositor::{Desktop, Rect, WindowFlags, WindowId};

fn siblings(count: usize) -> (Desktop, Vec<WindowId>) {
    let mut desktop = Desktop::new(80, 24).unwrap();
    let root = desktop.root();
    let ids = (0..count)
        .map(|i| {
            desktop
                .create_window(root, Rect::new(i as i32 * 5, 0, 30, 10), WindowFlags::frame())
                .unwrap()
        })
        .collect();
    (desktop, ids)
}

fn z(desktop: &Desktop, id: WindowId) -> u32 {
    desktop.window(id).unwrap().z_value()
}

fn assert_consistent_chain(desktop: &Desktop, parent: WindowId) {
    let tree = desktop.tree();
    let paint: BTreeSet<_> = tree.children(parent).into_iter().collect();
    let stacked = tree.z_order(parent);
    assert_eq!(stacked.len(), paint.len());
    assert_eq!(stacked.iter().copied().collect::<BTreeSet<_>>(), paint);
    // front to back means strictly descending z, ending at zero
    let values: Vec<u32> = stacked.iter().map(|id| z(desktop, *id)).collect();
    let expected: Vec<u32> = (0..values.len() as u32).rev().collect();
    assert_eq!(values, expected);
}

#[test]
fn focusing_a_back_window_raises_it_by_one_step() {
    let mut desktop = Desktop::new(80, 24).unwrap();
    let root = desktop.root();
    let a = desktop
        .create_window(root, Rect::new(0, 0, 40, 24), WindowFlags::BORDER)
        .unwrap();
    let b = desktop
        .create_window(root, Rect::new(20, 0, 40, 24), WindowFlags::BORDER)
        .unwrap();
    desktop.reposition(a, Rect::new(60, 0, 20, 24));
    assert_eq!((z(&desktop, a), z(&desktop, b)), (0, 1));

    assert!(desktop.set_focus(a));
    assert_eq!(z(&desktop, a), 1);
    assert_eq!(z(&desktop, b), 0);
    assert_eq!(desktop.focused(), a);
    assert_consistent_chain(&desktop, root);
}

#[test]
fn chain_stays_a_permutation_under_random_focus() {
    let (mut desktop, ids) = siblings(5);
    let root = desktop.root();
    for pick in [3usize, 0, 4, 4, 1, 2, 0, 3] {
        desktop.set_focus(ids[pick]);
        assert_eq!(desktop.focused(), ids[pick]);
        assert_consistent_chain(&desktop, root);
    }
}

#[test]
fn focusing_a_nested_leaf_raises_every_ancestor() {
    let (mut desktop, ids) = siblings(3);
    let root = desktop.root();
    let nested = desktop
        .create_window(ids[0], Rect::new(1, 1, 5, 2), WindowFlags::empty())
        .unwrap();
    assert_eq!(desktop.focused(), ids[2]);
    desktop.set_focus(nested);
    assert_eq!(desktop.focused(), nested);
    assert_eq!(desktop.tree().z_order(root)[0], ids[0]);
    assert!(desktop.tree().on_focus_chain(ids[0]));
    assert!(!desktop.tree().on_focus_chain(ids[2]));
}

#[test]
fn destroying_the_focused_window_moves_focus_down_the_stack() {
    let (mut desktop, ids) = siblings(3);
    let root = desktop.root();
    desktop.set_focus(ids[0]);
    assert!(desktop.destroy_window(ids[0]));
    assert_eq!(desktop.focused(), ids[2]);
    assert_consistent_chain(&desktop, root);
    assert!(!desktop.destroy_window(root));
}

#[test]
fn tab_keys_walk_paint_order() {
    let (mut desktop, ids) = siblings(3);
    let tab = |code| Event::Key(KeyEvent::new(code, KeyModifiers::NONE));
    assert_eq!(desktop.focused(), ids[2]);
    desktop.handle_input(tab(KeyCode::Tab));
    assert_eq!(desktop.focused(), ids[0]);
    desktop.handle_input(tab(KeyCode::Tab));
    assert_eq!(desktop.focused(), ids[1]);
    desktop.handle_input(tab(KeyCode::BackTab));
    assert_eq!(desktop.focused(), ids[0]);
}

#[test]
fn clicking_raises_the_window_under_the_pointer() {
    let (mut desktop, ids) = siblings(2);
    // (2, 3) is only covered by the first window
    desktop.handle_input(Event::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column: 2,
        row: 3,
        modifiers: KeyModifiers::NONE,
    }));
    assert_eq!(desktop.focused(), ids[0]);
    // the overlap now belongs to the raised window
    assert_eq!(desktop.tree().hit_test(10, 3), Some(ids[0]));
}
