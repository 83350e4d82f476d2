use glide_world::{
    World, WorldView, WorldWindow,
    test_support::window,
};

#[test]
fn stacking_order_is_bottom_first_and_raise_moves_to_top() {
    let world = World::default();
    world.add_window(window(1, "a"));
    world.add_window(window(2, "b"));
    world.add_window(window(3, "c"));

    let ids: Vec<u64> = world.stacking_order().iter().map(|w| w.id.get()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    assert!(world.raise(1.into()));
    let ids: Vec<u64> = world.stacking_order().iter().map(|w| w.id.get()).collect();
    assert_eq!(ids, vec![2, 3, 1]);
    assert_eq!(world.topmost().map(|w| w.id.get()), Some(1));
}

#[test]
fn snapshot_is_not_a_live_view() {
    let world = World::default();
    world.add_window(window(1, "a"));
    let snapshot = world.stacking_order();
    world.add_window(window(2, "b"));
    world.delete_window(1.into());
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].id.get(), 1);
}

#[test]
fn closed_windows_stay_stacked_until_deleted() {
    let world = World::default();
    world.add_window(WorldWindow::new(5, "org.kde.konsole"));
    assert!(world.close_window(5.into()).is_some());
    assert!(world.is_closed(5.into()));
    assert_eq!(world.closed_windows(), vec![5.into()]);
    assert!(world.get(5.into()).is_some());

    assert!(world.close_window(5.into()).is_none(), "double close is ignored");
    assert!(world.delete_window(5.into()));
    assert!(world.get(5.into()).is_none());
    assert!(!world.delete_window(5.into()));
}

#[test]
fn property_setters_only_report_real_changes() {
    let world = World::default();
    world.add_window(window(1, "a"));
    assert!(world.set_minimized(1.into(), true));
    assert!(!world.set_minimized(1.into(), true));
    assert!(world.get(1.into()).is_some_and(|w| w.minimized));
    assert!(!world.set_fullscreen(9.into(), true), "unknown window");
}

#[test]
fn windows_on_desktop_filters_snapshot() {
    let world = World::default();
    world.add_window(window(1, "a").on_desktop(1));
    world.add_window(window(2, "b").on_desktop(2));
    let on_two = world.windows_on_desktop(2);
    assert_eq!(on_two.len(), 1);
    assert_eq!(on_two[0].id.get(), 2);
    assert_eq!(world.current_desktop(), 1);
}
