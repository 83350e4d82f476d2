use std::time::Duration;

use glide_world::{
    EventKind, World, WorldEvent, WorldView, filter_kinds,
    test_support::{drain_kinds, window},
};

#[test]
fn events_arrive_in_order() {
    let world = World::default();
    let mut cursor = world.subscribe();
    world.add_window(window(1, "a"));
    world.set_minimized(1.into(), true);
    world.close_window(1.into());
    world.delete_window(1.into());
    world.switch_desktop(2);

    assert_eq!(
        drain_kinds(&mut cursor),
        vec![
            EventKind::Added,
            EventKind::PropertyChanged,
            EventKind::Closed,
            EventKind::Deleted,
            EventKind::DesktopChanged,
        ]
    );
}

#[test]
fn re_adding_a_closing_window_publishes_added_again() {
    let world = World::default();
    world.add_window(window(1, "a"));
    world.close_window(1.into());
    let mut cursor = world.subscribe();
    assert!(world.add_window(window(1, "a")));
    assert!(!world.is_closed(1.into()));
    assert!(!world.add_window(window(1, "a")), "already open");
    assert_eq!(drain_kinds(&mut cursor), vec![EventKind::Added]);
}

#[test]
fn property_event_carries_new_value() {
    let world = World::default();
    world.add_window(window(3, "a"));
    let mut cursor = world.subscribe_filtered(Some(filter_kinds(&[EventKind::PropertyChanged])));
    world.set_minimized(3.into(), true);
    match cursor.try_next() {
        Some(WorldEvent::PropertyChanged { window, .. }) => assert!(window.minimized),
        other => panic!("unexpected event: {other:?}"),
    }
}

#[test]
fn subscriptions_end_when_cursor_dropped() {
    let world = World::default();
    let cursor = world.subscribe();
    assert_eq!(world.subscriptions(), 1);
    drop(cursor);
    assert_eq!(world.subscriptions(), 0);
}

#[tokio::test]
async fn async_reader_wakes_on_publish() {
    let world = std::sync::Arc::new(World::default());
    let mut cursor = world.subscribe();
    let writer = world.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        writer.switch_desktop(3);
    });
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    let event = cursor.next_until(deadline).await;
    assert_eq!(event, Some(WorldEvent::DesktopChanged { old: 1, new: 3 }));
}

#[tokio::test]
async fn async_reader_times_out_when_idle() {
    let world = World::default();
    let mut cursor = world.subscribe();
    let deadline = tokio::time::Instant::now() + Duration::from_millis(10);
    assert_eq!(cursor.next_until(deadline).await, None);
}
