use std::sync::Arc;

use config::LOGOUT_CLASS;
use glide_engine::{
    Controller, ControllerService, Error, MockEngine, Outcome, Slot, test_support::builtin_only,
};
use glide_ids::WindowId;
use glide_world::{World, WorldCfg, WorldEvent, WorldView, WorldWindow};

fn service() -> (Arc<World>, Arc<MockEngine>, glide_engine::ControllerHandle) {
    let world = Arc::new(World::default());
    let engine = Arc::new(MockEngine::new());
    let controller = Controller::new(world.clone(), engine.clone(), builtin_only(&["logout"]));
    (world, engine, ControllerService::spawn(controller))
}

#[tokio::test(flavor = "current_thread")]
async fn commands_are_processed_in_arrival_order() {
    let (_world, engine, handle) = service();
    let window = WorldWindow::new(1, LOGOUT_CLASS);
    handle.send_event(WorldEvent::Added(window.clone())).unwrap();
    handle.send_event(WorldEvent::Closed(window)).unwrap();
    let exit = handle
        .handle("logout", WindowId::new(1), Slot::EXIT)
        .await
        .unwrap();
    assert!(exit.is_some());
    assert_eq!(engine.call_names(), vec!["submit", "cancel", "submit"]);
    assert_eq!(handle.live_count().await.unwrap(), 1);
}

#[tokio::test(flavor = "current_thread")]
async fn dispatch_returns_outcomes_and_completions_clear_slots() {
    let (_world, engine, handle) = service();
    let out = handle
        .dispatch(WorldEvent::Added(WorldWindow::new(2, LOGOUT_CLASS)))
        .await
        .unwrap();
    let started = out[0].started_handle().unwrap();
    assert!(engine.finish(started));
    let done = handle.completed(started).await.unwrap();
    assert!(matches!(done, Outcome::Completed { handle: h, .. } if h == started));
    assert_eq!(handle.live_count().await.unwrap(), 0);
}

#[tokio::test(flavor = "current_thread")]
async fn pump_forwards_world_events() {
    let (world, engine, handle) = service();
    let pump = handle.pump(world.subscribe());
    world.add_window(WorldWindow::new(3, LOGOUT_CLASS));
    let mut live = 0;
    for _ in 0..100 {
        tokio::task::yield_now().await;
        live = handle.live_count().await.unwrap();
        if live == 1 {
            break;
        }
    }
    assert_eq!(live, 1);
    assert_eq!(engine.submit_count(), 1);

    let controller = handle.shutdown().await.unwrap();
    assert_eq!(controller.live_count(), 1);
    assert!(matches!(handle.live_count().await, Err(Error::ServiceClosed)));
    pump.abort();
}

#[tokio::test(flavor = "current_thread")]
async fn pump_reconciles_after_dropped_events() {
    let world = Arc::new(World::new(WorldCfg {
        event_capacity: 4,
        ..WorldCfg::default()
    }));
    let engine = Arc::new(MockEngine::new());
    let controller = Controller::new(world.clone(), engine.clone(), builtin_only(&["logout"]));
    let handle = ControllerService::spawn(controller);
    let cursor = world.subscribe();

    let greeter = WorldWindow::new(1, LOGOUT_CLASS);
    world.add_window(greeter.clone());
    world.close_window(WindowId::new(1));
    // Feed the lifecycle directly and let the world's copies overflow.
    handle.dispatch(WorldEvent::Added(greeter.clone())).await.unwrap();
    handle.dispatch(WorldEvent::Closed(greeter)).await.unwrap();
    assert_eq!(handle.live_count().await.unwrap(), 1);

    world.delete_window(WindowId::new(1));
    for raw in 10..14 {
        world.add_window(WorldWindow::new(raw, "org.kde.konsole"));
    }
    let pump = handle.pump(cursor);
    let mut live = 1;
    for _ in 0..100 {
        tokio::task::yield_now().await;
        live = handle.live_count().await.unwrap();
        if live == 0 {
            break;
        }
    }
    assert_eq!(live, 0);
    pump.abort();
}
