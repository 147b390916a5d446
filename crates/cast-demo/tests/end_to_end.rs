//! Host and viewer sessions talking to each other over the in-process hub.

use std::sync::Arc;
use std::time::Duration;

use cast_core::transport::loopback::LoopbackHub;
use cast_core::{ControlConstants, RemoteControlCommand, Rotation, TouchAction};
use cast_demo::scenario::{self, ScenarioOptions};
use cast_host::infrastructure::capture::TestPatternSource;
use cast_host::infrastructure::input_injection::{InjectedEvent, RecordingInjector};
use cast_host::{DeviceContext, HostSession, HostState};
use cast_viewer::{ViewerError, ViewerSession, ViewerState, DEFAULT_CONNECT_TIMEOUT};

fn options(viewers: usize, injector: Arc<RecordingInjector>) -> ScenarioOptions {
    ScenarioOptions {
        viewers,
        frame_rate: 30,
        width: 1080,
        height: 2340,
        rotation: Rotation::Deg0,
        constants: ControlConstants::default(),
        connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        injector,
    }
}

#[tokio::test]
async fn test_scenario_connects_every_viewer_and_cleans_up() {
    // Arrange
    let injector = Arc::new(RecordingInjector::new());

    // Act
    let report = tokio_test::assert_ok!(scenario::run(options(3, injector.clone())).await);

    // Assert
    assert_eq!(report.roster.len(), 3);
    assert!(report.roster.iter().all(|(_, full)| *full));
    assert_eq!(report.commands_sent, 4);
    assert_eq!(report.open_legs_after, 0);
    let touches: Vec<(i32, u32, u32)> = injector
        .touches()
        .iter()
        .map(|t| (t.action_code, t.x, t.y))
        .collect();
    assert_eq!(touches, vec![(0, 540, 2100), (2, 540, 1200), (1, 540, 300)]);
    assert_eq!(
        injector.events()[3..].to_vec(),
        vec![
            InjectedEvent::KeyDown("AppSwitch".to_string()),
            InjectedEvent::KeyUp("AppSwitch".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_viewer_touch_lands_on_rotated_device() {
    // Arrange
    let hub = LoopbackHub::new();
    let (host_endpoint, mut host_events) = hub.endpoint();
    let (mut host, _notes) = HostSession::new(Arc::new(host_endpoint), ControlConstants::default());
    host.start_sharing(&TestPatternSource::new(), 30).await.unwrap();
    let injector = Arc::new(RecordingInjector::new());
    let device = DeviceContext::new(1000, 2000, Rotation::Deg90, injector.clone());
    let share_id = host.share_id().cloned().unwrap();

    let (endpoint, mut events) = hub.endpoint();
    let (mut viewer, _vnotes) = ViewerSession::new(Arc::new(endpoint), DEFAULT_CONNECT_TIMEOUT);

    // Act
    let pending = viewer.connect(share_id.as_str()).await;
    host.pump(&mut host_events, &device).await;
    assert_eq!(viewer.run_until_settled(&mut events).await, ViewerState::Connected);
    assert!(pending.outcome().await.is_ok());
    viewer
        .send_command(&RemoteControlCommand::touch(TouchAction::Down, 0.25, 0.75, 4))
        .await;
    host.pump(&mut host_events, &device).await;

    // Assert
    let touches = injector.touches();
    assert_eq!(touches.len(), 1);
    assert_eq!((touches[0].x, touches[0].y, touches[0].pointer_id), (750, 1500, 4));
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_viewer_times_out_with_zero_open_legs() {
    // Arrange: the host registers but never processes its events.
    let hub = LoopbackHub::new();
    let (host_endpoint, _host_events) = hub.endpoint();
    let (mut host, _notes) = HostSession::new(Arc::new(host_endpoint), ControlConstants::default());
    host.start_sharing(&TestPatternSource::new(), 30).await.unwrap();
    let share_id = host.share_id().cloned().unwrap();

    let (endpoint, mut events) = hub.endpoint();
    let (mut viewer, _vnotes) = ViewerSession::new(Arc::new(endpoint), Duration::from_secs(30));

    // Act
    let pending = viewer.connect(share_id.as_str()).await;
    assert_eq!(hub.open_legs(), 2);
    let settled = viewer.run_until_settled(&mut events).await;

    // Assert
    assert_eq!(settled, ViewerState::Error);
    assert!(matches!(pending.outcome().await, Err(ViewerError::Timeout)));
    assert_eq!(hub.open_legs(), 0);
    assert_eq!(host.state(), HostState::Ready);
}

#[tokio::test]
async fn test_host_stop_disconnects_the_viewer() {
    let hub = LoopbackHub::new();
    let (host_endpoint, mut host_events) = hub.endpoint();
    let (mut host, _notes) = HostSession::new(Arc::new(host_endpoint), ControlConstants::default());
    host.start_sharing(&TestPatternSource::new(), 30).await.unwrap();
    let device = DeviceContext::new(1080, 2340, Rotation::Deg0, Arc::new(RecordingInjector::new()));
    let share_id = host.share_id().cloned().unwrap();
    let (endpoint, mut events) = hub.endpoint();
    let (mut viewer, _vnotes) = ViewerSession::new(Arc::new(endpoint), DEFAULT_CONNECT_TIMEOUT);
    let _pending = viewer.connect(share_id.as_str()).await;
    host.pump(&mut host_events, &device).await;
    viewer.run_until_settled(&mut events).await;

    host.stop_sharing().await;
    viewer.pump(&mut events).await;

    assert_eq!(viewer.state(), ViewerState::Disconnected);
    assert!(viewer.remote_stream().is_none());
    assert_eq!(hub.open_legs(), 0);
}
