//! One scripted broadcast: a host, `viewers` viewer sessions, one gesture and
//! one key tap, then a full shutdown.
//!
//! # Sequence
//!
//! ```text
//! host.start_sharing ──► every viewer.connect ──► host.pump (answers)
//!        ──► viewer.run_until_settled ──► viewer 0 sends swipe + recents
//!        ──► host.pump (dispatch) ──► disconnect all, stop_sharing
//! ```

use std::sync::Arc;
use std::time::Duration;

use cast_core::transport::loopback::LoopbackHub;
use cast_core::{
    ControlConstants, ElementBounds, PeerId, RemoteControlCommand, Rotation, TransportError,
};
use cast_host::infrastructure::capture::TestPatternSource;
use cast_host::{DeviceContext, HostError, HostSession, InputInjector};
use cast_viewer::{TouchController, ViewerError, ViewerSession, ViewerState};
use thiserror::Error;
use tracing::{info, warn};

/// Size of the viewer's video element, in client pixels.
const VIDEO_BOUNDS: ElementBounds = ElementBounds {
    left: 0.0,
    top: 0.0,
    width: 360.0,
    height: 780.0,
};

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("host failed to start: {0}")]
    Host(#[from] HostError),

    #[error("viewer {index} failed to connect: {source}")]
    Viewer {
        index: usize,
        #[source]
        source: ViewerError,
    },
}

/// Knobs for one run.
#[derive(Clone)]
pub struct ScenarioOptions {
    pub viewers: usize,
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    pub rotation: Rotation,
    pub constants: ControlConstants,
    pub connect_timeout: Duration,
    pub injector: Arc<dyn InputInjector>,
}

/// What happened during a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    pub share_id: PeerId,
    /// Viewers in roster order, with whether both legs were attached.
    pub roster: Vec<(PeerId, bool)>,
    pub commands_sent: usize,
    /// Legs still open after shutdown.  Zero on a clean run.
    pub open_legs_after: usize,
}

/// Runs the scenario on a fresh in-process hub.
///
/// # Errors
///
/// Returns [`ScenarioError`] if the host cannot start or any viewer fails to
/// connect.  Everything opened so far is shut down first.
pub async fn run(options: ScenarioOptions) -> Result<ScenarioReport, ScenarioError> {
    let hub = LoopbackHub::new();

    let (host_endpoint, mut host_events) = hub.endpoint();
    let (mut host, _host_notes) = HostSession::new(Arc::new(host_endpoint), options.constants);
    let device = DeviceContext::new(
        options.width,
        options.height,
        options.rotation,
        options.injector.clone(),
    );
    host.start_sharing(&TestPatternSource::new(), options.frame_rate)
        .await?;
    let Some(share_id) = host.share_id().cloned() else {
        return Err(HostError::Registration(TransportError::NotRegistered).into());
    };
    info!(share_id = %share_id, viewers = options.viewers, "host is sharing");

    let mut viewers = Vec::with_capacity(options.viewers);
    let mut pending = Vec::with_capacity(options.viewers);
    for _ in 0..options.viewers {
        let (endpoint, events) = hub.endpoint();
        let (mut viewer, _notes) = ViewerSession::new(Arc::new(endpoint), options.connect_timeout);
        pending.push(viewer.connect(share_id.as_str()).await);
        viewers.push((viewer, events));
    }
    host.pump(&mut host_events, &device).await;

    let mut failure = None;
    for (index, ((viewer, events), attempt)) in viewers.iter_mut().zip(pending).enumerate() {
        if viewer.run_until_settled(events).await != ViewerState::Connected {
            let source = attempt.outcome().await.err().unwrap_or(ViewerError::Cancelled);
            warn!(index, error = %source, "viewer did not connect");
            if failure.is_none() {
                failure = Some(ScenarioError::Viewer { index, source });
            }
        }
    }

    let mut commands_sent = 0;
    if failure.is_none() {
        if let Some((viewer, events)) = viewers.first_mut() {
            viewer.pump(events).await;
            for command in gesture() {
                if viewer.send_command(&command).await {
                    commands_sent += 1;
                }
            }
        }
        host.pump(&mut host_events, &device).await;
        // Let the key-up of the tap land before tearing down.
        tokio::time::sleep(options.constants.key_tap + Duration::from_millis(10)).await;
    }

    let roster = host
        .roster()
        .iter()
        .map(|r| (r.id.clone(), r.is_fully_connected()))
        .collect();

    for (viewer, _) in viewers.iter_mut() {
        viewer.disconnect().await;
    }
    host.stop_sharing().await;
    let open_legs_after = hub.open_legs();
    info!(open_legs_after, "scenario shut down");

    match failure {
        Some(e) => Err(e),
        None => Ok(ScenarioReport {
            share_id,
            roster,
            commands_sent,
            open_legs_after,
        }),
    }
}

/// A swipe up from the bottom of the video, then the recents key.
fn gesture() -> Vec<RemoteControlCommand> {
    let mut pad = TouchController::new();
    let mut commands = vec![pad.pointer_down(1, 180.0, 700.0, &VIDEO_BOUNDS)];
    commands.extend(pad.pointer_move(1, 180.0, 400.0, &VIDEO_BOUNDS));
    commands.extend(pad.pointer_up(1, 180.0, 100.0, &VIDEO_BOUNDS));
    commands.push(pad.recents());
    commands
}
