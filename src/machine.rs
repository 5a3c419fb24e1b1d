//! The capture lifecycle state machine.
//!
//! [`CaptureMachine`] is the single source of truth for what the UI shows and
//! the single owner of the three scarce resources: the camera session, the
//! crop session and the in-flight submission. At most one of them is alive
//! at any time.
//!
//! # Transitions
//!
//! | From | Event | To |
//! |---|---|---|
//! | Idle | request capture | CameraOpen (pending camera) |
//! | CameraOpen | camera acquired | CameraOpen (live) |
//! | CameraOpen | camera denied / missing | Failed |
//! | CameraOpen | capture frame | ImageCaptured |
//! | CameraOpen | no usable frame | Failed |
//! | CameraOpen | cancel | Idle |
//! | ImageCaptured | crop engine missing | Failed |
//! | ImageCaptured | adjust | ImageCaptured |
//! | ImageCaptured | retake | CameraOpen (pending camera) |
//! | ImageCaptured | submit | Submitting |
//! | ImageCaptured | empty render | Failed |
//! | Submitting | valid response | Completed |
//! | Submitting | network error / invalid response | Failed |
//! | Completed | reset | Idle |
//! | Failed | retry | Idle |
//!
//! Anything not in the table is ignored, never an error.
//!
//! # Resources and epochs
//!
//! Every state change goes through one step that first releases whatever is
//! alive (camera tracks stopped, crop surface destroyed, frame dropped,
//! in-flight tag cleared) and then bumps the [`Epoch`].
//!
//! The machine itself never awaits. Work that has to suspend is handed out
//! as an [`Effect`] tagged with the current epoch; its outcome comes back as
//! an [`Event`] carrying that epoch. If the machine has moved on in the
//! meantime, the outcome is discarded (a late camera session is released on
//! the spot) instead of being applied to the wrong state.

use crate::camera::{CameraError, CameraManager, CameraSession};
use crate::crop::{CropAction, CropBox, CropEngine, CropOptions, CropSession, OutputSpec};
use crate::error::ErrorInfo;
use crate::submit::SubmitError;
use crate::types::{CapturedFrame, FenResult, NormalizedImage};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Generation tag for in-flight work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    /// Camera requested; live once the acquisition completes.
    CameraOpen,
    ImageCaptured,
    Submitting,
    Completed(FenResult),
    Failed(ErrorInfo),
}

impl CaptureState {
    pub fn phase(&self) -> Phase {
        match self {
            CaptureState::Idle => Phase::Idle,
            CaptureState::CameraOpen => Phase::CameraOpen,
            CaptureState::ImageCaptured => Phase::ImageCaptured,
            CaptureState::Submitting => Phase::Submitting,
            CaptureState::Completed(_) => Phase::Completed,
            CaptureState::Failed(_) => Phase::Failed,
        }
    }
}

/// Payload-free discriminant of [`CaptureState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Idle,
    CameraOpen,
    ImageCaptured,
    Submitting,
    Completed,
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::CameraOpen => "camera-open",
            Phase::ImageCaptured => "image-captured",
            Phase::Submitting => "submitting",
            Phase::Completed => "completed",
            Phase::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Something the user asked for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    RequestCapture,
    CaptureFrame,
    Cancel,
    Retake,
    Adjust(CropAction),
    Submit,
    Reset,
    Retry,
}

#[derive(Debug)]
pub enum Event {
    User(Intent),
    CameraAcquired {
        epoch: Epoch,
        result: Result<CameraSession, CameraError>,
    },
    SubmissionFinished {
        epoch: Epoch,
        result: Result<FenResult, SubmitError>,
    },
}

impl From<Intent> for Event {
    fn from(intent: Intent) -> Self {
        Event::User(intent)
    }
}

/// Work the machine needs done outside of itself.
#[derive(Debug)]
pub enum Effect {
    /// Acquire a camera session and report back with [`Event::CameraAcquired`].
    AcquireCamera { epoch: Epoch },
    /// Upload `image` and report back with [`Event::SubmissionFinished`].
    Submit { epoch: Epoch, image: NormalizedImage },
    /// Show a transient notification.
    Notify(ErrorInfo),
}

/// Which owned resources are alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LiveResources {
    pub camera: bool,
    pub crop: bool,
    pub in_flight: bool,
}

impl LiveResources {
    pub fn count(&self) -> usize {
        usize::from(self.camera) + usize::from(self.crop) + usize::from(self.in_flight)
    }
}

/// Point-in-time view of a machine, for presentation and tests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CaptureSnapshot {
    pub state: CaptureState,
    pub epoch: Epoch,
    pub resources: LiveResources,
}

impl CaptureSnapshot {
    pub fn phase(&self) -> Phase {
        self.state.phase()
    }
}

pub struct CaptureMachine {
    state: CaptureState,
    epoch: Epoch,
    camera: CameraManager,
    crop_engine: Arc<dyn CropEngine>,
    crop_options: CropOptions,
    output: OutputSpec,
    camera_session: Option<CameraSession>,
    frame: Option<CapturedFrame>,
    crop_session: Option<CropSession>,
    in_flight: Option<Epoch>,
}

impl CaptureMachine {
    pub fn new(camera: CameraManager, crop_engine: Arc<dyn CropEngine>) -> Self {
        Self {
            state: CaptureState::Idle,
            epoch: Epoch::default(),
            camera,
            crop_engine,
            crop_options: CropOptions::default(),
            output: OutputSpec::default(),
            camera_session: None,
            frame: None,
            crop_session: None,
            in_flight: None,
        }
    }

    pub fn with_crop_options(mut self, options: CropOptions) -> Self {
        self.crop_options = options;
        self
    }

    pub fn with_output(mut self, output: OutputSpec) -> Self {
        self.output = output;
        self
    }

    pub fn state(&self) -> &CaptureState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// The frame being cropped, while in `ImageCaptured`.
    pub fn frame(&self) -> Option<&CapturedFrame> {
        self.frame.as_ref()
    }

    pub fn crop_selection(&self) -> Option<CropBox> {
        self.crop_session.as_ref().and_then(|s| s.selection())
    }

    /// Handle to the camera, for running [`Effect::AcquireCamera`].
    pub fn camera(&self) -> &CameraManager {
        &self.camera
    }

    pub fn resources(&self) -> LiveResources {
        LiveResources {
            camera: self.camera_session.as_ref().is_some_and(|s| s.is_live()),
            crop: self.crop_session.as_ref().is_some_and(|s| s.is_open()),
            in_flight: self.in_flight.is_some(),
        }
    }

    pub fn snapshot(&self) -> CaptureSnapshot {
        CaptureSnapshot {
            state: self.state.clone(),
            epoch: self.epoch,
            resources: self.resources(),
        }
    }

    /// Apply one event and return the work it asks for.
    pub fn handle(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::User(intent) => self.on_intent(intent),
            Event::CameraAcquired { epoch, result } => self.on_camera_acquired(epoch, result),
            Event::SubmissionFinished { epoch, result } => {
                self.on_submission_finished(epoch, result)
            }
        }
    }

    /// Release everything and return to `Idle`. Anything still in flight
    /// becomes stale.
    pub fn teardown(&mut self) {
        self.enter(CaptureState::Idle);
    }

    fn on_intent(&mut self, intent: Intent) -> Vec<Effect> {
        match (self.state.phase(), intent) {
            (Phase::Idle, Intent::RequestCapture) | (Phase::ImageCaptured, Intent::Retake) => {
                self.enter(CaptureState::CameraOpen);
                vec![Effect::AcquireCamera { epoch: self.epoch }]
            }
            (Phase::CameraOpen, Intent::CaptureFrame) => self.capture(),
            (Phase::CameraOpen, Intent::Cancel)
            | (Phase::Completed, Intent::Reset)
            | (Phase::Failed, Intent::Retry) => {
                self.enter(CaptureState::Idle);
                Vec::new()
            }
            (Phase::ImageCaptured, Intent::Adjust(action)) => {
                if let Some(session) = self.crop_session.as_mut() {
                    session.adjust(action);
                }
                Vec::new()
            }
            (Phase::ImageCaptured, Intent::Submit) => self.submit(),
            (phase, intent) => {
                debug!(%phase, ?intent, "ignored intent");
                Vec::new()
            }
        }
    }

    fn capture(&mut self) -> Vec<Effect> {
        let Some(session) = self.camera_session.as_mut() else {
            debug!("capture ignored: camera still pending");
            return Vec::new();
        };
        let frame = match self.camera.capture_frame(session) {
            Ok(frame) => frame,
            Err(e) => return self.fail(e.into()),
        };

        self.enter(CaptureState::ImageCaptured);
        match CropSession::open(self.crop_engine.as_ref(), &frame, &self.crop_options) {
            Ok(crop) => {
                self.frame = Some(frame);
                self.crop_session = Some(crop);
                Vec::new()
            }
            Err(e) => self.fail(e.into()),
        }
    }

    fn submit(&mut self) -> Vec<Effect> {
        let Some(crop) = self.crop_session.as_ref() else {
            return Vec::new();
        };
        let image = match crop.finalize(&self.output) {
            Ok(image) => image,
            Err(e) => return self.fail(e.into()),
        };

        self.enter(CaptureState::Submitting);
        self.in_flight = Some(self.epoch);
        vec![Effect::Submit {
            epoch: self.epoch,
            image,
        }]
    }

    fn on_camera_acquired(
        &mut self,
        epoch: Epoch,
        result: Result<CameraSession, CameraError>,
    ) -> Vec<Effect> {
        let current = self.state.phase() == Phase::CameraOpen
            && epoch == self.epoch
            && self.camera_session.is_none();
        if !current {
            debug!(%epoch, current = %self.epoch, "discarding stale camera result");
            if let Ok(mut session) = result {
                self.camera.release(Some(&mut session));
            }
            return Vec::new();
        }

        match result {
            Ok(session) => {
                info!(%epoch, "camera live");
                self.camera_session = Some(session);
                Vec::new()
            }
            Err(e) => self.fail(e.into()),
        }
    }

    fn on_submission_finished(
        &mut self,
        epoch: Epoch,
        result: Result<FenResult, SubmitError>,
    ) -> Vec<Effect> {
        if self.state.phase() != Phase::Submitting || self.in_flight != Some(epoch) {
            debug!(%epoch, current = %self.epoch, "discarding stale submission result");
            return Vec::new();
        }

        match result {
            Ok(fen) => {
                self.enter(CaptureState::Completed(fen));
                Vec::new()
            }
            Err(e) => self.fail(e.into()),
        }
    }

    fn fail(&mut self, info: ErrorInfo) -> Vec<Effect> {
        warn!(kind = %info.kind, message = %info.message, "capture failed");
        self.enter(CaptureState::Failed(info.clone()));
        vec![Effect::Notify(info)]
    }

    fn enter(&mut self, next: CaptureState) {
        self.release_resources();
        let from = self.state.phase();
        self.state = next;
        self.epoch = self.epoch.next();
        debug!(%from, to = %self.state.phase(), epoch = %self.epoch, "transition");
    }

    fn release_resources(&mut self) {
        if let Some(mut session) = self.camera_session.take() {
            self.camera.release(Some(&mut session));
        }
        if let Some(crop) = self.crop_session.take() {
            crop.close();
        }
        self.frame = None;
        self.in_flight = None;
    }
}

impl Drop for CaptureMachine {
    fn drop(&mut self) {
        self.release_resources();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Facing;
    use crate::camera::tests::{MockCamera, MockOutcome};
    use crate::crop::engine::tests::{MockCropEngine, RecordedOp};
    use crate::error::ErrorKind;
    use crate::submit::classify_response;
    use crate::test_helpers::jpeg_dimensions;
    use reqwest::StatusCode;

    struct Rig {
        machine: CaptureMachine,
        camera: Arc<MockCamera>,
        crop: Arc<MockCropEngine>,
    }

    impl Rig {
        fn new(camera: MockCamera, crop: MockCropEngine) -> Self {
            let camera = Arc::new(camera);
            let crop = Arc::new(crop);
            let machine = CaptureMachine::new(
                CameraManager::new(camera.clone(), Facing::Environment),
                crop.clone(),
            );
            Self {
                machine,
                camera,
                crop,
            }
        }

        fn standard() -> Self {
            Self::new(MockCamera::granting(640, 480), MockCropEngine::new())
        }

        fn send(&mut self, event: impl Into<Event>) -> Vec<Effect> {
            let effects = self.machine.handle(event.into());
            self.assert_exclusive();
            effects
        }

        fn assert_exclusive(&self) {
            let res = self.machine.resources();
            assert!(res.count() <= 1, "resources overlap: {res:?}");
            assert!(self.camera.live_tracks() <= 1);
            assert!(self.crop.live_surfaces() <= 1);
            if res.camera {
                assert_eq!(self.crop.live_surfaces(), 0);
            }
            if res.crop || res.in_flight {
                assert_eq!(self.camera.live_tracks(), 0);
            }
        }

        fn assert_nothing_live(&self) {
            assert_eq!(self.machine.resources(), LiveResources::default());
            assert_eq!(self.camera.live_tracks(), 0);
            assert_eq!(self.crop.live_surfaces(), 0);
        }

        /// Request the camera and complete the acquisition.
        async fn open_camera(&mut self, intent: Intent) -> Epoch {
            let effects = self.send(intent);
            let epoch = acquire_epoch(&effects);
            let result = self.machine.camera().acquire().await;
            self.send(Event::CameraAcquired { epoch, result });
            epoch
        }

        async fn capture(&mut self) {
            self.open_camera(Intent::RequestCapture).await;
            self.send(Intent::CaptureFrame);
            assert_eq!(self.machine.phase(), Phase::ImageCaptured);
        }

        /// Submit and return the submission's epoch.
        fn submit(&mut self) -> Epoch {
            let effects = self.send(Intent::Submit);
            match effects.as_slice() {
                [Effect::Submit { epoch, image }] => {
                    assert_eq!(jpeg_dimensions(image.bytes()), (512, 512));
                    *epoch
                }
                other => panic!("expected one submit effect, got {other:?}"),
            }
        }

        fn respond(&mut self, epoch: Epoch, status: StatusCode, body: &str) -> Vec<Effect> {
            let result = classify_response(status, body.as_bytes());
            self.send(Event::SubmissionFinished { epoch, result })
        }
    }

    fn acquire_epoch(effects: &[Effect]) -> Epoch {
        match effects {
            [Effect::AcquireCamera { epoch }] => *epoch,
            other => panic!("expected one acquire effect, got {other:?}"),
        }
    }

    fn notified_kind(effects: &[Effect]) -> ErrorKind {
        match effects {
            [Effect::Notify(info)] => info.kind,
            other => panic!("expected one notification, got {other:?}"),
        }
    }

    fn failed_kind(machine: &CaptureMachine) -> ErrorKind {
        match machine.state() {
            CaptureState::Failed(info) => info.kind,
            other => panic!("expected Failed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_lifecycle_with_retake_leaves_nothing_live() {
        let mut rig = Rig::standard();
        assert_eq!(rig.machine.phase(), Phase::Idle);

        rig.open_camera(Intent::RequestCapture).await;
        assert_eq!(rig.machine.phase(), Phase::CameraOpen);
        assert!(rig.machine.resources().camera);

        rig.send(Intent::CaptureFrame);
        assert_eq!(rig.machine.phase(), Phase::ImageCaptured);
        assert!(rig.machine.resources().crop);
        assert_eq!(rig.machine.frame().map(|f| f.dimensions()), Some((640, 480)));

        rig.open_camera(Intent::Retake).await;
        assert_eq!(rig.machine.phase(), Phase::CameraOpen);
        assert!(rig.machine.frame().is_none());
        assert_eq!(rig.crop.live_surfaces(), 0);

        rig.send(Intent::CaptureFrame);
        assert_eq!(rig.machine.phase(), Phase::ImageCaptured);

        let epoch = rig.submit();
        assert_eq!(rig.machine.phase(), Phase::Submitting);
        assert!(rig.machine.resources().in_flight);

        rig.respond(epoch, StatusCode::OK, r#"{"fen":"8/8/8/8/8/8/8/8 w - - 0 1"}"#);
        assert_eq!(
            rig.machine.state(),
            &CaptureState::Completed(FenResult::new("8/8/8/8/8/8/8/8 w - - 0 1").unwrap())
        );

        rig.send(Intent::Reset);
        assert_eq!(rig.machine.phase(), Phase::Idle);
        rig.assert_nothing_live();
        assert_eq!(rig.camera.opened(), 2);
    }

    #[tokio::test]
    async fn server_error_fails_with_network_failure() {
        let mut rig = Rig::standard();
        rig.capture().await;
        let epoch = rig.submit();

        let effects = rig.respond(epoch, StatusCode::INTERNAL_SERVER_ERROR, "");
        assert_eq!(failed_kind(&rig.machine), ErrorKind::NetworkFailure);
        assert_eq!(notified_kind(&effects), ErrorKind::NetworkFailure);
        rig.assert_nothing_live();
    }

    #[tokio::test]
    async fn missing_fen_fails_with_invalid_response() {
        let mut rig = Rig::standard();
        rig.capture().await;
        let epoch = rig.submit();

        let effects = rig.respond(epoch, StatusCode::OK, r#"{"nofen": true}"#);
        assert_eq!(failed_kind(&rig.machine), ErrorKind::InvalidServerResponse);
        assert_eq!(notified_kind(&effects), ErrorKind::InvalidServerResponse);

        rig.send(Intent::Retry);
        assert_eq!(rig.machine.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn permission_denied_fails_and_notifies_once() {
        let mut rig = Rig::new(MockCamera::new(MockOutcome::Deny), MockCropEngine::new());
        let effects = rig.send(Intent::RequestCapture);
        let epoch = acquire_epoch(&effects);

        let result = rig.machine.camera().acquire().await;
        let effects = rig.send(Event::CameraAcquired { epoch, result });

        assert_eq!(failed_kind(&rig.machine), ErrorKind::PermissionDenied);
        assert_eq!(notified_kind(&effects), ErrorKind::PermissionDenied);
        rig.assert_nothing_live();
    }

    #[tokio::test]
    async fn cancel_releases_camera() {
        let mut rig = Rig::standard();
        rig.open_camera(Intent::RequestCapture).await;
        assert_eq!(rig.camera.live_tracks(), 1);

        rig.send(Intent::Cancel);
        assert_eq!(rig.machine.phase(), Phase::Idle);
        rig.assert_nothing_live();
    }

    #[tokio::test]
    async fn late_camera_session_after_cancel_is_released() {
        let mut rig = Rig::standard();
        let effects = rig.send(Intent::RequestCapture);
        let epoch = acquire_epoch(&effects);
        rig.send(Intent::Cancel);

        let result = rig.machine.camera().acquire().await;
        assert_eq!(rig.camera.live_tracks(), 1);
        rig.send(Event::CameraAcquired { epoch, result });

        assert_eq!(rig.machine.phase(), Phase::Idle);
        rig.assert_nothing_live();
    }

    #[tokio::test]
    async fn crop_engine_missing_fails_and_releases_camera() {
        let mut rig = Rig::new(MockCamera::granting(320, 240), MockCropEngine::unavailable());
        rig.open_camera(Intent::RequestCapture).await;

        let effects = rig.send(Intent::CaptureFrame);
        assert_eq!(failed_kind(&rig.machine), ErrorKind::CropEngineUnavailable);
        assert_eq!(notified_kind(&effects), ErrorKind::CropEngineUnavailable);
        rig.assert_nothing_live();
    }

    #[tokio::test]
    async fn blank_camera_fails_with_image_encoding() {
        let mut rig = Rig::new(MockCamera::new(MockOutcome::Blank), MockCropEngine::new());
        rig.open_camera(Intent::RequestCapture).await;

        let effects = rig.send(Intent::CaptureFrame);
        assert_eq!(failed_kind(&rig.machine), ErrorKind::ImageEncodingFailed);
        assert_eq!(notified_kind(&effects), ErrorKind::ImageEncodingFailed);
        rig.assert_nothing_live();
    }

    #[tokio::test]
    async fn empty_render_fails_on_submit_and_closes_crop() {
        let mut rig = Rig::new(MockCamera::granting(320, 240), MockCropEngine::blank());
        rig.capture().await;

        let effects = rig.send(Intent::Submit);
        assert_eq!(failed_kind(&rig.machine), ErrorKind::ImageEncodingFailed);
        assert_eq!(notified_kind(&effects), ErrorKind::ImageEncodingFailed);
        rig.assert_nothing_live();
    }

    #[tokio::test]
    async fn stale_submission_after_teardown_is_ignored() {
        let mut rig = Rig::standard();
        rig.capture().await;
        let epoch = rig.submit();

        rig.machine.teardown();
        let idle_epoch = rig.machine.epoch();
        assert_eq!(rig.machine.phase(), Phase::Idle);

        let effects = rig.respond(epoch, StatusCode::OK, r#"{"fen":"8/8/8/8/8/8/8/8 w - - 0 1"}"#);
        assert!(effects.is_empty());
        assert_eq!(rig.machine.state(), &CaptureState::Idle);
        assert_eq!(rig.machine.epoch(), idle_epoch);
    }

    #[tokio::test]
    async fn duplicate_result_after_reset_is_ignored() {
        let mut rig = Rig::standard();
        rig.capture().await;
        let epoch = rig.submit();
        rig.respond(epoch, StatusCode::OK, r#"{"fen":"4k3/8/8/8/8/8/8/4K3 w - - 0 1"}"#);
        rig.send(Intent::Reset);

        let effects = rig.respond(epoch, StatusCode::INTERNAL_SERVER_ERROR, "");
        assert!(effects.is_empty());
        assert_eq!(rig.machine.state(), &CaptureState::Idle);
    }

    #[tokio::test]
    async fn teardown_mid_crop_closes_surface() {
        let mut rig = Rig::standard();
        rig.capture().await;
        assert_eq!(rig.crop.live_surfaces(), 1);

        rig.machine.teardown();
        rig.assert_nothing_live();
    }

    #[tokio::test]
    async fn dropping_machine_releases_camera() {
        let camera = Arc::new(MockCamera::granting(64, 64));
        let mut machine = CaptureMachine::new(
            CameraManager::new(camera.clone(), Facing::Environment),
            Arc::new(MockCropEngine::new()),
        );
        let epoch = acquire_epoch(&machine.handle(Intent::RequestCapture.into()));
        let result = machine.camera().acquire().await;
        machine.handle(Event::CameraAcquired { epoch, result });
        assert_eq!(camera.live_tracks(), 1);

        drop(machine);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[tokio::test]
    async fn unlisted_transitions_are_no_ops() {
        let mut rig = Rig::standard();
        let start = rig.machine.snapshot();

        for intent in [
            Intent::Submit,
            Intent::Reset,
            Intent::Retry,
            Intent::Cancel,
            Intent::Retake,
            Intent::CaptureFrame,
        ] {
            assert!(rig.send(intent).is_empty());
        }
        assert_eq!(rig.machine.snapshot(), start);

        // Capturing while the camera is still pending does nothing either
        rig.send(Intent::RequestCapture);
        let pending = rig.machine.snapshot();
        assert!(rig.send(Intent::CaptureFrame).is_empty());
        assert!(rig.send(Intent::RequestCapture).is_empty());
        assert_eq!(rig.machine.snapshot(), pending);
    }

    #[tokio::test]
    async fn adjustments_reach_the_crop_session() {
        let mut rig = Rig::standard();
        rig.capture().await;

        rig.send(Intent::Adjust(CropAction::Rotate(1)));
        assert!(
            rig.crop
                .get_operations()
                .contains(&RecordedOp::Apply(CropAction::Rotate(1)))
        );
        assert_eq!(rig.machine.phase(), Phase::ImageCaptured);
        assert!(rig.machine.crop_selection().is_some());
    }

    #[tokio::test]
    async fn each_transition_bumps_epoch() {
        let mut rig = Rig::standard();
        let e0 = rig.machine.epoch();
        let e1 = rig.open_camera(Intent::RequestCapture).await;
        assert!(e1 > e0);
        // Going live is not a transition
        assert_eq!(rig.machine.epoch(), e1);
        rig.send(Intent::CaptureFrame);
        assert!(rig.machine.epoch() > e1);
    }
}
