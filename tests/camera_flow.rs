//! End-to-end flows through the public API with mock hardware.

use std::sync::Arc;
use std::time::{Duration, Instant};

use custom_camera::capture::{CameraPosition, MockBackend, MockDevice};
use custom_camera::config::FileConfig;
use custom_camera::orientation::{DeviceOrientation, ImageOrientation};
use custom_camera::photo::ImageSource;
use custom_camera::screen::{
    CameraScreen, Control, EntryScreen, PickerResult, RecordingViewer, ScreenError, ScriptedPicker,
};
use custom_camera::{CaptureDevice, FlashMode};
use image::DynamicImage;

const TIMEOUT: Duration = Duration::from_secs(5);

type Screen = CameraScreen<RecordingViewer, ScriptedPicker>;

fn pump_until(screen: &mut Screen, done: impl Fn(&Screen) -> bool) {
    let deadline = Instant::now() + TIMEOUT;
    while !done(&*screen) {
        assert!(Instant::now() < deadline, "condition not reached in time");
        screen.wait_for_message(Duration::from_millis(50));
    }
}

fn open_camera(backend: Arc<MockBackend>, config: FileConfig) -> Screen {
    let mut entry = EntryScreen::new(ScriptedPicker::new(), RecordingViewer::new());
    entry.show_custom_camera().unwrap();

    let mut screen = CameraScreen::new(
        backend,
        config,
        DeviceOrientation::Portrait,
        RecordingViewer::new(),
        ScriptedPicker::new(),
    )
    .unwrap();
    screen.appear();
    pump_until(&mut screen, |s| s.controls().preview_attached);
    screen
}

#[test]
fn test_full_session_with_both_cameras() {
    let backend = Arc::new(MockBackend::phone());
    let back = Arc::clone(backend.device(CameraPosition::Back).unwrap());
    let mut screen = open_camera(Arc::clone(&backend), FileConfig::default());

    // Flash off on the back camera.
    screen.flash_button_pressed();
    screen.select_flash_mode(FlashMode::Off);
    pump_until(&mut screen, |s| s.flash_mode() == Some(FlashMode::Off));
    assert_eq!(back.flash_mode(), FlashMode::Off);
    assert!(screen.controls().is_selected(Control::FlashOff));

    // Landscape shot with the back camera.
    screen.orientation_changed(DeviceOrientation::LandscapeRight);
    screen.take_photo();
    pump_until(&mut screen, |s| s.controls().shutter.enabled);
    assert_eq!(screen.viewer().shown()[0].orientation(), ImageOrientation::Down);
    screen.viewer_done();

    // Switch to the front camera and shoot upside down.
    screen.switch_camera_pressed();
    screen.flip_transition_finished();
    pump_until(&mut screen, |s| !s.controls().blur_visible);
    assert_eq!(
        screen.session_snapshot().unwrap().inputs,
        vec![CameraPosition::Front]
    );

    screen.orientation_changed(DeviceOrientation::PortraitUpsideDown);
    screen.take_photo();
    pump_until(&mut screen, |s| s.controls().shutter.enabled);

    let shown = screen.viewer().shown();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[1].orientation(), ImageOrientation::RightMirrored);
    assert_eq!(shown[1].source(), ImageSource::Shutter);

    screen.disappear();
    assert!(!screen.has_session());
    assert!(!back.is_locked());
}

#[test]
fn test_configured_quality_and_durations() {
    let config = FileConfig::from_toml(
        r#"
        [session]
        jpeg_quality = 70

        [ui]
        chooser_fade_ms = 150
        flip_transition_ms = 250
        "#,
    )
    .unwrap();

    let backend = Arc::new(MockBackend::new(vec![Arc::new(
        MockDevice::back().with_frame_size(32, 24),
    )]));
    let mut screen = open_camera(backend, config);

    assert_eq!(screen.controls().chooser_fade, Duration::from_millis(150));
    assert_eq!(screen.controls().flip_transition, Duration::from_millis(250));
    assert!(screen.controls().camera_button.hidden);

    screen.take_photo();
    pump_until(&mut screen, |s| s.controls().shutter.enabled);
    let photo = &screen.viewer().shown()[0];
    assert_eq!(photo.dimensions(), (32, 24));
    assert_eq!(photo.display_dimensions(), (24, 32));
}

#[test]
fn test_no_camera_alert_blocks_custom_camera() {
    let mut entry = EntryScreen::new(ScriptedPicker::new().without_camera(), RecordingViewer::new());
    assert!(matches!(entry.show_custom_camera(), Err(ScreenError::NoCamera)));
    assert_eq!(entry.alert().unwrap().message, "Your device doesn't have a camera");
}

#[test]
fn test_library_pick_alongside_live_session() {
    let picker = ScriptedPicker::new().then(PickerResult::Picked(DynamicImage::new_rgb8(4, 4)));
    let mut screen = CameraScreen::new(
        Arc::new(MockBackend::phone()),
        FileConfig::default(),
        DeviceOrientation::Portrait,
        RecordingViewer::new(),
        picker,
    )
    .unwrap();
    screen.appear();
    screen.open_photo_library();
    pump_until(&mut screen, |s| {
        s.controls().preview_attached && !s.viewer().shown().is_empty()
    });

    let shown = screen.viewer().shown();
    assert_eq!(shown[0].source(), ImageSource::PhotoLibrary);
    assert!(screen.session_snapshot().unwrap().running);
}
