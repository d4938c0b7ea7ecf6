//! Daemon integration tests
//!
//! Drives full listening sessions against recording collaborators

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use chrono::NaiveTime;
use navix::voice::RecognitionOutcome;
use navix::{Destination, IntentKind, SessionReport, StatusSignal};

mod common;
use common::{
    FixedClock, HangingRecognizer, RecordingOpener, RecordingSynthesizer, ScriptedRecognizer,
    daemon_with_config, test_config, test_daemon,
};

const GREETING: &str = "Hello, I am Navix. How may I assist you?";

#[tokio::test]
async fn test_open_session() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let daemon = test_daemon(&synth, &opener);
    let mut recognizer = ScriptedRecognizer::transcripts(&["Please Open YouTube now"]);

    let report = daemon.run_session(&mut recognizer).await.unwrap();

    let (transcript, intent) = match report {
        SessionReport::Dispatched {
            transcript, intent, ..
        } => (transcript, intent),
        other => panic!("expected dispatch, got {other:?}"),
    };
    assert_eq!(transcript.as_str(), "please open youtube now");
    assert_eq!(intent.kind, IntentKind::OpenDestination(Destination::YouTube));

    assert_eq!(
        synth.texts(),
        vec![
            GREETING,
            "I heard: please open youtube now. Executing command.",
            "Opening YouTube.",
        ]
    );
    assert_eq!(opener.urls(), vec!["https://www.youtube.com"]);
    assert!(opener.opened.lock().unwrap()[0].new_context);

    // Capture stopped before dispatch
    assert_eq!(recognizer.stops, 1);
}

#[tokio::test]
async fn test_time_session_uses_clock() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let daemon = test_daemon(&synth, &opener).with_clock(Arc::new(FixedClock(
        NaiveTime::from_hms_opt(21, 4, 0).unwrap(),
    )));
    let mut recognizer = ScriptedRecognizer::transcripts(&["time please"]);

    daemon.run_session(&mut recognizer).await.unwrap();

    assert_eq!(
        synth.texts().last().map(String::as_str),
        Some("The current time is 9:04 PM.")
    );
    assert!(opener.urls().is_empty());
}

#[tokio::test]
async fn test_fallback_session_searches_web() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let daemon = test_daemon(&synth, &opener);
    let mut recognizer = ScriptedRecognizer::transcripts(&["Play some music"]);

    daemon.run_session(&mut recognizer).await.unwrap();

    assert_eq!(
        opener.urls(),
        vec!["https://www.google.com/search?q=play%20some%20music"]
    );
}

#[tokio::test]
async fn test_recognition_error_apologizes_without_dispatch() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let daemon = test_daemon(&synth, &opener);
    let mut recognizer =
        ScriptedRecognizer::new(vec![RecognitionOutcome::Error("no-speech".to_string())]);

    let report = daemon.run_session(&mut recognizer).await.unwrap();

    assert_eq!(
        report,
        SessionReport::RecognitionFailed {
            message: "no-speech".to_string()
        }
    );
    assert_eq!(
        synth.texts(),
        vec![
            GREETING,
            "There was a speech recognition error. Please try again.",
        ]
    );
    assert!(opener.urls().is_empty());
}

#[tokio::test]
async fn test_cancelled_session_is_silent() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let daemon = test_daemon(&synth, &opener);
    let mut recognizer = ScriptedRecognizer::default();

    let report = daemon.run_session(&mut recognizer).await.unwrap();

    assert_eq!(report, SessionReport::Cancelled);
    assert_eq!(synth.texts(), vec![GREETING]);
    assert!(opener.urls().is_empty());
    assert_eq!(recognizer.stops, 0);
}

#[tokio::test]
async fn test_status_signals() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let daemon = test_daemon(&synth, &opener);
    let mut signals = daemon.subscribe();
    let mut recognizer = ScriptedRecognizer::transcripts(&["how are you"]);

    daemon.run_session(&mut recognizer).await.unwrap();

    assert_eq!(signals.try_recv().unwrap(), StatusSignal::ListeningStarted);
    assert_eq!(signals.try_recv().unwrap(), StatusSignal::ListeningEnded);
    assert!(signals.try_recv().is_err());
}

#[tokio::test]
async fn test_collaborator_failures_are_absorbed() {
    let synth = Arc::new(RecordingSynthesizer {
        fail: true,
        ..RecordingSynthesizer::default()
    });
    let opener = Arc::new(RecordingOpener {
        fail: true,
        ..RecordingOpener::default()
    });
    let daemon = test_daemon(&synth, &opener);
    let mut recognizer = ScriptedRecognizer::transcripts(&["search youtube for rust talks"]);

    let report = daemon.run_session(&mut recognizer).await.unwrap();

    let plan = match report {
        SessionReport::Dispatched { plan, .. } => plan,
        other => panic!("expected dispatch, got {other:?}"),
    };
    assert_eq!(plan.utterances[1], "Searching YouTube for rust talks");
    // Every utterance was still attempted, and the open was tried
    assert_eq!(synth.texts().len(), 3);
    assert_eq!(
        opener.urls(),
        vec!["https://www.youtube.com/results?search_query=rust%20talks"]
    );
}

#[tokio::test]
async fn test_run_stops_when_input_ends() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let daemon = test_daemon(&synth, &opener);
    let mut recognizer = ScriptedRecognizer::transcripts(&["open google", "open facebook"]);

    daemon.run(&mut recognizer, false).await.unwrap();

    assert_eq!(recognizer.listens, 3);
    assert_eq!(
        opener.urls(),
        vec!["https://www.google.com", "https://www.facebook.com"]
    );
}

#[tokio::test]
async fn test_run_once() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let daemon = test_daemon(&synth, &opener);
    let mut recognizer = ScriptedRecognizer::transcripts(&["open instagram", "open whatsapp"]);

    daemon.run(&mut recognizer, true).await.unwrap();

    assert_eq!(recognizer.listens, 1);
    assert_eq!(opener.urls(), vec!["https://www.instagram.com"]);
}

#[tokio::test(start_paused = true)]
async fn test_capture_waits_for_listen_delay() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let mut config = test_config();
    config.recognition.listen_delay = Duration::from_secs(4);
    let daemon = daemon_with_config(config, &synth, &opener);
    let mut signals = daemon.subscribe();
    let mut recognizer = HangingRecognizer::default();
    let listens = recognizer.listens();

    let mut session = Box::pin(daemon.run_session(&mut recognizer));

    // Greeted, but not yet listening
    let early = tokio::time::timeout(Duration::from_millis(3900), &mut session).await;
    assert!(early.is_err());
    assert_eq!(listens.load(Ordering::SeqCst), 0);
    assert_eq!(synth.texts(), vec![GREETING]);
    assert!(signals.try_recv().is_err());

    let late = tokio::time::timeout(Duration::from_millis(200), &mut session).await;
    assert!(late.is_err());
    assert_eq!(listens.load(Ordering::SeqCst), 1);
    assert_eq!(signals.try_recv().unwrap(), StatusSignal::ListeningStarted);

    drop(session);
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_capture_ends_listening() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let daemon = test_daemon(&synth, &opener);
    let mut signals = daemon.subscribe();
    let mut recognizer = HangingRecognizer::default();
    let listens = recognizer.listens();

    // Dropping the session future is what Ctrl-C does inside `run`
    let interrupted =
        tokio::time::timeout(Duration::from_millis(50), daemon.run_session(&mut recognizer)).await;

    assert!(interrupted.is_err());
    assert_eq!(listens.load(Ordering::SeqCst), 1);
    assert_eq!(signals.try_recv().unwrap(), StatusSignal::ListeningStarted);
    assert_eq!(signals.try_recv().unwrap(), StatusSignal::ListeningEnded);
    assert!(signals.try_recv().is_err());
    assert!(opener.urls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_interrupted_before_capture_is_quiet() {
    let synth = Arc::new(RecordingSynthesizer::default());
    let opener = Arc::new(RecordingOpener::default());
    let mut config = test_config();
    config.recognition.listen_delay = Duration::from_secs(4);
    let daemon = daemon_with_config(config, &synth, &opener);
    let mut signals = daemon.subscribe();
    let mut recognizer = HangingRecognizer::default();

    let interrupted =
        tokio::time::timeout(Duration::from_secs(1), daemon.run_session(&mut recognizer)).await;

    assert!(interrupted.is_err());
    assert!(signals.try_recv().is_err());
}
