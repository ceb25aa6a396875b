//! End-to-end session tests against an in-process WebSocket server.
//!
//! Each test spins up a scripted server on a loopback port, runs a real
//! session against it, and asserts on the wire traffic the server saw and
//! the events the sink observed.

use futures_util::{SinkExt, StreamExt};
use linguastream::audio::source::MockAudioSource;
use linguastream::config::{Config, ConnectionConfig};
use linguastream::protocol::{ClientMessage, ServerMessage, Word};
use linguastream::session::dispatcher::{CollectorSink, SinkEvent};
use linguastream::session::orchestrator::Session;
use linguastream::session::socket::ConnectionState;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

type Ws = WebSocketStream<TcpStream>;
type Received = Arc<Mutex<Vec<ClientMessage>>>;

async fn bind() -> (TcpListener, String) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/rt", listener.local_addr().unwrap());
    (listener, url)
}

fn config_for(url: &str) -> Config {
    Config {
        connection: ConnectionConfig {
            url: url.to_string(),
            handshake_timeout_ms: 2000,
            reconnect_delay_ms: 100,
            max_reconnect_attempts: 0,
            ..ConnectionConfig::default()
        },
        ..Config::default()
    }
}

async fn accept(listener: &TcpListener) -> Ws {
    let (stream, _) = listener.accept().await.unwrap();
    tokio_tungstenite::accept_async(stream).await.unwrap()
}

async fn send(ws: &mut Ws, msg: &ServerMessage) {
    ws.send(Message::text(msg.to_json().unwrap())).await.unwrap();
}

/// Read client messages until the connection ends, recording each one.
/// Acknowledges the first config message so the handshake completes.
async fn record_session(mut ws: Ws, received: Received) {
    let mut acked = false;
    while let Some(Ok(frame)) = ws.next().await {
        let Message::Text(text) = frame else { continue };
        let msg = ClientMessage::from_json(text.as_str()).unwrap();
        let is_config = matches!(msg, ClientMessage::Config { .. });
        received.lock().unwrap().push(msg);
        if is_config && !acked {
            acked = true;
            send(&mut ws, &ServerMessage::Connected { message: None }).await;
        }
    }
}

#[tokio::test]
async fn config_always_precedes_audio_on_the_wire() {
    let (listener, url) = bind().await;
    let received: Received = Arc::default();

    let server = {
        let received = Arc::clone(&received);
        tokio::spawn(async move {
            record_session(accept(&listener).await, received).await;
        })
    };

    let source = MockAudioSource::new()
        .with_samples(vec![1i16; 8192])
        .finite();
    let sink = CollectorSink::new();
    let events = sink.events();

    let mut handle = Session::new(config_for(&url))
        .start(Box::new(source), Box::new(sink))
        .await
        .expect("session should start");

    assert_eq!(handle.state(), ConnectionState::Open);

    handle.wait_for_capture().await;
    handle.stop().await.expect("stop should succeed");
    server.await.unwrap();

    let received = received.lock().unwrap();
    assert!(
        matches!(received[0], ClientMessage::Config { .. }),
        "first wire message must be config, got {:?}",
        received[0]
    );

    let audio_frames: Vec<_> = received
        .iter()
        .filter(|m| matches!(m, ClientMessage::Audio { .. }))
        .collect();
    assert_eq!(audio_frames.len(), 2, "8192 samples -> two 4096 frames");

    // eos terminates the stream, exactly once
    let eos_count = received
        .iter()
        .filter(|m| matches!(m, ClientMessage::Eos))
        .count();
    assert_eq!(eos_count, 1);
    assert!(matches!(received.last(), Some(ClientMessage::Eos)));

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&SinkEvent::Connected));
    assert_eq!(events.last(), Some(&SinkEvent::Disconnected));
}

#[tokio::test]
async fn audio_frames_are_base64_pcm16() {
    let (listener, url) = bind().await;
    let received: Received = Arc::default();

    let server = {
        let received = Arc::clone(&received);
        tokio::spawn(async move {
            record_session(accept(&listener).await, received).await;
        })
    };

    // One short finite burst; the tail flush carries it even below block size
    let source = MockAudioSource::new()
        .with_samples(vec![0x0102i16, -2])
        .finite();

    let mut handle = Session::new(config_for(&url))
        .start(Box::new(source), Box::new(CollectorSink::new()))
        .await
        .expect("session should start");
    handle.wait_for_capture().await;
    handle.stop().await.unwrap();
    server.await.unwrap();

    let received = received.lock().unwrap();
    let data = received
        .iter()
        .find_map(|m| match m {
            ClientMessage::Audio { data } => Some(data.clone()),
            _ => None,
        })
        .expect("an audio frame should arrive");

    // 0x0102 -> 02 01 LE; -2 -> FE FF
    use base64::Engine as _;
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(&data)
        .expect("payload must be valid base64");
    assert_eq!(bytes, vec![0x02, 0x01, 0xFE, 0xFF]);
}

#[tokio::test]
async fn partials_and_finals_dispatch_in_order() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        // config
        let _ = ws.next().await;
        send(&mut ws, &ServerMessage::Connected { message: None }).await;

        // Wait for the first audio frame, then script a result sequence
        while let Some(Ok(frame)) = ws.next().await {
            let Message::Text(text) = frame else { continue };
            match ClientMessage::from_json(text.as_str()).unwrap() {
                ClientMessage::Audio { .. } => break,
                _ => continue,
            }
        }

        send(
            &mut ws,
            &ServerMessage::Partial {
                text: "a".to_string(),
                words: vec![],
            },
        )
        .await;
        send(
            &mut ws,
            &ServerMessage::Partial {
                text: "ab".to_string(),
                words: vec![],
            },
        )
        .await;
        send(
            &mut ws,
            &ServerMessage::Final {
                text: "ab".to_string(),
                words: vec![Word::new("ab")],
                language: Some("fr".to_string()),
            },
        )
        .await;
        send(&mut ws, &ServerMessage::UtteranceEnd).await;

        // Drain until the client closes
        while let Some(Ok(_)) = ws.next().await {}
    });

    let source = MockAudioSource::new()
        .with_samples(vec![0i16; 4096])
        .finite();
    let sink = CollectorSink::new();
    let events = sink.events();

    let mut handle = Session::new(config_for(&url))
        .start(Box::new(source), Box::new(sink))
        .await
        .expect("session should start");
    handle.wait_for_capture().await;
    // stop() holds the socket open for the grace period, which is plenty for
    // the scripted results to land
    handle.stop().await.unwrap();
    server.await.unwrap();

    let events = events.lock().unwrap();
    let transcripts: Vec<_> = events
        .iter()
        .filter(|e| matches!(e, SinkEvent::Partial(_) | SinkEvent::Final(_)))
        .collect();

    assert_eq!(transcripts.len(), 3);
    assert!(matches!(transcripts[0], SinkEvent::Partial(t) if t.text == "a"));
    assert!(matches!(transcripts[1], SinkEvent::Partial(t) if t.text == "ab"));
    match transcripts[2] {
        SinkEvent::Final(t) => {
            assert_eq!(t.text, "ab");
            assert!(t.is_final);
            assert_eq!(t.language.as_deref(), Some("fr"));
        }
        other => panic!("Expected Final, got {:?}", other),
    }
}

#[tokio::test]
async fn server_error_message_keeps_session_open() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let _ = ws.next().await;
        send(&mut ws, &ServerMessage::Connected { message: None }).await;
        send(
            &mut ws,
            &ServerMessage::Error {
                message: "transcription model overloaded".to_string(),
            },
        )
        .await;
        while let Some(Ok(_)) = ws.next().await {}
    });

    let source = MockAudioSource::new(); // infinite
    let sink = CollectorSink::new();
    let events = sink.events();

    let mut handle = Session::new(config_for(&url))
        .start(Box::new(source), Box::new(sink))
        .await
        .expect("session should start");

    tokio::time::sleep(Duration::from_millis(300)).await;

    // The semantic error reached the sink but did not end the session
    assert_eq!(handle.state(), ConnectionState::Open);
    {
        let events = events.lock().unwrap();
        assert!(
            events
                .iter()
                .any(|e| matches!(e, SinkEvent::Error(msg) if msg.contains("overloaded"))),
            "error should reach the sink, got {:?}",
            events
        );
        assert!(!events.contains(&SinkEvent::Disconnected));
    }

    handle.stop().await.unwrap();
    server.await.unwrap();
    assert_eq!(handle.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn stop_twice_sends_a_single_eos() {
    let (listener, url) = bind().await;
    let received: Received = Arc::default();

    let server = {
        let received = Arc::clone(&received);
        tokio::spawn(async move {
            record_session(accept(&listener).await, received).await;
        })
    };

    let source = MockAudioSource::new().finite();
    let mut handle = Session::new(config_for(&url))
        .start(Box::new(source), Box::new(CollectorSink::new()))
        .await
        .expect("session should start");

    handle.wait_for_capture().await;
    handle.stop().await.unwrap();
    handle.stop().await.unwrap();
    server.await.unwrap();

    let eos_count = received
        .lock()
        .unwrap()
        .iter()
        .filter(|m| matches!(m, ClientMessage::Eos))
        .count();
    assert_eq!(eos_count, 1);
}

#[tokio::test]
async fn peer_close_without_reconnect_budget_ends_session() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let _ = ws.next().await;
        send(&mut ws, &ServerMessage::Connected { message: None }).await;
        // Hang up without warning
        drop(ws);
    });

    let source = MockAudioSource::new(); // infinite
    let sink = CollectorSink::new();
    let events = sink.events();

    let mut handle = Session::new(config_for(&url))
        .start(Box::new(source), Box::new(sink))
        .await
        .expect("session should start");
    server.await.unwrap();

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(handle.state(), ConnectionState::Closed);
    assert_eq!(
        events.lock().unwrap().last(),
        Some(&SinkEvent::Disconnected)
    );

    // Stopping a session that already lost its peer is still clean
    handle.stop().await.unwrap();
}

#[tokio::test]
async fn lost_connection_redials_within_budget() {
    let (listener, url) = bind().await;
    let received: Received = Arc::default();

    let server = {
        let received = Arc::clone(&received);
        tokio::spawn(async move {
            // First connection: handshake, then hang up
            let mut ws = accept(&listener).await;
            let _ = ws.next().await;
            send(&mut ws, &ServerMessage::Connected { message: None }).await;
            drop(ws);

            // Second connection: full session
            record_session(accept(&listener).await, received).await;
        })
    };

    let mut config = config_for(&url);
    config.connection.max_reconnect_attempts = 1;
    config.connection.reconnect_delay_ms = 100;

    let source = MockAudioSource::new(); // infinite
    let sink = CollectorSink::new();
    let events = sink.events();

    let mut handle = Session::new(config)
        .start(Box::new(source), Box::new(sink))
        .await
        .expect("session should start");

    // Give the redial time to land: 100ms delay + handshake
    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(handle.state(), ConnectionState::Open);

    handle.stop().await.unwrap();
    server.await.unwrap();

    let events = events.lock().unwrap();
    let connects = events
        .iter()
        .filter(|e| matches!(e, SinkEvent::Connected))
        .count();
    assert_eq!(connects, 2, "initial connect plus one successful redial");

    // The redial re-sent the config message on the new connection
    let received = received.lock().unwrap();
    assert!(matches!(received.first(), Some(ClientMessage::Config { .. })));
}

#[tokio::test]
async fn stop_during_redial_delay_cancels_promptly() {
    let (listener, url) = bind().await;
    let connections = Arc::new(AtomicUsize::new(0));

    let server = {
        let connections = Arc::clone(&connections);
        tokio::spawn(async move {
            let mut ws = accept(&listener).await;
            connections.fetch_add(1, Ordering::SeqCst);
            let _ = ws.next().await;
            send(&mut ws, &ServerMessage::Connected { message: None }).await;
            drop(ws);

            // A redial that survived stop() would land here
            if tokio::time::timeout(Duration::from_secs(2), listener.accept())
                .await
                .is_ok()
            {
                connections.fetch_add(1, Ordering::SeqCst);
            }
        })
    };

    let mut config = config_for(&url);
    config.connection.max_reconnect_attempts = 1;
    config.connection.reconnect_delay_ms = 5000;

    let source = MockAudioSource::new(); // infinite
    let sink = CollectorSink::new();
    let events = sink.events();

    let mut handle = Session::new(config)
        .start(Box::new(source), Box::new(sink))
        .await
        .expect("session should start");

    // Let the client observe the loss and enter the redial delay
    tokio::time::sleep(Duration::from_millis(300)).await;

    let begun = Instant::now();
    handle.stop().await.unwrap();
    assert!(
        begun.elapsed() < Duration::from_secs(2),
        "stop() must not wait out the redial delay, took {:?}",
        begun.elapsed()
    );

    server.await.unwrap();
    assert_eq!(
        connections.load(Ordering::SeqCst),
        1,
        "teardown must cancel the pending redial"
    );
    assert_eq!(
        events.lock().unwrap().last(),
        Some(&SinkEvent::Disconnected)
    );
}

#[tokio::test]
async fn stop_completes_when_peer_ignores_close() {
    let (listener, url) = bind().await;

    let server = tokio::spawn(async move {
        let mut ws = accept(&listener).await;
        let _ = ws.next().await;
        send(&mut ws, &ServerMessage::Connected { message: None }).await;
        // Hold the connection without reading: the close handshake is
        // never answered
        tokio::time::sleep(Duration::from_secs(10)).await;
        drop(ws);
    });

    let source = MockAudioSource::new(); // infinite
    let mut handle = Session::new(config_for(&url))
        .start(Box::new(source), Box::new(CollectorSink::new()))
        .await
        .expect("session should start");

    let begun = Instant::now();
    handle.stop().await.unwrap();
    // eos grace plus the bounded drain wait, never an indefinite hang
    assert!(
        begun.elapsed() < Duration::from_secs(4),
        "stop() stalled on an unanswered close handshake: {:?}",
        begun.elapsed()
    );
    assert_eq!(handle.state(), ConnectionState::Closed);

    server.abort();
}

#[tokio::test]
async fn set_language_pushes_config_update() {
    let (listener, url) = bind().await;
    let received: Received = Arc::default();

    let server = {
        let received = Arc::clone(&received);
        tokio::spawn(async move {
            record_session(accept(&listener).await, received).await;
        })
    };

    let source = MockAudioSource::new(); // infinite
    let mut handle = Session::new(config_for(&url))
        .start(Box::new(source), Box::new(CollectorSink::new()))
        .await
        .expect("session should start");

    handle
        .set_language(Some("de".to_string()))
        .await
        .expect("config update should send");
    tokio::time::sleep(Duration::from_millis(200)).await;

    handle.stop().await.unwrap();
    server.await.unwrap();

    let received = received.lock().unwrap();
    let configs: Vec<_> = received
        .iter()
        .filter_map(|m| match m {
            ClientMessage::Config { language, .. } => Some(language.clone()),
            _ => None,
        })
        .collect();

    assert_eq!(configs.len(), 2);
    assert_eq!(configs[0], None, "initial config uses auto-detect");
    assert_eq!(configs[1].as_deref(), Some("de"));
}
