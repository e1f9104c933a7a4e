/// End-to-end tests for the ElevenLabs provider.
///
/// The `live_*` tests need a valid `ELEVENLABS_STT_API_KEY` and an audio file
/// at `ELEVEN_STT_TEST_AUDIO`; they are skipped automatically when either is
/// missing so CI without credentials stays green. The rest run against a
/// local mock server.
///
/// Run with:
///   ELEVENLABS_STT_API_KEY=sk_... ELEVEN_STT_TEST_AUDIO=hello.wav \
///     cargo test --test elevenlabs_integration -- --nocapture

use eleven_stt_core::config::ClientConfig;
use eleven_stt_core::request::{AudioInput, RawRequest, ResponseFormat};
use eleven_stt_core::response::TranscriptOutput;
use eleven_stt_core::transport::RetryPolicy;
use eleven_stt_core::{ElevenLabsProvider, SttError, TranscriptionProvider};
use mockito::ServerOpts;

/// Return the API key and fixture path, or `None` to skip.
fn live_setup() -> Option<(String, String)> {
    let key = std::env::var("ELEVENLABS_STT_API_KEY").ok().filter(|k| !k.is_empty())?;
    let audio = std::env::var("ELEVEN_STT_TEST_AUDIO").ok().filter(|p| !p.is_empty())?;
    Some((key, audio))
}

#[tokio::test]
async fn live_transcribes_fixture() {
    let Some((key, audio)) = live_setup() else {
        eprintln!("ELEVENLABS_STT_API_KEY or ELEVEN_STT_TEST_AUDIO not set — skipping live test");
        return;
    };

    let provider = ElevenLabsProvider::new(ClientConfig::new(key)).expect("provider should build");
    let transcript = provider
        .transcribe(RawRequest {
            file: Some(AudioInput::Path(audio.into())),
            response_format: Some(ResponseFormat::FlattenedText),
            ..Default::default()
        })
        .await
        .expect("ElevenLabs transcription should succeed");

    eprintln!("Transcript: {:?}", transcript.text());
    assert!(!transcript.text().trim().is_empty());
}

#[tokio::test]
async fn live_invalid_api_key_is_fatal() {
    let Some((_, audio)) = live_setup() else {
        eprintln!("ELEVENLABS_STT_API_KEY or ELEVEN_STT_TEST_AUDIO not set — skipping live test");
        return;
    };

    let provider = ElevenLabsProvider::new(ClientConfig::new("bad-key-intentionally-invalid"))
        .expect("provider should build");
    let err = provider
        .transcribe(RawRequest {
            file: Some(AudioInput::Path(audio.into())),
            ..Default::default()
        })
        .await
        .expect_err("Should fail with a bad API key");

    let msg = err.to_string();
    assert!(msg.contains("401") || msg.contains("403"), "Expected auth error, got: {msg}");
}

fn mock_provider(url: String) -> ElevenLabsProvider {
    let config = ClientConfig::new("test-key")
        .with_base_url(url)
        .with_retry(RetryPolicy::immediate(2));
    ElevenLabsProvider::new(config).expect("provider should build")
}

#[tokio::test]
async fn upload_from_memory_survives_transient_errors() {
    let mut server = mockito::Server::new_with_opts_async(ServerOpts::default()).await;
    let busy = server
        .mock("POST", "/speech-to-text")
        .with_status(502)
        .expect(1)
        .create_async()
        .await;
    let create = server
        .mock("POST", "/speech-to-text")
        .match_body(mockito::Matcher::Regex(r#"filename="transcript.bin""#.into()))
        .with_status(200)
        .with_body(r#"{"transcription_id":"mem_1"}"#)
        .expect(1)
        .create_async()
        .await;
    server
        .mock("GET", "/speech-to-text/transcripts/mem_1")
        .with_status(200)
        .with_body(r#"{"status":"completed","text":"from memory","confidence":0.88}"#)
        .create_async()
        .await;
    server
        .mock("DELETE", "/speech-to-text/transcripts/mem_1")
        .with_status(200)
        .create_async()
        .await;

    let out = mock_provider(server.url())
        .transcribe(RawRequest {
            file: Some(AudioInput::Bytes(b"ID3fake-mp3".to_vec())),
            response_format: Some(ResponseFormat::FlattenedText),
            ..Default::default()
        })
        .await
        .expect("retry should mask the 502");

    match out {
        TranscriptOutput::Text(flat) => {
            assert_eq!(flat.text, "from memory");
            assert_eq!(flat.confidence, Some(0.88));
        }
        other => panic!("expected flattened transcript, got {other:?}"),
    }
    busy.assert_async().await;
    create.assert_async().await;
}

#[tokio::test]
async fn concurrent_calls_are_independent() {
    let mut server = mockito::Server::new_with_opts_async(ServerOpts::default()).await;
    server
        .mock("POST", "/speech-to-text")
        .match_body(mockito::Matcher::Regex("one.mp3".into()))
        .with_status(200)
        .with_body(r#"{"transcription_id":"one"}"#)
        .create_async()
        .await;
    server
        .mock("POST", "/speech-to-text")
        .match_body(mockito::Matcher::Regex("two.mp3".into()))
        .with_status(200)
        .with_body(r#"{"transcription_id":"two"}"#)
        .create_async()
        .await;
    for id in ["one", "two"] {
        server
            .mock("GET", format!("/speech-to-text/transcripts/{id}").as_str())
            .with_status(200)
            .with_body(format!(r#"{{"status":"completed","text":"text {id}"}}"#))
            .create_async()
            .await;
        server
            .mock("DELETE", format!("/speech-to-text/transcripts/{id}").as_str())
            .with_status(404)
            .create_async()
            .await;
    }

    let provider = mock_provider(server.url());
    let request = |name: &str| RawRequest {
        cloud_storage_url: Some(format!("https://cdn.example.com/{name}.mp3")),
        ..Default::default()
    };
    let (a, b) = tokio::join!(
        provider.transcribe(request("one")),
        provider.transcribe(request("two"))
    );

    assert_eq!(a.unwrap().text(), "text one");
    assert_eq!(b.unwrap().text(), "text two");
}

#[tokio::test]
async fn pending_job_times_out_without_deleting() {
    let mut server = mockito::Server::new_with_opts_async(ServerOpts::default()).await;
    server
        .mock("POST", "/speech-to-text")
        .with_status(200)
        .with_body(r#"{"id":"slow"}"#)
        .create_async()
        .await;
    let status = server
        .mock("GET", "/speech-to-text/transcripts/slow")
        .with_status(200)
        .with_body(r#"{"status":"queued"}"#)
        .expect(2)
        .create_async()
        .await;
    let delete = server
        .mock("DELETE", "/speech-to-text/transcripts/slow")
        .expect(0)
        .create_async()
        .await;

    let err = mock_provider(server.url())
        .transcribe(RawRequest {
            cloud_storage_url: Some("https://cdn.example.com/long.mp3".into()),
            poll_interval_ms: Some(250),
            max_poll_attempts: Some(2),
            ..Default::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SttError::JobTimeout { attempts: 2 }));
    status.assert_async().await;
    delete.assert_async().await;
}
