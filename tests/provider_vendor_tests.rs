//! Provider adapter tests against mocked vendor endpoints.

use std::sync::Arc;
use std::time::Duration;

use voicegate::core::tts::{
    AtenTts, EdgeTts, EugenesTts, MinimaxTts, OpenAiTts, RateLimiter, SynthesisMode,
    SynthesisRequest, TtsAdapter, TtsError, VendorSettings,
};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAKE_WAV: &[u8] = b"RIFFxxxxWAVEfmt fake-audio-payload";

fn no_rate_limit() -> Arc<RateLimiter> {
    Arc::new(RateLimiter::new(Duration::ZERO))
}

#[tokio::test]
async fn test_edge_relay_roundtrip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/synthesize"))
        .and(body_partial_json(serde_json::json!({
            "voice": "zh-CN-XiaoxiaoNeural",
            "format": "wav"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_WAV))
        .mount(&server)
        .await;

    let mut tts = EdgeTts::new(&VendorSettings {
        base_url: Some(server.uri()),
        ..Default::default()
    });
    tts.initialize().await.unwrap();

    let result = tts
        .synthesize(&SynthesisRequest::new("你好", "service1"))
        .await
        .unwrap();

    assert_eq!(result.mode, SynthesisMode::Real);
    assert_eq!(result.audio, FAKE_WAV);
}

#[tokio::test]
async fn test_minimax_envelope_and_download() {
    let server = MockServer::start().await;
    let audio_url = format!("{}/files/out.wav", server.uri());

    Mock::given(method("POST"))
        .and(path("/t2a_v2"))
        .and(body_partial_json(serde_json::json!({
            "model": "speech-02-turbo",
            "output_format": "url",
            "stream": false
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "base_resp": { "status_code": 0, "status_msg": "" },
            "data": { "audio": audio_url }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/out.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_WAV))
        .mount(&server)
        .await;

    let mut tts = MinimaxTts::new(&VendorSettings {
        api_key: Some("key".to_string()),
        secondary_key: Some("group-1".to_string()),
        base_url: Some(format!("{}/t2a_v2", server.uri())),
        model: None,
    });
    tts.initialize().await.unwrap();

    let result = tts
        .synthesize(&SynthesisRequest::new("語音", "service2"))
        .await
        .unwrap();

    assert_eq!(result.mode, SynthesisMode::Real);
    assert_eq!(result.audio, FAKE_WAV);
}

#[tokio::test]
async fn test_minimax_vendor_error_is_surfaced_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/t2a_v2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "base_resp": { "status_code": 1004, "status_msg": "quota exceeded" }
        })))
        .mount(&server)
        .await;

    let tts = MinimaxTts::new(&VendorSettings {
        api_key: Some("key".to_string()),
        base_url: Some(format!("{}/t2a_v2", server.uri())),
        ..Default::default()
    });

    let result = tts
        .synthesize(&SynthesisRequest::new("hi", "service2"))
        .await;

    match result {
        Err(TtsError::Vendor(msg)) => assert_eq!(msg, "quota exceeded"),
        other => panic!("expected vendor error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_aten_submit_poll_download() {
    let server = MockServer::start().await;
    let result_url = format!("{}/files/syn-1.wav", server.uri());

    Mock::given(method("GET"))
        .and(path("/api/v1/models/api_token"))
        .and(header("Authorization", "token-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "data": [{ "model_id": "Aurora" }] })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/syntheses/api_token"))
        .and(header("Authorization", "token-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "synthesis_id": "syn-1" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/syntheses/syn-1/api_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "Success",
            "synthesis_path": result_url
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/files/syn-1.wav"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_WAV))
        .mount(&server)
        .await;

    let mut tts = AtenTts::new(
        &VendorSettings {
            api_key: Some("token-1".to_string()),
            base_url: Some(server.uri()),
            ..Default::default()
        },
        no_rate_limit(),
    );
    tts.initialize().await.unwrap();

    let mut request = SynthesisRequest::new("台灣測試", "service3");
    request.language = "zh-TW".to_string();
    let result = tts.synthesize(&request).await.unwrap();

    assert_eq!(result.mode, SynthesisMode::Real);
    assert_eq!(result.audio, FAKE_WAV);
    assert_eq!(result.echoed["voice_name"], "Aurora");
}

#[tokio::test]
async fn test_aten_synthesis_error_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/models/api_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!([{ "model_id": "Aurora" }])),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/syntheses/api_token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "synthesis_id": "syn-2" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/syntheses/syn-2/api_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "Error",
            "message": "voice model not licensed"
        })))
        .mount(&server)
        .await;

    let mut tts = AtenTts::new(
        &VendorSettings {
            api_key: Some("token-1".to_string()),
            base_url: Some(server.uri()),
            ..Default::default()
        },
        no_rate_limit(),
    );
    tts.initialize().await.unwrap();

    let result = tts
        .synthesize(&SynthesisRequest::new("hi", "service3"))
        .await;

    match result {
        Err(TtsError::Vendor(msg)) => assert_eq!(msg, "voice model not licensed"),
        other => panic!("expected vendor error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_eugenes_speech_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/tts"))
        .and(body_partial_json(serde_json::json!({
            "voice_id": "zh-female-professional",
            "emotion": "calm",
            "format": "wav",
            "enable_emotion_control": true,
            "enable_prosody_control": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_WAV))
        .mount(&server)
        .await;

    let mut tts = EugenesTts::new(&VendorSettings {
        api_key: Some("key".to_string()),
        base_url: Some(format!("{}/v1/tts", server.uri())),
        ..Default::default()
    });
    tts.initialize().await.unwrap();

    let mut request = SynthesisRequest::new("合成測試", "service5");
    request
        .voice_config
        .insert("voice_id".into(), serde_json::json!("zh-female-professional"));
    request
        .voice_config
        .insert("emotion".into(), serde_json::json!("calm"));

    let result = tts.synthesize(&request).await.unwrap();
    assert_eq!(result.mode, SynthesisMode::Real);
    assert_eq!(result.audio, FAKE_WAV);
}

#[tokio::test]
async fn test_openai_speech_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/audio/speech"))
        .and(body_partial_json(serde_json::json!({
            "model": "tts-1-hd",
            "voice": "nova",
            "response_format": "wav",
            "speed": 1.5
        })))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_WAV))
        .mount(&server)
        .await;

    let mut tts = OpenAiTts::new(&VendorSettings {
        api_key: Some("sk-test".to_string()),
        base_url: Some(format!("{}/v1/audio/speech", server.uri())),
        ..Default::default()
    });
    tts.initialize().await.unwrap();

    let mut request = SynthesisRequest::new("hello", "service4");
    request.language = "en".to_string();
    request
        .voice_config
        .insert("voice".into(), serde_json::json!("nova"));
    request
        .voice_config
        .insert("model".into(), serde_json::json!("tts-1-hd"));
    request
        .voice_config
        .insert("speed".into(), serde_json::json!(1.5));

    let result = tts.synthesize(&request).await.unwrap();
    assert_eq!(result.mode, SynthesisMode::Real);
    assert_eq!(result.audio, FAKE_WAV);
}
