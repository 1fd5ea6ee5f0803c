pub mod tts;
pub mod video;

// Re-export commonly used types for convenience
pub use tts::{
    DispatchOutcome, ProviderRegistry, ProviderStatus, SynthesisMode, SynthesisRequest,
    SynthesisResult, TtsAdapter, TtsError, TtsResult, build_registry,
};

pub use video::{RemoteTaskClient, RemoteTaskConfig, RemoteTaskError};
