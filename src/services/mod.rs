//! External speech and text services: transcription, translation, synthesis.
//!
//! Each service is a trait with a mock for tests and, behind the `remote`
//! feature, an HTTP adapter.

#[cfg(feature = "remote")]
pub mod google;
#[cfg(feature = "remote")]
pub mod openai;
pub mod synthesizer;
pub mod transcriber;
pub mod translator;

pub use synthesizer::{MockSynthesizer, Synthesizer, split_text};
pub use transcriber::{MockTranscriber, Transcriber};
pub use translator::{MockTranslator, Translator};

#[cfg(feature = "remote")]
pub use google::{GoogleTranslator, GoogleTts};
#[cfg(feature = "remote")]
pub use openai::OpenAiTranscriber;

use std::sync::Arc;

/// The three services one dubbing run talks to.
#[derive(Clone)]
pub struct Services {
    pub transcriber: Arc<dyn Transcriber>,
    pub translator: Arc<dyn Translator>,
    pub synthesizer: Arc<dyn Synthesizer>,
}

impl Services {
    pub fn new(
        transcriber: Arc<dyn Transcriber>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn Synthesizer>,
    ) -> Self {
        Self {
            transcriber,
            translator,
            synthesizer,
        }
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("transcriber", &self.transcriber.model_name())
            .field("translator", &self.translator.name())
            .field("synthesizer", &self.synthesizer.name())
            .finish()
    }
}
