/// The outcome of one inference call: the recognized text and the language
/// it was spoken in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub text: String,
    pub language: String,
}

impl Transcript {
    /// Leading and trailing whitespace is stripped from `text`; whisper
    /// decoders pad segment boundaries with spaces.
    pub fn new(text: impl Into<String>, language: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            text: text.trim().to_string(),
            language: language.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
