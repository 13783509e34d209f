pub mod language;
mod transcript;

pub use transcript::Transcript;
