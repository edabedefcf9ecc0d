use crate::{
    compat::{Modality, Task},
    image::ImageReference,
};

/// The single pending input of a session.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Payload {
    #[default]
    Empty,
    Text(String),
    Image(ImageReference),
}

/// Selection and input for one interactive session.
///
/// Holds at most one payload: setting text drops an uploaded image and
/// uploading an image drops typed text. Changing modality or task keeps the
/// payload; a payload that does not match the modality is simply not seen by
/// the text or image checks at dispatch time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionState {
    modality: Modality,
    task: Task,
    payload: Payload,
}

/// Read-only view of a session, taken at the start of a dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SessionSnapshot<'a> {
    /// Selected input modality.
    pub modality: Modality,
    /// Selected task.
    pub task: Task,
    /// Typed text, if the pending payload is text.
    pub text: Option<&'a str>,
    /// Uploaded image, if the pending payload is an image.
    pub image: Option<&'a ImageReference>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modality(&self) -> Modality {
        self.modality
    }

    pub fn task(&self) -> Task {
        self.task
    }

    pub fn set_modality(&mut self, modality: Modality) {
        self.modality = modality;
    }

    pub fn set_task(&mut self, task: Task) {
        self.task = task;
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.payload = Payload::Text(text.into());
    }

    /// Records a file picker result; `None` means nothing was selected and
    /// drops any previously uploaded image.
    pub fn set_image_reference(&mut self, reference: Option<ImageReference>) {
        match reference {
            Some(reference) => self.payload = Payload::Image(reference),
            None => {
                if matches!(self.payload, Payload::Image(_)) {
                    self.payload = Payload::Empty;
                }
            }
        }
    }

    /// Resets modality and task to their defaults and drops every payload.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        let (text, image) = match &self.payload {
            Payload::Empty => (None, None),
            Payload::Text(text) => (Some(text.as_str()), None),
            Payload::Image(reference) => (None, Some(reference)),
        };

        SessionSnapshot {
            modality: self.modality,
            task: self.task,
            text,
            image,
        }
    }
}
