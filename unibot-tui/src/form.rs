use unibot_core::{Secret, StartMode, StartRequest};

/// Which dashboard element receives keystrokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Email,
    Password,
    Lessons,
    SkipVideo,
    Logs,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Email,
        Focus::Password,
        Focus::Lessons,
        Focus::SkipVideo,
        Focus::Logs,
    ];

    pub fn next(self) -> Focus {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + 1) % Self::ORDER.len()]
    }

    pub fn prev(self) -> Focus {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        Self::ORDER[(idx + Self::ORDER.len() - 1) % Self::ORDER.len()]
    }

    pub fn is_text(self) -> bool {
        matches!(self, Focus::Email | Focus::Password | Focus::Lessons)
    }
}

/// Start form contents. Single and batch mode keep separate lesson fields
/// so switching modes does not lose what was typed.
#[derive(Debug, Clone)]
pub struct StartForm {
    pub mode: StartMode,
    pub email: String,
    password: String,
    pub lesson: String,
    pub batch_lessons: String,
    pub skip_video: bool,
}

impl StartForm {
    pub fn new(last_account: Option<String>) -> Self {
        Self {
            mode: StartMode::Single,
            email: last_account.unwrap_or_default(),
            password: String::new(),
            lesson: String::new(),
            batch_lessons: String::new(),
            skip_video: false,
        }
    }

    pub fn toggle_mode(&mut self) {
        self.mode = self.mode.toggle();
    }

    pub fn lessons(&self) -> &str {
        match self.mode {
            StartMode::Single => &self.lesson,
            StartMode::Batch => &self.batch_lessons,
        }
    }

    pub fn masked_password(&self) -> String {
        "•".repeat(self.password.chars().count())
    }

    fn field_mut(&mut self, focus: Focus) -> Option<&mut String> {
        match focus {
            Focus::Email => Some(&mut self.email),
            Focus::Password => Some(&mut self.password),
            Focus::Lessons => Some(match self.mode {
                StartMode::Single => &mut self.lesson,
                StartMode::Batch => &mut self.batch_lessons,
            }),
            Focus::SkipVideo | Focus::Logs => None,
        }
    }

    pub fn insert(&mut self, focus: Focus, c: char) {
        if focus == Focus::SkipVideo && c == ' ' {
            self.skip_video = !self.skip_video;
        } else if let Some(field) = self.field_mut(focus) {
            field.push(c);
        }
    }

    pub fn backspace(&mut self, focus: Focus) {
        if let Some(field) = self.field_mut(focus) {
            field.pop();
        }
    }

    pub fn to_request(&self) -> StartRequest {
        StartRequest::new(
            self.email.clone(),
            Secret::new(self.password.clone()),
            self.lessons().to_string(),
        )
        .with_skip_video(self.skip_video)
    }

    pub fn is_complete(&self) -> bool {
        self.to_request().is_complete()
    }
}
