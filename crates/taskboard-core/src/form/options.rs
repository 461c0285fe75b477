// Controller-level options, per-submit callbacks, and submit outcomes.

use std::fmt;
use std::time::Duration;

use taskboard_api::{ApiResponse, Error, ValidationErrors};

/// Default window during which a form reports `recently_successful`.
pub const RECENTLY_SUCCESSFUL_TIMEOUT: Duration = Duration::from_millis(2000);

/// Behaviour shared by every submit of one controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormOptions {
    /// Cancel the in-flight request when a new submit starts.
    pub auto_cancel: bool,
    /// Restore `initial` into `current` after a successful submit.
    pub reset_on_success: bool,
    /// How long `recently_successful` stays set after a success.
    pub recently_successful_timeout: Duration,
    /// Always send body payloads as multipart form data.
    pub force_form_data: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            auto_cancel: true,
            reset_on_success: false,
            recently_successful_timeout: RECENTLY_SUCCESSFUL_TIMEOUT,
            force_form_data: false,
        }
    }
}

type Guard<T> = Box<dyn FnOnce(&T) -> bool + Send>;
type Hook = Box<dyn FnOnce() + Send>;
type ProgressHook = Box<dyn FnMut(u8) + Send>;
type SuccessHook = Box<dyn FnOnce(&ApiResponse) + Send>;
type ErrorHook = Box<dyn FnOnce(&ValidationErrors, &Error) + Send>;

/// Callbacks for a single submit.
///
/// All hooks are optional. None of them fire for a request that was
/// cancelled, and none fire after the controller is torn down.
pub struct SubmitOptions<T> {
    pub(crate) on_before: Option<Guard<T>>,
    pub(crate) on_start: Option<Hook>,
    pub(crate) on_progress: Option<ProgressHook>,
    pub(crate) on_success: Option<SuccessHook>,
    pub(crate) on_error: Option<ErrorHook>,
    pub(crate) on_finish: Option<Hook>,
}

impl<T> Default for SubmitOptions<T> {
    fn default() -> Self {
        Self {
            on_before: None,
            on_start: None,
            on_progress: None,
            on_success: None,
            on_error: None,
            on_finish: None,
        }
    }
}

impl<T> SubmitOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-flight guard, called with the current data. Returning `false`
    /// aborts the submit before anything else happens.
    pub fn on_before(mut self, f: impl FnOnce(&T) -> bool + Send + 'static) -> Self {
        self.on_before = Some(Box::new(f));
        self
    }

    pub fn on_start(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_start = Some(Box::new(f));
        self
    }

    /// Upload progress as a whole percentage.
    pub fn on_progress(mut self, f: impl FnMut(u8) + Send + 'static) -> Self {
        self.on_progress = Some(Box::new(f));
        self
    }

    pub fn on_success(mut self, f: impl FnOnce(&ApiResponse) + Send + 'static) -> Self {
        self.on_success = Some(Box::new(f));
        self
    }

    /// Receives the normalized error map and the raw failure.
    pub fn on_error(
        mut self,
        f: impl FnOnce(&ValidationErrors, &Error) + Send + 'static,
    ) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    /// Runs last, after success or failure.
    pub fn on_finish(mut self, f: impl FnOnce() + Send + 'static) -> Self {
        self.on_finish = Some(Box::new(f));
        self
    }
}

impl<T> fmt::Debug for SubmitOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubmitOptions")
            .field("on_before", &self.on_before.is_some())
            .field("on_start", &self.on_start.is_some())
            .field("on_progress", &self.on_progress.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_finish", &self.on_finish.is_some())
            .finish()
    }
}

/// How a submit ended.
#[derive(Debug)]
pub enum SubmitOutcome {
    /// The pre-flight guard returned `false`; nothing was sent.
    Aborted,
    /// Superseded by a newer submit, cancelled, or torn down.
    Cancelled,
    Succeeded(ApiResponse),
    Failed {
        errors: ValidationErrors,
        error: Error,
    },
}

impl SubmitOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn response(&self) -> Option<&ApiResponse> {
        match self {
            Self::Succeeded(resp) => Some(resp),
            _ => None,
        }
    }
}
