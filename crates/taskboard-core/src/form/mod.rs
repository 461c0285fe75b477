// ── Request-form controller ──
//
// Binds editable form data to a submittable HTTP action. Tracks dirtiness
// against the initial snapshot, in-flight state, upload progress, and a
// per-field error map normalized from backend failures. At most one
// request per controller is live when auto-cancel is on.

mod fields;
mod options;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use taskboard_api::{
    ApiClient, Error, ErrorMessages, HttpMethod, Payload, ProgressFn, RequestSpec,
    ValidationErrors, normalize_errors,
};

use crate::error::CoreError;

pub use options::{FormOptions, RECENTLY_SUCCESSFUL_TIMEOUT, SubmitOptions, SubmitOutcome};

type Transform<T> = Arc<dyn Fn(&T) -> Result<Value, CoreError> + Send + Sync>;

/// Bound shared by everything a form can hold.
pub trait FormData: Clone + PartialEq + Serialize + DeserializeOwned + Send + 'static {}

impl<T> FormData for T where T: Clone + PartialEq + Serialize + DeserializeOwned + Send + 'static {}

// ── State ────────────────────────────────────────────────────────

struct ActiveRequest {
    generation: u64,
    token: CancellationToken,
}

struct FormState<T> {
    current: T,
    initial: T,
    errors: ValidationErrors,
    processing: bool,
    progress: Option<u8>,
    recently_successful: bool,
    active: Vec<ActiveRequest>,
    success_timer: Option<JoinHandle<()>>,
    torn_down: bool,
}

impl<T> FormState<T> {
    /// Cancel every live request and leave the form idle.
    fn cancel_active(&mut self) {
        for active in self.active.drain(..) {
            debug!(generation = active.generation, "cancelling form request");
            active.token.cancel();
        }
        self.processing = false;
        self.progress = None;
    }

    fn shut_down(&mut self) {
        self.torn_down = true;
        self.cancel_active();
        if let Some(timer) = self.success_timer.take() {
            timer.abort();
        }
    }
}

struct FormInner<T> {
    client: ApiClient,
    options: FormOptions,
    state: Mutex<FormState<T>>,
    transform: Mutex<Option<Transform<T>>>,
    generation: AtomicU64,
}

impl<T> FormInner<T> {
    fn lock(&self) -> MutexGuard<'_, FormState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Drop for FormInner<T> {
    fn drop(&mut self) {
        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .shut_down();
    }
}

/// Settles request state when a submit ends, however it ends. A submit
/// future dropped mid-request still leaves the form idle.
struct InFlight<'a, T> {
    inner: &'a FormInner<T>,
    generation: u64,
    token: CancellationToken,
}

impl<T> Drop for InFlight<'_, T> {
    fn drop(&mut self) {
        self.token.cancel();
        let mut state = self.inner.lock();
        state.active.retain(|active| active.generation != self.generation);
        if state.active.is_empty() {
            state.processing = false;
            state.progress = None;
        }
    }
}

// ── FormController ───────────────────────────────────────────────

/// Editable form data plus the request that submits it.
///
/// Cheaply cloneable; clones share state. Dropping the last handle (or
/// calling [`teardown`](Self::teardown)) cancels any in-flight request and
/// the pending "recently successful" timer.
pub struct FormController<T> {
    inner: Arc<FormInner<T>>,
}

impl<T> Clone for FormController<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for FormController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("FormController")
            .field("current", &state.current)
            .field("errors", &state.errors)
            .field("processing", &state.processing)
            .field("progress", &state.progress)
            .field("recently_successful", &state.recently_successful)
            .finish_non_exhaustive()
    }
}

impl<T: FormData> FormController<T> {
    pub fn new(client: ApiClient, initial: T) -> Self {
        Self::with_options(client, initial, FormOptions::default())
    }

    pub fn with_options(client: ApiClient, initial: T, options: FormOptions) -> Self {
        Self {
            inner: Arc::new(FormInner {
                client,
                options,
                state: Mutex::new(FormState {
                    current: initial.clone(),
                    initial,
                    errors: ValidationErrors::new(),
                    processing: false,
                    progress: None,
                    recently_successful: false,
                    active: Vec::new(),
                    success_timer: None,
                    torn_down: false,
                }),
                transform: Mutex::new(None),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn options(&self) -> &FormOptions {
        &self.inner.options
    }

    // ── Data ─────────────────────────────────────────────────────

    /// Current field values.
    pub fn data(&self) -> T {
        self.inner.lock().current.clone()
    }

    /// Snapshot taken at construction.
    pub fn initial(&self) -> T {
        self.inner.lock().initial.clone()
    }

    /// `true` when the current values differ from the initial snapshot.
    pub fn is_dirty(&self) -> bool {
        let state = self.inner.lock();
        state.current != state.initial
    }

    /// Set one field by its serialized name.
    pub fn set_field<V: Serialize>(&self, key: &str, value: V) -> Result<(), CoreError> {
        let mut state = self.inner.lock();
        state.current = fields::set_field(&state.current, key, value)?;
        Ok(())
    }

    /// Mutate the current values in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.inner.lock().current);
    }

    /// Restore every field from the initial snapshot.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        state.current = state.initial.clone();
    }

    /// Restore only the named fields from the initial snapshot.
    pub fn reset_fields(&self, fields: &[&str]) -> Result<(), CoreError> {
        if fields.is_empty() {
            self.reset();
            return Ok(());
        }
        let mut state = self.inner.lock();
        state.current = fields::copy_fields(&state.current, &state.initial, fields)?;
        Ok(())
    }

    /// Overwrite the fields present in `partial`. The initial snapshot is untouched.
    pub fn replace<P: Serialize>(&self, partial: &P) -> Result<(), CoreError> {
        let mut state = self.inner.lock();
        state.current = fields::merge(&state.current, partial)?;
        Ok(())
    }

    /// Replace the outgoing payload transform. The default sends the data as-is.
    pub fn set_transform<F>(&self, f: F)
    where
        F: Fn(&T) -> Value + Send + Sync + 'static,
    {
        let transform: Transform<T> = Arc::new(move |data| Ok(f(data)));
        *self
            .inner
            .transform
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(transform);
    }

    // ── Errors ───────────────────────────────────────────────────

    pub fn errors(&self) -> ValidationErrors {
        self.inner.lock().errors.clone()
    }

    pub fn error(&self, field: &str) -> Option<ErrorMessages> {
        self.inner.lock().errors.get(field).cloned()
    }

    pub fn has_errors(&self) -> bool {
        !self.inner.lock().errors.is_empty()
    }

    pub fn set_error(&self, field: &str, message: impl Into<ErrorMessages>) {
        self.inner
            .lock()
            .errors
            .insert(field.to_owned(), message.into());
    }

    /// Merge `errors` into the current map.
    pub fn set_errors(&self, errors: ValidationErrors) {
        self.inner.lock().errors.extend(errors);
    }

    pub fn clear_errors(&self) {
        self.inner.lock().errors.clear();
    }

    /// Remove the errors of the named fields only.
    pub fn clear_field_errors(&self, fields: &[&str]) {
        let mut state = self.inner.lock();
        for field in fields {
            state.errors.remove(*field);
        }
    }

    // ── Request state ────────────────────────────────────────────

    pub fn processing(&self) -> bool {
        self.inner.lock().processing
    }

    pub fn progress(&self) -> Option<u8> {
        self.inner.lock().progress
    }

    pub fn recently_successful(&self) -> bool {
        self.inner.lock().recently_successful
    }

    /// Abort every in-flight request. Their callbacks will not fire.
    pub fn cancel(&self) {
        self.inner.lock().cancel_active();
    }

    /// Cancel in-flight work and stop all timers. Later submits resolve
    /// to [`SubmitOutcome::Cancelled`] without sending anything.
    pub fn teardown(&self) {
        self.inner.lock().shut_down();
    }

    // ── Submission ───────────────────────────────────────────────

    pub async fn get(&self, url: &str, options: SubmitOptions<T>) -> SubmitOutcome {
        self.submit(HttpMethod::Get, url, options).await
    }

    pub async fn post(&self, url: &str, options: SubmitOptions<T>) -> SubmitOutcome {
        self.submit(HttpMethod::Post, url, options).await
    }

    pub async fn put(&self, url: &str, options: SubmitOptions<T>) -> SubmitOutcome {
        self.submit(HttpMethod::Put, url, options).await
    }

    pub async fn patch(&self, url: &str, options: SubmitOptions<T>) -> SubmitOutcome {
        self.submit(HttpMethod::Patch, url, options).await
    }

    pub async fn delete(&self, url: &str, options: SubmitOptions<T>) -> SubmitOutcome {
        self.submit(HttpMethod::Delete, url, options).await
    }

    /// Submit the current data.
    ///
    /// The guard runs first and may abort. Otherwise any previous request
    /// is cancelled (with auto-cancel), state flips to processing, and the
    /// transformed data is sent. Success clears errors and marks the form
    /// recently successful; failure stores the normalized error map. A
    /// cancelled request keeps no result and fires no further callbacks.
    pub async fn submit(
        &self,
        method: HttpMethod,
        url: &str,
        mut options: SubmitOptions<T>,
    ) -> SubmitOutcome {
        if let Some(guard) = options.on_before.take() {
            let data = self.data();
            if !guard(&data) {
                debug!(%method, url, "submit aborted by guard");
                return SubmitOutcome::Aborted;
            }
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let token = CancellationToken::new();

        let data = {
            let mut state = self.inner.lock();
            if state.torn_down {
                return SubmitOutcome::Cancelled;
            }
            if self.inner.options.auto_cancel {
                for previous in state.active.drain(..) {
                    debug!(generation = previous.generation, "superseding in-flight request");
                    previous.token.cancel();
                }
            }
            state.active.push(ActiveRequest {
                generation,
                token: token.clone(),
            });
            state.processing = true;
            state.progress = None;
            state.errors.clear();
            state.current.clone()
        };
        let in_flight = InFlight {
            inner: &self.inner,
            generation,
            token: token.clone(),
        };

        if let Some(on_start) = options.on_start.take() {
            on_start();
        }

        let result = match self.build_payload(method, &data) {
            Ok(payload) => {
                let mut spec = RequestSpec::new(method, url).payload(payload);
                if method.sends_body() {
                    let hook = options.on_progress.take();
                    spec = spec.on_progress(self.progress_reporter(token.clone(), hook));
                }
                let client = self.inner.client.clone();
                tokio::select! {
                    biased;
                    () = token.cancelled() => None,
                    result = client.send(spec) => Some(result),
                }
            }
            Err(err) => Some(Err(Error::Payload(err.to_string()))),
        };

        // The result is committed under the lock, so a concurrent cancel or
        // teardown either wins outright or finds the request already settled.
        let outcome = result.and_then(|result| {
            let mut state = self.inner.lock();
            if token.is_cancelled() || state.torn_down {
                return None;
            }
            Some(match result {
                Ok(response) => {
                    state.errors.clear();
                    self.mark_recently_successful(&mut state);
                    if self.inner.options.reset_on_success {
                        state.current = state.initial.clone();
                    }
                    SubmitOutcome::Succeeded(response)
                }
                Err(error) => {
                    let errors = normalize_errors(error.body());
                    state.errors.clone_from(&errors);
                    SubmitOutcome::Failed { errors, error }
                }
            })
        });
        let Some(outcome) = outcome else {
            debug!(generation, %method, url, "form request cancelled");
            return SubmitOutcome::Cancelled;
        };

        match &outcome {
            SubmitOutcome::Succeeded(response) => {
                if let Some(on_success) = options.on_success.take() {
                    on_success(response);
                }
            }
            SubmitOutcome::Failed { errors, error } => {
                match error.status() {
                    Some(status) => debug!(%method, url, status, "form request rejected"),
                    None => warn!(%method, url, error = %error, "form request failed"),
                }
                if let Some(on_error) = options.on_error.take() {
                    on_error(errors, error);
                }
            }
            SubmitOutcome::Aborted | SubmitOutcome::Cancelled => {}
        }

        drop(in_flight);
        let torn_down = self.inner.lock().torn_down;
        if let Some(on_finish) = options.on_finish.take().filter(|_| !torn_down) {
            on_finish();
        }

        outcome
    }

    fn build_payload(&self, method: HttpMethod, data: &T) -> Result<Payload, CoreError> {
        let transform = self
            .inner
            .transform
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let value = match transform {
            Some(transform) => transform(data)?,
            None => serde_json::to_value(data)?,
        };
        Ok(Payload::encode(
            method,
            &value,
            self.inner.options.force_form_data,
        ))
    }

    /// Progress callback handed to the transport for body requests. Updates
    /// `progress` and forwards to the caller's hook until the request is
    /// cancelled.
    fn progress_reporter(
        &self,
        token: CancellationToken,
        hook: Option<Box<dyn FnMut(u8) + Send>>,
    ) -> ProgressFn {
        let weak: Weak<FormInner<T>> = Arc::downgrade(&self.inner);
        let hook = Mutex::new(hook);
        Arc::new(move |percent| {
            if token.is_cancelled() {
                return;
            }
            let Some(inner) = weak.upgrade() else {
                return;
            };
            inner.lock().progress = Some(percent);
            if let Some(hook) = hook.lock().unwrap_or_else(PoisonError::into_inner).as_mut() {
                hook(percent);
            }
        })
    }

    /// Set `recently_successful` and (re)start its expiry timer.
    fn mark_recently_successful(&self, state: &mut FormState<T>) {
        state.recently_successful = true;
        if let Some(timer) = state.success_timer.take() {
            timer.abort();
        }
        let weak = Arc::downgrade(&self.inner);
        let timeout = self.inner.options.recently_successful_timeout;
        state.success_timer = Some(tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = weak.upgrade() {
                inner.lock().recently_successful = false;
            }
        }));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use serde::Deserialize;
    use serde_json::json;

    use taskboard_api::{MemoryTokenStore, TransportConfig};

    use super::*;

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Settings {
        title: String,
        tags: Vec<String>,
        meta: Meta,
    }

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct Meta {
        color: Option<String>,
        limits: Vec<u32>,
    }

    fn client() -> ApiClient {
        ApiClient::new(
            "http://127.0.0.1:9",
            &TransportConfig::default(),
            Arc::new(MemoryTokenStore::new()),
        )
        .unwrap()
    }

    fn form() -> FormController<Settings> {
        FormController::new(
            client(),
            Settings {
                title: "Q3".into(),
                tags: vec!["a".into()],
                meta: Meta {
                    color: None,
                    limits: vec![1, 2],
                },
            },
        )
    }

    #[tokio::test]
    async fn dirty_tracks_deep_equality() {
        let form = form();
        assert!(!form.is_dirty());

        form.update(|s| s.meta.limits.push(3));
        assert!(form.is_dirty());

        form.update(|s| {
            s.meta.limits.pop();
        });
        assert!(!form.is_dirty());

        form.set_field("tags", vec!["a", "b"]).unwrap();
        assert!(form.is_dirty());
        form.set_field("tags", vec!["a"]).unwrap();
        assert!(!form.is_dirty());

        form.update(|s| s.meta.color = Some("red".into()));
        assert!(form.is_dirty());
    }

    #[tokio::test]
    async fn reset_restores_snapshot() {
        let form = form();
        let initial = form.initial();

        form.set_field("title", "Q4").unwrap();
        form.update(|s| s.tags.clear());
        form.replace(&json!({ "meta": { "color": "blue", "limits": [] } }))
            .unwrap();
        assert!(form.is_dirty());

        form.reset();
        assert_eq!(form.data(), initial);
        assert_eq!(form.initial(), initial);
    }

    #[tokio::test]
    async fn reset_fields_only_touches_named_fields() {
        let form = form();
        form.set_field("title", "Changed").unwrap();
        form.update(|s| s.tags.push("z".into()));

        form.reset_fields(&["title"]).unwrap();
        let data = form.data();
        assert_eq!(data.title, "Q3");
        assert_eq!(data.tags, vec!["a".to_string(), "z".to_string()]);
        assert!(form.is_dirty());
    }

    #[tokio::test]
    async fn replace_does_not_move_initial() {
        let form = form();
        form.replace(&json!({ "title": "New" })).unwrap();
        assert_eq!(form.data().title, "New");
        assert_eq!(form.initial().title, "Q3");
        assert!(form.replace(&json!({ "title": 5 })).is_err());
    }

    #[tokio::test]
    async fn error_map_manipulation() {
        let form = form();
        assert!(!form.has_errors());

        form.set_error("title", "required");
        form.set_errors(ValidationErrors::from([
            ("tags".to_string(), ErrorMessages::Multiple(vec!["too many".into()])),
            ("title".to_string(), ErrorMessages::Single("too short".into())),
        ]));
        assert_eq!(form.errors().len(), 2);
        assert_eq!(form.error("title").unwrap().first(), Some("too short"));

        form.clear_field_errors(&["tags"]);
        assert!(form.error("tags").is_none());
        assert!(form.has_errors());

        form.clear_errors();
        assert!(!form.has_errors());
    }

    #[tokio::test(start_paused = true)]
    async fn recently_successful_window_restarts() {
        let form = form();
        assert!(!form.recently_successful());

        form.mark_recently_successful(&mut form.inner.lock());
        assert!(form.recently_successful());

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(form.recently_successful());

        form.mark_recently_successful(&mut form.inner.lock());
        tokio::time::sleep(Duration::from_millis(1000)).await;
        assert!(form.recently_successful(), "second success extends the window");

        tokio::time::sleep(Duration::from_millis(1100)).await;
        assert!(!form.recently_successful());
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_stops_success_timer() {
        let form = form();
        form.mark_recently_successful(&mut form.inner.lock());
        form.teardown();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(form.recently_successful(), "timer was cleared, flag never flips");
        assert!(form.inner.lock().success_timer.is_none());
    }

    #[tokio::test]
    async fn torn_down_form_does_not_submit() {
        let form = form();
        form.teardown();
        let outcome = form
            .post(
                "/settings",
                SubmitOptions::new().on_start(|| panic!("must not start")),
            )
            .await;
        assert!(matches!(outcome, SubmitOutcome::Cancelled));
        assert!(!form.processing());
    }

    #[tokio::test]
    async fn transform_shapes_payload() {
        let form = form();
        form.set_transform(|s: &Settings| json!({ "name": s.title.to_uppercase() }));
        let payload = form.build_payload(HttpMethod::Get, &form.data()).unwrap();
        assert_eq!(
            payload,
            Payload::Query(vec![("name".into(), "Q3".into())])
        );
    }
}
