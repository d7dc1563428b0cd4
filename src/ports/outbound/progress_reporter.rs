/// ProgressReporter port for user-facing progress
///
/// Installs take seconds to minutes each, so use cases announce every
/// phase and count finished sandboxes. Reporters are shared between
/// concurrent measurement tasks.
pub trait ProgressReporter: Send + Sync {
    /// Reports a progress message
    fn report(&self, message: &str);

    /// Reports how many of `total` items are done
    ///
    /// # Arguments
    /// * `current` - Items finished so far
    /// * `total` - Items in the batch
    /// * `message` - Optional label of the item that just finished
    fn report_progress(&self, current: usize, total: usize, message: Option<&str>);

    /// Reports an error or warning message
    fn report_error(&self, message: &str);

    /// Reports completion of an operation
    fn report_completion(&self, message: &str);
}
