/// Outward notification fired when a metric sustains above its threshold.
///
/// Fire-and-forget: implementations log delivery failures and never retry
/// or report them back to the pipeline.
pub trait EventNotifier: Send {
    fn notify(&self, value: f32);
}
