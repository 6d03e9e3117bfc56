use crate::error::SyncError;

/// Reports an unrecoverable creation failure.
///
/// The event is emitted at `ERROR` level with `fatal = true` so subscribers
/// can route it separately. The process keeps running: the caller still
/// receives the error and decides what to do with the missing handle.
pub(crate) fn fatal(err: &SyncError) {
    tracing::error!(target: "nebula_sync", fatal = true, "{err}");
}

/// Reports `err` through [`fatal`] and hands it back for propagation.
pub(crate) fn fail<T>(err: SyncError) -> Result<T, SyncError> {
    fatal(&err);
    Err(err)
}
