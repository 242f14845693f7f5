//! Resource lifecycle events.
//!
//! Every resource operation emits a structured `tracing` event under the
//! `elasticstack::resource` target with an `event_type` field, so log
//! pipelines can follow an apply without parsing messages.
//!
//! # Usage
//!
//! ```rust,ignore
//! emit_resource_creating!("elasticstack_elasticsearch_script");
//! emit_resource_created!("elasticstack_elasticsearch_script", "0a1b2c/s1", 42);
//! ```

/// Emit a resource creating event.
#[macro_export]
macro_rules! emit_resource_creating {
    ($resource_type:expr) => {
        ::tracing::info!(
            target: "elasticstack::resource",
            event_type = "resource.creating",
            resource_type = %$resource_type,
        )
    };
}

/// Emit a resource created event.
#[macro_export]
macro_rules! emit_resource_created {
    ($resource_type:expr, $id:expr, $duration_ms:expr) => {
        ::tracing::info!(
            target: "elasticstack::resource",
            event_type = "resource.created",
            resource_type = %$resource_type,
            id = %$id,
            duration_ms = $duration_ms,
        )
    };
}

/// Emit a resource read event.
#[macro_export]
macro_rules! emit_resource_read {
    ($resource_type:expr, $id:expr, $duration_ms:expr) => {
        ::tracing::debug!(
            target: "elasticstack::resource",
            event_type = "resource.read",
            resource_type = %$resource_type,
            id = %$id,
            duration_ms = $duration_ms,
        )
    };
}

/// Emit a resource removed event (gone from the server on read).
#[macro_export]
macro_rules! emit_resource_removed {
    ($resource_type:expr, $id:expr) => {
        ::tracing::warn!(
            target: "elasticstack::resource",
            event_type = "resource.removed",
            resource_type = %$resource_type,
            id = %$id,
        )
    };
}

/// Emit a resource updating event.
#[macro_export]
macro_rules! emit_resource_updating {
    ($resource_type:expr, $id:expr) => {
        ::tracing::info!(
            target: "elasticstack::resource",
            event_type = "resource.updating",
            resource_type = %$resource_type,
            id = %$id,
        )
    };
}

/// Emit a resource updated event.
#[macro_export]
macro_rules! emit_resource_updated {
    ($resource_type:expr, $id:expr, $duration_ms:expr) => {
        ::tracing::info!(
            target: "elasticstack::resource",
            event_type = "resource.updated",
            resource_type = %$resource_type,
            id = %$id,
            duration_ms = $duration_ms,
        )
    };
}

/// Emit a resource deleting event.
#[macro_export]
macro_rules! emit_resource_deleting {
    ($resource_type:expr, $id:expr) => {
        ::tracing::info!(
            target: "elasticstack::resource",
            event_type = "resource.deleting",
            resource_type = %$resource_type,
            id = %$id,
        )
    };
}

/// Emit a resource deleted event.
#[macro_export]
macro_rules! emit_resource_deleted {
    ($resource_type:expr, $id:expr, $duration_ms:expr) => {
        ::tracing::info!(
            target: "elasticstack::resource",
            event_type = "resource.deleted",
            resource_type = %$resource_type,
            id = %$id,
            duration_ms = $duration_ms,
        )
    };
}

/// Emit a resource imported event.
#[macro_export]
macro_rules! emit_resource_imported {
    ($resource_type:expr, $id:expr) => {
        ::tracing::info!(
            target: "elasticstack::resource",
            event_type = "resource.imported",
            resource_type = %$resource_type,
            id = %$id,
        )
    };
}

/// Emit a resource failed event.
#[macro_export]
macro_rules! emit_resource_failed {
    ($resource_type:expr, $operation:expr, $error_count:expr) => {
        ::tracing::error!(
            target: "elasticstack::resource",
            event_type = "resource.failed",
            resource_type = %$resource_type,
            operation = %$operation,
            error_count = $error_count,
        )
    };
}
