//! The resource abstraction.
//!
//! Each resource implements [`Resource`] over its own typed model. The
//! blanket [`DynResource`] impl adapts it to dynamic [`AttrValue`] state,
//! which is what the plugin protocol layer exchanges, and emits the
//! lifecycle events around every call.

use std::time::Instant;

use async_trait::async_trait;

use elasticstack_clients::ApiClient;
use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::{AttrValue, FromAttr, IntoAttr};

use crate::plan;

/// Result of a create, read, update or import.
///
/// A `None` state without errors means the resource no longer exists and
/// must be removed from Terraform state.
#[derive(Debug, Clone, PartialEq)]
pub struct Response<M> {
    /// New state, if any
    pub state: Option<M>,
    /// Accumulated diagnostics
    pub diagnostics: Diagnostics,
}

impl<M> Response<M> {
    /// Successful result.
    pub fn ok(state: M) -> Self {
        Self {
            state: Some(state),
            diagnostics: Diagnostics::new(),
        }
    }

    /// State with diagnostics attached. Any error discards the state.
    pub fn with_diagnostics(state: M, diagnostics: Diagnostics) -> Self {
        let state = (!diagnostics.has_error()).then_some(state);
        Self { state, diagnostics }
    }

    /// The resource is gone.
    #[must_use]
    pub fn removed() -> Self {
        Self {
            state: None,
            diagnostics: Diagnostics::new(),
        }
    }

    /// Failed operation.
    #[must_use]
    pub const fn failed(diagnostics: Diagnostics) -> Self {
        Self {
            state: None,
            diagnostics,
        }
    }

    /// True when the resource should be dropped from state.
    #[must_use]
    pub fn is_removed(&self) -> bool {
        self.state.is_none() && !self.diagnostics.has_error()
    }

    /// Maps the state, keeping diagnostics.
    pub fn map<N>(self, f: impl FnOnce(M) -> N) -> Response<N> {
        Response {
            state: self.state.map(f),
            diagnostics: self.diagnostics,
        }
    }
}

/// CRUD over a typed model.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Terraform model of the resource.
    type Model: Send + Sync + 'static;

    /// Resource type name, such as `elasticstack_elasticsearch_script`.
    fn type_name(&self) -> &'static str;

    /// Attributes whose change forces replacement.
    fn requires_replace(&self) -> &'static [&'static str] {
        &[]
    }

    /// Creates the resource; the returned state has every computed field set.
    async fn create(&self, client: &ApiClient, plan: Self::Model) -> Response<Self::Model>;

    /// Refreshes state; `Response::removed` when the server has no such resource.
    async fn read(&self, client: &ApiClient, state: Self::Model) -> Response<Self::Model>;

    /// Applies an in-place change.
    async fn update(
        &self,
        client: &ApiClient,
        plan: Self::Model,
        prior: Self::Model,
    ) -> Response<Self::Model>;

    /// Deletes the resource.
    async fn delete(&self, client: &ApiClient, state: Self::Model) -> Diagnostics;

    /// Builds the minimal state for `terraform import`; a read follows.
    fn import_state(&self, id: &str) -> Response<Self::Model>;
}

/// A resource over dynamic attribute values.
#[async_trait]
pub trait DynResource: Send + Sync {
    /// Resource type name.
    fn type_name(&self) -> &'static str;

    /// Paths of changed replace-triggering attributes.
    fn plan_requires_replace(&self, prior: &AttrValue, planned: &AttrValue) -> Vec<AttributePath>;

    /// Creates from a planned object.
    async fn create(&self, client: &ApiClient, plan: &AttrValue) -> Response<AttrValue>;

    /// Refreshes an object.
    async fn read(&self, client: &ApiClient, state: &AttrValue) -> Response<AttrValue>;

    /// Updates from planned and prior objects.
    async fn update(
        &self,
        client: &ApiClient,
        plan: &AttrValue,
        prior: &AttrValue,
    ) -> Response<AttrValue>;

    /// Deletes the object.
    async fn delete(&self, client: &ApiClient, state: &AttrValue) -> Diagnostics;

    /// Imports by ID.
    fn import_state(&self, id: &str) -> Response<AttrValue>;
}

fn decode<M: FromAttr>(value: &AttrValue, diags: &mut Diagnostics) -> Option<M> {
    M::from_attr(value, &AttributePath::empty(), diags)
}

fn id_of(value: &AttrValue) -> &str {
    match value.get("id") {
        Some(AttrValue::String(id)) => id,
        _ => "<unknown>",
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[async_trait]
impl<R> DynResource for R
where
    R: Resource,
    R::Model: FromAttr + IntoAttr,
{
    fn type_name(&self) -> &'static str {
        Resource::type_name(self)
    }

    fn plan_requires_replace(&self, prior: &AttrValue, planned: &AttrValue) -> Vec<AttributePath> {
        plan::requires_replace(self.requires_replace(), prior, planned)
    }

    async fn create(&self, client: &ApiClient, plan: &AttrValue) -> Response<AttrValue> {
        let type_name = Resource::type_name(self);
        let mut diags = Diagnostics::new();
        let Some(model) = decode::<R::Model>(plan, &mut diags) else {
            return Response::failed(diags);
        };

        crate::emit_resource_creating!(type_name);
        let started = Instant::now();
        let response = Resource::create(self, client, model).await.map(IntoAttr::into_attr);
        match &response.state {
            Some(state) => crate::emit_resource_created!(type_name, id_of(state), elapsed_ms(started)),
            None => crate::emit_resource_failed!(type_name, "create", response.diagnostics.error_count()),
        }
        response
    }

    async fn read(&self, client: &ApiClient, state: &AttrValue) -> Response<AttrValue> {
        let type_name = Resource::type_name(self);
        let mut diags = Diagnostics::new();
        let Some(model) = decode::<R::Model>(state, &mut diags) else {
            return Response::failed(diags);
        };

        let started = Instant::now();
        let response = Resource::read(self, client, model).await.map(IntoAttr::into_attr);
        if response.is_removed() {
            crate::emit_resource_removed!(type_name, id_of(state));
        } else if let Some(new_state) = &response.state {
            crate::emit_resource_read!(type_name, id_of(new_state), elapsed_ms(started));
        } else {
            crate::emit_resource_failed!(type_name, "read", response.diagnostics.error_count());
        }
        response
    }

    async fn update(
        &self,
        client: &ApiClient,
        plan: &AttrValue,
        prior: &AttrValue,
    ) -> Response<AttrValue> {
        let type_name = Resource::type_name(self);
        let mut diags = Diagnostics::new();
        let planned = decode::<R::Model>(plan, &mut diags);
        let prior_model = decode::<R::Model>(prior, &mut diags);
        let (Some(planned), Some(prior_model)) = (planned, prior_model) else {
            return Response::failed(diags);
        };

        crate::emit_resource_updating!(type_name, id_of(prior));
        let started = Instant::now();
        let response = Resource::update(self, client, planned, prior_model)
            .await
            .map(IntoAttr::into_attr);
        match &response.state {
            Some(state) => crate::emit_resource_updated!(type_name, id_of(state), elapsed_ms(started)),
            None => crate::emit_resource_failed!(type_name, "update", response.diagnostics.error_count()),
        }
        response
    }

    async fn delete(&self, client: &ApiClient, state: &AttrValue) -> Diagnostics {
        let type_name = Resource::type_name(self);
        let mut diags = Diagnostics::new();
        let Some(model) = decode::<R::Model>(state, &mut diags) else {
            return diags;
        };

        crate::emit_resource_deleting!(type_name, id_of(state));
        let started = Instant::now();
        let diags = Resource::delete(self, client, model).await;
        if diags.has_error() {
            crate::emit_resource_failed!(type_name, "delete", diags.error_count());
        } else {
            crate::emit_resource_deleted!(type_name, id_of(state), elapsed_ms(started));
        }
        diags
    }

    fn import_state(&self, id: &str) -> Response<AttrValue> {
        let response = Resource::import_state(self, id).map(IntoAttr::into_attr);
        if response.state.is_some() {
            crate::emit_resource_imported!(Resource::type_name(self), id);
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_with_errors_drops_state() {
        let mut diags = Diagnostics::new();
        diags.add_warning("Careful", "just a warning");
        let ok = Response::with_diagnostics(1, diags.clone());
        assert_eq!(ok.state, Some(1));

        diags.add_error("Broken", "an error");
        let failed = Response::with_diagnostics(1, diags);
        assert_eq!(failed.state, None);
        assert!(!failed.is_removed());
    }

    #[test]
    fn test_removed() {
        let removed = Response::<()>::removed();
        assert!(removed.is_removed());
    }
}
