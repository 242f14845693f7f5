//! `elasticstack_elasticsearch_script`: stored scripts.

use async_trait::async_trait;
use tracing::instrument;

use elasticstack_clients::ApiClient;
use elasticstack_clients::elasticsearch::script::{self, Script};
use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::{
    AttrValue, FromAttr, IntoAttr, ObjectReader, Value, json_string_as, json_string_from,
    preserve_json_formatting,
};

use super::{client_error, parse_id, required_string};
use crate::resource::{Resource, Response};

/// Resource type name.
pub const TYPE_NAME: &str = "elasticstack_elasticsearch_script";

/// Language used when none is configured.
pub const DEFAULT_LANG: &str = "painless";

/// Terraform model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptModel {
    /// `<cluster_uuid>/<script_id>`
    pub id: Value<String>,
    /// Script ID
    pub script_id: Value<String>,
    /// Script language
    pub lang: Value<String>,
    /// Script source
    pub source: Value<String>,
    /// Default parameters, JSON object
    pub params: Value<String>,
    /// Compilation context
    pub context: Value<String>,
}

impl FromAttr for ScriptModel {
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        let obj = ObjectReader::new(value, path, diags)?;
        Some(Self {
            id: obj.field("id", diags),
            script_id: obj.field("script_id", diags),
            lang: obj.field("lang", diags),
            source: obj.field("source", diags),
            params: obj.field("params", diags),
            context: obj.field("context", diags),
        })
    }
}

impl IntoAttr for ScriptModel {
    fn into_attr(self) -> AttrValue {
        AttrValue::object([
            ("id", self.id.into_attr()),
            ("script_id", self.script_id.into_attr()),
            ("lang", self.lang.into_attr()),
            ("source", self.source.into_attr()),
            ("params", self.params.into_attr()),
            ("context", self.context.into_attr()),
        ])
    }
}

impl ScriptModel {
    fn to_api(&self, diags: &mut Diagnostics) -> Option<Script> {
        let source = required_string(&self.source, "source", diags);
        let params = json_string_as(&self.params, &AttributePath::root("params"), diags);
        Some(Script {
            lang: self
                .lang
                .known_cloned()
                .unwrap_or_else(|| DEFAULT_LANG.to_string()),
            source: source?,
            params,
        })
    }
}

/// Stored script resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptResource;

impl ScriptResource {
    async fn put(&self, client: &ApiClient, plan: &ScriptModel, diags: &mut Diagnostics) -> Option<()> {
        let script_id = required_string(&plan.script_id, "script_id", diags);
        let script = plan.to_api(diags);
        let (script_id, script) = (script_id?, script?);
        if diags.has_error() {
            return None;
        }
        if let Err(err) = script::put_script(client, &script_id, plan.context.known_str(), &script).await {
            client_error(diags, "Unable to put stored script", &err);
            return None;
        }
        Some(())
    }
}

#[async_trait]
impl Resource for ScriptResource {
    type Model = ScriptModel;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn requires_replace(&self) -> &'static [&'static str] {
        &["script_id"]
    }

    #[instrument(skip_all, fields(script_id = ?plan.script_id))]
    async fn create(&self, client: &ApiClient, mut plan: ScriptModel) -> Response<ScriptModel> {
        let mut diags = Diagnostics::new();
        if self.put(client, &plan, &mut diags).await.is_none() {
            return Response::failed(diags);
        }
        let Some(script_id) = plan.script_id.known_cloned() else {
            return Response::failed(diags);
        };
        match client.id(&script_id).await {
            Ok(id) => plan.id = Value::Known(id.to_string()),
            Err(err) => {
                client_error(&mut diags, "Unable to get cluster UUID", &err);
                return Response::failed(diags);
            }
        }
        let mut response = self.read(client, plan).await;
        response.diagnostics.append(diags);
        response
    }

    #[instrument(skip_all, fields(id = ?state.id))]
    async fn read(&self, client: &ApiClient, mut state: ScriptModel) -> Response<ScriptModel> {
        let mut diags = Diagnostics::new();
        let Some(id) = parse_id(&state.id, &mut diags) else {
            return Response::failed(diags);
        };
        let stored = match script::get_script(client, &id.resource_id).await {
            Ok(Some(stored)) => stored,
            Ok(None) => {
                tracing::warn!(id = %id, "Stored script not found, removing from state");
                return Response::removed();
            }
            Err(err) => {
                client_error(&mut diags, "Unable to get stored script", &err);
                return Response::failed(diags);
            }
        };

        state.script_id = Value::Known(id.resource_id);
        state.lang = Value::Known(stored.lang);
        state.source = Value::Known(stored.source);
        if let Some(params) = stored.params {
            let fresh = json_string_from(&params, &AttributePath::root("params"), &mut diags);
            state.params = preserve_json_formatting(&state.params, fresh);
        }
        state.params = state.params.or_null();
        state.context = state.context.or_null();
        Response::with_diagnostics(state, diags)
    }

    #[instrument(skip_all, fields(id = ?prior.id))]
    async fn update(
        &self,
        client: &ApiClient,
        mut plan: ScriptModel,
        prior: ScriptModel,
    ) -> Response<ScriptModel> {
        let mut diags = Diagnostics::new();
        if self.put(client, &plan, &mut diags).await.is_none() {
            return Response::failed(diags);
        }
        plan.id = prior.id;
        let mut response = self.read(client, plan).await;
        response.diagnostics.append(diags);
        response
    }

    #[instrument(skip_all, fields(id = ?state.id))]
    async fn delete(&self, client: &ApiClient, state: ScriptModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Some(id) = parse_id(&state.id, &mut diags) else {
            return diags;
        };
        if let Err(err) = script::delete_script(client, &id.resource_id).await {
            client_error(&mut diags, "Unable to delete stored script", &err);
        }
        diags
    }

    fn import_state(&self, id: &str) -> Response<ScriptModel> {
        let mut diags = Diagnostics::new();
        let id_value = Value::from(id);
        if parse_id(&id_value, &mut diags).is_none() {
            return Response::failed(diags);
        }
        Response::ok(ScriptModel {
            id: id_value,
            ..ScriptModel::default()
        })
    }
}
