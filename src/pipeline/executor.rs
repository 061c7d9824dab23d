//! Single-request execution pipeline
//!
//! pre-request script → script bindings → auth → variable resolution →
//! body parsing → transport → test script. Only the transport step can fail
//! a request; everything else degrades into fields of the result.

use indexmap::IndexMap;
use serde_json::Value as JsonValue;
use tracing::{debug, info, warn};

use crate::client::{HttpClient, TransportRequest};
use crate::middleware::Auth;
use crate::models::{pairs_to_map, ExecutionResult, RequestDefinition};
use crate::scripting::{ResponseView, ScriptContext, ScriptOutcome, ScriptSandbox};
use crate::variables::{Scope, VariableStore};

/// A request after scripts, auth and substitution, ready for transport
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub transport: TransportRequest,
    /// Outcome of the pre-request script, if one ran
    pub pre_request: Option<ScriptOutcome>,
}

impl PreparedRequest {
    pub fn url(&self) -> &str {
        &self.transport.url
    }
}

/// Runs requests through scripts, auth and the HTTP client
pub struct RequestExecutor<C: HttpClient> {
    client: C,
    sandbox: ScriptSandbox,
}

impl<C: HttpClient> RequestExecutor<C> {
    pub fn new(client: C) -> Self {
        Self::with_sandbox(client, ScriptSandbox::default())
    }

    pub fn with_sandbox(client: C, sandbox: ScriptSandbox) -> Self {
        Self { client, sandbox }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn sandbox(&self) -> &ScriptSandbox {
        &self.sandbox
    }

    /// Build the transport request.
    ///
    /// Pre-request script mutations are folded into `vars`.
    pub fn prepare(&self, request: &RequestDefinition, vars: &mut VariableStore) -> PreparedRequest {
        let mut url = request.url.clone();
        let mut headers = pairs_to_map(&request.headers);
        let mut params = pairs_to_map(&request.query_params);
        let raw_body = request.effective_body().map(str::to_string);

        let pre_request = if request.pre_request_script.trim().is_empty() {
            None
        } else {
            let seed = ScriptContext::new(request.method, url.clone())
                .with_headers(headers.clone())
                .with_params(params.clone())
                .with_body(raw_body.clone())
                .with_environment(vars.to_object(Scope::Environment))
                .with_variables(vars.to_object(Scope::Global));
            let outcome = self.sandbox.run(&request.pre_request_script, &seed);

            if outcome.success {
                for (key, value) in &outcome.environment {
                    let token = format!("{{{{{}}}}}", key);
                    url = url.replace(&token, value);
                    for header in headers.values_mut() {
                        *header = header.replace(&token, value);
                    }
                }
                fold_mutations(vars, &outcome);
            } else {
                warn!(
                    request = %request.name,
                    error = outcome.error.as_deref().unwrap_or_default(),
                    "pre-request script failed, continuing with original values"
                );
            }
            Some(outcome)
        };

        if let Some(auth) = Auth::from_config(&request.auth) {
            if let Err(e) = auth.apply(&mut headers, &mut params) {
                warn!(request = %request.name, auth = auth.type_name(), error = %e, "authentication not applied");
            }
        }

        let url = vars.substitute(&url);
        substitute_values(vars, &mut headers);
        substitute_values(vars, &mut params);
        let body = raw_body.and_then(|raw| parse_body(&vars.substitute(&raw), &request.name));

        PreparedRequest {
            transport: TransportRequest {
                method: request.method,
                url,
                params,
                headers,
                body,
            },
            pre_request,
        }
    }

    /// Send a prepared request and evaluate the test script.
    ///
    /// Test script mutations are folded into `vars`.
    pub async fn send(
        &self,
        request: &RequestDefinition,
        prepared: &PreparedRequest,
        vars: &mut VariableStore,
    ) -> ExecutionResult {
        let transport = &prepared.transport;
        info!(request = %request.name, method = %transport.method, url = %transport.url, "sending request");

        let response = match self.client.send(transport).await {
            Ok(response) => response,
            Err(e) => {
                warn!(request = %request.name, error = %e, "transport failed");
                return ExecutionResult::transport_failure(e.message);
            }
        };

        let mut result = ExecutionResult::from_response(
            response.status,
            response.status_text,
            response.headers,
            response.data,
            response.time,
        );
        info!(
            request = %request.name,
            status = result.status,
            elapsed_ms = result.time,
            size = result.size,
            "response received"
        );

        if !request.test_script.trim().is_empty() {
            let seed = ScriptContext::new(transport.method, transport.url.clone())
                .with_headers(transport.headers.clone())
                .with_params(transport.params.clone())
                .with_response(ResponseView::from_result(&result))
                .with_environment(vars.to_object(Scope::Environment))
                .with_variables(vars.to_object(Scope::Global));
            let outcome = self.sandbox.run(&request.test_script, &seed);

            if outcome.success {
                fold_mutations(vars, &outcome);
            } else {
                warn!(
                    request = %request.name,
                    error = outcome.error.as_deref().unwrap_or_default(),
                    "test script failed"
                );
            }
            debug!(
                request = %request.name,
                passed = outcome.test_results.iter().filter(|t| t.passed).count(),
                total = outcome.test_results.len(),
                "tests evaluated"
            );
            result.test_results = outcome.test_results;
            result.test_script_error = outcome.error;
        }

        result
    }

    /// Run one request end to end. Never fails; see [`ExecutionResult`].
    pub async fn execute(&self, request: &RequestDefinition, vars: &mut VariableStore) -> ExecutionResult {
        let prepared = self.prepare(request, vars);
        self.send(request, &prepared, vars).await
    }
}

/// `pm.environment` lands in the environment scope, `pm.variables` in globals
fn fold_mutations(vars: &mut VariableStore, outcome: &ScriptOutcome) {
    vars.apply(Scope::Environment, &outcome.environment, &outcome.unset_environment);
    vars.apply(Scope::Global, &outcome.variables, &outcome.unset_variables);
}

fn substitute_values(vars: &VariableStore, map: &mut IndexMap<String, String>) {
    for value in map.values_mut() {
        *value = vars.substitute(value);
    }
}

/// Invalid JSON sends no body at all
fn parse_body(raw: &str, request_name: &str) -> Option<JsonValue> {
    match serde_json::from_str(raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(request = %request_name, error = %e, "request body is not valid JSON, sending no body");
            None
        }
    }
}
