//! Security and policy resolution.
//!
//! Policies derived from security schemes run before the ones named
//! explicitly on the operation or its path. Every resolved policy is
//! appended to a [`PolicyTable`] under `(controller, action)`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use designfirst_spec_parser::{DefinitionDocument, Operation, PathItem, SecurityRequirement};

/// Controller → action → ordered policy ids.
///
/// Grows additively: registering a policy for an existing pair appends to
/// the list, so tables built from several documents accumulate in the
/// order they were compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyTable {
    controllers: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append policies to the list for `(controller, action)`.
    ///
    /// Registering an empty list leaves the table untouched.
    pub fn register<I, S>(&mut self, controller: &str, action: &str, policies: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut policies = policies.into_iter().map(Into::into).peekable();
        if policies.peek().is_none() {
            return;
        }
        self.controllers
            .entry(controller.to_string())
            .or_default()
            .entry(action.to_string())
            .or_default()
            .extend(policies);
    }

    /// Append every entry of `other`, keeping its order.
    pub fn merge(&mut self, other: PolicyTable) {
        for (controller, actions) in other.controllers {
            for (action, policies) in actions {
                self.register(&controller, &action, policies);
            }
        }
    }

    pub fn get(&self, controller: &str, action: &str) -> Option<&[String]> {
        self.controllers
            .get(controller)
            .and_then(|actions| actions.get(action))
            .map(Vec::as_slice)
    }

    /// Iterate `(controller, action, policies)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &[String])> {
        self.controllers.iter().flat_map(|(controller, actions)| {
            actions
                .iter()
                .map(move |(action, policies)| (controller.as_str(), action.as_str(), policies.as_slice()))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Number of `(controller, action)` pairs.
    pub fn len(&self) -> usize {
        self.controllers.values().map(BTreeMap::len).sum()
    }
}

/// Outcome of resolving one operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPolicies {
    pub controller: Option<String>,
    pub action: String,
    /// `controller.action`, or the bare action without a controller.
    pub handler: String,
    /// Security-derived policies first, then explicit ones.
    pub policies: Vec<String>,
}

/// Resolve the handler and ordered policy chain of an operation and record
/// the chain in `table`.
///
/// Operation-level controller and policy extensions override the path-level
/// ones. Operation-level `security` overrides the document default. When an
/// operation lists several security requirements only the last one's
/// policies are kept.
///
/// Without a controller the chain is returned but nothing is registered.
pub fn resolve_policies(
    document: &DefinitionDocument,
    path_item: &PathItem,
    operation: &Operation,
    action: &str,
    table: &mut PolicyTable,
) -> ResolvedPolicies {
    let controller = operation
        .controller
        .as_deref()
        .or(path_item.controller.as_deref())
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    let explicit = operation
        .policies
        .as_deref()
        .or(path_item.policies.as_deref())
        .map(split_policies)
        .unwrap_or_default();

    let requirements = operation.security.as_deref().unwrap_or(&document.security);
    let mut policies = security_policies(document, requirements, action);
    policies.extend(explicit);

    let handler = match &controller {
        Some(controller) => format!("{}.{}", controller, action),
        None => action.to_string(),
    };

    // The table is keyed by (controller, action); a controller-less chain
    // only travels on the route.
    if let Some(controller) = &controller {
        table.register(controller, action, policies.iter().cloned());
    }

    ResolvedPolicies {
        controller,
        action: action.to_string(),
        handler,
        policies,
    }
}

/// Policies carried by the schemes of the last requirement.
fn security_policies(
    document: &DefinitionDocument,
    requirements: &[SecurityRequirement],
    action: &str,
) -> Vec<String> {
    let mut accumulated: Vec<String> = Vec::new();

    for requirement in requirements {
        if !accumulated.is_empty() {
            debug!(
                action = %action,
                discarded = ?accumulated,
                "later security requirement replaces earlier policies"
            );
        }
        accumulated = requirement
            .scheme_names()
            .filter_map(|name| document.security_definitions.get(name))
            .filter_map(|scheme| scheme.policies.as_deref())
            .flat_map(split_policies)
            .collect();
    }

    accumulated
}

/// Split a comma-separated policy list, trimming tokens and dropping empty ones.
pub fn split_policies(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
