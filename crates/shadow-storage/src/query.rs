//! Query translation
//!
//! List/Watch options are translated into one compound label predicate
//! against the shared store: the caller's label selector verbatim, the
//! caller's field selector (only `metadata.name` is understood), and the
//! mandatory kind/namespace/tenant equality clauses. Field selectors are
//! never forwarded to the store.

use crate::identity::TenantContext;
use shadow_common::labels::{CLUSTER_ID_LABEL, CONFIG_KIND_LABEL, CONFIG_NAMESPACE_LABEL, CONFIG_NAME_LABEL};
use shadow_common::{ApiError, ApiResult, ListOptions, Requirement, ResourceDescriptor, Selector};

/// Build the compound predicate for a List/Watch/DeleteCollection call.
///
/// `namespace` is the request's target namespace, empty for cluster scope.
/// Any field-selector key other than `metadata.name` fails closed with an
/// internal error rather than being silently dropped.
pub fn translate(
    descriptor: &ResourceDescriptor,
    tenant: &TenantContext,
    namespace: &str,
    options: &ListOptions,
) -> ApiResult<Selector> {
    let mut selector = options.label_selector.clone().unwrap_or_default();

    if let Some(fields) = &options.field_selector {
        for requirement in &fields.requirements {
            if requirement.field != "metadata.name" {
                return Err(ApiError::Internal(format!(
                    "unable to recognize selector key {}",
                    requirement.field
                )));
            }
            selector = selector.add(Requirement {
                key: CONFIG_NAME_LABEL.to_string(),
                operator: requirement.operator,
                values: vec![requirement.value.clone()],
            });
        }
    }

    selector = selector
        .add(Requirement::equals(CONFIG_KIND_LABEL, &descriptor.kind))
        .add(Requirement::equals(CONFIG_NAMESPACE_LABEL, namespace))
        .add(Requirement::equals(CLUSTER_ID_LABEL, &tenant.cluster_id));
    Ok(selector)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_common::{FieldSelector, Operator};

    fn tenant() -> TenantContext {
        TenantContext {
            cluster_id: "abcd".to_string(),
            authorized_namespace: "ns1".to_string(),
        }
    }

    fn foo_descriptor() -> ResourceDescriptor {
        ResourceDescriptor::namespaced("apps.example.com", "v1", "Foo", "foos")
    }

    #[test]
    fn mandatory_clauses_are_always_present() {
        let selector = translate(&foo_descriptor(), &tenant(), "ns1", &ListOptions::default())
            .expect("translates");
        assert_eq!(
            selector.to_string(),
            format!(
                "{}=Foo,{}=ns1,{}=abcd",
                CONFIG_KIND_LABEL, CONFIG_NAMESPACE_LABEL, CLUSTER_ID_LABEL
            )
        );
    }

    #[test]
    fn caller_label_selector_passes_verbatim() {
        let options = ListOptions {
            label_selector: Some(Selector::everything().add(Requirement::equals("team", "core"))),
            ..ListOptions::default()
        };
        let selector = translate(&foo_descriptor(), &tenant(), "ns1", &options).expect("translates");
        assert!(selector.to_string().starts_with("team=core,"));
    }

    #[test]
    fn name_field_selector_becomes_label_clause() {
        let options = ListOptions {
            field_selector: Some(FieldSelector::name_equals("boo")),
            ..ListOptions::default()
        };
        let selector = translate(&foo_descriptor(), &tenant(), "ns1", &options).expect("translates");
        assert!(selector
            .requirements
            .iter()
            .any(|r| r.key == CONFIG_NAME_LABEL
                && r.operator == Operator::Equals
                && r.values == vec!["boo".to_string()]));
    }

    #[test]
    fn unknown_field_selector_key_fails_closed() {
        let options = ListOptions {
            field_selector: Some(FieldSelector {
                requirements: vec![shadow_common::FieldRequirement {
                    field: "spec.nodeName".to_string(),
                    operator: Operator::Equals,
                    value: "node-1".to_string(),
                }],
            }),
            ..ListOptions::default()
        };
        let err = translate(&foo_descriptor(), &tenant(), "ns1", &options).unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn cluster_scope_uses_empty_namespace_clause() {
        let descriptor = ResourceDescriptor::cluster_scoped("", "v1", "Namespace", "namespaces");
        let selector =
            translate(&descriptor, &tenant(), "", &ListOptions::default()).expect("translates");
        assert!(selector
            .requirements
            .iter()
            .any(|r| r.key == CONFIG_NAMESPACE_LABEL && r.values == vec![String::new()]));
    }
}
