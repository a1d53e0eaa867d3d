//! Parsing and resolving whole compilation units

use hcrewrite_core::{JavaKind, JavaUnit, MethodCall, TypeName, TypeResolver, TypeTable, UnitResolver};
use proptest::prelude::*;

const CLIENT: &str = r#"package com.acme.http;

import org.apache.hc.client5.http.config.RequestConfig;
import org.apache.hc.core5.http.io.*;
import org.apache.hc.core5.util.Timeout;

/** Builds configs */
public class Client {
    private final SocketConfig.Builder socket = SocketConfig.custom();

    RequestConfig build(RequestConfig.Builder builder, int[] delays) {
        var copy = RequestConfig.copy(builder.build());
        for (int delay : delays) {
            builder.setConnectTimeout(delay + 1);
        }
        this.socket.setSoTimeout(Timeout.ofSeconds(2L));
        return builder.setResponseTimeout((int) 3.5).build();
    }
}
"#;

fn calls(unit: &JavaUnit, name: &str) -> Vec<MethodCall> {
    unit.syntax()
        .descendants()
        .filter_map(MethodCall::cast)
        .filter(|call| call.name().is_some_and(|token| token.text() == name))
        .collect()
}

fn owner(resolver: &UnitResolver<'_>, unit: &JavaUnit, name: &str) -> Option<String> {
    let call = calls(unit, name).into_iter().next()?;
    resolver.owner_of(&call).map(|owner| owner.as_str().to_string())
}

fn first_argument(resolver: &UnitResolver<'_>, unit: &JavaUnit, name: &str) -> Option<String> {
    let call = calls(unit, name).into_iter().next()?;
    let argument = call.arguments().into_iter().next()?;
    resolver.type_of(&argument).map(|ty| ty.as_str().to_string())
}

#[test]
fn test_parse_is_lossless() {
    let unit = JavaUnit::parse(CLIENT).unwrap();
    assert!(!unit.has_errors());
    assert_eq!(unit.text(), CLIENT);
    assert_eq!(unit.syntax().kind(), JavaKind::Program);
}

#[test]
fn test_scope_collects_unit_facts() {
    let unit = JavaUnit::parse(CLIENT).unwrap();
    let table = TypeTable::httpclient5();
    let resolver = UnitResolver::new(&table, &unit);
    let scope = resolver.scope();

    assert_eq!(scope.package(), Some("com.acme.http"));
    assert_eq!(scope.imports().len(), 3);
    assert!(scope.imports()[1].is_wildcard());
    assert!(scope.declared_types().any(|ty| ty == "RequestConfig.Builder"));
}

#[test]
fn test_receivers_resolve_through_declarations() {
    let unit = JavaUnit::parse(CLIENT).unwrap();
    let table = TypeTable::httpclient5();
    let resolver = UnitResolver::new(&table, &unit);

    assert_eq!(
        owner(&resolver, &unit, "setConnectTimeout").as_deref(),
        Some("org.apache.hc.client5.http.config.RequestConfig.Builder")
    );
    assert_eq!(
        owner(&resolver, &unit, "setSoTimeout").as_deref(),
        Some("org.apache.hc.core5.http.io.SocketConfig.Builder")
    );
    assert_eq!(
        owner(&resolver, &unit, "copy").as_deref(),
        Some("org.apache.hc.client5.http.config.RequestConfig")
    );
}

#[test]
fn test_argument_types() {
    let unit = JavaUnit::parse(CLIENT).unwrap();
    let table = TypeTable::httpclient5();
    let resolver = UnitResolver::new(&table, &unit);

    assert_eq!(first_argument(&resolver, &unit, "setConnectTimeout").as_deref(), Some("int"));
    assert_eq!(first_argument(&resolver, &unit, "setResponseTimeout").as_deref(), Some("int"));
    assert_eq!(
        first_argument(&resolver, &unit, "setSoTimeout").as_deref(),
        Some("org.apache.hc.core5.util.Timeout")
    );
    assert_eq!(first_argument(&resolver, &unit, "ofSeconds").as_deref(), Some("long"));
}

#[test]
fn test_type_names_resolve_in_order() {
    let unit = JavaUnit::parse(CLIENT).unwrap();
    let table = TypeTable::httpclient5();
    let resolver = UnitResolver::new(&table, &unit);

    let resolve = |written: &str| resolver.resolve_type_name(written).map(|ty| ty.as_str().to_string());
    assert_eq!(resolve("int").as_deref(), Some("int"));
    assert_eq!(resolve("Timeout").as_deref(), Some("org.apache.hc.core5.util.Timeout"));
    assert_eq!(
        resolve("RequestConfig.Builder").as_deref(),
        Some("org.apache.hc.client5.http.config.RequestConfig.Builder")
    );
    assert_eq!(
        resolve("SocketConfig").as_deref(),
        Some("org.apache.hc.core5.http.io.SocketConfig")
    );
    assert_eq!(resolve("String").as_deref(), Some("java.lang.String"));
    assert!(resolve("Unknown").is_none());
}

#[test]
fn test_subtypes_follow_the_table() {
    let unit = JavaUnit::parse(CLIENT).unwrap();
    let table = TypeTable::httpclient5();
    let resolver = UnitResolver::new(&table, &unit);

    let timeout = TypeName::new("org.apache.hc.core5.util.Timeout");
    let time_value = TypeName::new("org.apache.hc.core5.util.TimeValue");
    assert!(resolver.is_subtype(&timeout, &time_value));
    assert!(resolver.is_subtype(&timeout, &timeout));
    assert!(!resolver.is_subtype(&time_value, &timeout));
}

#[test]
fn test_unknown_locals_stay_unresolved() {
    let source = "class A { void f() { mystery.setConnectTimeout(unknownValue); } }";
    let unit = JavaUnit::parse(source).unwrap();
    let table = TypeTable::httpclient5();
    let resolver = UnitResolver::new(&table, &unit);

    assert!(owner(&resolver, &unit, "setConnectTimeout").is_none());
    assert!(first_argument(&resolver, &unit, "setConnectTimeout").is_none());
}

proptest! {
    #[test]
    fn parse_preserves_arbitrary_spacing(
        pad in "[ \t]{0,4}",
        newline in prop::bool::ANY,
        value in 0i64..i64::from(i32::MAX),
    ) {
        let sep = if newline { "\n" } else { "" };
        let source = format!(
            "class A {{{sep}{pad}void f(int x) {{{pad}g({pad}{value}{pad});{sep}}}{pad}}}{sep}"
        );
        let unit = JavaUnit::parse(&source).unwrap();
        prop_assert!(!unit.has_errors());
        prop_assert_eq!(unit.text(), source);
    }
}
