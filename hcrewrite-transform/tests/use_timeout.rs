//! End-to-end behaviour of the HttpClient 5 timeout migration

use hcrewrite_core::{TypeInfo, MethodInfo};
use hcrewrite_transform::{
    MethodRewriteRecipe, Recipe, RewriteOutcome, SkipReason, TemplateTarget, UseTimeout,
};
use proptest::prelude::*;

fn rewrite(source: &str) -> RewriteOutcome {
    UseTimeout::new().unwrap().rewrite_source(source).unwrap()
}

#[test]
fn test_rewrites_builder_timeout_and_adds_import_once() {
    let source = r#"package com.acme.http;

import org.apache.hc.client5.http.config.RequestConfig;

public class ClientFactory {

    RequestConfig config(RequestConfig.Builder builder) {
        builder.setConnectTimeout(5000);
        builder.setResponseTimeout(30000);
        return builder.build();
    }
}
"#;
    let expected = r#"package com.acme.http;

import org.apache.hc.client5.http.config.RequestConfig;
import org.apache.hc.core5.util.Timeout;

public class ClientFactory {

    RequestConfig config(RequestConfig.Builder builder) {
        builder.setConnectTimeout(Timeout.ofMilliseconds(5000));
        builder.setResponseTimeout(Timeout.ofMilliseconds(30000));
        return builder.build();
    }
}
"#;

    let outcome = rewrite(source);
    assert!(outcome.changed);
    assert_eq!(outcome.unit.text(), expected);
    assert_eq!(outcome.stats.calls_rewritten, 2);
    assert_eq!(outcome.stats.imports_added, 1);
    assert_eq!(
        outcome.unit.text().matches("import org.apache.hc.core5.util.Timeout;").count(),
        1
    );
}

#[test]
fn test_arity_mismatch_is_untouched() {
    let source = r#"import org.apache.hc.client5.http.config.RequestConfig;
import java.util.concurrent.TimeUnit;

class A {
    void f(RequestConfig.Builder builder) {
        builder.setConnectTimeout(5000, TimeUnit.MILLISECONDS);
    }
}
"#;
    let outcome = rewrite(source);
    assert!(!outcome.changed);
    assert_eq!(outcome.unit.text(), source);
    assert!(outcome.imports_added.is_empty());
}

#[test]
fn test_unit_without_target_types_is_byte_identical() {
    let source = "// Plain class\nclass A {\n    void f(Builder builder) {\n        builder.setConnectTimeout(5000);\n    }\n}\n";
    let outcome = rewrite(source);
    assert!(!outcome.changed);
    assert_eq!(outcome.skipped, Some(SkipReason::PreconditionAbsent));
    assert_eq!(outcome.stats.calls_visited, 0);
    assert_eq!(outcome.unit.text(), source);
}

#[test]
fn test_rewriting_is_idempotent() {
    let source = r#"import org.apache.hc.client5.http.config.RequestConfig;
import org.apache.hc.core5.http.io.SocketConfig;

class A {
    RequestConfig request = RequestConfig.custom()
            .setConnectTimeout(1000)
            .setConnectionRequestTimeout(2000)
            .build();
    SocketConfig socket = SocketConfig.custom().setSoTimeout(3000).build();
}
"#;
    let once = rewrite(source);
    assert_eq!(once.stats.calls_rewritten, 3);

    let twice = rewrite(&once.unit.text());
    assert!(!twice.changed);
    assert_eq!(twice.stats.calls_rewritten, 0);
    assert_eq!(twice.unit.text(), once.unit.text());
}

#[test]
fn test_formatting_and_comments_preserved() {
    let source = r#"import org.apache.hc.client5.http.config.RequestConfig;

class A {
    void f(RequestConfig.Builder builder) {
        builder
            .setConnectTimeout( 5000 )   // connect
            .setResponseTimeout(1000); /* response */
    }
}
"#;
    let expected = r#"import org.apache.hc.client5.http.config.RequestConfig;
import org.apache.hc.core5.util.Timeout;

class A {
    void f(RequestConfig.Builder builder) {
        builder
            .setConnectTimeout( Timeout.ofMilliseconds(5000) )   // connect
            .setResponseTimeout(Timeout.ofMilliseconds(1000)); /* response */
    }
}
"#;
    assert_eq!(rewrite(source).unit.text(), expected);
}

#[test]
fn test_signature_exactness() {
    let source = r#"import org.apache.hc.client5.http.config.RequestConfig;

class A {
    void f(RequestConfig.Builder builder, long millis, Integer boxed, int plain) {
        builder.setConnectTimeout(5000L);
        builder.setConnectTimeout(millis);
        builder.setConnectTimeout(boxed);
        builder.setConnectTimeout(plain);
        builder.setMaxRedirects(3);
        unknown.setConnectTimeout(5000);
    }
}
"#;
    let outcome = rewrite(source);
    let text = outcome.unit.text();
    assert_eq!(outcome.stats.calls_rewritten, 1);
    assert!(text.contains("builder.setConnectTimeout(5000L);"));
    assert!(text.contains("builder.setConnectTimeout(millis);"));
    assert!(text.contains("builder.setConnectTimeout(boxed);"));
    assert!(text.contains("builder.setConnectTimeout(Timeout.ofMilliseconds(plain));"));
    assert!(text.contains("builder.setMaxRedirects(3);"));
    assert!(text.contains("unknown.setConnectTimeout(5000);"));
}

#[test]
fn test_socket_config_so_timeout() {
    let source = r#"import org.apache.hc.core5.http.io.SocketConfig;
import java.util.concurrent.TimeUnit;

class A {
    SocketConfig a = SocketConfig.custom().setSoTimeout(5000).build();
    SocketConfig b = SocketConfig.custom().setSoTimeout(5, TimeUnit.SECONDS).build();
}
"#;
    let text = rewrite(source).unit.text();
    assert!(text.contains("SocketConfig.custom().setSoTimeout(Timeout.ofMilliseconds(5000)).build();"));
    assert!(text.contains("SocketConfig.custom().setSoTimeout(5, TimeUnit.SECONDS).build();"));
}

#[test]
fn test_old_client_with_same_method_names_is_untouched() {
    let source = r#"import org.apache.http.client.config.RequestConfig;

class A {
    RequestConfig c = RequestConfig.custom().setConnectTimeout(5000).build();
}
"#;
    let outcome = rewrite(source);
    assert_eq!(outcome.skipped, Some(SkipReason::PreconditionAbsent));
    assert_eq!(outcome.unit.text(), source);
}

#[test]
fn test_wildcard_import_needs_no_new_import() {
    let source = r#"import org.apache.hc.client5.http.config.RequestConfig;
import org.apache.hc.core5.util.*;

class A {
    void f(RequestConfig.Builder b) { b.setConnectTimeout(10); }
}
"#;
    let outcome = rewrite(source);
    assert_eq!(outcome.stats.calls_rewritten, 1);
    assert!(outcome.imports_added.is_empty());
    assert!(!outcome.unit.text().contains("import org.apache.hc.core5.util.Timeout;"));
}

#[test]
fn test_same_package_needs_no_import() {
    let source = r#"package org.apache.hc.core5.util;

import org.apache.hc.client5.http.config.RequestConfig;

class A {
    void f(RequestConfig.Builder b) { b.setConnectTimeout(10); }
}
"#;
    let outcome = rewrite(source);
    assert_eq!(outcome.stats.calls_rewritten, 1);
    assert_eq!(outcome.stats.imports_added, 0);
}

#[test]
fn test_conflicting_timeout_import_leaves_unit_unchanged() {
    let source = r#"import com.acme.Timeout;
import org.apache.hc.client5.http.config.RequestConfig;

class A {
    void f(RequestConfig.Builder b) { b.setConnectTimeout(10); }
}
"#;
    let outcome = rewrite(source);
    assert_eq!(outcome.skipped, Some(SkipReason::ImportConflict));
    assert_eq!(outcome.unit.text(), source);
}

#[test]
fn test_fully_qualified_declaration() {
    let source = r#"class A {
    void f(org.apache.hc.client5.http.config.RequestConfig.Builder b) {
        b.setResponseTimeout(250);
    }
}
"#;
    let outcome = rewrite(source);
    assert!(outcome.changed);
    assert!(outcome.unit.text().starts_with("import org.apache.hc.core5.util.Timeout;\n\nclass A {"));
    assert!(outcome
        .unit
        .text()
        .contains("b.setResponseTimeout(Timeout.ofMilliseconds(250));"));
}

#[test]
fn test_syntax_errors_leave_unit_unchanged() {
    let source = "import org.apache.hc.client5.http.config.RequestConfig;\nclass A { void f(RequestConfig.Builder b) { b.setConnectTimeout(1) } \n";
    let outcome = rewrite(source);
    assert_eq!(outcome.skipped, Some(SkipReason::ParseErrors));
    assert_eq!(outcome.unit.text(), source);
}

#[test]
fn test_nested_matches_rewritten_in_one_pass() {
    let recipe = MethodRewriteRecipe::builder("test.ClockSeconds")
        .precondition("com.acme..*", true)
        .signature("com.acme.Clock seconds(int)")
        .template("Math.multiplyExact(#{}, 1000)")
        .target(TemplateTarget::Invocation)
        .extend_types([TypeInfo::new("com.acme.Clock").method(MethodInfo::new("seconds", &["int"], "int"))])
        .build()
        .unwrap();

    let source = r#"import com.acme.Clock;

class A {
    int f(Clock clock) {
        return clock.seconds(clock.seconds(5));
    }
}
"#;
    let outcome = recipe.rewrite_source(source).unwrap();
    assert_eq!(outcome.stats.calls_rewritten, 2);
    assert!(outcome
        .unit
        .text()
        .contains("return Math.multiplyExact(Math.multiplyExact(5, 1000), 1000);"));
    assert!(outcome.imports_added.is_empty());
}

#[test]
fn test_lambda_parameter_shadowing_field_is_untouched() {
    let source = r#"import java.util.function.Consumer;
import org.apache.hc.client5.http.config.RequestConfig;

class A {
    RequestConfig.Builder builder;
    Consumer<org.apache.http.client.config.RequestConfig.Builder> legacy = builder -> builder.setConnectTimeout(5);
    Consumer<org.apache.http.client.config.RequestConfig.Builder> pair = (builder, other) -> builder.setSoTimeout(6);
}
"#;
    let outcome = rewrite(source);
    assert!(!outcome.changed);
    assert_eq!(outcome.stats.calls_rewritten, 0);
    assert_eq!(outcome.unit.text(), source);
}

#[test]
fn test_same_parameter_name_in_other_method_does_not_block_rewrite() {
    let source = r#"import org.apache.hc.client5.http.config.RequestConfig;

class A {
    void f(RequestConfig.Builder builder) {
        builder.setConnectTimeout(5);
    }

    void g(StringBuilder builder) {
        builder.append(1);
    }
}
"#;
    let outcome = rewrite(source);
    assert_eq!(outcome.stats.calls_rewritten, 1);
    assert_eq!(outcome.stats.imports_added, 1);
    assert!(outcome
        .unit
        .text()
        .contains("builder.setConnectTimeout(Timeout.ofMilliseconds(5));"));
    assert!(outcome.unit.text().contains("builder.append(1);"));
}

#[test]
fn test_local_type_named_timeout_leaves_unit_unchanged() {
    for declaration in [
        "interface Timeout {}",
        "enum Timeout { SHORT }",
        "record Timeout(int millis) {}",
        "@interface Timeout {}",
    ] {
        let source = format!(
            "import org.apache.hc.client5.http.config.RequestConfig;\n\nclass A {{\n    {declaration}\n    void f(RequestConfig.Builder b) {{ b.setConnectTimeout(5); }}\n}}\n"
        );
        let outcome = rewrite(&source);
        assert_eq!(outcome.skipped, Some(SkipReason::ImportConflict), "{declaration}");
        assert_eq!(outcome.unit.text(), source);
    }

    let generic = "import org.apache.hc.client5.http.config.RequestConfig;\n\nclass A<Timeout> {\n    void f(RequestConfig.Builder b) { b.setConnectTimeout(5); }\n}\n";
    assert_eq!(rewrite(generic).skipped, Some(SkipReason::ImportConflict));
}

#[test]
fn test_invocation_replacement_keeps_operator_grouping() {
    let recipe = MethodRewriteRecipe::builder("test.ClockMillis")
        .precondition("com.acme..*", true)
        .signature("com.acme.Clock seconds(int)")
        .template("#{} * 1000")
        .target(TemplateTarget::Invocation)
        .extend_types([TypeInfo::new("com.acme.Clock").method(MethodInfo::new("seconds", &["int"], "int"))])
        .build()
        .unwrap();

    let source = r#"import com.acme.Clock;

class A {
    int f(Clock clock) {
        int a = clock.seconds(4);
        int b = 2 / clock.seconds(3);
        return -clock.seconds(5);
    }
}
"#;
    let outcome = recipe.rewrite_source(source).unwrap();
    let text = outcome.unit.text();
    assert_eq!(outcome.stats.calls_rewritten, 3);
    assert!(text.contains("int a = 4 * 1000;"), "{text}");
    assert!(text.contains("int b = 2 / (3 * 1000);"), "{text}");
    assert!(text.contains("return -(5 * 1000);"), "{text}");
}

proptest! {
    #[test]
    fn any_int_literal_is_wrapped_once(millis in 0u32..1_000_000, sites in 1usize..6) {
        let calls: String = (0..sites)
            .map(|_| format!("        builder.setConnectTimeout({millis});\n"))
            .collect();
        let source = format!(
            "import org.apache.hc.client5.http.config.RequestConfig;\n\nclass A {{\n    void f(RequestConfig.Builder builder) {{\n{calls}    }}\n}}\n"
        );

        let outcome = rewrite(&source);
        let text = outcome.unit.text();
        let wrapped = format!("builder.setConnectTimeout(Timeout.ofMilliseconds({millis}));");
        prop_assert_eq!(text.matches(&wrapped).count(), sites);
        prop_assert_eq!(text.matches("import org.apache.hc.core5.util.Timeout;").count(), 1);
        prop_assert_eq!(rewrite(&text).unit.text(), text);
    }
}
