//! Type Table
//!
//! A declarative stand-in for a classpath: the library types a rule cares
//! about, their supertypes and the methods whose return types are needed to
//! follow builder chains. Tables are plain serde documents so rules can ship
//! their own.

use crate::types::TypeName;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};

/// A method as far as resolution is concerned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodInfo {
    pub name: String,
    #[serde(default)]
    pub params: Vec<TypeName>,
    pub returns: TypeName,
    #[serde(default, rename = "static")]
    pub is_static: bool,
}

impl MethodInfo {
    pub fn new(name: &str, params: &[&str], returns: &str) -> Self {
        Self {
            name: name.to_string(),
            params: params.iter().map(|p| TypeName::new(p)).collect(),
            returns: TypeName::new(returns),
            is_static: false,
        }
    }

    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A declared type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeInfo {
    pub name: TypeName,
    #[serde(default)]
    pub supertypes: Vec<TypeName>,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
}

impl TypeInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: TypeName::new(name),
            supertypes: Vec::new(),
            methods: Vec::new(),
        }
    }

    #[must_use]
    pub fn extends(mut self, supertype: &str) -> Self {
        self.supertypes.push(TypeName::new(supertype));
        self
    }

    #[must_use]
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TypeTableDocument {
    #[serde(default)]
    types: Vec<TypeInfo>,
}

/// Lookup table of known types
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "TypeTableDocument", into = "TypeTableDocument")]
pub struct TypeTable {
    types: HashMap<TypeName, TypeInfo>,
}

impl From<TypeTableDocument> for TypeTable {
    fn from(document: TypeTableDocument) -> Self {
        let mut table = Self::default();
        for info in document.types {
            table.insert(info);
        }
        table
    }
}

impl From<TypeTable> for TypeTableDocument {
    fn from(table: TypeTable) -> Self {
        let mut types: Vec<TypeInfo> = table.types.into_values().collect();
        types.sort_by(|a, b| a.name.cmp(&b.name));
        Self { types }
    }
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a type; a second declaration of the same name extends the first
    pub fn insert(&mut self, info: TypeInfo) {
        match self.types.get_mut(&info.name) {
            Some(existing) => {
                for supertype in info.supertypes {
                    if !existing.supertypes.contains(&supertype) {
                        existing.supertypes.push(supertype);
                    }
                }
                existing.methods.extend(info.methods);
            }
            None => {
                self.types.insert(info.name.clone(), info);
            }
        }
    }

    /// Merge another table into this one
    pub fn merge(&mut self, other: TypeTable) {
        for info in other.types.into_values() {
            self.insert(info);
        }
    }

    pub fn get(&self, name: &TypeName) -> Option<&TypeInfo> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.types.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `sub` is `sup` or reaches it through declared supertypes
    pub fn is_subtype(&self, sub: &TypeName, sup: &TypeName) -> bool {
        if sub == sup {
            return true;
        }

        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([sub.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            if let Some(info) = self.types.get(&current) {
                for supertype in &info.supertypes {
                    if supertype == sup {
                        return true;
                    }
                    queue.push_back(supertype.clone());
                }
            }
        }
        false
    }

    /// Return type of `owner.name(..arity args)`, searching supertypes.
    ///
    /// Overloads of the same arity must agree on the return type, otherwise
    /// the call is ambiguous and `None` is returned.
    pub fn return_type(&self, owner: &TypeName, name: &str, arity: usize) -> Option<TypeName> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([owner.clone()]);
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.clone()) {
                continue;
            }
            let Some(info) = self.types.get(&current) else {
                continue;
            };

            let mut candidates = info
                .methods
                .iter()
                .filter(|method| method.name == name && method.params.len() == arity)
                .map(|method| &method.returns);
            if let Some(first) = candidates.next() {
                return candidates
                    .all(|other| other == first)
                    .then(|| first.clone());
            }
            queue.extend(info.supertypes.iter().cloned());
        }
        None
    }

    /// Known type in a package with the given simple name
    pub fn find_in_package(&self, package: &str, simple_name: &str) -> Option<TypeName> {
        let candidate = TypeName::new(&format!("{package}.{simple_name}"));
        self.contains(&candidate).then_some(candidate)
    }

    /// Types used by the HttpClient 5 timeout migration
    pub fn httpclient5() -> Self {
        const REQUEST_CONFIG: &str = "org.apache.hc.client5.http.config.RequestConfig";
        const REQUEST_BUILDER: &str = "org.apache.hc.client5.http.config.RequestConfig.Builder";
        const CONNECTION_CONFIG: &str = "org.apache.hc.client5.http.config.ConnectionConfig";
        const CONNECTION_BUILDER: &str =
            "org.apache.hc.client5.http.config.ConnectionConfig.Builder";
        const SOCKET_CONFIG: &str = "org.apache.hc.core5.http.io.SocketConfig";
        const SOCKET_BUILDER: &str = "org.apache.hc.core5.http.io.SocketConfig.Builder";
        const TIME_VALUE: &str = "org.apache.hc.core5.util.TimeValue";
        const TIMEOUT: &str = "org.apache.hc.core5.util.Timeout";
        const TIME_UNIT: &str = "java.util.concurrent.TimeUnit";

        let mut table = Self::new();

        table.insert(
            TypeInfo::new(REQUEST_CONFIG)
                .method(MethodInfo::new("custom", &[], REQUEST_BUILDER).static_method())
                .method(MethodInfo::new("copy", &[REQUEST_CONFIG], REQUEST_BUILDER).static_method())
                .method(MethodInfo::new("getConnectTimeout", &[], TIMEOUT))
                .method(MethodInfo::new("getResponseTimeout", &[], TIMEOUT))
                .method(MethodInfo::new("getConnectionRequestTimeout", &[], TIMEOUT)),
        );

        let mut request_builder = TypeInfo::new(REQUEST_BUILDER)
            .method(MethodInfo::new("build", &[], REQUEST_CONFIG));
        for setter in [
            "setConnectTimeout",
            "setResponseTimeout",
            "setConnectionRequestTimeout",
        ] {
            request_builder = request_builder
                .method(MethodInfo::new(setter, &["int"], REQUEST_BUILDER))
                .method(MethodInfo::new(setter, &[TIMEOUT], REQUEST_BUILDER))
                .method(MethodInfo::new(setter, &["long", TIME_UNIT], REQUEST_BUILDER));
        }
        for setter in [
            "setExpectContinueEnabled",
            "setRedirectsEnabled",
            "setAuthenticationEnabled",
            "setContentCompressionEnabled",
        ] {
            request_builder =
                request_builder.method(MethodInfo::new(setter, &["boolean"], REQUEST_BUILDER));
        }
        request_builder = request_builder
            .method(MethodInfo::new("setMaxRedirects", &["int"], REQUEST_BUILDER))
            .method(MethodInfo::new("setCookieSpec", &["java.lang.String"], REQUEST_BUILDER));
        table.insert(request_builder);

        table.insert(
            TypeInfo::new(CONNECTION_CONFIG)
                .method(MethodInfo::new("custom", &[], CONNECTION_BUILDER).static_method()),
        );
        table.insert(
            TypeInfo::new(CONNECTION_BUILDER)
                .method(MethodInfo::new("setConnectTimeout", &[TIMEOUT], CONNECTION_BUILDER))
                .method(MethodInfo::new("setSocketTimeout", &[TIMEOUT], CONNECTION_BUILDER))
                .method(MethodInfo::new("build", &[], CONNECTION_CONFIG)),
        );

        table.insert(
            TypeInfo::new(SOCKET_CONFIG)
                .method(MethodInfo::new("custom", &[], SOCKET_BUILDER).static_method())
                .method(MethodInfo::new("copy", &[SOCKET_CONFIG], SOCKET_BUILDER).static_method())
                .method(MethodInfo::new("getSoTimeout", &[], TIMEOUT)),
        );
        table.insert(
            TypeInfo::new(SOCKET_BUILDER)
                .method(MethodInfo::new("setSoTimeout", &["int"], SOCKET_BUILDER))
                .method(MethodInfo::new("setSoTimeout", &[TIMEOUT], SOCKET_BUILDER))
                .method(MethodInfo::new("setSoTimeout", &["int", TIME_UNIT], SOCKET_BUILDER))
                .method(MethodInfo::new("setSoKeepAlive", &["boolean"], SOCKET_BUILDER))
                .method(MethodInfo::new("setTcpNoDelay", &["boolean"], SOCKET_BUILDER))
                .method(MethodInfo::new("build", &[], SOCKET_CONFIG)),
        );

        table.insert(
            TypeInfo::new(TIME_VALUE)
                .method(MethodInfo::new("toMilliseconds", &[], "long"))
                .method(MethodInfo::new("toSeconds", &[], "long")),
        );
        table.insert(
            TypeInfo::new(TIMEOUT)
                .extends(TIME_VALUE)
                .method(MethodInfo::new("ofMilliseconds", &["long"], TIMEOUT).static_method())
                .method(MethodInfo::new("ofSeconds", &["long"], TIMEOUT).static_method())
                .method(MethodInfo::new("ofMinutes", &["long"], TIMEOUT).static_method())
                .method(MethodInfo::new("of", &["long", TIME_UNIT], TIMEOUT).static_method()),
        );

        table
    }
}
