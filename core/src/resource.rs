//! Dynamic, ordered property bag underlying every typed Okta resource.
//!
//! # Design
//! A `Resource` wraps a `serde_json::Map` (insertion-ordered) behind a shared
//! handle. Concrete resource types such as `User` are thin views over the
//! same storage: they hold a `Resource` and add named accessors, so a single
//! accessor engine serves every resource shape.
//!
//! Nested objects are wrapped lazily the first time they are read through
//! `get_resource` or `get_list`, and the wrapper is cached under the property
//! name. Later reads return a handle to the same child, and edits made
//! through that child show up when the parent is serialized. Any setter
//! replaces the backing value and drops the cached child for that key.
//!
//! Cloning a `Resource` clones the handle, not the data; use `deep_clone`
//! for an independent copy. Concurrent reads are safe. Concurrent writes to
//! the same property from several threads are not atomic with respect to
//! the child cache and need external synchronization. A resource must not
//! be stored inside itself.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::warn;

/// A typed view over a `Resource`.
///
/// Implemented by `Resource` itself and by every type declared with
/// `resource_type!`. The data store uses it to build results of the
/// requested type from a decoded body.
pub trait ResourceType: Sized + Send {
    fn from_resource(resource: Resource) -> Self;

    fn resource(&self) -> &Resource;
}

#[derive(Clone)]
enum Child {
    One(Resource),
    Many(Vec<Resource>),
}

#[derive(Default)]
struct Inner {
    // Lock order: `children` before `data`.
    children: RwLock<HashMap<String, Child>>,
    data: RwLock<Map<String, Value>>,
}

/// An ordered mapping from property names to JSON values.
#[derive(Clone, Default)]
pub struct Resource {
    inner: Arc<Inner>,
}

impl Resource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: Map<String, Value>) -> Self {
        Self {
            inner: Arc::new(Inner {
                children: RwLock::default(),
                data: RwLock::new(map),
            }),
        }
    }

    /// Whether two handles point at the same underlying property bag.
    pub fn ptr_eq(a: &Resource, b: &Resource) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    /// A new, independent resource with the same contents.
    pub fn deep_clone(&self) -> Resource {
        Resource::from_map(self.to_map())
    }

    fn children(&self) -> RwLockReadGuard<'_, HashMap<String, Child>> {
        self.inner.children.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn children_mut(&self) -> RwLockWriteGuard<'_, HashMap<String, Child>> {
        self.inner.children.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn data(&self) -> RwLockReadGuard<'_, Map<String, Value>> {
        self.inner.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn data_mut(&self) -> RwLockWriteGuard<'_, Map<String, Value>> {
        self.inner.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// The current contents, with edits made through cached children merged in.
    pub fn to_map(&self) -> Map<String, Value> {
        let children = self.children();
        let data = self.data();
        data.iter()
            .map(|(key, value)| {
                let value = match children.get(key) {
                    Some(Child::One(child)) => child.to_value(),
                    Some(Child::Many(items)) => {
                        Value::Array(items.iter().map(Resource::to_value).collect())
                    }
                    None => value.clone(),
                };
                (key.clone(), value)
            })
            .collect()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.to_map())
    }

    pub fn len(&self) -> usize {
        self.data().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data().is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.data().contains_key(name)
    }

    /// Property names in insertion order.
    pub fn property_names(&self) -> Vec<String> {
        self.data().keys().cloned().collect()
    }

    /// The raw JSON value of a property.
    pub fn get_value(&self, name: &str) -> Option<Value> {
        let children = self.children();
        match children.get(name) {
            Some(Child::One(child)) => Some(child.to_value()),
            Some(Child::Many(items)) => Some(Value::Array(
                items.iter().map(Resource::to_value).collect(),
            )),
            None => self.data().get(name).cloned(),
        }
    }

    /// Convert a property to `T`. Absent and `null` properties are `Ok(None)`.
    pub fn try_get_property<T: DeserializeOwned>(
        &self,
        name: &str,
    ) -> Result<Option<T>, serde_json::Error> {
        match self.get_value(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => serde_json::from_value(value).map(Some),
        }
    }

    /// Convert a property to `T`, falling back to `T::default()` when the
    /// property is absent, `null`, or of a different type.
    pub fn get_property<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        self.get_optional(name).unwrap_or_default()
    }

    fn get_optional<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        match self.try_get_property(name) {
            Ok(value) => value,
            Err(err) => {
                warn!(property = name, error = %err, "property has an unexpected type");
                None
            }
        }
    }

    pub fn get_string(&self, name: &str) -> Option<String> {
        self.get_optional(name)
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get_optional(name)
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get_optional(name)
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get_optional(name)
    }

    /// A string-valued enumeration. Unknown values read as `None`.
    pub fn get_enum<E: DeserializeOwned>(&self, name: &str) -> Option<E> {
        self.get_optional(name)
    }

    /// An RFC 3339 timestamp.
    pub fn get_date_time(&self, name: &str) -> Option<DateTime<Utc>> {
        let raw = self.get_string(name)?;
        match DateTime::parse_from_rfc3339(&raw) {
            Ok(parsed) => Some(parsed.with_timezone(&Utc)),
            Err(err) => {
                warn!(property = name, value = %raw, error = %err, "invalid timestamp");
                None
            }
        }
    }

    /// Store a scalar (or any JSON) value.
    pub fn set_property(&self, name: &str, value: impl Into<Value>) {
        let mut children = self.children_mut();
        children.remove(name);
        self.data_mut().insert(name.to_string(), value.into());
    }

    pub fn remove_property(&self, name: &str) -> Option<Value> {
        let mut children = self.children_mut();
        children.remove(name);
        self.data_mut().shift_remove(name)
    }

    /// The nested object under `name` as a typed view.
    ///
    /// The view is created on first access and cached; later calls return a
    /// handle to the same child. `None` if the property is absent or is not
    /// an object.
    pub fn get_resource<R: ResourceType>(&self, name: &str) -> Option<R> {
        let mut children = self.children_mut();
        if let Some(Child::One(child)) = children.get(name) {
            return Some(R::from_resource(child.clone()));
        }
        let map = match self.data().get(name) {
            Some(Value::Object(map)) => map.clone(),
            _ => return None,
        };
        let child = Resource::from_map(map);
        children.insert(name.to_string(), Child::One(child.clone()));
        Some(R::from_resource(child))
    }

    /// The array of objects under `name` as typed views.
    ///
    /// Absent or non-array properties read as an empty list. When every
    /// element is an object the views are cached like `get_resource`, and
    /// edits made through them reach serialization. Otherwise `null`
    /// elements read as empty resources, other elements are skipped, and
    /// nothing is cached, so the stored array is left as it was.
    pub fn get_list<R: ResourceType>(&self, name: &str) -> Vec<R> {
        let mut children = self.children_mut();
        if let Some(Child::Many(items)) = children.get(name) {
            return items.iter().cloned().map(R::from_resource).collect();
        }
        let values = match self.data().get(name) {
            Some(Value::Array(values)) => values.clone(),
            _ => return Vec::new(),
        };
        if values.iter().all(Value::is_object) {
            let items: Vec<Resource> = values
                .into_iter()
                .filter_map(|value| match value {
                    Value::Object(map) => Some(Resource::from_map(map)),
                    _ => None,
                })
                .collect();
            children.insert(name.to_string(), Child::Many(items.clone()));
            return items.into_iter().map(R::from_resource).collect();
        }
        values
            .into_iter()
            .filter_map(|value| match value {
                Value::Object(map) => Some(R::from_resource(Resource::from_map(map))),
                Value::Null => Some(R::from_resource(Resource::new())),
                _ => None,
            })
            .collect()
    }

    /// Store a nested resource. Later `get_resource` calls return this
    /// same child.
    pub fn set_resource<R: ResourceType>(&self, name: &str, value: &R) {
        let child = value.resource().clone();
        let snapshot = child.to_value();
        let mut children = self.children_mut();
        self.data_mut().insert(name.to_string(), snapshot);
        children.insert(name.to_string(), Child::One(child));
    }

    /// Store a list of nested resources.
    pub fn set_list<R: ResourceType>(&self, name: &str, values: &[R]) {
        let items: Vec<Resource> = values.iter().map(|v| v.resource().clone()).collect();
        let snapshot = Value::Array(items.iter().map(Resource::to_value).collect());
        let mut children = self.children_mut();
        self.data_mut().insert(name.to_string(), snapshot);
        children.insert(name.to_string(), Child::Many(items));
    }
}

impl ResourceType for Resource {
    fn from_resource(resource: Resource) -> Self {
        resource
    }

    fn resource(&self) -> &Resource {
        self
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        Resource::ptr_eq(self, other) || self.to_map() == other.to_map()
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Resource").field(&self.to_value()).finish()
    }
}

impl From<Map<String, Value>> for Resource {
    fn from(map: Map<String, Value>) -> Self {
        Resource::from_map(map)
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Resource {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Map::deserialize(deserializer).map(Resource::from_map)
    }
}

/// Declare a typed view over `Resource`.
///
/// ```
/// okta_core::resource_type! {
///     /// A group of users.
///     pub struct Group;
/// }
///
/// impl Group {
///     pub fn name(&self) -> Option<String> {
///         self.get_string("name")
///     }
/// }
/// ```
#[macro_export]
macro_rules! resource_type {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name($crate::resource::Resource);

        impl $crate::resource::ResourceType for $name {
            fn from_resource(resource: $crate::resource::Resource) -> Self {
                Self(resource)
            }

            fn resource(&self) -> &$crate::resource::Resource {
                &self.0
            }
        }

        impl ::std::ops::Deref for $name {
            type Target = $crate::resource::Resource;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
    };
}
